use axum::{
    Form,
    extract::{
        Path, Query, State,
        rejection::{FormRejection, PathRejection, QueryRejection},
    },
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::CookieJar;
use serde::Serialize;
use storage::dto::{
    catch::{CatchForm, CatchListFilter, CatchListQuery, SortOrder},
    common::{DEFAULT_PAGE_SIZE, PaginationMeta, PaginationParams},
};
use tera::Context;

use crate::{
    AppState,
    cookies::{self, Flash},
    error::{WebError, WebResult, validation_messages},
};

use super::services;

#[derive(Serialize)]
struct SortOption {
    value: &'static str,
    label: &'static str,
}

fn page_context(flash: Option<Flash>) -> Context {
    let mut context = Context::new();
    context.insert("flash", &flash.map(Flash::message));
    context
}

/// Link to another page of the current listing, keeping search and sort.
fn page_link(filter: &CatchListFilter, page: i64) -> String {
    let query = url::form_urlencoded::Serializer::new(String::new())
        .append_pair("page", &page.to_string())
        .append_pair("search", &filter.search)
        .append_pair("sort", filter.sort.as_str())
        .append_pair("page_size", &filter.pagination.page_size.to_string())
        .finish();
    format!("/?{query}")
}

/// Previous and next links, present only where such a page exists.
fn page_links(
    filter: &CatchListFilter,
    pagination: &PaginationMeta,
) -> (Option<String>, Option<String>) {
    let page = pagination.page;
    let previous = pagination
        .has_previous
        .then(|| page_link(filter, page.saturating_sub(1)));
    let next = pagination
        .has_next
        .then(|| page_link(filter, page.saturating_add(1)));

    (previous, next)
}

fn catch_form(form: Result<Form<CatchForm>, FormRejection>) -> WebResult<CatchForm> {
    form.map(|Form(form)| form)
        .map_err(|e| WebError::BadRequest(e.body_text()))
}

fn catch_id(path: Result<Path<i32>, PathRejection>) -> WebResult<i32> {
    path.map(|Path(id)| id).map_err(|_| WebError::NotFound)
}

/// GET /: search, sort and paginate catches
pub async fn list_catches(
    State(state): State<AppState>,
    jar: CookieJar,
    query: Result<Query<CatchListQuery>, QueryRejection>,
) -> WebResult<Response> {
    let Query(query) = query.map_err(|e| WebError::BadRequest(e.body_text()))?;

    let page = query.page().map_err(WebError::BadRequest)?;
    let requested_page_size = query.page_size().map_err(WebError::BadRequest)?;

    let filter = CatchListFilter {
        search: query.search().to_string(),
        sort: query.sort(),
        pagination: PaginationParams {
            page,
            page_size: cookies::resolve_page_size(requested_page_size, &jar),
        },
    };
    filter.validate().map_err(WebError::BadRequest)?;

    let listing = services::list_catches(&state.db, &filter).await?;

    let (jar, flash) = cookies::take_flash(jar);
    let sort_options: Vec<SortOption> = SortOrder::ALL
        .iter()
        .map(|order| SortOption {
            value: order.as_str(),
            label: order.label(),
        })
        .collect();

    let (previous_link, next_link) = page_links(&filter, &listing.pagination);

    let mut context = page_context(flash);
    context.insert("catches", &listing.catches);
    context.insert("pagination", &listing.pagination);
    context.insert("total_records", &listing.total_records);
    context.insert("avg_weight", &listing.avg_weight);
    context.insert("max_weight", &listing.max_weight);
    context.insert("search", &filter.search);
    context.insert("sort", filter.sort.as_str());
    context.insert("sort_options", &sort_options);
    context.insert("page_size", &filter.pagination.page_size);
    context.insert("previous_link", &previous_link);
    context.insert("next_link", &next_link);

    let html = state.templates.render("list.html", &context)?;
    let jar = jar.add(cookies::page_size_cookie(filter.pagination.page_size));

    Ok((jar, html).into_response())
}

/// GET /stats: aggregate statistics
pub async fn catch_stats(State(state): State<AppState>, jar: CookieJar) -> WebResult<Response> {
    let stats = services::catch_stats(&state.db).await?;
    let page_size = cookies::page_size_preference(&jar).unwrap_or(DEFAULT_PAGE_SIZE);

    let mut context = page_context(None);
    context.insert("stats", &stats);
    context.insert("page_size", &page_size);

    Ok(state.templates.render("stats.html", &context)?.into_response())
}

fn render_form(
    state: &AppState,
    status: StatusCode,
    title: &str,
    action: &str,
    form: &CatchForm,
    errors: &[String],
) -> WebResult<Response> {
    let mut context = page_context(None);
    context.insert("title", title);
    context.insert("action", action);
    context.insert("form", form);
    context.insert("errors", errors);

    Ok((status, state.templates.render("form.html", &context)?).into_response())
}

/// GET /new: empty catch form
pub async fn new_catch_form(State(state): State<AppState>) -> WebResult<Response> {
    render_form(
        &state,
        StatusCode::OK,
        "Log a catch",
        "/new",
        &CatchForm::default(),
        &[],
    )
}

/// POST /new: create a catch
pub async fn create_catch(
    State(state): State<AppState>,
    jar: CookieJar,
    form: Result<Form<CatchForm>, FormRejection>,
) -> WebResult<Response> {
    let form = catch_form(form)?;
    let input = match form.parse() {
        Ok(input) => input,
        Err(errors) => {
            tracing::debug!("Rejected new catch: {}", errors);
            return render_form(
                &state,
                StatusCode::BAD_REQUEST,
                "Log a catch",
                "/new",
                &form,
                &validation_messages(&errors),
            );
        }
    };

    services::create_catch(&state.db, &input).await?;

    Ok((cookies::set_flash(jar, Flash::Added), Redirect::to("/")).into_response())
}

/// GET /edit/{id}: catch form filled with the stored values
pub async fn edit_catch_form(
    State(state): State<AppState>,
    path: Result<Path<i32>, PathRejection>,
) -> WebResult<Response> {
    let id = catch_id(path)?;
    let catch = services::get_catch(&state.db, id).await?;

    render_form(
        &state,
        StatusCode::OK,
        "Edit catch",
        &format!("/edit/{id}"),
        &CatchForm::from(&catch),
        &[],
    )
}

/// POST /edit/{id}: replace a catch
pub async fn update_catch(
    State(state): State<AppState>,
    jar: CookieJar,
    path: Result<Path<i32>, PathRejection>,
    form: Result<Form<CatchForm>, FormRejection>,
) -> WebResult<Response> {
    let id = catch_id(path)?;
    let form = catch_form(form)?;

    let input = match form.parse() {
        Ok(input) => input,
        Err(errors) => {
            tracing::debug!(id, "Rejected catch update: {}", errors);
            return render_form(
                &state,
                StatusCode::BAD_REQUEST,
                "Edit catch",
                &format!("/edit/{id}"),
                &form,
                &validation_messages(&errors),
            );
        }
    };

    services::update_catch(&state.db, id, &input).await?;

    Ok((cookies::set_flash(jar, Flash::Updated), Redirect::to("/")).into_response())
}

/// GET /delete/{id}: confirmation page
pub async fn confirm_delete(
    State(state): State<AppState>,
    path: Result<Path<i32>, PathRejection>,
) -> WebResult<Response> {
    let id = catch_id(path)?;
    let catch = services::get_catch(&state.db, id).await?;

    let mut context = page_context(None);
    context.insert("id", &id);
    context.insert("species", &catch.species);
    context.insert("catch_date", &catch.catch_date);

    Ok(state
        .templates
        .render("confirm_delete.html", &context)?
        .into_response())
}

/// POST /delete/{id}: remove a catch
pub async fn delete_catch(
    State(state): State<AppState>,
    jar: CookieJar,
    path: Result<Path<i32>, PathRejection>,
) -> WebResult<Response> {
    let id = catch_id(path)?;
    services::delete_catch(&state.db, id).await?;

    Ok((cookies::set_flash(jar, Flash::Removed), Redirect::to("/")).into_response())
}

/// Any other path
pub async fn not_found() -> WebError {
    WebError::NotFound
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_link_keeps_search_and_sort() {
        let filter = CatchListFilter {
            search: "lake trout & co".to_string(),
            sort: SortOrder::WeightDesc,
            pagination: PaginationParams {
                page: 2,
                page_size: 25,
            },
        };
        assert_eq!(
            page_link(&filter, 3),
            "/?page=3&search=lake+trout+%26+co&sort=weight_desc&page_size=25"
        );
    }

    #[test]
    fn test_page_links_only_for_existing_pages() {
        let filter = CatchListFilter {
            search: String::new(),
            sort: SortOrder::default(),
            pagination: PaginationParams {
                page: 1,
                page_size: 10,
            },
        };

        let (previous, next) = page_links(&filter, &PaginationMeta::new(1, 10, 25));
        assert_eq!(previous, None);
        assert_eq!(
            next.as_deref(),
            Some("/?page=2&search=&sort=date_desc&page_size=10")
        );

        let (previous, next) = page_links(&filter, &PaginationMeta::new(3, 10, 25));
        assert!(previous.is_some());
        assert_eq!(next, None);
    }

    #[test]
    fn test_page_links_at_largest_page() {
        let filter = CatchListFilter {
            search: "pike".to_string(),
            sort: SortOrder::default(),
            pagination: PaginationParams {
                page: i64::MAX,
                page_size: 10,
            },
        };

        let (previous, next) = page_links(&filter, &PaginationMeta::new(i64::MAX, 10, 3));
        assert_eq!(next, None);
        assert_eq!(previous, Some(page_link(&filter, i64::MAX - 1)));
    }

    #[test]
    fn test_catch_id_from_path() {
        assert!(matches!(catch_id(Ok(Path(4))), Ok(4)));
    }
}
