use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use std::{fmt, sync::LazyLock};
use storage::error::StorageError;
use tera::Context;
use validator::ValidationErrors;

use crate::templates::Templates;

/// Error pages are rendered outside any handler, so they get their own copy
/// of the compiled templates.
static ERROR_TEMPLATES: LazyLock<Option<Templates>> = LazyLock::new(|| match Templates::new() {
    Ok(templates) => Some(templates),
    Err(e) => {
        tracing::error!("Failed to compile error page templates: {:?}", e);
        None
    }
});

/// Web layer errors
#[derive(Debug)]
pub enum WebError {
    Storage(StorageError),
    BadRequest(String),
    NotFound,
    Template(tera::Error),
}

impl fmt::Display for WebError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Storage(e) => write!(f, "Storage error: {}", e),
            Self::BadRequest(msg) => write!(f, "Bad request: {}", msg),
            Self::NotFound => write!(f, "Resource not found"),
            Self::Template(e) => write!(f, "Template error: {}", e),
        }
    }
}

impl WebError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Storage(StorageError::NotFound) => StatusCode::NOT_FOUND,
            Self::Storage(StorageError::ConstraintViolation(_)) => StatusCode::CONFLICT,
            Self::Storage(StorageError::Unavailable(_)) => StatusCode::SERVICE_UNAVAILABLE,
            Self::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::Template(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for WebError {
    fn into_response(self) -> Response {
        let status_code = self.status_code();

        let (title, details) = match &self {
            Self::Storage(StorageError::NotFound) | Self::NotFound => {
                ("Catch not found", Vec::new())
            }
            Self::Storage(StorageError::ConstraintViolation(msg)) => {
                tracing::warn!("Constraint violation: {}", msg);
                ("The catch could not be saved", Vec::new())
            }
            Self::Storage(StorageError::Unavailable(e)) => {
                tracing::error!("Database unavailable: {:?}", e);
                ("The service is temporarily unavailable", Vec::new())
            }
            Self::Storage(e) => {
                if e.is_statement_timeout() {
                    tracing::error!("Query timed out: {:?}", e);
                } else {
                    tracing::error!("Storage error: {:?}", e);
                }
                ("An internal error occurred", Vec::new())
            }
            Self::BadRequest(msg) => ("Bad request", vec![msg.clone()]),
            Self::Template(e) => {
                tracing::error!("Template error: {:?}", e);
                ("An internal error occurred", Vec::new())
            }
        };

        (status_code, error_page(status_code, title, &details)).into_response()
    }
}

/// One readable line per failed field, sorted by field name.
pub fn validation_messages(errors: &ValidationErrors) -> Vec<String> {
    let mut messages: Vec<String> = errors
        .field_errors()
        .iter()
        .flat_map(|(field, errors)| {
            errors.iter().map(move |e| {
                format!(
                    "{}: {}",
                    field,
                    e.message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| e.code.to_string())
                )
            })
        })
        .collect();
    messages.sort();
    messages
}

fn error_page(status: StatusCode, title: &str, details: &[String]) -> Html<String> {
    let mut context = Context::new();
    context.insert("flash", &None::<String>);
    context.insert("status", &status.as_u16());
    context.insert("title", title);
    context.insert("details", details);

    let rendered = ERROR_TEMPLATES
        .as_ref()
        .map(|templates| templates.render("error.html", &context));

    match rendered {
        Some(Ok(html)) => html,
        Some(Err(e)) => {
            tracing::error!("Failed to render error page: {}", e);
            Html(tera::escape_html(title))
        }
        None => Html(tera::escape_html(title)),
    }
}

impl From<StorageError> for WebError {
    fn from(error: StorageError) -> Self {
        Self::Storage(error)
    }
}

impl From<tera::Error> for WebError {
    fn from(error: tera::Error) -> Self {
        Self::Template(error)
    }
}

pub type WebResult<T> = Result<T, WebError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(
            WebError::Storage(StorageError::NotFound).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(WebError::NotFound.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(
            WebError::BadRequest("page must be >= 1".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            WebError::Storage(StorageError::ConstraintViolation("dup".into())).status_code(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            WebError::Storage(StorageError::Database(sqlx::Error::RowNotFound)).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            WebError::Storage(StorageError::Unavailable(sqlx::Error::PoolTimedOut)).status_code(),
            StatusCode::SERVICE_UNAVAILABLE
        );
    }

    #[test]
    fn test_validation_messages_use_field_and_message() {
        let errors = storage::dto::catch::CatchForm::default().parse().unwrap_err();
        let messages = validation_messages(&errors);
        assert!(messages.contains(&"species: This field is required".to_string()));
        assert_eq!(messages.len(), 4);
    }

    #[test]
    fn test_error_page_escapes_details() {
        let Html(body) = error_page(
            StatusCode::BAD_REQUEST,
            "Bad request",
            &["<script>".to_string()],
        );
        assert!(body.contains("&lt;script&gt;"));
        assert!(!body.contains("<script>"));
    }

    #[test]
    fn test_error_page_uses_site_layout() {
        let Html(body) = error_page(StatusCode::NOT_FOUND, "Catch not found", &[]);
        assert!(body.contains("<title>404 Catch not found"));
        assert!(body.contains("<h1>Catch not found</h1>"));
        assert!(body.contains(r#"<a href="/new">Log a catch</a>"#));
        assert!(!body.contains("<ul>"));
    }
}
