use axum::{Router, routing::get};

use super::handlers::{
    catch_stats, confirm_delete, create_catch, delete_catch, edit_catch_form, list_catches,
    new_catch_form, update_catch,
};
use crate::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_catches))
        .route("/stats", get(catch_stats))
        .route("/new", get(new_catch_form).post(create_catch))
        .route("/edit/:id", get(edit_catch_form).post(update_catch))
        .route("/delete/:id", get(confirm_delete).post(delete_catch))
}
