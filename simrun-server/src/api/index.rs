//! Landing page
//!
//! Serves the bundled parameter form. The page posts the form as JSON to
//! `/run` and links to `/download` and `/view-config`.

use axum::response::Html;

/// GET /
pub async fn index() -> Html<&'static str> {
    Html(include_str!("../../templates/index.html"))
}
