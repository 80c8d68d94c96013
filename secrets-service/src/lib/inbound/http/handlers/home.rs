use axum::response::Html;

use crate::inbound::http::views;

pub async fn home() -> Html<String> {
    Html(views::home())
}
