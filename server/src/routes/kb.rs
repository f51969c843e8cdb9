use axum::extract::{Query, State};
use axum::Json;
use serde::Deserialize;
use supportdesk::db::kb_repo::{KbArticle, NewKbArticle};

use crate::error::ApiResult;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub(super) struct SearchParams {
    q: Option<String>,
}

/// Without `q` (or with a blank one) lists every article.
pub(super) async fn list_or_search(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> ApiResult<Json<Vec<KbArticle>>> {
    let articles = match params.q.as_deref().map(str::trim) {
        Some(q) if !q.is_empty() => state.desk.search_articles(q)?,
        _ => state.desk.list_articles()?,
    };
    Ok(Json(articles))
}

pub(super) async fn create(
    State(state): State<AppState>,
    Json(article): Json<NewKbArticle>,
) -> ApiResult<Json<KbArticle>> {
    Ok(Json(state.desk.create_article(&article)?))
}
