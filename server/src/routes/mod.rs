//! REST routes consumed by the dashboard front-end.

mod emails;
mod kb;
mod system;

use axum::http::{HeaderValue, Method};
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::state::AppState;

pub use system::FETCH_OK;

/// Builds the full router. `cors_origin` is the single browser origin
/// allowed to call the API.
pub fn router(state: AppState, cors_origin: Option<&str>) -> Router {
    let api = Router::new()
        .route("/fetch", get(system::fetch))
        .route("/analytics", get(system::analytics))
        .route("/emails", get(emails::list_filtered).post(emails::create))
        .route("/emails/all", get(emails::list_all))
        .route("/emails/{id}", get(emails::get_one))
        .route("/emails/{id}/reply", post(emails::submit_reply))
        .route("/emails/{id}/status", post(emails::update_status))
        .route("/emails/{id}/draft", post(emails::generate_draft))
        .route("/_demo/seed", post(emails::seed_demo))
        .route("/kb", get(kb::list_or_search).post(kb::create));

    let mut app = Router::new()
        .route("/health", get(system::health))
        .nest("/api", api)
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    if let Some(origin) = cors_origin {
        match origin.parse::<HeaderValue>() {
            Ok(origin) => {
                app = app.layer(
                    CorsLayer::new()
                        .allow_origin(origin)
                        .allow_methods([Method::GET, Method::POST])
                        .allow_headers(tower_http::cors::Any),
                );
            }
            Err(_) => tracing::warn!(%origin, "ignoring invalid CORS origin"),
        }
    }

    app
}
