pub mod health;
pub mod identities;
pub mod jobs;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// ```text
/// /jobs          background generation jobs (create + poll)
/// /identities    visual identity registry
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/jobs", jobs::router())
        .nest("/identities", identities::router())
}
