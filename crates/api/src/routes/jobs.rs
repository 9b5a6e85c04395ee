//! Route definitions for the `/jobs` resource.

use axum::routing::get;
use axum::Router;

use crate::handlers::jobs;
use crate::state::AppState;

/// Routes mounted at `/jobs`.
///
/// ```text
/// GET    /?id={jobId}     -> get_job (polling)
/// POST   /                -> create_job
/// ```
pub fn router() -> Router<AppState> {
    Router::new().route("/", get(jobs::get_job).post(jobs::create_job))
}
