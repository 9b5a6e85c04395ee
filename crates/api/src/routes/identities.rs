//! Route definitions for the `/identities` resource.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::identities;
use crate::state::AppState;

/// Routes mounted at `/identities`.
///
/// ```text
/// GET    /                    -> list
/// POST   /                    -> create
/// POST   /{id}/regenerate     -> regenerate
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(identities::list).post(identities::create))
        .route("/{id}/regenerate", post(identities::regenerate))
}
