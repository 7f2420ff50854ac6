//! API route definitions.

use axum::{Router, middleware};

use crate::{AppState, middleware::auth_middleware};

pub mod accounts;
pub mod cheques;
pub mod health;
pub mod proofs;
pub mod reports;
pub mod trade;

/// Creates the API router; everything except the health check needs a bearer token.
pub fn api_routes_with_state(state: &AppState) -> Router<AppState> {
    let protected_routes = Router::new()
        .merge(accounts::routes())
        .merge(cheques::routes())
        .merge(trade::routes())
        .merge(reports::routes())
        .merge(proofs::routes(state.storage.config().max_file_size))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    Router::new()
        .merge(health::routes())
        .merge(protected_routes)
}
