use std::sync::Arc;

use axum::{routing::get, Router};

use crate::application_service::account_service::AccountService;
use crate::config::AccountConfig;

pub mod account;

pub struct AppState {
    pub account_service: AccountService,
}

async fn health() -> &'static str {
    "ok"
}

pub fn create_router(config: AccountConfig) -> Router {
    let state = Arc::new(AppState {
        account_service: AccountService::new(config),
    });

    Router::new()
        .route("/health", get(health))
        .merge(account::routes())
        .with_state(state)
}
