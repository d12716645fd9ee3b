use axum::routing::{get, post};

use crate::routes;

use super::Router;

pub mod login;
pub mod signup;

pub fn router() -> Router {
    Router::new()
        .route(routes::AUTH_REGISTER, post(signup::register))
        .route(routes::AUTH_LOGIN, post(login::login))
        .route(routes::AUTH_ME, get(login::me))
}
