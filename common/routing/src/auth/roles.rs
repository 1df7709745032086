use std::{fmt::Display, str::FromStr};

use axum::{
    body::Body,
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use tracing::{debug, error, warn};

use crate::auth::user::AuthedUser;
use crate::responses::ApiError;

pub trait Roles: FromStr + Display + Clone + Send + Sync + 'static {
    fn none() -> Self;
    fn all() -> Self;
    fn is_none(&self) -> bool;
    fn contains(&self, other: Self) -> bool;
    fn add(&mut self, other: Self);
}

pub async fn require_roles<R: Roles>(
    State(required_roles): State<R>,
    req: Request<Body>,
    next: Next,
) -> Response {
    let Some(user) = req.extensions().get::<AuthedUser<R>>() else {
        error!("endpoint requires authorized user, none was found");
        return ApiError::new(
            axum::http::StatusCode::UNAUTHORIZED,
            "authentication credentials were not provided",
        )
        .into_response();
    };

    debug!("required roles: {required_roles}");
    if required_roles.is_none() || user.has_roles(required_roles) {
        next.run(req).await
    } else {
        warn!("user {} is missing required roles", user.id);
        ApiError::new(
            axum::http::StatusCode::FORBIDDEN,
            "you do not have permission to perform this action",
        )
        .into_response()
    }
}
