use std::sync::Arc;

use axum::{
    body::Body,
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::Response,
};
use error_stack::{Report, ResultExt};
use jsonwebtoken::{Algorithm, DecodingKey, Validation};
use tracing::{error, info, instrument, warn};

use crate::{
    ArwLock,
    auth::{
        claims::Claims,
        oauth::{Jwk, Jwks, JwksState, OAuthConfig},
        roles::Roles,
        user::AuthedUser,
    },
    responses::ApiError,
};

const DISABLED_AUTH_USER: &str = "anonymous";

#[derive(Debug, Clone)]
pub struct AuthState {
    mode: AuthMode,
}

#[derive(Debug, Clone)]
enum AuthMode {
    Jwt {
        jwks: JwksState,
        oauth_config: OAuthConfig,
    },
    Static(Arc<[StaticToken]>),
    Disabled,
}

/// A pre-shared bearer token and the user it authenticates as.
#[derive(Debug, Clone)]
pub struct StaticToken {
    pub token: String,
    pub user_id: String,
    pub roles: Vec<String>,
}

impl StaticToken {
    pub fn new(token: impl Into<String>, user_id: impl Into<String>, roles: &[&str]) -> Self {
        Self {
            token: token.into(),
            user_id: user_id.into(),
            roles: roles.iter().map(|r| r.to_string()).collect(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
#[error("failed to create validate token state")]
pub struct AuthStateCreationErr;

impl AuthState {
    /// Validates RS256 JWTs against the keys published at `OAUTH_JWKS_URL`.
    pub async fn create() -> Result<Self, Report<AuthStateCreationErr>> {
        let oauth_config = OAuthConfig::from_env().change_context(AuthStateCreationErr)?;
        let jwks = refresh_jwks_from_url(&oauth_config.jwks_url)
            .await
            .change_context(AuthStateCreationErr)?;
        Ok(Self {
            mode: AuthMode::Jwt {
                jwks: JwksState {
                    keys: ArwLock::new(jwks),
                },
                oauth_config,
            },
        })
    }

    pub fn with_static_tokens(tokens: impl IntoIterator<Item = StaticToken>) -> Self {
        Self {
            mode: AuthMode::Static(tokens.into_iter().collect()),
        }
    }

    /// Every request is treated as coming from a user holding every role.
    pub fn disabled() -> Self {
        warn!("authentication is disabled, every request is granted every role");
        Self {
            mode: AuthMode::Disabled,
        }
    }

    #[instrument(skip(self))]
    pub async fn refresh_jwks(&self) -> Result<(), Report<RefreshJwksErr>> {
        if let AuthMode::Jwt { jwks, oauth_config } = &self.mode {
            let fresh = refresh_jwks_from_url(&oauth_config.jwks_url).await?;
            *jwks.keys.write().await = fresh;
        }
        Ok(())
    }
}

#[derive(Debug, thiserror::Error)]
#[error("failed to retrieve jwks data")]
pub struct RefreshJwksErr;

#[instrument]
async fn refresh_jwks_from_url(jwks_uri: &str) -> Result<Vec<Jwk>, Report<RefreshJwksErr>> {
    info!("fetching JWKS");

    let jwks: Jwks = reqwest::get(jwks_uri)
        .await
        .change_context(RefreshJwksErr)?
        .json()
        .await
        .change_context(RefreshJwksErr)?;

    if jwks.keys.is_empty() {
        error!("no jwks were found");
    } else {
        info!("found {} jwks", jwks.keys.len());
    }
    Ok(jwks.keys)
}

fn unauthorized() -> ApiError {
    ApiError::new(StatusCode::UNAUTHORIZED, "invalid or expired token")
}

/// Attaches an [`AuthedUser`] to the request when a valid bearer token is
/// present. Requests without a token pass through untouched; routes that
/// need a user reject them in `require_roles`.
#[instrument(skip_all)]
pub async fn validate_token<R: Roles>(
    State(state): State<AuthState>,
    mut request: Request<Body>,
    next: Next,
) -> Result<Response, ApiError> {
    let token = match request
        .headers()
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
    {
        None => None,
        Some(header) => match header.strip_prefix("Bearer ") {
            Some(token) => Some(token.to_owned()),
            None => {
                error!("invalid authorization type");
                return Err(unauthorized());
            }
        },
    };

    let authed_user = match (&state.mode, token) {
        (AuthMode::Disabled, _) => Some(AuthedUser::new(DISABLED_AUTH_USER, R::all())),
        (_, None) => None,
        (AuthMode::Jwt { jwks, oauth_config }, Some(token)) => {
            Some(decode_jwt::<R>(&token, jwks, oauth_config).await?)
        }
        (AuthMode::Static(tokens), Some(token)) => Some(static_user::<R>(tokens, &token)?),
    };

    if let Some(authed_user) = authed_user {
        info!(
            "request authenticated as '{}' with roles {}",
            authed_user.id, authed_user.roles
        );
        request.extensions_mut().insert(authed_user);
    }

    Ok(next.run(request).await)
}

fn static_user<R: Roles>(tokens: &[StaticToken], token: &str) -> Result<AuthedUser<R>, ApiError> {
    let known = tokens.iter().find(|t| t.token == token).ok_or_else(|| {
        error!("unknown static token");
        unauthorized()
    })?;

    let roles = known
        .roles
        .iter()
        .filter_map(|r| r.parse::<R>().ok())
        .fold(R::none(), |mut acc, next| {
            acc.add(next);
            acc
        });

    Ok(AuthedUser::new(known.user_id.as_str(), roles))
}

async fn decode_jwt<R: Roles>(
    token: &str,
    jwks: &JwksState,
    oauth_config: &OAuthConfig,
) -> Result<AuthedUser<R>, ApiError> {
    let header = jsonwebtoken::decode_header(token).map_err(|_| {
        error!("JWT token decoding (without verification) failed");
        unauthorized()
    })?;
    let kid = header.kid.ok_or_else(|| {
        error!("invalid token: kid missing");
        unauthorized()
    })?;

    let jwk = jwks.find_key(&kid).await.ok_or_else(|| {
        error!("kid key not found");
        unauthorized()
    })?;

    let decoding_key = DecodingKey::from_rsa_components(&jwk.n, &jwk.e).map_err(|_| {
        error!("failed to create decoding key");
        unauthorized()
    })?;

    let mut validation = Validation::new(Algorithm::RS256);
    validation.set_audience(&[&oauth_config.audience]);
    validation.set_issuer(&[&oauth_config.issuer_url]);

    let token_data =
        jsonwebtoken::decode::<Claims>(token, &decoding_key, &validation).map_err(|e| {
            error!("token validation error: {e}");
            unauthorized()
        })?;

    Ok(token_data
        .claims
        .into_authed_user::<R>(&oauth_config.roles_claims_path))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::CatalogRoles;
    use crate::auth::roles::require_roles;
    use axum::{Router, middleware, routing::get};
    use axum_test::TestServer;

    fn server(auth_state: AuthState) -> TestServer {
        let router = Router::new()
            .route(
                "/guarded",
                get(|| async { "ok" }).layer(middleware::from_fn_with_state(
                    CatalogRoles::WRITE,
                    require_roles::<CatalogRoles>,
                )),
            )
            .route("/open", get(|| async { "ok" }))
            .layer(middleware::from_fn_with_state(
                auth_state,
                validate_token::<CatalogRoles>,
            ));
        TestServer::new(router).expect("test server created")
    }

    fn static_tokens() -> AuthState {
        AuthState::with_static_tokens([
            StaticToken::new("reader", "r", &["CATALOG_READ"]),
            StaticToken::new("writer", "w", &["CATALOG_WRITE"]),
        ])
    }

    #[tokio::test]
    async fn missing_token_is_unauthorized_on_guarded_routes_only() {
        let server = server(static_tokens());

        server
            .get("/guarded")
            .await
            .assert_status(StatusCode::UNAUTHORIZED);
        server.get("/open").await.assert_status_ok();
    }

    #[tokio::test]
    async fn token_without_role_is_forbidden() {
        let server = server(static_tokens());

        server
            .get("/guarded")
            .authorization_bearer("reader")
            .await
            .assert_status(StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn token_with_role_is_allowed() {
        let server = server(static_tokens());

        server
            .get("/guarded")
            .authorization_bearer("writer")
            .await
            .assert_status_ok();
    }

    #[tokio::test]
    async fn unknown_token_is_unauthorized() {
        let server = server(static_tokens());

        server
            .get("/open")
            .authorization_bearer("nobody")
            .await
            .assert_status(StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn disabled_auth_grants_everything() {
        let server = server(AuthState::disabled());

        server.get("/guarded").await.assert_status_ok();
    }
}
