use std::fmt::Display;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    handler::Handler,
    http::StatusCode,
    middleware,
    routing::{MethodRouter, delete, get, patch, post},
};
use metrics_exporter_prometheus::PrometheusHandle;
use tracing::{debug, info};

use crate::{AuthState, Roles, auth::roles::require_roles, metrics, validate_token};

struct Route<R> {
    method: &'static str,
    root_path: &'static str,
    relative_path: &'static str,
    required_roles: R,
}

impl<R> Display for Route<R>
where
    R: Display,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}: {}{} (requires roles {})",
            self.method, self.root_path, self.relative_path, self.required_roles
        )
    }
}

/// Collects the routes of one resource, each guarded by the roles it needs,
/// and nests them under `root_path` behind token validation.
pub struct RouterBuilder<S, R> {
    inner: Router<S>,
    root_path: &'static str,
    routes: Vec<Route<R>>,
}

impl<S, R> RouterBuilder<S, R>
where
    S: Send + Sync + Clone + 'static,
    R: Roles,
{
    pub fn new(root_path: &'static str) -> Self {
        Self {
            inner: Router::new(),
            root_path,
            routes: Vec::new(),
        }
    }

    pub fn role_protected_get<T, F>(self, path: &'static str, handler: F, roles: R) -> Self
    where
        F: Handler<T, S>,
        T: 'static,
    {
        self.route("GET", path, get(handler), roles)
    }

    pub fn role_protected_post<T, F>(self, path: &'static str, handler: F, roles: R) -> Self
    where
        F: Handler<T, S>,
        T: 'static,
    {
        self.route("POST", path, post(handler), roles)
    }

    pub fn role_protected_patch<T, F>(self, path: &'static str, handler: F, roles: R) -> Self
    where
        F: Handler<T, S>,
        T: 'static,
    {
        self.route("PATCH", path, patch(handler), roles)
    }

    pub fn role_protected_delete<T, F>(self, path: &'static str, handler: F, roles: R) -> Self
    where
        F: Handler<T, S>,
        T: 'static,
    {
        self.route("DELETE", path, delete(handler), roles)
    }

    /// A POST accepting request bodies up to `max_bytes`, for file uploads.
    pub fn role_protected_upload<T, F>(
        self,
        path: &'static str,
        handler: F,
        roles: R,
        max_bytes: usize,
    ) -> Self
    where
        F: Handler<T, S>,
        T: 'static,
    {
        self.route(
            "POST",
            path,
            post(handler).layer(DefaultBodyLimit::max(max_bytes)),
            roles,
        )
    }

    fn route(
        mut self,
        method: &'static str,
        path: &'static str,
        method_router: MethodRouter<S>,
        roles: R,
    ) -> Self {
        self.inner = self.inner.route(
            path,
            method_router.layer(middleware::from_fn_with_state(
                roles.clone(),
                require_roles::<R>,
            )),
        );
        self.routes.push(Route {
            method,
            root_path: self.root_path,
            relative_path: path,
            required_roles: roles,
        });
        self
    }

    pub fn build_no_metrics(self, app_state: S, auth_state: AuthState) -> Router {
        self.log_routes();
        info!("metrics not enabled for {}", self.root_path);
        let main_router = self.inner.route(
            "/metrics",
            get(|| async {
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    "Metrics endpoint is disabled. Metrics must be enabled and the service restarted",
                )
            }),
        );
        build::<S, R>(self.root_path, main_router, app_state, auth_state)
    }

    pub fn build_with_metrics(
        self,
        app_state: S,
        auth_state: AuthState,
        metrics_handle: PrometheusHandle,
    ) -> Router {
        self.log_routes();
        info!("metrics enabled for {}", self.root_path);

        let main_router = self
            .inner
            .route("/metrics", get(|| async move { metrics_handle.render() }))
            .route_layer(middleware::from_fn(metrics::track_http));

        build::<S, R>(self.root_path, main_router, app_state, auth_state)
    }

    fn log_routes(&self) {
        for route in &self.routes {
            debug!("Building route - {route}")
        }
    }
}

fn build<S, R>(
    root_path: &'static str,
    main_router: Router<S>,
    app_state: S,
    auth_state: AuthState,
) -> Router
where
    S: Send + Sync + Clone + 'static,
    R: Roles,
{
    Router::new()
        .nest(root_path, main_router)
        .layer(middleware::from_fn_with_state(
            auth_state,
            validate_token::<R>,
        ))
        .with_state(app_state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{CatalogRoles, StaticToken};
    use axum::extract::State;
    use axum_test::TestServer;

    #[derive(Clone)]
    struct Greeting(&'static str);

    async fn greet(State(greeting): State<Greeting>) -> &'static str {
        greeting.0
    }

    fn server() -> TestServer {
        let router = RouterBuilder::<Greeting, CatalogRoles>::new("/greetings")
            .role_protected_get("/", greet, CatalogRoles::READ)
            .role_protected_post("/", greet, CatalogRoles::WRITE)
            .build_no_metrics(
                Greeting("hello"),
                AuthState::with_static_tokens([StaticToken::new("t", "u", &["CATALOG_READ"])]),
            );
        TestServer::new(router).expect("test server created")
    }

    #[tokio::test]
    async fn routes_are_nested_under_the_root_path() {
        let response = server().get("/greetings").authorization_bearer("t").await;

        response.assert_status_ok();
        response.assert_text("hello");
    }

    #[tokio::test]
    async fn each_method_checks_its_own_roles() {
        server()
            .post("/greetings")
            .authorization_bearer("t")
            .await
            .assert_status(StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn disabled_metrics_endpoint_is_unavailable() {
        server()
            .get("/greetings/metrics")
            .await
            .assert_status(StatusCode::SERVICE_UNAVAILABLE);
    }
}
