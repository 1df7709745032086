use apps::{AppError, AppProperties, AppResult};
use axum::Router;
use config::{AuthMode, Config, Store};
use dotenv::dotenv;
use error_stack::ResultExt;
use error_stack::fmt::ColorMode;
use metrics_exporter_prometheus::PrometheusHandle;
use repositories::in_memory::InMemoryStore;
use repositories::postgres::ConnectionDetails;
use repositories::postgres::initializer::RepoCreator;
use routing::AuthState;
use sets_core::SetRepository;
use sets_routes::state::SetAppState;
use std::time::Duration;
use themes_core::ThemeRepository;
use themes_routes::state::ThemeAppState;
use tracing::{debug, error, info, instrument, warn};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

mod config;

const JWKS_REFRESH_INTERVAL: Duration = Duration::from_secs(60 * 60);

#[tokio::main]
async fn main() {
    match try_main().await {
        Ok(_) => info!("catalog service shutting down"),
        Err(e) => {
            error!("catalog service exited with error: {e:?}");
        }
    }
}

fn init_logging() {
    error_stack::Report::set_color_mode(ColorMode::None);

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_env("CATALOG_LOG"))
        .init();
}

async fn try_main() -> AppResult<()> {
    init_logging();

    if let Err(e) = dotenv() {
        warn!("failed to load .env file: {e}");
    }

    let config = Config::from_env().change_context(AppError)?;
    debug!("loaded {config:?}");

    let auth_state = build_auth(config.auth).await?;
    let metrics_handle = if config.metrics {
        Some(routing::setup_recorder().change_context(AppError)?)
    } else {
        None
    };

    let routes = match config.store {
        Store::Postgres { url, pool_size } => {
            let (themes, sets) = RepoCreator::new()
                .with_sets()
                .create(ConnectionDetails::Url(url), pool_size)
                .await
                .change_context(AppError)?;
            build_routes(themes, sets, auth_state, metrics_handle)
        }
        Store::Memory => {
            warn!("using the in-memory store, nothing is persisted");
            let store = InMemoryStore::new();
            build_routes(store.themes(), store.sets(), auth_state, metrics_handle)
        }
    };

    apps::run(
        routes,
        AppProperties {
            name: "catalog service",
            port: config.port,
        },
    )
    .await
}

#[instrument]
async fn build_auth(mode: AuthMode) -> AppResult<AuthState> {
    match mode {
        AuthMode::Disabled => Ok(AuthState::disabled()),
        AuthMode::Jwt => {
            let auth_state = AuthState::create().await.change_context(AppError)?;
            spawn_jwks_refresh(auth_state.clone());
            Ok(auth_state)
        }
    }
}

/// Issuers rotate their signing keys, so the cached set is reloaded periodically.
/// A failed reload keeps the previous keys.
fn spawn_jwks_refresh(auth_state: AuthState) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(JWKS_REFRESH_INTERVAL);
        // the first tick completes immediately and the keys were just fetched
        interval.tick().await;
        loop {
            interval.tick().await;
            if let Err(e) = auth_state.refresh_jwks().await {
                error!("failed to refresh jwks: {e:?}");
            }
        }
    });
}

fn build_routes<T, S>(
    themes: T,
    sets: S,
    auth_state: AuthState,
    metrics_handle: Option<PrometheusHandle>,
) -> Router
where
    T: ThemeRepository,
    S: SetRepository,
{
    debug!("building routes..");
    let theme_routes = themes_routes::routes::build(
        ThemeAppState::new(CatalogEngine::new(themes)),
        auth_state.clone(),
        metrics_handle.clone(),
    );
    let set_routes = sets_routes::routes::build(
        SetAppState::new(CatalogEngine::new(sets)),
        auth_state,
        metrics_handle,
    );
    let routes = theme_routes.merge(set_routes);
    debug!("routes built");
    routes
}

#[derive(Debug, Clone)]
struct CatalogEngine<T> {
    repo: T,
}

impl<T> CatalogEngine<T> {
    fn new(repo: T) -> Self {
        Self { repo }
    }
}

impl<T> themes_core::ThemeEngine for CatalogEngine<T>
where
    T: ThemeRepository,
{
    type Repo = T;

    fn repo(&self) -> Self::Repo {
        self.repo.clone()
    }
}

impl<T> sets_core::SetEngine for CatalogEngine<T>
where
    T: SetRepository,
{
    type Repo = T;

    fn repo(&self) -> Self::Repo {
        self.repo.clone()
    }
}
