use crate::error::ThemeServiceError;
use crate::routes::requests::{CreateThemeRequest, ThemeListQuery, ThemePatchRequest};
use crate::service::{CreateOutcome, ImportOutcome, PatchOutcome, ThemeCreation, ThemeService};
use crate::state::ThemeAppState;
use axum::{
    Json, Router,
    extract::{Multipart, Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response, Result},
};
use bulk_loader::tabular::parse_csv;
use ids::ThemeId;
use metrics_exporter_prometheus::PrometheusHandle;
use routing::error::EndpointError;
use routing::list_criteria::ListFilter;
use routing::pagination::Pagination;
use routing::responses::{ApiError, EntityResponse, ImportResponse};
use routing::router::RouterBuilder;
use routing::stream::StreamingResponse;
use routing::upload::{self, MAX_UPLOAD_BYTES};
use routing::{AuthState, CatalogRoles};
use themes_core::ThemeEngine;
use themes_core::ThemeImport;
use themes_core::list_filter::ThemeFilter;
use tracing::{instrument, warn};

mod requests;

pub const THEME_ROOT_PATH: &str = "/themes";

const THEME_LIST_PATH: &str = "/";
const THEME_GET_PATH: &str = "/{theme_id}";
const THEME_CREATE_PATH: &str = "/";
const THEME_IMPORT_PATH: &str = "/bulk";
const THEME_DELETE_PATH: &str = "/{theme_id}";
const THEME_PATCH_PATH: &str = "/{theme_id}";

const THEME_IMPORT_COLUMNS: &[&str] = &["id", "parent_id", "name"];

pub fn build<T: ThemeEngine>(
    app_state: ThemeAppState<T>,
    auth_state: AuthState,
    metrics_handle: Option<PrometheusHandle>,
) -> Router {
    let builder = RouterBuilder::<ThemeAppState<T>, CatalogRoles>::new(THEME_ROOT_PATH)
        .role_protected_get(THEME_LIST_PATH, list_themes::<T>, CatalogRoles::READ)
        .role_protected_get(THEME_GET_PATH, get_theme::<T>, CatalogRoles::READ)
        .role_protected_post(THEME_CREATE_PATH, create_theme::<T>, CatalogRoles::WRITE)
        .role_protected_upload(
            THEME_IMPORT_PATH,
            import_themes::<T>,
            CatalogRoles::WRITE,
            MAX_UPLOAD_BYTES,
        )
        .role_protected_delete(THEME_DELETE_PATH, delete_theme::<T>, CatalogRoles::WRITE)
        .role_protected_patch(THEME_PATCH_PATH, patch_theme::<T>, CatalogRoles::WRITE);

    match metrics_handle {
        Some(handle) => builder.build_with_metrics(app_state, auth_state, handle),
        None => builder.build_no_metrics(app_state, auth_state),
    }
}

fn theme_not_found(theme_id: ThemeId) -> ApiError {
    ApiError::not_found(format!("Theme {theme_id} doesn't exist"))
}

fn parent_not_found() -> ApiError {
    ApiError::bad_request("Parent theme doesn't exist").with_kind("missing_reference")
}

/// Lists themes ordered by id.
#[instrument(skip(service), err(Debug))]
async fn list_themes<T>(
    State(service): State<ThemeService<T>>,
    Query(query): Query<ThemeListQuery>,
) -> Result<Response, EndpointError<ThemeServiceError>>
where
    T: ThemeEngine,
{
    let parent = match (query.parent_id, query.roots) {
        (Some(parent_id), _) => Some(ThemeFilter::Parent(Some(parent_id))),
        (None, true) => Some(ThemeFilter::Parent(None)),
        (None, false) => None,
    };

    let criteria = ThemeFilter::criteria(Pagination::from_query(query.limit, query.offset))
        .with_opt(query.name.map(ThemeFilter::Name))
        .with_opt(parent);

    let themes = service.list(criteria).await?;

    let res = if themes.is_empty() {
        StatusCode::NO_CONTENT.into_response()
    } else {
        StreamingResponse::ok(themes).into_response()
    };
    Ok(res)
}

#[instrument(skip(service), err(Debug))]
async fn get_theme<T>(
    State(service): State<ThemeService<T>>,
    Path(theme_id): Path<ThemeId>,
) -> Result<Response, EndpointError<ThemeServiceError>>
where
    T: ThemeEngine,
{
    let theme = service.get(theme_id).await?;

    Ok(theme
        .map(|t| EntityResponse::ok(t).into_response())
        .unwrap_or_else(|| theme_not_found(theme_id).into_response()))
}

#[instrument(skip_all, err(Debug), fields(req.name = %theme.name, req.parent_id = ?theme.parent_id))]
async fn create_theme<T>(
    State(service): State<ThemeService<T>>,
    Json(theme): Json<CreateThemeRequest>,
) -> Result<Response, EndpointError<ThemeServiceError>>
where
    T: ThemeEngine,
{
    let outcome = service
        .create(ThemeCreation::new(theme.name, theme.parent_id))
        .await?;

    let res = match outcome {
        CreateOutcome::Success(t) => EntityResponse::created(t).into_response(),
        CreateOutcome::InvalidName(reason) => {
            ApiError::unprocessable_entity(reason).into_response()
        }
        CreateOutcome::ParentNotFound => parent_not_found().into_response(),
    };
    Ok(res)
}

/// Loads a CSV file of `id,parent_id,name` rows. Rows may reference parents
/// further down the file or themes that already exist.
#[instrument(skip_all, err(Debug))]
async fn import_themes<T>(
    State(service): State<ThemeService<T>>,
    multipart: Multipart,
) -> Result<Response, EndpointError<ThemeServiceError>>
where
    T: ThemeEngine,
{
    let bytes = match upload::single_file(multipart).await {
        Ok(bytes) => bytes,
        Err(e) => return Ok(e.into_response()),
    };

    let records = match parse_csv::<ThemeImport>(&bytes, THEME_IMPORT_COLUMNS) {
        Ok(records) => records,
        Err(report) => {
            warn!("unreadable theme import: {report:?}");
            return Ok(ApiError::bad_request(report.current_context().to_string())
                .with_kind("invalid_file")
                .into_response());
        }
    };

    let res = match service.import(records).await? {
        ImportOutcome::Imported(summary) => {
            ImportResponse::new(summary.batches, summary.inserted).into_response()
        }
        ImportOutcome::InvalidRecord { id, reason } => {
            ApiError::unprocessable_entity(format!("theme {id}: {reason}"))
                .with_kind("validation")
                .into_response()
        }
        ImportOutcome::Rejected { kind, detail } => ApiError::bad_request(detail)
            .with_kind(kind.as_str())
            .into_response(),
    };
    Ok(res)
}

/// Removes the theme along with its descendants and their sets.
#[instrument(skip(service), err(Debug))]
async fn delete_theme<T>(
    State(service): State<ThemeService<T>>,
    Path(theme_id): Path<ThemeId>,
) -> Result<Response, EndpointError<ThemeServiceError>>
where
    T: ThemeEngine,
{
    match service.delete(theme_id).await? {
        Some(_) => Ok(StatusCode::NO_CONTENT.into_response()),
        None => Ok(theme_not_found(theme_id).into_response()),
    }
}

#[instrument(skip(service, theme), err(Debug), fields(
    theme.name = theme.name.as_ref().map_present_or(None, |n| Some(n.map(String::as_str).unwrap_or("null"))),
    theme.parent_id = ?theme.parent_id,
))]
async fn patch_theme<T>(
    State(service): State<ThemeService<T>>,
    Path(theme_id): Path<ThemeId>,
    Json(theme): Json<ThemePatchRequest>,
) -> Result<Response, EndpointError<ThemeServiceError>>
where
    T: ThemeEngine,
{
    let outcome = service.patch(theme_id, theme.name, theme.parent_id).await?;

    let res = match outcome {
        PatchOutcome::Success(t) => EntityResponse::ok(t).into_response(),
        PatchOutcome::InvalidName(reason) => {
            ApiError::unprocessable_entity(reason).into_response()
        }
        PatchOutcome::NotFound => theme_not_found(theme_id).into_response(),
        PatchOutcome::ParentNotFound => parent_not_found().into_response(),
        PatchOutcome::CyclicParent => {
            ApiError::bad_request("A theme cannot be moved under itself or its descendants")
                .with_kind("cyclic_parent")
                .into_response()
        }
    };

    Ok(res)
}
