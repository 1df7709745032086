use crate::error::SetServiceError;
use crate::routes::requests::{CreateSetRequest, SetListQuery, SetPatchRequest};
use crate::service::{ImportOutcome, Rejection, SetService, WriteOutcome};
use crate::state::SetAppState;
use axum::{
    Json, Router,
    extract::{Multipart, Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response, Result},
};
use bulk_loader::tabular::parse_csv;
use ids::SetId;
use metrics_exporter_prometheus::PrometheusHandle;
use routing::error::EndpointError;
use routing::list_criteria::ListFilter;
use routing::pagination::Pagination;
use routing::responses::{ApiError, EntityResponse, ImportResponse};
use routing::router::RouterBuilder;
use routing::stream::StreamingResponse;
use routing::upload::{self, MAX_UPLOAD_BYTES};
use routing::{AuthState, CatalogRoles};
use sets_core::SetEngine;
use sets_core::list_filter::SetFilter;
use sets_core::model::NewSet;
use tracing::{instrument, warn};

mod requests;

pub const SET_ROOT_PATH: &str = "/sets";

const SET_LIST_PATH: &str = "/";
const SET_GET_PATH: &str = "/{set_id}";
const SET_CREATE_PATH: &str = "/";
const SET_IMPORT_PATH: &str = "/bulk";
const SET_DELETE_PATH: &str = "/{set_id}";
const SET_PATCH_PATH: &str = "/{set_id}";

const SET_IMPORT_COLUMNS: &[&str] = &[
    "set_num",
    "year",
    "name",
    "theme_id",
    "num_parts",
    "img_url",
];

pub fn build<T: SetEngine>(
    app_state: SetAppState<T>,
    auth_state: AuthState,
    metrics_handle: Option<PrometheusHandle>,
) -> Router {
    let builder = RouterBuilder::<SetAppState<T>, CatalogRoles>::new(SET_ROOT_PATH)
        .role_protected_get(SET_LIST_PATH, list_sets::<T>, CatalogRoles::READ)
        .role_protected_get(SET_GET_PATH, get_set::<T>, CatalogRoles::READ)
        .role_protected_post(SET_CREATE_PATH, create_set::<T>, CatalogRoles::WRITE)
        .role_protected_upload(
            SET_IMPORT_PATH,
            import_sets::<T>,
            CatalogRoles::WRITE,
            MAX_UPLOAD_BYTES,
        )
        .role_protected_delete(SET_DELETE_PATH, delete_set::<T>, CatalogRoles::WRITE)
        .role_protected_patch(SET_PATCH_PATH, patch_set::<T>, CatalogRoles::WRITE);

    match metrics_handle {
        Some(handle) => builder.build_with_metrics(app_state, auth_state, handle),
        None => builder.build_no_metrics(app_state, auth_state),
    }
}

fn set_not_found(set_id: SetId) -> ApiError {
    ApiError::not_found(format!("Set {set_id} doesn't exist"))
}

fn rejection_response(rejection: Rejection) -> Response {
    match rejection {
        Rejection::Invalid(invalid) => ApiError::unprocessable_entity(invalid.to_string())
            .with_kind("validation")
            .into_response(),
        Rejection::ThemeNotFound => ApiError::bad_request("Theme provided doesn't exist")
            .with_kind("missing_reference")
            .into_response(),
        Rejection::DuplicateNum => ApiError::bad_request("Set already exists")
            .with_kind("duplicate_key")
            .into_response(),
    }
}

/// Lists sets ordered by id.
#[instrument(skip(service), err(Debug))]
async fn list_sets<T>(
    State(service): State<SetService<T>>,
    Query(query): Query<SetListQuery>,
) -> Result<Response, EndpointError<SetServiceError>>
where
    T: SetEngine,
{
    let criteria = SetFilter::criteria(Pagination::from_query(query.limit, query.offset))
        .with_opt(query.name.map(SetFilter::Name))
        .with_opt(query.theme_id.map(SetFilter::Theme));

    let sets = service.list(criteria).await?;

    let res = if sets.is_empty() {
        StatusCode::NO_CONTENT.into_response()
    } else {
        StreamingResponse::ok(sets).into_response()
    };
    Ok(res)
}

#[instrument(skip(service), err(Debug))]
async fn get_set<T>(
    State(service): State<SetService<T>>,
    Path(set_id): Path<SetId>,
) -> Result<Response, EndpointError<SetServiceError>>
where
    T: SetEngine,
{
    let set = service.get(set_id).await?;

    Ok(set
        .map(|s| EntityResponse::ok(s).into_response())
        .unwrap_or_else(|| set_not_found(set_id).into_response()))
}

#[instrument(skip(service), err(Debug))]
async fn create_set<T>(
    State(service): State<SetService<T>>,
    Json(set): Json<CreateSetRequest>,
) -> Result<Response, EndpointError<SetServiceError>>
where
    T: SetEngine,
{
    let res = match service.create(set.into()).await? {
        WriteOutcome::Success(set) => EntityResponse::created(set).into_response(),
        WriteOutcome::NotFound => StatusCode::NOT_FOUND.into_response(),
        WriteOutcome::Rejected(rejection) => rejection_response(rejection),
    };
    Ok(res)
}

/// Loads a CSV file with `set_num,year,name,theme_id,num_parts,img_url` columns.
/// Every referenced theme has to exist already.
#[instrument(skip_all, err(Debug))]
async fn import_sets<T>(
    State(service): State<SetService<T>>,
    multipart: Multipart,
) -> Result<Response, EndpointError<SetServiceError>>
where
    T: SetEngine,
{
    let bytes = match upload::single_file(multipart).await {
        Ok(bytes) => bytes,
        Err(e) => return Ok(e.into_response()),
    };

    let records = match parse_csv::<NewSet>(&bytes, SET_IMPORT_COLUMNS) {
        Ok(records) => records,
        Err(report) => {
            warn!("unreadable set import: {report:?}");
            return Ok(ApiError::bad_request(report.current_context().to_string())
                .with_kind("invalid_file")
                .into_response());
        }
    };

    let res = match service.import(records).await? {
        ImportOutcome::Imported(summary) => {
            ImportResponse::new(summary.batches, summary.inserted).into_response()
        }
        ImportOutcome::InvalidRecord { num, invalid } => {
            ApiError::unprocessable_entity(format!("set {num}: {invalid}"))
                .with_kind("validation")
                .into_response()
        }
        ImportOutcome::Rejected { kind, detail } => ApiError::bad_request(detail)
            .with_kind(kind.as_str())
            .into_response(),
    };
    Ok(res)
}

#[instrument(skip(service), err(Debug))]
async fn delete_set<T>(
    State(service): State<SetService<T>>,
    Path(set_id): Path<SetId>,
) -> Result<Response, EndpointError<SetServiceError>>
where
    T: SetEngine,
{
    match service.delete(set_id).await? {
        Some(_) => Ok(StatusCode::NO_CONTENT.into_response()),
        None => Ok(set_not_found(set_id).into_response()),
    }
}

#[instrument(skip(service), err(Debug))]
async fn patch_set<T>(
    State(service): State<SetService<T>>,
    Path(set_id): Path<SetId>,
    Json(set): Json<SetPatchRequest>,
) -> Result<Response, EndpointError<SetServiceError>>
where
    T: SetEngine,
{
    let res = match service.patch(set_id, set.into()).await? {
        WriteOutcome::Success(set) => EntityResponse::ok(set).into_response(),
        WriteOutcome::NotFound => set_not_found(set_id).into_response(),
        WriteOutcome::Rejected(rejection) => rejection_response(rejection),
    };
    Ok(res)
}
