use crate::error::SetServiceError;
use error_stack::Report;

pub type ServiceResult<T> = Result<T, Report<SetServiceError>>;
pub type OptServiceResult<T> = Result<Option<T>, Report<SetServiceError>>;

pub mod error;
mod metrics;
pub mod routes;
pub mod service;
pub mod state;
mod validation;
