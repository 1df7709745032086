use crate::error::ThemeServiceError;
use error_stack::Report;

pub type ServiceResult<T> = Result<T, Report<ThemeServiceError>>;
pub type OptServiceResult<T> = Result<Option<T>, Report<ThemeServiceError>>;

pub mod error;
mod metrics;
pub mod routes;
pub mod service;
pub mod state;
