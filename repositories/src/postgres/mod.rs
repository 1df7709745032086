use bulk_loader::{InsertError, Violation};
use error_stack::Report;
use std::error::Error;
use routing::list_criteria::ListCriteria;
use tokio_postgres::error::SqlState;

pub mod initializer;
mod insert_many;
pub mod sets;
mod statements;
pub mod themes;

pub enum ConnectionDetails {
    Url(String),
}

#[derive(Debug, thiserror::Error)]
#[error("failed to initialize postgres {0} repo")]
pub struct RepoInitErr(&'static str);

impl RepoInitErr {
    fn themes() -> Self {
        Self("themes")
    }

    fn sets() -> Self {
        Self("sets")
    }
}

#[derive(Debug, thiserror::Error)]
#[error("failed to run migrations")]
pub struct RepoMigrationErr;

/// Rows per multi-row insert. Keeps every statement under the 65535 bind
/// parameter limit for the widest table.
const INSERT_CHUNK_SIZE: usize = 5000;

struct PgPagination {
    offset: i64,
    limit: i64,
}

fn sanitize_pagination<T, C, const N: usize>(
    list_criteria: &ListCriteria<T, N>,
    on_err: C,
) -> Result<PgPagination, Report<C>>
where
    C: Error + Send + Sync + 'static,
{
    let Ok(offset) = i64::try_from(list_criteria.offset()) else {
        return Err(Report::new(on_err).attach(format!(
            "offset '{}' is too large and is not supported",
            list_criteria.offset()
        )));
    };

    Ok(PgPagination {
        offset,
        limit: i64::try_from(list_criteria.limit()).unwrap_or(i64::MAX),
    })
}

fn violation(error: &tokio_postgres::Error) -> Option<Violation> {
    match error.code() {
        Some(code) if *code == SqlState::UNIQUE_VIOLATION => Some(Violation::DuplicateKey),
        Some(code) if *code == SqlState::FOREIGN_KEY_VIOLATION => {
            Some(Violation::MissingReference)
        }
        _ => None,
    }
}

fn insert_error(error: tokio_postgres::Error) -> Report<InsertError> {
    let context = violation(&error).map_or(InsertError::Store, InsertError::Constraint);
    Report::new(error).change_context(context)
}
