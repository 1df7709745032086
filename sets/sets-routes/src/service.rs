use crate::error::SetServiceError;
use crate::metrics;
use crate::validation::{self, InvalidField};
use crate::{OptServiceResult, ServiceResult};
use bulk_loader::{ImportError, ImportErrorKind, ImportSummary, InsertError, Violation};
use error_stack::{Report, ResultExt};
use ids::SetId;
use itertools::Itertools;
use sets_core::list_filter::SetListCriteria;
use sets_core::model::{NewSet, PatchSet, Set};
use sets_core::result::{Reason, SetRepoError};
use sets_core::{SetEngine, SetRepository};
use tracing::{debug, info, instrument, warn};

#[derive(Debug, Clone)]
pub struct SetService<T> {
    engine: T,
}

impl<T> SetService<T>
where
    T: SetEngine,
{
    pub fn new(engine: T) -> Self {
        SetService { engine }
    }

    #[instrument(skip_all, name = "service#get")]
    pub async fn get(&self, id: SetId) -> OptServiceResult<Set> {
        let set = self
            .engine
            .repo()
            .get(id)
            .await
            .change_context(SetServiceError)?;

        if set.is_some() {
            debug!("set {id} found");
            metrics::increment_sets_retrieved();
        }

        Ok(set)
    }

    #[instrument(skip_all, name = "service#list")]
    pub async fn list(&self, list_criteria: SetListCriteria) -> ServiceResult<Vec<Set>> {
        let sets = self
            .engine
            .repo()
            .list(list_criteria)
            .await
            .change_context(SetServiceError)?;

        debug!("{} sets found", sets.len());
        metrics::increment_sets_retrieved_by(sets.len());
        Ok(sets)
    }

    #[instrument(skip_all, name = "service#create", fields(set.num = %new_set.num))]
    pub async fn create(&self, new_set: NewSet) -> ServiceResult<WriteOutcome> {
        if let Err(invalid) = validation::new_set(&new_set) {
            return Ok(WriteOutcome::Rejected(Rejection::Invalid(invalid)));
        }

        match self.engine.repo().create(new_set).await {
            Ok(set) => {
                debug!("created set {}", set.id);
                metrics::increment_sets_created();
                Ok(WriteOutcome::Success(set))
            }
            Err(report) => rejected_write(report),
        }
    }

    #[instrument(skip_all, name = "service#update")]
    pub async fn patch(&self, set_id: SetId, patch: PatchSet) -> ServiceResult<WriteOutcome> {
        if let Err(invalid) = validation::patch(&patch) {
            return Ok(WriteOutcome::Rejected(Rejection::Invalid(invalid)));
        }

        match self.engine.repo().patch(set_id, patch).await {
            Ok(Some(set)) => {
                debug!("patched {set_id}");
                metrics::increment_sets_patched();
                Ok(WriteOutcome::Success(set))
            }
            Ok(None) => Ok(WriteOutcome::NotFound),
            Err(report) => rejected_write(report),
        }
    }

    #[instrument(skip_all, name = "service#delete")]
    pub async fn delete(&self, set_id: SetId) -> ServiceResult<Option<()>> {
        let deleted = self
            .engine
            .repo()
            .delete(set_id)
            .await
            .change_context(SetServiceError)?;

        if deleted.is_some() {
            debug!("deleted set {set_id}");
            metrics::increment_sets_deleted();
        }

        Ok(deleted)
    }

    /// Sets have no parents of their own, so an import is a single batch.
    #[instrument(skip_all, name = "service#import", fields(records = records.len()))]
    pub async fn import(&self, records: Vec<NewSet>) -> ServiceResult<ImportOutcome> {
        if let Some((num, invalid)) = records.iter().find_map(|r| {
            validation::new_set(r)
                .err()
                .map(|invalid| (r.num.clone(), invalid))
        }) {
            return Ok(ImportOutcome::InvalidRecord { num, invalid });
        }

        let repo = self.engine.repo();
        match bulk_loader::execute(&repo, records).await {
            Ok(summary) => {
                info!("imported {} sets", summary.inserted);
                metrics::increment_sets_imported_by(summary.inserted);
                Ok(ImportOutcome::Imported(summary))
            }
            Err(report) => {
                let kind = report.current_context().kind();
                if kind == ImportErrorKind::Store {
                    return Err(report.change_context(SetServiceError));
                }
                warn!("set import rejected: {report:?}");
                Ok(ImportOutcome::Rejected {
                    kind,
                    detail: import_failure_detail(report.current_context()),
                })
            }
        }
    }
}

fn rejected_write(report: Report<SetRepoError>) -> ServiceResult<WriteOutcome> {
    match report.current_context().reason() {
        Reason::ThemeNotFound => {
            warn!("set references a theme that does not exist");
            Ok(WriteOutcome::Rejected(Rejection::ThemeNotFound))
        }
        Reason::DuplicateNum => {
            warn!("set num is already taken");
            Ok(WriteOutcome::Rejected(Rejection::DuplicateNum))
        }
        Reason::Db | Reason::Validation => Err(report.change_context(SetServiceError)),
    }
}

fn import_failure_detail(error: &ImportError<String>) -> String {
    match error {
        ImportError::DuplicateIds(nums) => {
            format!("Import contains duplicate set nums: {}", nums.iter().join(", "))
        }
        ImportError::UnplacedRecords(nums) => {
            format!("Sets {} could not be placed", nums.iter().join(", "))
        }
        ImportError::Rejected { cause, .. } => match cause {
            InsertError::Constraint(Violation::DuplicateKey) => "Set already exists".to_string(),
            InsertError::Constraint(Violation::MissingReference) => {
                "Theme provided doesn't exist".to_string()
            }
            InsertError::Store => "Set store failed".to_string(),
        },
    }
}

/// Result of a create or a patch. Creates are never `NotFound`.
#[derive(Debug)]
pub enum WriteOutcome {
    Success(Set),
    NotFound,
    Rejected(Rejection),
}

#[derive(Debug)]
pub enum Rejection {
    Invalid(InvalidField),
    ThemeNotFound,
    DuplicateNum,
}

#[derive(Debug)]
pub enum ImportOutcome {
    Imported(ImportSummary),
    InvalidRecord { num: String, invalid: InvalidField },
    Rejected { kind: ImportErrorKind, detail: String },
}
