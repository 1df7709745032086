use crate::error::ThemeServiceError;
use crate::metrics;
use crate::{OptServiceResult, ServiceResult};
use bulk_loader::{ImportError, ImportErrorKind, ImportSummary, InsertError, Violation};
use error_stack::{Report, ResultExt};
use ids::ThemeId;
use itertools::Itertools;
use optional_field::Field;
use themes_core::list_filter::ThemeListCriteria;
use themes_core::model::{NewTheme, PatchTheme, Theme};
use themes_core::result::{Reason, ThemeRepoError};
use themes_core::{ThemeEngine, ThemeImport, ThemeRepository};
use tracing::{debug, info, instrument, warn};

pub const MAX_NAME_LEN: usize = 100;

pub struct ThemeCreation {
    name: String,
    parent_id: Option<ThemeId>,
}

impl ThemeCreation {
    pub fn new(name: String, parent_id: Option<ThemeId>) -> Self {
        Self { name, parent_id }
    }
}

#[derive(Debug, Clone)]
pub struct ThemeService<T> {
    engine: T,
}

fn validate_name(name: &str) -> Result<(), &'static str> {
    if name.trim().is_empty() {
        Err("name cannot be blank")
    } else if name.chars().count() > MAX_NAME_LEN {
        Err("name cannot be longer than 100 characters")
    } else {
        Ok(())
    }
}

fn repo_reason(report: &Report<ThemeRepoError>) -> Reason {
    report.current_context().reason()
}

impl<T> ThemeService<T>
where
    T: ThemeEngine,
{
    pub fn new(engine: T) -> Self {
        ThemeService { engine }
    }

    #[instrument(skip_all, name = "service#get")]
    pub async fn get(&self, id: ThemeId) -> OptServiceResult<Theme> {
        let theme = self
            .engine
            .repo()
            .get(id)
            .await
            .change_context(ThemeServiceError)?;

        if theme.is_some() {
            debug!("theme {id} found");
            metrics::increment_themes_retrieved();
        }

        Ok(theme)
    }

    #[instrument(skip_all, name = "service#list")]
    pub async fn list(&self, list_criteria: ThemeListCriteria) -> ServiceResult<Vec<Theme>> {
        let themes = self
            .engine
            .repo()
            .list(list_criteria)
            .await
            .change_context(ThemeServiceError)?;

        debug!("{} themes found", themes.len());
        metrics::increment_themes_retrieved_by(themes.len());
        Ok(themes)
    }

    #[instrument(skip_all, name = "service#create")]
    pub async fn create(&self, theme: ThemeCreation) -> ServiceResult<CreateOutcome> {
        if let Err(reason) = validate_name(&theme.name) {
            return Ok(CreateOutcome::InvalidName(reason));
        }

        let created = self
            .engine
            .repo()
            .create(NewTheme::new(theme.name, theme.parent_id))
            .await;

        match created {
            Ok(theme) => {
                debug!("created theme {}", theme.id);
                metrics::increment_themes_created();
                Ok(CreateOutcome::Success(theme))
            }
            Err(report) if repo_reason(&report) == Reason::ParentNotFound => {
                warn!("parent theme {:?} does not exist", theme.parent_id);
                Ok(CreateOutcome::ParentNotFound)
            }
            Err(report) => Err(report.change_context(ThemeServiceError)),
        }
    }

    #[instrument(skip_all, name = "service#update")]
    pub async fn patch(
        &self,
        theme_id: ThemeId,
        name: Field<String>,
        parent_id: Field<ThemeId>,
    ) -> ServiceResult<PatchOutcome> {
        let name = match name {
            Field::Present(Some(n)) => match validate_name(&n) {
                Ok(()) => Some(n),
                Err(reason) => return Ok(PatchOutcome::InvalidName(reason)),
            },
            Field::Missing => None,
            Field::Present(None) => return Ok(PatchOutcome::InvalidName("name cannot be null")),
        };

        let patched = self
            .engine
            .repo()
            .patch(theme_id, PatchTheme::new(name, parent_id))
            .await;

        match patched {
            Ok(Some(theme)) => {
                debug!("patched {theme_id}");
                metrics::increment_themes_patched();
                Ok(PatchOutcome::Success(theme))
            }
            Ok(None) => Ok(PatchOutcome::NotFound),
            Err(report) => match repo_reason(&report) {
                Reason::ParentNotFound => Ok(PatchOutcome::ParentNotFound),
                Reason::CyclicParent => {
                    warn!("rejected patch that would make {theme_id} its own ancestor");
                    Ok(PatchOutcome::CyclicParent)
                }
                Reason::Db | Reason::Validation => Err(report.change_context(ThemeServiceError)),
            },
        }
    }

    #[instrument(skip_all, name = "service#delete")]
    pub async fn delete(&self, theme_id: ThemeId) -> ServiceResult<Option<()>> {
        let deleted = self
            .engine
            .repo()
            .delete(theme_id)
            .await
            .change_context(ThemeServiceError)?;

        if deleted.is_some() {
            debug!("deleted theme {theme_id} and its descendants");
            metrics::increment_themes_deleted();
        }

        Ok(deleted)
    }

    /// Loads rows parent-first. A rejected batch leaves earlier batches in place.
    #[instrument(skip_all, name = "service#import", fields(records = records.len()))]
    pub async fn import(&self, records: Vec<ThemeImport>) -> ServiceResult<ImportOutcome> {
        if let Some((id, reason)) = records
            .iter()
            .find_map(|r| validate_name(&r.name).err().map(|reason| (r.id, reason)))
        {
            return Ok(ImportOutcome::InvalidRecord { id, reason });
        }

        let repo = self.engine.repo();
        match bulk_loader::execute(&repo, records).await {
            Ok(summary) => {
                info!(
                    "imported {} themes in {} batches",
                    summary.inserted, summary.batches
                );
                metrics::increment_themes_imported_by(summary.inserted);
                Ok(ImportOutcome::Imported(summary))
            }
            Err(report) => {
                let kind = report.current_context().kind();
                if kind == ImportErrorKind::Store {
                    return Err(report.change_context(ThemeServiceError));
                }
                warn!("theme import rejected: {report:?}");
                Ok(ImportOutcome::Rejected {
                    kind,
                    detail: import_failure_detail(report.current_context()),
                })
            }
        }
    }
}

fn import_failure_detail(error: &ImportError<ThemeId>) -> String {
    match error {
        ImportError::DuplicateIds(ids) => {
            format!("Import contains duplicate theme ids: {}", ids.iter().join(", "))
        }
        ImportError::UnplacedRecords(ids) => format!(
            "Themes {} could not be placed under a parent, check for cycles",
            ids.iter().join(", ")
        ),
        ImportError::Rejected {
            batch,
            batches,
            cause,
        } => {
            let reason = match cause {
                InsertError::Constraint(Violation::DuplicateKey) => "Theme already exists",
                InsertError::Constraint(Violation::MissingReference) => {
                    "Parent theme doesn't exist"
                }
                InsertError::Store => "Theme store failed",
            };
            format!("{reason} (batch {} of {batches})", batch + 1)
        }
    }
}

#[derive(Debug)]
pub enum CreateOutcome {
    Success(Theme),
    InvalidName(&'static str),
    ParentNotFound,
}

#[derive(Debug)]
pub enum PatchOutcome {
    Success(Theme),
    InvalidName(&'static str),
    NotFound,
    ParentNotFound,
    CyclicParent,
}

#[derive(Debug)]
pub enum ImportOutcome {
    Imported(ImportSummary),
    /// A row failed validation, nothing was inserted
    InvalidRecord { id: ThemeId, reason: &'static str },
    Rejected { kind: ImportErrorKind, detail: String },
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case::empty("")]
    #[case::whitespace("   ")]
    fn blank_names_are_invalid(#[case] name: &str) {
        assert_eq!(Err("name cannot be blank"), validate_name(name));
    }

    #[test]
    fn name_length_is_counted_in_characters() {
        assert!(validate_name(&"é".repeat(MAX_NAME_LEN)).is_ok());
        assert!(validate_name(&"a".repeat(MAX_NAME_LEN + 1)).is_err());
    }

    #[test]
    fn rejected_batches_are_reported_one_based() {
        let detail = import_failure_detail(&ImportError::Rejected {
            batch: 1,
            batches: 3,
            cause: InsertError::Constraint(Violation::MissingReference),
        });

        assert_eq!("Parent theme doesn't exist (batch 2 of 3)", detail);
    }

    #[test]
    fn unplaced_records_name_their_ids() {
        let detail = import_failure_detail(&ImportError::UnplacedRecords(vec![
            ThemeId::new(1),
            ThemeId::new(2),
        ]));

        assert_eq!(
            "Themes 1, 2 could not be placed under a parent, check for cycles",
            detail
        );
    }
}
