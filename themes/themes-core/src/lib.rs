use bulk_loader::{BulkInsert, ImportRecord};
use ids::ThemeId;
use list_filter::ThemeListCriteria;
use model::{NewTheme, PatchTheme, Theme};
use result::{OptRepoResult, RepoResult};

pub mod list_filter;
pub mod model;
pub mod result;

/// A flat theme row as it appears in an import file.
pub type ThemeImport = ImportRecord<ThemeId>;

pub trait ThemeEngine: Clone + Send + Sync + 'static {
    type Repo: ThemeRepository;

    fn repo(&self) -> Self::Repo;
}

/// Theme storage. `bulk_insert` takes rows with explicit ids, one batch per
/// call, and reports unknown parents as missing references.
pub trait ThemeRepository: BulkInsert<ThemeImport> + Send + Sync + Clone + 'static {
    fn get(&self, id: ThemeId) -> impl Future<Output = OptRepoResult<Theme>> + Send;

    /// Ordered by id.
    fn list(
        &self,
        list_criteria: ThemeListCriteria,
    ) -> impl Future<Output = RepoResult<Vec<Theme>>> + Send;

    fn create(&self, new_theme: NewTheme) -> impl Future<Output = RepoResult<Theme>> + Send;

    fn patch(
        &self,
        id: ThemeId,
        patch: PatchTheme,
    ) -> impl Future<Output = OptRepoResult<Theme>> + Send;

    /// Removes the theme, its descendants and every set that belongs to any of them.
    fn delete(&self, id: ThemeId) -> impl Future<Output = OptRepoResult<()>> + Send;
}
