use bulk_loader::BulkInsert;
use ids::SetId;
use list_filter::SetListCriteria;
use model::{NewSet, PatchSet, Set};
use result::{OptRepoResult, RepoResult};

pub mod list_filter;
pub mod model;
pub mod result;

pub trait SetEngine: Clone + Send + Sync + 'static {
    type Repo: SetRepository;

    fn repo(&self) -> Self::Repo;
}

/// Set storage. `num` is unique across all sets and every set belongs to an
/// existing theme; `bulk_insert` reports either violation for the whole batch.
pub trait SetRepository: BulkInsert<NewSet> + Send + Sync + Clone + 'static {
    fn get(&self, id: SetId) -> impl Future<Output = OptRepoResult<Set>> + Send;

    /// Ordered by id.
    fn list(&self, list_criteria: SetListCriteria)
    -> impl Future<Output = RepoResult<Vec<Set>>> + Send;

    fn create(&self, new_set: NewSet) -> impl Future<Output = RepoResult<Set>> + Send;

    fn patch(&self, id: SetId, patch: PatchSet)
    -> impl Future<Output = OptRepoResult<Set>> + Send;

    fn delete(&self, id: SetId) -> impl Future<Output = OptRepoResult<()>> + Send;
}
