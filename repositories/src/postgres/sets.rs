use crate::postgres::insert_many::{InsertMany, InsertManyBuilder, value_set};
use crate::postgres::statements::{self, sets as sql};
use crate::postgres::{RepoInitErr, insert_error, sanitize_pagination, violation};
use bulk_loader::{BulkInsert, InsertError, Violation};
use deadpool_postgres::{Object, Pool};
use error_stack::{Report, ResultExt};
use ids::{SetId, ThemeId};
use sets_core::SetRepository;
use sets_core::list_filter::{SetFilter, SetListCriteria};
use sets_core::model::{NewSet, PatchSet, Set};
use sets_core::result::{OptRepoResult, Reason, RepoResult, SetRepoError};
use tokio_postgres::Row;
use tracing::debug;

#[derive(Clone)]
pub struct SetRepo {
    pool: Pool,
}

impl SetRepo {
    pub async fn new(pool: Pool) -> Result<Self, Report<RepoInitErr>> {
        let client = pool.get().await.change_context(RepoInitErr::sets())?;
        statements::prepare_all(&client, sql::ALL)
            .await
            .change_context(RepoInitErr::sets())?;

        Ok(Self { pool })
    }

    async fn client(&self, on_err: SetRepoError) -> RepoResult<Object> {
        self.pool.get().await.change_context(on_err)
    }
}

fn row_to_set(row: &Row) -> Set {
    Set {
        id: SetId::new(row.get("id")),
        num: row.get("num"),
        name: row.get("name"),
        year: row.get("year"),
        num_parts: row.get("num_parts"),
        img_url: row.get("img_url"),
        theme_id: ThemeId::new(row.get("theme_id")),
        created: row.get("created"),
        updated: row.get("updated"),
    }
}

/// Maps constraint violations to the reasons callers act on.
fn write_error(
    error: tokio_postgres::Error,
    on_err: fn(Reason) -> SetRepoError,
) -> Report<SetRepoError> {
    let reason = match violation(&error) {
        Some(Violation::MissingReference) => Reason::ThemeNotFound,
        Some(Violation::DuplicateKey) => Reason::DuplicateNum,
        None => Reason::Db,
    };
    Report::new(error).change_context(on_err(reason))
}

fn set_inserts(batch: Vec<NewSet>) -> Vec<InsertMany> {
    InsertManyBuilder::new(
        "sets",
        ["num", "name", "year", "num_parts", "img_url", "theme_id"],
    )
    .build(batch.into_iter().map(|row| {
        value_set![
            row.num => String,
            row.name => String,
            row.year => i32,
            row.num_parts => i32,
            row.img_url => String,
            *row.theme_id => i64,
        ]
    }))
}

impl SetRepository for SetRepo {
    async fn get(&self, id: SetId) -> OptRepoResult<Set> {
        let on_err = SetRepoError::Get(Reason::Db);
        let client = self.client(on_err).await?;
        let statement = sql::GET.prepare(&client).await.change_context(on_err)?;

        let set = client
            .query_opt(&statement, &[&*id])
            .await
            .change_context(on_err)?
            .map(|row| row_to_set(&row));
        Ok(set)
    }

    async fn list(&self, list_criteria: SetListCriteria) -> RepoResult<Vec<Set>> {
        let pagination =
            sanitize_pagination(&list_criteria, SetRepoError::List(Reason::Validation))?;

        let mut name = None;
        let mut theme_id = None;
        for filter in list_criteria.filters() {
            match filter {
                SetFilter::Name(n) => name = Some(n.as_str()),
                SetFilter::Theme(t) => theme_id = Some(**t),
            }
        }

        let on_err = SetRepoError::List(Reason::Db);
        let client = self.client(on_err).await?;
        let statement = sql::LIST.prepare(&client).await.change_context(on_err)?;

        let rows = client
            .query(
                &statement,
                &[&name, &theme_id, &pagination.offset, &pagination.limit],
            )
            .await
            .change_context(on_err)?;

        Ok(rows.iter().map(row_to_set).collect())
    }

    async fn create(&self, new_set: NewSet) -> RepoResult<Set> {
        let on_err = SetRepoError::Create(Reason::Db);
        let client = self.client(on_err).await?;
        let statement = sql::CREATE.prepare(&client).await.change_context(on_err)?;

        client
            .query_one(
                &statement,
                &[
                    &new_set.num,
                    &new_set.name,
                    &new_set.year,
                    &new_set.num_parts,
                    &new_set.img_url,
                    &*new_set.theme_id,
                ],
            )
            .await
            .map(|row| row_to_set(&row))
            .map_err(|e| write_error(e, SetRepoError::Create))
    }

    async fn patch(&self, id: SetId, patch: PatchSet) -> OptRepoResult<Set> {
        let on_err = SetRepoError::Patch(Reason::Db);
        let client = self.client(on_err).await?;
        let statement = sql::PATCH.prepare(&client).await.change_context(on_err)?;
        let theme_id = patch.theme_id.map(|t| *t);

        client
            .query_opt(
                &statement,
                &[
                    &*id,
                    &patch.num,
                    &patch.name,
                    &patch.year,
                    &patch.num_parts,
                    &patch.img_url,
                    &theme_id,
                ],
            )
            .await
            .map(|row| row.map(|row| row_to_set(&row)))
            .map_err(|e| write_error(e, SetRepoError::Patch))
    }

    async fn delete(&self, id: SetId) -> OptRepoResult<()> {
        let on_err = SetRepoError::Delete(Reason::Db);
        let client = self.client(on_err).await?;
        let statement = sql::DELETE.prepare(&client).await.change_context(on_err)?;

        let deleted = client
            .execute(&statement, &[&*id])
            .await
            .change_context(on_err)?;

        Ok((deleted > 0).then_some(()))
    }
}

impl BulkInsert<NewSet> for SetRepo {
    async fn bulk_insert(&self, batch: Vec<NewSet>) -> Result<usize, Report<InsertError>> {
        let mut client = self.pool.get().await.change_context(InsertError::Store)?;
        let transaction = client
            .transaction()
            .await
            .change_context(InsertError::Store)?;

        let mut inserted = 0;
        for insert in set_inserts(batch) {
            inserted += transaction
                .execute(insert.query.as_str(), &insert.params())
                .await
                .map_err(insert_error)?;
        }

        transaction.commit().await.change_context(InsertError::Store)?;
        debug!("inserted {inserted} sets");
        usize::try_from(inserted).change_context(InsertError::Store)
    }
}
