use crate::postgres::insert_many::{InsertMany, InsertManyBuilder, value_set};
use crate::postgres::statements::{self, themes as sql};
use crate::postgres::{RepoInitErr, insert_error, sanitize_pagination, violation};
use bulk_loader::{BulkInsert, InsertError, Violation};
use deadpool_postgres::{Object, Pool};
use error_stack::{Report, ResultExt};
use ids::ThemeId;
use optional_field::Field;
use themes_core::list_filter::{ThemeFilter, ThemeListCriteria};
use themes_core::model::{NewTheme, PatchTheme, Theme};
use themes_core::result::{OptRepoResult, Reason, RepoResult, ThemeRepoError};
use themes_core::{ThemeImport, ThemeRepository};
use tokio_postgres::Row;
use tracing::debug;

#[derive(Clone)]
pub struct ThemeRepo {
    pool: Pool,
}

impl ThemeRepo {
    pub async fn new(pool: Pool) -> Result<Self, Report<RepoInitErr>> {
        let client = pool.get().await.change_context(RepoInitErr::themes())?;
        statements::prepare_all(&client, sql::ALL)
            .await
            .change_context(RepoInitErr::themes())?;

        Ok(Self { pool })
    }

    async fn client(&self, on_err: ThemeRepoError) -> RepoResult<Object> {
        self.pool.get().await.change_context(on_err)
    }
}

fn row_to_theme(row: &Row) -> Theme {
    Theme::new(
        ThemeId::new(row.get("id")),
        row.get("name"),
        row.get::<_, Option<i64>>("parent_id").map(ThemeId::new),
        row.get("created"),
        row.get("updated"),
    )
}

fn theme_inserts(batch: Vec<ThemeImport>) -> Vec<InsertMany> {
    InsertManyBuilder::new("themes", ["id", "name", "parent_id"]).build(batch.into_iter().map(
        |row| value_set![*row.id => i64, row.name => String, row.parent_id.map(|p| *p) => Option<i64>],
    ))
}

impl ThemeRepository for ThemeRepo {
    async fn get(&self, id: ThemeId) -> OptRepoResult<Theme> {
        let on_err = ThemeRepoError::Get(Reason::Db);
        let client = self.client(on_err).await?;
        let statement = sql::GET.prepare(&client).await.change_context(on_err)?;

        let theme = client
            .query_opt(&statement, &[&*id])
            .await
            .change_context(on_err)?
            .map(|row| row_to_theme(&row));
        Ok(theme)
    }

    async fn list(&self, list_criteria: ThemeListCriteria) -> RepoResult<Vec<Theme>> {
        let pagination =
            sanitize_pagination(&list_criteria, ThemeRepoError::List(Reason::Validation))?;

        let mut name = None;
        let mut by_parent = false;
        let mut parent = None;
        for filter in list_criteria.filters() {
            match filter {
                ThemeFilter::Name(n) => name = Some(n.as_str()),
                ThemeFilter::Parent(p) => {
                    by_parent = true;
                    parent = p.map(|p| *p);
                }
            }
        }

        let on_err = ThemeRepoError::List(Reason::Db);
        let client = self.client(on_err).await?;
        let statement = sql::LIST.prepare(&client).await.change_context(on_err)?;

        let rows = client
            .query(
                &statement,
                &[
                    &name,
                    &by_parent,
                    &parent,
                    &pagination.offset,
                    &pagination.limit,
                ],
            )
            .await
            .change_context(on_err)?;

        Ok(rows.iter().map(row_to_theme).collect())
    }

    async fn create(&self, new_theme: NewTheme) -> RepoResult<Theme> {
        let on_err = ThemeRepoError::Create(Reason::Db);
        let client = self.client(on_err).await?;
        let statement = sql::CREATE.prepare(&client).await.change_context(on_err)?;
        let parent_id = new_theme.parent_id.map(|p| *p);

        match client
            .query_one(&statement, &[&new_theme.name, &parent_id])
            .await
        {
            Ok(row) => Ok(row_to_theme(&row)),
            Err(e) if violation(&e) == Some(Violation::MissingReference) => Err(Report::new(e)
                .change_context(ThemeRepoError::Create(Reason::ParentNotFound))),
            Err(e) => Err(Report::new(e).change_context(on_err)),
        }
    }

    async fn patch(&self, id: ThemeId, patch: PatchTheme) -> OptRepoResult<Theme> {
        let on_err = ThemeRepoError::Patch(Reason::Db);
        let mut client = self.client(on_err).await?;
        let transaction = client.transaction().await.change_context(on_err)?;

        if let Some(new_parent) = patch.new_parent() {
            let statement = sql::IS_ANCESTOR
                .prepare_in(&transaction)
                .await
                .change_context(on_err)?;
            let is_ancestor: bool = transaction
                .query_one(&statement, &[&*new_parent, &*id])
                .await
                .change_context(on_err)?
                .get("is_ancestor");

            if is_ancestor {
                return Err(
                    Report::new(ThemeRepoError::Patch(Reason::CyclicParent)).attach(format!(
                        "theme {id} is {new_parent} or one of its ancestors"
                    )),
                );
            }
        }

        let (replace_parent, parent_id) = match patch.parent_id {
            Field::Present(parent) => (true, parent.map(|p| *p)),
            Field::Missing => (false, None),
        };

        let statement = sql::PATCH
            .prepare_in(&transaction)
            .await
            .change_context(on_err)?;
        let theme = match transaction
            .query_opt(&statement, &[&*id, &patch.name, &replace_parent, &parent_id])
            .await
        {
            Ok(row) => row.map(|row| row_to_theme(&row)),
            Err(e) if violation(&e) == Some(Violation::MissingReference) => {
                return Err(
                    Report::new(e).change_context(ThemeRepoError::Patch(Reason::ParentNotFound))
                );
            }
            Err(e) => return Err(Report::new(e).change_context(on_err)),
        };

        transaction.commit().await.change_context(on_err)?;
        Ok(theme)
    }

    async fn delete(&self, id: ThemeId) -> OptRepoResult<()> {
        let on_err = ThemeRepoError::Delete(Reason::Db);
        let client = self.client(on_err).await?;
        let statement = sql::DELETE.prepare(&client).await.change_context(on_err)?;

        let deleted = client
            .execute(&statement, &[&*id])
            .await
            .change_context(on_err)?;

        Ok((deleted > 0).then_some(()))
    }
}

impl BulkInsert<ThemeImport> for ThemeRepo {
    async fn bulk_insert(&self, batch: Vec<ThemeImport>) -> Result<usize, Report<InsertError>> {
        let mut client = self.pool.get().await.change_context(InsertError::Store)?;
        let transaction = client
            .transaction()
            .await
            .change_context(InsertError::Store)?;

        let mut inserted = 0;
        for insert in theme_inserts(batch) {
            inserted += transaction
                .execute(insert.query.as_str(), &insert.params())
                .await
                .map_err(insert_error)?;
        }

        let statement = sql::SYNC_IDENTITY
            .prepare_in(&transaction)
            .await
            .change_context(InsertError::Store)?;
        transaction
            .query_one(&statement, &[])
            .await
            .change_context(InsertError::Store)?;

        transaction.commit().await.change_context(InsertError::Store)?;
        debug!("inserted {inserted} themes");
        usize::try_from(inserted).change_context(InsertError::Store)
    }
}
