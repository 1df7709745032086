use crate::postgres::sets::SetRepo;
use crate::postgres::themes::ThemeRepo;
use crate::postgres::{ConnectionDetails, RepoInitErr, RepoMigrationErr};
use deadpool_postgres::{Manager, ManagerConfig, Pool, RecyclingMethod};
use error_stack::{Report, ResultExt};
use std::str::FromStr;
use tokio_postgres::{Client, Config, NoTls};
use tracing::debug;

mod embedded {
    use refinery::embed_migrations;
    embed_migrations!("./src/postgres/migrations");
}

pub trait Init {
    type Repo;
    fn init(self, pool: Pool) -> impl Future<Output = Result<Self::Repo, Report<RepoInitErr>>>;
}

impl<T1, T2> Init for (T1, T2)
where
    T1: Init,
    T2: Init,
{
    type Repo = (T1::Repo, T2::Repo);

    async fn init(self, pool: Pool) -> Result<Self::Repo, Report<RepoInitErr>> {
        let r1 = self.0.init(pool.clone()).await?;
        let r2 = self.1.init(pool).await?;
        Ok((r1, r2))
    }
}

pub struct ThemeInit;
impl Init for ThemeInit {
    type Repo = ThemeRepo;

    async fn init(self, pool: Pool) -> Result<Self::Repo, Report<RepoInitErr>> {
        ThemeRepo::new(pool).await
    }
}

pub struct SetInit;
impl Init for SetInit {
    type Repo = SetRepo;

    async fn init(self, pool: Pool) -> Result<Self::Repo, Report<RepoInitErr>> {
        SetRepo::new(pool).await
    }
}

pub struct RepoCreator<T: Init> {
    initializer: T,
}

#[derive(Debug, thiserror::Error)]
#[error("failed to create repos")]
pub struct RepoCreationErr;

impl<T> RepoCreator<T>
where
    T: Init,
{
    pub async fn create(
        self,
        connection_details: ConnectionDetails,
        pool_size: Option<usize>,
    ) -> Result<T::Repo, Report<RepoCreationErr>> {
        let config = match connection_details {
            ConnectionDetails::Url(url) => {
                Config::from_str(&url).change_context(RepoCreationErr)?
            }
        };

        let mgr_config = ManagerConfig {
            recycling_method: RecyclingMethod::Fast,
        };
        let mgr = Manager::from_config(config, NoTls, mgr_config);
        let mut pool_builder = Pool::builder(mgr);
        if let Some(pool_size) = pool_size {
            pool_builder = pool_builder.max_size(pool_size);
        }
        debug!("building connection pool..");
        let pool = pool_builder.build().change_context(RepoCreationErr)?;
        debug!("connection pool built, running migrations");

        run_migrations(&pool)
            .await
            .change_context(RepoCreationErr)?;

        self.initializer
            .init(pool)
            .await
            .change_context(RepoCreationErr)
    }
}

// the migrations take a connection of their own, which has to be released before
// the repos are initialized in case `pool_size` is 1
async fn run_migrations(pool: &Pool) -> Result<(), Report<RepoMigrationErr>> {
    let mut handle = pool.get().await.change_context(RepoMigrationErr)?;
    let client: &mut Client = &mut handle;

    let report = embedded::migrations::runner()
        .run_async(client)
        .await
        .change_context(RepoMigrationErr)?;

    for migration in report.applied_migrations() {
        debug!("applied migration {migration}");
    }
    Ok(())
}

impl RepoCreator<ThemeInit> {
    pub fn new() -> Self {
        Self {
            initializer: ThemeInit,
        }
    }

    /// Sets reference themes, so both are created together
    pub fn with_sets(self) -> RepoCreator<(ThemeInit, SetInit)> {
        RepoCreator {
            initializer: (ThemeInit, SetInit),
        }
    }
}

impl Default for RepoCreator<ThemeInit> {
    fn default() -> Self {
        Self::new()
    }
}
