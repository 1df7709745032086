use deadpool_postgres::{ClientWrapper, Transaction};
use error_stack::{Report, ResultExt};
use tokio_postgres::Statement;
use tokio_postgres::types::Type;

#[derive(Debug, thiserror::Error)]
#[error("failed to prepare {0} statement")]
pub struct StatementPrepareError(&'static str);

/// SQL prepared once per pooled connection and cached there.
pub struct StatementSql {
    name: &'static str,
    query: &'static str,
    types: &'static [Type],
}

impl StatementSql {
    pub async fn prepare(
        &self,
        client: &ClientWrapper,
    ) -> Result<Statement, Report<StatementPrepareError>> {
        client
            .prepare_typed_cached(self.query, self.types)
            .await
            .change_context(StatementPrepareError(self.name))
    }

    pub async fn prepare_in(
        &self,
        transaction: &Transaction<'_>,
    ) -> Result<Statement, Report<StatementPrepareError>> {
        transaction
            .prepare_typed_cached(self.query, self.types)
            .await
            .change_context(StatementPrepareError(self.name))
    }
}

pub mod themes {
    use super::*;

    pub const GET: StatementSql = StatementSql {
        name: "get theme",
        query: "select id, name, parent_id, created, updated from themes where id = $1",
        types: &[Type::INT8],
    };

    /// $1 name substring, $2 whether to filter on parent, $3 parent (null for roots)
    pub const LIST: StatementSql = StatementSql {
        name: "list themes",
        query: "select id, name, parent_id, created, updated from themes \
                where ($1::varchar is null or strpos(lower(name), lower($1)) > 0) \
                and (not $2 or parent_id is not distinct from $3) \
                order by id offset $4 limit $5",
        types: &[Type::VARCHAR, Type::BOOL, Type::INT8, Type::INT8, Type::INT8],
    };

    pub const CREATE: StatementSql = StatementSql {
        name: "create theme",
        query: "insert into themes (name, parent_id) values ($1, $2) \
                returning id, name, parent_id, created, updated",
        types: &[Type::VARCHAR, Type::INT8],
    };

    /// Whether theme $2 is $1 or one of its ancestors.
    pub const IS_ANCESTOR: StatementSql = StatementSql {
        name: "theme ancestry",
        query: "with recursive ancestors (id, parent_id) as ( \
                    select id, parent_id from themes where id = $1 \
                    union \
                    select t.id, t.parent_id from themes t join ancestors a on t.id = a.parent_id \
                ) \
                select exists (select 1 from ancestors where id = $2) as is_ancestor",
        types: &[Type::INT8, Type::INT8],
    };

    /// $3 tells whether $4 replaces the parent, null included.
    pub const PATCH: StatementSql = StatementSql {
        name: "patch theme",
        query: "update themes set \
                    name = coalesce($2, name), \
                    parent_id = case when $3 then $4 else parent_id end, \
                    updated = now() \
                where id = $1 \
                returning id, name, parent_id, created, updated",
        types: &[Type::INT8, Type::VARCHAR, Type::BOOL, Type::INT8],
    };

    pub const DELETE: StatementSql = StatementSql {
        name: "delete theme",
        query: "delete from themes where id = $1",
        types: &[Type::INT8],
    };

    /// Moves the identity past explicitly inserted ids.
    pub const SYNC_IDENTITY: StatementSql = StatementSql {
        name: "sync theme identity",
        query: "select setval(pg_get_serial_sequence('themes', 'id'), \
                    (select coalesce(max(id), 1) from themes))",
        types: &[],
    };

    pub const ALL: &[&StatementSql] = &[
        &GET,
        &LIST,
        &CREATE,
        &IS_ANCESTOR,
        &PATCH,
        &DELETE,
        &SYNC_IDENTITY,
    ];
}

pub mod sets {
    use super::*;

    pub const GET: StatementSql = StatementSql {
        name: "get set",
        query: "select id, num, name, year, num_parts, img_url, theme_id, created, updated \
                from sets where id = $1",
        types: &[Type::INT8],
    };

    pub const LIST: StatementSql = StatementSql {
        name: "list sets",
        query: "select id, num, name, year, num_parts, img_url, theme_id, created, updated \
                from sets \
                where ($1::varchar is null or strpos(lower(name), lower($1)) > 0) \
                and ($2::int8 is null or theme_id = $2) \
                order by id offset $3 limit $4",
        types: &[Type::VARCHAR, Type::INT8, Type::INT8, Type::INT8],
    };

    pub const CREATE: StatementSql = StatementSql {
        name: "create set",
        query: "insert into sets (num, name, year, num_parts, img_url, theme_id) \
                values ($1, $2, $3, $4, $5, $6) \
                returning id, num, name, year, num_parts, img_url, theme_id, created, updated",
        types: &[
            Type::VARCHAR,
            Type::VARCHAR,
            Type::INT4,
            Type::INT4,
            Type::VARCHAR,
            Type::INT8,
        ],
    };

    pub const PATCH: StatementSql = StatementSql {
        name: "patch set",
        query: "update sets set \
                    num = coalesce($2, num), \
                    name = coalesce($3, name), \
                    year = coalesce($4, year), \
                    num_parts = coalesce($5, num_parts), \
                    img_url = coalesce($6, img_url), \
                    theme_id = coalesce($7, theme_id), \
                    updated = now() \
                where id = $1 \
                returning id, num, name, year, num_parts, img_url, theme_id, created, updated",
        types: &[
            Type::INT8,
            Type::VARCHAR,
            Type::VARCHAR,
            Type::INT4,
            Type::INT4,
            Type::VARCHAR,
            Type::INT8,
        ],
    };

    pub const DELETE: StatementSql = StatementSql {
        name: "delete set",
        query: "delete from sets where id = $1",
        types: &[Type::INT8],
    };

    pub const ALL: &[&StatementSql] = &[&GET, &LIST, &CREATE, &PATCH, &DELETE];
}

/// Prepares every statement on one connection so bad SQL fails at startup.
pub async fn prepare_all(
    client: &ClientWrapper,
    statements: &[&StatementSql],
) -> Result<(), Report<StatementPrepareError>> {
    for statement in statements {
        statement.prepare(client).await?;
    }
    Ok(())
}
