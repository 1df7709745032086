use std::marker::PhantomData;

#[cfg(test)]
use dyn_eq::DynEq;
use itertools::Itertools;
use tokio_postgres::types::ToSql;

use crate::postgres::INSERT_CHUNK_SIZE;

#[cfg(not(test))]
pub trait InsertManyValue: ToSql + Send + Sync + 'static {}

#[cfg(not(test))]
impl<T> InsertManyValue for T where T: ToSql + Send + Sync + 'static {}

#[cfg(test)]
pub trait InsertManyValue: ToSql + Send + Sync + DynEq + 'static {}

#[cfg(test)]
impl<T> InsertManyValue for T where T: ToSql + Send + Sync + DynEq + 'static {}

/// One multi-row `INSERT` and its bind parameters, numbered row by row.
pub struct InsertMany {
    pub query: String,
    params: Vec<Box<dyn InsertManyValue>>,
}

impl InsertMany {
    pub fn params(&self) -> Vec<&(dyn ToSql + Sync)> {
        self.params
            .iter()
            .map(|p| &**p as &(dyn ToSql + Sync))
            .collect()
    }
}

/// `value_set![row.id => i64, row.name => String]`, one entry per column.
/// The types only pin the row shape so every row of a builder matches.
macro_rules! value_set {
    ($($val:expr => $t:ty),+ $(,)?) => {
        crate::postgres::insert_many::ValueSet::<_, ($($t,)+)>::new([$(crate::postgres::insert_many::Value::from($val)),+])
    };
}

pub(crate) use value_set;

pub struct Value(Box<dyn InsertManyValue>);

impl<T> From<T> for Value
where
    T: InsertManyValue,
{
    fn from(value: T) -> Self {
        Self(Box::new(value))
    }
}

pub struct ValueSet<const N: usize, T> {
    values: [Value; N],
    _phantom: PhantomData<T>,
}

impl<const N: usize, T> ValueSet<N, T> {
    pub fn new(values: [Value; N]) -> Self {
        Self {
            values,
            _phantom: PhantomData,
        }
    }
}

/// Splits rows into as few statements as the bind parameter limit allows.
pub struct InsertManyBuilder<const COLS: usize, T> {
    table: &'static str,
    col_names: [&'static str; COLS],
    rows_per_statement: usize,
    _phantom: PhantomData<T>,
}

impl<const COLS: usize, T> InsertManyBuilder<COLS, T> {
    pub fn new(table: &'static str, col_names: [&'static str; COLS]) -> Self {
        Self {
            table,
            col_names,
            rows_per_statement: INSERT_CHUNK_SIZE,
            _phantom: PhantomData,
        }
    }

    #[cfg(test)]
    pub fn rows_per_statement(mut self, rows: usize) -> Self {
        self.rows_per_statement = rows.max(1);
        self
    }

    /// No statements for no rows.
    pub fn build(&self, rows: impl IntoIterator<Item = ValueSet<COLS, T>>) -> Vec<InsertMany> {
        let columns = self.col_names.iter().join(",");
        let chunks = rows.into_iter().chunks(self.rows_per_statement);

        chunks
            .into_iter()
            .map(|chunk| self.statement(&columns, chunk))
            .collect()
    }

    fn statement(
        &self,
        columns: &str,
        rows: impl Iterator<Item = ValueSet<COLS, T>>,
    ) -> InsertMany {
        let mut query = format!("INSERT INTO {} ({columns}) VALUES ", self.table);
        let mut params = Vec::new();

        for (i, row) in rows.enumerate() {
            if i > 0 {
                query.push(',');
            }
            let first = i * COLS + 1;
            query.push('(');
            query.push_str(&(first..first + COLS).map(|p| format!("${p}")).join(","));
            query.push(')');

            params.extend(row.values.into_iter().map(|v| v.0));
        }

        InsertMany { query, params }
    }
}
