//! Parameterized statement builder.
//!
//! SQL text can only be supplied as `&'static str`, so values coming from a
//! request have no path into the statement text: they are always carried as
//! bound parameters and rendered as `$n` placeholders.

use chrono::NaiveDate;
use serde_json::Value;
use sqlx::{
    postgres::{PgArguments, PgRow},
    Arguments, Executor, FromRow, Postgres,
};

use crate::database::error::SqlError;

/// A typed bind parameter. Every variant carries its own SQL type so that a
/// NULL still binds as the right column type.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    Int(Option<i32>),
    BigInt(Option<i64>),
    Float(Option<f64>),
    Text(Option<String>),
    Bool(Option<bool>),
    Date(Option<NaiveDate>),
    Json(Option<Value>),
    TextArray(Vec<String>),
    IntArray(Vec<i32>),
}

macro_rules! sql_value_from {
    ($ty:ty, $variant:ident) => {
        impl From<$ty> for SqlValue {
            fn from(v: $ty) -> Self {
                SqlValue::$variant(Some(v))
            }
        }

        impl From<Option<$ty>> for SqlValue {
            fn from(v: Option<$ty>) -> Self {
                SqlValue::$variant(v)
            }
        }
    };
}

sql_value_from!(i32, Int);
sql_value_from!(i64, BigInt);
sql_value_from!(f64, Float);
sql_value_from!(String, Text);
sql_value_from!(bool, Bool);
sql_value_from!(NaiveDate, Date);
sql_value_from!(Value, Json);

impl From<&str> for SqlValue {
    fn from(v: &str) -> Self {
        SqlValue::Text(Some(v.to_string()))
    }
}

impl From<Option<&str>> for SqlValue {
    fn from(v: Option<&str>) -> Self {
        SqlValue::Text(v.map(str::to_string))
    }
}

impl From<&String> for SqlValue {
    fn from(v: &String) -> Self {
        SqlValue::Text(Some(v.clone()))
    }
}

impl From<Vec<String>> for SqlValue {
    fn from(v: Vec<String>) -> Self {
        SqlValue::TextArray(v)
    }
}

impl From<Vec<i32>> for SqlValue {
    fn from(v: Vec<i32>) -> Self {
        SqlValue::IntArray(v)
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Segment {
    Text(&'static str),
    Param(SqlValue),
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SqlStatement {
    segments: Vec<Segment>,
}

impl SqlStatement {
    pub fn new(sql: &'static str) -> Self {
        Self {
            segments: vec![Segment::Text(sql)],
        }
    }

    pub fn push_sql(&mut self, sql: &'static str) -> &mut Self {
        self.segments.push(Segment::Text(sql));
        self
    }

    pub fn push_bind(&mut self, value: impl Into<SqlValue>) -> &mut Self {
        self.segments.push(Segment::Param(value.into()));
        self
    }

    /// Emit one placeholder per value, comma separated, for `IN (...)` lists.
    /// An empty list renders as `NULL` so the surrounding clause stays valid.
    pub fn push_bind_list<I, V>(&mut self, values: I) -> &mut Self
    where
        I: IntoIterator<Item = V>,
        V: Into<SqlValue>,
    {
        let mut empty = true;
        for value in values {
            if !empty {
                self.segments.push(Segment::Text(", "));
            }
            self.segments.push(Segment::Param(value.into()));
            empty = false;
        }
        if empty {
            self.segments.push(Segment::Text("NULL"));
        }
        self
    }

    /// Concatenate another statement; its placeholders are renumbered.
    pub fn append(&mut self, other: SqlStatement) -> &mut Self {
        self.segments.extend(other.segments);
        self
    }

    /// Render the statement text with `$1..$n` placeholders.
    pub fn sql(&self) -> String {
        let mut out = String::new();
        let mut index = 0;
        for segment in &self.segments {
            match segment {
                Segment::Text(text) => out.push_str(text),
                Segment::Param(_) => {
                    index += 1;
                    out.push('$');
                    out.push_str(&index.to_string());
                }
            }
        }
        out
    }

    pub fn values(&self) -> Vec<&SqlValue> {
        self.segments
            .iter()
            .filter_map(|s| match s {
                Segment::Param(v) => Some(v),
                Segment::Text(_) => None,
            })
            .collect()
    }

    pub fn param_count(&self) -> usize {
        self.values().len()
    }

    pub fn arguments(&self) -> PgArguments {
        let mut args = PgArguments::default();
        for value in self.values() {
            match value {
                SqlValue::Int(v) => args.add(*v),
                SqlValue::BigInt(v) => args.add(*v),
                SqlValue::Float(v) => args.add(*v),
                SqlValue::Text(v) => args.add(v.clone()),
                SqlValue::Bool(v) => args.add(*v),
                SqlValue::Date(v) => args.add(*v),
                SqlValue::Json(v) => args.add(v.clone()),
                SqlValue::TextArray(v) => args.add(v.clone()),
                SqlValue::IntArray(v) => args.add(v.clone()),
            }
        }
        args
    }

    pub async fn execute<'e, E>(&self, executor: E) -> Result<u64, SqlError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = self.sql();
        let result = sqlx::query_with(&sql, self.arguments()).execute(executor).await?;
        Ok(result.rows_affected())
    }

    pub async fn fetch_all<'e, T, E>(&self, executor: E) -> Result<Vec<T>, SqlError>
    where
        E: Executor<'e, Database = Postgres>,
        T: for<'r> FromRow<'r, PgRow> + Send + Unpin,
    {
        let sql = self.sql();
        let rows = sqlx::query_as_with::<_, T, _>(&sql, self.arguments())
            .fetch_all(executor)
            .await?;
        Ok(rows)
    }

    pub async fn fetch_optional<'e, T, E>(&self, executor: E) -> Result<Option<T>, SqlError>
    where
        E: Executor<'e, Database = Postgres>,
        T: for<'r> FromRow<'r, PgRow> + Send + Unpin,
    {
        let sql = self.sql();
        let row = sqlx::query_as_with::<_, T, _>(&sql, self.arguments())
            .fetch_optional(executor)
            .await?;
        Ok(row)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn placeholders_are_numbered_in_order() {
        let mut stmt = SqlStatement::new("SELECT * FROM project WHERE project_id = ");
        stmt.push_bind(7).push_sql(" AND name = ").push_bind("Caribou");
        assert_eq!(stmt.sql(), "SELECT * FROM project WHERE project_id = $1 AND name = $2");
        assert_eq!(stmt.values(), vec![&SqlValue::Int(Some(7)), &SqlValue::Text(Some("Caribou".into()))]);
    }

    #[test]
    fn bind_list_emits_one_placeholder_per_value() {
        let mut stmt = SqlStatement::new("DELETE FROM project_species WHERE project_id = ");
        stmt.push_bind(1).push_sql(" AND wldtaxonomic_units_id IN (");
        stmt.push_bind_list(vec![10, 11, 12]).push_sql(")");
        assert_eq!(
            stmt.sql(),
            "DELETE FROM project_species WHERE project_id = $1 AND wldtaxonomic_units_id IN ($2, $3, $4)"
        );
        assert_eq!(stmt.param_count(), 4);
    }

    #[test]
    fn empty_bind_list_renders_null() {
        let mut stmt = SqlStatement::new("SELECT 1 WHERE 1 IN (");
        stmt.push_bind_list(Vec::<i32>::new()).push_sql(")");
        assert_eq!(stmt.sql(), "SELECT 1 WHERE 1 IN (NULL)");
        assert_eq!(stmt.param_count(), 0);
    }

    #[test]
    fn append_renumbers_placeholders() {
        let mut outer = SqlStatement::new("SELECT ");
        outer.push_bind(1).push_sql(", ");
        let mut inner = SqlStatement::new("upper(");
        inner.push_bind("x").push_sql(")");
        outer.append(inner);
        assert_eq!(outer.sql(), "SELECT $1, upper($2)");
    }

    #[test]
    fn typed_nulls_keep_their_type() {
        let value: SqlValue = Option::<i32>::None.into();
        assert_eq!(value, SqlValue::Int(None));
        let value: SqlValue = Option::<&str>::None.into();
        assert_eq!(value, SqlValue::Text(None));
    }
}
