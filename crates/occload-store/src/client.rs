//! Store client trait and wire types.
//!
//! Defines the seam between the retry engine and whatever actually talks to
//! the relational store. Implementations own connections, credentials, and
//! statement construction; the engine only sees `execute_batch`.

use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// A single column value in a generated row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SqlValue {
    /// Integer column value.
    Integer(i64),
    /// Floating-point column value.
    Float(f64),
    /// Text column value.
    Text(String),
    /// Placeholder for column types the generator does not support.
    Null,
}

/// One row of a batch: column values in table order.
pub type Row = Vec<SqlValue>;

/// A client capable of writing row batches to a relational store.
///
/// A batch succeeds or fails as one unit; partial application is a backend
/// bug, not something the retry engine accounts for.
#[async_trait]
pub trait StoreClient: Send + Sync {
    /// Submit one batch of rows to `table`.
    async fn execute_batch(&self, table: &str, rows: &[Row]) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sql_value_serializes_untagged() {
        let row: Row = vec![
            SqlValue::Integer(41),
            SqlValue::Float(2.5),
            SqlValue::Text("user_41@test.com".into()),
            SqlValue::Null,
        ];
        let json = serde_json::to_string(&row).expect("row should serialize");
        assert_eq!(json, r#"[41,2.5,"user_41@test.com",null]"#);
    }
}
