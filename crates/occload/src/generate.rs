//! Random row generation.
//!
//! The load is synthetic: rows are fabricated to match a column layout, the
//! way the table's schema would describe it. Generation draws from a seeded
//! RNG so a run's payload is reproducible alongside its jitter sequence.

use occload_store::{Row, SqlValue};
use rand::Rng;
use rand::SeedableRng;
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};

/// Column types the generator can fabricate values for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnType {
    /// Integer column; values in `[0, 100000)`.
    Integer,
    /// Numeric / floating-point column; values in `[0, 1000)`.
    Numeric,
    /// Text column; synthetic email addresses.
    Text,
    /// Anything else; filled with NULL.
    Unsupported,
}

/// Generates random rows matching a fixed column layout.
pub struct DataGenerator {
    columns: Vec<ColumnType>,
    rng: StdRng,
}

impl DataGenerator {
    /// Create a generator for `columns`, seeded for reproducibility.
    pub fn new(columns: Vec<ColumnType>, seed: u64) -> Self {
        Self {
            columns,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// The layout the original load script used: an id, a measurement, and
    /// an email-shaped text column.
    pub fn default_layout() -> Vec<ColumnType> {
        vec![ColumnType::Integer, ColumnType::Numeric, ColumnType::Text]
    }

    /// Fabricate one row.
    pub fn row(&mut self) -> Row {
        let Self { columns, rng } = self;
        columns
            .iter()
            .map(|column| match column {
                ColumnType::Integer => SqlValue::Integer(rng.gen_range(0..100_000)),
                ColumnType::Numeric => SqlValue::Float(rng.r#gen::<f64>() * 1000.0),
                ColumnType::Text => {
                    SqlValue::Text(format!("user_{}@test.com", rng.gen_range(0..100_000)))
                }
                ColumnType::Unsupported => SqlValue::Null,
            })
            .collect()
    }

    /// Fabricate a batch of `rows` rows.
    pub fn batch(&mut self, rows: usize) -> Vec<Row> {
        (0..rows).map(|_| self.row()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rows_match_layout() {
        let mut generator = DataGenerator::new(
            vec![
                ColumnType::Integer,
                ColumnType::Numeric,
                ColumnType::Text,
                ColumnType::Unsupported,
            ],
            1,
        );

        let row = generator.row();
        assert_eq!(row.len(), 4);
        assert!(matches!(row[0], SqlValue::Integer(v) if (0..100_000).contains(&v)));
        assert!(matches!(row[1], SqlValue::Float(v) if (0.0..1000.0).contains(&v)));
        assert!(matches!(&row[2], SqlValue::Text(t) if t.starts_with("user_") && t.ends_with("@test.com")));
        assert_eq!(row[3], SqlValue::Null);
    }

    #[test]
    fn test_batch_shape() {
        let mut generator = DataGenerator::new(DataGenerator::default_layout(), 2);
        let batch = generator.batch(50);
        assert_eq!(batch.len(), 50);
        assert!(batch.iter().all(|row| row.len() == 3));
    }

    #[test]
    fn test_same_seed_same_payload() {
        let layout = DataGenerator::default_layout;
        let first = DataGenerator::new(layout(), 99).batch(10);
        let second = DataGenerator::new(layout(), 99).batch(10);
        let different = DataGenerator::new(layout(), 100).batch(10);

        assert_eq!(first, second);
        assert_ne!(first, different);
    }
}
