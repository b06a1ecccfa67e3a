//! Post-processing of raw driver rows into driver-independent shapes.

use crate::row::Row;
use crate::value::SqlValue;

/// Normalizes driver-specific result rows.
pub trait Processor: Send + Sync {
    /// Key holding the column name in a column-listing row.
    fn column_listing_key(&self) -> &'static str;

    /// Extracts column names, preserving row order. Rows without the key
    /// are skipped.
    fn process_column_listing(&self, rows: Vec<Row>) -> Vec<String> {
        let key = self.column_listing_key();
        rows.into_iter()
            .filter_map(|row| row.get(key).map(value_to_name))
            .collect()
    }

    /// Extracts table or view names from the first column of each row.
    fn process_table_listing(&self, rows: Vec<Row>) -> Vec<String> {
        rows.into_iter()
            .filter_map(|row| row.get_index(0).map(value_to_name))
            .collect()
    }

    /// Reads the generated key from a `returning` row.
    fn process_insert_get_id(&self, rows: &[Row], sequence: Option<&str>) -> Option<i64> {
        let row = rows.first()?;
        sequence
            .and_then(|key| row.get(key))
            .or_else(|| row.get_index(0))
            .and_then(SqlValue::as_i64)
    }
}

fn value_to_name(value: &SqlValue) -> String {
    match value {
        SqlValue::Text(name) => name.clone(),
        SqlValue::Blob(bytes) => String::from_utf8_lossy(bytes).into_owned(),
        other => other.to_string(),
    }
}

/// MySQL reads `information_schema` rows keyed by `column_name`.
#[derive(Debug, Clone, Copy, Default)]
pub struct MySqlProcessor;

impl Processor for MySqlProcessor {
    fn column_listing_key(&self) -> &'static str {
        "column_name"
    }
}

/// PostgreSQL reads `information_schema` rows keyed by `column_name`.
#[derive(Debug, Clone, Copy, Default)]
pub struct PostgresProcessor;

impl Processor for PostgresProcessor {
    fn column_listing_key(&self) -> &'static str {
        "column_name"
    }
}

/// SQLite reads `pragma table_info` rows keyed by `name`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SqliteProcessor;

impl Processor for SqliteProcessor {
    fn column_listing_key(&self) -> &'static str {
        "name"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rows(key: &str, names: &[&str]) -> Vec<Row> {
        names
            .iter()
            .map(|name| Row::new().with(key, *name))
            .collect()
    }

    #[test]
    fn test_column_listing_per_dialect() {
        assert_eq!(
            MySqlProcessor.process_column_listing(rows("column_name", &["id", "name"])),
            vec!["id", "name"]
        );
        assert_eq!(
            SqliteProcessor.process_column_listing(rows("name", &["id", "name"])),
            vec!["id", "name"]
        );
    }

    #[test]
    fn test_column_listing_of_empty_cursor() {
        assert!(PostgresProcessor.process_column_listing(Vec::new()).is_empty());
    }

    #[test]
    fn test_pragma_rows_keep_their_order() {
        let pragma = vec![
            Row::new().with("cid", 0).with("name", "id").with("type", "INTEGER"),
            Row::new().with("cid", 1).with("name", "name").with("type", "TEXT"),
        ];
        assert_eq!(SqliteProcessor.process_column_listing(pragma), vec!["id", "name"]);
    }

    #[test]
    fn test_insert_get_id_reads_returning_row() {
        let returned = vec![Row::new().with("id", 42)];
        assert_eq!(
            PostgresProcessor.process_insert_get_id(&returned, Some("id")),
            Some(42)
        );
        assert_eq!(PostgresProcessor.process_insert_get_id(&[], None), None);
    }
}
