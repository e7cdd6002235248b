//! Identifier quoting boundary.

/// Quotes identifiers for the target database.
///
/// Quoting policy belongs to the connection, so the DDL generator only ever
/// calls through this trait.
pub trait Quoter {
    /// Quote a table name.
    fn quote_table_name(&self, name: &str) -> String;

    /// Quote a column or constraint name.
    fn quote_column_name(&self, name: &str) -> String;
}
