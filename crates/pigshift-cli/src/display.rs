//! Display utilities for formatting CLI output.

use tabled::{Table, Tabled};

use pigshift_core::types::ColumnDefinition;

/// Table row representation for a resolved column or key clause.
#[derive(Tabled)]
pub struct ColumnRow {
    /// Position in the column list, starting at 1.
    #[tabled(rename = "#")]
    pub position: usize,
    /// Column name or key keyword.
    #[tabled(rename = "Column")]
    pub name: String,
    /// Redshift type or key body.
    #[tabled(rename = "Type")]
    pub sql_type: String,
}

/// Builds the table rows for a column list.
#[must_use]
pub fn column_rows(columns: &[ColumnDefinition]) -> Vec<ColumnRow> {
    columns
        .iter()
        .enumerate()
        .map(|(i, c)| ColumnRow {
            position: i + 1,
            name: c.name.clone(),
            sql_type: c.sql_type.clone(),
        })
        .collect()
}

/// Prints the column list as a table on standard output.
pub fn print_columns(columns: &[ColumnDefinition]) {
    println!("\nColumns ({} total):\n", columns.len());
    let table = Table::new(column_rows(columns)).to_string();
    println!("{table}");
}
