//! Preparing a Redshift load from Pig job output.
//!
//! [`CopyPigOutputToRedshift`] reads the `.pig_schema` file that Pig writes
//! next to its output and turns it into the column list of the target table.
//! Executing the resulting statements is left to the host.

use std::fmt;
use std::sync::Arc;

use log::info;
use object_store::ObjectStore;
use object_store::path::Path as ObjectPath;

use crate::config::RedshiftCredentials;
use crate::error::{Result, SchemaError};
use crate::schema::translate;
use crate::types::ColumnDefinition;

/// Alias depth used unless a task overrides it.
pub const DEFAULT_ALIAS_DEPTH: usize = 1;

/// Supplies the location of a Pig schema file inside the injected store.
///
/// The task only knows where the Pig job wrote its output, not how the store
/// was opened. Implement this for whatever describes that output (a job
/// handle, a config entry) so the location stays relative to the store passed
/// to [`CopyPigOutputToRedshift::prepare`]. A bare [`ObjectPath`] is enough when
/// the location is already known.
pub trait SchemaLocationProvider: Send + Sync {
    /// Location of the `.pig_schema` file.
    fn schema_location(&self) -> ObjectPath;
}

impl SchemaLocationProvider for ObjectPath {
    fn schema_location(&self) -> ObjectPath {
        self.clone()
    }
}

/// Reads a schema document in full.
///
/// # Errors
///
/// Returns [`SchemaError::MissingSource`] if nothing exists at `location`,
/// [`SchemaError::Read`] if the store fails, and [`SchemaError::Malformed`] if
/// the contents are not UTF-8.
pub async fn read_schema_document(
    store: Arc<dyn ObjectStore>,
    location: &ObjectPath,
) -> Result<String> {
    let read_error = |source| SchemaError::Read {
        location: location.to_string(),
        source,
    };
    match store.head(location).await {
        Ok(meta) => info!("Found schema file {location} ({} bytes)", meta.size),
        Err(object_store::Error::NotFound { .. }) => {
            return Err(SchemaError::MissingSource {
                location: location.to_string(),
            }
            .into());
        },
        Err(source) => return Err(read_error(source).into()),
    }

    let data = store
        .get(location)
        .await
        .map_err(read_error)?
        .bytes()
        .await
        .map_err(read_error)?;
    String::from_utf8(data.to_vec()).map_err(|e| {
        SchemaError::Malformed {
            reason: format!("schema file is not UTF-8: {e}"),
        }
        .into()
    })
}

/// A load of Pig output into a Redshift table whose columns come from the
/// Pig schema file.
#[derive(Debug, Clone)]
pub struct CopyPigOutputToRedshift<P> {
    provider: P,
    table: String,
    alias_depth: usize,
    table_keys: Vec<ColumnDefinition>,
    copy_options: String,
}

impl<P: SchemaLocationProvider> CopyPigOutputToRedshift<P> {
    /// Creates a load into `table` using the schema found through `provider`.
    #[must_use]
    pub fn new(table: impl Into<String>, provider: P) -> Self {
        Self {
            provider,
            table: table.into(),
            alias_depth: DEFAULT_ALIAS_DEPTH,
            table_keys: Vec::new(),
            copy_options: String::new(),
        }
    }

    /// Sets how many alias segments beyond the innermost one are kept.
    #[must_use]
    pub fn with_alias_depth(mut self, alias_depth: usize) -> Self {
        self.alias_depth = alias_depth;
        self
    }

    /// Appends a key clause, e.g. `("PRIMARY KEY", "(id1, id2)")`.
    #[must_use]
    pub fn with_table_key(mut self, key: impl Into<String>, columns: impl Into<String>) -> Self {
        self.table_keys.push(ColumnDefinition::new(key, columns));
        self
    }

    /// Sets the options appended to the `COPY` statement.
    #[must_use]
    pub fn with_copy_options(mut self, copy_options: impl Into<String>) -> Self {
        self.copy_options = copy_options.into();
        self
    }

    /// Target table name.
    #[must_use]
    pub fn table(&self) -> &str {
        &self.table
    }

    /// Configured alias depth.
    #[must_use]
    pub fn alias_depth(&self) -> usize {
        self.alias_depth
    }

    /// Key clauses appended after the columns.
    #[must_use]
    pub fn table_keys(&self) -> &[ColumnDefinition] {
        &self.table_keys
    }

    /// Reads and translates the Pig schema into the table's column list.
    ///
    /// # Errors
    ///
    /// Propagates any [`SchemaError`] from reading or translating the schema.
    pub async fn resolve_columns(
        &self,
        store: Arc<dyn ObjectStore>,
    ) -> Result<Vec<ColumnDefinition>> {
        let location = self.provider.schema_location();
        let document = read_schema_document(store, &location).await?;
        let columns = translate(&document, self.alias_depth, &self.table_keys)?;
        info!(
            "Setting redshift columns as [{}] for table {}",
            columns
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(", "),
            self.table
        );
        Ok(columns)
    }

    /// Resolves the columns and returns the plan for the load.
    ///
    /// # Errors
    ///
    /// Propagates any [`SchemaError`] from [`Self::resolve_columns`].
    pub async fn prepare(&self, store: Arc<dyn ObjectStore>) -> Result<LoadPlan> {
        let columns = self.resolve_columns(store).await?;
        Ok(LoadPlan {
            table: self.table.clone(),
            columns,
            copy_options: self.copy_options.clone(),
        })
    }
}

/// Resolved table layout for a load, ready to be rendered as SQL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadPlan {
    /// Target table
    pub table: String,
    /// Columns followed by key clauses
    pub columns: Vec<ColumnDefinition>,
    /// Options appended to the `COPY` statement
    pub copy_options: String,
}

impl LoadPlan {
    /// Renders the `CREATE TABLE` statement for the target table.
    #[must_use]
    pub fn create_table_statement(&self) -> String {
        let definitions = self
            .columns
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(", ");
        format!("CREATE TABLE {} ({definitions})", self.table)
    }

    /// Renders the `COPY` statement loading `data_url` into the target table.
    #[must_use]
    pub fn copy_statement(&self, data_url: &str, credentials: &RedshiftCredentials) -> String {
        let statement = format!(
            "COPY {} from '{data_url}' CREDENTIALS '{credentials}'",
            self.table
        );
        let options = self.copy_options.trim();
        if options.is_empty() {
            format!("{statement};")
        } else {
            format!("{statement} {options};")
        }
    }
}

impl fmt::Display for LoadPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.create_table_statement())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PigshiftError;
    use object_store::memory::InMemory;

    const SCHEMA: &str = r#"{"fields":[
        {"name":"orders::customers::customer_id","type":10},
        {"name":"orders::total","type":25},
        {"name":"orders::placed_at","type":30}
    ]}"#;

    async fn store_with_schema(location: &str, document: &str) -> Arc<dyn ObjectStore> {
        let store: Arc<dyn ObjectStore> = Arc::new(InMemory::new());
        store
            .put(&ObjectPath::from(location), document.as_bytes().to_vec().into())
            .await
            .expect("write schema");
        store
    }

    fn credentials() -> RedshiftCredentials {
        RedshiftCredentials::new("AKIDEXAMPLE", "secret")
    }

    #[tokio::test]
    async fn test_resolve_columns() {
        let store = store_with_schema("out/.pig_schema", SCHEMA).await;
        let task = CopyPigOutputToRedshift::new("orders", ObjectPath::from("out/.pig_schema"))
            .with_table_key("PRIMARY KEY", "(customers_customer_id)");

        let columns = task.resolve_columns(store).await.unwrap();
        let pairs: Vec<_> = columns.iter().map(ColumnDefinition::as_pair).collect();
        assert_eq!(
            pairs,
            vec![
                ("customers_customer_id", "integer"),
                ("orders_total", "float8"),
                ("orders_placed_at", "timestamp"),
                ("PRIMARY KEY", "(customers_customer_id)"),
            ]
        );
    }

    #[tokio::test]
    async fn test_resolve_columns_alias_depth_zero() {
        let store = store_with_schema("out/.pig_schema", SCHEMA).await;
        let task = CopyPigOutputToRedshift::new("orders", ObjectPath::from("out/.pig_schema"))
            .with_alias_depth(0);

        let columns = task.resolve_columns(store).await.unwrap();
        let names: Vec<_> = columns.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["customer_id", "total", "placed_at"]);
    }

    #[tokio::test]
    async fn test_missing_schema_source() {
        let store: Arc<dyn ObjectStore> = Arc::new(InMemory::new());
        let task = CopyPigOutputToRedshift::new("orders", ObjectPath::from("out/.pig_schema"));

        let err = task.resolve_columns(store).await.unwrap_err();
        match err {
            PigshiftError::Schema(SchemaError::MissingSource { location }) => {
                assert_eq!(location, "out/.pig_schema");
            },
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_non_utf8_schema_is_malformed() {
        let store: Arc<dyn ObjectStore> = Arc::new(InMemory::new());
        store
            .put(&ObjectPath::from("bad"), vec![0xff, 0xfe, 0x00].into())
            .await
            .unwrap();

        let err = read_schema_document(store, &ObjectPath::from("bad"))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            PigshiftError::Schema(SchemaError::Malformed { .. })
        ));
    }

    #[tokio::test]
    async fn test_prepare_renders_statements() {
        let store = store_with_schema("out/.pig_schema", SCHEMA).await;
        let plan = CopyPigOutputToRedshift::new("orders", ObjectPath::from("out/.pig_schema"))
            .with_table_key("PRIMARY KEY", "(customers_customer_id)")
            .with_copy_options("delimiter '\\t' gzip")
            .prepare(store)
            .await
            .unwrap();

        assert_eq!(
            plan.create_table_statement(),
            "CREATE TABLE orders (customers_customer_id integer, orders_total float8, \
             orders_placed_at timestamp, PRIMARY KEY (customers_customer_id))"
        );
        assert_eq!(
            plan.copy_statement("s3://bucket/out", &credentials()),
            "COPY orders from 's3://bucket/out' CREDENTIALS \
             'aws_access_key_id=AKIDEXAMPLE;aws_secret_access_key=secret' delimiter '\\t' gzip;"
        );
    }

    #[test]
    fn test_copy_statement_without_options() {
        let plan = LoadPlan {
            table: "events".to_string(),
            columns: vec![ColumnDefinition::new("id", "bigint")],
            copy_options: String::new(),
        };
        assert_eq!(
            plan.copy_statement("s3://bucket/events", &credentials()),
            "COPY events from 's3://bucket/events' CREDENTIALS \
             'aws_access_key_id=AKIDEXAMPLE;aws_secret_access_key=secret';"
        );
        assert_eq!(plan.to_string(), "CREATE TABLE events (id bigint)");
    }
}
