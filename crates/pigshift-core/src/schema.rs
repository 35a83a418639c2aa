//! Translation of Pig `.pig_schema` documents into Redshift column definitions.
//!
//! Pig writes a JSON schema next to job output when storing with
//! `PigStorage('-schema')`. Each field carries a numeric type code from Pig's
//! `DataType` class and a name that may be prefixed with the aliases of the
//! joins that produced it (`table_2::table_1::my_alias`).
//!
//! # Examples
//!
//! ```
//! use pigshift_core::schema::translate;
//! use pigshift_core::types::ColumnDefinition;
//!
//! let schema = r#"{"fields":[{"name":"t2::t1::id","type":10},{"name":"amount","type":25}]}"#;
//! let keys = [ColumnDefinition::new("PRIMARY KEY", "(id)")];
//!
//! let columns = translate(schema, 1, &keys).unwrap();
//! assert_eq!(columns[0].as_pair(), ("t1_id", "integer"));
//! assert_eq!(columns[1].as_pair(), ("amount", "float8"));
//! assert_eq!(columns[2].as_pair(), ("PRIMARY KEY", "(id)"));
//! ```

use serde::Deserialize;

use crate::error::{Result, SchemaError};
use crate::types::ColumnDefinition;

/// Separator Pig places between alias segments in a field name.
pub const ALIAS_SEPARATOR: &str = "::";

/// Pig scalar types that have a Redshift counterpart.
///
/// Codes follow `org.apache.pig.data.DataType`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PigType {
    /// `boolean` (5)
    Boolean,
    /// `int` (10)
    Integer,
    /// `long` (15)
    Long,
    /// `float` (20)
    Float,
    /// `double` (25)
    Double,
    /// `datetime` (30)
    DateTime,
    /// `bytearray` (50)
    ByteArray,
    /// `chararray` (55)
    CharArray,
    /// `biginteger` (65)
    BigInteger,
}

impl PigType {
    /// Looks up a Pig type by its numeric code.
    ///
    /// ```
    /// use pigshift_core::schema::PigType;
    ///
    /// assert_eq!(PigType::from_code(55), Some(PigType::CharArray));
    /// assert_eq!(PigType::from_code(110), None); // tuple
    /// ```
    #[must_use]
    pub fn from_code(code: i64) -> Option<Self> {
        let pig_type = match code {
            5 => Self::Boolean,
            10 => Self::Integer,
            15 => Self::Long,
            20 => Self::Float,
            25 => Self::Double,
            30 => Self::DateTime,
            50 => Self::ByteArray,
            55 => Self::CharArray,
            65 => Self::BigInteger,
            _ => return None,
        };
        Some(pig_type)
    }

    /// Returns the Redshift column type used when loading this Pig type.
    #[must_use]
    pub fn redshift_type(&self) -> &'static str {
        match self {
            Self::Boolean => "boolean",
            Self::Integer => "integer",
            Self::Long | Self::BigInteger => "bigint",
            Self::Float | Self::Double => "float8",
            Self::DateTime => "timestamp",
            Self::ByteArray | Self::CharArray => "varchar(max)",
        }
    }
}

/// A parsed `.pig_schema` document.
///
/// Only the field list is retained; the other keys Pig writes are ignored.
#[derive(Debug, Clone, Deserialize)]
pub struct PigSchema {
    /// Fields in output order
    pub fields: Vec<PigField>,
}

/// A single field descriptor from a `.pig_schema` document.
#[derive(Debug, Clone, Deserialize)]
pub struct PigField {
    /// Field name, possibly prefixed with `::`-separated aliases
    pub name: String,
    /// Pig `DataType` code
    ///
    /// Kept as a raw JSON number so that integers outside the `i64` range are
    /// reported as unsupported codes rather than as a malformed document.
    #[serde(rename = "type")]
    pub type_code: serde_json::Number,
}

impl PigField {
    /// Translates this field into a column definition.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError::UnsupportedType`] if the type code has no mapping.
    pub fn to_column(&self, alias_depth: usize) -> Result<ColumnDefinition> {
        let pig_type = self
            .type_code
            .as_i64()
            .and_then(PigType::from_code)
            .ok_or_else(|| SchemaError::UnsupportedType {
                code: self.type_code.to_string(),
                field: self.name.clone(),
            })?;
        Ok(ColumnDefinition::new(
            column_name(&self.name, alias_depth),
            pig_type.redshift_type(),
        ))
    }
}

/// Parses a `.pig_schema` document.
///
/// # Errors
///
/// Returns [`SchemaError::Malformed`] if the document is not JSON or lacks the
/// `fields` list, or a field lacks `name` or a numeric `type`.
pub fn parse_schema(document: &str) -> Result<PigSchema> {
    serde_json::from_str(document).map_err(|e| {
        SchemaError::Malformed {
            reason: e.to_string(),
        }
        .into()
    })
}

/// Derives a column name from a Pig field name.
///
/// Keeps the innermost `alias_depth + 1` segments and joins them with `_`.
/// Names with fewer segments are kept whole.
///
/// ```
/// use pigshift_core::schema::column_name;
///
/// assert_eq!(column_name("table_2::table_1::my_alias", 1), "table_1_my_alias");
/// assert_eq!(column_name("table_2::table_1::my_alias", 0), "my_alias");
/// assert_eq!(column_name("table_2::table_1::my_alias", 7), "table_2_table_1_my_alias");
/// ```
#[must_use]
pub fn column_name(field_name: &str, alias_depth: usize) -> String {
    let segments: Vec<&str> = field_name.split(ALIAS_SEPARATOR).collect();
    let keep = alias_depth.saturating_add(1).min(segments.len());
    segments[segments.len() - keep..].join("_")
}

/// Translates a `.pig_schema` document into Redshift column definitions.
///
/// Columns come out in field order, followed by `extra_keys` unchanged.
///
/// # Errors
///
/// Returns [`SchemaError::Malformed`] for an unparseable document and
/// [`SchemaError::UnsupportedType`] if any field has an unknown type code. No
/// partial column list is returned in either case.
pub fn translate(
    document: &str,
    alias_depth: usize,
    extra_keys: &[ColumnDefinition],
) -> Result<Vec<ColumnDefinition>> {
    let schema = parse_schema(document)?;
    let mut columns = schema
        .fields
        .iter()
        .map(|field| field.to_column(alias_depth))
        .collect::<Result<Vec<_>>>()?;
    columns.extend_from_slice(extra_keys);
    Ok(columns)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PigshiftError;

    const EXAMPLE: &str =
        r#"{"fields":[{"name":"t2::t1::id","type":10},{"name":"amount","type":25}]}"#;

    fn primary_key() -> Vec<ColumnDefinition> {
        vec![ColumnDefinition::new("PRIMARY KEY", "(id)")]
    }

    #[test]
    fn test_translate_example() {
        let columns = translate(EXAMPLE, 1, &primary_key()).unwrap();
        let pairs: Vec<_> = columns.iter().map(ColumnDefinition::as_pair).collect();
        assert_eq!(
            pairs,
            vec![
                ("t1_id", "integer"),
                ("amount", "float8"),
                ("PRIMARY KEY", "(id)")
            ]
        );
    }

    #[test]
    fn test_translate_unknown_type_aborts() {
        let schema = r#"{"fields":[{"name":"t2::t1::id","type":10},{"name":"amount","type":999}]}"#;
        let err = translate(schema, 1, &primary_key()).unwrap_err();
        match err {
            PigshiftError::Schema(SchemaError::UnsupportedType { code, field }) => {
                assert_eq!(code, "999");
                assert_eq!(field, "amount");
            },
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_translate_unknown_type_first_field() {
        let schema = r#"{"fields":[{"name":"id","type":999},{"name":"amount","type":25}]}"#;
        let err = translate(schema, 1, &[]).unwrap_err();
        assert!(err.to_string().contains("999"));
    }

    #[test]
    fn test_translate_length_and_order() {
        let schema = r#"{"fields":[
            {"name":"a","type":5},
            {"name":"b","type":15},
            {"name":"c","type":30},
            {"name":"d","type":55}
        ]}"#;
        let keys = vec![
            ColumnDefinition::new("PRIMARY KEY", "(a)"),
            ColumnDefinition::new("UNIQUE", "(b, c)"),
        ];
        let columns = translate(schema, 1, &keys).unwrap();
        assert_eq!(columns.len(), 4 + keys.len());
        let names: Vec<_> = columns.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["a", "b", "c", "d", "PRIMARY KEY", "UNIQUE"]);
        assert_eq!(&columns[4..], keys.as_slice());
    }

    #[test]
    fn test_translate_ignores_extra_schema_keys() {
        let schema = r#"{
            "fields":[{"name":"user::name","type":55,"description":"autogenerated","schema":null}],
            "version":0,
            "sortKeys":[],
            "sortKeyOrders":[]
        }"#;
        let columns = translate(schema, 0, &[]).unwrap();
        assert_eq!(columns, vec![ColumnDefinition::new("name", "varchar(max)")]);
    }

    #[test]
    fn test_translate_out_of_range_code_is_unsupported() {
        for raw in ["18446744073709551615", "10.5"] {
            let schema = format!(r#"{{"fields":[{{"name":"id","type":{raw}}}]}}"#);
            match translate(&schema, 1, &[]).unwrap_err() {
                PigshiftError::Schema(SchemaError::UnsupportedType { code, field }) => {
                    assert_eq!(code, raw);
                    assert_eq!(field, "id");
                },
                other => panic!("unexpected error for {raw}: {other:?}"),
            }
        }
    }

    #[test]
    fn test_translate_empty_fields() {
        let columns = translate(r#"{"fields":[]}"#, 1, &primary_key()).unwrap();
        assert_eq!(columns, primary_key());
    }

    #[test]
    fn test_parse_schema_malformed() {
        for document in [
            "not json",
            r#"{"columns":[]}"#,
            r#"{"fields":[{"name":"id"}]}"#,
            r#"{"fields":[{"type":10}]}"#,
            r#"{"fields":[{"name":"id","type":"int"}]}"#,
            r#"[1, 2, 3]"#,
        ] {
            let err = parse_schema(document).unwrap_err();
            assert!(
                matches!(err, PigshiftError::Schema(SchemaError::Malformed { .. })),
                "expected malformed error for {document}, got {err:?}"
            );
        }
    }

    #[test]
    fn test_column_name_depths() {
        let name = "table_2::table_1::my_alias";
        assert_eq!(column_name(name, 0), "my_alias");
        assert_eq!(column_name(name, 1), "table_1_my_alias");
        assert_eq!(column_name(name, 2), "table_2_table_1_my_alias");
        assert_eq!(column_name(name, usize::MAX), "table_2_table_1_my_alias");
        assert_eq!(column_name("plain", 3), "plain");
    }

    #[test]
    fn test_column_name_segment_bound() {
        let name = "a::b::c::d::e";
        for depth in 0..8 {
            let column = column_name(name, depth);
            let kept = column.split('_').count();
            assert!(kept <= depth + 1);
            if depth >= 4 {
                assert_eq!(column, name.replace(ALIAS_SEPARATOR, "_"));
            }
        }
    }

    #[test]
    fn test_type_table() {
        let expected = [
            (5, "boolean"),
            (10, "integer"),
            (15, "bigint"),
            (20, "float8"),
            (25, "float8"),
            (30, "timestamp"),
            (50, "varchar(max)"),
            (55, "varchar(max)"),
            (65, "bigint"),
        ];
        for (code, sql_type) in expected {
            let pig_type = PigType::from_code(code).expect("known code");
            assert_eq!(pig_type.redshift_type(), sql_type, "code {code}");
        }
        for code in [0, 1, 6, 70, 100, 110, 120, -5] {
            assert_eq!(PigType::from_code(code), None, "code {code}");
        }
    }
}
