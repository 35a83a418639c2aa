//! Store and credential configuration.
//!
//! Credentials are never managed here: they are read from the host
//! environment (or passed explicitly) and handed to the `object_store`
//! builders untouched.

use std::fmt;
use std::sync::Arc;

use object_store::ObjectStore;
use object_store::path::Path as ObjectPath;
use url::Url;

use crate::error::{ConfigError, Result};

/// Environment variable prefixes understood by the `object_store` builders.
const STORE_ENV_PREFIXES: [&str; 3] = ["AWS_", "AZURE_", "GOOGLE_"];

/// Key/value options passed to the `object_store` builders.
///
/// Keys use the builders' lower-case names, e.g. `aws_access_key_id` or
/// `aws_region`. Later options override earlier ones with the same key.
#[derive(Clone, Default)]
pub struct StoreOptions {
    options: Vec<(String, String)>,
}

impl StoreOptions {
    /// Creates an empty option set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Collects store options from the process environment.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_vars(std::env::vars())
    }

    /// Collects store options from `AWS_*`, `AZURE_*` and `GOOGLE_*` variables.
    #[must_use]
    pub fn from_vars(vars: impl IntoIterator<Item = (String, String)>) -> Self {
        let options = vars
            .into_iter()
            .filter(|(key, _)| STORE_ENV_PREFIXES.iter().any(|p| key.starts_with(p)))
            .map(|(key, value)| (key.to_ascii_lowercase(), value))
            .collect();
        Self { options }
    }

    /// Adds or overrides a single option.
    #[must_use]
    pub fn with_option(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        let key = key.into().to_ascii_lowercase();
        self.options.retain(|(k, _)| *k != key);
        self.options.push((key, value.into()));
        self
    }

    /// Returns the value configured for `key`, if any.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.options
            .iter()
            .rev()
            .find(|(k, _)| k.eq_ignore_ascii_case(key))
            .map(|(_, v)| v.as_str())
    }

    /// Number of configured options.
    #[must_use]
    pub fn len(&self) -> usize {
        self.options.len()
    }

    /// Returns `true` if no option is configured.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.options.is_empty()
    }

    fn pairs(&self) -> impl Iterator<Item = (&str, &str)> {
        self.options.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl fmt::Debug for StoreOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // values may hold secrets
        f.debug_list()
            .entries(self.options.iter().map(|(k, _)| k))
            .finish()
    }
}

/// Turns a location string into a URL.
///
/// Strings with a scheme (`s3://`, `gs://`, `az://`, `memory://`, `file://`)
/// are parsed as is; anything else is treated as a local path.
///
/// # Errors
///
/// Returns [`ConfigError::InvalidOption`] for an empty location or one that
/// cannot be turned into a URL.
pub fn parse_location(location: &str) -> Result<Url> {
    let location = location.trim();
    if location.is_empty() {
        return Err(invalid("location", "must not be empty").into());
    }

    if location.contains("://") {
        return Url::parse(location).map_err(|e| {
            invalid("location", format!("'{location}' is not a valid URL: {e}")).into()
        });
    }

    let absolute = std::path::absolute(location)
        .map_err(|e| invalid("location", format!("cannot resolve '{location}': {e}")))?;
    Url::from_file_path(&absolute).map_err(|()| {
        invalid(
            "location",
            format!("'{}' is not a valid file path", absolute.display()),
        )
        .into()
    })
}

/// Opens the object store serving `location`, plus the path inside it.
///
/// # Errors
///
/// Returns a [`ConfigError`] if the location cannot be parsed or no store can
/// be built for its scheme.
pub fn open_store(
    location: &str,
    options: &StoreOptions,
) -> Result<(Arc<dyn ObjectStore>, ObjectPath)> {
    let url = parse_location(location)?;
    let (store, path) = object_store::parse_url_opts(&url, options.pairs()).map_err(|source| {
        ConfigError::Store {
            location: location.to_string(),
            source,
        }
    })?;
    Ok((Arc::from(store), path))
}

/// Splits a `NAME=VALUE` argument.
///
/// Only the first `=` separates; the value may contain more.
///
/// # Errors
///
/// Returns [`ConfigError::InvalidOption`] if there is no `=` or the name is empty.
pub fn parse_key_value(option: &str, raw: &str) -> Result<(String, String)> {
    let (name, value) = raw
        .split_once('=')
        .ok_or_else(|| invalid(option, format!("expected NAME=VALUE, got '{raw}'")))?;
    let name = name.trim();
    if name.is_empty() {
        return Err(invalid(option, format!("missing name in '{raw}'")).into());
    }
    Ok((name.to_string(), value.trim().to_string()))
}

/// AWS credentials embedded in a Redshift `COPY` statement.
#[derive(Clone)]
pub struct RedshiftCredentials {
    access_key_id: String,
    secret_access_key: String,
}

impl RedshiftCredentials {
    /// Variable holding the access key id.
    pub const ACCESS_KEY_ID: &'static str = "AWS_ACCESS_KEY_ID";
    /// Variable holding the secret access key.
    pub const SECRET_ACCESS_KEY: &'static str = "AWS_SECRET_ACCESS_KEY";

    /// Creates credentials from explicit values.
    #[must_use]
    pub fn new(access_key_id: impl Into<String>, secret_access_key: impl Into<String>) -> Self {
        Self {
            access_key_id: access_key_id.into(),
            secret_access_key: secret_access_key.into(),
        }
    }

    /// Reads credentials from the process environment.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingRequired`] naming the first unset variable.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads credentials through `lookup`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingRequired`] naming the first missing key.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let required = |key: &str| {
            lookup(key)
                .filter(|v| !v.is_empty())
                .ok_or_else(|| ConfigError::MissingRequired {
                    option: key.to_string(),
                })
        };
        Ok(Self::new(
            required(Self::ACCESS_KEY_ID)?,
            required(Self::SECRET_ACCESS_KEY)?,
        ))
    }

    /// The access key id.
    #[must_use]
    pub fn access_key_id(&self) -> &str {
        &self.access_key_id
    }
}

impl fmt::Display for RedshiftCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "aws_access_key_id={};aws_secret_access_key={}",
            self.access_key_id, self.secret_access_key
        )
    }
}

impl fmt::Debug for RedshiftCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RedshiftCredentials")
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &"<redacted>")
            .finish()
    }
}

fn invalid(option: &str, message: impl Into<String>) -> ConfigError {
    ConfigError::InvalidOption {
        option: option.to_string(),
        message: message.into(),
    }
}
