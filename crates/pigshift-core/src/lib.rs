//! `pigshift-core` provides the two helper task types of the `pigshift` project.
//!
//! This crate includes:
//! - **Schema translation**: turning the `.pig_schema` file written by Pig into
//!   Redshift column definitions ([`schema`], [`redshift`]).
//! - **Single-file transfer**: idempotent upload and download of one named file
//!   between local disk and an object store ([`transfer`]).
//!
//! Scheduling and retries belong to the orchestration host; every operation
//! here is a single unit of work that reports failures to its caller.

pub mod config;
pub mod error;
pub mod redshift;
pub mod schema;
pub mod transfer;
pub mod types;

pub use error::{PigshiftError, Result};
