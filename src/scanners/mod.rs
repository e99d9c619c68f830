//! Scanner definitions
//!
//! Definitions are loaded from a YAML file with a top-level `scanners:` list.
//! Each entry uses the persisted field names (`imageTag`, `cmd`, `type`,
//! `default`, `timeOutSeconds`).

pub mod registry;

pub use registry::{RegistryError, ScannerQuery, ScannerRegistry};
