//! Configuration types for segment canonicalization.
//!
//! # Versioning
//!
//! The `version` field tracks changes to identifier or canonical-form
//! behavior. Parameter ids are a public identity other tooling depends on,
//! so any change that alters an id for the same input must bump the version.
//!
//! # Examples
//!
//! ```rust
//! use canonical::CanonicalizeConfig;
//!
//! let config = CanonicalizeConfig::default();
//! assert_eq!(config.version, 1);
//! assert_eq!(config.slug_separator, '-');
//! assert_eq!(config.resolved_prefix, "BIPA_");
//! assert_eq!(config.unresolved_prefix, "UNK_");
//! assert!(config.validate().is_ok());
//! ```

use serde::{Deserialize, Serialize};

use crate::error::CanonicalError;

/// Configuration for segment identifiers and canonical lookups.
///
/// ```json
/// {
///   "version": 1,
///   "slug_separator": "-",
///   "resolved_prefix": "BIPA_",
///   "unresolved_prefix": "UNK_"
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct CanonicalizeConfig {
    /// Version of the canonicalization behavior. Must be >= 1.
    pub version: u32,

    /// Replaces each run of non-alphanumeric characters in the readable half
    /// of an identifier. Must not be alphanumeric or `_`, since `_` joins the
    /// slug to the codepoint fingerprint.
    pub slug_separator: char,

    /// Parameter id prefix for segments the phonetic reference recognizes.
    pub resolved_prefix: String,

    /// Parameter id prefix for segments the phonetic reference rejects.
    pub unresolved_prefix: String,
}

impl CanonicalizeConfig {
    /// Checks the invariants identifiers rely on.
    pub fn validate(&self) -> Result<(), CanonicalError> {
        if self.version == 0 {
            return Err(CanonicalError::InvalidConfig(
                "config version must be >= 1".into(),
            ));
        }
        if self.slug_separator.is_alphanumeric() || self.slug_separator == '_' {
            return Err(CanonicalError::InvalidConfig(format!(
                "slug separator `{}` must not be alphanumeric or `_`",
                self.slug_separator
            )));
        }
        if self.resolved_prefix.is_empty() || self.unresolved_prefix.is_empty() {
            return Err(CanonicalError::InvalidConfig(
                "parameter id prefixes must not be empty".into(),
            ));
        }
        if self.resolved_prefix == self.unresolved_prefix {
            return Err(CanonicalError::InvalidConfig(
                "resolved and unresolved prefixes must differ".into(),
            ));
        }
        Ok(())
    }

    pub fn prefix(&self, resolved: bool) -> &str {
        if resolved {
            &self.resolved_prefix
        } else {
            &self.unresolved_prefix
        }
    }
}

impl Default for CanonicalizeConfig {
    fn default() -> Self {
        Self {
            version: 1,
            slug_separator: '-',
            resolved_prefix: "BIPA_".to_string(),
            unresolved_prefix: "UNK_".to_string(),
        }
    }
}
