//! Error types for the sifter crate.
//!
//! Only configuration can fail. Once an engine is built, every stage is a
//! total function over its inputs.

use thiserror::Error;

/// Errors raised while loading or validating a view configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A filter definition has an empty key.
    #[error("filter definition has an empty key")]
    EmptyFilterKey,

    /// Two filter definitions share a key.
    #[error("duplicate filter key '{0}'")]
    DuplicateFilterKey(String),

    /// Options were given for a filter that is not a select.
    #[error("filter '{key}' of kind '{kind}' cannot declare options")]
    OptionsOnNonSelect { key: String, kind: String },

    /// A searchable field name is empty.
    #[error("searchable field names must not be empty")]
    EmptySearchField,

    /// The initial sort names no field.
    #[error("sort key must not be empty")]
    EmptySortKey,

    /// The configuration document is not valid JSON.
    #[error("invalid JSON configuration: {0}")]
    Json(#[from] serde_json::Error),

    /// The configuration document is not valid YAML.
    #[error("invalid YAML configuration: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// Result type for sifter configuration.
pub type Result<T> = std::result::Result<T, ConfigError>;
