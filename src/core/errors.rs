//! Error types for the identity-swapping components.
//!
//! This module defines the errors that can occur while building the
//! configuration registry, composing the shared-encoder model, or running
//! the pixel processors. Errors always identify the offending
//! section/option or network by name so that a failure surfaced to the
//! caller is actionable without a debugger. Utility constructors are
//! provided for the most common cases.

use std::path::{Path, PathBuf};
use thiserror::Error;

/// Convenient result alias for identity-swap operations.
pub type SwapResult<T> = Result<T, SwapError>;

/// Errors that can occur in the configuration registry, the model
/// composition engine, or the pixel processors.
#[derive(Error, Debug)]
pub enum SwapError {
    /// A section with the same title has already been registered.
    #[error("section '{title}' has already been registered")]
    DuplicateSection {
        /// The duplicated section title.
        title: String,
    },

    /// An option with the same title already exists in the section.
    #[error("option '{title}' already exists in section '{section}'")]
    DuplicateOption {
        /// The section the option was being added to.
        section: String,
        /// The duplicated option title.
        title: String,
    },

    /// The requested section does not exist in the registry.
    #[error("unknown section '{title}'")]
    UnknownSection {
        /// The missing section title.
        title: String,
    },

    /// The requested option does not exist in the section.
    #[error("unknown option '{title}' in section '{section}'")]
    UnknownOption {
        /// The section that was searched.
        section: String,
        /// The missing option title.
        title: String,
    },

    /// A value assignment failed validation. The stored value is unchanged.
    #[error("invalid value for '{section}.{title}': {message}")]
    InvalidValue {
        /// The section containing the option.
        section: String,
        /// The option title.
        title: String,
        /// The constraint that was violated.
        message: String,
    },

    /// A plugin defaults module could not be loaded into the registry.
    /// This aborts the entire registry build; partial schemas are never
    /// exposed.
    #[error("defaults module '{module}' is malformed: {message}")]
    MalformedDefaults {
        /// The `<plugin_type>.<name>` label of the module.
        module: String,
        /// What was wrong with it.
        message: String,
    },

    /// The persisted configuration text could not be parsed.
    #[error("config parse error at line {line}: {message}")]
    ConfigParse {
        /// 1-based line number in the persisted text.
        line: usize,
        /// A message describing the syntax problem.
        message: String,
    },

    /// A sub-network or predictor graph could not be constructed.
    #[error("failed to build graph '{network}': {message}")]
    GraphConstruction {
        /// The name of the network being built.
        network: String,
        /// A message describing the structural problem.
        message: String,
    },

    /// Error indicating invalid input (shape mismatches, empty batches).
    #[error("invalid input: {message}")]
    InvalidInput {
        /// A message describing the invalid input.
        message: String,
    },

    /// An I/O failure while persisting or loading the configuration.
    #[error("I/O error on '{}'", path.display())]
    Io {
        /// The file the operation was performed on.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },
}

/// Implementation of SwapError with utility functions for creating errors.
impl SwapError {
    /// Creates an `InvalidValue` error for the given option.
    ///
    /// # Arguments
    ///
    /// * `section` - The section containing the option.
    /// * `title` - The option title.
    /// * `message` - The constraint that was violated.
    pub fn invalid_value(
        section: impl Into<String>,
        title: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::InvalidValue {
            section: section.into(),
            title: title.into(),
            message: message.into(),
        }
    }

    /// Creates a `MalformedDefaults` error for the given plugin module.
    pub fn malformed_defaults(module: impl Into<String>, message: impl Into<String>) -> Self {
        Self::MalformedDefaults {
            module: module.into(),
            message: message.into(),
        }
    }

    /// Creates a `GraphConstruction` error for the named network.
    pub fn graph_construction(network: impl Into<String>, message: impl Into<String>) -> Self {
        Self::GraphConstruction {
            network: network.into(),
            message: message.into(),
        }
    }

    /// Creates an `InvalidInput` error with the given message.
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
        }
    }

    /// Creates a `ConfigParse` error at a 1-based line number.
    pub fn config_parse(line: usize, message: impl Into<String>) -> Self {
        Self::ConfigParse {
            line,
            message: message.into(),
        }
    }

    /// Wraps an I/O error with the path it occurred on.
    pub fn io(path: &Path, source: std::io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}
