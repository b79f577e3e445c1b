//! Configuration management.
//!
//! This module provides the typed, validated, hierarchically-sectioned
//! option store that every other component reads from. The registry is
//! assembled once at process start from the fixed global option set plus a
//! table of plugin defaults modules, mutated thereafter only through
//! explicit validated edits, and persisted to a flat section/key/value text
//! form.

pub mod defaults;
pub mod option;
pub mod registry;
pub mod resolved;
pub mod section;

// Re-export commonly used types
pub use defaults::{DefaultOption, DefaultsModule, PluginType, BUILTIN_MODULES};
pub use option::{ConfigOption, OptionKind, OptionValue};
pub use registry::{ConfigRegistry, ADDITIONAL_INFO};
pub use resolved::ResolvedConfig;
pub use section::ConfigSection;
