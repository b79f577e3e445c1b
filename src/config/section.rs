//! Configuration sections.
//!
//! A section groups the options contributed by one plugin module (or the
//! fixed `global` section). Options are kept in registration order so that
//! the persisted text form and any UI rendering are deterministic.

use crate::config::option::{ConfigOption, OptionKind, OptionValue};
use crate::core::{SwapError, SwapResult};
use serde::{Deserialize, Serialize};

/// A titled, ordered collection of configuration options.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigSection {
    title: String,
    info: String,
    options: Vec<ConfigOption>,
}

impl ConfigSection {
    /// Creates a new empty section.
    pub fn new(title: impl Into<String>, info: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            info: info.into(),
            options: Vec::new(),
        }
    }

    /// Returns the section title.
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Returns the section help text.
    pub fn info(&self) -> &str {
        &self.info
    }

    /// Adds an option to the section.
    ///
    /// # Errors
    ///
    /// Returns `DuplicateOption` if the title already exists in this
    /// section, or `InvalidValue` if the declared default violates the
    /// descriptor's own constraints.
    pub fn add_item(
        &mut self,
        title: impl Into<String>,
        kind: OptionKind,
        info: impl Into<String>,
    ) -> SwapResult<()> {
        let title = title.into();
        if self.contains(&title) {
            return Err(SwapError::DuplicateOption {
                section: self.title.clone(),
                title,
            });
        }
        let option = ConfigOption::new(&title, kind, info)
            .map_err(|message| SwapError::invalid_value(&self.title, &title, message))?;
        self.options.push(option);
        Ok(())
    }

    /// Returns whether the section contains an option with the given title.
    pub fn contains(&self, title: &str) -> bool {
        self.options.iter().any(|opt| opt.title() == title)
    }

    /// Looks up an option by title.
    pub fn get(&self, title: &str) -> Option<&ConfigOption> {
        self.options.iter().find(|opt| opt.title() == title)
    }

    /// Looks up an option by title, mutably.
    pub fn get_mut(&mut self, title: &str) -> Option<&mut ConfigOption> {
        self.options.iter_mut().find(|opt| opt.title() == title)
    }

    /// Validates and stores a new value for an option, returning the
    /// normalized value. The stored value is unchanged on error.
    pub fn set(&mut self, title: &str, value: OptionValue) -> SwapResult<OptionValue> {
        let section = self.title.clone();
        let option = self
            .get_mut(title)
            .ok_or_else(|| SwapError::UnknownOption {
                section: section.clone(),
                title: title.to_string(),
            })?;
        option
            .set(value)
            .map_err(|message| SwapError::invalid_value(section, title, message))
    }

    /// Returns an iterator over the options in registration order.
    pub fn iter(&self) -> std::slice::Iter<'_, ConfigOption> {
        self.options.iter()
    }

    /// Resets every option in the section to its schema default.
    pub fn reset_all(&mut self) {
        for option in &mut self.options {
            option.reset();
        }
    }

    /// Returns the number of options in the section.
    pub fn len(&self) -> usize {
        self.options.len()
    }

    /// Returns whether the section has no options.
    pub fn is_empty(&self) -> bool {
        self.options.is_empty()
    }
}
