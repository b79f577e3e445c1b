//! The configuration registry.
//!
//! The registry assembles a hierarchical, typed schema of options: the fixed
//! `global` section first, then one section per plugin defaults module. It
//! is built once at process start, after which it is read-only for
//! arbitrarily many concurrent readers; explicit edits and persistence are
//! infrequent and must be serialized by the caller.
//!
//! Values are persisted to a flat text form: bracketed section headers
//! followed by `key = value` lines, with option help text written out as
//! comments. Loading applies every value through the same validation as an
//! explicit edit; keys absent from the text retain their schema defaults.

use std::path::Path;

use tracing::debug;

use crate::config::defaults::{DefaultsModule, PluginType, BUILTIN_MODULES};
use crate::config::option::{OptionKind, OptionValue};
use crate::config::resolved::ResolvedConfig;
use crate::config::section::ConfigSection;
use crate::core::{SwapError, SwapResult};
use crate::model::masks::available_masks;

/// Addendum appended to the `global` section info and to every model-type
/// plugin section.
pub const ADDITIONAL_INFO: &str =
    "NB: Unless specifically stated, values changed here will only take effect when creating a new model.";

/// A typed, validated, hierarchically-sectioned option store.
///
/// Sections are kept in registration order: `global` first, then the plugin
/// modules in table order, which keeps the persisted form deterministic.
#[derive(Debug, Clone)]
pub struct ConfigRegistry {
    sections: Vec<ConfigSection>,
}

impl ConfigRegistry {
    /// Creates an empty registry.
    ///
    /// Most callers want [`ConfigRegistry::build`], which also registers
    /// the global option set and the built-in plugin defaults.
    pub fn new() -> Self {
        Self {
            sections: Vec::new(),
        }
    }

    /// Builds the full registry: global options plus the built-in plugin
    /// defaults table.
    ///
    /// # Errors
    ///
    /// Any malformed defaults module aborts the entire build; a partially
    /// populated registry is never returned.
    pub fn build() -> SwapResult<Self> {
        Self::with_modules(&BUILTIN_MODULES)
    }

    /// Builds the registry with a caller-provided defaults table instead of
    /// the built-in one.
    pub fn with_modules(modules: &[DefaultsModule]) -> SwapResult<Self> {
        let mut registry = Self::new();
        registry.set_globals()?;
        registry.load_plugin_defaults(modules)?;
        debug!(sections = registry.sections.len(), "built config registry");
        Ok(registry)
    }

    /// Adds a new empty section.
    ///
    /// # Errors
    ///
    /// Returns `DuplicateSection` if the title is already registered.
    pub fn add_section(
        &mut self,
        title: impl Into<String>,
        info: impl Into<String>,
    ) -> SwapResult<()> {
        let title = title.into();
        if self.section(&title).is_some() {
            return Err(SwapError::DuplicateSection { title });
        }
        self.sections.push(ConfigSection::new(title, info));
        Ok(())
    }

    /// Adds an option to an existing section.
    ///
    /// # Errors
    ///
    /// Returns `UnknownSection` if the section does not exist,
    /// `DuplicateOption` if the title already exists in it, or
    /// `InvalidValue` if the declared default violates its own constraints.
    pub fn add_item(
        &mut self,
        section: &str,
        title: impl Into<String>,
        kind: OptionKind,
        info: impl Into<String>,
    ) -> SwapResult<()> {
        let section = self
            .section_mut(section)
            .ok_or_else(|| SwapError::UnknownSection {
                title: section.to_string(),
            })?;
        section.add_item(title, kind, info)
    }

    /// Registers the fixed baseline option set in the `global` section.
    ///
    /// Every option that applies to all models lives here; plugin sections
    /// only carry plugin-specific options.
    pub fn set_globals(&mut self) -> SwapResult<()> {
        debug!("setting global config");
        let section = "global";
        self.add_section(
            section,
            format!("Options that apply to all models.\n{}", ADDITIONAL_INFO),
        )?;
        self.add_item(
            section,
            "icnr_init",
            OptionKind::Bool { default: false },
            "Use ICNR to tile the default initializer in a repeating pattern. Designed for \
             pairing with sub-pixel / pixel shuffler upscaling to reduce the checkerboard \
             effect in image reconstruction.",
        )?;
        self.add_item(
            section,
            "conv_aware_init",
            OptionKind::Bool { default: false },
            "Use Convolution Aware Initialization for convolutional layers. Can help with \
             vanishing and exploding gradients and lead to faster convergence. Building the \
             model takes longer with this enabled.",
        )?;
        self.add_item(
            section,
            "subpixel_upscaling",
            OptionKind::Bool { default: false },
            "Use subpixel upscaling rather than the pixel shuffler. Both perform the same \
             operation with different implementations.",
        )?;
        self.add_item(
            section,
            "reflect_padding",
            OptionKind::Bool { default: false },
            "Use reflection padding rather than zero padding with convolutions. Can reduce \
             artifacts at the border of the image.",
        )?;
        self.add_item(
            section,
            "penalized_mask_loss",
            OptionKind::Bool { default: true },
            "Image loss function is weighted by mask presence. Reconstruction errors outside \
             the facial mask are ignored while the masked face area is prioritized.",
        )?;
        self.add_item(
            section,
            "image_loss_function",
            OptionKind::Str {
                default: "Mean_Absolute_Error".to_string(),
                choices: [
                    "Mean_Absolute_Error",
                    "Mean_Squared_Error",
                    "LogCosh",
                    "Smooth_L1",
                    "L_inf_norm",
                    "SSIM",
                    "GMSD",
                    "Pixel_Gradient_Difference",
                ]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            },
            "The loss function used to guide image reconstruction. MAE is robust to outliers; \
             MSE is susceptible to them and typically produces slightly blurrier results; \
             LogCosh behaves like MSE for small errors and MAE for large ones; SSIM is a \
             perception-based loss considering texture, luminance and contrast.",
        )?;
        self.add_item(
            section,
            "mask_type",
            OptionKind::Str {
                default: "none".to_string(),
                choices: available_masks().iter().map(|s| s.to_string()).collect(),
            },
            "The mask to be used for training. 'none' disables masking; the remaining \
             choices select which facial-region convention rasterizes the mask channel.",
        )?;
        self.add_item(
            section,
            "learning_rate",
            OptionKind::Float {
                default: 5e-5,
                bounds: Some((1e-6, 1e-4)),
                rounding: Some(6),
                fixed: false,
            },
            "How large the modifications to the model weights are after one batch of \
             training. Values that are too large might crash the model; values that are \
             too small might be unable to escape dead-ends.",
        )?;
        self.add_item(
            section,
            "coverage",
            OptionKind::Float {
                default: 68.75,
                bounds: Some((62.5, 100.0)),
                rounding: None,
                fixed: true,
            },
            "How much of the extracted image to train on. 62.5% spans from eyebrow to \
             eyebrow; 100.0% is a mugshot.",
        )?;
        Ok(())
    }

    /// Enumerates a plugin defaults table, creating one section per module.
    ///
    /// Model-type modules get the fixed addendum appended to their help
    /// text. Any malformed module aborts the whole pass: the registry must
    /// never expose a partial schema, so callers should discard it on error.
    pub fn load_plugin_defaults(&mut self, modules: &[DefaultsModule]) -> SwapResult<()> {
        for module in modules {
            let section = module.section_title();
            debug!(section = %section, "adding plugin defaults");
            let mut helptext = module.helptext.clone();
            if module.plugin_type == PluginType::Model {
                helptext = format!("{}\n{}", helptext, ADDITIONAL_INFO);
            }
            self.add_section(&section, helptext)
                .map_err(|err| SwapError::malformed_defaults(&section, err.to_string()))?;
            for (title, kind, info) in &module.options {
                self.add_item(&section, title, kind.clone(), info)
                    .map_err(|err| SwapError::malformed_defaults(&section, err.to_string()))?;
            }
        }
        Ok(())
    }

    /// Looks up a section by title.
    pub fn section(&self, title: &str) -> Option<&ConfigSection> {
        self.sections.iter().find(|s| s.title() == title)
    }

    fn section_mut(&mut self, title: &str) -> Option<&mut ConfigSection> {
        self.sections.iter_mut().find(|s| s.title() == title)
    }

    /// Returns an iterator over the sections in registration order.
    pub fn sections(&self) -> std::slice::Iter<'_, ConfigSection> {
        self.sections.iter()
    }

    /// Validates and stores a new value, returning the normalized form.
    ///
    /// Out-of-bounds numerics are rejected, never clamped; float rounding
    /// precision is applied; the stored value is unchanged on error.
    pub fn set(&mut self, section: &str, title: &str, value: OptionValue) -> SwapResult<OptionValue> {
        let section = self
            .section_mut(section)
            .ok_or_else(|| SwapError::UnknownSection {
                title: section.to_string(),
            })?;
        section.set(title, value)
    }

    /// Returns the current value of an option.
    pub fn get(&self, section: &str, title: &str) -> SwapResult<&OptionValue> {
        let section_ref = self
            .section(section)
            .ok_or_else(|| SwapError::UnknownSection {
                title: section.to_string(),
            })?;
        section_ref
            .get(title)
            .map(|opt| opt.value())
            .ok_or_else(|| SwapError::UnknownOption {
                section: section.to_string(),
                title: title.to_string(),
            })
    }

    /// Returns a boolean option value.
    pub fn get_bool(&self, section: &str, title: &str) -> SwapResult<bool> {
        let value = self.get(section, title)?;
        value
            .as_bool()
            .ok_or_else(|| SwapError::invalid_value(section, title, expected("bool", value)))
    }

    /// Returns an integer option value.
    pub fn get_int(&self, section: &str, title: &str) -> SwapResult<i64> {
        let value = self.get(section, title)?;
        value
            .as_int()
            .ok_or_else(|| SwapError::invalid_value(section, title, expected("int", value)))
    }

    /// Returns a float option value.
    pub fn get_float(&self, section: &str, title: &str) -> SwapResult<f64> {
        let value = self.get(section, title)?;
        value
            .as_float()
            .ok_or_else(|| SwapError::invalid_value(section, title, expected("float", value)))
    }

    /// Returns a string option value.
    pub fn get_str(&self, section: &str, title: &str) -> SwapResult<&str> {
        let value = self.get(section, title)?;
        value
            .as_str()
            .ok_or_else(|| SwapError::invalid_value(section, title, expected("str", value)))
    }

    /// Serializes the registry to its flat text form.
    ///
    /// Section info and option help text are written as comments so the
    /// file is self-documenting; only `key = value` lines carry state.
    pub fn serialize(&self) -> String {
        let mut out = String::new();
        for section in &self.sections {
            for line in section.info().lines() {
                out.push_str("# ");
                out.push_str(line);
                out.push('\n');
            }
            out.push('[');
            out.push_str(section.title());
            out.push_str("]\n");
            for option in section.iter() {
                for line in option.info().lines() {
                    out.push_str("# ");
                    out.push_str(line);
                    out.push('\n');
                }
                out.push_str(option.title());
                out.push_str(" = ");
                out.push_str(&option.value().to_string());
                out.push('\n');
            }
            out.push('\n');
        }
        out
    }

    /// Applies persisted text onto the schema.
    ///
    /// Every value goes through the same validation as [`ConfigRegistry::set`].
    /// All options are first reset to their defaults, so keys absent from
    /// the text fall back to the schema default. Unknown sections or keys
    /// and syntax errors abort the load, leaving the registry exactly as it
    /// was: the text is applied to a staging copy and committed only once
    /// every line has validated.
    pub fn parse(&mut self, text: &str) -> SwapResult<()> {
        let mut staged = self.clone();
        staged.apply_text(text)?;
        self.sections = staged.sections;
        Ok(())
    }

    fn apply_text(&mut self, text: &str) -> SwapResult<()> {
        for section in &mut self.sections {
            section.reset_all();
        }

        let mut current: Option<String> = None;
        for (idx, raw_line) in text.lines().enumerate() {
            let line_no = idx + 1;
            let line = raw_line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            if let Some(header) = line.strip_prefix('[').and_then(|l| l.strip_suffix(']')) {
                if self.section(header).is_none() {
                    return Err(SwapError::UnknownSection {
                        title: header.to_string(),
                    });
                }
                current = Some(header.to_string());
                continue;
            }
            let (key, value) = line
                .split_once('=')
                .ok_or_else(|| SwapError::config_parse(line_no, "expected 'key = value'"))?;
            let section_title = current
                .clone()
                .ok_or_else(|| SwapError::config_parse(line_no, "key outside any section"))?;
            let key = key.trim();
            let section = self
                .section_mut(&section_title)
                .ok_or_else(|| SwapError::UnknownSection {
                    title: section_title.clone(),
                })?;
            let option = section
                .get_mut(key)
                .ok_or_else(|| SwapError::UnknownOption {
                    section: section_title.clone(),
                    title: key.to_string(),
                })?;
            option
                .set_from_str(value)
                .map_err(|message| SwapError::invalid_value(section_title, key, message))?;
        }
        Ok(())
    }

    /// Writes the serialized registry to a file.
    pub fn save(&self, path: &Path) -> SwapResult<()> {
        std::fs::write(path, self.serialize()).map_err(|err| SwapError::io(path, err))?;
        debug!(path = %path.display(), "saved config");
        Ok(())
    }

    /// Loads and applies a persisted configuration file.
    pub fn load(&mut self, path: &Path) -> SwapResult<()> {
        let text = std::fs::read_to_string(path).map_err(|err| SwapError::io(path, err))?;
        self.parse(&text)?;
        debug!(path = %path.display(), "loaded config");
        Ok(())
    }

    /// Produces the immutable `section -> title -> value` snapshot consumed
    /// by the model composition engine.
    pub fn resolve(&self) -> ResolvedConfig {
        ResolvedConfig::from_registry(self)
    }
}

impl Default for ConfigRegistry {
    fn default() -> Self {
        Self::new()
    }
}

fn expected(datatype: &str, value: &OptionValue) -> String {
    format!("expected {}, got {}", datatype, value.datatype())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::defaults::DefaultsModule;

    #[test]
    fn test_build_registers_globals_and_plugins() {
        let registry = ConfigRegistry::build().unwrap();
        let titles: Vec<&str> = registry.sections().map(|s| s.title()).collect();
        assert_eq!(
            titles,
            vec!["global", "model.original", "model.dfl_h128", "trainer.original"]
        );
    }

    #[test]
    fn test_global_defaults() {
        let registry = ConfigRegistry::build().unwrap();
        assert!(!registry.get_bool("global", "icnr_init").unwrap());
        assert!(registry.get_bool("global", "penalized_mask_loss").unwrap());
        assert_eq!(
            registry.get_str("global", "image_loss_function").unwrap(),
            "Mean_Absolute_Error"
        );
        assert_eq!(registry.get_str("global", "mask_type").unwrap(), "none");
        assert_eq!(registry.get_float("global", "learning_rate").unwrap(), 5e-5);
        assert_eq!(registry.get_float("global", "coverage").unwrap(), 68.75);
    }

    #[test]
    fn test_set_round_trips_through_get() {
        let mut registry = ConfigRegistry::build().unwrap();
        let stored = registry
            .set("global", "learning_rate", OptionValue::Float(2e-5))
            .unwrap();
        assert_eq!(stored, OptionValue::Float(2e-5));
        assert_eq!(registry.get_float("global", "learning_rate").unwrap(), 2e-5);
    }

    #[test]
    fn test_out_of_range_set_leaves_value_unchanged() {
        let mut registry = ConfigRegistry::build().unwrap();
        let err = registry
            .set("global", "coverage", OptionValue::Float(120.0))
            .unwrap_err();
        assert!(matches!(err, SwapError::InvalidValue { .. }));
        assert_eq!(registry.get_float("global", "coverage").unwrap(), 68.75);
    }

    #[test]
    fn test_duplicate_section_rejected() {
        let mut registry = ConfigRegistry::build().unwrap();
        let err = registry.add_section("global", "").unwrap_err();
        assert!(matches!(err, SwapError::DuplicateSection { .. }));
    }

    #[test]
    fn test_plugin_enumeration_yields_one_section_per_module() {
        let modules = vec![
            DefaultsModule {
                plugin_type: PluginType::Model,
                name: "custom".to_string(),
                helptext: "A custom model.".to_string(),
                options: vec![(
                    "lowmem".to_string(),
                    OptionKind::Bool { default: false },
                    "".to_string(),
                )],
            },
            DefaultsModule {
                plugin_type: PluginType::Trainer,
                name: "custom".to_string(),
                helptext: "A custom trainer.".to_string(),
                options: vec![],
            },
        ];
        let registry = ConfigRegistry::with_modules(&modules).unwrap();
        // global + one section per module.
        assert_eq!(registry.sections().count(), 3);

        // Model-type sections carry the addendum, trainer sections do not.
        let model = registry.section("model.custom").unwrap();
        assert!(model.info().contains(ADDITIONAL_INFO));
        let trainer = registry.section("trainer.custom").unwrap();
        assert!(trainer.info().contains("A custom trainer."));
        assert!(!trainer.info().contains(ADDITIONAL_INFO));
    }

    #[test]
    fn test_malformed_module_aborts_the_build() {
        // Duplicate option title within one module.
        let modules = vec![DefaultsModule {
            plugin_type: PluginType::Model,
            name: "broken".to_string(),
            helptext: "".to_string(),
            options: vec![
                (
                    "lowmem".to_string(),
                    OptionKind::Bool { default: false },
                    "".to_string(),
                ),
                (
                    "lowmem".to_string(),
                    OptionKind::Bool { default: true },
                    "".to_string(),
                ),
            ],
        }];
        let err = ConfigRegistry::with_modules(&modules).unwrap_err();
        assert!(matches!(err, SwapError::MalformedDefaults { .. }));
    }

    #[test]
    fn test_serialize_parse_round_trip() {
        let mut registry = ConfigRegistry::build().unwrap();
        registry
            .set("global", "mask_type", OptionValue::Str("components".to_string()))
            .unwrap();
        registry
            .set("global", "learning_rate", OptionValue::Float(2e-5))
            .unwrap();
        registry
            .set("trainer.original", "preview_images", OptionValue::Int(10))
            .unwrap();
        let text = registry.serialize();

        let mut restored = ConfigRegistry::build().unwrap();
        restored.parse(&text).unwrap();
        assert_eq!(restored.get_str("global", "mask_type").unwrap(), "components");
        assert_eq!(restored.get_float("global", "learning_rate").unwrap(), 2e-5);
        assert_eq!(
            restored.get_int("trainer.original", "preview_images").unwrap(),
            10
        );
    }

    #[test]
    fn test_parse_absent_keys_fall_back_to_defaults() {
        let mut registry = ConfigRegistry::build().unwrap();
        registry
            .set("global", "learning_rate", OptionValue::Float(2e-5))
            .unwrap();
        // A file that only mentions the mask type.
        registry.parse("[global]\nmask_type = extended\n").unwrap();
        assert_eq!(registry.get_str("global", "mask_type").unwrap(), "extended");
        assert_eq!(registry.get_float("global", "learning_rate").unwrap(), 5e-5);
    }

    #[test]
    fn test_failed_parse_leaves_registry_unchanged() {
        let mut registry = ConfigRegistry::build().unwrap();
        registry
            .set("global", "learning_rate", OptionValue::Float(2e-5))
            .unwrap();
        registry
            .set("global", "mask_type", OptionValue::Str("components".to_string()))
            .unwrap();

        // The first line would apply cleanly; the second is out of range.
        let err = registry
            .parse("[global]\ncoverage = 87.5\nlearning_rate = 9.0\n")
            .unwrap_err();
        assert!(matches!(err, SwapError::InvalidValue { .. }));

        // Prior edits survive and no value from the rejected text sticks.
        assert_eq!(registry.get_float("global", "learning_rate").unwrap(), 2e-5);
        assert_eq!(registry.get_str("global", "mask_type").unwrap(), "components");
        assert_eq!(registry.get_float("global", "coverage").unwrap(), 68.75);
    }

    #[test]
    fn test_parse_rejects_out_of_range_values() {
        let mut registry = ConfigRegistry::build().unwrap();
        let err = registry.parse("[global]\ncoverage = 120.0\n").unwrap_err();
        assert!(matches!(err, SwapError::InvalidValue { .. }));
    }

    #[test]
    fn test_parse_rejects_unknown_sections_and_keys() {
        let mut registry = ConfigRegistry::build().unwrap();
        assert!(matches!(
            registry.parse("[nonsense]\n").unwrap_err(),
            SwapError::UnknownSection { .. }
        ));
        assert!(matches!(
            registry.parse("[global]\nnonsense = 1\n").unwrap_err(),
            SwapError::UnknownOption { .. }
        ));
        assert!(matches!(
            registry.parse("orphan = 1\n").unwrap_err(),
            SwapError::ConfigParse { .. }
        ));
    }

    #[test]
    fn test_save_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("train.ini");

        let mut registry = ConfigRegistry::build().unwrap();
        registry
            .set("global", "coverage", OptionValue::Float(87.5))
            .unwrap();
        registry.save(&path).unwrap();

        let mut restored = ConfigRegistry::build().unwrap();
        restored.load(&path).unwrap();
        assert_eq!(restored.get_float("global", "coverage").unwrap(), 87.5);
    }
}
