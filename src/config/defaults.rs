//! Plugin defaults modules.
//!
//! Every plugin contributes its default option set through a
//! [`DefaultsModule`] record registered in a static table. The registry
//! enumerates this table at build time, creating one section per module.
//! Registration order is the enumeration order, so the assembled schema is
//! fully deterministic.

use crate::config::option::OptionKind;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

/// The category of plugin a defaults module belongs to.
///
/// The category becomes the first component of the section title
/// (`model.original`, `trainer.original`, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PluginType {
    /// Model architecture plugins.
    Model,
    /// Training-loop plugins.
    Trainer,
}

impl PluginType {
    /// Returns the lowercase label used in section titles.
    pub fn label(&self) -> &'static str {
        match self {
            PluginType::Model => "model",
            PluginType::Trainer => "trainer",
        }
    }
}

/// One option declared by a defaults module: title, descriptor, help text.
pub type DefaultOption = (String, OptionKind, String);

/// A plugin-authored defaults record: the help text for the section and the
/// option descriptors it contributes.
#[derive(Debug, Clone)]
pub struct DefaultsModule {
    /// The plugin category.
    pub plugin_type: PluginType,
    /// The module name (second component of the section title).
    pub name: String,
    /// Help text for the section.
    pub helptext: String,
    /// The options this module declares, in registration order.
    pub options: Vec<DefaultOption>,
}

impl DefaultsModule {
    /// Returns the `<plugin_type>.<name>` section title for this module.
    pub fn section_title(&self) -> String {
        format!("{}.{}", self.plugin_type.label(), self.name)
    }
}

fn bool_option(title: &str, default: bool, info: &str) -> DefaultOption {
    (
        title.to_string(),
        OptionKind::Bool { default },
        info.to_string(),
    )
}

fn int_option(title: &str, default: i64, bounds: (i64, i64), info: &str) -> DefaultOption {
    (
        title.to_string(),
        OptionKind::Int {
            default,
            bounds: Some(bounds),
            rounding: Some(1),
            fixed: false,
        },
        info.to_string(),
    )
}

const LOWMEM_INFO: &str = "Lower memory mode. Set to 'true' if having issues with VRAM usage. \
     Affects the encoder latent width, so models with a changed lowmem mode are not \
     compatible with each other.";

fn model_original() -> DefaultsModule {
    DefaultsModule {
        plugin_type: PluginType::Model,
        name: "original".to_string(),
        helptext: "Original swapping model.".to_string(),
        options: vec![bool_option("lowmem", false, LOWMEM_INFO)],
    }
}

fn model_dfl_h128() -> DefaultsModule {
    DefaultsModule {
        plugin_type: PluginType::Model,
        name: "dfl_h128".to_string(),
        helptext: "DFL H128 model (adapted from DeepFaceLab).".to_string(),
        options: vec![bool_option("lowmem", false, LOWMEM_INFO)],
    }
}

fn trainer_original() -> DefaultsModule {
    DefaultsModule {
        plugin_type: PluginType::Trainer,
        name: "original".to_string(),
        helptext: "Original training plugin.".to_string(),
        options: vec![
            int_option(
                "preview_images",
                14,
                (2, 64),
                "Number of sample faces to display in the preview window.",
            ),
            int_option(
                "zoom_amount",
                5,
                (0, 25),
                "Percentage amount to randomly zoom each training image in and out.",
            ),
            int_option(
                "rotation_range",
                10,
                (0, 25),
                "Percentage amount to randomly rotate each training image.",
            ),
            int_option(
                "shift_range",
                5,
                (0, 25),
                "Percentage amount to randomly shift each training image.",
            ),
            int_option(
                "flip_chance",
                50,
                (0, 75),
                "Percentage chance to randomly flip each training image horizontally.",
            ),
        ],
    }
}

/// The built-in plugin defaults table.
///
/// Plugins shipped with the crate register here; the registry enumerates
/// this table during [`crate::config::ConfigRegistry::build`]. Callers with
/// out-of-tree plugins pass their own slice to
/// [`crate::config::ConfigRegistry::with_modules`].
pub static BUILTIN_MODULES: Lazy<Vec<DefaultsModule>> =
    Lazy::new(|| vec![model_original(), model_dfl_h128(), trainer_original()]);
