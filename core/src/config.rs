//! Runtime feature flags.
//!
//! A [`Config`] is a plain value handed to components and to the document shell. The flag names
//! follow the camelCase spelling used in JSON config files and in the page bootstrap script;
//! [`Config::get`] also accepts snake_case.

use alloc::string::{String, ToString};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Boolean feature flags consumed by the component shell and built-in components.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
#[allow(clippy::struct_excessive_bools)]
pub struct Config {
    /// Enables placeholders, retries and fallbacks in `SmartImage`.
    pub smart_image: bool,
    /// Allows the server to flush the body in several chunks.
    pub chunk_render: bool,
    /// Converts render and reconcile failures into degraded output instead of errors.
    pub self_healing: bool,
    /// Defers every component commit to the idle scheduler.
    pub priority_render: bool,
}

impl Config {
    /// Names accepted by [`get`](Self::get) and [`set`](Self::set), in camelCase.
    pub const FLAGS: [&'static str; 4] =
        ["smartImage", "chunkRender", "selfHealing", "priorityRender"];

    /// Creates a configuration with every flag off.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            smart_image: false,
            chunk_render: false,
            self_healing: false,
            priority_render: false,
        }
    }

    /// Parses a JSON object. Missing flags default to `false`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] when the input is not a valid config object.
    pub fn from_json(input: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(input)?)
    }

    /// Serializes the flags as a JSON object.
    #[must_use]
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| "{}".to_string())
    }

    /// Reads a flag by name. Unknown names read as `false`.
    #[must_use]
    pub fn get(&self, name: &str) -> bool {
        self.slot(name).is_some_and(|flag| flag)
    }

    /// Writes a flag by name.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::UnknownFlag`] for names outside [`Config::FLAGS`].
    pub fn set(&mut self, name: &str, value: bool) -> Result<(), ConfigError> {
        let slot = match name {
            "smartImage" | "smart_image" => &mut self.smart_image,
            "chunkRender" | "chunk_render" => &mut self.chunk_render,
            "selfHealing" | "self_healing" => &mut self.self_healing,
            "priorityRender" | "priority_render" => &mut self.priority_render,
            _ => return Err(ConfigError::UnknownFlag(name.to_string())),
        };
        *slot = value;
        Ok(())
    }

    fn slot(&self, name: &str) -> Option<bool> {
        match name {
            "smartImage" | "smart_image" => Some(self.smart_image),
            "chunkRender" | "chunk_render" => Some(self.chunk_render),
            "selfHealing" | "self_healing" => Some(self.self_healing),
            "priorityRender" | "priority_render" => Some(self.priority_render),
            _ => None,
        }
    }

    /// Sets [`self_healing`](Self::self_healing).
    #[must_use]
    pub const fn with_self_healing(mut self, enabled: bool) -> Self {
        self.self_healing = enabled;
        self
    }

    /// Sets [`priority_render`](Self::priority_render).
    #[must_use]
    pub const fn with_priority_render(mut self, enabled: bool) -> Self {
        self.priority_render = enabled;
        self
    }

    /// Sets [`smart_image`](Self::smart_image).
    #[must_use]
    pub const fn with_smart_image(mut self, enabled: bool) -> Self {
        self.smart_image = enabled;
        self
    }

    /// Sets [`chunk_render`](Self::chunk_render).
    #[must_use]
    pub const fn with_chunk_render(mut self, enabled: bool) -> Self {
        self.chunk_render = enabled;
        self
    }
}
