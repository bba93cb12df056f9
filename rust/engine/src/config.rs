// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Bake configuration, with environment overrides.

/// Bake configuration.
#[derive(Debug, Clone)]
pub struct BakeConfig {
    /// Category used when the host rejects a template's own category for shape elements.
    pub generic_category: String,
    /// Blank template category for definitions without an explicit category.
    pub template_category: String,
    /// Maximum nesting of display-value fallbacks.
    pub max_display_depth: usize,
    /// Root group name prepended to every collection path.
    pub group_base_name: Option<String>,
    /// Unit of geometry objects without a unit tag.
    pub default_units: String,
}

impl BakeConfig {
    /// Load configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            generic_category: std::env::var("BAKE_LITE_GENERIC_CATEGORY")
                .unwrap_or(defaults.generic_category),
            template_category: std::env::var("BAKE_LITE_TEMPLATE_CATEGORY")
                .unwrap_or(defaults.template_category),
            max_display_depth: std::env::var("BAKE_LITE_MAX_DISPLAY_DEPTH")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.max_display_depth),
            group_base_name: std::env::var("BAKE_LITE_GROUP_BASE")
                .ok()
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .or(defaults.group_base_name),
            default_units: std::env::var("BAKE_LITE_DEFAULT_UNITS")
                .unwrap_or(defaults.default_units),
        }
    }

    pub fn with_group_base(mut self, name: impl Into<String>) -> Self {
        self.group_base_name = Some(name.into());
        self
    }
}

impl Default for BakeConfig {
    fn default() -> Self {
        Self {
            generic_category: "Generic Models".into(),
            template_category: "Generic Models".into(),
            max_display_depth: 16,
            group_base_name: None,
            default_units: "m".into(),
        }
    }
}
