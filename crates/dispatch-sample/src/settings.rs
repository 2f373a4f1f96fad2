//! # Settings
//!
//! Layered with the `config` crate, later sources winning:
//!
//! 1. Built-in defaults ([`BlogSettings::default`])
//! 2. `blog.toml` in the working directory, if present
//! 3. `BLOG_*` environment variables, `__` separating nested keys
//!    (e.g. `BLOG_PAGINATION__MAX_SIZE=50`)
//!
//! ```toml
//! channel_buffer = 64
//!
//! [pagination]
//! default_size = 10
//! max_size = 50
//!
//! [authors]
//! excluded = ["delete"]
//! ```

use crate::error::BlogError;
use config::{Config, Environment, File, FileFormat};
use resource_dispatch::{Action, DispatchConfig, PaginationConfig};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BlogSettings {
    /// Capacity of each store actor's request channel.
    pub channel_buffer: usize,
    /// Shared by every resource.
    pub pagination: PaginationConfig,
    pub posts: ResourceSettings,
    pub authors: ResourceSettings,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResourceSettings {
    pub excluded: Vec<Action>,
}

impl Default for BlogSettings {
    fn default() -> Self {
        Self {
            channel_buffer: 32,
            pagination: PaginationConfig {
                default_size: Some(20),
                max_size: Some(100),
            },
            posts: ResourceSettings::default(),
            authors: ResourceSettings::default(),
        }
    }
}

impl BlogSettings {
    pub fn load() -> Result<Self, BlogError> {
        let settings = Config::builder()
            .add_source(Config::try_from(&BlogSettings::default())?)
            .add_source(File::with_name("blog").required(false))
            .add_source(
                Environment::with_prefix("BLOG")
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()?;
        Ok(settings.try_deserialize()?)
    }

    /// Defaults overlaid with a TOML document.
    pub fn from_toml(text: &str) -> Result<Self, BlogError> {
        let settings = Config::builder()
            .add_source(Config::try_from(&BlogSettings::default())?)
            .add_source(File::from_str(text, FileFormat::Toml))
            .build()?;
        Ok(settings.try_deserialize()?)
    }

    pub fn dispatch_config(&self, resource: &ResourceSettings) -> DispatchConfig {
        resource
            .excluded
            .iter()
            .fold(DispatchConfig::new(), |config, action| config.exclude(*action))
            .with_pagination(self.pagination)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_paginate_by_twenty() {
        let settings = BlogSettings::from_toml("").unwrap();
        assert_eq!(settings, BlogSettings::default());
        assert_eq!(settings.pagination.default_size, Some(20));
    }

    #[test]
    fn toml_overrides_nested_keys() {
        let settings = BlogSettings::from_toml(
            r#"
            channel_buffer = 8

            [pagination]
            max_size = 5

            [authors]
            excluded = ["delete", "update"]
            "#,
        )
        .unwrap();

        assert_eq!(settings.channel_buffer, 8);
        assert_eq!(settings.pagination.max_size, Some(5));
        assert_eq!(settings.pagination.default_size, Some(20));

        let authors = settings.dispatch_config(&settings.authors);
        assert!(!authors.handles(Action::Delete));
        assert!(!authors.handles(Action::Update));
        assert!(authors.handles(Action::Create));
        assert!(settings.dispatch_config(&settings.posts).handles(Action::Delete));
    }
}
