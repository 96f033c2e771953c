use serde::{Deserialize, Deserializer};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::model::{css_values, ImageStyles, SectionStyle, SectionStyles, DEFAULT_TITLE};

/// Builder settings, read from YAML.
///
/// ```yaml
/// title: "Newsletter"
/// output: "exports"
/// styles:
///   footer:
///     fontSize: "12px"
///     textAlign: "center"
/// image_styles:
///   width: "60%"
///   alignment: "left"
/// ```
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct BuilderConfig {
    /// Title used when a template has none.
    #[serde(default = "default_title")]
    pub title: String,

    /// Styles for templates that carry none. Entries given here replace the
    /// editor defaults one by one.
    #[serde(default, deserialize_with = "styles_over_defaults")]
    pub styles: SectionStyles,

    /// Image placement for templates that carry none.
    #[serde(default)]
    pub image_styles: ImageStyles,

    /// Directory exports are written to.
    pub output: Option<PathBuf>,
}

fn default_title() -> String {
    DEFAULT_TITLE.to_string()
}

/// Per-section entries named in the config file.
#[derive(Deserialize, Default)]
#[serde(default)]
struct StyleOverrides {
    #[serde(deserialize_with = "css_values")]
    header: BTreeMap<String, String>,
    #[serde(deserialize_with = "css_values")]
    content: BTreeMap<String, String>,
    #[serde(deserialize_with = "css_values")]
    footer: BTreeMap<String, String>,
}

fn styles_over_defaults<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<SectionStyles, D::Error> {
    let overrides = Option::<StyleOverrides>::deserialize(deserializer)?.unwrap_or_default();
    let mut styles = SectionStyles::default();
    let apply = |style: &mut SectionStyle, entries: BTreeMap<String, String>| {
        for (name, value) in entries {
            style.set(&name, value);
        }
    };
    apply(&mut styles.header, overrides.header);
    apply(&mut styles.content, overrides.content);
    apply(&mut styles.footer, overrides.footer);
    Ok(styles)
}

impl Default for BuilderConfig {
    fn default() -> Self {
        Self {
            title: default_title(),
            styles: SectionStyles::default(),
            image_styles: ImageStyles::default(),
            output: None,
        }
    }
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl BuilderConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: BuilderConfig = serde_yaml::from_str(&content)?;
        Ok(config)
    }
}
