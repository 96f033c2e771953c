use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

/// Alignment used when a section style carries no `textAlign`.
pub const DEFAULT_TEXT_ALIGN: &str = "left";

/// Title used when neither the template nor the configuration names one.
pub const DEFAULT_TITLE: &str = "Email Template";

/// One of the three named content regions of an email.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Section {
    Header,
    Content,
    Footer,
}

impl Section {
    /// Sections in document order.
    pub const ALL: [Section; 3] = [Section::Header, Section::Content, Section::Footer];

    /// The class name of the section container, also its key in a bundle.
    pub fn as_str(self) -> &'static str {
        match self {
            Section::Header => "header",
            Section::Content => "content",
            Section::Footer => "footer",
        }
    }
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-section style dictionary, as the editor stores it.
///
/// Every value is a CSS value string and is passed through verbatim. Numbers
/// are read as their text (`1.5`) and `null` counts as unset. Keys the editor
/// does not know about are kept in `extra` so they still reach the exported
/// stylesheet.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SectionStyle {
    #[serde(deserialize_with = "css_value")]
    pub font_size: String,
    #[serde(deserialize_with = "css_value")]
    pub color: String,
    #[serde(deserialize_with = "css_value")]
    pub background_color: String,
    #[serde(deserialize_with = "css_value")]
    pub padding: String,
    #[serde(deserialize_with = "css_value")]
    pub text_align: String,
    #[serde(deserialize_with = "css_value")]
    pub font_family: String,
    #[serde(
        skip_serializing_if = "Option::is_none",
        deserialize_with = "optional_css_value"
    )]
    pub line_height: Option<String>,
    #[serde(flatten, deserialize_with = "css_values")]
    pub extra: BTreeMap<String, String>,
}

/// A scalar style value as it appears in a bundle or config file.
#[derive(Deserialize)]
#[serde(untagged)]
enum CssValue {
    Text(String),
    Integer(i64),
    Float(f64),
}

impl CssValue {
    fn into_text(self) -> String {
        match self {
            CssValue::Text(text) => text,
            CssValue::Integer(n) => n.to_string(),
            CssValue::Float(n) => n.to_string(),
        }
    }
}

fn css_value<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(optional_css_value(deserializer)?.unwrap_or_default())
}

fn optional_css_value<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<String>, D::Error> {
    Ok(Option::<CssValue>::deserialize(deserializer)?.map(CssValue::into_text))
}

/// Reads a map of style entries, dropping `null` values.
pub(crate) fn css_values<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<BTreeMap<String, String>, D::Error> {
    let values = BTreeMap::<String, Option<CssValue>>::deserialize(deserializer)?;
    Ok(values
        .into_iter()
        .filter_map(|(name, value)| value.map(|v| (name, v.into_text())))
        .collect())
}

impl SectionStyle {
    /// Sets one entry by its bundle (camelCase) name.
    pub fn set(&mut self, name: &str, value: String) {
        match name {
            "fontSize" => self.font_size = value,
            "color" => self.color = value,
            "backgroundColor" => self.background_color = value,
            "padding" => self.padding = value,
            "textAlign" => self.text_align = value,
            "fontFamily" => self.font_family = value,
            "lineHeight" => self.line_height = Some(value),
            _ => {
                self.extra.insert(name.to_string(), value);
            }
        }
    }

    /// Non-empty style entries keyed by their bundle (camelCase) name, known
    /// fields first in a fixed order, then extra keys in sorted order.
    pub fn declarations(&self) -> Vec<(&str, &str)> {
        let known = [
            ("fontSize", self.font_size.as_str()),
            ("color", self.color.as_str()),
            ("backgroundColor", self.background_color.as_str()),
            ("padding", self.padding.as_str()),
            ("textAlign", self.text_align.as_str()),
            ("fontFamily", self.font_family.as_str()),
            ("lineHeight", self.line_height.as_deref().unwrap_or("")),
        ];
        known
            .into_iter()
            .chain(self.extra.iter().map(|(k, v)| (k.as_str(), v.as_str())))
            .filter(|(_, value)| !value.trim().is_empty())
            .collect()
    }

    /// The section's text alignment, `left` when unset.
    pub fn text_align_or_default(&self) -> &str {
        if self.text_align.trim().is_empty() {
            DEFAULT_TEXT_ALIGN
        } else {
            &self.text_align
        }
    }

    /// Background color for the section container, `transparent` when unset.
    pub fn background_or_default(&self) -> &str {
        non_empty_or(&self.background_color, "transparent")
    }

    /// Text color for the section container, `inherit` when unset.
    pub fn color_or_default(&self) -> &str {
        non_empty_or(&self.color, "inherit")
    }
}

fn non_empty_or<'a>(value: &'a str, fallback: &'a str) -> &'a str {
    if value.trim().is_empty() {
        fallback
    } else {
        value
    }
}

/// Style dictionaries for all three sections.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SectionStyles {
    pub header: SectionStyle,
    pub content: SectionStyle,
    pub footer: SectionStyle,
}

impl SectionStyles {
    pub fn get(&self, section: Section) -> &SectionStyle {
        match section {
            Section::Header => &self.header,
            Section::Content => &self.content,
            Section::Footer => &self.footer,
        }
    }
}

impl Default for SectionStyles {
    /// The editor's initial styles.
    fn default() -> Self {
        let style = |font_size: &str, color: &str, padding: &str, text_align: &str| SectionStyle {
            font_size: font_size.to_string(),
            color: color.to_string(),
            background_color: "transparent".to_string(),
            padding: padding.to_string(),
            text_align: text_align.to_string(),
            font_family: "Arial".to_string(),
            line_height: None,
            extra: BTreeMap::new(),
        };
        Self {
            header: style("24px", "#000000", "10px", "left"),
            content: SectionStyle {
                line_height: Some("1.5".to_string()),
                ..style("16px", "#333333", "15px", "left")
            },
            footer: style("14px", "#666666", "10px", "center"),
        }
    }
}

/// Rich-text markup for each section. Empty strings are allowed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Sections {
    pub header: String,
    pub content: String,
    pub footer: String,
}

impl Sections {
    pub fn get(&self, section: Section) -> &str {
        match section {
            Section::Header => &self.header,
            Section::Content => &self.content,
            Section::Footer => &self.footer,
        }
    }
}

/// Image placement options. `alignment` is kept as the raw string so that
/// unknown values reach the output unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ImageStyles {
    pub width: String,
    pub max_height: String,
    pub alignment: String,
}

impl ImageStyles {
    /// The recognized placement, if `alignment` names one.
    pub fn placement(&self) -> Option<ImageAlignment> {
        ImageAlignment::from_name(&self.alignment)
    }
}

impl Default for ImageStyles {
    fn default() -> Self {
        Self {
            width: "100%".to_string(),
            max_height: "300px".to_string(),
            alignment: "center".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageAlignment {
    Left,
    Center,
    Right,
}

impl ImageAlignment {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "left" => Some(Self::Left),
            "center" => Some(Self::Center),
            "right" => Some(Self::Right),
            _ => None,
        }
    }
}

/// Everything the renderer needs for one email.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EmailDocument {
    pub title: String,
    pub sections: Sections,
    pub styles: SectionStyles,
    /// Empty when the email has no image.
    pub image_url: String,
    pub image_styles: ImageStyles,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Missing required fields: {}", .missing.join(", "))]
pub struct ValidationError {
    pub missing: Vec<&'static str>,
}

impl EmailDocument {
    /// Checks that the title and every section carry non-blank text.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let mut missing = Vec::new();
        if self.title.trim().is_empty() {
            missing.push("title");
        }
        for section in Section::ALL {
            if self.sections.get(section).trim().is_empty() {
                missing.push(section.as_str());
            }
        }
        if missing.is_empty() {
            Ok(())
        } else {
            Err(ValidationError { missing })
        }
    }
}
