//! Saved templates as the store keeps them, and their normalization into an
//! [`EmailDocument`].
//!
//! A saved record carries its sections, styles and image placement as a JSON
//! string in `content`. Older records only have the nested `layout` form, so
//! both shapes are read and both are written.

use log::{debug, warn};
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::error::Category;
use std::sync::LazyLock;
use thiserror::Error;

use crate::config::BuilderConfig;
use crate::model::{EmailDocument, ImageStyles, SectionStyle, SectionStyles, Sections};

/// The layout string the backend serves as its default.
pub const DEFAULT_LAYOUT: &str = include_str!("../templates/default_layout.html");

/// Suffix of every downloaded export.
const DOWNLOAD_SUFFIX: &str = "-template.html";

static WHITESPACE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("whitespace pattern is valid"));

#[derive(Error, Debug)]
pub enum BundleError {
    #[error("Failed to parse template record: {0}")]
    Record(#[source] serde_json::Error),
    #[error("Failed to parse template bundle: {0}")]
    Bundle(#[source] serde_json::Error),
    #[error("Failed to serialize template: {0}")]
    Encode(#[source] serde_json::Error),
}

/// A template as persisted by the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateRecord {
    #[serde(default, rename = "_id", alias = "id", skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub title: String,
    /// JSON-encoded [`TemplateBundle`], or plain markup for very old records.
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cloudinary_public_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
}

impl TemplateRecord {
    pub fn from_json(json: &str) -> Result<Self, BundleError> {
        serde_json::from_str(json).map_err(BundleError::Record)
    }

    pub fn to_json(&self) -> Result<String, BundleError> {
        serde_json::to_string_pretty(self).map_err(BundleError::Encode)
    }

    /// Builds the record the editor saves for `doc`.
    pub fn from_document(doc: &EmailDocument, public_id: Option<&str>) -> Result<Self, BundleError> {
        let content = TemplateBundle::from_document(doc, public_id).encode()?;
        let image_url = (!doc.image_url.is_empty()).then(|| doc.image_url.clone());
        Ok(Self {
            id: None,
            title: doc.title.clone(),
            content,
            image_url,
            cloudinary_public_id: public_id.map(str::to_string),
            created_at: None,
        })
    }

    /// Decodes the bundle in `content`. A record whose content is not JSON
    /// at all becomes a document with that content as its body section;
    /// JSON of the wrong shape is an error.
    pub fn to_document(&self, config: &BuilderConfig) -> Result<EmailDocument, BundleError> {
        let bundle = match TemplateBundle::decode(&self.content) {
            Ok(bundle) => bundle,
            Err(BundleError::Bundle(e)) if matches!(e.classify(), Category::Syntax | Category::Eof) => {
                warn!(
                    "Template {:?} content is not JSON, using it as the body: {}",
                    self.title, e
                );
                TemplateBundle {
                    sections: Some(Sections {
                        content: self.content.clone(),
                        ..Default::default()
                    }),
                    ..Default::default()
                }
            }
            Err(e) => return Err(e),
        };
        Ok(bundle.into_document(&self.title, self.image_url.as_deref(), config))
    }
}

/// The decoded `content` of a [`TemplateRecord`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TemplateBundle {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sections: Option<Sections>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub styles: Option<SectionStyles>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_styles: Option<ImageStyles>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cloudinary_public_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub layout: Option<LegacyLayout>,
}

/// The nested per-section form older records use.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LegacyLayout {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub header: Option<LegacySection>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<LegacySection>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub footer: Option<LegacySection>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<LegacyImage>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LegacySection {
    pub content: Option<String>,
    pub styles: Option<SectionStyle>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LegacyImage {
    #[serde(flatten)]
    pub styles: ImageStyles,
    pub url: Option<String>,
}

impl TemplateBundle {
    pub fn decode(json: &str) -> Result<Self, BundleError> {
        serde_json::from_str(json).map_err(BundleError::Bundle)
    }

    pub fn encode(&self) -> Result<String, BundleError> {
        serde_json::to_string(self).map_err(BundleError::Encode)
    }

    /// Bundles `doc` in both the current and the legacy shape.
    pub fn from_document(doc: &EmailDocument, public_id: Option<&str>) -> Self {
        let legacy = |content: &str, styles: &SectionStyle| {
            Some(LegacySection {
                content: Some(content.to_string()),
                styles: Some(styles.clone()),
            })
        };
        Self {
            sections: Some(doc.sections.clone()),
            styles: Some(doc.styles.clone()),
            image_url: Some(doc.image_url.clone()),
            image_styles: Some(doc.image_styles.clone()),
            cloudinary_public_id: public_id.map(str::to_string),
            layout: Some(LegacyLayout {
                header: legacy(&doc.sections.header, &doc.styles.header),
                content: legacy(&doc.sections.content, &doc.styles.content),
                footer: legacy(&doc.sections.footer, &doc.styles.footer),
                image: Some(LegacyImage {
                    styles: doc.image_styles.clone(),
                    url: Some(doc.image_url.clone()),
                }),
            }),
        }
    }

    /// Resolves the bundle into the shape the renderer accepts.
    ///
    /// Section text prefers the legacy `layout` entry, styles prefer the
    /// top-level `styles`, image placement prefers `layout.image`, and the
    /// image URL prefers `imageUrl`, then `layout.image.url`, then
    /// `fallback_image_url`. Anything still missing comes from `config`.
    pub fn into_document(
        self,
        title: &str,
        fallback_image_url: Option<&str>,
        config: &BuilderConfig,
    ) -> EmailDocument {
        let LegacyLayout {
            header,
            content,
            footer,
            image,
        } = self.layout.unwrap_or_default();
        let (header_text, header_style) = split_legacy(header);
        let (content_text, content_style) = split_legacy(content);
        let (footer_text, footer_style) = split_legacy(footer);

        let current = self.sections.unwrap_or_default();
        let sections = Sections {
            header: first_non_empty(header_text, current.header),
            content: first_non_empty(content_text, current.content),
            footer: first_non_empty(footer_text, current.footer),
        };

        let styles = self.styles.unwrap_or_else(|| {
            debug!("Bundle has no top-level styles, using per-section styles");
            SectionStyles {
                header: header_style.unwrap_or_else(|| config.styles.header.clone()),
                content: content_style.unwrap_or_else(|| config.styles.content.clone()),
                footer: footer_style.unwrap_or_else(|| config.styles.footer.clone()),
            }
        });

        let (legacy_image_styles, legacy_image_url) = match image {
            Some(LegacyImage { styles, url }) => (Some(styles), url),
            None => (None, None),
        };
        let image_styles = legacy_image_styles
            .or(self.image_styles)
            .unwrap_or_else(|| config.image_styles.clone());
        let image_url = [
            self.image_url,
            legacy_image_url,
            fallback_image_url.map(str::to_string),
        ]
        .into_iter()
        .flatten()
        .find(|url| !url.is_empty())
        .unwrap_or_default();

        let title = if title.trim().is_empty() {
            config.title.clone()
        } else {
            title.to_string()
        };

        EmailDocument {
            title,
            sections,
            styles,
            image_url,
            image_styles,
        }
    }
}

fn split_legacy(section: Option<LegacySection>) -> (Option<String>, Option<SectionStyle>) {
    match section {
        Some(LegacySection { content, styles }) => (content, styles),
        None => (None, None),
    }
}

fn first_non_empty(preferred: Option<String>, fallback: String) -> String {
    preferred
        .filter(|text| !text.is_empty())
        .unwrap_or(fallback)
}

/// File name offered for an exported template: the lowercased title with
/// whitespace runs and path separators turned into `-`.
pub fn download_filename(title: &str) -> String {
    let slug = WHITESPACE_RE
        .replace_all(title.trim(), "-")
        .to_lowercase()
        .replace(['/', '\\'], "-");
    if slug.is_empty() {
        format!("email{}", DOWNLOAD_SUFFIX)
    } else {
        format!("{}{}", slug, DOWNLOAD_SUFFIX)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> BuilderConfig {
        BuilderConfig::default()
    }

    #[test]
    fn test_decode_current_shape() {
        let json = r##"{
            "sections": {"header": "<h1>Hi</h1>", "content": "Body", "footer": "Bye"},
            "styles": {"header": {"fontSize": "30px", "textAlign": "center"}},
            "imageUrl": "https://img.example.com/a.png",
            "imageStyles": {"width": "50%", "maxHeight": "200px", "alignment": "left"}
        }"##;
        let doc = TemplateBundle::decode(json)
            .unwrap()
            .into_document("Welcome", None, &config());
        assert_eq!(doc.title, "Welcome");
        assert_eq!(doc.sections.header, "<h1>Hi</h1>");
        assert_eq!(doc.sections.footer, "Bye");
        assert_eq!(doc.styles.header.font_size, "30px");
        assert_eq!(doc.styles.header.text_align, "center");
        // sections missing from `styles` fall back to the editor defaults
        assert_eq!(doc.styles.content, SectionStyles::default().content);
        assert_eq!(doc.image_url, "https://img.example.com/a.png");
        assert_eq!(doc.image_styles.alignment, "left");
        assert_eq!(doc.image_styles.max_height, "200px");
    }

    #[test]
    fn test_decode_legacy_layout_only() {
        let json = r##"{
            "layout": {
                "header": {"content": "Old header", "styles": {"color": "#ff0000"}},
                "content": {"content": "Old body"},
                "image": {"width": "80%", "maxHeight": "100px", "alignment": "right", "url": "https://img.example.com/old.png"}
            }
        }"##;
        let doc = TemplateBundle::decode(json)
            .unwrap()
            .into_document("Old", None, &config());
        assert_eq!(doc.sections.header, "Old header");
        assert_eq!(doc.sections.content, "Old body");
        assert_eq!(doc.sections.footer, "");
        assert_eq!(doc.styles.header.color, "#ff0000");
        assert_eq!(doc.styles.footer, SectionStyles::default().footer);
        assert_eq!(doc.image_url, "https://img.example.com/old.png");
        assert_eq!(doc.image_styles.width, "80%");
        assert_eq!(doc.image_styles.alignment, "right");
    }

    #[test]
    fn test_legacy_text_preferred_unless_empty() {
        let json = r#"{
            "sections": {"header": "new header", "content": "new body", "footer": "new footer"},
            "layout": {"header": {"content": "legacy header"}, "content": {"content": ""}}
        }"#;
        let doc = TemplateBundle::decode(json)
            .unwrap()
            .into_document("T", None, &config());
        assert_eq!(doc.sections.header, "legacy header");
        assert_eq!(doc.sections.content, "new body");
        assert_eq!(doc.sections.footer, "new footer");
    }

    #[test]
    fn test_image_url_precedence() {
        let bundle = TemplateBundle::decode(r#"{"layout": {"image": {"url": ""}}}"#).unwrap();
        let doc = bundle.into_document("T", Some("https://img.example.com/record.png"), &config());
        assert_eq!(doc.image_url, "https://img.example.com/record.png");

        let doc = TemplateBundle::default().into_document("T", None, &config());
        assert_eq!(doc.image_url, "");
        assert_eq!(doc.image_styles, ImageStyles::default());
    }

    #[test]
    fn test_blank_title_uses_config() {
        let mut config = config();
        config.title = "Newsletter".to_string();
        let doc = TemplateBundle::default().into_document("  ", None, &config);
        assert_eq!(doc.title, "Newsletter");
    }

    #[test]
    fn test_record_round_trip() {
        let doc = EmailDocument {
            title: "Spring Sale".to_string(),
            sections: Sections {
                header: r#"<p class="ql-align-center">Sale</p>"#.to_string(),
                content: "Everything must go".to_string(),
                footer: "Unsubscribe".to_string(),
            },
            styles: SectionStyles::default(),
            image_url: "https://img.example.com/sale.png".to_string(),
            image_styles: ImageStyles::default(),
        };
        let record = TemplateRecord::from_document(&doc, Some("email-builder/sale")).unwrap();
        assert_eq!(record.cloudinary_public_id.as_deref(), Some("email-builder/sale"));

        let bundle: serde_json::Value = serde_json::from_str(&record.content).unwrap();
        assert_eq!(bundle["layout"]["header"]["content"], doc.sections.header.as_str());
        assert_eq!(bundle["layout"]["image"]["url"], doc.image_url.as_str());
        assert_eq!(bundle["imageStyles"]["maxHeight"], "300px");

        let reparsed = TemplateRecord::from_json(&record.to_json().unwrap()).unwrap();
        assert_eq!(reparsed.to_document(&config()).unwrap(), doc);
    }

    #[test]
    fn test_record_with_plain_content() {
        let json = r#"{
            "_id": "65f0c0ffee",
            "title": "Legacy",
            "content": "<p>Just text</p>",
            "imageUrl": "https://img.example.com/x.png",
            "createdAt": "2024-03-01T10:00:00.000Z",
            "__v": 0
        }"#;
        let record = TemplateRecord::from_json(json).unwrap();
        assert_eq!(record.id.as_deref(), Some("65f0c0ffee"));
        let doc = record.to_document(&config()).unwrap();
        assert_eq!(doc.sections.content, "<p>Just text</p>");
        assert_eq!(doc.sections.header, "");
        assert_eq!(doc.image_url, "https://img.example.com/x.png");
        assert_eq!(doc.styles, SectionStyles::default());
    }

    #[test]
    fn test_record_with_numeric_style_values() {
        let content = r#"{"sections":{"header":"Hi","content":"Body","footer":"Bye"},"styles":{"header":{"fontSize":"24px"},"content":{"lineHeight":1.5,"color":null},"footer":{}}}"#;
        let record = TemplateRecord {
            id: None,
            title: "Numbers".to_string(),
            content: content.to_string(),
            image_url: None,
            cloudinary_public_id: None,
            created_at: None,
        };
        let doc = record.to_document(&config()).unwrap();
        assert_eq!(doc.sections.header, "Hi");
        assert_eq!(doc.sections.content, "Body");
        assert_eq!(doc.styles.content.line_height.as_deref(), Some("1.5"));
        assert_eq!(doc.styles.content.color, "");
    }

    #[test]
    fn test_record_with_misshapen_bundle_is_an_error() {
        let record = TemplateRecord {
            id: None,
            title: "Broken".to_string(),
            content: r#"{"sections": "not an object"}"#.to_string(),
            image_url: None,
            cloudinary_public_id: None,
            created_at: None,
        };
        assert!(matches!(
            record.to_document(&config()),
            Err(BundleError::Bundle(_))
        ));
    }

    #[test]
    fn test_record_requires_title_and_content() {
        assert!(matches!(
            TemplateRecord::from_json(r#"{"title": "x"}"#),
            Err(BundleError::Record(_))
        ));
    }

    #[test]
    fn test_download_filename() {
        assert_eq!(download_filename("Spring  Sale 2024"), "spring-sale-2024-template.html");
        assert_eq!(download_filename("Welcome"), "welcome-template.html");
        assert_eq!(download_filename("a/b"), "a-b-template.html");
        assert_eq!(download_filename("   "), "email-template.html");
    }

    #[test]
    fn test_default_layout() {
        assert!(DEFAULT_LAYOUT.contains("<title>{{title}}</title>"));
        assert!(DEFAULT_LAYOUT.contains("{{#if imageUrl}}"));
        assert!(DEFAULT_LAYOUT.contains("{{content}}"));
    }
}
