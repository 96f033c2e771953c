use log::debug;
use minijinja::{AutoEscape, Environment, UndefinedBehavior};
use serde::Serialize;
use thiserror::Error;

use crate::inline_styles::translate;
use crate::layout::{image_css, preview_image_css, wrap_with_alignment};
use crate::model::{EmailDocument, ImageStyles, Section, SectionStyle, SectionStyles, Sections};

/// Standalone document written out for email clients.
const EXPORT_TEMPLATE: &str = include_str!("../templates/export.html.j2");

/// Reduced fragment shown next to the editor.
const PREVIEW_TEMPLATE: &str = include_str!("../templates/preview.html.j2");

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("Failed to render {template} template: {detail}")]
    Template {
        template: &'static str,
        detail: String,
    },
}

/// Template context for one section container.
#[derive(Serialize)]
struct SectionContext<'a> {
    declarations: Vec<(&'a str, &'a str)>,
    background: &'a str,
    color: &'a str,
    body: String,
}

#[derive(Serialize)]
struct DocumentContext<'a> {
    title: &'a str,
    header: SectionContext<'a>,
    content: SectionContext<'a>,
    footer: SectionContext<'a>,
    image_url: &'a str,
    image_alignment: &'a str,
    image_css: String,
}

/// EmailRenderer wraps a minijinja::Environment configured for raw HTML output.
///
/// Rendering is a pure function of its inputs: the environment is never
/// mutated after construction, so one renderer may be shared across threads.
pub struct EmailRenderer {
    env: Environment<'static>,
}

impl EmailRenderer {
    /// Creates a new EmailRenderer with the CSS filters registered.
    pub fn new() -> Self {
        let mut env = Environment::new();
        env.set_undefined_behavior(UndefinedBehavior::Strict);
        // Title and section markup are embedded as given.
        env.set_auto_escape_callback(|_| AutoEscape::None);

        env.add_filter("css_property", crate::filters::css_property);
        env.add_filter("important", crate::filters::important);

        Self { env }
    }

    /// Renders the standalone, email-client-safe HTML document.
    pub fn render(&self, doc: &EmailDocument) -> Result<String, RenderError> {
        self.render_parts(
            &doc.title,
            &doc.sections,
            &doc.styles,
            &doc.image_url,
            &doc.image_styles,
        )
    }

    /// Renders the standalone document from its individual parts.
    pub fn render_parts(
        &self,
        title: &str,
        sections: &Sections,
        styles: &SectionStyles,
        image_url: &str,
        image_styles: &ImageStyles,
    ) -> Result<String, RenderError> {
        let export_section = |section: Section| {
            let style = styles.get(section);
            let body = wrap_with_alignment(&translate(sections.get(section)), style);
            debug!("Rendered {} section ({} bytes)", section, body.len());
            section_context(style, body)
        };
        let context = DocumentContext {
            title,
            header: export_section(Section::Header),
            content: export_section(Section::Content),
            footer: export_section(Section::Footer),
            image_url,
            image_alignment: &image_styles.alignment,
            image_css: image_css(image_styles),
        };
        self.render_template("export", EXPORT_TEMPLATE, &context)
    }

    /// Renders the live-preview fragment: untranslated markup, unforced
    /// styles, and empty sections left out.
    pub fn render_preview(&self, doc: &EmailDocument) -> Result<String, RenderError> {
        let preview_section = |section: Section| {
            section_context(doc.styles.get(section), doc.sections.get(section).to_string())
        };
        let context = DocumentContext {
            title: &doc.title,
            header: preview_section(Section::Header),
            content: preview_section(Section::Content),
            footer: preview_section(Section::Footer),
            image_url: &doc.image_url,
            image_alignment: &doc.image_styles.alignment,
            image_css: preview_image_css(&doc.image_styles),
        };
        self.render_template("preview", PREVIEW_TEMPLATE, &context)
    }

    fn render_template<T: Serialize>(
        &self,
        name: &'static str,
        template_str: &'static str,
        context: &T,
    ) -> Result<String, RenderError> {
        let template_error = |e: minijinja::Error| {
            let detail = match e.line() {
                Some(line) => {
                    let error_line = template_str.lines().nth(line - 1).unwrap_or("");
                    format!("{}\n{}", e, error_line)
                }
                None => e.to_string(),
            };
            RenderError::Template {
                template: name,
                detail,
            }
        };
        let template = self
            .env
            .template_from_str(template_str)
            .map_err(template_error)?;
        template.render(context).map_err(template_error)
    }
}

impl Default for EmailRenderer {
    fn default() -> Self {
        Self::new()
    }
}

fn section_context<'a>(style: &'a SectionStyle, body: String) -> SectionContext<'a> {
    SectionContext {
        declarations: style.declarations(),
        background: style.background_or_default(),
        color: style.color_or_default(),
        body,
    }
}

/// Renders the export document with a fresh renderer.
pub fn render(
    title: &str,
    sections: &Sections,
    styles: &SectionStyles,
    image_url: &str,
    image_styles: &ImageStyles,
) -> Result<String, RenderError> {
    EmailRenderer::new().render_parts(title, sections, styles, image_url, image_styles)
}
