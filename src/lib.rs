//! Email template builder.
//!
//! Turns header, content and footer markup from a rich-text editor, per-section
//! styles and an optional image into a standalone HTML document that email
//! clients render consistently: editor classes become inline styles, every
//! declaration is forced, and each section is wrapped to pin its alignment.
//!
//! ```
//! use email_builder::{render, ImageStyles, SectionStyles, Sections};
//!
//! let sections = Sections {
//!     header: r#"<p class="ql-align-center">Hello</p>"#.to_string(),
//!     content: "Thanks for signing up.".to_string(),
//!     footer: String::new(),
//! };
//! let html = render(
//!     "Welcome",
//!     &sections,
//!     &SectionStyles::default(),
//!     "",
//!     &ImageStyles::default(),
//! )
//! .unwrap();
//! assert!(html.contains("text-align: center !important"));
//! ```

pub mod bundle;
pub mod config;
pub mod engine;
pub mod filters;
pub mod inline_styles;
pub mod layout;
pub mod model;

pub use bundle::{download_filename, BundleError, TemplateBundle, TemplateRecord, DEFAULT_LAYOUT};
pub use config::{BuilderConfig, ConfigError};
pub use engine::{render, EmailRenderer, RenderError};
pub use model::{
    EmailDocument, ImageAlignment, ImageStyles, Section, SectionStyle, SectionStyles, Sections,
    ValidationError,
};
