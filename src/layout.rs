use crate::inline_styles::force_value;
use crate::model::{ImageAlignment, ImageStyles, SectionStyle};

/// Wraps translated section markup in a block that pins its alignment and
/// lets long words break. Empty markup produces no wrapper at all.
pub fn wrap_with_alignment(content: &str, style: &SectionStyle) -> String {
    if content.is_empty() {
        return String::new();
    }
    let declarations = [
        ("text-align", style.text_align_or_default()),
        ("width", "100%"),
        ("display", "block"),
        ("word-wrap", "break-word"),
        ("overflow-wrap", "break-word"),
    ];
    format!(
        r#"<div style="{}">{}</div>"#,
        join_forced(&declarations),
        content
    )
}

/// Forced declarations for the exported image.
///
/// Width, max height and `object-fit` always apply; the recognized
/// alignments add their display, float and margin rules. Any other
/// alignment gets the base rules only.
pub fn image_declarations(image: &ImageStyles) -> Vec<(&'static str, &str)> {
    let mut declarations = vec![
        ("width", image.width.as_str()),
        ("max-height", image.max_height.as_str()),
        ("object-fit", "contain"),
    ];
    match image.placement() {
        Some(ImageAlignment::Center) => declarations.extend([
            ("display", "block"),
            ("margin", "0 auto"),
            ("float", "none"),
        ]),
        Some(ImageAlignment::Left) => declarations.extend([
            ("display", "inline-block"),
            ("float", "left"),
            ("margin-right", "20px"),
            ("margin-bottom", "10px"),
        ]),
        Some(ImageAlignment::Right) => declarations.extend([
            ("display", "inline-block"),
            ("float", "right"),
            ("margin-left", "20px"),
            ("margin-bottom", "10px"),
        ]),
        None => {}
    }
    declarations
}

/// The image declarations as one CSS declaration block.
pub fn image_css(image: &ImageStyles) -> String {
    join_forced(&image_declarations(image))
}

/// Unforced image styling for the live preview.
pub fn preview_image_css(image: &ImageStyles) -> String {
    let centered = image.placement() == Some(ImageAlignment::Center);
    format!(
        "width: {}; max-height: {}; display: {}; margin: {};",
        image.width,
        image.max_height,
        if centered { "block" } else { "inline" },
        if centered { "0 auto" } else { "0" },
    )
}

fn join_forced(declarations: &[(&str, &str)]) -> String {
    declarations
        .iter()
        .map(|(property, value)| format!("{}: {};", property, force_value(value)))
        .collect::<Vec<_>>()
        .join(" ")
}
