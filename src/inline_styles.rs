//! Rewrites editor class markers into inline styles and forces every inline
//! declaration, since most email clients drop `<style>` rules and classes
//! but keep `style` attributes.

use log::debug;
use regex::{Captures, Regex};
use std::sync::LazyLock;

/// Suffix that raises a declaration to the highest priority.
pub const FORCED: &str = "!important";

/// Editor class markers and the inline style each one is replaced with.
const MARKERS: [(&str, &str); 7] = [
    (
        r#"class="ql-align-center""#,
        r#"style="text-align: center !important;""#,
    ),
    (
        r#"class="ql-align-right""#,
        r#"style="text-align: right !important;""#,
    ),
    (
        r#"class="ql-align-justify""#,
        r#"style="text-align: justify !important;""#,
    ),
    (
        r#"class="ql-align-left""#,
        r#"style="text-align: left !important;""#,
    ),
    (
        r#"class="ql-size-small""#,
        r#"style="font-size: 0.75em !important""#,
    ),
    (
        r#"class="ql-size-large""#,
        r#"style="font-size: 1.5em !important""#,
    ),
    (
        r#"class="ql-size-huge""#,
        r#"style="font-size: 2.5em !important""#,
    ),
];

/// The regex pattern for inline style attributes.
const STYLE_ATTRIBUTE: &str = r#"style="([^"]*)""#;

static STYLE_ATTRIBUTE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(STYLE_ATTRIBUTE).expect("style attribute pattern is valid"));

/// Translates markers and forces inline styles in one section's markup.
///
/// Markup is treated as text: nothing is parsed, and anything that is not a
/// marker or a well-formed `style="..."` attribute is copied through.
pub fn translate(content: &str) -> String {
    if content.is_empty() {
        return String::new();
    }
    force_inline_styles(&replace_markers(content))
}

/// Replaces each known class marker with its inline style.
pub fn replace_markers(content: &str) -> String {
    MARKERS
        .iter()
        .fold(content.to_string(), |acc, (marker, style)| {
            if acc.contains(marker) {
                acc.replace(marker, style)
            } else {
                acc
            }
        })
}

/// Forces every declaration of every `style="..."` attribute.
pub fn force_inline_styles(content: &str) -> String {
    STYLE_ATTRIBUTE_RE
        .replace_all(content, |caps: &Captures| {
            format!(r#"style="{}""#, force_declarations(&caps[1]))
        })
        .into_owned()
}

/// Forces a `;`-separated declaration list, dropping empty or malformed
/// fragments, and joins the result with `; `.
pub fn force_declarations(declarations: &str) -> String {
    declarations
        .split(';')
        .map(str::trim)
        .filter(|fragment| !fragment.is_empty())
        .filter_map(force_declaration)
        .collect::<Vec<_>>()
        .join("; ")
}

fn force_declaration(fragment: &str) -> Option<String> {
    let Some((property, value)) = fragment.split_once(':') else {
        debug!("Dropping inline declaration without a value: {:?}", fragment);
        return None;
    };
    let (property, value) = (property.trim(), value.trim());
    if property.is_empty() || value.is_empty() {
        debug!("Dropping incomplete inline declaration: {:?}", fragment);
        return None;
    }
    Some(format!("{}: {}", property, force_value(value)))
}

/// Appends the forcing suffix to a CSS value unless it already has one.
pub fn force_value(value: &str) -> String {
    let value = value.trim();
    if is_forced(value) {
        value.to_string()
    } else {
        format!("{} {}", value, FORCED)
    }
}

pub fn is_forced(value: &str) -> bool {
    value.contains(FORCED)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_alignment_markers() {
        for align in ["center", "right", "justify", "left"] {
            let input = format!(r#"<p class="ql-align-{}">x</p>"#, align);
            let output = translate(&input);
            assert!(!output.contains("ql-align-"), "{}", output);
            assert_eq!(
                output,
                format!(r#"<p style="text-align: {} !important">x</p>"#, align)
            );
        }
    }

    #[test]
    fn test_size_markers() {
        for (size, em) in [("small", "0.75em"), ("large", "1.5em"), ("huge", "2.5em")] {
            let input = format!(r#"<span class="ql-size-{}">x</span>"#, size);
            let output = translate(&input);
            assert!(!output.contains("ql-size-"), "{}", output);
            assert_eq!(
                output,
                format!(r#"<span style="font-size: {} !important">x</span>"#, em)
            );
        }
    }

    #[test]
    fn test_every_occurrence_replaced() {
        let input = r#"<p class="ql-align-center">a</p><p class="ql-align-center">b</p>"#;
        let output = translate(input);
        assert_eq!(output.matches("text-align: center !important").count(), 2);
        assert!(!output.contains("class="));
    }

    #[test]
    fn test_existing_styles_are_forced() {
        let input = r#"<span style="color: rgb(230, 0, 0); background-color: yellow;">x</span>"#;
        assert_eq!(
            translate(input),
            r#"<span style="color: rgb(230, 0, 0) !important; background-color: yellow !important">x</span>"#
        );
    }

    #[test]
    fn test_no_double_forcing() {
        let input = r#"<b style="color: red !important; font-weight:bold">x</b>"#;
        let output = translate(input);
        assert_eq!(
            output,
            r#"<b style="color: red !important; font-weight: bold !important">x</b>"#
        );
        assert!(!output.contains("!important !important"));
    }

    #[test]
    fn test_malformed_fragments_dropped() {
        let input = r#"<i style="; color: red;;bogus; : 1px; margin: ;">x</i>"#;
        assert_eq!(translate(input), r#"<i style="color: red !important">x</i>"#);
    }

    #[test]
    fn test_value_keeps_colons() {
        let input = r#"<div style="background: url(https://cdn.example.com/a.png)">x</div>"#;
        assert_eq!(
            translate(input),
            r#"<div style="background: url(https://cdn.example.com/a.png) !important">x</div>"#
        );
    }

    #[test]
    fn test_unterminated_style_left_as_is() {
        let input = r#"<p style="color: red>broken</p>"#;
        assert_eq!(translate(input), input);
    }

    #[test]
    fn test_plain_markup_unchanged() {
        let input = "<p><strong>Hello</strong> <a href=\"https://example.com\">world</a></p>";
        assert_eq!(translate(input), input);
        assert_eq!(translate(""), "");
    }

    #[test]
    fn test_forcing_is_idempotent() {
        let input = r#"<p class="ql-align-right"><span style="color:blue;font-size: 2em">x</span></p>"#;
        let once = translate(input);
        let twice = translate(&once);
        assert_eq!(once, twice);
    }

    #[test]
    fn test_force_value() {
        assert_eq!(force_value("12px"), "12px !important");
        assert_eq!(force_value(" 12px !important "), "12px !important");
    }
}
