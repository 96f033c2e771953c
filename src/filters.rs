use heck::ToKebabCase;

use crate::inline_styles::force_value;

/// Turns a style-object key (`backgroundColor`) into a CSS property name
/// (`background-color`). Names already in kebab case pass through, as do
/// custom properties and vendor prefixes (`--brand`, `-webkit-...`).
pub fn css_property(name: String) -> String {
    if name.starts_with('-') {
        name
    } else {
        name.to_kebab_case()
    }
}

/// Forces a CSS value, once.
pub fn important(value: String) -> String {
    force_value(&value)
}
