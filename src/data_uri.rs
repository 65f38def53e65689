//! Data URI encoding for inline placeholders.
//!
//! SVG markup is inlined as percent-encoded text rather than base64: it is
//! shorter and still compresses well. Characters that are safe inside a
//! quoted `url(...)` or `src` attribute are left readable.

/// Prefix of a JPEG placeholder data URI.
pub const JPEG_BASE64_HEADER: &str = "data:image/jpeg;base64,";

/// Prefix of an SVG data URI.
pub const SVG_HEADER: &str = "data:image/svg+xml,";

/// Percent-escapes that are turned back into their literal character.
const RESTORED: &[(&str, &str)] = &[
    ("%20", " "),
    ("%3D", "="),
    ("%3A", ":"),
    ("%2F", "/"),
    ("%27", "'"),
    ("%2C", ","),
];

/// Encode SVG markup for use after [`SVG_HEADER`].
///
/// Whitespace runs collapse to one space, double quotes become single
/// quotes, and the result is percent-encoded with the readable characters
/// above restored.
pub fn encode_svg(markup: &str) -> String {
    let collapsed = markup.split_whitespace().collect::<Vec<_>>().join(" ");
    let quoted = collapsed.replace('"', "'");
    let mut encoded = urlencoding::encode(&quoted).into_owned();
    for (escape, literal) in RESTORED {
        encoded = encoded.replace(escape, literal);
    }
    encoded
}

/// `data:image/jpeg;base64,` URI for base64 `content`, percent-encoded so
/// `+`, `/` and `=` survive attribute contexts.
pub fn jpeg_data_uri(content: &str) -> String {
    format!("{JPEG_BASE64_HEADER}{}", urlencoding::encode(content))
}

/// `data:image/svg+xml,` URI for markup that is already encoded.
pub fn svg_data_uri(encoded: &str) -> String {
    format!("{SVG_HEADER}{encoded}")
}
