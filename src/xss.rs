//! Cross-site-scripting defusal.
//!
//! A layered, purely textual pipeline: it does not parse HTML, it rewrites
//! the byte stream so that known script vectors stop being executable. The
//! layers run in a fixed order because later layers assume earlier ones
//! (entity decoding must happen before attribute stripping can see through
//! `&#106;avascript:`-style obfuscation).

use lazy_static::lazy_static;
use regex::Regex;

use crate::value::Value;

/// Interleaves every character of `word` with an optional run of control
/// characters and spaces, defeating `j a v a s c r i p t:` obfuscation.
fn spaced(word: &str) -> String {
    word.chars()
        .map(|c| format!("{}[\\x00-\\x20]*", regex::escape(&c.to_string())))
        .collect()
}

lazy_static! {
    /// Stray whitespace between a character reference and its `;`
    static ref MALFORMED_REF: Regex = Regex::new(r"(&#*\w+)[\x00-\x20]+;").unwrap();

    /// Hex references with a missing or repeated terminator
    static ref HEX_REF: Regex = Regex::new(r"(?i)(&#x*[0-9A-F]+);*").unwrap();

    /// Event-handler (`on*`) and `xmlns` attributes
    static ref EVENT_ATTR: Regex =
        Regex::new(r#"(?i)(?:on[a-z]+|xmlns)\s*=\s*['"\x00-\x20]?[^'>"]*['"\x00-\x20]?\s?"#)
            .unwrap();

    /// `javascript:` URIs, whitespace-obfuscated, in attribute position
    static ref JAVASCRIPT_URI: Regex = Regex::new(&format!(
        r#"(?i)([a-z]*)[\x00-\x20]*=[\x00-\x20]*([`'"]*)[\x00-\x20]*{}:"#,
        spaced("javascript")
    ))
    .unwrap();

    /// `vbscript:` URIs, same shape
    static ref VBSCRIPT_URI: Regex = Regex::new(&format!(
        r#"(?i)([a-z]*)[\x00-\x20]*=[\x00-\x20]*(['"]*)[\x00-\x20]*{}:"#,
        spaced("vbscript")
    ))
    .unwrap();

    /// `-moz-binding:` CSS URIs (Gecko XBL injection)
    static ref MOZ_BINDING_URI: Regex = Regex::new(&format!(
        r#"(?i)([a-z]*)[\x00-\x20]*=[\x00-\x20]*(['"]*)[\x00-\x20]*{}:"#,
        spaced("-moz-binding")
    ))
    .unwrap();

    /// `style` attributes carrying `expression(...)` (IE dynamic properties)
    static ref STYLE_EXPRESSION: Regex = Regex::new(
        r#"(?is)(<[^>]+?)style[\x00-\x20]*=[\x00-\x20]*[`'"]*.*?expression[\x00-\x20]*\([^>]*>"#
    )
    .unwrap();

    /// `style` attributes carrying `behaviour(...)` (IE HTC binding)
    static ref STYLE_BEHAVIOUR: Regex = Regex::new(
        r#"(?is)(<[^>]+?)style[\x00-\x20]*=[\x00-\x20]*[`'"]*.*?behaviour[\x00-\x20]*\([^>]*>"#
    )
    .unwrap();

    /// `style` attributes smuggling an obfuscated `script:` token
    static ref STYLE_SCRIPT: Regex = Regex::new(&format!(
        r#"(?is)(<[^>]+?)style[\x00-\x20]*=[\x00-\x20]*[`'"]*.*?{}:*[^>]*>"#,
        spaced("script")
    ))
    .unwrap();

    /// Namespaced elements (`<ns:tag>`), open or close
    static ref NAMESPACED_TAG: Regex = Regex::new(r"(?i)</*\w+:\w[^>]*>").unwrap();

    /// Tags with no safe use in user input, stripped iteratively
    static ref UNWANTED_TAG: Regex = Regex::new(
        r"(?i)<[\x00-\x20]*/*[\x00-\x20]*(?:applet|b(?:ase|gsound|link)|embed|frame(?:set)?|i(?:frame|layer)|l(?:ayer|ink)|meta|object|s(?:cript|tyle)|title|xml)[^>]*"
    )
    .unwrap();
}

/// HTML 4 named character references that show up in real payloads.
/// Numeric references are decoded separately and cover the rest.
const NAMED_ENTITIES: &[(&str, char)] = &[
    ("amp", '&'),
    ("lt", '<'),
    ("gt", '>'),
    ("quot", '"'),
    ("nbsp", '\u{a0}'),
    ("copy", '\u{a9}'),
    ("reg", '\u{ae}'),
    ("laquo", '\u{ab}'),
    ("raquo", '\u{bb}'),
    ("times", '\u{d7}'),
    ("divide", '\u{f7}'),
    ("ndash", '\u{2013}'),
    ("mdash", '\u{2014}'),
    ("hellip", '\u{2026}'),
    ("trade", '\u{2122}'),
];

/// Decodes HTML character references (named, decimal, and hex) to raw
/// characters. Unknown or malformed references pass through unchanged.
fn decode_entities(data: &str) -> String {
    let mut out = String::with_capacity(data.len());
    let bytes = data.as_bytes();
    let mut i = 0;

    while i < bytes.len() {
        if bytes[i] != b'&' {
            let ch_len = utf8_len(bytes[i]);
            out.push_str(&data[i..i + ch_len]);
            i += ch_len;
            continue;
        }

        // A reference is `&` + at most ~10 chars + `;`
        let close = data[i + 1..]
            .char_indices()
            .take(10)
            .find(|&(_, c)| c == ';')
            .map(|(off, _)| i + 1 + off);

        let Some(end) = close else {
            out.push('&');
            i += 1;
            continue;
        };

        let body = &data[i + 1..end];
        if let Some(c) = decode_reference(body) {
            out.push(c);
            i = end + 1;
        } else {
            out.push('&');
            i += 1;
        }
    }

    out
}

/// Decodes the body of a single `&...;` reference, without the delimiters.
fn decode_reference(body: &str) -> Option<char> {
    if let Some(num) = body.strip_prefix('#') {
        let code = if let Some(hex) = num.strip_prefix('x').or_else(|| num.strip_prefix('X')) {
            u32::from_str_radix(hex, 16).ok()?
        } else {
            num.parse::<u32>().ok()?
        };
        return char::from_u32(code);
    }
    NAMED_ENTITIES
        .iter()
        .find(|(name, _)| *name == body)
        .map(|&(_, c)| c)
}

fn utf8_len(first_byte: u8) -> usize {
    match first_byte {
        b if b < 0x80 => 1,
        b if b >= 0xF0 => 4,
        b if b >= 0xE0 => 3,
        _ => 2,
    }
}

/// The built-in defusal pipeline applied to a single string.
///
/// Layers, in order:
/// 1. escape pre-existing `&amp;`/`&lt;`/`&gt;` so they survive decoding as
///    text, repair malformed character references, then decode all entities
/// 2. strip `on*` and `xmlns` attributes
/// 3. neutralize `javascript:`, `vbscript:`, and `-moz-binding:` URIs
/// 4. strip `style` attributes carrying `expression(`, `behaviour(`, or an
///    obfuscated `script:` token
/// 5. strip namespaced elements
/// 6. iteratively strip the unwanted-tag denylist until a pass is a no-op
///
/// # Examples
///
/// ```
/// use validation_core::xss_filter_default;
///
/// let cleaned = xss_filter_default("<script>alert(1)</script>");
/// assert!(!cleaned.to_lowercase().contains("<script"));
/// ```
pub fn xss_filter_default(data: &str) -> String {
    // Layer 1: entity normalization and decoding
    let data = data
        .replace("&amp;", "&amp;amp;")
        .replace("&lt;", "&amp;lt;")
        .replace("&gt;", "&amp;gt;");
    let data = MALFORMED_REF.replace_all(&data, "${1};");
    let data = HEX_REF.replace_all(&data, "${1};");
    let data = decode_entities(&data);

    // Layer 2: event handler and xmlns attributes
    let data = EVENT_ATTR.replace_all(&data, "");

    // Layer 3: script-capable URI schemes, obfuscation-tolerant
    let data = JAVASCRIPT_URI.replace_all(&data, "${1}=${2}nojavascript...");
    let data = VBSCRIPT_URI.replace_all(&data, "${1}=${2}novbscript...");
    let data = MOZ_BINDING_URI.replace_all(&data, "${1}=${2}nomozbinding...");

    // Layer 4: style attributes that execute
    let data = STYLE_EXPRESSION.replace_all(&data, "${1}>");
    let data = STYLE_BEHAVIOUR.replace_all(&data, "${1}>");
    let data = STYLE_SCRIPT.replace_all(&data, "${1}>");

    // Layer 5: namespaced elements
    let data = NAMESPACED_TAG.replace_all(&data, "");

    // Layer 6: denylisted tags, repeated until stable so that nested
    // fragments like `<<script>script>` cannot reassemble a tag
    let mut data = data.into_owned();
    loop {
        let stripped = UNWANTED_TAG.replace_all(&data, "").into_owned();
        if stripped == data {
            break;
        }
        data = stripped;
    }

    data
}

/// Applies a string-level defusal filter across a value tree.
///
/// Recurses through lists and maps; strings that are empty after trimming
/// are returned untouched (nothing to defuse, and the original whitespace
/// is preserved).
pub fn xss_clean_value<F>(value: &Value, filter: &F) -> Value
where
    F: Fn(&str) -> String,
{
    match value {
        Value::Null => Value::Null,
        Value::Str(s) => {
            if s.trim().is_empty() {
                Value::Str(s.clone())
            } else {
                Value::Str(filter(s))
            }
        }
        Value::List(items) => {
            Value::List(items.iter().map(|v| xss_clean_value(v, filter)).collect())
        }
        Value::Map(entries) => Value::Map(
            entries
                .iter()
                .map(|(k, v)| (k.clone(), xss_clean_value(v, filter)))
                .collect(),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_script_tags() {
        let cleaned = xss_filter_default("<script>alert(1)</script>");
        assert!(!cleaned.to_lowercase().contains("<script"));
    }

    #[test]
    fn nested_malformed_tags_terminate() {
        let cleaned = xss_filter_default("<<script>script>alert(1)<</script>/script>");
        assert!(!cleaned.to_lowercase().contains("<script"));
    }

    #[test]
    fn obfuscated_javascript_uri() {
        let cleaned = xss_filter_default(r#"href="j a v a s c r i p t:alert(1)""#);
        assert!(!cleaned.to_lowercase().contains("javascript:"));
        assert!(cleaned.contains("nojavascript..."));
    }

    #[test]
    fn vbscript_uri_neutralized() {
        let cleaned = xss_filter_default(r#"<a href="vbscript:msgbox(1)">x</a>"#);
        assert!(!cleaned.to_lowercase().contains("vbscript:"));
    }

    #[test]
    fn event_handler_attributes_removed() {
        let cleaned = xss_filter_default(r#"<img src=x onerror="alert(1)">"#);
        assert!(!cleaned.to_lowercase().contains("onerror"));
    }

    #[test]
    fn entity_encoded_payload_decoded_then_stripped() {
        // &#106; etc. decodes to "javascript:" which layer 3 then defuses
        let payload = r#"<a href="&#106;&#97;&#118;&#97;script:alert(1)">x</a>"#;
        let cleaned = xss_filter_default(payload);
        assert!(!cleaned.to_lowercase().contains("javascript:"));
    }

    #[test]
    fn preescaped_entities_survive_as_text() {
        // Literal "&lt;script&gt;" in the input is display text, not markup;
        // it must not be double-decoded into a live tag
        let cleaned = xss_filter_default("&lt;script&gt;");
        assert!(!cleaned.contains("<script"));
    }

    #[test]
    fn style_expression_stripped() {
        let cleaned =
            xss_filter_default(r#"<span style="width: expression(alert(1));">x</span>"#);
        assert!(!cleaned.to_lowercase().contains("expression("));
    }

    #[test]
    fn namespaced_elements_removed() {
        let cleaned = xss_filter_default("<xml:namespace>x</xml:namespace>");
        assert!(!cleaned.contains("<xml:namespace"));
    }

    #[test]
    fn meta_and_iframe_removed() {
        let cleaned = xss_filter_default(r#"<meta http-equiv="refresh"><iframe src="x">"#);
        assert!(!cleaned.to_lowercase().contains("<meta"));
        assert!(!cleaned.to_lowercase().contains("<iframe"));
    }

    #[test]
    fn plain_text_untouched() {
        assert_eq!(xss_filter_default("hello world"), "hello world");
    }

    #[test]
    fn decode_numeric_references() {
        assert_eq!(decode_entities("&#65;&#x42;&#X43;"), "ABC");
        assert_eq!(decode_entities("&amp;&quot;"), "&\"");
    }

    #[test]
    fn malformed_references_pass_through() {
        assert_eq!(decode_entities("&#zzz;"), "&#zzz;");
        assert_eq!(decode_entities("a & b"), "a & b");
        assert_eq!(decode_entities("&unknownentity;"), "&unknownentity;");
    }

    #[test]
    fn tree_recursion_skips_blank_strings() {
        let v = Value::List(vec![
            Value::from("   "),
            Value::from("<script>x</script>"),
        ]);
        let cleaned = xss_clean_value(&v, &xss_filter_default);
        match cleaned {
            Value::List(items) => {
                assert_eq!(items[0].as_str(), Some("   "));
                assert!(!items[1].as_str().unwrap().contains("<script"));
            }
            other => panic!("expected list, got {:?}", other),
        }
    }
}
