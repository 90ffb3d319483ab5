//! JSON encoding used for every response body.
//!
//! Strings are written with `<`, `>`, `&`, U+2028 and U+2029 escaped as
//! `\uXXXX`, so encoded bodies are safe to embed in HTML and byte-identical
//! to what existing consumers of this API already receive.

use serde::Serialize;
use serde_json::ser::Formatter;
use std::io;

/// Compact output with HTML-sensitive characters escaped in strings.
#[derive(Debug, Default, Clone, Copy)]
pub struct HtmlSafeFormatter;

impl Formatter for HtmlSafeFormatter {
    fn write_string_fragment<W>(&mut self, writer: &mut W, fragment: &str) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        let mut start = 0;
        for (i, ch) in fragment.char_indices() {
            let escaped = match ch {
                '<' => "\\u003c",
                '>' => "\\u003e",
                '&' => "\\u0026",
                '\u{2028}' => "\\u2028",
                '\u{2029}' => "\\u2029",
                _ => continue,
            };
            writer.write_all(&fragment.as_bytes()[start..i])?;
            writer.write_all(escaped.as_bytes())?;
            start = i + ch.len_utf8();
        }
        writer.write_all(&fragment.as_bytes()[start..])
    }
}

pub fn to_vec<T: Serialize + ?Sized>(value: &T) -> Result<Vec<u8>, serde_json::Error> {
    let mut buf = Vec::with_capacity(128);
    let mut serializer = serde_json::Serializer::with_formatter(&mut buf, HtmlSafeFormatter);
    value.serialize(&mut serializer)?;
    Ok(buf)
}

pub fn to_string<T: Serialize + ?Sized>(value: &T) -> Result<String, serde_json::Error> {
    let buf = to_vec(value)?;
    String::from_utf8(buf).map_err(<serde_json::Error as serde::ser::Error>::custom)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escapes_html_sensitive_characters() {
        let encoded = to_string("<b>Tom & Jerry</b>").unwrap();
        assert_eq!(encoded, r#""\u003cb\u003eTom \u0026 Jerry\u003c/b\u003e""#);
    }

    #[test]
    fn escapes_line_and_paragraph_separators() {
        let encoded = to_string("a\u{2028}b\u{2029}c").unwrap();
        assert_eq!(encoded, r#""a\u2028b\u2029c""#);
    }

    #[test]
    fn leaves_other_text_untouched() {
        let encoded = to_string("ご注文ありがとうございます \"quoted\"\n").unwrap();
        assert_eq!(encoded, "\"ご注文ありがとうございます \\\"quoted\\\"\\n\"");
    }

    #[test]
    fn backspace_and_form_feed_use_short_escapes() {
        let encoded = to_string("a\u{8}b\u{c}c\u{1}").unwrap();
        assert_eq!(encoded, r#""a\bb\fc\u0001""#);
    }

    #[test]
    fn escaped_output_still_parses_back() {
        let original = "1 < 2 && 3 > 2";
        let decoded: String = serde_json::from_str(&to_string(original).unwrap()).unwrap();
        assert_eq!(decoded, original);
    }
}
