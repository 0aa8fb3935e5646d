//! Parsing of `.cfg` / `.properties` text into a property set

use crate::{Error, Properties, PropertyValue, Result};

/// Whitespace recognized between key and value and at line starts
const WHITESPACE: [char; 3] = [' ', '\t', '\u{c}'];

/// Parse properties text in the `java.util.Properties` line format.
///
/// Blank lines and lines whose first non-blank character is `#` or `!` are
/// comments. A line ending in an odd number of backslashes continues on the
/// next line, with that line's leading whitespace dropped. The key ends at
/// the first unescaped `=`, `:` or whitespace; the value is the remainder
/// after the separator with leading whitespace removed. Both support the
/// `\t`, `\n`, `\r`, `\f` and `\uXXXX` escapes; any other escaped character
/// stands for itself.
///
/// # Errors
///
/// Returns `PropertiesParse` for non UTF-8 input, an empty key or a
/// malformed `\u` escape.
pub fn parse_properties(content: &[u8]) -> Result<Properties> {
    let text = std::str::from_utf8(content).map_err(|e| Error::PropertiesParse {
        line: 0,
        message: format!("content is not UTF-8: {e}"),
    })?;

    let mut properties = Properties::new();
    for (line, logical) in logical_lines(text) {
        let (raw_key, raw_value) = split_entry(&logical);
        let key = unescape(raw_key, line)?;
        if key.is_empty() {
            return Err(Error::PropertiesParse {
                line,
                message: "empty key".to_string(),
            });
        }
        let value = unescape(raw_value, line)?;
        properties.insert(key, PropertyValue::String(value));
    }
    Ok(properties)
}

/// Join continued lines into `(first line number, logical line)` pairs.
fn logical_lines(text: &str) -> Vec<(usize, String)> {
    let mut lines = Vec::new();
    let mut open: Option<(usize, String)> = None;

    for (idx, raw) in text.lines().enumerate() {
        let line = raw.trim_start_matches(WHITESPACE);
        let (number, mut logical) = match open.take() {
            Some(continued) => continued,
            None if line.is_empty() || line.starts_with(['#', '!']) => continue,
            None => (idx + 1, String::new()),
        };
        if continues(line) {
            logical.push_str(&line[..line.len() - 1]);
            open = Some((number, logical));
        } else {
            logical.push_str(line);
            lines.push((number, logical));
        }
    }
    // Continuation on the last line
    lines.extend(open);
    lines
}

fn continues(line: &str) -> bool {
    line.chars().rev().take_while(|&c| c == '\\').count() % 2 == 1
}

/// Split a logical line into its raw key and raw value.
fn split_entry(line: &str) -> (&str, &str) {
    let mut escaped = false;
    let mut key_end = line.len();
    for (pos, c) in line.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match c {
            '\\' => escaped = true,
            '=' | ':' => return (&line[..pos], line[pos + 1..].trim_start_matches(WHITESPACE)),
            c if WHITESPACE.contains(&c) => {
                key_end = pos;
                break;
            }
            _ => {}
        }
    }

    let rest = line[key_end..].trim_start_matches(WHITESPACE);
    let value = rest
        .strip_prefix(['=', ':'])
        .map_or(rest, |value| value.trim_start_matches(WHITESPACE));
    (&line[..key_end], value)
}

fn unescape(raw: &str, line: usize) -> Result<String> {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('t') => out.push('\t'),
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some('f') => out.push('\u{c}'),
            Some('u') => out.push(unicode_escape(&mut chars, line)?),
            Some(other) => out.push(other),
            None => {}
        }
    }
    Ok(out)
}

/// Decode the digits of a `\u` escape, pairing UTF-16 surrogates.
fn unicode_escape(chars: &mut std::str::Chars<'_>, line: usize) -> Result<char> {
    let malformed = |detail: &str| Error::PropertiesParse {
        line,
        message: format!("malformed \\u escape: {detail}"),
    };

    let high = hex_unit(chars).ok_or_else(|| malformed("expected four hex digits"))?;
    if !(0xD800..0xDC00).contains(&high) {
        return char::from_u32(u32::from(high)).ok_or_else(|| malformed("unpaired surrogate"));
    }

    let low = match (chars.next(), chars.next()) {
        (Some('\\'), Some('u')) => hex_unit(chars),
        _ => None,
    }
    .ok_or_else(|| malformed("unpaired surrogate"))?;
    char::decode_utf16([high, low])
        .next()
        .and_then(|decoded| decoded.ok())
        .ok_or_else(|| malformed("unpaired surrogate"))
}

fn hex_unit(chars: &mut std::str::Chars<'_>) -> Option<u16> {
    let digits: String = chars.by_ref().take(4).collect();
    if digits.len() != 4 || !digits.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }
    u16::from_str_radix(&digits, 16).ok()
}
