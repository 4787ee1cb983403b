//! Holds functions to determine if a character or a string belongs to a specific character set.

/// Check whether the character may be written as-is in a YAML document.
///
/// This is the `c-printable` production without the characters readers treat as line breaks or
/// byte order marks (`#x85`, `#x2028`, `#x2029`, `#xFEFF`), which we always escape.
/// ```no_compile
///     #x9 | #xA | #xD | [#x20-#x7E]          /* 8 bit */
///   | #x85 | [#xA0-#xD7FF] | [#xE000-#xFFFD] /* 16 bit */
///   | [#x10000-#x10FFFF]                     /* 32 bit */
/// ```
#[inline]
pub(crate) fn is_printable(c: char) -> bool {
    matches!(c,
        '\x20'..='\x7e'
        | '\u{a0}'..='\u{2027}'
        | '\u{202a}'..='\u{d7ff}'
        | '\u{e000}'..='\u{fefe}'
        | '\u{ff00}'..='\u{fffd}'
        | '\u{10000}'..='\u{10ffff}')
}

/// Check if the string can be expressed a valid literal block scalar.
///
/// Carriage returns would be normalized by a reader and are refused.
#[inline]
pub(crate) fn is_valid_literal_block_scalar(string: &str) -> bool {
    string
        .chars()
        .all(|character: char| matches!(character, '\t' | '\n') || is_printable(character))
}

/// Check whether the character may appear unescaped in a verbatim tag (`!<...>`).
#[inline]
pub(crate) fn is_uri_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || "-#;/?:@&=+$,_.!~*'()[]".contains(c)
}

/// Check whether the character may appear unescaped in a tag shorthand suffix.
#[inline]
pub(crate) fn is_tag_char(c: char) -> bool {
    is_uri_char(c) && !matches!(c, '!' | ',' | '[' | ']' | '{' | '}')
}

/// Check whether `string` can be written as a plain scalar without changing its value.
///
/// This only looks at the syntax. A string passing this check may still be read back as another
/// type (`null`, `12`, ...); see [`needs_quotes`] for the stricter check.
pub(crate) fn is_valid_plain_scalar(string: &str, in_flow: bool) -> bool {
    let mut chars = string.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    let second = chars.next();

    // Indicators may only start a plain scalar if they are followed by a "safe" character.
    let starts_ok = match first {
        '-' | '?' | ':' => {
            !in_flow && matches!(second, Some(c) if c != ' ' && c != '\t') && first != ':'
        }
        ',' | '[' | ']' | '{' | '}' | '#' | '&' | '*' | '!' | '|' | '>' | '\'' | '"' | '%' | '@'
        | '`' => false,
        _ => true,
    };

    starts_ok
        && !string.starts_with("---")
        && !string.starts_with("...")
        && !string.ends_with([' ', '\t', ':'])
        && !string.starts_with([' ', '\t'])
        && !string.contains(": ")
        && !string.contains(" #")
        && string.chars().all(|c| c != '\t' && is_printable(c))
        && !(in_flow && string.contains([',', '[', ']', '{', '}', ':']))
}

/// Check if the string requires quoting.
///
/// Strings starting with any of the following characters must be quoted.
/// :, &, *, ?, |, -, <, >, =, !, %, @
/// Strings containing any of the following characters must be quoted.
/// {, }, \[, t \], ,, #, `
///
/// If the string contains any of the following control characters, it must be escaped with double
/// quotes:
/// \0, \x01, \x02, \x03, \x04, \x05, \x06, \a, \b, \t, \n, \v, \f, \r, \x0e, \x0f, \x10, \x11,
/// \x12, \x13, \x14, \x15, \x16, \x17, \x18, \x19, \x1a, \e, \x1c, \x1d, \x1e, \x1f, \N, \_, \L,
/// \P
///
/// Finally, there are other cases when the strings must be quoted, no matter if you're using
/// single or double quotes:
/// * When the string is true or false (otherwise, it would be treated as a boolean value);
/// * When the string is null or ~ (otherwise, it would be considered as a null value);
/// * When the string looks like a number, such as integers (e.g. 2, 14, etc.), floats (e.g. 2.6,
///   14.9) and exponential numbers (e.g. 12e7, etc.) (otherwise, it would be treated as a numeric
///   value);
/// * When the string looks like a date (e.g. 2014-12-31) (otherwise it would be automatically
///   converted into a Unix timestamp).
#[allow(clippy::doc_markdown)]
pub(crate) fn needs_quotes(string: &str, in_flow: bool) -> bool {
    !is_valid_plain_scalar(string, in_flow)
        || string.starts_with(|character: char| {
            matches!(
                character,
                '&' | '*' | '?' | '|' | '-' | '<' | '>' | '=' | '!' | '%' | '@'
            )
        })
        || string.contains(|character: char| {
            matches!(
                character,
                ':' | '{' | '}' | '[' | ']' | ',' | '#' | '`' | '\"' | '\'' | '\\'
            )
        })
        || [
            // http://yaml.org/type/bool.html
            // Note: 'y', 'Y', 'n', 'N', is not quoted deliberately, as in libyaml. PyYAML also
            // parse them as string, not booleans, although it is violating the YAML 1.1
            // specification.
            "yes", "Yes", "YES", "no", "No", "NO", "True", "TRUE", "true", "False", "FALSE",
            "false", "on", "On", "ON", "off", "Off", "OFF",
            // http://yaml.org/type/null.html
            "null", "Null", "NULL", "~",
        ]
        .contains(&string)
        || string.starts_with('.')
        || string.starts_with("0x")
        || string.starts_with("0o")
        || string.parse::<i64>().is_ok()
        || string.parse::<f64>().is_ok()
}
