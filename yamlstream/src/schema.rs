//! Resolution of scalars to null, boolean, integer and floating point values.
//!
//! The composer keeps every scalar as the text it was written with. A [`Schema`] tells what that
//! text stands for.

use yamlstream_parser::{ScalarStyle, Tag, CORE_SCHEMA_PREFIX};

/// A set of rules giving a type to the value of a scalar.
///
/// Only untagged plain scalars are resolved by the rules of the schema. Quoted and block scalars
/// are strings, as are scalars tagged with the non-specific `!` tag. Scalars tagged with a type
/// of the core schema (`!!int`, `!!bool`, ...) must have a value of that type.
#[derive(Clone, Copy, PartialEq, Debug, Eq, Default)]
pub enum Schema {
    /// Every scalar is a string ([10.1 Failsafe Schema](https://yaml.org/spec/1.2.2/#failsafe-schema)).
    Failsafe,
    /// Values as JSON writes them: `null`, `true`, `false` and numbers without a leading `+`
    /// ([10.2 JSON Schema](https://yaml.org/spec/1.2.2/#json-schema)).
    Json,
    /// The default of YAML 1.2 ([10.3 Core Schema](https://yaml.org/spec/1.2.2/#core-schema)).
    #[default]
    Core,
    /// The types of YAML 1.1, which adds `yes`/`no`/`on`/`off` booleans, binary and `0`-prefixed
    /// octal integers, and `_` digit separators.
    Yaml11,
}

/// The value of a scalar, as resolved by a [`Schema`].
#[derive(Clone, Copy, PartialEq, Debug)]
pub enum ResolvedScalar<'a> {
    /// A null value.
    Null,
    /// A boolean value.
    Boolean(bool),
    /// An integer value.
    Integer(i64),
    /// A floating point value.
    FloatingPoint(f64),
    /// Any other value.
    String(&'a str),
}

impl Schema {
    /// Resolve the value of a scalar.
    ///
    /// # Return
    /// Returns `None` if `tag` is a core schema type that `value` does not match, or a type that
    /// is not a scalar type of this schema.
    ///
    /// # Examples
    /// ```
    /// use yamlstream::{ResolvedScalar, ScalarStyle, Schema, Tag};
    ///
    /// let plain = ScalarStyle::Plain;
    /// assert_eq!(Schema::Core.resolve("0x1F", plain, None), Some(ResolvedScalar::Integer(31)));
    /// assert_eq!(Schema::Core.resolve("yes", plain, None), Some(ResolvedScalar::String("yes")));
    /// assert_eq!(Schema::Yaml11.resolve("yes", plain, None), Some(ResolvedScalar::Boolean(true)));
    /// assert_eq!(
    ///     Schema::Core.resolve("12", ScalarStyle::DoubleQuoted, None),
    ///     Some(ResolvedScalar::String("12"))
    /// );
    /// assert_eq!(Schema::Core.resolve("abc", plain, Some(&Tag::parse("!!int"))), None);
    /// ```
    #[must_use]
    pub fn resolve<'a>(
        self,
        value: &'a str,
        style: ScalarStyle,
        tag: Option<&Tag>,
    ) -> Option<ResolvedScalar<'a>> {
        match tag {
            Some(tag) if tag.is_yaml_core_schema() => self.resolve_as(&tag.suffix, value),
            Some(tag) if tag.handle.is_empty() && tag.suffix.starts_with(CORE_SCHEMA_PREFIX) => {
                self.resolve_as(&tag.suffix[CORE_SCHEMA_PREFIX.len()..], value)
            }
            Some(tag) if tag.is_non_specific() => Some(ResolvedScalar::String(value)),
            _ if style == ScalarStyle::Plain => Some(self.resolve_plain(value)),
            _ => Some(ResolvedScalar::String(value)),
        }
    }

    /// Resolve `value` as the core schema type named `suffix`.
    #[allow(clippy::cast_precision_loss)]
    fn resolve_as<'a>(self, suffix: &str, value: &'a str) -> Option<ResolvedScalar<'a>> {
        if self == Schema::Failsafe && suffix != "str" {
            return None;
        }
        match suffix {
            "str" => Some(ResolvedScalar::String(value)),
            "null" => self.is_null(value).then_some(ResolvedScalar::Null),
            "bool" => self.boolean(value).map(ResolvedScalar::Boolean),
            "int" => self.integer(value).map(ResolvedScalar::Integer),
            "float" => self
                .float(value)
                .or_else(|| self.integer(value).map(|i| i as f64))
                .map(ResolvedScalar::FloatingPoint),
            _ => None,
        }
    }

    /// Resolve an untagged plain scalar. What matches no other type is a string.
    fn resolve_plain(self, value: &str) -> ResolvedScalar<'_> {
        if self == Schema::Failsafe {
            ResolvedScalar::String(value)
        } else if self.is_null(value) {
            ResolvedScalar::Null
        } else if let Some(b) = self.boolean(value) {
            ResolvedScalar::Boolean(b)
        } else if let Some(i) = self.integer(value) {
            ResolvedScalar::Integer(i)
        } else if let Some(f) = self.float(value) {
            ResolvedScalar::FloatingPoint(f)
        } else {
            ResolvedScalar::String(value)
        }
    }

    fn is_null(self, value: &str) -> bool {
        match self {
            Schema::Failsafe => false,
            Schema::Json => value == "null",
            Schema::Core | Schema::Yaml11 => matches!(value, "" | "~" | "null" | "Null" | "NULL"),
        }
    }

    fn boolean(self, value: &str) -> Option<bool> {
        match (self, value) {
            (Schema::Failsafe, _) => None,
            (_, "true") | (Schema::Core | Schema::Yaml11, "True" | "TRUE") => Some(true),
            (_, "false") | (Schema::Core | Schema::Yaml11, "False" | "FALSE") => Some(false),
            (Schema::Yaml11, "y" | "Y" | "yes" | "Yes" | "YES" | "on" | "On" | "ON") => Some(true),
            (Schema::Yaml11, "n" | "N" | "no" | "No" | "NO" | "off" | "Off" | "OFF") => Some(false),
            _ => None,
        }
    }

    fn integer(self, value: &str) -> Option<i64> {
        match self {
            Schema::Failsafe => None,
            Schema::Json => is_json_integer(value)
                .then(|| value.parse().ok())
                .flatten(),
            Schema::Core => core_integer(value),
            Schema::Yaml11 => yaml11_integer(value),
        }
    }

    fn float(self, value: &str) -> Option<f64> {
        match self {
            Schema::Failsafe => None,
            Schema::Json => is_json_number(value)
                .then(|| value.parse().ok())
                .flatten(),
            Schema::Core => special_float(value)
                .or_else(|| is_core_float(value).then(|| value.parse().ok()).flatten()),
            Schema::Yaml11 => special_float(value).or_else(|| {
                let cleaned = value.replace('_', "");
                (cleaned.contains('.') && is_core_float(&cleaned))
                    .then(|| cleaned.parse().ok())
                    .flatten()
            }),
        }
    }
}

/// Split the leading sign of a number, returning whether it is negative.
fn split_sign(value: &str) -> (bool, &str) {
    if let Some(rest) = value.strip_prefix('-') {
        (true, rest)
    } else {
        (false, value.strip_prefix('+').unwrap_or(value))
    }
}

fn all_digits(text: &str, radix: u32) -> bool {
    !text.is_empty() && text.chars().all(|c| c.is_digit(radix))
}

/// `0o` octal, `0x` hexadecimal or signed decimal digits.
fn core_integer(value: &str) -> Option<i64> {
    if let Some(digits) = value.strip_prefix("0o") {
        all_digits(digits, 8)
            .then(|| i64::from_str_radix(digits, 8).ok())
            .flatten()
    } else if let Some(digits) = value.strip_prefix("0x") {
        all_digits(digits, 16)
            .then(|| i64::from_str_radix(digits, 16).ok())
            .flatten()
    } else {
        all_digits(split_sign(value).1, 10)
            .then(|| value.parse().ok())
            .flatten()
    }
}

/// Signed binary (`0b`), hexadecimal (`0x`), octal (leading `0`) or decimal digits, with `_`
/// separators.
fn yaml11_integer(value: &str) -> Option<i64> {
    let (negative, unsigned) = split_sign(value);
    if unsigned.starts_with('_') {
        return None;
    }
    let cleaned = unsigned.replace('_', "");
    let (radix, digits) = if let Some(digits) = cleaned.strip_prefix("0b") {
        (2, digits)
    } else if let Some(digits) = cleaned.strip_prefix("0x") {
        (16, digits)
    } else if cleaned.len() > 1 && cleaned.starts_with('0') {
        (8, &cleaned[1..])
    } else {
        (10, cleaned.as_str())
    };
    if !all_digits(digits, radix) {
        return None;
    }
    let magnitude = i64::from_str_radix(digits, radix).ok()?;
    Some(if negative { -magnitude } else { magnitude })
}

/// Infinities and not-a-number, as the core schema spells them.
fn special_float(value: &str) -> Option<f64> {
    match value {
        ".inf" | ".Inf" | ".INF" | "+.inf" | "+.Inf" | "+.INF" => Some(f64::INFINITY),
        "-.inf" | "-.Inf" | "-.INF" => Some(f64::NEG_INFINITY),
        ".nan" | ".NaN" | ".NAN" => Some(f64::NAN),
        _ => None,
    }
}

/// Split a number into its mantissa and its optional exponent, and check the exponent.
fn split_exponent(value: &str) -> Option<&str> {
    match value.find(['e', 'E']) {
        Some(i) => all_digits(split_sign(&value[i + 1..]).1, 10).then_some(&value[..i]),
        None => Some(value),
    }
}

/// `[-+]? ( \. [0-9]+ | [0-9]+ ( \. [0-9]* )? ) ( [eE] [-+]? [0-9]+ )?`
fn is_core_float(value: &str) -> bool {
    let Some(mantissa) = split_exponent(split_sign(value).1) else {
        return false;
    };
    match mantissa.split_once('.') {
        None => all_digits(mantissa, 10),
        Some((int, frac)) => {
            let digits = |text: &str| text.bytes().all(|b| b.is_ascii_digit());
            digits(int) && digits(frac) && !(int.is_empty() && frac.is_empty())
        }
    }
}

/// `-? ( 0 | [1-9] [0-9]* )`
fn is_json_integer(value: &str) -> bool {
    let digits = value.strip_prefix('-').unwrap_or(value);
    all_digits(digits, 10) && (digits == "0" || !digits.starts_with('0'))
}

/// `-? ( 0 | [1-9] [0-9]* ) ( \. [0-9]* )? ( [eE] [-+]? [0-9]+ )?`
fn is_json_number(value: &str) -> bool {
    let Some(mantissa) = split_exponent(value) else {
        return false;
    };
    match mantissa.split_once('.') {
        None => is_json_integer(mantissa),
        Some((int, frac)) => is_json_integer(int) && frac.bytes().all(|b| b.is_ascii_digit()),
    }
}
