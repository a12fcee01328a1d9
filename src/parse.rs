use std::collections::HashMap;
use std::fmt;

use serde::Serialize;

/// A C-ish literal recovered from a `#define` value.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Literal {
    Int(i64),
    Float(f64),
    Str(String),
    Bool(bool),
}

impl Literal {
    /// Evaluates a token as a literal. Returns `None` for anything that is
    /// not a plain integer, float, string or boolean, so expression-valued
    /// defines are dropped by the caller instead of failing the parse.
    pub fn parse(token: &str) -> Option<Literal> {
        let token = token.trim();

        if token.is_empty() {
            return None;
        }

        match token {
            "true" => return Some(Literal::Bool(true)),
            "false" => return Some(Literal::Bool(false)),
            _ => {}
        }

        if token.starts_with('"') {
            return parse_string_literal(token).map(Literal::Str);
        }

        if let Some(value) = parse_int_literal(token) {
            return Some(Literal::Int(value));
        }

        if let Ok(value) = token.parse::<f64>() {
            return Some(Literal::Float(value));
        }

        None
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Literal::Str(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Literal::Int(v) => write!(f, "{v}"),
            Literal::Float(v) => write!(f, "{v}"),
            Literal::Str(v) => write!(f, "{v}"),
            Literal::Bool(v) => write!(f, "{v}"),
        }
    }
}

fn parse_int_literal(token: &str) -> Option<i64> {
    let (sign, digits) = match token.strip_prefix('-') {
        Some(rest) => (-1, rest),
        None => (1, token),
    };

    // C headers like to suffix integer constants
    let digits = digits
        .trim_end_matches(['u', 'U', 'l', 'L'])
        .replace('_', "");

    let value = if let Some(hex) = digits.strip_prefix("0x").or(digits.strip_prefix("0X")) {
        i64::from_str_radix(hex, 16).ok()?
    } else if let Some(bin) = digits.strip_prefix("0b").or(digits.strip_prefix("0B")) {
        i64::from_str_radix(bin, 2).ok()?
    } else if let Some(oct) = digits.strip_prefix("0o") {
        i64::from_str_radix(oct, 8).ok()?
    } else {
        digits.parse::<i64>().ok()?
    };

    Some(sign * value)
}

fn parse_string_literal(token: &str) -> Option<String> {
    let inner = token.strip_prefix('"')?.strip_suffix('"')?;

    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();

    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }

        match chars.next()? {
            'n' => out.push('\n'),
            't' => out.push('\t'),
            'r' => out.push('\r'),
            '0' => out.push('\0'),
            other => out.push(other),
        }
    }

    Some(out)
}

/// Parses a simple `key=value` file into a map.
///
/// Blank lines, `#` comments and lines without `=` produce no entries.
pub fn parse_simple_config(text: &str) -> HashMap<String, String> {
    let mut config = HashMap::new();

    for line in text.lines() {
        let line = line.trim();

        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let Some((key, value)) = line.split_once('=') else {
            continue;
        };

        config.insert(key.trim().to_string(), value.trim().to_string());
    }

    config
}

/// Parses the `#define`s of a C header.
///
/// Only defines whose value evaluates as a literal are kept; bare defines
/// and expression values are dropped.
pub fn parse_c_defines(text: &str) -> HashMap<String, Literal> {
    let mut config = HashMap::new();

    for line in text.lines() {
        let Some(rest) = line.strip_prefix("#define") else {
            continue;
        };

        if !rest.starts_with(char::is_whitespace) {
            continue;
        }

        let rest = rest.trim();

        // the value is the rest of the line, quoted strings may contain spaces
        let Some((key, value)) = rest.split_once(char::is_whitespace) else {
            continue;
        };

        if let Some(literal) = Literal::parse(value) {
            config.insert(key.to_string(), literal);
        }
    }

    config
}

/// Parses the vendor `.properties` format into key -> token list.
///
/// Within a value, a double backslash is an escaped space inside the current
/// token, while an unescaped space ends the token. Consecutive unescaped
/// spaces yield empty tokens. Lines without `=` are skipped.
pub fn parse_properties(text: &str) -> HashMap<String, Vec<String>> {
    let mut properties = HashMap::new();

    for line in text.lines() {
        let line = line.trim();

        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let Some((key, value)) = line.split_once('=') else {
            continue;
        };

        let mut tokens = Vec::new();
        let mut current = String::new();
        let mut chars = value.chars().peekable();

        while let Some(c) = chars.next() {
            if c == '\\' && chars.peek() == Some(&'\\') {
                chars.next();
                current.push(' ');
            } else if c == ' ' {
                tokens.push(std::mem::take(&mut current));
            } else {
                current.push(c);
            }
        }

        if !current.is_empty() {
            tokens.push(current);
        }

        properties.insert(key.trim().to_string(), tokens);
    }

    properties
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn simple_config_trims_keys_and_values() {
        let config = parse_simple_config(
            "# a comment\n\
             \n\
             BASE_SDK_PATH = /opt/gecko_sdk \n\
             CFLAGS=-Os -g\n\
             no equals here\n",
        );

        assert_eq!(config.len(), 2);
        assert_eq!(config["BASE_SDK_PATH"], "/opt/gecko_sdk");
        assert_eq!(config["CFLAGS"], "-Os -g");
    }

    #[test]
    fn c_defines_keep_only_literals() {
        let config = parse_c_defines(
            "#define FOO 42\n\
             #define BAR \"x\"\n\
             #define BAZ\n\
             #define GUARD_H_\n\
             #define EXPR (FOO + 1)\n",
        );

        assert_eq!(config.len(), 2);
        assert_eq!(config["FOO"], Literal::Int(42));
        assert_eq!(config["BAR"], Literal::Str("x".to_string()));
    }

    #[test]
    fn c_defines_value_may_contain_spaces() {
        let config = parse_c_defines(
            "#define PACKAGE_STRING \"OPENTHREAD/thread-reference-20230706; EFR32; rev 1\"\n",
        );

        assert_eq!(
            config["PACKAGE_STRING"].as_str().unwrap(),
            "OPENTHREAD/thread-reference-20230706; EFR32; rev 1"
        );
    }

    #[test]
    fn c_defines_parse_hex_and_suffixed_ints() {
        let config = parse_c_defines(
            "#define ADDR 0x0800C000\n\
             #define SIZE 512UL\n\
             #define NEG -3\n",
        );

        assert_eq!(config["ADDR"], Literal::Int(0x0800_C000));
        assert_eq!(config["SIZE"], Literal::Int(512));
        assert_eq!(config["NEG"], Literal::Int(-3));
    }

    #[test]
    fn define_must_be_followed_by_whitespace() {
        let config = parse_c_defines("#definesomething 1\n");
        assert!(config.is_empty());
    }

    #[test]
    fn properties_escaped_spaces_join_tokens() {
        let props = parse_properties("version=1\\\\2\\\\3 extra\n");

        assert_eq!(props["version"], vec!["1 2 3".to_string(), "extra".to_string()]);
    }

    #[test]
    fn properties_consecutive_spaces_yield_empty_tokens() {
        let props = parse_properties("key=a  b\n");

        assert_eq!(
            props["key"],
            vec!["a".to_string(), String::new(), "b".to_string()]
        );
    }

    #[test]
    fn properties_skip_comments_and_malformed_lines() {
        let props = parse_properties(
            "# comment\n\
             \n\
             malformed line\n\
             version=7.4.3.0\n",
        );

        assert_eq!(props.len(), 1);
        assert_eq!(props["version"], vec!["7.4.3.0".to_string()]);
    }

    #[test]
    fn literal_display_renders_bare_values() {
        assert_eq!(Literal::Int(4).to_string(), "4");
        assert_eq!(Literal::Str("-beta".to_string()).to_string(), "-beta");
    }
}
