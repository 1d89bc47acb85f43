//! Request parameters decoded from a frame body.
//!
//! A [`Parameter`] is a key-unique, key-ordered `KEY -> VALUE` map.
//! Values are stored verbatim, including any surrounding double quotes;
//! only domain setters strip them (see [`remove_quote`]).

use std::collections::btree_map;
use std::collections::BTreeMap;

/// Key-ordered request/response parameters.
///
/// Ordering matters: responses serialize in ascending key order no
/// matter how the pairs were inserted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Parameter {
    inner: BTreeMap<String, String>,
}

impl Parameter {
    pub fn new() -> Self {
        Parameter::default()
    }

    /// Insert a pair. An existing key is overwritten (last one wins).
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.inner.insert(key.into(), value.into());
    }

    /// Look up a value. Absent keys are `None`, never an error.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.inner.get(key).map(String::as_str)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.inner.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Pairs in ascending key order.
    pub fn iter(&self) -> btree_map::Iter<'_, String, String> {
        self.inner.iter()
    }
}

impl<K, V> FromIterator<(K, V)> for Parameter
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut parameter = Parameter::new();
        for (key, value) in iter {
            parameter.insert(key, value);
        }
        parameter
    }
}

impl<'a> IntoIterator for &'a Parameter {
    type Item = (&'a String, &'a String);
    type IntoIter = btree_map::Iter<'a, String, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.inner.iter()
    }
}

// -----------------------------------------------------------------------------
// Value helpers
// -----------------------------------------------------------------------------

/// Wrap a value in double quotes for human-readable response fields.
pub fn add_quote(value: &str) -> String {
    format!("\"{}\"", value)
}

/// Strip one leading and one trailing double quote, independently.
pub fn remove_quote(value: &str) -> String {
    let value = value.strip_prefix('"').unwrap_or(value);
    let value = value.strip_suffix('"').unwrap_or(value);
    value.to_string()
}

/// Read a numeric wire value as a byte.
///
/// Leading whitespace and one sign are skipped, then the leading digits
/// are read and anything after them is ignored (`"16x"` is 16). The
/// value wraps into a byte, so `"300"` is 44 and `"-1"` is 255. No
/// leading digit, or a value past `u64`, is `None`.
pub fn parse_byte(raw: &str) -> Option<u8> {
    let raw = raw.trim_start();
    let (negative, rest) = match raw.as_bytes().first() {
        Some(b'-') => (true, &raw[1..]),
        Some(b'+') => (false, &raw[1..]),
        _ => (false, raw),
    };

    let end = rest
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(rest.len());
    let value: u64 = rest[..end].parse().ok()?;

    let value = if negative { value.wrapping_neg() } else { value };
    Some(value as u8)
}

/// Split a `;`-separated favorites list.
///
/// A trailing empty piece is not an entry (`"a;"` is `["a"]`, `""` is
/// empty), but interior empty pieces are kept.
pub fn split_favorites(input: &str) -> Vec<String> {
    let mut parts: Vec<String> = input.split(';').map(str::to_string).collect();
    if parts.last().is_some_and(|last| last.is_empty()) {
        parts.pop();
    }
    parts
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn iterates_in_key_order_and_last_write_wins() {
        let parameter: Parameter = [("TID", "1"), ("LOBBY-ID", "2"), ("TID", "3")]
            .into_iter()
            .collect();

        let keys: Vec<&str> = parameter.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(keys, vec!["LOBBY-ID", "TID"]);
        assert_eq!(parameter.get("TID"), Some("3"));
        assert_eq!(parameter.get("NAME"), None);
    }

    #[test]
    fn remove_quote_strips_each_side_once() {
        assert_eq!(remove_quote("\"Alice\""), "Alice");
        assert_eq!(remove_quote("\"Alice"), "Alice");
        assert_eq!(remove_quote("Alice\""), "Alice");
        assert_eq!(remove_quote("\"\"x\"\""), "\"x\"");
        assert_eq!(remove_quote("\""), "");
        assert_eq!(remove_quote(""), "");
    }

    #[test]
    fn parse_byte_reads_leading_digits_and_wraps() {
        assert_eq!(parse_byte("16"), Some(16));
        assert_eq!(parse_byte("16x"), Some(16));
        assert_eq!(parse_byte("  7"), Some(7));
        assert_eq!(parse_byte("+9"), Some(9));
        assert_eq!(parse_byte("300"), Some(44));
        assert_eq!(parse_byte("-1"), Some(255));
        assert_eq!(parse_byte("-0"), Some(0));

        assert_eq!(parse_byte(""), None);
        assert_eq!(parse_byte("-"), None);
        assert_eq!(parse_byte("x16"), None);
        assert_eq!(parse_byte("\"8\""), None);
        assert_eq!(parse_byte("99999999999999999999"), None);
    }

    #[test]
    fn favorites_drop_only_trailing_empty_piece() {
        assert_eq!(split_favorites("Awesome;Foo"), vec!["Awesome", "Foo"]);
        assert_eq!(split_favorites("Awesome;"), vec!["Awesome"]);
        assert_eq!(split_favorites(""), Vec::<String>::new());
        assert_eq!(split_favorites("a;;b"), vec!["a", "", "b"]);
        assert_eq!(split_favorites(";x"), vec!["", "x"]);
    }
}
