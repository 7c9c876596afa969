//! Character-string functions.
//!
//! Positions and lengths count characters, not bytes, and positions are
//! 1-based.

use std::cmp::Ordering;

use regex::RegexBuilder;

use crate::types::CollationId;
use crate::value::{ValueError, ValueResult};

/// Allocate a string of `capacity` bytes, failing instead of aborting.
pub fn reserve(capacity: usize) -> ValueResult<String> {
    let mut out = String::new();
    out.try_reserve(capacity)
        .map_err(|_| ValueError::OutOfMemory)?;
    Ok(out)
}

pub fn concat(parts: &[&str]) -> ValueResult<String> {
    let total = parts
        .iter()
        .try_fold(0usize, |acc, p| acc.checked_add(p.len()))
        .ok_or(ValueError::OutOfMemory)?;
    let mut out = reserve(total)?;
    for part in parts {
        out.push_str(part);
    }
    Ok(out)
}

pub fn repeat(text: &str, count: i64) -> ValueResult<String> {
    let count = usize::try_from(count).unwrap_or(0);
    let total = text.len().checked_mul(count).ok_or(ValueError::OutOfMemory)?;
    let mut out = reserve(total)?;
    for _ in 0..count {
        out.push_str(text);
    }
    Ok(out)
}

pub fn space(count: i64) -> ValueResult<String> {
    repeat(" ", count)
}

/// LPAD and RPAD. A target length shorter than the text truncates it; an
/// empty pad that would be needed yields `None`.
pub fn pad(text: &str, length: i64, fill: &str, left: bool) -> ValueResult<Option<String>> {
    let Ok(length) = usize::try_from(length) else {
        return Ok(None);
    };
    let current = text.chars().count();
    if length <= current {
        return Ok(Some(text.chars().take(length).collect()));
    }
    if fill.is_empty() {
        return Ok(None);
    }

    let missing = length - current;
    let filler: String = fill.chars().cycle().take(missing).collect();
    let out = if left {
        concat(&[&filler, text])?
    } else {
        concat(&[text, &filler])?
    };
    Ok(Some(out))
}

/// SUBSTRING(text, position [, length]). Position 0 reads as 1; a negative
/// position counts from the end.
pub fn substring(text: &str, position: i64, length: Option<i64>) -> String {
    let count = text.chars().count() as i64;
    let start = match position {
        p if p > 0 => p - 1,
        0 => 0,
        p => count + p,
    };
    if start < 0 || start >= count {
        return String::new();
    }
    let take = match length {
        Some(len) if len <= 0 => return String::new(),
        Some(len) => len,
        None => count,
    };
    text.chars()
        .skip(start as usize)
        .take(usize::try_from(take).unwrap_or(usize::MAX))
        .collect()
}

pub fn left(text: &str, count: i64) -> String {
    text.chars().take(usize::try_from(count).unwrap_or(0)).collect()
}

pub fn right(text: &str, count: i64) -> String {
    let count = usize::try_from(count).unwrap_or(0);
    let total = text.chars().count();
    text.chars().skip(total.saturating_sub(count)).collect()
}

/// 1-based character position of `needle` at or after `from`, or 0.
pub fn position(haystack: &str, needle: &str, from: i64, collation: Option<CollationId>) -> i64 {
    if from < 1 {
        return 0;
    }
    let (haystack, needle) = fold_case(haystack, needle, collation);
    let start_byte = match haystack.char_indices().nth((from - 1) as usize) {
        Some((i, _)) => i,
        None if needle.is_empty() && (from - 1) as usize == haystack.chars().count() => {
            haystack.len()
        }
        None => return 0,
    };
    match haystack[start_byte..].find(needle.as_str()) {
        Some(offset) => haystack[..start_byte + offset].chars().count() as i64 + 1,
        None => 0,
    }
}

/// TRIM family: strip repeated occurrences of `what` (a space by default).
pub fn trim(text: &str, what: Option<&str>, leading: bool, trailing: bool) -> String {
    let what = what.unwrap_or(" ");
    if what.is_empty() {
        return text.to_string();
    }
    let mut out = text;
    if leading {
        while let Some(rest) = out.strip_prefix(what) {
            out = rest;
        }
    }
    if trailing {
        while let Some(rest) = out.strip_suffix(what) {
            out = rest;
        }
    }
    out.to_string()
}

pub fn replace(text: &str, from: &str, to: &str) -> String {
    if from.is_empty() {
        return text.to_string();
    }
    text.replace(from, to)
}

/// Map each character of `from` to the character at the same position in
/// `to`; characters without a counterpart are removed.
pub fn translate(text: &str, from: &str, to: &str) -> String {
    let from: Vec<char> = from.chars().collect();
    let to: Vec<char> = to.chars().collect();
    text.chars()
        .filter_map(|c| match from.iter().position(|f| *f == c) {
            Some(i) => to.get(i).copied(),
            None => Some(c),
        })
        .collect()
}

pub fn reverse(text: &str) -> String {
    text.chars().rev().collect()
}

/// Code of the first character, 0 for the empty string.
pub fn ascii(text: &str) -> i64 {
    text.chars().next().map(|c| c as i64).unwrap_or(0)
}

pub fn chr(code: i64) -> ValueResult<String> {
    u32::try_from(code)
        .ok()
        .and_then(char::from_u32)
        .map(String::from)
        .ok_or_else(|| ValueError::invalid(format!("CHR({code})")))
}

pub fn hex_bytes(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02X}")).collect()
}

pub fn hex_bits(bits: &[bool]) -> String {
    bits.chunks(4)
        .map(|nibble| {
            let value = nibble
                .iter()
                .fold(0u32, |acc, bit| (acc << 1) | u32::from(*bit))
                << (4 - nibble.len());
            char::from_digit(value, 16)
                .unwrap_or('0')
                .to_ascii_uppercase()
        })
        .collect()
}

/// Compare two strings under a collation; case-insensitive collations
/// compare lower-cased text.
pub fn compare(left: &str, right: &str, collation: Option<CollationId>) -> Ordering {
    let (left, right) = fold_case(left, right, collation);
    left.cmp(&right)
}

fn fold_case(left: &str, right: &str, collation: Option<CollationId>) -> (String, String) {
    if collation.is_some_and(|c| c.is_case_insensitive()) {
        (left.to_lowercase(), right.to_lowercase())
    } else {
        (left.to_string(), right.to_string())
    }
}

/// SQL LIKE with `%` and `_` wildcards and an optional escape character.
pub fn like(
    text: &str,
    pattern: &str,
    escape: Option<char>,
    collation: Option<CollationId>,
) -> bool {
    let (text, pattern) = fold_case(text, pattern, collation);
    let text: Vec<char> = text.chars().collect();

    #[derive(Clone, Copy, PartialEq)]
    enum Token {
        Char(char),
        One,
        Any,
    }

    let mut tokens = Vec::new();
    let mut chars = pattern.chars();
    while let Some(c) = chars.next() {
        let token = match c {
            c if Some(c) == escape => Token::Char(chars.next().unwrap_or(c)),
            '%' => Token::Any,
            '_' => Token::One,
            c => Token::Char(c),
        };
        tokens.push(token);
    }

    // Iterative wildcard matching with backtracking to the last `%`.
    let (mut t, mut p) = (0usize, 0usize);
    let mut star: Option<(usize, usize)> = None;
    while t < text.len() {
        match tokens.get(p) {
            Some(Token::Char(c)) if *c == text[t] => {
                t += 1;
                p += 1;
            }
            Some(Token::One) => {
                t += 1;
                p += 1;
            }
            Some(Token::Any) => {
                star = Some((p, t));
                p += 1;
            }
            _ => match star {
                Some((sp, st)) => {
                    p = sp + 1;
                    t = st + 1;
                    star = Some((sp, st + 1));
                }
                None => return false,
            },
        }
    }
    tokens[p..].iter().all(|token| *token == Token::Any)
}

/// Regular-expression match.
pub fn rlike(text: &str, pattern: &str, collation: Option<CollationId>) -> ValueResult<bool> {
    let regex = RegexBuilder::new(pattern)
        .case_insensitive(collation.is_some_and(|c| c.is_case_insensitive()))
        .build()
        .map_err(|e| ValueError::invalid(format!("pattern '{pattern}': {e}")))?;
    Ok(regex.is_match(text))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_substring() {
        assert_eq!(substring("abcdef", 2, Some(3)), "bcd");
        assert_eq!(substring("abcdef", 0, Some(2)), "ab");
        assert_eq!(substring("abcdef", -2, None), "ef");
        assert_eq!(substring("abcdef", 10, None), "");
        assert_eq!(substring("héllo", 2, Some(1)), "é");
    }

    #[test]
    fn test_pad() {
        assert_eq!(pad("7", 3, "0", true).unwrap(), Some("007".to_string()));
        assert_eq!(pad("ab", 5, "xy", false).unwrap(), Some("abxyx".to_string()));
        assert_eq!(pad("abcdef", 3, "x", true).unwrap(), Some("abc".to_string()));
        assert_eq!(pad("ab", 5, "", true).unwrap(), None);
        assert_eq!(pad("ab", -1, "x", true).unwrap(), None);
    }

    #[test]
    fn test_repeat_and_space() {
        assert_eq!(repeat("ab", 3).unwrap(), "ababab");
        assert_eq!(repeat("ab", -1).unwrap(), "");
        assert_eq!(space(2).unwrap(), "  ");
        assert_eq!(repeat("ab", i64::MAX), Err(ValueError::OutOfMemory));
    }

    #[test]
    fn test_position() {
        assert_eq!(position("hello world", "o", 1, None), 5);
        assert_eq!(position("hello world", "o", 6, None), 8);
        assert_eq!(position("hello", "z", 1, None), 0);
        assert_eq!(position("Hello", "h", 1, Some(CollationId::UTF8_EN_CI)), 1);
        assert_eq!(position("Hello", "h", 1, Some(CollationId::UTF8_BIN)), 0);
    }

    #[test]
    fn test_trim() {
        assert_eq!(trim("  a  ", None, true, true), "a");
        assert_eq!(trim("xxaxx", Some("x"), true, false), "axx");
        assert_eq!(trim("xxaxx", Some("x"), false, true), "xxa");
    }

    #[test]
    fn test_translate() {
        assert_eq!(translate("abcabc", "ab", "x"), "xcxc");
    }

    #[test]
    fn test_like() {
        assert!(like("hello", "h%o", None, None));
        assert!(like("hello", "h_llo", None, None));
        assert!(!like("hello", "h_lo", None, None));
        assert!(like("50%", "50!%", Some('!'), None));
        assert!(!like("500", "50!%", Some('!'), None));
        assert!(like("HELLO", "h%", None, Some(CollationId::UTF8_EN_CI)));
        assert!(like("", "%", None, None));
        assert!(like("abcd", "%b_d", None, None));
        assert!(!like("abcbd", "%b_d", None, None));
    }

    #[test]
    fn test_rlike() {
        assert_eq!(rlike("abc123", "[0-9]+$", None), Ok(true));
        assert!(rlike("abc", "(", None).is_err());
    }

    #[test]
    fn test_hex() {
        assert_eq!(hex_bytes(b"AB"), "4142");
        assert_eq!(hex_bits(&[true, false, true, false, true]), "A8");
    }

    #[test]
    fn test_compare() {
        assert_eq!(compare("a", "B", None), Ordering::Greater);
        assert_eq!(compare("a", "A", Some(CollationId::UTF8_EN_CI)), Ordering::Equal);
    }
}
