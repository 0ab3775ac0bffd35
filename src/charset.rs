//! Code alphabets and enumeration of candidate codes.

pub const HEX: &str = "0123456789abcdef";
pub const LOWER_ALNUM: &str = "0123456789abcdefghijklmnopqrstuvwxyz";
pub const ALNUM: &str = "0123456789abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ";
pub const ALNUM_UNDERSCORE: &str =
    "0123456789abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ_";
pub const ALNUM_DASH_UNDERSCORE: &str =
    "0123456789abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ-_";
pub const LOWER_ALNUM_DASH_UNDERSCORE_TILDE: &str = "0123456789abcdefghijklmnopqrstuvwxyz-_~";

/// Iterates over every code of a charset in order of length, then position.
///
/// Index 0 is the first one-character code, so with charset `"ab"` the
/// sequence is `a`, `b`, `aa`, `ab`, `ba`, `bb`, `aaa`, ...
#[derive(Clone, Debug)]
pub struct Codes {
    alphabet: Vec<char>,
    next: u128,
}

impl Codes {
    pub fn new(charset: &str, start: u128) -> Self {
        Self {
            alphabet: charset.chars().collect(),
            next: start,
        }
    }

    /// The code at a given index, or `None` for an empty charset.
    pub fn nth_code(&self, index: u128) -> Option<String> {
        let base = self.alphabet.len() as u128;

        if base == 0 {
            return None;
        }

        let mut remaining = index + 1;
        let mut reversed = Vec::new();

        while remaining > 0 {
            remaining -= 1;
            reversed.push(self.alphabet[(remaining % base) as usize]);
            remaining /= base;
        }

        Some(reversed.into_iter().rev().collect())
    }
}

impl Iterator for Codes {
    type Item = String;

    fn next(&mut self) -> Option<Self::Item> {
        let code = self.nth_code(self.next)?;
        self.next = self.next.checked_add(1)?;
        Some(code)
    }
}

#[cfg(test)]
mod tests {
    use super::{Codes, HEX};

    #[test]
    fn enumerate_codes() {
        let codes = Codes::new("ab", 0).take(7).collect::<Vec<_>>();

        assert_eq!(codes, vec!["a", "b", "aa", "ab", "ba", "bb", "aaa"]);
    }

    #[test]
    fn enumerate_from_offset() {
        let mut codes = Codes::new(HEX, 16);

        assert_eq!(codes.next().as_deref(), Some("00"));
        assert_eq!(Codes::new(HEX, 0).nth_code(15).as_deref(), Some("f"));
        assert_eq!(Codes::new(HEX, 0).nth_code(16 + 255).as_deref(), Some("ff"));
    }

    #[test]
    fn empty_charset() {
        assert_eq!(Codes::new("", 0).next(), None);
    }
}
