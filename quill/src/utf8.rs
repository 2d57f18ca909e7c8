// Copyright 2026 the Quill Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Permissive UTF-8 stepping.
//!
//! Strings handed to the engine are mostly UTF-8, but file paths and other
//! legacy data may be Latin-1. Rather than rejecting such input, an invalid
//! sequence decodes its first byte as the codepoint of the same value and
//! steps over that byte alone.

use unicode_width::UnicodeWidthChar;

/// The text up to, not including, the first NUL byte.
pub(crate) fn until_nul(text: &[u8]) -> &[u8] {
    let end = text.iter().position(|&b| b == 0).unwrap_or(text.len());
    &text[..end]
}

/// Length of the sequence a lead byte announces, zero for non-lead bytes.
fn sequence_len(lead: u8) -> usize {
    match lead {
        0x00..=0x7F => 1,
        0xC2..=0xDF => 2,
        0xE0..=0xEF => 3,
        0xF0..=0xF4 => 4,
        _ => 0,
    }
}

/// Decodes the character starting at `*i` and advances `*i` past it.
///
/// Never fails: invalid, overlong and truncated sequences yield the lead byte
/// as a Latin-1 character and advance by one byte.
///
/// # Panics
///
/// Panics if `*i` is not less than `text.len()`.
pub fn decode_step(text: &[u8], i: &mut usize) -> char {
    let lead = text[*i];
    let len = sequence_len(lead);
    let decoded = text
        .get(*i..*i + len.max(1))
        .filter(|_| len > 0)
        .and_then(|bytes| core::str::from_utf8(bytes).ok())
        .and_then(|s| s.chars().next());
    match decoded {
        Some(c) => {
            *i += len;
            c
        }
        None => {
            *i += 1;
            char::from(lead)
        }
    }
}

/// Start of the character before byte offset `i`, or `None` at the start.
///
/// Steps back over at most three continuation bytes, so that malformed
/// input still moves one byte at a time like [`decode_step`].
pub fn prev_boundary(text: &[u8], i: usize) -> Option<usize> {
    let i = i.min(text.len());
    if i == 0 {
        return None;
    }
    let floor = i.saturating_sub(4);
    let mut p = i - 1;
    while p > floor && is_continuation(text[p]) {
        p -= 1;
    }
    if is_continuation(text[p]) {
        // Not a valid sequence; treat the byte as a character of its own.
        return Some(i - 1);
    }
    let mut end = p;
    decode_step(text, &mut end);
    // The lead byte found may belong to a shorter sequence than the bytes
    // stepped over.
    if end == i { Some(p) } else { Some(i - 1) }
}

fn is_continuation(b: u8) -> bool {
    b & 0xC0 == 0x80
}

/// Number of terminal columns `c` occupies.
///
/// Characters without a defined width, such as control characters, take one
/// column.
pub fn display_width(c: char) -> usize {
    c.width().unwrap_or(1)
}

/// Whether `c` occupies no columns, such as a combining mark.
pub(crate) fn is_zero_width(c: char) -> bool {
    c != '\0' && c.width() == Some(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode_all(text: &[u8]) -> (Vec<char>, Vec<usize>) {
        let mut i = 0;
        let mut chars = Vec::new();
        let mut starts = Vec::new();
        while i < text.len() {
            starts.push(i);
            chars.push(decode_step(text, &mut i));
        }
        (chars, starts)
    }

    #[test]
    fn valid_utf8_decodes_normally() {
        let (chars, starts) = decode_all("aé€😀".as_bytes());
        assert_eq!(chars, ['a', 'é', '€', '😀']);
        assert_eq!(starts, [0, 1, 3, 6]);
    }

    #[test]
    fn every_byte_is_consumed_exactly_once() {
        let inputs: [&[u8]; 5] = [
            b"caf\xe9 latin1",
            b"\xff\xfe\x80",
            b"trunc\xe2\x82",
            b"\xc0\xaf overlong",
            b"\xed\xa0\x80 surrogate",
        ];
        for text in inputs {
            let (chars, starts) = decode_all(text);
            let mut i = 0;
            let mut consumed = 0;
            for start in starts {
                assert_eq!(start, i, "steps are contiguous in {text:?}");
                decode_step(text, &mut i);
                consumed += i - start;
            }
            assert_eq!(consumed, text.len(), "all bytes consumed in {text:?}");
            assert!(!chars.is_empty(), "decoded something from {text:?}");
        }
    }

    #[test]
    fn invalid_bytes_decode_as_latin1() {
        let (chars, _) = decode_all(b"caf\xe9");
        assert_eq!(chars, ['c', 'a', 'f', 'é']);
        let (chars, starts) = decode_all(b"\xe2\x82x");
        assert_eq!(chars, ['\u{e2}', '\u{82}', 'x']);
        assert_eq!(starts, [0, 1, 2]);
    }

    #[test]
    fn previous_boundaries_mirror_forward_steps() {
        let inputs: [&[u8]; 3] = ["aé€😀".as_bytes(), b"x\xe2\x82y", b"\x80\x80\x80\x80\x80"];
        for text in inputs {
            let (_, starts) = decode_all(text);
            let mut back = Vec::new();
            let mut i = text.len();
            while let Some(p) = prev_boundary(text, i) {
                back.push(p);
                i = p;
            }
            back.reverse();
            assert_eq!(back, starts, "backward steps match forward steps in {text:?}");
        }
    }

    #[test]
    fn widths() {
        assert_eq!(display_width('a'), 1);
        assert_eq!(display_width('漢'), 2);
        assert_eq!(display_width('\u{1b}'), 1);
        assert!(is_zero_width('\u{301}'));
        assert!(!is_zero_width('a'));
    }

    #[test]
    fn nul_terminates() {
        assert_eq!(until_nul(b"ab\0cd"), b"ab");
        assert_eq!(until_nul(b"abc"), b"abc");
    }
}
