// Copyright 2026 the Quill Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use quill_dev::SyntheticBackend;
use quill_fonts::F26Dot6;

use crate::{Font, FontFlags, Rect, TextInfo};

use super::utils::TestEnv;

fn wrapped_font(env: &mut TestEnv, width: Option<i32>) -> Font {
    let mut font = env.font();
    font.enable(FontFlags::WORD_WRAP);
    font.set_wrap_width(width);
    font
}

fn wrap_text<'t>(font: &Font, text: &'t str) -> (Vec<&'t str>, TextInfo) {
    let mut wrap = font.wrap_lines(text);
    let lines = wrap
        .by_ref()
        .map(|line| core::str::from_utf8(line.bytes()).unwrap())
        .collect();
    (lines, wrap.info())
}

#[test_log::test]
fn newline_ends_a_line() {
    let mut env = TestEnv::new();
    let font = wrapped_font(&mut env, None);
    let (lines, info) = wrap_text(&font, "The quick brown fox\njumps");
    assert_eq!(lines, ["The quick brown fox", "jumps"]);
    assert_eq!(info, TextInfo { lines: 2, width: 50 });
}

#[test_log::test]
fn breaks_after_the_space_before_an_overflowing_word() {
    let mut env = TestEnv::new();
    let font = wrapped_font(&mut env, Some(45));
    let mut wrap = font.wrap_lines("aaaa aaaa");
    let first = wrap.next().unwrap();
    let second = wrap.next().unwrap();
    assert!(wrap.next().is_none(), "two lines expected");
    assert_eq!(first.range, 0..4);
    assert_eq!(second.range, 5..9);
    assert_eq!((first.index, second.index), (0, 1));
    assert_eq!(first.pen_y, F26Dot6::ZERO);
    assert_eq!(second.pen_y, F26Dot6::from_int(-12));
    assert_eq!(wrap.info(), TextInfo { lines: 2, width: 40 });
}

#[test_log::test]
fn overlong_words_are_not_split() {
    let mut env = TestEnv::new();
    let font = wrapped_font(&mut env, Some(30));
    let (lines, info) = wrap_text(&font, "aaaaaaaa");
    assert_eq!(lines, ["aaaaaaaa"]);
    assert_eq!(info.lines, 1);

    let (lines, _) = wrap_text(&font, "aaaaaaaa bb cc");
    assert_eq!(lines, ["aaaaaaaa", "bb", "cc"]);
}

#[test_log::test]
fn trailing_newline_adds_no_empty_line() {
    let mut env = TestEnv::new();
    let font = wrapped_font(&mut env, None);
    let (lines, info) = wrap_text(&font, "ab\ncd\n");
    assert_eq!(lines, ["ab", "cd"]);
    assert_eq!(info.lines, 2);

    let (lines, _) = wrap_text(&font, "ab\n\ncd");
    assert_eq!(lines, ["ab", "", "cd"]);
}

#[test_log::test]
fn unresolved_final_character_still_ends_the_text() {
    let mut env = TestEnv::with_backend(SyntheticBackend::new().with_missing('z'));
    let font = wrapped_font(&mut env, None);
    let (lines, info) = wrap_text(&font, "ab\ncdz");
    assert_eq!(lines, ["ab", "cdz"]);
    assert_eq!(info.lines, 2);
}

#[test_log::test]
fn empty_text_has_no_lines() {
    let mut env = TestEnv::new();
    let font = wrapped_font(&mut env, Some(10));
    let (lines, info) = wrap_text(&font, "");
    assert!(lines.is_empty(), "no lines expected");
    assert_eq!(info, TextInfo::default());
}

#[test_log::test]
fn text_ends_at_nul() {
    let mut env = TestEnv::new();
    let font = wrapped_font(&mut env, None);
    let (lines, _) = wrap_text(&font, "ab\ncd\0ef\ngh");
    assert_eq!(lines, ["ab", "cd"]);
}

#[test_log::test]
fn wrapped_bounding_box_covers_every_line() {
    let mut env = TestEnv::new();
    let font = wrapped_font(&mut env, Some(45));
    let (bounds, info) = font.bounding_box_info("aaaa aaaa");
    assert_eq!(bounds, Rect::new(0, 40, -12, 8));
    assert_eq!(info.lines, 2);
    assert_eq!(font.width_and_height("aaaa aaaa"), (40.0, 20.0));
}
