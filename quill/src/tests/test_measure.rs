// Copyright 2026 the Quill Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use quill_dev::SyntheticBackend;

use crate::{FontFlags, Rect, TextInfo};

use super::utils::TestEnv;

#[test_log::test]
fn empty_text_has_an_empty_box() {
    let mut env = TestEnv::with_backend(SyntheticBackend::new().with_missing('z'));
    let mut font = env.font();
    assert_eq!(font.bounding_box(""), Rect::default());
    assert_eq!(font.bounding_box("zz"), Rect::default());
    assert_eq!(font.width_and_height(""), (0.0, 0.0));

    font.enable(FontFlags::WORD_WRAP);
    assert_eq!(font.bounding_box(""), Rect::default());
}

#[test_log::test]
fn box_spans_advances_and_glyph_heights() {
    let mut env = TestEnv::new();
    let mut font = env.font();
    let (bounds, info) = font.bounding_box_info("abc");
    assert_eq!(bounds, Rect::new(0, 30, 0, 8));
    assert_eq!(info, TextInfo { lines: 1, width: 30 });
    assert_eq!(font.width("abc"), 30.0);
    assert_eq!(font.height("abc"), 8.0);

    font.set_aspect(2.0, 0.5);
    assert_eq!(font.width_and_height("abc"), (30.0, 8.0));
    font.enable(FontFlags::ASPECT);
    assert_eq!(font.width_and_height("abc"), (60.0, 4.0));
}

#[test_log::test]
fn unmapped_characters_are_skipped() {
    let backend = SyntheticBackend::new()
        .with_missing('z')
        .with_missing('\u{1}');
    let mut env = TestEnv::with_backend(backend);
    let font = env.font();
    assert_eq!(font.width("azb"), 20.0);
    // Control characters fall back to the space glyph.
    assert_eq!(font.bounding_box("a\u{1}b"), Rect::new(0, 30, 0, 8));
}

#[test_log::test]
fn invalid_utf8_reads_as_latin1() {
    let mut env = TestEnv::new();
    let font = env.font();
    let mut offsets = Vec::new();
    font.glyph_bounds(b"a\xE9\xFFb", |offset, _| {
        offsets.push(offset);
        true
    });
    assert_eq!(offsets, [0, 1, 2, 3]);
}

#[test_log::test]
fn prefix_fitting_a_width() {
    let mut env = TestEnv::new();
    let font = env.font();
    assert_eq!(font.width_to_strlen("abcdef", 35.0), (3, 30.0));
    assert_eq!(font.width_to_strlen("abcdef", 1000.0), (6, 60.0));
    assert_eq!(font.width_to_strlen("abcdef", 5.0), (0, 0.0));
    // Multibyte characters are kept whole.
    assert_eq!(font.width_to_strlen("aéb", 25.0), (3, 20.0));
    assert_eq!(font.width_to_strlen("", 25.0), (0, 0.0));
}

#[test_log::test]
fn suffix_fitting_a_width() {
    let mut env = TestEnv::new();
    let font = env.font();
    let text = "abcdef";
    let (offset, width) = font.width_to_rstrlen(text, 35.0);
    assert_eq!((offset, width), (3, 30.0));
    assert_eq!(&text[offset..], "def");
    assert_eq!(font.width_to_rstrlen(text, 1000.0), (0, 60.0));
    assert_eq!(font.width_to_rstrlen("aéb", 25.0), (1, 20.0));
    assert_eq!(font.width_to_rstrlen("", 25.0), (0, 0.0));
}

#[test_log::test]
fn glyph_bounds_stop_early() {
    let mut env = TestEnv::new();
    let font = env.font();
    let mut seen = Vec::new();
    font.glyph_bounds("abcd", |offset, bounds| {
        seen.push((offset, bounds));
        offset < 2
    });
    assert_eq!(
        seen,
        [
            (0, Rect::new(1, 9, 0, 8)),
            (1, Rect::new(11, 19, 0, 8)),
            (2, Rect::new(21, 29, 0, 8)),
        ]
    );
}

#[test_log::test]
fn cursor_at_glyph_middle_lands_before_it() {
    let mut env = TestEnv::new();
    let font = env.font();
    for k in 0..4 {
        let middle = i32::try_from(k).unwrap() * 10 + 5;
        assert_eq!(font.str_offset_from_cursor("abcd", middle), k);
    }
    assert_eq!(font.str_offset_from_cursor("abcd", 6), 1);
    assert_eq!(font.str_offset_from_cursor("abcd", -20), 0);
    assert_eq!(font.str_offset_from_cursor("abcd", 100), 4);
    assert_eq!(font.str_offset_from_cursor("aéb", 25), 3);
    assert_eq!(font.str_offset_from_cursor("", 25), 0);
}

#[test_log::test]
fn cursor_skips_back_over_zero_width_characters() {
    let mut env = TestEnv::with_backend(SyntheticBackend::new().with_zero_width('\u{301}'));
    let font = env.font();
    // The combining accent sits at the pen after `e`, at 20.
    assert_eq!(font.str_offset_from_cursor("ae\u{301}b", 16), 1);
}

#[test_log::test]
fn glyph_bounds_at_offset() {
    let mut env = TestEnv::new();
    let font = env.font();
    assert_eq!(
        font.str_offset_to_glyph_bounds("aéb", 3),
        Some(Rect::new(21, 29, 0, 8))
    );
    assert_eq!(
        font.str_offset_to_glyph_bounds("aéb", 1),
        Some(Rect::new(11, 19, 0, 8))
    );
    // Not the start of a character.
    assert_eq!(font.str_offset_to_glyph_bounds("aéb", 2), None);
    assert_eq!(font.str_offset_to_glyph_bounds("aéb", 9), None);
}

#[test_log::test]
fn ascii_kerning_queries_the_face_once_per_pair() {
    let backend = SyntheticBackend::new().with_kerning('A', 'V', -100);
    let mut env = TestEnv::with_backend(backend);
    let mut font = env.font();
    font.set_size(50.0).unwrap();

    let before = TestEnv::count(&env.stats.kerning_queries);
    // A V A V, with AV pulled 5 pixels together.
    assert_eq!(font.bounding_box("AVAV"), Rect::new(0, 30, 0, 8));
    assert_eq!(TestEnv::count(&env.stats.kerning_queries) - before, 2);
    font.bounding_box("AVAV");
    font.bounding_box("VA");
    assert_eq!(TestEnv::count(&env.stats.kerning_queries) - before, 2);

    // Pairs outside the table ask every time.
    let before = TestEnv::count(&env.stats.kerning_queries);
    font.bounding_box("éV");
    font.bounding_box("éV");
    assert_eq!(TestEnv::count(&env.stats.kerning_queries) - before, 2);
}

#[test_log::test]
fn small_sizes_damp_kerning() {
    let backend = SyntheticBackend::new().with_kerning('A', 'V', -1000);
    let mut env = TestEnv::with_backend(backend);
    let font = env.font();
    // A full em is 10 pixels at 10 points, damped by 10/25.
    assert_eq!(font.width("AV"), 16.0);
}

#[test_log::test]
fn monospaced_fonts_step_whole_columns_without_kerning() {
    let backend = SyntheticBackend::new()
        .monospace()
        .with_kerning('A', 'V', -100);
    let mut env = TestEnv::with_backend(backend);
    let font = env.font();
    assert!(font.flags().contains(FontFlags::MONOSPACED), "fixed width faces are monospaced");
    assert_eq!(font.fixed_width(), 10.0);

    assert_eq!(font.width("AVAV"), 40.0);
    assert_eq!(TestEnv::count(&env.stats.kerning_queries), 0);
    // Wide characters take two columns.
    assert_eq!(font.width("a中b"), 40.0);
}

#[test_log::test]
fn subpixel_positioning_renders_variants() {
    let backend = SyntheticBackend::new().with_kerning('A', 'V', -30);
    let mut env = TestEnv::with_backend(backend);
    let mut font = env.font();
    font.bounding_box("AV");
    assert_eq!(font.acquire_glyph_cache().unwrap().cache().len(), 2);

    font.enable(FontFlags::RENDER_SUBPIXELAA);
    font.bounding_box("AV");
    let guard = font.acquire_glyph_cache().unwrap();
    // The kerned `V` lands between pixels and gets its own rendering.
    assert_eq!(guard.cache().len(), 3);
}

#[test_log::test]
fn font_metrics() {
    let mut env = TestEnv::new();
    let font = env.font();
    assert_eq!(font.height_max(), 12);
    assert_eq!(font.width_max(), 10);
    assert_eq!(font.ascender(), 8);
    assert_eq!(font.descender(), -2);
    assert_eq!(font.display_name().as_deref(), Some("Synthetic Regular"));

    let backend = SyntheticBackend::new().with_names(Some("Plain"), None);
    let mut env = TestEnv::with_backend(backend);
    assert_eq!(env.font().display_name().as_deref(), Some("Plain"));

    let backend = SyntheticBackend::new().with_names(None, Some("Bold"));
    let mut env = TestEnv::with_backend(backend);
    assert_eq!(env.font().display_name(), None);
}
