// Copyright 2026 the Quill Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use std::sync::atomic::AtomicUsize;
use std::sync::Arc;

use quill_dev::{RecordingDevice, SyntheticBackend, SyntheticStats};
use quill_draw::DrawBatcher;
use quill_fonts::{FaceCacheOptions, FontSource};

use crate::{Font, FontContext};

/// Point size test fonts are set to. The synthetic face then has a 12 pixel
/// line height, an 8 pixel ascender and a 10 pixel maximum advance.
pub(crate) const TEST_SIZE: f32 = 10.0;

pub(crate) struct TestEnv {
    pub(crate) stats: Arc<SyntheticStats>,
    pub(crate) context: FontContext,
    pub(crate) gpu: RecordingDevice,
    pub(crate) batcher: DrawBatcher,
    fonts_loaded: usize,
}

impl TestEnv {
    pub(crate) fn new() -> Self {
        Self::with_backend(SyntheticBackend::new())
    }

    pub(crate) fn with_backend(backend: SyntheticBackend) -> Self {
        Self::with_options(backend, FaceCacheOptions::default())
    }

    pub(crate) fn with_options(backend: SyntheticBackend, options: FaceCacheOptions) -> Self {
        let stats = backend.stats();
        let context = FontContext::with_options(Arc::new(backend), options);
        Self {
            stats,
            context,
            gpu: RecordingDevice::new(),
            batcher: DrawBatcher::default(),
            fonts_loaded: 0,
        }
    }

    /// A source no known face matches.
    pub(crate) fn next_source(&mut self) -> FontSource {
        self.fonts_loaded += 1;
        FontSource::from_memory(format!("synthetic-{}.ttf", self.fonts_loaded), Vec::<u8>::new())
    }

    /// Loads a font through the shared cache at [`TEST_SIZE`].
    pub(crate) fn font(&mut self) -> Font {
        let source = self.next_source();
        let mut font = self.context.load(source).unwrap();
        font.set_size(TEST_SIZE).unwrap();
        font
    }

    pub(crate) fn count(counter: &AtomicUsize) -> usize {
        SyntheticStats::get(counter)
    }
}
