// Copyright 2026 the Quill Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Font identities and the data they are loaded from.

use alloc::string::String;
use alloc::sync::Arc;
use core::fmt;
use core::sync::atomic::{AtomicU64, Ordering};
use std::path::{Path, PathBuf};

/// Unique identity of a logical font for the lifetime of the process.
///
/// The face cache keys faces, sizes and char-map entries by this id.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
#[repr(transparent)]
pub struct FontId(u64);

impl FontId {
    /// Creates a new unique identifier.
    #[expect(clippy::new_without_default, reason = "every call yields a fresh id")]
    pub fn new() -> Self {
        static ID_COUNTER: AtomicU64 = AtomicU64::new(1);
        Self(ID_COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    /// Returns the underlying integer value.
    pub fn to_u64(self) -> u64 {
        self.0
    }
}

/// Where a font's data comes from.
///
/// A font is loaded from exactly one of a file path or a shared in-memory blob.
#[derive(Clone)]
pub enum FontSource {
    /// A font file on disk, read on every (re)open.
    Path(PathBuf),
    /// Font data owned in memory.
    Memory {
        /// Name used for diagnostics and display.
        name: Arc<str>,
        /// The font file bytes.
        data: Arc<[u8]>,
    },
}

impl FontSource {
    /// Creates a source for the file at `path`.
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        Self::Path(path.into())
    }

    /// Creates a source for an in-memory font file.
    pub fn from_memory(name: impl Into<Arc<str>>, data: impl Into<Arc<[u8]>>) -> Self {
        Self::Memory {
            name: name.into(),
            data: data.into(),
        }
    }

    /// The file path, for path backed sources.
    pub fn path(&self) -> Option<&Path> {
        match self {
            Self::Path(path) => Some(path),
            Self::Memory { .. } => None,
        }
    }

    /// A name for logs and errors: the path or the blob's given name.
    pub fn name(&self) -> String {
        match self {
            Self::Path(path) => path.display().to_string(),
            Self::Memory { name, .. } => String::from(&**name),
        }
    }

    /// The final path component, or the blob's given name.
    pub fn file_name(&self) -> Option<&str> {
        match self {
            Self::Path(path) => path.file_name().and_then(|name| name.to_str()),
            Self::Memory { name, .. } => Some(name),
        }
    }
}

impl fmt::Debug for FontSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Path(path) => f.debug_tuple("Path").field(path).finish(),
            Self::Memory { name, data } => f
                .debug_struct("Memory")
                .field("name", name)
                .field("len", &data.len())
                .finish(),
        }
    }
}

/// Locates the auxiliary metrics file that accompanies a Type 1 font.
///
/// `font.pfb` is paired with `font.afm`, falling back to `font.pfm`. Other
/// formats carry their metrics inline and have no sidecar.
pub fn metrics_sidecar(path: &Path) -> Option<PathBuf> {
    let ext = path.extension()?.to_str()?;
    if !ext.eq_ignore_ascii_case("pfb") {
        return None;
    }
    ["afm", "pfm"]
        .into_iter()
        .map(|ext| path.with_extension(ext))
        .find(|candidate| candidate.is_file())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_unique() {
        let a = FontId::new();
        let b = FontId::new();
        assert_ne!(a, b);
        assert!(b.to_u64() > a.to_u64());
    }

    #[test]
    fn sidecar_only_for_type1() {
        assert_eq!(metrics_sidecar(Path::new("/fonts/DejaVuSans.ttf")), None);
        assert_eq!(metrics_sidecar(Path::new("/nonexistent/font.pfb")), None);
    }

    #[test]
    fn sidecar_prefers_afm() {
        let dir = std::env::temp_dir().join(format!("quill-sidecar-{}", FontId::new().to_u64()));
        std::fs::create_dir_all(&dir).unwrap();
        let font = dir.join("font.PFB");
        std::fs::write(dir.join("font.pfm"), b"pfm").unwrap();
        assert_eq!(metrics_sidecar(&font), Some(dir.join("font.pfm")));
        std::fs::write(dir.join("font.afm"), b"afm").unwrap();
        assert_eq!(metrics_sidecar(&font), Some(dir.join("font.afm")));
        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn names() {
        let src = FontSource::from_memory("builtin", vec![0_u8; 4]);
        assert_eq!(src.name(), "builtin");
        assert_eq!(src.file_name(), Some("builtin"));
        assert!(src.path().is_none());
        let src = FontSource::from_path("/usr/share/fonts/Noto.ttf");
        assert_eq!(src.file_name(), Some("Noto.ttf"));
    }
}
