// Copyright 2026 the Quill Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use alloc::boxed::Box;
use alloc::string::String;

/// Error produced while opening, configuring or scaling a font face.
///
/// Carries a non-exhaustive [`ErrorKind`] plus a human readable name of the
/// font and, when the backend supplied one, a detail message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Error {
    /// The non-exhaustive category describing this error.
    kind: ErrorKind,

    /// Name of the font the failure relates to, usually its path.
    font: Option<Box<str>>,

    /// Backend specific detail.
    detail: Option<Box<str>>,
}

impl Error {
    /// Creates an error of the given kind without further context.
    pub fn new(kind: ErrorKind) -> Self {
        Self {
            kind,
            font: None,
            detail: None,
        }
    }

    /// Attaches the name of the font the error relates to.
    #[must_use]
    pub fn with_font(mut self, font: impl Into<String>) -> Self {
        self.font = Some(font.into().into_boxed_str());
        self
    }

    /// Attaches a detail message, typically from the backend library.
    #[must_use]
    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into().into_boxed_str());
        self
    }

    /// The machine-readable category for this error.
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// The font this error relates to, if known.
    pub fn font(&self) -> Option<&str> {
        self.font.as_deref()
    }

    /// Backend supplied detail, if any.
    pub fn detail(&self) -> Option<&str> {
        self.detail.as_deref()
    }

    /// Whether this failure should permanently mark the font as unusable.
    pub fn is_permanent(&self) -> bool {
        matches!(
            self.kind,
            ErrorKind::CannotOpen
                | ErrorKind::NotScalable
                | ErrorKind::NoUsableCharMap
                | ErrorKind::BadFont
        )
    }
}

impl core::fmt::Display for Error {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let what = match self.kind {
            ErrorKind::CannotOpen => "cannot open font",
            ErrorKind::NotScalable => "font has no scalable outlines",
            ErrorKind::NoUsableCharMap => "font has no usable character map",
            ErrorKind::AttachMetrics => "cannot attach auxiliary metrics",
            ErrorKind::CacheCapacity => "face cache could not provide a size",
            ErrorKind::BadFont => "font previously failed to load",
            ErrorKind::Unsupported => "operation not supported by the font backend",
        };
        f.write_str(what)?;
        if let Some(font) = &self.font {
            write!(f, " '{font}'")?;
        }
        if let Some(detail) = &self.detail {
            write!(f, ": {detail}")?;
        }
        Ok(())
    }
}

impl core::error::Error for Error {}

/// The non-exhaustive category of an error.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[non_exhaustive]
pub enum ErrorKind {
    /// The path or memory blob does not yield a valid face.
    CannotOpen,

    /// The face opened but only carries bitmap strikes.
    NotScalable,

    /// No Unicode, Apple Roman or other character map could be selected.
    NoUsableCharMap,

    /// The auxiliary metrics file could not be attached. Never fatal.
    AttachMetrics,

    /// The face cache failed to produce a size for a resolved face.
    CacheCapacity,

    /// The font was flagged bad by an earlier failure and is not retried.
    BadFont,

    /// The backend does not implement the requested operation.
    Unsupported,
}
