use std::fmt;
use std::str::FromStr;

use crate::foundation::core::FrameIndex;
use crate::foundation::error::{CaptureError, CaptureResult};

/// Closed set of output formats a capture session can write.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FormatId {
    /// PNG through the generic raster encoder.
    Png,
    /// JPEG through the generic raster encoder (alpha is flattened).
    Jpeg,
    /// WebP through the generic raster encoder.
    Webp,
    /// Lossless WebP through the lazily loaded binary codec.
    WebpLossless,
}

impl FormatId {
    /// Every registered format, in registry order.
    pub fn all() -> [FormatId; 4] {
        [
            FormatId::Png,
            FormatId::Jpeg,
            FormatId::Webp,
            FormatId::WebpLossless,
        ]
    }

    /// Stable identifier used in options files and on the command line.
    pub fn as_str(self) -> &'static str {
        match self {
            FormatId::Png => "png",
            FormatId::Jpeg => "jpeg",
            FormatId::Webp => "webp",
            FormatId::WebpLossless => "webp-lossless",
        }
    }

    /// Registry entry for this format.
    pub fn descriptor(self) -> &'static FormatDescriptor {
        descriptor(self)
    }
}

impl fmt::Display for FormatId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FormatId {
    type Err = CaptureError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        lookup(s).map(|d| d.id)
    }
}

/// How frames of a given format are turned into bytes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EncodePath {
    /// Generic raster encoder producing the given MIME type.
    Raster {
        /// Target MIME type.
        mime: &'static str,
    },
    /// The lossless binary codec module (see [`crate::BinaryCodec`]).
    BinaryCodec,
}

/// Immutable, process-wide description of one output format.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FormatDescriptor {
    /// Format this entry describes.
    pub id: FormatId,
    /// Human-readable label.
    pub label: &'static str,
    /// Encoder used for this format.
    pub path: EncodePath,
    /// File extension, without the leading dot.
    pub extension: &'static str,
}

static REGISTRY: [FormatDescriptor; 4] = [
    FormatDescriptor {
        id: FormatId::Png,
        label: "PNG",
        path: EncodePath::Raster { mime: "image/png" },
        extension: "png",
    },
    FormatDescriptor {
        id: FormatId::Jpeg,
        label: "JPEG",
        path: EncodePath::Raster { mime: "image/jpeg" },
        extension: "jpeg",
    },
    FormatDescriptor {
        id: FormatId::Webp,
        label: "WebP",
        path: EncodePath::Raster { mime: "image/webp" },
        extension: "webp",
    },
    FormatDescriptor {
        id: FormatId::WebpLossless,
        label: "WebP (lossless)",
        path: EncodePath::BinaryCodec,
        extension: "webp",
    },
];

/// All registry entries.
pub fn formats() -> &'static [FormatDescriptor] {
    &REGISTRY
}

/// Look up the descriptor of a known format.
pub fn descriptor(id: FormatId) -> &'static FormatDescriptor {
    match id {
        FormatId::Png => &REGISTRY[0],
        FormatId::Jpeg => &REGISTRY[1],
        FormatId::Webp => &REGISTRY[2],
        FormatId::WebpLossless => &REGISTRY[3],
    }
}

/// Resolve a format identifier such as `"png"` or `"webp-lossless"`.
///
/// Matching is exact; anything outside the registry fails with
/// [`CaptureError::UnsupportedFormat`].
pub fn lookup(name: &str) -> CaptureResult<&'static FormatDescriptor> {
    REGISTRY
        .iter()
        .find(|d| d.id.as_str() == name)
        .ok_or_else(|| CaptureError::unsupported_format(name))
}

/// File name for a captured frame: `frame-{index:05}.{ext}`.
///
/// Indices are zero-padded to five digits, so a directory listing sorts frames correctly up to
/// `frame-99999`. Past that the names grow to six digits and lexical order no longer matches
/// numeric order.
pub fn frame_file_name(index: FrameIndex, desc: &FormatDescriptor) -> String {
    format!("frame-{:05}.{}", index.0, desc.extension)
}

#[cfg(test)]
#[path = "../../tests/unit/format/registry.rs"]
mod tests;
