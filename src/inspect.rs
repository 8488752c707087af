//! Read-only views over a package for listing and export.
//!
//! Payloads are usually embedded images.  [`ResourceKind::sniff`] recognises
//! the common formats by their leading magic bytes only; nothing is decoded.

use byteorder::{ByteOrder, LittleEndian};
use serde::{Deserialize, Serialize};

use crate::block::ResourceBlock;
use crate::package::ResourcePackage;

const PNG_MAGIC:  &[u8] = b"\x89PNG\r\n\x1a\n";
const JPEG_MAGIC: &[u8] = &[0xFF, 0xD8, 0xFF];
const GIF87_MAGIC: &[u8] = b"GIF87a";
const GIF89_MAGIC: &[u8] = b"GIF89a";
const BMP_MAGIC:  &[u8] = b"BM";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceKind {
    Png,
    Jpeg,
    Gif,
    Bmp,
    Unknown,
}

impl ResourceKind {
    pub fn sniff(payload: &[u8]) -> Self {
        match payload {
            p if p.starts_with(PNG_MAGIC)   => ResourceKind::Png,
            p if p.starts_with(JPEG_MAGIC)  => ResourceKind::Jpeg,
            p if p.starts_with(GIF87_MAGIC) || p.starts_with(GIF89_MAGIC) => ResourceKind::Gif,
            p if is_bmp(p)                  => ResourceKind::Bmp,
            _                               => ResourceKind::Unknown,
        }
    }

    /// File extension used when exporting a payload of this kind.
    pub fn extension(self) -> &'static str {
        match self {
            ResourceKind::Png     => "png",
            ResourceKind::Jpeg    => "jpg",
            ResourceKind::Gif     => "gif",
            ResourceKind::Bmp     => "bmp",
            ResourceKind::Unknown => "bin",
        }
    }

    /// Human-readable name (for diagnostics only).
    pub fn name(self) -> &'static str {
        match self {
            ResourceKind::Png     => "PNG",
            ResourceKind::Jpeg    => "JPEG",
            ResourceKind::Gif     => "GIF",
            ResourceKind::Bmp     => "BMP",
            ResourceKind::Unknown => "unknown",
        }
    }
}

/// "BM" alone is too common in opaque data; the file-size field that
/// follows must also match the payload length.
fn is_bmp(payload: &[u8]) -> bool {
    payload.len() >= 6
        && payload.starts_with(BMP_MAGIC)
        && LittleEndian::read_u32(&payload[2..6]) as usize == payload.len()
}

/// One listing row.  `index` is the 0-based position in the package.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceSummary {
    pub index:  usize,
    pub id:     u16,
    pub size:   usize,
    pub kind:   ResourceKind,
    /// BLAKE3 of the payload, hex encoded.
    pub digest: String,
}

impl ResourceSummary {
    pub fn of(index: usize, block: &ResourceBlock) -> Self {
        let payload = block.payload();
        Self {
            index,
            id:     block.id(),
            size:   payload.len(),
            kind:   ResourceKind::sniff(payload),
            digest: blake3::hash(payload).to_hex().to_string(),
        }
    }

    /// Label shown to users, numbered from 1.
    pub fn display_name(&self) -> String {
        format!("Resource #{} (ID: {})", self.index + 1, self.id)
    }

    /// File name for an exported payload.
    pub fn export_file_name(&self) -> String {
        format!("resource-{}-{}.{}", self.index, self.id, self.kind.extension())
    }
}

pub fn summarize(package: &ResourcePackage) -> Vec<ResourceSummary> {
    package.blocks.iter()
        .enumerate()
        .map(|(i, b)| ResourceSummary::of(i, b))
        .collect()
}
