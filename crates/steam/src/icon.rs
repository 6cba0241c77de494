//! Installed-app icon resolution.
//!
//! The on-disk client icon is an ICO container under
//! `<install>/steam/games/<hash>.ico`, where the hash comes from a remote
//! metadata lookup. Icon absence is an expected outcome at every step —
//! lookup miss, known-bad hash, missing file, unusable container — and is
//! reported as `None`, never as an error.

use std::future::Future;
use std::io::Cursor;
use std::path::PathBuf;
use std::pin::Pin;
use std::sync::Arc;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use tracing::{debug, warn};

/// Remote app-metadata lookup: app id → client-icon hash.
///
/// Implemented by the steamcmd.net client; tests substitute fakes.
pub trait MetadataLookup: Send + Sync {
    fn icon_hash(&self, app_id: u32) -> Pin<Box<dyn Future<Output = Option<String>> + Send + '_>>;
}

/// Icon hashes the catalog returns but that do not resolve to a usable
/// icon container on disk.
pub const BAD_ICON_HASHES: &[&str] = &["0f43f5fdcbba1b4b80a1e501a423bda1592c1a17"];

const PNG_MAGIC: &[u8] = &[0x89, b'P', b'N', b'G', 0x0d, 0x0a, 0x1a, 0x0a];

/// Resolves an app id to an embeddable icon data URI.
pub struct IconResolver {
    install_path: PathBuf,
    lookup: Arc<dyn MetadataLookup>,
}

impl IconResolver {
    pub fn new(install_path: PathBuf, lookup: Arc<dyn MetadataLookup>) -> Self {
        Self {
            install_path,
            lookup,
        }
    }

    /// Returns the app's icon as a PNG data URI, or `None` when no icon
    /// can be resolved.
    pub async fn resolve_app_icon(&self, app_id: u32) -> Option<String> {
        let hash = match self.lookup.icon_hash(app_id).await {
            Some(hash) => hash,
            None => {
                debug!(app_id, "no icon hash from metadata lookup");
                return None;
            }
        };

        if BAD_ICON_HASHES.contains(&hash.as_str()) {
            debug!(app_id, hash, "icon hash is in the known-bad set");
            return None;
        }

        let icon_path = self
            .install_path
            .join("steam")
            .join("games")
            .join(format!("{hash}.ico"));

        let bytes = match tokio::fs::read(&icon_path).await {
            Ok(bytes) => bytes,
            Err(e) => {
                debug!(app_id, path = %icon_path.display(), "icon file absent: {e}");
                return None;
            }
        };

        match encode_icon_data_uri(&bytes) {
            Some(uri) => Some(uri),
            None => {
                warn!(app_id, path = %icon_path.display(), "unusable icon container");
                None
            }
        }
    }
}

/// One frame of an ICO container.
struct IcoFrame<'a> {
    entry: [u8; 16],
    data: &'a [u8],
}

/// Selects the frame with the greatest width. A width byte of 0 means
/// 256 per the ICO format.
fn widest_frame(ico: &[u8]) -> Option<IcoFrame<'_>> {
    if ico.len() < 6 {
        return None;
    }
    let reserved = u16::from_le_bytes([ico[0], ico[1]]);
    let kind = u16::from_le_bytes([ico[2], ico[3]]);
    let count = u16::from_le_bytes([ico[4], ico[5]]) as usize;
    if reserved != 0 || kind != 1 || count == 0 {
        return None;
    }

    let mut best: Option<(u32, IcoFrame<'_>)> = None;
    for i in 0..count {
        let base = 6 + i * 16;
        let entry_bytes = ico.get(base..base + 16)?;

        let width = match entry_bytes[0] {
            0 => 256,
            w => u32::from(w),
        };
        let size =
            u32::from_le_bytes([entry_bytes[8], entry_bytes[9], entry_bytes[10], entry_bytes[11]])
                as usize;
        let offset =
            u32::from_le_bytes([entry_bytes[12], entry_bytes[13], entry_bytes[14], entry_bytes[15]])
                as usize;
        let data = ico.get(offset..offset.checked_add(size)?)?;

        let mut entry = [0u8; 16];
        entry.copy_from_slice(entry_bytes);

        if best.as_ref().is_none_or(|(w, _)| width > *w) {
            best = Some((width, IcoFrame { entry, data }));
        }
    }
    best.map(|(_, frame)| frame)
}

/// Encodes the widest frame of an ICO container as a PNG data URI.
/// PNG-compressed frames embed directly; BMP frames are re-encoded
/// losslessly.
fn encode_icon_data_uri(ico: &[u8]) -> Option<String> {
    let frame = widest_frame(ico)?;

    let png = if frame.data.starts_with(PNG_MAGIC) {
        frame.data.to_vec()
    } else {
        frame_to_png(&frame)?
    };

    Some(format!("data:image/png;base64,{}", BASE64.encode(&png)))
}

/// Re-encodes a BMP frame to PNG by wrapping it in a single-entry ICO
/// and round-tripping through the image decoder.
fn frame_to_png(frame: &IcoFrame<'_>) -> Option<Vec<u8>> {
    let mut single = Vec::with_capacity(22 + frame.data.len());
    single.extend_from_slice(&[0, 0, 1, 0, 1, 0]);
    let mut entry = frame.entry;
    entry[12..16].copy_from_slice(&22u32.to_le_bytes());
    single.extend_from_slice(&entry);
    single.extend_from_slice(frame.data);

    let decoded = image::load_from_memory_with_format(&single, image::ImageFormat::Ico).ok()?;
    let mut png = Vec::new();
    decoded
        .write_to(&mut Cursor::new(&mut png), image::ImageFormat::Png)
        .ok()?;
    Some(png)
}
