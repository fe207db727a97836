//! Thumbnail identifiers
//!
//! The identifier is both the recency cache key and the file name under the
//! storage root, so every component must derive it through [`derive_key`].

use sha2::{Digest, Sha512_224};

/// File extension of every stored thumbnail
pub const THUMBNAIL_SUFFIX: &str = ".jpg";

/// Derive the identifier for a `(source url, width, height)` triple.
///
/// Format: `{hex(sha512/224(url))}_{width}_{height}.jpg`
pub fn derive_key(source_url: &str, width: u32, height: u32) -> String {
    let mut hasher = Sha512_224::new();
    hasher.update(source_url.as_bytes());
    format!(
        "{}_{}_{}{}",
        hex::encode(hasher.finalize()),
        width,
        height,
        THUMBNAIL_SUFFIX
    )
}
