//! Parsing of `/fill/{width}/{height}/{url}` request paths

use crate::error::{Result, ThumbnailError};
use crate::key::derive_key;
use percent_encoding::percent_decode_str;
use url::Url;

const FILL_PREFIX: &str = "/fill/";
const IMAGE_EXTENSIONS: [&str; 2] = [".jpg", ".jpeg"];

/// A parsed thumbnail request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThumbnailRequest {
    pub width: u32,
    pub height: u32,
    pub source: Url,
}

impl ThumbnailRequest {
    /// Parse a request path such as `/fill/200/500/http://origin/image.jpg`
    pub fn parse(path: &str) -> Result<Self> {
        let rest = path
            .strip_prefix(FILL_PREFIX)
            .ok_or_else(|| invalid("path must start with /fill/"))?;

        let mut parts = rest.splitn(3, '/');
        let width = parse_dimension(parts.next(), "width")?;
        let height = parse_dimension(parts.next(), "height")?;
        let encoded_url = parts
            .next()
            .filter(|s| !s.is_empty())
            .ok_or_else(|| invalid("missing source url"))?;
        // Clients may escape the inner url, e.g. `http%3A%2F%2Forigin%2Fa.jpg`
        let decoded = percent_decode_str(encoded_url)
            .decode_utf8()
            .map_err(|_| invalid("source url is not valid UTF-8 once decoded"))?;
        let raw_url: &str = &decoded;

        let lowered = raw_url.to_ascii_lowercase();
        if !IMAGE_EXTENSIONS.iter().any(|ext| lowered.ends_with(ext)) {
            return Err(invalid("source url must point to a .jpg or .jpeg image"));
        }

        let source = Url::parse(raw_url)
            .map_err(|e| invalid(&format!("source url is not a valid absolute url: {}", e)))?;
        if !matches!(source.scheme(), "http" | "https") {
            return Err(invalid("source url must use http or https"));
        }

        Ok(Self {
            width,
            height,
            source,
        })
    }

    /// Identifier of the thumbnail this request resolves to
    pub fn key(&self) -> String {
        derive_key(self.source.as_str(), self.width, self.height)
    }
}

fn parse_dimension(segment: Option<&str>, name: &str) -> Result<u32> {
    let segment = segment.unwrap_or_default();
    if segment.is_empty() || !segment.bytes().all(|b| b.is_ascii_digit()) {
        return Err(invalid(&format!("{} must be a non-negative integer", name)));
    }
    segment
        .parse()
        .map_err(|_| invalid(&format!("{} is too large", name)))
}

fn invalid(msg: &str) -> ThumbnailError {
    ThumbnailError::InvalidRequest(msg.to_string())
}
