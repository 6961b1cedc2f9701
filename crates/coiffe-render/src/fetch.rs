//! Resolve image sources to encoded bytes.

use crate::error::RenderError;
use base64::Engine;
use std::future::Future;

/// Source of encoded image bytes, keyed by a source string.
pub trait ImageFetcher: Send + Sync {
    fn fetch(&self, src: &str) -> impl Future<Output = Result<Vec<u8>, RenderError>> + Send;
}

/// Resolves `data:` URIs, `file://` URLs and plain filesystem paths.
#[derive(Debug, Clone, Copy, Default)]
pub struct SourceFetcher;

impl ImageFetcher for SourceFetcher {
    async fn fetch(&self, src: &str) -> Result<Vec<u8>, RenderError> {
        if let Some(rest) = src.strip_prefix("data:") {
            return decode_data_uri(src, rest);
        }
        if src.starts_with("http://") || src.starts_with("https://") {
            return Err(RenderError::image_load(src, "remote URLs are not supported"));
        }

        let path = src.strip_prefix("file://").unwrap_or(src);
        tokio::fs::read(path)
            .await
            .map_err(|e| RenderError::image_load(src, e.to_string()))
    }
}

/// Decode the payload of a `data:[<mediatype>];base64,<data>` URI.
fn decode_data_uri(src: &str, rest: &str) -> Result<Vec<u8>, RenderError> {
    let (meta, payload) = rest
        .split_once(',')
        .ok_or_else(|| RenderError::image_load(src, "data URI has no payload"))?;

    if !meta.split(';').any(|p| p.eq_ignore_ascii_case("base64")) {
        return Err(RenderError::image_load(src, "only base64 data URIs are supported"));
    }

    base64::engine::general_purpose::STANDARD
        .decode(payload.trim())
        .map_err(|e| RenderError::image_load(src, format!("invalid base64: {e}")))
}
