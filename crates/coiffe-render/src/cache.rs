//! Memoized image decoding.

use crate::error::RenderError;
use crate::fetch::ImageFetcher;
use image::RgbaImage;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

/// Shared handle to a decoded RGBA image. Clones share the same pixels.
pub type CachedImage = Arc<RgbaImage>;

/// Decoded images keyed by source string.
///
/// Entries are written once per key and never evicted; the working set is
/// a photo plus a small catalogue of templates. [`clear_cache`] is the only
/// way entries leave.
///
/// [`clear_cache`]: ImageCache::clear_cache
pub struct ImageCache<F> {
    fetcher: F,
    entries: Mutex<HashMap<String, CachedImage>>,
}

impl<F: ImageFetcher> ImageCache<F> {
    pub fn new(fetcher: F) -> Self {
        Self {
            fetcher,
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Load and decode `src`, or return the handle decoded by an earlier call.
    pub async fn load_image(&self, src: &str) -> Result<CachedImage, RenderError> {
        let cached = self.entries().get(src).cloned();
        if let Some(hit) = cached {
            tracing::trace!(src = %crate::error::source_label(src), "image cache hit");
            return Ok(hit);
        }

        let bytes = self.fetcher.fetch(src).await?;
        let decoded = image::load_from_memory(&bytes)
            .map_err(|e| RenderError::image_load(src, e.to_string()))?
            .to_rgba8();

        tracing::debug!(
            src = %crate::error::source_label(src),
            width = decoded.width(),
            height = decoded.height(),
            "image decoded"
        );

        // A concurrent load of the same source may have finished first; keep
        // whichever landed first so every caller shares one handle.
        let mut entries = self.entries();
        let handle = entries
            .entry(src.to_string())
            .or_insert_with(|| Arc::new(decoded));
        Ok(Arc::clone(handle))
    }

    /// Drop every cached image.
    pub fn clear_cache(&self) {
        let mut entries = self.entries();
        tracing::debug!(entries = entries.len(), "image cache cleared");
        entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries().is_empty()
    }

    pub fn contains(&self, src: &str) -> bool {
        self.entries().contains_key(src)
    }

    fn entries(&self) -> MutexGuard<'_, HashMap<String, CachedImage>> {
        // The map is never left half-written, so a poisoned lock is still usable.
        self.entries.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use image::{ImageFormat, Rgba};
    use std::io::Cursor;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// PNG bytes for a solid-colour image.
    pub(crate) fn png(width: u32, height: u32, color: [u8; 4]) -> Vec<u8> {
        let img = RgbaImage::from_pixel(width, height, Rgba(color));
        let mut buf = Vec::new();
        img.write_to(&mut Cursor::new(&mut buf), ImageFormat::Png).unwrap();
        buf
    }

    /// In-memory fetcher that counts requests.
    pub(crate) struct MemoryFetcher {
        pub images: HashMap<String, Vec<u8>>,
        pub fetches: AtomicUsize,
    }

    impl MemoryFetcher {
        pub fn new(images: &[(&str, Vec<u8>)]) -> Self {
            Self {
                images: images.iter().map(|(k, v)| (k.to_string(), v.clone())).collect(),
                fetches: AtomicUsize::new(0),
            }
        }
    }

    impl ImageFetcher for MemoryFetcher {
        async fn fetch(&self, src: &str) -> Result<Vec<u8>, RenderError> {
            self.fetches.fetch_add(1, Ordering::SeqCst);
            self.images
                .get(src)
                .cloned()
                .ok_or_else(|| RenderError::image_load(src, "not found"))
        }
    }

    fn cache() -> ImageCache<MemoryFetcher> {
        ImageCache::new(MemoryFetcher::new(&[
            ("a.png", png(4, 3, [255, 0, 0, 255])),
            ("b.png", png(2, 2, [0, 0, 255, 255])),
            ("broken.png", b"not an image".to_vec()),
        ]))
    }

    #[tokio::test]
    async fn test_same_source_returns_same_handle() {
        let cache = cache();
        let first = cache.load_image("a.png").await.unwrap();
        let second = cache.load_image("a.png").await.unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(cache.fetcher.fetches.load(Ordering::SeqCst), 1);
        assert_eq!(first.dimensions(), (4, 3));
    }

    #[tokio::test]
    async fn test_new_source_triggers_decode() {
        let cache = cache();
        let a = cache.load_image("a.png").await.unwrap();
        let _ = cache.load_image("a.png").await.unwrap();
        let b = cache.load_image("b.png").await.unwrap();
        assert!(!Arc::ptr_eq(&a, &b));
        assert_eq!(cache.fetcher.fetches.load(Ordering::SeqCst), 2);
        assert_eq!(cache.len(), 2);
    }

    #[tokio::test]
    async fn test_clear_cache_forces_reload() {
        let cache = cache();
        let before = cache.load_image("a.png").await.unwrap();
        cache.clear_cache();
        assert!(cache.is_empty());
        let after = cache.load_image("a.png").await.unwrap();
        assert!(!Arc::ptr_eq(&before, &after));
        assert_eq!(cache.fetcher.fetches.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_decode_failure_not_cached() {
        let cache = cache();
        let err = cache.load_image("broken.png").await.unwrap_err();
        assert!(matches!(err, RenderError::ImageLoad { .. }));
        assert!(!cache.contains("broken.png"));
        assert!(cache.load_image("missing.png").await.is_err());
    }
}
