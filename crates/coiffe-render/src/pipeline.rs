//! Preview rendering: load both images, then composite photo and hairstyle.

use crate::cache::ImageCache;
use crate::canvas::Canvas;
use crate::error::RenderError;
use crate::fetch::ImageFetcher;
use coiffe_core::overlay::position_for_key_landmarks;
use coiffe_core::{extract_key_landmarks, KeyLandmarks, Landmark, OverlayPosition};
use image::RgbaImage;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::Mutex;

/// Shared handle to the destination canvas.
pub type CanvasHandle = Arc<Mutex<Canvas>>;

pub fn canvas_handle(canvas: Canvas) -> CanvasHandle {
    Arc::new(Mutex::new(canvas))
}

/// Result of a render request.
#[derive(Debug, Clone, PartialEq)]
pub enum RenderOutcome {
    /// The canvas now shows this request's preview.
    Drawn { generation: u64, overlay: OverlayPosition },
    /// A newer request started before this one finished loading; nothing was drawn.
    Superseded { generation: u64, latest: u64 },
}

/// Renders hairstyle previews with last-request-wins ordering.
///
/// Every call to [`render_preview`](Self::render_preview) takes a new
/// generation number. A render whose generation is no longer the latest
/// once its images are ready discards its draw instead of overwriting the
/// newer preview. Image loads themselves are not cancelled.
pub struct RenderPipeline<F> {
    cache: ImageCache<F>,
    generation: AtomicU64,
}

impl<F: ImageFetcher> RenderPipeline<F> {
    pub fn new(fetcher: F) -> Self {
        Self::with_cache(ImageCache::new(fetcher))
    }

    pub fn with_cache(cache: ImageCache<F>) -> Self {
        Self {
            cache,
            generation: AtomicU64::new(0),
        }
    }

    pub fn cache(&self) -> &ImageCache<F> {
        &self.cache
    }

    /// Generation of the most recently started render (0 before any).
    pub fn latest_generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    /// Draw `user_src` stretched over the canvas with `hairstyle_src` placed
    /// on the face described by `landmarks`.
    pub async fn render_preview(
        &self,
        canvas: &CanvasHandle,
        user_src: &str,
        hairstyle_src: &str,
        landmarks: &[Landmark],
    ) -> Result<RenderOutcome, RenderError> {
        let key = extract_key_landmarks(landmarks)?;
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        tracing::debug!(generation, "render started");

        let (photo, template) = tokio::try_join!(
            self.cache.load_image(user_src),
            self.cache.load_image(hairstyle_src),
        )
        .map_err(|e| {
            tracing::warn!(generation, error = %e, "render aborted: image load failed");
            e
        })?;

        if let Some(outcome) = self.superseded(generation) {
            return Ok(outcome);
        }

        let mut canvas = canvas.lock().await;
        // Re-check: a newer render may have drawn while we waited for the canvas.
        if let Some(outcome) = self.superseded(generation) {
            return Ok(outcome);
        }

        let overlay = composite(&mut canvas, &photo, &template, &key)?;
        tracing::info!(
            generation,
            x = overlay.x,
            y = overlay.y,
            width = overlay.width,
            height = overlay.height,
            rotation = overlay.rotation,
            "preview rendered"
        );

        Ok(RenderOutcome::Drawn { generation, overlay })
    }

    fn superseded(&self, generation: u64) -> Option<RenderOutcome> {
        let latest = self.latest_generation();
        if latest == generation {
            return None;
        }
        tracing::debug!(generation, latest, "render superseded, discarding draw");
        Some(RenderOutcome::Superseded { generation, latest })
    }
}

/// Encode the canvas contents as PNG without touching the rendered state.
pub async fn export_png(canvas: &CanvasHandle) -> Result<Vec<u8>, RenderError> {
    let canvas = canvas.lock().await;
    canvas.to_png()
}

/// Clear/resize, draw the photo, then draw the template rotated about its own center.
fn composite(
    canvas: &mut Canvas,
    photo: &RgbaImage,
    template: &RgbaImage,
    key: &KeyLandmarks,
) -> Result<OverlayPosition, RenderError> {
    if template.width() == 0 || template.height() == 0 {
        return Err(RenderError::Render {
            reason: "hairstyle template has no pixels".into(),
            recoverable: true,
        });
    }
    let aspect = template.height() as f64 / template.width() as f64;

    let (display_w, display_h) = canvas.display_size();
    let (display_w, display_h) = (display_w as f64, display_h as f64);
    let mut ctx = canvas.begin_frame()?;

    ctx.draw_image(photo, 0.0, 0.0, display_w, display_h);

    let overlay = position_for_key_landmarks(key, display_w, display_h, aspect);
    let (cx, cy) = overlay.center();

    ctx.save();
    ctx.translate(cx, cy);
    ctx.rotate(overlay.rotation);
    ctx.draw_image(
        template,
        -overlay.width / 2.0,
        -overlay.height / 2.0,
        overlay.width,
        overlay.height,
    );
    ctx.restore();

    Ok(overlay)
}
