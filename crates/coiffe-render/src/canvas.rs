//! Raster canvas with a 2D drawing context.
//!
//! Drawing calls are made in display (CSS) pixels; a device-pixel-ratio
//! scale maps them onto the physical RGBA surface. Images are placed through
//! a 2×3 affine transform with bilinear resampling and source-over blending.

use crate::error::RenderError;
use image::{ImageFormat, Rgba, RgbaImage};
use std::io::Cursor;

/// Hard cap on either physical surface dimension.
pub const MAX_CANVAS_DIMENSION: u32 = 1920;

/// 2×3 affine transform in canvas order:
/// ```text
/// | a  c  e |
/// | b  d  f |
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub a: f64,
    pub b: f64,
    pub c: f64,
    pub d: f64,
    pub e: f64,
    pub f: f64,
}

impl Transform {
    pub const IDENTITY: Transform = Transform { a: 1.0, b: 0.0, c: 0.0, d: 1.0, e: 0.0, f: 0.0 };

    pub fn scale(sx: f64, sy: f64) -> Self {
        Transform { a: sx, d: sy, ..Self::IDENTITY }
    }

    /// Post-multiply by a translation (applied before the existing transform).
    pub fn translate(&mut self, tx: f64, ty: f64) {
        self.e += self.a * tx + self.c * ty;
        self.f += self.b * tx + self.d * ty;
    }

    /// Post-multiply by a rotation of `angle` radians (clockwise in y-down space).
    pub fn rotate(&mut self, angle: f64) {
        let (sin, cos) = angle.sin_cos();
        let Transform { a, b, c, d, .. } = *self;
        self.a = a * cos + c * sin;
        self.b = b * cos + d * sin;
        self.c = c * cos - a * sin;
        self.d = d * cos - b * sin;
    }

    pub fn apply(&self, x: f64, y: f64) -> (f64, f64) {
        (self.a * x + self.c * y + self.e, self.b * x + self.d * y + self.f)
    }

    pub fn invert(&self) -> Option<Transform> {
        let det = self.a * self.d - self.b * self.c;
        if det.abs() < 1e-12 {
            return None;
        }
        let inv = 1.0 / det;
        Some(Transform {
            a: self.d * inv,
            b: -self.b * inv,
            c: -self.c * inv,
            d: self.a * inv,
            e: (self.c * self.f - self.d * self.e) * inv,
            f: (self.b * self.e - self.a * self.f) * inv,
        })
    }
}

/// Drawing surface sized from a display size and device pixel ratio.
pub struct Canvas {
    display_width: u32,
    display_height: u32,
    device_pixel_ratio: f64,
    surface: RgbaImage,
    reallocations: u64,
}

impl Canvas {
    pub fn new(display_width: u32, display_height: u32, device_pixel_ratio: f64) -> Self {
        Self {
            display_width,
            display_height,
            device_pixel_ratio,
            surface: RgbaImage::new(0, 0),
            reallocations: 0,
        }
    }

    /// Change the display size; takes effect on the next [`begin_frame`](Self::begin_frame).
    pub fn set_display_size(&mut self, width: u32, height: u32, device_pixel_ratio: f64) {
        self.display_width = width;
        self.display_height = height;
        self.device_pixel_ratio = device_pixel_ratio;
    }

    pub fn display_size(&self) -> (u32, u32) {
        (self.display_width, self.display_height)
    }

    /// Current physical surface size, zero before the first frame.
    pub fn physical_size(&self) -> (u32, u32) {
        self.surface.dimensions()
    }

    pub fn surface(&self) -> &RgbaImage {
        &self.surface
    }

    /// Number of times the physical surface has been reallocated.
    pub fn reallocations(&self) -> u64 {
        self.reallocations
    }

    /// Physical size for the current display size: `min(display × dpr, 1920)` per axis.
    pub fn target_size(&self) -> Result<(u32, u32), RenderError> {
        if self.display_width == 0 || self.display_height == 0 {
            return Err(RenderError::CanvasUnavailable(format!(
                "display size {}x{} has no area",
                self.display_width, self.display_height
            )));
        }
        let dpr = self.device_pixel_ratio;
        if !(dpr.is_finite() && dpr > 0.0) {
            return Err(RenderError::CanvasUnavailable(format!("invalid device pixel ratio {dpr}")));
        }

        let axis = |display: u32| -> u32 {
            let scaled = (display as f64 * dpr).round().clamp(1.0, MAX_CANVAS_DIMENSION as f64);
            scaled as u32
        };
        Ok((axis(self.display_width), axis(self.display_height)))
    }

    /// Size the surface for the current display, clear it, and return a
    /// context whose coordinates are display pixels.
    ///
    /// The surface is reallocated only when its physical size changes.
    pub fn begin_frame(&mut self) -> Result<Context2d<'_>, RenderError> {
        let (width, height) = self.target_size()?;

        if self.surface.dimensions() != (width, height) {
            tracing::debug!(
                from = ?self.surface.dimensions(),
                to = ?(width, height),
                dpr = self.device_pixel_ratio,
                "reallocating canvas surface"
            );
            self.surface = RgbaImage::new(width, height);
            self.reallocations += 1;
        } else {
            clear(&mut self.surface);
        }

        let base = Transform::scale(
            width as f64 / self.display_width as f64,
            height as f64 / self.display_height as f64,
        );

        Ok(Context2d {
            surface: &mut self.surface,
            transform: base,
            stack: Vec::new(),
        })
    }

    /// Encode the surface as PNG. Read-only.
    pub fn to_png(&self) -> Result<Vec<u8>, RenderError> {
        if self.surface.width() == 0 || self.surface.height() == 0 {
            return Err(RenderError::Render {
                reason: "nothing has been rendered".into(),
                recoverable: true,
            });
        }
        let mut buf = Vec::new();
        self.surface
            .write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)
            .map_err(|e| RenderError::Render {
                reason: format!("PNG encoding: {e}"),
                recoverable: false,
            })?;
        Ok(buf)
    }
}

fn clear(surface: &mut RgbaImage) {
    for px in surface.pixels_mut() {
        *px = Rgba([0, 0, 0, 0]);
    }
}

/// Drawing state over a canvas surface: current transform plus a save stack.
pub struct Context2d<'a> {
    surface: &'a mut RgbaImage,
    transform: Transform,
    stack: Vec<Transform>,
}

impl Context2d<'_> {
    pub fn transform(&self) -> Transform {
        self.transform
    }

    pub fn clear(&mut self) {
        clear(self.surface);
    }

    pub fn save(&mut self) {
        self.stack.push(self.transform);
    }

    /// Pop the last saved state. Unbalanced restores are ignored.
    pub fn restore(&mut self) {
        if let Some(saved) = self.stack.pop() {
            self.transform = saved;
        }
    }

    pub fn translate(&mut self, tx: f64, ty: f64) {
        self.transform.translate(tx, ty);
    }

    pub fn rotate(&mut self, angle: f64) {
        self.transform.rotate(angle);
    }

    /// Draw `image` stretched into the rectangle `(dx, dy, dw, dh)` in
    /// current user coordinates.
    pub fn draw_image(&mut self, image: &RgbaImage, dx: f64, dy: f64, dw: f64, dh: f64) {
        if !(dw > 0.0 && dh > 0.0) || image.width() == 0 || image.height() == 0 {
            return;
        }
        let Some(inverse) = self.transform.invert() else {
            return;
        };

        // Bounding box of the destination rectangle on the surface.
        let corners = [
            self.transform.apply(dx, dy),
            self.transform.apply(dx + dw, dy),
            self.transform.apply(dx, dy + dh),
            self.transform.apply(dx + dw, dy + dh),
        ];
        let (mut min_x, mut min_y) = (f64::INFINITY, f64::INFINITY);
        let (mut max_x, mut max_y) = (f64::NEG_INFINITY, f64::NEG_INFINITY);
        for (x, y) in corners {
            min_x = min_x.min(x);
            min_y = min_y.min(y);
            max_x = max_x.max(x);
            max_y = max_y.max(y);
        }

        let (sw, sh) = self.surface.dimensions();
        let x0 = min_x.floor().max(0.0) as u32;
        let y0 = min_y.floor().max(0.0) as u32;
        let x1 = (max_x.ceil().min(sw as f64)).max(0.0) as u32;
        let y1 = (max_y.ceil().min(sh as f64)).max(0.0) as u32;

        let (iw, ih) = (image.width() as f64, image.height() as f64);

        for py in y0..y1 {
            for px in x0..x1 {
                // Map the surface pixel center back into the destination rectangle.
                let (ux, uy) = inverse.apply(px as f64 + 0.5, py as f64 + 0.5);
                let u = (ux - dx) / dw;
                let v = (uy - dy) / dh;
                if !(0.0..1.0).contains(&u) || !(0.0..1.0).contains(&v) {
                    continue;
                }

                let src = sample_bilinear(image, u * iw - 0.5, v * ih - 0.5);
                let dst = self.surface.get_pixel_mut(px, py);
                *dst = blend_over(src, *dst);
            }
        }
    }
}

/// Bilinear sample with edge clamping.
fn sample_bilinear(image: &RgbaImage, sx: f64, sy: f64) -> [f64; 4] {
    let max_x = image.width() as i64 - 1;
    let max_y = image.height() as i64 - 1;

    let x0 = sx.floor() as i64;
    let y0 = sy.floor() as i64;
    let fx = sx - x0 as f64;
    let fy = sy - y0 as f64;

    let px = |x: i64, y: i64| image.get_pixel(x.clamp(0, max_x) as u32, y.clamp(0, max_y) as u32).0;

    let tl = px(x0, y0);
    let tr = px(x0 + 1, y0);
    let bl = px(x0, y0 + 1);
    let br = px(x0 + 1, y0 + 1);

    let mut out = [0.0f64; 4];
    for (i, value) in out.iter_mut().enumerate() {
        *value = tl[i] as f64 * (1.0 - fx) * (1.0 - fy)
            + tr[i] as f64 * fx * (1.0 - fy)
            + bl[i] as f64 * (1.0 - fx) * fy
            + br[i] as f64 * fx * fy;
    }
    out
}

/// Source-over compositing of straight-alpha colours.
fn blend_over(src: [f64; 4], dst: Rgba<u8>) -> Rgba<u8> {
    let sa = src[3] / 255.0;
    let da = dst[3] as f64 / 255.0;
    let out_a = sa + da * (1.0 - sa);
    if out_a <= 0.0 {
        return Rgba([0, 0, 0, 0]);
    }

    let channel = |i: usize| -> u8 {
        let c = (src[i] * sa + dst[i] as f64 * da * (1.0 - sa)) / out_a;
        c.round().clamp(0.0, 255.0) as u8
    };

    Rgba([
        channel(0),
        channel(1),
        channel(2),
        (out_a * 255.0).round().clamp(0.0, 255.0) as u8,
    ])
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::{FRAC_PI_2, PI};

    const RED: Rgba<u8> = Rgba([255, 0, 0, 255]);
    const BLUE: Rgba<u8> = Rgba([0, 0, 255, 255]);
    const CLEAR: Rgba<u8> = Rgba([0, 0, 0, 0]);

    fn solid(w: u32, h: u32, color: Rgba<u8>) -> RgbaImage {
        RgbaImage::from_pixel(w, h, color)
    }

    #[test]
    fn test_transform_rotate_quarter_turn() {
        let mut t = Transform::IDENTITY;
        t.rotate(FRAC_PI_2);
        let (x, y) = t.apply(1.0, 0.0);
        assert!(x.abs() < 1e-12 && (y - 1.0).abs() < 1e-12, "({x}, {y})");
    }

    #[test]
    fn test_transform_translate_then_rotate_pivots() {
        // Rotating about (5, 5): the pivot stays put.
        let mut t = Transform::IDENTITY;
        t.translate(5.0, 5.0);
        t.rotate(1.1);
        let (x, y) = t.apply(0.0, 0.0);
        assert!((x - 5.0).abs() < 1e-12 && (y - 5.0).abs() < 1e-12);
    }

    #[test]
    fn test_transform_invert_roundtrip() {
        let mut t = Transform::scale(2.0, 1.5);
        t.translate(3.0, -4.0);
        t.rotate(0.3);
        let inv = t.invert().unwrap();
        let (x, y) = t.apply(7.0, 11.0);
        let (bx, by) = inv.apply(x, y);
        assert!((bx - 7.0).abs() < 1e-9 && (by - 11.0).abs() < 1e-9);
    }

    #[test]
    fn test_singular_transform_has_no_inverse() {
        assert!(Transform::scale(0.0, 1.0).invert().is_none());
    }

    #[test]
    fn test_dpr_scales_surface() {
        let mut canvas = Canvas::new(100, 80, 2.0);
        canvas.begin_frame().unwrap();
        assert_eq!(canvas.physical_size(), (200, 160));
    }

    #[test]
    fn test_surface_capped() {
        let mut canvas = Canvas::new(1000, 500, 3.0);
        canvas.begin_frame().unwrap();
        assert_eq!(canvas.physical_size(), (1920, 1500));
    }

    #[test]
    fn test_surface_reused_when_size_unchanged() {
        let mut canvas = Canvas::new(64, 48, 1.0);
        canvas.begin_frame().unwrap();
        canvas.begin_frame().unwrap();
        assert_eq!(canvas.reallocations(), 1);

        canvas.set_display_size(64, 48, 2.0);
        canvas.begin_frame().unwrap();
        assert_eq!(canvas.reallocations(), 2);
    }

    #[test]
    fn test_begin_frame_clears() {
        let mut canvas = Canvas::new(4, 4, 1.0);
        canvas.begin_frame().unwrap().draw_image(&solid(1, 1, RED), 0.0, 0.0, 4.0, 4.0);
        assert_eq!(*canvas.surface().get_pixel(2, 2), RED);
        canvas.begin_frame().unwrap();
        assert_eq!(*canvas.surface().get_pixel(2, 2), CLEAR);
    }

    #[test]
    fn test_unavailable_canvas() {
        let mut canvas = Canvas::new(0, 10, 1.0);
        assert!(matches!(canvas.begin_frame(), Err(RenderError::CanvasUnavailable(_))));
        canvas.set_display_size(10, 10, f64::NAN);
        assert!(matches!(canvas.begin_frame(), Err(RenderError::CanvasUnavailable(_))));
        canvas.set_display_size(10, 10, 0.0);
        assert!(matches!(canvas.begin_frame(), Err(RenderError::CanvasUnavailable(_))));
    }

    #[test]
    fn test_draw_image_fills_rectangle() {
        let mut canvas = Canvas::new(10, 10, 1.0);
        let mut ctx = canvas.begin_frame().unwrap();
        ctx.draw_image(&solid(2, 2, RED), 2.0, 2.0, 4.0, 4.0);
        let s = canvas.surface();
        assert_eq!(*s.get_pixel(2, 2), RED);
        assert_eq!(*s.get_pixel(5, 5), RED);
        assert_eq!(*s.get_pixel(1, 1), CLEAR);
        assert_eq!(*s.get_pixel(6, 6), CLEAR);
    }

    #[test]
    fn test_draw_in_display_pixels_under_dpr() {
        let mut canvas = Canvas::new(10, 10, 2.0);
        let mut ctx = canvas.begin_frame().unwrap();
        ctx.draw_image(&solid(1, 1, RED), 0.0, 0.0, 5.0, 5.0);
        let s = canvas.surface();
        assert_eq!(*s.get_pixel(9, 9), RED);
        assert_eq!(*s.get_pixel(10, 10), CLEAR);
    }

    #[test]
    fn test_rotation_pivots_on_translated_origin() {
        // Left half red, right half blue; a half turn about the center swaps them.
        let mut image = solid(2, 1, RED);
        image.put_pixel(1, 0, BLUE);

        let mut canvas = Canvas::new(10, 10, 1.0);
        let mut ctx = canvas.begin_frame().unwrap();
        ctx.save();
        ctx.translate(5.0, 5.0);
        ctx.rotate(PI);
        ctx.draw_image(&image, -5.0, -5.0, 10.0, 10.0);
        ctx.restore();
        assert_eq!(ctx.transform(), Transform::IDENTITY);

        let s = canvas.surface();
        assert_eq!(*s.get_pixel(1, 5), BLUE);
        assert_eq!(*s.get_pixel(8, 5), RED);
    }

    #[test]
    fn test_restore_without_save_is_noop() {
        let mut canvas = Canvas::new(4, 4, 1.0);
        let mut ctx = canvas.begin_frame().unwrap();
        ctx.translate(1.0, 1.0);
        let before = ctx.transform();
        ctx.restore();
        assert_eq!(ctx.transform(), before);
    }

    #[test]
    fn test_alpha_blends_over_background() {
        let mut canvas = Canvas::new(2, 2, 1.0);
        let mut ctx = canvas.begin_frame().unwrap();
        ctx.draw_image(&solid(1, 1, BLUE), 0.0, 0.0, 2.0, 2.0);
        ctx.draw_image(&solid(1, 1, Rgba([255, 0, 0, 128])), 0.0, 0.0, 2.0, 2.0);
        let px = canvas.surface().get_pixel(0, 0);
        assert_eq!(px[3], 255);
        assert!((px[0] as i32 - 128).abs() <= 1, "{px:?}");
        assert!((px[2] as i32 - 127).abs() <= 1, "{px:?}");
    }

    #[test]
    fn test_transparent_source_leaves_destination() {
        let mut canvas = Canvas::new(2, 2, 1.0);
        let mut ctx = canvas.begin_frame().unwrap();
        ctx.draw_image(&solid(1, 1, RED), 0.0, 0.0, 2.0, 2.0);
        ctx.draw_image(&solid(1, 1, CLEAR), 0.0, 0.0, 2.0, 2.0);
        assert_eq!(*canvas.surface().get_pixel(1, 1), RED);
    }

    #[test]
    fn test_png_export_is_read_only() {
        let mut canvas = Canvas::new(6, 4, 1.0);
        canvas.begin_frame().unwrap().draw_image(&solid(1, 1, RED), 0.0, 0.0, 3.0, 4.0);
        let before = canvas.surface().clone();
        let png = canvas.to_png().unwrap();
        assert_eq!(canvas.surface(), &before);

        let decoded = image::load_from_memory(&png).unwrap().to_rgba8();
        assert_eq!(decoded, before);
    }

    #[test]
    fn test_png_export_before_render_fails() {
        let canvas = Canvas::new(6, 4, 1.0);
        assert!(canvas.to_png().is_err());
    }
}
