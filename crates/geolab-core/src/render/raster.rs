//! PNG-ready raster backend (image crate).
//!
//! Text is not drawn; `svg` is the labelled backend. Field fills use the same
//! `classify::contains` test as classification, per pixel centre.

use image::{Rgb, RgbImage};

use super::{BandLayout, RenderOptions, TernaryScene, Viewport, MIA_BANDS};
use crate::batch::Sample;
use crate::maturity::MiaCategory;
use crate::ternary::classify::contains;
use crate::ternary::Point2;

const BACKGROUND: [u8; 3] = [255, 255, 255];
const INK: [u8; 3] = [20, 20, 20];
const SWATCH: u32 = 14;
const LEGEND_ROW: f64 = 22.0;

// ── Pixel helpers ─────────────────────────────────────────────────────────────

fn blend(img: &mut RgbImage, x: i64, y: i64, color: [u8; 3], alpha: f64) {
    if x < 0 || y < 0 || x >= img.width() as i64 || y >= img.height() as i64 {
        return;
    }
    let px = img.get_pixel_mut(x as u32, y as u32);
    for (dst, &src) in px.0.iter_mut().zip(color.iter()) {
        *dst = (*dst as f64 * (1.0 - alpha) + src as f64 * alpha).round() as u8;
    }
}

fn plot(img: &mut RgbImage, x: i64, y: i64, color: [u8; 3]) {
    blend(img, x, y, color, 1.0);
}

/// Line with a square brush of `width` pixels, sampled every half pixel.
fn line(img: &mut RgbImage, (x0, y0): (f64, f64), (x1, y1): (f64, f64), color: [u8; 3], width: u32) {
    let len = (x1 - x0).hypot(y1 - y0);
    let steps = (len * 2.0).ceil().max(1.0) as usize;
    let half = (width as i64 - 1) / 2;
    for i in 0..=steps {
        let t = i as f64 / steps as f64;
        let x = (x0 + t * (x1 - x0)).round() as i64;
        let y = (y0 + t * (y1 - y0)).round() as i64;
        for dy in -half..=(width as i64 - 1 - half) {
            for dx in -half..=(width as i64 - 1 - half) {
                plot(img, x + dx, y + dy, color);
            }
        }
    }
}

fn disc(img: &mut RgbImage, (cx, cy): (f64, f64), radius: f64, fill: [u8; 3], outline: [u8; 3]) {
    let r = radius.ceil() as i64 + 1;
    let (ix, iy) = (cx.round() as i64, cy.round() as i64);
    for y in (iy - r)..=(iy + r) {
        for x in (ix - r)..=(ix + r) {
            let d = (x as f64 - cx).hypot(y as f64 - cy);
            if d <= radius - 1.0 {
                plot(img, x, y, fill);
            } else if d <= radius {
                plot(img, x, y, outline);
            }
        }
    }
}

fn rect(img: &mut RgbImage, x: i64, y: i64, w: u32, h: u32, color: [u8; 3]) {
    for yy in y..y + h as i64 {
        for xx in x..x + w as i64 {
            plot(img, xx, yy, color);
        }
    }
}

fn fill_polygon(img: &mut RgbImage, vp: &Viewport, points: &[Point2], color: [u8; 3], alpha: f64) {
    let pixels: Vec<(f64, f64)> = points.iter().map(|&p| vp.to_pixel(p)).collect();
    let min_x = pixels.iter().map(|p| p.0).fold(f64::INFINITY, f64::min).floor().max(0.0) as u32;
    let max_x = pixels.iter().map(|p| p.0).fold(f64::NEG_INFINITY, f64::max).ceil() as u32;
    let min_y = pixels.iter().map(|p| p.1).fold(f64::INFINITY, f64::min).floor().max(0.0) as u32;
    let max_y = pixels.iter().map(|p| p.1).fold(f64::NEG_INFINITY, f64::max).ceil() as u32;

    for y in min_y..=max_y.min(img.height().saturating_sub(1)) {
        for x in min_x..=max_x.min(img.width().saturating_sub(1)) {
            let p = vp.from_pixel(x as f64 + 0.5, y as f64 + 0.5);
            // Zero tolerance: adjacent fields must not double-blend their shared edge.
            if contains(points, p, 0.0) {
                blend(img, x as i64, y as i64, color, alpha);
            }
        }
    }
}

// ── Entry points ──────────────────────────────────────────────────────────────

/// Draw a ternary scene: fields, gridlines, boundary, markers, legend swatches.
pub fn rasterize(scene: &TernaryScene, options: &RenderOptions) -> RgbImage {
    let mut img = RgbImage::from_pixel(options.width, options.height, Rgb(BACKGROUND));
    let vp = Viewport::fit(options.width, options.height, !scene.legend.is_empty());

    for field in &scene.fields {
        fill_polygon(&mut img, &vp, &field.points, field.color, field.alpha);
    }

    for g in &scene.gridlines {
        line(&mut img, vp.to_pixel(g.from), vp.to_pixel(g.to), g.color, 1);
    }

    // Field outlines over the grid.
    for field in &scene.fields {
        let n = field.points.len();
        for i in 0..n {
            let (a, b) = (field.points[i], field.points[(i + 1) % n]);
            line(&mut img, vp.to_pixel(a), vp.to_pixel(b), [110, 110, 110], 1);
        }
    }

    let [f, l, q] = scene.boundary;
    for (a, b) in [(f, l), (l, q), (q, f)] {
        line(&mut img, vp.to_pixel(a), vp.to_pixel(b), INK, 2);
    }

    for m in &scene.markers {
        disc(&mut img, vp.to_pixel(m.position), options.marker_radius, m.color, INK);
    }

    for (i, entry) in scene.legend.iter().enumerate() {
        let y = (vp.origin_y - vp.scale * crate::ternary::SQRT3_2 + i as f64 * LEGEND_ROW) as i64;
        rect(&mut img, vp.legend_x as i64, y, SWATCH, SWATCH, entry.color);
    }

    img
}

/// Bar chart of MIA per sample on a 0-100 axis, bars coloured by category.
/// Category thresholds (25, 50, 75) are drawn as light rules.
pub fn rasterize_mia_chart(samples: &[Sample], options: &RenderOptions) -> RgbImage {
    let (w, h) = (options.width, options.height);
    let mut img = RgbImage::from_pixel(w, h, Rgb(BACKGROUND));

    let left = 50.0;
    let right = w as f64 - 20.0;
    let top = 40.0;
    let bottom = h as f64 - 40.0;
    let y_of = |mia: f64| bottom - (mia.clamp(0.0, 100.0) / 100.0) * (bottom - top);

    for threshold in [25.0, 50.0, 75.0, 100.0] {
        line(&mut img, (left, y_of(threshold)), (right, y_of(threshold)), [220, 220, 220], 1);
    }

    if !samples.is_empty() {
        let slot = (right - left) / samples.len() as f64;
        let bar = (slot * 0.7).max(1.0);
        for (i, s) in samples.iter().enumerate() {
            let x0 = left + i as f64 * slot + (slot - bar) / 2.0;
            let y0 = y_of(s.mia);
            let color = MiaCategory::from_mia(s.mia).color();
            let height = (bottom - y0).round() as u32;
            rect(&mut img, x0.round() as i64, y0.round() as i64, bar.round() as u32, height, color);
        }
    }

    line(&mut img, (left, top), (left, bottom), INK, 2);
    line(&mut img, (left, bottom), (right, bottom), INK, 2);
    img
}

/// Colour bands of the weathering climate scale; labels are in `svg::weathering_scale`.
pub fn rasterize_weathering_scale(options: &RenderOptions) -> RgbImage {
    let mut img = RgbImage::from_pixel(options.width, options.height, Rgb(BACKGROUND));
    let layout = BandLayout::fit(options.width, options.height);
    let height = (layout.bottom - layout.top).round() as u32;
    for (cat, lo, hi) in MIA_BANDS {
        let x0 = layout.x_of(lo).round() as i64;
        let x1 = layout.x_of(hi).round() as i64;
        rect(&mut img, x0, layout.top.round() as i64, (x1 - x0) as u32, height, cat.color());
    }
    for threshold in [0.0, 25.0, 50.0, 75.0, 100.0] {
        let x = layout.x_of(threshold);
        line(&mut img, (x, layout.top), (x, layout.bottom + 6.0), INK, 1);
    }
    img
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::batch::{process_batch, BatchOptions};
    use crate::render::{build_scene, MARKER_COLOR};
    use crate::schema::RawRow;
    use crate::ternary::fields::FieldScheme;

    fn samples() -> Vec<Sample> {
        let rows = [
            RawRow::new().with("Sample", "a").with("Q", 60).with("F", 30).with("L", 10),
            RawRow::new().with("Sample", "b").with("Q", 20).with("F", 50).with("L", 30),
        ];
        process_batch(&rows, FieldScheme::Dickinson1983.table(), &BatchOptions::default())
            .unwrap()
            .samples
    }

    #[test]
    fn image_has_requested_size_and_marker_pixels() {
        let options = RenderOptions::default();
        let samples = samples();
        let scene = build_scene(&samples, FieldScheme::Dickinson1983.table(), &options);
        let img = rasterize(&scene, &options);
        assert_eq!(img.dimensions(), (options.width, options.height));

        let vp = Viewport::fit(options.width, options.height, true);
        for m in &scene.markers {
            let (x, y) = vp.to_pixel(m.position);
            assert_eq!(img.get_pixel(x.round() as u32, y.round() as u32).0, MARKER_COLOR);
        }
    }

    #[test]
    fn outside_the_triangle_stays_background() {
        let options = RenderOptions::default();
        let scene = build_scene(&samples(), FieldScheme::Pettijohn1975.table(), &options);
        let img = rasterize(&scene, &options);
        assert_eq!(img.get_pixel(2, 2).0, BACKGROUND);
        assert_eq!(img.get_pixel(options.width - 2, options.height - 2).0, BACKGROUND);
    }

    #[test]
    fn weathering_scale_bands_follow_thresholds() {
        let options = RenderOptions::default();
        let img = rasterize_weathering_scale(&options);
        let layout = BandLayout::fit(options.width, options.height);
        let y = ((layout.top + layout.bottom) / 2.0) as u32;
        for (cat, lo, hi) in MIA_BANDS {
            let x = layout.x_of((lo + hi) / 2.0) as u32;
            assert_eq!(img.get_pixel(x, y).0, cat.color());
        }
    }

    #[test]
    fn mia_chart_colours_bars_by_category() {
        let options = RenderOptions {
            width: 400,
            height: 300,
            ..RenderOptions::default()
        };
        let samples = samples();
        let img = rasterize_mia_chart(&samples, &options);
        // Sample "a" has MIA 66.7 (Moderate); sample near the bottom of its bar.
        let slot = (400.0 - 20.0 - 50.0) / 2.0;
        let x = (50.0 + slot / 2.0) as u32;
        let y = 300 - 40 - 5;
        assert_eq!(img.get_pixel(x, y).0, MiaCategory::Moderate.color());
    }
}
