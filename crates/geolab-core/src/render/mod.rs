//! Ternary plot renderer.
//!
//! `build_scene` produces a backend-neutral vector scene in diagram units
//! (triangle side = 1, see `ternary` for the axis convention). `raster`
//! and `svg` draw that scene; neither computes positions of its own.

#[cfg(feature = "raster")]
pub mod raster;
pub mod svg;

use serde::{Deserialize, Serialize};

use crate::batch::Sample;
use crate::maturity::MiaCategory;
use crate::ternary::fields::FieldTable;
use crate::ternary::{corners, project, Point2, Ternary};

/// Sample marker colour.
pub const MARKER_COLOR: [u8; 3] = [30, 60, 200];
const GRID_COLOR: [u8; 3] = [190, 190, 190];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderOptions {
    pub title: String,
    pub width: u32,
    pub height: u32,
    /// Gridline spacing in percent.
    pub grid_interval: f64,
    /// Marker radius in pixels.
    pub marker_radius: f64,
    /// Opacity of the field polygons, 0-1.
    pub field_alpha: f64,
    pub show_fields: bool,
    pub show_legend: bool,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            title: "QFL Triangle".to_string(),
            width: 900,
            height: 700,
            grid_interval: 10.0,
            marker_radius: 4.0,
            field_alpha: 0.35,
            show_fields: true,
            show_legend: true,
        }
    }
}

// ── Scene ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Axis {
    Q,
    F,
    L,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GridLine {
    pub axis: Axis,
    /// Constant value of `axis` along the line, percent.
    pub percent: f64,
    pub from: Point2,
    pub to: Point2,
    pub color: [u8; 3],
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScenePolygon {
    pub name: String,
    pub color: [u8; 3],
    pub alpha: f64,
    pub points: Vec<Point2>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Marker {
    pub id: String,
    pub position: Point2,
    pub color: [u8; 3],
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LegendEntry {
    pub label: String,
    pub color: [u8; 3],
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AxisLabel {
    pub text: &'static str,
    pub anchor: Point2,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TernaryScene {
    pub title: String,
    /// F, L, Q corners.
    pub boundary: [Point2; 3],
    pub gridlines: Vec<GridLine>,
    pub fields: Vec<ScenePolygon>,
    pub legend: Vec<LegendEntry>,
    pub markers: Vec<Marker>,
    pub axis_labels: Vec<AxisLabel>,
}

/// Lines of constant Q, F and L every `interval` percent, corners excluded.
pub fn gridlines(interval: f64) -> Vec<GridLine> {
    let mut lines = Vec::new();
    if interval.is_nan() || interval <= 0.0 {
        return lines;
    }
    let steps = (100.0 / interval).ceil() as usize;
    for k in 1..steps {
        let pct = k as f64 * interval;
        if pct >= 100.0 - 1e-9 {
            break;
        }
        let v = pct / 100.0;
        let w = 1.0 - v;
        let ends = [
            (Axis::Q, Ternary { q: v, f: w, l: 0.0 }, Ternary { q: v, f: 0.0, l: w }),
            (Axis::F, Ternary { q: w, f: v, l: 0.0 }, Ternary { q: 0.0, f: v, l: w }),
            (Axis::L, Ternary { q: w, f: 0.0, l: v }, Ternary { q: 0.0, f: w, l: v }),
        ];
        for (axis, a, b) in ends {
            lines.push(GridLine {
                axis,
                percent: pct,
                from: project(&a),
                to: project(&b),
                color: GRID_COLOR,
            });
        }
    }
    lines
}

/// Assemble the plot for a batch. Degenerate samples get no marker.
pub fn build_scene(samples: &[Sample], table: &FieldTable, options: &RenderOptions) -> TernaryScene {
    let fields: Vec<ScenePolygon> = if options.show_fields {
        table
            .fields
            .iter()
            .map(|f| ScenePolygon {
                name: f.name.clone(),
                color: f.color,
                alpha: options.field_alpha,
                points: f.polygon().to_vec(),
            })
            .collect()
    } else {
        Vec::new()
    };

    let markers: Vec<Marker> = samples
        .iter()
        .filter_map(|s| {
            s.position.map(|position| Marker {
                id: s.id.clone(),
                position,
                color: MARKER_COLOR,
            })
        })
        .collect();

    let mut legend = Vec::new();
    if options.show_legend {
        legend.extend(fields.iter().map(|f| LegendEntry {
            label: f.name.clone(),
            color: f.color,
        }));
        if !markers.is_empty() {
            legend.push(LegendEntry {
                label: "Samples".to_string(),
                color: MARKER_COLOR,
            });
        }
    }

    let [f, l, q] = corners();
    TernaryScene {
        title: options.title.clone(),
        boundary: [f, l, q],
        gridlines: gridlines(options.grid_interval),
        fields,
        legend,
        markers,
        axis_labels: vec![
            AxisLabel { text: "Q", anchor: q },
            AxisLabel { text: "F", anchor: f },
            AxisLabel { text: "L", anchor: l },
        ],
    }
}

// ── MIA bands ─────────────────────────────────────────────────────────────────

/// Category bands along the MIA axis, lowest first.
pub const MIA_BANDS: [(MiaCategory, f64, f64); 4] = [
    (MiaCategory::VeryLow, 0.0, 25.0),
    (MiaCategory::Low, 25.0, 50.0),
    (MiaCategory::Moderate, 50.0, 75.0),
    (MiaCategory::High, 75.0, 100.0),
];

/// Horizontal 0-100 MIA axis in pixels, shared by both backends.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct BandLayout {
    pub left: f64,
    pub right: f64,
    pub top: f64,
    pub bottom: f64,
}

impl BandLayout {
    pub fn fit(width: u32, height: u32) -> Self {
        let (w, h) = (width as f64, height as f64);
        let band = (h - 2.0 * MARGIN - TITLE_SPACE - 40.0).clamp(20.0, 160.0);
        let top = MARGIN + TITLE_SPACE;
        Self {
            left: MARGIN,
            right: w - MARGIN,
            top,
            bottom: top + band,
        }
    }

    pub fn x_of(&self, mia: f64) -> f64 {
        self.left + mia.clamp(0.0, 100.0) / 100.0 * (self.right - self.left)
    }
}

// ── Viewport ──────────────────────────────────────────────────────────────────

/// Diagram units ↔ pixels. Y grows downwards in pixel space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub scale: f64,
    pub origin_x: f64,
    pub origin_y: f64,
    /// Left edge of the legend column, pixels.
    pub legend_x: f64,
}

const MARGIN: f64 = 40.0;
const TITLE_SPACE: f64 = 30.0;
const LEGEND_WIDTH: f64 = 230.0;

impl Viewport {
    pub fn fit(width: u32, height: u32, with_legend: bool) -> Self {
        let (w, h) = (width as f64, height as f64);
        let legend = if with_legend { LEGEND_WIDTH } else { 0.0 };
        let avail_w = (w - 2.0 * MARGIN - legend).max(1.0);
        let avail_h = (h - 2.0 * MARGIN - TITLE_SPACE).max(1.0);
        let scale = avail_w.min(avail_h / crate::ternary::SQRT3_2);
        let origin_x = MARGIN + (avail_w - scale) / 2.0;
        let origin_y = MARGIN + TITLE_SPACE + (avail_h + scale * crate::ternary::SQRT3_2) / 2.0;
        Self {
            scale,
            origin_x,
            origin_y,
            legend_x: w - legend - MARGIN / 2.0,
        }
    }

    pub fn to_pixel(&self, p: Point2) -> (f64, f64) {
        (self.origin_x + p.x * self.scale, self.origin_y - p.y * self.scale)
    }

    pub fn from_pixel(&self, px: f64, py: f64) -> Point2 {
        Point2::new((px - self.origin_x) / self.scale, (self.origin_y - py) / self.scale)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::batch::{process_batch, BatchOptions};
    use crate::schema::RawRow;
    use crate::ternary::fields::FieldScheme;
    use approx::assert_abs_diff_eq;

    fn batch() -> Vec<Sample> {
        let rows: Vec<RawRow> = [(60.0, 30.0, 10.0), (0.0, 0.0, 0.0), (20.0, 50.0, 30.0)]
            .iter()
            .enumerate()
            .map(|(i, &(q, f, l))| RawRow::new().with("Sample", i).with("Q", q).with("F", f).with("L", l))
            .collect();
        process_batch(&rows, FieldScheme::Dickinson1983.table(), &BatchOptions::default())
            .unwrap()
            .samples
    }

    #[test]
    fn markers_sit_at_stored_positions() {
        let samples = batch();
        let scene = build_scene(&samples, FieldScheme::Dickinson1983.table(), &RenderOptions::default());
        assert_eq!(scene.markers.len(), 2, "degenerate sample must not be plotted");
        for m in &scene.markers {
            let s = samples.iter().find(|s| s.id == m.id).unwrap();
            assert_eq!(Some(m.position), s.position);
        }
    }

    #[test]
    fn default_grid_has_nine_lines_per_axis() {
        let lines = gridlines(10.0);
        assert_eq!(lines.len(), 27);
        for axis in [Axis::Q, Axis::F, Axis::L] {
            assert_eq!(lines.iter().filter(|g| g.axis == axis).count(), 9);
        }
        // Q = 50% runs horizontally at half height.
        let q50 = lines.iter().find(|g| g.axis == Axis::Q && g.percent == 50.0).unwrap();
        assert_abs_diff_eq!(q50.from.y, q50.to.y, epsilon = 1e-12);
        assert_abs_diff_eq!(q50.from.y, crate::ternary::SQRT3_2 / 2.0, epsilon = 1e-12);
    }

    #[test]
    fn legend_lists_every_field_then_samples() {
        let table = FieldScheme::Pettijohn1975.table();
        let scene = build_scene(&batch(), table, &RenderOptions::default());
        assert_eq!(scene.fields.len(), table.fields.len());
        assert_eq!(scene.legend.len(), table.fields.len() + 1);
        assert_eq!(scene.legend.last().unwrap().label, "Samples");

        let bare = RenderOptions {
            show_fields: false,
            show_legend: false,
            ..RenderOptions::default()
        };
        let scene = build_scene(&batch(), table, &bare);
        assert!(scene.fields.is_empty() && scene.legend.is_empty());
    }

    #[test]
    fn viewport_round_trips_pixels() {
        let vp = Viewport::fit(900, 700, true);
        for p in corners() {
            let (px, py) = vp.to_pixel(p);
            assert!(px >= 0.0 && px <= 900.0 && py >= 0.0 && py <= 700.0);
            let back = vp.from_pixel(px, py);
            assert_abs_diff_eq!(back.x, p.x, epsilon = 1e-9);
            assert_abs_diff_eq!(back.y, p.y, epsilon = 1e-9);
        }
    }
}
