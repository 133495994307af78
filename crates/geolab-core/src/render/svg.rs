//! Labelled vector backend.

use std::fmt::Write;

use super::{RenderOptions, TernaryScene, Viewport};
use crate::maturity::MiaCategory;
use crate::ternary::SQRT3_2;

fn hex(c: [u8; 3]) -> String {
    format!("#{:02x}{:02x}{:02x}", c[0], c[1], c[2])
}

fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            c => out.push(c),
        }
    }
    out
}

/// Render a scene as a standalone SVG document.
pub fn to_svg(scene: &TernaryScene, options: &RenderOptions) -> String {
    let (w, h) = (options.width, options.height);
    let vp = Viewport::fit(w, h, !scene.legend.is_empty());
    let mut s = String::new();

    // Writing into a String cannot fail.
    let _ = writeln!(
        s,
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}">"#
    );
    let _ = writeln!(s, r#"<rect width="{w}" height="{h}" fill="white"/>"#);
    let _ = writeln!(
        s,
        r#"<text x="{:.1}" y="28" font-family="sans-serif" font-size="18" text-anchor="middle">{}</text>"#,
        w as f64 / 2.0,
        escape(&scene.title)
    );

    let _ = writeln!(s, r#"<g id="fields">"#);
    for field in &scene.fields {
        let points: Vec<String> = field
            .points
            .iter()
            .map(|&p| {
                let (x, y) = vp.to_pixel(p);
                format!("{x:.2},{y:.2}")
            })
            .collect();
        let _ = writeln!(
            s,
            r##"<polygon points="{}" fill="{}" fill-opacity="{}" stroke="#6e6e6e" stroke-width="0.8"><title>{}</title></polygon>"##,
            points.join(" "),
            hex(field.color),
            field.alpha,
            escape(&field.name)
        );
    }
    let _ = writeln!(s, "</g>");

    let _ = writeln!(s, r#"<g id="grid">"#);
    for g in &scene.gridlines {
        let (x1, y1) = vp.to_pixel(g.from);
        let (x2, y2) = vp.to_pixel(g.to);
        let _ = writeln!(
            s,
            r#"<line x1="{x1:.2}" y1="{y1:.2}" x2="{x2:.2}" y2="{y2:.2}" stroke="{}" stroke-width="0.6"/>"#,
            hex(g.color)
        );
    }
    let _ = writeln!(s, "</g>");

    let corners: Vec<String> = scene
        .boundary
        .iter()
        .map(|&p| {
            let (x, y) = vp.to_pixel(p);
            format!("{x:.2},{y:.2}")
        })
        .collect();
    let _ = writeln!(
        s,
        r##"<polygon points="{}" fill="none" stroke="#141414" stroke-width="2"/>"##,
        corners.join(" ")
    );

    for label in &scene.axis_labels {
        let (x, y) = vp.to_pixel(label.anchor);
        // Q sits above the apex, F and L below their corners.
        let (dx, dy) = match label.text {
            "Q" => (0.0, -10.0),
            "F" => (-12.0, 20.0),
            _ => (12.0, 20.0),
        };
        let _ = writeln!(
            s,
            r#"<text x="{:.2}" y="{:.2}" font-family="sans-serif" font-size="16" font-weight="bold" text-anchor="middle">{}</text>"#,
            x + dx,
            y + dy,
            escape(label.text)
        );
    }

    let _ = writeln!(s, r#"<g id="samples">"#);
    for m in &scene.markers {
        let (x, y) = vp.to_pixel(m.position);
        let _ = writeln!(
            s,
            r##"<circle cx="{x:.2}" cy="{y:.2}" r="{}" fill="{}" stroke="#141414" stroke-width="0.8"><title>{}</title></circle>"##,
            options.marker_radius,
            hex(m.color),
            escape(&m.id)
        );
    }
    let _ = writeln!(s, "</g>");

    if !scene.legend.is_empty() {
        let top = vp.origin_y - vp.scale * SQRT3_2;
        let _ = writeln!(s, r#"<g id="legend" font-family="sans-serif" font-size="12">"#);
        for (i, entry) in scene.legend.iter().enumerate() {
            let y = top + i as f64 * 22.0;
            let _ = writeln!(
                s,
                r#"<rect x="{:.1}" y="{y:.1}" width="14" height="14" fill="{}"/><text x="{:.1}" y="{:.1}">{}</text>"#,
                vp.legend_x,
                hex(entry.color),
                vp.legend_x + 20.0,
                y + 11.0,
                escape(&entry.label)
            );
        }
        let _ = writeln!(s, "</g>");
    }

    s.push_str("</svg>\n");
    s
}

/// Weathering climate reference: the four MIA bands on a 0-100 scale, each
/// labelled with its source-area interpretation.
pub fn weathering_scale(options: &RenderOptions) -> String {
    let (w, h) = (options.width, options.height);
    let layout = super::BandLayout::fit(w, h);
    let mut s = String::new();

    let _ = writeln!(
        s,
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}">"#
    );
    let _ = writeln!(s, r#"<rect width="{w}" height="{h}" fill="white"/>"#);
    let _ = writeln!(
        s,
        r#"<text x="{:.1}" y="28" font-family="sans-serif" font-size="18" text-anchor="middle">{}</text>"#,
        w as f64 / 2.0,
        escape(&options.title)
    );

    for (cat, lo, hi) in super::MIA_BANDS {
        let (x0, x1) = (layout.x_of(lo), layout.x_of(hi));
        let _ = writeln!(
            s,
            r#"<rect x="{x0:.1}" y="{:.1}" width="{:.1}" height="{:.1}" fill="{}"/>"#,
            layout.top,
            x1 - x0,
            layout.bottom - layout.top,
            hex(cat.color())
        );
        let mid = (x0 + x1) / 2.0;
        let _ = writeln!(
            s,
            r#"<text x="{mid:.1}" y="{:.1}" font-family="sans-serif" font-size="14" font-weight="bold" text-anchor="middle">{}</text>"#,
            layout.top + 24.0,
            escape(cat.label())
        );
        let _ = writeln!(
            s,
            r#"<text x="{mid:.1}" y="{:.1}" font-family="sans-serif" font-size="10" text-anchor="middle">{}</text>"#,
            layout.top + 44.0,
            escape(cat.interpretation())
        );
    }

    for pct in [0.0, 25.0, 50.0, 75.0, 100.0] {
        let _ = writeln!(
            s,
            r#"<text x="{:.1}" y="{:.1}" font-family="sans-serif" font-size="12" text-anchor="middle">{pct}</text>"#,
            layout.x_of(pct),
            layout.bottom + 18.0
        );
    }
    let _ = writeln!(
        s,
        r#"<text x="{:.1}" y="{:.1}" font-family="sans-serif" font-size="13" text-anchor="middle">MIA = 100 · Q / (Q + F)</text>"#,
        w as f64 / 2.0,
        layout.bottom + 40.0
    );

    s.push_str("</svg>\n");
    s
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::batch::{process_batch, BatchOptions};
    use crate::render::build_scene;
    use crate::schema::RawRow;
    use crate::ternary::fields::FieldScheme;

    #[test]
    fn document_carries_every_scene_element() {
        let rows = [
            RawRow::new().with("Sample", "S<1>").with("Q", 60).with("F", 30).with("L", 10),
            RawRow::new().with("Sample", "S2").with("Q", 0).with("F", 0).with("L", 0),
        ];
        let table = FieldScheme::Dickinson1983.table();
        let result = process_batch(&rows, table, &BatchOptions::default()).unwrap();
        let options = RenderOptions::default();
        let scene = build_scene(&result.samples, table, &options);
        let svg = to_svg(&scene, &options);

        assert!(svg.starts_with("<svg"));
        assert!(svg.trim_end().ends_with("</svg>"));
        assert_eq!(svg.matches("<polygon").count(), table.fields.len() + 1);
        assert_eq!(svg.matches("<line").count(), scene.gridlines.len());
        assert_eq!(svg.matches("<circle").count(), 1);
        assert!(svg.contains("S&lt;1&gt;"));
        assert!(svg.contains(">Craton interior</text>"));
        assert!(svg.contains(">QFL Triangle</text>"));
    }

    #[test]
    fn legend_group_is_omitted_without_entries() {
        let options = RenderOptions {
            show_legend: false,
            ..RenderOptions::default()
        };
        let scene = build_scene(&[], FieldScheme::Pettijohn1975.table(), &options);
        let svg = to_svg(&scene, &options);
        assert!(!svg.contains(r#"id="legend""#));
        assert!(svg.contains(">Quartz arenite</title>"));
    }

    #[test]
    fn weathering_scale_labels_every_band() {
        let options = RenderOptions {
            title: "Weathering climate".into(),
            ..RenderOptions::default()
        };
        let svg = weathering_scale(&options);
        for cat in [MiaCategory::VeryLow, MiaCategory::Low, MiaCategory::Moderate, MiaCategory::High] {
            assert!(svg.contains(&format!(">{}</text>", cat.label())));
            assert!(svg.contains(&hex(cat.color())));
        }
        assert_eq!(svg.matches("<rect").count(), 5);
    }

    #[test]
    fn escape_handles_markup() {
        assert_eq!(escape(r#"a&b "c" <d>"#), "a&amp;b &quot;c&quot; &lt;d&gt;");
        assert_eq!(hex([255, 0, 16]), "#ff0010");
    }
}
