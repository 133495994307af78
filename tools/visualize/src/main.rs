//! Reference diagrams: the empty field map of every built-in scheme and the
//! MIA weathering climate scale, as PNG and SVG, plus one side-by-side
//! contact sheet of the field maps. Written to data/reference/.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use image::{imageops, Rgb, RgbImage};

use geolab_core::render::raster::{rasterize, rasterize_weathering_scale};
use geolab_core::render::svg::{to_svg, weathering_scale};
use geolab_core::render::{build_scene, RenderOptions};
use geolab_core::FieldScheme;

const SCHEMES: [(FieldScheme, &str, &str); 2] = [
    (FieldScheme::Dickinson1983, "dickinson_1983", "Dickinson et al. (1983) provenance fields"),
    (FieldScheme::Pettijohn1975, "pettijohn_1975", "Pettijohn (1975) sandstone classification"),
];

fn main() -> Result<()> {
    let out_dir = Path::new("data/reference");
    fs::create_dir_all(out_dir).context("cannot create data/reference/")?;

    let mut sheets = Vec::new();
    for (scheme, stem, title) in SCHEMES {
        let options = RenderOptions {
            title: title.to_string(),
            ..RenderOptions::default()
        };
        let scene = build_scene(&[], scheme.table(), &options);

        let img = rasterize(&scene, &options);
        let png = out_dir.join(format!("{stem}.png"));
        img.save(&png).with_context(|| format!("failed to save {}", png.display()))?;
        println!("Wrote {}", png.display());

        let svg = out_dir.join(format!("{stem}.svg"));
        fs::write(&svg, to_svg(&scene, &options)).with_context(|| format!("failed to write {}", svg.display()))?;
        println!("Wrote {}", svg.display());

        sheets.push(img);
    }

    // Contact sheet: schemes left to right.
    let width = sheets.iter().map(|s| s.width()).sum();
    let height = sheets.iter().map(|s| s.height()).max().unwrap_or(0);
    let mut sheet = RgbImage::from_pixel(width, height, Rgb([255, 255, 255]));
    let mut x = 0i64;
    for img in &sheets {
        imageops::overlay(&mut sheet, img, x, 0);
        x += img.width() as i64;
    }
    let path = out_dir.join("all_schemes.png");
    sheet.save(&path).with_context(|| format!("failed to save {}", path.display()))?;
    println!("Wrote {}", path.display());

    let options = RenderOptions {
        title: "Weathering climate from MIA".to_string(),
        height: 320,
        ..RenderOptions::default()
    };
    let png = out_dir.join("weathering_climate.png");
    rasterize_weathering_scale(&options)
        .save(&png)
        .with_context(|| format!("failed to save {}", png.display()))?;
    println!("Wrote {}", png.display());
    let svg = out_dir.join("weathering_climate.svg");
    fs::write(&svg, weathering_scale(&options)).with_context(|| format!("failed to write {}", svg.display()))?;
    println!("Wrote {}", svg.display());
    Ok(())
}
