//! QFL/MIA provenance batch tool.
//!
//! `run` processes a sample table and writes the results, diagnostics,
//! summary and plots into one output directory.

mod input;
mod logging;

use std::fs::{self, File};
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use tracing::info;

use geolab_core::export::{write_diagnostics, write_results};
use geolab_core::geocalc;
use geolab_core::render::{build_scene, raster, svg};
use geolab_core::{process_batch, FieldScheme, InputMode, PipelineConfig};

#[derive(Parser, Debug)]
#[command(name = "qfl_mia", about = "Sandstone provenance (QFL) and mineralogical maturity (MIA) analysis")]
struct Args {
    /// Debug-level logging (RUST_LOG takes precedence).
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Also write a daily rolling log file into this directory.
    #[arg(long, global = true)]
    log_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Process a CSV sample table.
    Run {
        #[arg(short, long)]
        input: PathBuf,

        /// Declared input schema; inferred from the columns when omitted.
        #[arg(long, value_enum)]
        mode: Option<ModeArg>,

        #[arg(long, value_enum)]
        scheme: Option<SchemeArg>,

        /// Custom field table JSON (overrides --scheme).
        #[arg(long)]
        fields: Option<PathBuf>,

        /// Pipeline config JSON; flags override its values.
        #[arg(short, long)]
        config: Option<PathBuf>,

        #[arg(short, long, default_value = "qfl_mia_output")]
        output_dir: PathBuf,

        /// Fixed decimals in the results CSV.
        #[arg(long)]
        precision: Option<usize>,
    },

    /// List the fields of a built-in table.
    Fields {
        #[arg(long, value_enum, default_value_t = SchemeArg::Dickinson)]
        scheme: SchemeArg,
    },

    /// Field calculators.
    Calc {
        #[command(subcommand)]
        calculator: Calculator,
    },
}

#[derive(Subcommand, Debug)]
enum Calculator {
    /// True dip from an apparent dip and its angle from strike (degrees).
    TrueDip { apparent: f64, angle: f64 },
    /// Porosity (%) from pore and total volume.
    Porosity { pore: f64, total: f64 },
    /// True thickness from measured thickness and dip (degrees).
    Thickness { measured: f64, dip: f64 },
    /// Slope gradient (%) from rise and run.
    Slope {
        #[arg(allow_negative_numbers = true)]
        rise: f64,
        run: f64,
    },
    /// Krumbein phi from grain diameter in millimetres.
    Phi { size_mm: f64 },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ModeArg {
    Full,
    Direct,
}

impl From<ModeArg> for InputMode {
    fn from(m: ModeArg) -> Self {
        match m {
            ModeArg::Full => InputMode::FullMineral,
            ModeArg::Direct => InputMode::DirectQfl,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum SchemeArg {
    Dickinson,
    Pettijohn,
}

impl From<SchemeArg> for FieldScheme {
    fn from(s: SchemeArg) -> Self {
        match s {
            SchemeArg::Dickinson => FieldScheme::Dickinson1983,
            SchemeArg::Pettijohn => FieldScheme::Pettijohn1975,
        }
    }
}

// ── Subcommands ───────────────────────────────────────────────────────────────

struct RunArgs {
    input: PathBuf,
    mode: Option<ModeArg>,
    scheme: Option<SchemeArg>,
    fields: Option<PathBuf>,
    config: Option<PathBuf>,
    output_dir: PathBuf,
    precision: Option<usize>,
}

fn load_config(args: &RunArgs) -> Result<PipelineConfig> {
    let mut config = match &args.config {
        Some(path) => PipelineConfig::load(path)?,
        None => PipelineConfig::default(),
    };
    if let Some(mode) = args.mode {
        config.mode = Some(mode.into());
    }
    if let Some(scheme) = args.scheme {
        config.scheme = scheme.into();
        // An explicit scheme flag beats a table path from the config file.
        if args.fields.is_none() {
            config.field_table = None;
        }
    }
    if let Some(fields) = &args.fields {
        config.field_table = Some(fields.clone());
    }
    if args.precision.is_some() {
        config.export.precision = args.precision;
    }
    config.validate()?;
    Ok(config)
}

fn create(dir: &Path, name: &str) -> Result<BufWriter<File>> {
    let path = dir.join(name);
    let file = File::create(&path).with_context(|| format!("cannot create {}", path.display()))?;
    Ok(BufWriter::new(file))
}

fn run(args: RunArgs) -> Result<()> {
    let config = load_config(&args)?;
    let table = config.field_table()?;
    let rows = input::read_file(&args.input)?;
    info!(input = %args.input.display(), rows = rows.len(), table = %table.name, "loaded input");

    let result = process_batch(&rows, &table, &config.batch_options())
        .with_context(|| format!("batch {} rejected", args.input.display()))?;

    let out = &args.output_dir;
    fs::create_dir_all(out).with_context(|| format!("cannot create {}", out.display()))?;

    write_results(&result, create(out, "qfl_mia_results.csv")?, &config.export)
        .context("writing qfl_mia_results.csv")?;
    write_diagnostics(&result, create(out, "qfl_mia_diagnostics.csv")?).context("writing qfl_mia_diagnostics.csv")?;
    serde_json::to_writer_pretty(create(out, "summary.json")?, &result.summary).context("writing summary.json")?;

    let scene = build_scene(&result.samples, &table, &config.render);
    let png = out.join("qfl_triangle.png");
    raster::rasterize(&scene, &config.render)
        .save(&png)
        .with_context(|| format!("cannot save {}", png.display()))?;
    let svg_path = out.join("qfl_triangle.svg");
    fs::write(&svg_path, svg::to_svg(&scene, &config.render))
        .with_context(|| format!("cannot write {}", svg_path.display()))?;
    let chart = out.join("mia_chart.png");
    raster::rasterize_mia_chart(&result.samples, &config.render)
        .save(&chart)
        .with_context(|| format!("cannot save {}", chart.display()))?;

    let s = &result.summary;
    println!(
        "{} samples ({} degenerate, {} skipped) -> {}",
        s.samples,
        s.degenerate,
        s.skipped,
        out.display()
    );
    if config.render.show_legend {
        println!("legend labels and sample ids are in qfl_triangle.svg; the PNG legend shows colours only");
    }
    match (s.mean_mia, s.mean_mia_category) {
        (Some(mia), Some(cat)) => println!("mean MIA {mia:.2} ({cat}): {}", cat.interpretation()),
        _ => println!("mean MIA undefined: no sample has a ternary position"),
    }
    for fc in s.field_counts.iter().filter(|fc| fc.count > 0) {
        println!("  {:<28} {}", fc.name, fc.count);
    }
    Ok(())
}

fn list_fields(scheme: SchemeArg) {
    let table = FieldScheme::from(scheme).table();
    println!("{}", table.name);
    for field in &table.fields {
        let [r, g, b] = field.color;
        let vertices: Vec<String> = field
            .vertices
            .iter()
            .map(|t| {
                let [q, f, l] = t.percent();
                format!("({q:.1}, {f:.1}, {l:.1})")
            })
            .collect();
        println!("  {:<28} #{r:02x}{g:02x}{b:02x}  {}", field.name, vertices.join(" "));
    }
}

fn calc(calculator: Calculator) -> Result<()> {
    let (label, value) = match calculator {
        Calculator::TrueDip { apparent, angle } => ("true dip (deg)", geocalc::true_dip(apparent, angle)?),
        Calculator::Porosity { pore, total } => ("porosity (%)", geocalc::porosity(pore, total)?),
        Calculator::Thickness { measured, dip } => ("true thickness", geocalc::true_thickness(measured, dip)?),
        Calculator::Slope { rise, run } => ("slope gradient (%)", geocalc::slope_gradient(rise, run)?),
        Calculator::Phi { size_mm } => ("phi", geocalc::phi_from_mm(size_mm)?),
    };
    println!("{label}: {value:.4}");
    Ok(())
}

fn main() -> Result<()> {
    let args = Args::parse();
    let _guard = logging::init(args.verbose, args.log_dir.as_deref())?;

    match args.command {
        Command::Run {
            input,
            mode,
            scheme,
            fields,
            config,
            output_dir,
            precision,
        } => run(RunArgs {
            input,
            mode,
            scheme,
            fields,
            config,
            output_dir,
            precision,
        }),
        Command::Fields { scheme } => {
            list_fields(scheme);
            Ok(())
        }
        Command::Calc { calculator } => calc(calculator),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(config: Option<PathBuf>) -> RunArgs {
        RunArgs {
            input: PathBuf::from("samples.csv"),
            mode: None,
            scheme: None,
            fields: None,
            config,
            output_dir: PathBuf::from("out"),
            precision: None,
        }
    }

    /// Config file selecting direct mode, Pettijohn, a custom table and 3 decimals.
    fn config_file(dir: &Path) -> PathBuf {
        let path = dir.join("config.json");
        fs::write(
            &path,
            r#"{ "mode": "direct_qfl", "scheme": "pettijohn", "field_table": "from_config.json",
                 "export": { "precision": 3 } }"#,
        )
        .unwrap();
        path
    }

    #[test]
    fn config_file_values_apply_without_flags() {
        let dir = tempfile::tempdir().unwrap();
        let config = load_config(&args(Some(config_file(dir.path())))).unwrap();
        assert_eq!(config.mode, Some(InputMode::DirectQfl));
        assert_eq!(config.scheme, FieldScheme::Pettijohn1975);
        assert_eq!(config.field_table, Some(PathBuf::from("from_config.json")));
        assert_eq!(config.export.precision, Some(3));
    }

    #[test]
    fn flags_override_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let mut a = args(Some(config_file(dir.path())));
        a.mode = Some(ModeArg::Full);
        a.precision = Some(1);
        let config = load_config(&a).unwrap();
        assert_eq!(config.mode, Some(InputMode::FullMineral));
        assert_eq!(config.export.precision, Some(1));
        // Untouched values still come from the file.
        assert_eq!(config.scheme, FieldScheme::Pettijohn1975);
    }

    #[test]
    fn scheme_flag_drops_config_table_unless_fields_given() {
        let dir = tempfile::tempdir().unwrap();
        let mut a = args(Some(config_file(dir.path())));
        a.scheme = Some(SchemeArg::Dickinson);
        let config = load_config(&a).unwrap();
        assert_eq!(config.scheme, FieldScheme::Dickinson1983);
        assert_eq!(config.field_table, None);

        a.fields = Some(PathBuf::from("flag.json"));
        let config = load_config(&a).unwrap();
        assert_eq!(config.scheme, FieldScheme::Dickinson1983);
        assert_eq!(config.field_table, Some(PathBuf::from("flag.json")));
    }

    #[test]
    fn fields_flag_beats_config_table() {
        let dir = tempfile::tempdir().unwrap();
        let mut a = args(Some(config_file(dir.path())));
        a.fields = Some(PathBuf::from("flag.json"));
        let config = load_config(&a).unwrap();
        assert_eq!(config.field_table, Some(PathBuf::from("flag.json")));
    }

    #[test]
    fn defaults_without_config_and_invalid_flag_rejected() {
        let config = load_config(&args(None)).unwrap();
        assert_eq!(config, PipelineConfig::default());

        let mut a = args(None);
        a.precision = Some(40);
        assert!(load_config(&a).is_err());
    }
}
