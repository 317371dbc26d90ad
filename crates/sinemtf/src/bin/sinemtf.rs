//! sinemtf CLI: generate sine MTF charts and analyze photographs of them.

use clap::{Args, Parser, Subcommand};
use sinemtf::aruco::builtins::{builtin_dictionary, DEFAULT_DICTIONARY};
use sinemtf::aruco::Dictionary;
use sinemtf::core::ChartDescription;
use sinemtf::print::BlankText;
use sinemtf::{generate_chart, run_analysis, AnalyzeConfig, ChartSpec};
use std::path::{Path, PathBuf};

type CliError = Box<dyn std::error::Error>;
type CliResult<T> = Result<T, CliError>;

#[derive(Parser)]
#[command(name = "sinemtf")]
#[command(about = "Sine-chart MTF measurement: chart generation and photo analysis")]
#[command(version)]
struct Cli {
    /// Log debug output from every pipeline stage.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Render a chart bitmap and its description from a chart spec.
    Generate(GenerateArgs),

    /// Measure MTF in a photograph described by an analysis config.
    Analyze {
        /// Analysis config (JSON). Relative paths inside are resolved
        /// against the config's directory.
        #[arg(long)]
        config: PathBuf,
    },

    /// Print a summary of a chart description.
    Describe {
        #[arg(long)]
        description: PathBuf,
    },
}

#[derive(Debug, Clone, Args)]
struct GenerateArgs {
    /// Chart spec (JSON).
    #[arg(long)]
    spec: PathBuf,

    /// Output chart bitmap (PNG).
    #[arg(long)]
    out_png: PathBuf,

    /// Output chart description (JSON).
    #[arg(long)]
    out_json: PathBuf,

    /// Built-in dictionary (DICT_4X4_50, DICT_4X4_100) or a path to a
    /// dictionary JSON file. Other dictionaries, such as DICT_5X5_100, must be
    /// given as JSON.
    #[arg(long, default_value = DEFAULT_DICTIONARY)]
    dictionary: String,
}

fn main() -> CliResult<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Generate(args) => run_generate(&args),
        Commands::Analyze { config } => run_analyze(&config),
        Commands::Describe { description } => run_describe(&description),
    }
}

fn init_logging(verbose: bool) {
    #[cfg(feature = "tracing")]
    {
        let _ = verbose;
        let _ = tracing_log::LogTracer::init();
        sinemtf::core::init_tracing(false);
    }
    #[cfg(not(feature = "tracing"))]
    {
        let level = if verbose {
            log::LevelFilter::Debug
        } else {
            log::LevelFilter::Info
        };
        let _ = sinemtf::core::init_with_level(level);
    }
}

// ── generate ───────────────────────────────────────────────────────────

fn load_dictionary(name_or_path: &str) -> CliResult<Dictionary> {
    if let Some(dict) = builtin_dictionary(name_or_path) {
        return Ok(dict);
    }
    let path = Path::new(name_or_path);
    if path.exists() {
        return Ok(Dictionary::load_json(path)?);
    }
    Err(format!("unknown dictionary `{name_or_path}` (not built in, no such file)").into())
}

fn run_generate(args: &GenerateArgs) -> CliResult<()> {
    let spec = ChartSpec::load_json(&args.spec)?;
    let dictionary = load_dictionary(&args.dictionary)?;
    let chart = generate_chart(&spec, &dictionary, &BlankText)?;
    chart.write(&args.out_png, &args.out_json)?;
    println!(
        "chart {}x{} px ({:.1} x {:.1} mm) -> {}, {}",
        chart.description.total_size_px.w,
        chart.description.total_size_px.h,
        chart.description.total_size_mm.w,
        chart.description.total_size_mm.h,
        args.out_png.display(),
        args.out_json.display()
    );
    Ok(())
}

// ── analyze ────────────────────────────────────────────────────────────

fn run_analyze(config_path: &Path) -> CliResult<()> {
    let mut config = AnalyzeConfig::load_json(config_path)?;
    if let Some(dir) = config_path.parent() {
        config.resolve_paths(dir);
    }
    let analysis = run_analysis(&config)?;

    let d = &analysis.report.diagnostics;
    println!(
        "fiducial {}: scale {:.4}, rotation {:.2}°, fit rms {:.3} px",
        analysis.fiducial_id,
        d.scale,
        d.rotation_rad.to_degrees(),
        d.rms_residual_px
    );
    println!(
        "reference: common {:.4}, differential {:.4}",
        analysis.report.modes.common, analysis.report.modes.differential
    );
    for r in &analysis.report.results {
        println!("{:>8.2} lp/mm  MTF {:.4}", r.lpmm, r.mtf);
    }
    if config.output_path.is_none() {
        println!("{}", serde_json::to_string_pretty(&analysis)?);
    }
    Ok(())
}

// ── describe ───────────────────────────────────────────────────────────

fn run_describe(path: &Path) -> CliResult<()> {
    let d = ChartDescription::load_json(path)?;
    d.validate()?;
    println!("chart description {}", path.display());
    println!(
        "  size:        {} x {} px, {:.2} x {:.2} mm",
        d.total_size_px.w, d.total_size_px.h, d.total_size_mm.w, d.total_size_mm.h
    );
    if let Some(dpi) = d.dpi {
        println!("  dpi:         {dpi}");
    }
    println!(
        "  fiducial:    id {} in {}, {:.3} mm wide",
        d.fiducial.id,
        d.dictionary.as_deref().unwrap_or("unknown dictionary"),
        d.fiducial.physical_width_mm
    );
    let list: Vec<String> = d
        .sine_block
        .frequencies_lpmm
        .iter()
        .map(|f| format!("{f}"))
        .collect();
    println!("  frequencies: {} lp/mm", list.join(", "));
    let pitch = d.fiducial.pixel_pitch_mm();
    for (lpmm, tile) in d.sine_block.tiles() {
        let period_px = 1.0 / (lpmm * pitch);
        println!(
            "    {lpmm:>6.2} lp/mm: {:.0} x {:.0} px, {period_px:.2} px per period",
            tile.width, tile.height
        );
    }
    Ok(())
}
