//! dxf2gcode - CLI tool to turn imported CAD curves into G-code programs.

use anyhow::{Context, Result};
use clap::Parser;
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use toolpath_core::{
    generate_program, prepare_curves, validate_curves, validate_gcode, CancelToken, Curve,
    GenerationSettings, Unit,
};

/// Generate G-code toolpaths from a JSON curve list.
#[derive(Parser, Debug)]
#[command(name = "dxf2gcode")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Input curve list (JSON)
    #[arg(short, long)]
    input: PathBuf,

    /// Generation settings (JSON); defaults are used when omitted
    #[arg(short, long)]
    settings: Option<PathBuf>,

    /// Output program path, or "-" for stdout
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Feed rate override
    #[arg(long)]
    feed: Option<f64>,

    /// Spindle speed override (RPM)
    #[arg(long)]
    speed: Option<u32>,

    /// Tool diameter override
    #[arg(long)]
    tool: Option<f64>,

    /// Unit override ("mm" or "inch")
    #[arg(long)]
    unit: Option<String>,

    /// Validate only, don't generate output
    #[arg(long)]
    validate: bool,

    /// Output the processed curve list as JSON
    #[arg(long)]
    debug: bool,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    let filter = if args.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let settings = load_settings(&args)?;
    for feature in settings.active_features() {
        info!("Enabled: {}", feature);
    }

    info!("Processing: {}", args.input.display());

    let curves = load_curves(&args.input)?;
    info!("Loaded {} curve(s)", curves.len());

    // Validate
    let validation = validate_curves(&curves)?;

    for warning in &validation.warnings {
        warn!("{}", warning);
    }

    for err in &validation.errors {
        error!("{}", err);
    }

    if !validation.passed {
        anyhow::bail!("Validation failed");
    }

    // Validate-only mode
    if args.validate {
        info!("Validation passed");
        return Ok(());
    }

    // Debug output
    if args.debug {
        let prepared = prepare_curves(&curves, &settings, &CancelToken::new())?;
        let json = serde_json::to_string_pretty(&prepared)?;
        println!("{}", json);
        return Ok(());
    }

    let program = generate_program(&curves, &settings)
        .with_context(|| format!("Failed to generate program for {}", args.input.display()))?;

    if !validate_gcode(&program.code()) {
        warn!("Generated program contains lines with unknown command words");
    }

    let output_path = args.output.clone().unwrap_or_else(|| {
        let mut path = args.input.clone();
        path.set_extension("nc");
        path
    });

    if output_path == Path::new("-") {
        println!("{}", program);
        return Ok(());
    }

    std::fs::write(&output_path, format!("{}\n", program))
        .with_context(|| format!("Failed to write {}", output_path.display()))?;

    info!(
        "Generated: {} ({} lines)",
        output_path.display(),
        program.len()
    );

    Ok(())
}

fn load_settings(args: &Args) -> Result<GenerationSettings> {
    let mut settings = match &args.settings {
        Some(path) => GenerationSettings::from_json_file(path)
            .with_context(|| format!("Failed to load settings from {}", path.display()))?,
        None => GenerationSettings::default(),
    };

    if let Some(feed) = args.feed {
        settings.feed_rate = feed;
    }
    if let Some(speed) = args.speed {
        settings.spindle_speed = speed;
    }
    if let Some(tool) = args.tool {
        settings.tool_diameter = tool;
    }
    if let Some(name) = &args.unit {
        settings.unit = match Unit::from_name(name) {
            Some(unit) => unit,
            None => anyhow::bail!("Unknown unit '{}' (expected mm or inch)", name),
        };
    }

    settings.validate().context("Invalid generation settings")?;
    Ok(settings)
}

fn load_curves(path: &Path) -> Result<Vec<Curve>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let curves: Vec<Curve> = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse curves in {}", path.display()))?;
    Ok(curves)
}
