// Copyright Catenary Transit Initiatives
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::fs;
use std::path::{Path, PathBuf};
use towerline::assembler::{AssemblyOutput, assemble};
use towerline::config::CableSettings;
use towerline::context::SceneSnapshot;
use towerline::elevation::NoTerrain;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Scene snapshot exported by the viewer (JSON)
    #[arg(long)]
    scene: PathBuf,
    /// Cable settings (JSON); defaults apply when omitted
    #[arg(long, env = "TOWERLINE_SETTINGS")]
    settings: Option<PathBuf>,
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print counts per span source and every skipped element
    Summary,
    /// Write the full pass output as JSON
    Export {
        #[arg(long)]
        output: PathBuf,
    },
}

fn load_scene(path: &Path) -> Result<SceneSnapshot> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("Failed to read scene {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("Failed to parse scene {}", path.display()))
}

fn print_summary(output: &AssemblyOutput) {
    let explicit = output
        .paths
        .iter()
        .filter(|p| p.source == towerline::models::SpanSource::Explicit)
        .count();
    println!("towers placed:   {}", output.poses.len());
    println!("cables:          {}", output.paths.len());
    println!("  explicit:      {}", explicit);
    println!("  inferred:      {}", output.paths.len() - explicit);
    println!("skipped:         {}", output.skipped.len());
    for item in &output.skipped {
        println!("  {:?} {}: {}", item.kind, item.id, item.reason);
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt::init();

    let scene = load_scene(&args.scene)?;
    let settings = match &args.settings {
        Some(path) => CableSettings::from_path(path).context("Failed to load cable settings")?,
        None => CableSettings::default(),
    };

    let ctx = scene.context(&settings, &NoTerrain);
    let output = assemble(&scene.towers, &scene.spans, &ctx);

    match args.command.unwrap_or(Commands::Summary) {
        Commands::Summary => print_summary(&output),
        Commands::Export { output: path } => {
            let json = serde_json::to_string_pretty(&output).context("Failed to serialize output")?;
            fs::write(&path, json)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            println!("wrote {} cables to {}", output.paths.len(), path.display());
        }
    }

    Ok(())
}
