//! shapekit command line shell
//!
//! A headless host for the shapekit core: loads shape JSON into a
//! [`ShapeManager`], runs queries and scripted editing sessions against it
//! and prints the resulting JSON.

pub mod script;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use shapekit_core::{ManagerConfig, Region, ShapeJson, ShapeManager};
use std::fs;
use std::path::{Path, PathBuf};

/// shapekit CLI arguments
///
/// Examples:
///   shapekit roundtrip drawing.json
///   shapekit select drawing.json --region 0,0,100,100
///   shapekit paste drawing.json clipboard.json --constrain
///   shapekit --zoom 200 replay session.json --shapes drawing.json
#[derive(Parser, Debug)]
#[command(name = "shapekit", version, about = "Headless shell for the shapekit vector editor")]
pub struct Cli {
    /// JSON manager configuration file
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Zoom in percent, overriding the configuration
    #[arg(long, global = true)]
    pub zoom: Option<f64>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Load shapes and print them back as normalized JSON
    Roundtrip { shapes: PathBuf },
    /// Print the ids of the shapes a region selection would pick
    Select {
        shapes: PathBuf,
        /// Region as x,y,width,height in model units
        #[arg(long, value_parser = parse_region)]
        region: Region,
    },
    /// Paste the clipboard shapes into a drawing
    Paste {
        shapes: PathBuf,
        clipboard: PathBuf,
        /// Skip shapes that land entirely outside the surface
        #[arg(long)]
        constrain: bool,
    },
    /// Replay a script of editing steps
    Replay {
        script: PathBuf,
        /// Shapes to load before replaying
        #[arg(long)]
        shapes: Option<PathBuf>,
    },
}

#[derive(Debug, Serialize)]
struct PasteReport {
    /// False when some clipboard shapes were left out.
    complete: bool,
    shapes: Vec<ShapeJson>,
}

/// Parse `x,y,width,height`.
pub fn parse_region(value: &str) -> Result<Region, String> {
    let parts = value
        .split(',')
        .map(|part| part.trim().parse::<f64>())
        .collect::<Result<Vec<_>, _>>()
        .map_err(|err| format!("Invalid region '{value}': {err}"))?;
    match parts.as_slice() {
        &[x, y, width, height] => Ok(Region::new(x, y, width, height)),
        _ => Err(format!(
            "Invalid region '{value}', expected x,y,width,height"
        )),
    }
}

/// Load the configuration file if given, then apply flag overrides.
pub fn load_config(path: Option<&Path>, zoom: Option<f64>) -> Result<ManagerConfig> {
    let mut config = match path {
        Some(path) => {
            let text = fs::read_to_string(path)
                .with_context(|| format!("Failed to read config {}", path.display()))?;
            serde_json::from_str(&text)
                .with_context(|| format!("Invalid config {}", path.display()))?
        }
        None => ManagerConfig::default(),
    };
    if let Some(zoom) = zoom {
        config.zoom = zoom;
    }
    Ok(config)
}

fn read_records(path: &Path) -> Result<Vec<ShapeJson>> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("Failed to read shapes {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("Invalid shapes {}", path.display()))
}

fn load_shapes(manager: &mut ShapeManager, path: &Path) -> Result<()> {
    let records = read_records(path)?;
    let ids = manager
        .set_shapes_json(&records)
        .with_context(|| format!("Cannot load shapes from {}", path.display()))?;
    log::info!("Loaded {} shapes from {}", ids.len(), path.display());
    Ok(())
}

/// Run a parsed command and return what it prints.
pub fn run(cli: &Cli) -> Result<String> {
    let config = load_config(cli.config.as_deref(), cli.zoom)?;
    let mut manager = ShapeManager::new(config);

    match &cli.command {
        Command::Roundtrip { shapes } => {
            load_shapes(&mut manager, shapes)?;
            Ok(manager.to_json_string()?)
        }
        Command::Select { shapes, region } => {
            load_shapes(&mut manager, shapes)?;
            let ids = manager.shapes_in_region(region);
            Ok(serde_json::to_string(&ids)?)
        }
        Command::Paste {
            shapes,
            clipboard,
            constrain,
        } => {
            load_shapes(&mut manager, shapes)?;
            let clipboard = read_records(clipboard)?;
            let complete = manager.paste_shapes_json(&clipboard, *constrain)?;
            let report = PasteReport {
                complete,
                shapes: manager.shapes_json(),
            };
            Ok(serde_json::to_string_pretty(&report)?)
        }
        Command::Replay { script, shapes } => {
            if let Some(shapes) = shapes {
                load_shapes(&mut manager, shapes)?;
                manager.poll_events();
            }
            let text = fs::read_to_string(script)
                .with_context(|| format!("Failed to read script {}", script.display()))?;
            let steps = script::parse_script(&text)
                .with_context(|| format!("Invalid script {}", script.display()))?;
            let report = script::replay(&mut manager, &steps)
                .with_context(|| format!("Replay of {} failed", script.display()))?;
            Ok(serde_json::to_string_pretty(&report)?)
        }
    }
}
