use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use terrachem::{ToolConfig, report};
use terrachem_core::{DirArchive, MaterialArchive, MaterialRegistry, RuleState};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Material directory to load (repeatable; replaces the configured list)
    #[arg(long = "materials")]
    materials: Vec<PathBuf>,

    /// Saved material enumeration to apply before building the matrix
    #[arg(long)]
    enumeration: Option<PathBuf>,

    /// Write the resulting material enumeration to this file
    #[arg(long)]
    save_enumeration: Option<PathBuf>,

    /// Zoom to prepare material shapes for
    #[arg(long)]
    zoom: Option<i32>,

    /// Print every populated reaction matrix cell
    #[arg(long)]
    dump_matrix: bool,

    /// Print material shapes and their coverage
    #[arg(long)]
    shapes: bool,

    /// Print the reaction for a PARTICLE:LANDSCAPE pair (repeatable)
    #[arg(long)]
    query: Vec<String>,
}

fn main() -> Result<()> {
    // Initialize logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let mut config = ToolConfig::load()?;
    if !args.materials.is_empty() {
        config.material_dirs = args.materials.clone();
    }
    if let Some(zoom) = args.zoom {
        config.zoom = zoom;
    }

    let archives = config
        .material_dirs
        .iter()
        .map(|dir| {
            DirArchive::open(dir)
                .with_context(|| format!("Failed to open material directory {}", dir.display()))
        })
        .collect::<Result<Vec<_>>>()?;
    let archive_refs: Vec<&dyn MaterialArchive> =
        archives.iter().map(|a| a as &dyn MaterialArchive).collect();

    let enumeration = args
        .enumeration
        .as_ref()
        .map(|path| {
            std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read enumeration {}", path.display()))
        })
        .transpose()?;

    let mut registry = MaterialRegistry::new();
    for archive in &archive_refs {
        registry
            .load(*archive, &config.registry)
            .with_context(|| format!("Failed to load materials from {}", archive.name()))?;
    }
    registry
        .load_enumeration(enumeration.as_deref())
        .context("Failed to apply material enumeration")?;
    registry
        .cross_map_materials(&config.registry)
        .context("Failed to build reaction matrix")?;

    let unbound = registry
        .iter()
        .flat_map(|(_, material)| &material.reactions)
        .filter(|custom| custom.state == RuleState::Unresolved)
        .count();
    if unbound > 0 {
        log::info!("{} script reactions stay unbound without a script engine", unbound);
    }

    let failed = registry.prepare_shapes_for_zoom(config.zoom);
    if !failed.is_empty() {
        log::warn!(
            "{} shapes not prepared for zoom {}: {}",
            failed.len(),
            config.zoom,
            failed.join(", ")
        );
    }

    print!("{}", report::materials(&registry));

    if args.dump_matrix {
        println!();
        print!("{}", report::matrix(&registry)?);
    }

    if args.shapes {
        println!();
        print!("{}", report::shapes(&registry));
    }

    for pair in &args.query {
        println!("{}", report::query(&registry, pair)?);
    }

    if let Some(path) = &args.save_enumeration {
        std::fs::write(path, registry.save_enumeration())
            .with_context(|| format!("Failed to write enumeration {}", path.display()))?;
        log::info!("Saved material enumeration to {}", path.display());
    }

    Ok(())
}
