//! Plain text reports about a loaded material set

use std::fmt::Write;

use anyhow::{Context, Result, bail};
use terrachem_core::MaterialRegistry;
use terrachem_core::simulation::{MaterialFlags, MaterialIndex, SKY, SKY_NAME};

fn material_name(registry: &MaterialRegistry, index: MaterialIndex) -> &str {
    if index == SKY {
        return SKY_NAME;
    }
    registry.material(index).map_or("?", |m| m.name())
}

fn flag_names(flags: MaterialFlags) -> String {
    let names: Vec<&str> = flags.iter_names().map(|(name, _)| name).collect();
    if names.is_empty() {
        "-".to_string()
    } else {
        names.join(",").to_lowercase()
    }
}

/// One line per material: index, name, density band, placement, flags, shape
pub fn materials(registry: &MaterialRegistry) -> String {
    let mut out = String::new();
    for (index, material) in registry.iter() {
        let descriptor = &material.descriptor;
        let _ = writeln!(
            out,
            "{:>3} {:<12} {:>3} {:<7} placement {:>3}  {}{}",
            index,
            material.name(),
            descriptor.density,
            format!("{:?}", descriptor.density_band()),
            descriptor.placement,
            flag_names(descriptor.flags()),
            material
                .custom_shape
                .as_deref()
                .map(|shape| format!("  shape {shape}"))
                .unwrap_or_default(),
        );
    }
    out
}

/// Every populated matrix cell, particle material first
pub fn matrix(registry: &MaterialRegistry) -> Result<String> {
    let matrix = registry
        .matrix()
        .context("Reaction matrix has not been built")?;
    let mut entries: Vec<_> = matrix.entries().collect();
    entries.sort_by_key(|(particle, landscape, _)| (*particle, *landscape));

    let mut out = String::new();
    for (particle, landscape, reaction) in entries {
        let _ = writeln!(
            out,
            "{:<12} -> {:<12} {}",
            material_name(registry, particle),
            material_name(registry, landscape),
            registry.reaction_name(reaction),
        );
    }
    Ok(out)
}

/// Reaction for a single "Particle:Landscape" pair
pub fn query(registry: &MaterialRegistry, pair: &str) -> Result<String> {
    let Some((particle, landscape)) = pair.split_once(':') else {
        bail!("Expected PARTICLE:LANDSCAPE, got \"{pair}\"");
    };
    let resolve = |name: &str| -> Result<MaterialIndex> {
        if name.eq_ignore_ascii_case(SKY_NAME) {
            return Ok(SKY);
        }
        registry
            .get(name)
            .with_context(|| format!("Unknown material \"{name}\""))
    };
    let p = resolve(particle.trim())?;
    let l = resolve(landscape.trim())?;
    let reaction = registry
        .get_reaction(p, l)
        .map_or_else(|| "none".to_string(), |r| registry.reaction_name(r));
    Ok(format!(
        "{} -> {}: {}",
        material_name(registry, p),
        material_name(registry, l),
        reaction
    ))
}

/// Shape sizes and coverage at the prepared zoom
pub fn shapes(registry: &MaterialRegistry) -> String {
    let mut out = String::new();
    for (name, shape) in registry.shapes() {
        let cells: usize = shape.polygons.iter().map(|p| p.coverage.len()).sum();
        let _ = writeln!(
            out,
            "{:<12} {}x{} polygons {} overlap {}/{}/{}/{} zoom {} cells {}",
            name,
            shape.width,
            shape.height,
            shape.polygons.len(),
            shape.overlap_left,
            shape.overlap_top,
            shape.overlap_right,
            shape.overlap_bottom,
            shape.prepared_for_zoom,
            cells,
        );
    }
    let max = registry.max_shape_size();
    let _ = writeln!(out, "max polygon size {}x{}", max.x, max.y);
    out
}
