//! Tool configuration with layered loading
//!
//! Configuration is loaded from multiple sources (lowest to highest priority):
//! 1. Compiled defaults
//! 2. `terrachem.ron` file (if exists)
//! 3. Environment variables prefixed with `TERRACHEM_`
//!
//! Command line flags override the result in `main`.
//!
//! Example environment variable: `TERRACHEM_REGISTRY__MAX_MATERIALS=64`

use std::path::PathBuf;

use anyhow::{Context, Result};
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use terrachem_core::RegistryConfig;

/// Main tool configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolConfig {
    /// Directories with material definitions, loaded in order
    pub material_dirs: Vec<PathBuf>,
    /// Zoom material shapes are prepared for
    pub zoom: i32,
    pub registry: RegistryConfig,
}

impl Default for ToolConfig {
    fn default() -> Self {
        Self {
            material_dirs: vec![PathBuf::from("assets/materials")],
            zoom: 5,
            registry: RegistryConfig::default(),
        }
    }
}

impl ToolConfig {
    /// Load configuration from `terrachem.ron` and the environment
    pub fn load() -> Result<Self> {
        Self::load_from("terrachem")
    }

    /// Load configuration with layered priority, reading the optional file `name`
    pub fn load_from(name: &str) -> Result<Self> {
        let defaults = RegistryConfig::default();
        let builder = Config::builder()
            // Layer 1: Compiled defaults
            .set_default("material_dirs", vec!["assets/materials"])?
            .set_default("zoom", 5_i64)?
            .set_default("registry.max_materials", defaults.max_materials as i64)?
            .set_default("registry.material_pattern", defaults.material_pattern)?
            .set_default("registry.shape_pattern", defaults.shape_pattern)?
            .set_default("registry.system_materials.vehicle", defaults.system_materials.vehicle)?
            .set_default("registry.system_materials.tunnel", defaults.system_materials.tunnel)?
            .set_default("registry.system_materials.water", defaults.system_materials.water)?
            .set_default("registry.system_materials.earth", defaults.system_materials.earth)?
            // Layer 2: Config file (optional, won't error if missing)
            .add_source(
                File::with_name(name)
                    .format(config::FileFormat::Ron)
                    .required(false),
            )
            // Layer 3: Environment variables (TERRACHEM_ZOOM, TERRACHEM_REGISTRY__MAX_MATERIALS, ...)
            .add_source(Environment::with_prefix("TERRACHEM").separator("__"));

        let config = builder.build().context("Failed to build configuration")?;

        config
            .try_deserialize()
            .context("Failed to deserialize configuration")
    }
}
