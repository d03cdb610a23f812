//! Registry configuration

use serde::{Deserialize, Serialize};

/// Materials the rest of the simulation relies on, by name
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SystemMaterialNames {
    /// Generic solid used for vehicles and structures
    pub vehicle: String,
    /// Background material of dug out tunnels
    pub tunnel: String,
    pub water: String,
    /// Default ground material of the landscape
    pub earth: String,
}

impl Default for SystemMaterialNames {
    fn default() -> Self {
        Self {
            vehicle: "Vehicle".to_string(),
            tunnel: "Tunnel".to_string(),
            water: "Water".to_string(),
            earth: "Earth".to_string(),
        }
    }
}

/// How materials are found and validated
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistryConfig {
    /// Upper bound on loaded materials
    pub max_materials: usize,
    /// Archive entries holding material descriptors
    pub material_pattern: String,
    /// Archive entries holding material shapes
    pub shape_pattern: String,
    pub system_materials: SystemMaterialNames,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            max_materials: 125,
            material_pattern: "*.material.ron".to_string(),
            shape_pattern: "*.shape.ron".to_string(),
            system_materials: SystemMaterialNames::default(),
        }
    }
}

impl RegistryConfig {
    pub fn from_ron(source: &str) -> Result<Self, ron::error::SpannedError> {
        ron::from_str(source)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = RegistryConfig::default();
        assert_eq!(config.max_materials, 125);
        assert_eq!(config.material_pattern, "*.material.ron");
        assert_eq!(config.system_materials.earth, "Earth");
    }

    #[test]
    fn test_partial_ron_keeps_defaults() {
        let config =
            RegistryConfig::from_ron("(max_materials: 16, system_materials: (earth: \"Granite\"))")
                .unwrap();
        assert_eq!(config.max_materials, 16);
        assert_eq!(config.shape_pattern, "*.shape.ron");
        assert_eq!(config.system_materials.earth, "Granite");
        assert_eq!(config.system_materials.tunnel, "Tunnel");
    }

    #[test]
    fn test_ron_round_trip() {
        let config = RegistryConfig::default();
        let text = ron::to_string(&config).expect("serialize");
        assert_eq!(RegistryConfig::from_ron(&text).unwrap(), config);
    }
}
