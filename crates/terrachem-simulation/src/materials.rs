//! Material descriptors and density classification

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

use crate::reaction_rule::ReactionRule;

/// Index of a loaded material. Dense, zero based; [`SKY`] marks empty space.
pub type MaterialIndex = i32;

/// The "no material" pseudo index (sky, vacuum, void)
pub const SKY: MaterialIndex = -1;

/// Reserved material name that refers to [`SKY`] in conversion triggers
pub const SKY_NAME: &str = "Sky";

/// Densities at or above this are liquids (or heavier)
pub const LIQUID_DENSITY: i32 = 25;

/// Densities at or above this are solid
pub const SOLID_DENSITY: i32 = 50;

/// Coarse density classification used by target keywords and placement
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum DensityBand {
    /// Background and gases (density below [`LIQUID_DENSITY`])
    Gas,
    /// Flows, seeks level (water, oil, acid)
    Liquid,
    /// Stays put (earth, rock, sand heaps)
    Solid,
}

impl DensityBand {
    pub fn of(density: i32) -> Self {
        if density >= SOLID_DENSITY {
            DensityBand::Solid
        } else if density >= LIQUID_DENSITY {
            DensityBand::Liquid
        } else {
            DensityBand::Gas
        }
    }
}

pub fn density_solid(density: i32) -> bool {
    density >= SOLID_DENSITY
}

/// Liquids and solids both count as semi-solid
pub fn density_semi_solid(density: i32) -> bool {
    density >= LIQUID_DENSITY
}

pub fn density_liquid(density: i32) -> bool {
    DensityBand::of(density) == DensityBand::Liquid
}

bitflags! {
    /// Physical behaviour flags derived from a descriptor's strengths
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct MaterialFlags: u16 {
        const INFLAMMABLE = 1 << 0;
        const INCENDIARY = 1 << 1;
        const EXTINGUISHER = 1 << 2;
        const CORROSIVE = 1 << 3;
        const CORRODE = 1 << 4;
        const SOIL = 1 << 5;
        const INSTABLE = 1 << 6;
    }
}

/// Definition of a material's properties, as loaded from a `.material.ron` entry
///
/// Strength fields (`inflammable`, `corrosive`, ...) double as flags: zero means
/// the material lacks the property.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MaterialDescriptor {
    pub name: String,

    /// 0 = background, see [`DensityBand`]
    pub density: i32,
    pub friction: i32,
    pub dig_free: i32,
    pub blast_free: i32,
    pub instable: i32,
    pub max_air_speed: i32,
    /// Distance a settling particle may slide sideways
    pub max_slide: i32,
    pub wind_drift: i32,

    // Chemistry
    pub inflammable: i32,
    pub incendiary: i32,
    pub extinguisher: i32,
    /// Corrosion strength in percent
    pub corrosive: i32,
    /// Corrodibility in percent
    pub corrode: i32,
    pub soil: i32,

    /// Landscape generation weight, derived when left at 0
    pub placement: i32,

    /// Name of the material shape used to draw chunks of this material
    pub shape_texture: String,
    pub blast_shift_to: String,

    // In-place conversion (e.g. snow melting in water)
    pub in_mat_convert: String,
    pub in_mat_convert_to: String,
    pub in_mat_convert_depth: i32,

    // Temperature conversion
    pub above_temp_convert: i32,
    pub above_temp_convert_dir: i32,
    pub above_temp_convert_to: String,
    pub below_temp_convert: i32,
    pub below_temp_convert_dir: i32,
    pub below_temp_convert_to: String,
    pub temp_conv_strength: i32,

    pub min_height_count: i32,
    /// 1-in-N chance to splash on rough contact; 0 never splashes
    pub splash_rate: i32,

    /// Custom reaction rules, applied in order on top of the hardcoded defaults
    pub reactions: Vec<ReactionRule>,
}

impl Default for MaterialDescriptor {
    fn default() -> Self {
        Self {
            name: String::new(),
            density: 0,
            friction: 0,
            dig_free: 0,
            blast_free: 0,
            instable: 0,
            max_air_speed: 0,
            max_slide: 0,
            wind_drift: 0,
            inflammable: 0,
            incendiary: 0,
            extinguisher: 0,
            corrosive: 0,
            corrode: 0,
            soil: 0,
            placement: 0,
            shape_texture: String::new(),
            blast_shift_to: String::new(),
            in_mat_convert: String::new(),
            in_mat_convert_to: String::new(),
            in_mat_convert_depth: 0,
            above_temp_convert: 0,
            above_temp_convert_dir: 0,
            above_temp_convert_to: String::new(),
            below_temp_convert: 0,
            below_temp_convert_dir: 0,
            below_temp_convert_to: String::new(),
            temp_conv_strength: 0,
            min_height_count: 0,
            splash_rate: 10,
            reactions: Vec::new(),
        }
    }
}

impl MaterialDescriptor {
    /// Parse a descriptor from RON source and fill in derived defaults
    pub fn from_ron(source: &str) -> Result<Self, ron::error::SpannedError> {
        let mut descriptor: MaterialDescriptor = ron::from_str(source)?;
        descriptor.apply_placement_default();
        Ok(descriptor)
    }

    pub fn to_ron(&self) -> Result<String, ron::Error> {
        ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())
    }

    /// Derive a placement weight when none was given
    fn apply_placement_default(&mut self) {
        if self.placement != 0 {
            return;
        }
        self.placement = match self.density_band() {
            DensityBand::Solid => {
                let mut placement = 30;
                if self.dig_free == 0 {
                    placement += 20;
                }
                if self.blast_free == 0 {
                    placement += 10;
                }
                placement
            }
            DensityBand::Liquid => 10,
            DensityBand::Gas => 5,
        };
    }

    pub fn density_band(&self) -> DensityBand {
        DensityBand::of(self.density)
    }

    pub fn is_background(&self) -> bool {
        self.density == 0
    }

    pub fn flags(&self) -> MaterialFlags {
        let mut flags = MaterialFlags::empty();
        flags.set(MaterialFlags::INFLAMMABLE, self.inflammable != 0);
        flags.set(MaterialFlags::INCENDIARY, self.incendiary != 0);
        flags.set(MaterialFlags::EXTINGUISHER, self.extinguisher != 0);
        flags.set(MaterialFlags::CORROSIVE, self.corrosive != 0);
        flags.set(MaterialFlags::CORRODE, self.corrode != 0);
        flags.set(MaterialFlags::SOIL, self.soil != 0);
        flags.set(MaterialFlags::INSTABLE, self.instable != 0);
        flags
    }

    /// Case-insensitive name comparison, the way material names are matched everywhere
    pub fn is_named(&self, name: &str) -> bool {
        self.name.eq_ignore_ascii_case(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reaction_rule::RuleKind;

    #[test]
    fn test_density_bands() {
        assert_eq!(DensityBand::of(0), DensityBand::Gas);
        assert_eq!(DensityBand::of(24), DensityBand::Gas);
        assert_eq!(DensityBand::of(25), DensityBand::Liquid);
        assert_eq!(DensityBand::of(49), DensityBand::Liquid);
        assert_eq!(DensityBand::of(50), DensityBand::Solid);

        assert!(density_semi_solid(25));
        assert!(density_semi_solid(50));
        assert!(!density_semi_solid(24));
        assert!(density_liquid(30));
        assert!(!density_liquid(50));
        assert!(density_solid(100));
    }

    #[test]
    fn test_parse_minimal_descriptor() {
        let water = MaterialDescriptor::from_ron(r#"(name: "Water", density: 25, extinguisher: 1)"#)
            .expect("valid descriptor");

        assert_eq!(water.name, "Water");
        assert_eq!(water.density, 25);
        assert_eq!(water.splash_rate, 10);
        assert_eq!(water.placement, 10);
        assert!(water.flags().contains(MaterialFlags::EXTINGUISHER));
        assert!(!water.flags().contains(MaterialFlags::INFLAMMABLE));
        assert!(water.reactions.is_empty());
    }

    #[test]
    fn test_placement_defaults() {
        let rock = MaterialDescriptor::from_ron(r#"(name: "Rock", density: 50)"#).unwrap();
        assert_eq!(rock.placement, 60);

        let earth =
            MaterialDescriptor::from_ron(r#"(name: "Earth", density: 50, dig_free: 1)"#).unwrap();
        assert_eq!(earth.placement, 40);

        let gas = MaterialDescriptor::from_ron(r#"(name: "Tunnel")"#).unwrap();
        assert_eq!(gas.placement, 5);

        let explicit =
            MaterialDescriptor::from_ron(r#"(name: "Gold", density: 50, placement: 7)"#).unwrap();
        assert_eq!(explicit.placement, 7);
    }

    #[test]
    fn test_parse_descriptor_with_reactions() {
        let acid = MaterialDescriptor::from_ron(
            r#"(
                name: "Acid",
                density: 25,
                corrosive: 80,
                reactions: [
                    (kind: Corrode, target: "Corrode", corrosion_rate: 30),
                    (kind: Convert, target: "Sky", convert_mat: "Smoke", reverse: true),
                ],
            )"#,
        )
        .unwrap();

        assert_eq!(acid.reactions.len(), 2);
        assert_eq!(acid.reactions[0].kind, RuleKind::Corrode);
        assert_eq!(acid.reactions[0].corrosion_rate, 30);
        assert!(acid.reactions[1].reverse);
        assert!(acid.reactions[1].check_slide);
    }

    #[test]
    fn test_malformed_descriptor_fails() {
        assert!(MaterialDescriptor::from_ron("(name: \"Broken\", density: )").is_err());
        assert!(MaterialDescriptor::from_ron("(density: \"heavy\")").is_err());
    }

    #[test]
    fn test_names_are_case_insensitive() {
        let sand = MaterialDescriptor {
            name: "Sand".to_string(),
            ..Default::default()
        };
        assert!(sand.is_named("sand"));
        assert!(sand.is_named("SAND"));
        assert!(!sand.is_named("Sandstone"));
    }

    #[test]
    fn test_ron_round_trip_keeps_rules() {
        let snow = MaterialDescriptor::from_ron(
            r#"(name: "Snow", density: 25, in_mat_convert: "Water", in_mat_convert_to: "Water")"#,
        )
        .unwrap();
        let text = snow.to_ron().expect("serialize");
        let back = MaterialDescriptor::from_ron(&text).unwrap();
        assert_eq!(snow, back);
    }
}
