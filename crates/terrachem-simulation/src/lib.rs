//! Material data for terrachem
//!
//! This crate provides the plain data types the reaction system works on:
//! - Material descriptors and density classification (MaterialDescriptor, DensityBand)
//! - Declarative reaction rules (ReactionRule, RuleKind, EventMask)
//! - Material shapes with zoom-dependent coverage (MaterialShape, Polygon)

mod materials;
mod reaction_rule;
mod shape;

pub use materials::{
    DensityBand, LIQUID_DENSITY, MaterialDescriptor, MaterialFlags, MaterialIndex, SKY, SKY_NAME,
    SOLID_DENSITY, density_liquid, density_semi_solid, density_solid,
};
pub use reaction_rule::{EventMask, InteractionEvent, ReactionRule, RuleKind, TargetKeyword};
pub use shape::{MaterialShape, Polygon, ShapeError};
