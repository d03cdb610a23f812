//! Material reactions for terrachem
//!
//! - `archive`: where material definitions come from
//! - `registry`: loaded materials, shapes and name resolution
//! - `matrix`: the particle x landscape reaction table
//! - `interaction`: reaction dispatch and the collaborator traits it drives

pub mod archive;
pub mod config;
pub mod error;
pub mod interaction;
pub mod matrix;
pub mod registry;
pub mod rng;

pub use archive::{DirArchive, MaterialArchive, MemoryArchive};
pub use config::{RegistryConfig, SystemMaterialNames};
pub use error::{MaterialError, Result};
pub use interaction::{
    Contact, Effects, Landscape, NoEffects, NullScriptEngine, Particle, ReactionEnv,
    ReactionOutcome, ScriptEngine, ScriptHandle, ScriptParams,
};
pub use matrix::{BuiltinReaction, ReactionMatrix, ReactionRef};
pub use registry::{
    CustomReaction, Material, MaterialRegistry, ResolvedRule, RuleState, SystemMaterials,
};
pub use rng::ReactionRng;

// Re-export the data crate so callers need only one dependency
pub use terrachem_simulation as simulation;
