//! Declarative reaction rules attached to material descriptors
//!
//! Rules are parsed together with their material and name other materials
//! (targets, conversion results) that may not be loaded yet. The registry
//! resolves those names once every material is known.

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

/// What happened when a reaction is looked up
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum InteractionEvent {
    /// Particle asks whether it may occupy a cell before moving
    PositionCheck,
    /// Particle actively travels through space and hits the cell
    Move,
    /// A bulk mover (not a discrete particle) transfers material
    MassTransfer,
}

impl InteractionEvent {
    pub const ALL: [InteractionEvent; 3] = [
        InteractionEvent::PositionCheck,
        InteractionEvent::Move,
        InteractionEvent::MassTransfer,
    ];

    /// Stable numeric code handed to scripts
    pub fn code(self) -> i32 {
        match self {
            InteractionEvent::PositionCheck => 0,
            InteractionEvent::Move => 1,
            InteractionEvent::MassTransfer => 2,
        }
    }

    pub fn mask(self) -> EventMask {
        EventMask::from_bits_truncate(1 << self.code())
    }
}

bitflags! {
    /// Events a custom rule responds to
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
    #[serde(transparent)]
    pub struct EventMask: u32 {
        const POSITION_CHECK = 1 << 0;
        const MOVE = 1 << 1;
        const MASS_TRANSFER = 1 << 2;
    }
}

impl Default for EventMask {
    fn default() -> Self {
        EventMask::all()
    }
}

/// Handler selected by a custom rule
///
/// Ignition is deliberately absent: it only exists as a hardcoded reaction.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RuleKind {
    /// Calls a script function
    Script,
    /// Turns the particle into another material
    Convert,
    /// Annihilates particle and landscape cell
    Poof,
    /// Eats away the landscape cell
    Corrode,
    /// Settles the particle into the landscape
    Insert,
    /// Explicitly no reaction; overrides the defaults for its targets
    #[default]
    None,
}

/// Category keywords accepted in place of a material name
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TargetKeyword {
    All,
    Solid,
    SemiSolid,
    Background,
    Sky,
    Incendiary,
    Extinguisher,
    Inflammable,
    Corrosive,
    Corrode,
}

impl TargetKeyword {
    /// Case-insensitive keyword lookup, accepting the classic spellings
    pub fn parse(target: &str) -> Option<Self> {
        let keyword = match target.to_ascii_lowercase().as_str() {
            "all" => TargetKeyword::All,
            "solid" => TargetKeyword::Solid,
            "semisolid" => TargetKeyword::SemiSolid,
            "background" => TargetKeyword::Background,
            "sky" => TargetKeyword::Sky,
            "incendiary" | "incindiary" => TargetKeyword::Incendiary,
            "extinguisher" | "extinguishing" => TargetKeyword::Extinguisher,
            "inflammable" | "flammable" => TargetKeyword::Inflammable,
            "corrosive" => TargetKeyword::Corrosive,
            "corrode" | "corrodible" => TargetKeyword::Corrode,
            _ => return None,
        };
        Some(keyword)
    }
}

/// A custom reaction rule as written in a material descriptor
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReactionRule {
    pub kind: RuleKind,
    /// Material name or [`TargetKeyword`]
    pub target: String,
    /// Script function for [`RuleKind::Script`]
    pub script_func: String,
    pub exec_mask: EventMask,
    /// Install at (target, source) instead of (source, target)
    pub reverse: bool,
    /// Apply to the complement of the target set
    pub inverse: bool,
    /// Run the splash/slide check before reacting on move events
    pub check_slide: bool,
    pub depth: i32,
    pub convert_mat: String,
    /// Percent chance per corrosion attempt
    pub corrosion_rate: i32,
}

impl Default for ReactionRule {
    fn default() -> Self {
        Self {
            kind: RuleKind::None,
            target: String::new(),
            script_func: String::new(),
            exec_mask: EventMask::all(),
            reverse: false,
            inverse: false,
            check_slide: true,
            depth: 0,
            convert_mat: String::new(),
            corrosion_rate: 100,
        }
    }
}

impl ReactionRule {
    pub fn fires_on(&self, event: InteractionEvent) -> bool {
        self.exec_mask.contains(event.mask())
    }
}
