//! Reaction dispatch
//!
//! A particle touching a landscape cell looks up its reaction in the matrix
//! and runs the matching handler. Handlers reach the world only through the
//! collaborator traits bundled in [`ReactionEnv`].

mod handlers;

use glam::{IVec2, Vec2};
use terrachem_simulation::{InteractionEvent, MaterialIndex, RuleKind};

use crate::matrix::{BuiltinReaction, ReactionRef};
use crate::registry::{MaterialRegistry, RuleState};
use crate::rng::ReactionRng;

use handlers::{HandlerKind, Reactor};

/// Landscape cell storage as seen by reaction handlers
pub trait Landscape {
    /// Material at a cell; [`terrachem_simulation::SKY`] for empty or out of bounds
    fn material_at(&self, pos: IVec2) -> MaterialIndex;

    /// Remove the material at a cell, leaving its background
    fn clear_at(&mut self, pos: IVec2);

    /// Settle a particle's material into the landscape at or near `pos`
    fn insert_material(&mut self, material: MaterialIndex, pos: IVec2);

    /// Where a settling particle would slide to, if anywhere
    fn find_slide_target(
        &self,
        pos: IVec2,
        gravity_sign: i32,
        density: i32,
        max_slide: i32,
    ) -> Option<IVec2>;

    /// Try to set fire at `pos`
    fn ignite(&mut self, pos: IVec2) -> bool;

    /// Let unsupported material around `pos` fall
    fn check_instability_near(&mut self, pos: IVec2);

    /// Create a loose particle of `material`
    fn spawn_particle(&mut self, material: MaterialIndex, pos: IVec2);
}

/// Cosmetic side effects
pub trait Effects {
    fn smoke(&mut self, pos: IVec2, intensity: i32);
    fn sound(&mut self, name: &str, pos: IVec2);
}

/// Effects sink that drops everything
pub struct NoEffects;

impl Effects for NoEffects {
    fn smoke(&mut self, _pos: IVec2, _intensity: i32) {}
    fn sound(&mut self, _name: &str, _pos: IVec2) {}
}

/// Opaque handle to a resolved script function
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ScriptHandle(pub u32);

/// Arguments of a script reaction; scripts may rewrite them in place
///
/// Velocities are encoded as hundredths.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ScriptParams {
    pub x: i32,
    pub y: i32,
    pub landscape_x: i32,
    pub landscape_y: i32,
    pub xdir: i32,
    pub ydir: i32,
    pub particle_material: MaterialIndex,
    pub landscape_material: MaterialIndex,
    pub event: i32,
}

impl ScriptParams {
    /// Positional form: x, y, landscape x, landscape y, xdir, ydir, particle, landscape, event
    pub fn to_array(&self) -> [i32; 9] {
        [
            self.x,
            self.y,
            self.landscape_x,
            self.landscape_y,
            self.xdir,
            self.ydir,
            self.particle_material,
            self.landscape_material,
            self.event,
        ]
    }
}

pub trait ScriptEngine {
    fn resolve_function(&self, name: &str) -> Option<ScriptHandle>;

    /// Run a resolved function; a truthy result removes the particle
    fn invoke(&mut self, handle: ScriptHandle, params: &mut ScriptParams) -> bool;
}

/// Script engine without any functions
pub struct NullScriptEngine;

impl ScriptEngine for NullScriptEngine {
    fn resolve_function(&self, _name: &str) -> Option<ScriptHandle> {
        None
    }

    fn invoke(&mut self, _handle: ScriptHandle, _params: &mut ScriptParams) -> bool {
        false
    }
}

/// Collaborators a reaction may touch, borrowed for one call
pub struct ReactionEnv<'w> {
    pub landscape: &'w mut dyn Landscape,
    pub effects: &'w mut dyn Effects,
    pub scripts: &'w mut dyn ScriptEngine,
    pub rng: &'w mut dyn ReactionRng,
    /// Direction of gravity along y: 1 down, -1 up, 0 none
    pub gravity_sign: i32,
}

impl<'w> ReactionEnv<'w> {
    pub fn new(
        landscape: &'w mut dyn Landscape,
        effects: &'w mut dyn Effects,
        scripts: &'w mut dyn ScriptEngine,
        rng: &'w mut dyn ReactionRng,
    ) -> Self {
        Self {
            landscape,
            effects,
            scripts,
            rng,
            gravity_sign: 1,
        }
    }

    pub fn with_gravity_sign(mut self, gravity_sign: i32) -> Self {
        self.gravity_sign = gravity_sign.signum();
        self
    }
}

/// A moving particle; handlers may move, stop or transmute it
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Particle {
    pub pos: IVec2,
    pub vel: Vec2,
    pub material: MaterialIndex,
}

impl Particle {
    pub fn new(material: MaterialIndex, pos: IVec2, vel: Vec2) -> Self {
        Self { pos, vel, material }
    }
}

/// The landscape cell a particle touches
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Contact {
    pub pos: IVec2,
    pub material: MaterialIndex,
}

impl Contact {
    pub fn new(material: MaterialIndex, pos: IVec2) -> Self {
        Self { pos, material }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ReactionOutcome {
    /// The particle is gone (absorbed, destroyed or turned into landscape)
    pub consumed: bool,
    /// Position, velocity or material of the particle were changed
    pub changed: bool,
}

impl MaterialRegistry {
    /// Run the reaction between a particle and the cell it touches
    ///
    /// Without a built matrix, for out of range materials or for rules still
    /// waiting on their script, nothing happens.
    pub fn react(
        &self,
        particle: &mut Particle,
        contact: Contact,
        event: InteractionEvent,
        env: &mut ReactionEnv<'_>,
    ) -> ReactionOutcome {
        let Some(reaction) = self.get_reaction(particle.material, contact.material) else {
            return ReactionOutcome::default();
        };

        let (kind, rule) = match reaction {
            ReactionRef::Builtin(builtin) => {
                let kind = match builtin {
                    BuiltinReaction::Convert => HandlerKind::Convert,
                    BuiltinReaction::Poof => HandlerKind::Poof,
                    BuiltinReaction::Corrode => HandlerKind::Corrode,
                    BuiltinReaction::Incinerate => HandlerKind::Incinerate,
                    BuiltinReaction::Insert => HandlerKind::Insert,
                };
                (kind, None)
            }
            ReactionRef::Custom { material, rule } => {
                let Some(custom) = self.custom_reaction(material, rule) else {
                    return ReactionOutcome::default();
                };
                let RuleState::Resolved(resolved) = &custom.state else {
                    log::debug!(
                        "Rejecting unresolved {:?} reaction of material {}",
                        custom.rule.kind,
                        material
                    );
                    return ReactionOutcome::default();
                };
                let kind = match custom.rule.kind {
                    RuleKind::Script => HandlerKind::Script,
                    RuleKind::Convert => HandlerKind::Convert,
                    RuleKind::Poof => HandlerKind::Poof,
                    RuleKind::Corrode => HandlerKind::Corrode,
                    RuleKind::Insert => HandlerKind::Insert,
                    RuleKind::None => HandlerKind::None,
                };
                (kind, Some((&custom.rule, resolved)))
            }
        };

        let mut reactor = Reactor {
            registry: self,
            rule,
            particle,
            contact,
            event,
            env,
            changed: false,
        };
        let consumed = reactor.run(kind);
        ReactionOutcome {
            consumed,
            changed: reactor.changed,
        }
    }
}
