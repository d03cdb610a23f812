//! Shared fixtures for terrachem-core integration tests
#![allow(dead_code)]

use std::cell::Cell;
use std::collections::{HashMap, VecDeque};

use glam::{IVec2, Vec2};
use terrachem_core::simulation::{InteractionEvent, MaterialDescriptor, MaterialIndex, SKY};
use terrachem_core::{
    Contact, Effects, Landscape, MaterialRegistry, MemoryArchive, Particle, ReactionEnv,
    ReactionOutcome, ReactionRng, RegistryConfig, ScriptEngine, ScriptHandle, ScriptParams,
};

/// Materials every session needs
pub const SYSTEM_MATERIALS: [&str; 4] = [
    r#"(name: "Vehicle", density: 100)"#,
    r#"(name: "Tunnel")"#,
    r#"(name: "Water", density: 25, extinguisher: 1)"#,
    r#"(name: "Earth", density: 50, dig_free: 1)"#,
];

/// Archive holding the system materials plus `extra` descriptors
pub fn archive_with(extra: &[&str]) -> MemoryArchive {
    let mut archive = MemoryArchive::new("fixture");
    for source in SYSTEM_MATERIALS.iter().chain(extra) {
        let descriptor = MaterialDescriptor::from_ron(source).expect("fixture descriptor parses");
        archive.insert(format!("{}.material.ron", descriptor.name), *source);
    }
    archive
}

/// Loaded and cross mapped registry
pub fn registry_with(extra: &[&str]) -> MaterialRegistry {
    let config = RegistryConfig::default();
    let mut registry = MaterialRegistry::new();
    registry
        .load(&archive_with(extra), &config)
        .expect("fixture loads");
    registry
        .cross_map_materials(&config)
        .expect("fixture cross maps");
    registry
}

pub fn index(registry: &MaterialRegistry, name: &str) -> MaterialIndex {
    registry
        .get(name)
        .unwrap_or_else(|| panic!("material {name} loaded"))
}

// ============================================================================
// Landscape
// ============================================================================

/// Sparse landscape; unset cells are sky
#[derive(Default)]
pub struct GridLandscape {
    cells: HashMap<IVec2, MaterialIndex>,
    pub slide_target: Option<IVec2>,
    pub ignite_succeeds: bool,
    pub last_slide_query: Cell<Option<(IVec2, i32, i32, i32)>>,
    pub cleared: Vec<IVec2>,
    pub inserted: Vec<(MaterialIndex, IVec2)>,
    pub ignited: Vec<IVec2>,
    pub instability_checks: Vec<IVec2>,
    pub spawned: Vec<(MaterialIndex, IVec2)>,
}

impl GridLandscape {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, pos: IVec2, material: MaterialIndex) {
        if material == SKY {
            self.cells.remove(&pos);
        } else {
            self.cells.insert(pos, material);
        }
    }
}

impl Landscape for GridLandscape {
    fn material_at(&self, pos: IVec2) -> MaterialIndex {
        self.cells.get(&pos).copied().unwrap_or(SKY)
    }

    fn clear_at(&mut self, pos: IVec2) {
        self.cleared.push(pos);
        self.cells.remove(&pos);
    }

    fn insert_material(&mut self, material: MaterialIndex, pos: IVec2) {
        self.inserted.push((material, pos));
        self.cells.insert(pos, material);
    }

    fn find_slide_target(
        &self,
        pos: IVec2,
        gravity_sign: i32,
        density: i32,
        max_slide: i32,
    ) -> Option<IVec2> {
        self.last_slide_query
            .set(Some((pos, gravity_sign, density, max_slide)));
        self.slide_target
    }

    fn ignite(&mut self, pos: IVec2) -> bool {
        self.ignited.push(pos);
        self.ignite_succeeds
    }

    fn check_instability_near(&mut self, pos: IVec2) {
        self.instability_checks.push(pos);
    }

    fn spawn_particle(&mut self, material: MaterialIndex, pos: IVec2) {
        self.spawned.push((material, pos));
    }
}

// ============================================================================
// Effects, RNG, scripts
// ============================================================================

#[derive(Default)]
pub struct RecordingEffects {
    pub smokes: Vec<(IVec2, i32)>,
    pub sounds: Vec<(String, IVec2)>,
}

impl Effects for RecordingEffects {
    fn smoke(&mut self, pos: IVec2, intensity: i32) {
        self.smokes.push((pos, intensity));
    }

    fn sound(&mut self, name: &str, pos: IVec2) {
        self.sounds.push((name.to_string(), pos));
    }
}

/// Replays fixed rolls; once exhausted every roll is the highest value
/// (so one-in-n chances fail)
#[derive(Default)]
pub struct ScriptedRng {
    rolls: VecDeque<u32>,
    pub requests: Vec<u32>,
}

impl ScriptedRng {
    pub fn new(rolls: &[u32]) -> Self {
        Self {
            rolls: rolls.iter().copied().collect(),
            requests: Vec::new(),
        }
    }
}

impl ReactionRng for ScriptedRng {
    fn uniform_below(&mut self, n: u32) -> u32 {
        self.requests.push(n);
        if n == 0 {
            return 0;
        }
        self.rolls.pop_front().unwrap_or(n - 1).min(n - 1)
    }
}

type ScriptFn = Box<dyn FnMut(&mut ScriptParams) -> bool>;

/// Script engine backed by closures
#[derive(Default)]
pub struct MapScriptEngine {
    names: HashMap<String, ScriptHandle>,
    functions: Vec<ScriptFn>,
    pub calls: Vec<(String, [i32; 9])>,
}

impl MapScriptEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_function(
        mut self,
        name: &str,
        function: impl FnMut(&mut ScriptParams) -> bool + 'static,
    ) -> Self {
        let handle = ScriptHandle(self.functions.len() as u32);
        self.names.insert(name.to_string(), handle);
        self.functions.push(Box::new(function));
        self
    }

    fn name_of(&self, handle: ScriptHandle) -> String {
        self.names
            .iter()
            .find(|(_, h)| **h == handle)
            .map(|(name, _)| name.clone())
            .unwrap_or_default()
    }
}

impl ScriptEngine for MapScriptEngine {
    fn resolve_function(&self, name: &str) -> Option<ScriptHandle> {
        self.names.get(name).copied()
    }

    fn invoke(&mut self, handle: ScriptHandle, params: &mut ScriptParams) -> bool {
        let name = self.name_of(handle);
        self.calls.push((name, params.to_array()));
        match self.functions.get_mut(handle.0 as usize) {
            Some(function) => function(params),
            None => false,
        }
    }
}

// ============================================================================
// World bundle
// ============================================================================

/// Everything a reaction may touch, owned in one place
pub struct TestWorld {
    pub landscape: GridLandscape,
    pub effects: RecordingEffects,
    pub scripts: MapScriptEngine,
    pub rng: ScriptedRng,
    pub gravity_sign: i32,
}

impl TestWorld {
    pub fn new(rolls: &[u32]) -> Self {
        Self {
            landscape: GridLandscape::new(),
            effects: RecordingEffects::default(),
            scripts: MapScriptEngine::new(),
            rng: ScriptedRng::new(rolls),
            gravity_sign: 1,
        }
    }

    pub fn react(
        &mut self,
        registry: &MaterialRegistry,
        particle: &mut Particle,
        contact: Contact,
        event: InteractionEvent,
    ) -> ReactionOutcome {
        let mut env = ReactionEnv::new(
            &mut self.landscape,
            &mut self.effects,
            &mut self.scripts,
            &mut self.rng,
        )
        .with_gravity_sign(self.gravity_sign);
        registry.react(particle, contact, event, &mut env)
    }
}

pub fn particle(material: MaterialIndex, x: i32, y: i32, vel: Vec2) -> Particle {
    Particle::new(material, IVec2::new(x, y), vel)
}
