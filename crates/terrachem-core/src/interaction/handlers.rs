//! Reaction handlers
//!
//! Each handler returns whether the particle was consumed. Builtin reactions
//! carry no rule; custom ones pass through the user check first.

use glam::{IVec2, Vec2};
use terrachem_simulation::{InteractionEvent, ReactionRule};

use super::{Contact, Particle, ReactionEnv, ScriptParams};
use crate::registry::{MaterialRegistry, ResolvedRule};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(super) enum HandlerKind {
    Convert,
    Poof,
    Corrode,
    Incinerate,
    Insert,
    Script,
    None,
}

pub(super) struct Reactor<'a, 'w> {
    pub registry: &'a MaterialRegistry,
    /// Custom rule and its resolution; `None` for builtin reactions
    pub rule: Option<(&'a ReactionRule, &'a ResolvedRule)>,
    pub particle: &'a mut Particle,
    pub contact: Contact,
    pub event: InteractionEvent,
    pub env: &'a mut ReactionEnv<'w>,
    pub changed: bool,
}

impl Reactor<'_, '_> {
    pub fn run(&mut self, kind: HandlerKind) -> bool {
        match kind {
            HandlerKind::Convert => self.convert(),
            HandlerKind::Poof => self.poof(),
            HandlerKind::Corrode => self.corrode(),
            HandlerKind::Incinerate => self.incinerate(),
            HandlerKind::Insert => self.insert(),
            HandlerKind::Script => self.script(),
            HandlerKind::None => false,
        }
    }

    fn is_builtin(&self) -> bool {
        self.rule.is_none()
    }

    /// Splash and slide physics before a particle settles
    ///
    /// Returns true when the particle may settle here; false when it bounced
    /// or slid and keeps existing.
    fn insertion_check(&mut self) -> bool {
        self.changed = true;

        let (splash_rate, incendiary, density, max_slide) = self
            .registry
            .material(self.particle.material)
            .map_or((0, false, 0, 0), |m| {
                let d = &m.descriptor;
                (d.splash_rate, d.incendiary != 0, d.density, d.max_slide)
            });
        let rng = &mut *self.env.rng;
        let particle = &mut *self.particle;

        // Rough contact may splash
        if particle.vel.y > 1.0 && rng.one_in(splash_rate.max(0) as u32) {
            particle.vel.y = -particle.vel.y / 8.0;
            particle.vel.x = particle.vel.x / 8.0 + rng.offset_below(-100, 200) as f32 / 100.0;
            if particle.vel.y != 0.0 {
                return false;
            }
        }

        particle.vel.y = 0.0;

        if incendiary && rng.one_in(25) {
            let intensity = 4 + rng.uniform_below(3) as i32;
            self.env.effects.smoke(particle.pos, intensity);
        }

        let Some(target) = self.env.landscape.find_slide_target(
            particle.pos,
            self.env.gravity_sign,
            density,
            max_slide,
        ) else {
            return true;
        };

        if particle.material == self.contact.material {
            particle.pos = target;
            particle.vel.x = 0.0;
            return false;
        }

        let dx = target.x - particle.pos.x;
        particle.vel.x =
            (particle.vel.x * 10.0 + dx.signum() as f32) / 11.0 + rng.offset_below(-2, 5) as f32 / 10.0;
        if dx.abs() <= (particle.vel.x.trunc() as i32).abs() {
            particle.pos = target;
            if particle.vel.y <= 0.0 {
                particle.vel.x = 0.0;
            }
        }
        false
    }

    /// Event mask and optional slide check of custom rules
    fn user_check(&mut self) -> bool {
        let Some((rule, _)) = self.rule else {
            return true;
        };
        if !rule.fires_on(self.event) {
            return false;
        }
        if rule.check_slide && self.event == InteractionEvent::Move && !self.insertion_check() {
            return false;
        }
        true
    }

    /// Builtin reactions settle first; custom ones already ran their user check
    fn builtin_insertion_check(&mut self) -> bool {
        !self.is_builtin() || self.insertion_check()
    }

    fn convert(&mut self) -> bool {
        if !self.user_check() {
            return false;
        }
        match self.event {
            // Builtin conversions only trigger from inside a material
            InteractionEvent::Move if self.is_builtin() => false,
            InteractionEvent::PositionCheck | InteractionEvent::Move => {
                let (depth, target) = match self.rule {
                    Some((rule, resolved)) => (rule.depth, resolved.convert_to),
                    None => self
                        .registry
                        .material(self.particle.material)
                        .map_or((0, None), |m| (m.descriptor.in_mat_convert_depth, m.in_mat_convert_to)),
                };
                let above = self.particle.pos - IVec2::new(0, depth);
                if depth == 0 || self.env.landscape.material_at(above) == self.contact.material {
                    let Some(target) = target else {
                        // Nothing to turn into: the particle is gone
                        return true;
                    };
                    self.particle.material = target;
                    self.particle.vel = Vec2::ZERO;
                    self.changed = true;
                }
                false
            }
            InteractionEvent::MassTransfer => {
                self.env
                    .landscape
                    .spawn_particle(self.particle.material, self.particle.pos);
                true
            }
        }
    }

    fn annihilate(&mut self) -> bool {
        self.env.landscape.clear_at(self.contact.pos);
        if self.env.rng.one_in(3) {
            self.env.effects.smoke(self.particle.pos, 3);
        }
        if self.env.rng.one_in(3) {
            self.env.effects.sound("Pshshsh", self.particle.pos);
        }
        true
    }

    fn poof(&mut self) -> bool {
        if !self.user_check() {
            return false;
        }
        match self.event {
            InteractionEvent::PositionCheck | InteractionEvent::MassTransfer => self.annihilate(),
            InteractionEvent::Move => self.builtin_insertion_check() && self.annihilate(),
        }
    }

    fn corrosion_roll(&mut self) -> bool {
        let d100 = self.env.rng.uniform_below(100) as i32;
        match self.rule {
            Some((rule, _)) => d100 < rule.corrosion_rate,
            None => {
                let corrosive = self
                    .registry
                    .material(self.particle.material)
                    .map_or(0, |m| m.descriptor.corrosive);
                let corrode = self
                    .registry
                    .material(self.contact.material)
                    .map_or(0, |m| m.descriptor.corrode);
                d100 < corrosive && d100 < corrode
            }
        }
    }

    fn corrosion_effects(&mut self) {
        if self.env.rng.one_in(5) {
            let intensity = 3 + self.env.rng.uniform_below(3) as i32;
            self.env.effects.smoke(self.particle.pos, intensity);
        }
        if self.env.rng.one_in(20) {
            self.env.effects.sound("Corrode", self.particle.pos);
        }
    }

    fn corrode(&mut self) -> bool {
        if !self.user_check() {
            return false;
        }
        match self.event {
            // Corroding before every move would be far too effective
            InteractionEvent::PositionCheck => false,
            InteractionEvent::MassTransfer => {
                if !self.corrosion_roll() {
                    return false;
                }
                self.env.landscape.clear_at(self.contact.pos);
                self.corrosion_effects();
                true
            }
            InteractionEvent::Move => {
                if !self.builtin_insertion_check() {
                    return false;
                }
                if self.corrosion_roll() {
                    self.env.landscape.clear_at(self.contact.pos);
                    self.env.landscape.check_instability_near(self.contact.pos);
                    self.corrosion_effects();
                } else {
                    self.settle();
                }
                true
            }
        }
    }

    fn incinerate(&mut self) -> bool {
        match self.event {
            InteractionEvent::PositionCheck | InteractionEvent::MassTransfer => {
                self.env.landscape.ignite(self.particle.pos)
            }
            InteractionEvent::Move => {
                if !self.insertion_check() {
                    return false;
                }
                if !self.env.landscape.ignite(self.particle.pos) {
                    self.settle();
                }
                true
            }
        }
    }

    fn insert(&mut self) -> bool {
        if !self.user_check() {
            return false;
        }
        match self.event {
            InteractionEvent::Move => {
                if !self.builtin_insertion_check() {
                    return false;
                }
                self.settle();
                true
            }
            InteractionEvent::PositionCheck | InteractionEvent::MassTransfer => false,
        }
    }

    fn settle(&mut self) {
        self.env
            .landscape
            .insert_material(self.particle.material, self.particle.pos);
    }

    fn script(&mut self) -> bool {
        if !self.user_check() {
            return false;
        }
        let Some(handle) = self.rule.and_then(|(_, resolved)| resolved.script) else {
            return false;
        };

        let particle = &mut *self.particle;
        let xdir = (particle.vel.x * 100.0) as i32;
        let ydir = (particle.vel.y * 100.0) as i32;
        let mut params = ScriptParams {
            x: particle.pos.x,
            y: particle.pos.y,
            landscape_x: self.contact.pos.x,
            landscape_y: self.contact.pos.y,
            xdir,
            ydir,
            particle_material: particle.material,
            landscape_material: self.contact.material,
            event: self.event.code(),
        };
        if self.env.scripts.invoke(handle, &mut params) {
            return true;
        }

        // The particle lives on with whatever the script wrote back
        if params.particle_material != particle.material {
            self.changed = true;
            particle.material = params.particle_material;
        }
        let pos = IVec2::new(params.x, params.y);
        if pos != particle.pos || params.xdir != xdir || params.ydir != ydir {
            self.changed = true;
            particle.pos = pos;
            particle.vel = Vec2::new(params.xdir as f32, params.ydir as f32) / 100.0;
        }
        false
    }
}
