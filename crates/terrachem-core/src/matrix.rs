//! Reaction matrix
//!
//! Dense `(N+1) x (N+1)` table telling which reaction runs when a particle of
//! one material touches a landscape cell of another. Row and column 0 belong
//! to [`SKY`]; a material index `i` lives at slot `i + 1`.

use terrachem_simulation::{
    MaterialIndex, MaterialFlags, ReactionRule, SKY, SKY_NAME, TargetKeyword, density_semi_solid,
    density_solid,
};

use crate::registry::Material;

/// Reactions that exist without any declarative rule
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BuiltinReaction {
    /// In-place conversion (snow melting in water)
    Convert,
    /// Incendiary meets extinguisher; both vanish
    Poof,
    /// Corrosive particle eats corrodible landscape
    Corrode,
    /// Incendiary meets inflammable
    Incinerate,
    /// Particle settles into the landscape
    Insert,
}

impl BuiltinReaction {
    pub fn name(self) -> &'static str {
        match self {
            BuiltinReaction::Convert => "Convert",
            BuiltinReaction::Poof => "Poof",
            BuiltinReaction::Corrode => "Corrode",
            BuiltinReaction::Incinerate => "Incinerate",
            BuiltinReaction::Insert => "Insert",
        }
    }
}

/// Entry of the reaction matrix
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ReactionRef {
    Builtin(BuiltinReaction),
    /// Rule `rule` of material `material`
    Custom { material: usize, rule: usize },
}

#[derive(Clone, Debug, PartialEq)]
pub struct ReactionMatrix {
    num: usize,
    cells: Vec<Option<ReactionRef>>,
}

impl ReactionMatrix {
    /// Empty matrix (no interactions) for `num` materials
    pub fn new(num: usize) -> Self {
        Self {
            num,
            cells: vec![None; (num + 1) * (num + 1)],
        }
    }

    pub fn material_count(&self) -> usize {
        self.num
    }

    fn slot(&self, index: MaterialIndex) -> Option<usize> {
        if index >= SKY && index < self.num as MaterialIndex {
            Some((index + 1) as usize)
        } else {
            None
        }
    }

    fn offset(&self, particle: MaterialIndex, landscape: MaterialIndex) -> Option<usize> {
        Some(self.slot(landscape)? * (self.num + 1) + self.slot(particle)?)
    }

    /// Reaction for a particle of `particle` touching a cell of `landscape`
    ///
    /// Out of range indices mean no interaction.
    pub fn get(&self, particle: MaterialIndex, landscape: MaterialIndex) -> Option<ReactionRef> {
        self.offset(particle, landscape).and_then(|offset| self.cells[offset])
    }

    /// Store a reaction; `reverse` swaps particle and landscape first
    pub fn set(
        &mut self,
        particle: MaterialIndex,
        landscape: MaterialIndex,
        reaction: Option<ReactionRef>,
        reverse: bool,
    ) {
        let (particle, landscape) = if reverse {
            (landscape, particle)
        } else {
            (particle, landscape)
        };
        match self.offset(particle, landscape) {
            Some(offset) => self.cells[offset] = reaction,
            None => log::warn!(
                "Ignoring reaction for out of range pair ({}, {})",
                particle,
                landscape
            ),
        }
    }

    /// All populated cells as (particle, landscape, reaction)
    pub fn entries(&self) -> impl Iterator<Item = (MaterialIndex, MaterialIndex, ReactionRef)> + '_ {
        let width = self.num + 1;
        self.cells.iter().enumerate().filter_map(move |(offset, cell)| {
            cell.map(|reaction| {
                let particle = (offset % width) as MaterialIndex - 1;
                let landscape = (offset / width) as MaterialIndex - 1;
                (particle, landscape, reaction)
            })
        })
    }
}

/// Hardcoded physical reaction between two materials
fn default_reaction(particle: Option<&Material>, landscape: Option<&Material>) -> Option<ReactionRef> {
    let pxs = particle?;

    // natural stuff: material conversion here?
    let trigger = &pxs.descriptor.in_mat_convert;
    if !trigger.is_empty() {
        let landscape_name = landscape.map_or(SKY_NAME, |m| m.name());
        if trigger.eq_ignore_ascii_case(landscape_name) {
            return Some(ReactionRef::Builtin(BuiltinReaction::Convert));
        }
    }

    // the rest is happening for same/higher densities only
    let ls = landscape?;
    if pxs.descriptor.density > ls.descriptor.density {
        return None;
    }

    let p = pxs.descriptor.flags();
    let l = ls.descriptor.flags();
    let crossed = |a: MaterialFlags, b: MaterialFlags| {
        (p.contains(a) && l.contains(b)) || (p.contains(b) && l.contains(a))
    };

    let reaction = if crossed(MaterialFlags::INCENDIARY, MaterialFlags::EXTINGUISHER) {
        BuiltinReaction::Poof
    } else if crossed(MaterialFlags::INCENDIARY, MaterialFlags::INFLAMMABLE) {
        BuiltinReaction::Incinerate
    } else if p.contains(MaterialFlags::CORROSIVE) && l.contains(MaterialFlags::CORRODE) {
        BuiltinReaction::Corrode
    } else {
        BuiltinReaction::Insert
    };
    Some(ReactionRef::Builtin(reaction))
}

/// Landscape materials a rule applies to, sky included where the category says so
pub fn resolve_targets(
    materials: &[Material],
    rule: &ReactionRule,
    lookup: impl Fn(&str) -> Option<MaterialIndex>,
) -> Vec<MaterialIndex> {
    let inverse = rule.inverse;
    let all = 0..materials.len() as MaterialIndex;
    let with_sky = |mut targets: Vec<MaterialIndex>, sky: bool| {
        if sky {
            targets.insert(0, SKY);
        }
        targets
    };
    let select = |pred: &dyn Fn(&Material) -> bool| -> Vec<MaterialIndex> {
        all.clone()
            .filter(|&i| pred(&materials[i as usize]) != inverse)
            .collect()
    };

    // single material target
    if let Some(target) = lookup(&rule.target) {
        return if inverse {
            with_sky(all.clone().filter(|&i| i != target).collect(), true)
        } else {
            vec![target]
        };
    }

    let Some(keyword) = TargetKeyword::parse(&rule.target) else {
        log::warn!("Unknown reaction target \"{}\"", rule.target);
        return Vec::new();
    };

    match keyword {
        TargetKeyword::All => {
            if inverse {
                Vec::new()
            } else {
                with_sky(all.clone().collect(), true)
            }
        }
        TargetKeyword::Solid => with_sky(select(&|m| density_solid(m.descriptor.density)), inverse),
        TargetKeyword::SemiSolid => {
            with_sky(select(&|m| density_semi_solid(m.descriptor.density)), inverse)
        }
        TargetKeyword::Background => with_sky(select(&|m| m.descriptor.is_background()), !inverse),
        TargetKeyword::Sky => {
            if inverse {
                all.clone().collect()
            } else {
                vec![SKY]
            }
        }
        TargetKeyword::Incendiary => flag_targets(&select, MaterialFlags::INCENDIARY, inverse),
        TargetKeyword::Extinguisher => flag_targets(&select, MaterialFlags::EXTINGUISHER, inverse),
        TargetKeyword::Inflammable => flag_targets(&select, MaterialFlags::INFLAMMABLE, inverse),
        TargetKeyword::Corrosive => flag_targets(&select, MaterialFlags::CORROSIVE, inverse),
        TargetKeyword::Corrode => flag_targets(&select, MaterialFlags::CORRODE, inverse),
    }
}

fn flag_targets(
    select: &dyn Fn(&dyn Fn(&Material) -> bool) -> Vec<MaterialIndex>,
    flag: MaterialFlags,
    inverse: bool,
) -> Vec<MaterialIndex> {
    let mut targets = select(&|m: &Material| m.descriptor.flags().contains(flag));
    if inverse {
        targets.insert(0, SKY);
    }
    targets
}

/// Build the complete matrix: hardcoded defaults first, then every custom
/// rule in material and declaration order, later rules overwriting earlier ones.
pub(crate) fn build(
    materials: &[Material],
    lookup: impl Fn(&str) -> Option<MaterialIndex>,
) -> ReactionMatrix {
    let num = materials.len();
    let mut matrix = ReactionMatrix::new(num);
    let material = |index: MaterialIndex| materials.get(usize::try_from(index).ok()?);

    for pxs in SKY..num as MaterialIndex {
        for ls in SKY..num as MaterialIndex {
            let reaction = default_reaction(material(pxs), material(ls));
            matrix.set(pxs, ls, reaction, false);
        }
    }

    for (index, mat) in materials.iter().enumerate() {
        for (rule_index, custom) in mat.reactions.iter().enumerate() {
            let reaction = ReactionRef::Custom {
                material: index,
                rule: rule_index,
            };
            for target in resolve_targets(materials, &custom.rule, &lookup) {
                matrix.set(index as MaterialIndex, target, Some(reaction), custom.rule.reverse);
            }
        }
    }

    matrix
}
