//! Material registry
//!
//! Owns every loaded material, the material shapes and the reaction matrix.
//! Loading appends materials; [`MaterialRegistry::cross_map_materials`] is the
//! single rebuild entry point for everything index dependent.

use ahash::AHashMap;
use glam::IVec2;
use terrachem_simulation::{MaterialDescriptor, MaterialIndex, MaterialShape, ReactionRule, RuleKind};

use crate::archive::MaterialArchive;
use crate::config::RegistryConfig;
use crate::error::{MaterialError, Result};
use crate::interaction::{ScriptEngine, ScriptHandle};
use crate::matrix::{self, ReactionMatrix, ReactionRef};

const ENUMERATION_HEADER: &str = "[Enumeration]";

/// Indices resolved from a custom rule's names
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ResolvedRule {
    pub convert_to: Option<MaterialIndex>,
    pub script: Option<ScriptHandle>,
}

/// Resolution state of a custom rule
///
/// Script rules stay unresolved until a script engine bound their function;
/// every other rule is resolved by cross mapping.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum RuleState {
    #[default]
    Unresolved,
    Resolved(ResolvedRule),
}

#[derive(Clone, Debug, PartialEq)]
pub struct CustomReaction {
    pub rule: ReactionRule,
    pub state: RuleState,
}

/// A loaded material with its resolved cross references
#[derive(Clone, Debug, PartialEq)]
pub struct Material {
    /// Parsed descriptor; its rules live in [`Material::reactions`]
    pub descriptor: MaterialDescriptor,
    pub reactions: Vec<CustomReaction>,
    pub in_mat_convert_to: Option<MaterialIndex>,
    pub blast_shift_to: Option<MaterialIndex>,
    pub below_temp_convert_to: Option<MaterialIndex>,
    pub above_temp_convert_to: Option<MaterialIndex>,
    /// Key of the linked shape in the registry's shape table
    pub custom_shape: Option<String>,
}

impl Material {
    pub fn new(mut descriptor: MaterialDescriptor) -> Self {
        let reactions = std::mem::take(&mut descriptor.reactions)
            .into_iter()
            .map(|rule| CustomReaction {
                rule,
                state: RuleState::Unresolved,
            })
            .collect();
        Self {
            descriptor,
            reactions,
            in_mat_convert_to: None,
            blast_shift_to: None,
            below_temp_convert_to: None,
            above_temp_convert_to: None,
            custom_shape: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.descriptor.name
    }

    pub fn density(&self) -> i32 {
        self.descriptor.density
    }
}

/// Materials the engine itself depends on
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SystemMaterials {
    pub vehicle: MaterialIndex,
    pub tunnel: MaterialIndex,
    pub water: MaterialIndex,
    pub earth: MaterialIndex,
}

#[derive(Default)]
pub struct MaterialRegistry {
    materials: Vec<Material>,
    /// Lowercased name -> index
    names: AHashMap<String, usize>,
    /// Lowercased entry stem -> shape
    shapes: AHashMap<String, MaterialShape>,
    matrix: Option<ReactionMatrix>,
    system: Option<SystemMaterials>,
    max_shape_size: IVec2,
}

/// Entry name without any extension ("Rough.shape.ron" -> "Rough")
fn entry_stem(entry: &str) -> &str {
    entry.split('.').next().unwrap_or(entry)
}

impl MaterialRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load every material and shape entry of an archive
    ///
    /// Returns the number of new materials. Names already present are skipped.
    /// On error nothing is added.
    pub fn load(&mut self, archive: &dyn MaterialArchive, config: &RegistryConfig) -> Result<usize> {
        let mut descriptors = Vec::new();
        for entry in archive.enumerate_entries(&config.material_pattern) {
            let text = archive
                .load_text_entry(&entry)
                .ok_or_else(|| MaterialError::EntryMissing {
                    archive: archive.name(),
                    entry: entry.clone(),
                })?;
            let descriptor = MaterialDescriptor::from_ron(&text).map_err(|e| MaterialError::Parse {
                entry: entry.clone(),
                message: e.to_string(),
            })?;
            if descriptor.name.trim().is_empty() {
                return Err(MaterialError::Parse {
                    entry,
                    message: "material has no name".to_string(),
                });
            }
            descriptors.push(descriptor);
        }

        let mut shapes = Vec::new();
        for entry in archive.enumerate_entries(&config.shape_pattern) {
            let text = archive
                .load_text_entry(&entry)
                .ok_or_else(|| MaterialError::EntryMissing {
                    archive: archive.name(),
                    entry: entry.clone(),
                })?;
            let shape = MaterialShape::load(&text).map_err(|source| MaterialError::Shape {
                entry: entry.clone(),
                source,
            })?;
            shapes.push((entry_stem(&entry).to_lowercase(), shape));
        }

        let added = descriptors
            .into_iter()
            .filter_map(|descriptor| self.register(descriptor))
            .count();
        let shape_count = shapes.len();
        self.shapes.extend(shapes);

        log::info!(
            "Loaded {} materials and {} shapes from {}",
            added,
            shape_count,
            archive.name()
        );
        Ok(added)
    }

    /// Append a material unless one of the same name exists
    ///
    /// Nameless descriptors are rejected. Any built matrix is stale afterwards
    /// and gets dropped.
    pub fn register(&mut self, descriptor: MaterialDescriptor) -> Option<MaterialIndex> {
        if descriptor.name.trim().is_empty() {
            log::warn!("Skipping material without a name");
            return None;
        }
        let key = descriptor.name.to_lowercase();
        if self.names.contains_key(&key) {
            log::debug!("Skipping duplicate material {}", descriptor.name);
            return None;
        }
        let index = self.materials.len();
        self.names.insert(key, index);
        self.materials.push(Material::new(descriptor));
        self.matrix = None;
        self.system = None;
        Some(index as MaterialIndex)
    }

    /// Index of a material by (case-insensitive) name
    pub fn get(&self, name: &str) -> Option<MaterialIndex> {
        self.names
            .get(&name.to_lowercase())
            .map(|&index| index as MaterialIndex)
    }

    pub fn material(&self, index: MaterialIndex) -> Option<&Material> {
        self.materials.get(usize::try_from(index).ok()?)
    }

    pub fn len(&self) -> usize {
        self.materials.len()
    }

    pub fn is_empty(&self) -> bool {
        self.materials.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (MaterialIndex, &Material)> {
        self.materials
            .iter()
            .enumerate()
            .map(|(index, material)| (index as MaterialIndex, material))
    }

    pub fn shape(&self, name: &str) -> Option<&MaterialShape> {
        self.shapes.get(&name.to_lowercase())
    }

    pub fn shape_mut(&mut self, name: &str) -> Option<&mut MaterialShape> {
        self.shapes.get_mut(&name.to_lowercase())
    }

    /// All shapes, sorted by key
    pub fn shapes(&self) -> Vec<(&str, &MaterialShape)> {
        let mut shapes: Vec<_> = self
            .shapes
            .iter()
            .map(|(name, shape)| (name.as_str(), shape))
            .collect();
        shapes.sort_by_key(|(name, _)| *name);
        shapes
    }

    /// Shape linked to a material, if any
    pub fn custom_shape(&self, index: MaterialIndex) -> Option<&MaterialShape> {
        let key = self.material(index)?.custom_shape.as_deref()?;
        self.shapes.get(key)
    }

    /// Prepare every shape for `zoom`; returns the names that could not be prepared
    pub fn prepare_shapes_for_zoom(&mut self, zoom: i32) -> Vec<String> {
        let mut failed: Vec<String> = self
            .shapes
            .iter_mut()
            .filter_map(|(name, shape)| (!shape.prepare_for_zoom(zoom)).then(|| name.clone()))
            .collect();
        failed.sort();
        for name in &failed {
            log::warn!("Shape {} cannot be prepared for zoom {}", name, zoom);
        }
        failed
    }

    /// Largest polygon extent over all linked shapes, valid after cross mapping
    pub fn max_shape_size(&self) -> IVec2 {
        self.max_shape_size
    }

    pub fn system_materials(&self) -> Option<SystemMaterials> {
        self.system
    }

    pub fn matrix(&self) -> Option<&ReactionMatrix> {
        self.matrix.as_ref()
    }

    /// Reaction for a particle touching a landscape cell
    pub fn get_reaction(&self, particle: MaterialIndex, landscape: MaterialIndex) -> Option<ReactionRef> {
        self.matrix.as_ref()?.get(particle, landscape)
    }

    /// The custom rule a [`ReactionRef::Custom`] points at
    pub fn custom_reaction(&self, material: usize, rule: usize) -> Option<&CustomReaction> {
        self.materials.get(material)?.reactions.get(rule)
    }

    /// Display name of a reaction, for reports and logs
    pub fn reaction_name(&self, reaction: ReactionRef) -> String {
        match reaction {
            ReactionRef::Builtin(builtin) => builtin.name().to_string(),
            ReactionRef::Custom { material, rule } => {
                match (self.materials.get(material), self.custom_reaction(material, rule)) {
                    (Some(owner), Some(custom)) => {
                        format!("{:?} ({} rule {})", custom.rule.kind, owner.name(), rule)
                    }
                    _ => "invalid".to_string(),
                }
            }
        }
    }

    /// Build the reaction matrix and resolve every name based cross reference
    ///
    /// On failure the previous matrix is dropped and nothing else changes.
    pub fn cross_map_materials(&mut self, config: &RegistryConfig) -> Result<()> {
        self.matrix = None;
        self.system = None;

        let count = self.materials.len();
        if count > config.max_materials {
            return Err(MaterialError::TooManyMaterials {
                count,
                max: config.max_materials,
            });
        }

        let (shape_links, max_shape_size) = self.link_shapes();
        let matrix = matrix::build(&self.materials, |name| self.get(name));

        // Rule names and auxiliary names
        let resolved: Vec<_> = self
            .materials
            .iter()
            .map(|material| {
                let rules: Vec<RuleState> = material
                    .reactions
                    .iter()
                    .map(|custom| self.resolve_rule_state(material, custom))
                    .collect();
                let descriptor = &material.descriptor;
                (
                    rules,
                    self.resolve_aux(material, "in_mat_convert_to", &descriptor.in_mat_convert_to),
                    self.resolve_aux(material, "blast_shift_to", &descriptor.blast_shift_to),
                    self.resolve_aux(material, "below_temp_convert_to", &descriptor.below_temp_convert_to),
                    self.resolve_aux(material, "above_temp_convert_to", &descriptor.above_temp_convert_to),
                )
            })
            .collect();

        let system = self.resolve_system_materials(config)?;

        for ((material, shape), (rules, in_mat, blast, below, above)) in
            self.materials.iter_mut().zip(shape_links).zip(resolved)
        {
            for (custom, state) in material.reactions.iter_mut().zip(rules) {
                custom.state = state;
            }
            material.custom_shape = shape;
            material.in_mat_convert_to = in_mat;
            material.blast_shift_to = blast;
            material.below_temp_convert_to = below;
            material.above_temp_convert_to = above;
        }
        self.max_shape_size = max_shape_size;

        log::info!(
            "Built reaction matrix for {} materials ({} reactions)",
            count,
            matrix.entries().count()
        );
        self.matrix = Some(matrix);
        self.system = Some(system);
        Ok(())
    }

    /// Shape key per material and the largest polygon extent among them
    fn link_shapes(&self) -> (Vec<Option<String>>, IVec2) {
        let mut max = IVec2::ZERO;
        let links = self
            .materials
            .iter()
            .map(|material| {
                let name = &material.descriptor.shape_texture;
                if name.is_empty() {
                    return None;
                }
                let key = name.to_lowercase();
                match self.shapes.get(&key) {
                    Some(shape) => {
                        max.x = max.x.max(shape.max_poly_width);
                        max.y = max.y.max(shape.max_poly_height);
                        Some(key)
                    }
                    None => {
                        log::warn!(
                            "Shape {} for material {} not found",
                            name,
                            material.descriptor.name
                        );
                        None
                    }
                }
            })
            .collect();
        (links, max)
    }

    fn resolve_rule_state(&self, material: &Material, custom: &CustomReaction) -> RuleState {
        let convert_to = self.resolve_aux(material, "convert_mat", &custom.rule.convert_mat);
        if custom.rule.kind != RuleKind::Script {
            return RuleState::Resolved(ResolvedRule {
                convert_to,
                script: None,
            });
        }
        // Keep a script binding made before a rebuild
        match custom.state {
            RuleState::Resolved(ResolvedRule {
                script: Some(script),
                ..
            }) => RuleState::Resolved(ResolvedRule {
                convert_to,
                script: Some(script),
            }),
            _ => RuleState::Unresolved,
        }
    }

    fn resolve_aux(&self, material: &Material, field: &str, name: &str) -> Option<MaterialIndex> {
        if name.is_empty() {
            return None;
        }
        let index = self.get(name);
        if index.is_none() {
            log::warn!(
                "Material {}: {} names unknown material {}",
                material.descriptor.name,
                field,
                name
            );
        }
        index
    }

    fn resolve_system_materials(&self, config: &RegistryConfig) -> Result<SystemMaterials> {
        let names = &config.system_materials;
        let find = |role: &'static str, name: &str| {
            self.get(name).ok_or_else(|| MaterialError::MissingSystemMaterial {
                role,
                name: name.to_string(),
            })
        };
        Ok(SystemMaterials {
            vehicle: find("vehicle", &names.vehicle)?,
            tunnel: find("tunnel", &names.tunnel)?,
            water: find("water", &names.water)?,
            earth: find("earth", &names.earth)?,
        })
    }

    /// Bind the functions of all script rules
    ///
    /// Fails on the first function the engine does not know; no rule is bound
    /// in that case.
    pub fn resolve_scripts(&mut self, engine: &dyn ScriptEngine) -> Result<()> {
        let mut bindings = Vec::new();
        for (index, material) in self.materials.iter().enumerate() {
            for (rule_index, custom) in material.reactions.iter().enumerate() {
                if custom.rule.kind != RuleKind::Script {
                    continue;
                }
                let function = &custom.rule.script_func;
                let script = engine.resolve_function(function).ok_or_else(|| {
                    MaterialError::UnresolvedScript {
                        material: material.descriptor.name.clone(),
                        function: function.clone(),
                    }
                })?;
                let convert_to = self.resolve_aux(material, "convert_mat", &custom.rule.convert_mat);
                bindings.push((
                    index,
                    rule_index,
                    ResolvedRule {
                        convert_to,
                        script: Some(script),
                    },
                ));
            }
        }

        let bound = bindings.len();
        for (index, rule_index, resolved) in bindings {
            self.materials[index].reactions[rule_index].state = RuleState::Resolved(resolved);
        }
        log::debug!("Bound {} script reactions", bound);
        Ok(())
    }

    /// Material names in index order, in the persisted enumeration format
    pub fn save_enumeration(&self) -> String {
        let mut text = String::from(ENUMERATION_HEADER);
        text.push('\n');
        for material in &self.materials {
            text.push_str(material.name());
            text.push('\n');
        }
        text
    }

    /// Reorder materials to match a saved enumeration
    ///
    /// `None` (no saved enumeration) keeps the current order. Listed
    /// materials come first in listed order; the rest keep their relative
    /// order. On failure the order is left untouched.
    pub fn load_enumeration(&mut self, text: Option<&str>) -> Result<()> {
        let Some(text) = text else {
            return Ok(());
        };

        let mut lines = text.lines().map(str::trim).filter(|line| !line.is_empty());
        match lines.next() {
            Some(header) if header.eq_ignore_ascii_case(ENUMERATION_HEADER) => {}
            _ => {
                return Err(MaterialError::MalformedEnumeration(
                    "missing [Enumeration] header".to_string(),
                ));
            }
        }

        let mut order = Vec::with_capacity(self.materials.len());
        let mut taken = vec![false; self.materials.len()];
        for name in lines.take_while(|line| !line.starts_with('[')) {
            let index = self
                .names
                .get(&name.to_lowercase())
                .copied()
                .ok_or_else(|| MaterialError::MaterialNotFound(name.to_string()))?;
            if taken[index] {
                return Err(MaterialError::MalformedEnumeration(format!(
                    "material {} listed twice",
                    name
                )));
            }
            taken[index] = true;
            order.push(index);
        }
        order.extend((0..self.materials.len()).filter(|&index| !taken[index]));

        let mut slots: Vec<Option<Material>> = std::mem::take(&mut self.materials)
            .into_iter()
            .map(Some)
            .collect();
        self.materials = order
            .into_iter()
            .filter_map(|index| slots[index].take())
            .collect();
        self.names = self
            .materials
            .iter()
            .enumerate()
            .map(|(index, material)| (material.descriptor.name.to_lowercase(), index))
            .collect();
        self.matrix = None;
        self.system = None;
        Ok(())
    }

    /// Bring a material set online in one go
    ///
    /// Loads every archive in order, applies the saved enumeration, builds the
    /// reaction matrix and binds script reactions.
    pub fn load_session(
        archives: &[&dyn MaterialArchive],
        enumeration: Option<&str>,
        config: &RegistryConfig,
        engine: &dyn ScriptEngine,
    ) -> Result<Self> {
        let mut registry = Self::new();
        for archive in archives {
            registry.load(*archive, config)?;
        }
        registry.load_enumeration(enumeration)?;
        registry.cross_map_materials(config)?;
        registry.resolve_scripts(engine)?;
        Ok(registry)
    }
}
