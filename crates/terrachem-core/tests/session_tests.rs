//! Integration tests for loading sessions, enumerations and packaged assets

mod common;

use std::path::Path;

use common::{MapScriptEngine, archive_with};
use terrachem_core::{
    DirArchive, MaterialArchive, MaterialError, MaterialRegistry, NullScriptEngine, RegistryConfig,
};

const EXTRA: [&str; 2] = [
    r#"(name: "Sand", density: 50, corrode: 40)"#,
    r#"(name: "Acid", density: 25, corrosive: 80)"#,
];

fn names(registry: &MaterialRegistry) -> Vec<String> {
    registry.iter().map(|(_, m)| m.name().to_string()).collect()
}

// ============================================================================
// Enumeration
// ============================================================================

#[test]
fn test_enumeration_survives_reload() {
    let config = RegistryConfig::default();
    let mut first = MaterialRegistry::new();
    first.load(&archive_with(&EXTRA), &config).unwrap();
    first
        .load_enumeration(Some("[Enumeration]\nWater\nSand\n"))
        .unwrap();
    let saved = first.save_enumeration();

    let mut second = MaterialRegistry::new();
    second.load(&archive_with(&EXTRA), &config).unwrap();
    assert_ne!(names(&first), names(&second));
    second.load_enumeration(Some(&saved)).unwrap();
    assert_eq!(names(&first), names(&second));
}

#[test]
fn test_enumeration_with_missing_material_fails() {
    let config = RegistryConfig::default();
    let mut full = MaterialRegistry::new();
    full.load(&archive_with(&EXTRA), &config).unwrap();
    let saved = full.save_enumeration();

    // Same set without Sand's definition
    let mut archive = archive_with(&EXTRA);
    archive.remove("Sand.material.ron");
    let mut registry = MaterialRegistry::new();
    registry.load(&archive, &config).unwrap();
    let before: Vec<_> = names(&registry)
        .iter()
        .map(|name| (name.clone(), registry.get(name)))
        .collect();

    match registry.load_enumeration(Some(&saved)) {
        Err(MaterialError::MaterialNotFound(name)) => assert_eq!(name, "Sand"),
        other => panic!("expected MaterialNotFound, got {other:?}"),
    }

    let after: Vec<_> = names(&registry)
        .iter()
        .map(|name| (name.clone(), registry.get(name)))
        .collect();
    assert_eq!(before, after);
}

#[test]
fn test_session_fails_on_bad_enumeration() {
    let archive = archive_with(&EXTRA);
    let result = MaterialRegistry::load_session(
        &[&archive],
        Some("[Enumeration]\nMithril\n"),
        &RegistryConfig::default(),
        &NullScriptEngine,
    );
    assert!(matches!(result, Err(MaterialError::MaterialNotFound(ref name)) if name == "Mithril"));
}

// ============================================================================
// Sessions
// ============================================================================

#[test]
fn test_session_merges_archives() {
    let base = archive_with(&[]);
    let overlay = archive_with(&EXTRA);
    let registry = MaterialRegistry::load_session(
        &[&base, &overlay],
        None,
        &RegistryConfig::default(),
        &NullScriptEngine,
    )
    .unwrap();

    // System materials come first, the overlay only adds what is new
    assert_eq!(registry.len(), 6);
    assert_eq!(registry.get("Acid"), Some(4));
    assert_eq!(registry.get("Sand"), Some(5));
    assert!(registry.system_materials().is_some());
}

#[test]
fn test_session_binds_scripts() {
    let archive = archive_with(&[r#"(name: "Lava", density: 40,
        reactions: [(kind: Script, target: "Water", script_func: "Quench")])"#]);
    let engine = MapScriptEngine::new().with_function("Quench", |_| true);
    let registry =
        MaterialRegistry::load_session(&[&archive], None, &RegistryConfig::default(), &engine)
            .unwrap();

    let lava = registry.get("Lava").unwrap();
    let water = registry.get("Water").unwrap();
    let reaction = registry.get_reaction(lava, water).unwrap();
    assert_eq!(registry.reaction_name(reaction), "Script (Lava rule 0)");
}

#[test]
fn test_session_with_small_limit() {
    let archive = archive_with(&EXTRA);
    let config = RegistryConfig {
        max_materials: 5,
        ..Default::default()
    };
    let result = MaterialRegistry::load_session(&[&archive], None, &config, &NullScriptEngine);
    assert!(matches!(
        result,
        Err(MaterialError::TooManyMaterials { count: 6, max: 5 })
    ));
}

// ============================================================================
// Packaged assets
// ============================================================================

fn assets() -> DirArchive {
    let dir = Path::new(env!("CARGO_MANIFEST_DIR")).join("../../assets/materials");
    DirArchive::open(dir).expect("asset directory exists")
}

#[test]
fn test_packaged_materials_load() {
    let archive = assets();
    assert!(!archive.enumerate_entries("*.material.ron").is_empty());

    let registry = MaterialRegistry::load_session(
        &[&archive],
        None,
        &RegistryConfig::default(),
        &NullScriptEngine,
    )
    .expect("packaged materials form a valid session");

    let system = registry.system_materials().unwrap();
    assert_eq!(registry.material(system.earth).unwrap().name(), "Earth");
    for (_, material) in registry.iter() {
        if !material.descriptor.shape_texture.is_empty() {
            assert!(material.custom_shape.is_some(), "{} has no shape", material.name());
        }
    }
}

#[test]
fn test_packaged_shapes_prepare() {
    let mut registry = MaterialRegistry::new();
    registry
        .load(&assets(), &RegistryConfig::default())
        .unwrap();
    assert!(!registry.shapes().is_empty());
    assert!(registry.prepare_shapes_for_zoom(5).is_empty());
    for (name, shape) in registry.shapes() {
        for polygon in &shape.polygons {
            assert!(!polygon.coverage.is_empty(), "{name} has an empty coverage list");
        }
    }
}
