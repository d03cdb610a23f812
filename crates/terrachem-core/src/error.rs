//! Load-time errors
//!
//! Everything here aborts bringing a material set online. Reaction dispatch
//! never fails; it degrades to "no interaction" instead.

use terrachem_simulation::ShapeError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MaterialError {
    #[error("entry {entry} not found in {archive}")]
    EntryMissing { archive: String, entry: String },

    #[error("failed to parse {entry}: {message}")]
    Parse { entry: String, message: String },

    #[error("failed to load material shape {entry}: {source}")]
    Shape {
        entry: String,
        #[source]
        source: ShapeError,
    },

    #[error("too many materials: {count} loaded, at most {max} supported")]
    TooManyMaterials { count: usize, max: usize },

    #[error("system material {role} (\"{name}\") not found")]
    MissingSystemMaterial { role: &'static str, name: String },

    #[error("script function \"{function}\" for reaction of material {material} not found")]
    UnresolvedScript { material: String, function: String },

    #[error("material {0} not found")]
    MaterialNotFound(String),

    #[error("malformed material enumeration: {0}")]
    MalformedEnumeration(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T, E = MaterialError> = std::result::Result<T, E>;
