//! Imports class files from disk, archives, URLs, or memory into a linked
//! type graph.

#![forbid(unsafe_code)]

mod error;
mod importer;
mod location;
mod options;

pub use crate::error::ImportError;
pub use crate::importer::{ClassFileImporter, Import, SkippedUnit};
pub use crate::location::Location;
pub use crate::options::{ConfigError, DuplicateHandling, ImportOptions, MalformedPolicy};

pub use strata_graph::Graph;
