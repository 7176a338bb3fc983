//! Turns a set of locations into a linked [`Graph`].
//!
//! Locations are first expanded into units (one per class file) on the
//! calling thread, since archives are read sequentially. Units are then
//! parsed in parallel, each reader registering the class name it found in
//! the shared [`StubRegistry`]. Linking runs once every unit has been read.

use std::ffi::OsStr;
use std::io::Read;
use std::path::{Path, PathBuf};

use rayon::prelude::*;
use rayon::ThreadPool;
use tracing::{debug, info_span, trace, warn};
use url::Url;

use strata_classfile::RawClass;
use strata_graph::{Graph, Linker, StubRegistry};

use crate::error::ImportError;
use crate::location::Location;
use crate::options::{ImportOptions, MalformedPolicy};

/// A unit left out of the graph because it could not be read.
#[derive(Clone, Debug, PartialEq)]
pub struct SkippedUnit {
    pub source_name: String,
    pub error: strata_classfile::Error,
}

/// The outcome of [`ClassFileImporter::import_detailed`].
#[derive(Debug)]
pub struct Import {
    pub graph: Graph,
    /// Malformed units skipped under [`MalformedPolicy::Skip`], in input order.
    pub skipped: Vec<SkippedUnit>,
}

#[derive(Clone, Debug, Default)]
pub struct ClassFileImporter {
    options: ImportOptions,
}

impl ClassFileImporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: ImportOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &ImportOptions {
        &self.options
    }

    pub fn import_path(&self, path: impl AsRef<Path>) -> Result<Graph, ImportError> {
        self.import_paths([path])
    }

    pub fn import_paths<I, P>(&self, paths: I) -> Result<Graph, ImportError>
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        self.import_locations(
            paths
                .into_iter()
                .map(|path| Location::Path(path.as_ref().to_path_buf())),
        )
    }

    pub fn import_urls<'a, I>(&self, urls: I) -> Result<Graph, ImportError>
    where
        I: IntoIterator<Item = &'a Url>,
    {
        let locations = urls
            .into_iter()
            .map(Location::from_url)
            .collect::<Result<Vec<_>, _>>()?;
        self.import_locations(locations)
    }

    /// Imports in-memory class files, each labelled with a name used in
    /// errors and logs.
    pub fn import_bytes<I, N>(&self, units: I) -> Result<Graph, ImportError>
    where
        I: IntoIterator<Item = (N, Vec<u8>)>,
        N: Into<String>,
    {
        self.import_locations(
            units
                .into_iter()
                .map(|(name, bytes)| Location::bytes(name, bytes)),
        )
    }

    pub fn import_locations<I>(&self, locations: I) -> Result<Graph, ImportError>
    where
        I: IntoIterator<Item = Location>,
    {
        Ok(self.import_detailed(locations)?.graph)
    }

    pub fn import_detailed<I>(&self, locations: I) -> Result<Import, ImportError>
    where
        I: IntoIterator<Item = Location>,
    {
        let mut units = Vec::new();
        for location in locations {
            collect_units(location, &mut units)?;
        }

        let _span = info_span!(target: "strata.import", "import", units = units.len()).entered();

        let registry = StubRegistry::new();
        let include_package_info = self.options.include_package_info;
        let outcomes = ReadPool::new(self.options.threads)
            .map(units, |unit| read_unit(unit, &registry, include_package_info));

        let mut classes = Vec::with_capacity(outcomes.len());
        let mut skipped = Vec::new();
        for outcome in outcomes {
            match outcome? {
                Outcome::Class(class) => classes.push(class),
                Outcome::Ignored => {}
                Outcome::Malformed(unit) => match self.options.on_malformed {
                    MalformedPolicy::Fail => {
                        return Err(ImportError::Malformed {
                            source_name: unit.source_name,
                            error: unit.error,
                        })
                    }
                    MalformedPolicy::Skip => {
                        warn!(
                            target = "strata.import",
                            source = %unit.source_name,
                            error = %unit.error,
                            "skipping malformed class file"
                        );
                        skipped.push(unit);
                    }
                },
            }
        }

        let graph = Linker::with_registry(registry)
            .duplicates(self.options.duplicates.into())
            .link(classes)?;
        Ok(Import { graph, skipped })
    }
}

struct Unit {
    source_name: String,
    content: Content,
}

enum Content {
    File(PathBuf),
    Bytes(Vec<u8>),
}

enum Outcome {
    Class(RawClass),
    Malformed(SkippedUnit),
    /// `package-info` / `module-info` when those are not imported.
    Ignored,
}

fn collect_units(location: Location, out: &mut Vec<Unit>) -> Result<(), ImportError> {
    match location {
        Location::Path(path) => {
            let meta = std::fs::metadata(&path).map_err(|err| ImportError::io(&path, err))?;
            if meta.is_dir() {
                collect_dir(&path, out)
            } else if is_archive(&path) {
                collect_archive(&path, out)
            } else {
                out.push(Unit {
                    source_name: path.display().to_string(),
                    content: Content::File(path),
                });
                Ok(())
            }
        }
        Location::ArchiveEntry { archive, entry } => {
            let mut zip = open_archive(&archive)?;
            let mut file = match zip.by_name(&entry) {
                Ok(file) => file,
                Err(zip::result::ZipError::FileNotFound) => {
                    return Err(ImportError::LocationNotFound(format!(
                        "{}!/{entry}",
                        archive.display()
                    )))
                }
                Err(err) => return Err(ImportError::zip(&archive, err)),
            };
            let mut bytes = Vec::with_capacity(file.size() as usize);
            file.read_to_end(&mut bytes)
                .map_err(|err| ImportError::io(&archive, err))?;
            out.push(Unit {
                source_name: format!("{}!/{entry}", archive.display()),
                content: Content::Bytes(bytes),
            });
            Ok(())
        }
        Location::Bytes { name, bytes } => {
            out.push(Unit {
                source_name: name,
                content: Content::Bytes(bytes),
            });
            Ok(())
        }
    }
}

fn collect_dir(dir: &Path, out: &mut Vec<Unit>) -> Result<(), ImportError> {
    for entry in walkdir::WalkDir::new(dir)
        .follow_links(false)
        .sort_by_file_name()
    {
        let entry = entry.map_err(|err| ImportError::io(dir, err.into()))?;
        if !entry.file_type().is_file() || entry.path().extension() != Some(OsStr::new("class"))
        {
            continue;
        }
        out.push(Unit {
            source_name: entry.path().display().to_string(),
            content: Content::File(entry.into_path()),
        });
    }
    Ok(())
}

fn collect_archive(path: &Path, out: &mut Vec<Unit>) -> Result<(), ImportError> {
    let mut archive = open_archive(path)?;
    for i in 0..archive.len() {
        let mut file = archive.by_index(i).map_err(|err| ImportError::zip(path, err))?;
        if !file.is_file() {
            continue;
        }
        let name = file.name().to_owned();
        if !name.ends_with(".class") || name.starts_with("META-INF/") {
            continue;
        }

        let mut bytes = Vec::with_capacity(file.size() as usize);
        file.read_to_end(&mut bytes)
            .map_err(|err| ImportError::io(path, err))?;
        out.push(Unit {
            source_name: format!("{}!/{name}", path.display()),
            content: Content::Bytes(bytes),
        });
    }
    Ok(())
}

fn open_archive(path: &Path) -> Result<zip::ZipArchive<std::fs::File>, ImportError> {
    let file = std::fs::File::open(path).map_err(|err| ImportError::io(path, err))?;
    zip::ZipArchive::new(file).map_err(|err| ImportError::zip(path, err))
}

fn is_archive(path: &Path) -> bool {
    matches!(
        path.extension().and_then(OsStr::to_str),
        Some("jar" | "zip")
    )
}

fn read_unit(
    unit: Unit,
    registry: &StubRegistry,
    include_package_info: bool,
) -> Result<Outcome, ImportError> {
    let Unit {
        source_name,
        content,
    } = unit;
    let bytes = match content {
        Content::File(path) => std::fs::read(&path).map_err(|err| ImportError::io(&path, err))?,
        Content::Bytes(bytes) => bytes,
    };

    let class = match RawClass::parse(&bytes) {
        Ok(class) => class,
        Err(error) => return Ok(Outcome::Malformed(SkippedUnit { source_name, error })),
    };
    if class.is_package_info() && !include_package_info {
        trace!(target = "strata.import", source = %source_name, "ignoring {}", class.name);
        return Ok(Outcome::Ignored);
    }

    registry.get_or_create(&class.name);
    debug!(
        target = "strata.import",
        source = %source_name,
        class = %class.name,
        references = class
            .code_units
            .iter()
            .map(|unit| unit.references.len())
            .sum::<usize>(),
        "read class file"
    );
    Ok(Outcome::Class(class))
}

enum ReadPool {
    Global,
    Dedicated(ThreadPool),
    Inline,
}

impl ReadPool {
    fn new(threads: Option<usize>) -> Self {
        let Some(threads) = threads else {
            return ReadPool::Global;
        };
        let mut threads = threads.max(1);
        loop {
            match rayon::ThreadPoolBuilder::new()
                .num_threads(threads)
                .thread_name(|idx| format!("strata-import-{idx}"))
                .build()
            {
                Ok(pool) => return ReadPool::Dedicated(pool),
                // Thread limits can be hit in constrained environments; shrink
                // the pool, then read on the calling thread.
                Err(_) if threads > 1 => threads = (threads / 2).max(1),
                Err(err) => {
                    warn!(
                        target = "strata.import",
                        error = %err,
                        "could not start reader threads, reading inline"
                    );
                    return ReadPool::Inline;
                }
            }
        }
    }

    /// Applies `read` to every unit, preserving input order.
    fn map<R, F>(&self, units: Vec<Unit>, read: F) -> Vec<R>
    where
        R: Send,
        F: Fn(Unit) -> R + Sync + Send,
    {
        match self {
            ReadPool::Global => units.into_par_iter().map(read).collect(),
            ReadPool::Dedicated(pool) => pool.install(|| units.into_par_iter().map(read).collect()),
            ReadPool::Inline => units.into_iter().map(read).collect(),
        }
    }
}
