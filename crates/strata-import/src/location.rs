use std::fmt;
use std::path::PathBuf;

use url::Url;

use crate::error::ImportError;

/// Where class files come from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Location {
    /// A `.class` file, a directory walked recursively, or a `.jar`/`.zip`
    /// archive.
    Path(PathBuf),
    /// A single entry inside an archive.
    ArchiveEntry { archive: PathBuf, entry: String },
    /// Class file bytes held in memory; `name` only labels errors and logs.
    Bytes { name: String, bytes: Vec<u8> },
}

impl Location {
    pub fn path(path: impl Into<PathBuf>) -> Self {
        Location::Path(path.into())
    }

    pub fn bytes(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Location::Bytes {
            name: name.into(),
            bytes,
        }
    }

    /// Accepts `file:` URLs (file or directory) and `jar:file:<archive>!/<entry>`.
    pub fn from_url(url: &Url) -> Result<Self, ImportError> {
        match url.scheme() {
            "file" => Ok(Location::Path(file_url_to_path(url)?)),
            "jar" => {
                let rest = url.path();
                let Some((archive, entry)) = rest.split_once("!/") else {
                    return Err(invalid(url, "missing `!/` entry separator"));
                };
                let archive = Url::parse(archive).map_err(|err| invalid(url, &err.to_string()))?;
                if archive.scheme() != "file" {
                    return Err(invalid(url, "only file archives are supported"));
                }
                if entry.is_empty() {
                    return Err(invalid(url, "empty archive entry"));
                }
                Ok(Location::ArchiveEntry {
                    archive: file_url_to_path(&archive)?,
                    entry: entry.to_string(),
                })
            }
            other => Err(invalid(url, &format!("unsupported scheme `{other}`"))),
        }
    }

    pub fn parse_url(text: &str) -> Result<Self, ImportError> {
        let url = Url::parse(text).map_err(|err| ImportError::InvalidUrl {
            url: text.to_string(),
            reason: err.to_string(),
        })?;
        Self::from_url(&url)
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Location::Path(path) => write!(f, "{}", path.display()),
            Location::ArchiveEntry { archive, entry } => {
                write!(f, "{}!/{entry}", archive.display())
            }
            Location::Bytes { name, .. } => f.write_str(name),
        }
    }
}

fn file_url_to_path(url: &Url) -> Result<PathBuf, ImportError> {
    url.to_file_path()
        .map_err(|()| invalid(url, "not a local file path"))
}

fn invalid(url: &Url, reason: &str) -> ImportError {
    ImportError::InvalidUrl {
        url: url.to_string(),
        reason: reason.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn file_urls_become_paths() {
        assert_eq!(
            Location::parse_url("file:///tmp/classes").unwrap(),
            Location::Path(PathBuf::from("/tmp/classes"))
        );
    }

    #[test]
    fn jar_urls_name_one_entry() {
        assert_eq!(
            Location::parse_url("jar:file:///tmp/lib.jar!/com/example/Foo.class").unwrap(),
            Location::ArchiveEntry {
                archive: PathBuf::from("/tmp/lib.jar"),
                entry: "com/example/Foo.class".to_string(),
            }
        );
    }

    #[test]
    fn rejects_other_schemes_and_bad_jar_urls() {
        for text in [
            "http://example.com/Foo.class",
            "jar:file:///tmp/lib.jar",
            "jar:http://example.com/lib.jar!/Foo.class",
            "not a url",
        ] {
            assert!(
                matches!(Location::parse_url(text), Err(ImportError::InvalidUrl { .. })),
                "{text}"
            );
        }
    }
}
