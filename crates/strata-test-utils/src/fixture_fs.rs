use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::TempDir;
use zip::write::FileOptions;
use zip::ZipWriter;

/// A temporary directory holding class files and archives.
pub struct ClassDir {
    dir: TempDir,
}

impl ClassDir {
    pub fn new() -> Self {
        Self {
            dir: TempDir::new().expect("create temp dir"),
        }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Writes `bytes` to `<root>/com/example/Foo.class` for `com.example.Foo`.
    pub fn write_class(&self, binary_name: &str, bytes: &[u8]) -> PathBuf {
        self.write_file(&format!("{}.class", binary_name.replace('.', "/")), bytes)
    }

    pub fn write_file(&self, relative: &str, bytes: &[u8]) -> PathBuf {
        let path = self.dir.path().join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("create fixture directories");
        }
        fs::write(&path, bytes).expect("write fixture file");
        path
    }

    /// Writes a jar whose entries are `(entry name, bytes)` pairs.
    pub fn write_jar(&self, file_name: &str, entries: &[(&str, Vec<u8>)]) -> PathBuf {
        let path = self.dir.path().join(file_name);
        let file = fs::File::create(&path).expect("create jar");
        let mut jar = ZipWriter::new(file);
        for (name, bytes) in entries {
            jar.start_file(*name, FileOptions::default())
                .expect("start jar entry");
            jar.write_all(bytes).expect("write jar entry");
        }
        jar.finish().expect("finish jar");
        path
    }
}

impl Default for ClassDir {
    fn default() -> Self {
        Self::new()
    }
}
