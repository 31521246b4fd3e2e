//! Schema source loading from disk
//!
//! - DSL files use the `.schema` extension
//! - Files are read in file-name order so registry ids are deterministic
//! - An unreadable directory or file fails the load

use std::fs;
use std::path::{Path, PathBuf};

use super::errors::{SchemaError, SchemaResult};

/// File extension of DSL source files
pub const SCHEMA_EXTENSION: &str = "schema";

/// DSL text plus where it came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaSource {
    /// File path or caller-supplied label
    pub origin: String,
    pub text: String,
}

impl SchemaSource {
    pub fn new(origin: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            origin: origin.into(),
            text: text.into(),
        }
    }

    /// Reads one DSL file
    pub fn from_file(path: &Path) -> SchemaResult<Self> {
        let text = fs::read_to_string(path)
            .map_err(|e| SchemaError::unreadable(&path.display().to_string(), e))?;
        Ok(Self::new(path.display().to_string(), text))
    }
}

/// Reads every `.schema` file in a directory
pub struct SchemaLoader {
    schema_dir: PathBuf,
}

impl SchemaLoader {
    pub fn new(schema_dir: &Path) -> Self {
        Self {
            schema_dir: schema_dir.to_path_buf(),
        }
    }

    pub fn schema_dir(&self) -> &Path {
        &self.schema_dir
    }

    /// Loads all schema sources from the directory, sorted by file name
    pub fn load_all(&self) -> SchemaResult<Vec<SchemaSource>> {
        let dir = self.schema_dir.display().to_string();
        let entries = fs::read_dir(&self.schema_dir).map_err(|e| SchemaError::unreadable(&dir, e))?;

        let mut paths = Vec::new();
        for entry in entries {
            let path = entry.map_err(|e| SchemaError::unreadable(&dir, e))?.path();
            if path.is_file() && path.extension().is_some_and(|ext| ext == SCHEMA_EXTENSION) {
                paths.push(path);
            }
        }
        paths.sort();

        paths.iter().map(|p| SchemaSource::from_file(p)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::SchemaErrorCode;
    use tempfile::TempDir;

    #[test]
    fn test_load_sorted_and_filtered() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join("b.schema"), "binary B { X: byte }").unwrap();
        fs::write(temp_dir.path().join("a.schema"), "binary A { X: byte }").unwrap();
        fs::write(temp_dir.path().join("notes.txt"), "not a schema").unwrap();

        let sources = SchemaLoader::new(temp_dir.path()).load_all().unwrap();
        assert_eq!(sources.len(), 2);
        assert!(sources[0].origin.ends_with("a.schema"));
        assert_eq!(sources[1].text, "binary B { X: byte }");
    }

    #[test]
    fn test_load_empty_directory() {
        let temp_dir = TempDir::new().unwrap();
        let sources = SchemaLoader::new(temp_dir.path()).load_all().unwrap();
        assert!(sources.is_empty());
    }

    #[test]
    fn test_missing_directory() {
        let temp_dir = TempDir::new().unwrap();
        let loader = SchemaLoader::new(&temp_dir.path().join("missing"));
        let err = loader.load_all().unwrap_err();
        assert_eq!(err.code(), SchemaErrorCode::AeroSchemaSourceUnreadable);
    }
}
