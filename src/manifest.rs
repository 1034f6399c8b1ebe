use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

pub const DEFAULT_MANIFEST_NAME: &str = "manifest.yaml";

#[derive(Error, Debug)]
pub enum ManifestError {
    #[error("failed to read manifest {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("manifest {} is not valid YAML: {source}", path.display())]
    Parse {
        path: PathBuf,
        source: serde_yaml_ng::Error,
    },

    #[error("manifest lists no exam files")]
    Empty,
}

/// Accepts either a bare list of file names or `files: [...]`.
#[derive(Deserialize, Debug)]
#[serde(untagged)]
enum ManifestFile {
    List(Vec<String>),
    Table { files: Vec<String> },
}

/// Ordered list of exam file names, shared by the validator and the importer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Manifest {
    files: Vec<String>,
}

impl Manifest {
    pub fn new(files: Vec<String>) -> Result<Self, ManifestError> {
        if files.is_empty() {
            return Err(ManifestError::Empty);
        }
        Ok(Self { files })
    }

    pub fn from_yaml(content: &str, path: &Path) -> Result<Self, ManifestError> {
        let parsed: ManifestFile =
            serde_yaml_ng::from_str(content).map_err(|source| ManifestError::Parse {
                path: path.to_path_buf(),
                source,
            })?;

        let files = match parsed {
            ManifestFile::List(files) => files,
            ManifestFile::Table { files } => files,
        };
        Self::new(files)
    }

    pub fn load(path: &Path) -> Result<Self, ManifestError> {
        let content = fs::read_to_string(path).map_err(|source| ManifestError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml(&content, path)
    }

    /// Explicit file names win over a manifest path, which wins over
    /// `manifest.yaml` inside the seed directory.
    pub fn resolve(
        files: &[String],
        manifest_path: Option<&Path>,
        seed_dir: &Path,
    ) -> Result<Self, ManifestError> {
        if !files.is_empty() {
            return Self::new(files.to_vec());
        }
        match manifest_path {
            Some(path) => Self::load(path),
            None => Self::load(&seed_dir.join(DEFAULT_MANIFEST_NAME)),
        }
    }

    pub fn files(&self) -> &[String] {
        &self.files
    }

    /// Never zero: [`Manifest::new`] rejects an empty list.
    #[allow(clippy::len_without_is_empty)]
    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn paths<'a>(
        &'a self,
        seed_dir: &'a Path,
    ) -> impl Iterator<Item = (&'a str, PathBuf)> + 'a {
        self.files
            .iter()
            .map(move |name| (name.as_str(), seed_dir.join(name)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_bare_list() {
        let manifest = Manifest::from_yaml(
            "- original_exam_001.json\n- original_exam_011.json\n",
            Path::new("manifest.yaml"),
        )
        .unwrap();
        assert_eq!(
            manifest.files(),
            ["original_exam_001.json", "original_exam_011.json"]
        );
    }

    #[test]
    fn parses_files_table_and_json() {
        let yaml = Manifest::from_yaml("files:\n  - a.json\n", Path::new("m.yaml")).unwrap();
        let json = Manifest::from_yaml(r#"{"files": ["a.json"]}"#, Path::new("m.json")).unwrap();
        assert_eq!(yaml, json);
        assert_eq!(yaml.len(), 1);
    }

    #[test]
    fn empty_manifest_is_rejected() {
        assert!(matches!(
            Manifest::from_yaml("[]", Path::new("m.yaml")),
            Err(ManifestError::Empty)
        ));
    }

    #[test]
    fn explicit_files_take_precedence() {
        let manifest = Manifest::resolve(
            &[String::from("x.json")],
            Some(Path::new("/does/not/exist.yaml")),
            Path::new("seed"),
        )
        .unwrap();
        assert_eq!(manifest.files(), ["x.json"]);

        let paths: Vec<PathBuf> = manifest.paths(Path::new("seed")).map(|(_, p)| p).collect();
        assert_eq!(paths, vec![PathBuf::from("seed/x.json")]);
    }

    #[test]
    fn missing_default_manifest_reports_path() {
        let err = Manifest::resolve(&[], None, Path::new("/nonexistent-seed")).unwrap_err();
        assert!(err.to_string().contains("/nonexistent-seed/manifest.yaml"));
    }
}
