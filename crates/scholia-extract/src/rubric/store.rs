//! Rubric persistence.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use scholia_core::{Error, Result};

use super::Rubric;

/// Keyed storage for rubric documents.
pub trait RubricStore: Send + Sync {
    /// Load and validate a rubric.
    ///
    /// A missing rubric is [`Error::RubricNotFound`]; an unparseable or
    /// invalid one is [`Error::Config`].
    fn load(&self, id: &str) -> Result<Rubric>;

    /// Persist a rubric under its id, replacing any previous version.
    fn save(&self, rubric: &Rubric) -> Result<()>;

    fn exists(&self, id: &str) -> bool;

    /// Stored ids, sorted.
    fn list_ids(&self) -> Result<Vec<String>>;
}

/// Human-editable YAML files, one `<id>.yaml` per rubric.
#[derive(Debug, Clone)]
pub struct YamlRubricStore {
    dir: PathBuf,
}

impl YamlRubricStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, id: &str) -> PathBuf {
        self.dir.join(format!("{}.yaml", id))
    }
}

/// Parse and validate a rubric document.
pub fn parse_rubric(yaml: &str, origin: &str) -> Result<Rubric> {
    let rubric: Rubric = serde_yaml::from_str(yaml)
        .map_err(|e| Error::Config(format!("invalid rubric {}: {}", origin, e)))?;
    rubric.validate()?;
    Ok(rubric)
}

impl RubricStore for YamlRubricStore {
    fn load(&self, id: &str) -> Result<Rubric> {
        let path = self.path_for(id);
        let yaml = match std::fs::read_to_string(&path) {
            Ok(yaml) => yaml,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(Error::RubricNotFound(id.to_string()));
            }
            Err(e) => return Err(e.into()),
        };
        let rubric = parse_rubric(&yaml, &path.display().to_string())?;
        if rubric.id != id {
            tracing::warn!(
                subsystem = "catalog",
                component = "yaml_store",
                rubric_id = %id,
                declared_id = %rubric.id,
                "Rubric file declares a different id"
            );
        }
        Ok(rubric)
    }

    fn save(&self, rubric: &Rubric) -> Result<()> {
        rubric.validate()?;
        std::fs::create_dir_all(&self.dir)?;
        let yaml = serde_yaml::to_string(rubric)?;
        std::fs::write(self.path_for(&rubric.id), yaml)?;
        tracing::debug!(
            subsystem = "catalog",
            component = "yaml_store",
            rubric_id = %rubric.id,
            "Saved rubric"
        );
        Ok(())
    }

    fn exists(&self, id: &str) -> bool {
        self.path_for(id).is_file()
    }

    fn list_ids(&self) -> Result<Vec<String>> {
        let entries = match std::fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut ids = Vec::new();
        for entry in entries {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some("yaml") {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                ids.push(stem.to_string());
            }
        }
        ids.sort();
        Ok(ids)
    }
}

/// Volatile store for tests and embedding callers.
#[derive(Debug, Default)]
pub struct InMemoryRubricStore {
    rubrics: RwLock<HashMap<String, Rubric>>,
}

impl InMemoryRubricStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_rubrics(rubrics: impl IntoIterator<Item = Rubric>) -> Self {
        let map = rubrics.into_iter().map(|r| (r.id.clone(), r)).collect();
        Self {
            rubrics: RwLock::new(map),
        }
    }
}

impl RubricStore for InMemoryRubricStore {
    fn load(&self, id: &str) -> Result<Rubric> {
        let rubrics = self.rubrics.read().unwrap_or_else(|e| e.into_inner());
        rubrics
            .get(id)
            .cloned()
            .ok_or_else(|| Error::RubricNotFound(id.to_string()))
    }

    fn save(&self, rubric: &Rubric) -> Result<()> {
        rubric.validate()?;
        let mut rubrics = self.rubrics.write().unwrap_or_else(|e| e.into_inner());
        rubrics.insert(rubric.id.clone(), rubric.clone());
        Ok(())
    }

    fn exists(&self, id: &str) -> bool {
        let rubrics = self.rubrics.read().unwrap_or_else(|e| e.into_inner());
        rubrics.contains_key(id)
    }

    fn list_ids(&self) -> Result<Vec<String>> {
        let rubrics = self.rubrics.read().unwrap_or_else(|e| e.into_inner());
        let mut ids: Vec<String> = rubrics.keys().cloned().collect();
        ids.sort();
        Ok(ids)
    }
}
