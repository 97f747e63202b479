//! Cube catalogs: finding models by name and turning them into cubes.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock};

use dashmap::DashMap;
use tracing::{debug, info};

use crate::cube::Cube;
use crate::error::{BabbageError, BabbageResult};
use crate::metadata::Backend;
use crate::model::Model;
use crate::planner::DEFAULT_PAGE_MAX;

/// A source of named cube models.
pub trait CubeCatalog: Send + Sync {
    /// Names of every available cube, sorted.
    fn list_cubes(&self) -> BabbageResult<Vec<String>>;

    fn has_cube(&self, name: &str) -> BabbageResult<bool> {
        Ok(self.list_cubes()?.iter().any(|c| c == name))
    }

    /// The model of `name`, or [`BabbageError::NoSuchCube`].
    fn get_cube_model(&self, name: &str) -> BabbageResult<Model>;

    fn get_cube(&self, name: &str) -> BabbageResult<Arc<Cube>>;
}

/// Cube names double as file stems, so they are restricted to a safe set.
fn is_valid_name(name: &str) -> bool {
    !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}

/// A directory of `<name>.json` model files over one shared backend.
pub struct JsonCubeCatalog {
    directory: PathBuf,
    backend: Arc<dyn Backend>,
    page_max: u64,
}

impl JsonCubeCatalog {
    pub fn new(directory: impl Into<PathBuf>, backend: Arc<dyn Backend>) -> Self {
        Self {
            directory: directory.into(),
            backend,
            page_max: DEFAULT_PAGE_MAX,
        }
    }

    /// Page size cap handed to every cube this catalog builds.
    pub fn with_page_max(mut self, page_max: u64) -> Self {
        self.page_max = page_max;
        self
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    fn model_path(&self, name: &str) -> PathBuf {
        self.directory.join(format!("{name}.json"))
    }
}

impl CubeCatalog for JsonCubeCatalog {
    fn list_cubes(&self) -> BabbageResult<Vec<String>> {
        let mut names = Vec::new();
        for entry in fs::read_dir(&self.directory)? {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                if is_valid_name(stem) {
                    names.push(stem.to_string());
                }
            }
        }
        names.sort();
        Ok(names)
    }

    fn has_cube(&self, name: &str) -> BabbageResult<bool> {
        Ok(is_valid_name(name) && self.model_path(name).is_file())
    }

    fn get_cube_model(&self, name: &str) -> BabbageResult<Model> {
        if !self.has_cube(name)? {
            return Err(BabbageError::NoSuchCube(name.to_string()));
        }
        let path = self.model_path(name);
        debug!(cube = name, path = %path.display(), "loading model");
        let text = fs::read_to_string(&path)?;
        Model::from_json(&text).map_err(|err| match err {
            BabbageError::Model(message) => {
                BabbageError::Model(format!("{}: {message}", path.display()))
            }
            other => other,
        })
    }

    fn get_cube(&self, name: &str) -> BabbageResult<Arc<Cube>> {
        let model = self.get_cube_model(name)?;
        info!(cube = name, fact_table = model.fact_table(), "constructed cube");
        Ok(Arc::new(
            Cube::new(name, model, Arc::clone(&self.backend)).with_page_max(self.page_max),
        ))
    }
}

/// A [`JsonCubeCatalog`] that lists the directory once and builds each cube
/// once, so reflected tables are reused across requests.
pub struct CachingJsonCubeCatalog {
    inner: JsonCubeCatalog,
    names: OnceLock<Vec<String>>,
    cubes: DashMap<String, Arc<Cube>>,
}

impl CachingJsonCubeCatalog {
    pub fn new(inner: JsonCubeCatalog) -> Self {
        Self {
            inner,
            names: OnceLock::new(),
            cubes: DashMap::new(),
        }
    }
}

impl CubeCatalog for CachingJsonCubeCatalog {
    fn list_cubes(&self) -> BabbageResult<Vec<String>> {
        if let Some(names) = self.names.get() {
            return Ok(names.clone());
        }
        let names = self.inner.list_cubes()?;
        Ok(self.names.get_or_init(|| names).clone())
    }

    fn get_cube_model(&self, name: &str) -> BabbageResult<Model> {
        self.inner.get_cube_model(name)
    }

    fn get_cube(&self, name: &str) -> BabbageResult<Arc<Cube>> {
        if let Some(cube) = self.cubes.get(name) {
            return Ok(Arc::clone(cube.value()));
        }
        if !self.has_cube(name)? {
            return Err(BabbageError::NoSuchCube(name.to_string()));
        }
        let cube = self.inner.get_cube(name)?;
        Ok(Arc::clone(self.cubes.entry(name.to_string()).or_insert(cube).value()))
    }
}

impl std::fmt::Debug for JsonCubeCatalog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JsonCubeCatalog")
            .field("directory", &self.directory)
            .field("page_max", &self.page_max)
            .finish_non_exhaustive()
    }
}
