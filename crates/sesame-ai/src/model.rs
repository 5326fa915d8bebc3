//! Locating pose-model files.
//!
//! An explicitly configured path wins; otherwise the model is looked up in
//! the cache directory:
//! ```text
//! <cache_dir>/flying-sesame/models/pupil.onnx
//! ```

use crate::error::{AiError, AiResult};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// File name of the default pupil model.
pub const DEFAULT_MODEL_FILE: &str = "pupil.onnx";

/// Resolves model files against a cache directory.
#[derive(Debug, Clone)]
pub struct ModelLocator {
    cache_dir: PathBuf,
}

impl ModelLocator {
    pub fn new(cache_dir: impl Into<PathBuf>) -> Self {
        Self {
            cache_dir: cache_dir.into(),
        }
    }

    /// Locator rooted at the platform cache directory, if there is one.
    pub fn platform_default() -> Option<Self> {
        dirs::cache_dir().map(|d| Self::new(d.join("flying-sesame").join("models")))
    }

    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    /// Where the default model would live (may not exist yet).
    pub fn default_model_path(&self) -> PathBuf {
        self.cache_dir.join(DEFAULT_MODEL_FILE)
    }

    pub fn is_cached(&self) -> bool {
        self.default_model_path().is_file()
    }

    /// Path of the model to load: `configured` if given, else the cached
    /// default. Errors if the file is missing.
    pub fn resolve(&self, configured: Option<&Path>) -> AiResult<PathBuf> {
        let path = match configured {
            Some(p) => p.to_path_buf(),
            None => self.default_model_path(),
        };
        if path.is_file() {
            info!(path = %path.display(), "Pose model located");
            Ok(path)
        } else {
            debug!(path = %path.display(), "Pose model missing");
            Err(AiError::ModelNotFound { path })
        }
    }
}
