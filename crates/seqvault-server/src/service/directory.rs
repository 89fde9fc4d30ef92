//! Laboratory directory lookups.

use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use std::sync::Arc;

use seqvault_core::Laboratory;

use crate::{Error, Result};

/// Tracing target for laboratory lookups.
const TRACING_TARGET: &str = "seqvault_server::directory";

/// Resolves laboratory identifiers to laboratory records.
#[async_trait::async_trait]
pub trait LaboratoryDirectory: Send + Sync {
    /// Returns the laboratory, or `None` if the identifier is unknown.
    async fn find_laboratory(&self, laboratory_id: &str) -> Result<Option<Laboratory>>;
}

/// Cloneable handle to any [`LaboratoryDirectory`].
#[derive(Clone)]
pub struct Directory {
    inner: Arc<dyn LaboratoryDirectory>,
}

impl Directory {
    /// Wraps a concrete directory.
    pub fn new<D>(directory: D) -> Self
    where
        D: LaboratoryDirectory + 'static,
    {
        Self {
            inner: Arc::new(directory),
        }
    }

    /// Looks up a laboratory by identifier.
    pub async fn find_laboratory(&self, laboratory_id: &str) -> Result<Option<Laboratory>> {
        let laboratory = self.inner.find_laboratory(laboratory_id).await?;

        tracing::debug!(
            target: TRACING_TARGET,
            laboratory_id,
            found = laboratory.is_some(),
            "Laboratory lookup"
        );

        Ok(laboratory)
    }
}

impl fmt::Debug for Directory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Directory").finish_non_exhaustive()
    }
}

/// Directory backed by a fixed set of laboratories.
#[derive(Debug, Clone, Default)]
pub struct StaticDirectory {
    laboratories: HashMap<String, Laboratory>,
}

impl StaticDirectory {
    /// Creates a directory holding the given laboratories.
    pub fn new(laboratories: impl IntoIterator<Item = Laboratory>) -> Self {
        let laboratories = laboratories
            .into_iter()
            .map(|laboratory| (laboratory.laboratory_id.clone(), laboratory))
            .collect();

        Self { laboratories }
    }

    /// Loads laboratories from a JSON file holding an array of records.
    pub async fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        let contents = tokio::fs::read(path).await.map_err(|e| {
            tracing::error!(
                target: TRACING_TARGET,
                path = %path.display(),
                error = %e,
                "Failed to read laboratories file"
            );
            Error::file_system("failed to read laboratories file").with_source(e)
        })?;

        let laboratories: Vec<Laboratory> = serde_json::from_slice(&contents).map_err(|e| {
            tracing::error!(
                target: TRACING_TARGET,
                path = %path.display(),
                error = %e,
                "Failed to parse laboratories file"
            );
            Error::config("laboratories file is not a JSON array of laboratories").with_source(e)
        })?;

        tracing::info!(
            target: TRACING_TARGET,
            path = %path.display(),
            count = laboratories.len(),
            "Laboratories loaded"
        );

        Ok(Self::new(laboratories))
    }

    /// Number of known laboratories.
    pub fn len(&self) -> usize {
        self.laboratories.len()
    }

    /// Returns `true` if no laboratory is known.
    pub fn is_empty(&self) -> bool {
        self.laboratories.is_empty()
    }
}

#[async_trait::async_trait]
impl LaboratoryDirectory for StaticDirectory {
    async fn find_laboratory(&self, laboratory_id: &str) -> Result<Option<Laboratory>> {
        Ok(self.laboratories.get(laboratory_id).cloned())
    }
}
