//! File-backed neighborhood source.
//!
//! A fixture file lists canned neighborhoods keyed by request:
//!
//! ```yaml
//! neighborhoods:
//!   - request:
//!       kind: package
//!       ecosystem: npm
//!       identity: pkg:npm/express
//!     fragment:
//!       nodes:
//!         - { id: "pkg:npm/express@4.19.2", type: version }
//!       edges:
//!         - { id: e1, source: "pkg:npm/express", target: "pkg:npm/express@4.19.2", type: has_version }
//! ```
//!
//! Files ending in `.json` are parsed as JSON, everything else as YAML.
//! Fragments are kept raw, so a fixture can reproduce malformed server data.

use super::{NeighborhoodRequest, NeighborhoodSource};
use crate::domain::RawFragment;
use crate::error::{Error, FetchError, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tokio::fs;

/// One canned neighborhood.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FixtureEntry {
    /// Request this entry answers
    pub request: NeighborhoodRequest,

    /// Fragment returned for the request
    #[serde(default)]
    pub fragment: RawFragment,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct FixtureFile {
    #[serde(default)]
    neighborhoods: Vec<FixtureEntry>,
}

/// Neighborhood source answering from a fixed list of entries.
#[derive(Debug, Clone, Default)]
pub struct FixtureSource {
    entries: Vec<FixtureEntry>,
}

impl FixtureSource {
    /// Create a source from in-memory entries.
    #[must_use]
    pub fn from_entries(entries: Vec<FixtureEntry>) -> Self {
        Self { entries }
    }

    /// Load a fixture file.
    ///
    /// # Errors
    ///
    /// - `Error::Io` if the file cannot be read
    /// - `Error::Fixture` if it does not parse
    pub async fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).await?;
        let is_json = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

        let file: FixtureFile = if is_json {
            serde_json::from_str(&content)
                .map_err(|e| Error::Fixture(format!("{}: {}", path.display(), e)))?
        } else {
            serde_yaml::from_str(&content)
                .map_err(|e| Error::Fixture(format!("{}: {}", path.display(), e)))?
        };

        tracing::debug!(
            path = %path.display(),
            entries = file.neighborhoods.len(),
            "Loaded neighborhood fixture"
        );
        Ok(Self::from_entries(file.neighborhoods))
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether there are no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn lookup(&self, request: &NeighborhoodRequest) -> Option<&FixtureEntry> {
        self.entries
            .iter()
            .find(|entry| answers(&entry.request, request))
    }
}

/// Whether an entry keyed on `key` answers `request`.
///
/// Kind and identity must match; an entry without constraints answers any
/// constraint.
fn answers(key: &NeighborhoodRequest, request: &NeighborhoodRequest) -> bool {
    use NeighborhoodRequest::{Package, RequirementFile, Version};

    match (key, request) {
        (Version { identity: a }, Version { identity: b })
        | (RequirementFile { identity: a }, RequirementFile { identity: b }) => a == b,
        (
            Package {
                ecosystem: key_ecosystem,
                identity: key_identity,
                constraints: key_constraints,
            },
            Package {
                ecosystem,
                identity,
                constraints,
            },
        ) => {
            key_ecosystem == ecosystem
                && key_identity == identity
                && key_constraints
                    .as_ref()
                    .is_none_or(|wanted| constraints.as_ref() == Some(wanted))
        }
        _ => false,
    }
}

#[async_trait]
impl NeighborhoodSource for FixtureSource {
    async fn fetch(
        &self,
        request: &NeighborhoodRequest,
    ) -> std::result::Result<RawFragment, FetchError> {
        match self.lookup(request) {
            Some(entry) => Ok(entry.fragment.clone()),
            None => Err(FetchError::NotFound(request.to_string())),
        }
    }
}
