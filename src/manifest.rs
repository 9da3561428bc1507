//! Test manifest data model and loading.
//!
//! A [`Manifest`] is the ordered sequence of [`Group`]s handed to the
//! chunker. Each group is a non-empty, contiguous run of [`TestEntry`]s that
//! share a grouping key, conventionally a directory path. Groups are atomic:
//! the chunker never splits one across two chunks, and never reorders them.
//!
//! # File Layouts
//!
//! Manifests are read from JSON (`.json`) or TOML (`.toml`) files in one of
//! two layouts:
//!
//! ```json
//! { "groups": [ { "key": "dom", "tests": [ { "id": "dom/test_a.html", "timeout": 45 } ] } ] }
//! ```
//!
//! ```json
//! { "tests": [ { "id": "dom/test_a.html" }, { "id": "dom/events/test_b.html" } ] }
//! ```
//!
//! The grouped layout is used as-is. The flat layout is grouped into
//! contiguous runs by each test's directory (see [`directory_key`]).

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

/// Result type for manifest operations.
pub type ManifestResult<T> = Result<T, ManifestError>;

/// Errors that can occur while building or loading a manifest.
#[derive(Debug, thiserror::Error)]
pub enum ManifestError {
    /// A group was declared without any tests.
    #[error("Group '{0}' contains no tests")]
    EmptyGroup(String),

    /// A test was declared with an empty identifier.
    #[error("Group '{0}' contains a test with an empty id")]
    EmptyTestId(String),

    /// A test declared a timeout that is not a finite number.
    #[error("Test '{test}' has a non-finite timeout ({timeout})")]
    InvalidTimeout { test: String, timeout: f64 },

    /// The manifest file used both or neither of the supported layouts.
    #[error("Manifest must contain exactly one of `groups` or `tests`")]
    AmbiguousLayout,

    /// The manifest file could not be parsed.
    #[error("Failed to parse manifest: {0}")]
    Parse(String),

    /// I/O error reading the manifest file.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// A single test and its declared timeout.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct TestEntry {
    /// Opaque test identifier, handed unchanged to the executor.
    pub id: String,

    /// Declared timeout in seconds, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout: Option<f64>,
}

impl TestEntry {
    /// Creates a test entry without a declared timeout.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            timeout: None,
        }
    }

    /// Sets the declared timeout.
    pub fn with_timeout(mut self, timeout: f64) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

/// An atomic run of tests sharing a grouping key.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Group {
    key: String,
    tests: Vec<TestEntry>,
}

impl Group {
    /// Creates a group, rejecting empty groups and malformed tests.
    pub fn new(key: impl Into<String>, tests: Vec<TestEntry>) -> ManifestResult<Self> {
        let group = Self {
            key: key.into(),
            tests,
        };
        group.validate()?;
        Ok(group)
    }

    /// Returns the grouping key.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Returns the tests in manifest order.
    pub fn tests(&self) -> &[TestEntry] {
        &self.tests
    }

    fn validate(&self) -> ManifestResult<()> {
        if self.tests.is_empty() {
            return Err(ManifestError::EmptyGroup(self.key.clone()));
        }
        for test in &self.tests {
            if test.id.is_empty() {
                return Err(ManifestError::EmptyTestId(self.key.clone()));
            }
            if let Some(timeout) = test.timeout
                && !timeout.is_finite()
            {
                return Err(ManifestError::InvalidTimeout {
                    test: test.id.clone(),
                    timeout,
                });
            }
        }
        Ok(())
    }
}

/// The full ordered sequence of groups for a CI run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Manifest {
    groups: Vec<Group>,
}

impl Manifest {
    /// Creates a manifest from already-grouped tests.
    pub fn new(groups: Vec<Group>) -> ManifestResult<Self> {
        for group in &groups {
            group.validate()?;
        }
        Ok(Self { groups })
    }

    /// Groups an ordered list of tests into contiguous runs by directory.
    ///
    /// Only adjacent tests are merged, so a directory that appears twice
    /// with other tests in between yields two separate groups.
    pub fn from_tests(tests: Vec<TestEntry>) -> ManifestResult<Self> {
        let mut groups: Vec<Group> = Vec::new();

        for test in tests {
            let key = directory_key(&test.id);
            match groups.last_mut() {
                Some(group) if group.key == key => group.tests.push(test),
                _ => groups.push(Group {
                    key: key.to_string(),
                    tests: vec![test],
                }),
            }
        }

        Self::new(groups)
    }

    /// Loads a manifest from a `.json` or `.toml` file.
    ///
    /// Files with any other extension are parsed as JSON.
    pub fn load(path: &Path) -> ManifestResult<Self> {
        let content = std::fs::read_to_string(path)?;
        let is_toml = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("toml"));

        let manifest = if is_toml {
            Self::from_toml_str(&content)?
        } else {
            Self::from_json_str(&content)?
        };

        debug!(
            "Loaded {} groups ({} tests) from {}",
            manifest.len(),
            manifest.test_count(),
            path.display()
        );
        Ok(manifest)
    }

    /// Parses a manifest from a JSON string.
    pub fn from_json_str(content: &str) -> ManifestResult<Self> {
        let file: ManifestFile =
            serde_json::from_str(content).map_err(|e| ManifestError::Parse(e.to_string()))?;
        file.into_manifest()
    }

    /// Parses a manifest from a TOML string.
    pub fn from_toml_str(content: &str) -> ManifestResult<Self> {
        let file: ManifestFile =
            toml::from_str(content).map_err(|e| ManifestError::Parse(e.to_string()))?;
        file.into_manifest()
    }

    /// Returns the groups in manifest order.
    pub fn groups(&self) -> &[Group] {
        &self.groups
    }

    /// Returns the number of groups.
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    /// Returns whether the manifest has no groups.
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Returns the total number of tests across all groups.
    pub fn test_count(&self) -> usize {
        self.groups.iter().map(|g| g.tests.len()).sum()
    }
}

/// On-disk manifest; exactly one of the two fields must be set.
#[derive(Deserialize)]
struct ManifestFile {
    groups: Option<Vec<Group>>,
    tests: Option<Vec<TestEntry>>,
}

impl ManifestFile {
    fn into_manifest(self) -> ManifestResult<Manifest> {
        match (self.groups, self.tests) {
            (Some(groups), None) => Manifest::new(groups),
            (None, Some(tests)) => Manifest::from_tests(tests),
            _ => Err(ManifestError::AmbiguousLayout),
        }
    }
}

/// Returns the directory a test id lives in.
///
/// Anything after the first `::` is ignored, then everything up to the last
/// `/` is the directory. Tests without a directory map to `"."`.
///
/// ```
/// use equichunk::manifest::directory_key;
///
/// assert_eq!(directory_key("dom/events/test_click.html"), "dom/events");
/// assert_eq!(directory_key("tests/test_math.py::TestAdd::test_ints"), "tests");
/// assert_eq!(directory_key("test_root.py"), ".");
/// ```
pub fn directory_key(id: &str) -> &str {
    let path = id.split_once("::").map_or(id, |(path, _)| path);
    match path.rsplit_once('/') {
        Some((dir, _)) if !dir.is_empty() => dir,
        _ => ".",
    }
}
