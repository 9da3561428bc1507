//! Weight model for estimating test execution cost.
//!
//! A test's weight is its declared timeout when that timeout is positive,
//! otherwise a fixed default. A group weighs the sum of its tests.

use crate::chunk::{ChunkError, ChunkResult};
use crate::manifest::{Group, TestEntry};

/// Weight assigned to a test that declares no usable timeout.
pub const DEFAULT_WEIGHT: f64 = 1.0;

/// Computes estimated run-time costs for tests and groups.
///
/// # Example
///
/// ```
/// use equichunk::manifest::TestEntry;
/// use equichunk::weight::WeightModel;
///
/// let model = WeightModel::default();
/// assert_eq!(model.test_weight(&TestEntry::new("a/test_one")), 1.0);
/// assert_eq!(model.test_weight(&TestEntry::new("a/test_two").with_timeout(30.0)), 30.0);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WeightModel {
    default_weight: f64,
}

impl WeightModel {
    /// Creates a weight model with the given default weight.
    ///
    /// The default must be finite and positive.
    pub fn new(default_weight: f64) -> ChunkResult<Self> {
        if !default_weight.is_finite() || default_weight <= 0.0 {
            return Err(ChunkError::InvalidArgument(format!(
                "default weight must be a positive number, got {default_weight}"
            )));
        }
        Ok(Self { default_weight })
    }

    /// Returns the weight used for tests without a positive timeout.
    pub fn default_weight(&self) -> f64 {
        self.default_weight
    }

    /// Returns the weight of a single test.
    pub fn test_weight(&self, test: &TestEntry) -> f64 {
        match test.timeout {
            Some(timeout) if timeout > 0.0 => timeout,
            _ => self.default_weight,
        }
    }

    /// Returns the summed weight of every test in the group.
    pub fn group_weight(&self, group: &Group) -> f64 {
        group.tests().iter().map(|t| self.test_weight(t)).sum()
    }
}

impl Default for WeightModel {
    fn default() -> Self {
        Self {
            default_weight: DEFAULT_WEIGHT,
        }
    }
}
