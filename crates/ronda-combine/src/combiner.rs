//! Core trait definition for score combiners.

use ndarray::Array1;
use ronda_traits::{Result, RondaError};

/// Scores of one component factor over a cross-section.
///
/// Position `i` of every component passed to one [`Combiner::combine`] call
/// refers to the same security. Absent values are `NaN`.
#[derive(Debug, Clone)]
pub struct ComponentScores {
    /// Component factor name.
    pub name: String,

    /// One score per security, `NaN` where the component is undefined.
    pub scores: Array1<f64>,
}

impl ComponentScores {
    /// Create a component from its name and scores.
    pub fn new(name: impl Into<String>, scores: Array1<f64>) -> Self {
        Self {
            name: name.into(),
            scores,
        }
    }

    /// Number of securities in the cross-section.
    pub fn len(&self) -> usize {
        self.scores.len()
    }

    /// Whether the cross-section is empty.
    pub fn is_empty(&self) -> bool {
        self.scores.is_empty()
    }
}

/// Combines several component score vectors into one composite vector.
///
/// All implementations must be thread-safe (Send + Sync) so composites can be
/// built for many dates in parallel.
pub trait Combiner: Send + Sync {
    /// Combine aligned components into a composite of the same length.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - No components are provided
    /// - Component vectors have mismatched lengths
    fn combine(&self, components: &[ComponentScores]) -> Result<Array1<f64>>;

    /// Name of this combination strategy.
    fn name(&self) -> &str;
}

/// Check that `components` is non-empty and equally sized, returning the size.
pub(crate) fn aligned_len(components: &[ComponentScores]) -> Result<usize> {
    let first = components.first().ok_or_else(|| {
        RondaError::InsufficientData("cannot combine zero components".to_string())
    })?;
    let n = first.len();

    if let Some(bad) = components.iter().find(|c| c.len() != n) {
        return Err(RondaError::InvalidData(format!(
            "component '{}' has {} securities, expected {}",
            bad.name,
            bad.len(),
            n
        )));
    }
    Ok(n)
}
