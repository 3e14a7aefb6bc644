//! Score combination for composite factors.
//!
//! A composite factor is built from several component score vectors that are
//! aligned on the same cross-section of securities. Components may be absent
//! for some securities (`NaN`); combiners skip absent entries instead of
//! treating them as zero.
//!
//! # Examples
//!
//! ```rust
//! use ronda_combine::{Combiner, EqualWeightCombiner, ComponentScores};
//! use ndarray::Array1;
//!
//! let combiner = EqualWeightCombiner::default();
//! let components = vec![
//!     ComponentScores::new("earnings_yield", Array1::from_vec(vec![0.5, f64::NAN, 1.0])),
//!     ComponentScores::new("book_to_market", Array1::from_vec(vec![-0.3, 0.8, 0.1])),
//! ];
//!
//! let composite = combiner.combine(&components).unwrap();
//! assert_eq!(composite[1], 0.8);
//! ```

mod combiner;
mod equal_weight;

// Re-export main types
pub use combiner::{Combiner, ComponentScores};
pub use equal_weight::{EqualWeightCombiner, EqualWeightConfig};
