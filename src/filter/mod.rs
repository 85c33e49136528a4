//! Row/column filtering of feature sets.

mod degenerate;
mod threshold;

pub use degenerate::{
    drop_all_missing, drop_class_degenerate, drop_near_constant, DegeneracyOutcome,
    NEAR_CONSTANT_TOL,
};
pub use threshold::{apply_threshold, threshold_keep_mask, Axis, ThresholdOutcome};
