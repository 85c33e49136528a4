//! Quality-code masking and good-value profiling.

mod mask;
mod profile;

pub use mask::{mask_special_values, MaskOutcome};
pub use profile::{profile_good_values, GoodValueProfile};
