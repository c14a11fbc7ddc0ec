//! Human-subjects research metrics: survey reliability and effect sizes.

mod reliability;

pub use crate::stats::{cohen_d, hedges_g};
pub use reliability::{cronbach_alpha, cronbach_alpha_table};
