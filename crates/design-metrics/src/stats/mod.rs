//! Effect-size statistics.

mod effect_sizes;

pub use effect_sizes::{cohen_d, hedges_g, pooled_std};
