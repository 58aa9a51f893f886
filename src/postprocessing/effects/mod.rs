//! Post-processing effects.

mod bloom_pass;
mod output_pass;
mod vignette_pass;

pub use bloom_pass::*;
pub use output_pass::*;
pub use vignette_pass::*;
