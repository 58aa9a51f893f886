//! Post-processing effects and effect composer.
//!
//! When bloom is enabled the layers render into an HDR scene target, which
//! is run through bloom and vignette before the output pass writes the
//! surface.

mod pass;
mod effect_composer;
pub mod effects;

pub use pass::{FullscreenVertex, Pass, FULLSCREEN_QUAD_VERTICES};
pub use effect_composer::*;
pub use effects::*;
