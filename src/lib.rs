//! # Sombrero - scroll-driven galaxy backdrop
//!
//! Sombrero generates a procedural spiral galaxy (bulge, spiral-arm disk,
//! dust lane torus and background starfield) and renders it with wgpu as
//! instanced point sprites. A camera rig flies from a wide, tilted view
//! into the disk as the page scrolls, with a little pointer parallax.
//!
//! ## Modules
//!
//! - **galaxy**: typed configuration and the per-layer point generators
//! - **material**: the particle shader, its uniforms and a CPU reference of its math
//! - **controls**: scroll/pointer smoothing and the camera rig
//! - **core**: GPU context, renderer, per-frame scheduler and [`core::SceneContext`]
//! - **postprocessing**: optional bloom, vignette and output passes
//!
//! ## Example
//!
//! ```
//! use sombrero::prelude::*;
//!
//! let config = GalaxyConfig::default();
//! let galaxy = Galaxy::generate(&config).unwrap();
//! assert_eq!(galaxy.point_count(), 131_500);
//!
//! let mut scheduler = AnimationScheduler::new(&config, 1280, 720);
//! let frame = scheduler.tick(16.0).unwrap();
//! assert_eq!(frame.eased_scroll, 0.0);
//! ```

#![warn(missing_docs)]

#[cfg(feature = "web")]
use wasm_bindgen::prelude::*;

pub mod math;
pub mod galaxy;
pub mod material;
pub mod objects;
pub mod camera;
pub mod controls;
pub mod core;
pub mod postprocessing;

#[cfg(all(feature = "web", target_arch = "wasm32"))]
pub mod web;

// Re-export commonly used types
pub mod prelude {
    //! Convenient re-exports of commonly used types.

    pub use crate::math::*;
    pub use crate::galaxy::*;
    pub use crate::material::*;
    pub use crate::objects::*;
    pub use crate::camera::*;
    pub use crate::controls::*;
    pub use crate::core::*;
    pub use crate::postprocessing::*;
}

/// Initialize logging and panic reporting for WASM environments.
#[cfg(feature = "web")]
#[wasm_bindgen(start)]
pub fn init() {
    console_error_panic_hook::set_once();
    let _ = console_log::init_with_level(log::Level::Info);
}

/// Crate version string.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name.
pub const NAME: &str = "Sombrero";
