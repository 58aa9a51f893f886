//! Input tracking and the scroll-driven camera rig.

mod camera_rig;
mod input;

pub use camera_rig::{CameraRig, RigInput, RigState};
pub use input::{InputState, ScrollReference};
