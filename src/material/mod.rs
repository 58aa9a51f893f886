//! # Material Module
//!
//! The particle program shared by every galaxy layer, its uniform blocks,
//! and a CPU mirror of its vertex and fragment math.

mod particle;
pub mod shader_contract;

pub use particle::{
    camera_bind_group_layout, layer_bind_group_layout, shader_source, CameraUniform, GradientStyle,
    LayerStyle, LayerUniform, ParticleBlendMode, ParticleInstance, ParticleMaterial,
};

use crate::galaxy::LayerKind;
use thiserror::Error;

/// Errors raised while compiling a layer's material.
#[derive(Error, Debug)]
pub enum MaterialError {
    /// wgpu rejected the shader or pipeline for a layer.
    #[error("shader validation failed for {layer} layer: {message}")]
    ShaderValidation {
        /// Layer being compiled.
        layer: LayerKind,
        /// Validation message from the device.
        message: String,
    },
}
