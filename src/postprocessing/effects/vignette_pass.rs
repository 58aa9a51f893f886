//! Vignette post-processing effect.

use crate::galaxy::PostConfig;
use crate::postprocessing::pass::{
    draw_fullscreen, fullscreen_pipeline, linear_sampler, sampler_entry, texture_entry, uniform_entry, Pass,
    FULLSCREEN_QUAD_VERTICES, FULLSCREEN_VERTEX,
};
use wgpu::util::DeviceExt;

/// Distance from the center at which darkening begins.
pub const VIGNETTE_START: f32 = 0.8;

/// Darkening weight at `uv`: smoothstep from [`VIGNETTE_START`] to `offset`
/// over the distance to the screen center.
pub fn vignette_weight(uv: [f32; 2], offset: f32) -> f32 {
    let dist = ((uv[0] - 0.5).powi(2) + (uv[1] - 0.5).powi(2)).sqrt();
    smoothstep(VIGNETTE_START, offset, dist)
}

/// Apply the vignette to one color.
pub fn apply_vignette(rgb: [f32; 3], uv: [f32; 2], offset: f32, darkness: f32) -> [f32; 3] {
    let weight = vignette_weight(uv, offset);
    rgb.map(|c| c + (c * (1.0 - darkness) - c) * weight)
}

fn smoothstep(edge0: f32, edge1: f32, x: f32) -> f32 {
    let t = ((x - edge0) / (edge1 - edge0)).clamp(0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
}

/// Vignette uniform data.
#[repr(C)]
#[derive(Debug, Clone, Copy, bytemuck::Pod, bytemuck::Zeroable)]
struct VignetteUniform {
    /// offset, darkness, start, _
    params: [f32; 4],
}

/// Vignette post-processing pass.
pub struct VignettePass {
    enabled: bool,
    offset: f32,
    darkness: f32,
    pipeline: Option<wgpu::RenderPipeline>,
    bind_group_layout: Option<wgpu::BindGroupLayout>,
    uniform_buffer: Option<wgpu::Buffer>,
    quad_buffer: Option<wgpu::Buffer>,
    sampler: Option<wgpu::Sampler>,
}

impl VignettePass {
    /// Create a new vignette pass.
    pub fn new(config: &PostConfig) -> Self {
        Self {
            enabled: true,
            offset: config.vignette_offset,
            darkness: config.vignette_darkness,
            pipeline: None,
            bind_group_layout: None,
            uniform_buffer: None,
            quad_buffer: None,
            sampler: None,
        }
    }

    /// Distance at which full darkening is reached.
    pub fn offset(&self) -> f32 {
        self.offset
    }

    /// Darkening applied at the edge.
    pub fn darkness(&self) -> f32 {
        self.darkness
    }

    /// Set offset and darkness.
    pub fn set_params(&mut self, offset: f32, darkness: f32) {
        self.offset = offset;
        self.darkness = darkness;
    }

    /// Initialize GPU resources.
    pub fn init(&mut self, device: &wgpu::Device, format: wgpu::TextureFormat) {
        self.sampler = Some(linear_sampler(device, "Vignette Sampler"));

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Vignette Bind Group Layout"),
            entries: &[texture_entry(0), sampler_entry(1), uniform_entry(2)],
        });

        self.uniform_buffer = Some(device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Vignette Uniform Buffer"),
            contents: bytemuck::cast_slice(&[self.uniform()]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        }));

        self.quad_buffer = Some(device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Vignette Quad Buffer"),
            contents: bytemuck::cast_slice(&FULLSCREEN_QUAD_VERTICES),
            usage: wgpu::BufferUsages::VERTEX,
        }));

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Vignette Shader"),
            source: wgpu::ShaderSource::Wgsl(format!("{FULLSCREEN_VERTEX}{VIGNETTE_SHADER}").into()),
        });
        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Vignette Pipeline Layout"),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });
        self.pipeline = Some(fullscreen_pipeline(
            device,
            "Vignette Pipeline",
            &pipeline_layout,
            &shader,
            "fs_main",
            format,
        ));
        self.bind_group_layout = Some(bind_group_layout);
    }

    fn uniform(&self) -> VignetteUniform {
        VignetteUniform {
            params: [self.offset, self.darkness, VIGNETTE_START, 0.0],
        }
    }
}

impl Pass for VignettePass {
    fn name(&self) -> &str {
        "VignettePass"
    }

    fn enabled(&self) -> bool {
        self.enabled
    }

    fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    fn resize(&mut self, _width: u32, _height: u32, _device: &wgpu::Device) {}

    fn render(
        &self,
        encoder: &mut wgpu::CommandEncoder,
        input: &wgpu::TextureView,
        output: &wgpu::TextureView,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
    ) {
        let Some(pipeline) = &self.pipeline else { return };
        let Some(layout) = &self.bind_group_layout else { return };
        let Some(uniform_buffer) = &self.uniform_buffer else { return };
        let Some(quad_buffer) = &self.quad_buffer else { return };
        let Some(sampler) = &self.sampler else { return };

        queue.write_buffer(uniform_buffer, 0, bytemuck::cast_slice(&[self.uniform()]));

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Vignette Bind Group"),
            layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(input),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(sampler),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: uniform_buffer.as_entire_binding(),
                },
            ],
        });

        draw_fullscreen(encoder, "Vignette Pass", output, pipeline, &bind_group, quad_buffer);
    }
}

const VIGNETTE_SHADER: &str = r#"
@group(0) @binding(0) var input_texture: texture_2d<f32>;
@group(0) @binding(1) var input_sampler: sampler;
@group(0) @binding(2) var<uniform> params: vec4<f32>; // offset, darkness, start, _

@fragment
fn fs_main(in: VertexOutput) -> @location(0) vec4<f32> {
    let texel = textureSample(input_texture, input_sampler, in.uv);
    let dist = distance(in.uv, vec2<f32>(0.5));
    let vignette = smoothstep(params.z, params.x, dist);
    let rgb = mix(texel.rgb, texel.rgb * (1.0 - params.y), vignette);
    return vec4<f32>(rgb, texel.a);
}
"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_center_is_untouched() {
        assert_eq!(vignette_weight([0.5, 0.5], 1.2), 0.0);
        assert_eq!(apply_vignette([0.6, 0.4, 0.2], [0.5, 0.5], 1.2, 0.3), [0.6, 0.4, 0.2]);
    }

    #[test]
    fn test_default_offset_is_subtle() {
        // corners sit at ~0.707 from center, short of the 0.8 start
        let config = PostConfig::default();
        assert_eq!(vignette_weight([0.0, 0.0], config.vignette_offset), 0.0);
    }

    #[test]
    fn test_tighter_offset_darkens_corners() {
        let out = apply_vignette([1.0, 1.0, 1.0], [0.0, 0.0], 0.75, 0.5);
        assert!((out[0] - 0.5).abs() < 1e-6);

        let partial = vignette_weight([0.0, 0.0], 0.6);
        assert!(partial > 0.0 && partial < 1.0);
    }

    #[test]
    fn test_params_follow_config() {
        let mut pass = VignettePass::new(&PostConfig::default());
        assert_eq!(pass.offset(), 1.2);
        assert_eq!(pass.darkness(), 0.3);
        pass.set_params(1.0, 0.6);
        assert_eq!(pass.uniform().params, [1.0, 0.6, VIGNETTE_START, 0.0]);
    }
}
