//! Final output pass: exposure and tone mapping into the surface format.

use crate::galaxy::{PostConfig, ToneMapping};
use crate::postprocessing::pass::{
    draw_fullscreen, fullscreen_pipeline, linear_sampler, sampler_entry, texture_entry, uniform_entry, Pass,
    FULLSCREEN_QUAD_VERTICES, FULLSCREEN_VERTEX,
};
use wgpu::util::DeviceExt;

impl ToneMapping {
    fn as_u32(&self) -> u32 {
        match self {
            ToneMapping::Linear => 0,
            ToneMapping::Reinhard => 1,
            ToneMapping::Aces => 2,
        }
    }

    /// Map one exposed channel value.
    pub fn apply(&self, value: f32) -> f32 {
        let mapped = match self {
            ToneMapping::Linear => value,
            ToneMapping::Reinhard => value / (value + 1.0),
            // Narkowicz fit
            ToneMapping::Aces => (value * (2.51 * value + 0.03)) / (value * (2.43 * value + 0.59) + 0.14),
        };
        mapped.clamp(0.0, 1.0)
    }
}

/// Output uniform data.
#[repr(C)]
#[derive(Debug, Clone, Copy, bytemuck::Pod, bytemuck::Zeroable)]
struct OutputUniform {
    exposure: f32,
    mode: u32,
    _padding: [u32; 2],
}

/// Writes the HDR chain result to the presentable surface.
pub struct OutputPass {
    enabled: bool,
    exposure: f32,
    tone_mapping: ToneMapping,
    pipeline: Option<wgpu::RenderPipeline>,
    bind_group_layout: Option<wgpu::BindGroupLayout>,
    uniform_buffer: Option<wgpu::Buffer>,
    quad_buffer: Option<wgpu::Buffer>,
    sampler: Option<wgpu::Sampler>,
}

impl OutputPass {
    /// Create an output pass.
    pub fn new(config: &PostConfig) -> Self {
        Self {
            enabled: true,
            exposure: config.exposure,
            tone_mapping: config.tone_mapping,
            pipeline: None,
            bind_group_layout: None,
            uniform_buffer: None,
            quad_buffer: None,
            sampler: None,
        }
    }

    /// Exposure multiplier.
    pub fn exposure(&self) -> f32 {
        self.exposure
    }

    /// Set the exposure multiplier.
    pub fn set_exposure(&mut self, exposure: f32) {
        self.exposure = exposure;
    }

    /// Active tone mapping curve.
    pub fn tone_mapping(&self) -> ToneMapping {
        self.tone_mapping
    }

    /// Switch the tone mapping curve.
    pub fn set_tone_mapping(&mut self, tone_mapping: ToneMapping) {
        self.tone_mapping = tone_mapping;
    }

    /// Initialize GPU resources. `format` is the surface format.
    pub fn init(&mut self, device: &wgpu::Device, format: wgpu::TextureFormat) {
        self.sampler = Some(linear_sampler(device, "Output Sampler"));

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Output Bind Group Layout"),
            entries: &[texture_entry(0), sampler_entry(1), uniform_entry(2)],
        });

        self.uniform_buffer = Some(device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Output Uniform Buffer"),
            contents: bytemuck::cast_slice(&[self.uniform()]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        }));

        self.quad_buffer = Some(device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Output Quad Buffer"),
            contents: bytemuck::cast_slice(&FULLSCREEN_QUAD_VERTICES),
            usage: wgpu::BufferUsages::VERTEX,
        }));

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Output Shader"),
            source: wgpu::ShaderSource::Wgsl(format!("{FULLSCREEN_VERTEX}{OUTPUT_SHADER}").into()),
        });
        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Output Pipeline Layout"),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });
        self.pipeline = Some(fullscreen_pipeline(
            device,
            "Output Pipeline",
            &pipeline_layout,
            &shader,
            "fs_main",
            format,
        ));
        self.bind_group_layout = Some(bind_group_layout);
    }

    fn uniform(&self) -> OutputUniform {
        OutputUniform {
            exposure: self.exposure,
            mode: self.tone_mapping.as_u32(),
            _padding: [0; 2],
        }
    }
}

impl Pass for OutputPass {
    fn name(&self) -> &str {
        "OutputPass"
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
            label: Some("Output Bind Group"),
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

        draw_fullscreen(encoder, "Output Pass", output, pipeline, &bind_group, quad_buffer);
    }
}

const OUTPUT_SHADER: &str = r#"
struct Params {
    exposure: f32,
    mode: u32,
    _padding: vec2<u32>,
}

@group(0) @binding(0) var input_texture: texture_2d<f32>;
@group(0) @binding(1) var input_sampler: sampler;
@group(0) @binding(2) var<uniform> params: Params;

fn tonemap_reinhard(color: vec3<f32>) -> vec3<f32> {
    return color / (color + vec3<f32>(1.0));
}

fn tonemap_aces(color: vec3<f32>) -> vec3<f32> {
    let a = 2.51;
    let b = 0.03;
    let c = 2.43;
    let d = 0.59;
    let e = 0.14;
    return (color * (a * color + b)) / (color * (c * color + d) + e);
}

@fragment
fn fs_main(in: VertexOutput) -> @location(0) vec4<f32> {
    let texel = textureSample(input_texture, input_sampler, in.uv);
    var color = texel.rgb * params.exposure;

    switch params.mode {
        case 1u: {
            color = tonemap_reinhard(color);
        }
        case 2u: {
            color = tonemap_aces(color);
        }
        default: {}
    }

    return vec4<f32>(saturate(color), saturate(texel.a));
}
"#;
