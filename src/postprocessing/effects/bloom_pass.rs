//! Bloom post-processing effect.
//!
//! Bright pixels are extracted at half resolution, blurred with a separable
//! Gaussian, then added back over the scene.

use crate::galaxy::BloomConfig;
use crate::postprocessing::pass::{
    draw_fullscreen, fullscreen_pipeline, linear_sampler, sampler_entry, texture_entry, uniform_entry, Pass,
    FULLSCREEN_QUAD_VERTICES, FULLSCREEN_VERTEX,
};
use wgpu::util::DeviceExt;

/// Size of the bloom targets for a `width` x `height` scene.
pub fn bloom_extent(width: u32, height: u32) -> (u32, u32) {
    ((width / 2).max(1), (height / 2).max(1))
}

/// Blur tap spacing in texels for a 0-1 radius.
pub fn blur_step(radius: f32) -> f32 {
    1.0 + radius.clamp(0.0, 1.0) * 3.0
}

/// Bloom uniform data.
#[repr(C)]
#[derive(Debug, Clone, Copy, bytemuck::Pod, bytemuck::Zeroable)]
struct BloomUniform {
    threshold: f32,
    strength: f32,
    step: f32,
    _padding: f32,
    /// Bloom target width, height, 1/width, 1/height.
    resolution: [f32; 4],
}

/// Bloom post-processing pass.
pub struct BloomPass {
    enabled: bool,
    config: BloomConfig,
    width: u32,
    height: u32,
    format: wgpu::TextureFormat,
    threshold_pipeline: Option<wgpu::RenderPipeline>,
    blur_h_pipeline: Option<wgpu::RenderPipeline>,
    blur_v_pipeline: Option<wgpu::RenderPipeline>,
    combine_pipeline: Option<wgpu::RenderPipeline>,
    bind_group_layout: Option<wgpu::BindGroupLayout>,
    combine_layout: Option<wgpu::BindGroupLayout>,
    // bright, blur ping, blur pong
    targets: Vec<(wgpu::Texture, wgpu::TextureView)>,
    uniform_buffer: Option<wgpu::Buffer>,
    quad_buffer: Option<wgpu::Buffer>,
    sampler: Option<wgpu::Sampler>,
}

impl BloomPass {
    /// Create a bloom pass from the backdrop's bloom settings.
    pub fn new(config: &BloomConfig) -> Self {
        Self {
            enabled: true,
            config: config.clone(),
            width: 0,
            height: 0,
            format: wgpu::TextureFormat::Rgba16Float,
            threshold_pipeline: None,
            blur_h_pipeline: None,
            blur_v_pipeline: None,
            combine_pipeline: None,
            bind_group_layout: None,
            combine_layout: None,
            targets: Vec::new(),
            uniform_buffer: None,
            quad_buffer: None,
            sampler: None,
        }
    }

    /// Current settings.
    pub fn config(&self) -> &BloomConfig {
        &self.config
    }

    /// Replace settings. Takes effect on the next render.
    pub fn set_config(&mut self, config: BloomConfig) {
        self.config = config;
    }

    /// Initialize GPU resources for a scene of the given size.
    pub fn init(&mut self, device: &wgpu::Device, format: wgpu::TextureFormat, width: u32, height: u32) {
        self.width = width.max(1);
        self.height = height.max(1);
        self.format = format;

        self.sampler = Some(linear_sampler(device, "Bloom Sampler"));

        self.bind_group_layout = Some(device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Bloom Bind Group Layout"),
            entries: &[texture_entry(0), sampler_entry(1), uniform_entry(2)],
        }));
        self.combine_layout = Some(device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Bloom Combine Bind Group Layout"),
            entries: &[texture_entry(0), sampler_entry(1), uniform_entry(2), texture_entry(3)],
        }));

        self.uniform_buffer = Some(device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Bloom Uniform Buffer"),
            size: std::mem::size_of::<BloomUniform>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        }));

        self.quad_buffer = Some(device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Bloom Quad Buffer"),
            contents: bytemuck::cast_slice(&FULLSCREEN_QUAD_VERTICES),
            usage: wgpu::BufferUsages::VERTEX,
        }));

        self.create_pipelines(device, format);
        self.create_textures(device);
    }

    fn create_pipelines(&mut self, device: &wgpu::Device, format: wgpu::TextureFormat) {
        let (Some(layout), Some(combine_layout)) = (&self.bind_group_layout, &self.combine_layout) else {
            return;
        };

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Bloom Shader"),
            source: wgpu::ShaderSource::Wgsl(format!("{FULLSCREEN_VERTEX}{BLOOM_SHADER}").into()),
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Bloom Pipeline Layout"),
            bind_group_layouts: &[layout],
            push_constant_ranges: &[],
        });
        let combine_pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Bloom Combine Pipeline Layout"),
            bind_group_layouts: &[combine_layout],
            push_constant_ranges: &[],
        });

        self.threshold_pipeline = Some(fullscreen_pipeline(
            device,
            "Bloom Threshold Pipeline",
            &pipeline_layout,
            &shader,
            "fs_threshold",
            format,
        ));
        self.blur_h_pipeline = Some(fullscreen_pipeline(
            device,
            "Bloom Blur H Pipeline",
            &pipeline_layout,
            &shader,
            "fs_blur_h",
            format,
        ));
        self.blur_v_pipeline = Some(fullscreen_pipeline(
            device,
            "Bloom Blur V Pipeline",
            &pipeline_layout,
            &shader,
            "fs_blur_v",
            format,
        ));
        self.combine_pipeline = Some(fullscreen_pipeline(
            device,
            "Bloom Combine Pipeline",
            &combine_pipeline_layout,
            &shader,
            "fs_combine",
            format,
        ));
    }

    fn create_textures(&mut self, device: &wgpu::Device) {
        let (width, height) = bloom_extent(self.width, self.height);
        self.targets = ["Bloom Bright Texture", "Bloom Blur Texture 0", "Bloom Blur Texture 1"]
            .iter()
            .map(|label| {
                let texture = device.create_texture(&wgpu::TextureDescriptor {
                    label: Some(label),
                    size: wgpu::Extent3d {
                        width,
                        height,
                        depth_or_array_layers: 1,
                    },
                    mip_level_count: 1,
                    sample_count: 1,
                    dimension: wgpu::TextureDimension::D2,
                    format: self.format,
                    usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING,
                    view_formats: &[],
                });
                let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
                (texture, view)
            })
            .collect();
    }

    fn uniform(&self) -> BloomUniform {
        let (width, height) = bloom_extent(self.width, self.height);
        BloomUniform {
            threshold: self.config.threshold,
            strength: self.config.strength,
            step: blur_step(self.config.radius),
            _padding: 0.0,
            resolution: [width as f32, height as f32, 1.0 / width as f32, 1.0 / height as f32],
        }
    }
}

impl Pass for BloomPass {
    fn name(&self) -> &str {
        "BloomPass"
    }

    fn enabled(&self) -> bool {
        self.enabled
    }

    fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    fn resize(&mut self, width: u32, height: u32, device: &wgpu::Device) {
        if width == 0 || height == 0 {
            return;
        }
        self.width = width;
        self.height = height;

        if self.bind_group_layout.is_some() {
            self.create_textures(device);
        }
    }

    fn render(
        &self,
        encoder: &mut wgpu::CommandEncoder,
        input: &wgpu::TextureView,
        output: &wgpu::TextureView,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
    ) {
        let Some(threshold_pipeline) = &self.threshold_pipeline else { return };
        let Some(blur_h_pipeline) = &self.blur_h_pipeline else { return };
        let Some(blur_v_pipeline) = &self.blur_v_pipeline else { return };
        let Some(combine_pipeline) = &self.combine_pipeline else { return };
        let Some(layout) = &self.bind_group_layout else { return };
        let Some(combine_layout) = &self.combine_layout else { return };
        let Some(uniform_buffer) = &self.uniform_buffer else { return };
        let Some(quad_buffer) = &self.quad_buffer else { return };
        let Some(sampler) = &self.sampler else { return };
        let [(_, bright_view), (_, blur_view_0), (_, blur_view_1)] = self.targets.as_slice() else {
            return;
        };

        queue.write_buffer(uniform_buffer, 0, bytemuck::cast_slice(&[self.uniform()]));

        let source = |label: &str, view: &wgpu::TextureView| {
            device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some(label),
                layout,
                entries: &[
                    wgpu::BindGroupEntry {
                        binding: 0,
                        resource: wgpu::BindingResource::TextureView(view),
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
            })
        };

        // scene -> bright -> blur0 (horizontal) -> blur1 (vertical)
        let scene_group = source("Bloom Threshold Bind Group", input);
        draw_fullscreen(encoder, "Bloom Threshold Pass", bright_view, threshold_pipeline, &scene_group, quad_buffer);

        let bright_group = source("Bloom Blur H Bind Group", bright_view);
        draw_fullscreen(encoder, "Bloom Blur H Pass", blur_view_0, blur_h_pipeline, &bright_group, quad_buffer);

        let blur_group = source("Bloom Blur V Bind Group", blur_view_0);
        draw_fullscreen(encoder, "Bloom Blur V Pass", blur_view_1, blur_v_pipeline, &blur_group, quad_buffer);

        let combine_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Bloom Combine Bind Group"),
            layout: combine_layout,
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
                wgpu::BindGroupEntry {
                    binding: 3,
                    resource: wgpu::BindingResource::TextureView(blur_view_1),
                },
            ],
        });
        draw_fullscreen(encoder, "Bloom Combine Pass", output, combine_pipeline, &combine_group, quad_buffer);
    }
}

const BLOOM_SHADER: &str = r#"
struct Params {
    threshold: f32,
    strength: f32,
    step: f32,
    _padding: f32,
    resolution: vec4<f32>,
}

@group(0) @binding(0) var input_texture: texture_2d<f32>;
@group(0) @binding(1) var input_sampler: sampler;
@group(0) @binding(2) var<uniform> params: Params;
@group(0) @binding(3) var bloom_texture: texture_2d<f32>;

const LUMA = vec3<f32>(0.2126, 0.7152, 0.0722);

fn blur(uv: vec2<f32>, direction: vec2<f32>) -> vec4<f32> {
    // 9-tap Gaussian
    let weights = array<f32, 5>(0.227027, 0.1945946, 0.1216216, 0.054054, 0.016216);
    let texel = direction * params.resolution.zw * params.step;

    var color = textureSample(input_texture, input_sampler, uv) * weights[0];
    for (var i = 1; i < 5; i++) {
        let offset = texel * f32(i);
        color += textureSample(input_texture, input_sampler, uv + offset) * weights[i];
        color += textureSample(input_texture, input_sampler, uv - offset) * weights[i];
    }
    return color;
}

@fragment
fn fs_threshold(in: VertexOutput) -> @location(0) vec4<f32> {
    let color = textureSample(input_texture, input_sampler, in.uv);
    let brightness = dot(color.rgb, LUMA);
    let contribution = smoothstep(params.threshold, params.threshold + 0.01, brightness);
    return color * contribution;
}

@fragment
fn fs_blur_h(in: VertexOutput) -> @location(0) vec4<f32> {
    return blur(in.uv, vec2<f32>(1.0, 0.0));
}

@fragment
fn fs_blur_v(in: VertexOutput) -> @location(0) vec4<f32> {
    return blur(in.uv, vec2<f32>(0.0, 1.0));
}

@fragment
fn fs_combine(in: VertexOutput) -> @location(0) vec4<f32> {
    let scene = textureSample(input_texture, input_sampler, in.uv);
    let bloom = textureSample(bloom_texture, input_sampler, in.uv) * params.strength;
    return vec4<f32>(scene.rgb + bloom.rgb, clamp(scene.a + bloom.a, 0.0, 1.0));
}
"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bloom_extent_is_half_resolution() {
        assert_eq!(bloom_extent(1920, 1080), (960, 540));
        assert_eq!(bloom_extent(1, 1), (1, 1));
        assert_eq!(bloom_extent(3, 0), (1, 1));
    }

    #[test]
    fn test_blur_step_follows_radius() {
        assert_eq!(blur_step(0.0), 1.0);
        assert_eq!(blur_step(1.0), 4.0);
        assert!((blur_step(0.7) - 3.1).abs() < 1e-6);
        assert_eq!(blur_step(5.0), 4.0);
    }

    #[test]
    fn test_uniform_reflects_config() {
        let mut pass = BloomPass::new(&BloomConfig::default());
        pass.width = 800;
        pass.height = 600;
        pass.set_config(BloomConfig {
            enabled: true,
            threshold: 0.3,
            strength: 1.5,
            radius: 0.0,
        });

        let uniform = pass.uniform();
        assert_eq!(uniform.threshold, 0.3);
        assert_eq!(uniform.strength, 1.5);
        assert_eq!(uniform.step, 1.0);
        assert_eq!(uniform.resolution[0], 400.0);
        assert_eq!(uniform.resolution[3], 1.0 / 300.0);
        assert_eq!(std::mem::size_of::<BloomUniform>(), 32);
    }

    #[test]
    fn test_render_before_init_is_inert() {
        let pass = BloomPass::new(&BloomConfig::default());
        assert!(pass.targets.is_empty());
        assert!(pass.enabled());
        assert_eq!(pass.name(), "BloomPass");
    }
}
