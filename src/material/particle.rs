//! Instanced soft-sprite particle material.
//!
//! WebGPU has no point size, so each point is drawn as a four-vertex
//! triangle strip expanded in clip space by the vertex stage. Per-point
//! attributes come from an instance-rate vertex buffer.

use bytemuck::{Pod, Zeroable};

use super::shader_contract;
use super::MaterialError;
use crate::galaxy::{GalaxyConfig, LayerKind, ParticleField, ParticlePoint};
use crate::math::{Color, Matrix4};

/// Per-instance attributes, one row of a [`ParticleField`].
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
#[repr(C)]
pub struct ParticleInstance {
    /// Local position.
    pub position: [f32; 3],
    /// Point size multiplier.
    pub size: f32,
    /// Linear RGB color.
    pub color: [f32; 3],
    /// Angular speed around the y axis.
    pub rotation_speed: f32,
    /// Distance from the core.
    pub distance: f32,
    /// Twinkle frequency.
    pub twinkle_speed: f32,
    /// Opacity multiplier.
    pub fade: f32,
    /// Per-point random phase.
    pub seed: f32,
}

impl From<ParticlePoint> for ParticleInstance {
    fn from(point: ParticlePoint) -> Self {
        Self {
            position: point.position.to_array(),
            size: point.size,
            color: point.color.to_array(),
            rotation_speed: point.rotation_speed,
            distance: point.distance,
            twinkle_speed: point.twinkle_speed,
            fade: point.fade,
            seed: point.seed,
        }
    }
}

impl ParticleInstance {
    const ATTRIBUTES: [wgpu::VertexAttribute; 8] = wgpu::vertex_attr_array![
        0 => Float32x3,
        1 => Float32,
        2 => Float32x3,
        3 => Float32,
        4 => Float32,
        5 => Float32,
        6 => Float32,
        7 => Float32,
    ];

    /// Instance-rate buffer layout.
    pub fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<Self>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Instance,
            attributes: &Self::ATTRIBUTES,
        }
    }

    /// Interleave a field's parallel buffers into instance rows.
    pub fn from_field(field: &ParticleField) -> Vec<Self> {
        field.iter().map(Self::from).collect()
    }
}

/// Camera uniform data shared by every layer.
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
#[repr(C)]
pub struct CameraUniform {
    /// World to view matrix.
    pub view: [[f32; 4]; 4],
    /// View to clip matrix.
    pub projection: [[f32; 4]; 4],
    /// x=width, y=height, z=1/width, w=1/height.
    pub resolution: [f32; 4],
}

impl Default for CameraUniform {
    fn default() -> Self {
        Self::new(&Matrix4::IDENTITY, &Matrix4::IDENTITY, 1, 1)
    }
}

impl CameraUniform {
    /// Pack camera matrices and the viewport size.
    pub fn new(view: &Matrix4, projection: &Matrix4, width: u32, height: u32) -> Self {
        let (w, h) = (width.max(1) as f32, height.max(1) as f32);
        Self {
            view: view.to_cols_array_2d(),
            projection: projection.to_cols_array_2d(),
            resolution: [w, h, 1.0 / w, 1.0 / h],
        }
    }
}

/// Per-layer uniform data.
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
#[repr(C)]
pub struct LayerUniform {
    /// x=time, y=base_size, z=perspective_scale, w=opacity.
    pub params: [f32; 4],
    /// x=shimmer, y=gradient max distance, z=gradient strength, w=gradient enabled.
    pub extra: [f32; 4],
    /// Inner gradient stop.
    pub gradient_inner: [f32; 4],
    /// Middle gradient stop.
    pub gradient_middle: [f32; 4],
    /// Outer gradient stop.
    pub gradient_outer: [f32; 4],
}

impl LayerUniform {
    /// Pack a layer style at the given time.
    pub fn new(style: &LayerStyle, time: f32) -> Self {
        let (gradient, stops) = match &style.gradient {
            Some(g) => (
                [g.max_distance, g.strength, 1.0],
                [g.inner.to_array(), g.middle.to_array(), g.outer.to_array()],
            ),
            None => ([0.0, 0.0, 0.0], [[0.0; 3]; 3]),
        };
        let pad = |c: [f32; 3]| [c[0], c[1], c[2], 1.0];
        Self {
            params: [time, style.base_size, style.perspective_scale, style.opacity],
            extra: [style.shimmer, gradient[0], gradient[1], gradient[2]],
            gradient_inner: pad(stops[0]),
            gradient_middle: pad(stops[1]),
            gradient_outer: pad(stops[2]),
        }
    }
}

/// How a layer composites over what is already drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParticleBlendMode {
    /// `src + dst`; glowing star layers.
    Additive,
    /// `src + dst · (1 − src.a)`; occluding dust.
    Premultiplied,
}

impl ParticleBlendMode {
    /// Blend state for premultiplied fragment output.
    pub fn blend_state(self) -> wgpu::BlendState {
        match self {
            Self::Additive => wgpu::BlendState {
                color: wgpu::BlendComponent {
                    src_factor: wgpu::BlendFactor::One,
                    dst_factor: wgpu::BlendFactor::One,
                    operation: wgpu::BlendOperation::Add,
                },
                alpha: wgpu::BlendComponent {
                    src_factor: wgpu::BlendFactor::One,
                    dst_factor: wgpu::BlendFactor::One,
                    operation: wgpu::BlendOperation::Add,
                },
            },
            Self::Premultiplied => wgpu::BlendState::PREMULTIPLIED_ALPHA_BLENDING,
        }
    }
}

/// Three-stop temperature gradient for one layer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GradientStyle {
    /// Color at the center.
    pub inner: Color,
    /// Color halfway out.
    pub middle: Color,
    /// Color at `max_distance`.
    pub outer: Color,
    /// Distance where the outer color is reached.
    pub max_distance: f32,
    /// Blend between point color and gradient.
    pub strength: f32,
}

/// Everything the shader needs to know about a layer besides its points.
#[derive(Debug, Clone, PartialEq)]
pub struct LayerStyle {
    /// Which layer this styles.
    pub kind: LayerKind,
    /// Point size in pixels before perspective.
    pub base_size: f32,
    /// Distance attenuation factor.
    pub perspective_scale: f32,
    /// Layer opacity.
    pub opacity: f32,
    /// Twinkle amplitude.
    pub shimmer: f32,
    /// Optional temperature gradient.
    pub gradient: Option<GradientStyle>,
    /// Blend mode.
    pub blend: ParticleBlendMode,
}

impl LayerStyle {
    /// Style of `kind` derived from the galaxy configuration.
    pub fn for_layer(kind: LayerKind, config: &GalaxyConfig) -> Self {
        let view = &config.view;
        let mut style = Self {
            kind,
            base_size: view.particle_base_size,
            perspective_scale: view.particle_perspective_scale,
            opacity: 1.0,
            shimmer: 0.0,
            gradient: None,
            blend: ParticleBlendMode::Additive,
        };

        match kind {
            LayerKind::Core => {
                style.opacity = config.core.opacity;
                style.shimmer = config.core.twinkle.shimmer;
            }
            LayerKind::Disk => {
                style.opacity = config.disk.opacity;
                style.shimmer = config.disk.twinkle.shimmer;
                style.gradient = config.disk.radial_gradient.map(|g| GradientStyle {
                    inner: g.inner,
                    middle: g.middle,
                    outer: g.outer,
                    max_distance: g.max_distance,
                    strength: g.strength,
                });
            }
            LayerKind::Dust => {
                style.opacity = config.dust.opacity;
                style.blend = ParticleBlendMode::Premultiplied;
            }
            LayerKind::Background => {
                let bg = &config.background;
                style.opacity = bg.opacity;
                style.shimmer = bg.twinkle.shimmer;
                style.base_size *= bg.size_scale;
                style.perspective_scale *= bg.perspective_boost;
            }
        }
        style
    }
}

const PARTICLE_SHADER: &str = r#"
struct Camera {
    view: mat4x4<f32>,
    projection: mat4x4<f32>,
    resolution: vec4<f32>,
};

struct Layer {
    params: vec4<f32>,
    extra: vec4<f32>,
    gradient_inner: vec4<f32>,
    gradient_middle: vec4<f32>,
    gradient_outer: vec4<f32>,
};

@group(0) @binding(0) var<uniform> camera: Camera;
@group(1) @binding(0) var<uniform> layer_data: Layer;

struct Instance {
    @location(0) position: vec3<f32>,
    @location(1) size: f32,
    @location(2) color: vec3<f32>,
    @location(3) rotation_speed: f32,
    @location(4) distance: f32,
    @location(5) twinkle_speed: f32,
    @location(6) fade: f32,
    @location(7) seed: f32,
};

struct VertexOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) uv: vec2<f32>,
    @location(1) color: vec3<f32>,
    @location(2) factor: f32,
};

fn gradient(color: vec3<f32>, radius: f32) -> vec3<f32> {
    if (layer_data.extra.w < 0.5 || layer_data.extra.y <= 0.0) {
        return color;
    }
    let t = clamp(radius / layer_data.extra.y, 0.0, 1.0);
    var graded = mix(
        layer_data.gradient_inner.rgb,
        layer_data.gradient_middle.rgb,
        smoothstep(GRADIENT_INNER_START, GRADIENT_INNER_END, t),
    );
    graded = mix(graded, layer_data.gradient_outer.rgb, smoothstep(GRADIENT_OUTER_START, GRADIENT_OUTER_END, t));
    return mix(color, graded, layer_data.extra.z);
}

@vertex
fn vs_main(@builtin(vertex_index) vertex_index: u32, inst: Instance) -> VertexOutput {
    let time = layer_data.params.x;
    let corner = vec2<f32>(f32(vertex_index & 1u), f32((vertex_index >> 1u) & 1u));

    let angle = time * inst.rotation_speed * ROTATION_RATE + inst.distance * DISTANCE_TWIST;
    let c = cos(angle);
    let s = sin(angle);
    let p = inst.position;
    let rotated = vec3<f32>(p.x * c + p.z * s, p.y, p.z * c - p.x * s);

    let view_position = camera.view * vec4<f32>(rotated, 1.0);
    var clip = camera.projection * view_position;

    let depth = max(-view_position.z, MIN_VIEW_DEPTH);
    let size_px = inst.size * layer_data.params.y * layer_data.params.z / depth;
    let offset = (corner * 2.0 - 1.0) * size_px * camera.resolution.zw;
    clip = vec4<f32>(clip.xy + offset * clip.w, clip.zw);

    var twinkle = 1.0;
    if (inst.twinkle_speed != 0.0) {
        twinkle = TWINKLE_BASE + TWINKLE_AMPLITUDE
            * sin(time * inst.twinkle_speed * TWINKLE_RATE + inst.distance * TWINKLE_DISTANCE_PHASE);
    }
    if (layer_data.extra.x > 0.0 && inst.distance > 0.0) {
        twinkle = twinkle * (1.0 + layer_data.extra.x * sin(time * PI + inst.seed * TWO_PI));
    }

    var out: VertexOutput;
    out.clip_position = clip;
    out.uv = corner;
    out.color = gradient(inst.color, inst.distance);
    out.factor = layer_data.params.w * twinkle * inst.fade;
    return out;
}

@fragment
fn fs_main(in: VertexOutput) -> @location(0) vec4<f32> {
    let dist = length(in.uv - vec2<f32>(0.5, 0.5));
    let alpha = 1.0 - smoothstep(SPRITE_INNER, SPRITE_OUTER, dist);
    if (alpha < ALPHA_CUTOFF) {
        discard;
    }
    let a = alpha * in.factor;
    return vec4<f32>(in.color * a, a);
}
"#;

/// Full WGSL source: shared constants followed by the program.
pub fn shader_source() -> String {
    let mut source = shader_contract::wgsl_constants();
    source.push_str(PARTICLE_SHADER);
    source
}

/// Bind group layout for [`CameraUniform`] at group 0.
pub fn camera_bind_group_layout(device: &wgpu::Device) -> wgpu::BindGroupLayout {
    uniform_layout(device, "Particle Camera Bind Group Layout", wgpu::ShaderStages::VERTEX)
}

/// Bind group layout for [`LayerUniform`] at group 1.
pub fn layer_bind_group_layout(device: &wgpu::Device) -> wgpu::BindGroupLayout {
    uniform_layout(device, "Particle Layer Bind Group Layout", wgpu::ShaderStages::VERTEX)
}

fn uniform_layout(device: &wgpu::Device, label: &str, visibility: wgpu::ShaderStages) -> wgpu::BindGroupLayout {
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        label: Some(label),
        entries: &[wgpu::BindGroupLayoutEntry {
            binding: 0,
            visibility,
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Uniform,
                has_dynamic_offset: false,
                min_binding_size: None,
            },
            count: None,
        }],
    })
}

/// Compiled pipeline for one layer.
pub struct ParticleMaterial {
    kind: LayerKind,
    blend: ParticleBlendMode,
    pipeline: wgpu::RenderPipeline,
    layer_bind_group_layout: wgpu::BindGroupLayout,
}

impl ParticleMaterial {
    /// Compile the particle program for one layer.
    ///
    /// Shader and pipeline creation run inside a validation error scope; a
    /// captured error is returned instead of poisoning the device.
    pub async fn build(
        device: &wgpu::Device,
        target_format: wgpu::TextureFormat,
        camera_layout: &wgpu::BindGroupLayout,
        style: &LayerStyle,
    ) -> Result<Self, MaterialError> {
        device.push_error_scope(wgpu::ErrorFilter::Validation);

        let label = format!("Particle {} Shader", style.kind);
        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some(&label),
            source: wgpu::ShaderSource::Wgsl(shader_source().into()),
        });

        let layer_bind_group_layout = layer_bind_group_layout(device);

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Particle Pipeline Layout"),
            bind_group_layouts: &[camera_layout, &layer_bind_group_layout],
            push_constant_ranges: &[],
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some(&format!("Particle {} Pipeline", style.kind)),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                buffers: &[ParticleInstance::layout()],
                compilation_options: Default::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_main"),
                targets: &[Some(wgpu::ColorTargetState {
                    format: target_format,
                    blend: Some(style.blend.blend_state()),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: Default::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleStrip,
                strip_index_format: None,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: None,
                unclipped_depth: false,
                polygon_mode: wgpu::PolygonMode::Fill,
                conservative: false,
            },
            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
            cache: None,
        });

        if let Some(error) = device.pop_error_scope().await {
            return Err(MaterialError::ShaderValidation {
                layer: style.kind,
                message: error.to_string(),
            });
        }

        Ok(Self {
            kind: style.kind,
            blend: style.blend,
            pipeline,
            layer_bind_group_layout,
        })
    }

    /// Layer this material draws.
    pub fn kind(&self) -> LayerKind {
        self.kind
    }

    /// Blend mode baked into the pipeline.
    pub fn blend(&self) -> ParticleBlendMode {
        self.blend
    }

    /// Render pipeline.
    #[inline]
    pub fn pipeline(&self) -> &wgpu::RenderPipeline {
        &self.pipeline
    }

    /// Layout of the per-layer uniform group.
    #[inline]
    pub fn layer_bind_group_layout(&self) -> &wgpu::BindGroupLayout {
        &self.layer_bind_group_layout
    }
}

#[cfg(test)]
mod tests {
    use super::*;


    #[test]
    fn test_instance_layout_matches_struct() {
        assert_eq!(std::mem::size_of::<ParticleInstance>(), 48);
        let layout = ParticleInstance::layout();
        assert_eq!(layout.array_stride, 48);
        assert_eq!(layout.step_mode, wgpu::VertexStepMode::Instance);
        assert_eq!(layout.attributes[2].offset, 16);
        assert_eq!(layout.attributes[7].offset, 44);
    }

    #[test]
    fn test_uniform_sizes_are_aligned() {
        assert_eq!(std::mem::size_of::<CameraUniform>() % 16, 0);
        assert_eq!(std::mem::size_of::<LayerUniform>(), 80);
    }

    #[test]
    fn test_camera_uniform_resolution() {
        let uniform = CameraUniform::new(&Matrix4::IDENTITY, &Matrix4::IDENTITY, 800, 400);
        assert_eq!(uniform.resolution, [800.0, 400.0, 1.0 / 800.0, 1.0 / 400.0]);
        let degenerate = CameraUniform::new(&Matrix4::IDENTITY, &Matrix4::IDENTITY, 0, 0);
        assert!(degenerate.resolution.iter().all(|v| v.is_finite()));
    }

    #[test]
    fn test_background_style_scales_size() {
        let config = GalaxyConfig::default();
        let style = LayerStyle::for_layer(LayerKind::Background, &config);
        assert!((style.base_size - 1.5 * 0.4).abs() < 1e-6);
        assert!((style.perspective_scale - 380.0 * 2.5).abs() < 1e-3);
        assert_eq!(style.opacity, config.background.opacity);
    }

    #[test]
    fn test_blend_modes_per_layer() {
        let config = GalaxyConfig::default();
        for kind in LayerKind::ALL {
            let style = LayerStyle::for_layer(kind, &config);
            let expected = if kind == LayerKind::Dust {
                ParticleBlendMode::Premultiplied
            } else {
                ParticleBlendMode::Additive
            };
            assert_eq!(style.blend, expected);
        }
    }

    #[test]
    fn test_layer_uniform_gradient_flag() {
        let mut config = GalaxyConfig::default();
        config.disk.radial_gradient = None;
        let plain = LayerUniform::new(&LayerStyle::for_layer(LayerKind::Disk, &config), 2.0);
        assert_eq!(plain.extra[3], 0.0);
        assert_eq!(plain.params[0], 2.0);

        config.disk.radial_gradient = Some(Default::default());
        let graded = LayerUniform::new(&LayerStyle::for_layer(LayerKind::Disk, &config), 2.0);
        assert_eq!(graded.extra[3], 1.0);
        assert!(graded.extra[1] > 0.0);
    }

    #[test]
    fn test_instances_follow_field_order() {
        let mut config = GalaxyConfig::default();
        config.dust.particle_count = 16;
        let field = crate::galaxy::generate_layer(LayerKind::Dust, &config).unwrap();
        let instances = ParticleInstance::from_field(&field);
        assert_eq!(instances.len(), 16);
        assert_eq!(instances[3].position[0], field.positions()[9]);
        assert_eq!(instances[3].fade, 1.0);
    }

    #[test]
    fn test_shader_source_has_header_and_entry_points() {
        let source = shader_source();
        assert!(source.starts_with("const PI"));
        assert!(source.contains("fn vs_main"));
        assert!(source.contains("fn fs_main"));
    }
}
