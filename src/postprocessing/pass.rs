//! Base render pass trait for post-processing.

use wgpu::{CommandEncoder, TextureView};

/// A render pass in the post-processing pipeline.
pub trait Pass {
    /// Get the name of this pass.
    fn name(&self) -> &str;

    /// Check if this pass is enabled.
    fn enabled(&self) -> bool {
        true
    }

    /// Set whether this pass is enabled.
    fn set_enabled(&mut self, enabled: bool);

    /// Render this pass.
    ///
    /// # Arguments
    /// * `encoder` - Command encoder to record commands
    /// * `input` - Input texture from previous pass
    /// * `output` - Output texture to render to
    /// * `device` - wgpu device for resource creation
    /// * `queue` - wgpu queue for buffer updates
    fn render(
        &self,
        encoder: &mut CommandEncoder,
        input: &TextureView,
        output: &TextureView,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
    );

    /// Called when the render target size changes.
    fn resize(&mut self, width: u32, height: u32, device: &wgpu::Device);
}

/// Vertex for fullscreen quad (position + uv).
#[repr(C)]
#[derive(Debug, Clone, Copy, bytemuck::Pod, bytemuck::Zeroable)]
pub struct FullscreenVertex {
    /// Position (x, y).
    pub position: [f32; 2],
    /// UV coordinates.
    pub uv: [f32; 2],
}

impl FullscreenVertex {
    const ATTRIBUTES: [wgpu::VertexAttribute; 2] = wgpu::vertex_attr_array![0 => Float32x2, 1 => Float32x2];

    /// Vertex buffer layout.
    pub fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<Self>() as u64,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRIBUTES,
        }
    }
}

/// Fullscreen quad vertices (two triangles).
pub const FULLSCREEN_QUAD_VERTICES: [FullscreenVertex; 6] = [
    FullscreenVertex { position: [-1.0, -1.0], uv: [0.0, 1.0] },
    FullscreenVertex { position: [1.0, -1.0], uv: [1.0, 1.0] },
    FullscreenVertex { position: [1.0, 1.0], uv: [1.0, 0.0] },
    FullscreenVertex { position: [-1.0, -1.0], uv: [0.0, 1.0] },
    FullscreenVertex { position: [1.0, 1.0], uv: [1.0, 0.0] },
    FullscreenVertex { position: [-1.0, 1.0], uv: [0.0, 0.0] },
];

/// Vertex stage shared by every fullscreen shader.
pub(crate) const FULLSCREEN_VERTEX: &str = r#"
struct VertexInput {
    @location(0) position: vec2<f32>,
    @location(1) uv: vec2<f32>,
}

struct VertexOutput {
    @builtin(position) position: vec4<f32>,
    @location(0) uv: vec2<f32>,
}

@vertex
fn vs_main(in: VertexInput) -> VertexOutput {
    var out: VertexOutput;
    out.position = vec4<f32>(in.position, 0.0, 1.0);
    out.uv = in.uv;
    return out;
}
"#;

/// Layout entry for a filterable 2D texture visible to the fragment stage.
pub(crate) fn texture_entry(binding: u32) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::FRAGMENT,
        ty: wgpu::BindingType::Texture {
            sample_type: wgpu::TextureSampleType::Float { filterable: true },
            view_dimension: wgpu::TextureViewDimension::D2,
            multisampled: false,
        },
        count: None,
    }
}

/// Layout entry for a filtering sampler.
pub(crate) fn sampler_entry(binding: u32) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::FRAGMENT,
        ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
        count: None,
    }
}

/// Layout entry for a fragment uniform buffer.
pub(crate) fn uniform_entry(binding: u32) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::FRAGMENT,
        ty: wgpu::BindingType::Buffer {
            ty: wgpu::BufferBindingType::Uniform,
            has_dynamic_offset: false,
            min_binding_size: None,
        },
        count: None,
    }
}

/// Linear clamp-to-edge sampler.
pub(crate) fn linear_sampler(device: &wgpu::Device, label: &str) -> wgpu::Sampler {
    device.create_sampler(&wgpu::SamplerDescriptor {
        label: Some(label),
        address_mode_u: wgpu::AddressMode::ClampToEdge,
        address_mode_v: wgpu::AddressMode::ClampToEdge,
        address_mode_w: wgpu::AddressMode::ClampToEdge,
        mag_filter: wgpu::FilterMode::Linear,
        min_filter: wgpu::FilterMode::Linear,
        ..Default::default()
    })
}

/// Fullscreen pipeline drawing [`FULLSCREEN_QUAD_VERTICES`] with `fragment_entry`.
pub(crate) fn fullscreen_pipeline(
    device: &wgpu::Device,
    label: &str,
    layout: &wgpu::PipelineLayout,
    shader: &wgpu::ShaderModule,
    fragment_entry: &str,
    format: wgpu::TextureFormat,
) -> wgpu::RenderPipeline {
    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some(label),
        layout: Some(layout),
        vertex: wgpu::VertexState {
            module: shader,
            entry_point: Some("vs_main"),
            buffers: &[FullscreenVertex::layout()],
            compilation_options: Default::default(),
        },
        fragment: Some(wgpu::FragmentState {
            module: shader,
            entry_point: Some(fragment_entry),
            targets: &[Some(wgpu::ColorTargetState {
                format,
                blend: None,
                write_mask: wgpu::ColorWrites::ALL,
            })],
            compilation_options: Default::default(),
        }),
        primitive: wgpu::PrimitiveState::default(),
        depth_stencil: None,
        multisample: wgpu::MultisampleState::default(),
        multiview: None,
        cache: None,
    })
}

/// Record one fullscreen draw into `target`, clearing it first.
pub(crate) fn draw_fullscreen(
    encoder: &mut CommandEncoder,
    label: &str,
    target: &TextureView,
    pipeline: &wgpu::RenderPipeline,
    bind_group: &wgpu::BindGroup,
    quad_buffer: &wgpu::Buffer,
) {
    let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
        label: Some(label),
        color_attachments: &[Some(wgpu::RenderPassColorAttachment {
            view: target,
            resolve_target: None,
            ops: wgpu::Operations {
                load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                store: wgpu::StoreOp::Store,
            },
        })],
        depth_stencil_attachment: None,
        timestamp_writes: None,
        occlusion_query_set: None,
    });

    pass.set_pipeline(pipeline);
    pass.set_bind_group(0, bind_group, &[]);
    pass.set_vertex_buffer(0, quad_buffer.slice(..));
    pass.draw(0..6, 0..1);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quad_covers_clip_space() {
        let (min, max) = FULLSCREEN_QUAD_VERTICES.iter().fold(([1.0f32; 2], [-1.0f32; 2]), |(lo, hi), v| {
            ([lo[0].min(v.position[0]), lo[1].min(v.position[1])], [hi[0].max(v.position[0]), hi[1].max(v.position[1])])
        });
        assert_eq!(min, [-1.0, -1.0]);
        assert_eq!(max, [1.0, 1.0]);
        assert_eq!(FullscreenVertex::layout().array_stride, 16);
    }

    #[test]
    fn test_uv_flips_y() {
        let top_left = FULLSCREEN_QUAD_VERTICES[5];
        assert_eq!(top_left.position, [-1.0, 1.0]);
        assert_eq!(top_left.uv, [0.0, 0.0]);
    }
}
