//! One galaxy layer drawn as instanced sprites.

use wgpu::util::DeviceExt;

use crate::galaxy::{LayerKind, ParticleField};
use crate::material::{LayerStyle, LayerUniform, ParticleInstance, ParticleMaterial};

/// Buffers and pipeline of an uploaded layer.
struct PointsGpu {
    material: ParticleMaterial,
    instance_buffer: wgpu::Buffer,
    uniform_buffer: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
}

/// A renderable particle layer.
///
/// Before [`upload`](Points::upload) and after [`dispose`](Points::dispose)
/// the layer has no GPU state; every update and draw call is then a no-op.
pub struct Points {
    style: LayerStyle,
    instances: Vec<ParticleInstance>,
    count: u32,
    time: f32,
    /// Visibility flag.
    pub visible: bool,
    gpu: Option<PointsGpu>,
    disposed: bool,
}

impl Points {
    /// Wrap a generated field. Nothing touches the GPU yet.
    pub fn new(field: &ParticleField, style: LayerStyle) -> Self {
        let instances = ParticleInstance::from_field(field);
        Self {
            count: instances.len() as u32,
            style,
            instances,
            time: 0.0,
            visible: true,
            gpu: None,
            disposed: false,
        }
    }

    /// Layer kind.
    #[inline]
    pub fn kind(&self) -> LayerKind {
        self.style.kind
    }

    /// Shader style.
    #[inline]
    pub fn style(&self) -> &LayerStyle {
        &self.style
    }

    /// Number of points drawn.
    #[inline]
    pub fn count(&self) -> u32 {
        self.count
    }

    /// Elapsed layer time in seconds.
    #[inline]
    pub fn time(&self) -> f32 {
        self.time
    }

    /// Whether GPU buffers exist.
    pub fn is_uploaded(&self) -> bool {
        self.gpu.is_some()
    }

    /// Whether buffers were released.
    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    /// Create buffers and bind the compiled material. Releases the CPU copy
    /// of the instances. Ignored once disposed.
    pub fn upload(&mut self, device: &wgpu::Device, material: ParticleMaterial) {
        if self.disposed {
            return;
        }

        let instance_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{} Instance Buffer", self.style.kind)),
            contents: bytemuck::cast_slice(&self.instances),
            usage: wgpu::BufferUsages::VERTEX,
        });

        let uniform_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{} Layer Uniform Buffer", self.style.kind)),
            contents: bytemuck::cast_slice(&[LayerUniform::new(&self.style, self.time)]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some(&format!("{} Layer Bind Group", self.style.kind)),
            layout: material.layer_bind_group_layout(),
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: uniform_buffer.as_entire_binding(),
            }],
        });

        self.instances = Vec::new();
        self.gpu = Some(PointsGpu {
            material,
            instance_buffer,
            uniform_buffer,
            bind_group,
        });
    }

    /// Stage the shader time. No-op on a disposed layer.
    pub fn set_time(&mut self, time: f32) {
        if self.disposed {
            return;
        }
        self.time = time;
    }

    /// Write the staged uniforms. No-op without GPU state.
    pub fn update_uniforms(&self, queue: &wgpu::Queue) {
        let Some(gpu) = &self.gpu else {
            return;
        };
        let uniform = LayerUniform::new(&self.style, self.time);
        queue.write_buffer(&gpu.uniform_buffer, 0, bytemuck::cast_slice(&[uniform]));
    }

    /// Record the draw. No-op when hidden, empty or without GPU state.
    pub fn render(&self, render_pass: &mut wgpu::RenderPass<'_>, camera_bind_group: &wgpu::BindGroup) {
        if !self.visible || self.count == 0 {
            return;
        }
        let Some(gpu) = &self.gpu else {
            return;
        };

        render_pass.set_pipeline(gpu.material.pipeline());
        render_pass.set_bind_group(0, camera_bind_group, &[]);
        render_pass.set_bind_group(1, &gpu.bind_group, &[]);
        render_pass.set_vertex_buffer(0, gpu.instance_buffer.slice(..));
        render_pass.draw(0..4, 0..self.count);
    }

    /// Release GPU buffers. Safe to call more than once.
    pub fn dispose(&mut self) {
        if let Some(gpu) = self.gpu.take() {
            gpu.instance_buffer.destroy();
            gpu.uniform_buffer.destroy();
        }
        self.instances = Vec::new();
        self.disposed = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::galaxy::{generate_layer, GalaxyConfig};

    fn layer(kind: LayerKind, count: usize) -> Points {
        let mut config = GalaxyConfig::default();
        config.core.particle_count = count;
        config.dust.particle_count = count;
        let field = generate_layer(kind, &config).unwrap();
        Points::new(&field, LayerStyle::for_layer(kind, &config))
    }

    #[test]
    fn test_new_layer_is_cpu_only() {
        let points = layer(LayerKind::Core, 32);
        assert_eq!(points.count(), 32);
        assert_eq!(points.kind(), LayerKind::Core);
        assert!(!points.is_uploaded());
        assert!(!points.is_disposed());
    }

    #[test]
    fn test_set_time_stages_value() {
        let mut points = layer(LayerKind::Dust, 8);
        points.set_time(4.5);
        assert_eq!(points.time(), 4.5);
    }

    #[test]
    fn test_disposed_layer_ignores_updates() {
        let mut points = layer(LayerKind::Core, 8);
        points.set_time(1.0);
        points.dispose();
        points.set_time(9.0);
        assert_eq!(points.time(), 1.0);
        assert!(points.is_disposed());
        assert!(!points.is_uploaded());
        points.dispose();
        assert!(points.is_disposed());
    }
}
