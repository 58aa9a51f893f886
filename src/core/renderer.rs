//! Layer renderer.

use super::{Context, RenderConfig};
use crate::material::{camera_bind_group_layout, CameraUniform};
use crate::objects::Points;
use crate::postprocessing::EffectComposer;
use wgpu::util::DeviceExt;

/// Render statistics for the current frame.
#[derive(Debug, Clone, Default)]
pub struct RenderInfo {
    /// Number of draw calls.
    pub draw_calls: u32,
    /// Number of points rendered.
    pub points: u32,
    /// Frame number.
    pub frame: u64,
}

impl RenderInfo {
    /// Reset the statistics.
    pub fn reset(&mut self) {
        self.draw_calls = 0;
        self.points = 0;
    }

    /// Count one layer draw.
    pub fn record(&mut self, points: &Points) {
        if points.visible && points.is_uploaded() && points.count() > 0 {
            self.draw_calls += 1;
            self.points += points.count();
        }
    }
}

/// Draws particle layers, directly or into the composer's scene target.
pub struct Renderer {
    config: RenderConfig,
    info: RenderInfo,
    camera_layout: wgpu::BindGroupLayout,
    camera_buffer: wgpu::Buffer,
    camera_bind_group: wgpu::BindGroup,
}

impl Renderer {
    /// Create a new renderer.
    pub fn new(ctx: &Context, config: RenderConfig) -> Self {
        let camera_layout = camera_bind_group_layout(&ctx.device);

        let camera_buffer = ctx.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Camera Uniform Buffer"),
            contents: bytemuck::cast_slice(&[CameraUniform::default()]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let camera_bind_group = ctx.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Camera Bind Group"),
            layout: &camera_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: camera_buffer.as_entire_binding(),
            }],
        });

        Self {
            config,
            info: RenderInfo::default(),
            camera_layout,
            camera_buffer,
            camera_bind_group,
        }
    }

    /// Get render info.
    #[inline]
    pub fn info(&self) -> &RenderInfo {
        &self.info
    }

    /// Surface and clear settings.
    #[inline]
    pub fn config(&self) -> &RenderConfig {
        &self.config
    }

    /// Layout every particle material binds its camera group against.
    #[inline]
    pub fn camera_layout(&self) -> &wgpu::BindGroupLayout {
        &self.camera_layout
    }

    /// Upload this frame's camera matrices.
    pub fn update_camera(&self, queue: &wgpu::Queue, uniform: &CameraUniform) {
        queue.write_buffer(&self.camera_buffer, 0, bytemuck::cast_slice(&[*uniform]));
    }

    /// Begin a new frame.
    pub fn begin_frame(&mut self) {
        self.info.reset();
        self.info.frame += 1;
    }

    /// Render a frame. With a composer the layers draw into its scene
    /// target and the chain finishes on the surface.
    pub fn render(
        &mut self,
        ctx: &Context,
        layers: &[Points],
        composer: Option<&EffectComposer>,
    ) -> Result<(), wgpu::SurfaceError> {
        self.begin_frame();

        let output = ctx.get_current_texture()?;
        let view = output.texture.create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = ctx.create_command_encoder();
        let target = composer.map_or(&view, |c| c.scene_view());

        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Galaxy Render Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: target,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(self.config.wgpu_clear_color()),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            for layer in layers {
                layer.render(&mut render_pass, &self.camera_bind_group);
                self.info.record(layer);
            }
        }

        if let Some(composer) = composer {
            composer.render(&mut encoder, &view, &ctx.device, &ctx.queue);
        }

        ctx.submit(std::iter::once(encoder.finish()));
        output.present();

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::galaxy::{generate_layer, GalaxyConfig, LayerKind};
    use crate::material::LayerStyle;

    #[test]
    fn test_info_skips_layers_without_gpu_state() {
        let config = GalaxyConfig::default();
        let field = generate_layer(LayerKind::Background, &config).unwrap();
        let points = Points::new(&field, LayerStyle::for_layer(LayerKind::Background, &config));

        let mut info = RenderInfo::default();
        info.record(&points);
        assert_eq!(info.draw_calls, 0);
        assert_eq!(info.points, 0);
    }

    #[test]
    fn test_info_reset_keeps_frame() {
        let mut info = RenderInfo {
            draw_calls: 4,
            points: 100,
            frame: 7,
        };
        info.reset();
        assert_eq!(info.draw_calls, 0);
        assert_eq!(info.frame, 7);
    }
}
