//! Effect composer for managing the post-processing pipeline.

use super::effects::{BloomPass, OutputPass, VignettePass};
use super::pass::Pass;
use crate::galaxy::GalaxyConfig;

/// Format of the scene and intermediate targets.
pub const HDR_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba16Float;

/// Where a pass reads from or writes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Slot {
    /// The scene target the layers were drawn into.
    Scene,
    /// One of the two ping-pong targets.
    Intermediate(usize),
    /// The presentable surface.
    Output,
}

/// Input and output slots for a chain of `enabled` passes.
///
/// The first pass reads the scene, the last writes the surface, and the
/// passes in between alternate between the two intermediate targets.
pub fn route(enabled: usize) -> Vec<(Slot, Slot)> {
    let mut routes = Vec::with_capacity(enabled);
    let mut input = Slot::Scene;
    let mut current = 0;
    for idx in 0..enabled {
        if idx + 1 == enabled {
            routes.push((input, Slot::Output));
        } else {
            let output = Slot::Intermediate(current);
            routes.push((input, output));
            input = output;
            current = 1 - current;
        }
    }
    routes
}

/// A render target texture with view.
pub struct RenderTarget {
    /// The texture.
    pub texture: wgpu::Texture,
    /// Texture view.
    pub view: wgpu::TextureView,
}

impl RenderTarget {
    /// Create a new render target.
    pub fn new(device: &wgpu::Device, label: &str, width: u32, height: u32, format: wgpu::TextureFormat) -> Self {
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some(label),
            size: wgpu::Extent3d {
                width: width.max(1),
                height: height.max(1),
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING,
            view_formats: &[],
        });

        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());

        Self { texture, view }
    }
}

/// Manages the scene target and a chain of post-processing passes.
///
/// The last enabled pass writes to the surface, so the chain must end with
/// an [`OutputPass`] built for the surface format.
pub struct EffectComposer {
    /// Render passes in order.
    passes: Vec<Box<dyn Pass>>,
    /// Target the scene layers render into.
    scene_target: RenderTarget,
    /// Ping-pong render targets.
    render_targets: [RenderTarget; 2],
    width: u32,
    height: u32,
}

impl EffectComposer {
    /// Create an empty composer with targets of the given size.
    pub fn new(device: &wgpu::Device, width: u32, height: u32) -> Self {
        let width = width.max(1);
        let height = height.max(1);
        Self {
            passes: Vec::new(),
            scene_target: RenderTarget::new(device, "Scene Render Target", width, height, HDR_FORMAT),
            render_targets: Self::create_render_targets(device, width, height),
            width,
            height,
        }
    }

    /// Build the backdrop chain: bloom, vignette, then output to `surface_format`.
    pub fn for_galaxy(
        device: &wgpu::Device,
        width: u32,
        height: u32,
        surface_format: wgpu::TextureFormat,
        config: &GalaxyConfig,
    ) -> Self {
        let mut composer = Self::new(device, width, height);
        let (width, height) = composer.dimensions();

        let mut bloom = BloomPass::new(&config.bloom);
        bloom.init(device, HDR_FORMAT, width, height);
        composer.add_pass(Box::new(bloom));

        let mut vignette = VignettePass::new(&config.post);
        vignette.init(device, HDR_FORMAT);
        composer.add_pass(Box::new(vignette));

        let mut output = OutputPass::new(&config.post);
        output.init(device, surface_format);
        composer.add_pass(Box::new(output));

        log::debug!("Effect composer ready: {} passes at {}x{}", composer.passes.len(), width, height);
        composer
    }

    fn create_render_targets(device: &wgpu::Device, width: u32, height: u32) -> [RenderTarget; 2] {
        [
            RenderTarget::new(device, "Post-Process Render Target 0", width, height, HDR_FORMAT),
            RenderTarget::new(device, "Post-Process Render Target 1", width, height, HDR_FORMAT),
        ]
    }

    /// View the scene layers should render into.
    pub fn scene_view(&self) -> &wgpu::TextureView {
        &self.scene_target.view
    }

    /// Add a pass to the chain.
    pub fn add_pass(&mut self, pass: Box<dyn Pass>) {
        self.passes.push(pass);
    }

    /// Remove a pass by name.
    pub fn remove_pass(&mut self, name: &str) -> Option<Box<dyn Pass>> {
        let idx = self.passes.iter().position(|p| p.name() == name)?;
        Some(self.passes.remove(idx))
    }

    /// Get a pass by name.
    pub fn get_pass(&self, name: &str) -> Option<&dyn Pass> {
        self.passes.iter().find(|p| p.name() == name).map(|p| p.as_ref())
    }

    /// Get a mutable pass by name.
    pub fn get_pass_mut(&mut self, name: &str) -> Option<&mut Box<dyn Pass>> {
        self.passes.iter_mut().find(|p| p.name() == name)
    }

    /// Number of passes in the chain.
    pub fn pass_count(&self) -> usize {
        self.passes.len()
    }

    /// Handle resize.
    pub fn resize(&mut self, width: u32, height: u32, device: &wgpu::Device) {
        if width == 0 || height == 0 || (width, height) == (self.width, self.height) {
            return;
        }

        self.width = width;
        self.height = height;
        self.scene_target = RenderTarget::new(device, "Scene Render Target", width, height, HDR_FORMAT);
        self.render_targets = Self::create_render_targets(device, width, height);

        for pass in &mut self.passes {
            pass.resize(width, height, device);
        }
    }

    /// Run every enabled pass, reading the scene target and finishing on `output`.
    pub fn render(
        &self,
        encoder: &mut wgpu::CommandEncoder,
        output: &wgpu::TextureView,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
    ) {
        let enabled: Vec<&dyn Pass> = self.passes.iter().filter(|p| p.enabled()).map(|p| p.as_ref()).collect();

        for (pass, (input, target)) in enabled.iter().zip(route(enabled.len())) {
            pass.render(encoder, self.view(input, output), self.view(target, output), device, queue);
        }
    }

    fn view<'a>(&'a self, slot: Slot, output: &'a wgpu::TextureView) -> &'a wgpu::TextureView {
        match slot {
            Slot::Scene => &self.scene_target.view,
            Slot::Intermediate(idx) => &self.render_targets[idx % 2].view,
            Slot::Output => output,
        }
    }

    /// Get render target dimensions.
    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }
}
