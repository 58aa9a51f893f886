//! The explicit owner of every piece of backdrop state.

use thiserror::Error;

use super::{AnimationScheduler, Context, ContextError, FrameState, RenderConfig, RenderInfo, Renderer};
use crate::controls::ScrollReference;
use crate::galaxy::{ConfigError, Galaxy, GalaxyBuilder, GalaxyConfig, LayerKind};
use crate::material::{CameraUniform, LayerStyle, MaterialError, ParticleMaterial};
use crate::objects::Points;
use crate::postprocessing::{EffectComposer, HDR_FORMAT};

/// Points generated per frame while the galaxy is still being built.
pub const GENERATION_BUDGET: usize = 40_000;

/// Errors raised while building or driving a scene.
#[derive(Error, Debug)]
pub enum SceneError {
    /// Configuration rejected before any GPU work.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Adapter, device or surface creation failed.
    #[error(transparent)]
    Context(#[from] ContextError),

    /// A layer's shader failed to compile.
    #[error(transparent)]
    Material(#[from] MaterialError),

    /// The surface could not provide a frame.
    #[error("surface lost: {0}")]
    Surface(#[from] wgpu::SurfaceError),
}

/// Scene, camera, renderer and loop state in one place.
///
/// Built once at init and threaded through every call; nothing lives in
/// globals. Layers whose shader failed to compile are absent from
/// `layers` and every other layer still draws.
pub struct SceneContext {
    config: GalaxyConfig,
    context: Context,
    renderer: Renderer,
    composer: Option<EffectComposer>,
    scheduler: AnimationScheduler,
    /// Generation in progress, with the materials waiting for its fields.
    builder: Option<GalaxyBuilder>,
    materials: Vec<(LayerStyle, ParticleMaterial)>,
    layers: Vec<Points>,
    disposed: bool,
}

impl SceneContext {
    /// Validate `config`, create the GPU context on `window` and compile
    /// one material per layer.
    ///
    /// An invalid configuration fails before any GPU object is created.
    /// Shader failures are logged and drop only the affected layer.
    pub async fn new<W>(window: W, width: u32, height: u32, config: GalaxyConfig) -> Result<Self, SceneError>
    where
        W: Into<wgpu::SurfaceTarget<'static>>,
    {
        let builder = GalaxyBuilder::new(&config)?;

        let context = Context::new(window, width, height, &RenderConfig::from_view(&config.view)).await?;
        let renderer = Renderer::new(&context, RenderConfig::from_view(&config.view));

        let composer = config.bloom.enabled.then(|| {
            EffectComposer::for_galaxy(&context.device, context.width, context.height, context.surface_format, &config)
        });
        let target_format = if composer.is_some() { HDR_FORMAT } else { context.surface_format };

        let mut materials = Vec::with_capacity(LayerKind::ALL.len());
        for kind in LayerKind::ALL {
            let style = LayerStyle::for_layer(kind, &config);
            match ParticleMaterial::build(&context.device, target_format, renderer.camera_layout(), &style).await {
                Ok(material) => materials.push((style, material)),
                Err(err) => log::error!("{}; skipping layer", err),
            }
        }

        let scheduler = AnimationScheduler::new(&config, context.width, context.height);

        log::info!(
            "Scene ready: {}x{}, {} of {} layers compiled, post-processing {}",
            context.width,
            context.height,
            materials.len(),
            LayerKind::ALL.len(),
            if composer.is_some() { "on" } else { "off" }
        );

        Ok(Self {
            config,
            context,
            renderer,
            composer,
            scheduler,
            builder: Some(builder),
            materials,
            layers: Vec::new(),
            disposed: false,
        })
    }

    /// Run one frame at timestamp `now_ms`.
    ///
    /// Returns `Ok(None)` while hidden or after [`dispose`](Self::dispose).
    /// A lost or outdated surface is reconfigured and the frame dropped.
    pub fn frame(&mut self, now_ms: f64) -> Result<Option<FrameState>, SceneError> {
        if self.disposed {
            return Ok(None);
        }

        self.advance_generation();

        let Some(frame) = self.scheduler.tick(now_ms) else {
            return Ok(None);
        };

        for layer in &mut self.layers {
            layer.set_time(frame.time);
            layer.update_uniforms(&self.context.queue);
        }

        let (width, height) = self.scheduler.size();
        let camera = self.scheduler.camera_mut();
        let view = *camera.view_matrix();
        let projection = *camera.projection_matrix();
        let uniform = CameraUniform::new(&view, &projection, width, height);
        self.renderer.update_camera(&self.context.queue, &uniform);

        match self.renderer.render(&self.context, &self.layers, self.composer.as_ref()) {
            Ok(()) => Ok(Some(frame)),
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                log::warn!("Surface lost, reconfiguring");
                self.context.reconfigure();
                Ok(Some(frame))
            }
            Err(wgpu::SurfaceError::Timeout) => {
                log::warn!("Surface timed out, dropping frame");
                Ok(Some(frame))
            }
            Err(err) => Err(err.into()),
        }
    }

    /// Generate the next slice of points; upload the layers once complete.
    fn advance_generation(&mut self) {
        let Some(builder) = self.builder.as_mut() else {
            return;
        };
        let Some(galaxy) = builder.step(GENERATION_BUDGET) else {
            return;
        };
        self.builder = None;
        self.upload(&galaxy);
    }

    fn upload(&mut self, galaxy: &Galaxy) {
        for (style, material) in std::mem::take(&mut self.materials) {
            let Some(field) = galaxy.field(style.kind) else {
                log::warn!("No field generated for {} layer", style.kind);
                continue;
            };
            let mut points = Points::new(field, style);
            points.upload(&self.context.device, material);
            log::info!("{} layer: {} points", points.kind(), points.count());
            self.layers.push(points);
        }
    }

    /// Apply a new drawing-buffer size. Zero-area sizes are skipped.
    pub fn resize(&mut self, width: u32, height: u32) -> bool {
        if self.disposed || !self.scheduler.resize(width, height) {
            return false;
        }
        self.context.resize(width, height);
        if let Some(composer) = &mut self.composer {
            composer.resize(width, height, &self.context.device);
        }
        true
    }

    /// Replace the scroll reference distance, e.g. after layout changes.
    pub fn set_scroll_reference(&mut self, reference: ScrollReference) {
        self.scheduler.set_scroll_reference(reference);
    }

    /// Stage a raw scroll offset.
    pub fn on_scroll(&mut self, offset: f32) {
        self.scheduler.on_scroll(offset);
    }

    /// Stage a raw pointer position in drawing-buffer pixels.
    pub fn on_pointer_move(&mut self, x: f32, y: f32, now_ms: f64) {
        self.scheduler.on_pointer_move(x, y, now_ms);
    }

    /// Pause or resume the loop.
    pub fn set_visible(&mut self, visible: bool, now_ms: f64) {
        self.scheduler.set_visible(visible, now_ms);
    }

    /// Eased scroll progress for page chrome.
    #[inline]
    pub fn eased_scroll(&self) -> f32 {
        self.scheduler.eased_scroll()
    }

    /// Whether every layer has been generated and uploaded.
    pub fn is_ready(&self) -> bool {
        self.builder.is_none()
    }

    /// Generation progress in [0, 1].
    pub fn generation_progress(&self) -> f32 {
        self.builder.as_ref().map_or(1.0, GalaxyBuilder::progress)
    }

    /// Validated configuration the scene was built from.
    #[inline]
    pub fn config(&self) -> &GalaxyConfig {
        &self.config
    }

    /// CPU animation state.
    #[inline]
    pub fn scheduler(&self) -> &AnimationScheduler {
        &self.scheduler
    }

    /// Particle layers in draw order.
    #[inline]
    pub fn layers(&self) -> &[Points] {
        &self.layers
    }

    /// Counters from the last frame.
    #[inline]
    pub fn render_info(&self) -> &RenderInfo {
        self.renderer.info()
    }

    /// Whether GPU resources were released.
    #[inline]
    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    /// Release layer buffers and stop rendering. Safe to call more than once.
    pub fn dispose(&mut self) {
        if self.disposed {
            return;
        }
        for layer in &mut self.layers {
            layer.dispose();
        }
        self.materials.clear();
        self.builder = None;
        self.composer = None;
        self.disposed = true;
        log::info!("Scene disposed");
    }
}
