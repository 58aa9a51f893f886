//! Web bindings for the galaxy backdrop.
//!
//! [`GalaxyApp`] looks up the canvas, builds a [`SceneContext`] on it,
//! registers the DOM event producers and drives the frame loop with
//! `requestAnimationFrame` until [`GalaxyApp::dispose`] is called.

use std::cell::RefCell;
use std::rc::Rc;

use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{window, Document, Event, EventTarget, HtmlCanvasElement, MouseEvent, Window};

use crate::controls::ScrollReference;
use crate::core::SceneContext;
use crate::galaxy::GalaxyConfig;

/// Upper bound on the device pixel ratio used for the drawing buffer.
pub const MAX_PIXEL_RATIO: f64 = 2.0;

/// Render statistics exposed to JavaScript.
#[wasm_bindgen]
pub struct RenderStats {
    /// Number of draw calls.
    pub draw_calls: u32,
    /// Number of points rendered.
    pub points: u32,
    /// Current frame number.
    pub frame: u64,
}

fn js_error(err: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&err.to_string())
}

fn now_ms(window: &Window) -> f64 {
    window.performance().map_or(0.0, |p| p.now())
}

/// Mutable state shared between the app handle and its callbacks.
struct AppState {
    scene: SceneContext,
    window: Window,
    document: Document,
    canvas: HtmlCanvasElement,
    section_id: String,
    fallback_viewports: f32,
    pixel_ratio: f64,
    raf_id: Option<i32>,
}

impl AppState {
    /// Drawing-buffer size for the canvas's CSS size.
    fn buffer_size(&self) -> (u32, u32) {
        let width = (self.canvas.client_width().max(0) as f64 * self.pixel_ratio) as u32;
        let height = (self.canvas.client_height().max(0) as f64 * self.pixel_ratio) as u32;
        (width, height)
    }

    fn resize(&mut self) {
        self.pixel_ratio = self.window.device_pixel_ratio().min(MAX_PIXEL_RATIO);
        let (width, height) = self.buffer_size();
        if self.scene.resize(width, height) {
            self.canvas.set_width(width);
            self.canvas.set_height(height);
        }
        self.refresh_scroll_reference();
    }

    fn refresh_scroll_reference(&mut self) {
        let scroll_y = self.window.scroll_y().unwrap_or(0.0);
        let section_top = self
            .document
            .get_element_by_id(&self.section_id)
            .map(|section| (section.get_bounding_client_rect().top() + scroll_y) as f32);
        let document_height = self
            .document
            .document_element()
            .map_or(0.0, |root| root.scroll_height() as f32);
        let viewport_height = self
            .window
            .inner_height()
            .ok()
            .and_then(|h| h.as_f64())
            .unwrap_or(0.0) as f32;

        let reference = ScrollReference::resolve(section_top, document_height, viewport_height, self.fallback_viewports);
        self.scene.set_scroll_reference(reference);
        self.scene.on_scroll(scroll_y as f32);
    }

    fn frame(&mut self, now: f64) {
        if let Err(err) = self.scene.frame(now) {
            log::error!("Frame failed: {}", err);
        }
    }
}

/// A registered DOM listener, kept so it can be removed on teardown.
struct Listener {
    target: EventTarget,
    event: &'static str,
    callback: Closure<dyn FnMut(Event)>,
}

type FrameCallback = Rc<RefCell<Option<Closure<dyn FnMut(f64)>>>>;

/// The galaxy backdrop attached to a canvas element.
#[wasm_bindgen]
pub struct GalaxyApp {
    state: Rc<RefCell<AppState>>,
    listeners: Vec<Listener>,
    frame_callback: FrameCallback,
    disposed: bool,
}

#[wasm_bindgen]
impl GalaxyApp {
    /// Attach to the canvas with id `canvas_id`, optionally with a JSON
    /// configuration, and start animating.
    ///
    /// Fails before any GPU work when the canvas is missing or the
    /// configuration is invalid.
    #[wasm_bindgen]
    pub async fn new(canvas_id: &str, config_json: Option<String>) -> Result<GalaxyApp, JsValue> {
        let window = window().ok_or_else(|| JsValue::from_str("No window object"))?;
        let document = window.document().ok_or_else(|| JsValue::from_str("No document"))?;

        let canvas: HtmlCanvasElement = document
            .get_element_by_id(canvas_id)
            .ok_or_else(|| JsValue::from_str(&format!("Canvas '{}' not found", canvas_id)))?
            .dyn_into()
            .map_err(|_| JsValue::from_str("Element is not a canvas"))?;

        let config = match config_json {
            Some(json) => GalaxyConfig::from_json(&json).map_err(js_error)?,
            None => GalaxyConfig::default(),
        };

        let pixel_ratio = window.device_pixel_ratio().min(MAX_PIXEL_RATIO);
        let width = ((canvas.client_width().max(0) as f64 * pixel_ratio) as u32).max(1);
        let height = ((canvas.client_height().max(0) as f64 * pixel_ratio) as u32).max(1);
        canvas.set_width(width);
        canvas.set_height(height);

        let section_id = config.input.section_id.clone();
        let fallback_viewports = config.input.fallback_viewports;

        let scene = SceneContext::new(wgpu::SurfaceTarget::Canvas(canvas.clone()), width, height, config)
            .await
            .map_err(js_error)?;

        let mut state = AppState {
            scene,
            window: window.clone(),
            document: document.clone(),
            canvas,
            section_id,
            fallback_viewports,
            pixel_ratio,
            raf_id: None,
        };
        state.refresh_scroll_reference();
        if document.hidden() {
            state.scene.set_visible(false, now_ms(&window));
        }

        let mut app = GalaxyApp {
            state: Rc::new(RefCell::new(state)),
            listeners: Vec::new(),
            frame_callback: Rc::new(RefCell::new(None)),
            disposed: false,
        };

        app.install_listeners(&window, &document)?;
        app.start_loop(&window)?;

        log::info!("Galaxy attached to #{} at {}x{}", canvas_id, width, height);
        Ok(app)
    }

    /// Re-read the canvas size and apply it.
    #[wasm_bindgen]
    pub fn resize(&self) {
        if let Ok(mut state) = self.state.try_borrow_mut() {
            state.resize();
        }
    }

    /// Pause or resume the animation.
    #[wasm_bindgen]
    pub fn set_visible(&self, visible: bool) {
        if let Ok(mut state) = self.state.try_borrow_mut() {
            let now = now_ms(&state.window);
            state.scene.set_visible(visible, now);
        }
    }

    /// Recompute the scroll range after the page layout changed.
    #[wasm_bindgen]
    pub fn refresh_scroll_reference(&self) {
        if let Ok(mut state) = self.state.try_borrow_mut() {
            state.refresh_scroll_reference();
        }
    }

    /// Eased scroll progress in [0, 1] for page chrome.
    #[wasm_bindgen]
    pub fn eased_scroll(&self) -> f32 {
        self.state.try_borrow().map_or(0.0, |state| state.scene.eased_scroll())
    }

    /// Whether every layer has been generated.
    #[wasm_bindgen]
    pub fn is_ready(&self) -> bool {
        self.state.try_borrow().map_or(false, |state| state.scene.is_ready())
    }

    /// Statistics of the last rendered frame.
    #[wasm_bindgen]
    pub fn stats(&self) -> RenderStats {
        match self.state.try_borrow() {
            Ok(state) => {
                let info = state.scene.render_info();
                RenderStats {
                    draw_calls: info.draw_calls,
                    points: info.points,
                    frame: info.frame,
                }
            }
            Err(_) => RenderStats {
                draw_calls: 0,
                points: 0,
                frame: 0,
            },
        }
    }

    /// Remove listeners, cancel the pending frame and release the layers.
    /// Later calls do nothing.
    #[wasm_bindgen]
    pub fn dispose(&mut self) {
        if self.disposed {
            return;
        }
        self.disposed = true;

        for listener in self.listeners.drain(..) {
            let _ = listener
                .target
                .remove_event_listener_with_callback(listener.event, listener.callback.as_ref().unchecked_ref());
        }

        if let Ok(mut state) = self.state.try_borrow_mut() {
            if let Some(id) = state.raf_id.take() {
                let _ = state.window.cancel_animation_frame(id);
            }
            state.scene.dispose();
        }
        self.frame_callback.borrow_mut().take();
    }
}

impl GalaxyApp {
    fn listen(
        &mut self,
        target: EventTarget,
        event: &'static str,
        handler: impl FnMut(Event) + 'static,
    ) -> Result<(), JsValue> {
        let callback = Closure::wrap(Box::new(handler) as Box<dyn FnMut(Event)>);
        target.add_event_listener_with_callback(event, callback.as_ref().unchecked_ref())?;
        self.listeners.push(Listener { target, event, callback });
        Ok(())
    }

    fn install_listeners(&mut self, window: &Window, document: &Document) -> Result<(), JsValue> {
        let state = self.state.clone();
        let win = window.clone();
        self.listen(window.clone().into(), "scroll", move |_| {
            if let Ok(mut state) = state.try_borrow_mut() {
                state.scene.on_scroll(win.scroll_y().unwrap_or(0.0) as f32);
            }
        })?;

        let state = self.state.clone();
        let win = window.clone();
        self.listen(window.clone().into(), "mousemove", move |event| {
            let Some(event) = event.dyn_ref::<MouseEvent>() else {
                return;
            };
            if let Ok(mut state) = state.try_borrow_mut() {
                let ratio = state.pixel_ratio;
                let x = (event.client_x() as f64 * ratio) as f32;
                let y = (event.client_y() as f64 * ratio) as f32;
                state.scene.on_pointer_move(x, y, now_ms(&win));
            }
        })?;

        let state = self.state.clone();
        self.listen(window.clone().into(), "resize", move |_| {
            if let Ok(mut state) = state.try_borrow_mut() {
                state.resize();
            }
        })?;

        let state = self.state.clone();
        let doc = document.clone();
        let win = window.clone();
        self.listen(document.clone().into(), "visibilitychange", move |_| {
            if let Ok(mut state) = state.try_borrow_mut() {
                state.scene.set_visible(!doc.hidden(), now_ms(&win));
            }
        })?;

        Ok(())
    }

    fn start_loop(&mut self, window: &Window) -> Result<(), JsValue> {
        let state = self.state.clone();
        let callback = self.frame_callback.clone();
        let win = window.clone();

        *self.frame_callback.borrow_mut() = Some(Closure::wrap(Box::new(move |now: f64| {
            let Ok(mut state) = state.try_borrow_mut() else {
                return;
            };
            state.raf_id = None;
            if state.scene.is_disposed() {
                return;
            }
            state.frame(now);

            if let Some(next) = callback.borrow().as_ref() {
                state.raf_id = win.request_animation_frame(next.as_ref().unchecked_ref()).ok();
            }
        }) as Box<dyn FnMut(f64)>));

        let id = match self.frame_callback.borrow().as_ref() {
            Some(first) => window.request_animation_frame(first.as_ref().unchecked_ref())?,
            None => return Ok(()),
        };
        self.state.borrow_mut().raf_id = Some(id);
        Ok(())
    }
}

impl Drop for GalaxyApp {
    fn drop(&mut self) {
        self.dispose();
    }
}
