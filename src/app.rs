use anyhow::Result;
/// Demo application: a trail following a Lissajous target
/// Wires the trail engine, renderer, input and UI into the winit event loop
use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;
use std::time::Instant;

use winit::{
    application::ApplicationHandler,
    dpi::PhysicalSize,
    event::WindowEvent,
    event_loop::{ActiveEventLoop, EventLoop},
    window::{Window, WindowId},
};

use crate::{
    TrailResult,
    config::TrailOptions,
    demo_target::LissajousTarget,
    input::{InputAction, InputHandler},
    renderer::Renderer,
    trail::{Scene, SceneHandle, ShadingKind, TrailEngine, TrailMaterial},
    ui::{TrailStats, UiAction, UserInterface},
};

pub struct TrailApp {
    window: Option<Arc<Window>>,
    renderer: Option<Renderer>,
    ui: Option<UserInterface>,
    input_handler: InputHandler,

    scene: SceneHandle,
    engine: TrailEngine,
    target: Rc<RefCell<LissajousTarget>>,
    options: TrailOptions,

    start_time: Instant,
    last_frame_time: Instant,
    fps: f32,
}

impl TrailApp {
    pub fn new(options: TrailOptions) -> Self {
        let scene = Scene::shared();
        let mut engine = TrailEngine::new(Rc::clone(&scene), options.orient_to_movement);
        engine.set_advance_frequency(options.advance_frequency);

        Self {
            window: None,
            renderer: None,
            ui: None,
            input_handler: InputHandler::new(),
            scene,
            engine,
            target: Rc::new(RefCell::new(LissajousTarget::new())),
            options,
            start_time: Instant::now(),
            last_frame_time: Instant::now(),
            fps: 0.0,
        }
    }

    pub fn run(mut self) -> Result<()> {
        let event_loop = EventLoop::new()?;
        event_loop.run_app(&mut self)?;
        Ok(())
    }

    fn now(&self) -> f64 {
        self.start_time.elapsed().as_secs_f64()
    }

    async fn initialize(&mut self, window: Arc<Window>) -> TrailResult<()> {
        log::info!("Initializing trail demo...");

        let mut renderer = Renderer::new(Arc::clone(&window)).await?;
        if let Err(e) = renderer.load_trail_texture(&self.options.texture_path).await {
            log::warn!("{e}; textured shading unavailable, falling back to base shading");
        }

        self.ui = Some(UserInterface::new(&window, &renderer));
        self.renderer = Some(renderer);
        self.rebuild_trail();

        log::info!("Trail demo initialization complete");
        Ok(())
    }

    /// Allocate a fresh trail from the current options and put it in the scene
    fn rebuild_trail(&mut self) {
        let mut kind = self.options.shading;
        let supported = self.renderer.as_ref().is_some_and(|r| r.supports(kind));
        if !supported && kind != ShadingKind::Base {
            log::warn!("{:?} shading unavailable, using base shading", kind);
            kind = ShadingKind::Base;
        }

        self.engine
            .set_orient_to_movement(self.options.orient_to_movement);
        self.engine
            .set_advance_frequency(self.options.advance_frequency);
        self.engine.initialize(
            TrailMaterial::new(kind),
            self.options.trail_length,
            self.options.drag_texture,
            self.options.head_profile(),
            Rc::clone(&self.target),
        );
        if let Some(material) = self.engine.material_mut() {
            self.options.apply_to_material(material);
        }
        self.engine.activate();
    }

    fn apply_options(&mut self, options: TrailOptions) {
        let now = self.now();
        if options.paused != self.options.paused {
            if options.paused {
                self.engine.pause(now);
            } else {
                self.engine.resume(now);
            }
        }

        let reinitialize = self.options.requires_reinitialize(&options);
        self.options = options;

        if reinitialize {
            self.rebuild_trail();
        } else {
            self.engine
                .set_orient_to_movement(self.options.orient_to_movement);
            self.engine
                .set_advance_frequency(self.options.advance_frequency);
            if let Some(material) = self.engine.material_mut() {
                self.options.apply_to_material(material);
            }
        }
    }

    fn update(&mut self, delta_time: f32) {
        if delta_time > 0.0 {
            self.fps = self.fps * 0.9 + (1.0 / delta_time) * 0.1;
        }

        self.advance_simulation(self.now());

        for action in self.input_handler.take_actions() {
            match action {
                InputAction::TogglePause => {
                    let mut options = self.options.clone();
                    options.paused = !options.paused;
                    self.apply_options(options);
                }
                InputAction::ResetTrail => self.engine.reset(),
            }
        }

        let ui_actions = self.ui.as_mut().map(|ui| ui.take_actions()).unwrap_or_default();
        for action in ui_actions {
            match action {
                UiAction::UpdateOptions(options) => self.apply_options(options),
                UiAction::ResetTrail => self.engine.reset(),
            }
        }

        if let Some(renderer) = &mut self.renderer {
            self.input_handler.apply_to_camera(&mut renderer.camera);
        }
    }

    /// Move the target and the trail together; both hold still while paused
    fn advance_simulation(&mut self, now: f64) {
        if !self.options.paused {
            self.target.borrow_mut().update(now as f32);
        }
        self.engine.update(now);
    }

    fn stats(&self) -> TrailStats {
        TrailStats {
            fps: self.fps,
            current_length: self.engine.current_length(),
            capacity: self.engine.capacity(),
            next_node_id: self.engine.current_node_id(),
            drawn_indices: self
                .engine
                .geometry()
                .map_or(0, |g| g.draw_index_count()),
            textured_available: self
                .renderer
                .as_ref()
                .is_some_and(|r| r.supports(ShadingKind::Textured)),
        }
    }

    fn render(&mut self) -> TrailResult<()> {
        let stats = self.stats();
        let (Some(renderer), Some(ui), Some(window)) =
            (&mut self.renderer, &mut self.ui, &self.window)
        else {
            return Ok(());
        };

        renderer.sync_trail(&mut self.engine);

        let (screen_descriptor, clipped_primitives) =
            ui.prepare(renderer, window, &self.options, &stats);

        let scene = self.scene.borrow();
        renderer.render(&self.engine, &scene, |device, queue, encoder, view| {
            ui.render(
                device,
                queue,
                encoder,
                view,
                &clipped_primitives,
                &screen_descriptor,
            )
        })
    }

    /// Returns false when the application should exit
    fn handle_window_event(&mut self, event: &WindowEvent, window: &Window) -> bool {
        if let Some(ui) = &mut self.ui {
            if ui.handle_event(event, window) {
                self.input_handler.cancel_drag();
                return true;
            }
            let pointer_event = matches!(
                event,
                WindowEvent::MouseInput { .. } | WindowEvent::MouseWheel { .. }
            );
            if pointer_event && ui.wants_pointer() {
                return true;
            }
        }

        if self.input_handler.handle_event(event) {
            return true;
        }

        match event {
            WindowEvent::CloseRequested => {
                log::info!("Close requested, shutting down...");
                return false;
            }
            WindowEvent::Resized(physical_size) => {
                if let Some(renderer) = &mut self.renderer {
                    renderer.resize(*physical_size);
                }
            }
            _ => {}
        }

        true
    }
}

impl ApplicationHandler for TrailApp {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        let window_attributes = Window::default_attributes()
            .with_title("Trail Renderer")
            .with_inner_size(PhysicalSize::new(1280, 720))
            .with_min_inner_size(PhysicalSize::new(640, 480));

        match event_loop.create_window(window_attributes) {
            Ok(window) => {
                let window = Arc::new(window);
                if let Err(e) = pollster::block_on(self.initialize(Arc::clone(&window))) {
                    log::error!("Failed to initialize application: {e}");
                    event_loop.exit();
                    return;
                }
                if self.options.paused {
                    self.engine.pause(self.now());
                }
                self.window = Some(window);
                self.last_frame_time = Instant::now();
            }
            Err(e) => {
                log::error!("Failed to create window: {e}");
                event_loop.exit();
            }
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(window) = &self.window {
            window.request_redraw();
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        window_id: WindowId,
        event: WindowEvent,
    ) {
        let Some(window) = self.window.clone() else {
            return;
        };
        if window.id() != window_id {
            return;
        }

        if matches!(event, WindowEvent::RedrawRequested) {
            let current_time = Instant::now();
            let delta_time = current_time
                .duration_since(self.last_frame_time)
                .as_secs_f32();
            self.last_frame_time = current_time;

            self.update(delta_time);
            if let Err(e) = self.render() {
                log::error!("Render error: {e}");
            }
            return;
        }

        if !self.handle_window_event(&event, &window) {
            event_loop.exit();
        }
    }
}

impl Drop for TrailApp {
    fn drop(&mut self) {
        log::info!("Shutting down trail demo");
        self.engine.deactivate();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pause_holds_target_and_trail() {
        let mut app = TrailApp::new(TrailOptions::default());
        app.rebuild_trail();
        app.advance_simulation(0.0);
        app.advance_simulation(0.5);

        let mut paused = app.options.clone();
        paused.paused = true;
        app.apply_options(paused);

        let position = app.target.borrow().position();
        let head = app.engine.current_end().unwrap();
        let center = app.engine.node_center(head);
        app.advance_simulation(1.0);
        app.advance_simulation(2.0);
        assert_eq!(app.target.borrow().position(), position);
        assert_eq!(app.engine.node_center(head), center);

        let mut running = app.options.clone();
        running.paused = false;
        app.apply_options(running);
        app.advance_simulation(3.0);
        assert_ne!(app.target.borrow().position(), position);
    }
}
