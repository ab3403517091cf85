/// User interface system using egui
/// Tweak panel for the trail plus a small statistics readout
use egui_winit::winit;

use crate::config::{HeadShape, TrailOptions};
use crate::renderer::Renderer;
use crate::trail::ShadingKind;
use crate::TrailResult;

/// Actions that the UI can request from the application
#[derive(Debug, Clone)]
pub enum UiAction {
    UpdateOptions(TrailOptions),
    ResetTrail,
}

/// Read-only numbers shown in the statistics window
#[derive(Debug, Clone, Copy, Default)]
pub struct TrailStats {
    pub fps: f32,
    pub current_length: usize,
    pub capacity: usize,
    pub next_node_id: u32,
    pub drawn_indices: usize,
    pub textured_available: bool,
}

pub struct UserInterface {
    egui_ctx: egui::Context,
    egui_winit: egui_winit::State,
    egui_renderer: egui_wgpu::Renderer,

    show_controls: bool,
    show_stats: bool,
    ui_visible: bool,
    pending_actions: Vec<UiAction>,
}

impl UserInterface {
    pub fn new(window: &winit::window::Window, renderer: &Renderer) -> Self {
        let egui_ctx = egui::Context::default();
        let egui_winit = egui_winit::State::new(
            egui_ctx.clone(),
            egui::ViewportId::ROOT,
            window,
            Some(window.scale_factor() as f32),
            None,
            None,
        );

        let egui_renderer = egui_wgpu::Renderer::new(
            renderer.device(),
            renderer.surface_format(),
            egui_wgpu::RendererOptions {
                depth_stencil_format: None,
                msaa_samples: 1,
                dithering: false,
                ..Default::default()
            },
        );

        Self {
            egui_ctx,
            egui_winit,
            egui_renderer,
            show_controls: true,
            show_stats: true,
            ui_visible: true,
            pending_actions: Vec::new(),
        }
    }

    /// Returns true when egui consumed the event
    pub fn handle_event(
        &mut self,
        event: &winit::event::WindowEvent,
        window: &winit::window::Window,
    ) -> bool {
        // H toggles the whole UI
        if let winit::event::WindowEvent::KeyboardInput {
            event:
                winit::event::KeyEvent {
                    physical_key: winit::keyboard::PhysicalKey::Code(winit::keyboard::KeyCode::KeyH),
                    state: winit::event::ElementState::Pressed,
                    repeat: false,
                    ..
                },
            ..
        } = event
        {
            self.ui_visible = !self.ui_visible;
            log::info!("UI visibility toggled to: {}", self.ui_visible);
            return true;
        }

        self.egui_winit.on_window_event(window, event).consumed
    }

    /// True while the pointer is over an egui window
    pub fn wants_pointer(&self) -> bool {
        self.egui_ctx.wants_pointer_input() || self.egui_ctx.is_pointer_over_area()
    }

    /// Get pending UI actions and clear the queue
    pub fn take_actions(&mut self) -> Vec<UiAction> {
        std::mem::take(&mut self.pending_actions)
    }

    pub fn prepare(
        &mut self,
        renderer: &Renderer,
        window: &winit::window::Window,
        options: &TrailOptions,
        stats: &TrailStats,
    ) -> (egui_wgpu::ScreenDescriptor, Vec<egui::ClippedPrimitive>) {
        let raw_input = self.egui_winit.take_egui_input(window);
        let mut edited = options.clone();
        let mut reset_requested = false;
        let mut show_controls = self.show_controls;
        let mut show_stats = self.show_stats;
        let ui_visible = self.ui_visible;

        let full_output = self.egui_ctx.run(raw_input, |ctx| {
            if !ui_visible {
                return;
            }
            if show_controls {
                Self::controls_window(ctx, &mut edited, &mut reset_requested, stats);
            }
            if show_stats {
                Self::stats_window(ctx, stats);
            }
            egui::TopBottomPanel::top("menu_bar").show(ctx, |ui| {
                egui::MenuBar::new().ui(ui, |ui| {
                    ui.menu_button("View", |ui| {
                        ui.checkbox(&mut show_controls, "Trail Controls");
                        ui.checkbox(&mut show_stats, "Statistics");
                    });
                });
            });
        });

        self.show_controls = show_controls;
        self.show_stats = show_stats;
        if edited != *options {
            self.pending_actions.push(UiAction::UpdateOptions(edited));
        }
        if reset_requested {
            self.pending_actions.push(UiAction::ResetTrail);
        }

        self.egui_winit
            .handle_platform_output(window, full_output.platform_output);

        let screen_descriptor = egui_wgpu::ScreenDescriptor {
            size_in_pixels: [window.inner_size().width, window.inner_size().height],
            pixels_per_point: window.scale_factor() as f32,
        };

        let clipped_primitives = self
            .egui_ctx
            .tessellate(full_output.shapes, full_output.pixels_per_point);

        for (id, image_delta) in &full_output.textures_delta.set {
            self.egui_renderer
                .update_texture(renderer.device(), renderer.queue(), *id, image_delta);
        }
        for id in &full_output.textures_delta.free {
            self.egui_renderer.free_texture(id);
        }

        (screen_descriptor, clipped_primitives)
    }

    pub fn render(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        encoder: &mut wgpu::CommandEncoder,
        surface_view: &wgpu::TextureView,
        clipped_primitives: &[egui::ClippedPrimitive],
        screen_descriptor: &egui_wgpu::ScreenDescriptor,
    ) -> TrailResult<()> {
        self.egui_renderer.update_buffers(
            device,
            queue,
            encoder,
            clipped_primitives,
            screen_descriptor,
        );

        let render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("egui render pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: surface_view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Load,
                    store: wgpu::StoreOp::Store,
                },
                depth_slice: None,
            })],
            depth_stencil_attachment: None,
            occlusion_query_set: None,
            timestamp_writes: None,
        });

        let mut render_pass = render_pass.forget_lifetime();
        self.egui_renderer
            .render(&mut render_pass, clipped_primitives, screen_descriptor);

        Ok(())
    }

    fn controls_window(
        ctx: &egui::Context,
        options: &mut TrailOptions,
        reset_requested: &mut bool,
        stats: &TrailStats,
    ) {
        egui::Window::new("Trail Controls")
            .default_pos([10.0, 40.0])
            .default_size([280.0, 380.0])
            .show(ctx, |ui| {
                ui.heading("Colors");
                ui.horizontal(|ui| {
                    ui.label("Head:");
                    ui.color_edit_button_rgba_unmultiplied(&mut options.head_color);
                });
                ui.horizontal(|ui| {
                    ui.label("Tail:");
                    ui.color_edit_button_rgba_unmultiplied(&mut options.tail_color);
                });

                ui.separator();
                ui.heading("Trail");
                ui.add(egui::Slider::new(&mut options.trail_length, 0..=1000).text("Length"));

                egui::ComboBox::from_label("Head shape")
                    .selected_text(options.shape.label())
                    .show_ui(ui, |ui| {
                        for shape in HeadShape::ALL {
                            ui.selectable_value(&mut options.shape, shape, shape.label());
                        }
                    });
                if options.shape == HeadShape::Line {
                    ui.add(egui::Slider::new(&mut options.line_width, 0.5..=60.0).text("Width"));
                }

                ui.horizontal(|ui| {
                    ui.label("Shading:");
                    ui.radio_value(&mut options.shading, ShadingKind::Base, "Base");
                    ui.radio_value(&mut options.shading, ShadingKind::Textured, "Textured");
                });
                if !stats.textured_available {
                    ui.small("Texture not loaded, textured shading falls back to base");
                }

                ui.separator();
                ui.heading("Texture");
                ui.add(
                    egui::Slider::new(&mut options.texture_tile_factor[0], 0.0..=40.0)
                        .text("Tile S"),
                );
                ui.add(
                    egui::Slider::new(&mut options.texture_tile_factor[1], 0.0..=4.0)
                        .text("Tile T"),
                );
                ui.checkbox(&mut options.drag_texture, "Drag texture");

                ui.separator();
                ui.checkbox(&mut options.depth_write, "Depth write");
                ui.checkbox(&mut options.orient_to_movement, "Orient to movement");
                ui.checkbox(&mut options.paused, "Pause");
                ui.add(
                    egui::Slider::new(&mut options.advance_frequency, 1.0..=240.0)
                        .text("Advances/s"),
                );

                if ui.button("Reset trail").clicked() {
                    *reset_requested = true;
                }
            });
    }

    fn stats_window(ctx: &egui::Context, stats: &TrailStats) {
        egui::Window::new("Statistics")
            .default_pos([300.0, 40.0])
            .default_size([200.0, 120.0])
            .show(ctx, |ui| {
                ui.label(format!("FPS: {:.1}", stats.fps));
                ui.label(format!("Nodes: {}/{}", stats.current_length, stats.capacity));
                ui.label(format!("Next node id: {}", stats.next_node_id));
                ui.label(format!("Triangles: {}", stats.drawn_indices / 3));
                ui.separator();
                ui.small("Drag: orbit  Scroll: zoom");
                ui.small("Space: pause  R: reset  H: hide UI");
            });
    }
}
