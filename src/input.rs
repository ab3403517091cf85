/// Input handling system
/// Turns mouse drags and scrolling into orbit camera controls
use winit::event::{ElementState, MouseButton, MouseScrollDelta, WindowEvent};
use winit::keyboard::{KeyCode, PhysicalKey};

use crate::renderer::Camera;

/// Keyboard shortcuts the application reacts to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputAction {
    TogglePause,
    ResetTrail,
}

pub struct InputHandler {
    dragging: bool,
    last_mouse_pos: Option<(f32, f32)>,
    mouse_delta: (f32, f32),
    scroll_delta: f32,
    actions: Vec<InputAction>,
}

impl InputHandler {
    pub fn new() -> Self {
        Self {
            dragging: false,
            last_mouse_pos: None,
            mouse_delta: (0.0, 0.0),
            scroll_delta: 0.0,
            actions: Vec::new(),
        }
    }

    /// Returns true when the event was used for camera or shortcut handling
    pub fn handle_event(&mut self, event: &WindowEvent) -> bool {
        match event {
            WindowEvent::MouseInput { state, button, .. } => {
                self.handle_mouse_input(*state, *button)
            }
            WindowEvent::CursorMoved { position, .. } => {
                self.handle_mouse_movement(position.x as f32, position.y as f32)
            }
            WindowEvent::CursorLeft { .. } => {
                self.dragging = false;
                self.last_mouse_pos = None;
                false
            }
            WindowEvent::MouseWheel { delta, .. } => self.handle_scroll(delta),
            WindowEvent::KeyboardInput { event, .. } => {
                if event.state != ElementState::Pressed || event.repeat {
                    return false;
                }
                let action = match event.physical_key {
                    PhysicalKey::Code(KeyCode::Space) => InputAction::TogglePause,
                    PhysicalKey::Code(KeyCode::KeyR) => InputAction::ResetTrail,
                    _ => return false,
                };
                self.actions.push(action);
                true
            }
            _ => false,
        }
    }

    fn handle_mouse_input(&mut self, state: ElementState, button: MouseButton) -> bool {
        match button {
            MouseButton::Left | MouseButton::Right => {
                self.dragging = state == ElementState::Pressed;
                true
            }
            _ => false,
        }
    }

    fn handle_mouse_movement(&mut self, x: f32, y: f32) -> bool {
        let previous = self.last_mouse_pos.replace((x, y));
        match previous {
            Some((last_x, last_y)) if self.dragging => {
                self.mouse_delta.0 += x - last_x;
                self.mouse_delta.1 += y - last_y;
                true
            }
            _ => false,
        }
    }

    fn handle_scroll(&mut self, delta: &MouseScrollDelta) -> bool {
        self.scroll_delta += match delta {
            MouseScrollDelta::LineDelta(_, y) => *y,
            MouseScrollDelta::PixelDelta(pos) => pos.y as f32 / 100.0,
        };
        true
    }

    /// Feed accumulated drag and scroll into the camera
    pub fn apply_to_camera(&mut self, camera: &mut Camera) {
        let (dx, dy) = std::mem::take(&mut self.mouse_delta);
        if dx != 0.0 || dy != 0.0 {
            camera.process_mouse_movement(dx, dy);
        }
        let scroll = std::mem::take(&mut self.scroll_delta);
        if scroll != 0.0 {
            camera.process_scroll(scroll);
        }
    }

    pub fn take_actions(&mut self) -> Vec<InputAction> {
        std::mem::take(&mut self.actions)
    }

    /// Drop a pending drag, e.g. when the pointer moves over the UI
    pub fn cancel_drag(&mut self) {
        self.dragging = false;
        self.mouse_delta = (0.0, 0.0);
    }
}

impl Default for InputHandler {
    fn default() -> Self {
        Self::new()
    }
}
