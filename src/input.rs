use winit::event::{DeviceEvent, ElementState, MouseButton, MouseScrollDelta, WindowEvent};
use winit::keyboard::Key;

/// Per-frame aggregation of raw window and device events.
///
/// Events are pushed as they arrive and read by the frame loop through the
/// `take_*`/`consume_*` accessors; `clear_frame` resets the one-shot state at
/// the end of every redraw.
#[derive(Default)]
pub struct Input {
    pub mouse_delta: (f32, f32),
    pub wheel: f32,
    cursor_pos: Option<(f32, f32)>,
    left_pressed: bool,
    left_clicked: bool,
    right_pressed: bool,
    delete_pressed: bool,
}

impl Input {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, ev: InputEvent) {
        match ev {
            InputEvent::Key { key, pressed } => {
                if pressed && matches!(key.to_text(), Some("q") | Some("Q")) {
                    self.delete_pressed = true;
                }
            }
            InputEvent::MouseMove { dx, dy } => {
                self.mouse_delta.0 += dx;
                self.mouse_delta.1 += dy;
            }
            InputEvent::Wheel { delta } => {
                self.wheel += delta;
            }
            InputEvent::MouseButton { button, pressed } => match button {
                MouseButton::Left => {
                    if pressed {
                        self.left_clicked = true;
                        self.left_pressed = true;
                    } else {
                        self.left_pressed = false;
                    }
                }
                MouseButton::Right => {
                    self.right_pressed = pressed;
                }
                _ => {}
            },
            InputEvent::CursorPos { x, y } => {
                self.cursor_pos = Some((x, y));
            }
            InputEvent::CursorLeft => {
                self.cursor_pos = None;
            }
            InputEvent::Other => {}
        }
    }

    pub fn clear_frame(&mut self) {
        self.mouse_delta = (0.0, 0.0);
        self.wheel = 0.0;
        self.left_clicked = false;
        self.delete_pressed = false;
    }

    pub fn consume_wheel_delta(&mut self) -> Option<f32> {
        if self.wheel.abs() > 0.0 {
            let d = self.wheel;
            self.wheel = 0.0;
            Some(d)
        } else {
            None
        }
    }

    pub fn take_left_click(&mut self) -> bool {
        let was = self.left_clicked;
        self.left_clicked = false;
        was
    }

    pub fn take_delete_pressed(&mut self) -> bool {
        let was = self.delete_pressed;
        self.delete_pressed = false;
        was
    }

    pub fn left_held(&self) -> bool {
        self.left_pressed
    }

    pub fn right_held(&self) -> bool {
        self.right_pressed
    }

    pub fn cursor_position(&self) -> Option<(f32, f32)> {
        self.cursor_pos
    }
}

pub enum InputEvent {
    Key { key: Key, pressed: bool },
    MouseMove { dx: f32, dy: f32 },
    Wheel { delta: f32 },
    MouseButton { button: MouseButton, pressed: bool },
    CursorPos { x: f32, y: f32 },
    CursorLeft,
    Other,
}

impl InputEvent {
    pub fn from_window_event(ev: &WindowEvent) -> Self {
        match ev {
            WindowEvent::MouseWheel { delta, .. } => {
                let d = match delta {
                    MouseScrollDelta::LineDelta(_, y) => *y,
                    MouseScrollDelta::PixelDelta(p) => p.y as f32 / 40.0,
                };
                InputEvent::Wheel { delta: d }
            }
            WindowEvent::CursorMoved { position, .. } => {
                InputEvent::CursorPos { x: position.x as f32, y: position.y as f32 }
            }
            WindowEvent::CursorLeft { .. } => InputEvent::CursorLeft,
            WindowEvent::MouseInput { state, button, .. } => {
                InputEvent::MouseButton { button: *button, pressed: *state == ElementState::Pressed }
            }
            WindowEvent::KeyboardInput { event, .. } => InputEvent::Key {
                key: event.logical_key.clone(),
                pressed: event.state == ElementState::Pressed,
            },
            _ => InputEvent::Other,
        }
    }

    pub fn from_device_event(ev: &DeviceEvent) -> Self {
        match ev {
            DeviceEvent::MouseMotion { delta: (dx, dy) } => {
                InputEvent::MouseMove { dx: *dx as f32, dy: *dy as f32 }
            }
            _ => InputEvent::Other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn left_click_is_consumed_once() {
        let mut input = Input::new();
        input.push(InputEvent::MouseButton { button: MouseButton::Left, pressed: true });
        assert!(input.left_held());
        assert!(input.take_left_click());
        assert!(!input.take_left_click());
        assert!(input.left_held());
    }

    #[test]
    fn wheel_accumulates_until_consumed() {
        let mut input = Input::new();
        input.push(InputEvent::Wheel { delta: 1.0 });
        input.push(InputEvent::Wheel { delta: 0.5 });
        assert_eq!(input.consume_wheel_delta(), Some(1.5));
        assert_eq!(input.consume_wheel_delta(), None);
    }

    #[test]
    fn delete_key_sets_one_shot_flag() {
        let mut input = Input::new();
        input.push(InputEvent::Key { key: Key::Character("q".into()), pressed: true });
        assert!(input.take_delete_pressed());
        assert!(!input.take_delete_pressed());
    }

    #[test]
    fn cursor_leave_clears_position() {
        let mut input = Input::new();
        input.push(InputEvent::CursorPos { x: 10.0, y: 20.0 });
        assert_eq!(input.cursor_position(), Some((10.0, 20.0)));
        input.push(InputEvent::CursorLeft);
        assert_eq!(input.cursor_position(), None);
    }

    #[test]
    fn clear_frame_resets_per_frame_state_only() {
        let mut input = Input::new();
        input.push(InputEvent::MouseButton { button: MouseButton::Right, pressed: true });
        input.push(InputEvent::MouseMove { dx: 3.0, dy: 4.0 });
        input.clear_frame();
        assert_eq!(input.mouse_delta, (0.0, 0.0));
        assert!(input.right_held());
    }
}
