use winit::event::{ElementState, MouseButton as WinitMouseButton, WindowEvent};

use super::{InputEvent, InputState, MouseButton, MouseButtonState, PointerButtonEvent, PointerMoveEvent};

/// Translates a winit `WindowEvent` into an engine `InputEvent`.
///
/// Positions stay in physical pixels. Returns `None` for events the input
/// subsystem does not represent, and for button transitions while the pointer
/// is outside the window.
pub(crate) fn translate_window_event(state: &InputState, event: &WindowEvent) -> Option<InputEvent> {
    match event {
        WindowEvent::Focused(f) => Some(InputEvent::Focused(*f)),

        WindowEvent::CursorLeft { .. } => Some(InputEvent::PointerLeft),

        WindowEvent::CursorMoved { position, .. } => Some(InputEvent::PointerMoved(PointerMoveEvent {
            x: position.x as f32,
            y: position.y as f32,
        })),

        WindowEvent::MouseInput { state: st, button, .. } => {
            let st = match st {
                ElementState::Pressed => MouseButtonState::Pressed,
                ElementState::Released => MouseButtonState::Released,
            };
            // A transition with no known cursor position (pointer outside the
            // window) is not a click on the canvas.
            let (x, y) = state.pointer_pos?;

            Some(InputEvent::PointerButton(PointerButtonEvent {
                button: map_mouse_button(*button),
                state: st,
                x,
                y,
            }))
        }

        _ => None,
    }
}

fn map_mouse_button(b: WinitMouseButton) -> MouseButton {
    match b {
        WinitMouseButton::Left => MouseButton::Left,
        WinitMouseButton::Right => MouseButton::Right,
        WinitMouseButton::Middle => MouseButton::Middle,
        WinitMouseButton::Back => MouseButton::Back,
        WinitMouseButton::Forward => MouseButton::Forward,
        WinitMouseButton::Other(v) => MouseButton::Other(v),
    }
}
