use std::collections::HashSet;

use super::types::{InputEvent, MouseButton, MouseButtonState, PointerButtonEvent, PointerMoveEvent};

/// Current pointer state for the canvas window.
#[derive(Debug, Default)]
pub struct InputState {
    /// Whether the window is focused.
    pub focused: bool,

    /// Pointer position in physical window pixels.
    pub pointer_pos: Option<(f32, f32)>,

    /// Set of currently held mouse buttons.
    pub buttons_down: HashSet<MouseButton>,
}

impl InputState {
    /// Applies an event to the current state.
    ///
    /// Returns `false` for button events that are not a real transition
    /// (a release for a button that was never pressed inside the window, or a
    /// repeated press). The runtime drops those instead of dispatching them.
    pub fn apply_event(&mut self, ev: &InputEvent) -> bool {
        match ev {
            InputEvent::Focused(f) => {
                self.focused = *f;
                if !*f {
                    // Avoid stuck buttons when focus changes mid-press.
                    self.buttons_down.clear();
                }
                true
            }

            InputEvent::PointerMoved(PointerMoveEvent { x, y }) => {
                self.pointer_pos = Some((*x, *y));
                true
            }

            InputEvent::PointerLeft => {
                // A press that leaves the window can no longer complete a click.
                self.pointer_pos = None;
                self.buttons_down.clear();
                true
            }

            InputEvent::PointerButton(PointerButtonEvent { button, state, .. }) => match state {
                MouseButtonState::Pressed => self.buttons_down.insert(*button),
                MouseButtonState::Released => self.buttons_down.remove(button),
            },
        }
    }

    pub fn button_down(&self, btn: MouseButton) -> bool {
        self.buttons_down.contains(&btn)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn button(button: MouseButton, state: MouseButtonState) -> InputEvent {
        InputEvent::PointerButton(PointerButtonEvent { button, state, x: 0.0, y: 0.0 })
    }

    #[test]
    fn release_without_press_is_not_a_transition() {
        let mut s = InputState::default();
        assert!(!s.apply_event(&button(MouseButton::Left, MouseButtonState::Released)));
    }

    #[test]
    fn press_then_release_are_transitions() {
        let mut s = InputState::default();
        assert!(s.apply_event(&button(MouseButton::Left, MouseButtonState::Pressed)));
        assert!(s.button_down(MouseButton::Left));
        assert!(!s.apply_event(&button(MouseButton::Left, MouseButtonState::Pressed)));
        assert!(s.apply_event(&button(MouseButton::Left, MouseButtonState::Released)));
        assert!(!s.button_down(MouseButton::Left));
    }

    #[test]
    fn focus_loss_clears_held_buttons() {
        let mut s = InputState::default();
        s.apply_event(&button(MouseButton::Right, MouseButtonState::Pressed));
        s.apply_event(&InputEvent::Focused(false));
        assert!(s.buttons_down.is_empty());
        assert!(!s.apply_event(&button(MouseButton::Right, MouseButtonState::Released)));
    }

    #[test]
    fn pointer_position_tracks_moves_and_leave() {
        let mut s = InputState::default();
        s.apply_event(&InputEvent::PointerMoved(PointerMoveEvent { x: 3.0, y: 4.0 }));
        assert_eq!(s.pointer_pos, Some((3.0, 4.0)));
        s.apply_event(&InputEvent::PointerLeft);
        assert_eq!(s.pointer_pos, None);
    }

    #[test]
    fn pointer_leave_clears_held_buttons() {
        let mut s = InputState::default();
        s.apply_event(&button(MouseButton::Left, MouseButtonState::Pressed));
        s.apply_event(&InputEvent::PointerLeft);
        assert!(!s.button_down(MouseButton::Left));
        assert!(!s.apply_event(&button(MouseButton::Left, MouseButtonState::Released)));
    }
}
