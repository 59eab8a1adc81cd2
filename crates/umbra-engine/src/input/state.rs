use std::collections::HashSet;

use super::frame::InputFrame;
use super::types::{InputEvent, Key, KeyState, Modifiers, MouseButton, MouseButtonState};

/// Current input state for the window.
///
/// Holds "is down" information and the pointer position. Transitions and
/// motion are recorded into an `InputFrame`.
#[derive(Debug, Default)]
pub struct InputState {
    pub modifiers: Modifiers,

    pub focused: bool,

    /// Pointer position in physical pixels.
    pub pointer_pos: Option<(f32, f32)>,

    pub keys_down: HashSet<Key>,

    pub buttons_down: HashSet<MouseButton>,
}

impl InputState {
    /// Applies an input event to the current state and writes deltas to `frame`.
    pub fn apply_event(&mut self, frame: &mut InputFrame, ev: InputEvent) {
        match &ev {
            InputEvent::ModifiersChanged(m) => {
                self.modifiers = *m;
            }

            InputEvent::Focused(f) => {
                self.focused = *f;
                if !*f {
                    // Avoid stuck keys/buttons when focus changes mid-press.
                    self.keys_down.clear();
                    self.buttons_down.clear();
                }
            }

            InputEvent::PointerMoved { x, y } => {
                if let Some((px, py)) = self.pointer_pos {
                    frame.pointer_delta.0 += x - px;
                    frame.pointer_delta.1 += y - py;
                }
                self.pointer_pos = Some((*x, *y));
            }

            InputEvent::PointerLeft => {
                // Re-entering must not produce a jump in the delta.
                self.pointer_pos = None;
            }

            InputEvent::Key { key, state, repeat } => match state {
                KeyState::Pressed => {
                    if self.keys_down.insert(*key) && !*repeat {
                        frame.keys_pressed.insert(*key);
                    }
                }
                KeyState::Released => {
                    if self.keys_down.remove(key) {
                        frame.keys_released.insert(*key);
                    }
                }
            },

            InputEvent::PointerButton { button, state } => match state {
                MouseButtonState::Pressed => {
                    if self.buttons_down.insert(*button) {
                        frame.buttons_pressed.insert(*button);
                    }
                }
                MouseButtonState::Released => {
                    if self.buttons_down.remove(button) {
                        frame.buttons_released.insert(*button);
                    }
                }
            },

            InputEvent::Wheel(delta) => {
                frame.wheel.x += delta.x;
                frame.wheel.y += delta.y;
            }
        }

        frame.push_event(ev);
    }

    pub fn key_down(&self, key: Key) -> bool {
        self.keys_down.contains(&key)
    }

    pub fn button_down(&self, btn: MouseButton) -> bool {
        self.buttons_down.contains(&btn)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(key: Key, state: KeyState) -> InputEvent {
        InputEvent::Key { key, state, repeat: false }
    }

    // ── pointer ───────────────────────────────────────────────────────────

    #[test]
    fn first_pointer_move_has_no_delta() {
        let mut state = InputState::default();
        let mut frame = InputFrame::default();
        state.apply_event(&mut frame, InputEvent::PointerMoved { x: 100.0, y: 50.0 });
        assert_eq!(frame.pointer_delta, (0.0, 0.0));
    }

    #[test]
    fn pointer_delta_accumulates_within_frame() {
        let mut state = InputState::default();
        let mut frame = InputFrame::default();
        state.apply_event(&mut frame, InputEvent::PointerMoved { x: 0.0, y: 0.0 });
        state.apply_event(&mut frame, InputEvent::PointerMoved { x: 3.0, y: -1.0 });
        state.apply_event(&mut frame, InputEvent::PointerMoved { x: 5.0, y: 2.0 });
        assert_eq!(frame.pointer_delta, (5.0, 2.0));

        frame.clear();
        assert_eq!(frame.pointer_delta, (0.0, 0.0));
    }

    #[test]
    fn pointer_left_resets_baseline() {
        let mut state = InputState::default();
        let mut frame = InputFrame::default();
        state.apply_event(&mut frame, InputEvent::PointerMoved { x: 0.0, y: 0.0 });
        state.apply_event(&mut frame, InputEvent::PointerLeft);
        state.apply_event(&mut frame, InputEvent::PointerMoved { x: 400.0, y: 400.0 });
        assert_eq!(frame.pointer_delta, (0.0, 0.0));
    }

    // ── keys ──────────────────────────────────────────────────────────────

    #[test]
    fn press_and_release_are_recorded_once() {
        let mut state = InputState::default();
        let mut frame = InputFrame::default();
        state.apply_event(&mut frame, key(Key::W, KeyState::Pressed));
        assert!(state.key_down(Key::W));
        assert!(frame.key_pressed(Key::W));

        frame.clear();
        state.apply_event(&mut frame, InputEvent::Key { key: Key::W, state: KeyState::Pressed, repeat: true });
        assert!(!frame.key_pressed(Key::W));

        state.apply_event(&mut frame, key(Key::W, KeyState::Released));
        assert!(!state.key_down(Key::W));
        assert!(frame.keys_released.contains(&Key::W));
    }

    #[test]
    fn focus_loss_clears_held_input() {
        let mut state = InputState::default();
        let mut frame = InputFrame::default();
        state.apply_event(&mut frame, key(Key::A, KeyState::Pressed));
        state.apply_event(
            &mut frame,
            InputEvent::PointerButton { button: MouseButton::Right, state: MouseButtonState::Pressed },
        );
        state.apply_event(&mut frame, InputEvent::Focused(false));
        assert!(!state.key_down(Key::A));
        assert!(!state.button_down(MouseButton::Right));
    }
}
