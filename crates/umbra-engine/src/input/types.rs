use std::fmt;

/// Keyboard key identifier.
///
/// Covers the keys the camera controller and debug tooling bind to.
/// Anything else maps to `Key::Unknown(code)`.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum Key {
    Escape,
    Enter,
    Tab,
    Space,

    ArrowUp,
    ArrowDown,
    ArrowLeft,
    ArrowRight,

    Shift,
    Control,
    Alt,

    // Letters
    A, B, C, D, E, F, G, H, I, J, K, L, M,
    N, O, P, Q, R, S, T, U, V, W, X, Y, Z,

    // Digits
    Digit0, Digit1, Digit2, Digit3, Digit4,
    Digit5, Digit6, Digit7, Digit8, Digit9,

    Minus,
    Equal,
    BracketLeft,
    BracketRight,

    F1, F2, F3, F4,

    /// Platform key without a dedicated variant.
    Unknown(u32),
}

impl Key {
    /// Maps `Digit1..=Digit9` to `0..=8`; used for index selection shortcuts.
    pub fn digit_index(self) -> Option<usize> {
        let idx = match self {
            Key::Digit1 => 0,
            Key::Digit2 => 1,
            Key::Digit3 => 2,
            Key::Digit4 => 3,
            Key::Digit5 => 4,
            Key::Digit6 => 5,
            Key::Digit7 => 6,
            Key::Digit8 => 7,
            Key::Digit9 => 8,
            _ => return None,
        };
        Some(idx)
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum KeyState {
    Pressed,
    Released,
}

/// Mouse button identifier.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum MouseButton {
    Left,
    Right,
    Middle,
    Other(u16),
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum MouseButtonState {
    Pressed,
    Released,
}

/// Modifier keys state.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq)]
pub struct Modifiers {
    pub shift: bool,
    pub ctrl: bool,
    pub alt: bool,
}

/// Mouse wheel delta, in lines.
///
/// Pixel deltas from touchpads are converted by the platform layer.
#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct WheelDelta {
    pub x: f32,
    pub y: f32,
}

/// Platform-agnostic input events emitted by the runtime.
#[derive(Debug, Clone, PartialEq)]
pub enum InputEvent {
    ModifiersChanged(Modifiers),

    Key {
        key: Key,
        state: KeyState,
        /// True when the event is an OS key-repeat.
        repeat: bool,
    },

    /// Pointer position in physical pixels.
    PointerMoved { x: f32, y: f32 },

    PointerButton {
        button: MouseButton,
        state: MouseButtonState,
    },

    Wheel(WheelDelta),

    /// Pointer left the window surface.
    PointerLeft,

    /// Window focus change.
    Focused(bool),
}
