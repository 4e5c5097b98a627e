//! Keyboard input tracking
//!
//! Every key carries a frame counter: 0 while idle, counting up from 1 while
//! held, and the negated hold length on the frame it is released. Raw key
//! events from the host are buffered and folded into the counters once per
//! frame by `Input::update`, which must run before gameplay reads input.

use std::cell::RefCell;
use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::EngineError;

/// Physical key codes (subset of the UI Events `code` table)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Key {
    ArrowUp,
    ArrowDown,
    ArrowLeft,
    ArrowRight,
    KeyA,
    KeyB,
    KeyC,
    KeyD,
    KeyE,
    KeyF,
    KeyG,
    KeyH,
    KeyI,
    KeyJ,
    KeyK,
    KeyL,
    KeyM,
    KeyN,
    KeyO,
    KeyP,
    KeyQ,
    KeyR,
    KeyS,
    KeyT,
    KeyU,
    KeyV,
    KeyW,
    KeyX,
    KeyY,
    KeyZ,
    Digit0,
    Digit1,
    Digit2,
    Digit3,
    Digit4,
    Digit5,
    Digit6,
    Digit7,
    Digit8,
    Digit9,
    ShiftLeft,
    ShiftRight,
    ControlLeft,
    ControlRight,
    AltLeft,
    AltRight,
    Space,
    Enter,
    Escape,
    Tab,
    Backspace,
    F1,
    F2,
    F3,
    F4,
    F5,
    F6,
    F7,
    F8,
    F9,
    F10,
    F11,
    F12,
}

/// Event folded in since the last update
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum KeyEvent {
    None,
    Down,
    Up,
    /// Pressed and released between two updates
    DownAndUp,
}

/// Per-key frame-counter state machine
#[derive(Debug, Default)]
pub struct Input {
    states: RefCell<HashMap<Key, f32>>,
    events: RefCell<HashMap<Key, KeyEvent>>,
}

/// Default hold limit for `is_short_click`
pub const SHORT_CLICK_MAX_HOLD: f32 = 10.0;
/// Default hold minimum for `is_long_release`
pub const LONG_RELEASE_MIN_HOLD: f32 = 12.0;

impl Input {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a raw key press from the host
    pub fn press(&self, key: Key) {
        self.events.borrow_mut().insert(key, KeyEvent::Down);
    }

    /// Record a raw key release from the host
    pub fn release(&self, key: Key) {
        let mut events = self.events.borrow_mut();
        let event = events.entry(key).or_insert(KeyEvent::None);
        match *event {
            KeyEvent::None => *event = KeyEvent::Up,
            KeyEvent::Down => *event = KeyEvent::DownAndUp,
            KeyEvent::Up | KeyEvent::DownAndUp => {}
        }
    }

    /// Fold buffered events into the frame counters
    ///
    /// `time_scale` is how much a held counter advances this frame; hosts
    /// normally pass 1 so input timing is unaffected by slow motion.
    pub fn update(&self, time_scale: f32) {
        let mut states = self.states.borrow_mut();
        let mut events = self.events.borrow_mut();
        for (key, event) in events.iter_mut() {
            let state = states.entry(*key).or_insert(0.0);
            match *event {
                KeyEvent::None => {
                    if *state > 0.0 {
                        *state += time_scale;
                    } else {
                        *state = 0.0;
                    }
                }
                KeyEvent::Up => {
                    if *state > 0.0 {
                        *state = -*state;
                    } else {
                        *state = 0.0;
                    }
                }
                KeyEvent::Down | KeyEvent::DownAndUp => {
                    if *state < 0.0 {
                        *state = time_scale;
                    } else {
                        *state += time_scale;
                    }
                }
            }
            // A tap inside one frame still shows up as a release next frame
            *event = if *event == KeyEvent::DownAndUp {
                KeyEvent::Up
            } else {
                KeyEvent::None
            };
        }
    }

    /// Raw frame counter for a key
    pub fn get_state(&self, key: Key) -> f32 {
        self.states.borrow().get(&key).copied().unwrap_or(0.0)
    }

    /// True on the first frame a key is held
    pub fn is_down(&self, key: Key) -> bool {
        self.get_state(key) == 1.0
    }

    /// True on the frame a key is released
    pub fn is_up(&self, key: Key) -> bool {
        self.get_state(key) < 0.0
    }

    /// True while a key is held
    pub fn is_hold(&self, key: Key) -> bool {
        self.get_state(key) > 0.0
    }

    /// True while a key is not held
    pub fn is_idle(&self, key: Key) -> bool {
        self.get_state(key) <= 0.0
    }

    /// Released this frame after being held at most `max_hold` frames
    pub fn is_short_click(&self, key: Key, max_hold: f32) -> bool {
        self.is_up(key) && self.get_state(key) >= -max_hold
    }

    /// Released this frame after being held at least `min_hold` frames
    pub fn is_long_release(&self, key: Key, min_hold: f32) -> bool {
        self.get_state(key) <= -min_hold
    }

    /// True while any key of the binding is held
    pub fn is_binding_hold(&self, binding: &KeyBinding) -> bool {
        binding.keys().iter().any(|k| self.is_hold(*k))
    }

    /// True on the first held frame of any key of the binding
    pub fn is_binding_down(&self, binding: &KeyBinding) -> bool {
        binding.keys().iter().any(|k| self.is_down(*k))
    }
}

/// A logical action bound to one or more physical keys
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Key>", into = "Vec<Key>")]
pub struct KeyBinding(Vec<Key>);

impl KeyBinding {
    /// Bind a single key
    pub fn single(key: Key) -> Self {
        Self(vec![key])
    }

    /// Bind several keys; any one of them activates the action
    pub fn new(keys: impl IntoIterator<Item = Key>) -> Result<Self, EngineError> {
        let mut keys: Vec<Key> = keys.into_iter().collect();
        keys.sort();
        keys.dedup();
        if keys.is_empty() {
            return Err(EngineError::EmptyKeyBinding);
        }
        Ok(Self(keys))
    }

    pub fn keys(&self) -> &[Key] {
        &self.0
    }
}

impl TryFrom<Vec<Key>> for KeyBinding {
    type Error = EngineError;

    fn try_from(keys: Vec<Key>) -> Result<Self, Self::Error> {
        Self::new(keys)
    }
}

impl From<KeyBinding> for Vec<Key> {
    fn from(binding: KeyBinding) -> Self {
        binding.0
    }
}

/// Player action bindings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct KeyMap {
    pub up: KeyBinding,
    pub down: KeyBinding,
    pub left: KeyBinding,
    pub right: KeyBinding,
    pub slow: KeyBinding,
    pub attack: KeyBinding,
    pub bomb: KeyBinding,
}

impl Default for KeyMap {
    fn default() -> Self {
        Self {
            up: KeyBinding::single(Key::ArrowUp),
            down: KeyBinding::single(Key::ArrowDown),
            left: KeyBinding::single(Key::ArrowLeft),
            right: KeyBinding::single(Key::ArrowRight),
            slow: KeyBinding::single(Key::ShiftLeft),
            attack: KeyBinding::single(Key::KeyZ),
            bomb: KeyBinding::single(Key::KeyX),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hold_counts_frames() {
        let input = Input::new();
        input.press(Key::KeyZ);
        input.update(1.0);
        assert!(input.is_down(Key::KeyZ));
        assert!(input.is_hold(Key::KeyZ));
        input.update(1.0);
        input.update(1.0);
        assert_eq!(input.get_state(Key::KeyZ), 3.0);
        assert!(!input.is_down(Key::KeyZ));
    }

    #[test]
    fn test_release_negates_then_idles() {
        let input = Input::new();
        input.press(Key::KeyX);
        for _ in 0..4 {
            input.update(1.0);
        }
        input.release(Key::KeyX);
        input.update(1.0);
        assert!(input.is_up(Key::KeyX));
        assert_eq!(input.get_state(Key::KeyX), -4.0);
        assert!(input.is_short_click(Key::KeyX, SHORT_CLICK_MAX_HOLD));
        assert!(!input.is_long_release(Key::KeyX, LONG_RELEASE_MIN_HOLD));
        input.update(1.0);
        assert!(input.is_idle(Key::KeyX));
        assert_eq!(input.get_state(Key::KeyX), 0.0);
    }

    #[test]
    fn test_tap_within_one_frame() {
        let input = Input::new();
        input.press(Key::Space);
        input.release(Key::Space);
        input.update(1.0);
        assert!(input.is_down(Key::Space));
        input.update(1.0);
        assert!(input.is_up(Key::Space));
        input.update(1.0);
        assert!(input.is_idle(Key::Space));
    }

    #[test]
    fn test_long_release() {
        let input = Input::new();
        input.press(Key::KeyC);
        for _ in 0..20 {
            input.update(1.0);
        }
        input.release(Key::KeyC);
        input.update(1.0);
        assert!(input.is_long_release(Key::KeyC, LONG_RELEASE_MIN_HOLD));
        assert!(!input.is_short_click(Key::KeyC, SHORT_CLICK_MAX_HOLD));
    }

    #[test]
    fn test_binding_any_key() {
        let input = Input::new();
        let slow = KeyBinding::new([Key::ShiftLeft, Key::Space]).unwrap();
        assert!(!input.is_binding_hold(&slow));
        input.press(Key::Space);
        input.update(1.0);
        assert!(input.is_binding_hold(&slow));
        assert!(input.is_binding_down(&slow));
    }

    #[test]
    fn test_empty_binding_rejected() {
        assert!(matches!(KeyBinding::new([]), Err(EngineError::EmptyKeyBinding)));
        let parsed: Result<KeyBinding, _> = serde_json::from_str("[]");
        assert!(parsed.is_err());
        let parsed: KeyBinding = serde_json::from_str(r#"["KeyW", "ArrowUp", "KeyW"]"#).unwrap();
        assert_eq!(parsed.keys().len(), 2);
    }
}
