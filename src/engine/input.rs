//! Input bridge
//!
//! Host events arrive in CSS pixels relative to the surface origin and are
//! stored in simulation units. Edge events (clicks, key presses) queue up
//! between ticks and are consumed by `snapshot`.

use std::collections::HashSet;

use glam::Vec2;

use super::viewport::ViewportMetrics;
use crate::consts::NO_POINTER;

/// Normalized host input
#[derive(Debug, Clone, PartialEq)]
pub enum InputEvent {
    PointerMove { x: f32, y: f32 },
    PointerDown { x: f32, y: f32 },
    PointerUp,
    /// Pointer left the window
    PointerLeave,
    Click { x: f32, y: f32 },
    TouchStart { x: f32, y: f32 },
    TouchMove { x: f32, y: f32 },
    TouchEnd,
    KeyDown(String),
    KeyUp(String),
}

/// What the engine must do in response to an input event beyond recording it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FireEdge {
    None,
    /// Fire now and start the repeat timer
    Pressed,
    /// Stop the repeat timer
    Released,
}

/// Immutable view of input for one tick
#[derive(Debug, Clone, PartialEq)]
pub struct InputSnapshot {
    /// Pointer in simulation units, `NO_POINTER` when absent
    pub pointer: Vec2,
    /// Pointer moved since the previous snapshot
    pub moved: bool,
    /// Held keys, lowercased
    pub keys: HashSet<String>,
    /// Keys pressed since the previous snapshot, lowercased
    pub pressed: Vec<String>,
    /// Click positions since the previous snapshot
    pub clicks: Vec<Vec2>,
    /// Primary button or touch currently held
    pub fire_held: bool,
}

impl Default for InputSnapshot {
    fn default() -> Self {
        Self {
            pointer: Vec2::from(NO_POINTER),
            moved: false,
            keys: HashSet::new(),
            pressed: Vec::new(),
            clicks: Vec::new(),
            fire_held: false,
        }
    }
}

impl InputSnapshot {
    /// Pointer position, or None when the sentinel is set
    pub fn pointer(&self) -> Option<Vec2> {
        (self.pointer != Vec2::from(NO_POINTER)).then_some(self.pointer)
    }

    pub fn is_key_down(&self, key: &str) -> bool {
        self.keys.contains(&key.to_lowercase())
    }

    /// True if any of `keys` is held
    pub fn any_down(&self, keys: &[&str]) -> bool {
        keys.iter().any(|k| self.is_key_down(k))
    }

    pub fn was_pressed(&self, key: &str) -> bool {
        let key = key.to_lowercase();
        self.pressed.iter().any(|k| *k == key)
    }
}

#[derive(Debug, Clone, Default)]
pub struct InputBridge {
    pointer: Option<Vec2>,
    moved: bool,
    keys: HashSet<String>,
    pressed: Vec<String>,
    clicks: Vec<Vec2>,
    fire_held: bool,
}

impl InputBridge {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one host event
    pub fn handle(&mut self, event: &InputEvent, metrics: &ViewportMetrics) -> FireEdge {
        match event {
            InputEvent::PointerMove { x, y } | InputEvent::TouchMove { x, y } => {
                self.set_pointer(metrics.to_surface(Vec2::new(*x, *y)));
                FireEdge::None
            }
            InputEvent::PointerDown { x, y } | InputEvent::TouchStart { x, y } => {
                self.set_pointer(metrics.to_surface(Vec2::new(*x, *y)));
                if self.fire_held {
                    return FireEdge::None;
                }
                self.fire_held = true;
                FireEdge::Pressed
            }
            InputEvent::PointerUp => self.release(),
            InputEvent::TouchEnd => {
                self.pointer = None;
                self.moved = true;
                self.release()
            }
            InputEvent::PointerLeave => {
                self.pointer = None;
                self.moved = true;
                FireEdge::None
            }
            InputEvent::Click { x, y } => {
                self.clicks.push(metrics.to_surface(Vec2::new(*x, *y)));
                FireEdge::None
            }
            InputEvent::KeyDown(key) => {
                let key = key.to_lowercase();
                // Held keys repeat keydown; only the first counts as a press
                if self.keys.insert(key.clone()) {
                    self.pressed.push(key);
                }
                FireEdge::None
            }
            InputEvent::KeyUp(key) => {
                self.keys.remove(&key.to_lowercase());
                FireEdge::None
            }
        }
    }

    fn set_pointer(&mut self, p: Vec2) {
        self.pointer = Some(p);
        self.moved = true;
    }

    fn release(&mut self) -> FireEdge {
        if !self.fire_held {
            return FireEdge::None;
        }
        self.fire_held = false;
        FireEdge::Released
    }

    /// Current pointer in simulation units, `NO_POINTER` when absent
    pub fn current_position(&self) -> Vec2 {
        self.pointer.unwrap_or(Vec2::from(NO_POINTER))
    }

    pub fn is_key_down(&self, key: &str) -> bool {
        self.keys.contains(&key.to_lowercase())
    }

    pub fn fire_held(&self) -> bool {
        self.fire_held
    }

    /// Take the per-tick snapshot, consuming edge events
    pub fn snapshot(&mut self) -> InputSnapshot {
        InputSnapshot {
            pointer: self.current_position(),
            moved: std::mem::take(&mut self.moved),
            keys: self.keys.clone(),
            pressed: std::mem::take(&mut self.pressed),
            clicks: std::mem::take(&mut self.clicks),
            fire_held: self.fire_held,
        }
    }

    /// Forget everything (restart, deactivation)
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn metrics(scale: f32) -> ViewportMetrics {
        ViewportMetrics {
            css_width: 1000.0,
            css_height: 800.0,
            dpr: 2.0,
            scale,
        }
    }

    #[test]
    fn test_sentinel_when_no_pointer() {
        let mut bridge = InputBridge::new();
        assert_eq!(bridge.current_position(), Vec2::new(-1000.0, -1000.0));
        assert_eq!(bridge.snapshot().pointer(), None);
    }

    #[test]
    fn test_positions_are_in_surface_units() {
        let mut bridge = InputBridge::new();
        bridge.handle(&InputEvent::PointerMove { x: 100.0, y: 50.0 }, &metrics(0.5));
        assert_eq!(bridge.current_position(), Vec2::new(50.0, 25.0));

        // Touch shares the same stream
        bridge.handle(&InputEvent::TouchMove { x: 10.0, y: 20.0 }, &metrics(0.5));
        assert_eq!(bridge.current_position(), Vec2::new(5.0, 10.0));

        bridge.handle(&InputEvent::TouchEnd, &metrics(0.5));
        assert_eq!(bridge.snapshot().pointer(), None);
    }

    #[test]
    fn test_keys_are_case_insensitive() {
        let mut bridge = InputBridge::new();
        let m = metrics(1.0);
        bridge.handle(&InputEvent::KeyDown("ArrowLeft".into()), &m);
        assert!(bridge.is_key_down("arrowleft"));
        assert!(bridge.is_key_down("ARROWLEFT"));
        bridge.handle(&InputEvent::KeyUp("arrowLEFT".into()), &m);
        assert!(!bridge.is_key_down("ArrowLeft"));
    }

    #[test]
    fn test_edges_are_consumed_once() {
        let mut bridge = InputBridge::new();
        let m = metrics(1.0);
        bridge.handle(&InputEvent::KeyDown(" ".into()), &m);
        bridge.handle(&InputEvent::KeyDown(" ".into()), &m);
        bridge.handle(&InputEvent::Click { x: 3.0, y: 4.0 }, &m);

        let first = bridge.snapshot();
        assert_eq!(first.pressed, vec![" ".to_string()]);
        assert_eq!(first.clicks, vec![Vec2::new(3.0, 4.0)]);
        assert!(first.is_key_down(" "));

        let second = bridge.snapshot();
        assert!(second.pressed.is_empty());
        assert!(second.clicks.is_empty());
        // Level state survives
        assert!(second.is_key_down(" "));
    }

    #[test]
    fn test_fire_edges() {
        let mut bridge = InputBridge::new();
        let m = metrics(1.0);
        assert_eq!(bridge.handle(&InputEvent::PointerUp, &m), FireEdge::None);
        assert_eq!(
            bridge.handle(&InputEvent::PointerDown { x: 1.0, y: 1.0 }, &m),
            FireEdge::Pressed
        );
        assert_eq!(
            bridge.handle(&InputEvent::TouchStart { x: 1.0, y: 1.0 }, &m),
            FireEdge::None
        );
        assert!(bridge.fire_held());
        assert_eq!(bridge.handle(&InputEvent::PointerUp, &m), FireEdge::Released);
        assert_eq!(bridge.handle(&InputEvent::PointerUp, &m), FireEdge::None);
    }
}
