//! Lifecycle guard
//!
//! Every listener, observer, interval and frame callback an engine acquires
//! goes through `Lifecycle`, which remembers the handle and releases it on
//! teardown or drop. Callers never pair add/remove by hand.

use std::collections::HashMap;

use super::viewport::LayoutSample;
use crate::error::EngineError;

/// Where a listener is attached
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ListenTarget {
    Window,
    Document,
    /// The host-provided canvas
    Surface,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    PointerMove,
    PointerDown,
    PointerUp,
    PointerLeave,
    Click,
    TouchStart,
    TouchMove,
    TouchEnd,
    KeyDown,
    KeyUp,
    Resize,
    VisibilityChange,
}

impl EventKind {
    /// DOM event name
    pub fn dom_name(&self) -> &'static str {
        match self {
            EventKind::PointerMove => "mousemove",
            EventKind::PointerDown => "mousedown",
            EventKind::PointerUp => "mouseup",
            EventKind::PointerLeave => "mouseout",
            EventKind::Click => "click",
            EventKind::TouchStart => "touchstart",
            EventKind::TouchMove => "touchmove",
            EventKind::TouchEnd => "touchend",
            EventKind::KeyDown => "keydown",
            EventKind::KeyUp => "keyup",
            EventKind::Resize => "resize",
            EventKind::VisibilityChange => "visibilitychange",
        }
    }
}

/// Timer identity as seen by the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimerKind {
    /// Fire-while-held repeat
    AutoFire,
    /// Scene-defined periodic timer (spawners)
    Scene(u16),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    Listener,
    Observer,
    Interval,
    Frame,
}

/// Handle to one host registration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Resource {
    pub id: u32,
    pub kind: ResourceKind,
}

/// Platform seam. The browser implementation lives in `platform::web`, the
/// headless one in `platform::headless`.
pub trait Host {
    fn listen(&mut self, target: ListenTarget, kind: EventKind) -> Result<Resource, EngineError>;

    /// Report the surface entering/leaving the viewport
    fn observe_visibility(&mut self) -> Result<Resource, EngineError>;

    fn start_interval(&mut self, period_ms: u32, timer: TimerKind) -> Result<Resource, EngineError>;

    /// One-shot animation frame callback
    fn request_frame(&mut self) -> Result<Resource, EngineError>;

    /// Release a registration. Releasing an unknown or already-fired handle is a no-op.
    fn release(&mut self, resource: Resource);

    /// Current surface layout; None when the surface is gone
    fn layout(&self) -> Option<LayoutSample>;

    /// Cheap liveness check run every frame
    fn surface_alive(&self) -> bool;

    fn document_hidden(&self) -> bool {
        false
    }

    fn now_ms(&self) -> f64;
}

pub struct Lifecycle<H: Host> {
    host: H,
    /// Listeners and observers, in acquisition order
    held: Vec<Resource>,
    intervals: HashMap<TimerKind, Resource>,
    frame: Option<Resource>,
}

impl<H: Host> Lifecycle<H> {
    pub fn new(host: H) -> Self {
        Self {
            host,
            held: Vec::new(),
            intervals: HashMap::new(),
            frame: None,
        }
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    pub fn listen(&mut self, target: ListenTarget, kind: EventKind) -> Result<(), EngineError> {
        let resource = self.host.listen(target, kind)?;
        self.held.push(resource);
        Ok(())
    }

    pub fn observe_visibility(&mut self) -> Result<(), EngineError> {
        let resource = self.host.observe_visibility()?;
        self.held.push(resource);
        Ok(())
    }

    /// Start a periodic timer. At most one per `TimerKind`; returns false
    /// if it was already running.
    pub fn start_interval(&mut self, timer: TimerKind, period_ms: u32) -> Result<bool, EngineError> {
        if self.intervals.contains_key(&timer) {
            return Ok(false);
        }
        let resource = self.host.start_interval(period_ms, timer)?;
        self.intervals.insert(timer, resource);
        Ok(true)
    }

    /// Returns true if the timer was running
    pub fn stop_interval(&mut self, timer: TimerKind) -> bool {
        match self.intervals.remove(&timer) {
            Some(resource) => {
                self.host.release(resource);
                true
            }
            None => false,
        }
    }

    pub fn is_interval_running(&self, timer: TimerKind) -> bool {
        self.intervals.contains_key(&timer)
    }

    /// Stop every scene-defined timer (restart re-registers them)
    pub fn stop_scene_intervals(&mut self) {
        let scene: Vec<TimerKind> = self
            .intervals
            .keys()
            .filter(|k| matches!(k, TimerKind::Scene(_)))
            .copied()
            .collect();
        for timer in scene {
            self.stop_interval(timer);
        }
    }

    /// Register the next animation frame unless one is already pending
    pub fn request_frame(&mut self) -> Result<(), EngineError> {
        if self.frame.is_some() {
            return Ok(());
        }
        self.frame = Some(self.host.request_frame()?);
        Ok(())
    }

    /// The pending frame callback ran; forget its handle
    pub fn complete_frame(&mut self) {
        if let Some(resource) = self.frame.take() {
            self.host.release(resource);
        }
    }

    pub fn has_frame(&self) -> bool {
        self.frame.is_some()
    }

    /// Registrations currently held
    pub fn outstanding(&self) -> usize {
        self.held.len() + self.intervals.len() + usize::from(self.frame.is_some())
    }

    /// Release everything, most recent first. Safe to call repeatedly.
    pub fn release_all(&mut self) {
        if let Some(resource) = self.frame.take() {
            self.host.release(resource);
        }
        for (_, resource) in self.intervals.drain() {
            self.host.release(resource);
        }
        while let Some(resource) = self.held.pop() {
            self.host.release(resource);
        }
    }
}

impl<H: Host> Drop for Lifecycle<H> {
    fn drop(&mut self) {
        self.release_all();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::headless::HeadlessHost;

    #[test]
    fn test_release_all_returns_to_zero() {
        let mut lifecycle = Lifecycle::new(HeadlessHost::new(800.0, 600.0));
        lifecycle.listen(ListenTarget::Window, EventKind::PointerMove).unwrap();
        lifecycle.listen(ListenTarget::Surface, EventKind::Click).unwrap();
        lifecycle.observe_visibility().unwrap();
        lifecycle.start_interval(TimerKind::Scene(0), 1000).unwrap();
        lifecycle.request_frame().unwrap();
        assert_eq!(lifecycle.outstanding(), 5);
        assert_eq!(lifecycle.host().outstanding(), 5);

        lifecycle.release_all();
        assert_eq!(lifecycle.outstanding(), 0);
        assert_eq!(lifecycle.host().outstanding(), 0);

        lifecycle.release_all();
        assert_eq!(lifecycle.host().outstanding(), 0);
    }

    #[test]
    fn test_single_frame_registration() {
        let mut lifecycle = Lifecycle::new(HeadlessHost::new(800.0, 600.0));
        lifecycle.request_frame().unwrap();
        lifecycle.request_frame().unwrap();
        assert_eq!(lifecycle.host().count(ResourceKind::Frame), 1);
        lifecycle.complete_frame();
        assert_eq!(lifecycle.host().count(ResourceKind::Frame), 0);
        lifecycle.request_frame().unwrap();
        assert_eq!(lifecycle.host().count(ResourceKind::Frame), 1);
    }

    #[test]
    fn test_interval_per_kind() {
        let mut lifecycle = Lifecycle::new(HeadlessHost::new(800.0, 600.0));
        assert!(lifecycle.start_interval(TimerKind::AutoFire, 150).unwrap());
        assert!(!lifecycle.start_interval(TimerKind::AutoFire, 150).unwrap());
        lifecycle.start_interval(TimerKind::Scene(1), 2000).unwrap();
        lifecycle.start_interval(TimerKind::Scene(2), 10000).unwrap();

        lifecycle.stop_scene_intervals();
        assert!(lifecycle.is_interval_running(TimerKind::AutoFire));
        assert_eq!(lifecycle.host().count(ResourceKind::Interval), 1);

        assert!(lifecycle.stop_interval(TimerKind::AutoFire));
        assert!(!lifecycle.stop_interval(TimerKind::AutoFire));
    }

    #[test]
    fn test_drop_releases() {
        let host = HeadlessHost::new(800.0, 600.0);
        let ledger = host.ledger();
        {
            let mut lifecycle = Lifecycle::new(host);
            lifecycle.listen(ListenTarget::Window, EventKind::KeyDown).unwrap();
            lifecycle.request_frame().unwrap();
            assert_eq!(ledger.borrow().len(), 2);
        }
        assert!(ledger.borrow().is_empty());
    }
}
