//! Headless host
//!
//! Keeps a ledger of live registrations instead of touching a DOM. Native
//! smoke runs and the engine tests drive it by feeding `HostEvent`s directly.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use crate::engine::lifecycle::{EventKind, Host, ListenTarget, Resource, ResourceKind, TimerKind};
use crate::engine::viewport::LayoutSample;
use crate::error::EngineError;

/// Live registrations by id
pub type Ledger = Rc<RefCell<HashMap<u32, Registration>>>;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Registration {
    Listener(ListenTarget, EventKind),
    Observer,
    Interval { period_ms: u32, timer: TimerKind },
    Frame,
}

impl Registration {
    fn kind(&self) -> ResourceKind {
        match self {
            Registration::Listener(..) => ResourceKind::Listener,
            Registration::Observer => ResourceKind::Observer,
            Registration::Interval { .. } => ResourceKind::Interval,
            Registration::Frame => ResourceKind::Frame,
        }
    }
}

#[derive(Debug)]
pub struct HeadlessHost {
    ledger: Ledger,
    next_id: u32,
    layout: Option<LayoutSample>,
    hidden: bool,
    now_ms: f64,
    /// Refuse registrations once this many have been granted
    refuse_after: Option<usize>,
    granted: usize,
}

impl HeadlessHost {
    pub fn new(width: f32, height: f32) -> Self {
        Self::with_layout(Some(LayoutSample::new(width, height, 1.0)))
    }

    /// Host whose surface never had a layout
    pub fn detached() -> Self {
        Self::with_layout(None)
    }

    fn with_layout(layout: Option<LayoutSample>) -> Self {
        Self {
            ledger: Rc::new(RefCell::new(HashMap::new())),
            next_id: 1,
            layout,
            hidden: false,
            now_ms: 0.0,
            refuse_after: None,
            granted: 0,
        }
    }

    /// Shared view of the ledger that outlives the host
    pub fn ledger(&self) -> Ledger {
        self.ledger.clone()
    }

    pub fn outstanding(&self) -> usize {
        self.ledger.borrow().len()
    }

    pub fn count(&self, kind: ResourceKind) -> usize {
        self.ledger.borrow().values().filter(|r| r.kind() == kind).count()
    }

    /// Running intervals as (timer, period)
    pub fn intervals(&self) -> Vec<(TimerKind, u32)> {
        self.ledger
            .borrow()
            .values()
            .filter_map(|r| match r {
                Registration::Interval { period_ms, timer } => Some((*timer, *period_ms)),
                _ => None,
            })
            .collect()
    }

    pub fn set_layout(&mut self, layout: LayoutSample) {
        self.layout = Some(layout);
    }

    /// Simulate the canvas being removed from the document
    pub fn detach(&mut self) {
        self.layout = None;
    }

    pub fn set_hidden(&mut self, hidden: bool) {
        self.hidden = hidden;
    }

    pub fn advance(&mut self, ms: f64) {
        self.now_ms += ms;
    }

    pub fn refuse_after(&mut self, granted: usize) {
        self.refuse_after = Some(granted);
    }

    fn grant(&mut self, registration: Registration) -> Result<Resource, EngineError> {
        if self.refuse_after.is_some_and(|limit| self.granted >= limit) {
            return Err(EngineError::Host(format!("refused {:?}", registration)));
        }
        let id = self.next_id;
        self.next_id += 1;
        self.granted += 1;
        self.ledger.borrow_mut().insert(id, registration);
        Ok(Resource {
            id,
            kind: registration.kind(),
        })
    }
}

impl Host for HeadlessHost {
    fn listen(&mut self, target: ListenTarget, kind: EventKind) -> Result<Resource, EngineError> {
        self.grant(Registration::Listener(target, kind))
    }

    fn observe_visibility(&mut self) -> Result<Resource, EngineError> {
        self.grant(Registration::Observer)
    }

    fn start_interval(&mut self, period_ms: u32, timer: TimerKind) -> Result<Resource, EngineError> {
        self.grant(Registration::Interval { period_ms, timer })
    }

    fn request_frame(&mut self) -> Result<Resource, EngineError> {
        self.grant(Registration::Frame)
    }

    fn release(&mut self, resource: Resource) {
        self.ledger.borrow_mut().remove(&resource.id);
    }

    fn layout(&self) -> Option<LayoutSample> {
        self.layout
    }

    fn surface_alive(&self) -> bool {
        self.layout.is_some()
    }

    fn document_hidden(&self) -> bool {
        self.hidden
    }

    fn now_ms(&self) -> f64 {
        self.now_ms
    }
}
