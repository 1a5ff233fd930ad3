//! Real-time simulation engine
//!
//! One generic loop replaces the per-effect loops:
//! - `clock`: frame scheduling, logic rate cap, pause
//! - `viewport`: surface sizing, DPR, resize coalescing
//! - `store`: append / single-pass update-and-prune collections
//! - `input`: pointer/touch/keyboard normalization and per-tick snapshots
//! - `physics`: integrators, springs, radius collisions, level thresholds
//! - `lifecycle`: the `Host` seam and scoped registration ownership
//! - `runner`: the `Engine` driver and `Simulation`/`Render` strategies

pub mod clock;
pub mod input;
pub mod lifecycle;
pub mod physics;
pub mod runner;
pub mod store;
pub mod viewport;

pub use clock::FrameClock;
pub use input::{InputBridge, InputEvent, InputSnapshot};
pub use lifecycle::{EventKind, Host, Lifecycle, ListenTarget, Resource, ResourceKind, TimerKind};
pub use physics::{Spring, StepCarry};
pub use runner::{
    Callbacks, Engine, EnginePhase, GameStats, HostEvent, Render, SceneTimer, Simulation, UpdateContext,
};
pub use store::EntityStore;
pub use viewport::{LayoutSample, Viewport, ViewportMetrics};
