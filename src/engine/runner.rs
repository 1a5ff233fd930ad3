//! Engine driver
//!
//! Owns one simulation, one render strategy and the host registrations for a
//! single surface. Every host callback enters through `Engine::handle`, which
//! checks the phase first so callbacks that were already queued when the
//! engine was torn down are silent no-ops.

use super::clock::FrameClock;
use super::input::{FireEdge, InputBridge, InputEvent, InputSnapshot};
use super::lifecycle::{EventKind, Host, Lifecycle, ListenTarget, TimerKind};
use super::viewport::{LayoutSample, Viewport, ViewportMetrics};
use crate::consts::AUTO_FIRE_MS;
use crate::error::EngineError;
use crate::highscores::BestScore;
use crate::settings::EngineConfig;

/// Engine state machine: `Idle -> Active <-> Paused -> Destroyed`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnginePhase {
    Idle,
    Active,
    Paused,
    Destroyed,
}

/// Everything the host can tell the engine
#[derive(Debug, Clone, PartialEq)]
pub enum HostEvent {
    /// Animation frame with its timestamp (ms)
    Frame(f64),
    Input(InputEvent),
    Timer(TimerKind),
    Resize(LayoutSample),
    /// Document visibility changed
    Visibility { hidden: bool },
    /// Surface entered or left the viewport
    InView(bool),
}

/// Periodic timer a scene wants while active
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SceneTimer {
    pub tag: u16,
    pub period_ms: u32,
}

/// Host-visible game counters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct GameStats {
    pub score: u64,
    pub lives: u32,
    pub level: u32,
    pub combo: u32,
    pub game_over: bool,
}

/// Per-tick inputs to `Simulation::update`
pub struct UpdateContext<'a> {
    /// Seconds since the previous tick, already clamped
    pub dt: f32,
    /// Frame timestamp (ms)
    pub now_ms: f64,
    pub input: &'a InputSnapshot,
    pub metrics: &'a ViewportMetrics,
}

/// Scene logic
pub trait Simulation {
    /// Logic ticks per second before low-power adjustment (0 = every frame)
    fn target_fps(&self) -> f32;

    /// Surface resolution relative to CSS pixels
    fn resolution_scale(&self) -> f32 {
        1.0
    }

    /// Input listeners beyond the resize/visibility set every engine holds
    fn listeners(&self) -> &'static [(ListenTarget, EventKind)] {
        &[]
    }

    fn timers(&self) -> Vec<SceneTimer> {
        Vec::new()
    }

    /// Fire immediately on press and repeat every `AUTO_FIRE_MS` while held
    fn auto_repeat(&self) -> bool {
        false
    }

    /// (Re)build all state for a fresh session
    fn reset(&mut self, metrics: &ViewportMetrics);

    /// Rebuild size-dependent data
    fn resize(&mut self, metrics: &ViewportMetrics);

    fn update(&mut self, ctx: &mut UpdateContext<'_>);

    fn on_timer(&mut self, _tag: u16, _metrics: &ViewportMetrics) {}

    fn on_fire(&mut self, _now_ms: f64) {}

    /// Interactive-target hover, reported by the host
    fn set_hovering(&mut self, _hovering: bool) {}

    /// Game counters; None for decorative scenes
    fn stats(&self) -> Option<GameStats> {
        None
    }

    /// Scene asked to be closed (Escape in the arena)
    fn close_requested(&self) -> bool {
        false
    }
}

/// Draws one complete frame of `S`
pub trait Render<S> {
    fn resize(&mut self, metrics: &ViewportMetrics) -> Result<(), EngineError>;

    fn render(&mut self, sim: &S, metrics: &ViewportMetrics, time_ms: f64) -> Result<(), EngineError>;
}

/// Host-visible notifications. Each fires at most once per actual change.
#[derive(Default)]
pub struct Callbacks {
    pub on_score_change: Option<Box<dyn FnMut(u64)>>,
    pub on_lives_change: Option<Box<dyn FnMut(u32)>>,
    pub on_level_change: Option<Box<dyn FnMut(u32)>>,
    pub on_combo_change: Option<Box<dyn FnMut(u32)>>,
    pub on_game_over: Option<Box<dyn FnMut(GameStats)>>,
    pub on_failure: Option<Box<dyn FnMut(&EngineError)>>,
    pub on_close: Option<Box<dyn FnMut()>>,
}

impl Callbacks {
    fn publish(&mut self, prev: Option<GameStats>, next: GameStats) {
        let changed = |f: fn(&GameStats) -> u64| prev.as_ref().map(f) != Some(f(&next));

        if changed(|s| s.score) {
            notify(&mut self.on_score_change, next.score);
        }
        if changed(|s| s.lives as u64) {
            notify(&mut self.on_lives_change, next.lives);
        }
        if changed(|s| s.level as u64) {
            notify(&mut self.on_level_change, next.level);
        }
        if changed(|s| s.combo as u64) {
            notify(&mut self.on_combo_change, next.combo);
        }
        if next.game_over && !prev.is_some_and(|p| p.game_over) {
            notify(&mut self.on_game_over, next);
        }
    }

    fn fail(&mut self, err: &EngineError) {
        if let Some(cb) = self.on_failure.as_mut() {
            cb(err);
        }
    }
}

fn notify<T>(callback: &mut Option<Box<dyn FnMut(T)>>, value: T) {
    if let Some(cb) = callback.as_mut() {
        cb(value);
    }
}

#[derive(Debug, Clone, Copy, Default)]
struct PauseReasons {
    hidden: bool,
    offscreen: bool,
    external: bool,
}

impl PauseReasons {
    fn any(&self) -> bool {
        self.hidden || self.offscreen || self.external
    }
}

pub struct Engine<S, R, H>
where
    S: Simulation,
    R: Render<S>,
    H: Host,
{
    sim: S,
    render: R,
    lifecycle: Lifecycle<H>,
    clock: FrameClock,
    viewport: Viewport,
    input: InputBridge,
    phase: EnginePhase,
    pause: PauseReasons,
    callbacks: Callbacks,
    published: Option<GameStats>,
    best: Option<BestScore>,
    close_reported: bool,
}

impl<S, R, H> Engine<S, R, H>
where
    S: Simulation,
    R: Render<S>,
    H: Host,
{
    pub fn new(sim: S, render: R, host: H, config: &EngineConfig) -> Self {
        let clock = FrameClock::new(config.target_fps(sim.target_fps()));
        let viewport = Viewport::new(
            config.resolution_scale(sim.resolution_scale()),
            config.mobile_optimized,
        );
        Self {
            sim,
            render,
            lifecycle: Lifecycle::new(host),
            clock,
            viewport,
            input: InputBridge::new(),
            phase: EnginePhase::Idle,
            pause: PauseReasons {
                external: config.paused,
                ..Default::default()
            },
            callbacks: Callbacks::default(),
            published: None,
            best: config.best_score_key.as_deref().map(BestScore::load),
            close_reported: false,
        }
    }

    pub fn with_callbacks(mut self, callbacks: Callbacks) -> Self {
        self.callbacks = callbacks;
        self
    }

    pub fn phase(&self) -> EnginePhase {
        self.phase
    }

    pub fn is_live(&self) -> bool {
        matches!(self.phase, EnginePhase::Active | EnginePhase::Paused)
    }

    pub fn sim(&self) -> &S {
        &self.sim
    }

    pub fn sim_mut(&mut self) -> &mut S {
        &mut self.sim
    }

    pub fn renderer(&self) -> &R {
        &self.render
    }

    pub fn host(&self) -> &H {
        self.lifecycle.host()
    }

    pub fn host_mut(&mut self) -> &mut H {
        self.lifecycle.host_mut()
    }

    pub fn metrics(&self) -> &ViewportMetrics {
        self.viewport.metrics()
    }

    pub fn best_score(&self) -> Option<&BestScore> {
        self.best.as_ref()
    }

    /// Registrations currently held through the lifecycle
    pub fn registrations(&self) -> usize {
        self.lifecycle.outstanding()
    }

    /// Acquire every host resource and start the clock.
    ///
    /// Fails closed: on error everything acquired so far is released,
    /// `on_failure` fires once and the engine is destroyed.
    pub fn activate(&mut self) -> Result<(), EngineError> {
        match self.phase {
            EnginePhase::Destroyed => return Err(EngineError::Destroyed),
            EnginePhase::Active | EnginePhase::Paused => return Ok(()),
            EnginePhase::Idle => {}
        }

        if let Err(err) = self.try_activate() {
            log::warn!("Activation failed: {}", err);
            self.lifecycle.release_all();
            self.clock.stop();
            self.phase = EnginePhase::Destroyed;
            self.callbacks.fail(&err);
            return Err(err);
        }

        self.phase = EnginePhase::Active;
        self.pause.hidden = self.lifecycle.host().document_hidden();
        self.refresh_pause();
        self.publish();
        log::info!(
            "Engine active ({}x{} surface, {} registrations)",
            self.viewport.metrics().width(),
            self.viewport.metrics().height(),
            self.lifecycle.outstanding()
        );
        Ok(())
    }

    fn try_activate(&mut self) -> Result<(), EngineError> {
        let sample = self
            .lifecycle
            .host()
            .layout()
            .ok_or_else(|| EngineError::SurfaceUnavailable("surface has no layout".into()))?;
        self.viewport.resize(sample);
        let metrics = *self.viewport.metrics();
        self.render.resize(&metrics)?;
        self.sim.reset(&metrics);

        self.lifecycle.listen(ListenTarget::Window, EventKind::Resize)?;
        self.lifecycle.listen(ListenTarget::Document, EventKind::VisibilityChange)?;
        self.lifecycle.observe_visibility()?;
        for (target, kind) in self.sim.listeners() {
            self.lifecycle.listen(*target, *kind)?;
        }
        self.start_scene_timers()?;

        self.clock.start();
        self.lifecycle.request_frame()
    }

    fn start_scene_timers(&mut self) -> Result<(), EngineError> {
        for timer in self.sim.timers() {
            self.lifecycle.start_interval(TimerKind::Scene(timer.tag), timer.period_ms)?;
        }
        Ok(())
    }

    /// Release everything. Idempotent; also runs on drop.
    pub fn deactivate(&mut self) {
        if self.phase == EnginePhase::Destroyed {
            return;
        }
        self.clock.stop();
        self.lifecycle.release_all();
        self.input.reset();
        self.phase = EnginePhase::Destroyed;
        log::info!("Engine deactivated");
    }

    /// Reset the scene for a new session without re-acquiring listeners
    pub fn restart(&mut self) -> Result<(), EngineError> {
        if !self.is_live() {
            return Err(EngineError::Destroyed);
        }
        let metrics = *self.viewport.metrics();
        self.sim.reset(&metrics);
        self.input.reset();
        self.lifecycle.stop_interval(TimerKind::AutoFire);
        self.lifecycle.stop_scene_intervals();
        self.start_scene_timers()?;
        self.published = None;
        self.close_reported = false;
        self.publish();
        log::info!("Scene restarted");
        Ok(())
    }

    /// External pause flag (overlay closed, host decision)
    pub fn set_paused(&mut self, paused: bool) {
        self.pause.external = paused;
        self.refresh_pause();
    }

    pub fn set_hovering(&mut self, hovering: bool) {
        if self.is_live() {
            self.sim.set_hovering(hovering);
        }
    }

    fn refresh_pause(&mut self) {
        if !self.is_live() {
            return;
        }
        let paused = self.pause.any();
        self.clock.set_paused(paused);
        let next = if paused {
            EnginePhase::Paused
        } else {
            EnginePhase::Active
        };
        if next != self.phase {
            if paused {
                self.lifecycle.stop_interval(TimerKind::AutoFire);
            } else if self.input.fire_held() && self.sim.auto_repeat() {
                // Fire was held through the pause; no new press will re-arm it
                if let Err(err) = self.lifecycle.start_interval(TimerKind::AutoFire, AUTO_FIRE_MS) {
                    log::warn!("Auto-fire unavailable: {}", err);
                }
            }
            log::info!("Engine {:?} -> {:?} ({:?})", self.phase, next, self.pause);
            self.phase = next;
        }
    }

    /// Entry point for every host callback
    pub fn handle(&mut self, event: HostEvent) {
        if !self.is_live() {
            log::debug!("Ignoring {:?} in phase {:?}", event, self.phase);
            return;
        }
        match event {
            HostEvent::Frame(ts) => self.on_frame(ts),
            HostEvent::Input(input) => self.on_input(input),
            HostEvent::Timer(timer) => self.on_timer(timer),
            HostEvent::Resize(sample) => self.viewport.request(sample),
            HostEvent::Visibility { hidden } => {
                self.pause.hidden = hidden;
                self.refresh_pause();
            }
            HostEvent::InView(visible) => {
                self.pause.offscreen = !visible;
                self.refresh_pause();
            }
        }
    }

    fn on_frame(&mut self, timestamp: f64) {
        self.lifecycle.complete_frame();

        if !self.lifecycle.host().surface_alive() {
            log::info!("Surface gone, stopping");
            self.deactivate();
            return;
        }
        if let Err(err) = self.lifecycle.request_frame() {
            log::warn!("Could not schedule next frame: {}", err);
            self.callbacks.fail(&err);
            self.deactivate();
            return;
        }
        if self.phase == EnginePhase::Paused {
            return;
        }

        if self.viewport.apply_pending() {
            let metrics = *self.viewport.metrics();
            self.sim.resize(&metrics);
            if let Err(err) = self.render.resize(&metrics) {
                log::warn!("Resize failed: {}", err);
                self.deactivate();
                return;
            }
        }

        let Some(dt) = self.clock.on_frame(timestamp) else {
            return;
        };

        let input = self.input.snapshot();
        let metrics = *self.viewport.metrics();
        let mut ctx = UpdateContext {
            dt,
            now_ms: timestamp,
            input: &input,
            metrics: &metrics,
        };
        self.sim.update(&mut ctx);

        match self.render.render(&self.sim, &metrics, timestamp) {
            Ok(()) => {}
            Err(EngineError::SurfaceLost) => {
                log::info!("Surface lost mid-frame, stopping");
                self.deactivate();
                return;
            }
            Err(err) => log::warn!("Skipping frame: {}", err),
        }

        self.publish();
    }

    fn on_input(&mut self, event: InputEvent) {
        let edge = self.input.handle(&event, self.viewport.metrics());
        match edge {
            FireEdge::Released => {
                self.lifecycle.stop_interval(TimerKind::AutoFire);
            }
            FireEdge::Pressed if self.phase == EnginePhase::Active && self.sim.auto_repeat() => {
                let now = self.lifecycle.host().now_ms();
                self.sim.on_fire(now);
                if let Err(err) = self.lifecycle.start_interval(TimerKind::AutoFire, AUTO_FIRE_MS) {
                    log::warn!("Auto-fire unavailable: {}", err);
                }
            }
            _ => {}
        }
    }

    fn on_timer(&mut self, timer: TimerKind) {
        if self.phase == EnginePhase::Paused {
            return;
        }
        match timer {
            TimerKind::AutoFire => {
                if self.input.fire_held() {
                    let now = self.lifecycle.host().now_ms();
                    self.sim.on_fire(now);
                } else {
                    self.lifecycle.stop_interval(TimerKind::AutoFire);
                }
            }
            TimerKind::Scene(tag) => {
                let metrics = *self.viewport.metrics();
                self.sim.on_timer(tag, &metrics);
            }
        }
    }

    /// Push changed counters to the host
    fn publish(&mut self) {
        if let Some(stats) = self.sim.stats() {
            let prev = self.published.replace(stats);
            if prev != Some(stats) {
                if stats.game_over && !prev.is_some_and(|p| p.game_over) {
                    self.lifecycle.stop_interval(TimerKind::AutoFire);
                    self.record_best(stats);
                }
                self.callbacks.publish(prev, stats);
            }
        }

        if self.sim.close_requested() && !self.close_reported {
            self.close_reported = true;
            if let Some(cb) = self.callbacks.on_close.as_mut() {
                cb();
            }
        }
    }

    fn record_best(&mut self, stats: GameStats) {
        if let Some(best) = self.best.as_mut() {
            if best.record(stats.score, stats.level) {
                best.save();
            }
        }
    }
}

impl<S, R, H> Drop for Engine<S, R, H>
where
    S: Simulation,
    R: Render<S>,
    H: Host,
{
    fn drop(&mut self) {
        self.deactivate();
    }
}
