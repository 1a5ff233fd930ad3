//! Platform abstraction layer
//!
//! Implementations of the engine's `Host` seam:
//! - `headless`: in-memory host for native runs and tests
//! - `web`: DOM listeners, timers, animation frames, observers (WASM only)
//! - `canvas`: `Painter` over `CanvasRenderingContext2d` (WASM only)
//! - `mount`: the `wasm_bindgen` API hosts call to mount effects (WASM only)
//!
//! `EffectControl` erases the engine's scene/render/host generics so a
//! mounted effect can be driven through one handle type.

pub mod headless;

#[cfg(target_arch = "wasm32")]
pub mod canvas;
#[cfg(target_arch = "wasm32")]
pub mod mount;
#[cfg(target_arch = "wasm32")]
pub mod web;

pub use headless::HeadlessHost;

use std::cell::RefCell;
use std::rc::Rc;

use crate::engine::lifecycle::Host;
use crate::engine::runner::{Callbacks, Engine, EnginePhase, GameStats, HostEvent, Render, Simulation};
use crate::error::EngineError;
use crate::renderer::{Draw2d, PaintedRender, Painter};
use crate::scenes::{
    Arena, BorderFrame, CursorTrail, DigitalRain, OrbField, SceneKind, ShaderBackdrop, Shooter, Starfield,
};
use crate::settings::EngineConfig;

/// Object-safe view of a running engine
pub trait EffectControl {
    fn activate(&mut self) -> Result<(), EngineError>;
    fn handle(&mut self, event: HostEvent);
    fn set_paused(&mut self, paused: bool);
    fn set_hovering(&mut self, hovering: bool);
    fn restart(&mut self) -> Result<(), EngineError>;
    fn deactivate(&mut self);
    fn phase(&self) -> EnginePhase;
    fn stats(&self) -> Option<GameStats>;
}

impl<S, R, H> EffectControl for Engine<S, R, H>
where
    S: Simulation,
    R: Render<S>,
    H: Host,
{
    fn activate(&mut self) -> Result<(), EngineError> {
        Engine::activate(self)
    }

    fn handle(&mut self, event: HostEvent) {
        Engine::handle(self, event);
    }

    fn set_paused(&mut self, paused: bool) {
        Engine::set_paused(self, paused);
    }

    fn set_hovering(&mut self, hovering: bool) {
        Engine::set_hovering(self, hovering);
    }

    fn restart(&mut self) -> Result<(), EngineError> {
        Engine::restart(self)
    }

    fn deactivate(&mut self) {
        Engine::deactivate(self);
    }

    fn phase(&self) -> EnginePhase {
        Engine::phase(self)
    }

    fn stats(&self) -> Option<GameStats> {
        self.sim().stats()
    }
}

/// Shared handle to an engine of any scene
pub type SharedEffect = Rc<RefCell<dyn EffectControl>>;

fn painted<S, P, H>(sim: S, painter: P, host: H, config: &EngineConfig, callbacks: Callbacks) -> SharedEffect
where
    S: Simulation + Draw2d + 'static,
    P: Painter + 'static,
    H: Host + 'static,
{
    let render = PaintedRender::for_scene(painter, &sim);
    Rc::new(RefCell::new(
        Engine::new(sim, render, host, config).with_callbacks(callbacks),
    ))
}

/// Build (but do not activate) a 2D-painted engine for `kind`.
///
/// The shader backdrop gets its static gradient here; the GPU pipeline is
/// mounted separately because adapter setup is async.
pub fn painted_effect<P, H>(
    kind: SceneKind,
    config: &EngineConfig,
    painter: P,
    host: H,
    callbacks: Callbacks,
) -> SharedEffect
where
    P: Painter + 'static,
    H: Host + 'static,
{
    log::debug!("Building {} effect", kind.as_str());
    match kind {
        SceneKind::DigitalRain => painted(DigitalRain::new(config), painter, host, config, callbacks),
        SceneKind::Starfield => painted(Starfield::new(config), painter, host, config, callbacks),
        SceneKind::Cursor => painted(CursorTrail::new(config), painter, host, config, callbacks),
        SceneKind::BorderFrame => painted(BorderFrame::new(config), painter, host, config, callbacks),
        SceneKind::ShaderBackdrop => painted(ShaderBackdrop::new(config), painter, host, config, callbacks),
        SceneKind::OrbField => painted(OrbField::new(config), painter, host, config, callbacks),
        SceneKind::Shooter => painted(Shooter::new(config), painter, host, config, callbacks),
        SceneKind::Arena => painted(Arena::new(config), painter, host, config, callbacks),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::input::InputEvent;
    use crate::engine::lifecycle::TimerKind;
    use crate::renderer::RecordingPainter;

    fn drive(effect: &SharedEffect, frames: usize) {
        let mut effect = effect.borrow_mut();
        for i in 0..frames {
            effect.handle(HostEvent::Frame(i as f64 * 16.7));
            if i % 10 == 0 {
                effect.handle(HostEvent::Input(InputEvent::PointerMove {
                    x: 100.0 + i as f32,
                    y: 200.0,
                }));
                effect.handle(HostEvent::Timer(TimerKind::Scene(0)));
            }
        }
    }

    #[test]
    fn test_every_scene_runs_and_releases_everything() {
        let config = EngineConfig {
            seed: Some(3),
            ..Default::default()
        };
        for kind in SceneKind::ALL {
            let host = HeadlessHost::new(800.0, 600.0);
            let ledger = host.ledger();
            let effect = painted_effect(kind, &config, RecordingPainter::new(), host, Callbacks::default());

            effect.borrow_mut().activate().unwrap();
            assert_eq!(effect.borrow().phase(), EnginePhase::Active, "{}", kind.as_str());
            assert!(!ledger.borrow().is_empty());

            drive(&effect, 120);
            assert_eq!(effect.borrow().stats().is_some(), kind.is_game(), "{}", kind.as_str());

            effect.borrow_mut().deactivate();
            assert!(ledger.borrow().is_empty(), "{} leaked", kind.as_str());
        }
    }

    #[test]
    fn test_dropping_the_handle_releases_registrations() {
        let host = HeadlessHost::new(640.0, 480.0);
        let ledger = host.ledger();
        let effect = painted_effect(
            SceneKind::Arena,
            &EngineConfig::default(),
            RecordingPainter::new(),
            host,
            Callbacks::default(),
        );
        effect.borrow_mut().activate().unwrap();
        drop(effect);
        assert!(ledger.borrow().is_empty());
    }

    #[test]
    fn test_restart_keeps_engine_live() {
        let effect = painted_effect(
            SceneKind::Shooter,
            &EngineConfig::default(),
            RecordingPainter::new(),
            HeadlessHost::new(800.0, 600.0),
            Callbacks::default(),
        );
        effect.borrow_mut().activate().unwrap();
        drive(&effect, 30);
        effect.borrow_mut().restart().unwrap();
        assert_eq!(effect.borrow().stats().map(|s| s.score), Some(0));

        effect.borrow_mut().deactivate();
        assert!(effect.borrow_mut().restart().is_err());
    }
}
