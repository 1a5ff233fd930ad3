//! Canvas Sim entry point
//!
//! On the web the library's `mount_*` API is the entry point and this binary
//! does nothing. Natively it runs every scene headless for a few seconds of
//! simulated frames and checks that nothing is left registered afterwards.
//!
//! Usage: `canvas-sim [scene] [frames]`

#[cfg(not(target_arch = "wasm32"))]
mod smoke {
    use canvas_sim::engine::input::InputEvent;
    use canvas_sim::engine::lifecycle::TimerKind;
    use canvas_sim::engine::runner::Callbacks;
    use canvas_sim::platform::{HeadlessHost, SharedEffect, painted_effect};
    use canvas_sim::renderer::RecordingPainter;
    use canvas_sim::scenes::SceneKind;
    use canvas_sim::{EngineConfig, HostEvent};

    const FRAME_MS: f64 = 1000.0 / 60.0;

    fn callbacks(kind: SceneKind) -> Callbacks {
        let name = kind.as_str();
        Callbacks {
            on_level_change: Some(Box::new(move |level| log::info!("[{name}] level {level}"))),
            on_game_over: Some(Box::new(move |stats| {
                log::info!("[{name}] game over: score {} level {}", stats.score, stats.level)
            })),
            on_failure: Some(Box::new(move |err: &canvas_sim::EngineError| log::error!("[{name}] failed: {err}"))),
            ..Default::default()
        }
    }

    /// Scripted input: circle the pointer, tap every half second, hold space now and then
    fn script(effect: &SharedEffect, frame: usize, center: (f32, f32)) {
        let mut effect = effect.borrow_mut();
        let t = frame as f32 * 0.05;
        let (x, y) = (center.0 + t.cos() * 200.0, center.1 + t.sin() * 150.0);
        effect.handle(HostEvent::Input(InputEvent::PointerMove { x, y }));

        match frame % 30 {
            0 => effect.handle(HostEvent::Input(InputEvent::PointerDown { x, y })),
            5 => {
                effect.handle(HostEvent::Input(InputEvent::PointerUp));
                effect.handle(HostEvent::Input(InputEvent::Click { x, y }));
            }
            _ => {}
        }
        match frame % 120 {
            60 => effect.handle(HostEvent::Input(InputEvent::KeyDown(" ".into()))),
            90 => effect.handle(HostEvent::Input(InputEvent::KeyUp(" ".into()))),
            _ => {}
        }
        if frame % 60 == 0 {
            for tag in 0..3 {
                effect.handle(HostEvent::Timer(TimerKind::Scene(tag)));
            }
        }
        effect.handle(HostEvent::Frame(frame as f64 * FRAME_MS));
    }

    /// Returns false if the scene failed or leaked registrations
    fn run_scene(kind: SceneKind, config: &EngineConfig, frames: usize) -> bool {
        let (width, height) = (1280.0, 720.0);
        let host = HeadlessHost::new(width, height);
        let ledger = host.ledger();
        let effect = painted_effect(kind, config, RecordingPainter::new(), host, callbacks(kind));

        if let Err(err) = effect.borrow_mut().activate() {
            log::error!("[{}] activation failed: {}", kind.as_str(), err);
            return false;
        }
        for frame in 0..frames {
            script(&effect, frame, (width / 2.0, height / 2.0));
        }

        let stats = effect.borrow().stats();
        let phase = effect.borrow().phase();
        effect.borrow_mut().deactivate();
        let leaked = ledger.borrow().len();

        match stats {
            Some(s) => log::info!(
                "[{}] {:?} after {} frames: score {} lives {} level {} combo {}",
                kind.as_str(),
                phase,
                frames,
                s.score,
                s.lives,
                s.level,
                s.combo
            ),
            None => log::info!("[{}] {:?} after {} frames", kind.as_str(), phase, frames),
        }
        if leaked > 0 {
            log::error!("[{}] {} registrations left after deactivate", kind.as_str(), leaked);
            return false;
        }
        true
    }

    pub fn run() -> i32 {
        let mut args = std::env::args().skip(1);
        let kinds: Vec<SceneKind> = match args.next() {
            Some(name) if name != "all" => match SceneKind::parse(&name) {
                Some(kind) => vec![kind],
                None => {
                    log::error!("Unknown scene '{}'", name);
                    return 2;
                }
            },
            _ => SceneKind::ALL.to_vec(),
        };
        let frames = args.next().and_then(|n| n.parse().ok()).unwrap_or(600);

        let config = EngineConfig {
            seed: Some(canvas_sim::scenes::DEFAULT_SEED),
            ..Default::default()
        };
        let failed = kinds
            .iter()
            .filter(|kind| !run_scene(**kind, &config, frames))
            .count();
        if failed > 0 {
            log::error!("{} scene(s) failed", failed);
            return 1;
        }
        log::info!("All {} scene(s) ran clean", kinds.len());
        0
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    log::info!("Canvas Sim (native) smoke run");
    std::process::exit(smoke::run());
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is platform::mount::start
}
