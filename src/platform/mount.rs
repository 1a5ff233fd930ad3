//! WASM mount API
//!
//! The page hands over a canvas it already owns plus JSON options and an
//! optional object of callbacks:
//!
//! ```js
//! const handle = mount_effect("arena", canvas, '{"lowPower":false}', {
//!   onScoreChange: (s) => {}, onGameOver: (stats) => {}, onClose: () => {},
//! });
//! handle.deactivate();
//! ```

use std::cell::RefCell;
use std::rc::Rc;

use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::HtmlCanvasElement;

use super::canvas::CanvasPainter;
use super::web::{Sink, WebHost};
use super::{EffectControl, SharedEffect, painted_effect};
use crate::engine::runner::{Callbacks, Engine, GameStats};
use crate::error::EngineError;
use crate::renderer::backdrop::BackdropRenderState;
use crate::scenes::{SceneKind, ShaderBackdrop};
use crate::settings::EngineConfig;

#[wasm_bindgen(start)]
pub fn start() {
    console_error_panic_hook::set_once();
    // A second init (hot reload) is harmless
    let _ = console_log::init_with_level(log::Level::Info);
}

/// Host-side handle to one mounted effect
#[wasm_bindgen]
pub struct EffectHandle {
    engine: SharedEffect,
}

impl EffectHandle {
    /// Run `f` now, or right after the current engine call if one is in progress
    fn control(&self, f: impl FnOnce(&mut dyn EffectControl) + 'static) {
        match self.engine.try_borrow_mut() {
            Ok(mut engine) => f(&mut *engine),
            Err(_) => {
                let engine = self.engine.clone();
                wasm_bindgen_futures::spawn_local(async move {
                    match engine.try_borrow_mut() {
                        Ok(mut engine) => f(&mut *engine),
                        Err(_) => log::warn!("Engine still busy, dropping host request"),
                    }
                });
            }
        }
    }
}

#[wasm_bindgen]
impl EffectHandle {
    pub fn set_paused(&self, paused: bool) {
        self.control(move |engine| engine.set_paused(paused));
    }

    /// Pointer is over an interactive element
    pub fn set_hovering(&self, hovering: bool) {
        self.control(move |engine| engine.set_hovering(hovering));
    }

    pub fn restart(&self) {
        self.control(|engine| {
            if let Err(err) = engine.restart() {
                log::warn!("Restart ignored: {}", err);
            }
        });
    }

    pub fn deactivate(&self) {
        self.control(|engine| engine.deactivate());
    }

    pub fn is_live(&self) -> bool {
        self.engine
            .try_borrow()
            .map(|engine| matches!(engine.phase(), crate::EnginePhase::Active | crate::EnginePhase::Paused))
            .unwrap_or(true)
    }
}

fn config_from(options_json: &str) -> Result<EngineConfig, EngineError> {
    let mut config = EngineConfig::from_json(options_json)?;
    if config.seed.is_none() {
        config.seed = Some(js_sys::Date::now() as u64);
    }
    Ok(config)
}

fn js_callback(callbacks: &JsValue, name: &str) -> Option<js_sys::Function> {
    if callbacks.is_undefined() || callbacks.is_null() {
        return None;
    }
    js_sys::Reflect::get(callbacks, &JsValue::from_str(name))
        .ok()?
        .dyn_into::<js_sys::Function>()
        .ok()
}

fn call(function: &js_sys::Function, arg: &JsValue) {
    if let Err(err) = function.call1(&JsValue::NULL, arg) {
        log::warn!("Host callback threw: {:?}", err);
    }
}

fn stats_object(stats: &GameStats) -> JsValue {
    let object = js_sys::Object::new();
    let fields = [
        ("score", JsValue::from_f64(stats.score as f64)),
        ("lives", JsValue::from(stats.lives)),
        ("level", JsValue::from(stats.level)),
        ("combo", JsValue::from(stats.combo)),
        ("gameOver", JsValue::from_bool(stats.game_over)),
    ];
    for (key, value) in fields {
        let _ = js_sys::Reflect::set(&object, &JsValue::from_str(key), &value);
    }
    object.into()
}

/// Map `{ onScoreChange, onLivesChange, onLevelChange, onComboChange,
/// onGameOver, onFailure, onClose }` onto engine callbacks
fn callbacks_from(js: &JsValue) -> Callbacks {
    let mut callbacks = Callbacks::default();
    if let Some(f) = js_callback(js, "onScoreChange") {
        callbacks.on_score_change = Some(Box::new(move |score| call(&f, &JsValue::from_f64(score as f64))));
    }
    if let Some(f) = js_callback(js, "onLivesChange") {
        callbacks.on_lives_change = Some(Box::new(move |lives| call(&f, &JsValue::from(lives))));
    }
    if let Some(f) = js_callback(js, "onLevelChange") {
        callbacks.on_level_change = Some(Box::new(move |level| call(&f, &JsValue::from(level))));
    }
    if let Some(f) = js_callback(js, "onComboChange") {
        callbacks.on_combo_change = Some(Box::new(move |combo| call(&f, &JsValue::from(combo))));
    }
    if let Some(f) = js_callback(js, "onGameOver") {
        callbacks.on_game_over = Some(Box::new(move |stats| call(&f, &stats_object(&stats))));
    }
    if let Some(f) = js_callback(js, "onFailure") {
        callbacks.on_failure = Some(Box::new(move |err: &EngineError| call(&f, &JsValue::from_str(&err.to_string()))));
    }
    if let Some(f) = js_callback(js, "onClose") {
        callbacks.on_close = Some(Box::new(move || call(&f, &JsValue::UNDEFINED)));
    }
    callbacks
}

/// Bind the host's closures to the engine, then start it
fn launch(engine: SharedEffect, host_sink: Sink) -> Result<EffectHandle, EngineError> {
    host_sink.bind(Rc::downgrade(&engine));
    engine.borrow_mut().activate()?;
    Ok(EffectHandle { engine })
}

/// Mount a canvas-painted effect. `kind` accepts names like `"digital-rain"`,
/// `"starfield"`, `"cursor"`, `"border-frame"`, `"orb-field"`, `"shooter"`,
/// `"arena"`; `"shader-backdrop"` mounts its static gradient.
#[wasm_bindgen]
pub fn mount_effect(
    kind: &str,
    canvas: HtmlCanvasElement,
    options_json: &str,
    callbacks: JsValue,
) -> Result<EffectHandle, JsValue> {
    let kind = SceneKind::parse(kind).ok_or_else(|| JsValue::from_str(&format!("unknown effect '{kind}'")))?;
    let config = config_from(options_json)?;
    let painter = CanvasPainter::new(&canvas)?;
    let host = WebHost::new(canvas)?;
    let sink = host.sink();

    let engine = painted_effect(kind, &config, painter, host, callbacks_from(&callbacks));
    let handle = launch(engine, sink)?;
    log::info!("Mounted {}", kind.as_str());
    Ok(handle)
}

async fn backdrop_engine(
    canvas: HtmlCanvasElement,
    config: &EngineConfig,
    callbacks: Callbacks,
) -> Result<(SharedEffect, Sink), EngineError> {
    use crate::engine::lifecycle::Host;

    let host = WebHost::new(canvas.clone())?;
    let sim = ShaderBackdrop::new(config);
    let scale = config.resolution_scale(crate::engine::runner::Simulation::resolution_scale(&sim));
    let sample = host
        .layout()
        .ok_or_else(|| EngineError::SurfaceUnavailable("canvas is not in the document".into()))?;
    let width = (sample.width * scale * sample.dpr).round().max(1.0) as u32;
    let height = (sample.height * scale * sample.dpr).round().max(1.0) as u32;

    let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
        backends: wgpu::Backends::BROWSER_WEBGPU | wgpu::Backends::GL,
        ..Default::default()
    });
    let surface = instance
        .create_surface(wgpu::SurfaceTarget::Canvas(canvas))
        .map_err(|e| EngineError::SurfaceUnavailable(e.to_string()))?;
    let adapter = instance
        .request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: if config.low_power {
                wgpu::PowerPreference::LowPower
            } else {
                wgpu::PowerPreference::HighPerformance
            },
            compatible_surface: Some(&surface),
            force_fallback_adapter: false,
        })
        .await
        .map_err(|e| EngineError::SurfaceUnavailable(e.to_string()))?;
    log::info!("Backdrop adapter: {:?}", adapter.get_info().name);

    let render = BackdropRenderState::new(surface, &adapter, width, height).await?;
    let sink = host.sink();
    let engine: SharedEffect = Rc::new(RefCell::new(
        Engine::new(sim, render, host, config).with_callbacks(callbacks),
    ));
    Ok((engine, sink))
}

/// Mount the GPU shader backdrop. Rejects when no GPU surface can be made;
/// the page keeps its static gradient in that case.
#[wasm_bindgen]
pub async fn mount_shader_backdrop(
    canvas: HtmlCanvasElement,
    options_json: String,
    callbacks: JsValue,
) -> Result<EffectHandle, JsValue> {
    let config = config_from(&options_json)?;
    let on_failure = js_callback(&callbacks, "onFailure");

    match backdrop_engine(canvas, &config, callbacks_from(&callbacks)).await {
        Ok((engine, sink)) => {
            let handle = launch(engine, sink)?;
            log::info!("Mounted shader backdrop");
            Ok(handle)
        }
        Err(err) => {
            log::warn!("Shader backdrop unavailable: {}", err);
            // No engine was built, so the failure is reported from here
            if let Some(f) = on_failure {
                call(&f, &JsValue::from_str(&err.to_string()));
            }
            Err(err.into())
        }
    }
}
