//! Browser host
//!
//! Owns every JS closure the engine's registrations need and forwards the
//! events they see into the engine through a `Sink`. The sink holds only a
//! weak reference, so closures still queued by the browser after the engine
//! is gone fall through silently.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::{Rc, Weak};

use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::{
    AddEventListenerOptions, Document, Event, EventTarget, HtmlCanvasElement, IntersectionObserver,
    IntersectionObserverEntry, KeyboardEvent, MouseEvent, TouchEvent, Window,
};

use super::EffectControl;
use crate::engine::input::InputEvent;
use crate::engine::lifecycle::{EventKind, Host, ListenTarget, Resource, ResourceKind, TimerKind};
use crate::engine::runner::HostEvent;
use crate::engine::viewport::LayoutSample;
use crate::error::EngineError;

/// Where host closures deliver their events
#[derive(Clone, Default)]
pub struct Sink(Rc<RefCell<Option<Weak<RefCell<dyn EffectControl>>>>>);

impl Sink {
    pub fn bind(&self, engine: Weak<RefCell<dyn EffectControl>>) {
        *self.0.borrow_mut() = Some(engine);
    }

    fn emit(&self, event: HostEvent) {
        let target = self.0.borrow().as_ref().and_then(Weak::upgrade);
        let Some(engine) = target else {
            log::debug!("No engine bound, dropping {:?}", event);
            return;
        };
        match engine.try_borrow_mut() {
            Ok(mut engine) => engine.handle(event),
            // Re-entered from a host callback
            Err(_) => log::debug!("Engine busy, dropping {:?}", event),
        }
    }
}

enum Registration {
    Listener {
        target: EventTarget,
        name: &'static str,
        callback: Closure<dyn FnMut(Event)>,
    },
    Observer {
        observer: IntersectionObserver,
        _callback: Closure<dyn FnMut(js_sys::Array)>,
    },
    Interval {
        handle: i32,
        _callback: Closure<dyn FnMut()>,
    },
    Frame {
        handle: i32,
    },
}

pub struct WebHost {
    window: Window,
    document: Document,
    canvas: HtmlCanvasElement,
    sink: Sink,
    /// One closure reused for every animation frame
    frame: Closure<dyn FnMut(f64)>,
    registrations: HashMap<u32, Registration>,
    next_id: u32,
}

impl WebHost {
    pub fn new(canvas: HtmlCanvasElement) -> Result<Self, EngineError> {
        let window = web_sys::window().ok_or_else(|| EngineError::SurfaceUnavailable("no window".into()))?;
        let document = window
            .document()
            .ok_or_else(|| EngineError::SurfaceUnavailable("no document".into()))?;

        let sink = Sink::default();
        let frame_sink = sink.clone();
        let frame = Closure::<dyn FnMut(f64)>::new(move |timestamp: f64| {
            frame_sink.emit(HostEvent::Frame(timestamp));
        });

        Ok(Self {
            window,
            document,
            canvas,
            sink,
            frame,
            registrations: HashMap::new(),
            next_id: 1,
        })
    }

    /// Handle to bind the engine once it has been built around this host
    pub fn sink(&self) -> Sink {
        self.sink.clone()
    }

    fn insert(&mut self, kind: ResourceKind, registration: Registration) -> Resource {
        let id = self.next_id;
        self.next_id += 1;
        self.registrations.insert(id, registration);
        Resource { id, kind }
    }

    fn event_target(&self, target: ListenTarget) -> EventTarget {
        match target {
            ListenTarget::Window => self.window.clone().into(),
            ListenTarget::Document => self.document.clone().into(),
            ListenTarget::Surface => self.canvas.clone().into(),
        }
    }
}

impl Host for WebHost {
    fn listen(&mut self, target: ListenTarget, kind: EventKind) -> Result<Resource, EngineError> {
        let sink = self.sink.clone();
        let canvas = self.canvas.clone();
        let window = self.window.clone();
        let callback = Closure::<dyn FnMut(Event)>::new(move |event: Event| {
            if let Some(host_event) = translate(kind, target, &event, &window, &canvas) {
                sink.emit(host_event);
            }
        });

        let event_target = self.event_target(target);
        let name = kind.dom_name();
        let options = AddEventListenerOptions::new();
        // Surface touches are claimed so the page does not scroll under a game
        let claims_touch = target == ListenTarget::Surface
            && matches!(kind, EventKind::TouchStart | EventKind::TouchMove);
        options.set_passive(!claims_touch);
        event_target.add_event_listener_with_callback_and_add_event_listener_options(
            name,
            callback.as_ref().unchecked_ref(),
            &options,
        )?;

        Ok(self.insert(
            ResourceKind::Listener,
            Registration::Listener {
                target: event_target,
                name,
                callback,
            },
        ))
    }

    fn observe_visibility(&mut self) -> Result<Resource, EngineError> {
        let sink = self.sink.clone();
        let callback = Closure::<dyn FnMut(js_sys::Array)>::new(move |entries: js_sys::Array| {
            let latest = entries
                .iter()
                .filter_map(|entry| entry.dyn_into::<IntersectionObserverEntry>().ok())
                .last();
            if let Some(entry) = latest {
                sink.emit(HostEvent::InView(entry.is_intersecting()));
            }
        });
        let observer = IntersectionObserver::new(callback.as_ref().unchecked_ref())?;
        observer.observe(&self.canvas);

        Ok(self.insert(
            ResourceKind::Observer,
            Registration::Observer {
                observer,
                _callback: callback,
            },
        ))
    }

    fn start_interval(&mut self, period_ms: u32, timer: TimerKind) -> Result<Resource, EngineError> {
        let sink = self.sink.clone();
        let callback = Closure::<dyn FnMut()>::new(move || sink.emit(HostEvent::Timer(timer)));
        let handle = self.window.set_interval_with_callback_and_timeout_and_arguments_0(
            callback.as_ref().unchecked_ref(),
            period_ms.min(i32::MAX as u32) as i32,
        )?;

        Ok(self.insert(
            ResourceKind::Interval,
            Registration::Interval {
                handle,
                _callback: callback,
            },
        ))
    }

    fn request_frame(&mut self) -> Result<Resource, EngineError> {
        let handle = self
            .window
            .request_animation_frame(self.frame.as_ref().unchecked_ref())?;
        Ok(self.insert(ResourceKind::Frame, Registration::Frame { handle }))
    }

    fn release(&mut self, resource: Resource) {
        let Some(registration) = self.registrations.remove(&resource.id) else {
            return;
        };
        match registration {
            Registration::Listener { target, name, callback } => {
                if let Err(err) = target.remove_event_listener_with_callback(name, callback.as_ref().unchecked_ref()) {
                    log::debug!("Removing {} listener failed: {:?}", name, err);
                }
            }
            Registration::Observer { observer, .. } => observer.disconnect(),
            Registration::Interval { handle, .. } => self.window.clear_interval_with_handle(handle),
            Registration::Frame { handle } => {
                // Already-fired handles are ignored by the browser
                let _ = self.window.cancel_animation_frame(handle);
            }
        }
    }

    fn layout(&self) -> Option<LayoutSample> {
        if !self.canvas.is_connected() {
            return None;
        }
        sample_layout(&self.window, &self.canvas)
    }

    fn surface_alive(&self) -> bool {
        self.canvas.is_connected()
    }

    fn document_hidden(&self) -> bool {
        self.document.hidden()
    }

    fn now_ms(&self) -> f64 {
        self.window
            .performance()
            .map(|p| p.now())
            .unwrap_or_else(js_sys::Date::now)
    }
}

impl Drop for WebHost {
    fn drop(&mut self) {
        let ids: Vec<(u32, ResourceKind)> = self
            .registrations
            .iter()
            .map(|(id, r)| {
                let kind = match r {
                    Registration::Listener { .. } => ResourceKind::Listener,
                    Registration::Observer { .. } => ResourceKind::Observer,
                    Registration::Interval { .. } => ResourceKind::Interval,
                    Registration::Frame { .. } => ResourceKind::Frame,
                };
                (*id, kind)
            })
            .collect();
        if !ids.is_empty() {
            log::warn!("Web host dropped with {} live registrations", ids.len());
        }
        for (id, kind) in ids {
            self.release(Resource { id, kind });
        }
    }
}

/// Canvas size in CSS pixels, falling back to the window before first layout
fn sample_layout(window: &Window, canvas: &HtmlCanvasElement) -> Option<LayoutSample> {
    let rect = canvas.get_bounding_client_rect();
    let (mut width, mut height) = (rect.width(), rect.height());
    if width <= 0.0 || height <= 0.0 {
        width = window.inner_width().ok()?.as_f64()?;
        height = window.inner_height().ok()?.as_f64()?;
    }
    Some(LayoutSample {
        width: width as f32,
        height: height as f32,
        visual_height: window.visual_viewport().map(|v| v.height() as f32),
        dpr: window.device_pixel_ratio() as f32,
    })
}

/// Client coordinates relative to the canvas origin
fn offset(canvas: &HtmlCanvasElement, client_x: i32, client_y: i32) -> (f32, f32) {
    let rect = canvas.get_bounding_client_rect();
    (
        (client_x as f64 - rect.left()) as f32,
        (client_y as f64 - rect.top()) as f32,
    )
}

fn mouse_offset(event: &Event, canvas: &HtmlCanvasElement) -> Option<(f32, f32)> {
    let mouse = event.dyn_ref::<MouseEvent>()?;
    Some(offset(canvas, mouse.client_x(), mouse.client_y()))
}

fn touch_offset(event: &Event, canvas: &HtmlCanvasElement) -> Option<(f32, f32)> {
    let touch = event.dyn_ref::<TouchEvent>()?.touches().get(0)?;
    Some(offset(canvas, touch.client_x(), touch.client_y()))
}

fn translate(
    kind: EventKind,
    target: ListenTarget,
    event: &Event,
    window: &Window,
    canvas: &HtmlCanvasElement,
) -> Option<HostEvent> {
    let input = match kind {
        EventKind::Resize => return sample_layout(window, canvas).map(HostEvent::Resize),
        EventKind::VisibilityChange => {
            let hidden = window.document().is_some_and(|d| d.hidden());
            return Some(HostEvent::Visibility { hidden });
        }
        EventKind::PointerMove => {
            let (x, y) = mouse_offset(event, canvas)?;
            InputEvent::PointerMove { x, y }
        }
        EventKind::PointerDown => {
            let (x, y) = mouse_offset(event, canvas)?;
            InputEvent::PointerDown { x, y }
        }
        EventKind::Click => {
            let (x, y) = mouse_offset(event, canvas)?;
            InputEvent::Click { x, y }
        }
        EventKind::PointerUp => InputEvent::PointerUp,
        EventKind::PointerLeave => {
            // mouseout also fires between child elements; only leaving the page counts
            if event.dyn_ref::<MouseEvent>()?.related_target().is_some() {
                return None;
            }
            InputEvent::PointerLeave
        }
        EventKind::TouchStart | EventKind::TouchMove => {
            if target == ListenTarget::Surface {
                event.prevent_default();
            }
            let (x, y) = touch_offset(event, canvas)?;
            if kind == EventKind::TouchStart {
                InputEvent::TouchStart { x, y }
            } else {
                InputEvent::TouchMove { x, y }
            }
        }
        EventKind::TouchEnd => InputEvent::TouchEnd,
        EventKind::KeyDown => InputEvent::KeyDown(event.dyn_ref::<KeyboardEvent>()?.key()),
        EventKind::KeyUp => InputEvent::KeyUp(event.dyn_ref::<KeyboardEvent>()?.key()),
    };
    Some(HostEvent::Input(input))
}
