//! Viewport surface
//!
//! Three coordinate spaces are in play:
//! - CSS pixels: what the host layout and DOM events report
//! - surface units: CSS pixels times the scene's resolution scale; all
//!   entity positions and input snapshots live here
//! - backing pixels: surface units times the device pixel ratio; only the
//!   painter's base transform sees these

use glam::Vec2;

use crate::consts::{MOBILE_HEIGHT_NOISE_PX, WIDTH_CHANGE_EPSILON_PX};

/// Raw layout numbers read from the host
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LayoutSample {
    pub width: f32,
    pub height: f32,
    /// Visual viewport height on touch devices (excludes browser chrome)
    pub visual_height: Option<f32>,
    pub dpr: f32,
}

impl LayoutSample {
    pub fn new(width: f32, height: f32, dpr: f32) -> Self {
        Self {
            width,
            height,
            visual_height: None,
            dpr,
        }
    }
}

/// Read-only sizing for one tick
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewportMetrics {
    pub css_width: f32,
    pub css_height: f32,
    pub dpr: f32,
    /// Resolution scale (1.0 = native CSS resolution)
    pub scale: f32,
}

impl Default for ViewportMetrics {
    fn default() -> Self {
        Self {
            css_width: 0.0,
            css_height: 0.0,
            dpr: 1.0,
            scale: 1.0,
        }
    }
}

impl ViewportMetrics {
    /// Surface width in simulation units
    pub fn width(&self) -> f32 {
        (self.css_width * self.scale).floor()
    }

    /// Surface height in simulation units
    pub fn height(&self) -> f32 {
        (self.css_height * self.scale).floor()
    }

    pub fn size(&self) -> Vec2 {
        Vec2::new(self.width(), self.height())
    }

    pub fn center(&self) -> Vec2 {
        self.size() * 0.5
    }

    /// Canvas backing store size in device pixels
    pub fn backing_size(&self) -> (u32, u32) {
        let w = (self.width() * self.dpr).round().max(1.0) as u32;
        let h = (self.height() * self.dpr).round().max(1.0) as u32;
        (w, h)
    }

    /// Map a CSS-pixel point (relative to the surface origin) into simulation units
    pub fn to_surface(&self, css: Vec2) -> Vec2 {
        css * self.scale
    }

    /// True when `p` lies within the surface grown by `margin` on every side
    pub fn contains_with_margin(&self, p: Vec2, margin: f32) -> bool {
        p.x > -margin && p.x < self.width() + margin && p.y > -margin && p.y < self.height() + margin
    }

    pub fn is_empty(&self) -> bool {
        self.width() < 1.0 || self.height() < 1.0
    }
}

/// Resize reconciliation
#[derive(Debug, Clone)]
pub struct Viewport {
    metrics: ViewportMetrics,
    mobile: bool,
    initialized: bool,
    /// Most recent unapplied sample (last write wins)
    pending: Option<LayoutSample>,
}

impl Viewport {
    pub fn new(scale: f32, mobile: bool) -> Self {
        Self {
            metrics: ViewportMetrics {
                scale,
                ..Default::default()
            },
            mobile,
            initialized: false,
            pending: None,
        }
    }

    pub fn metrics(&self) -> &ViewportMetrics {
        &self.metrics
    }

    pub fn has_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Queue a layout sample; applied on the next frame
    pub fn request(&mut self, sample: LayoutSample) {
        self.pending = Some(sample);
    }

    /// Apply the pending sample, if any. Returns true when metrics changed.
    pub fn apply_pending(&mut self) -> bool {
        match self.pending.take() {
            Some(sample) => self.resize(sample),
            None => false,
        }
    }

    /// Apply a sample immediately. Returns true when metrics changed.
    pub fn resize(&mut self, sample: LayoutSample) -> bool {
        let height = if self.mobile {
            sample.visual_height.unwrap_or(sample.height)
        } else {
            sample.height
        };

        let mut next = ViewportMetrics {
            css_width: sample.width.max(0.0),
            css_height: height.max(0.0),
            dpr: if sample.dpr > 0.0 { sample.dpr } else { 1.0 },
            scale: self.metrics.scale,
        };

        if self.initialized && self.mobile {
            let width_changed = (next.css_width - self.metrics.css_width).abs() >= WIDTH_CHANGE_EPSILON_PX;
            let height_delta = (next.css_height - self.metrics.css_height).abs();
            if !width_changed && height_delta < MOBILE_HEIGHT_NOISE_PX {
                // Address bar show/hide
                next.css_height = self.metrics.css_height;
            }
        }

        self.initialized = true;
        if next == self.metrics {
            return false;
        }
        log::debug!(
            "Viewport {}x{} css @ dpr {} -> surface {}x{}",
            next.css_width,
            next.css_height,
            next.dpr,
            next.width(),
            next.height()
        );
        self.metrics = next;
        true
    }
}
