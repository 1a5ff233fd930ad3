//! Painter that records draw calls instead of rasterizing
//!
//! Used by the native smoke runner and by scene tests to assert what a frame
//! would have drawn.

use glam::Vec2;

use super::{Color, Paint, Painter};
use crate::engine::viewport::ViewportMetrics;
use crate::error::EngineError;

#[derive(Debug, Clone, PartialEq)]
pub enum DrawCall {
    Resize { width: u32, height: u32 },
    Clear,
    FillRect { origin: Vec2, size: Vec2, paint: Paint },
    FillCircle { center: Vec2, radius: f32, paint: Paint },
    StrokeCircle { center: Vec2, radius: f32, width: f32, color: Color },
    FillPolygon { points: Vec<Vec2>, paint: Paint },
    StrokePolygon { points: Vec<Vec2>, width: f32, color: Color },
    StrokePath { points: Vec<Vec2>, width: f32, paint: Paint },
    Text { text: String, pos: Vec2, font_px: f32, color: Color },
    Glow { blur: f32, color: Color },
    Alpha(f32),
}

impl DrawCall {
    /// Calls that put pixels on the surface
    pub fn is_shape(&self) -> bool {
        !matches!(
            self,
            DrawCall::Resize { .. } | DrawCall::Clear | DrawCall::Glow { .. } | DrawCall::Alpha(_)
        )
    }
}

#[derive(Debug, Default)]
pub struct RecordingPainter {
    calls: Vec<DrawCall>,
    dead: bool,
}

impl RecordingPainter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> &[DrawCall] {
        &self.calls
    }

    /// Drop the log (call between frames to inspect one frame at a time)
    pub fn take_calls(&mut self) -> Vec<DrawCall> {
        std::mem::take(&mut self.calls)
    }

    /// Number of calls that draw something
    pub fn shape_count(&self) -> usize {
        self.calls.iter().filter(|c| c.is_shape()).count()
    }

    /// Text drawn so far, in order
    pub fn texts(&self) -> Vec<&str> {
        self.calls
            .iter()
            .filter_map(|c| match c {
                DrawCall::Text { text, .. } => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }

    /// Simulate the surface going away
    pub fn kill(&mut self) {
        self.dead = true;
    }
}

impl Painter for RecordingPainter {
    fn resize(&mut self, metrics: &ViewportMetrics) -> Result<(), EngineError> {
        let (width, height) = metrics.backing_size();
        self.calls.push(DrawCall::Resize { width, height });
        Ok(())
    }

    fn is_alive(&self) -> bool {
        !self.dead
    }

    fn clear(&mut self) {
        self.calls.push(DrawCall::Clear);
    }

    fn fill_rect(&mut self, origin: Vec2, size: Vec2, paint: &Paint) {
        self.calls.push(DrawCall::FillRect {
            origin,
            size,
            paint: paint.clone(),
        });
    }

    fn fill_circle(&mut self, center: Vec2, radius: f32, paint: &Paint) {
        self.calls.push(DrawCall::FillCircle {
            center,
            radius,
            paint: paint.clone(),
        });
    }

    fn stroke_circle(&mut self, center: Vec2, radius: f32, width: f32, color: Color) {
        self.calls.push(DrawCall::StrokeCircle {
            center,
            radius,
            width,
            color,
        });
    }

    fn fill_polygon(&mut self, points: &[Vec2], paint: &Paint) {
        self.calls.push(DrawCall::FillPolygon {
            points: points.to_vec(),
            paint: paint.clone(),
        });
    }

    fn stroke_polygon(&mut self, points: &[Vec2], width: f32, color: Color) {
        self.calls.push(DrawCall::StrokePolygon {
            points: points.to_vec(),
            width,
            color,
        });
    }

    fn stroke_path(&mut self, points: &[Vec2], width: f32, paint: &Paint) {
        self.calls.push(DrawCall::StrokePath {
            points: points.to_vec(),
            width,
            paint: paint.clone(),
        });
    }

    fn fill_text(&mut self, text: &str, pos: Vec2, font_px: f32, color: Color) {
        self.calls.push(DrawCall::Text {
            text: text.to_string(),
            pos,
            font_px,
            color,
        });
    }

    fn set_glow(&mut self, blur: f32, color: Color) {
        self.calls.push(DrawCall::Glow { blur, color });
    }

    fn set_alpha(&mut self, alpha: f32) {
        self.calls.push(DrawCall::Alpha(alpha));
    }
}
