//! Canvas 2D painter
//!
//! Draws in surface units; the base transform maps them to backing pixels
//! so scenes never see the device pixel ratio.

use std::f64::consts::TAU;

use glam::Vec2;
use wasm_bindgen::JsCast;
use web_sys::{CanvasGradient, CanvasRenderingContext2d, HtmlCanvasElement};

use crate::engine::viewport::ViewportMetrics;
use crate::error::EngineError;
use crate::renderer::{Color, Paint, Painter};

pub struct CanvasPainter {
    canvas: HtmlCanvasElement,
    ctx: CanvasRenderingContext2d,
    /// Surface size in surface units
    size: Vec2,
}

impl CanvasPainter {
    pub fn new(canvas: &HtmlCanvasElement) -> Result<Self, EngineError> {
        let ctx = canvas
            .get_context("2d")
            .map_err(|e| EngineError::SurfaceUnavailable(format!("{e:?}")))?
            .ok_or_else(|| EngineError::SurfaceUnavailable("2d context unavailable".into()))?
            .dyn_into::<CanvasRenderingContext2d>()
            .map_err(|_| EngineError::SurfaceUnavailable("not a 2d context".into()))?;
        Ok(Self {
            canvas: canvas.clone(),
            ctx,
            size: Vec2::ZERO,
        })
    }

    fn gradient(&self, paint: &Paint) -> Option<CanvasGradient> {
        let (gradient, stops) = match paint {
            Paint::Solid(_) => return None,
            Paint::Linear { from, to, stops } => (
                self.ctx
                    .create_linear_gradient(from.x as f64, from.y as f64, to.x as f64, to.y as f64),
                stops,
            ),
            Paint::Radial { center, radius, stops } => {
                let (x, y) = (center.x as f64, center.y as f64);
                let gradient = self
                    .ctx
                    .create_radial_gradient(x, y, 0.0, x, y, radius.max(0.0) as f64)
                    .ok()?;
                (gradient, stops)
            }
        };
        for (offset, color) in stops {
            if gradient.add_color_stop(offset.clamp(0.0, 1.0), &color.css()).is_err() {
                log::debug!("Bad gradient stop at {}", offset);
            }
        }
        Some(gradient)
    }

    fn set_fill(&self, paint: &Paint) {
        match (paint, self.gradient(paint)) {
            (_, Some(gradient)) => self.ctx.set_fill_style_canvas_gradient(&gradient),
            (Paint::Solid(color), None) => self.ctx.set_fill_style_str(&color.css()),
            (_, None) => self.ctx.set_fill_style_str(&Color::TRANSPARENT.css()),
        }
    }

    fn set_stroke(&self, paint: &Paint, width: f32) {
        match (paint, self.gradient(paint)) {
            (_, Some(gradient)) => self.ctx.set_stroke_style_canvas_gradient(&gradient),
            (Paint::Solid(color), None) => self.ctx.set_stroke_style_str(&color.css()),
            (_, None) => self.ctx.set_stroke_style_str(&Color::TRANSPARENT.css()),
        }
        self.ctx.set_line_width(width as f64);
    }

    fn trace(&self, points: &[Vec2], closed: bool) -> bool {
        let Some((first, rest)) = points.split_first() else {
            return false;
        };
        self.ctx.begin_path();
        self.ctx.move_to(first.x as f64, first.y as f64);
        for p in rest {
            self.ctx.line_to(p.x as f64, p.y as f64);
        }
        if closed {
            self.ctx.close_path();
        }
        true
    }

    fn circle(&self, center: Vec2, radius: f32) -> bool {
        self.ctx.begin_path();
        self.ctx
            .arc(center.x as f64, center.y as f64, radius.max(0.0) as f64, 0.0, TAU)
            .is_ok()
    }
}

impl Painter for CanvasPainter {
    fn resize(&mut self, metrics: &ViewportMetrics) -> Result<(), EngineError> {
        let (width, height) = metrics.backing_size();
        self.canvas.set_width(width);
        self.canvas.set_height(height);
        let dpr = metrics.dpr as f64;
        self.ctx.set_transform(dpr, 0.0, 0.0, dpr, 0.0, 0.0)?;
        self.ctx.set_line_cap("round");
        self.ctx.set_line_join("round");
        self.size = metrics.size();
        Ok(())
    }

    fn is_alive(&self) -> bool {
        self.canvas.is_connected()
    }

    fn clear(&mut self) {
        self.ctx
            .clear_rect(0.0, 0.0, self.size.x as f64, self.size.y as f64);
    }

    fn fill_rect(&mut self, origin: Vec2, size: Vec2, paint: &Paint) {
        self.set_fill(paint);
        self.ctx
            .fill_rect(origin.x as f64, origin.y as f64, size.x as f64, size.y as f64);
    }

    fn fill_circle(&mut self, center: Vec2, radius: f32, paint: &Paint) {
        if self.circle(center, radius) {
            self.set_fill(paint);
            self.ctx.fill();
        }
    }

    fn stroke_circle(&mut self, center: Vec2, radius: f32, width: f32, color: Color) {
        if self.circle(center, radius) {
            self.set_stroke(&color.into(), width);
            self.ctx.stroke();
        }
    }

    fn fill_polygon(&mut self, points: &[Vec2], paint: &Paint) {
        if self.trace(points, true) {
            self.set_fill(paint);
            self.ctx.fill();
        }
    }

    fn stroke_polygon(&mut self, points: &[Vec2], width: f32, color: Color) {
        if self.trace(points, true) {
            self.set_stroke(&color.into(), width);
            self.ctx.stroke();
        }
    }

    fn stroke_path(&mut self, points: &[Vec2], width: f32, paint: &Paint) {
        if self.trace(points, false) {
            self.set_stroke(paint, width);
            self.ctx.stroke();
        }
    }

    fn fill_text(&mut self, text: &str, pos: Vec2, font_px: f32, color: Color) {
        self.ctx.set_font(&format!("{}px monospace", font_px.max(1.0)));
        self.ctx.set_text_baseline("top");
        self.ctx.set_fill_style_str(&color.css());
        if self.ctx.fill_text(text, pos.x as f64, pos.y as f64).is_err() {
            log::debug!("fill_text failed");
        }
    }

    fn set_glow(&mut self, blur: f32, color: Color) {
        self.ctx.set_shadow_blur(blur.max(0.0) as f64);
        self.ctx.set_shadow_color(&color.css());
    }

    fn set_alpha(&mut self, alpha: f32) {
        self.ctx.set_global_alpha(alpha.clamp(0.0, 1.0) as f64);
    }
}
