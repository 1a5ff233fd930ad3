//! Rendering module
//!
//! Two render strategies plug into the engine:
//! - `PaintedRender`: immediate-mode 2D drawing through the `Painter` seam,
//!   with a per-instance `ClearPolicy`
//! - `backdrop::BackdropRenderState`: a wgpu fullscreen pass over an opaque
//!   WGSL program

pub mod backdrop;
pub mod recording;

use glam::Vec2;

use crate::engine::runner::Render;
use crate::engine::viewport::ViewportMetrics;
use crate::error::EngineError;

pub use backdrop::BackdropRenderState;
pub use recording::{DrawCall, RecordingPainter};

/// Straight-alpha sRGB color
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: f32,
}

impl Color {
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 1.0 }
    }

    pub const fn rgba(r: u8, g: u8, b: u8, a: f32) -> Self {
        Self { r, g, b, a }
    }

    pub const TRANSPARENT: Color = Color::rgba(0, 0, 0, 0.0);

    /// Same color at a different opacity
    pub fn with_alpha(self, a: f32) -> Self {
        Self {
            a: a.clamp(0.0, 1.0),
            ..self
        }
    }

    /// hue in degrees, saturation/lightness in 0..=1
    pub fn hsla(hue: f32, saturation: f32, lightness: f32, alpha: f32) -> Self {
        let h = hue.rem_euclid(360.0) / 60.0;
        let c = (1.0 - (2.0 * lightness - 1.0).abs()) * saturation;
        let x = c * (1.0 - (h % 2.0 - 1.0).abs());
        let (r, g, b) = match h as u32 {
            0 => (c, x, 0.0),
            1 => (x, c, 0.0),
            2 => (0.0, c, x),
            3 => (0.0, x, c),
            4 => (x, 0.0, c),
            _ => (c, 0.0, x),
        };
        let m = lightness - c / 2.0;
        let channel = |v: f32| ((v + m).clamp(0.0, 1.0) * 255.0).round() as u8;
        Self::rgba(channel(r), channel(g), channel(b), alpha.clamp(0.0, 1.0))
    }

    /// CSS color string
    pub fn css(&self) -> String {
        if self.a >= 1.0 {
            format!("rgb({}, {}, {})", self.r, self.g, self.b)
        } else {
            format!("rgba({}, {}, {}, {:.3})", self.r, self.g, self.b, self.a.max(0.0))
        }
    }

    /// Component-wise blend, `t` clamped to 0..=1
    pub fn lerp(self, other: Color, t: f32) -> Self {
        let t = t.clamp(0.0, 1.0);
        let mix = |a: u8, b: u8| (a as f32 + (b as f32 - a as f32) * t).round() as u8;
        Self {
            r: mix(self.r, other.r),
            g: mix(self.g, other.g),
            b: mix(self.b, other.b),
            a: self.a + (other.a - self.a) * t,
        }
    }

    /// Linear RGBA for GPU clears
    pub fn to_array(&self) -> [f32; 4] {
        [
            self.r as f32 / 255.0,
            self.g as f32 / 255.0,
            self.b as f32 / 255.0,
            self.a,
        ]
    }
}

/// Brand palette
pub mod palette {
    use super::Color;

    pub const CYAN: Color = Color::rgb(6, 182, 212);
    pub const FUCHSIA: Color = Color::rgb(217, 70, 239);
    pub const PURPLE: Color = Color::rgb(168, 85, 247);
    pub const VIOLET: Color = Color::rgb(139, 92, 246);
    pub const PINK: Color = Color::rgb(236, 72, 153);
    pub const WHITE: Color = Color::rgb(255, 255, 255);
    pub const BLACK: Color = Color::rgb(0, 0, 0);
    /// Deep space backdrop (#030014)
    pub const SPACE: Color = Color::rgb(3, 0, 20);
    pub const LASER: Color = Color::rgb(0, 255, 255);
    pub const GOLD: Color = Color::rgb(255, 215, 0);
    pub const CORAL: Color = Color::rgb(255, 107, 107);
    pub const GREEN: Color = Color::rgb(34, 197, 94);
    pub const RED: Color = Color::rgb(255, 0, 0);
    pub const ROCK: Color = Color::rgb(90, 90, 122);
    pub const ROCK_DARK: Color = Color::rgb(74, 74, 90);
    pub const ROCK_EDGE: Color = Color::rgb(106, 106, 122);
    pub const ROCK_FAR: Color = Color::rgb(74, 74, 106);
}

/// Fill style
#[derive(Debug, Clone, PartialEq)]
pub enum Paint {
    Solid(Color),
    Linear {
        from: Vec2,
        to: Vec2,
        stops: Vec<(f32, Color)>,
    },
    Radial {
        center: Vec2,
        radius: f32,
        stops: Vec<(f32, Color)>,
    },
}

impl From<Color> for Paint {
    fn from(color: Color) -> Self {
        Paint::Solid(color)
    }
}

impl Paint {
    /// Two-stop linear gradient fading `color` out toward `to`
    pub fn streak(from: Vec2, to: Vec2, color: Color) -> Self {
        Paint::Linear {
            from,
            to,
            stops: vec![(0.0, color), (1.0, Color::TRANSPARENT)],
        }
    }

    /// Radial glow fading to transparent at `radius`
    pub fn glow(center: Vec2, radius: f32, stops: Vec<(f32, Color)>) -> Self {
        Paint::Radial { center, radius, stops }
    }
}

/// Immediate-mode 2D drawing in surface units
pub trait Painter {
    /// Size the backing store and base transform
    fn resize(&mut self, metrics: &ViewportMetrics) -> Result<(), EngineError>;

    /// False once the underlying context is gone
    fn is_alive(&self) -> bool {
        true
    }

    /// Transparent clear of the whole surface
    fn clear(&mut self);

    fn fill_rect(&mut self, origin: Vec2, size: Vec2, paint: &Paint);

    fn fill_circle(&mut self, center: Vec2, radius: f32, paint: &Paint);

    fn stroke_circle(&mut self, center: Vec2, radius: f32, width: f32, color: Color);

    /// Closed polygon
    fn fill_polygon(&mut self, points: &[Vec2], paint: &Paint);

    fn stroke_polygon(&mut self, points: &[Vec2], width: f32, color: Color);

    /// Open polyline
    fn stroke_path(&mut self, points: &[Vec2], width: f32, paint: &Paint);

    fn fill_text(&mut self, text: &str, pos: Vec2, font_px: f32, color: Color);

    /// Shadow glow for following draws; blur 0 turns it off
    fn set_glow(&mut self, blur: f32, color: Color);

    /// Global alpha for following draws
    fn set_alpha(&mut self, alpha: f32);

    fn stroke_line(&mut self, from: Vec2, to: Vec2, width: f32, paint: &Paint) {
        self.stroke_path(&[from, to], width, paint);
    }
}

/// How the previous frame is disposed of
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ClearPolicy {
    /// Transparent clear (crisp redraw over page content)
    Hard,
    /// Opaque fill
    Fill(Color),
    /// Translucent fill leaving motion trails
    Fade(Color),
}

/// Scenes drawable through a `Painter`
pub trait Draw2d {
    fn clear_policy(&self) -> ClearPolicy {
        ClearPolicy::Hard
    }

    fn draw(&self, painter: &mut dyn Painter, metrics: &ViewportMetrics, time_ms: f64);
}

/// `Render` strategy for `Draw2d` scenes
pub struct PaintedRender<P: Painter> {
    painter: P,
    clear: ClearPolicy,
}

impl<P: Painter> PaintedRender<P> {
    pub fn new(painter: P, clear: ClearPolicy) -> Self {
        Self { painter, clear }
    }

    /// Use the scene's preferred clear policy
    pub fn for_scene<S: Draw2d>(painter: P, scene: &S) -> Self {
        Self::new(painter, scene.clear_policy())
    }

    pub fn painter(&self) -> &P {
        &self.painter
    }

    pub fn painter_mut(&mut self) -> &mut P {
        &mut self.painter
    }

    pub fn clear_policy(&self) -> ClearPolicy {
        self.clear
    }

    fn apply_clear(&mut self, metrics: &ViewportMetrics) {
        match self.clear {
            ClearPolicy::Hard => self.painter.clear(),
            ClearPolicy::Fill(color) | ClearPolicy::Fade(color) => {
                self.painter.fill_rect(Vec2::ZERO, metrics.size(), &Paint::Solid(color));
            }
        }
    }
}

impl<S: Draw2d, P: Painter> Render<S> for PaintedRender<P> {
    fn resize(&mut self, metrics: &ViewportMetrics) -> Result<(), EngineError> {
        self.painter.resize(metrics)?;
        // Resizing wipes the canvas; trail effects restart from an opaque base
        if let ClearPolicy::Fade(color) = self.clear {
            self.painter
                .fill_rect(Vec2::ZERO, metrics.size(), &Paint::Solid(color.with_alpha(1.0)));
        }
        Ok(())
    }

    fn render(&mut self, sim: &S, metrics: &ViewportMetrics, time_ms: f64) -> Result<(), EngineError> {
        if !self.painter.is_alive() {
            return Err(EngineError::SurfaceLost);
        }
        self.apply_clear(metrics);
        sim.draw(&mut self.painter, metrics, time_ms);
        self.painter.set_alpha(1.0);
        self.painter.set_glow(0.0, Color::TRANSPARENT);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Dot;

    impl Draw2d for Dot {
        fn draw(&self, painter: &mut dyn Painter, _metrics: &ViewportMetrics, _time_ms: f64) {
            painter.fill_circle(Vec2::new(5.0, 5.0), 2.0, &palette::CYAN.into());
        }
    }

    fn metrics() -> ViewportMetrics {
        ViewportMetrics {
            css_width: 100.0,
            css_height: 50.0,
            dpr: 2.0,
            scale: 1.0,
        }
    }

    #[test]
    fn test_hsla_primaries() {
        assert_eq!(Color::hsla(0.0, 1.0, 0.5, 1.0), Color::rgb(255, 0, 0));
        assert_eq!(Color::hsla(120.0, 1.0, 0.5, 1.0), Color::rgb(0, 255, 0));
        assert_eq!(Color::hsla(240.0, 1.0, 0.5, 0.5), Color::rgba(0, 0, 255, 0.5));
        assert_eq!(Color::hsla(200.0, 0.0, 1.0, 1.0), palette::WHITE);
    }

    #[test]
    fn test_css_output() {
        assert_eq!(palette::CYAN.css(), "rgb(6, 182, 212)");
        assert_eq!(Color::rgba(0, 0, 0, 0.06).css(), "rgba(0, 0, 0, 0.060)");
    }

    #[test]
    fn test_clear_policy_runs_before_draw() {
        let mut render = PaintedRender::new(RecordingPainter::new(), ClearPolicy::Fade(Color::rgba(0, 0, 0, 0.06)));
        Render::<Dot>::render(&mut render, &Dot, &metrics(), 0.0).unwrap();
        let calls = render.painter().calls();
        assert!(matches!(
            &calls[0],
            DrawCall::FillRect { paint: Paint::Solid(c), .. } if c.a < 0.1
        ));
        assert!(matches!(calls[1], DrawCall::FillCircle { .. }));
    }

    #[test]
    fn test_hard_clear() {
        let mut render = PaintedRender::new(RecordingPainter::new(), ClearPolicy::Hard);
        Render::<Dot>::render(&mut render, &Dot, &metrics(), 0.0).unwrap();
        assert_eq!(render.painter().calls()[0], DrawCall::Clear);
    }

    #[test]
    fn test_fade_primes_opaque_on_resize() {
        let mut render = PaintedRender::new(RecordingPainter::new(), ClearPolicy::Fade(Color::rgba(0, 0, 0, 0.06)));
        Render::<Dot>::resize(&mut render, &metrics()).unwrap();
        let calls = render.painter().calls();
        assert!(matches!(&calls[0], DrawCall::Resize { width: 200, height: 100 }));
        assert!(matches!(
            &calls[1],
            DrawCall::FillRect { paint: Paint::Solid(c), .. } if c.a == 1.0
        ));
    }

    #[test]
    fn test_dead_painter_reports_surface_lost() {
        let mut painter = RecordingPainter::new();
        painter.kill();
        let mut render = PaintedRender::new(painter, ClearPolicy::Hard);
        let result = Render::<Dot>::render(&mut render, &Dot, &metrics(), 0.0);
        assert!(matches!(result, Err(EngineError::SurfaceLost)));
    }
}
