//! Digital rain
//!
//! Falling glyph columns over a translucent black fade. Runs at a low tick
//! rate and a reduced resolution; a column past the bottom edge restarts
//! at the top with a small chance per tick, which staggers the columns.

use glam::Vec2;
use rand::Rng;
use rand_pcg::Pcg32;

use super::scene_rng;
use crate::engine::runner::{Simulation, UpdateContext};
use crate::engine::store::EntityStore;
use crate::engine::viewport::ViewportMetrics;
use crate::renderer::{ClearPolicy, Color, Draw2d, Painter, palette};
use crate::settings::EngineConfig;

/// Rain parameters. The probabilities were tuned by eye.
#[derive(Debug, Clone, PartialEq)]
pub struct RainTuning {
    pub glyphs: Vec<char>,
    /// Cell size in CSS pixels before resolution scaling
    pub font_px: f32,
    pub fps: f32,
    pub resolution_scale: f32,
    pub fade_alpha: f32,
    /// Chance per tick that a column past the bottom restarts
    pub reset_chance: f32,
    pub white_chance: f32,
    pub cyan_chance: f32,
}

impl Default for RainTuning {
    fn default() -> Self {
        Self {
            glyphs: "01XYZEUK".chars().collect(),
            font_px: 14.0,
            fps: 12.0,
            resolution_scale: 0.8,
            fade_alpha: 0.06,
            reset_chance: 0.025,
            white_chance: 0.02,
            cyan_chance: 0.1,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RainColumn {
    /// Row the next glyph lands on
    pub row: u32,
    /// Glyph, color and row of the most recent tick
    pub glyph: char,
    pub color: Color,
    pub drawn_row: u32,
}

pub struct DigitalRain {
    tuning: RainTuning,
    rng: Pcg32,
    cell: f32,
    height: f32,
    columns: EntityStore<RainColumn>,
}

impl DigitalRain {
    pub fn new(config: &EngineConfig) -> Self {
        Self::with_tuning(config, RainTuning::default())
    }

    pub fn with_tuning(config: &EngineConfig, tuning: RainTuning) -> Self {
        Self {
            rng: scene_rng(config),
            tuning,
            cell: 1.0,
            height: 0.0,
            columns: EntityStore::new(),
        }
    }

    /// Cell size in surface units
    pub fn cell(&self) -> f32 {
        self.cell
    }

    pub fn columns(&self) -> &EntityStore<RainColumn> {
        &self.columns
    }

    pub fn columns_mut(&mut self) -> &mut EntityStore<RainColumn> {
        &mut self.columns
    }

    fn rebuild(&mut self, metrics: &ViewportMetrics) {
        self.cell = (self.tuning.font_px * metrics.scale).floor().max(1.0);
        self.height = metrics.height();
        let count = (metrics.width() / self.cell).floor() as usize;
        let rows = self.height / self.cell;

        self.columns.clear();
        let rng = &mut self.rng;
        let first = self.tuning.glyphs.first().copied().unwrap_or('0');
        self.columns.extend((0..count).map(|_| RainColumn {
            row: (rng.random::<f32>() * rows).floor() as u32,
            glyph: first,
            color: palette::FUCHSIA,
            drawn_row: 0,
        }));
        log::debug!("Rain rebuilt: {} columns, cell {}", count, self.cell);
    }

    fn pick_color(rng: &mut Pcg32, tuning: &RainTuning) -> Color {
        // Two independent rolls
        if rng.random::<f32>() < tuning.white_chance {
            palette::WHITE
        } else if rng.random::<f32>() < tuning.cyan_chance {
            palette::CYAN
        } else {
            palette::FUCHSIA
        }
    }
}

impl Simulation for DigitalRain {
    fn target_fps(&self) -> f32 {
        self.tuning.fps
    }

    fn resolution_scale(&self) -> f32 {
        self.tuning.resolution_scale
    }

    fn reset(&mut self, metrics: &ViewportMetrics) {
        self.rebuild(metrics);
    }

    fn resize(&mut self, metrics: &ViewportMetrics) {
        self.rebuild(metrics);
    }

    fn update(&mut self, _ctx: &mut UpdateContext<'_>) {
        let Self {
            tuning,
            rng,
            cell,
            height,
            columns,
        } = self;

        columns.update_retain(|column| {
            if !tuning.glyphs.is_empty() {
                column.glyph = tuning.glyphs[rng.random_range(0..tuning.glyphs.len())];
            }
            column.color = Self::pick_color(rng, tuning);
            column.drawn_row = column.row;

            if column.row as f32 * *cell > *height && rng.random::<f32>() < tuning.reset_chance {
                column.row = 0;
            }
            column.row += 1;
            true
        });
    }
}

impl Draw2d for DigitalRain {
    fn clear_policy(&self) -> ClearPolicy {
        ClearPolicy::Fade(Color::rgba(0, 0, 0, self.tuning.fade_alpha))
    }

    fn draw(&self, painter: &mut dyn Painter, _metrics: &ViewportMetrics, _time_ms: f64) {
        let mut buf = [0u8; 4];
        for (i, column) in self.columns.iter().enumerate() {
            let pos = Vec2::new(i as f32 * self.cell, column.drawn_row as f32 * self.cell);
            painter.fill_text(column.glyph.encode_utf8(&mut buf), pos, self.cell, column.color);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::input::InputSnapshot;
    use crate::renderer::RecordingPainter;

    fn metrics() -> ViewportMetrics {
        // 0.8 scale: 800x400 surface, 11-unit cells
        ViewportMetrics {
            css_width: 1000.0,
            css_height: 500.0,
            dpr: 1.0,
            scale: 0.8,
        }
    }

    fn tick(rain: &mut DigitalRain) {
        let input = InputSnapshot::default();
        let m = metrics();
        let mut ctx = UpdateContext {
            dt: 1.0 / 12.0,
            now_ms: 0.0,
            input: &input,
            metrics: &m,
        };
        rain.update(&mut ctx);
    }

    fn rain(seed: u64) -> DigitalRain {
        let config = EngineConfig {
            seed: Some(seed),
            ..Default::default()
        };
        let mut rain = DigitalRain::new(&config);
        rain.reset(&metrics());
        rain
    }

    #[test]
    fn test_columns_fill_the_width() {
        let rain = rain(1);
        assert_eq!(rain.cell(), 11.0);
        assert_eq!(rain.columns().len(), 800 / 11);
        let max_row = (400.0f32 / 11.0).ceil() as u32;
        assert!(rain.columns().iter().all(|c| c.row < max_row));
    }

    #[test]
    fn test_column_past_bottom_respawns_at_top() {
        let mut rain = rain(9);
        let bottom = (400.0 / rain.cell()) as u32 + 5;
        for column in rain.columns_mut().iter_mut() {
            column.row = bottom;
        }

        // Each tick a column below the edge resets with probability 0.025,
        // so 400 ticks leave a survivor with probability ~4e-5 per column
        let mut reset = vec![false; rain.columns().len()];
        for _ in 0..400 {
            tick(&mut rain);
            for (i, column) in rain.columns().iter().enumerate() {
                if column.row == 1 {
                    reset[i] = true;
                }
            }
        }
        let resets = reset.iter().filter(|r| **r).count();
        assert!(resets as f32 >= reset.len() as f32 * 0.95, "{resets}/{}", reset.len());
    }

    #[test]
    fn test_columns_above_bottom_never_reset() {
        let mut rain = rain(3);
        for column in rain.columns_mut().iter_mut() {
            column.row = 0;
        }
        for _ in 0..20 {
            tick(&mut rain);
        }
        assert!(rain.columns().iter().all(|c| c.row == 20));
    }

    #[test]
    fn test_draws_one_glyph_per_column_from_the_set() {
        let mut rain = rain(5);
        tick(&mut rain);
        let mut painter = RecordingPainter::new();
        rain.draw(&mut painter, &metrics(), 0.0);
        let texts = painter.texts();
        assert_eq!(texts.len(), rain.columns().len());
        assert!(texts.iter().all(|t| "01XYZEUK".contains(*t)));
    }

    #[test]
    fn test_color_mix() {
        let mut rain = rain(11);
        let (mut white, mut cyan, mut other) = (0, 0, 0);
        for _ in 0..50 {
            tick(&mut rain);
            for column in rain.columns().iter() {
                match column.color {
                    c if c == palette::WHITE => white += 1,
                    c if c == palette::CYAN => cyan += 1,
                    _ => other += 1,
                }
            }
        }
        let total = (white + cyan + other) as f32;
        assert!((white as f32 / total) < 0.05);
        assert!((cyan as f32 / total) > 0.05 && (cyan as f32 / total) < 0.15);
        assert!(other > cyan);
    }
}
