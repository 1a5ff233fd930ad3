//! Border frame
//!
//! A 2 px neon line around the viewport with corner brackets. The line is a
//! loop of lattice nodes sprung to their anchors; the pointer pushes nearby
//! nodes away and they ripple back when it leaves. The gradient flows
//! along every edge with a 3 s period.

use std::f32::consts::FRAC_PI_2;

use glam::{Mat2, Vec2};

use crate::engine::lifecycle::{EventKind, ListenTarget};
use crate::engine::physics::{Spring, StepCarry};
use crate::engine::runner::{Simulation, UpdateContext};
use crate::engine::store::EntityStore;
use crate::engine::viewport::ViewportMetrics;
use crate::renderer::{Color, Draw2d, Paint, Painter, palette};
use crate::settings::EngineConfig;

const LISTENERS: &[(ListenTarget, EventKind)] = &[
    (ListenTarget::Window, EventKind::PointerMove),
    (ListenTarget::Window, EventKind::PointerLeave),
    (ListenTarget::Window, EventKind::TouchMove),
    (ListenTarget::Window, EventKind::TouchEnd),
];

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BorderTuning {
    pub spacing: f32,
    pub mobile_spacing: f32,
    /// Pointer influence radius
    pub reach: f32,
    /// Largest displacement at the pointer
    pub push: f32,
    pub line_width: f32,
    pub bracket: f32,
    pub flow_period_ms: f64,
}

impl Default for BorderTuning {
    fn default() -> Self {
        Self {
            spacing: 40.0,
            mobile_spacing: 60.0,
            reach: 120.0,
            push: 24.0,
            line_width: 2.0,
            bracket: 40.0,
            flow_period_ms: 3000.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LatticeNode {
    pub anchor: Vec2,
    pub pos: Vec2,
    pub vel: Vec2,
}

impl LatticeNode {
    fn at(anchor: Vec2) -> Self {
        Self {
            anchor,
            pos: anchor,
            vel: Vec2::ZERO,
        }
    }

    pub fn displacement(&self) -> f32 {
        self.pos.distance(self.anchor)
    }
}

pub struct BorderFrame {
    tuning: BorderTuning,
    spring: Spring,
    steps: StepCarry,
    spacing: f32,
    reactive: bool,
    size: Vec2,
    nodes: EntityStore<LatticeNode>,
    /// First node index of each edge (top, right, bottom, left)
    edges: [usize; 4],
}

impl BorderFrame {
    pub fn new(config: &EngineConfig) -> Self {
        Self::with_tuning(config, BorderTuning::default())
    }

    pub fn with_tuning(config: &EngineConfig, tuning: BorderTuning) -> Self {
        let spacing = if config.mobile_optimized {
            tuning.mobile_spacing
        } else {
            tuning.spacing
        };
        Self {
            tuning,
            spring: Spring::default(),
            steps: StepCarry::default(),
            spacing: spacing.max(1.0),
            reactive: config.pointer_response(),
            size: Vec2::ZERO,
            nodes: EntityStore::new(),
            edges: [0; 4],
        }
    }

    pub fn nodes(&self) -> &EntityStore<LatticeNode> {
        &self.nodes
    }

    /// Every node back at its anchor
    pub fn is_settled(&self) -> bool {
        self.nodes.iter().all(|n| n.displacement() < 0.01 && n.vel.length() < 0.01)
    }

    fn rebuild(&mut self, metrics: &ViewportMetrics) {
        self.size = metrics.size();
        self.steps.reset();
        self.nodes.clear();
        let inset = self.tuning.line_width * 0.5;
        let (w, h) = (self.size.x - inset, self.size.y - inset);
        let corners = [
            Vec2::new(inset, inset),
            Vec2::new(w, inset),
            Vec2::new(w, h),
            Vec2::new(inset, h),
        ];
        for (edge, start) in corners.iter().enumerate() {
            let end = corners[(edge + 1) % 4];
            self.edges[edge] = self.nodes.len();
            let segments = ((end - *start).length() / self.spacing).round().max(1.0) as usize;
            for i in 0..segments {
                let t = i as f32 / segments as f32;
                self.nodes.spawn(LatticeNode::at(start.lerp(end, t)));
            }
        }
        log::debug!("Border lattice rebuilt: {} nodes", self.nodes.len());
    }

    /// Points of one edge, ending on the next edge's first node
    fn edge_points(&self, edge: usize) -> Vec<Vec2> {
        let nodes = self.nodes.as_slice();
        if nodes.is_empty() {
            return Vec::new();
        }
        let start = self.edges[edge];
        let end = if edge == 3 { nodes.len() } else { self.edges[edge + 1] };
        let mut points: Vec<Vec2> = nodes[start..end].iter().map(|n| n.pos).collect();
        points.push(nodes[end % nodes.len()].pos);
        points
    }

    fn draw_edges(&self, painter: &mut dyn Painter, time_ms: f64) {
        let period = self.tuning.flow_period_ms.max(1.0);
        let phase = (time_ms % period / period) as f32;
        let stops = vec![
            (0.0, palette::CYAN),
            (1.0 / 6.0, palette::PURPLE),
            (2.0 / 6.0, palette::PINK),
            (0.5, palette::CYAN),
            (4.0 / 6.0, palette::PURPLE),
            (5.0 / 6.0, palette::PINK),
            (1.0, palette::CYAN),
        ];
        let glows = [palette::CYAN, palette::PINK, palette::PINK, palette::CYAN];

        painter.set_alpha(0.9);
        for (edge, glow) in glows.iter().enumerate() {
            let points = self.edge_points(edge);
            let (Some(first), Some(last)) = (points.first(), points.last()) else {
                continue;
            };
            // Gradient twice the edge length sliding one length per period
            let span = *last - *first;
            let from = *first - span * phase;
            painter.set_glow(10.0, glow.with_alpha(0.6));
            painter.stroke_path(
                &points,
                self.tuning.line_width,
                &Paint::Linear {
                    from,
                    to: from + span * 2.0,
                    stops: stops.clone(),
                },
            );
        }
        painter.set_glow(0.0, Color::TRANSPARENT);
        painter.set_alpha(1.0);
    }

    fn draw_brackets(&self, painter: &mut dyn Painter) {
        let b = self.tuning.bracket;
        let (w, h) = (self.size.x, self.size.y);
        let corners = [
            (Vec2::ZERO, 0.0, palette::CYAN),
            (Vec2::new(w - b, 0.0), FRAC_PI_2, palette::PURPLE),
            (Vec2::new(w - b, h - b), 2.0 * FRAC_PI_2, palette::PINK),
            (Vec2::new(0.0, h - b), 3.0 * FRAC_PI_2, palette::CYAN),
        ];
        // Authored in a 40x40 box, rotated about its center
        let unit = b / 40.0;
        let center = Vec2::splat(20.0);
        for (origin, angle, accent) in corners {
            let rot = Mat2::from_angle(angle);
            let place = |x: f32, y: f32| origin + (rot * (Vec2::new(x, y) - center) + center) * unit;

            painter.set_glow(12.0, accent);
            let white: Paint = palette::WHITE.with_alpha(0.9).into();
            painter.stroke_line(place(0.0, 2.0), place(20.0, 2.0), 2.5, &white);
            painter.stroke_line(place(2.0, 0.0), place(2.0, 20.0), 2.5, &white);
            let tint: Paint = accent.with_alpha(0.8).into();
            painter.stroke_line(place(12.0, 6.0), place(24.0, 6.0), 2.0, &tint);
            painter.stroke_line(place(6.0, 12.0), place(6.0, 24.0), 2.0, &tint);
        }
        painter.set_glow(0.0, Color::TRANSPARENT);
    }
}

impl Simulation for BorderFrame {
    fn target_fps(&self) -> f32 {
        0.0
    }

    fn listeners(&self) -> &'static [(ListenTarget, EventKind)] {
        if self.reactive { LISTENERS } else { &[] }
    }

    fn reset(&mut self, metrics: &ViewportMetrics) {
        self.rebuild(metrics);
    }

    fn resize(&mut self, metrics: &ViewportMetrics) {
        self.rebuild(metrics);
    }

    fn update(&mut self, ctx: &mut UpdateContext<'_>) {
        let pointer = if self.reactive { ctx.input.pointer() } else { None };
        let BorderTuning { reach, push, .. } = self.tuning;
        let spring = self.spring;
        let steps = self.steps.take(ctx.dt);

        self.nodes.update_retain(|node| {
            let mut target = node.anchor;
            if let Some(p) = pointer {
                let away = node.anchor - p;
                let dist = away.length();
                if dist < reach {
                    target += away.normalize_or_zero() * push * (1.0 - dist / reach);
                }
            }
            spring.advance(&mut node.pos, &mut node.vel, target, steps);
            true
        });
    }
}

impl Draw2d for BorderFrame {
    fn draw(&self, painter: &mut dyn Painter, _metrics: &ViewportMetrics, time_ms: f64) {
        // Soft inner vignette
        painter.stroke_polygon(
            &[
                Vec2::ZERO,
                Vec2::new(self.size.x, 0.0),
                self.size,
                Vec2::new(0.0, self.size.y),
            ],
            80.0,
            palette::PURPLE.with_alpha(0.04),
        );
        self.draw_edges(painter, time_ms);
        self.draw_brackets(painter);
    }
}
