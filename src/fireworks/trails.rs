//! Retained trail layer: the [`Surface`] the fireworks are drawn onto.
//!
//! Every `stroke_line` / `fill_circle` call records a [`Mark`].  `fade`
//! scales the alpha of every recorded mark toward transparent and drops the
//! ones that fall below [`MARK_ALPHA_CUTOFF`], which is what a translucent
//! clear does to straight-alpha content.  The layer never touches pixels: the
//! overlay systems mirror its marks onto pooled `Mesh2d` entities and Bevy's
//! 2D pipeline draws them.
//!
//! Marks are kept oldest first.  Once the layer holds `budget` marks the
//! oldest (and therefore faintest) are evicted to make room.

use std::collections::vec_deque::{self, VecDeque};

use bevy::math::Vec2;

use super::render::Surface;
use crate::constants::{MARK_ALPHA_CUTOFF, TRAIL_MARK_BUDGET};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MarkShape {
    /// Straight stroke of `width` px between two surface points.
    Line { from: Vec2, to: Vec2, width: f32 },
    /// Filled disc.
    Circle { center: Vec2, radius: f32 },
}

/// One drawing call, still visible.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Mark {
    pub shape: MarkShape,
    /// sRGB colour.
    pub color: [u8; 3],
    /// Straight alpha in `(MARK_ALPHA_CUTOFF, 1]`.
    pub alpha: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TrailLayer {
    size: Vec2,
    marks: VecDeque<Mark>,
    budget: usize,
}

impl TrailLayer {
    /// An empty layer covering `size` surface pixels.
    pub fn new(size: Vec2) -> Self {
        Self {
            size: size.max(Vec2::ZERO),
            marks: VecDeque::new(),
            budget: TRAIL_MARK_BUDGET,
        }
    }

    /// Marks from oldest to newest.
    pub fn marks(&self) -> vec_deque::Iter<'_, Mark> {
        self.marks.iter()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.marks.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.marks.is_empty()
    }

    pub fn budget(&self) -> usize {
        self.budget
    }

    /// Change the mark budget, evicting the oldest marks above it.
    pub fn set_budget(&mut self, budget: usize) {
        self.budget = budget;
        while self.marks.len() > budget {
            self.marks.pop_front();
        }
    }

    /// Resize the surface.  Drawn content is discarded.
    pub fn resize(&mut self, size: Vec2) {
        self.size = size.max(Vec2::ZERO);
        self.marks.clear();
    }

    fn push(&mut self, shape: MarkShape, color: [u8; 3], alpha: f32) {
        if self.budget == 0 || alpha.is_nan() || alpha < MARK_ALPHA_CUTOFF {
            return;
        }
        while self.marks.len() >= self.budget {
            self.marks.pop_front();
        }
        self.marks.push_back(Mark {
            shape,
            color,
            alpha: alpha.min(1.0),
        });
    }
}

impl Surface for TrailLayer {
    fn size(&self) -> Vec2 {
        self.size
    }

    fn fade(&mut self, alpha: f32) {
        let keep = 1.0 - alpha.clamp(0.0, 1.0);
        for mark in self.marks.iter_mut() {
            mark.alpha *= keep;
        }
        self.marks.retain(|mark| mark.alpha >= MARK_ALPHA_CUTOFF);
    }

    fn stroke_line(&mut self, from: Vec2, to: Vec2, color: [u8; 3], width: f32, alpha: f32) {
        if width > 0.0 {
            self.push(MarkShape::Line { from, to, width }, color, alpha);
        }
    }

    fn fill_circle(&mut self, center: Vec2, radius: f32, color: [u8; 3], alpha: f32) {
        if radius > 0.0 {
            self.push(MarkShape::Circle { center, radius }, color, alpha);
        }
    }
}
