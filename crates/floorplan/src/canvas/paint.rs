// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Drawing surface abstraction
//!
//! The canvas renders through [`Painter`] so it stays independent of any
//! GUI toolkit. A host adapts its own surface; [`DisplayList`] records the
//! calls for inspection.

use nalgebra::Point2;
use serde::Serialize;

/// 8-bit RGBA colour
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const BLACK: Color = Color::rgb(0, 0, 0);
    pub const WHITE: Color = Color::rgb(255, 255, 255);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// `#rrggbb`, alpha ignored
    pub fn hex(&self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }

    pub fn opacity(&self) -> f64 {
        f64::from(self.a) / 255.0
    }

    /// Blend towards white; `amount` in 0..=1
    pub fn lighter(&self, amount: f64) -> Self {
        let t = amount.clamp(0.0, 1.0);
        let mix = |c: u8| (f64::from(c) + (255.0 - f64::from(c)) * t).round() as u8;
        Self {
            r: mix(self.r),
            g: mix(self.g),
            b: mix(self.b),
            a: self.a,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct Stroke {
    pub color: Color,
    /// Pixels
    pub width: f64,
    pub dashed: bool,
}

impl Stroke {
    pub fn solid(color: Color, width: f64) -> Self {
        Self {
            color,
            width,
            dashed: false,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct TextStyle {
    pub color: Color,
    /// Pixels
    pub size: f64,
    pub bold: bool,
}

/// Target of [`FloorPlanCanvas::paint`](super::FloorPlanCanvas::paint)
///
/// Points are screen pixels. Text positions are the center of the line.
pub trait Painter {
    fn begin(&mut self, _width: f64, _height: f64, _background: Color) {}

    fn fill_polygon(&mut self, points: &[Point2<f64>], color: Color);

    fn stroke_polygon(&mut self, points: &[Point2<f64>], stroke: Stroke);

    fn draw_text(&mut self, position: Point2<f64>, text: &str, style: &TextStyle);

    fn end(&mut self) {}
}

#[derive(Clone, Debug, PartialEq)]
pub enum DrawCommand {
    Begin {
        width: f64,
        height: f64,
        background: Color,
    },
    Fill {
        points: Vec<Point2<f64>>,
        color: Color,
    },
    Stroke {
        points: Vec<Point2<f64>>,
        stroke: Stroke,
    },
    Text {
        position: Point2<f64>,
        text: String,
        style: TextStyle,
    },
    End,
}

/// Painter that records every call
#[derive(Clone, Debug, Default)]
pub struct DisplayList {
    pub commands: Vec<DrawCommand>,
}

impl DisplayList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fills(&self) -> impl Iterator<Item = (&[Point2<f64>], Color)> {
        self.commands.iter().filter_map(|c| match c {
            DrawCommand::Fill { points, color } => Some((points.as_slice(), *color)),
            _ => None,
        })
    }

    pub fn strokes(&self) -> impl Iterator<Item = (&[Point2<f64>], Stroke)> {
        self.commands.iter().filter_map(|c| match c {
            DrawCommand::Stroke { points, stroke } => Some((points.as_slice(), *stroke)),
            _ => None,
        })
    }

    pub fn texts(&self) -> impl Iterator<Item = &str> {
        self.commands.iter().filter_map(|c| match c {
            DrawCommand::Text { text, .. } => Some(text.as_str()),
            _ => None,
        })
    }
}

impl Painter for DisplayList {
    fn begin(&mut self, width: f64, height: f64, background: Color) {
        self.commands.clear();
        self.commands.push(DrawCommand::Begin {
            width,
            height,
            background,
        });
    }

    fn fill_polygon(&mut self, points: &[Point2<f64>], color: Color) {
        self.commands.push(DrawCommand::Fill {
            points: points.to_vec(),
            color,
        });
    }

    fn stroke_polygon(&mut self, points: &[Point2<f64>], stroke: Stroke) {
        self.commands.push(DrawCommand::Stroke {
            points: points.to_vec(),
            stroke,
        });
    }

    fn draw_text(&mut self, position: Point2<f64>, text: &str, style: &TextStyle) {
        self.commands.push(DrawCommand::Text {
            position,
            text: text.to_string(),
            style: style.clone(),
        });
    }

    fn end(&mut self) {
        self.commands.push(DrawCommand::End);
    }
}
