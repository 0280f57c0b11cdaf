// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! SVG export painter

use super::paint::{Color, Painter, Stroke, TextStyle};
use nalgebra::Point2;
use std::fmt::Write;

/// Renders painter calls into a standalone SVG document
#[derive(Debug, Default)]
pub struct SvgPainter {
    out: String,
    open: bool,
}

fn escape(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            c => escaped.push(c),
        }
    }
    escaped
}

fn points_attr(points: &[Point2<f64>]) -> String {
    let mut attr = String::with_capacity(points.len() * 16);
    for (i, p) in points.iter().enumerate() {
        if i > 0 {
            attr.push(' ');
        }
        let _ = write!(attr, "{:.2},{:.2}", p.x, p.y);
    }
    attr
}

fn opacity_attr(name: &str, color: Color) -> String {
    if color.a == 255 {
        String::new()
    } else {
        format!(" {name}=\"{:.3}\"", color.opacity())
    }
}

impl SvgPainter {
    pub fn new() -> Self {
        Self::default()
    }

    /// The finished document; closes it if `end` was not called
    pub fn finish(mut self) -> String {
        if self.open {
            self.out.push_str("</svg>\n");
        }
        self.out
    }
}

impl Painter for SvgPainter {
    fn begin(&mut self, width: f64, height: f64, background: Color) {
        self.out.clear();
        let _ = writeln!(
            self.out,
            "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{width:.0}\" height=\"{height:.0}\" viewBox=\"0 0 {width:.0} {height:.0}\">"
        );
        let _ = writeln!(
            self.out,
            "<rect width=\"100%\" height=\"100%\" fill=\"{}\"/>",
            background.hex()
        );
        self.open = true;
    }

    fn fill_polygon(&mut self, points: &[Point2<f64>], color: Color) {
        let _ = writeln!(
            self.out,
            "<polygon points=\"{}\" fill=\"{}\"{} stroke=\"none\"/>",
            points_attr(points),
            color.hex(),
            opacity_attr("fill-opacity", color)
        );
    }

    fn stroke_polygon(&mut self, points: &[Point2<f64>], stroke: Stroke) {
        let dash = if stroke.dashed {
            " stroke-dasharray=\"6 4\""
        } else {
            ""
        };
        let _ = writeln!(
            self.out,
            "<polygon points=\"{}\" fill=\"none\" stroke=\"{}\"{} stroke-width=\"{:.1}\"{dash}/>",
            points_attr(points),
            stroke.color.hex(),
            opacity_attr("stroke-opacity", stroke.color),
            stroke.width
        );
    }

    fn draw_text(&mut self, position: Point2<f64>, text: &str, style: &TextStyle) {
        let weight = if style.bold { " font-weight=\"bold\"" } else { "" };
        let _ = writeln!(
            self.out,
            "<text x=\"{:.2}\" y=\"{:.2}\" font-family=\"sans-serif\" font-size=\"{:.1}\" fill=\"{}\" text-anchor=\"middle\" dominant-baseline=\"middle\"{weight}>{}</text>",
            position.x,
            position.y,
            style.size,
            style.color.hex(),
            escape(text)
        );
    }

    fn end(&mut self) {
        if self.open {
            self.out.push_str("</svg>\n");
            self.open = false;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_structure() {
        let mut svg = SvgPainter::new();
        svg.begin(200.0, 100.0, Color::WHITE);
        svg.fill_polygon(
            &[Point2::new(0.0, 0.0), Point2::new(10.0, 0.0), Point2::new(10.0, 10.0)],
            Color::rgba(255, 0, 0, 128),
        );
        svg.stroke_polygon(
            &[Point2::new(0.0, 0.0), Point2::new(10.0, 0.0), Point2::new(10.0, 10.0)],
            Stroke {
                color: Color::BLACK,
                width: 1.0,
                dashed: true,
            },
        );
        svg.draw_text(
            Point2::new(5.0, 5.0),
            "Bad & <WC>",
            &TextStyle {
                color: Color::BLACK,
                size: 12.0,
                bold: true,
            },
        );
        svg.end();
        let doc = svg.finish();

        assert!(doc.starts_with("<svg "));
        assert!(doc.trim_end().ends_with("</svg>"));
        assert!(doc.contains("points=\"0.00,0.00 10.00,0.00 10.00,10.00\""));
        assert!(doc.contains("fill=\"#ff0000\" fill-opacity=\"0.502\""));
        assert!(doc.contains("stroke-dasharray"));
        assert!(doc.contains("Bad &amp; &lt;WC&gt;"));
        assert_eq!(doc.matches("</svg>").count(), 1);
    }

    #[test]
    fn test_finish_closes_open_document() {
        let mut svg = SvgPainter::new();
        svg.begin(10.0, 10.0, Color::WHITE);
        assert!(svg.finish().ends_with("</svg>\n"));
    }
}
