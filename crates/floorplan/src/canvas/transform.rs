// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Floor meters <-> screen pixels

use crate::geometry::Bounds;
use nalgebra::{Matrix3, Point2};

/// translate(pan) ∘ scale(zoom · pixels_per_meter), Y flipped so plan north
/// points up the screen
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ViewTransform {
    pub zoom: f64,
    /// Screen position of the floor origin
    pub pan: Point2<f64>,
    pub pixels_per_meter: f64,
}

impl ViewTransform {
    pub fn new(pixels_per_meter: f64) -> Self {
        Self {
            zoom: 1.0,
            pan: Point2::origin(),
            pixels_per_meter,
        }
    }

    /// Pixels per floor meter at the current zoom
    pub fn scale(&self) -> f64 {
        self.zoom * self.pixels_per_meter
    }

    /// Homogeneous matrix of the transform
    pub fn matrix(&self) -> Matrix3<f64> {
        let s = self.scale();
        #[rustfmt::skip]
        let m = Matrix3::new(
            s,   0.0, self.pan.x,
            0.0, -s,  self.pan.y,
            0.0, 0.0, 1.0,
        );
        m
    }

    pub fn floor_to_screen(&self, x: f64, y: f64) -> Point2<f64> {
        self.matrix().transform_point(&Point2::new(x, y))
    }

    pub fn screen_to_floor(&self, screen: &Point2<f64>) -> Point2<f64> {
        let s = self.scale();
        Point2::new((screen.x - self.pan.x) / s, -(screen.y - self.pan.y) / s)
    }

    /// Floor-space rectangle visible in a `width` x `height` viewport
    pub fn visible_floor_bounds(&self, width: f64, height: f64) -> Bounds {
        let a = self.screen_to_floor(&Point2::new(0.0, 0.0));
        let b = self.screen_to_floor(&Point2::new(width, height));
        Bounds::new(a.x, a.y, b.x, b.y)
    }

    /// Screen-space rectangle covered by floor bounds
    pub fn bounds_to_screen(&self, bounds: &Bounds) -> Bounds {
        let a = self.floor_to_screen(bounds.min_x, bounds.min_y);
        let b = self.floor_to_screen(bounds.max_x, bounds.max_y);
        Bounds::new(a.x, a.y, b.x, b.y)
    }

    /// Change zoom keeping the floor point under `cursor` fixed
    pub fn zoom_about(&mut self, cursor: &Point2<f64>, zoom: f64) {
        let anchor = self.screen_to_floor(cursor);
        self.zoom = zoom;
        let s = self.scale();
        self.pan = Point2::new(cursor.x - anchor.x * s, cursor.y + anchor.y * s);
    }

    /// Center `center` in the viewport at `zoom`
    pub fn center_on(&mut self, center_x: f64, center_y: f64, zoom: f64, width: f64, height: f64) {
        self.zoom = zoom;
        let s = self.scale();
        self.pan = Point2::new(width / 2.0 - center_x * s, height / 2.0 + center_y * s);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_round_trip_and_y_flip() {
        let mut view = ViewTransform::new(20.0);
        view.zoom = 2.0;
        view.pan = Point2::new(100.0, 300.0);

        let screen = view.floor_to_screen(5.0, 2.0);
        assert_relative_eq!(screen.x, 300.0);
        assert_relative_eq!(screen.y, 220.0);

        let back = view.screen_to_floor(&screen);
        assert_relative_eq!(back.x, 5.0);
        assert_relative_eq!(back.y, 2.0);

        let m = view.matrix() * nalgebra::Vector3::new(5.0, 2.0, 1.0);
        assert_relative_eq!(m.x, screen.x);
        assert_relative_eq!(m.y, screen.y);
    }

    #[test]
    fn test_zoom_about_keeps_cursor_point() {
        let mut view = ViewTransform::new(20.0);
        view.pan = Point2::new(50.0, 400.0);
        let cursor = Point2::new(210.0, 130.0);
        let before = view.screen_to_floor(&cursor);
        view.zoom_about(&cursor, 3.5);
        let after = view.screen_to_floor(&cursor);
        assert_relative_eq!(before.x, after.x, epsilon = 1e-9);
        assert_relative_eq!(before.y, after.y, epsilon = 1e-9);
    }

    #[test]
    fn test_center_on() {
        let mut view = ViewTransform::new(20.0);
        view.center_on(10.0, 5.0, 1.0, 800.0, 600.0);
        let c = view.floor_to_screen(10.0, 5.0);
        assert_relative_eq!(c.x, 400.0);
        assert_relative_eq!(c.y, 300.0);
    }
}
