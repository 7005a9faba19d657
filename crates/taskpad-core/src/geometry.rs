use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// Viewport-relative rectangle, as reported by the host for carets,
/// selections and block bounds.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub left: f32,
    pub top: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub fn new(left: f32, top: f32, width: f32, height: f32) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }

    pub fn right(&self) -> f32 {
        self.left + self.width
    }

    pub fn bottom(&self) -> f32 {
        self.top + self.height
    }

    pub fn center_x(&self) -> f32 {
        self.left + self.width / 2.0
    }

    pub fn contains(&self, point: Point) -> bool {
        point.x >= self.left && point.x <= self.right() && point.y >= self.top && point.y <= self.bottom()
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Placement {
    Above,
    #[default]
    Below,
}

impl Placement {
    /// Menus grow upward when less than `threshold` units remain below the
    /// anchor.
    pub fn for_anchor(anchor: Rect, viewport_height: f32, threshold: f32) -> Self {
        let space_below = viewport_height - anchor.bottom();
        if space_below < threshold {
            Placement::Above
        } else {
            Placement::Below
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Placement, Point, Rect};

    #[test]
    fn placement_flips_above_near_viewport_bottom() {
        let viewport = 800.0;
        let near_bottom = Rect::new(10.0, viewport - 120.0, 2.0, 20.0);
        let far_from_bottom = Rect::new(10.0, viewport - 520.0, 2.0, 20.0);
        assert_eq!(near_bottom.bottom(), viewport - 100.0);
        assert_eq!(
            Placement::for_anchor(near_bottom, viewport, 300.0),
            Placement::Above
        );
        assert_eq!(
            Placement::for_anchor(far_from_bottom, viewport, 300.0),
            Placement::Below
        );
    }

    #[test]
    fn placement_at_exact_threshold_stays_below() {
        let anchor = Rect::new(0.0, 480.0, 0.0, 20.0);
        assert_eq!(Placement::for_anchor(anchor, 800.0, 300.0), Placement::Below);
    }

    #[test]
    fn contains_includes_edges() {
        let rect = Rect::new(10.0, 10.0, 20.0, 20.0);
        assert!(rect.contains(Point::new(10.0, 30.0)));
        assert!(!rect.contains(Point::new(31.0, 15.0)));
        assert_eq!(rect.center_x(), 20.0);
    }
}
