/// Bounding box in image pixel space with a top-left origin.
///
/// - `x0`: left edge
/// - `top`: top edge (distance from the top of the image)
/// - `x1`: right edge
/// - `bottom`: bottom edge (distance from the top of the image)
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct BBox {
    pub x0: f64,
    pub top: f64,
    pub x1: f64,
    pub bottom: f64,
}

impl BBox {
    pub fn new(x0: f64, top: f64, x1: f64, bottom: f64) -> Self {
        Self {
            x0,
            top,
            x1,
            bottom,
        }
    }

    /// Build a box from an origin and a size.
    pub fn from_xywh(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self::new(x, y, x + width, y + height)
    }

    /// Smallest box enclosing every point, or `None` for an empty slice.
    pub fn from_points(points: &[(f64, f64)]) -> Option<Self> {
        let (&(x, y), rest) = points.split_first()?;
        Some(
            rest.iter()
                .fold(BBox::new(x, y, x, y), |acc, &(px, py)| {
                    acc.union(&BBox::new(px, py, px, py))
                }),
        )
    }

    /// Width of the bounding box.
    pub fn width(&self) -> f64 {
        self.x1 - self.x0
    }

    /// Height of the bounding box.
    pub fn height(&self) -> f64 {
        self.bottom - self.top
    }

    /// Area in square pixels; degenerate boxes have zero area.
    pub fn area(&self) -> f64 {
        self.width().max(0.0) * self.height().max(0.0)
    }

    pub fn center(&self) -> (f64, f64) {
        ((self.x0 + self.x1) / 2.0, (self.top + self.bottom) / 2.0)
    }

    /// Euclidean distance from the box center to `point`.
    pub fn center_distance(&self, point: (f64, f64)) -> f64 {
        let (cx, cy) = self.center();
        ((cx - point.0).powi(2) + (cy - point.1).powi(2)).sqrt()
    }

    /// Compute the union of two bounding boxes.
    pub fn union(&self, other: &BBox) -> BBox {
        BBox {
            x0: self.x0.min(other.x0),
            top: self.top.min(other.top),
            x1: self.x1.max(other.x1),
            bottom: self.bottom.max(other.bottom),
        }
    }

    /// Scale every coordinate by `factor`.
    pub fn scaled(&self, factor: f64) -> BBox {
        BBox::new(
            self.x0 * factor,
            self.top * factor,
            self.x1 * factor,
            self.bottom * factor,
        )
    }
}

impl Default for BBox {
    fn default() -> Self {
        BBox::new(0.0, 0.0, 0.0, 0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bbox_dimensions() {
        let bbox = BBox::new(10.0, 20.0, 50.0, 60.0);
        assert_eq!(bbox.width(), 40.0);
        assert_eq!(bbox.height(), 40.0);
        assert_eq!(bbox.area(), 1600.0);
    }

    #[test]
    fn test_bbox_from_xywh() {
        let bbox = BBox::from_xywh(10.0, 20.0, 5.0, 7.0);
        assert_eq!(bbox, BBox::new(10.0, 20.0, 15.0, 27.0));
    }

    #[test]
    fn test_bbox_degenerate_area_is_zero() {
        let bbox = BBox::new(10.0, 10.0, 5.0, 20.0);
        assert_eq!(bbox.area(), 0.0);
    }

    #[test]
    fn test_bbox_union() {
        let a = BBox::new(10.0, 20.0, 30.0, 40.0);
        let b = BBox::new(5.0, 25.0, 35.0, 45.0);
        assert_eq!(a.union(&b), BBox::new(5.0, 20.0, 35.0, 45.0));
    }

    #[test]
    fn test_bbox_from_points() {
        let bbox = BBox::from_points(&[(3.0, 9.0), (1.0, 4.0), (7.0, 5.0)]).unwrap();
        assert_eq!(bbox, BBox::new(1.0, 4.0, 7.0, 9.0));
        assert!(BBox::from_points(&[]).is_none());
    }

    #[test]
    fn test_bbox_center_distance() {
        let bbox = BBox::new(0.0, 0.0, 10.0, 10.0);
        assert_eq!(bbox.center(), (5.0, 5.0));
        assert_eq!(bbox.center_distance((5.0, 5.0)), 0.0);
        assert_eq!(bbox.center_distance((8.0, 9.0)), 5.0);
    }

    #[test]
    fn test_bbox_scaled() {
        let bbox = BBox::new(1.0, 2.0, 3.0, 4.0).scaled(2.0);
        assert_eq!(bbox, BBox::new(2.0, 4.0, 6.0, 8.0));
    }
}
