use std::fmt;

use glam::DVec2;

/// Axis-aligned rectangle described by its min and max corners.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct Rect {
    pub min: DVec2,
    pub max: DVec2,
}

impl Rect {
    pub fn new(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Self {
        Self {
            min: DVec2::new(min_x, min_y),
            max: DVec2::new(max_x, max_y),
        }
    }

    pub fn from_corners(min: DVec2, max: DVec2) -> Self {
        Self { min, max }
    }

    #[inline]
    pub fn center(&self) -> DVec2 {
        // Halve first so regions near f64::MAX stay finite.
        self.min * 0.5 + self.max * 0.5
    }

    #[inline]
    pub fn width(&self) -> f64 {
        self.max.x - self.min.x
    }

    #[inline]
    pub fn height(&self) -> f64 {
        self.max.y - self.min.y
    }

    /// Edge and corner contact counts as intersecting.
    #[inline]
    pub fn intersects(&self, other: &Rect) -> bool {
        self.min.x <= other.max.x
            && other.min.x <= self.max.x
            && self.min.y <= other.max.y
            && other.min.y <= self.max.y
    }

    #[inline]
    pub fn contains_rect(&self, other: &Rect) -> bool {
        self.min.x <= other.min.x
            && self.min.y <= other.min.y
            && other.max.x <= self.max.x
            && other.max.y <= self.max.y
    }

    /// Finite coordinates with `min <= max` on both axes.
    pub fn is_well_formed(&self) -> bool {
        self.min.is_finite() && self.max.is_finite() && self.min.cmple(self.max).all()
    }

    /// Splits at the center into bottom-left, bottom-right, top-left, top-right.
    pub fn quadrants(&self) -> [Rect; 4] {
        let c = self.center();
        [
            Rect::new(self.min.x, self.min.y, c.x, c.y),
            Rect::new(c.x, self.min.y, self.max.x, c.y),
            Rect::new(self.min.x, c.y, c.x, self.max.y),
            Rect::new(c.x, c.y, self.max.x, self.max.y),
        ]
    }

    /// Bit patterns of all four coordinates, used for exact identity.
    /// Adding `0.0` folds `-0.0` into `0.0` so this agrees with `==`.
    pub(crate) fn to_bits(self) -> [u64; 4] {
        [
            (self.min.x + 0.0).to_bits(),
            (self.min.y + 0.0).to_bits(),
            (self.max.x + 0.0).to_bits(),
            (self.max.y + 0.0).to_bits(),
        ]
    }
}

impl fmt::Display for Rect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Rect({}, {}, {}, {})",
            self.min.x, self.min.y, self.max.x, self.max.y
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn touching_edges_intersect() {
        let a = Rect::new(0.0, 0.0, 50.0, 50.0);
        assert!(a.intersects(&Rect::new(50.0, 50.0, 70.0, 70.0)));
        assert!(a.intersects(&Rect::new(50.0, 0.0, 60.0, 10.0)));
        assert!(!a.intersects(&Rect::new(60.0, 60.0, 70.0, 70.0)));
    }

    #[test]
    fn quadrants_tile_parent() {
        let r = Rect::new(0.0, 0.0, 800.0, 600.0);
        let q = r.quadrants();
        assert_eq!(q[0], Rect::new(0.0, 0.0, 400.0, 300.0));
        assert_eq!(q[1], Rect::new(400.0, 0.0, 800.0, 300.0));
        assert_eq!(q[2], Rect::new(0.0, 300.0, 400.0, 600.0));
        assert_eq!(q[3], Rect::new(400.0, 300.0, 800.0, 600.0));
        for quad in &q {
            assert!(r.contains_rect(quad));
        }
    }

    #[test]
    fn dimensions() {
        let r = Rect::from_corners(DVec2::new(10.0, 20.0), DVec2::new(50.0, 30.0));
        assert_eq!(r, Rect::new(10.0, 20.0, 50.0, 30.0));
        assert_eq!(r.width(), 40.0);
        assert_eq!(r.height(), 10.0);
        assert_eq!(r.center(), DVec2::new(30.0, 25.0));
    }

    #[test]
    fn center_of_huge_region_is_finite() {
        let r = Rect::new(0.0, 0.0, f64::MAX, f64::MAX);
        let c = r.center();
        assert!(c.is_finite());
        assert_eq!(c, DVec2::splat(f64::MAX / 2.0));
        for quad in r.quadrants() {
            assert!(quad.is_well_formed());
            assert!(r.contains_rect(&quad));
        }
    }

    #[test]
    fn signed_zero_bits_match() {
        let a = Rect::new(-0.0, 0.0, 5.0, 5.0);
        let b = Rect::new(0.0, -0.0, 5.0, 5.0);
        assert_eq!(a, b);
        assert_eq!(a.to_bits(), b.to_bits());
    }

    #[test]
    fn well_formed() {
        assert!(Rect::new(0.0, 0.0, 0.0, 0.0).is_well_formed());
        assert!(!Rect::new(10.0, 0.0, 0.0, 10.0).is_well_formed());
        assert!(!Rect::new(0.0, 10.0, 10.0, 0.0).is_well_formed());
        assert!(!Rect::new(0.0, 0.0, f64::NAN, 10.0).is_well_formed());
        assert!(!Rect::new(0.0, 0.0, f64::INFINITY, 10.0).is_well_formed());
    }
}
