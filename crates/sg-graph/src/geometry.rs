//! Planar geometry for segments and facilities.
//!
//! Coordinates are projected (e.g. state-plane feet); nothing here knows
//! about datums. Rings may be given open or closed, a duplicated closing
//! vertex is dropped on construction.

use crate::error::{GraphError, GraphResult};

/// Projected `[x, y]` coordinate.
pub type Coord = [f64; 2];

/// Polygon with one exterior ring and optional holes.
#[derive(Debug, Clone, PartialEq)]
pub struct Polygon {
    exterior: Vec<Coord>,
    holes: Vec<Vec<Coord>>,
}

impl Polygon {
    /// Polygon without holes.
    pub fn new(exterior: Vec<Coord>) -> GraphResult<Self> {
        Self::with_holes(exterior, Vec::new())
    }

    pub fn with_holes(exterior: Vec<Coord>, holes: Vec<Vec<Coord>>) -> GraphResult<Self> {
        let exterior = normalize_ring(exterior)?;
        let holes = holes
            .into_iter()
            .map(normalize_ring)
            .collect::<GraphResult<Vec<_>>>()?;
        let polygon = Self { exterior, holes };
        if polygon.area() <= 0.0 {
            return Err(GraphError::DegeneratePolygon {
                reason: "polygon has zero area",
            });
        }
        Ok(polygon)
    }

    pub fn exterior(&self) -> &[Coord] {
        &self.exterior
    }

    pub fn holes(&self) -> &[Vec<Coord>] {
        &self.holes
    }

    /// Exterior followed by holes.
    pub fn rings(&self) -> impl Iterator<Item = &[Coord]> {
        std::iter::once(self.exterior.as_slice()).chain(self.holes.iter().map(Vec::as_slice))
    }

    /// Planar area in squared coordinate units.
    pub fn area(&self) -> f64 {
        let outer = ring_signed_area(&self.exterior).abs();
        let inner: f64 = self.holes.iter().map(|h| ring_signed_area(h).abs()).sum();
        (outer - inner).max(0.0)
    }

    /// Area-weighted centroid (holes subtracted).
    pub fn centroid(&self) -> Coord {
        let (mut cx, mut cy, mut a) = ring_moments(&self.exterior, 1.0);
        for hole in &self.holes {
            let (hx, hy, ha) = ring_moments(hole, -1.0);
            cx += hx;
            cy += hy;
            a += ha;
        }
        if a.abs() <= f64::EPSILON {
            return vertex_mean(&self.exterior);
        }
        [cx / a, cy / a]
    }

    /// Even-odd containment; points inside a hole are outside.
    pub fn contains(&self, p: Coord) -> bool {
        if !ring_contains(&self.exterior, p) {
            return false;
        }
        !self.holes.iter().any(|h| ring_contains(h, p))
    }
}

/// Facility geometry.
#[derive(Debug, Clone, PartialEq)]
pub enum Geometry {
    Point(Coord),
    LineString(Vec<Coord>),
    Polygon(Polygon),
}

impl Geometry {
    /// Point used for the facility-to-segment join.
    pub fn representative_point(&self) -> Coord {
        match self {
            Geometry::Point(p) => *p,
            Geometry::LineString(coords) => vertex_mean(coords),
            Geometry::Polygon(poly) => poly.centroid(),
        }
    }
}

pub fn distance(a: Coord, b: Coord) -> f64 {
    (a[0] - b[0]).hypot(a[1] - b[1])
}

fn normalize_ring(mut ring: Vec<Coord>) -> GraphResult<Vec<Coord>> {
    if ring.iter().flatten().any(|v| !v.is_finite()) {
        return Err(GraphError::NonFiniteCoordinate);
    }
    if ring.len() > 1 && ring.first() == ring.last() {
        ring.pop();
    }
    if ring.len() < 3 {
        return Err(GraphError::DegeneratePolygon {
            reason: "ring needs at least three distinct vertices",
        });
    }
    Ok(ring)
}

fn ring_signed_area(ring: &[Coord]) -> f64 {
    let n = ring.len();
    let mut twice = 0.0;
    for i in 0..n {
        let [x0, y0] = ring[i];
        let [x1, y1] = ring[(i + 1) % n];
        twice += x0 * y1 - x1 * y0;
    }
    0.5 * twice
}

/// First moments of a ring, oriented so the ring counts with `sign`.
fn ring_moments(ring: &[Coord], sign: f64) -> (f64, f64, f64) {
    let signed = ring_signed_area(ring);
    // flip clockwise rings so the sign is controlled by the caller
    let orient = if signed < 0.0 { -1.0 } else { 1.0 } * sign;
    let n = ring.len();
    let (mut cx, mut cy) = (0.0, 0.0);
    for i in 0..n {
        let [x0, y0] = ring[i];
        let [x1, y1] = ring[(i + 1) % n];
        let cross = x0 * y1 - x1 * y0;
        cx += (x0 + x1) * cross;
        cy += (y0 + y1) * cross;
    }
    (
        orient * cx / 6.0,
        orient * cy / 6.0,
        orient * signed,
    )
}

fn ring_contains(ring: &[Coord], p: Coord) -> bool {
    let n = ring.len();
    let mut inside = false;
    let mut j = n - 1;
    for i in 0..n {
        let [xi, yi] = ring[i];
        let [xj, yj] = ring[j];
        if (yi > p[1]) != (yj > p[1]) && p[0] < (xj - xi) * (p[1] - yi) / (yj - yi) + xi {
            inside = !inside;
        }
        j = i;
    }
    inside
}

fn vertex_mean(coords: &[Coord]) -> Coord {
    if coords.is_empty() {
        return [0.0, 0.0];
    }
    let n = coords.len() as f64;
    let (sx, sy) = coords
        .iter()
        .fold((0.0, 0.0), |(sx, sy), c| (sx + c[0], sy + c[1]));
    [sx / n, sy / n]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit_square() -> Polygon {
        Polygon::new(vec![[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0], [0.0, 0.0]]).unwrap()
    }

    #[test]
    fn closed_ring_is_normalized() {
        let sq = unit_square();
        assert_eq!(sq.exterior().len(), 4);
        assert!((sq.area() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn centroid_of_square_with_hole() {
        let poly = Polygon::with_holes(
            vec![[0.0, 0.0], [4.0, 0.0], [4.0, 4.0], [0.0, 4.0]],
            vec![vec![[0.0, 0.0], [0.0, 2.0], [2.0, 2.0], [2.0, 0.0]]],
        )
        .unwrap();
        assert!((poly.area() - 12.0).abs() < 1e-12);
        let c = poly.centroid();
        // L-shape remaining after removing the lower-left quarter
        assert!((c[0] - 7.0 / 3.0).abs() < 1e-9, "cx = {}", c[0]);
        assert!((c[1] - 7.0 / 3.0).abs() < 1e-9, "cy = {}", c[1]);
    }

    #[test]
    fn clockwise_ring_has_same_centroid() {
        let cw = Polygon::new(vec![[0.0, 0.0], [0.0, 2.0], [2.0, 2.0], [2.0, 0.0]]).unwrap();
        assert_eq!(cw.centroid(), [1.0, 1.0]);
    }

    #[test]
    fn containment_respects_holes() {
        let poly = Polygon::with_holes(
            vec![[0.0, 0.0], [4.0, 0.0], [4.0, 4.0], [0.0, 4.0]],
            vec![vec![[1.0, 1.0], [3.0, 1.0], [3.0, 3.0], [1.0, 3.0]]],
        )
        .unwrap();
        assert!(poly.contains([0.5, 0.5]));
        assert!(!poly.contains([2.0, 2.0]));
        assert!(!poly.contains([5.0, 2.0]));
    }

    #[test]
    fn degenerate_rings_rejected() {
        assert!(matches!(
            Polygon::new(vec![[0.0, 0.0], [1.0, 1.0]]),
            Err(GraphError::DegeneratePolygon { .. })
        ));
        assert!(matches!(
            Polygon::new(vec![[0.0, 0.0], [1.0, 1.0], [2.0, 2.0]]),
            Err(GraphError::DegeneratePolygon { .. })
        ));
        assert!(matches!(
            Polygon::new(vec![[0.0, 0.0], [f64::NAN, 1.0], [2.0, 0.0]]),
            Err(GraphError::NonFiniteCoordinate)
        ));
    }

    #[test]
    fn representative_points() {
        assert_eq!(Geometry::Point([3.0, 4.0]).representative_point(), [3.0, 4.0]);
        let line = Geometry::LineString(vec![[0.0, 0.0], [2.0, 0.0]]);
        assert_eq!(line.representative_point(), [1.0, 0.0]);
        assert_eq!(
            Geometry::Polygon(unit_square()).representative_point(),
            [0.5, 0.5]
        );
    }
}
