//! Shared geometric primitives and the tolerances used throughout the crate.

/// All geometry is carried out on 64-bit points.
pub type Point = cgmath::Point2<f64>;

/// Tolerance for all geometric equality and ordering comparisons.
pub const EPSILON: f64 = 1e-9;

/// Looser tolerance for the signed-area test of the circumcircle predicate.
/// Established empirically; a tighter bound lets nearly collinear triplets
/// through and produces circle events at effectively infinite coordinates.
pub const COLLINEARITY_EPSILON: f64 = 2e-12;

pub fn equal_with_epsilon(a: f64, b: f64) -> bool {
    (a - b).abs() < EPSILON
}

pub fn greater_than_with_epsilon(a: f64, b: f64) -> bool {
    a - b > EPSILON
}

pub fn less_than_with_epsilon(a: f64, b: f64) -> bool {
    b - a > EPSILON
}

pub fn points_almost_equal(a: Point, b: Point) -> bool {
    equal_with_epsilon(a.x, b.x) && equal_with_epsilon(a.y, b.y)
}

/// Circle through three points, described by what the sweep needs from it.
#[derive(Debug, Clone, Copy)]
pub struct Circumcircle {
    /// x of the center, which is also the x of the future Voronoi vertex.
    pub x: f64,
    /// y of the center.
    pub ycenter: f64,
    /// y of the lowest point of the circle, i.e. the sweepline position at
    /// which the event fires.
    pub ybottom: f64,
}

/// Computes the circle through `a`, `b`, `c`, or `None` when the triplet is
/// clockwise or too close to collinear to trust the result.
///
/// The origin is translated to `b` before solving so the intermediate
/// products stay small; the terms must not be reassociated.
pub fn circle_through(a: Point, b: Point, c: Point) -> Option<Circumcircle> {
    let ax = a.x - b.x;
    let ay = a.y - b.y;
    let cx = c.x - b.x;
    let cy = c.y - b.y;

    let d = 2.0 * (ax * cy - ay * cx);
    if d >= -COLLINEARITY_EPSILON {
        return None;
    }

    let ha = ax * ax + ay * ay;
    let hc = cx * cx + cy * cy;
    let x = (cy * ha - ay * hc) / d;
    let y = (ax * hc - cx * ha) / d;
    let ycenter = y + b.y;

    Some(Circumcircle {
        x: x + b.x,
        ycenter,
        ybottom: ycenter + (x * x + y * y).sqrt(),
    })
}
