use crate::diagram::{CellIndex, Diagram, EdgeIndex};
use crate::error::Error;
use crate::vector2::{
    equal_with_epsilon, greater_than_with_epsilon, less_than_with_epsilon, points_almost_equal,
    Point, EPSILON,
};

/// The axis-aligned viewport the diagram is clipped to.
///
/// `yt` is the top border (the smaller y) and `yb` the bottom, matching a
/// screen-oriented y axis that grows downward.
#[derive(Debug, Clone, Copy)]
pub struct BoundingBox {
    xl: f64,
    xr: f64,
    yt: f64,
    yb: f64,
}

impl BoundingBox {
    pub fn new(xl: f64, xr: f64, yt: f64, yb: f64) -> Self {
        BoundingBox { xl, xr, yt, yb }
    }

    pub fn left(&self) -> f64 {
        self.xl
    }

    pub fn right(&self) -> f64 {
        self.xr
    }

    pub fn top(&self) -> f64 {
        self.yt
    }

    pub fn bottom(&self) -> f64 {
        self.yb
    }

    pub fn contains(&self, point: Point) -> bool {
        (point.x >= self.xl)
            && (point.x <= self.xr)
            && (point.y >= self.yt)
            && (point.y <= self.yb)
    }

    pub(crate) fn validate(&self) -> Result<(), Error> {
        let finite = self.xl.is_finite()
            && self.xr.is_finite()
            && self.yt.is_finite()
            && self.yb.is_finite();
        if finite && self.xl < self.xr && self.yt < self.yb {
            Ok(())
        } else {
            Err(Error::InvalidBoundingBox {
                xl: self.xl,
                xr: self.xr,
                yt: self.yt,
                yb: self.yb,
            })
        }
    }

    /// Turns the raw sweep output into closed geometry: every edge is
    /// connected to the viewport and clipped against it, dead edges are
    /// pruned, and each cell boundary is completed along the borders.
    pub(crate) fn finish_diagram(&self, diagram: &mut Diagram) {
        for edge in diagram.edge_indices() {
            let keep = self.connect_edge(diagram, edge)
                && self.clip_edge(diagram, edge)
                && {
                    let edge = diagram.get_edge(edge);
                    !points_almost_equal(edge.va.unwrap(), edge.vb.unwrap())
                };
            if !keep {
                diagram.kill_edge(edge);
            }
        }
        self.close_cells(diagram);
    }

    /// Completes a dangling or open edge by extending its bisector to the
    /// viewport. The direction to extend follows from the relative position
    /// of the two sites. Returns false when the bisector cannot reach the
    /// viewport at all.
    fn connect_edge(&self, diagram: &mut Diagram, edge: EdgeIndex) -> bool {
        let stored = *diagram.get_edge(edge);
        if stored.vb.is_some() {
            return true;
        }

        let left_site = stored.left_site;
        let right_site = match stored.right_site {
            Some(site) => site,
            None => return true,
        };
        let l = diagram.site_point(left_site);
        let r = diagram.site_point(right_site);
        let fx = (l.x + r.x) / 2.0;
        let fy = (l.y + r.y) / 2.0;

        let mut va = stored.va;
        let vb;
        if r.y == l.y {
            // vertical bisector
            if fx < self.xl || fx >= self.xr {
                return false;
            }
            if l.x > r.x {
                // downward
                match va {
                    None => va = Some(Point::new(fx, self.yt)),
                    Some(v) if v.y >= self.yb => return false,
                    _ => {}
                }
                vb = Point::new(fx, self.yb);
            } else {
                // upward
                match va {
                    None => va = Some(Point::new(fx, self.yb)),
                    Some(v) if v.y < self.yt => return false,
                    _ => {}
                }
                vb = Point::new(fx, self.yt);
            }
        } else {
            let fm = (l.x - r.x) / (r.y - l.y);
            let fb = fy - fm * fx;
            if fm < -1.0 || fm > 1.0 {
                // steeper than the diagonals: leaves through top or bottom
                if l.x > r.x {
                    // downward
                    match va {
                        None => va = Some(Point::new((self.yt - fb) / fm, self.yt)),
                        Some(v) if v.y >= self.yb => return false,
                        _ => {}
                    }
                    vb = Point::new((self.yb - fb) / fm, self.yb);
                } else {
                    // upward
                    match va {
                        None => va = Some(Point::new((self.yb - fb) / fm, self.yb)),
                        Some(v) if v.y < self.yt => return false,
                        _ => {}
                    }
                    vb = Point::new((self.yt - fb) / fm, self.yt);
                }
            } else {
                // shallow: leaves through the left or right side
                if l.y < r.y {
                    // rightward
                    match va {
                        None => va = Some(Point::new(self.xl, fm * self.xl + fb)),
                        Some(v) if v.x >= self.xr => return false,
                        _ => {}
                    }
                    vb = Point::new(self.xr, fm * self.xr + fb);
                } else {
                    // leftward
                    match va {
                        None => va = Some(Point::new(self.xr, fm * self.xr + fb)),
                        Some(v) if v.x < self.xl => return false,
                        _ => {}
                    }
                    vb = Point::new(self.xl, fm * self.xl + fb);
                }
            }
        }

        let edge = diagram.get_edge_mut(edge);
        edge.va = va;
        edge.vb = Some(vb);
        true
    }

    /// Liang-Barsky clipping of a fully-specified edge. Returns false when
    /// the edge lies entirely outside the viewport.
    fn clip_edge(&self, diagram: &mut Diagram, edge: EdgeIndex) -> bool {
        let stored = *diagram.get_edge(edge);
        let a = stored.va.unwrap();
        let b = stored.vb.unwrap();
        let dx = b.x - a.x;
        let dy = b.y - a.y;
        let mut t0 = 0.0;
        let mut t1 = 1.0;

        // each border contributes a half-plane constraint p*t <= q
        let constraints = [
            (-dx, a.x - self.xl),
            (dx, self.xr - a.x),
            (-dy, a.y - self.yt),
            (dy, self.yb - a.y),
        ];
        for &(p, q) in &constraints {
            if p == 0.0 {
                if q < 0.0 {
                    return false;
                }
                continue;
            }
            let r = q / p;
            if p < 0.0 {
                if r > t1 {
                    return false;
                }
                if r > t0 {
                    t0 = r;
                }
            } else {
                if r < t0 {
                    return false;
                }
                if r < t1 {
                    t1 = r;
                }
            }
        }

        let edge = diagram.get_edge_mut(edge);
        if t0 > 0.0 {
            edge.va = Some(Point::new(a.x + t0 * dx, a.y + t0 * dy));
        }
        if t1 < 1.0 {
            edge.vb = Some(Point::new(a.x + t1 * dx, a.y + t1 * dy));
        }
        true
    }

    /// Orders each cell's halfedges counter-clockwise and fills the gaps
    /// between them with border edges tracing the viewport.
    fn close_cells(&self, diagram: &mut Diagram) {
        // With a single occupied cell there are no bisectors at all; the
        // whole viewport is that cell.
        let occupied: Vec<CellIndex> = diagram
            .cell_indices()
            .into_iter()
            .filter(|&cell| diagram.get_cell(cell).processed)
            .collect();
        if occupied.len() == 1 && diagram.num_live_edges() == 0 {
            self.surround_cell(diagram, occupied[0]);
        }

        for cell in diagram.cell_indices() {
            if diagram.prepare_cell(cell) == 0 {
                continue;
            }

            let mut i_left = 0;
            while i_left < diagram.get_cell(cell).halfedges.len() {
                let count = diagram.get_cell(cell).halfedges.len();
                let left = diagram.get_cell(cell).halfedges[i_left];
                let right = diagram.get_cell(cell).halfedges[(i_left + 1) % count];
                let end = diagram.halfedge_endpoint(&left);
                let start = diagram.halfedge_startpoint(&right);

                if (end.x - start.x).abs() >= EPSILON || (end.y - start.y).abs() >= EPSILON {
                    // Walk the border counter-clockwise from the open end
                    // toward the next halfedge; one border edge per side, so
                    // a gap spanning corners is filled over several passes.
                    let vb = if equal_with_epsilon(end.x, self.xl)
                        && less_than_with_epsilon(end.y, self.yb)
                    {
                        // down the left side
                        let y = if equal_with_epsilon(start.x, self.xl) {
                            start.y
                        } else {
                            self.yb
                        };
                        Point::new(self.xl, y)
                    } else if equal_with_epsilon(end.y, self.yb)
                        && less_than_with_epsilon(end.x, self.xr)
                    {
                        // rightward along the bottom
                        let x = if equal_with_epsilon(start.y, self.yb) {
                            start.x
                        } else {
                            self.xr
                        };
                        Point::new(x, self.yb)
                    } else if equal_with_epsilon(end.x, self.xr)
                        && greater_than_with_epsilon(end.y, self.yt)
                    {
                        // up the right side
                        let y = if equal_with_epsilon(start.x, self.xr) {
                            start.y
                        } else {
                            self.yt
                        };
                        Point::new(self.xr, y)
                    } else if equal_with_epsilon(end.y, self.yt)
                        && greater_than_with_epsilon(end.x, self.xl)
                    {
                        // leftward along the top
                        let x = if equal_with_epsilon(start.y, self.yt) {
                            start.x
                        } else {
                            self.xl
                        };
                        Point::new(x, self.yt)
                    } else {
                        debug_assert!(false, "open cell endpoint away from the viewport border");
                        break;
                    };

                    let site = diagram.get_cell(cell).site();
                    let edge = diagram.create_border_edge(site, end, vb);
                    let halfedge = diagram.border_halfedge(edge, site);
                    diagram
                        .get_cell_mut(cell)
                        .halfedges
                        .insert(i_left + 1, halfedge);
                }
                i_left += 1;
            }
        }
    }

    /// Gives a cell the whole viewport: four border edges, corner to corner.
    fn surround_cell(&self, diagram: &mut Diagram, cell: CellIndex) {
        let site = diagram.get_cell(cell).site();
        let corners = [
            (Point::new(self.xl, self.yt), Point::new(self.xl, self.yb)),
            (Point::new(self.xl, self.yb), Point::new(self.xr, self.yb)),
            (Point::new(self.xr, self.yb), Point::new(self.xr, self.yt)),
            (Point::new(self.xr, self.yt), Point::new(self.xl, self.yt)),
        ];
        for &(va, vb) in &corners {
            let edge = diagram.create_border_edge(site, va, vb);
            let halfedge = diagram.border_halfedge(edge, site);
            diagram.get_cell_mut(cell).halfedges.push(halfedge);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagram::SiteIndex;
    use approx::assert_abs_diff_eq;

    fn edge_between(
        diagram: &mut Diagram,
        a: Point,
        b: Point,
    ) -> (EdgeIndex, SiteIndex, SiteIndex) {
        let left = diagram.add_site(Point::new(0.25, 0.5));
        let right = diagram.add_site(Point::new(0.75, 0.5));
        let edge = diagram.create_edge(left, right, None, None);
        diagram.set_edge_startpoint(edge, left, right, a);
        diagram.set_edge_endpoint(edge, left, right, b);
        (edge, left, right)
    }

    #[test]
    fn validate_accepts_a_proper_box() {
        assert!(BoundingBox::new(0.0, 800.0, 0.0, 600.0).validate().is_ok());
    }

    #[test]
    fn validate_rejects_flipped_bounds() {
        assert!(BoundingBox::new(800.0, 0.0, 0.0, 600.0).validate().is_err());
        assert!(BoundingBox::new(0.0, 800.0, 600.0, 0.0).validate().is_err());
        assert!(BoundingBox::new(0.0, 0.0, 0.0, 600.0).validate().is_err());
    }

    #[test]
    fn validate_rejects_non_finite_bounds() {
        assert!(BoundingBox::new(f64::NAN, 800.0, 0.0, 600.0)
            .validate()
            .is_err());
        assert!(BoundingBox::new(0.0, f64::INFINITY, 0.0, 600.0)
            .validate()
            .is_err());
    }

    #[test]
    fn clip_keeps_an_interior_segment() {
        let bbox = BoundingBox::new(0.0, 1.0, 0.0, 1.0);
        let mut diagram = Diagram::new();
        let (edge, ..) = edge_between(
            &mut diagram,
            Point::new(0.2, 0.2),
            Point::new(0.8, 0.8),
        );

        assert!(bbox.clip_edge(&mut diagram, edge));
        assert_eq!(diagram.get_edge(edge).start(), Some(Point::new(0.2, 0.2)));
        assert_eq!(diagram.get_edge(edge).end(), Some(Point::new(0.8, 0.8)));
    }

    #[test]
    fn clip_truncates_a_crossing_segment() {
        let bbox = BoundingBox::new(0.0, 1.0, 0.0, 1.0);
        let mut diagram = Diagram::new();
        let (edge, ..) = edge_between(
            &mut diagram,
            Point::new(-1.0, 0.5),
            Point::new(2.0, 0.5),
        );

        assert!(bbox.clip_edge(&mut diagram, edge));
        let clipped = diagram.get_edge(edge);
        assert_abs_diff_eq!(clipped.start().unwrap().x, 0.0, epsilon = EPSILON);
        assert_abs_diff_eq!(clipped.end().unwrap().x, 1.0, epsilon = EPSILON);
        assert_abs_diff_eq!(clipped.start().unwrap().y, 0.5, epsilon = EPSILON);
    }

    #[test]
    fn clip_rejects_an_outside_segment() {
        let bbox = BoundingBox::new(0.0, 1.0, 0.0, 1.0);
        let mut diagram = Diagram::new();
        let (edge, ..) = edge_between(
            &mut diagram,
            Point::new(2.0, 2.0),
            Point::new(3.0, 2.5),
        );

        assert!(!bbox.clip_edge(&mut diagram, edge));
    }

    #[test]
    fn clip_rejects_an_axis_parallel_segment_outside() {
        let bbox = BoundingBox::new(0.0, 1.0, 0.0, 1.0);
        let mut diagram = Diagram::new();
        // horizontal, above the box: the dy == 0 constraint must reject it
        let (edge, ..) = edge_between(
            &mut diagram,
            Point::new(0.2, -0.5),
            Point::new(0.8, -0.5),
        );

        assert!(!bbox.clip_edge(&mut diagram, edge));
    }

    #[test]
    fn connect_extends_an_open_vertical_bisector() {
        let bbox = BoundingBox::new(0.0, 1.0, 0.0, 1.0);
        let mut diagram = Diagram::new();
        // sites share a row, left then right: the bisector is vertical and
        // runs upward (in the y-grows-down sense, from yb to yt)
        let left = diagram.add_site(Point::new(0.25, 0.5));
        let right = diagram.add_site(Point::new(0.75, 0.5));
        let edge = diagram.create_edge(left, right, None, None);

        assert!(bbox.connect_edge(&mut diagram, edge));
        assert_eq!(diagram.get_edge(edge).start(), Some(Point::new(0.5, 1.0)));
        assert_eq!(diagram.get_edge(edge).end(), Some(Point::new(0.5, 0.0)));
    }

    #[test]
    fn connect_fails_when_the_bisector_misses_the_viewport() {
        let bbox = BoundingBox::new(0.0, 1.0, 0.0, 1.0);
        let mut diagram = Diagram::new();
        // vertical bisector at x = 2, outside the box
        let left = diagram.add_site(Point::new(1.5, 0.5));
        let right = diagram.add_site(Point::new(2.5, 0.5));
        let edge = diagram.create_edge(left, right, None, None);

        assert!(!bbox.connect_edge(&mut diagram, edge));
    }

    #[test]
    fn contains_is_inclusive_of_the_borders() {
        let bbox = BoundingBox::new(0.0, 1.0, 0.0, 1.0);
        assert!(bbox.contains(Point::new(0.0, 0.0)));
        assert!(bbox.contains(Point::new(1.0, 1.0)));
        assert!(bbox.contains(Point::new(0.5, 0.5)));
        assert!(!bbox.contains(Point::new(-0.1, 0.5)));
        assert!(!bbox.contains(Point::new(0.5, 1.1)));
    }
}
