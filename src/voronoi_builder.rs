use std::time::Instant;

use log::{debug, trace};

use crate::beachline::{BeachKey, Beachline};
use crate::boundingbox::BoundingBox;
use crate::diagram::{Diagram, SiteIndex};
use crate::error::Error;
use crate::event::{CircleEvent, CircleQueue, SiteQueue};
use crate::vector2::{circle_through, Point, EPSILON};

/// Builds a bounded Voronoi diagram from the supplied points.
pub fn build_voronoi(points: &[Point], bbox: &BoundingBox) -> Result<Diagram, Error> {
    VoronoiBuilder::new().compute(points, bbox)
}

/// The sweep engine. A single instance must not be entered concurrently,
/// but it can be reused across computations: the beachline arena keeps its
/// slots between runs, which spares re-allocation when many diagrams of
/// similar size are generated back to back.
pub struct VoronoiBuilder {
    beachline: Beachline,
    circle_events: CircleQueue,
}

impl Default for VoronoiBuilder {
    fn default() -> Self {
        VoronoiBuilder::new()
    }
}

impl VoronoiBuilder {
    pub fn new() -> Self {
        VoronoiBuilder {
            beachline: Beachline::new(),
            circle_events: CircleQueue::new(),
        }
    }

    /// Runs the sweep over `points` and finalizes the result against `bbox`.
    ///
    /// Exact duplicates of the previously processed site are skipped; their
    /// cells are left empty. Sites on the viewport border are accepted like
    /// any other site.
    pub fn compute(&mut self, points: &[Point], bbox: &BoundingBox) -> Result<Diagram, Error> {
        bbox.validate()?;
        for (index, point) in points.iter().enumerate() {
            if !point.x.is_finite() || !point.y.is_finite() {
                return Err(Error::NonFiniteSite { index });
            }
        }

        let started = Instant::now();
        self.beachline.clear();
        self.circle_events.clear();

        let mut diagram = Diagram::new();
        for &point in points {
            diagram.add_site(point);
        }
        let mut site_events = SiteQueue::new(&diagram);

        // Pull whichever queue holds the event with the smaller (y, x).
        let mut site = site_events.pop();
        let mut previous: Option<Point> = None;
        loop {
            let next_circle = self.circle_events.peek().map(|event| (event.y, event.x));
            let site_first = match (site, next_circle) {
                (Some(s), Some((cy, cx))) => {
                    let point = diagram.site_point(s);
                    point.y < cy || (point.y == cy && point.x < cx)
                }
                (Some(_), None) => true,
                (None, _) => false,
            };

            if site_first {
                let s = site.unwrap();
                let point = diagram.site_point(s);
                if previous != Some(point) {
                    trace!("site event at ({}, {})", point.x, point.y);
                    self.handle_site_event(&mut diagram, s);
                    let cell = diagram.cell_of(s);
                    diagram.get_cell_mut(cell).processed = true;
                    previous = Some(point);
                } else {
                    trace!("skipping duplicate site at ({}, {})", point.x, point.y);
                }
                site = site_events.pop();
            } else if let Some(event) = self.circle_events.pop() {
                trace!(
                    "circle event at ({}, {}), vertex at ({}, {})",
                    event.x,
                    event.y,
                    event.x,
                    event.ycenter
                );
                self.handle_circle_event(&mut diagram, &event);
            } else {
                break;
            }
        }

        bbox.finish_diagram(&mut diagram);
        self.beachline.clear();
        self.circle_events.clear();

        diagram.set_exec_time(started.elapsed().as_secs_f64() * 1_000.0);
        debug!(
            "swept {} sites into {} edges in {:.3} ms",
            diagram.num_sites(),
            diagram.edges().count(),
            diagram.exec_time_ms()
        );
        Ok(diagram)
    }

    fn handle_site_event(&mut self, diagram: &mut Diagram, site: SiteIndex) {
        let point = diagram.site_point(site);

        // 1 Find where the new site lands on the beachline
        let (left_arc, right_arc) = self.beachline.locate_arc(point, diagram);

        // 2 Insert its arc there
        let new_arc = self.beachline.create_arc(site);
        self.beachline.insert_successor(left_arc, new_arc);

        match (left_arc, right_arc) {
            // 3a First arc of the beachline, nothing else to do
            (None, None) => {}

            // 3b The site lands strictly inside an arc: split it in two and
            //    trace a new edge with the twin break points
            (Some(left), Some(right)) if left == right => {
                self.detach_circle_event(left);

                let copy = self.beachline.create_arc(self.beachline.site(left));
                self.beachline.insert_successor(Some(new_arc), copy);

                let edge = diagram.create_edge(self.beachline.site(left), site, None, None);
                self.beachline.set_edge(new_arc, Some(edge));
                self.beachline.set_edge(copy, Some(edge));

                // 4 either half of the split arc may collapse in turn
                self.attach_circle_event(diagram, left);
                self.attach_circle_event(diagram, copy);
            }

            // 3c Beyond the rightmost arc: happens when every site so far
            //    shares a row, so no arc spans the landing x
            (Some(left), None) => {
                let edge = diagram.create_edge(self.beachline.site(left), site, None, None);
                self.beachline.set_edge(new_arc, Some(edge));
            }

            // 3d Exactly on the break point between two arcs: no split, the
            //    meeting point becomes a Voronoi vertex right away
            (Some(left), Some(right)) => {
                self.detach_circle_event(left);
                self.detach_circle_event(right);

                let left_site = self.beachline.site(left);
                let right_site = self.beachline.site(right);
                let a = diagram.site_point(left_site);
                let c = diagram.site_point(right_site);
                let bx = point.x - a.x;
                let by = point.y - a.y;
                let cx = c.x - a.x;
                let cy = c.y - a.y;
                let d = 2.0 * (bx * cy - by * cx);
                let hb = bx * bx + by * by;
                let hc = cx * cx + cy * cy;
                let vertex = Point::new(
                    (cy * hb - by * hc) / d + a.x,
                    (bx * hc - cx * hb) / d + a.y,
                );

                let right_edge = self.beachline.edge(right).unwrap();
                diagram.set_edge_startpoint(right_edge, left_site, right_site, vertex);

                let edge = diagram.create_edge(left_site, site, None, Some(vertex));
                self.beachline.set_edge(new_arc, Some(edge));
                let edge = diagram.create_edge(site, right_site, None, Some(vertex));
                self.beachline.set_edge(right, Some(edge));

                self.attach_circle_event(diagram, left);
                self.attach_circle_event(diagram, right);
            }

            // a right neighbor without a left one cannot fall out of the
            // beachline descent
            (None, Some(_)) => {
                debug_assert!(false, "arc inserted with a right neighbor but no left neighbor");
            }
        }
    }

    fn handle_circle_event(&mut self, diagram: &mut Diagram, event: &CircleEvent) {
        let vertex = Point::new(event.x, event.ycenter);

        // 1 Gather every arc collapsing onto this vertex. Walking out from
        //   the triggering arc, neighbors whose own circle event sits within
        //   tolerance of the vertex vanish in the same batch; one boundary
        //   arc on each side survives but bounds the new edges.
        let mut arcs = vec![event.arc];
        let mut cursor = self.beachline.prev(event.arc);
        while let Some(arc) = cursor {
            if !self.collapses_at(arc, vertex) {
                break;
            }
            arcs.insert(0, arc);
            cursor = self.beachline.prev(arc);
        }
        let left_boundary = cursor.unwrap();
        arcs.insert(0, left_boundary);

        let mut cursor = self.beachline.next(event.arc);
        while let Some(arc) = cursor {
            if !self.collapses_at(arc, vertex) {
                break;
            }
            arcs.push(arc);
            cursor = self.beachline.next(arc);
        }
        let right_boundary = cursor.unwrap();
        arcs.push(right_boundary);

        // 2 Their circle events are void now
        for &arc in &arcs {
            self.detach_circle_event(arc);
        }

        // 3 The vertex starts the edge between each consecutive pair
        for pair in arcs.windows(2) {
            let edge = self.beachline.edge(pair[1]).unwrap();
            diagram.set_edge_startpoint(
                edge,
                self.beachline.site(pair[0]),
                self.beachline.site(pair[1]),
                vertex,
            );
        }

        // 4 Drop the collapsed arcs
        for &arc in &arcs[1..arcs.len() - 1] {
            self.beachline.remove(arc);
        }

        // 5 A fresh break point opens between the two boundary arcs
        let left_site = self.beachline.site(left_boundary);
        let right_site = self.beachline.site(right_boundary);
        let edge = diagram.create_edge(left_site, right_site, None, Some(vertex));
        self.beachline.set_edge(right_boundary, Some(edge));

        // 6 And either boundary arc may now collapse in turn
        self.attach_circle_event(diagram, left_boundary);
        self.attach_circle_event(diagram, right_boundary);
    }

    /// Whether this arc's pending circle event lands on `vertex`.
    fn collapses_at(&self, arc: BeachKey, vertex: Point) -> bool {
        match self.beachline.circle_event(arc) {
            Some(key) => match self.circle_events.get(key) {
                Some(event) => {
                    (event.x - vertex.x).abs() < EPSILON
                        && (event.ycenter - vertex.y).abs() < EPSILON
                }
                None => false,
            },
            None => false,
        }
    }

    /// Predicts the collapse of `arc`, if its neighbors' break points
    /// converge, and queues the circle event.
    fn attach_circle_event(&mut self, diagram: &Diagram, arc: BeachKey) {
        let left_arc = match self.beachline.prev(arc) {
            Some(left) => left,
            None => return,
        };
        let right_arc = match self.beachline.next(arc) {
            Some(right) => right,
            None => return,
        };
        let left_site = self.beachline.site(left_arc);
        let center_site = self.beachline.site(arc);
        let right_site = self.beachline.site(right_arc);
        // adjacent arcs of the same parabola never pinch the middle one off
        if left_site == right_site {
            return;
        }

        let circle = match circle_through(
            diagram.site_point(left_site),
            diagram.site_point(center_site),
            diagram.site_point(right_site),
        ) {
            Some(circle) => circle,
            None => return,
        };

        let key = self.circle_events.push(CircleEvent {
            arc,
            site: center_site,
            x: circle.x,
            y: circle.ybottom,
            ycenter: circle.ycenter,
            valid: true,
        });
        self.beachline.set_circle_event(arc, Some(key));
        self.circle_events.sanitize(self.beachline.len());
    }

    fn detach_circle_event(&mut self, arc: BeachKey) {
        if let Some(key) = self.beachline.circle_event(arc) {
            self.circle_events.invalidate(key);
            self.beachline.set_circle_event(arc, None);
        }
    }
}
