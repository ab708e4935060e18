use crate::typedvector::{TypedIndex, TypedVec};
use crate::vector2::Point;

pub type SiteIndex = TypedIndex<Site>;
pub type EdgeIndex = TypedIndex<Edge>;
pub type CellIndex = TypedIndex<Cell>;

/// An input site. `id` is the position of the site in the input slice and is
/// also the index of the cell that surrounds it.
pub struct Site {
    point: Point,
    id: usize,
}

impl Site {
    pub fn point(&self) -> Point {
        self.point
    }

    pub fn id(&self) -> usize {
        self.id
    }
}

/// A segment of the perpendicular bisector of two sites, or a synthetic
/// segment lying on the viewport boundary.
///
/// `va`/`vb` are oriented relative to `left_site`: walking from `va` to `vb`,
/// the left site's cell is on the left. During the sweep either endpoint may
/// still be unknown; after finalization an edge either has both endpoints
/// inside the viewport or has been discarded (both endpoints cleared).
///
/// A border edge has `right_site == None` and both endpoints set; border
/// edges only come into existence while cells are being closed.
#[derive(Clone, Copy)]
pub struct Edge {
    pub(crate) left_site: SiteIndex,
    pub(crate) right_site: Option<SiteIndex>,
    pub(crate) va: Option<Point>,
    pub(crate) vb: Option<Point>,
}

impl Edge {
    pub fn left_site(&self) -> SiteIndex {
        self.left_site
    }

    pub fn right_site(&self) -> Option<SiteIndex> {
        self.right_site
    }

    /// Start vertex. `None` only while the sweep is still running.
    pub fn start(&self) -> Option<Point> {
        self.va
    }

    /// End vertex. `None` only while the sweep is still running.
    pub fn end(&self) -> Option<Point> {
        self.vb
    }

    /// An edge is live once both endpoints are known; dead edges are kept in
    /// the store so indices stay valid, but are skipped by [`Diagram::edges`].
    pub fn is_live(&self) -> bool {
        self.va.is_some() && self.vb.is_some()
    }
}

/// One edge as seen from one of its two cells, with the angle used to order
/// the cell boundary counter-clockwise.
#[derive(Clone, Copy)]
pub struct HalfEdge {
    pub(crate) site: SiteIndex,
    pub(crate) edge: EdgeIndex,
    pub(crate) angle: f64,
}

impl HalfEdge {
    pub fn edge(&self) -> EdgeIndex {
        self.edge
    }

    pub fn angle(&self) -> f64 {
        self.angle
    }
}

/// The region of the plane closer to `site` than to any other site, clipped
/// to the viewport. After finalization the halfedges form a closed
/// counter-clockwise ring.
pub struct Cell {
    site: SiteIndex,
    pub(crate) halfedges: Vec<HalfEdge>,
    /// Whether the site actually entered the beachline. False for sites that
    /// were skipped as exact duplicates; their halfedge list stays empty.
    pub(crate) processed: bool,
}

impl Cell {
    pub fn site(&self) -> SiteIndex {
        self.site
    }

    pub fn halfedges(&self) -> &[HalfEdge] {
        &self.halfedges
    }
}

/// The output of a sweep: one cell per input site, plus the edges bounding
/// them.
///
/// Cells are indexed parallel to the input sites, so `cells`\[i\] surrounds
/// input site i. Edges are unordered; interior edges are referenced by
/// exactly two cells (once per orientation), border edges by one.
#[derive(Default)]
pub struct Diagram {
    sites: TypedVec<Site>,
    cells: TypedVec<Cell>,
    edges: TypedVec<Edge>,
    exec_time: f64,
}

impl Diagram {
    pub fn new() -> Self {
        Diagram::default()
    }

    /// Registers a site together with its (initially empty) cell.
    pub(crate) fn add_site(&mut self, point: Point) -> SiteIndex {
        let id = self.sites.len();
        let site = self.sites.insert(Site { point, id });
        self.cells.insert(Cell {
            site,
            halfedges: Vec::new(),
            processed: false,
        });
        site
    }

    /// Location of a site.
    ///
    /// # Panics
    /// If the site index is invalid.
    pub fn site_point(&self, site: SiteIndex) -> Point {
        self.sites.get(site).unwrap().point
    }

    pub fn num_sites(&self) -> usize {
        self.sites.len()
    }

    pub(crate) fn site_indices(&self) -> Vec<SiteIndex> {
        self.sites.indices().collect()
    }

    /// The cell surrounding a site.
    pub fn cell_of(&self, site: SiteIndex) -> CellIndex {
        CellIndex::new(site.raw())
    }

    pub fn num_cells(&self) -> usize {
        self.cells.len()
    }

    /// Index of every cell, parallel to the input sites.
    pub fn cell_indices(&self) -> Vec<CellIndex> {
        self.cells.indices().collect()
    }

    /// # Panics
    /// If the cell index is invalid.
    pub fn get_cell(&self, cell: CellIndex) -> &Cell {
        self.cells.get(cell).unwrap()
    }

    pub(crate) fn get_cell_mut(&mut self, cell: CellIndex) -> &mut Cell {
        self.cells.get_mut(cell).unwrap()
    }

    /// # Panics
    /// If the edge index is invalid.
    pub fn get_edge(&self, edge: EdgeIndex) -> &Edge {
        self.edges.get(edge).unwrap()
    }

    pub(crate) fn get_edge_mut(&mut self, edge: EdgeIndex) -> &mut Edge {
        self.edges.get_mut(edge).unwrap()
    }

    /// All live edges of the finished diagram.
    pub fn edges(&self) -> impl Iterator<Item = (EdgeIndex, &Edge)> {
        self.edges.iter().filter(|(_, edge)| edge.is_live())
    }

    pub(crate) fn edge_indices(&self) -> Vec<EdgeIndex> {
        self.edges.indices().collect()
    }

    pub(crate) fn num_live_edges(&self) -> usize {
        self.edges().count()
    }

    /// Wall-clock duration of the sweep that produced this diagram, in
    /// milliseconds.
    pub fn exec_time_ms(&self) -> f64 {
        self.exec_time
    }

    pub(crate) fn set_exec_time(&mut self, millis: f64) {
        self.exec_time = millis;
    }

    /// Creates the edge that will carry the bisector of `left_site` and
    /// `right_site`, and registers one halfedge with each of the two cells.
    /// Supplied endpoints are assigned through the orientation contract of
    /// [`Diagram::set_edge_startpoint`].
    pub(crate) fn create_edge(
        &mut self,
        left_site: SiteIndex,
        right_site: SiteIndex,
        va: Option<Point>,
        vb: Option<Point>,
    ) -> EdgeIndex {
        let edge = self.edges.insert(Edge {
            left_site,
            right_site: Some(right_site),
            va: None,
            vb: None,
        });
        if let Some(vertex) = va {
            self.set_edge_startpoint(edge, left_site, right_site, vertex);
        }
        if let Some(vertex) = vb {
            self.set_edge_endpoint(edge, left_site, right_site, vertex);
        }

        let left_halfedge = self.interior_halfedge(edge, left_site, right_site);
        let left_cell = self.cell_of(left_site);
        self.get_cell_mut(left_cell).halfedges.push(left_halfedge);

        let right_halfedge = self.interior_halfedge(edge, right_site, left_site);
        let right_cell = self.cell_of(right_site);
        self.get_cell_mut(right_cell).halfedges.push(right_halfedge);

        edge
    }

    /// Creates a fully-specified edge lying on the viewport boundary. No
    /// halfedge is registered; the cell-closing walk does that itself.
    pub(crate) fn create_border_edge(
        &mut self,
        left_site: SiteIndex,
        va: Point,
        vb: Point,
    ) -> EdgeIndex {
        self.edges.insert(Edge {
            left_site,
            right_site: None,
            va: Some(va),
            vb: Some(vb),
        })
    }

    /// Records `vertex` as the start of `edge` as seen from the cell of
    /// `left_site`.
    ///
    /// A fresh edge (no endpoints yet) is re-oriented so that `left_site`
    /// becomes its left site and `vertex` its start. Otherwise, when the call
    /// arrives from the opposite cell's perspective (`edge.left_site ==
    /// right_site`) the vertex is recorded as the end instead; the edge's
    /// `va`/`vb` thereby always stay oriented relative to its recorded left
    /// site.
    pub(crate) fn set_edge_startpoint(
        &mut self,
        edge: EdgeIndex,
        left_site: SiteIndex,
        right_site: SiteIndex,
        vertex: Point,
    ) {
        let edge = self.edges.get_mut(edge).unwrap();
        if edge.va.is_none() && edge.vb.is_none() {
            edge.va = Some(vertex);
            edge.left_site = left_site;
            edge.right_site = Some(right_site);
        } else if edge.left_site == right_site {
            edge.vb = Some(vertex);
        } else {
            edge.va = Some(vertex);
        }
    }

    /// Records `vertex` as the end of `edge` as seen from the cell of
    /// `left_site`; equivalent to [`Diagram::set_edge_startpoint`] from the
    /// opposite perspective.
    pub(crate) fn set_edge_endpoint(
        &mut self,
        edge: EdgeIndex,
        left_site: SiteIndex,
        right_site: SiteIndex,
        vertex: Point,
    ) {
        self.set_edge_startpoint(edge, right_site, left_site, vertex);
    }

    /// Clears both endpoints, removing the edge from the output.
    pub(crate) fn kill_edge(&mut self, edge: EdgeIndex) {
        let edge = self.edges.get_mut(edge).unwrap();
        edge.va = None;
        edge.vb = None;
    }

    fn interior_halfedge(
        &self,
        edge: EdgeIndex,
        owner: SiteIndex,
        other: SiteIndex,
    ) -> HalfEdge {
        let owner_point = self.site_point(owner);
        let other_point = self.site_point(other);
        HalfEdge {
            site: owner,
            edge,
            angle: (other_point.y - owner_point.y).atan2(other_point.x - owner_point.x),
        }
    }

    /// Halfedge for a border edge; the angle is that of the outward normal.
    pub(crate) fn border_halfedge(&self, edge: EdgeIndex, owner: SiteIndex) -> HalfEdge {
        let e = self.get_edge(edge);
        let va = e.va.unwrap();
        let vb = e.vb.unwrap();
        let angle = if e.left_site == owner {
            (vb.x - va.x).atan2(va.y - vb.y)
        } else {
            (va.x - vb.x).atan2(vb.y - va.y)
        };
        HalfEdge {
            site: owner,
            edge,
            angle,
        }
    }

    /// Where the cell boundary enters this halfedge's edge.
    ///
    /// # Panics
    /// If the underlying edge has a missing endpoint.
    pub fn halfedge_startpoint(&self, halfedge: &HalfEdge) -> Point {
        let edge = self.get_edge(halfedge.edge);
        if edge.left_site == halfedge.site {
            edge.va.unwrap()
        } else {
            edge.vb.unwrap()
        }
    }

    /// Where the cell boundary leaves this halfedge's edge.
    ///
    /// # Panics
    /// If the underlying edge has a missing endpoint.
    pub fn halfedge_endpoint(&self, halfedge: &HalfEdge) -> Point {
        let edge = self.get_edge(halfedge.edge);
        if edge.left_site == halfedge.site {
            edge.vb.unwrap()
        } else {
            edge.va.unwrap()
        }
    }

    /// Drops halfedges whose edge lost an endpoint during clipping and orders
    /// the survivors counter-clockwise. Returns how many remain.
    pub(crate) fn prepare_cell(&mut self, cell: CellIndex) -> usize {
        let mut halfedges = std::mem::take(&mut self.get_cell_mut(cell).halfedges);
        halfedges.retain(|halfedge| self.edges.get(halfedge.edge).unwrap().is_live());
        halfedges.sort_by(|a, b| b.angle.partial_cmp(&a.angle).unwrap());
        let remaining = halfedges.len();
        self.get_cell_mut(cell).halfedges = halfedges;
        remaining
    }

    /// The vertices of a finished cell, one per halfedge, in ring order.
    pub fn cell_ring(&self, cell: CellIndex) -> Vec<Point> {
        self.get_cell(cell)
            .halfedges
            .iter()
            .map(|halfedge| self.halfedge_startpoint(halfedge))
            .collect()
    }

    /// Area of a finished cell.
    pub fn cell_area(&self, cell: CellIndex) -> f64 {
        self.get_cell(cell)
            .halfedges
            .iter()
            .fold(0.0, |acc, halfedge| {
                let start = self.halfedge_startpoint(halfedge);
                let end = self.halfedge_endpoint(halfedge);
                acc + start.x * end.y - end.x * start.y
            })
            .abs()
            * 0.5
    }

    /// Arithmetic mean of a finished cell's ring vertices. Used as the
    /// relaxation target when spreading sites more evenly.
    pub fn cell_centroid(&self, cell: CellIndex) -> Option<Point> {
        let ring = self.cell_ring(cell);
        if ring.is_empty() {
            return None;
        }
        let n = ring.len() as f64;
        let (x, y) = ring
            .iter()
            .fold((0.0, 0.0), |(x, y), point| (x + point.x, y + point.y));
        Some(Point::new(x / n, y / n))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use crate::vector2::EPSILON;

    fn two_site_diagram() -> (Diagram, SiteIndex, SiteIndex) {
        let mut diagram = Diagram::new();
        let left = diagram.add_site(Point::new(0.0, 0.0));
        let right = diagram.add_site(Point::new(2.0, 0.0));
        (diagram, left, right)
    }

    #[test]
    fn create_edge_registers_a_halfedge_with_both_cells() {
        let (mut diagram, left, right) = two_site_diagram();
        let edge = diagram.create_edge(left, right, None, None);

        let left_cell = diagram.get_cell(diagram.cell_of(left));
        let right_cell = diagram.get_cell(diagram.cell_of(right));
        assert_eq!(left_cell.halfedges.len(), 1);
        assert_eq!(right_cell.halfedges.len(), 1);
        assert_eq!(left_cell.halfedges[0].edge(), edge);

        // Angles point from each owning site toward the other.
        assert_abs_diff_eq!(left_cell.halfedges[0].angle(), 0.0, epsilon = EPSILON);
        assert_abs_diff_eq!(
            right_cell.halfedges[0].angle(),
            std::f64::consts::PI,
            epsilon = EPSILON
        );
    }

    #[test]
    fn startpoint_orientation_contract() {
        let (mut diagram, left, right) = two_site_diagram();
        let edge = diagram.create_edge(left, right, None, None);

        // First assignment orients the edge.
        diagram.set_edge_startpoint(edge, left, right, Point::new(1.0, -1.0));
        assert_eq!(diagram.get_edge(edge).start(), Some(Point::new(1.0, -1.0)));
        assert_eq!(diagram.get_edge(edge).end(), None);

        // Same call from the other cell's perspective lands on the far end.
        diagram.set_edge_startpoint(edge, right, left, Point::new(1.0, 1.0));
        assert_eq!(diagram.get_edge(edge).start(), Some(Point::new(1.0, -1.0)));
        assert_eq!(diagram.get_edge(edge).end(), Some(Point::new(1.0, 1.0)));
    }

    #[test]
    fn endpoint_is_startpoint_with_sites_swapped() {
        let (mut diagram, left, right) = two_site_diagram();
        let edge = diagram.create_edge(left, right, None, Some(Point::new(1.0, 1.0)));

        // A fresh edge given only an endpoint is re-oriented so the vertex
        // becomes its start from the swapped perspective.
        let stored = diagram.get_edge(edge);
        assert_eq!(stored.left_site(), right);
        assert_eq!(stored.right_site(), Some(left));
        assert_eq!(stored.start(), Some(Point::new(1.0, 1.0)));
    }

    #[test]
    fn prepare_cell_drops_dead_edges_and_sorts() {
        let (mut diagram, left, right) = two_site_diagram();
        let live = diagram.create_edge(left, right, None, None);
        diagram.set_edge_startpoint(live, left, right, Point::new(1.0, -1.0));
        diagram.set_edge_endpoint(live, left, right, Point::new(1.0, 1.0));
        let dead = diagram.create_edge(left, right, None, None);
        diagram.kill_edge(dead);

        let cell = diagram.cell_of(left);
        assert_eq!(diagram.get_cell(cell).halfedges.len(), 2);
        assert_eq!(diagram.prepare_cell(cell), 1);
        assert_eq!(diagram.get_cell(cell).halfedges[0].edge(), live);
    }

    #[test]
    fn cell_area_of_unit_square_ring() {
        let mut diagram = Diagram::new();
        let site = diagram.add_site(Point::new(0.5, 0.5));
        // Four border edges tracing the unit square.
        let corners = [
            (Point::new(0.0, 0.0), Point::new(0.0, 1.0)),
            (Point::new(0.0, 1.0), Point::new(1.0, 1.0)),
            (Point::new(1.0, 1.0), Point::new(1.0, 0.0)),
            (Point::new(1.0, 0.0), Point::new(0.0, 0.0)),
        ];
        for &(va, vb) in &corners {
            let edge = diagram.create_border_edge(site, va, vb);
            let halfedge = diagram.border_halfedge(edge, site);
            let cell = diagram.cell_of(site);
            diagram.get_cell_mut(cell).halfedges.push(halfedge);
        }

        let cell = diagram.cell_of(site);
        assert_abs_diff_eq!(diagram.cell_area(cell), 1.0, epsilon = EPSILON);
        let centroid = diagram.cell_centroid(cell).unwrap();
        assert_abs_diff_eq!(centroid.x, 0.5, epsilon = EPSILON);
        assert_abs_diff_eq!(centroid.y, 0.5, epsilon = EPSILON);
    }
}
