use slotmap::{new_key_type, SlotMap};

use crate::diagram::{Diagram, EdgeIndex, SiteIndex};
use crate::event::CircleKey;
use crate::vector2::{Point, EPSILON};

new_key_type! {
    /// Generational key of an arc slot. A key held by a lapsed circle event
    /// simply stops resolving once the slot is reused.
    pub struct BeachKey;
}

/// One parabolic arc of the beachline.
///
/// The tree links (`parent`/`left`/`right`, colored by `red`) and the
/// neighbor links (`prev`/`next`) are updated in lock-step: `prev` and
/// `next` always agree with the in-order traversal of the tree.
#[derive(Clone, Copy)]
pub struct Beachsection {
    pub site: SiteIndex,
    /// The edge traced out by this arc's left break point.
    pub edge: Option<EdgeIndex>,
    /// The pending event that would collapse this arc, if any.
    pub circle_event: Option<CircleKey>,
    parent: Option<BeachKey>,
    left: Option<BeachKey>,
    right: Option<BeachKey>,
    prev: Option<BeachKey>,
    next: Option<BeachKey>,
    red: bool,
}

/// The x-ordered sequence of arcs below the sweepline, stored as a red-black
/// tree whose nodes live in a slotmap arena. The arena's free list doubles
/// as the arc pool: slots freed by collapsed arcs are reused by later
/// insertions, and the arena keeps its capacity across [`Beachline::clear`].
pub struct Beachline {
    arcs: SlotMap<BeachKey, Beachsection>,
    root: Option<BeachKey>,
}

impl Beachline {
    pub fn new() -> Self {
        Beachline {
            arcs: SlotMap::with_key(),
            root: None,
        }
    }

    /// Returns all arcs to the pool.
    pub fn clear(&mut self) {
        self.arcs.clear();
        self.root = None;
    }

    /// Number of arcs currently on the beachline.
    pub fn len(&self) -> usize {
        self.arcs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.root.is_none()
    }

    /// Allocates a detached arc for `site`; link it in with
    /// [`Beachline::insert_successor`].
    pub fn create_arc(&mut self, site: SiteIndex) -> BeachKey {
        self.arcs.insert(Beachsection {
            site,
            edge: None,
            circle_event: None,
            parent: None,
            left: None,
            right: None,
            prev: None,
            next: None,
            red: false,
        })
    }

    pub fn site(&self, arc: BeachKey) -> SiteIndex {
        self.arcs[arc].site
    }

    pub fn edge(&self, arc: BeachKey) -> Option<EdgeIndex> {
        self.arcs[arc].edge
    }

    pub fn set_edge(&mut self, arc: BeachKey, edge: Option<EdgeIndex>) {
        self.arcs[arc].edge = edge;
    }

    pub fn circle_event(&self, arc: BeachKey) -> Option<CircleKey> {
        self.arcs[arc].circle_event
    }

    pub fn set_circle_event(&mut self, arc: BeachKey, event: Option<CircleKey>) {
        self.arcs[arc].circle_event = event;
    }

    /// Left neighbor on the beachline, in O(1).
    pub fn prev(&self, arc: BeachKey) -> Option<BeachKey> {
        self.arcs[arc].prev
    }

    /// Right neighbor on the beachline, in O(1).
    pub fn next(&self, arc: BeachKey) -> Option<BeachKey> {
        self.arcs[arc].next
    }

    /// Leftmost arc.
    pub fn first(&self) -> Option<BeachKey> {
        self.root.map(|root| self.leftmost_from(root))
    }

    fn leftmost_from(&self, mut node: BeachKey) -> BeachKey {
        while let Some(left) = self.arcs[node].left {
            node = left;
        }
        node
    }

    fn is_red(&self, node: Option<BeachKey>) -> bool {
        node.map_or(false, |key| self.arcs[key].red)
    }

    /// Links `successor` immediately after `node` in beachline order, or as
    /// the leftmost arc when `node` is `None`, then rebalances.
    pub fn insert_successor(&mut self, node: Option<BeachKey>, successor: BeachKey) {
        let mut parent;
        if let Some(node) = node {
            // splice into the neighbor chain
            self.arcs[successor].prev = Some(node);
            self.arcs[successor].next = self.arcs[node].next;
            if let Some(next) = self.arcs[node].next {
                self.arcs[next].prev = Some(successor);
            }
            self.arcs[node].next = Some(successor);
            // hang off the in-order successor position in the tree
            if let Some(right) = self.arcs[node].right {
                let attach = self.leftmost_from(right);
                self.arcs[attach].left = Some(successor);
                parent = Some(attach);
            } else {
                self.arcs[node].right = Some(successor);
                parent = Some(node);
            }
        } else if let Some(root) = self.root {
            let leftmost = self.leftmost_from(root);
            self.arcs[successor].prev = None;
            self.arcs[successor].next = Some(leftmost);
            self.arcs[leftmost].prev = Some(successor);
            self.arcs[leftmost].left = Some(successor);
            parent = Some(leftmost);
        } else {
            self.arcs[successor].prev = None;
            self.arcs[successor].next = None;
            self.root = Some(successor);
            parent = None;
        }
        self.arcs[successor].left = None;
        self.arcs[successor].right = None;
        self.arcs[successor].parent = parent;
        self.arcs[successor].red = true;

        // insertion fixup
        let mut node = successor;
        while let Some(mut p) = parent {
            if !self.arcs[p].red {
                break;
            }
            let grandpa = self.arcs[p].parent.unwrap();
            if Some(p) == self.arcs[grandpa].left {
                let uncle = self.arcs[grandpa].right;
                if self.is_red(uncle) {
                    self.arcs[p].red = false;
                    self.arcs[uncle.unwrap()].red = false;
                    self.arcs[grandpa].red = true;
                    node = grandpa;
                } else {
                    if Some(node) == self.arcs[p].right {
                        self.rotate_left(p);
                        node = p;
                        p = self.arcs[node].parent.unwrap();
                    }
                    self.arcs[p].red = false;
                    self.arcs[grandpa].red = true;
                    self.rotate_right(grandpa);
                }
            } else {
                let uncle = self.arcs[grandpa].left;
                if self.is_red(uncle) {
                    self.arcs[p].red = false;
                    self.arcs[uncle.unwrap()].red = false;
                    self.arcs[grandpa].red = true;
                    node = grandpa;
                } else {
                    if Some(node) == self.arcs[p].left {
                        self.rotate_right(p);
                        node = p;
                        p = self.arcs[node].parent.unwrap();
                    }
                    self.arcs[p].red = false;
                    self.arcs[grandpa].red = true;
                    self.rotate_left(grandpa);
                }
            }
            parent = self.arcs[node].parent;
        }
        let root = self.root.unwrap();
        self.arcs[root].red = false;
    }

    /// Unlinks `node` from the neighbor chain and the tree, rebalances, and
    /// frees the slot.
    pub fn remove(&mut self, node: BeachKey) {
        // neighbor chain first
        if let Some(next) = self.arcs[node].next {
            self.arcs[next].prev = self.arcs[node].prev;
        }
        if let Some(prev) = self.arcs[node].prev {
            self.arcs[prev].next = self.arcs[node].next;
        }
        self.arcs[node].next = None;
        self.arcs[node].prev = None;

        let mut parent = self.arcs[node].parent;
        let left = self.arcs[node].left;
        let right = self.arcs[node].right;
        let next = match (left, right) {
            (None, r) => r,
            (l, None) => l,
            (_, Some(r)) => Some(self.leftmost_from(r)),
        };
        match parent {
            Some(p) => {
                if self.arcs[p].left == Some(node) {
                    self.arcs[p].left = next;
                } else {
                    self.arcs[p].right = next;
                }
            }
            None => self.root = next,
        }

        let was_red;
        let mut fix;
        if let (Some(left), Some(right)) = (left, right) {
            let successor = next.unwrap();
            was_red = self.arcs[successor].red;
            self.arcs[successor].red = self.arcs[node].red;
            self.arcs[successor].left = Some(left);
            self.arcs[left].parent = Some(successor);
            if successor != right {
                parent = self.arcs[successor].parent;
                self.arcs[successor].parent = self.arcs[node].parent;
                fix = self.arcs[successor].right;
                self.arcs[parent.unwrap()].left = fix;
                self.arcs[successor].right = Some(right);
                self.arcs[right].parent = Some(successor);
            } else {
                self.arcs[successor].parent = parent;
                parent = Some(successor);
                fix = self.arcs[successor].right;
            }
        } else {
            was_red = self.arcs[node].red;
            fix = next;
        }
        self.arcs.remove(node);

        if let Some(f) = fix {
            self.arcs[f].parent = parent;
        }
        if was_red {
            return;
        }
        if let Some(f) = fix {
            if self.arcs[f].red {
                self.arcs[f].red = false;
                return;
            }
        }

        // removal fixup
        loop {
            if fix == self.root {
                break;
            }
            let p = parent.unwrap();
            if fix == self.arcs[p].left {
                let mut sibling = self.arcs[p].right.unwrap();
                if self.arcs[sibling].red {
                    self.arcs[sibling].red = false;
                    self.arcs[p].red = true;
                    self.rotate_left(p);
                    sibling = self.arcs[p].right.unwrap();
                }
                if self.is_red(self.arcs[sibling].left) || self.is_red(self.arcs[sibling].right) {
                    if !self.is_red(self.arcs[sibling].right) {
                        let sibling_left = self.arcs[sibling].left.unwrap();
                        self.arcs[sibling_left].red = false;
                        self.arcs[sibling].red = true;
                        self.rotate_right(sibling);
                        sibling = self.arcs[p].right.unwrap();
                    }
                    self.arcs[sibling].red = self.arcs[p].red;
                    self.arcs[p].red = false;
                    let sibling_right = self.arcs[sibling].right.unwrap();
                    self.arcs[sibling_right].red = false;
                    self.rotate_left(p);
                    fix = self.root;
                    break;
                }
                self.arcs[sibling].red = true;
            } else {
                let mut sibling = self.arcs[p].left.unwrap();
                if self.arcs[sibling].red {
                    self.arcs[sibling].red = false;
                    self.arcs[p].red = true;
                    self.rotate_right(p);
                    sibling = self.arcs[p].left.unwrap();
                }
                if self.is_red(self.arcs[sibling].left) || self.is_red(self.arcs[sibling].right) {
                    if !self.is_red(self.arcs[sibling].left) {
                        let sibling_right = self.arcs[sibling].right.unwrap();
                        self.arcs[sibling_right].red = false;
                        self.arcs[sibling].red = true;
                        self.rotate_left(sibling);
                        sibling = self.arcs[p].left.unwrap();
                    }
                    self.arcs[sibling].red = self.arcs[p].red;
                    self.arcs[p].red = false;
                    let sibling_left = self.arcs[sibling].left.unwrap();
                    self.arcs[sibling_left].red = false;
                    self.rotate_right(p);
                    fix = self.root;
                    break;
                }
                self.arcs[sibling].red = true;
            }
            fix = Some(p);
            parent = self.arcs[p].parent;
            if self.arcs[p].red {
                break;
            }
        }
        if let Some(f) = fix {
            self.arcs[f].red = false;
        }
    }

    fn rotate_left(&mut self, node: BeachKey) {
        let pivot = self.arcs[node].right.unwrap();
        let parent = self.arcs[node].parent;
        match parent {
            Some(p) => {
                if self.arcs[p].left == Some(node) {
                    self.arcs[p].left = Some(pivot);
                } else {
                    self.arcs[p].right = Some(pivot);
                }
            }
            None => self.root = Some(pivot),
        }
        self.arcs[pivot].parent = parent;
        self.arcs[node].parent = Some(pivot);
        self.arcs[node].right = self.arcs[pivot].left;
        if let Some(right) = self.arcs[node].right {
            self.arcs[right].parent = Some(node);
        }
        self.arcs[pivot].left = Some(node);
    }

    fn rotate_right(&mut self, node: BeachKey) {
        let pivot = self.arcs[node].left.unwrap();
        let parent = self.arcs[node].parent;
        match parent {
            Some(p) => {
                if self.arcs[p].left == Some(node) {
                    self.arcs[p].left = Some(pivot);
                } else {
                    self.arcs[p].right = Some(pivot);
                }
            }
            None => self.root = Some(pivot),
        }
        self.arcs[pivot].parent = parent;
        self.arcs[node].parent = Some(pivot);
        self.arcs[node].left = self.arcs[pivot].right;
        if let Some(left) = self.arcs[node].left {
            self.arcs[left].parent = Some(node);
        }
        self.arcs[pivot].right = Some(node);
    }

    /// x where this arc meets its left neighbor at the given sweepline
    /// position, or `-inf` for the leftmost arc.
    ///
    /// The algebraic form is kept exactly as is; reassociating it worsens
    /// cancellation for nearly-equal foci.
    pub fn left_break_point(&self, arc: BeachKey, directrix: f64, diagram: &Diagram) -> f64 {
        let site = diagram.site_point(self.arcs[arc].site);
        let rfocx = site.x;
        let rfocy = site.y;
        let pby2 = rfocy - directrix;
        // focus on the directrix: the arc degenerates to a vertical ray
        if pby2 == 0.0 {
            return rfocx;
        }
        let left_arc = match self.arcs[arc].prev {
            Some(left) => left,
            None => return f64::NEG_INFINITY,
        };
        let site = diagram.site_point(self.arcs[left_arc].site);
        let lfocx = site.x;
        let lfocy = site.y;
        let plby2 = lfocy - directrix;
        if plby2 == 0.0 {
            return lfocx;
        }
        let hl = lfocx - rfocx;
        let aby2 = 1.0 / pby2 - 1.0 / plby2;
        let b = hl / plby2;
        if aby2 != 0.0 {
            return (-b
                + (b * b
                    - 2.0 * aby2
                        * (hl * hl / (-2.0 * plby2) - lfocy + plby2 / 2.0 + rfocy - pby2 / 2.0))
                    .sqrt())
                / aby2
                + rfocx;
        }
        // both foci equidistant from the directrix
        (rfocx + lfocx) / 2.0
    }

    /// x where this arc meets its right neighbor, or `+inf` for the
    /// rightmost arc (its own x when its focus sits on the directrix).
    pub fn right_break_point(&self, arc: BeachKey, directrix: f64, diagram: &Diagram) -> f64 {
        if let Some(right_arc) = self.arcs[arc].next {
            return self.left_break_point(right_arc, directrix, diagram);
        }
        let site = diagram.site_point(self.arcs[arc].site);
        if site.y == directrix {
            site.x
        } else {
            f64::INFINITY
        }
    }

    /// Finds where a new site lands on the beachline by descending the tree.
    ///
    /// The pair returned encodes the insertion shape:
    /// - `(None, None)`: beachline is empty, the new arc becomes the root;
    /// - both equal: the new site is strictly inside that arc, split it;
    /// - both set but different: the new site falls on the break point
    ///   between the two (within tolerance), insert between them;
    /// - `(Some, None)`: the new site lies beyond the rightmost arc.
    pub fn locate_arc(
        &self,
        point: Point,
        diagram: &Diagram,
    ) -> (Option<BeachKey>, Option<BeachKey>) {
        let x = point.x;
        let directrix = point.y;
        let mut left_arc = None;
        let mut right_arc = None;
        let mut node = self.root;
        while let Some(n) = node {
            let dxl = self.left_break_point(n, directrix, diagram) - x;
            if dxl > EPSILON {
                node = self.arcs[n].left;
            } else {
                let dxr = x - self.right_break_point(n, directrix, diagram);
                if dxr > EPSILON {
                    match self.arcs[n].right {
                        Some(right) => node = Some(right),
                        None => {
                            left_arc = Some(n);
                            break;
                        }
                    }
                } else {
                    if dxl > -EPSILON {
                        left_arc = self.arcs[n].prev;
                        right_arc = Some(n);
                    } else if dxr > -EPSILON {
                        left_arc = Some(n);
                        right_arc = self.arcs[n].next;
                    } else {
                        left_arc = Some(n);
                        right_arc = Some(n);
                    }
                    break;
                }
            }
        }
        (left_arc, right_arc)
    }
}
