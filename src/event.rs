use slotmap::{new_key_type, SlotMap};

use crate::beachline::BeachKey;
use crate::diagram::{Diagram, SiteIndex};

new_key_type! {
    /// Generational key of a queued circle event.
    pub struct CircleKey;
}

/// A predicted arc collapse.
///
/// `y` is the sweepline position at which the arc vanishes (the bottom of
/// the circumscribing circle); `(x, ycenter)` is the Voronoi vertex the
/// collapse produces. Invalidation is lazy: `valid` is cleared and the entry
/// stays queued until it reaches the head or a sanitize pass sweeps it out.
#[derive(Clone, Copy)]
pub struct CircleEvent {
    pub arc: BeachKey,
    pub site: SiteIndex,
    pub x: f64,
    pub y: f64,
    pub ycenter: f64,
    pub valid: bool,
}

/// The site events, fixed at the start of the sweep.
///
/// Sites are sorted by (y descending, x descending) so that popping from the
/// back yields ascending y, ties broken by ascending x.
pub struct SiteQueue(Vec<SiteIndex>);

impl SiteQueue {
    pub fn new(diagram: &Diagram) -> Self {
        let mut sites = diagram.site_indices();
        sites.sort_by(|&a, &b| {
            let pa = diagram.site_point(a);
            let pb = diagram.site_point(b);
            (pb.y, pb.x).partial_cmp(&(pa.y, pa.x)).unwrap()
        });
        SiteQueue(sites)
    }

    pub fn pop(&mut self) -> Option<SiteIndex> {
        self.0.pop()
    }
}

/// The dynamic queue of circle events.
///
/// Events live in a slotmap so that arcs can hold on to a stable key for
/// invalidation; `order` keeps the keys sorted by (y descending,
/// x descending), making the back the next event to fire and the front the
/// region farthest from the sweepline.
#[derive(Default)]
pub struct CircleQueue {
    events: SlotMap<CircleKey, CircleEvent>,
    order: Vec<CircleKey>,
}

impl CircleQueue {
    pub fn new() -> Self {
        CircleQueue {
            events: SlotMap::with_key(),
            order: Vec::new(),
        }
    }

    pub fn clear(&mut self) {
        self.events.clear();
        self.order.clear();
    }

    /// Physical queue length, invalidated entries included.
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Queues an event at its (y, x) position, found by binary search.
    pub fn push(&mut self, event: CircleEvent) -> CircleKey {
        let (x, y) = (event.x, event.y);
        let key = self.events.insert(event);
        let at = self.order.partition_point(|&queued| {
            let event = &self.events[queued];
            (event.y, event.x) > (y, x)
        });
        self.order.insert(at, key);
        key
    }

    /// Looks up a queued event; `None` once the slot has been reclaimed.
    pub fn get(&self, key: CircleKey) -> Option<&CircleEvent> {
        self.events.get(key)
    }

    /// Marks an event void. The physical entry stays until popped over or
    /// sanitized away; a key whose slot was already reclaimed is a no-op.
    pub fn invalidate(&mut self, key: CircleKey) {
        if let Some(event) = self.events.get_mut(key) {
            event.valid = false;
        }
    }

    /// The next event to fire, with invalidated entries skipped over.
    pub fn peek(&mut self) -> Option<&CircleEvent> {
        self.prune_back();
        match self.order.last() {
            Some(&key) => self.events.get(key),
            None => None,
        }
    }

    pub fn pop(&mut self) -> Option<CircleEvent> {
        self.prune_back();
        let key = self.order.pop()?;
        self.events.remove(key)
    }

    fn prune_back(&mut self) {
        while let Some(&key) = self.order.last() {
            if self.events[key].valid {
                break;
            }
            self.order.pop();
            self.events.remove(key);
        }
    }

    /// Compacts the queue once it holds more than twice as many entries as
    /// there are arcs, dropping invalidated entries from the front and
    /// stopping as soon as the length falls below the arc count.
    pub fn sanitize(&mut self, arc_count: usize) {
        if self.order.len() <= 2 * arc_count {
            return;
        }
        let mut index = 0;
        while index < self.order.len() && self.order.len() >= arc_count {
            let key = self.order[index];
            if self.events[key].valid {
                index += 1;
            } else {
                self.events.remove(key);
                self.order.remove(index);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vector2::Point;

    fn circle_event(x: f64, y: f64) -> CircleEvent {
        CircleEvent {
            arc: BeachKey::default(),
            site: SiteIndex::new(0),
            x,
            y,
            ycenter: y,
            valid: true,
        }
    }

    #[test]
    fn circle_events_pop_in_ascending_y_order() {
        let mut queue = CircleQueue::new();
        queue.push(circle_event(0.0, 0.52));
        queue.push(circle_event(0.0, 0.17));
        queue.push(circle_event(0.0, 0.93));
        queue.push(circle_event(0.0, 0.44));

        assert_eq!(queue.pop().unwrap().y, 0.17);
        assert_eq!(queue.pop().unwrap().y, 0.44);

        queue.push(circle_event(0.0, 0.21));

        assert_eq!(queue.pop().unwrap().y, 0.21);
        assert_eq!(queue.pop().unwrap().y, 0.52);
        assert_eq!(queue.pop().unwrap().y, 0.93);
        assert!(queue.pop().is_none());
    }

    #[test]
    fn equal_y_ties_break_on_x() {
        let mut queue = CircleQueue::new();
        queue.push(circle_event(0.7, 0.5));
        queue.push(circle_event(0.2, 0.5));
        queue.push(circle_event(0.4, 0.5));

        assert_eq!(queue.pop().unwrap().x, 0.2);
        assert_eq!(queue.pop().unwrap().x, 0.4);
        assert_eq!(queue.pop().unwrap().x, 0.7);
    }

    #[test]
    fn invalidated_events_are_skipped() {
        let mut queue = CircleQueue::new();
        queue.push(circle_event(0.0, 0.3));
        let doomed = queue.push(circle_event(0.0, 0.1));
        queue.push(circle_event(0.0, 0.2));

        queue.invalidate(doomed);

        assert_eq!(queue.peek().unwrap().y, 0.2);
        assert_eq!(queue.pop().unwrap().y, 0.2);
        assert_eq!(queue.pop().unwrap().y, 0.3);
        assert!(queue.pop().is_none());
    }

    #[test]
    fn invalidating_a_reclaimed_key_is_harmless() {
        let mut queue = CircleQueue::new();
        let key = queue.push(circle_event(0.0, 0.1));
        assert_eq!(queue.pop().unwrap().y, 0.1);

        queue.invalidate(key);
        assert!(queue.pop().is_none());
    }

    #[test]
    fn sanitize_compacts_the_far_end() {
        let mut queue = CircleQueue::new();
        let mut keys = vec![];
        for i in 0..20 {
            keys.push(queue.push(circle_event(0.0, 1.0 - f64::from(i) * 0.01)));
        }
        // Void everything but the four entries nearest to firing (the
        // smallest y values, which sit at the back).
        for &key in &keys[..16] {
            queue.invalidate(key);
        }

        // 20 entries against 4 live arcs triggers compaction; only the four
        // still-valid entries survive.
        queue.sanitize(4);
        assert_eq!(queue.len(), 4);

        assert_eq!(queue.pop().unwrap().y, 0.81);
    }

    #[test]
    fn site_queue_pops_by_ascending_y_then_x() {
        let mut diagram = Diagram::new();
        for &(x, y) in &[(0.5, 0.9), (0.3, 0.1), (0.8, 0.4), (0.1, 0.4), (0.9, 0.1)] {
            diagram.add_site(Point::new(x, y));
        }
        let mut queue = SiteQueue::new(&diagram);

        let mut order = vec![];
        while let Some(site) = queue.pop() {
            let point = diagram.site_point(site);
            order.push((point.x, point.y));
        }
        assert_eq!(
            order,
            vec![(0.3, 0.1), (0.9, 0.1), (0.1, 0.4), (0.8, 0.4), (0.5, 0.9)]
        );
    }
}
