//! Greedy coalescing of differing blocks into fewer, larger patch rectangles

use crate::io::configuration::{MERGE_EDGE_OVERLAP_RATIO, MERGE_WASTE_LIMIT};
use crate::model::Rectangle;

/// How two rectangles relate for merging purposes
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Contact {
    /// The rectangles share pixels
    Overlapping,
    /// The rectangles touch along an edge long enough to be worth joining
    Adjacent,
    /// Too far apart, or touching only along a short stretch
    Separate,
}

/// Classify the relationship between two rectangles
///
/// Touching rectangles count as [`Contact::Adjacent`] only when the shared
/// stretch of edge is at least half the shorter of the two touching sides.
pub fn contact(a: &Rectangle, b: &Rectangle) -> Contact {
    if a.intersects(b) {
        return Contact::Overlapping;
    }

    let touch_horizontally = a.right() == b.x || b.right() == a.x;
    let touch_vertically = a.bottom() == b.y || b.bottom() == a.y;

    let adjacent = if touch_horizontally {
        shared_edge_is_long(a.y, a.bottom(), b.y, b.bottom())
    } else if touch_vertically {
        shared_edge_is_long(a.x, a.right(), b.x, b.right())
    } else {
        false
    };

    if adjacent {
        Contact::Adjacent
    } else {
        Contact::Separate
    }
}

fn shared_edge_is_long(a_start: u32, a_end: u32, b_start: u32, b_end: u32) -> bool {
    let shared = a_end.min(b_end).saturating_sub(a_start.max(b_start));
    let shorter = (a_end - a_start).min(b_end - b_start);
    shared > 0 && f64::from(shared) >= f64::from(shorter) * MERGE_EDGE_OVERLAP_RATIO
}

/// Whether the bounding union of two rectangles wastes too much area
pub fn union_is_wasteful(a: &Rectangle, b: &Rectangle) -> bool {
    let union = a.union(b);
    union.area() as f64 > (a.area() + b.area()) as f64 * MERGE_WASTE_LIMIT
}

/// Decide whether two rectangles should become one
///
/// Overlapping rectangles always merge so the final set never overlaps.
/// Adjacent rectangles merge unless their union exceeds the waste limit.
pub fn should_merge(a: &Rectangle, b: &Rectangle) -> bool {
    match contact(a, b) {
        Contact::Overlapping => true,
        Contact::Adjacent => !union_is_wasteful(a, b),
        Contact::Separate => false,
    }
}

/// Coalesce rectangles until a full pass finds nothing left to merge
///
/// Pairs are tried in input order; the merged rectangle keeps the slot of the
/// earlier one, so identical inputs always produce identical outputs.
pub fn merge_rectangles(mut rects: Vec<Rectangle>) -> Vec<Rectangle> {
    rects.retain(|rect| !rect.is_empty());

    loop {
        let mut merged_any = false;
        let mut i = 0;
        while i < rects.len() {
            let mut j = i + 1;
            while j < rects.len() {
                let (Some(&current), Some(&candidate)) = (rects.get(i), rects.get(j)) else {
                    break;
                };
                if should_merge(&current, &candidate) {
                    if let Some(slot) = rects.get_mut(i) {
                        *slot = current.union(&candidate);
                    }
                    rects.remove(j);
                    merged_any = true;
                    // The grown rectangle may now reach earlier candidates
                    j = i + 1;
                } else {
                    j += 1;
                }
            }
            i += 1;
        }

        if !merged_any {
            return rects;
        }
    }
}
