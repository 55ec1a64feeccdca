//! Approach ordering around a signal group's anchor
//!
//! The host numbers a junction's approaches clockwise. Layouts that number
//! them differently plug in their own [`ApproachOrdering`].

use std::cmp::Ordering;
use std::fmt::Debug;

use contracts::Location;

/// Comparator used to sort installations around an anchor point
///
/// Implementations must be a total order over offsets from `anchor`.
pub trait ApproachOrdering: Debug + Send + Sync {
    fn compare(&self, anchor: &Location, a: &Location, b: &Location) -> Ordering;
}

/// Clockwise order, starting just west of due south
///
/// Offsets with negative x (the western half-plane) come first, then the
/// eastern half-plane from north through east to south. Within a half-plane
/// the sign of the 2D cross product decides. The anchor itself sorts first.
#[derive(Debug, Clone, Copy, Default)]
pub struct Clockwise;

impl ApproachOrdering for Clockwise {
    fn compare(&self, anchor: &Location, a: &Location, b: &Location) -> Ordering {
        let (ax, ay) = (a.x - anchor.x, a.y - anchor.y);
        let (bx, by) = (b.x - anchor.x, b.y - anchor.y);

        let a_zero = ax == 0.0 && ay == 0.0;
        let b_zero = bx == 0.0 && by == 0.0;
        match (a_zero, b_zero) {
            (true, true) => return Ordering::Equal,
            (true, false) => return Ordering::Less,
            (false, true) => return Ordering::Greater,
            (false, false) => {}
        }

        // quadrant pre-check
        match (ax < 0.0, bx < 0.0) {
            (true, false) => return Ordering::Less,
            (false, true) => return Ordering::Greater,
            _ => {}
        }

        if ax == 0.0 && bx == 0.0 {
            // both on the north/south axis: north first
            return match (ay > 0.0, by > 0.0) {
                (true, false) => Ordering::Less,
                (false, true) => Ordering::Greater,
                _ => Ordering::Equal,
            };
        }

        let cross = ax * by - bx * ay;
        if cross < 0.0 {
            Ordering::Less
        } else if cross > 0.0 {
            Ordering::Greater
        } else {
            Ordering::Equal
        }
    }
}

/// Stable sort of `items` around `anchor`
pub(crate) fn sort_around<T, F>(
    ordering: &dyn ApproachOrdering,
    anchor: &Location,
    items: &mut [T],
    location_of: F,
) where
    F: Fn(&T) -> Location,
{
    items.sort_by(|a, b| ordering.compare(anchor, &location_of(a), &location_of(b)));
}
