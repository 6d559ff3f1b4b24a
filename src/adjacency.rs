//! Directional neighbour lookup.
//!
//! Given a reference window and a [`Direction`], [`find_adjacent`] picks the
//! window a user most likely means by "the one to my left": the nearest
//! window on that side, preferring windows that line up with the reference
//! on the perpendicular axis, and among equally good candidates the one the
//! user touched last.

use crate::command::Direction;
use crate::desktop::Window;

/// Candidates whose center is closer than this to the reference center
/// along the movement axis are on neither side and never eligible.
pub const SIDE_TOLERANCE: f32 = 2.0;

/// Candidates whose distance is within this band of the best distance are
/// considered equally good.
pub const TIE_TOLERANCE: f32 = 2.0;

/// Weight of the off-axis misalignment penalty, see
/// [`Rect::distance_with_axis_preference`](crate::geometry::Rect::distance_with_axis_preference).
pub const OFF_AXIS_WEIGHT: f32 = 10.0;

/// Best neighbour of `reference` in `direction` among `candidates`.
///
/// `reference` itself is skipped if it shows up in `candidates`.  Ties
/// within [`TIE_TOLERANCE`] of the best distance go to the most recently
/// interacted-with window, then to the smaller distance, then to the lower
/// handle, so the result does not depend on iteration order.
pub fn find_adjacent<'a, I>(reference: &Window, candidates: I, direction: Direction) -> Option<&'a Window>
where
    I: IntoIterator<Item = &'a Window>,
{
    let axis = direction.axis();
    let origin = reference.rect.center().along(axis);

    let eligible: Vec<(&Window, f32)> = candidates
        .into_iter()
        .filter(|w| w.handle != reference.handle)
        .filter(|w| (w.rect.center().along(axis) - origin) * direction.sign() > SIDE_TOLERANCE)
        .map(|w| {
            let distance = reference
                .rect
                .distance_with_axis_preference(axis, &w.rect, OFF_AXIS_WEIGHT);
            (w, distance)
        })
        .collect();

    let best = eligible
        .iter()
        .map(|(_, d)| *d)
        .fold(f32::INFINITY, f32::min);

    eligible
        .into_iter()
        .filter(|(_, d)| *d - best <= TIE_TOLERANCE)
        .min_by(|(a, da), (b, db)| {
            b.last_interaction
                .cmp(&a.last_interaction)
                .then(da.total_cmp(db))
                .then(a.handle.cmp(&b.handle))
        })
        .map(|(w, _)| w)
}
