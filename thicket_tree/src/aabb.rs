// Copyright 2025 the Thicket Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Stateless box arithmetic shared by insertion, queries, and ray casts.
//!
//! Boxes are [`kurbo::Rect`]s with the usual invariant `x0 <= x1`,
//! `y0 <= y1`; union and inflation come from [`kurbo::Rect`] directly and
//! this module adds the tests kurbo has no opinion on. Degenerate
//! (zero-area) boxes are legal inputs everywhere. Floating-point inputs are
//! assumed to be finite (no NaNs).

use kurbo::Rect;

use crate::types::RayCastInput;

/// Perimeter of a box, the 2D analogue of surface area.
///
/// This is the cost metric that drives sibling selection and rotations:
/// cheaper to compute than area and a better proxy for expected traversal
/// work on long thin boxes.
#[inline]
pub fn perimeter(a: &Rect) -> f64 {
    2.0 * (a.width() + a.height())
}

/// Whether `a` entirely contains `b`, boundary inclusive.
#[inline]
pub fn contains(a: &Rect, b: &Rect) -> bool {
    a.x0 <= b.x0 && a.y0 <= b.y0 && b.x1 <= a.x1 && b.y1 <= a.y1
}

/// Whether two boxes overlap, treating boxes as closed: touching edges count.
#[inline]
pub fn overlaps(a: &Rect, b: &Rect) -> bool {
    a.x0 <= b.x1 && b.x0 <= a.x1 && a.y0 <= b.y1 && b.y0 <= a.y1
}

/// Slab test of a ray against a box.
///
/// Returns the entry fraction in `[0, input.max_fraction]`, or `None` on a
/// miss. All comparisons are inclusive, so rays exactly on a box edge hit.
/// A ray starting inside the box reports fraction `0`. A zero-length
/// translation degenerates to a point-in-box test.
pub fn ray_cast(rect: &Rect, input: &RayCastInput) -> Option<f64> {
    let p = input.origin;
    let d = input.translation;

    let mut tmin = 0.0_f64;
    let mut tmax = input.max_fraction;

    if d.x == 0.0 {
        if p.x < rect.x0 || rect.x1 < p.x {
            return None;
        }
    } else {
        let inv = 1.0 / d.x;
        let mut t1 = (rect.x0 - p.x) * inv;
        let mut t2 = (rect.x1 - p.x) * inv;
        if t1 > t2 {
            core::mem::swap(&mut t1, &mut t2);
        }
        tmin = tmin.max(t1);
        tmax = tmax.min(t2);
        if tmin > tmax {
            return None;
        }
    }

    if d.y == 0.0 {
        if p.y < rect.y0 || rect.y1 < p.y {
            return None;
        }
    } else {
        let inv = 1.0 / d.y;
        let mut t1 = (rect.y0 - p.y) * inv;
        let mut t2 = (rect.y1 - p.y) * inv;
        if t1 > t2 {
            core::mem::swap(&mut t1, &mut t2);
        }
        tmin = tmin.max(t1);
        tmax = tmax.min(t2);
        if tmin > tmax {
            return None;
        }
    }

    Some(tmin)
}
