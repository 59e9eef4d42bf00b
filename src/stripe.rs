// Copyright (c) 2021-2023, The rhevd contributors. All rights reserved
//
// This source code is subject to the terms of the BSD 2 Clause License. If
// the BSD 2 Clause License was not distributed with this source code in the
// LICENSE file, you can obtain it at
// https://opensource.org/licenses/BSD-2-Clause.

use std::marker::PhantomData;
use std::ops::Range;
use std::slice;

use v_frame::frame::Frame;
use v_frame::plane::Plane;

use crate::util::*;

/// Mutable view of a band of plane rows.
///
/// This allows giving a stripe task write access to its rows without
/// giving it the whole plane. Rows keep their frame-absolute indices so
/// the filter code can work in picture coordinates.
#[derive(Debug)]
pub struct PlaneRegionMut<'a, T: Pixel> {
  data: *mut T, // points at the first sample of `rows.start`
  stride: usize,
  width: usize,
  rows: Range<usize>,
  phantom: PhantomData<&'a mut T>,
}

// The regions built by `split_stripes_mut` never overlap, so handing
// them to different threads is sound.
unsafe impl<T: Pixel> Send for PlaneRegionMut<'_, T> {}
unsafe impl<T: Pixel> Sync for PlaneRegionMut<'_, T> {}

impl<'a, T: Pixel> PlaneRegionMut<'a, T> {
  pub fn new(plane: &'a mut Plane<T>, rows: Range<usize>) -> Self {
    assert!(rows.start <= rows.end);
    assert!(rows.end <= plane.cfg.height);
    let stride = plane.cfg.stride;
    let width = plane.cfg.width;
    let origin = rows.start * stride;
    let data = unsafe { plane.data_origin_mut().as_mut_ptr().add(origin) };

    PlaneRegionMut { data, stride, width, rows, phantom: PhantomData }
  }

  #[inline]
  pub fn rows(&self) -> Range<usize> {
    self.rows.clone()
  }

  /// Row `y` of the plane, indexed in frame-absolute coordinates.
  #[inline]
  pub fn row(&self, y: usize) -> &[T] {
    assert!(self.rows.contains(&y));
    unsafe {
      let ptr = self.data.add((y - self.rows.start) * self.stride);
      slice::from_raw_parts(ptr, self.width)
    }
  }

  /// Mutable row `y` of the plane, indexed in frame-absolute coordinates.
  #[inline]
  pub fn row_mut(&mut self, y: usize) -> &mut [T] {
    assert!(self.rows.contains(&y));
    unsafe {
      let ptr = self.data.add((y - self.rows.start) * self.stride);
      slice::from_raw_parts_mut(ptr, self.width)
    }
  }
}

/// Row range of one stripe, in deblocking-grid units (4 luma samples).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Stripe {
  pub y_start: usize,
  pub y_end: usize,
}

/// Splits `rows` grid rows into up to `count` horizontal stripes.
///
/// Every stripe start is snapped down to a multiple of four grid rows:
/// this keeps the phase of the 2- and 4-cell walk increments intact
/// inside each stripe and is what makes the per-pass row windows of
/// neighboring stripes disjoint. The last stripe absorbs the remainder;
/// ranges that snap to nothing are dropped.
pub fn stripe_ranges(rows: usize, count: usize) -> Vec<Stripe> {
  let mut stripes = Vec::with_capacity(count);
  for i in 0..count {
    let y_start = (i * rows / count) & !3;
    let mut y_end = (i + 1) * rows / count;
    if i != count - 1 {
      y_end &= !3;
    }
    if y_start < y_end {
      stripes.push(Stripe { y_start, y_end });
    }
  }
  stripes
}

/// Per-stripe mutable views of the three sample planes for one pass.
pub struct StripePlanes<'a, T: Pixel> {
  pub luma: PlaneRegionMut<'a, T>,
  pub chroma: [PlaneRegionMut<'a, T>; 2],
}

#[inline]
fn pass_rows(stripe: Stripe, log2_unit: usize, lead: usize) -> Range<usize> {
  let start = (stripe.y_start << log2_unit).saturating_sub(lead);
  let end = (stripe.y_end << log2_unit) - lead;
  start..end.max(start)
}

/// Splits the frame into one view per stripe for the given pass.
///
/// The vertical pass reads and writes only inside a stripe's own sample
/// rows. The horizontal pass filters edges on the stripe's grid rows but
/// touches up to four luma rows (two chroma rows) above each edge, so
/// its windows are shifted up by one grid row; because stripe starts are
/// 4-aligned and the filter of the edge at grid row y stays inside luma
/// rows [4y-4, 4y+4), the shifted windows still tile the plane.
pub fn split_stripes_mut<'a, T: Pixel>(
  frame: &'a mut Frame<T>, stripes: &[Stripe], vertical: bool,
) -> Vec<StripePlanes<'a, T>> {
  let fp: *mut Frame<T> = frame;
  stripes
    .iter()
    .map(|&stripe| {
      // SAFETY: Multiple stripes mutably access the frame. The stripe
      // ranges are disjoint with 4-aligned starts, so the row windows
      // computed by `pass_rows` never overlap between stripes; each
      // sample belongs to at most one view.
      let frame = unsafe { &mut *fp };
      let (luma_lead, chroma_lead) = if vertical { (0, 0) } else { (4, 2) };
      let [y, cb, cr] = &mut frame.planes;
      StripePlanes {
        luma: PlaneRegionMut::new(y, pass_rows(stripe, 2, luma_lead)),
        chroma: [
          PlaneRegionMut::new(cb, pass_rows(stripe, 1, chroma_lead)),
          PlaneRegionMut::new(cr, pass_rows(stripe, 1, chroma_lead)),
        ],
      }
    })
    .collect()
}

#[cfg(test)]
mod test {
  use super::*;

  #[test]
  fn stripes_are_aligned_and_cover() {
    for rows in [1, 2, 4, 17, 36, 68, 120] {
      for count in [1, 2, 3, 4, 7, 16] {
        let stripes = stripe_ranges(rows, count);
        assert!(!stripes.is_empty());
        assert_eq!(stripes[0].y_start, 0);
        assert_eq!(stripes.last().unwrap().y_end, rows);
        for pair in stripes.windows(2) {
          assert_eq!(pair[0].y_end, pair[1].y_start);
          assert_eq!(pair[1].y_start % 4, 0);
        }
      }
    }
  }

  #[test]
  fn single_stripe_spans_grid() {
    assert_eq!(stripe_ranges(9, 1), vec![Stripe { y_start: 0, y_end: 9 }]);
  }

  #[test]
  fn region_rows_keep_absolute_indices() {
    let mut plane: Plane<u8> = Plane::new(16, 16, 0, 0, 0, 0);
    let stride = plane.cfg.stride;
    let data = plane.data_origin_mut();
    for (y, row) in data.chunks_mut(stride).take(16).enumerate() {
      for (x, p) in row.iter_mut().take(16).enumerate() {
        *p = (16 * y + x) as u8;
      }
    }

    let mut region = PlaneRegionMut::new(&mut plane, 4..12);
    assert_eq!(region.rows(), 4..12);
    assert_eq!(region.row(4)[0], 64);
    assert_eq!(region.row(11)[15], 191);
    region.row_mut(4)[0] = 7;
    assert_eq!(plane.p(0, 4), 7);
  }
}
