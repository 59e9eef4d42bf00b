// Copyright (c) 2021-2023, The rhevd contributors. All rights reserved
//
// This source code is subject to the terms of the BSD 2 Clause License. If
// the BSD 2 Clause License was not distributed with this source code in the
// LICENSE file, you can obtain it at
// https://opensource.org/licenses/BSD-2-Clause.

use arrayvec::ArrayVec;
use num_derive::FromPrimitive;

/// Motion vector in quarter-pel units.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MotionVector {
  pub x: i16,
  pub y: i16,
}

/// Prediction mode of a coding unit.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, FromPrimitive)]
pub enum PredMode {
  #[default]
  Intra,
  Inter,
}

/// Partitioning of a coding block into prediction blocks.
#[allow(non_camel_case_types)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, FromPrimitive)]
pub enum PartMode {
  #[default]
  PART_2Nx2N,
  PART_2NxN,
  PART_Nx2N,
  PART_NxN,
  PART_2NxnU,
  PART_2NxnD,
  PART_nLx2N,
  PART_nRx2N,
}

impl PartMode {
  /// Internal prediction-block edges of a coding block of `cb_size`
  /// samples per side, as (vertical, offset) pairs. The offset is the
  /// distance in samples from the coding block's left border for vertical
  /// edges, or from its top border for horizontal edges.
  ///
  /// `PART_2Nx2N` has no internal edges; `PART_NxN` has one of each
  /// orientation through the center.
  pub fn pb_edges(self, cb_size: usize) -> ArrayVec<(bool, usize), 2> {
    use PartMode::*;
    let half = cb_size >> 1;
    let quarter = cb_size >> 2;

    let mut edges = ArrayVec::new();
    match self {
      PART_2Nx2N => {}
      PART_NxN => {
        edges.push((true, half));
        edges.push((false, half));
      }
      PART_Nx2N => edges.push((true, half)),
      PART_2NxN => edges.push((false, half)),
      PART_nLx2N => edges.push((true, quarter)),
      PART_nRx2N => edges.push((true, half + quarter)),
      PART_2NxnU => edges.push((false, quarter)),
      PART_2NxnD => edges.push((false, half + quarter)),
    }
    edges
  }
}

#[cfg(test)]
mod test {
  use super::*;

  #[test]
  fn pb_edge_offsets() {
    use PartMode::*;

    assert!(PART_2Nx2N.pb_edges(16).is_empty());
    assert_eq!(PART_Nx2N.pb_edges(16).as_slice(), &[(true, 8)]);
    assert_eq!(PART_2NxN.pb_edges(16).as_slice(), &[(false, 8)]);
    assert_eq!(PART_nLx2N.pb_edges(16).as_slice(), &[(true, 4)]);
    assert_eq!(PART_nRx2N.pb_edges(16).as_slice(), &[(true, 12)]);
    assert_eq!(PART_2NxnU.pb_edges(16).as_slice(), &[(false, 4)]);
    assert_eq!(PART_2NxnD.pb_edges(16).as_slice(), &[(false, 12)]);
    assert_eq!(PART_NxN.pb_edges(16).as_slice(), &[(true, 8), (false, 8)]);
  }
}
