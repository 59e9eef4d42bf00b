// Copyright (c) 2021-2023, The rhevd contributors. All rights reserved
//
// This source code is subject to the terms of the BSD 2 Clause License. If
// the BSD 2 Clause License was not distributed with this source code in the
// LICENSE file, you can obtain it at
// https://opensource.org/licenses/BSD-2-Clause.

use std::mem::size_of;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Mutex;

use num_derive::FromPrimitive;
use num_traits::FromPrimitive as _;
use thiserror::Error;
use v_frame::frame::Frame;

use crate::header::*;
use crate::partition::*;
use crate::util::*;

/// Decoded-picture integrity, as tracked across the reconstruction loop.
///
/// The status is sticky: once a stage reports decoding errors the picture
/// stays marked.
#[derive(Clone, Copy, Debug, PartialEq, Eq, FromPrimitive)]
pub enum Integrity {
  Correct = 0,
  DecodingErrors = 1,
}

/// Non-fatal inconsistencies detected while filtering. Each warning is
/// recorded once per picture and mirrored to the `log` facade.
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
pub enum DecodeWarning {
  #[error("number of motion vectors differs between the two sides of an edge")]
  NumMvPNotEqualToNumMvQ,
}

/// Per-minimum-coding-block metadata.
///
/// `log2_cb_size` is non-zero only on the cell holding the top-left
/// corner of a coding block; the other fields are replicated over every
/// cell the coding block covers.
#[derive(Clone, Copy, Debug, Default)]
pub struct CbInfo {
  pub log2_cb_size: u8,
  pub part_mode: PartMode,
  pub pred_mode: PredMode,
  pub qp_y: u8,
  pub pcm_flag: bool,
  pub transquant_bypass: bool,
}

/// Motion data of one 4x4 block.
#[derive(Clone, Copy, Debug, Default)]
pub struct MotionInfo {
  pub pred_flag: [bool; 2],
  pub ref_idx: [i8; 2],
  pub mv: [MotionVector; 2],
}

/// Per-4x4 metadata: residual-quadtree split flags, coded-coefficient
/// presence and motion.
#[derive(Clone, Copy, Debug, Default)]
pub struct BlockInfo {
  /// One bit per residual-quadtree depth, set on the cell holding the
  /// top-left corner of the node that splits at that depth.
  pub split_transform: u8,
  pub nonzero_coefficient: bool,
  pub motion: MotionInfo,
}

/// Everything the filter reads besides the sample planes: parameter
/// sets, slice headers and the coding-unit metadata grids populated by
/// the earlier decoder stages.
///
/// Accessors take luma sample coordinates, like the rest of the
/// reconstruction loop.
#[derive(Debug)]
pub struct PictureMeta {
  pub sps: SequenceParameterSet,
  pub pps: PictureParameterSet,
  /// PicOrderCntVal of this picture.
  pub poc: i32,
  slices: Vec<SliceHeader>,
  /// Slice index of each CTB, raster order.
  slice_map: Box<[u16]>,
  /// Minimum-coding-block grid.
  cb: Box<[CbInfo]>,
  cb_cols: usize,
  /// 4x4 grid.
  b4: Box<[BlockInfo]>,
  b4_cols: usize,
  integrity: AtomicU8,
  warnings: Mutex<Vec<DecodeWarning>>,
}

impl PictureMeta {
  pub fn new(sps: SequenceParameterSet, pps: PictureParameterSet) -> Self {
    let cb_cols = sps.pic_width_in_min_cbs();
    let cb_rows = sps.pic_height_in_min_cbs();
    let b4_cols = sps.deblk_width();
    let b4_rows = sps.deblk_height();
    let ctbs = sps.pic_width_in_ctbs() * sps.pic_height_in_ctbs();

    PictureMeta {
      sps,
      pps,
      poc: 0,
      slices: Vec::new(),
      slice_map: vec![0; ctbs].into_boxed_slice(),
      cb: vec![CbInfo::default(); cb_cols * cb_rows].into_boxed_slice(),
      cb_cols,
      b4: vec![BlockInfo::default(); b4_cols * b4_rows].into_boxed_slice(),
      b4_cols,
      integrity: AtomicU8::new(Integrity::Correct as u8),
      warnings: Mutex::new(Vec::new()),
    }
  }

  #[inline]
  fn cb_index(&self, x: usize, y: usize) -> usize {
    (y >> self.sps.log2_min_cb_size) * self.cb_cols
      + (x >> self.sps.log2_min_cb_size)
  }

  #[inline]
  fn b4_index(&self, x: usize, y: usize) -> usize {
    (y >> 2) * self.b4_cols + (x >> 2)
  }

  #[inline]
  fn ctb_index(&self, x: usize, y: usize) -> usize {
    (y >> self.sps.log2_ctb_size) * self.sps.pic_width_in_ctbs()
      + (x >> self.sps.log2_ctb_size)
  }

  /// Records a coding block with top-left corner at `(x0, y0)`.
  /// `info.log2_cb_size` determines the covered square; the metadata is
  /// replicated over every minimum-coding-block cell inside it.
  pub fn set_coding_block(&mut self, x0: usize, y0: usize, info: CbInfo) {
    debug_assert!(info.log2_cb_size as usize >= self.sps.log2_min_cb_size);
    let size = 1 << info.log2_cb_size;
    for y in (y0..y0 + size).step_by(self.sps.min_cb_size()) {
      for x in (x0..x0 + size).step_by(self.sps.min_cb_size()) {
        let mut cell = info;
        if x != x0 || y != y0 {
          cell.log2_cb_size = 0;
        }
        let idx = self.cb_index(x, y);
        self.cb[idx] = cell;
      }
    }
  }

  /// Coding-block size at a minimum-coding-block grid position, or 0 when
  /// the position is not the top-left corner of a coding block.
  #[inline]
  pub fn log2_cb_size_at_cb(&self, cb_x: usize, cb_y: usize) -> u8 {
    self.cb[cb_y * self.cb_cols + cb_x].log2_cb_size
  }

  #[inline]
  pub fn part_mode(&self, x: usize, y: usize) -> PartMode {
    self.cb[self.cb_index(x, y)].part_mode
  }

  #[inline]
  pub fn pred_mode(&self, x: usize, y: usize) -> PredMode {
    self.cb[self.cb_index(x, y)].pred_mode
  }

  #[inline]
  pub fn qp_y(&self, x: usize, y: usize) -> u8 {
    self.cb[self.cb_index(x, y)].qp_y
  }

  #[inline]
  pub fn pcm_flag(&self, x: usize, y: usize) -> bool {
    self.cb[self.cb_index(x, y)].pcm_flag
  }

  #[inline]
  pub fn transquant_bypass(&self, x: usize, y: usize) -> bool {
    self.cb[self.cb_index(x, y)].transquant_bypass
  }

  /// Whether sample writes are suppressed at this position: PCM samples
  /// under `pcm_loop_filter_disable_flag`, and transquant-bypass coding
  /// units, keep their reconstructed values.
  #[inline]
  pub fn deblock_suppressed(&self, x: usize, y: usize) -> bool {
    let cb = &self.cb[self.cb_index(x, y)];
    (self.sps.pcm_loop_filter_disable_flag && cb.pcm_flag)
      || cb.transquant_bypass
  }

  pub fn set_split_transform_flag(&mut self, x0: usize, y0: usize, depth: u8) {
    let idx = self.b4_index(x0, y0);
    self.b4[idx].split_transform |= 1 << depth;
  }

  #[inline]
  pub fn split_transform_flag(&self, x0: usize, y0: usize, depth: u8) -> bool {
    self.b4[self.b4_index(x0, y0)].split_transform & (1 << depth) != 0
  }

  /// Marks every 4x4 cell of the transform block at `(x0, y0)` as holding
  /// at least one non-zero coefficient.
  pub fn set_nonzero_coefficient(
    &mut self, x0: usize, y0: usize, log2_trafo_size: usize,
  ) {
    let size = 1 << log2_trafo_size;
    for y in (y0..y0 + size).step_by(4) {
      for x in (x0..x0 + size).step_by(4) {
        let idx = self.b4_index(x, y);
        self.b4[idx].nonzero_coefficient = true;
      }
    }
  }

  #[inline]
  pub fn nonzero_coefficient(&self, x: usize, y: usize) -> bool {
    self.b4[self.b4_index(x, y)].nonzero_coefficient
  }

  /// Replicates `motion` over a `w`x`h` sample rectangle of 4x4 cells,
  /// the shape of one prediction block.
  pub fn set_motion(
    &mut self, x0: usize, y0: usize, w: usize, h: usize, motion: MotionInfo,
  ) {
    for y in (y0..y0 + h).step_by(4) {
      for x in (x0..x0 + w).step_by(4) {
        let idx = self.b4_index(x, y);
        self.b4[idx].motion = motion;
      }
    }
  }

  #[inline]
  pub fn motion(&self, x: usize, y: usize) -> &MotionInfo {
    &self.b4[self.b4_index(x, y)].motion
  }

  /// Appends a slice header and returns its index for `set_ctb_slice`.
  pub fn add_slice(&mut self, header: SliceHeader) -> u16 {
    self.slices.push(header);
    (self.slices.len() - 1) as u16
  }

  pub fn set_ctb_slice(&mut self, ctb_x: usize, ctb_y: usize, slice: u16) {
    let idx = ctb_y * self.sps.pic_width_in_ctbs() + ctb_x;
    self.slice_map[idx] = slice;
  }

  #[inline]
  pub fn slice_header(&self, x: usize, y: usize) -> &SliceHeader {
    &self.slices[self.slice_map[self.ctb_index(x, y)] as usize]
  }

  #[inline]
  pub fn tile_id(&self, x: usize, y: usize) -> u16 {
    self
      .pps
      .tile_id(x >> self.sps.log2_ctb_size, y >> self.sps.log2_ctb_size)
  }

  pub fn integrity(&self) -> Integrity {
    Integrity::from_u8(self.integrity.load(Ordering::Relaxed))
      .unwrap_or(Integrity::DecodingErrors)
  }

  /// Degrades the picture's integrity status. The status only ever gets
  /// worse; concurrent calls from stripe tasks are fine.
  pub fn mark_integrity(&self, integrity: Integrity) {
    self.integrity.fetch_max(integrity as u8, Ordering::Relaxed);
  }

  /// Records `warning` once per picture and forwards it to `log::warn!`.
  pub fn add_warning(&self, warning: DecodeWarning) {
    let mut warnings = self.warnings.lock().expect("poisoned lock");
    if !warnings.contains(&warning) {
      log::warn!("POC {}: {}", self.poc, warning);
      warnings.push(warning);
    }
  }

  pub fn warnings(&self) -> Vec<DecodeWarning> {
    self.warnings.lock().expect("poisoned lock").clone()
  }
}

/// One decoded picture: the reconstructed sample planes plus the
/// metadata left behind by parsing and reconstruction.
///
/// The filter mutates the planes in place; everything in `meta` stays
/// read-only while filtering (except the integrity/warning channel).
#[derive(Debug)]
pub struct Picture<T: Pixel> {
  pub frame: Frame<T>,
  pub meta: PictureMeta,
}

impl<T: Pixel> Picture<T> {
  /// Allocates a picture for the given parameter sets, 4:2:0 chroma.
  ///
  /// # Panics
  ///
  /// Panics when `T` is too narrow for the configured luma bit depth,
  /// mirroring the check the decoder front end performs when it picks
  /// the pixel type.
  pub fn new(sps: SequenceParameterSet, pps: PictureParameterSet) -> Self {
    assert!(
      8 * size_of::<T>() >= sps.bit_depth_luma,
      "the pixel type u{} does not fit BitDepthY {}",
      8 * size_of::<T>(),
      sps.bit_depth_luma
    );

    let frame = Frame::new_with_padding(
      sps.pic_width_in_luma_samples,
      sps.pic_height_in_luma_samples,
      ChromaSampling::Cs420,
      0,
    );
    let meta = PictureMeta::new(sps, pps);

    Picture { frame, meta }
  }
}
