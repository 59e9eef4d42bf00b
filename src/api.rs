// Copyright (c) 2021-2023, The rhevd contributors. All rights reserved
//
// This source code is subject to the terms of the BSD 2 Clause License. If
// the BSD 2 Clause License was not distributed with this source code in the
// LICENSE file, you can obtain it at
// https://opensource.org/licenses/BSD-2-Clause.

use std::sync::Arc;

use thiserror::Error;

use crate::deblock::apply_deblocking_filter;
use crate::picture::Picture;
use crate::util::Pixel;

/// Deblocker settings.
///
/// With `threads == 0` the filter runs serially on the caller's thread.
/// Otherwise a dedicated worker pool of `threads` threads is created and
/// every filter pass is split into `threads * stripes_per_worker`
/// stripes; the extra stripes per worker smooth out the load imbalance
/// between busy and quiet picture regions.
#[derive(Clone, Copy, Debug)]
pub struct Config {
  /// Number of worker threads, 0 for serial operation.
  pub threads: usize,
  /// Stripes submitted per worker and pass.
  pub stripes_per_worker: usize,
}

impl Default for Config {
  fn default() -> Self {
    Config { threads: 0, stripes_per_worker: 4 }
  }
}

/// Reasons a [`Config`] cannot be turned into a [`Deblocker`].
#[derive(Clone, Copy, Debug, Error, Eq, PartialEq)]
pub enum InvalidConfig {
  /// The stripes-per-worker multiplier must be at least 1.
  #[error("invalid stripes per worker {0} (expected >= 1)")]
  InvalidStripesPerWorker(usize),
}

/// The deblocking stage. Owns the worker pool and drives
/// [`apply_deblocking_filter`] once per reconstructed picture.
pub struct Deblocker {
  pool: Option<Arc<rayon::ThreadPool>>,
  stripes_per_worker: usize,
}

impl Config {
  /// Validates the configuration.
  pub fn validate(&self) -> Result<(), InvalidConfig> {
    if self.stripes_per_worker == 0 {
      return Err(InvalidConfig::InvalidStripesPerWorker(
        self.stripes_per_worker,
      ));
    }
    Ok(())
  }

  /// Creates a [`Deblocker`] with this configuration.
  pub fn new_deblocker(&self) -> Result<Deblocker, InvalidConfig> {
    self.validate()?;

    let pool = if self.threads > 0 {
      Some(Arc::new(
        rayon::ThreadPoolBuilder::new()
          .num_threads(self.threads)
          .build()
          .unwrap(),
      ))
    } else {
      None
    };

    Ok(Deblocker { pool, stripes_per_worker: self.stripes_per_worker })
  }
}

impl Deblocker {
  /// Filters one reconstructed picture in place.
  ///
  /// Returns `false` when every slice of the picture disables
  /// deblocking; the sample planes are untouched in that case.
  pub fn deblock_picture<T: Pixel>(&self, pic: &mut Picture<T>) -> bool {
    apply_deblocking_filter(pic, self.pool.as_deref(), self.stripes_per_worker)
  }
}
