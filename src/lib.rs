// Copyright (c) 2021-2023, The rhevd contributors. All rights reserved
//
// This source code is subject to the terms of the BSD 2 Clause License. If
// the BSD 2 Clause License was not distributed with this source code in the
// LICENSE file, you can obtain it at
// https://opensource.org/licenses/BSD-2-Clause.

//! rhevd is the in-loop deblocking filter stage of an HEVC (H.265)
//! decoder.
//!
//! Given a [`Picture`] whose sample planes and coding-unit metadata were
//! populated by the earlier decoder stages, the filter rewrites the
//! reconstructed samples in place (ITU-T H.265 §8.7.2): it discovers the
//! filterable transform- and prediction-block edges, derives a boundary
//! strength per edge, and applies the luma and chroma deblocking kernels
//! in a vertical-edge pass followed by a horizontal-edge pass. Each pass
//! can be split into independent stripes on a worker pool; the output is
//! bit-identical to the serial schedule.
//!
//! ```no_run
//! use rhevd::prelude::*;
//!
//! # fn filter(picture: &mut Picture<u8>) -> Result<(), InvalidConfig> {
//! let cfg = Config { threads: 4, ..Default::default() };
//! let deblocker = cfg.new_deblocker()?;
//! deblocker.deblock_picture(picture);
//! # Ok(())
//! # }
//! ```

#![deny(bare_trait_objects)]

pub mod deblock;
pub mod header;
pub mod partition;
pub mod picture;
pub mod util;

mod api;
mod stripe;

pub use crate::api::*;
pub use crate::deblock::apply_deblocking_filter;
pub use crate::header::*;
pub use crate::partition::*;
pub use crate::picture::*;
pub use crate::util::{CastFromPrimitive, Pixel};

/// Re-exports of the types most callers need.
pub mod prelude {
  pub use crate::api::*;
  pub use crate::deblock::apply_deblocking_filter;
  pub use crate::header::*;
  pub use crate::partition::*;
  pub use crate::picture::*;
  pub use crate::util::{CastFromPrimitive, Pixel};
}
