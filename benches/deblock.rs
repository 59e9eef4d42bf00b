// Copyright (c) 2021-2023, The rhevd contributors. All rights reserved
//
// This source code is subject to the terms of the BSD 2 Clause License. If
// the BSD 2 Clause License was not distributed with this source code in the
// LICENSE file, you can obtain it at
// https://opensource.org/licenses/BSD-2-Clause.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaChaRng;

use rhevd::prelude::*;

// CIF picture covered by 8x8 coding blocks with mixed modes, the shape
// the filter sees on ordinary inter pictures
fn random_picture(ra: &mut ChaChaRng) -> Picture<u8> {
  let width = 352;
  let height = 288;
  let sps = SequenceParameterSet::new(width, height);
  let pps = PictureParameterSet::new(&sps);
  let mut pic: Picture<u8> = Picture::new(sps, pps);

  let mut header = SliceHeader::default();
  header.ref_pic_list[0].try_extend_from_slice(&[5, 9]).unwrap();
  header.ref_pic_list[1].try_extend_from_slice(&[7, 5]).unwrap();
  let slice = pic.meta.add_slice(header);
  for ctb_y in 0..pic.meta.sps.pic_height_in_ctbs() {
    for ctb_x in 0..pic.meta.sps.pic_width_in_ctbs() {
      pic.meta.set_ctb_slice(ctb_x, ctb_y, slice);
    }
  }

  for y0 in (0..height).step_by(8) {
    for x0 in (0..width).step_by(8) {
      let inter: bool = ra.gen();
      pic.meta.set_coding_block(
        x0,
        y0,
        CbInfo {
          log2_cb_size: 3,
          pred_mode: if inter { PredMode::Inter } else { PredMode::Intra },
          qp_y: ra.gen_range(22..40),
          ..Default::default()
        },
      );
      if inter {
        pic.meta.set_motion(
          x0,
          y0,
          8,
          8,
          MotionInfo {
            pred_flag: [true, ra.gen()],
            ref_idx: [ra.gen_range(0..2), ra.gen_range(0..2)],
            mv: [
              MotionVector {
                x: ra.gen_range(-16..16),
                y: ra.gen_range(-16..16),
              },
              MotionVector {
                x: ra.gen_range(-16..16),
                y: ra.gen_range(-16..16),
              },
            ],
          },
        );
        if ra.gen_bool(0.3) {
          pic.meta.set_nonzero_coefficient(x0, y0, 3);
        }
      }
    }
  }

  for plane in &mut pic.frame.planes {
    let stride = plane.cfg.stride;
    let rows = plane.cfg.height;
    for row in plane.data_origin_mut().chunks_mut(stride).take(rows) {
      for p in row.iter_mut() {
        *p = ra.gen();
      }
    }
  }

  pic
}

fn bench_deblock_serial(c: &mut Criterion) {
  let deblocker = Config::default().new_deblocker().unwrap();

  c.bench_function("deblock_cif_serial", |b| {
    b.iter_batched_ref(
      || {
        let mut ra = ChaChaRng::from_seed([1; 32]);
        random_picture(&mut ra)
      },
      |pic| {
        black_box(deblocker.deblock_picture(pic));
      },
      criterion::BatchSize::LargeInput,
    )
  });
}

fn bench_deblock_pooled(c: &mut Criterion) {
  let deblocker =
    Config { threads: 4, ..Default::default() }.new_deblocker().unwrap();

  c.bench_function("deblock_cif_4_threads", |b| {
    b.iter_batched_ref(
      || {
        let mut ra = ChaChaRng::from_seed([1; 32]);
        random_picture(&mut ra)
      },
      |pic| {
        black_box(deblocker.deblock_picture(pic));
      },
      criterion::BatchSize::LargeInput,
    )
  });
}

criterion_group!(deblock, bench_deblock_serial, bench_deblock_pooled);
criterion_main!(deblock);
