use std::ops::Range;

use crate::filter::module::RowFilter;
use crate::image_buf::{CHANNELS, PixelBuffer};

/// 3x3 Gaussian approximation, in sixteenths.
const KERNEL: [[u32; 3]; 3] = [[1, 2, 1], [2, 4, 2], [1, 2, 1]];

pub struct Blur;

impl RowFilter for Blur {
    fn name(&self) -> &str {
        "blur"
    }

    fn needs_halo(&self) -> bool {
        true
    }

    /// Rows without a neighbour above and below in `src`, and the first and
    /// last column of every row, are copied through unchanged.
    fn apply(&self, src: &PixelBuffer, owned: Range<u32>, dst: &mut PixelBuffer) {
        let width = src.width() as usize;
        if width < 3 {
            return;
        }

        for (dst_y, y) in owned.enumerate() {
            if y == 0 || y + 1 >= src.height() {
                continue;
            }
            let rows = [src.row(y - 1), src.row(y), src.row(y + 1)];
            let dst_row = dst.row_mut(dst_y as u32);

            for x in 1..width - 1 {
                for c in 0..CHANNELS {
                    let mut acc = 0u32;
                    for (weights, row) in KERNEL.iter().zip(rows) {
                        for (j, weight) in weights.iter().enumerate() {
                            acc += weight * row[(x + j - 1) * CHANNELS + c] as u32;
                        }
                    }
                    // Weights sum to 16, so this is the truncated weighted mean.
                    dst_row[x * CHANNELS + c] = (acc / 16) as u8;
                }
            }
        }
    }
}
