use std::ops::Range;

use crate::filter::module::RowFilter;
use crate::image_buf::{CHANNELS, PixelBuffer};

pub struct Grayscale;

/// `0.3 R + 0.59 G + 0.11 B`, truncated toward zero.
///
/// Weights are applied in hundredths so the truncation sees the exact sum;
/// a gray pixel therefore maps to itself.
pub fn luminance(r: u8, g: u8, b: u8) -> u8 {
    ((30 * r as u32 + 59 * g as u32 + 11 * b as u32) / 100) as u8
}

impl RowFilter for Grayscale {
    fn name(&self) -> &str {
        "grayscale"
    }

    fn needs_halo(&self) -> bool {
        false
    }

    fn apply(&self, src: &PixelBuffer, owned: Range<u32>, dst: &mut PixelBuffer) {
        for (dst_y, y) in owned.enumerate() {
            let src_row = src.row(y);
            let dst_row = dst.row_mut(dst_y as u32);
            for (s, d) in src_row
                .chunks_exact(CHANNELS)
                .zip(dst_row.chunks_exact_mut(CHANNELS))
            {
                // Stored order is blue, green, red.
                d.fill(luminance(s[2], s[1], s[0]));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(buf: &PixelBuffer) -> PixelBuffer {
        Grayscale.process(buf, 0..buf.height()).unwrap()
    }

    #[test]
    fn uniform_image_scenario() {
        // B=10, G=20, R=30: 0.3*30 + 0.59*20 + 0.11*10 = 21.9
        let buf = PixelBuffer::filled(4, 4, [10, 20, 30]).unwrap();
        let out = run(&buf);
        for pixel in out.data().chunks_exact(3) {
            assert_eq!(pixel, [21, 21, 21]);
        }
    }

    #[test]
    fn truncates_instead_of_rounding() {
        // 0.3*1 + 0.59*1 + 0.11*0 = 0.89
        assert_eq!(luminance(1, 1, 0), 0);
        // 0.3*255 + 0.59*255 + 0.11*254 = 254.89
        assert_eq!(luminance(255, 255, 254), 254);
    }

    #[test]
    fn weights_follow_channel_order() {
        assert_eq!(luminance(100, 0, 0), 30);
        assert_eq!(luminance(0, 100, 0), 59);
        assert_eq!(luminance(0, 0, 100), 11);

        let buf = PixelBuffer::filled(1, 1, [100, 0, 0]).unwrap();
        assert_eq!(run(&buf).pixel(0, 0), Some([11, 11, 11]));
    }

    #[test]
    fn gray_levels_are_fixed_points() {
        for v in 0..=255u8 {
            assert_eq!(luminance(v, v, v), v, "gray level {v} moved");
        }
    }

    #[test]
    fn idempotent() {
        let data: Vec<u8> = (0..5 * 3 * 3).map(|i| (i * 37 % 256) as u8).collect();
        let buf = PixelBuffer::from_data(5, 3, data).unwrap();
        let once = run(&buf);
        let twice = run(&once);
        assert_eq!(once, twice);
    }

    #[test]
    fn only_owned_rows_are_produced() {
        let mut buf = PixelBuffer::filled(2, 4, [10, 20, 30]).unwrap();
        buf.set_pixel(0, 0, [0, 0, 0]);
        let out = Grayscale.process(&buf, 1..3).unwrap();
        assert_eq!(out.height(), 2);
        assert!(out.data().iter().all(|&v| v == 21));
    }
}
