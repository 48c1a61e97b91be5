use std::ops::Range;

use serde::{Deserialize, Serialize};

use crate::error::PartitionError;

/// A contiguous range of rows owned by one worker, plus the read-only
/// neighbour rows it needs from adjacent bands.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowBand {
    pub owner_index: usize,
    pub first_owned_row: u32,
    pub row_count: u32,
    /// 0 or 1.
    pub halo_above: u32,
    /// 0 or 1.
    pub halo_below: u32,
}

impl RowBand {
    pub fn owned_rows(&self) -> Range<u32> {
        self.first_owned_row..self.first_owned_row + self.row_count
    }

    /// Rows the worker receives: owned rows with the halo on either side.
    pub fn window_rows(&self) -> Range<u32> {
        self.first_owned_row - self.halo_above
            ..self.first_owned_row + self.row_count + self.halo_below
    }

    /// Owned rows in the coordinates of the received window.
    pub fn owned_in_window(&self) -> Range<u32> {
        self.halo_above..self.halo_above + self.row_count
    }
}

/// Split `height` rows across `worker_count` workers.
///
/// Every worker gets `height / worker_count` rows; the last one also takes
/// the remainder. With `needs_halo`, each band borrows the row directly
/// above and below it when that row exists in the image.
pub fn compute_bands(
    height: u32,
    worker_count: usize,
    needs_halo: bool,
) -> Result<Vec<RowBand>, PartitionError> {
    if worker_count == 0 {
        return Err(PartitionError::ZeroWorkers);
    }
    if (height as usize) < worker_count {
        return Err(PartitionError::TooManyWorkers {
            height,
            workers: worker_count,
        });
    }

    // height >= worker_count, so the count fits in u32.
    let workers = worker_count as u32;
    let base = height / workers;
    let remainder = height % workers;

    let bands = (0..workers)
        .map(|i| {
            let first_owned_row = i * base;
            let row_count = if i == workers - 1 {
                base + remainder
            } else {
                base
            };
            let end = first_owned_row + row_count;
            let (halo_above, halo_below) = if needs_halo {
                (u32::from(first_owned_row > 0), u32::from(end < height))
            } else {
                (0, 0)
            };
            RowBand {
                owner_index: i as usize,
                first_owned_row,
                row_count,
                halo_above,
                halo_below,
            }
        })
        .collect();

    Ok(bands)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn owned(bands: &[RowBand]) -> Vec<Range<u32>> {
        bands.iter().map(RowBand::owned_rows).collect()
    }

    #[test]
    fn even_division_covers_image() {
        for workers in [1, 2, 4, 5, 10, 20] {
            let bands = compute_bands(100, workers, false).unwrap();
            assert_eq!(bands.len(), workers);
            assert_eq!(bands.iter().map(|b| b.row_count).sum::<u32>(), 100);
            let mut next = 0;
            for band in &bands {
                assert_eq!(band.first_owned_row, next, "gap before band {band:?}");
                next = band.owned_rows().end;
            }
            assert_eq!(next, 100);
        }
    }

    #[test]
    fn last_band_absorbs_remainder() {
        let bands = compute_bands(10, 3, false).unwrap();
        assert_eq!(owned(&bands), vec![0..3, 3..6, 6..10]);
    }

    #[test]
    fn remainder_is_not_round_robin() {
        let bands = compute_bands(11, 4, false).unwrap();
        let counts: Vec<u32> = bands.iter().map(|b| b.row_count).collect();
        assert_eq!(counts, vec![2, 2, 2, 5]);
    }

    #[test]
    fn owner_index_follows_row_order() {
        let bands = compute_bands(17, 6, true).unwrap();
        for (i, band) in bands.iter().enumerate() {
            assert_eq!(band.owner_index, i);
        }
    }

    #[test]
    fn single_worker_has_no_halo() {
        let bands = compute_bands(7, 1, true).unwrap();
        assert_eq!(bands.len(), 1);
        assert_eq!(bands[0].owned_rows(), 0..7);
        assert_eq!(bands[0].window_rows(), 0..7);
    }

    #[test]
    fn halo_rows_clamped_at_edges() {
        let bands = compute_bands(9, 3, true).unwrap();
        assert_eq!((bands[0].halo_above, bands[0].halo_below), (0, 1));
        assert_eq!((bands[1].halo_above, bands[1].halo_below), (1, 1));
        assert_eq!((bands[2].halo_above, bands[2].halo_below), (1, 0));
        assert_eq!(bands[0].window_rows(), 0..4);
        assert_eq!(bands[1].window_rows(), 2..7);
        assert_eq!(bands[2].window_rows(), 5..9);
        assert_eq!(bands[1].owned_in_window(), 1..4);
    }

    #[test]
    fn no_halo_when_not_requested() {
        let bands = compute_bands(9, 3, false).unwrap();
        assert!(bands.iter().all(|b| b.halo_above == 0 && b.halo_below == 0));
        assert!(bands.iter().all(|b| b.window_rows() == b.owned_rows()));
    }

    #[test]
    fn one_row_bands_get_both_halos() {
        let bands = compute_bands(3, 3, true).unwrap();
        assert_eq!(bands[1].window_rows(), 0..3);
        assert_eq!(bands[1].owned_in_window(), 1..2);
    }

    #[test]
    fn too_many_workers_rejected() {
        assert_eq!(
            compute_bands(3, 4, false),
            Err(PartitionError::TooManyWorkers {
                height: 3,
                workers: 4
            })
        );
    }

    #[test]
    fn zero_workers_rejected() {
        assert_eq!(compute_bands(3, 0, false), Err(PartitionError::ZeroWorkers));
    }
}
