use std::num::NonZeroUsize;
use std::time::Instant;

use rayon::prelude::*;
use tracing::{debug, info};

use crate::error::PipelineError;
use crate::filter::RowFilter;
use crate::image_buf::{ImageGeometry, PixelBuffer};
use crate::partition::{RowBand, compute_bands};

/// What one worker receives: its band, the broadcast geometry, and a private
/// copy of the owned rows plus halo.
#[derive(Clone, Debug)]
pub struct WorkItem {
    pub band: RowBand,
    pub geometry: ImageGeometry,
    pub window: PixelBuffer,
}

/// Transformed owned rows returned by a worker.
#[derive(Clone, Debug)]
pub struct BandOutput {
    pub owner_index: usize,
    pub pixels: PixelBuffer,
}

/// Applies one filter to whatever band it is handed. Every worker index runs
/// the same code.
pub struct Worker<'a> {
    filter: &'a dyn RowFilter,
}

impl<'a> Worker<'a> {
    pub fn new(filter: &'a dyn RowFilter) -> Self {
        Self { filter }
    }

    pub fn process(&self, item: WorkItem) -> Result<BandOutput, PipelineError> {
        let WorkItem {
            band,
            geometry,
            window,
        } = item;
        let index = band.owner_index;
        let window_rows = band.window_rows();

        let expected_rows = window_rows.end - window_rows.start;
        if window.width() != geometry.width || window.height() != expected_rows {
            return Err(PipelineError::Worker {
                index,
                reason: format!(
                    "received {}x{} pixels, band expects {}x{expected_rows}",
                    window.width(),
                    window.height(),
                    geometry.width,
                ),
            });
        }

        debug!(
            worker = index,
            thread = ?rayon::current_thread_index(),
            first_row = band.first_owned_row,
            rows = band.row_count,
            filter = self.filter.name(),
            "processing band"
        );
        let t0 = Instant::now();
        let pixels = self.filter.process(&window, band.owned_in_window())?;
        debug!(
            worker = index,
            elapsed_ms = t0.elapsed().as_millis(),
            "band done"
        );

        Ok(BandOutput {
            owner_index: index,
            pixels,
        })
    }
}

/// Owns the worker pool and drives partition, distribution, processing and
/// assembly for a whole image.
pub struct Coordinator {
    pool: rayon::ThreadPool,
    workers: usize,
}

impl Coordinator {
    pub fn new(workers: NonZeroUsize) -> Result<Self, PipelineError> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(workers.get())
            .thread_name(|i| format!("rowband-worker-{i}"))
            .build()?;
        Ok(Self {
            pool,
            workers: workers.get(),
        })
    }

    pub fn worker_count(&self) -> usize {
        self.workers
    }

    /// Bands for every worker, with halo rows when the filter needs them.
    pub fn plan(
        &self,
        geometry: ImageGeometry,
        filter: &dyn RowFilter,
    ) -> Result<Vec<RowBand>, PipelineError> {
        let bands = compute_bands(geometry.height, self.workers, filter.needs_halo())?;
        for band in &bands {
            debug!(
                worker = band.owner_index,
                owned = ?band.owned_rows(),
                window = ?band.window_rows(),
                "planned band"
            );
        }
        Ok(bands)
    }

    /// Copy each band's window out of `image`. The returned items share no
    /// memory with `image` or with each other.
    pub fn distribute(
        &self,
        image: &PixelBuffer,
        bands: &[RowBand],
    ) -> Result<Vec<WorkItem>, PipelineError> {
        let geometry = image.geometry();
        let mut items = Vec::with_capacity(bands.len());
        for band in bands {
            items.push(WorkItem {
                band: *band,
                geometry,
                window: image.copy_rows(band.window_rows())?,
            });
        }
        Ok(items)
    }

    /// Run every item on the pool. Blocks until all workers finish; the
    /// first failure fails the whole batch.
    pub fn process(
        &self,
        items: Vec<WorkItem>,
        filter: &dyn RowFilter,
    ) -> Result<Vec<BandOutput>, PipelineError> {
        let worker = Worker::new(filter);
        self.pool.install(|| {
            items
                .into_par_iter()
                .map(|item| worker.process(item))
                .collect()
        })
    }

    /// Concatenate outputs in worker-index order into a full image.
    pub fn assemble(
        &self,
        geometry: ImageGeometry,
        bands: &[RowBand],
        outputs: Vec<BandOutput>,
    ) -> Result<PixelBuffer, PipelineError> {
        if outputs.len() != bands.len() {
            return Err(PipelineError::Worker {
                index: outputs.len().min(bands.len()),
                reason: format!("{} outputs for {} bands", outputs.len(), bands.len()),
            });
        }

        let total = geometry.byte_len();
        let mut data = Vec::new();
        data.try_reserve_exact(total)
            .map_err(|_| PipelineError::AllocationFailure { bytes: total })?;

        for (band, output) in bands.iter().zip(outputs) {
            let expected = band.row_count as usize * geometry.stride();
            if output.owner_index != band.owner_index || output.pixels.data().len() != expected {
                return Err(PipelineError::Worker {
                    index: output.owner_index,
                    reason: format!(
                        "returned {} bytes for band {}, expected {expected}",
                        output.pixels.data().len(),
                        band.owner_index
                    ),
                });
            }
            data.extend_from_slice(output.pixels.data());
        }

        PixelBuffer::from_data(geometry.width, geometry.height, data)
    }

    /// Filter a whole image. Consumes the image: once the work items are
    /// copied out the input buffer is released.
    pub fn run(
        &self,
        image: PixelBuffer,
        filter: &dyn RowFilter,
    ) -> Result<PixelBuffer, PipelineError> {
        let geometry = image.geometry();
        let bands = self.plan(geometry, filter)?;
        let items = self.distribute(&image, &bands)?;
        drop(image);

        let t0 = Instant::now();
        let outputs = self.process(items, filter)?;
        info!(
            workers = self.workers,
            filter = filter.name(),
            elapsed_ms = t0.elapsed().as_millis(),
            "all bands processed"
        );

        self.assemble(geometry, &bands, outputs)
    }
}
