use std::ops::Range;

use crate::error::PipelineError;
use crate::image_buf::PixelBuffer;

/// A transform over a range of image rows.
pub trait RowFilter: Send + Sync {
    fn name(&self) -> &str;

    /// Whether each owned row needs the rows directly above and below it.
    fn needs_halo(&self) -> bool;

    /// Transform rows `owned` of `src` into `dst`.
    ///
    /// `dst` holds exactly the owned rows (row `owned.start` of `src` is row 0
    /// of `dst`) and arrives pre-filled with the source bytes, so anything the
    /// filter leaves alone is copied through.
    fn apply(&self, src: &PixelBuffer, owned: Range<u32>, dst: &mut PixelBuffer);

    /// Run the filter over `owned`, returning a buffer of just those rows.
    fn process(&self, src: &PixelBuffer, owned: Range<u32>) -> Result<PixelBuffer, PipelineError> {
        let mut dst = src.copy_rows(owned.clone())?;
        self.apply(src, owned, &mut dst);
        Ok(dst)
    }
}
