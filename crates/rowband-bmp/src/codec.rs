use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use rowband_core::{CHANNELS, ImageGeometry, PipelineError, PixelBuffer, try_alloc};

use crate::header::{BmpHeader, BmpInfoHeader, FILE_HEADER_LEN, HEADERS_LEN, INFO_HEADER_LEN};

/// Everything in a bitmap file except the pixel rows, kept verbatim.
#[derive(Clone, Debug)]
pub struct BmpHeaders {
    pub header: BmpHeader,
    pub info: BmpInfoHeader,
    /// Bytes between the info header and the pixel data offset.
    pub extra: Vec<u8>,
    /// Bytes after the last pixel row.
    pub trailer: Vec<u8>,
}

impl BmpHeaders {
    /// Dimensions described by the info header. Validated on decode.
    pub fn geometry(&self) -> ImageGeometry {
        ImageGeometry::new(
            self.info.width().unsigned_abs(),
            self.info.height().unsigned_abs(),
        )
    }
}

/// A 24-bit uncompressed bitmap with unpadded pixels.
#[derive(Clone, Debug)]
pub struct BmpImage {
    headers: BmpHeaders,
    pixels: PixelBuffer,
}

/// On-disk row length: rows are padded to a multiple of four bytes.
pub fn padded_stride(width: u32) -> usize {
    (width as usize * CHANNELS + 3) & !3
}

impl BmpImage {
    /// Wrap a pixel buffer in fresh headers.
    pub fn from_pixels(pixels: PixelBuffer) -> Result<Self, PipelineError> {
        let too_large = || PipelineError::invalid("image too large for a bitmap header");
        let width = i32::try_from(pixels.width()).map_err(|_| too_large())?;
        let height = i32::try_from(pixels.height()).map_err(|_| too_large())?;
        let image_size = padded_stride(pixels.width())
            .checked_mul(pixels.height() as usize)
            .and_then(|n| u32::try_from(n).ok())
            .ok_or_else(too_large)?;
        let file_size = image_size.checked_add(HEADERS_LEN as u32).ok_or_else(too_large)?;

        Ok(Self {
            headers: BmpHeaders {
                header: BmpHeader::new(file_size, HEADERS_LEN as u32),
                info: BmpInfoHeader::rgb24(width, height, image_size),
                extra: Vec::new(),
                trailer: Vec::new(),
            },
            pixels,
        })
    }

    /// Parse a complete bitmap file.
    pub fn decode(bytes: &[u8]) -> Result<Self, PipelineError> {
        if bytes.len() < 2 || bytes[..2] != *b"BM" {
            return Err(PipelineError::invalid("missing BM signature"));
        }
        if bytes.len() < HEADERS_LEN {
            return Err(PipelineError::invalid(format!(
                "truncated headers: {} bytes",
                bytes.len()
            )));
        }

        let header: BmpHeader = bytemuck::pod_read_unaligned(&bytes[..FILE_HEADER_LEN]);
        let info: BmpInfoHeader =
            bytemuck::pod_read_unaligned(&bytes[FILE_HEADER_LEN..HEADERS_LEN]);
        let geometry = validate(&info)?;

        let offset = header.pixel_offset() as usize;
        if offset < HEADERS_LEN || offset > bytes.len() {
            return Err(PipelineError::invalid(format!(
                "pixel data offset {offset} outside file of {} bytes",
                bytes.len()
            )));
        }

        let disk_stride = padded_stride(geometry.width);
        let data_len = disk_stride
            .checked_mul(geometry.height as usize)
            .ok_or_else(|| PipelineError::invalid("image dimensions overflow"))?;
        let pixel_bytes = &bytes[offset..];
        if pixel_bytes.len() < data_len {
            return Err(PipelineError::invalid(format!(
                "pixel data truncated: need {data_len} bytes, have {}",
                pixel_bytes.len()
            )));
        }
        if info.image_size() != 0 && info.image_size() as usize != data_len {
            warn!(
                declared = info.image_size(),
                actual = data_len,
                "image size field disagrees with dimensions"
            );
        }

        let stride = geometry.stride();
        let mut data = try_alloc(geometry.byte_len())?;
        for (dst, src) in data
            .chunks_exact_mut(stride)
            .zip(pixel_bytes.chunks_exact(disk_stride))
        {
            dst.copy_from_slice(&src[..stride]);
        }

        Ok(Self {
            headers: BmpHeaders {
                header,
                info,
                extra: bytes[HEADERS_LEN..offset].to_vec(),
                trailer: pixel_bytes[data_len..].to_vec(),
            },
            pixels: PixelBuffer::from_data(geometry.width, geometry.height, data)?,
        })
    }

    /// Serialize headers, preserved bytes and padded pixel rows.
    pub fn encode(&self) -> Result<Vec<u8>, PipelineError> {
        let stride = self.pixels.stride();
        let disk_stride = padded_stride(self.pixels.width());
        let headers = &self.headers;
        let total = HEADERS_LEN
            + headers.extra.len()
            + disk_stride * self.pixels.height() as usize
            + headers.trailer.len();

        let mut out = Vec::new();
        out.try_reserve_exact(total)
            .map_err(|_| PipelineError::AllocationFailure { bytes: total })?;
        out.extend_from_slice(bytemuck::bytes_of(&headers.header));
        out.extend_from_slice(bytemuck::bytes_of(&headers.info));
        out.extend_from_slice(&headers.extra);
        for row in self.pixels.data().chunks_exact(stride) {
            out.extend_from_slice(row);
            out.resize(out.len() + disk_stride - stride, 0);
        }
        out.extend_from_slice(&headers.trailer);
        Ok(out)
    }

    pub fn read(path: &Path) -> Result<Self, PipelineError> {
        let bytes =
            fs::read(path).map_err(|e| PipelineError::io(format!("read {}", path.display()), e))?;
        let image = Self::decode(&bytes)?;
        info!(
            ?path,
            width = image.pixels.width(),
            height = image.pixels.height(),
            "loaded bitmap"
        );
        Ok(image)
    }

    /// Write to `path` through a sibling `.partial` file. A failed write
    /// leaves nothing at `path`.
    pub fn write(&self, path: &Path) -> Result<(), PipelineError> {
        let bytes = self.encode()?;
        let tmp = partial_path(path);

        if let Err(e) = fs::write(&tmp, &bytes) {
            let _ = fs::remove_file(&tmp);
            return Err(PipelineError::io(format!("write {}", tmp.display()), e));
        }
        if let Err(e) = fs::rename(&tmp, path) {
            let _ = fs::remove_file(&tmp);
            return Err(PipelineError::io(
                format!("rename {} to {}", tmp.display(), path.display()),
                e,
            ));
        }
        debug!(?path, size = bytes.len(), "wrote bitmap");
        Ok(())
    }

    pub fn headers(&self) -> &BmpHeaders {
        &self.headers
    }

    pub fn pixels(&self) -> &PixelBuffer {
        &self.pixels
    }

    pub fn geometry(&self) -> ImageGeometry {
        self.pixels.geometry()
    }

    /// Hand the pixels to a caller that will transform them; the headers
    /// come back together with the result through [`BmpImage::from_parts`].
    pub fn into_parts(self) -> (BmpHeaders, PixelBuffer) {
        (self.headers, self.pixels)
    }

    /// Reattach pixels to headers. The geometry must match the info header.
    pub fn from_parts(headers: BmpHeaders, pixels: PixelBuffer) -> Result<Self, PipelineError> {
        let expected = headers.geometry();
        if pixels.geometry() != expected {
            return Err(PipelineError::invalid(format!(
                "pixel buffer is {}x{}, headers describe {}x{}",
                pixels.width(),
                pixels.height(),
                expected.width,
                expected.height
            )));
        }
        Ok(Self { headers, pixels })
    }

    /// Header fields as label/value pairs for diagnostics.
    pub fn summary_lines(&self) -> Vec<(String, String)> {
        let h = &self.headers.header;
        let i = &self.headers.info;
        let (reserved1, reserved2) = h.reserved();
        let (x_ppm, y_ppm) = i.resolution();
        vec![
            ("Type".into(), String::from_utf8_lossy(&h.signature()).into_owned()),
            ("Size".into(), h.file_size().to_string()),
            ("Reserved1".into(), reserved1.to_string()),
            ("Reserved2".into(), reserved2.to_string()),
            ("Offset".into(), h.pixel_offset().to_string()),
            ("InfoSize".into(), i.size().to_string()),
            ("Width".into(), i.width().to_string()),
            ("Height".into(), i.height().to_string()),
            ("Planes".into(), i.planes().to_string()),
            ("BitCount".into(), i.bit_count().to_string()),
            ("Compression".into(), i.compression().to_string()),
            ("ImageSize".into(), i.image_size().to_string()),
            ("XPixelsPerMeter".into(), x_ppm.to_string()),
            ("YPixelsPerMeter".into(), y_ppm.to_string()),
            ("ColorsUsed".into(), i.colors_used().to_string()),
            ("ColorsImportant".into(), i.colors_important().to_string()),
        ]
    }
}

fn validate(info: &BmpInfoHeader) -> Result<ImageGeometry, PipelineError> {
    if (info.size() as usize) < INFO_HEADER_LEN {
        return Err(PipelineError::invalid(format!(
            "unsupported info header size {}",
            info.size()
        )));
    }
    if info.bit_count() != 24 {
        return Err(PipelineError::invalid(format!(
            "{} bits per pixel, only 24 is supported",
            info.bit_count()
        )));
    }
    if info.compression() != 0 {
        return Err(PipelineError::invalid(format!(
            "compression method {} is not supported",
            info.compression()
        )));
    }
    if info.width() <= 0 || info.height() == 0 {
        return Err(PipelineError::invalid(format!(
            "invalid dimensions {}x{}",
            info.width(),
            info.height()
        )));
    }
    Ok(ImageGeometry::new(
        info.width().unsigned_abs(),
        info.height().unsigned_abs(),
    ))
}

fn partial_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".partial");
    PathBuf::from(name)
}
