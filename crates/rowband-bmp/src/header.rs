use bytemuck::{Pod, Zeroable};

pub const FILE_HEADER_LEN: usize = 14;
pub const INFO_HEADER_LEN: usize = 40;
pub const HEADERS_LEN: usize = FILE_HEADER_LEN + INFO_HEADER_LEN;

/// `BM` as stored in the first two bytes.
pub const SIGNATURE: [u8; 2] = *b"BM";

const DEFAULT_PIXELS_PER_METER: i32 = 2835;

/// Bitmap file header, laid out exactly as on disk (native byte order).
///
/// Fields are private: references into a packed struct are unsound, so
/// everything goes through by-value accessors.
#[repr(C, packed)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
pub struct BmpHeader {
    signature: [u8; 2],
    file_size: u32,
    reserved1: u16,
    reserved2: u16,
    pixel_offset: u32,
}

impl BmpHeader {
    pub fn new(file_size: u32, pixel_offset: u32) -> Self {
        Self {
            signature: SIGNATURE,
            file_size,
            reserved1: 0,
            reserved2: 0,
            pixel_offset,
        }
    }

    pub fn signature(&self) -> [u8; 2] {
        self.signature
    }

    pub fn has_valid_signature(&self) -> bool {
        self.signature == SIGNATURE
    }

    pub fn file_size(&self) -> u32 {
        self.file_size
    }

    pub fn reserved(&self) -> (u16, u16) {
        (self.reserved1, self.reserved2)
    }

    pub fn pixel_offset(&self) -> u32 {
        self.pixel_offset
    }
}

/// BITMAPINFOHEADER, laid out exactly as on disk (native byte order).
#[repr(C, packed)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
pub struct BmpInfoHeader {
    size: u32,
    width: i32,
    height: i32,
    planes: u16,
    bit_count: u16,
    compression: u32,
    image_size: u32,
    x_pixels_per_meter: i32,
    y_pixels_per_meter: i32,
    colors_used: u32,
    colors_important: u32,
}

impl BmpInfoHeader {
    /// Uncompressed 24-bit header for a `width` x `height` bottom-up image.
    pub fn rgb24(width: i32, height: i32, image_size: u32) -> Self {
        Self {
            size: INFO_HEADER_LEN as u32,
            width,
            height,
            planes: 1,
            bit_count: 24,
            compression: 0,
            image_size,
            x_pixels_per_meter: DEFAULT_PIXELS_PER_METER,
            y_pixels_per_meter: DEFAULT_PIXELS_PER_METER,
            colors_used: 0,
            colors_important: 0,
        }
    }

    pub fn size(&self) -> u32 {
        self.size
    }

    pub fn width(&self) -> i32 {
        self.width
    }

    /// Negative for top-down images.
    pub fn height(&self) -> i32 {
        self.height
    }

    pub fn planes(&self) -> u16 {
        self.planes
    }

    pub fn bit_count(&self) -> u16 {
        self.bit_count
    }

    pub fn compression(&self) -> u32 {
        self.compression
    }

    pub fn image_size(&self) -> u32 {
        self.image_size
    }

    pub fn resolution(&self) -> (i32, i32) {
        (self.x_pixels_per_meter, self.y_pixels_per_meter)
    }

    pub fn colors_used(&self) -> u32 {
        self.colors_used
    }

    pub fn colors_important(&self) -> u32 {
        self.colors_important
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn struct_sizes_match_disk_layout() {
        assert_eq!(std::mem::size_of::<BmpHeader>(), FILE_HEADER_LEN);
        assert_eq!(std::mem::size_of::<BmpInfoHeader>(), INFO_HEADER_LEN);
    }

    #[test]
    fn header_bytes_start_with_signature() {
        let header = BmpHeader::new(70, 54);
        let bytes = bytemuck::bytes_of(&header);
        assert_eq!(&bytes[..2], b"BM");
        assert!(header.has_valid_signature());
    }

    #[test]
    fn rgb24_defaults() {
        let info = BmpInfoHeader::rgb24(4, -3, 48);
        assert_eq!(info.size(), 40);
        assert_eq!(info.planes(), 1);
        assert_eq!(info.bit_count(), 24);
        assert_eq!(info.compression(), 0);
        assert_eq!(info.height(), -3);
        assert_eq!(info.resolution(), (2835, 2835));
    }

    #[test]
    fn info_header_round_trips_through_bytes() {
        let info = BmpInfoHeader::rgb24(640, 480, 640 * 480 * 3);
        let copy: BmpInfoHeader = bytemuck::pod_read_unaligned(bytemuck::bytes_of(&info));
        assert_eq!(copy.width(), 640);
        assert_eq!(copy.height(), 480);
        assert_eq!(copy.image_size(), 640 * 480 * 3);
    }
}
