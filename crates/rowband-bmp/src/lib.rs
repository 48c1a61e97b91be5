pub mod codec;
pub mod header;

pub use codec::{BmpHeaders, BmpImage, padded_stride};
pub use header::{BmpHeader, BmpInfoHeader, FILE_HEADER_LEN, HEADERS_LEN, INFO_HEADER_LEN};
