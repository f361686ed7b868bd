//! Decompression and table reconstruction of WOFF2 fonts.
//! See spec: https://www.w3.org/TR/WOFF2/

mod transform;

pub use transform::{decode_triplets, read_255_u16, reconstruct_glyf};

use std::fmt;

use once_cell::unsync::OnceCell;

use crate::decompress::Decompressor;
use crate::error::{Error, Result};
use crate::stream::DecodeStream;

/// The Brotli compressed table data following a WOFF2 directory. It is decompressed once, on the
/// first table access.
pub(crate) struct Payload {
    source: DecodeStream,
    /// Position right after the directory.
    offset: usize,
    compressed_length: usize,
    /// End of the last table in the decompressed data.
    decompressed_length: usize,
    decompressed: OnceCell<DecodeStream>,
}

impl Payload {
    pub(crate) fn new(
        source: DecodeStream,
        offset: usize,
        compressed_length: usize,
        decompressed_length: usize,
    ) -> Self {
        Payload {
            source,
            offset,
            compressed_length,
            decompressed_length,
            decompressed: OnceCell::new(),
        }
    }

    pub(crate) fn is_decompressed(&self) -> bool {
        self.decompressed.get().is_some()
    }

    /// A stream over the decompressed table data. Table offsets of the directory are relative to
    /// its start.
    pub(crate) fn stream(&self, decompressor: &dyn Decompressor) -> Result<&DecodeStream> {
        self.decompressed.get_or_try_init(|| {
            let mut source = self.source.clone();
            source.seek(self.offset)?;
            let compressed = source.read_bytes(self.compressed_length)?;
            let data = decompressor.decompress_brotli(compressed, self.decompressed_length)?;
            if data.len() != self.decompressed_length {
                return Err(Error::invalid(format!(
                    "WOFF2 table data decompressed to {} bytes, expected {}",
                    data.len(),
                    self.decompressed_length
                )));
            }
            log::debug!(
                "decompressed {} bytes of WOFF2 table data into {} bytes",
                self.compressed_length,
                data.len()
            );
            Ok(DecodeStream::new(data))
        })
    }
}

impl fmt::Debug for Payload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Payload")
            .field("offset", &self.offset)
            .field("compressed_length", &self.compressed_length)
            .field("decompressed_length", &self.decompressed_length)
            .field("decompressed", &self.is_decompressed())
            .finish()
    }
}
