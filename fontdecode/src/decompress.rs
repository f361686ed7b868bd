use crate::error::{Error, Result};

/// Compression codecs used by WOFF (zlib) and WOFF2 (Brotli) fonts.
pub trait Decompressor {
    /// Decompresses a complete Brotli stream into exactly `length` bytes.
    fn decompress_brotli(&self, data: &[u8], length: usize) -> Result<Vec<u8>>;

    /// Inflates raw DEFLATE data of a table into exactly `length` bytes.
    fn inflate(&self, tag: &str, data: &[u8], length: usize) -> Result<Vec<u8>>;
}

impl<T: Decompressor + ?Sized> Decompressor for std::rc::Rc<T> {
    fn decompress_brotli(&self, data: &[u8], length: usize) -> Result<Vec<u8>> {
        (**self).decompress_brotli(data, length)
    }

    fn inflate(&self, tag: &str, data: &[u8], length: usize) -> Result<Vec<u8>> {
        (**self).inflate(tag, data, length)
    }
}

/// Decompresses with `brotli-decompressor` and `flate2`, depending on the enabled features.
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultDecompressor;

impl Decompressor for DefaultDecompressor {
    #[cfg(feature = "woff2")]
    fn decompress_brotli(&self, data: &[u8], length: usize) -> Result<Vec<u8>> {
        use std::io::Read;

        // one extra byte tells an overlong stream apart from an exact one
        let mut out = Vec::new();
        brotli_decompressor::Decompressor::new(data, 4096)
            .take(length as u64 + 1)
            .read_to_end(&mut out)
            .map_err(|err| {
                log::debug!("brotli: {}", err);
                Error::Decompression
            })?;
        if out.is_empty() || out.len() != length {
            log::debug!(
                "brotli: decompressed to {} bytes, expected {}",
                out.len(),
                length
            );
            return Err(Error::Decompression);
        }
        Ok(out)
    }

    #[cfg(not(feature = "woff2"))]
    fn decompress_brotli(&self, _data: &[u8], _length: usize) -> Result<Vec<u8>> {
        Err(Error::Decompression)
    }

    #[cfg(feature = "woff")]
    fn inflate(&self, tag: &str, data: &[u8], length: usize) -> Result<Vec<u8>> {
        use std::io::Read;

        let mut out = Vec::with_capacity(length);
        flate2::read::DeflateDecoder::new(data)
            .take(length as u64 + 1)
            .read_to_end(&mut out)
            .map_err(|source| Error::Inflate {
                tag: tag.to_string(),
                source,
            })?;
        if out.len() != length {
            return Err(Error::Inflate {
                tag: tag.to_string(),
                source: std::io::Error::new(
                    std::io::ErrorKind::InvalidData,
                    format!("inflated to {} bytes, expected {}", out.len(), length),
                ),
            });
        }
        Ok(out)
    }

    #[cfg(not(feature = "woff"))]
    fn inflate(&self, tag: &str, _data: &[u8], _length: usize) -> Result<Vec<u8>> {
        Err(Error::Inflate {
            tag: tag.to_string(),
            source: std::io::Error::new(
                std::io::ErrorKind::Other,
                "built without the `woff` feature",
            ),
        })
    }
}

#[cfg(all(test, feature = "woff", feature = "woff2"))]
mod test {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_inflate() {
        let compressed = fontdecode_test_data::woff::zlib(b"hello hello hello");
        // skip the zlib header
        let out = DefaultDecompressor
            .inflate("test", &compressed[2..], 17)
            .unwrap();
        assert_eq!(out, b"hello hello hello".to_vec());
    }

    #[test]
    fn test_inflate_length_mismatch() {
        let compressed = fontdecode_test_data::woff::zlib(&[0; 10_000]);
        for length in [16, 20_000].iter().copied() {
            match DefaultDecompressor.inflate("glyf", &compressed[2..], length) {
                Err(Error::Inflate { tag, .. }) => assert_eq!(tag, "glyf"),
                other => panic!("unexpected result {:?}", other),
            }
        }
    }

    #[test]
    fn test_stored_brotli() {
        let compressed = fontdecode_test_data::woff2::brotli_stored(b"abcdef");
        assert_eq!(
            DefaultDecompressor.decompress_brotli(&compressed, 6).unwrap(),
            b"abcdef".to_vec()
        );
    }

    #[test]
    fn test_brotli_length_mismatch() {
        let compressed = fontdecode_test_data::woff2::brotli_stored(b"abcdef");
        assert!(matches!(
            DefaultDecompressor.decompress_brotli(&compressed, 3),
            Err(Error::Decompression)
        ));
        assert!(matches!(
            DefaultDecompressor.decompress_brotli(&compressed, 10),
            Err(Error::Decompression)
        ));
    }

    #[test]
    fn test_corrupt_brotli() {
        assert!(matches!(
            DefaultDecompressor.decompress_brotli(&[0xff, 0xff, 0xff, 0xff], 4),
            Err(Error::Decompression)
        ));
    }
}
