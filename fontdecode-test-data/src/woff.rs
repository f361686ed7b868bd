//! WOFF 1.0 font files.

use std::io::Write;

use flate2::write::ZlibEncoder;
use flate2::Compression;

use crate::sfnt::{checksum, FontBuilder};
use crate::{pad4, Put};

/// Compresses into a zlib stream: the two byte header, raw DEFLATE data and the Adler-32
/// checksum.
pub fn zlib(data: &[u8]) -> Vec<u8> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::best());
    encoder.write_all(data).unwrap();
    encoder.finish().unwrap()
}

/// Tables are stored compressed when that makes them smaller.
pub(crate) fn build(font: &FontBuilder) -> Vec<u8> {
    let num_tables = font.tables.len();
    let header_len = 44 + 20 * num_tables;

    let mut directory = Vec::new();
    let mut body = Vec::new();
    let mut sfnt_size = 12 + 16 * num_tables;
    for table in &font.tables {
        assert!(
            table.orig_length.is_none(),
            "transformed tables are only supported in WOFF2"
        );
        let compressed = zlib(&table.data);
        let stored = if compressed.len() < table.data.len() {
            compressed
        } else {
            table.data.clone()
        };
        directory.extend_from_slice(&table.tag);
        directory
            .put_u32((header_len + body.len()) as u32)
            .put_u32(stored.len() as u32)
            .put_u32(table.data.len() as u32)
            .put_u32(checksum(&table.data));
        body.extend(stored);
        pad4(&mut body);
        sfnt_size += (table.data.len() + 3) & !3;
    }

    let mut data = Vec::new();
    data.extend_from_slice(b"wOFF");
    data.put_u32(0x0001_0000)
        .put_u32((header_len + body.len()) as u32)
        .put_u16(num_tables as u16)
        .put_u16(0)
        .put_u32(sfnt_size as u32)
        .put_u16(1)
        .put_u16(0);
    // no metadata or private data
    for _ in 0..5 {
        data.put_u32(0);
    }
    data.extend(directory);
    data.extend(body);
    data
}
