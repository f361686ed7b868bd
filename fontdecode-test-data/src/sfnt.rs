//! Assembles plain SFNT font files from table data.

use crate::{pad4, Put};

#[derive(Debug, Clone)]
pub(crate) struct Table {
    pub(crate) tag: [u8; 4],
    pub(crate) data: Vec<u8>,
    /// Length of the table before its WOFF2 transform, for transformed tables.
    pub(crate) orig_length: Option<u32>,
}

/// Collects tables and writes them as SFNT, WOFF or WOFF2 font files. Tables keep the order in
/// which they were added, duplicates included.
#[derive(Debug, Default, Clone)]
pub struct FontBuilder {
    pub(crate) tables: Vec<Table>,
}

impl FontBuilder {
    pub fn new() -> Self {
        FontBuilder::default()
    }

    pub fn add(&mut self, tag: &[u8; 4], data: Vec<u8>) -> &mut Self {
        self.tables.push(Table {
            tag: *tag,
            data,
            orig_length: None,
        });
        self
    }

    /// Adds a table in WOFF2 transformed form. Only written by [`FontBuilder::build_woff2`].
    pub fn add_transformed(&mut self, tag: &[u8; 4], data: Vec<u8>, orig_length: u32) -> &mut Self {
        self.tables.push(Table {
            tag: *tag,
            data,
            orig_length: Some(orig_length),
        });
        self
    }

    pub fn build(&self) -> Vec<u8> {
        self.build_at(0)
    }

    /// Builds the font with table offsets as if it were placed at `base` inside a larger file.
    pub fn build_at(&self, base: usize) -> Vec<u8> {
        let num_tables = self.tables.len();
        let entry_selector = (num_tables.max(1) as f64).log2().floor() as u16;
        let search_range = 16 * (1u16 << entry_selector);

        let mut data = Vec::new();
        data.put_u32(0x0001_0000)
            .put_u16(num_tables as u16)
            .put_u16(search_range)
            .put_u16(entry_selector)
            .put_u16((16 * num_tables as u16).saturating_sub(search_range));

        let header_len = 12 + 16 * num_tables;
        let mut body = Vec::new();
        for table in &self.tables {
            assert!(
                table.orig_length.is_none(),
                "transformed tables are only supported in WOFF2"
            );
            data.extend_from_slice(&table.tag);
            data.put_u32(checksum(&table.data))
                .put_u32((base + header_len + body.len()) as u32)
                .put_u32(table.data.len() as u32);
            body.extend_from_slice(&table.data);
            pad4(&mut body);
        }
        data.extend(body);
        data
    }

    pub fn build_woff(&self) -> Vec<u8> {
        crate::woff::build(self)
    }

    pub fn build_woff2(&self) -> Vec<u8> {
        crate::woff2::build(self)
    }
}

pub(crate) fn checksum(data: &[u8]) -> u32 {
    data.chunks(4).fold(0u32, |sum, chunk| {
        let mut word = [0; 4];
        word[..chunk.len()].copy_from_slice(chunk);
        sum.wrapping_add(u32::from_be_bytes(word))
    })
}

/// Points the directory record of `tag` in a plain SFNT font at another offset.
pub fn corrupt_table_offset(font: &mut [u8], tag: &[u8; 4], offset: u32) {
    let num_tables = usize::from(u16::from_be_bytes([font[4], font[5]]));
    for i in 0..num_tables {
        let record = 12 + 16 * i;
        if &font[record..record + 4] == tag {
            font[record + 8..record + 12].copy_from_slice(&offset.to_be_bytes());
            return;
        }
    }
    panic!("no table record {:?}", tag);
}
