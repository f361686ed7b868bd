//! TrueType collections.

use crate::sfnt::FontBuilder;
use crate::{pad4, Put};

/// A version 1.0 collection of the fonts in order. Each font gets its own copy of its tables.
pub fn collection(fonts: &[FontBuilder]) -> Vec<u8> {
    let header_len = 12 + 4 * fonts.len();
    let mut offsets = Vec::with_capacity(fonts.len());
    let mut body = Vec::new();
    for font in fonts {
        let offset = header_len + body.len();
        offsets.push(offset as u32);
        body.extend(font.build_at(offset));
        pad4(&mut body);
    }

    let mut data = Vec::new();
    data.extend_from_slice(b"ttcf");
    data.put_u32(0x0001_0000).put_u32(fonts.len() as u32);
    for offset in offsets {
        data.put_u32(offset);
    }
    data.extend(body);
    data
}
