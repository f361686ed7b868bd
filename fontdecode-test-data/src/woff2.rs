//! WOFF2 font files, Brotli streams and transformed `glyf` tables.

use crate::glyf::{components, Contour, ComponentRecord};
use crate::sfnt::FontBuilder;
use crate::{pad4, Put};

const KNOWN_TAGS: [&str; 63] = [
    "cmap", "head", "hhea", "hmtx", "maxp", "name", "OS/2", "post", "cvt ", "fpgm", "glyf", "loca",
    "prep", "CFF ", "VORG", "EBDT", "EBLC", "gasp", "hdmx", "kern", "LTSH", "PCLT", "VDMX", "vhea",
    "vmtx", "BASE", "GDEF", "GPOS", "GSUB", "EBSC", "JSTF", "MATH", "CBDT", "CBLC", "COLR", "CPAL",
    "SVG ", "sbix", "acnt", "avar", "bdat", "bloc", "bsln", "cvar", "fdsc", "feat", "fmtx", "fvar",
    "gvar", "hsty", "just", "lcar", "mort", "morx", "opbd", "prop", "trak", "Zapf", "Silf", "Glat",
    "Gloc", "Feat", "Sill",
];

/// A Brotli stream of uncompressed meta-blocks, followed by an empty last meta-block.
pub fn brotli_stored(data: &[u8]) -> Vec<u8> {
    if data.is_empty() {
        // WBITS 16, ISLAST, ISLASTEMPTY
        return vec![0x06];
    }
    let mut out = Vec::new();
    for (i, chunk) in data.chunks(1 << 16).enumerate() {
        let mlen = chunk.len() as u32 - 1;
        // ISLAST = 0, MNIBBLES = 4, MLEN - 1, ISUNCOMPRESSED = 1. The stream header (WBITS) is a
        // single zero bit in front of the first meta-block.
        let header = if i == 0 {
            (mlen << 4) | (1 << 20)
        } else {
            (mlen << 3) | (1 << 19)
        };
        out.extend_from_slice(&header.to_le_bytes()[..3]);
        out.extend_from_slice(chunk);
    }
    out.push(0x03);
    out
}

fn put_base128(out: &mut Vec<u8>, value: u32) {
    let mut bytes = vec![(value & 0x7f) as u8];
    let mut rest = value >> 7;
    while rest != 0 {
        bytes.push((rest & 0x7f) as u8 | 0x80);
        rest >>= 7;
    }
    bytes.reverse();
    out.extend(bytes);
}

fn put_255_u16(out: &mut Vec<u8>, value: u16) {
    match value {
        0..=252 => {
            out.put_u8(value as u8);
        }
        253..=505 => {
            out.put_u8(255).put_u8((value - 253) as u8);
        }
        506..=761 => {
            out.put_u8(254).put_u8((value - 506) as u8);
        }
        _ => {
            out.put_u8(253).put_u16(value);
        }
    }
}

/// Appends a point delta using the one byte forms for deltas along a single axis and the two
/// word form otherwise.
fn put_triplet(on_curve: bool, dx: i32, dy: i32, flags: &mut Vec<u8>, glyphs: &mut Vec<u8>) {
    let (ax, ay) = (dx.abs(), dy.abs());
    let flag = if dx == 0 && ay < 1280 {
        glyphs.put_u8((ay & 0xff) as u8);
        ((ay >> 8) << 1) as u8 | (dy >= 0) as u8
    } else if dy == 0 && ax < 1280 {
        glyphs.put_u8((ax & 0xff) as u8);
        (10 + ((ax >> 8) << 1)) as u8 | (dx >= 0) as u8
    } else {
        glyphs.put_u16(ax as u16).put_u16(ay as u16);
        124 | (dx >= 0) as u8 | (((dy >= 0) as u8) << 1)
    };
    flags.push(if on_curve { flag } else { flag | 0x80 });
}

#[derive(Debug, Clone, PartialEq)]
pub enum TransformedGlyph {
    Empty,
    /// Stored without an explicit bounding box.
    Simple(Vec<Contour>),
    /// Composite glyphs always carry an explicit bounding box.
    Composite([i16; 4], Vec<ComponentRecord>),
}

/// A transformed `glyf` table. Glyphs carry no instructions.
pub fn transform_glyf(glyphs: &[TransformedGlyph]) -> Vec<u8> {
    let mut n_contours = Vec::new();
    let mut n_points = Vec::new();
    let mut flags = Vec::new();
    let mut glyph_stream = Vec::new();
    let mut composites = Vec::new();
    let mut bbox_bitmap = vec![0u8; ((glyphs.len() + 31) >> 5) << 2];
    let mut bboxes = Vec::new();

    for (index, glyph) in glyphs.iter().enumerate() {
        match glyph {
            TransformedGlyph::Empty => {
                n_contours.put_i16(0);
            }
            TransformedGlyph::Simple(contours) => {
                n_contours.put_i16(contours.len() as i16);
                let (mut x, mut y) = (0i32, 0i32);
                for contour in contours {
                    put_255_u16(&mut n_points, contour.0.len() as u16);
                    for &(on_curve, px, py) in &contour.0 {
                        let (px, py) = (i32::from(px), i32::from(py));
                        put_triplet(on_curve, px - x, py - y, &mut flags, &mut glyph_stream);
                        x = px;
                        y = py;
                    }
                }
                // instruction length
                put_255_u16(&mut glyph_stream, 0);
            }
            TransformedGlyph::Composite(bbox, records) => {
                n_contours.put_i16(-1);
                composites.extend(components(records));
                bbox_bitmap[index >> 3] |= 0x80 >> (index & 7);
                for value in bbox.iter() {
                    bboxes.put_i16(*value);
                }
            }
        }
    }
    let mut bbox_stream = bbox_bitmap;
    bbox_stream.extend(bboxes);

    let streams = [
        n_contours,
        n_points,
        flags,
        glyph_stream,
        composites,
        bbox_stream,
        Vec::new(),
    ];
    let mut data = Vec::new();
    data.put_u32(0).put_u16(glyphs.len() as u16).put_u16(0);
    for stream in &streams {
        data.put_u32(stream.len() as u32);
    }
    for stream in &streams {
        data.extend_from_slice(stream);
    }
    data
}

/// Transform version 0 is the transformed form of `glyf` and `loca` but the null transform of all
/// other tables.
pub(crate) fn build(font: &FontBuilder) -> Vec<u8> {
    let mut directory = Vec::new();
    let mut payload = Vec::new();
    let mut sfnt_size = 12 + 16 * font.tables.len();
    for table in &font.tables {
        let index = KNOWN_TAGS
            .iter()
            .position(|tag| tag.as_bytes() == &table.tag[..]);
        let glyf_or_loca = &table.tag == b"glyf" || &table.tag == b"loca";
        let version: u8 = match (table.orig_length, glyf_or_loca) {
            (Some(_), true) => 0,
            (None, true) => 3,
            (None, false) => 0,
            (Some(_), false) => panic!("only glyf and loca can be transformed"),
        };
        directory.put_u8(index.unwrap_or(63) as u8 | (version << 6));
        if index.is_none() {
            directory.extend_from_slice(&table.tag);
        }
        let orig_length = table.orig_length.unwrap_or(table.data.len() as u32);
        put_base128(&mut directory, orig_length);
        if table.orig_length.is_some() {
            put_base128(&mut directory, table.data.len() as u32);
        }
        payload.extend_from_slice(&table.data);
        sfnt_size += (orig_length as usize + 3) & !3;
    }
    let compressed = brotli_stored(&payload);

    let header_len = 48;
    let mut body = directory;
    body.extend(compressed.iter());
    pad4(&mut body);

    let mut data = Vec::new();
    data.extend_from_slice(b"wOF2");
    data.put_u32(0x0001_0000)
        .put_u32((header_len + body.len()) as u32)
        .put_u16(font.tables.len() as u16)
        .put_u16(0)
        .put_u32(sfnt_size as u32)
        .put_u32(compressed.len() as u32)
        .put_u16(1)
        .put_u16(0);
    // no metadata or private data
    for _ in 0..5 {
        data.put_u32(0);
    }
    data.extend(body);
    data
}
