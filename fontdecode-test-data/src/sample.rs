//! A small but complete TrueType font. Printable ASCII maps to glyph ids in the standard
//! Macintosh order ('A' is glyph 36), '€' to [`EURO`].

use crate::cmap::{self, Segment};
use crate::glyf::{self, ComponentRecord, Contour};
use crate::sfnt::FontBuilder;
use crate::tables;
use crate::woff2::{transform_glyf, TransformedGlyph};
use crate::Put;

pub const NUM_GLYPHS: u16 = 99;
pub const A: u16 = 36;
pub const EURO: u16 = 98;
pub const UNITS_PER_EM: u16 = 1000;
pub const NOTDEF_ADVANCE: u16 = 500;
pub const ADVANCE: u16 = 600;

fn outline(glyph_id: u16) -> TransformedGlyph {
    match glyph_id {
        A => TransformedGlyph::Simple(vec![
            Contour(vec![(true, 0, 0), (true, 300, 700), (true, 600, 0)]),
            Contour(vec![(true, 200, 200), (false, 300, 300), (true, 400, 200)]),
        ]),
        EURO => TransformedGlyph::Composite(
            [50, -10, 650, 690],
            vec![ComponentRecord::offset(A, 50, -10)],
        ),
        _ => TransformedGlyph::Empty,
    }
}

fn glyph_data(glyph_id: u16) -> Vec<u8> {
    match outline(glyph_id) {
        TransformedGlyph::Empty => Vec::new(),
        TransformedGlyph::Simple(contours) => glyf::simple(&contours),
        TransformedGlyph::Composite(bbox, records) => glyf::composite_with_bbox(bbox, &records),
    }
}

/// Raw `glyf` data and long `loca` offsets.
fn glyf_and_loca() -> (Vec<u8>, Vec<u8>) {
    let mut glyf = Vec::new();
    let mut loca = Vec::new();
    for glyph_id in 0..NUM_GLYPHS {
        loca.put_u32(glyf.len() as u32);
        glyf.extend(glyph_data(glyph_id));
        crate::pad4(&mut glyf);
    }
    loca.put_u32(glyf.len() as u32);
    (glyf, loca)
}

/// The tables every variant of the sample font shares, in directory order.
fn common_tables(postscript_name: &str) -> Vec<([u8; 4], Vec<u8>)> {
    let mut metrics = vec![(NOTDEF_ADVANCE, 0)];
    metrics.extend((1..NUM_GLYPHS).map(|_| (ADVANCE, 10)));

    // glyph names follow the standard order up to 'asciitilde', the Euro sign has its own
    let mut name_index: Vec<u16> = (0..EURO).collect();
    name_index.push(258);

    let full_name = postscript_name.replace('-', " ");
    vec![
        (*b"OS/2", tables::os2(4, 400, 500, 700)),
        (
            *b"cmap",
            cmap::table(&[(
                3,
                1,
                cmap::format4(&[
                    Segment::delta(0x20, 0x7e, -29),
                    Segment::glyphs(0x20ac, 0x20ac, &[EURO]),
                ]),
            )]),
        ),
        (*b"head", tables::head(UNITS_PER_EM, 1, [0, -10, 650, 700])),
        (*b"hhea", tables::hhea(800, -200, 90, NUM_GLYPHS)),
        (*b"hmtx", tables::hmtx(&metrics, &[])),
        (*b"maxp", tables::maxp(NUM_GLYPHS)),
        (
            *b"name",
            tables::name(&[
                (3, 1, 0x0409, 0, "© Test Foundry"),
                (3, 1, 0x0409, 1, "Sample"),
                (3, 1, 0x0409, 2, "Regular"),
                (3, 1, 0x0409, 4, full_name.as_str()),
                (3, 1, 0x0409, 5, "Version 1.000"),
                (3, 1, 0x0409, 6, postscript_name),
            ]),
        ),
        (*b"post", tables::post_v2(&name_index, &["Euro"])),
    ]
}

/// The sample font with raw `glyf` and `loca` tables.
pub fn font(postscript_name: &str) -> FontBuilder {
    let (glyf, loca) = glyf_and_loca();
    let mut builder = FontBuilder::new();
    for (tag, data) in common_tables(postscript_name) {
        builder.add(&tag, data);
    }
    builder.add(b"glyf", glyf).add(b"loca", loca);
    builder
}

/// The sample font with transformed `glyf` and `loca` tables, for WOFF2.
pub fn transformed_font(postscript_name: &str) -> FontBuilder {
    let (glyf, loca) = glyf_and_loca();
    let outlines: Vec<_> = (0..NUM_GLYPHS).map(outline).collect();
    let mut builder = FontBuilder::new();
    for (tag, data) in common_tables(postscript_name) {
        builder.add(&tag, data);
    }
    builder
        .add_transformed(b"glyf", transform_glyf(&outlines), glyf.len() as u32)
        .add_transformed(b"loca", Vec::new(), loca.len() as u32);
    builder
}
