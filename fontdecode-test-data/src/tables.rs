//! Builders for the fixed layout tables.

use crate::Put;

fn fixed(value: f64) -> i32 {
    (value * 65536.0).round() as i32
}

/// A `head` table with revision 1.5, the bold style bit set and the given metrics.
pub fn head(units_per_em: u16, index_to_loc_format: i16, bbox: [i16; 4]) -> Vec<u8> {
    let mut data = Vec::new();
    data.put_u32(0x0001_0000)
        .put_i32(fixed(1.5))
        .put_u32(0)
        .put_u32(0x5f0f_3cf5)
        .put_u16(0)
        .put_u16(units_per_em)
        .put_i32(0)
        .put_i32(0)
        .put_i32(0)
        .put_i32(0);
    for value in bbox.iter() {
        data.put_i16(*value);
    }
    data.put_u16(0x0001)
        .put_u16(8)
        .put_i16(2)
        .put_i16(index_to_loc_format)
        .put_i16(0);
    data
}

pub fn hhea(ascent: i16, descent: i16, line_gap: i16, number_of_metrics: u16) -> Vec<u8> {
    let mut data = Vec::new();
    data.put_u32(0x0001_0000)
        .put_i16(ascent)
        .put_i16(descent)
        .put_i16(line_gap)
        .put_u16(1000)
        .put_i16(0)
        .put_i16(0)
        .put_i16(1000)
        .put_i16(1)
        .put_i16(0)
        .put_i16(0);
    data.extend_from_slice(&[0; 8]);
    data.put_i16(0).put_u16(number_of_metrics);
    data
}

/// A version 1.0 `maxp` table.
pub fn maxp(num_glyphs: u16) -> Vec<u8> {
    let mut data = Vec::new();
    data.put_u32(0x0001_0000).put_u16(num_glyphs);
    // maxPoints through maxComponentElements
    for _ in 0..12 {
        data.put_u16(0);
    }
    // maxComponentDepth
    data.put_u16(1);
    data
}

/// An `hmtx` table of `(advance, bearing)` metrics followed by left side bearings.
pub fn hmtx(metrics: &[(u16, i16)], bearings: &[i16]) -> Vec<u8> {
    let mut data = Vec::new();
    for (advance, bearing) in metrics {
        data.put_u16(*advance).put_i16(*bearing);
    }
    for bearing in bearings {
        data.put_i16(*bearing);
    }
    data
}

/// An `OS/2` table of the given version with vendor id `TEST`. Heights are only written for
/// version 2 and later.
pub fn os2(version: u16, weight_class: u16, x_height: i16, cap_height: i16) -> Vec<u8> {
    let mut data = Vec::new();
    data.put_u16(version)
        .put_i16(500)
        .put_u16(weight_class)
        .put_u16(5)
        .put_u16(0);
    // subscript, superscript and strikeout metrics, family class
    for _ in 0..11 {
        data.put_i16(0);
    }
    data.extend_from_slice(&[0; 10]);
    data.extend_from_slice(&[0; 16]);
    data.extend_from_slice(b"TEST");
    data.put_u16(0x0040).put_u16(0x20).put_u16(0xffff);
    data.put_i16(800)
        .put_i16(-200)
        .put_i16(0)
        .put_u16(1000)
        .put_u16(200);
    if version >= 1 {
        data.put_u32(1).put_u32(0);
    }
    if version >= 2 {
        data.put_i16(x_height)
            .put_i16(cap_height)
            .put_u16(0)
            .put_u16(0x20)
            .put_u16(2);
    }
    if version >= 5 {
        data.put_u16(0).put_u16(0xffff);
    }
    data
}

fn post_header(version: u32, italic_angle: f64, position: i16, thickness: i16, fixed_pitch: bool) -> Vec<u8> {
    let mut data = Vec::new();
    data.put_u32(version)
        .put_i32(fixed(italic_angle))
        .put_i16(position)
        .put_i16(thickness)
        .put_u32(fixed_pitch as u32);
    for _ in 0..4 {
        data.put_u32(0);
    }
    data
}

/// A version 3.0 `post` table without glyph names.
pub fn post_v3(italic_angle: f64, underline_position: i16, underline_thickness: i16, fixed_pitch: bool) -> Vec<u8> {
    post_header(
        0x0003_0000,
        italic_angle,
        underline_position,
        underline_thickness,
        fixed_pitch,
    )
}

/// A version 2.0 `post` table. Indices below 258 refer to the standard Macintosh names, larger
/// ones to `names`.
pub fn post_v2(glyph_name_index: &[u16], names: &[&str]) -> Vec<u8> {
    let mut data = post_header(0x0002_0000, 0.0, -100, 50, false);
    data.put_u16(glyph_name_index.len() as u16);
    for index in glyph_name_index {
        data.put_u16(*index);
    }
    for name in names {
        data.put_u8(name.len() as u8);
        data.extend_from_slice(name.as_bytes());
    }
    data
}

fn mac_roman(value: &str) -> Vec<u8> {
    value
        .chars()
        .map(|c| match c {
            '©' => 0xa9,
            '®' => 0xa8,
            '€' => 0xdb,
            c if (c as u32) < 0x80 => c as u8,
            c => panic!("{:?} is not supported in Mac OS Roman fixtures", c),
        })
        .collect()
}

fn utf16be(value: &str) -> Vec<u8> {
    value.encode_utf16().flat_map(|unit| unit.to_be_bytes().to_vec()).collect()
}

/// A version 0 `name` table of `(platform_id, encoding_id, language_id, name_id, value)`
/// records. Values are encoded as UTF-16BE for the Unicode and Windows platforms and as Mac OS
/// Roman for the Macintosh platform.
pub fn name(records: &[(u16, u16, u16, u16, &str)]) -> Vec<u8> {
    let mut storage = Vec::new();
    let mut data = Vec::new();
    data.put_u16(0)
        .put_u16(records.len() as u16)
        .put_u16(6 + 12 * records.len() as u16);
    for (platform_id, encoding_id, language_id, name_id, value) in records {
        let encoded = match *platform_id {
            1 => mac_roman(value),
            _ => utf16be(value),
        };
        data.put_u16(*platform_id)
            .put_u16(*encoding_id)
            .put_u16(*language_id)
            .put_u16(*name_id)
            .put_u16(encoded.len() as u16)
            .put_u16(storage.len() as u16);
        storage.extend(encoded);
    }
    data.extend(storage);
    data
}
