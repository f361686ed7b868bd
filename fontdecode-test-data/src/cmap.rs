//! Builders for `cmap` tables and their subtables.

use crate::Put;

/// A `cmap` table of `(platform_id, encoding_id, subtable)` records, subtables stored in order.
pub fn table(subtables: &[(u16, u16, Vec<u8>)]) -> Vec<u8> {
    let mut data = Vec::new();
    data.put_u16(0).put_u16(subtables.len() as u16);
    let mut offset = 4 + 8 * subtables.len();
    for (platform_id, encoding_id, subtable) in subtables {
        data.put_u16(*platform_id)
            .put_u16(*encoding_id)
            .put_u32(offset as u32);
        offset += subtable.len();
    }
    for (_, _, subtable) in subtables {
        data.extend_from_slice(subtable);
    }
    data
}

/// A format 0 subtable over the 256 single byte codes.
pub fn format0(glyph_ids: &[u8]) -> Vec<u8> {
    assert_eq!(glyph_ids.len(), 256);
    let mut data = Vec::new();
    data.put_u16(0).put_u16(262).put_u16(0);
    data.extend_from_slice(glyph_ids);
    data
}

/// A segment of a format 4 subtable.
#[derive(Debug, Clone)]
pub struct Segment {
    start: u16,
    end: u16,
    delta: i16,
    glyphs: Vec<u16>,
}

impl Segment {
    /// Maps `start..=end` to `code + delta`.
    pub fn delta(start: u16, end: u16, delta: i16) -> Self {
        Segment {
            start,
            end,
            delta,
            glyphs: Vec::new(),
        }
    }

    /// Maps `start..=end` to the given glyph ids through the glyph index array.
    pub fn glyphs(start: u16, end: u16, glyphs: &[u16]) -> Self {
        assert_eq!(usize::from(end - start) + 1, glyphs.len());
        Segment {
            start,
            end,
            delta: 0,
            glyphs: glyphs.to_vec(),
        }
    }
}

/// A format 4 subtable. The terminating `0xFFFF` segment is appended.
pub fn format4(segments: &[Segment]) -> Vec<u8> {
    let mut segments = segments.to_vec();
    segments.push(Segment::delta(0xffff, 0xffff, 1));
    let seg_count = segments.len();

    let mut id_range_offsets = Vec::with_capacity(seg_count);
    let mut glyph_index_array = Vec::new();
    for (i, segment) in segments.iter().enumerate() {
        if segment.glyphs.is_empty() {
            id_range_offsets.push(0);
        } else {
            // bytes from this idRangeOffset entry to the segment's first glyph id
            id_range_offsets.push((2 * (seg_count - i + glyph_index_array.len())) as u16);
            glyph_index_array.extend_from_slice(&segment.glyphs);
        }
    }

    let entry_selector = (seg_count as f64).log2().floor() as u16;
    let search_range = 2 * (1u16 << entry_selector);
    let length = 16 + 8 * seg_count + 2 * glyph_index_array.len();

    let mut data = Vec::new();
    data.put_u16(4)
        .put_u16(length as u16)
        .put_u16(0)
        .put_u16(2 * seg_count as u16)
        .put_u16(search_range)
        .put_u16(entry_selector)
        .put_u16(2 * seg_count as u16 - search_range);
    for segment in &segments {
        data.put_u16(segment.end);
    }
    data.put_u16(0);
    for segment in &segments {
        data.put_u16(segment.start);
    }
    for segment in &segments {
        data.put_i16(segment.delta);
    }
    for offset in id_range_offsets {
        data.put_u16(offset);
    }
    for glyph in glyph_index_array {
        data.put_u16(glyph);
    }
    data
}

/// A format 6 subtable mapping consecutive codes starting at `first_code`.
pub fn format6(first_code: u16, glyph_ids: &[u16]) -> Vec<u8> {
    let mut data = Vec::new();
    data.put_u16(6)
        .put_u16(10 + 2 * glyph_ids.len() as u16)
        .put_u16(0)
        .put_u16(first_code)
        .put_u16(glyph_ids.len() as u16);
    for glyph in glyph_ids {
        data.put_u16(*glyph);
    }
    data
}

/// A format 10 subtable mapping consecutive 32 bit codes starting at `first_code`.
pub fn format10(first_code: u32, glyph_ids: &[u16]) -> Vec<u8> {
    let mut data = Vec::new();
    data.put_u16(10)
        .put_u16(0)
        .put_u32(20 + 2 * glyph_ids.len() as u32)
        .put_u32(0)
        .put_u32(first_code)
        .put_u32(glyph_ids.len() as u32);
    for glyph in glyph_ids {
        data.put_u16(*glyph);
    }
    data
}

fn groups(format: u16, groups: &[(u32, u32, u32)]) -> Vec<u8> {
    let mut data = Vec::new();
    data.put_u16(format)
        .put_u16(0)
        .put_u32(16 + 12 * groups.len() as u32)
        .put_u32(0)
        .put_u32(groups.len() as u32);
    for (start, end, glyph) in groups {
        data.put_u32(*start).put_u32(*end).put_u32(*glyph);
    }
    data
}

/// An empty format 8 subtable.
pub fn format8() -> Vec<u8> {
    let mut data = Vec::new();
    data.put_u16(8).put_u16(0).put_u32(8208).put_u32(0);
    data.extend_from_slice(&[0; 8192]);
    data.put_u32(0);
    data
}

/// A format 12 subtable of `(start, end, start_glyph_id)` groups.
pub fn format12(sequential: &[(u32, u32, u32)]) -> Vec<u8> {
    groups(12, sequential)
}

/// A format 13 subtable of `(start, end, glyph_id)` groups.
pub fn format13(constant: &[(u32, u32, u32)]) -> Vec<u8> {
    groups(13, constant)
}

/// A variation selector record of a format 14 subtable.
#[derive(Debug, Clone)]
pub struct VarSelector {
    pub selector: u32,
    /// `(start, additional_count)` ranges using the default glyph.
    pub default_ranges: Vec<(u32, u8)>,
    /// `(code_point, glyph_id)` mappings.
    pub non_default: Vec<(u32, u16)>,
}

/// A format 14 subtable. Empty UVS lists are stored as null offsets.
pub fn format14(selectors: &[VarSelector]) -> Vec<u8> {
    let mut lists = Vec::new();
    let mut records = Vec::new();
    let mut offset = 10 + 11 * selectors.len();
    for selector in selectors {
        records.put_u24(selector.selector);

        if selector.default_ranges.is_empty() {
            records.put_u32(0);
        } else {
            records.put_u32((offset + lists.len()) as u32);
            lists.put_u32(selector.default_ranges.len() as u32);
            for (start, additional) in &selector.default_ranges {
                lists.put_u24(*start).put_u8(*additional);
            }
        }

        if selector.non_default.is_empty() {
            records.put_u32(0);
        } else {
            records.put_u32((offset + lists.len()) as u32);
            lists.put_u32(selector.non_default.len() as u32);
            for (code_point, glyph) in &selector.non_default {
                lists.put_u24(*code_point).put_u16(*glyph);
            }
        }
    }
    offset += lists.len();

    let mut data = Vec::new();
    data.put_u16(14)
        .put_u32(offset as u32)
        .put_u32(selectors.len() as u32);
    data.extend(records);
    data.extend(lists);
    data
}
