use std::cmp::Ordering;
use std::convert::TryFrom;

use crate::encodings::{legacy_cmap_encoding, Encoding};
use crate::error::{Error, Result};
use crate::schema::LazyArrayValue;
use crate::tables::cmap::{
    CmapSubtable, CmapTable, Format4, Groups, SequentialMapGroup, VariationSelectors,
};

/// Unicode subtables in order of preference: full repertoire formats first, then BMP formats.
const UNICODE_SUBTABLES: [(u16, u16); 8] = [
    (3, 10),
    (0, 6),
    (0, 4),
    (3, 1),
    (0, 3),
    (0, 2),
    (0, 1),
    (0, 0),
];

/// Maps code points to glyph ids through the preferred subtable of a font's `cmap`.
#[derive(Debug, Clone)]
pub struct CmapProcessor {
    subtable: CmapSubtable,
    /// Set when only a legacy subtable is available. Code points are re-encoded before lookup.
    encoding: Option<Encoding>,
    /// Unicode variation sequences (format 14).
    uvs: Option<VariationSelectors>,
}

impl CmapProcessor {
    pub fn new(cmap: &CmapTable) -> Result<Self> {
        let uvs = match cmap.record(0, 5) {
            Some(record) => match record.subtable()? {
                CmapSubtable::Format14(selectors) => Some(selectors),
                other => {
                    log::debug!("ignoring (0, 5) cmap subtable of format {}", other.format());
                    None
                }
            },
            None => None,
        };

        for (platform_id, encoding_id) in UNICODE_SUBTABLES.iter() {
            if let Some(record) = cmap.record(*platform_id, *encoding_id) {
                log::debug!("using cmap subtable ({}, {})", platform_id, encoding_id);
                return Ok(CmapProcessor {
                    subtable: record.subtable()?,
                    encoding: None,
                    uvs,
                });
            }
        }

        // the last legacy subtable wins
        for record in cmap.encoding_records().iter().rev() {
            let encoding = legacy_cmap_encoding(
                i64::from(record.platform_id()),
                i64::from(record.encoding_id()),
            );
            if let Some(encoding) = encoding {
                log::debug!(
                    "using legacy cmap subtable ({}, {}) with {:?}",
                    record.platform_id(),
                    record.encoding_id(),
                    encoding
                );
                return Ok(CmapProcessor {
                    subtable: record.subtable()?,
                    encoding: Some(encoding),
                    uvs,
                });
            }
        }

        Err(Error::NoSupportedCmap)
    }

    pub fn subtable(&self) -> &CmapSubtable {
        &self.subtable
    }

    pub fn encoding(&self) -> Option<Encoding> {
        self.encoding
    }

    /// Glyph id of a code point, optionally followed by a variation selector. Returns 0 (the
    /// `.notdef` glyph) for unmapped code points.
    pub fn lookup(&self, code_point: u32, variation_selector: Option<u32>) -> Result<u16> {
        let mut code_point = code_point;
        if let Some(encoding) = self.encoding {
            code_point = encoding.encode_code_point(code_point).unwrap_or(code_point);
        } else if let Some(selector) = variation_selector {
            if let Some(glyph_id) = self.variation_glyph(code_point, selector)? {
                return Ok(glyph_id);
            }
        }

        match &self.subtable {
            CmapSubtable::Format0 { code_map } => int_or_zero(code_map, i64::from(code_point)),
            CmapSubtable::Format4(table) => format4_lookup(table, code_point),
            CmapSubtable::Format6 {
                first_code,
                glyph_indices,
            }
            | CmapSubtable::Format10 {
                first_code,
                glyph_indices,
            } => int_or_zero(
                glyph_indices,
                i64::from(code_point) - i64::from(*first_code),
            ),
            CmapSubtable::Format12(groups) => Ok(group_lookup(groups, code_point)?
                .and_then(|group| {
                    group
                        .glyph_id
                        .checked_add(code_point - group.start_char_code)
                })
                .map_or(0, glyph_id_or_zero)),
            CmapSubtable::Format13(groups) => Ok(group_lookup(groups, code_point)?
                .map_or(0, |group| glyph_id_or_zero(group.glyph_id))),
            CmapSubtable::Format8(_) => Err(Error::Unimplemented(8)),
            CmapSubtable::Format14(_) => Err(Error::Unimplemented(14)),
            CmapSubtable::Format2 => Err(Error::UnknownCmapFormat(2)),
        }
    }

    /// Resolves a variation sequence. `None` when the sequence maps to the default glyph of the
    /// code point, to `.notdef` or is not listed.
    fn variation_glyph(&self, code_point: u32, selector: u32) -> Result<Option<u16>> {
        let selectors = match &self.uvs {
            Some(selectors) => selectors,
            None => return Ok(None),
        };

        let (mut min, mut max) = (0, selectors.len());
        let record = loop {
            if min >= max {
                return Ok(None);
            }
            let mid = (min + max) / 2;
            let record = selectors
                .get(mid)?
                .ok_or_else(|| Error::invalid("variation selector out of range"))?;
            match selector.cmp(&record.var_selector) {
                Ordering::Less => max = mid,
                Ordering::Greater => min = mid + 1,
                Ordering::Equal => break record,
            }
        };

        let is_default = record
            .default_uvs
            .binary_search_by(|(start, count)| {
                if code_point < *start {
                    Ordering::Greater
                } else if code_point > start + count {
                    Ordering::Less
                } else {
                    Ordering::Equal
                }
            })
            .is_ok();
        if is_default {
            return Ok(None);
        }

        Ok(record
            .non_default_uvs
            .binary_search_by(|(unicode_value, _)| unicode_value.cmp(&code_point))
            .ok()
            .map(|ix| record.non_default_uvs[ix].1)
            .filter(|glyph_id| *glyph_id != 0))
    }

    /// All code points the subtable maps, sorted and without duplicates.
    pub fn character_set(&self) -> Result<Vec<u32>> {
        let mut set = Vec::new();
        match &self.subtable {
            CmapSubtable::Format0 { code_map } => set.extend(0..code_map.len() as u32),
            CmapSubtable::Format4(table) => {
                for i in 0..table.seg_count as i64 {
                    let start = at(&table.start_code, i)? as u32;
                    let end = at(&table.end_code, i)? as u32;
                    set.extend(start..=end);
                }
            }
            CmapSubtable::Format6 {
                first_code,
                glyph_indices,
            }
            | CmapSubtable::Format10 {
                first_code,
                glyph_indices,
            } => {
                // codes past u32::MAX cannot be looked up
                let start = u64::from(*first_code);
                let end = (start + glyph_indices.len() as u64).min(u64::from(u32::MAX) + 1);
                set.extend((start..end).map(|code| code as u32));
            }
            CmapSubtable::Format12(groups) | CmapSubtable::Format13(groups) => {
                for i in 0..groups.len() {
                    if let Some(group) = groups.get(i)? {
                        set.extend(group.start_char_code..=group.end_char_code);
                    }
                }
            }
            CmapSubtable::Format8(_) => return Err(Error::Unimplemented(8)),
            CmapSubtable::Format14(_) => return Err(Error::Unimplemented(14)),
            CmapSubtable::Format2 => return Err(Error::UnknownCmapFormat(2)),
        }
        set.sort_unstable();
        set.dedup();
        Ok(set)
    }
}

/// Glyph ids past the 16 bit range map to `.notdef`.
fn glyph_id_or_zero(glyph_id: u32) -> u16 {
    u16::try_from(glyph_id).unwrap_or(0)
}

fn at(array: &LazyArrayValue, index: i64) -> Result<i64> {
    array
        .int(index)?
        .ok_or_else(|| Error::invalid(format!("cmap array index {} out of range", index)))
}

fn int_or_zero(array: &LazyArrayValue, index: i64) -> Result<u16> {
    Ok(array.int(index)?.unwrap_or(0) as u16)
}

fn format4_lookup(table: &Format4, code_point: u32) -> Result<u16> {
    let code_point = i64::from(code_point);
    let seg_count = table.seg_count as i64;
    let (mut min, mut max) = (0i64, seg_count - 1);
    while min <= max {
        let mid = (min + max) / 2;
        if code_point < at(&table.start_code, mid)? {
            max = mid - 1;
        } else if code_point > at(&table.end_code, mid)? {
            min = mid + 1;
        } else {
            let range_offset = at(&table.id_range_offset, mid)?;
            let delta = at(&table.id_delta, mid)?;
            let glyph_id = if range_offset == 0 {
                code_point + delta
            } else {
                let index = range_offset / 2 + (code_point - at(&table.start_code, mid)?)
                    - (seg_count - mid);
                match table.glyph_index_array.int(index)? {
                    Some(0) | None => 0,
                    Some(glyph_id) => glyph_id + delta,
                }
            };
            return Ok((glyph_id & 0xffff) as u16);
        }
    }
    Ok(0)
}

fn group_lookup(
    groups: &Groups,
    code_point: u32,
) -> Result<Option<SequentialMapGroup>> {
    let (mut min, mut max) = (0, groups.len());
    while min < max {
        let mid = (min + max) / 2;
        let group = match groups.get(mid)? {
            Some(group) => group,
            None => return Ok(None),
        };
        if code_point < group.start_char_code {
            max = mid;
        } else if code_point > group.end_char_code {
            min = mid + 1;
        } else {
            return Ok(Some(group));
        }
    }
    Ok(None)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::schema::Type;
    use crate::stream::DecodeStream;
    use crate::tables::FontTable;
    use fontdecode_test_data::cmap::{self, Segment, VarSelector};
    use pretty_assertions::assert_eq;

    fn processor(subtables: &[(u16, u16, Vec<u8>)]) -> Result<CmapProcessor> {
        let mut stream = DecodeStream::new(cmap::table(subtables));
        let value = CmapTable::schema().decode(&mut stream, None)?;
        let table = CmapTable::from_struct(value.as_struct().unwrap())?;
        CmapProcessor::new(&table)
    }

    fn latin() -> Vec<u8> {
        cmap::format4(&[
            Segment::delta(0x20, 0x7e, -29),
            Segment::glyphs(0x20ac, 0x20ae, &[200, 0, 202]),
        ])
    }

    #[test]
    fn test_format4_lookup() {
        let cmap = processor(&[(3, 1, latin())]).unwrap();
        assert_eq!(cmap.lookup('A' as u32, None).unwrap(), 36);
        assert_eq!(cmap.lookup(0x20ac, None).unwrap(), 200);
        assert_eq!(cmap.lookup(0x20ad, None).unwrap(), 0);
        assert_eq!(cmap.lookup(0x20ae, None).unwrap(), 202);
        assert_eq!(cmap.lookup(0x1f, None).unwrap(), 0);
        assert_eq!(cmap.lookup(123_456, None).unwrap(), 0);
    }

    #[test]
    fn test_format4_delta_wraps() {
        let cmap = processor(&[(3, 1, cmap::format4(&[Segment::delta(0xfff0, 0xfff2, 0x20)]))])
            .unwrap();
        assert_eq!(cmap.lookup(0xfff0, None).unwrap(), 0x10);
    }

    #[test]
    fn test_character_set() {
        let cmap = processor(&[(3, 1, latin())]).unwrap();
        let set = cmap.character_set().unwrap();
        assert!(set.contains(&65));
        assert!(set.contains(&8364));
        assert!(!set.contains(&123_456));
        assert_eq!(set.first(), Some(&0x20));
        assert_eq!(set.last(), Some(&0xffff));
        assert!(set.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_prefers_full_unicode_subtable() {
        let cmap = processor(&[
            (3, 1, latin()),
            (3, 10, cmap::format12(&[(0x41, 0x43, 500), (0x1f600, 0x1f601, 900)])),
        ])
        .unwrap();
        assert_eq!(cmap.subtable().format(), 12);
        assert_eq!(cmap.lookup('C' as u32, None).unwrap(), 502);
        assert_eq!(cmap.lookup(0x1f601, None).unwrap(), 901);
        assert_eq!(cmap.lookup(0x1f602, None).unwrap(), 0);
        assert_eq!(
            cmap.character_set().unwrap(),
            vec![0x41, 0x42, 0x43, 0x1f600, 0x1f601]
        );
    }

    #[test]
    fn test_format13_maps_ranges_to_one_glyph() {
        let cmap = processor(&[(3, 10, cmap::format13(&[(0x100, 0x1ff, 7)]))]).unwrap();
        assert_eq!(cmap.lookup(0x100, None).unwrap(), 7);
        assert_eq!(cmap.lookup(0x1ff, None).unwrap(), 7);
        assert_eq!(cmap.lookup(0x200, None).unwrap(), 0);
    }

    #[test]
    fn test_format6() {
        let cmap = processor(&[(0, 3, cmap::format6(0x30, &[10, 11, 12]))]).unwrap();
        assert_eq!(cmap.lookup('1' as u32, None).unwrap(), 11);
        assert_eq!(cmap.lookup(0x2f, None).unwrap(), 0);
        assert_eq!(cmap.lookup(0x33, None).unwrap(), 0);
        assert_eq!(cmap.character_set().unwrap(), vec![0x30, 0x31, 0x32]);
    }

    #[test]
    fn test_format0() {
        let mut glyphs = vec![0u8; 256];
        glyphs[0x41] = 3;
        glyphs[0xff] = 4;
        let cmap = processor(&[(0, 3, cmap::format0(&glyphs))]).unwrap();
        assert_eq!(cmap.encoding(), None);
        assert_eq!(cmap.lookup('A' as u32, None).unwrap(), 3);
        assert_eq!(cmap.lookup(0xff, None).unwrap(), 4);
        assert_eq!(cmap.lookup('B' as u32, None).unwrap(), 0);
        assert_eq!(cmap.lookup(0x100, None).unwrap(), 0);
        assert_eq!(cmap.character_set().unwrap(), (0..256).collect::<Vec<u32>>());
    }

    #[test]
    fn test_format10() {
        let cmap = processor(&[(3, 10, cmap::format10(0x1f600, &[5, 6, 7]))]).unwrap();
        assert_eq!(cmap.subtable().format(), 10);
        assert_eq!(cmap.lookup(0x1f600, None).unwrap(), 5);
        assert_eq!(cmap.lookup(0x1f602, None).unwrap(), 7);
        assert_eq!(cmap.lookup(0x1f5ff, None).unwrap(), 0);
        assert_eq!(cmap.lookup(0x1f603, None).unwrap(), 0);
        assert_eq!(
            cmap.character_set().unwrap(),
            vec![0x1f600, 0x1f601, 0x1f602]
        );
    }

    #[test]
    fn test_format10_at_end_of_code_space() {
        let cmap = processor(&[(3, 10, cmap::format10(0xffff_fff0, &[1; 32]))]).unwrap();
        let set = cmap.character_set().unwrap();
        assert_eq!(set.len(), 16);
        assert_eq!(set.first(), Some(&0xffff_fff0));
        assert_eq!(set.last(), Some(&u32::MAX));
        assert_eq!(cmap.lookup(u32::MAX, None).unwrap(), 1);
    }

    #[test]
    fn test_glyph_ids_past_u16_map_to_notdef() {
        let cmap = processor(&[(3, 10, cmap::format12(&[(0x41, 0x42, 0xffff)]))]).unwrap();
        assert_eq!(cmap.lookup('A' as u32, None).unwrap(), 0xffff);
        assert_eq!(cmap.lookup('B' as u32, None).unwrap(), 0);

        let cmap = processor(&[(3, 10, cmap::format13(&[(0x100, 0x1ff, 0x1_0005)]))]).unwrap();
        assert_eq!(cmap.lookup(0x100, None).unwrap(), 0);
    }

    #[test]
    fn test_last_legacy_subtable_wins() {
        let cmap = processor(&[
            (1, 0, cmap::format0(&[3; 256])),
            (1, 0, cmap::format6(0x41, &[8])),
        ])
        .unwrap();
        assert_eq!(cmap.subtable().format(), 6);
        assert_eq!(cmap.lookup('A' as u32, None).unwrap(), 8);
    }

    #[test]
    fn test_legacy_mac_roman() {
        let mut glyphs = vec![0u8; 256];
        glyphs[0x41] = 3;
        // Euro sign in Mac OS Roman
        glyphs[0xdb] = 9;
        let cmap = processor(&[(1, 0, cmap::format0(&glyphs))]).unwrap();
        assert_eq!(cmap.encoding(), Some(Encoding::MacRoman));
        assert_eq!(cmap.lookup('A' as u32, None).unwrap(), 3);
        assert_eq!(cmap.lookup(0x20ac, None).unwrap(), 9);
        assert_eq!(cmap.lookup(0x10000, None).unwrap(), 0);
    }

    #[test]
    fn test_no_supported_cmap() {
        assert!(matches!(
            processor(&[(3, 0, latin())]),
            Err(Error::NoSupportedCmap)
        ));
    }

    #[test]
    fn test_variation_sequences() {
        let cmap = processor(&[
            (0, 5, cmap::format14(&[VarSelector {
                selector: 0xfe0f,
                default_ranges: vec![(0x41, 1)],
                non_default: vec![(0x20ac, 77)],
            }])),
            (3, 1, latin()),
        ])
        .unwrap();
        assert_eq!(cmap.lookup(0x20ac, Some(0xfe0f)).unwrap(), 77);
        // default variation falls back to the ordinary mapping
        assert_eq!(cmap.lookup('B' as u32, Some(0xfe0f)).unwrap(), 37);
        assert_eq!(cmap.lookup(0x20ac, Some(0xfe0e)).unwrap(), 200);
        assert_eq!(cmap.lookup(0x20ac, None).unwrap(), 200);
    }

    #[test]
    fn test_variation_to_notdef_uses_base_mapping() {
        let cmap = processor(&[
            (0, 5, cmap::format14(&[VarSelector {
                selector: 0xfe0f,
                default_ranges: Vec::new(),
                non_default: vec![(0x20ac, 0)],
            }])),
            (3, 1, latin()),
        ])
        .unwrap();
        assert_eq!(cmap.lookup(0x20ac, Some(0xfe0f)).unwrap(), 200);
    }

    #[test]
    fn test_unimplemented_formats() {
        let cmap = processor(&[(3, 10, cmap::format8())]).unwrap();
        assert!(matches!(cmap.lookup(0x41, None), Err(Error::Unimplemented(8))));
        assert!(matches!(cmap.character_set(), Err(Error::Unimplemented(8))));
    }
}
