use std::rc::Rc;

use once_cell::sync::Lazy;

use super::{int, FontTable};
use crate::error::{Error, Result};
use crate::schema::{
    computed, field, type_ref, Array, Context, LazyArray, LazyArrayValue, Length, Number, Origin,
    Pointer, Reserved, Struct, Structure, TypeRef, Value, VersionedStructure,
};

/// Number of `u16` glyph ids between the current position and the end of the subtable.
fn remaining_glyph_ids(ctx: &Context<'_>) -> Result<i64> {
    let length = ctx.int("length")?;
    Ok(((length - ctx.current_offset() as i64) / 2).max(0))
}

fn groups() -> LazyArray {
    LazyArray::new(
        Structure::new(vec![
            field("startCharCode", Number::U32),
            field("endCharCode", Number::U32),
            field("glyphID", Number::U32),
        ]),
        "nGroups",
    )
}

fn var_selectors() -> LazyArray {
    let default_uvs = Array::new(
        Structure::new(vec![
            field("startUnicodeValue", Number::U24),
            field("additionalCount", Number::U8),
        ]),
        Number::U32,
    );
    let non_default_uvs = Array::new(
        Structure::new(vec![
            field("unicodeValue", Number::U24),
            field("glyphID", Number::U16),
        ]),
        Number::U32,
    );
    LazyArray::new(
        Structure::new(vec![
            field("varSelector", Number::U24),
            field(
                "defaultUVS",
                Pointer::new(Number::U32, default_uvs).origin(Origin::Parent),
            ),
            field(
                "nonDefaultUVS",
                Pointer::new(Number::U32, non_default_uvs).origin(Origin::Parent),
            ),
        ]),
        "numRecords",
    )
}

static SUBTABLE: Lazy<TypeRef> = Lazy::new(|| {
    let sub_header = Structure::new(vec![
        field("firstCode", Number::U16),
        field("entryCount", Number::U16),
        field("idDelta", Number::I16),
        field("idRangeOffset", Number::U16),
    ]);
    type_ref(
        VersionedStructure::inline(Number::U16)
            .version(
                0,
                vec![
                    field("length", Number::U16),
                    field("language", Number::U16),
                    field("codeMap", LazyArray::new(Number::U8, 256)),
                ],
            )
            .version(
                2,
                vec![
                    field("length", Number::U16),
                    field("language", Number::U16),
                    field("subHeaderKeys", Array::new(Number::U16, 256)),
                    computed("subHeaderCount", |ctx| {
                        let keys = ctx
                            .lookup("subHeaderKeys")
                            .ok_or_else(|| Error::missing("subHeaderKeys"))?;
                        let max = keys
                            .as_array()
                            .unwrap_or(&[])
                            .iter()
                            .filter_map(Value::as_int)
                            .max()
                            .unwrap_or(0);
                        Ok(Value::Int(max / 8 + 1))
                    }),
                    field("subHeaders", LazyArray::new(sub_header, "subHeaderCount")),
                    field(
                        "glyphIndexArray",
                        LazyArray::new(Number::U16, Length::Callback(remaining_glyph_ids)),
                    ),
                ],
            )
            .version(
                4,
                vec![
                    field("length", Number::U16),
                    field("language", Number::U16),
                    field("segCountX2", Number::U16),
                    computed("segCount", |ctx| Ok(Value::Int(ctx.int("segCountX2")? >> 1))),
                    field("searchRange", Number::U16),
                    field("entrySelector", Number::U16),
                    field("rangeShift", Number::U16),
                    field("endCode", LazyArray::new(Number::U16, "segCount")),
                    field("reservedPad", Reserved::new(Number::U16, 1)),
                    field("startCode", LazyArray::new(Number::U16, "segCount")),
                    field("idDelta", LazyArray::new(Number::I16, "segCount")),
                    field("idRangeOffset", LazyArray::new(Number::U16, "segCount")),
                    field(
                        "glyphIndexArray",
                        LazyArray::new(Number::U16, Length::Callback(remaining_glyph_ids)),
                    ),
                ],
            )
            .version(
                6,
                vec![
                    field("length", Number::U16),
                    field("language", Number::U16),
                    field("firstCode", Number::U16),
                    field("entryCount", Number::U16),
                    field("glyphIndices", LazyArray::new(Number::U16, "entryCount")),
                ],
            )
            .version(
                8,
                vec![
                    field("reserved", Reserved::new(Number::U16, 1)),
                    field("length", Number::U32),
                    field("language", Number::U32),
                    field("is32", LazyArray::new(Number::U8, 8192)),
                    field("nGroups", Number::U32),
                    field("groups", groups()),
                ],
            )
            .version(
                10,
                vec![
                    field("reserved", Reserved::new(Number::U16, 1)),
                    field("length", Number::U32),
                    field("language", Number::U32),
                    field("firstCode", Number::U32),
                    field("entryCount", Number::U32),
                    field("glyphIndices", LazyArray::new(Number::U16, "entryCount")),
                ],
            )
            .version(
                12,
                vec![
                    field("reserved", Reserved::new(Number::U16, 1)),
                    field("length", Number::U32),
                    field("language", Number::U32),
                    field("nGroups", Number::U32),
                    field("groups", groups()),
                ],
            )
            .version(
                13,
                vec![
                    field("reserved", Reserved::new(Number::U16, 1)),
                    field("length", Number::U32),
                    field("language", Number::U32),
                    field("nGroups", Number::U32),
                    field("groups", groups()),
                ],
            )
            .version(
                14,
                vec![
                    field("length", Number::U32),
                    field("numRecords", Number::U32),
                    field("varSelectors", var_selectors()),
                ],
            ),
    )
});

static CMAP: Lazy<TypeRef> = Lazy::new(|| {
    let record = Structure::new(vec![
        field("platformID", Number::U16),
        field("encodingID", Number::U16),
        field(
            "table",
            Pointer::new(Number::U32, SUBTABLE.clone())
                .origin(Origin::Parent)
                .lazy(),
        ),
    ]);
    type_ref(Structure::new(vec![
        field("version", Number::U16),
        field("numSubtables", Number::U16),
        field("tables", Array::new(record, "numSubtables")),
    ]))
});

/// This table defines the mapping of character codes to the glyph index values used in the
/// font. Subtables are decoded on first use.
/// See spec: https://docs.microsoft.com/en-us/typography/opentype/spec/cmap
#[derive(Debug, Clone)]
pub struct CmapTable {
    pub(crate) version: u16,
    pub(crate) encoding_records: Vec<EncodingRecord>,
}

impl CmapTable {
    pub fn encoding_records(&self) -> &[EncodingRecord] {
        &self.encoding_records
    }

    pub fn record(&self, platform_id: u16, encoding_id: u16) -> Option<&EncodingRecord> {
        self.encoding_records
            .iter()
            .find(|r| r.platform_id == platform_id && r.encoding_id == encoding_id)
    }
}

impl FontTable for CmapTable {
    const TAG: &'static str = "cmap";

    fn schema() -> &'static TypeRef {
        &CMAP
    }

    fn from_struct(table: &Struct) -> Result<Self> {
        let mut encoding_records = Vec::new();
        for record in table.array("tables")? {
            let record = match record.as_struct() {
                Some(record) => record,
                None => continue,
            };
            encoding_records.push(EncodingRecord {
                platform_id: int(record, "platformID")?,
                encoding_id: int(record, "encodingID")?,
                subtable: record
                    .get("table")
                    .cloned()
                    .ok_or_else(|| Error::missing("table"))?,
            });
        }
        Ok(CmapTable {
            version: int(table, "version")?,
            encoding_records,
        })
    }
}

#[derive(Debug, Clone)]
pub struct EncodingRecord {
    pub(crate) platform_id: u16,
    pub(crate) encoding_id: u16,
    /// The deferred subtable.
    subtable: Value,
}

impl EncodingRecord {
    pub fn platform_id(&self) -> u16 {
        self.platform_id
    }

    pub fn encoding_id(&self) -> u16 {
        self.encoding_id
    }

    /// Decodes the subtable on first call.
    pub fn subtable(&self) -> Result<CmapSubtable> {
        let table = self
            .subtable
            .resolve()?
            .as_struct()
            .ok_or_else(|| Error::mismatch("table", "struct"))?;
        CmapSubtable::from_struct(table)
    }
}

/// A `(start, end, glyph)` group of formats 8, 12 and 13.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SequentialMapGroup {
    pub start_char_code: u32,
    pub end_char_code: u32,
    pub glyph_id: u32,
}

impl SequentialMapGroup {
    fn from_value(value: &Value) -> Result<Self> {
        let group = value
            .as_struct()
            .ok_or_else(|| Error::mismatch("groups", "struct"))?;
        Ok(SequentialMapGroup {
            start_char_code: int(group, "startCharCode")?,
            end_char_code: int(group, "endCharCode")?,
            glyph_id: int(group, "glyphID")?,
        })
    }
}

/// Lazily decoded groups of formats 8, 12 and 13.
#[derive(Debug, Clone)]
pub struct Groups(Rc<LazyArrayValue>);

impl Groups {
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, index: usize) -> Result<Option<SequentialMapGroup>> {
        self.0
            .get(index)?
            .map(SequentialMapGroup::from_value)
            .transpose()
    }
}

#[derive(Debug, Clone)]
pub struct Format4 {
    pub(crate) seg_count: usize,
    /// End character code for each segment, last=0xFFFF.
    pub(crate) end_code: Rc<LazyArrayValue>,
    /// Start character code for each segment.
    pub(crate) start_code: Rc<LazyArrayValue>,
    /// Delta for all character codes in segment.
    pub(crate) id_delta: Rc<LazyArrayValue>,
    /// Offsets into glyph_index_array or 0.
    pub(crate) id_range_offset: Rc<LazyArrayValue>,
    /// Glyph index array (arbitrary length).
    pub(crate) glyph_index_array: Rc<LazyArrayValue>,
}

/// A unicode variation sequence record of a format 14 subtable.
#[derive(Debug, Clone)]
pub struct VariationSelector {
    pub(crate) var_selector: u32,
    /// Ranges `(start, additional count)` that map to the default glyph.
    pub(crate) default_uvs: Vec<(u32, u32)>,
    /// Code points `(unicode value, glyph id)` that map to a specific glyph.
    pub(crate) non_default_uvs: Vec<(u32, u16)>,
}

impl VariationSelector {
    fn from_value(value: &Value) -> Result<Self> {
        let record = value
            .as_struct()
            .ok_or_else(|| Error::mismatch("varSelectors", "struct"))?;
        let pairs = |name: &str, a: &str, b: &str| -> Result<Vec<(i64, i64)>> {
            match record.field(name)? {
                Value::Array(items) => items
                    .iter()
                    .filter_map(|item| item.as_struct())
                    .map(|item| Ok((item.int(a)?, item.int(b)?)))
                    .collect(),
                _ => Ok(Vec::new()),
            }
        };
        Ok(VariationSelector {
            var_selector: int(record, "varSelector")?,
            default_uvs: pairs("defaultUVS", "startUnicodeValue", "additionalCount")?
                .into_iter()
                .map(|(start, count)| (start as u32, count as u32))
                .collect(),
            non_default_uvs: pairs("nonDefaultUVS", "unicodeValue", "glyphID")?
                .into_iter()
                .map(|(cp, gid)| (cp as u32, gid as u16))
                .collect(),
        })
    }
}

#[derive(Debug, Clone)]
pub struct VariationSelectors(Rc<LazyArrayValue>);

impl VariationSelectors {
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, index: usize) -> Result<Option<VariationSelector>> {
        self.0
            .get(index)?
            .map(VariationSelector::from_value)
            .transpose()
    }
}

/// A decoded cmap subtable.
#[derive(Debug, Clone)]
pub enum CmapSubtable {
    /// Byte encoding table.
    Format0 { code_map: Rc<LazyArrayValue> },
    /// High-byte mapping through table.
    Format2,
    /// Segment mapping to delta values.
    Format4(Format4),
    /// Trimmed table mapping.
    Format6 {
        first_code: u32,
        glyph_indices: Rc<LazyArrayValue>,
    },
    /// Mixed 16-bit and 32-bit coverage.
    Format8(Groups),
    /// Trimmed array.
    Format10 {
        first_code: u32,
        glyph_indices: Rc<LazyArrayValue>,
    },
    /// Segmented coverage.
    Format12(Groups),
    /// Many-to-one range mappings.
    Format13(Groups),
    /// Unicode variation sequences.
    Format14(VariationSelectors),
}

impl CmapSubtable {
    pub fn format(&self) -> u16 {
        match self {
            CmapSubtable::Format0 { .. } => 0,
            CmapSubtable::Format2 => 2,
            CmapSubtable::Format4(_) => 4,
            CmapSubtable::Format6 { .. } => 6,
            CmapSubtable::Format8(_) => 8,
            CmapSubtable::Format10 { .. } => 10,
            CmapSubtable::Format12(_) => 12,
            CmapSubtable::Format13(_) => 13,
            CmapSubtable::Format14(_) => 14,
        }
    }

    pub(crate) fn from_struct(table: &Struct) -> Result<Self> {
        let format = table.int("version")?;
        Ok(match format {
            0 => CmapSubtable::Format0 {
                code_map: table.lazy_array("codeMap")?.clone(),
            },
            2 => CmapSubtable::Format2,
            4 => CmapSubtable::Format4(Format4 {
                seg_count: int(table, "segCount")?,
                end_code: table.lazy_array("endCode")?.clone(),
                start_code: table.lazy_array("startCode")?.clone(),
                id_delta: table.lazy_array("idDelta")?.clone(),
                id_range_offset: table.lazy_array("idRangeOffset")?.clone(),
                glyph_index_array: table.lazy_array("glyphIndexArray")?.clone(),
            }),
            6 => CmapSubtable::Format6 {
                first_code: int(table, "firstCode")?,
                glyph_indices: table.lazy_array("glyphIndices")?.clone(),
            },
            8 => CmapSubtable::Format8(Groups(table.lazy_array("groups")?.clone())),
            10 => CmapSubtable::Format10 {
                first_code: int(table, "firstCode")?,
                glyph_indices: table.lazy_array("glyphIndices")?.clone(),
            },
            12 => CmapSubtable::Format12(Groups(table.lazy_array("groups")?.clone())),
            13 => CmapSubtable::Format13(Groups(table.lazy_array("groups")?.clone())),
            14 => CmapSubtable::Format14(VariationSelectors(
                table.lazy_array("varSelectors")?.clone(),
            )),
            other => return Err(Error::UnknownCmapFormat(other)),
        })
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::schema::Type;
    use crate::stream::DecodeStream;
    use fontdecode_test_data::cmap;
    use pretty_assertions::assert_eq;

    fn decode(data: Vec<u8>) -> CmapTable {
        let mut stream = DecodeStream::new(data);
        let value = CmapTable::schema().decode(&mut stream, None).unwrap();
        CmapTable::from_struct(value.as_struct().unwrap()).unwrap()
    }

    #[test]
    fn test_subtables_are_deferred() {
        let table = decode(cmap::table(&[
            (3, 1, cmap::format4(&[cmap::Segment::delta(0x41, 0x5a, -29)])),
            (3, 10, cmap::format12(&[(0x1f600, 0x1f64f, 100)])),
        ]));
        assert_eq!(table.encoding_records().len(), 2);
        assert!(matches!(
            &table.encoding_records()[0].subtable,
            Value::Lazy(lazy) if !lazy.is_decoded()
        ));

        let format12 = table.record(3, 10).unwrap().subtable().unwrap();
        assert_eq!(format12.format(), 12);
        assert!(matches!(
            &table.encoding_records()[0].subtable,
            Value::Lazy(lazy) if !lazy.is_decoded()
        ));
        match format12 {
            CmapSubtable::Format12(groups) => {
                assert_eq!(groups.len(), 1);
                assert_eq!(
                    groups.get(0).unwrap(),
                    Some(SequentialMapGroup {
                        start_char_code: 0x1f600,
                        end_char_code: 0x1f64f,
                        glyph_id: 100
                    })
                );
            }
            other => panic!("unexpected subtable {:?}", other),
        }
    }

    #[test]
    fn test_format4_fields() {
        let table = decode(cmap::table(&[(
            3,
            1,
            cmap::format4(&[
                cmap::Segment::delta(0x41, 0x5a, -29),
                cmap::Segment::glyphs(0x20ac, 0x20ad, &[300, 0]),
            ]),
        )]));
        let format4 = match table.record(3, 1).unwrap().subtable().unwrap() {
            CmapSubtable::Format4(format4) => format4,
            other => panic!("unexpected subtable {:?}", other),
        };
        // two segments plus the terminating 0xFFFF segment
        assert_eq!(format4.seg_count, 3);
        assert_eq!(format4.end_code.int(2).unwrap(), Some(0xffff));
        assert_eq!(format4.id_delta.int(0).unwrap(), Some(-29));
        assert_eq!(format4.glyph_index_array.len(), 2);
    }

    #[test]
    fn test_format14_records() {
        let table = decode(cmap::table(&[(
            0,
            5,
            cmap::format14(&[cmap::VarSelector {
                selector: 0xfe0f,
                default_ranges: vec![(0x2600, 3)],
                non_default: vec![(0x2764, 42)],
            }]),
        )]));
        let selectors = match table.record(0, 5).unwrap().subtable().unwrap() {
            CmapSubtable::Format14(selectors) => selectors,
            other => panic!("unexpected subtable {:?}", other),
        };
        let record = selectors.get(0).unwrap().unwrap();
        assert_eq!(record.var_selector, 0xfe0f);
        assert_eq!(record.default_uvs, vec![(0x2600, 3)]);
        assert_eq!(record.non_default_uvs, vec![(0x2764, 42)]);
    }

    #[test]
    fn test_unknown_subtable_format() {
        let table = decode(cmap::table(&[(3, 1, vec![0x00, 0x07, 0x00, 0x00])]));
        assert!(matches!(
            table.record(3, 1).unwrap().subtable(),
            Err(Error::UnknownVersion(7))
        ));
    }
}
