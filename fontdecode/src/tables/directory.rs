use std::rc::Rc;

use once_cell::sync::Lazy;

use super::int;
use crate::encodings::Encoding;
use crate::error::Result;
use crate::schema::{
    field, type_ref, Array, Number, Origin, Pointer, Struct, Structure, TagMap, Text, TypeRef,
    Value,
};

/// The table directory of a plain SFNT font: the sfnt version tag followed by a record for each
/// table.
/// See spec:
/// - https://docs.microsoft.com/en-us/typography/opentype/spec/otff
/// - https://developer.apple.com/fonts/TrueType-Reference-Manual/RM06/Chap6.html
pub static DIRECTORY: Lazy<TypeRef> = Lazy::new(|| {
    let record = Structure::new(vec![
        field("tag", Text::new(4, Encoding::Ascii)),
        field("checkSum", Number::U32),
        field(
            "offset",
            Pointer::void(Number::U32)
                .origin(Origin::Global)
                .non_null(),
        ),
        field("length", Number::U32),
    ]);
    type_ref(
        Structure::new(vec![
            field("tag", Text::new(4, Encoding::Ascii)),
            field("numTables", Number::U16),
            field("searchRange", Number::U16),
            field("entrySelector", Number::U16),
            field("rangeShift", Number::U16),
            field("tables", Array::new(record, "numTables")),
        ])
        .with_process(tables_to_map),
    )
});

/// Replaces the `tables` record array with a map keyed by tag. A later record with the same tag
/// replaces an earlier one.
pub(crate) fn tables_to_map(res: &mut Struct) -> Result<()> {
    let records = res.array("tables")?.to_vec();
    let mut map = TagMap::new();
    for record in records {
        let tag = match record.as_struct() {
            Some(s) => s.string("tag")?.to_string(),
            None => continue,
        };
        if map.insert(tag.clone(), record).is_some() {
            log::warn!("duplicate table record `{}`, using the last one", tag);
        }
    }
    res.set("tables", Value::Map(Rc::new(map)));
    Ok(())
}

/// Location of a single table, common to all container formats.
#[derive(Debug, Clone, PartialEq)]
pub struct TableRecord {
    pub(crate) tag: String,
    /// Absolute offset of the table data. For WOFF2 fonts this is assigned once the payload has
    /// been decompressed and is relative to the decompressed data.
    pub(crate) offset: usize,
    /// Length of the table data once decoded.
    pub(crate) length: usize,
    /// Stored length: compressed length for WOFF, transformed length for transformed WOFF2
    /// tables and `length` otherwise.
    pub(crate) stored_length: usize,
    /// WOFF2 tables stored in transformed form.
    pub(crate) transformed: bool,
}

impl TableRecord {
    pub fn tag(&self) -> &str {
        &self.tag
    }

    pub fn length(&self) -> usize {
        self.length
    }

    fn from_struct(record: &Struct) -> Result<Self> {
        let length = int(record, "length")?;
        let offset = match record.get("offset") {
            Some(Value::Offset(offset)) => *offset,
            _ => 0,
        };
        let stored_length = if record.contains("compLength") {
            int(record, "compLength")?
        } else if record.contains("transformLength") {
            int(record, "transformLength")?
        } else {
            length
        };
        let transformed = matches!(record.get("transformed"), Some(Value::Int(1)));
        Ok(TableRecord {
            tag: record.string("tag")?.to_string(),
            offset,
            length,
            stored_length,
            transformed,
        })
    }
}

/// The decoded directory of a font, for any container format.
#[derive(Debug, Clone)]
pub struct TableDirectory {
    /// `sfnt` version tag, or the container signature for WOFF and WOFF2.
    pub(crate) tag: String,
    /// The sfnt version of the wrapped font for WOFF and WOFF2.
    pub(crate) flavor: Option<u32>,
    pub(crate) records: Vec<TableRecord>,
    pub(crate) raw: Rc<Struct>,
}

impl TableDirectory {
    pub(crate) fn from_value(value: Value) -> Result<Self> {
        let raw = match value {
            Value::Struct(s) => s,
            _ => return Err(crate::error::Error::mismatch("directory", "struct")),
        };
        let map = raw
            .field("tables")?
            .as_map()
            .cloned()
            .ok_or_else(|| crate::error::Error::mismatch("tables", "map"))?;
        let records = map
            .iter()
            .filter_map(|(_, record)| record.as_struct())
            .map(|record| TableRecord::from_struct(record))
            .collect::<Result<Vec<_>>>()?;
        Ok(TableDirectory {
            tag: raw.string("tag")?.to_string(),
            flavor: super::opt_int(&raw, "flavor")?,
            records,
            raw,
        })
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    pub fn record(&self, tag: &str) -> Option<&TableRecord> {
        self.records.iter().find(|r| r.tag == tag)
    }

    pub fn records(&self) -> &[TableRecord] {
        &self.records
    }

    pub fn raw(&self) -> &Struct {
        &self.raw
    }
}
