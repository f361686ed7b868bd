use once_cell::sync::Lazy;

use super::{int, FontTable};
use crate::encodings::{name_encoding, Encoding};
use crate::error::Result;
use crate::schema::{
    field, type_ref, Array, Context, Number, Origin, Pointer, Struct, Structure, Text, TypeRef,
    VersionedStructure,
};

fn string_storage(ctx: &Context<'_>) -> Result<i64> {
    ctx.parent_int("stringOffset")
}

fn record_encoding(ctx: &Context<'_>) -> Option<Encoding> {
    let platform_id = ctx.int("platformID").ok()?;
    let encoding_id = ctx.int("encodingID").ok()?;
    Some(name_encoding(platform_id, encoding_id))
}

static NAME: Lazy<TypeRef> = Lazy::new(|| {
    let record = Structure::new(vec![
        field("platformID", Number::U16),
        field("encodingID", Number::U16),
        field("languageID", Number::U16),
        field("nameID", Number::U16),
        field("length", Number::U16),
        field(
            "string",
            Pointer::new(Number::U16, Text::with_encoding("length", record_encoding))
                .origin(Origin::Parent)
                .relative_to(string_storage)
                .non_null(),
        ),
    ]);
    let lang_tag = Structure::new(vec![
        field("length", Number::U16),
        field(
            "tag",
            Pointer::new(Number::U16, Text::new("length", Encoding::Utf16Be))
                .origin(Origin::Parent)
                .relative_to(string_storage)
                .non_null(),
        ),
    ]);
    type_ref(
        VersionedStructure::inline(Number::U16)
            .header(vec![
                field("count", Number::U16),
                field("stringOffset", Number::U16),
                field("records", Array::new(record, "count")),
            ])
            .version(0, vec![])
            .version(
                1,
                vec![
                    field("langTagCount", Number::U16),
                    field("langTags", Array::new(lang_tag, "langTagCount")),
                ],
            ),
    )
});

/// Well-known name ids.
pub mod name_id {
    pub const COPYRIGHT: u16 = 0;
    pub const FAMILY: u16 = 1;
    pub const SUBFAMILY: u16 = 2;
    pub const UNIQUE_ID: u16 = 3;
    pub const FULL_NAME: u16 = 4;
    pub const VERSION: u16 = 5;
    pub const POSTSCRIPT_NAME: u16 = 6;
    pub const TRADEMARK: u16 = 7;
    pub const PREFERRED_FAMILY: u16 = 16;
    pub const PREFERRED_SUBFAMILY: u16 = 17;
}

#[derive(Debug, PartialEq, Clone)]
pub struct NameRecord {
    pub(crate) platform_id: u16,
    pub(crate) encoding_id: u16,
    pub(crate) language_id: u16,
    pub(crate) name_id: u16,
    pub(crate) value: String,
}

impl NameRecord {
    pub fn name_id(&self) -> u16 {
        self.name_id
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    /// Rank of the record's language when looking for an English name. Lower is better.
    fn english_rank(&self) -> u8 {
        match (self.platform_id, self.language_id) {
            (3, 0x0409) => 0,
            (1, 0) => 1,
            (0, _) => 2,
            (3, _) => 3,
            _ => 4,
        }
    }
}

/// This table includes human-readable names for features and settings, copyright notices,
/// font names, style names, and other information related to the font.
/// See spec:
/// - https://docs.microsoft.com/en-us/typography/opentype/spec/name
/// - https://developer.apple.com/fonts/TrueType-Reference-Manual/RM06/Chap6name.html
#[derive(Debug, PartialEq, Clone)]
pub struct NameTable {
    pub(crate) records: Vec<NameRecord>,
    /// BCP 47 language tags of format 1 tables.
    pub(crate) lang_tags: Vec<String>,
}

impl NameTable {
    pub fn records(&self) -> &[NameRecord] {
        &self.records
    }

    /// The value of a name id, preferring English records.
    pub fn get(&self, name_id: u16) -> Option<&str> {
        self.records
            .iter()
            .filter(|r| r.name_id == name_id)
            .min_by_key(|r| r.english_rank())
            .map(|r| r.value.as_str())
    }
}

impl FontTable for NameTable {
    const TAG: &'static str = "name";

    fn schema() -> &'static TypeRef {
        &NAME
    }

    fn from_struct(table: &Struct) -> Result<Self> {
        let mut records = Vec::new();
        for record in table.array("records")? {
            let record = match record.as_struct() {
                Some(record) => record,
                None => continue,
            };
            records.push(NameRecord {
                platform_id: int(record, "platformID")?,
                encoding_id: int(record, "encodingID")?,
                language_id: int(record, "languageID")?,
                name_id: int(record, "nameID")?,
                value: record.string("string")?.to_string(),
            });
        }
        let lang_tags = match table.get("langTags").and_then(|v| v.as_array()) {
            Some(tags) => tags
                .iter()
                .filter_map(|tag| tag.as_struct())
                .map(|tag| tag.string("tag").map(String::from))
                .collect::<Result<_>>()?,
            None => Vec::new(),
        };
        Ok(NameTable { records, lang_tags })
    }
}
