use std::rc::Rc;

use once_cell::sync::Lazy;

use super::directory::tables_to_map;
use crate::encodings::Encoding;
use crate::error::{Error, Result};
use crate::schema::{
    computed, field, type_ref, Array, Context, Number, Optional, Reserved, Struct, Structure, Text,
    Type, TypeRef, Value,
};
use crate::stream::DecodeStream;

/// Tags addressed by the low six bits of a WOFF2 table entry's flags. Index 63 means an explicit
/// tag follows the flags.
/// See spec: https://www.w3.org/TR/WOFF2/#table_dir_format
pub const KNOWN_TAGS: [&str; 63] = [
    "cmap", "head", "hhea", "hmtx", "maxp", "name", "OS/2", "post", "cvt ", "fpgm", "glyf", "loca",
    "prep", "CFF ", "VORG", "EBDT", "EBLC", "gasp", "hdmx", "kern", "LTSH", "PCLT", "VDMX", "vhea",
    "vmtx", "BASE", "GDEF", "GPOS", "GSUB", "EBSC", "JSTF", "MATH", "CBDT", "CBLC", "COLR", "CPAL",
    "SVG ", "sbix", "acnt", "avar", "bdat", "bloc", "bsln", "cvar", "fdsc", "feat", "fmtx", "fvar",
    "gvar", "hsty", "just", "lcar", "mort", "morx", "opbd", "prop", "trak", "Zapf", "Silf", "Glat",
    "Gloc", "Feat", "Sill",
];

const CUSTOM_TAG: i64 = 0x3f;

/// Variable length unsigned integer of up to five bytes, seven bits per byte, most significant
/// group first.
#[derive(Debug, Clone, Copy)]
pub struct UIntBase128;

impl UIntBase128 {
    pub fn read(stream: &mut DecodeStream) -> Result<u32> {
        let mut result: u32 = 0;
        for i in 0..5 {
            let byte = stream.read_u8()?;
            if i == 0 && byte == 0x80 {
                return Err(Error::invalid("leading zero in UIntBase128"));
            }
            if result & 0xfe00_0000 != 0 {
                return Err(Error::invalid("overflow in UIntBase128"));
            }
            result = (result << 7) | u32::from(byte & 0x7f);
            if byte & 0x80 == 0 {
                return Ok(result);
            }
        }
        Err(Error::invalid("UIntBase128 longer than five bytes"))
    }
}

impl Type for UIntBase128 {
    fn decode(&self, stream: &mut DecodeStream, _: Option<&Context<'_>>) -> Result<Value> {
        Self::read(stream).map(|v| Value::Int(i64::from(v)))
    }
}

fn has_custom_tag(ctx: &Context<'_>) -> Result<bool> {
    Ok(ctx.int("flags")? & CUSTOM_TAG == CUSTOM_TAG)
}

fn entry_tag(ctx: &Context<'_>) -> Result<Value> {
    if let Some(tag) = ctx.get("customTag") {
        return Ok(tag);
    }
    let index = (ctx.int("flags")? & CUSTOM_TAG) as usize;
    Ok(Value::String(KNOWN_TAGS[index].to_string()))
}

fn transform_version(ctx: &Context<'_>) -> Result<Value> {
    Ok(Value::Int((ctx.int("flags")? >> 6) & 0x03))
}

/// `glyf` and `loca` use transform version 0 for their transformed form, every other table uses
/// version 0 for the null transform.
fn transformed(ctx: &Context<'_>) -> Result<Value> {
    let version = ctx.int("transformVersion")?;
    let tag = ctx.lookup("tag");
    let is_glyf_or_loca = matches!(tag.as_ref().and_then(Value::as_str), Some("glyf") | Some("loca"));
    let transformed = if is_glyf_or_loca {
        version == 0
    } else {
        version != 0
    };
    Ok(Value::Int(transformed as i64))
}

/// Assigns each entry the offset of its data in the decompressed payload. Tables are stored back to
/// back in directory order, transformed tables with their transformed length. The end of the last
/// table is the decompressed size of the payload.
fn assign_offsets(res: &mut Struct) -> Result<()> {
    let mut offset = 0usize;
    let mut entries = Vec::new();
    for entry in res.array("tables")? {
        let mut entry = entry
            .as_struct()
            .ok_or_else(|| Error::mismatch("tables", "struct"))?
            .as_ref()
            .clone();
        let stored_length = if entry.contains("transformLength") {
            entry.int("transformLength")?
        } else {
            entry.int("length")?
        };
        entry.set("offset", Value::Offset(offset));
        offset += stored_length as usize;
        entries.push(Value::Struct(Rc::new(entry)));
    }
    res.set("tables", Value::Array(Rc::new(entries)));
    res.set("uncompressedSize", Value::Int(offset as i64));
    Ok(())
}

/// Header and table directory of a WOFF2 font. The table data following the directory is a
/// single Brotli stream.
/// See spec: https://www.w3.org/TR/WOFF2/#woff20Header
pub static DIRECTORY: Lazy<TypeRef> = Lazy::new(|| {
    let entry = Structure::new(vec![
        field("flags", Number::U8),
        field(
            "customTag",
            Optional::when(Text::new(4, Encoding::Ascii), has_custom_tag),
        ),
        computed("tag", entry_tag),
        field("length", UIntBase128),
        computed("transformVersion", transform_version),
        computed("transformed", transformed),
        field(
            "transformLength",
            Optional::when(UIntBase128, |ctx| Ok(ctx.int("transformed")? == 1)),
        ),
    ]);
    type_ref(
        Structure::new(vec![
            field("tag", Text::new(4, Encoding::Ascii)),
            field("flavor", Number::U32),
            field("length", Number::U32),
            field("numTables", Number::U16),
            field("reserved", Reserved::new(Number::U16, 1)),
            field("totalSfntSize", Number::U32),
            field("totalCompressedSize", Number::U32),
            field("majorVersion", Number::U16),
            field("minorVersion", Number::U16),
            field("metaOffset", Number::U32),
            field("metaLength", Number::U32),
            field("metaOrigLength", Number::U32),
            field("privOffset", Number::U32),
            field("privLength", Number::U32),
            field("tables", Array::new(entry, "numTables")),
        ])
        .with_process(|res| {
            assign_offsets(res)?;
            tables_to_map(res)
        }),
    )
});

#[cfg(test)]
mod test {
    use super::*;
    use crate::tables::directory::TableDirectory;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_base128() {
        let mut stream = DecodeStream::new(vec![0x3f, 0x81, 0x00, 0x8f, 0xff, 0xff, 0xff, 0x7f]);
        assert_eq!(UIntBase128::read(&mut stream).unwrap(), 63);
        assert_eq!(UIntBase128::read(&mut stream).unwrap(), 128);
        assert_eq!(UIntBase128::read(&mut stream).unwrap(), 0xffff_ffff);
    }

    #[test]
    fn test_base128_overflow() {
        let mut stream = DecodeStream::new(vec![0xff, 0xff, 0xff, 0xff, 0x7f]);
        assert!(UIntBase128::read(&mut stream).is_err());

        let mut stream = DecodeStream::new(vec![0x80, 0x80, 0x80, 0x80, 0x80, 0x01]);
        assert!(UIntBase128::read(&mut stream).is_err());
    }

    fn header(num_tables: u16) -> Vec<u8> {
        let mut data = Vec::new();
        data.extend_from_slice(b"wOF2");
        data.extend_from_slice(&0x0001_0000u32.to_be_bytes());
        data.extend_from_slice(&0u32.to_be_bytes());
        data.extend_from_slice(&num_tables.to_be_bytes());
        data.extend_from_slice(&[0; 2]);
        data.extend_from_slice(&[0; 4 + 4 + 2 + 2 + 4 * 5]);
        data
    }

    #[test]
    fn test_entries() {
        let mut data = header(4);
        // glyf, transformed (version 0)
        data.extend_from_slice(&[10, 0x81, 0x00, 0x40]);
        // loca, null transform (version 3)
        data.extend_from_slice(&[0xc0 | 11, 0x20]);
        // head, null transform
        data.extend_from_slice(&[1, 0x36]);
        // custom tag
        data.extend_from_slice(&[0x3f]);
        data.extend_from_slice(b"DSIG");
        data.extend_from_slice(&[0x08]);

        let mut stream = DecodeStream::new(data);
        let value = DIRECTORY.decode(&mut stream, None).unwrap();
        assert_eq!(stream.pos(), stream.len());
        let dir = TableDirectory::from_value(value).unwrap();
        let tags: Vec<_> = dir.records().iter().map(|r| r.tag().to_string()).collect();
        assert_eq!(tags, vec!["glyf", "loca", "head", "DSIG"]);

        let glyf = dir.record("glyf").unwrap();
        assert!(glyf.transformed);
        assert_eq!((glyf.length, glyf.stored_length), (128, 64));
        assert_eq!(glyf.offset, 0);

        let loca = dir.record("loca").unwrap();
        assert!(!loca.transformed);
        assert_eq!((loca.offset, loca.stored_length), (64, 32));

        let head = dir.record("head").unwrap();
        assert_eq!((head.offset, head.length), (96, 0x36));
        let dsig = dir.record("DSIG").unwrap();
        assert_eq!((dsig.offset, dsig.length), (96 + 0x36, 8));
        assert_eq!(dir.raw().int("uncompressedSize").unwrap(), 96 + 0x36 + 8);
    }
}
