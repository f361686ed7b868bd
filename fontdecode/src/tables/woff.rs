use once_cell::sync::Lazy;

use super::directory::tables_to_map;
use crate::encodings::Encoding;
use crate::schema::{
    field, type_ref, Array, Number, Origin, Pointer, Reserved, Structure, Text, TypeRef,
};

/// Header and table directory of a WOFF 1.0 font. Table data may be zlib compressed.
/// See spec: https://www.w3.org/TR/WOFF/#WOFFHeader
pub static DIRECTORY: Lazy<TypeRef> = Lazy::new(|| {
    let record = Structure::new(vec![
        field("tag", Text::new(4, Encoding::Ascii)),
        field(
            "offset",
            Pointer::void(Number::U32)
                .origin(Origin::Global)
                .non_null(),
        ),
        field("compLength", Number::U32),
        field("length", Number::U32),
        field("origChecksum", Number::U32),
    ]);
    type_ref(
        Structure::new(vec![
            field("tag", Text::new(4, Encoding::Ascii)),
            field("flavor", Number::U32),
            field("length", Number::U32),
            field("numTables", Number::U16),
            field("reserved", Reserved::new(Number::U16, 1)),
            field("totalSfntSize", Number::U32),
            field("majorVersion", Number::U16),
            field("minorVersion", Number::U16),
            field("metaOffset", Number::U32),
            field("metaLength", Number::U32),
            field("metaOrigLength", Number::U32),
            field("privOffset", Number::U32),
            field("privLength", Number::U32),
            field("tables", Array::new(record, "numTables")),
        ])
        .with_process(tables_to_map),
    )
});

#[cfg(test)]
mod test {
    use super::*;
    use crate::schema::Type;
    use crate::stream::DecodeStream;
    use crate::tables::directory::TableDirectory;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_woff_directory() {
        let mut data = Vec::new();
        data.extend_from_slice(b"wOFF");
        data.extend_from_slice(&0x0001_0000u32.to_be_bytes());
        data.extend_from_slice(&100u32.to_be_bytes());
        data.extend_from_slice(&1u16.to_be_bytes());
        data.extend_from_slice(&[0; 2]);
        data.extend_from_slice(&200u32.to_be_bytes());
        data.extend_from_slice(&[0; 24]);
        data.extend_from_slice(b"maxp");
        data.extend_from_slice(&64u32.to_be_bytes());
        data.extend_from_slice(&20u32.to_be_bytes());
        data.extend_from_slice(&32u32.to_be_bytes());
        data.extend_from_slice(&0u32.to_be_bytes());

        let mut stream = DecodeStream::new(data);
        let value = DIRECTORY.decode(&mut stream, None).unwrap();
        let dir = TableDirectory::from_value(value).unwrap();
        assert_eq!(dir.tag(), "wOFF");
        assert_eq!(dir.flavor, Some(0x0001_0000));
        let maxp = dir.record("maxp").unwrap();
        assert_eq!((maxp.offset, maxp.stored_length, maxp.length), (64, 20, 32));
        assert_eq!(stream.pos(), 64);
    }
}
