use once_cell::sync::Lazy;

use crate::schema::{field, type_ref, Array, Number, TypeRef, VersionedStructure};

/// Header of a TrueType collection, following the `ttcf` tag.
/// See spec: https://docs.microsoft.com/en-us/typography/opentype/spec/otff#ttc-header
pub static HEADER: Lazy<TypeRef> = Lazy::new(|| {
    type_ref(
        VersionedStructure::inline(Number::U32)
            .version(
                0x0001_0000,
                vec![
                    field("numFonts", Number::U32),
                    field("offsets", Array::new(Number::U32, "numFonts")),
                ],
            )
            .version(
                0x0002_0000,
                vec![
                    field("numFonts", Number::U32),
                    field("offsets", Array::new(Number::U32, "numFonts")),
                    field("dsigTag", Number::U32),
                    field("dsigLength", Number::U32),
                    field("dsigOffset", Number::U32),
                ],
            ),
    )
});
