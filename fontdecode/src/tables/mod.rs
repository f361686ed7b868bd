pub mod cmap;
pub mod directory;
pub mod glyf;
pub mod head;
pub mod hhea;
pub mod hmtx;
pub mod loca;
pub mod maxp;
pub mod name;
pub mod os2;
pub mod post;
pub mod ttc;
pub mod woff;
pub mod woff2;

use crate::error::Result;
use crate::schema::{Struct, TypeRef};

/// A font table with a schema and a typed view over its decoded struct.
pub trait FontTable: Sized {
    /// The table's tag in the font directory.
    const TAG: &'static str;

    fn schema() -> &'static TypeRef;

    fn from_struct(table: &Struct) -> Result<Self>;
}

/// Schema of a table that can be decoded by tag.
pub(crate) fn schema_for(tag: &str) -> Option<&'static TypeRef> {
    Some(match tag {
        "head" => head::HeadTable::schema(),
        "hhea" => hhea::HheaTable::schema(),
        "maxp" => maxp::MaxpTable::schema(),
        "hmtx" => hmtx::HmtxTable::schema(),
        "loca" => loca::LocaTable::schema(),
        "cmap" => cmap::CmapTable::schema(),
        "OS/2" => os2::Os2Table::schema(),
        "post" => post::PostTable::schema(),
        "name" => name::NameTable::schema(),
        _ => return None,
    })
}

fn int<T: std::convert::TryFrom<i64>>(table: &Struct, name: &str) -> Result<T> {
    let value = table.int(name)?;
    T::try_from(value).map_err(|_| crate::error::Error::mismatch(name, std::any::type_name::<T>()))
}

fn opt_int<T: std::convert::TryFrom<i64>>(table: &Struct, name: &str) -> Result<Option<T>> {
    if table.contains(name) {
        int(table, name).map(Some)
    } else {
        Ok(None)
    }
}
