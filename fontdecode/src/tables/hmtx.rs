use std::rc::Rc;

use once_cell::sync::Lazy;

use super::FontTable;
use crate::error::{Error, Result};
use crate::schema::{
    field, type_ref, LazyArray, LazyArrayValue, Length, Number, Struct, Structure, TypeRef,
};

static HMTX: Lazy<TypeRef> = Lazy::new(|| {
    let metric = Structure::new(vec![
        field("advance", Number::U16),
        field("bearing", Number::I16),
    ]);
    type_ref(Structure::new(vec![
        field(
            "metrics",
            LazyArray::new(
                metric,
                Length::Callback(|ctx| ctx.parent_int("hhea.numberOfMetrics")),
            ),
        ),
        field(
            "bearings",
            LazyArray::new(
                Number::I16,
                Length::Callback(|ctx| {
                    let glyphs = ctx.parent_int("maxp.numGlyphs")?;
                    let metrics = ctx.parent_int("hhea.numberOfMetrics")?;
                    Ok((glyphs - metrics).max(0))
                }),
            ),
        ),
    ]))
});

/// This table contains glyph metrics used for horizontal text layout. Metrics are decoded on
/// demand.
/// See spec:
/// - https://docs.microsoft.com/en-us/typography/opentype/spec/hmtx
/// - https://developer.apple.com/fonts/TrueType-Reference-Manual/RM06/Chap6hmtx.html
#[derive(Debug, Clone)]
pub struct HmtxTable {
    /// Paired advance width and left side bearing values, indexed by glyph ID.
    pub(crate) h_metrics: Rc<LazyArrayValue>,
    /// Left side bearings for glyph IDs greater than or equal to numberOfHMetrics.
    pub(crate) left_side_bearings: Rc<LazyArrayValue>,
}

impl HmtxTable {
    fn metric(&self, index: usize) -> Result<Option<Rc<Struct>>> {
        Ok(self
            .h_metrics
            .get(index)?
            .and_then(|v| v.as_struct())
            .cloned())
    }

    /// Advance width of a glyph. Glyphs past the last metric share its advance width.
    pub fn advance_width(&self, glyph_id: u16) -> Result<u16> {
        let len = self.h_metrics.len();
        if len == 0 {
            return Ok(0);
        }
        let metric = self
            .metric(usize::from(glyph_id).min(len - 1))?
            .ok_or_else(|| Error::missing("advance"))?;
        Ok(metric.int("advance")? as u16)
    }

    pub fn left_side_bearing(&self, glyph_id: u16) -> Result<i16> {
        let index = usize::from(glyph_id);
        if let Some(metric) = self.metric(index)? {
            return Ok(metric.int("bearing")? as i16);
        }
        let bearing = self
            .left_side_bearings
            .int((index - self.h_metrics.len()) as i64)?;
        Ok(bearing.unwrap_or(0) as i16)
    }
}

impl FontTable for HmtxTable {
    const TAG: &'static str = "hmtx";

    fn schema() -> &'static TypeRef {
        &HMTX
    }

    fn from_struct(table: &Struct) -> Result<Self> {
        Ok(HmtxTable {
            h_metrics: table.lazy_array("metrics")?.clone(),
            left_side_bearings: table.lazy_array("bearings")?.clone(),
        })
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::schema::{Context, Resolve, Type, Value};
    use crate::stream::DecodeStream;
    use fontdecode_test_data::tables::hmtx;
    use pretty_assertions::assert_eq;

    struct Counts;

    impl Resolve for Counts {
        fn resolve(&self, name: &str) -> Option<Value> {
            let (field, value) = match name {
                "hhea" => ("numberOfMetrics", 2),
                "maxp" => ("numGlyphs", 4),
                _ => return None,
            };
            let mut table = Struct::default();
            table.set(field, Value::Int(value));
            Some(Value::Struct(Rc::new(table)))
        }
    }

    #[test]
    fn test_hmtx_table() {
        let mut stream = DecodeStream::new(hmtx(&[(500, 10), (600, 20)], &[-5, 7]));
        let counts = Counts;
        let root = Context::root(&counts);
        let value = HmtxTable::schema().decode(&mut stream, Some(&root)).unwrap();
        let table = HmtxTable::from_struct(value.as_struct().unwrap()).unwrap();

        assert_eq!(table.h_metrics.decoded_count(), 0);
        assert_eq!(table.advance_width(1).unwrap(), 600);
        assert_eq!(table.advance_width(3).unwrap(), 600);
        assert_eq!(table.left_side_bearing(0).unwrap(), 10);
        assert_eq!(table.left_side_bearing(3).unwrap(), 7);
        assert_eq!(table.left_side_bearing(9).unwrap(), 0);
        assert_eq!(stream.pos(), 12);
    }

    #[test]
    fn test_hmtx_requires_counts() {
        let mut stream = DecodeStream::new(hmtx(&[(500, 10)], &[]));
        assert!(HmtxTable::schema().decode(&mut stream, None).is_err());
    }
}
