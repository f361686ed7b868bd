use once_cell::sync::Lazy;

use super::{int, FontTable};
use crate::error::Result;
use crate::schema::{field, type_ref, Fixed, Number, Reserved, Struct, Structure, TypeRef};

static HHEA: Lazy<TypeRef> = Lazy::new(|| {
    type_ref(Structure::new(vec![
        field("version", Fixed::FIXED32),
        field("ascent", Number::I16),
        field("descent", Number::I16),
        field("lineGap", Number::I16),
        field("advanceWidthMax", Number::U16),
        field("minLeftSideBearing", Number::I16),
        field("minRightSideBearing", Number::I16),
        field("xMaxExtent", Number::I16),
        field("caretSlopeRise", Number::I16),
        field("caretSlopeRun", Number::I16),
        field("caretOffset", Number::I16),
        field("reserved", Reserved::new(Number::I16, 4)),
        field("metricDataFormat", Number::I16),
        field("numberOfMetrics", Number::U16),
    ]))
});

/// This table contains information for horizontal layout.
/// See spec:
/// - https://docs.microsoft.com/en-us/typography/opentype/spec/hhea
/// - https://developer.apple.com/fonts/TrueType-Reference-Manual/RM06/Chap6hhea.html
#[derive(Debug, PartialEq, Clone)]
pub struct HheaTable {
    /// Typographic ascent (distance from baseline of highest ascender).
    pub(crate) ascent: i16,
    /// Typographic descent (distance from baseline of lowest descender).
    pub(crate) descent: i16,
    /// Typographic line gap.
    pub(crate) line_gap: i16,
    /// Maximum advance width value in 'hmtx' table.
    pub(crate) advance_width_max: u16,
    /// Number of hMetric entries in 'hmtx' table.
    pub(crate) number_of_h_metrics: u16,
}

impl HheaTable {
    pub fn ascent(&self) -> i16 {
        self.ascent
    }

    pub fn descent(&self) -> i16 {
        self.descent
    }

    pub fn line_gap(&self) -> i16 {
        self.line_gap
    }

    pub fn number_of_h_metrics(&self) -> u16 {
        self.number_of_h_metrics
    }
}

impl FontTable for HheaTable {
    const TAG: &'static str = "hhea";

    fn schema() -> &'static TypeRef {
        &HHEA
    }

    fn from_struct(table: &Struct) -> Result<Self> {
        Ok(HheaTable {
            ascent: int(table, "ascent")?,
            descent: int(table, "descent")?,
            line_gap: int(table, "lineGap")?,
            advance_width_max: int(table, "advanceWidthMax")?,
            number_of_h_metrics: int(table, "numberOfMetrics")?,
        })
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::schema::Type;
    use crate::stream::DecodeStream;
    use fontdecode_test_data::tables::hhea;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_hhea_table() {
        let mut stream = DecodeStream::new(hhea(900, -300, 50, 3));
        let value = HheaTable::schema().decode(&mut stream, None).unwrap();
        let table = HheaTable::from_struct(value.as_struct().unwrap()).unwrap();
        assert_eq!(table.ascent(), 900);
        assert_eq!(table.descent(), -300);
        assert_eq!(table.line_gap(), 50);
        assert_eq!(table.number_of_h_metrics(), 3);
        assert_eq!(stream.pos(), 36);
    }
}
