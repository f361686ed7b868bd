//! Builders for `glyf` glyph descriptions.

use crate::Put;

const ON_CURVE: u8 = 0x01;
const X_SHORT_VECTOR: u8 = 0x02;
const Y_SHORT_VECTOR: u8 = 0x04;
const REPEAT: u8 = 0x08;
const X_IS_SAME_OR_POSITIVE: u8 = 0x10;
const Y_IS_SAME_OR_POSITIVE: u8 = 0x20;

const ARG_1_AND_2_ARE_WORDS: u16 = 0x0001;
const ARGS_ARE_XY_VALUES: u16 = 0x0002;
const WE_HAVE_A_SCALE: u16 = 0x0008;
const MORE_COMPONENTS: u16 = 0x0020;

/// A contour of `(on_curve, x, y)` points in absolute font units.
#[derive(Debug, Clone, PartialEq)]
pub struct Contour(pub Vec<(bool, i16, i16)>);

/// Flag bits and coordinate bytes of one axis delta.
fn encode_delta(delta: i32, short: u8, same_or_positive: u8, out: &mut Vec<u8>) -> u8 {
    if delta == 0 {
        same_or_positive
    } else if delta.abs() < 256 {
        out.push(delta.abs() as u8);
        if delta > 0 {
            short | same_or_positive
        } else {
            short
        }
    } else {
        out.put_i16(delta as i16);
        0
    }
}

pub(crate) fn bbox<'a>(points: impl Iterator<Item = &'a (bool, i16, i16)>) -> [i16; 4] {
    points.fold(None, |bbox: Option<[i16; 4]>, &(_, x, y)| {
        Some(match bbox {
            None => [x, y, x, y],
            Some([x0, y0, x1, y1]) => [x0.min(x), y0.min(y), x1.max(x), y1.max(y)],
        })
    })
    .unwrap_or([0; 4])
}

/// A simple glyph with its bounding box computed from the points. Flags are compressed with
/// the repeat flag and coordinates use the shortest encoding.
pub fn simple(contours: &[Contour]) -> Vec<u8> {
    let mut data = Vec::new();
    let [x_min, y_min, x_max, y_max] = bbox(contours.iter().flat_map(|c| c.0.iter()));
    data.put_i16(contours.len() as i16)
        .put_i16(x_min)
        .put_i16(y_min)
        .put_i16(x_max)
        .put_i16(y_max);

    let mut end = 0usize;
    for contour in contours {
        end += contour.0.len();
        data.put_u16(end as u16 - 1);
    }
    // no instructions
    data.put_u16(0);

    let mut flags = Vec::new();
    let mut xs = Vec::new();
    let mut ys = Vec::new();
    let (mut x, mut y) = (0i32, 0i32);
    for &(on_curve, px, py) in contours.iter().flat_map(|c| c.0.iter()) {
        let mut flag = if on_curve { ON_CURVE } else { 0 };
        flag |= encode_delta(i32::from(px) - x, X_SHORT_VECTOR, X_IS_SAME_OR_POSITIVE, &mut xs);
        flag |= encode_delta(i32::from(py) - y, Y_SHORT_VECTOR, Y_IS_SAME_OR_POSITIVE, &mut ys);
        flags.push(flag);
        x = i32::from(px);
        y = i32::from(py);
    }

    let mut i = 0;
    while i < flags.len() {
        let flag = flags[i];
        let repeat = flags[i + 1..]
            .iter()
            .take(255)
            .take_while(|f| **f == flag)
            .count();
        if repeat > 0 {
            data.put_u8(flag | REPEAT).put_u8(repeat as u8);
        } else {
            data.put_u8(flag);
        }
        i += repeat + 1;
    }
    data.extend(xs);
    data.extend(ys);
    data
}

/// A component of a composite glyph placed at an offset.
#[derive(Debug, Clone, PartialEq)]
pub struct ComponentRecord {
    pub glyph_id: u16,
    pub dx: i16,
    pub dy: i16,
    pub scale: Option<f64>,
}

impl ComponentRecord {
    pub fn offset(glyph_id: u16, dx: i16, dy: i16) -> Self {
        ComponentRecord {
            glyph_id,
            dx,
            dy,
            scale: None,
        }
    }

    pub fn with_scale(mut self, scale: f64) -> Self {
        self.scale = Some(scale);
        self
    }
}

/// Component records as stored in a composite glyph description, without the glyph header.
pub fn components(records: &[ComponentRecord]) -> Vec<u8> {
    let mut data = Vec::new();
    for (i, record) in records.iter().enumerate() {
        let fits_byte = fits_i8(record.dx) && fits_i8(record.dy);
        let mut flags = ARGS_ARE_XY_VALUES;
        if !fits_byte {
            flags |= ARG_1_AND_2_ARE_WORDS;
        }
        if record.scale.is_some() {
            flags |= WE_HAVE_A_SCALE;
        }
        if i + 1 < records.len() {
            flags |= MORE_COMPONENTS;
        }
        data.put_u16(flags).put_u16(record.glyph_id);
        if fits_byte {
            data.put_i8(record.dx as i8).put_i8(record.dy as i8);
        } else {
            data.put_i16(record.dx).put_i16(record.dy);
        }
        if let Some(scale) = record.scale {
            // F2Dot14
            data.put_i16((scale * 16384.0).round() as i16);
        }
    }
    data
}

/// A composite glyph with an empty bounding box.
pub fn composite(records: &[ComponentRecord]) -> Vec<u8> {
    composite_with_bbox([0; 4], records)
}

pub fn composite_with_bbox(bbox: [i16; 4], records: &[ComponentRecord]) -> Vec<u8> {
    let mut data = Vec::new();
    data.put_i16(-1);
    for value in bbox.iter() {
        data.put_i16(*value);
    }
    data.extend(components(records));
    data
}

fn fits_i8(value: i16) -> bool {
    value >= i16::from(i8::MIN) && value <= i16::from(i8::MAX)
}
