use std::rc::Rc;

use once_cell::sync::Lazy;

use super::loca::LocaTable;
use crate::error::{Error, Result};
use crate::schema::{field, type_ref, Fixed, Number, Structure, Type, TypeRef};
use crate::stream::DecodeStream;

static GLYPH_HEADER: Lazy<TypeRef> = Lazy::new(|| {
    type_ref(Structure::new(vec![
        field("numberOfContours", Number::I16),
        field("xMin", Number::I16),
        field("yMin", Number::I16),
        field("xMax", Number::I16),
        field("yMax", Number::I16),
    ]))
});

// simple glyph flags
const ON_CURVE: u8 = 0x01;
const X_SHORT_VECTOR: u8 = 0x02;
const Y_SHORT_VECTOR: u8 = 0x04;
const REPEAT: u8 = 0x08;
const X_IS_SAME_OR_POSITIVE: u8 = 0x10;
const Y_IS_SAME_OR_POSITIVE: u8 = 0x20;

// composite glyph flags
const ARG_1_AND_2_ARE_WORDS: u16 = 0x0001;
const WE_HAVE_A_SCALE: u16 = 0x0008;
const MORE_COMPONENTS: u16 = 0x0020;
const WE_HAVE_AN_X_AND_Y_SCALE: u16 = 0x0040;
const WE_HAVE_A_TWO_BY_TWO: u16 = 0x0080;
const WE_HAVE_INSTRUCTIONS: u16 = 0x0100;

/// A point of a simple glyph outline, in font units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub on_curve: bool,
    /// Last point of its contour.
    pub end_contour: bool,
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(on_curve: bool, end_contour: bool, x: f64, y: f64) -> Self {
        Point {
            on_curve,
            end_contour,
            x,
            y,
        }
    }
}

/// A reference to another glyph from within a composite glyph, with the affine transform applied
/// to the referenced outline.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Component {
    pub glyph_id: u16,
    pub dx: f64,
    pub dy: f64,
    pub scale_x: f64,
    pub scale_y: f64,
    pub scale01: f64,
    pub scale10: f64,
}

impl Component {
    fn new(glyph_id: u16, dx: f64, dy: f64) -> Self {
        Component {
            glyph_id,
            dx,
            dy,
            scale_x: 1.0,
            scale_y: 1.0,
            scale01: 0.0,
            scale10: 0.0,
        }
    }

    pub fn transform(&self, x: f64, y: f64) -> (f64, f64) {
        (
            x * self.scale_x + y * self.scale01 + self.dx,
            y * self.scale_y + x * self.scale10 + self.dy,
        )
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Outline {
    Empty,
    Simple(Vec<Point>),
    Composite(Vec<Component>),
}

/// A single decoded glyph description.
#[derive(Debug, Clone, PartialEq)]
pub struct GlyphData {
    /// If the number of contours is greater than or equal to zero, this is a simple glyph. If
    /// negative, this is a composite glyph.
    pub(crate) number_of_contours: i16,
    /// `[x_min, y_min, x_max, y_max]` for coordinate data.
    pub(crate) bbox: [i16; 4],
    pub(crate) outline: Outline,
}

impl GlyphData {
    pub(crate) fn empty() -> Self {
        GlyphData {
            number_of_contours: 0,
            bbox: [0; 4],
            outline: Outline::Empty,
        }
    }

    /// Decodes a glyph from its bytes in the `glyf` table.
    pub fn decode(data: &[u8]) -> Result<Self> {
        if data.is_empty() {
            return Ok(GlyphData::empty());
        }
        let mut stream = DecodeStream::new(data);
        let header = GLYPH_HEADER.decode(&mut stream, None)?;
        let header = header
            .as_struct()
            .ok_or_else(|| Error::mismatch("glyph header", "struct"))?;
        let number_of_contours = header.int("numberOfContours")? as i16;
        let bbox = [
            header.int("xMin")? as i16,
            header.int("yMin")? as i16,
            header.int("xMax")? as i16,
            header.int("yMax")? as i16,
        ];

        let outline = if number_of_contours > 0 {
            Outline::Simple(decode_simple(&mut stream, number_of_contours as usize)?)
        } else if number_of_contours < 0 {
            let (components, _) = decode_components(&mut stream)?;
            Outline::Composite(components)
        } else {
            Outline::Empty
        };

        Ok(GlyphData {
            number_of_contours,
            bbox,
            outline,
        })
    }

    pub fn number_of_contours(&self) -> i16 {
        self.number_of_contours
    }

    pub fn bbox(&self) -> [i16; 4] {
        self.bbox
    }

    pub fn outline(&self) -> &Outline {
        &self.outline
    }

    pub fn is_composite(&self) -> bool {
        matches!(self.outline, Outline::Composite(_))
    }
}

fn decode_simple(stream: &mut DecodeStream, number_of_contours: usize) -> Result<Vec<Point>> {
    let mut end_points = Vec::with_capacity(number_of_contours);
    for _ in 0..number_of_contours {
        end_points.push(usize::from(stream.read_u16()?));
    }
    // instructions are not interpreted
    let instruction_length = stream.read_u16()?;
    stream.skip(usize::from(instruction_length))?;

    let num_points = end_points.last().map_or(0, |last| last + 1);
    let mut flags = Vec::with_capacity(num_points);
    while flags.len() < num_points {
        let flag = stream.read_u8()?;
        flags.push(flag);
        if flag & REPEAT != 0 {
            let count = stream.read_u8()?;
            for _ in 0..count {
                flags.push(flag);
            }
        }
    }
    flags.truncate(num_points);

    let xs = decode_coordinates(stream, &flags, X_SHORT_VECTOR, X_IS_SAME_OR_POSITIVE)?;
    let ys = decode_coordinates(stream, &flags, Y_SHORT_VECTOR, Y_IS_SAME_OR_POSITIVE)?;

    let mut points: Vec<Point> = flags
        .iter()
        .zip(xs.into_iter().zip(ys))
        .map(|(flag, (x, y))| Point::new(flag & ON_CURVE != 0, false, x, y))
        .collect();
    for end in end_points {
        match points.get_mut(end) {
            Some(point) => point.end_contour = true,
            None => return Err(Error::invalid("contour end point out of range")),
        }
    }
    Ok(points)
}

fn decode_coordinates(
    stream: &mut DecodeStream,
    flags: &[u8],
    short_vector: u8,
    same_or_positive: u8,
) -> Result<Vec<f64>> {
    let mut value = 0i32;
    let mut coordinates = Vec::with_capacity(flags.len());
    for flag in flags {
        if flag & short_vector != 0 {
            let delta = i32::from(stream.read_u8()?);
            if flag & same_or_positive != 0 {
                value += delta;
            } else {
                value -= delta;
            }
        } else if flag & same_or_positive == 0 {
            value += i32::from(stream.read_i16()?);
        }
        coordinates.push(f64::from(value));
    }
    Ok(coordinates)
}

/// Decodes the component records of a composite glyph. Also reports whether instructions follow
/// the last component.
pub(crate) fn decode_components(stream: &mut DecodeStream) -> Result<(Vec<Component>, bool)> {
    let mut components = Vec::new();
    let mut have_instructions = false;
    loop {
        let flags = stream.read_u16()?;
        let glyph_id = stream.read_u16()?;
        let (dx, dy) = if flags & ARG_1_AND_2_ARE_WORDS != 0 {
            (f64::from(stream.read_i16()?), f64::from(stream.read_i16()?))
        } else {
            (f64::from(stream.read_i8()?), f64::from(stream.read_i8()?))
        };

        let mut component = Component::new(glyph_id, dx, dy);
        if flags & WE_HAVE_A_SCALE != 0 {
            let scale = Fixed::F2DOT14.read(stream)?;
            component.scale_x = scale;
            component.scale_y = scale;
        } else if flags & WE_HAVE_AN_X_AND_Y_SCALE != 0 {
            component.scale_x = Fixed::F2DOT14.read(stream)?;
            component.scale_y = Fixed::F2DOT14.read(stream)?;
        } else if flags & WE_HAVE_A_TWO_BY_TWO != 0 {
            component.scale_x = Fixed::F2DOT14.read(stream)?;
            component.scale01 = Fixed::F2DOT14.read(stream)?;
            component.scale10 = Fixed::F2DOT14.read(stream)?;
            component.scale_y = Fixed::F2DOT14.read(stream)?;
        }
        have_instructions |= flags & WE_HAVE_INSTRUCTIONS != 0;
        components.push(component);

        if flags & MORE_COMPONENTS == 0 {
            break;
        }
    }
    Ok((components, have_instructions))
}

/// The 'glyf' table is comprised of a list of glyph data blocks, each of which provides the
/// description for a single glyph. Glyphs are referenced by identifiers (glyph IDs), which are
/// sequential integers beginning at zero.
/// See spec:
/// - https://docs.microsoft.com/en-us/typography/opentype/spec/glyf
/// - https://developer.apple.com/fonts/TrueType-Reference-Manual/RM06/Chap6glyf.html
#[derive(Debug, Clone)]
pub enum GlyfTable {
    /// Raw table data, sliced per glyph through `loca`.
    Raw { data: Rc<[u8]>, loca: LocaTable },
    /// Glyphs reconstructed from a transformed WOFF2 `glyf` table.
    Reconstructed(Vec<GlyphData>),
}

impl GlyfTable {
    pub fn num_glyphs(&self) -> usize {
        match self {
            GlyfTable::Raw { loca, .. } => loca.offsets.len().saturating_sub(1),
            GlyfTable::Reconstructed(glyphs) => glyphs.len(),
        }
    }

    /// Decodes the glyph description of a glyph id, `None` for ids out of range.
    pub fn glyph(&self, glyph_id: u16) -> Result<Option<GlyphData>> {
        match self {
            GlyfTable::Raw { data, loca } => {
                let (start, end) = match loca.range(glyph_id) {
                    Some(range) => range,
                    None => return Ok(None),
                };
                if start > end || end > data.len() {
                    return Err(Error::invalid(format!(
                        "glyph {} at {}..{} is outside of the glyf table",
                        glyph_id, start, end
                    )));
                }
                GlyphData::decode(&data[start..end]).map(Some)
            }
            GlyfTable::Reconstructed(glyphs) => Ok(glyphs.get(usize::from(glyph_id)).cloned()),
        }
    }
}
