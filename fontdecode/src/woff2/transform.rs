use once_cell::sync::Lazy;

use crate::error::{Error, Result};
use crate::schema::{field, type_ref, Buffer, Number, Struct, Structure, Type, TypeRef};
use crate::stream::DecodeStream;
use crate::tables::glyf::{decode_components, GlyphData, Outline, Point};

/// Header of a transformed `glyf` table followed by its seven substreams.
/// See spec: https://www.w3.org/TR/WOFF2/#glyf_table_format
static TRANSFORMED_GLYF: Lazy<TypeRef> = Lazy::new(|| {
    type_ref(Structure::new(vec![
        field("version", Number::U32),
        field("numGlyphs", Number::U16),
        field("indexFormat", Number::U16),
        field("nContourStreamSize", Number::U32),
        field("nPointsStreamSize", Number::U32),
        field("flagStreamSize", Number::U32),
        field("glyphStreamSize", Number::U32),
        field("compositeStreamSize", Number::U32),
        field("bboxStreamSize", Number::U32),
        field("instructionStreamSize", Number::U32),
        field("nContours", Buffer::new("nContourStreamSize")),
        field("nPoints", Buffer::new("nPointsStreamSize")),
        field("flags", Buffer::new("flagStreamSize")),
        field("glyphs", Buffer::new("glyphStreamSize")),
        field("composites", Buffer::new("compositeStreamSize")),
        field("bboxes", Buffer::new("bboxStreamSize")),
        field("instructions", Buffer::new("instructionStreamSize")),
    ]))
});

const WORD_CODE: u8 = 253;
const ONE_MORE_BYTE_CODE2: u8 = 254;
const ONE_MORE_BYTE_CODE1: u8 = 255;
const LOWEST_U_CODE: u16 = 253;

/// Reads a `255UInt16`: one byte for values below 253, with escape codes for larger values.
pub fn read_255_u16(stream: &mut DecodeStream) -> Result<u16> {
    let code = stream.read_u8()?;
    Ok(match code {
        WORD_CODE => stream.read_u16()?,
        ONE_MORE_BYTE_CODE1 => u16::from(stream.read_u8()?) + LOWEST_U_CODE,
        ONE_MORE_BYTE_CODE2 => u16::from(stream.read_u8()?) + LOWEST_U_CODE * 2,
        code => u16::from(code),
    })
}

fn with_sign(flag: u8, value: i32) -> i32 {
    if flag & 1 != 0 {
        value
    } else {
        -value
    }
}

/// Decodes `count` points from the flag stream and the glyph stream. Coordinates are deltas to
/// the previous point, starting at the origin.
pub fn decode_triplets(
    flags: &mut DecodeStream,
    glyphs: &mut DecodeStream,
    count: usize,
) -> Result<Vec<Point>> {
    // every point takes at least one flag byte
    if count > flags.remaining() {
        return Err(Error::invalid(format!(
            "{} points but only {} flag bytes",
            count,
            flags.remaining()
        )));
    }
    let (mut x, mut y) = (0i32, 0i32);
    let mut points = Vec::with_capacity(count);
    for _ in 0..count {
        let flag = flags.read_u8()?;
        let on_curve = flag >> 7 == 0;
        let flag = flag & 0x7f;

        let (dx, dy) = if flag < 10 {
            let b0 = i32::from(glyphs.read_u8()?);
            (0, with_sign(flag, (i32::from(flag & 14) << 7) + b0))
        } else if flag < 20 {
            let b0 = i32::from(glyphs.read_u8()?);
            (with_sign(flag, (i32::from((flag - 10) & 14) << 7) + b0), 0)
        } else if flag < 84 {
            let b0 = i32::from(flag - 20);
            let b1 = i32::from(glyphs.read_u8()?);
            (
                with_sign(flag, 1 + (b0 & 0x30) + (b1 >> 4)),
                with_sign(flag >> 1, 1 + ((b0 & 0x0c) << 2) + (b1 & 0x0f)),
            )
        } else if flag < 120 {
            let b0 = i32::from(flag - 84);
            let b1 = i32::from(glyphs.read_u8()?);
            let b2 = i32::from(glyphs.read_u8()?);
            (
                with_sign(flag, 1 + ((b0 / 12) << 8) + b1),
                with_sign(flag >> 1, 1 + (((b0 % 12) >> 2) << 8) + b2),
            )
        } else if flag < 124 {
            let b1 = i32::from(glyphs.read_u8()?);
            let b2 = i32::from(glyphs.read_u8()?);
            let b3 = i32::from(glyphs.read_u8()?);
            (
                with_sign(flag, (b1 << 4) + (b2 >> 4)),
                with_sign(flag >> 1, ((b2 & 0x0f) << 8) + b3),
            )
        } else {
            let b1 = i32::from(glyphs.read_u16()?);
            let b2 = i32::from(glyphs.read_u16()?);
            (with_sign(flag, b1), with_sign(flag >> 1, b2))
        };

        x += dx;
        y += dy;
        points.push(Point::new(on_curve, false, f64::from(x), f64::from(y)));
    }
    Ok(points)
}

fn substream(table: &Struct, name: &str) -> Result<DecodeStream> {
    let bytes = table
        .field(name)?
        .as_bytes()
        .ok_or_else(|| Error::mismatch(name, "bytes"))?;
    Ok(DecodeStream::new(bytes))
}

fn points_bbox(points: &[Point]) -> [i16; 4] {
    let mut iter = points.iter();
    let first = match iter.next() {
        Some(first) => first,
        None => return [0; 4],
    };
    let init = [first.x, first.y, first.x, first.y];
    let [x0, y0, x1, y1] = iter.fold(init, |[x0, y0, x1, y1], p| {
        [x0.min(p.x), y0.min(p.y), x1.max(p.x), y1.max(p.y)]
    });
    [x0 as i16, y0 as i16, x1 as i16, y1 as i16]
}

/// Reconstructs the glyph descriptions of a transformed `glyf` table starting at the stream's
/// position.
pub fn reconstruct_glyf(stream: &mut DecodeStream) -> Result<Vec<GlyphData>> {
    let table = TRANSFORMED_GLYF.decode(stream, None)?;
    let table = table
        .as_struct()
        .ok_or_else(|| Error::mismatch("glyf", "struct"))?;
    let num_glyphs = table.int("numGlyphs")? as usize;
    log::debug!("reconstructing {} transformed glyphs", num_glyphs);

    let mut n_contours = substream(table, "nContours")?;
    let mut n_points = substream(table, "nPoints")?;
    let mut flags = substream(table, "flags")?;
    let mut glyphs = substream(table, "glyphs")?;
    let mut composites = substream(table, "composites")?;
    let mut bboxes = substream(table, "bboxes")?;

    // one bit per glyph, padded to a multiple of four bytes
    let bitmap_len = ((num_glyphs + 31) >> 5) << 2;
    let bbox_bitmap = bboxes.read_bytes(bitmap_len)?.to_vec();

    let mut result = Vec::with_capacity(num_glyphs);
    for index in 0..num_glyphs {
        let number_of_contours = n_contours.read_i16()?;
        let outline = if number_of_contours > 0 {
            let mut end_points = Vec::with_capacity(number_of_contours as usize);
            let mut total = 0usize;
            for _ in 0..number_of_contours {
                total += usize::from(read_255_u16(&mut n_points)?);
                end_points.push(total);
            }
            let mut points = decode_triplets(&mut flags, &mut glyphs, total)?;
            for end in end_points {
                if let Some(point) = end.checked_sub(1).and_then(|ix| points.get_mut(ix)) {
                    point.end_contour = true;
                }
            }
            // instructions are not retained
            read_255_u16(&mut glyphs)?;
            Outline::Simple(points)
        } else if number_of_contours < 0 {
            let (components, have_instructions) = decode_components(&mut composites)?;
            if have_instructions {
                read_255_u16(&mut glyphs)?;
            }
            Outline::Composite(components)
        } else {
            Outline::Empty
        };

        let has_bbox = bbox_bitmap[index >> 3] & (0x80 >> (index & 7)) != 0;
        let bbox = if has_bbox {
            [
                bboxes.read_i16()?,
                bboxes.read_i16()?,
                bboxes.read_i16()?,
                bboxes.read_i16()?,
            ]
        } else {
            match &outline {
                Outline::Simple(points) => points_bbox(points),
                _ => [0; 4],
            }
        };

        result.push(GlyphData {
            number_of_contours,
            bbox,
            outline,
        });
    }
    Ok(result)
}

#[cfg(test)]
mod test {
    use super::*;
    use fontdecode_test_data::glyf::{ComponentRecord, Contour};
    use fontdecode_test_data::woff2::{transform_glyf, TransformedGlyph};
    use pretty_assertions::assert_eq;

    #[test]
    fn test_read_255_u16() {
        let mut stream = DecodeStream::new(vec![
            0, 252, 253, 0x12, 0x34, 255, 0, 255, 252, 254, 0, 254, 255,
        ]);
        assert_eq!(read_255_u16(&mut stream).unwrap(), 0);
        assert_eq!(read_255_u16(&mut stream).unwrap(), 252);
        assert_eq!(read_255_u16(&mut stream).unwrap(), 0x1234);
        assert_eq!(read_255_u16(&mut stream).unwrap(), 253);
        assert_eq!(read_255_u16(&mut stream).unwrap(), 505);
        assert_eq!(read_255_u16(&mut stream).unwrap(), 506);
        assert_eq!(read_255_u16(&mut stream).unwrap(), 761);
        assert!(read_255_u16(&mut stream).is_err());
    }

    #[test]
    fn test_decode_triplets() {
        let mut flags = DecodeStream::new(vec![1, 11, 0x80 | 20, 87, 120, 125]);
        let mut glyphs = DecodeStream::new(vec![
            10, // y only
            20, // x only
            0x12, // combined nibbles
            4, 5, // one byte each
            0x01, 0x23, 0x45, // 12 bit pair
            0x01, 0x00, 0x00, 0x02, // words
        ]);
        let points = decode_triplets(&mut flags, &mut glyphs, 6).unwrap();
        let coords: Vec<_> = points.iter().map(|p| (p.on_curve, p.x, p.y)).collect();
        assert_eq!(
            coords,
            vec![
                (true, 0.0, 10.0),
                (true, 20.0, 10.0),
                (false, 18.0, 7.0),
                (true, 23.0, 13.0),
                (true, 5.0, -824.0),
                (true, 261.0, -826.0),
            ]
        );
        assert_eq!(glyphs.remaining(), 0);
    }

    #[test]
    fn test_point_count_exceeds_flags() {
        let mut flags = DecodeStream::new(vec![0]);
        let mut glyphs = DecodeStream::new(vec![0]);
        assert!(matches!(
            decode_triplets(&mut flags, &mut glyphs, 2_000_000_000),
            Err(Error::InvalidData(_))
        ));
        assert_eq!(flags.pos(), 0);
    }

    #[test]
    fn test_reconstruct_glyf() {
        let data = transform_glyf(&[
            TransformedGlyph::Empty,
            TransformedGlyph::Simple(vec![
                Contour(vec![(true, 0, 0), (false, 300, 700), (true, 600, 0)]),
                Contour(vec![(true, 200, 100), (true, 400, 100), (true, 300, -2000)]),
            ]),
            TransformedGlyph::Composite(
                [10, -20, 900, 1000],
                vec![ComponentRecord::offset(1, 50, -50)],
            ),
        ]);
        let mut stream = DecodeStream::new(data);
        let glyphs = reconstruct_glyf(&mut stream).unwrap();
        assert_eq!(glyphs.len(), 3);

        assert_eq!(glyphs[0], GlyphData::empty());

        assert_eq!(glyphs[1].number_of_contours, 2);
        assert_eq!(glyphs[1].bbox, [0, -2000, 600, 700]);
        match &glyphs[1].outline {
            Outline::Simple(points) => {
                assert_eq!(points.len(), 6);
                assert_eq!(points[1], Point::new(false, false, 300.0, 700.0));
                assert!(points[2].end_contour);
                assert_eq!(points[5], Point::new(true, true, 300.0, -2000.0));
            }
            other => panic!("unexpected outline {:?}", other),
        }

        assert_eq!(glyphs[2].bbox, [10, -20, 900, 1000]);
        match &glyphs[2].outline {
            Outline::Composite(components) => {
                assert_eq!(components.len(), 1);
                assert_eq!((components[0].dx, components[0].dy), (50.0, -50.0));
            }
            other => panic!("unexpected outline {:?}", other),
        }
    }

    #[test]
    fn test_truncated_substream() {
        let mut data = transform_glyf(&[TransformedGlyph::Simple(vec![Contour(vec![
            (true, 0, 0),
            (true, 10, 10),
        ])])]);
        // drop the bbox bitmap
        data.truncate(data.len() - 4);
        let mut stream = DecodeStream::new(data);
        assert!(reconstruct_glyf(&mut stream).is_err());
    }
}
