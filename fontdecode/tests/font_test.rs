use std::cell::Cell;
use std::rc::Rc;

use fontdecode::{
    create, AnyFont, Decompressor, DefaultDecompressor, Error, Flavor, Font, OpenOptions, Point,
};
use fontdecode_test_data::{sample, sfnt, ttc};
use pretty_assertions::assert_eq;

fn init() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn open(data: Vec<u8>) -> Font {
    init();
    create(data, None).unwrap().into_font().unwrap()
}

fn coordinates(contours: &[Vec<Point>]) -> Vec<Vec<(bool, f64, f64)>> {
    contours
        .iter()
        .map(|contour| contour.iter().map(|p| (p.on_curve, p.x, p.y)).collect())
        .collect()
}

/// Brotli decompression that counts its invocations.
#[derive(Clone, Default)]
struct Counting {
    brotli: Rc<Cell<usize>>,
}

impl Decompressor for Counting {
    fn decompress_brotli(&self, data: &[u8], length: usize) -> fontdecode::Result<Vec<u8>> {
        self.brotli.set(self.brotli.get() + 1);
        DefaultDecompressor.decompress_brotli(data, length)
    }

    fn inflate(&self, tag: &str, data: &[u8], length: usize) -> fontdecode::Result<Vec<u8>> {
        DefaultDecompressor.inflate(tag, data, length)
    }
}

fn assert_sample(font: &Font) {
    assert_eq!(font.postscript_name().as_deref(), Some("Sample-Regular"));
    assert_eq!(font.full_name().as_deref(), Some("Sample Regular"));
    assert_eq!(font.family_name().as_deref(), Some("Sample"));
    assert_eq!(font.subfamily_name().as_deref(), Some("Regular"));
    assert_eq!(font.copyright().as_deref(), Some("© Test Foundry"));
    assert_eq!(font.version().as_deref(), Some("Version 1.000"));

    assert_eq!(font.units_per_em().unwrap(), sample::UNITS_PER_EM);
    assert_eq!(font.ascent().unwrap(), 800);
    assert_eq!(font.descent().unwrap(), -200);
    assert_eq!(font.line_gap().unwrap(), 90);
    assert_eq!(font.cap_height().unwrap(), 700);
    assert_eq!(font.x_height(), 500);
    assert_eq!(font.num_glyphs().unwrap(), sample::NUM_GLYPHS);
    assert_eq!(font.bbox().unwrap(), [0, -10, 650, 700]);

    let glyph = font.glyph_for_code_point('A' as u32).unwrap().unwrap();
    assert_eq!(glyph.id(), sample::A);
    assert_eq!(glyph.code_points(), &['A' as u32]);
    assert_eq!(glyph.advance_width(), sample::ADVANCE);
    assert_eq!(glyph.name(), Some("A"));
    assert_eq!(glyph.bbox(), [0, 0, 600, 700]);
    assert_eq!(
        coordinates(glyph.contours()),
        vec![
            vec![(true, 0.0, 0.0), (true, 300.0, 700.0), (true, 600.0, 0.0)],
            vec![(true, 200.0, 200.0), (false, 300.0, 300.0), (true, 400.0, 200.0)],
        ]
    );
}

#[test]
fn test_sfnt() {
    let font = open(sample::font("Sample-Regular").build());
    assert_eq!(font.flavor(), Flavor::Sfnt);
    assert_sample(&font);
}

#[test]
fn test_woff() {
    let font = open(sample::font("Sample-Regular").build_woff());
    assert_eq!(font.flavor(), Flavor::Woff);
    assert_eq!(font.directory().tag(), "wOFF");
    assert_sample(&font);
}

#[test]
fn test_woff2() {
    init();
    let counting = Counting::default();
    let font = OpenOptions::new()
        .decompressor(counting.clone())
        .open(sample::transformed_font("Sample-Regular").build_woff2())
        .unwrap()
        .into_font()
        .unwrap();
    assert_eq!(font.flavor(), Flavor::Woff2);
    assert!(!font.is_decompressed());
    assert_eq!(counting.brotli.get(), 0);

    assert_sample(&font);
    assert!(font.is_decompressed());
    assert_eq!(counting.brotli.get(), 1);
    assert!(font.table("loca").is_none());
}

#[test]
fn test_woff2_glyphs_match_sfnt() {
    let sfnt = open(sample::font("Sample-Regular").build());
    let woff2 = open(sample::transformed_font("Sample-Regular").build_woff2());
    for id in [0, 3, sample::A, sample::EURO].iter().copied() {
        let expected = sfnt.glyph(id).unwrap().unwrap();
        let glyph = woff2.glyph(id).unwrap().unwrap();
        assert_eq!(glyph.contours(), expected.contours(), "glyph {}", id);
        assert_eq!(glyph.bbox(), expected.bbox(), "glyph {}", id);
        assert_eq!(glyph.path(), expected.path(), "glyph {}", id);
    }
}

#[test]
fn test_composite_glyph() {
    let font = open(sample::font("Sample-Regular").build());
    let euro = font.glyph_for_code_point(0x20ac).unwrap().unwrap();
    assert_eq!(euro.id(), sample::EURO);
    assert!(euro.is_composite());
    assert_eq!(euro.name(), Some("Euro"));
    assert_eq!(
        coordinates(euro.contours()),
        vec![
            vec![(true, 50.0, -10.0), (true, 350.0, 690.0), (true, 650.0, -10.0)],
            vec![(true, 250.0, 190.0), (false, 350.0, 290.0), (true, 450.0, 190.0)],
        ]
    );
}

#[test]
fn test_cmap() {
    let font = open(sample::font("Sample-Regular").build());
    assert!(font.has_glyph_for_code_point('A' as u32).unwrap());
    assert!(font.has_glyph_for_code_point(8364).unwrap());
    assert!(!font.has_glyph_for_code_point(123_456).unwrap());

    let notdef = font.glyph_for_code_point(123_456).unwrap().unwrap();
    assert_eq!(notdef.id(), 0);
    assert_eq!(notdef.advance_width(), sample::NOTDEF_ADVANCE);
    assert!(notdef.contours().is_empty());

    let set = font.character_set().unwrap();
    assert_eq!(set.len(), 95 + 2);
    assert_eq!(set.first(), Some(&0x20));
    assert!(set.contains(&0x20ac));

    let ids: Vec<_> = font
        .glyphs_for_string("AB €")
        .unwrap()
        .iter()
        .map(|glyph| glyph.id())
        .collect();
    assert_eq!(ids, vec![sample::A, sample::A + 1, 3, sample::EURO]);
}

#[test]
fn test_glyph_out_of_range() {
    let font = open(sample::font("Sample-Regular").build());
    assert!(font.glyph(sample::NUM_GLYPHS).unwrap().is_none());
    let glyph = font.glyph(sample::NUM_GLYPHS - 1).unwrap().unwrap();
    assert!(glyph.code_points().is_empty());
}

#[test]
fn test_broken_table_reads_as_absent() {
    let mut data = sample::font("Sample-Regular").build();
    sfnt::corrupt_table_offset(&mut data, b"post", 0x00ff_ffff);
    let font = open(data);

    assert!(font.table("post").is_none());
    assert!(font.is_table_decoded("post"));
    assert_eq!(font.underline_position(), None);
    assert_eq!(font.italic_angle(), None);

    assert_eq!(font.units_per_em().unwrap(), sample::UNITS_PER_EM);
    let glyph = font.glyph_for_code_point('A' as u32).unwrap().unwrap();
    assert_eq!(glyph.name(), None);
    assert_eq!(glyph.advance_width(), sample::ADVANCE);
}

#[test]
fn test_missing_required_table() {
    let mut data = sample::font("Sample-Regular").build();
    sfnt::corrupt_table_offset(&mut data, b"cmap", 0x00ff_ffff);
    let font = open(data);
    assert!(matches!(
        font.has_glyph_for_code_point(0x41),
        Err(Error::MissingTable("cmap"))
    ));
}

#[test]
fn test_unknown_format() {
    init();
    assert!(matches!(
        create(b"%PDF-1.7".to_vec(), None),
        Err(Error::UnknownFormat)
    ));
    assert!(matches!(create(Vec::new(), None), Err(Error::UnknownFormat)));
}

#[test]
fn test_collection() {
    init();
    let data = ttc::collection(&[
        sample::font("Sample-Regular"),
        sample::font("Sample-Bold"),
    ]);

    let collection = match create(data.clone(), None).unwrap() {
        AnyFont::Collection(collection) => collection,
        AnyFont::Single(_) => panic!("expected a collection"),
    };
    let fonts = collection.fonts().unwrap();
    assert_eq!(fonts.len(), 2);
    assert_sample(&fonts[0]);
    assert_eq!(fonts[1].postscript_name().as_deref(), Some("Sample-Bold"));

    let bold = create(data.clone(), Some("Sample-Bold"))
        .unwrap()
        .into_font()
        .unwrap();
    assert_eq!(bold.full_name().as_deref(), Some("Sample Bold"));
    assert_eq!(bold.glyph_for_code_point('A' as u32).unwrap().unwrap().id(), sample::A);

    match create(data, Some("Sample-Light")) {
        Err(Error::FontNotFound(name)) => assert_eq!(name, "Sample-Light"),
        other => panic!("unexpected result {:?}", other),
    }
}

#[test]
fn test_postscript_name_of_single_font() {
    init();
    let data = sample::font("Sample-Regular").build();
    assert!(create(data.clone(), Some("Sample-Regular")).is_ok());
    assert!(matches!(
        create(data, Some("Sample-Bold")),
        Err(Error::FontNotFound(_))
    ));
}
