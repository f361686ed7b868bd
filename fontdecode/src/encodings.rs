/// Text encodings used by strings stored inside font tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Encoding {
    Ascii,
    Latin1,
    Utf8,
    Utf16Be,
    Utf16Le,
    MacRoman,
}

impl Encoding {
    /// Number of bytes per code unit, used to align NUL terminator scanning.
    pub fn width(self) -> usize {
        match self {
            Encoding::Utf16Be | Encoding::Utf16Le => 2,
            _ => 1,
        }
    }

    pub fn decode(self, bytes: &[u8]) -> String {
        match self {
            Encoding::Ascii | Encoding::Latin1 => bytes.iter().map(|&b| b as char).collect(),
            Encoding::Utf8 => String::from_utf8_lossy(bytes).into_owned(),
            Encoding::Utf16Be | Encoding::Utf16Le => {
                let units = bytes.chunks_exact(2).map(|pair| match self {
                    Encoding::Utf16Be => u16::from_be_bytes([pair[0], pair[1]]),
                    _ => u16::from_le_bytes([pair[0], pair[1]]),
                });
                std::char::decode_utf16(units)
                    .map(|c| c.unwrap_or(std::char::REPLACEMENT_CHARACTER))
                    .collect()
            }
            Encoding::MacRoman => bytes.iter().map(|&b| mac_roman_char(b)).collect(),
        }
    }

    /// Maps a Unicode code point to its single byte code in this encoding. Only meaningful for
    /// the legacy one-byte encodings.
    pub fn encode_code_point(self, code_point: u32) -> Option<u32> {
        match self {
            Encoding::MacRoman => {
                if code_point < 0x80 {
                    return Some(code_point);
                }
                MAC_ROMAN_HIGH
                    .iter()
                    .position(|&c| u32::from(c) == code_point)
                    .map(|i| i as u32 + 0x80)
            }
            Encoding::Latin1 if code_point < 0x100 => Some(code_point),
            Encoding::Ascii if code_point < 0x80 => Some(code_point),
            _ => None,
        }
    }
}

/// Encoding of `name` table strings by platform and encoding id.
pub(crate) fn name_encoding(platform_id: i64, encoding_id: i64) -> Encoding {
    match (platform_id, encoding_id) {
        (0, _) | (3, _) => Encoding::Utf16Be,
        (1, 0) => Encoding::MacRoman,
        _ => Encoding::Ascii,
    }
}

/// Single byte encoding of a legacy cmap subtable, if it has one that can be mapped to Unicode.
pub(crate) fn legacy_cmap_encoding(platform_id: i64, encoding_id: i64) -> Option<Encoding> {
    match (platform_id, encoding_id) {
        (1, 0) => Some(Encoding::MacRoman),
        _ => None,
    }
}

fn mac_roman_char(b: u8) -> char {
    if b < 0x80 {
        b as char
    } else {
        MAC_ROMAN_HIGH[usize::from(b - 0x80)]
    }
}

/// Mac OS Roman code points 0x80..=0xFF.
const MAC_ROMAN_HIGH: [char; 128] = [
    'Ä', 'Å', 'Ç', 'É', 'Ñ', 'Ö', 'Ü', 'á', 'à', 'â', 'ä', 'ã', 'å', 'ç', 'é', 'è', //
    'ê', 'ë', 'í', 'ì', 'î', 'ï', 'ñ', 'ó', 'ò', 'ô', 'ö', 'õ', 'ú', 'ù', 'û', 'ü', //
    '†', '°', '¢', '£', '§', '•', '¶', 'ß', '®', '©', '™', '´', '¨', '≠', 'Æ', 'Ø', //
    '∞', '±', '≤', '≥', '¥', 'µ', '∂', '∑', '∏', 'π', '∫', 'ª', 'º', 'Ω', 'æ', 'ø', //
    '¿', '¡', '¬', '√', 'ƒ', '≈', '∆', '«', '»', '…', '\u{a0}', 'À', 'Ã', 'Õ', 'Œ', 'œ', //
    '–', '—', '“', '”', '‘', '’', '÷', '◊', 'ÿ', 'Ÿ', '⁄', '€', '‹', '›', 'ﬁ', 'ﬂ', //
    '‡', '·', '‚', '„', '‰', 'Â', 'Ê', 'Á', 'Ë', 'È', 'Í', 'Î', 'Ï', 'Ì', 'Ó', 'Ô', //
    '\u{f8ff}', 'Ò', 'Ú', 'Û', 'Ù', 'ı', 'ˆ', '˜', '¯', '˘', '˙', '˚', '¸', '˝', '˛', 'ˇ',
];

#[cfg(test)]
mod test {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_decode_utf16be() {
        let bytes = [0x00, 0x41, 0x20, 0xac, 0xd8, 0x3d, 0xde, 0x00];
        assert_eq!(Encoding::Utf16Be.decode(&bytes), "A€😀");
    }

    #[test]
    fn test_decode_mac_roman() {
        assert_eq!(Encoding::MacRoman.decode(&[0x41, 0x80, 0xdb, 0xa5]), "AÄ€•");
    }

    #[test]
    fn test_encode_mac_roman() {
        assert_eq!(Encoding::MacRoman.encode_code_point(0x41), Some(0x41));
        assert_eq!(Encoding::MacRoman.encode_code_point(0x20ac), Some(0xdb));
        assert_eq!(Encoding::MacRoman.encode_code_point(0xc4), Some(0x80));
        assert_eq!(Encoding::MacRoman.encode_code_point(0x4e00), None);
    }

    #[test]
    fn test_name_encoding() {
        assert_eq!(name_encoding(3, 1), Encoding::Utf16Be);
        assert_eq!(name_encoding(1, 0), Encoding::MacRoman);
        assert_eq!(name_encoding(2, 0), Encoding::Ascii);
    }
}
