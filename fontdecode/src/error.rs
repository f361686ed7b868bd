use std::io;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("Unknown font format")]
    UnknownFormat,
    #[error("Unexpected end of data: cannot read {len} bytes at offset {pos} (buffer length {total})")]
    UnexpectedEof { pos: usize, len: usize, total: usize },
    #[error("Unknown version {0}")]
    UnknownVersion(i64),
    #[error("Not a fixed size")]
    NotFixedSize,
    #[error("Missing field `{0}`")]
    MissingField(String),
    #[error("Field `{field}` is not of type {expected}")]
    TypeMismatch {
        field: String,
        expected: &'static str,
    },
    #[error("Invalid font data: {0}")]
    InvalidData(String),
    #[error("Error decoding compressed data in WOFF2")]
    Decompression,
    #[error("Error inflating WOFF table `{tag}`")]
    Inflate {
        tag: String,
        #[source]
        source: io::Error,
    },
    #[error("Could not find a supported cmap table")]
    NoSupportedCmap,
    #[error("cmap format {0} is not implemented")]
    Unimplemented(i64),
    #[error("Unknown cmap format {0}")]
    UnknownCmapFormat(i64),
    #[error("Font `{0}` not found")]
    FontNotFound(String),
    #[error("Required table `{0}` is missing or could not be decoded")]
    MissingTable(&'static str),
}

impl Error {
    pub(crate) fn missing(field: &str) -> Self {
        Error::MissingField(field.to_string())
    }

    pub(crate) fn mismatch(field: &str, expected: &'static str) -> Self {
        Error::TypeMismatch {
            field: field.to_string(),
            expected,
        }
    }

    pub(crate) fn invalid(msg: impl Into<String>) -> Self {
        Error::InvalidData(msg.into())
    }
}
