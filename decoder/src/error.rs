//! Decode error taxonomy and the diagnostics attached to a decode run.
//!

use std::fmt::{Display, Formatter};

use thiserror::Error;

/// Everything that can go wrong while decoding, allow us to
/// differentiate between framing, FSPEC, item and derivation failures.
///
#[derive(Clone, Debug, Error, PartialEq)]
pub enum DecodeError {
    #[error("block at offset {offset} declares {declared} bytes, only {available} left")]
    ShortBlock {
        offset: usize,
        declared: usize,
        available: usize,
    },
    #[error("block at offset {offset} has length {len}, minimum is 3")]
    BadLength { offset: usize, len: usize },
    #[error("unsupported category {category} at offset {offset}")]
    UnsupportedCategory { category: u8, offset: usize },
    #[error("FSPEC chains past {max_octets} octets")]
    FspecUnterminated { max_octets: usize },
    #[error("FSPEC selects no items")]
    FspecEmpty,
    #[error("no codec for FRN {frn} in category {category}")]
    UnknownFrn { category: u8, frn: u8 },
    #[error("needed {needed} more bits, {available} left")]
    Truncated { needed: usize, available: usize },
    #[error("{field} out of range: {value}")]
    ItemOutOfRange { field: &'static str, value: f64 },
    #[error("BDS {register} {field} out of range: {value}")]
    BdsFieldOutOfRange {
        register: &'static str,
        field: &'static str,
        value: f64,
    },
    #[error("geodetic inversion still moving after {0} iterations")]
    CoordConvergence(usize),
}

impl DecodeError {
    /// Stable machine-readable tag, one per error kind.
    ///
    pub fn kind(&self) -> &'static str {
        match self {
            DecodeError::ShortBlock { .. } => "SHORT_BLOCK",
            DecodeError::BadLength { .. } => "BAD_LENGTH",
            DecodeError::UnsupportedCategory { .. } => "UNSUPPORTED_CATEGORY",
            DecodeError::FspecUnterminated { .. } => "FSPEC_UNTERMINATED",
            DecodeError::FspecEmpty => "FSPEC_EMPTY",
            DecodeError::UnknownFrn { .. } => "UNKNOWN_FRN",
            DecodeError::Truncated { .. } => "TRUNCATED",
            DecodeError::ItemOutOfRange { .. } => "ITEM_OUT_OF_RANGE",
            DecodeError::BdsFieldOutOfRange { .. } => "BDS_FIELD_OUT_OF_RANGE",
            DecodeError::CoordConvergence(_) => "COORD_CONVERGENCE",
        }
    }
}

/// A non-fatal decode failure, located in the input stream.
///
#[derive(Clone, Debug, PartialEq)]
pub struct Diagnostic {
    /// What failed
    pub error: DecodeError,
    /// Byte offset into the input
    pub offset: usize,
    /// Category, when known
    pub category: Option<u8>,
    /// FRN being decoded, when known
    pub frn: Option<u8>,
}

impl Diagnostic {
    pub fn new(error: DecodeError, offset: usize) -> Self {
        Diagnostic {
            error,
            offset,
            category: None,
            frn: None,
        }
    }

    pub fn with_category(mut self, category: u8) -> Self {
        self.category = Some(category);
        self
    }

    pub fn with_frn(mut self, frn: u8) -> Self {
        self.frn = Some(frn);
        self
    }
}

impl Display for Diagnostic {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} at byte {}", self.error.kind(), self.offset)?;
        if let Some(cat) = self.category {
            write!(f, " (cat {})", cat)?;
        }
        if let Some(frn) = self.frn {
            write!(f, " (FRN {})", frn)?;
        }
        write!(f, ": {}", self.error)
    }
}
