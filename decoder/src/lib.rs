//! ASTERIX CAT021/CAT048 binary decoder.
//!
//! Takes raw `.ast` byte streams (concatenated CAT/LEN/payload blocks),
//! decodes the FSPEC-selected data items of categories 021 (ADS-B) and
//! 048 (monoradar, including the Mode S BDS 4.0/5.0/6.0 registers) and
//! assembles unified tabular records, deriving geographic position from
//! radar geometry and QNH-corrected altitudes on the way.
//!
//! The decoder is pure and synchronous: it reads no files, no clock and
//! no network.  Callers wanting parallelism can split the input on
//! block boundaries with [`block::partition`] and run one
//! [`DecodePipeline`] per slice.
//!

pub mod assemble;
pub mod bds;
pub mod bits;
pub mod block;
pub mod cat021;
pub mod cat048;
pub mod error;
pub mod fspec;
pub mod geo;
pub mod item;
pub mod pipeline;
pub mod qnh;

pub use block::{Block, BlockReader};
pub use error::{DecodeError, Diagnostic};
pub use pipeline::{decode_stream, DecodeEvent, DecodeOptions, DecodeOutput, DecodePipeline};

const NAME: &str = env!("CARGO_PKG_NAME");
const VERSION: &str = env!("CARGO_PKG_VERSION");

pub fn version() -> String {
    format!("{}/{}", NAME, VERSION)
}
