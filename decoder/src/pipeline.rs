//! The decode pipeline: blocks in, unified records and diagnostics out.
//!
//! Framing errors stop the stream (there is nothing to resynchronise
//! on), an unsupported category skips its whole block, and an error
//! inside a record abandons the rest of that block since record
//! boundaries are only known mid-decode.  Running out of payload is
//! special: whatever was decoded up to that point is still emitted,
//! together with the diagnostic.
//!

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use eyre::{eyre, Result};
use serde::Deserialize;
use tracing::{debug, trace};

use radex_common::RadarSite;
use radex_formats::UnifiedRecord;

use crate::assemble::RecordAssembler;
use crate::bits::BitCursor;
use crate::block::{Block, BlockReader};
use crate::cat021::{self, Cat021Fields, CAT021};
use crate::cat048::{self, Cat048Fields, CAT048};
use crate::error::{DecodeError, Diagnostic};
use crate::fspec;
use crate::qnh::DEFAULT_TRANSITION_ALT_FT;

/// Decode-run configuration.
///
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct DecodeOptions {
    /// Radar position, required for CAT048 geographic derivation
    pub radar_site: Option<RadarSite>,
    /// Local QNH in hPa; overrides per-aircraft pressure settings
    pub qnh: Option<f64>,
    /// Transition altitude in feet
    pub transition_altitude_ft: f64,
    /// Abort on the first failure instead of reporting diagnostics
    pub strict: bool,
}

impl Default for DecodeOptions {
    fn default() -> Self {
        DecodeOptions {
            radar_site: None,
            qnh: None,
            transition_altitude_ft: DEFAULT_TRANSITION_ALT_FT,
            strict: false,
        }
    }
}

/// What a decode yields, in input order.
///
#[derive(Clone, Debug)]
pub enum DecodeEvent {
    Record(UnifiedRecord),
    Diagnostic(Diagnostic),
}

/// Everything a finished decode produced.
///
#[derive(Clone, Debug, Default)]
pub struct DecodeOutput {
    pub records: Vec<UnifiedRecord>,
    pub diagnostics: Vec<Diagnostic>,
}

/// Lazy block-by-block decoder.
///
/// Pull events out of it like any iterator; blocks are only framed and
/// decoded as the previous ones are consumed.
///
pub struct DecodePipeline<'a> {
    reader: BlockReader<'a>,
    assembler: RecordAssembler,
    cancel: Option<Arc<AtomicBool>>,
    queue: VecDeque<DecodeEvent>,
}

impl<'a> DecodePipeline<'a> {
    pub fn new(data: &'a [u8], options: &DecodeOptions) -> Self {
        DecodePipeline {
            reader: BlockReader::new(data),
            assembler: RecordAssembler::new(options),
            cancel: None,
            queue: VecDeque::new(),
        }
    }

    /// Attach a cooperative cancellation flag, polled between blocks.
    ///
    pub fn with_cancel(mut self, flag: Arc<AtomicBool>) -> Self {
        self.cancel = Some(flag);
        self
    }

    fn push_diagnostic(&mut self, error: DecodeError, offset: usize, category: Option<u8>) {
        let mut diag = Diagnostic::new(error, offset);
        if let Some(cat) = category {
            diag = diag.with_category(cat);
        }
        trace!("{}", diag);
        self.queue.push_back(DecodeEvent::Diagnostic(diag));
    }

    fn decode_block(&mut self, block: Block) {
        match block.category {
            CAT021 => self.decode_cat021_block(block),
            CAT048 => self.decode_cat048_block(block),
            other => {
                self.push_diagnostic(
                    DecodeError::UnsupportedCategory {
                        category: other,
                        offset: block.offset,
                    },
                    block.offset,
                    Some(other),
                );
            }
        }
    }

    fn decode_cat048_block(&mut self, block: Block) {
        let mut cur = BitCursor::new(block.payload);

        while cur.remaining() >= 8 {
            let rec_offset = block.offset + 3 + cur.byte_pos();
            let frns = match fspec::parse(&mut cur, cat048::MAX_FRN) {
                Ok(fspec) => fspec.frns,
                Err(e) => {
                    self.push_diagnostic(e, rec_offset, Some(CAT048));
                    return;
                }
            };

            let mut fields = Cat048Fields::default();
            let mut faults = Vec::new();
            match cat048::decode_record(&mut cur, &frns, &mut fields, &mut faults) {
                Ok(()) => {
                    let rec = self.assembler.assemble_cat048(&fields, &mut faults);
                    for fault in faults {
                        self.push_diagnostic(fault, rec_offset, Some(CAT048));
                    }
                    self.queue.push_back(DecodeEvent::Record(rec));
                }
                Err(e) => {
                    let out_of_payload = matches!(e, DecodeError::Truncated { .. });
                    self.push_diagnostic(e, rec_offset, Some(CAT048));

                    // A record cut off by the end of the payload keeps
                    // its decoded prefix; anything else is dropped.
                    if out_of_payload && fields.sac.is_some() {
                        let mut faults = Vec::new();
                        let rec = self.assembler.assemble_cat048(&fields, &mut faults);
                        for fault in faults {
                            self.push_diagnostic(fault, rec_offset, Some(CAT048));
                        }
                        self.queue.push_back(DecodeEvent::Record(rec));
                    }
                    return;
                }
            }
        }
    }

    fn decode_cat021_block(&mut self, block: Block) {
        let mut cur = BitCursor::new(block.payload);

        while cur.remaining() >= 8 {
            let rec_offset = block.offset + 3 + cur.byte_pos();
            let frns = match fspec::parse(&mut cur, cat021::MAX_FRN) {
                Ok(fspec) => fspec.frns,
                Err(e) => {
                    self.push_diagnostic(e, rec_offset, Some(CAT021));
                    return;
                }
            };

            let mut fields = Cat021Fields::default();
            match cat021::decode_record(&mut cur, &frns, &mut fields) {
                Ok(()) => {
                    let rec = self.assembler.assemble_cat021(&fields);
                    self.queue.push_back(DecodeEvent::Record(rec));
                }
                Err(e) => {
                    let out_of_payload = matches!(e, DecodeError::Truncated { .. });
                    self.push_diagnostic(e, rec_offset, Some(CAT021));

                    if out_of_payload && fields.sac.is_some() {
                        let rec = self.assembler.assemble_cat021(&fields);
                        self.queue.push_back(DecodeEvent::Record(rec));
                    }
                    return;
                }
            }
        }
    }
}

impl Iterator for DecodePipeline<'_> {
    type Item = DecodeEvent;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(event) = self.queue.pop_front() {
                return Some(event);
            }
            if let Some(flag) = &self.cancel {
                if flag.load(Ordering::Relaxed) {
                    debug!("decode cancelled");
                    return None;
                }
            }
            match self.reader.next_block() {
                None => return None,
                Some(Ok(block)) => self.decode_block(block),
                Some(Err(e)) => {
                    let offset = match &e {
                        DecodeError::ShortBlock { offset, .. }
                        | DecodeError::BadLength { offset, .. } => *offset,
                        _ => self.reader.position(),
                    };
                    self.push_diagnostic(e, offset, None);
                }
            }
        }
    }
}

/// Primary entry point: decode a whole input slice.
///
/// In strict mode the first failure aborts the decode; otherwise every
/// failure becomes a diagnostic and decoding carries on at the next
/// safe point.
///
#[tracing::instrument(skip(data, options))]
pub fn decode_stream(data: &[u8], options: &DecodeOptions) -> Result<DecodeOutput> {
    let mut out = DecodeOutput::default();

    for event in DecodePipeline::new(data, options) {
        match event {
            DecodeEvent::Record(rec) => out.records.push(rec),
            DecodeEvent::Diagnostic(diag) => {
                if options.strict {
                    return Err(eyre!("decode failed: {}", diag));
                }
                out.diagnostics.push(diag);
            }
        }
    }

    debug!(
        "decoded {} records, {} diagnostics",
        out.records.len(),
        out.diagnostics.len()
    );
    Ok(out)
}
