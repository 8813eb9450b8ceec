use std::sync::Arc;

use tracing::{debug, trace};

use super::{scramble_byte, Failure, Outcome, Packet, SizeClass, CRC};
use crate::rs::{RSState, ReedSolomon};

/// Decoder session state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    /// Waiting for the first size tag byte.
    SizeTag,
    SizeTag2,
    SizeTag3,
    /// A size tag matched and codeword bytes of this class are being collected.
    SizeKnown(&'static SizeClass),
}

/// Byte-at-a-time packet decoder.
///
/// Bytes are expected to start with the size tag, i.e., the caller has already found the
/// sync word. Each call to [Decoder::step] consumes one byte and returns
/// [Outcome::NotReady] until a complete codeword has been collected. The session resets
/// itself after every completed codeword.
///
/// A session is cheap to create with [super::Codec::decoder] and holds no shared mutable
/// state, so independent sessions can run on separate threads.
#[derive(Debug, Clone)]
pub struct Decoder {
    rs: Arc<Vec<ReedSolomon>>,
    state: State,
    tag: u32,
    buf: Vec<u8>,
}

impl Decoder {
    pub(crate) fn new(rs: Arc<Vec<ReedSolomon>>) -> Self {
        Decoder {
            rs,
            state: State::SizeTag,
            tag: 0,
            buf: Vec::new(),
        }
    }

    #[must_use]
    pub fn state(&self) -> State {
        self.state
    }

    /// Size class of the codeword currently being collected, if any.
    #[must_use]
    pub fn size_class(&self) -> Option<&'static SizeClass> {
        match self.state {
            State::SizeKnown(class) => Some(class),
            _ => None,
        }
    }

    /// Discard any partial codeword and wait for a new size tag.
    pub fn reset(&mut self) {
        self.state = State::SizeTag;
        self.tag = 0;
        self.buf.clear();
    }

    /// Consume a single byte.
    pub fn step(&mut self, byte: u8) -> Outcome {
        match self.state {
            State::SizeTag => {
                self.tag = u32::from(byte);
                self.state = State::SizeTag2;
            }
            State::SizeTag2 => {
                self.tag = (self.tag << 8) | u32::from(byte);
                self.state = State::SizeTag3;
            }
            State::SizeTag3 => {
                self.tag = ((self.tag << 8) | u32::from(byte)) & 0x00ff_ffff;
                match SizeClass::from_tag(self.tag) {
                    Some(class) => {
                        trace!(tag = self.tag, size_class = class.index, "size tag lock");
                        self.buf.clear();
                        self.buf.reserve(class.codeword_len());
                        self.state = State::SizeKnown(class);
                    }
                    None => {
                        trace!(tag = self.tag, "size tag miss");
                        self.reset();
                    }
                }
            }
            State::SizeKnown(class) => {
                self.buf.push(scramble_byte(self.buf.len(), byte));
                if self.buf.len() == class.codeword_len() {
                    let outcome = self.finish(class);
                    self.reset();
                    return outcome;
                }
            }
        }
        Outcome::NotReady
    }

    /// Correct and verify the collected codeword.
    fn finish(&self, class: &SizeClass) -> Outcome {
        let size_class = class.index;
        let block = match self.rs[size_class].decode(&self.buf, &[]) {
            Ok(block) => block,
            Err(err) => {
                debug!(size_class, "codeword decode failed: {err}");
                return Outcome::Failed(Failure::Uncorrectable { size_class });
            }
        };
        let error_positions = match block.state {
            RSState::Ok => Vec::new(),
            RSState::Corrected(positions) => positions,
            RSState::Uncorrectable(reason) => {
                debug!(size_class, "uncorrectable codeword: {reason}");
                return Outcome::Failed(Failure::Uncorrectable { size_class });
            }
        };
        let corrected = error_positions.len();
        let data = block.data;

        let header = data[0];
        let len = match class.capacity.checked_sub(usize::from(header & 0x1f)) {
            Some(len) if len > 0 => len,
            _ => {
                debug!(size_class, header, "invalid header length");
                return Outcome::Failed(Failure::Crc {
                    size_class,
                    corrected,
                });
            }
        };
        let expected = u16::from_be_bytes([data[len + 1], data[len + 2]]);
        let crc = CRC.checksum(&data[..=len]);
        if crc != expected {
            debug!(size_class, corrected, "crc mismatch {crc:#06x} != {expected:#06x}");
            return Outcome::Failed(Failure::Crc {
                size_class,
                corrected,
            });
        }

        debug!(size_class, len, corrected, "decoded packet");
        Outcome::Decoded(Packet {
            payload: data[1..=len].to_vec(),
            flags: header >> 5,
            size_class,
            corrected,
            error_positions,
        })
    }
}
