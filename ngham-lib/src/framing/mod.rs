//! NGHam packet encoding and decoding.
//!
//! A packet on the wire consists of a preamble and sync word, a 24-bit size tag, and a
//! scrambled Reed-Solomon codeword. The codeword data holds a header byte, the payload, a
//! CRC-16 and zero padding up to the size of the selected [SizeClass].
//!
//! ```text
//! [preamble][sync][size tag 3B][header 1B][payload][crc 2B][zero pad][parity 16|32B]
//!                              |<------------------- scrambled -------------------->|
//! ```
mod decoder;
pub mod pipeline;
mod pn;
mod sizes;

pub use decoder::*;
pub use pn::*;
pub use sizes::*;

use std::sync::Arc;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::rs::{Params, ReedSolomon};
use crate::{Error, Result};

/// CRC-16/X-25 used over the header and payload.
pub(crate) const CRC: crc::Crc<u16> = crc::Crc::<u16>::new(&crc::CRC_16_IBM_SDLC);

/// Largest value that fits in the 3 header flag bits.
pub const MAX_FLAGS: u8 = 0x7;

/// Modulation used for the preamble and sync word; the codeword itself is identical.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Mode {
    #[default]
    TwoLevel,
    FourLevel,
}

impl Mode {
    #[must_use]
    pub fn preamble(&self) -> &'static [u8] {
        match self {
            Mode::TwoLevel => &[0xaa; 4],
            Mode::FourLevel => &[0xdd; 8],
        }
    }

    #[must_use]
    pub fn sync_word(&self) -> &'static [u8] {
        match self {
            Mode::TwoLevel => &[0x5d, 0xe6, 0x2a, 0x7e],
            Mode::FourLevel => &[0x77, 0xf7, 0xfd, 0x7d, 0x5d, 0xdd, 0x7f, 0xfd],
        }
    }

    /// Total length of the preamble and sync word.
    #[must_use]
    pub fn prefix_len(&self) -> usize {
        self.preamble().len() + self.sync_word().len()
    }
}

/// A successfully decoded packet.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Packet {
    #[cfg_attr(feature = "serde", serde(with = "serde_bytes"))]
    pub payload: Vec<u8>,
    /// The 3 flag bits from the header.
    pub flags: u8,
    /// Index of the [SizeClass] the packet was sent with.
    pub size_class: usize,
    /// Number of codeword bytes corrected by Reed-Solomon.
    pub corrected: usize,
    /// Offsets of the corrected bytes from the start of the protected region.
    pub error_positions: Vec<usize>,
}

/// Reason a located codeword could not be decoded.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Failure {
    /// The codeword had more errors than Reed-Solomon could correct.
    Uncorrectable { size_class: usize },
    /// Reed-Solomon succeeded but the header length or CRC was not valid.
    Crc { size_class: usize, corrected: usize },
}

/// Result of feeding data to a [Decoder].
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Outcome {
    /// More bytes are needed.
    NotReady,
    Decoded(Packet),
    Failed(Failure),
}

impl Outcome {
    /// Number of corrected bytes, `0` if not ready, or `-1` if decoding failed.
    #[must_use]
    pub fn corrections(&self) -> i32 {
        match self {
            Outcome::NotReady => 0,
            Outcome::Decoded(packet) => i32::try_from(packet.corrected).unwrap_or(i32::MAX),
            Outcome::Failed(_) => -1,
        }
    }

    #[must_use]
    pub fn is_ready(&self) -> bool {
        !matches!(self, Outcome::NotReady)
    }

    /// The decoded packet, if any.
    #[must_use]
    pub fn packet(self) -> Option<Packet> {
        match self {
            Outcome::Decoded(packet) => Some(packet),
            _ => None,
        }
    }
}

/// Packet codec holding the Reed-Solomon codecs for every [SizeClass].
///
/// The codecs are built once and shared, so cloning a `Codec` or creating a [Decoder]
/// from it is cheap.
///
/// # Example
/// ```
/// use ngham::framing::{Codec, Mode};
///
/// let codec = Codec::new().unwrap().with_mode(Mode::FourLevel);
/// let packet = codec.encode(b"hello", 0).unwrap();
/// let decoded = codec.decode(&packet).packet().unwrap();
/// assert_eq!(decoded.payload, b"hello");
/// ```
#[derive(Clone, Debug)]
pub struct Codec {
    mode: Mode,
    rs: Arc<Vec<ReedSolomon>>,
}

impl Codec {
    /// Create a codec using [Mode::TwoLevel].
    ///
    /// # Errors
    /// If a Reed-Solomon codec cannot be constructed for a size class.
    pub fn new() -> Result<Self> {
        let rs = SIZE_CLASSES
            .iter()
            .map(|class| {
                ReedSolomon::new(
                    Params::builder()
                        .nroots(class.parity_len)
                        .pad(class.pad())
                        .build(),
                )
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Codec {
            mode: Mode::default(),
            rs: Arc::new(rs),
        })
    }

    #[must_use]
    pub fn with_mode(mut self, mode: Mode) -> Self {
        self.mode = mode;
        self
    }

    #[must_use]
    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// The Reed-Solomon codec for the size class at `index`.
    ///
    /// # Panics
    /// If `index` is not a valid [SIZE_CLASSES] index.
    #[must_use]
    pub fn reed_solomon(&self, index: usize) -> &ReedSolomon {
        &self.rs[index]
    }

    /// Create a new decode session sharing this codec's tables.
    #[must_use]
    pub fn decoder(&self) -> Decoder {
        Decoder::new(self.rs.clone())
    }

    /// Encode `payload` into a complete packet, including preamble and sync word.
    ///
    /// # Errors
    /// [Error::PayloadLength] if `payload` is empty or longer than [MAX_PAYLOAD_LEN], or
    /// [Error::Flags] if `flags` is greater than [MAX_FLAGS].
    pub fn encode(&self, payload: &[u8], flags: u8) -> Result<Vec<u8>> {
        let class = match SizeClass::for_payload(payload.len()) {
            Some(class) if !payload.is_empty() => class,
            _ => {
                return Err(Error::PayloadLength {
                    actual: payload.len(),
                    maximum: MAX_PAYLOAD_LEN,
                })
            }
        };
        if flags > MAX_FLAGS {
            return Err(Error::Flags(flags));
        }

        let mut codeword = Vec::with_capacity(class.codeword_len());
        // capacity - len < 32 for every class
        codeword.push((class.capacity - payload.len()) as u8 | flags << 5);
        codeword.extend_from_slice(payload);
        let crc = CRC.checksum(&codeword);
        codeword.extend_from_slice(&crc.to_be_bytes());
        codeword.resize(class.data_len, 0);

        let parity = self.rs[class.index].encode(&codeword)?;
        codeword.extend_from_slice(&parity);
        scramble(&mut codeword);

        let mut packet = Vec::with_capacity(self.mode.prefix_len() + 3 + codeword.len());
        packet.extend_from_slice(self.mode.preamble());
        packet.extend_from_slice(self.mode.sync_word());
        packet.extend_from_slice(&class.tag_bytes());
        packet.extend_from_slice(&codeword);

        debug!(
            len = payload.len(),
            size_class = class.index,
            flags,
            "encoded packet"
        );
        Ok(packet)
    }

    /// Decode a single packet.
    ///
    /// A leading preamble and sync word for either mode, or just the sync word, is
    /// skipped; otherwise `packet` must start with the size tag. Returns the first
    /// completed outcome, or [Outcome::NotReady] if `packet` ends before a codeword is
    /// complete. Failures are not retried.
    #[must_use]
    pub fn decode(&self, packet: &[u8]) -> Outcome {
        let mut decoder = self.decoder();
        strip_prefix(packet)
            .iter()
            .map(|b| decoder.step(*b))
            .find(Outcome::is_ready)
            .unwrap_or(Outcome::NotReady)
    }
}

/// Remove the preamble and sync word for any mode from the start of `dat`.
fn strip_prefix(dat: &[u8]) -> &[u8] {
    for mode in [Mode::TwoLevel, Mode::FourLevel] {
        let rest = dat.strip_prefix(mode.preamble()).unwrap_or(dat);
        if let Some(rest) = rest.strip_prefix(mode.sync_word()) {
            return rest;
        }
    }
    dat
}
