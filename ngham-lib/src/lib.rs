//! # NGHam
//!
//! Encoding and decoding of NGHam radio packets.
//!
//! NGHam frames a payload of up to 220 bytes into one of seven fixed size classes, protects
//! it with a CRC-16 and a shortened Reed-Solomon code over GF(2^8), and scrambles the result
//! with the CCSDS pseudo-noise sequence. A 24-bit size tag in front of each codeword lets a
//! receiver pick the codeword length even when the tag itself has bit errors.
//!
//! * [rs] contains the general Reed-Solomon codec and finite field arithmetic.
//! * [framing] contains the packet [Codec](framing::Codec), the byte-wise
//!   [Decoder](framing::Decoder) and stream/batch helpers in [framing::pipeline].
//!
//! ```
//! use ngham::framing::{Codec, Outcome};
//!
//! let codec = Codec::new().unwrap();
//! let mut packet = codec.encode(b"CQ CQ", 2).unwrap();
//! // flip a bit in the payload after the 8 byte sync prefix and the 3 byte size tag
//! packet[13] ^= 0x10;
//!
//! let Outcome::Decoded(decoded) = codec.decode(&packet) else {
//!     panic!("decode failed");
//! };
//! assert_eq!(decoded.payload, b"CQ CQ");
//! assert_eq!(decoded.flags, 2);
//! assert_eq!(decoded.error_positions, vec![2]);
//! ```
//!
//! ## Features
//! * `serde`: Serialize/Deserialize for [framing::Packet], [framing::Outcome] and friends.
mod error;

pub mod framing;
pub mod rs;

pub use error::{Error, Result};
