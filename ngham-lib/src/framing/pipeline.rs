//! Decoding packets from byte streams and batches.
use std::collections::VecDeque;
use std::io::{ErrorKind, Read};

use crossbeam::channel::{bounded, Sender};
use rayon::prelude::*;
use tracing::{debug, trace};

use super::{Codec, Decoder, Outcome, State};
use crate::Result;

/// Options for [decode_stream].
#[derive(Debug, Clone, Copy)]
pub struct StreamOpts {
    buffer_size: usize,
    read_size: usize,
}

impl Default for StreamOpts {
    fn default() -> Self {
        StreamOpts {
            buffer_size: 1024,
            read_size: 4096,
        }
    }
}

impl StreamOpts {
    /// Number of outcomes that may be queued before the reader thread blocks.
    #[must_use]
    pub fn with_buffer_size(mut self, buffer_size: usize) -> Self {
        self.buffer_size = buffer_size;
        self
    }

    /// Number of bytes requested from the reader at a time.
    #[must_use]
    pub fn with_read_size(mut self, read_size: usize) -> Self {
        self.read_size = read_size.max(1);
        self
    }
}

/// Finds sync words in a byte stream and feeds the bytes that follow to a [Decoder].
///
/// Once a sync word is found the decoder is fed until it either completes a codeword or
/// misses the size tag, after which scanning for the next sync word resumes.
struct StreamDecoder {
    sync: &'static [u8],
    window: VecDeque<u8>,
    decoder: Decoder,
    locked: bool,
}

impl StreamDecoder {
    fn new(codec: &Codec) -> Self {
        let sync = codec.mode().sync_word();
        StreamDecoder {
            sync,
            window: VecDeque::with_capacity(sync.len()),
            decoder: codec.decoder(),
            locked: false,
        }
    }

    fn push(&mut self, byte: u8) -> Outcome {
        if !self.locked {
            if self.window.len() == self.sync.len() {
                self.window.pop_front();
            }
            self.window.push_back(byte);
            if self.window.iter().eq(self.sync.iter()) {
                trace!("sync word found");
                self.window.clear();
                self.decoder.reset();
                self.locked = true;
            }
            return Outcome::NotReady;
        }

        let outcome = self.decoder.step(byte);
        if outcome.is_ready() || self.decoder.state() == State::SizeTag {
            self.locked = false;
        }
        outcome
    }
}

fn do_decode_stream<R>(
    codec: &Codec,
    mut reader: R,
    opts: StreamOpts,
    tx: &Sender<Result<Outcome>>,
) where
    R: Read,
{
    let mut stream = StreamDecoder::new(codec);
    let mut buf = vec![0u8; opts.read_size];
    let mut num_read = 0usize;
    loop {
        let n = match reader.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => n,
            Err(err) if err.kind() == ErrorKind::Interrupted => continue,
            Err(err) => {
                debug!("stream read failed after {num_read} bytes: {err}");
                let _ = tx.send(Err(err.into()));
                return;
            }
        };
        num_read += n;
        for byte in &buf[..n] {
            let outcome = stream.push(*byte);
            if outcome.is_ready() && tx.send(Ok(outcome)).is_err() {
                // receiver hung up
                return;
            }
        }
    }
    debug!("stream ended after {num_read} bytes");
}

/// Decode all packets found in `reader`.
///
/// Reading and decoding happen on a background thread and every completed outcome,
/// successful or not, is sent back through a bounded channel. Packets must be preceded
/// by the sync word of the codec's [Mode](super::Mode). The stream ends at EOF, or after
/// yielding the first read error.
///
/// # Panics
/// If the background thread cannot be spawned.
///
/// # Example
/// ```
/// use std::io::Cursor;
/// use ngham::framing::{Codec, pipeline::{decode_stream, StreamOpts}};
///
/// let codec = Codec::new().unwrap();
/// let mut dat = codec.encode(b"one", 0).unwrap();
/// dat.extend(codec.encode(b"two", 0).unwrap());
///
/// let payloads: Vec<Vec<u8>> = decode_stream(&codec, Cursor::new(dat), StreamOpts::default())
///     .filter_map(|zult| zult.ok()?.packet())
///     .map(|packet| packet.payload)
///     .collect();
/// assert_eq!(payloads, vec![b"one".to_vec(), b"two".to_vec()]);
/// ```
pub fn decode_stream<R>(
    codec: &Codec,
    reader: R,
    opts: StreamOpts,
) -> impl Iterator<Item = Result<Outcome>>
where
    R: Read + Send + 'static,
{
    let (output_tx, output_rx) = bounded(opts.buffer_size);
    let codec = codec.clone();

    std::thread::Builder::new()
        .name("ngham::decode".into())
        .spawn(move || do_decode_stream(&codec, reader, opts, &output_tx))
        .expect("failed to spawn decode thread");

    output_rx.into_iter()
}

/// Decode independent packet captures in parallel, see [Codec::decode].
///
/// Outcomes are returned in the same order as `captures`.
pub fn decode_all<T>(codec: &Codec, captures: &[T]) -> Vec<Outcome>
where
    T: AsRef<[u8]> + Sync,
{
    captures
        .par_iter()
        .map(|capture| codec.decode(capture.as_ref()))
        .collect()
}

/// Encode many payloads in parallel, see [Codec::encode].
///
/// # Errors
/// The first payload that fails to encode.
pub fn encode_all<T>(codec: &Codec, payloads: &[T], flags: u8) -> Result<Vec<Vec<u8>>>
where
    T: AsRef<[u8]> + Sync,
{
    payloads
        .par_iter()
        .map(|payload| codec.encode(payload.as_ref(), flags))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::framing::Mode;
    use std::io::Cursor;

    struct FailingReader {
        dat: Cursor<Vec<u8>>,
    }

    impl Read for FailingReader {
        fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
            match self.dat.read(buf)? {
                0 => Err(std::io::Error::new(ErrorKind::BrokenPipe, "gone")),
                n => Ok(n),
            }
        }
    }

    #[test]
    fn stream_skips_garbage_between_packets() {
        let codec = Codec::new().unwrap().with_mode(Mode::FourLevel);
        let mut dat = vec![0x55u8; 17];
        dat.extend(codec.encode(b"first", 0).unwrap());
        dat.extend([0x01, 0x02, 0x03, 0x04, 0x05]);
        dat.extend(codec.encode(&[0xab; 150], 7).unwrap());

        let outcomes: Vec<Outcome> =
            decode_stream(&codec, Cursor::new(dat), StreamOpts::default().with_read_size(7))
                .collect::<Result<_>>()
                .unwrap();

        assert_eq!(outcomes.len(), 2, "{outcomes:?}");
        let first = outcomes[0].clone().packet().unwrap();
        assert_eq!(first.payload, b"first");
        let second = outcomes[1].clone().packet().unwrap();
        assert_eq!(second.payload, vec![0xab; 150]);
        assert_eq!(second.flags, 7);
        assert_eq!(second.size_class, 4);
    }

    #[test]
    fn stream_read_error_ends_stream() {
        let codec = Codec::new().unwrap();
        let reader = FailingReader {
            dat: Cursor::new(codec.encode(b"ok", 0).unwrap()),
        };

        let zults: Vec<Result<Outcome>> =
            decode_stream(&codec, reader, StreamOpts::default()).collect();

        assert_eq!(zults.len(), 2);
        assert!(zults[0].as_ref().is_ok_and(|o| o.is_ready()));
        assert!(matches!(zults[1], Err(crate::Error::Io(_))));
    }

    #[test]
    fn decode_all_keeps_order() {
        let codec = Codec::new().unwrap();
        let payloads: Vec<Vec<u8>> = (1..=40u8).map(|n| vec![n; usize::from(n) * 5]).collect();
        let captures = encode_all(&codec, &payloads, 2).unwrap();

        let outcomes = decode_all(&codec, &captures);

        assert_eq!(outcomes.len(), payloads.len());
        for (outcome, payload) in outcomes.into_iter().zip(&payloads) {
            let packet = outcome.packet().unwrap();
            assert_eq!(&packet.payload, payload);
            assert_eq!(packet.flags, 2);
        }
    }

    #[test]
    fn encode_all_reports_errors() {
        let codec = Codec::new().unwrap();
        let payloads = vec![vec![1u8; 10], vec![]];

        assert!(encode_all(&codec, &payloads, 0).is_err());
    }
}
