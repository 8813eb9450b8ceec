use std::io::{stdout, Read, Write};

use anyhow::{Context, Result};
use ngham::framing::{
    pipeline::{decode_stream, StreamOpts},
    Codec, Failure, Outcome,
};
use serde::Serialize;
use tracing::{info, warn};

#[derive(Debug, Clone)]
pub enum Format {
    Json,
    Text,
}

impl clap::ValueEnum for Format {
    fn value_variants<'a>() -> &'a [Self] {
        &[Self::Json, Self::Text]
    }

    fn to_possible_value(&self) -> Option<clap::builder::PossibleValue> {
        match self {
            Self::Json => Some(clap::builder::PossibleValue::new("json")),
            Self::Text => Some(clap::builder::PossibleValue::new("text")),
        }
    }
}

#[derive(Default, Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Summary {
    pub decoded: usize,
    pub corrected_packets: usize,
    pub corrected_bytes: usize,
    pub uncorrectable: usize,
    pub crc_failures: usize,
    pub payload_bytes: usize,
}

impl Summary {
    fn add(&mut self, outcome: &Outcome) {
        match outcome {
            Outcome::NotReady => (),
            Outcome::Decoded(packet) => {
                self.decoded += 1;
                self.payload_bytes += packet.payload.len();
                if packet.corrected > 0 {
                    self.corrected_packets += 1;
                    self.corrected_bytes += packet.corrected;
                }
            }
            Outcome::Failed(Failure::Uncorrectable { .. }) => self.uncorrectable += 1,
            Outcome::Failed(Failure::Crc { .. }) => self.crc_failures += 1,
        }
    }
}

/// Decode packets from `src`, writing payloads to `dest` and reporting each outcome in
/// `format`.
pub fn decode<R, W>(codec: &Codec, src: R, dest: W, format: &Format) -> Result<()>
where
    R: Read + Send + 'static,
    W: Write,
{
    let mut report = stdout().lock();
    let summary = decode_to(codec, src, dest, |idx, outcome| match format {
        Format::Json => {
            serde_json::to_writer(&mut report, outcome).context("serializing to json")?;
            writeln!(report).context("writing to stdout")
        }
        Format::Text => {
            log_outcome(idx, outcome);
            Ok(())
        }
    })?;

    match format {
        Format::Json => {
            serde_json::to_writer(&mut report, &summary).context("serializing to json")?;
            writeln!(report).context("writing to stdout")
        }
        Format::Text => {
            let text = crate::sizes::render("summary", SUMMARY_TEMPLATE, &summary)?;
            report
                .write_all(text.as_bytes())
                .context("writing to stdout")
        }
    }
}

fn log_outcome(idx: usize, outcome: &Outcome) {
    match outcome {
        Outcome::NotReady => (),
        Outcome::Decoded(packet) => info!(
            "packet {idx}: {} bytes, size class {}, flags {}, corrected {} {:?}",
            packet.payload.len(),
            packet.size_class,
            packet.flags,
            packet.corrected,
            packet.error_positions
        ),
        Outcome::Failed(failure) => warn!("packet {idx}: failed {failure:?}"),
    }
}

/// Decode all of `src`, writing payloads to `dest` and calling `report` for each outcome.
fn decode_to<R, W, F>(codec: &Codec, src: R, mut dest: W, mut report: F) -> Result<Summary>
where
    R: Read + Send + 'static,
    W: Write,
    F: FnMut(usize, &Outcome) -> Result<()>,
{
    let mut summary = Summary::default();
    for (idx, zult) in decode_stream(codec, src, StreamOpts::default()).enumerate() {
        let outcome = zult.context("reading input")?;
        summary.add(&outcome);
        report(idx, &outcome)?;
        if let Outcome::Decoded(packet) = outcome {
            dest.write_all(&packet.payload).context("writing payload")?;
        }
    }
    dest.flush().context("flushing output")?;
    Ok(summary)
}

const SUMMARY_TEMPLATE: &str = r"Decoded:       {{ decoded }}
Corrected:     {{ corrected_packets }} packets, {{ corrected_bytes }} bytes
Uncorrectable: {{ uncorrectable }}
CRC failures:  {{ crc_failures }}
Payload bytes: {{ payload_bytes }}
";

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn decode_writes_payloads_and_counts() {
        let codec = Codec::new().unwrap();
        let mut dat = codec.encode(b"first ", 0).unwrap();
        let mut second = codec.encode(b"second", 0).unwrap();
        second[20] ^= 0x01;
        dat.extend(second);
        let mut bad = codec.encode(b"third", 0).unwrap();
        for b in &mut bad[11..40] {
            *b = !*b;
        }
        dat.extend(bad);

        let mut dest = Vec::new();
        let mut seen = Vec::new();
        let summary = decode_to(&codec, Cursor::new(dat), &mut dest, |idx, outcome| {
            seen.push((idx, outcome.corrections()));
            Ok(())
        })
        .unwrap();

        assert_eq!(dest, b"first second");
        assert_eq!(seen, vec![(0, 0), (1, 1), (2, -1)]);
        assert_eq!(summary.decoded, 2);
        assert_eq!(summary.corrected_packets, 1);
        assert_eq!(summary.corrected_bytes, 1);
        assert_eq!(summary.uncorrectable + summary.crc_failures, 1);
        assert_eq!(summary.payload_bytes, 12);
    }

    #[test]
    fn summary_renders() {
        let summary = Summary {
            decoded: 3,
            ..Default::default()
        };

        let text = crate::sizes::render("summary", SUMMARY_TEMPLATE, &summary).unwrap();

        assert!(text.starts_with("Decoded:       3\n"), "{text}");
    }
}
