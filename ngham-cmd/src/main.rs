mod decode;
mod encode;
mod sizes;

use std::fs::File;
use std::io::stderr;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use ngham::framing::{Codec, Mode};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Clone, Copy)]
pub enum ModeArg {
    TwoLevel,
    FourLevel,
}

impl clap::ValueEnum for ModeArg {
    fn value_variants<'a>() -> &'a [Self] {
        &[Self::TwoLevel, Self::FourLevel]
    }

    fn to_possible_value(&self) -> Option<clap::builder::PossibleValue> {
        match self {
            Self::TwoLevel => Some(clap::builder::PossibleValue::new("two-level")),
            Self::FourLevel => Some(clap::builder::PossibleValue::new("four-level")),
        }
    }
}

impl From<ModeArg> for Mode {
    fn from(value: ModeArg) -> Self {
        match value {
            ModeArg::TwoLevel => Mode::TwoLevel,
            ModeArg::FourLevel => Mode::FourLevel,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Encode a file into NGHam packets.
    ///
    /// The input is split into chunks of up to 220 bytes, the largest payload a packet
    /// can carry, and each chunk is written as a complete packet including preamble and
    /// sync word.
    Encode {
        /// Flags value (0-7) written to each packet header.
        #[arg(short, long, default_value_t = 0, value_parser = clap::value_parser!(u8).range(0..=7))]
        flags: u8,

        /// Modulation determining the preamble and sync word.
        #[arg(short, long, default_value = "two-level")]
        mode: ModeArg,

        /// Maximum number of payload bytes per packet.
        #[arg(short, long, default_value_t = 220, value_parser = clap::value_parser!(u16).range(1..=220))]
        chunk_size: u16,

        /// Delete output file if it already exists
        #[arg(long, action)]
        clobber: bool,

        /// Output file path.
        #[arg(short, long, default_value = "encoded.dat", value_name = "path")]
        output: PathBuf,

        /// Input file.
        input: PathBuf,
    },
    /// Decode NGHam packets from a captured byte stream.
    ///
    /// Packets are located using the sync word for the selected mode. Payloads of all
    /// successfully decoded packets are written to the output file.
    Decode {
        /// Modulation determining the sync word.
        #[arg(short, long, default_value = "two-level")]
        mode: ModeArg,

        /// Output format for the per-packet report.
        #[arg(short, long, default_value = "text")]
        format: decode::Format,

        /// Delete output file if it already exists
        #[arg(long, action)]
        clobber: bool,

        /// Output file path.
        #[arg(short, long, default_value = "decoded.dat", value_name = "path")]
        output: PathBuf,

        /// Input stream file.
        input: PathBuf,
    },
    /// Show the packet size classes.
    Sizes,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    tracing_subscriber::fmt()
        .with_target(false)
        .with_writer(stderr)
        .with_ansi(false)
        .without_time()
        .with_env_filter(
            EnvFilter::try_from_env("NGHAM_LOG").unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    debug!("{} {}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"));

    match &cli.command {
        Commands::Encode {
            flags,
            mode,
            chunk_size,
            clobber,
            output,
            input,
        } => {
            if !clobber && output.exists() {
                bail!("{output:?} exists; use --clobber");
            }
            info!("encoding {input:?} to {output:?}");
            let codec = Codec::new()
                .context("creating codec")?
                .with_mode((*mode).into());
            let src = File::open(input).context("opening input")?;
            let dest = File::create(output)
                .with_context(|| format!("failed to create output {output:?}"))?;

            let count = encode::encode(&codec, src, dest, usize::from(*chunk_size), *flags)?;
            info!("wrote {count} packets");
            Ok(())
        }
        Commands::Decode {
            mode,
            format,
            clobber,
            output,
            input,
        } => {
            if !clobber && output.exists() {
                bail!("{output:?} exists; use --clobber");
            }
            info!("decoding {input:?} to {output:?}");
            let codec = Codec::new()
                .context("creating codec")?
                .with_mode((*mode).into());
            let src = File::open(input).context("opening input")?;
            let dest = File::create(output)
                .with_context(|| format!("failed to create output {output:?}"))?;

            decode::decode(&codec, src, dest, format)
        }
        Commands::Sizes => sizes::sizes(),
    }
}
