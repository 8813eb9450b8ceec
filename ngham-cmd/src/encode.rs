use std::io::{Read, Write};

use anyhow::{Context, Result};
use ngham::framing::{pipeline::encode_all, Codec};
use tracing::debug;

/// Number of chunks read from the input before they are encoded in parallel.
const BATCH_CHUNKS: usize = 64;

/// Encode all of `src` into packets of at most `chunk_size` payload bytes and write them
/// to `dest`. Returns the number of packets written.
///
/// Input is read in batches of [BATCH_CHUNKS] chunks, so at most that many payloads are
/// held in memory at once.
pub fn encode<R, W>(
    codec: &Codec,
    mut src: R,
    mut dest: W,
    chunk_size: usize,
    flags: u8,
) -> Result<usize>
where
    R: Read,
    W: Write,
{
    let mut count = 0;
    loop {
        let batch = read_batch(&mut src, chunk_size)?;
        if batch.is_empty() {
            break;
        }
        debug!("read {} chunks", batch.len());

        let packets = encode_all(codec, &batch, flags).context("encoding packets")?;
        for packet in &packets {
            dest.write_all(packet).context("writing packet")?;
        }
        count += packets.len();
    }
    dest.flush().context("flushing output")?;

    Ok(count)
}

/// Read up to [BATCH_CHUNKS] chunks of `chunk_size` bytes. Only the last chunk before end
/// of input may be short.
fn read_batch<R: Read>(src: &mut R, chunk_size: usize) -> Result<Vec<Vec<u8>>> {
    let mut batch = Vec::with_capacity(BATCH_CHUNKS);
    while batch.len() < BATCH_CHUNKS {
        let mut chunk = Vec::with_capacity(chunk_size);
        src.by_ref()
            .take(chunk_size as u64)
            .read_to_end(&mut chunk)
            .context("reading input")?;
        if chunk.is_empty() {
            break;
        }
        let short = chunk.len() < chunk_size;
        batch.push(chunk);
        if short {
            break;
        }
    }
    Ok(batch)
}
