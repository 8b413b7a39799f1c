use super::{AssembledAudio, AssemblyError, AudioAssembler};
use std::io::{Cursor, ErrorKind};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::{MediaSourceStream, MediaSourceStreamOptions};
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

/// Concatenates MP3 chunks without re-encoding.
///
/// Every chunk is demuxed and only its audio frames are kept. ID3 tags and
/// Xing/Info frames describe a single chunk and would mislead players about
/// the joined stream. A chunk that does not demux as MP3 is appended as is.
#[derive(Debug, Default, Clone, Copy)]
pub struct Mp3Assembler;

impl AudioAssembler for Mp3Assembler {
    fn assemble(&self, chunks: Vec<Vec<u8>>) -> Result<AssembledAudio, AssemblyError> {
        let mut bytes = Vec::with_capacity(chunks.iter().map(Vec::len).sum());
        let mut seconds = 0.0;
        let mut recognized = false;

        for (index, chunk) in chunks.iter().enumerate() {
            if chunk.is_empty() {
                continue;
            }

            match demux(chunk) {
                Ok(frames) if !frames.data.is_empty() => {
                    bytes.extend_from_slice(&frames.data);
                    seconds += frames.seconds;
                    recognized = true;
                }
                Ok(_) => bytes.extend_from_slice(chunk),
                Err(e) => {
                    tracing::debug!(
                        chunk_index = index,
                        error = %e,
                        "Chunk is not MP3, appending it unchanged"
                    );
                    bytes.extend_from_slice(chunk);
                }
            }
        }

        if bytes.is_empty() {
            return Err(AssemblyError::Empty);
        }

        Ok(AssembledAudio {
            bytes,
            duration_seconds: recognized.then_some(seconds),
        })
    }
}

#[derive(Debug, Default)]
struct Frames {
    data: Vec<u8>,
    seconds: f64,
}

/// Audio frames of one MP3 stream and their total duration
fn demux(chunk: &[u8]) -> Result<Frames, SymphoniaError> {
    let source = MediaSourceStream::new(
        Box::new(Cursor::new(chunk.to_vec())),
        MediaSourceStreamOptions::default(),
    );
    let mut hint = Hint::new();
    hint.with_extension("mp3");

    let detected = symphonia::default::get_probe().format(
        &hint,
        source,
        &FormatOptions::default(),
        &MetadataOptions::default(),
    )?;
    let mut reader = detected.format;

    let track = reader
        .default_track()
        .ok_or(SymphoniaError::Unsupported("no audio track"))?;
    let track_id = track.id;
    let sample_rate = track
        .codec_params
        .sample_rate
        .ok_or(SymphoniaError::Unsupported("unknown sample rate"))?;

    let mut frames = Frames::default();
    let mut samples = 0u64;
    loop {
        match reader.next_packet() {
            Ok(packet) if packet.track_id() == track_id => {
                samples += packet.dur;
                frames.data.extend_from_slice(packet.buf());
            }
            Ok(_) => {}
            Err(SymphoniaError::IoError(e)) if e.kind() == ErrorKind::UnexpectedEof => break,
            Err(e) => return Err(e),
        }
    }

    frames.seconds = samples as f64 / sample_rate as f64;
    Ok(frames)
}
