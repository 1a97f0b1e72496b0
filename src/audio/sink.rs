//! Opening files into `rodio` sinks.
//!
//! A sink is created paused at the requested start position; rebuilding one at
//! an offset is also the fallback seek for decoders that cannot seek in place.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::time::Duration;

use rodio::{Decoder, OutputStream, Sink, Source};

use super::types::EngineError;

type FileDecoder = Decoder<BufReader<File>>;

pub(super) fn open_decoder(path: &Path) -> Result<FileDecoder, EngineError> {
    let file = File::open(path).map_err(|source| EngineError::Open {
        path: path.to_path_buf(),
        source,
    })?;
    Decoder::new(BufReader::new(file)).map_err(|e| EngineError::Decode {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })
}

/// Paused sink for `path`, plus the decoder's duration if it has one.
pub(super) fn create_sink_at(
    stream: &OutputStream,
    path: &Path,
    start_at: Duration,
) -> Result<(Sink, Option<Duration>), EngineError> {
    let decoder = open_decoder(path)?;
    let total = decoder.total_duration();

    // Skipping zero is a no-op.
    let source = decoder.skip_duration(start_at);

    let sink = Sink::connect_new(stream.mixer());
    sink.pause();
    sink.append(source);
    Ok((sink, total))
}
