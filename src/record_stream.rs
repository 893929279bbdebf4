// Length-prefixed records on a byte stream.
//
// A payload shorter than 127 bytes is preceded by its length as one signed
// byte. Longer payloads are preceded by the byte `-1` and the length as a
// little-endian `i64`.

use std::io::{self, Read, Write};

use tracing::trace;

const LONG_MARKER: i8 = -1;
const SHORT_LIMIT: usize = 127;

#[derive(Debug, thiserror::Error)]
pub enum RecordStreamError {
    #[error("Stream ended inside a record {0}")]
    Truncated(&'static str),

    #[error("Record has negative length {0}")]
    NegativeLength(i64),

    #[error(transparent)]
    Io(#[from] io::Error),
}

impl RecordStreamError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::Truncated(_) => "RECORD_TRUNCATED",
            Self::NegativeLength(_) => "RECORD_NEGATIVE_LENGTH",
            Self::Io(_) => "RECORD_IO",
        }
    }
}

fn read_exact_or<R: Read>(
    stream: &mut R,
    buf: &mut [u8],
    part: &'static str,
) -> Result<(), RecordStreamError> {
    stream.read_exact(buf).map_err(|e| match e.kind() {
        io::ErrorKind::UnexpectedEof => RecordStreamError::Truncated(part),
        _ => RecordStreamError::Io(e),
    })
}

/// Append one record holding `payload`.
pub fn write<W: Write>(stream: &mut W, payload: &[u8]) -> Result<(), RecordStreamError> {
    if payload.len() < SHORT_LIMIT {
        stream.write_all(&[payload.len() as u8])?;
    } else {
        stream.write_all(&LONG_MARKER.to_le_bytes())?;
        stream.write_all(&(payload.len() as i64).to_le_bytes())?;
    }
    stream.write_all(payload)?;
    trace!(component = "record_stream", operation = "write", len = payload.len(), "Record written");
    Ok(())
}

/// Read the next record. An exhausted stream is an error, never an empty record.
pub fn read<R: Read>(stream: &mut R) -> Result<Vec<u8>, RecordStreamError> {
    let mut header = [0u8; 1];
    read_exact_or(stream, &mut header, "header")?;
    let short = i8::from_le_bytes(header);

    let len = if short == LONG_MARKER {
        let mut wide = [0u8; 8];
        read_exact_or(stream, &mut wide, "header")?;
        i64::from_le_bytes(wide)
    } else {
        i64::from(short)
    };
    let len = usize::try_from(len).map_err(|_| RecordStreamError::NegativeLength(len))?;

    // Grow with the data actually present; the header alone is not trusted.
    let mut payload = Vec::new();
    stream.by_ref().take(len as u64).read_to_end(&mut payload)?;
    if payload.len() != len {
        return Err(RecordStreamError::Truncated("payload"));
    }
    trace!(component = "record_stream", operation = "read", len, "Record read");
    Ok(payload)
}
