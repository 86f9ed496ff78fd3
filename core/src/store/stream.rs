use std::io::{ErrorKind, Read, Write};

use crate::error::{Error, Result};

/// Pulls the next byte from `src`, or `None` once it is exhausted.
///
/// Non-blocking sources are polled until they produce something.
pub(crate) fn pull(src: &mut dyn Read) -> Result<Option<u8>> {
    let mut buf = [0; 1];
    loop {
        match src.read(&mut buf) {
            Ok(0) => return Ok(None),
            Ok(_) => return Ok(Some(buf[0])),
            Err(e) => match e.kind() {
                ErrorKind::WouldBlock | ErrorKind::Interrupted => continue,
                _ => {
                    log::warn!("Failed to read from stream source: {e}");
                    return Err(Error::Io { done: 0, source: e });
                }
            },
        }
    }
}

/// Pushes one byte into `dst`. A sink that accepts nothing is full.
pub(crate) fn push(dst: &mut dyn Write, byte: u8) -> Result<()> {
    loop {
        match dst.write(&[byte]) {
            Ok(0) => {
                log::warn!("Stream sink accepted no more bytes");
                return Err(Error::Capacity { written: 0 });
            }
            Ok(_) => return Ok(()),
            Err(e) => match e.kind() {
                ErrorKind::WouldBlock | ErrorKind::Interrupted => continue,
                _ => {
                    log::warn!("Failed to write to stream sink: {e}");
                    return Err(Error::Io { done: 0, source: e });
                }
            },
        }
    }
}

pub(crate) fn flush(dst: &mut dyn Write) -> Result<()> {
    loop {
        match dst.flush() {
            Ok(()) => return Ok(()),
            Err(e) if matches!(e.kind(), ErrorKind::WouldBlock | ErrorKind::Interrupted) => {
                continue;
            }
            Err(e) => return Err(Error::Io { done: 0, source: e }),
        }
    }
}
