//! gRPC message framing: `<1-byte compressed?><4-byte length BE><payload>`
//! (§3 GrpcFrame, §4.4).

use crate::error::{FetchError, Result};
use anyhow::anyhow;

/// Maximum accepted frame payload length. Frames claiming a larger
/// length are rejected as malformed rather than allocated.
pub const MAX_FRAME_LEN: u32 = 256 * 1024 * 1024;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub payload: Vec<u8>,
    pub compressed: bool,
}

impl Frame {
    pub fn new(payload: Vec<u8>, compressed: bool) -> Self {
        Self { payload, compressed }
    }

    /// Encodes this frame to the wire format.
    pub fn encode(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(5 + self.payload.len());
        out.push(self.compressed as u8);
        out.extend_from_slice(&(self.payload.len() as u32).to_be_bytes());
        out.extend_from_slice(&self.payload);
        out
    }
}

/// Decodes a single frame from a complete, already-received buffer.
pub fn unframe(buf: &[u8]) -> Result<Frame> {
    if buf.len() < 5 {
        return Err(anyhow!(FetchError::Transport("truncated grpc frame header".to_string())));
    }
    let compressed = buf[0] != 0;
    let len = u32::from_be_bytes([buf[1], buf[2], buf[3], buf[4]]);
    if len > MAX_FRAME_LEN {
        return Err(anyhow!(FetchError::Transport(format!(
            "grpc frame length {len} exceeds maximum {MAX_FRAME_LEN}"
        ))));
    }
    let payload = buf.get(5..5 + len as usize).ok_or_else(|| {
        anyhow!(FetchError::Transport("truncated grpc frame payload".to_string()))
    })?;
    Ok(Frame {
        payload: payload.to_vec(),
        compressed,
    })
}

/// Splits a concatenated byte stream into individual frames, returning
/// `Ok(None)` when fewer than 5 bytes remain (EOF before next header).
pub fn read_frame(buf: &[u8]) -> Result<Option<(Frame, usize)>> {
    if buf.is_empty() {
        return Ok(None);
    }
    if buf.len() < 5 {
        return Err(anyhow!(FetchError::Transport("truncated grpc frame header".to_string())));
    }
    let len = u32::from_be_bytes([buf[1], buf[2], buf[3], buf[4]]);
    if len > MAX_FRAME_LEN {
        return Err(anyhow!(FetchError::Transport(format!(
            "grpc frame length {len} exceeds maximum {MAX_FRAME_LEN}"
        ))));
    }
    let end = 5 + len as usize;
    if buf.len() < end {
        return Err(anyhow!(FetchError::Transport("truncated grpc frame payload".to_string())));
    }
    let frame = unframe(&buf[..end])?;
    Ok(Some((frame, end)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frame_unframe_roundtrips() {
        let frame = Frame::new(b"hello".to_vec(), false);
        let encoded = frame.encode();
        let decoded = unframe(&encoded).unwrap();
        assert_eq!(decoded, frame);
    }

    #[test]
    fn oversized_length_is_rejected() {
        let mut buf = vec![0u8];
        buf.extend_from_slice(&(MAX_FRAME_LEN + 1).to_be_bytes());
        assert!(unframe(&buf).is_err());
    }

    #[test]
    fn truncated_header_is_rejected() {
        assert!(unframe(&[0, 0, 0]).is_err());
    }

    #[test]
    fn read_frame_splits_concatenated_frames() {
        let a = Frame::new(b"one".to_vec(), false).encode();
        let b = Frame::new(b"two".to_vec(), false).encode();
        let mut combined = a.clone();
        combined.extend_from_slice(&b);
        let (first, consumed) = read_frame(&combined).unwrap().unwrap();
        assert_eq!(first.payload, b"one");
        let (second, _) = read_frame(&combined[consumed..]).unwrap().unwrap();
        assert_eq!(second.payload, b"two");
    }
}
