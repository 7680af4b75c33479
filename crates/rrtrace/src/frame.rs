//! Record framing.
//!
//! A frame is `seq, record_type, [timestamp u32 LE], payload.., checksum`
//! followed by a single `FLAG` byte. `FLAG` and `ESC` bytes inside the frame
//! are escaped as `ESC, byte ^ ESC_XOR`. The checksum is the one's complement
//! of the wrapping sum of every unescaped byte before it.

use thiserror::Error;

use crate::TraceRecord;

const FLAG: u8 = 0x7E;
const ESC: u8 = 0x7D;
const ESC_XOR: u8 = 0x20;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FrameError {
    #[error("frame is not terminated by a flag byte")]
    Unterminated,
    #[error("dangling escape byte at end of frame")]
    DanglingEscape,
    #[error("frame too short (len={0})")]
    TooShort(usize),
    #[error("checksum mismatch (sum={0:#04x})")]
    Checksum(u8),
}

fn push_escaped(dest: &mut Vec<u8>, byte: u8) {
    if byte == FLAG || byte == ESC {
        dest.push(ESC);
        dest.push(byte ^ ESC_XOR);
    } else {
        dest.push(byte);
    }
}

/// Encodes a record into a terminated frame.
pub fn encode_frame(record: &TraceRecord) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(record.payload.len() + 8);
    let mut checksum: u8 = 0;

    let mut push = |dest: &mut Vec<u8>, byte: u8| {
        checksum = checksum.wrapping_add(byte);
        push_escaped(dest, byte);
    };

    push(&mut bytes, record.seq);
    push(&mut bytes, record.record_type);
    if let Some(ts) = record.timestamp {
        for byte in ts.to_le_bytes() {
            push(&mut bytes, byte);
        }
    }
    for &byte in &record.payload {
        push(&mut bytes, byte);
    }

    push_escaped(&mut bytes, !checksum);
    bytes.push(FLAG);
    bytes
}

/// Decodes a single terminated frame.
///
/// `with_timestamp` tells whether the producer was configured to stamp
/// records; the frame itself does not carry that information.
pub fn decode_frame(frame: &[u8], with_timestamp: bool) -> Result<TraceRecord, FrameError> {
    let body = match frame.split_last() {
        Some((&FLAG, body)) => body,
        _ => return Err(FrameError::Unterminated),
    };

    let mut raw = Vec::with_capacity(body.len());
    let mut escaped = false;
    for &byte in body {
        if escaped {
            raw.push(byte ^ ESC_XOR);
            escaped = false;
        } else if byte == ESC {
            escaped = true;
        } else {
            raw.push(byte);
        }
    }
    if escaped {
        return Err(FrameError::DanglingEscape);
    }

    let header = if with_timestamp { 6 } else { 2 };
    if raw.len() < header + 1 {
        return Err(FrameError::TooShort(raw.len()));
    }

    let sum = raw.iter().fold(0u8, |acc, b| acc.wrapping_add(*b));
    if sum != 0xFF {
        return Err(FrameError::Checksum(sum));
    }

    let timestamp = with_timestamp.then(|| u32::from_le_bytes([raw[2], raw[3], raw[4], raw[5]]));
    Ok(TraceRecord {
        seq: raw[0],
        record_type: raw[1],
        timestamp,
        payload: raw[header..raw.len() - 1].to_vec(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flag_bytes_are_escaped() {
        let record = TraceRecord {
            seq: 1,
            record_type: FLAG,
            timestamp: None,
            payload: vec![ESC, 0x01],
        };

        let frame = encode_frame(&record);
        assert_eq!(&frame[..5], &[0x01, ESC, FLAG ^ ESC_XOR, ESC, ESC ^ ESC_XOR]);
        assert_eq!(frame.iter().filter(|b| **b == FLAG).count(), 1);
        assert_eq!(decode_frame(&frame, false), Ok(record));
    }

    #[test]
    fn corrupted_frame_fails_checksum() {
        let record = TraceRecord {
            seq: 9,
            record_type: 52,
            timestamp: Some(1234),
            payload: vec![3, 0, 0, 0],
        };

        let mut frame = encode_frame(&record);
        frame[3] ^= 0x01;
        assert!(matches!(decode_frame(&frame, true), Err(FrameError::Checksum(_))));
    }

    #[test]
    fn missing_flag_is_reported() {
        assert_eq!(decode_frame(&[1, 2, 3], false), Err(FrameError::Unterminated));
        assert_eq!(decode_frame(&[FLAG], false), Err(FrameError::TooShort(0)));
    }
}
