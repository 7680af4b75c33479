//! Scheduler trace records with pluggable backends.
//!
//! Every scheduling decision taken by `rrsched` can be reported as a small
//! binary *record*: a record identifier from [`records`], a sequence number,
//! an optional timestamp and a little-endian payload. Records are framed with
//! a flag/escape scheme (see [`frame`]) before reaching a [`TraceBackend`], so a
//! byte stream of records can be split and checked without any other context.

use std::io::{self, Write};
use std::sync::Arc;
use std::time::Instant;

use parking_lot::Mutex;
use thiserror::Error;

pub mod frame;
pub mod records;

pub use frame::{decode_frame, encode_frame, FrameError};

/// Options for a [`Tracer`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TraceConfig {
    /// Largest payload accepted, in bytes.
    pub payload_limit: usize,
    /// Whether records that ask for a timestamp get one.
    pub timestamps: bool,
}

impl Default for TraceConfig {
    fn default() -> Self {
        Self {
            payload_limit: 64,
            timestamps: true,
        }
    }
}

impl TraceConfig {
    /// No record is ever stamped, so streams compare byte for byte.
    pub fn untimed() -> Self {
        Self {
            timestamps: false,
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TraceRecord {
    pub seq: u8,
    pub record_type: u8,
    /// Microseconds since the tracer was created.
    pub timestamp: Option<u32>,
    pub payload: Vec<u8>,
}

impl TraceRecord {
    pub fn encode(&self) -> Vec<u8> {
        encode_frame(self)
    }

    /// Payload read back as little-endian words. A trailing partial word is
    /// ignored.
    pub fn words(&self) -> Vec<u32> {
        self.payload
            .chunks_exact(4)
            .map(|w| u32::from_le_bytes([w[0], w[1], w[2], w[3]]))
            .collect()
    }
}

#[derive(Error, Debug)]
pub enum TraceError {
    #[error("record {record} carries {len} payload bytes, limit is {limit}")]
    Oversized { record: u8, len: usize, limit: usize },
    #[error("trace sink failed: {0}")]
    Sink(#[from] io::Error),
}

/// Callback invoked by the scheduler for every record it produces.
///
/// Arguments are the record identifier, the payload and whether the record
/// should carry a timestamp.
pub type TraceHook = Arc<dyn Fn(u8, &[u8], bool) -> Result<(), TraceError> + Send + Sync>;

/// Destination for encoded frames.
pub trait TraceBackend: Send + Sync {
    fn write_frame(&self, frame: &[u8]) -> Result<(), TraceError>;
}

/// Any locked writer takes whole frames.
impl<W: Write + Send> TraceBackend for Mutex<W> {
    fn write_frame(&self, frame: &[u8]) -> Result<(), TraceError> {
        Ok(self.lock().write_all(frame)?)
    }
}

/// Backend keeping every frame in memory; the harness and tests read it back.
#[derive(Clone, Default)]
pub struct MemoryBackend {
    frames: Arc<Mutex<Vec<Vec<u8>>>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn frames(&self) -> Vec<Vec<u8>> {
        self.frames.lock().clone()
    }

    /// Decodes every stored frame, skipping ones that fail to decode.
    pub fn records(&self, with_timestamp: bool) -> Vec<TraceRecord> {
        self.frames
            .lock()
            .iter()
            .filter_map(|frame| decode_frame(frame, with_timestamp).ok())
            .collect()
    }

    pub fn clear(&self) {
        self.frames.lock().clear();
    }
}

impl TraceBackend for MemoryBackend {
    fn write_frame(&self, frame: &[u8]) -> Result<(), TraceError> {
        self.frames.lock().push(frame.to_vec());
        Ok(())
    }
}

/// Numbers records, stamps them when enabled and hands frames to a backend.
pub struct Tracer<B: TraceBackend> {
    backend: B,
    payload_limit: usize,
    epoch: Option<Instant>,
    seq: u8,
}

impl<B: TraceBackend> Tracer<B> {
    pub fn new(cfg: TraceConfig, backend: B) -> Self {
        Self {
            backend,
            payload_limit: cfg.payload_limit,
            epoch: cfg.timestamps.then(Instant::now),
            seq: 0,
        }
    }

    pub fn into_handle(self) -> TracerHandle<B> {
        TracerHandle {
            inner: Arc::new(Mutex::new(self)),
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Encodes one record and writes its frame.
    ///
    /// Oversized payloads are refused before a sequence number is taken.
    pub fn record(
        &mut self,
        record_type: u8,
        payload: &[u8],
        stamped: bool,
    ) -> Result<TraceRecord, TraceError> {
        if payload.len() > self.payload_limit {
            return Err(TraceError::Oversized {
                record: record_type,
                len: payload.len(),
                limit: self.payload_limit,
            });
        }

        self.seq = self.seq.wrapping_add(1);
        let record = TraceRecord {
            seq: self.seq,
            record_type,
            timestamp: self.stamp(stamped),
            payload: payload.to_vec(),
        };
        self.backend.write_frame(&record.encode())?;
        Ok(record)
    }

    fn stamp(&self, wanted: bool) -> Option<u32> {
        let elapsed = self.epoch.filter(|_| wanted)?.elapsed();
        Some(u32::try_from(elapsed.as_micros()).unwrap_or(u32::MAX))
    }
}

/// Shared tracer, cloned into every hook it hands out.
pub struct TracerHandle<B: TraceBackend> {
    inner: Arc<Mutex<Tracer<B>>>,
}

impl<B: TraceBackend> Clone for TracerHandle<B> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<B: TraceBackend + 'static> TracerHandle<B> {
    pub fn emit(
        &self,
        record_type: u8,
        payload: &[u8],
        stamped: bool,
    ) -> Result<TraceRecord, TraceError> {
        self.inner.lock().record(record_type, payload, stamped)
    }

    /// Builds a [`TraceHook`] feeding this tracer.
    pub fn hook(&self) -> TraceHook {
        let handle = self.clone();
        Arc::new(move |record_type, payload, stamped| {
            handle.emit(record_type, payload, stamped).map(|_| ())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tracer_numbers_records() {
        let backend = MemoryBackend::new();
        let handle = Tracer::new(TraceConfig::default(), backend.clone()).into_handle();

        handle.emit(records::sched::IDLE, &[1, 0, 0, 0], false).unwrap();
        handle.emit(records::sched::IDLE, &[2, 0, 0, 0], false).unwrap();

        let decoded = backend.records(false);
        assert_eq!(decoded.len(), 2);
        assert_eq!(decoded[0].seq, 1);
        assert_eq!(decoded[1].seq, 2);
        assert_eq!(decoded[1].words(), vec![2]);
    }

    #[test]
    fn oversized_payload_is_rejected() {
        let cfg = TraceConfig {
            payload_limit: 4,
            timestamps: false,
        };
        let mut tracer = Tracer::new(cfg, MemoryBackend::new());

        let err = tracer.record(records::sched::NEXT, &[0; 8], false).unwrap_err();
        assert!(matches!(err, TraceError::Oversized { len: 8, limit: 4, .. }));
        assert!(tracer.backend().frames().is_empty());

        let next = tracer.record(records::sched::NEXT, &[0; 4], false).unwrap();
        assert_eq!(next.seq, 1);
    }

    #[test]
    fn hook_stamps_when_asked() {
        let backend = MemoryBackend::new();
        let handle = Tracer::new(TraceConfig::default(), backend.clone()).into_handle();
        let hook = handle.hook();

        hook(records::thread::CREATE, &[7, 0, 0, 0], true).unwrap();

        let decoded = backend.records(true);
        assert_eq!(decoded.len(), 1);
        assert!(decoded[0].timestamp.is_some());
        assert_eq!(decoded[0].record_type, records::thread::CREATE);
    }

    #[test]
    fn untimed_tracer_never_stamps() {
        let mut tracer = Tracer::new(TraceConfig::untimed(), MemoryBackend::new());

        let record = tracer.record(records::timer::EXPIRE, &[3, 0, 0, 0], true).unwrap();

        assert_eq!(record.timestamp, None);
        assert_eq!(tracer.backend().records(false), vec![record]);
    }

    #[test]
    fn locked_writer_receives_whole_frames() {
        let mut tracer = Tracer::new(TraceConfig::untimed(), Mutex::new(Vec::new()));

        let first = tracer.record(records::thread::KILL, &[1, 0, 0, 0], false).unwrap();
        let second = tracer.record(records::thread::KILL, &[2, 0, 0, 0], false).unwrap();

        let bytes = tracer.backend().lock().clone();
        let decoded: Vec<_> = bytes
            .split_inclusive(|byte| *byte == 0x7E)
            .map(|frame| decode_frame(frame, false).unwrap())
            .collect();
        assert_eq!(decoded, vec![first, second]);
    }
}
