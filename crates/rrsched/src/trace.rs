#[cfg(feature = "trace")]
pub use rrtrace::{records, TraceError, TraceHook};

#[cfg(feature = "trace")]
pub type TraceResult = Result<(), TraceError>;

#[cfg(not(feature = "trace"))]
use crate::sync::Arc;

#[cfg(not(feature = "trace"))]
pub type TraceError = core::convert::Infallible;

#[cfg(not(feature = "trace"))]
pub type TraceResult = Result<(), TraceError>;

#[cfg(not(feature = "trace"))]
pub type TraceHook = Arc<dyn Fn(u8, &[u8], bool) -> TraceResult + Send + Sync>;

#[cfg(not(feature = "trace"))]
pub mod records {
    pub mod sched {
        pub const NEXT: u8 = 52;
        pub const IDLE: u8 = 53;
        pub const PREEMPT: u8 = 54;
    }

    pub mod thread {
        pub const CREATE: u8 = 70;
        pub const CREATE_FAILED: u8 = 71;
        pub const KILL: u8 = 72;
        pub const SUSPEND: u8 = 73;
        pub const RESUME: u8 = 74;
    }

    pub mod timer {
        pub const EXPIRE: u8 = 33;
    }
}

/// Encodes a list of words as a little-endian record payload.
pub(crate) fn words(values: &[u32]) -> Vec<u8> {
    values.iter().flat_map(|value| value.to_le_bytes()).collect()
}
