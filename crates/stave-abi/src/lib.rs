//! Wire format for the WASI preview-1 `poll_oneoff` system call.
//!
//! The guest describes each wait condition as a fixed-size *subscription*
//! record in its linear memory and receives fixed-size *event* records in
//! return. This crate owns every ABI-specific stride, offset, and tag value
//! (see [`layout`]) and translates between the raw byte layout and native
//! values. It performs no bounds validation: callers hand in pointers that
//! they have already checked against the current memory size.

#![warn(missing_docs)]

pub mod codec;
pub mod layout;

mod error;

pub use codec::{decode_subscriptions, encode_events, write_event_count};
pub use error::AbiError;

use crate::layout as l;

/// System-call error codes returned to the guest.
///
/// Values match wasi-libc's `predefined-macros.txt` for wasi-sdk. Only the
/// codes the poll emulation actually produces are enumerated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Errno {
    /// No error occurred.
    Success = 0,
    /// Invalid argument: empty batch, unsupported descriptor, unknown tag.
    Inval = 28,
}

impl Errno {
    /// The raw wire value, as returned from the system-call import.
    pub const fn raw(self) -> u32 {
        self as u32
    }
}

/// The kind of condition a subscription waits on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    /// A relative timer expiry.
    Clock,
    /// A descriptor becoming readable.
    FdRead,
    /// A descriptor becoming writable.
    FdWrite,
}

impl EventKind {
    /// Decode a kind tag byte.
    pub fn from_tag(tag: u8) -> Result<Self, AbiError> {
        match tag {
            l::EVENTTYPE_CLOCK => Ok(EventKind::Clock),
            l::EVENTTYPE_FD_READ => Ok(EventKind::FdRead),
            l::EVENTTYPE_FD_WRITE => Ok(EventKind::FdWrite),
            other => Err(AbiError::UnknownKindTag(other)),
        }
    }

    /// The kind's tag byte on the wire.
    pub const fn tag(self) -> u8 {
        match self {
            EventKind::Clock => l::EVENTTYPE_CLOCK,
            EventKind::FdRead => l::EVENTTYPE_FD_READ,
            EventKind::FdWrite => l::EVENTTYPE_FD_WRITE,
        }
    }
}

/// The kind-specific half of a subscription record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubscriptionPayload {
    /// Wait for a relative timeout (guest clock units, nanoseconds for the
    /// monotonic clock the toolchain subscribes with).
    Clock {
        /// Relative timeout requested by the guest.
        timeout: u64,
    },
    /// Wait for a descriptor to become readable.
    FdRead {
        /// Guest descriptor number.
        fd: u32,
    },
    /// Wait for a descriptor to become writable.
    FdWrite {
        /// Guest descriptor number.
        fd: u32,
    },
}

impl SubscriptionPayload {
    /// The event kind this payload corresponds to.
    pub const fn kind(&self) -> EventKind {
        match self {
            SubscriptionPayload::Clock { .. } => EventKind::Clock,
            SubscriptionPayload::FdRead { .. } => EventKind::FdRead,
            SubscriptionPayload::FdWrite { .. } => EventKind::FdWrite,
        }
    }
}

/// One wait condition requested by the guest.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Subscription {
    /// Opaque value echoed back unchanged in the matching event.
    pub userdata: u64,
    /// What the guest is waiting for.
    pub payload: SubscriptionPayload,
}

/// One completed wait condition reported back to the guest.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Event {
    /// The `userdata` of the subscription that produced this event.
    pub userdata: u64,
    /// Per-event error code.
    pub errno: Errno,
    /// The kind of the subscription that produced this event.
    pub kind: EventKind,
}
