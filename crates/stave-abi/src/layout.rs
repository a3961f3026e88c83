//! ABI layout tables for `poll_oneoff` records.
//!
//! These constants are a binary protocol contract with the guest toolchain
//! (wasi-libc against wasi-sdk); they must match the guest's struct layout
//! exactly and are kept in one place so they can be verified against the
//! toolchain headers.
//!
//! Subscription record (48 bytes, little-endian):
//!
//! | offset | size | field                                  |
//! |--------|------|----------------------------------------|
//! | 0      | 8    | userdata                               |
//! | 8      | 1    | union tag (event type)                 |
//! | 16     | 4    | descriptor (fd_read / fd_write only)   |
//! | 24     | 8    | relative timeout (clock only)          |
//!
//! Event record (32 bytes, little-endian):
//!
//! | offset | size | field                                  |
//! |--------|------|----------------------------------------|
//! | 0      | 8    | userdata                               |
//! | 8      | 1    | errno                                  |
//! | 9      | 1    | reserved, written as zero              |
//! | 10     | 1    | event type tag                         |
//! | 11     | 21   | reserved, written as zero              |

/// Size in bytes of one subscription record.
pub const SUBSCRIPTION_STRIDE: usize = 48;

/// Offset of the 64-bit userdata within a subscription record.
pub const SUBSCRIPTION_USERDATA_OFFSET: usize = 0;

/// Offset of the union tag byte within a subscription record.
pub const SUBSCRIPTION_TAG_OFFSET: usize = 8;

/// Offset of the 32-bit descriptor number for fd subscriptions.
pub const SUBSCRIPTION_FD_OFFSET: usize = 16;

/// Offset of the 64-bit relative timeout for clock subscriptions.
pub const SUBSCRIPTION_TIMEOUT_OFFSET: usize = 24;

/// Size in bytes of one event record.
pub const EVENT_STRIDE: usize = 32;

/// Offset of the 64-bit userdata within an event record.
pub const EVENT_USERDATA_OFFSET: usize = 0;

/// Offset of the errno byte within an event record.
pub const EVENT_ERRNO_OFFSET: usize = 8;

/// Offset of the event type tag byte within an event record.
pub const EVENT_TAG_OFFSET: usize = 10;

/// Tag byte for clock subscriptions and events.
pub const EVENTTYPE_CLOCK: u8 = 0;

/// Tag byte for descriptor-readable subscriptions and events.
pub const EVENTTYPE_FD_READ: u8 = 1;

/// Tag byte for descriptor-writable subscriptions and events.
pub const EVENTTYPE_FD_WRITE: u8 = 2;
