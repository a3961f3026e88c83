//! Decode subscription batches from, and encode event batches into, guest
//! linear memory.
//!
//! All pointers are guest addresses into the supplied memory slice. Bounds
//! are a caller responsibility: only the import trampoline knows the current
//! memory size, so it validates `ptr + stride * count` before calling in.

use crate::layout as l;
use crate::{AbiError, Event, EventKind, Subscription, SubscriptionPayload};

/// Read `count` subscription records starting at `ptr`.
///
/// Fails with [`AbiError::UnknownKindTag`] on the first record whose union
/// tag is outside the defined enumeration.
pub fn decode_subscriptions(
    memory: &[u8],
    ptr: u32,
    count: u32,
) -> Result<Vec<Subscription>, AbiError> {
    let mut subscriptions = Vec::with_capacity(count as usize);
    for i in 0..count as usize {
        let base = ptr as usize + i * l::SUBSCRIPTION_STRIDE;
        subscriptions.push(decode_subscription(memory, base)?);
    }
    Ok(subscriptions)
}

fn decode_subscription(memory: &[u8], base: usize) -> Result<Subscription, AbiError> {
    let userdata = read_u64(memory, base + l::SUBSCRIPTION_USERDATA_OFFSET);
    let kind = EventKind::from_tag(memory[base + l::SUBSCRIPTION_TAG_OFFSET])?;
    let payload = match kind {
        EventKind::Clock => SubscriptionPayload::Clock {
            timeout: read_u64(memory, base + l::SUBSCRIPTION_TIMEOUT_OFFSET),
        },
        EventKind::FdRead => SubscriptionPayload::FdRead {
            fd: read_u32(memory, base + l::SUBSCRIPTION_FD_OFFSET),
        },
        EventKind::FdWrite => SubscriptionPayload::FdWrite {
            fd: read_u32(memory, base + l::SUBSCRIPTION_FD_OFFSET),
        },
    };
    Ok(Subscription { userdata, payload })
}

/// Write one event record per entry of `events`, contiguously from `ptr`,
/// in the order supplied. Reserved bytes are written as zero.
///
/// Encoding cannot fail: every [`Event`] value is representable.
pub fn encode_events(memory: &mut [u8], ptr: u32, events: &[Event]) {
    for (i, event) in events.iter().enumerate() {
        let base = ptr as usize + i * l::EVENT_STRIDE;
        memory[base..base + l::EVENT_STRIDE].fill(0);
        write_u64(memory, base + l::EVENT_USERDATA_OFFSET, event.userdata);
        memory[base + l::EVENT_ERRNO_OFFSET] = event.errno as u8;
        memory[base + l::EVENT_TAG_OFFSET] = event.kind.tag();
    }
}

/// Write the produced event count to the caller-supplied count pointer.
pub fn write_event_count(memory: &mut [u8], ptr: u32, count: u32) {
    write_u32(memory, ptr as usize, count);
}

fn read_u64(memory: &[u8], at: usize) -> u64 {
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&memory[at..at + 8]);
    u64::from_le_bytes(bytes)
}

fn read_u32(memory: &[u8], at: usize) -> u32 {
    let mut bytes = [0u8; 4];
    bytes.copy_from_slice(&memory[at..at + 4]);
    u32::from_le_bytes(bytes)
}

fn write_u64(memory: &mut [u8], at: usize, value: u64) {
    memory[at..at + 8].copy_from_slice(&value.to_le_bytes());
}

fn write_u32(memory: &mut [u8], at: usize, value: u32) {
    memory[at..at + 4].copy_from_slice(&value.to_le_bytes());
}
