//! Emulation of the `poll_oneoff` system call.
//!
//! The sandbox cannot block: there are no threads to park, no timers to
//! sleep on, and the only descriptor whose readiness the host can vouch for
//! is the console-style input stream on descriptor 0. The emulator
//! therefore resolves every accepted batch immediately:
//!
//! 1. An empty batch is a guest error (`EINVAL`).
//! 2. A readable/writable subscription naming any descriptor other than 0
//!    is unsupported and rejects the whole call with `EINVAL`. This is a
//!    deliberate policy, not a silent ignore: multiplexed descriptor
//!    polling has no meaning in this sandbox.
//! 3. Of all clock subscriptions, only the one with the smallest timeout
//!    fires (first occurrence wins ties).
//! 4. Every readable subscription on descriptor 0 fires: the input stream
//!    is always considered ready. Writable subscriptions on descriptor 0
//!    are accepted but never fire.
//!
//! Clock subscriptions fire immediately, whatever timeout was requested;
//! the sandbox has no meaningful wall clock to wait on. That behavior is a
//! named, configurable policy ([`ClockMode`]) so a future mode that tracks
//! elapsed time across calls can be added without disturbing callers.

use stave_abi::{
    decode_subscriptions, encode_events, layout, write_event_count, Errno, Event, Subscription,
    SubscriptionPayload,
};
use tracing::warn;

/// The descriptor the emulator accepts readable/writable subscriptions on.
pub const INPUT_STREAM_FD: u32 = 0;

/// How clock subscriptions are resolved.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[non_exhaustive]
pub enum ClockMode {
    /// The selected clock subscription fires on the same call that
    /// requested it, regardless of timeout magnitude. Matches the sandbox's
    /// lack of any real wait primitive. Whether guests that sequence work
    /// by timeout ordering across calls need elapsed-time tracking instead
    /// is an open question; no such mode is implemented yet.
    #[default]
    Immediate,
}

/// Poll emulation policy knobs.
#[derive(Debug, Clone, Copy, Default)]
pub struct PollConfig {
    /// Clock resolution mode.
    pub clock: ClockMode,
}

/// Resolves poll batches under the sandbox policy above.
#[derive(Debug, Clone, Default)]
pub struct PollEmulator {
    config: PollConfig,
}

impl PollEmulator {
    /// Create an emulator with the given policy.
    pub fn new(config: PollConfig) -> Self {
        Self { config }
    }

    /// The active policy.
    pub fn config(&self) -> &PollConfig {
        &self.config
    }

    /// The import trampoline behind the guest's poll system call.
    ///
    /// Signature mirrors the guest ABI: subscription array pointer, event
    /// array pointer, subscription count, event count pointer; returns a
    /// raw errno. This is the only layer that validates pointer bounds,
    /// since only it sees the live memory size.
    pub fn poll_oneoff(
        &self,
        memory: &mut [u8],
        in_ptr: u32,
        out_ptr: u32,
        nsubscriptions: u32,
        nevents_ptr: u32,
    ) -> u32 {
        if nsubscriptions == 0 {
            return Errno::Inval.raw();
        }
        let n = nsubscriptions as usize;
        if !range_fits(memory, in_ptr, n * layout::SUBSCRIPTION_STRIDE)
            || !range_fits(memory, out_ptr, n * layout::EVENT_STRIDE)
            || !range_fits(memory, nevents_ptr, 4)
        {
            warn!(in_ptr, out_ptr, nsubscriptions, "poll_oneoff: pointer out of bounds");
            return Errno::Inval.raw();
        }

        let subscriptions = match decode_subscriptions(memory, in_ptr, nsubscriptions) {
            Ok(subs) => subs,
            Err(err) => {
                warn!("poll_oneoff: {err}");
                return Errno::Inval.raw();
            }
        };

        match self.resolve(&subscriptions) {
            Ok(events) => {
                encode_events(memory, out_ptr, &events);
                write_event_count(memory, nevents_ptr, events.len() as u32);
                Errno::Success.raw()
            }
            Err(errno) => errno.raw(),
        }
    }

    /// Apply the batch policy to decoded subscriptions.
    ///
    /// On success the produced events appear in the order their
    /// subscriptions appeared in the batch; on rejection no events are
    /// produced at all.
    pub fn resolve(&self, subscriptions: &[Subscription]) -> Result<Vec<Event>, Errno> {
        if subscriptions.is_empty() {
            return Err(Errno::Inval);
        }

        let mut fired_clock: Option<usize> = None;
        let mut smallest_timeout = u64::MAX;
        for (index, sub) in subscriptions.iter().enumerate() {
            match sub.payload {
                SubscriptionPayload::FdRead { fd } | SubscriptionPayload::FdWrite { fd } => {
                    if fd != INPUT_STREAM_FD {
                        warn!(fd, "poll_oneoff: unsupported descriptor");
                        return Err(Errno::Inval);
                    }
                }
                SubscriptionPayload::Clock { timeout } => {
                    // Strict comparison keeps the first occurrence on ties.
                    if timeout < smallest_timeout {
                        smallest_timeout = timeout;
                        fired_clock = Some(index);
                    }
                }
            }
        }

        // A future elapsed-time mode changes which clock fires below.
        match self.config.clock {
            ClockMode::Immediate => {}
        }

        let mut events = Vec::new();
        for (index, sub) in subscriptions.iter().enumerate() {
            let fires = match sub.payload {
                SubscriptionPayload::Clock { .. } => fired_clock == Some(index),
                SubscriptionPayload::FdRead { .. } => true,
                SubscriptionPayload::FdWrite { .. } => false,
            };
            if fires {
                events.push(Event {
                    userdata: sub.userdata,
                    errno: Errno::Success,
                    kind: sub.payload.kind(),
                });
            }
        }
        Ok(events)
    }
}

fn range_fits(memory: &[u8], ptr: u32, len: usize) -> bool {
    (ptr as usize)
        .checked_add(len)
        .is_some_and(|end| end <= memory.len())
}
