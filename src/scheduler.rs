//! Timer/scheduler engine.
//!
//! Single-threaded timer table driving the whole application.  The
//! scheduler never calls application code itself: [`Scheduler::run`]
//! blocks on the [`Clock`] until the earliest timer is due (or the
//! termination flag is raised) and hands back one batch of expired
//! timers.  The caller looks each [`TimerSource`] up in its dispatch
//! table and runs the handler, which acknowledges the expiration with
//! [`Scheduler::consume`].
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                      Timer sources                           │
//! │                                                              │
//! │  ┌────────────┐     ┌────────────┐     ┌──────────────┐      │
//! │  │ ButtonPoll │     │ CloudPoll  │     │ PumpShutoff  │      │
//! │  │ (periodic) │     │ (periodic, │     │ (one-shot)   │      │
//! │  │            │     │  backoff)  │     │              │      │
//! │  └─────┬──────┘     └─────┬──────┘     └──────┬───────┘      │
//! │        │                  │                   │              │
//! │        ▼                  ▼                   ▼              │
//! │  ┌────────────────────────────────────────────────────────┐  │
//! │  │        Scheduler::run()  →  Batch of Expired           │  │
//! │  └───────────────────────┬────────────────────────────────┘  │
//! │                          │                                   │
//! │                          ▼                                   │
//! │              AppService dispatch table                       │
//! └──────────────────────────────────────────────────────────────┘
//! ```

use core::time::Duration;

use log::{debug, info};

use crate::app::ports::{Clock, WaitOutcome};
use crate::error::SchedulerError;
use crate::signals::ShutdownFlag;

// ═══════════════════════════════════════════════════════════════
//  Timer types
// ═══════════════════════════════════════════════════════════════

/// Maximum number of concurrent timers (stack-allocated).
pub const MAX_TIMERS: usize = 8;

/// Event source a timer belongs to; the key of the dispatch table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum TimerSource {
    ButtonPoll = 0,
    CloudPoll = 1,
    PumpShutoff = 2,
}

impl TimerSource {
    /// Number of sources; sizes the dispatch table.
    pub const COUNT: usize = 3;

    pub const fn index(self) -> usize {
        self as usize
    }
}

/// Opaque token for a registered timer.
///
/// The generation makes a handle go stale once its timer is released, so
/// an old handle can never cancel or consume a timer that later reused
/// the same slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerHandle {
    slot: u8,
    generation: u16,
}

/// Whether a timer re-arms itself after expiring.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerKind {
    Periodic(Duration),
    OneShot,
}

/// A timer that was due when [`Scheduler::run`] returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Expired {
    pub handle: TimerHandle,
    pub source: TimerSource,
}

/// One batch of due timers, in slot order.
pub type Batch = heapless::Vec<Expired, MAX_TIMERS>;

/// What a single [`Scheduler::run`] call produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    /// These timers are due; dispatch each of them once.
    Dispatch(Batch),
    /// The termination flag was raised; nothing was dispatched.
    Interrupted,
}

/// Internal bookkeeping for a live timer.
#[derive(Debug, Clone)]
struct TimerEntry {
    source: TimerSource,
    kind: TimerKind,
    /// Next expiry, `None` once a one-shot has fired.
    deadline: Option<Duration>,
    /// Expirations not yet acknowledged through `consume`.
    pending: u32,
    generation: u16,
}

// ═══════════════════════════════════════════════════════════════
//  Scheduler engine
// ═══════════════════════════════════════════════════════════════

/// The scheduler engine.
///
/// Owns the clock it waits on, so tests can drive it with a simulated
/// clock and the binary with a monotonic one.
pub struct Scheduler<C: Clock> {
    clock: C,
    slots: [Option<TimerEntry>; MAX_TIMERS],
    /// Generation per slot, bumped every time the slot is released.
    generations: [u16; MAX_TIMERS],
    created: u32,
    released: u32,
}

impl<C: Clock> Scheduler<C> {
    pub fn new(clock: C) -> Self {
        Self {
            clock,
            slots: Default::default(),
            generations: [0; MAX_TIMERS],
            created: 0,
            released: 0,
        }
    }

    /// Register a timer that fires every `period`, first after one period.
    pub fn register_periodic(
        &mut self,
        source: TimerSource,
        period: Duration,
    ) -> Result<TimerHandle, SchedulerError> {
        if period.is_zero() {
            return Err(SchedulerError::InvalidPeriod);
        }
        self.insert(source, TimerKind::Periodic(period), period)
    }

    /// Register a timer that fires once after `delay`.
    pub fn register_one_shot(
        &mut self,
        source: TimerSource,
        delay: Duration,
    ) -> Result<TimerHandle, SchedulerError> {
        self.insert(source, TimerKind::OneShot, delay)
    }

    /// Change a periodic timer's period and re-arm it one new period from now.
    /// Pending expirations are kept.
    pub fn set_period(&mut self, handle: TimerHandle, period: Duration) -> Result<(), SchedulerError> {
        if period.is_zero() {
            return Err(SchedulerError::InvalidPeriod);
        }
        let now = self.clock.now();
        let entry = self.entry_mut(handle).ok_or(SchedulerError::StaleHandle)?;
        match entry.kind {
            TimerKind::Periodic(_) => {
                entry.kind = TimerKind::Periodic(period);
                entry.deadline = Some(now + period);
                debug!("Scheduler: {:?} period set to {:?}", entry.source, period);
                Ok(())
            }
            TimerKind::OneShot => Err(SchedulerError::NotPeriodic),
        }
    }

    /// Release a timer.  Returns `false` (and does nothing) for a handle
    /// that is already released.
    pub fn cancel(&mut self, handle: TimerHandle) -> bool {
        if self.entry_mut(handle).is_none() {
            return false;
        }
        self.release(handle.slot as usize);
        true
    }

    /// Acknowledge the pending expirations of a timer and return how many
    /// there were.  A consumed one-shot is released.
    pub fn consume(&mut self, handle: TimerHandle) -> Result<u32, SchedulerError> {
        let entry = self.entry_mut(handle).ok_or(SchedulerError::StaleHandle)?;
        if entry.pending == 0 {
            return Err(SchedulerError::NothingToConsume);
        }
        let count = core::mem::take(&mut entry.pending);
        if entry.kind == TimerKind::OneShot && entry.deadline.is_none() {
            self.release(handle.slot as usize);
        }
        Ok(count)
    }

    /// Block until at least one timer is due or `shutdown` is raised, then
    /// collect every due timer into one batch.
    ///
    /// Periodic timers are re-armed on their own grid; if the loop fell
    /// behind, the missed expirations accumulate in the pending count.
    pub fn run(&mut self, shutdown: &ShutdownFlag) -> Result<RunOutcome, SchedulerError> {
        if shutdown.is_requested() {
            return Ok(RunOutcome::Interrupted);
        }

        let next = self.next_deadline();
        if self.clock.wait_until(next, shutdown)? == WaitOutcome::Interrupted
            || shutdown.is_requested()
        {
            return Ok(RunOutcome::Interrupted);
        }

        let now = self.clock.now();
        let mut batch = Batch::new();

        for (idx, slot) in self.slots.iter_mut().enumerate() {
            let Some(entry) = slot else { continue };
            let Some(deadline) = entry.deadline else { continue };
            if deadline > now {
                continue;
            }

            match entry.kind {
                TimerKind::Periodic(period) => {
                    let missed = ((now - deadline).as_nanos() / period.as_nanos())
                        .min(u128::from(u32::MAX - 1)) as u32;
                    entry.pending = entry.pending.saturating_add(missed + 1);
                    entry.deadline = Some(deadline + period * (missed + 1));
                }
                TimerKind::OneShot => {
                    entry.pending = entry.pending.saturating_add(1);
                    entry.deadline = None;
                }
            }

            // Capacity matches the slot table.
            let _ = batch.push(Expired {
                handle: TimerHandle {
                    slot: idx as u8,
                    generation: entry.generation,
                },
                source: entry.source,
            });
        }

        Ok(RunOutcome::Dispatch(batch))
    }

    /// Release every live timer.  Returns how many were released.
    pub fn shutdown(&mut self) -> usize {
        let mut count = 0;
        for idx in 0..MAX_TIMERS {
            if self.slots[idx].is_some() {
                self.release(idx);
                count += 1;
            }
        }
        if count > 0 {
            info!("Scheduler: released {} timer(s)", count);
        }
        count
    }

    // ── Queries ───────────────────────────────────────────────

    /// Current clock reading.
    pub fn now(&self) -> Duration {
        self.clock.now()
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    /// Whether `handle` still names a live timer.
    pub fn is_live(&self, handle: TimerHandle) -> bool {
        self.entry(handle).is_some()
    }

    /// Period of a live periodic timer.
    pub fn period(&self, handle: TimerHandle) -> Option<Duration> {
        match self.entry(handle)?.kind {
            TimerKind::Periodic(period) => Some(period),
            TimerKind::OneShot => None,
        }
    }

    /// Next expiry of a live, armed timer.
    pub fn deadline(&self, handle: TimerHandle) -> Option<Duration> {
        self.entry(handle)?.deadline
    }

    /// Number of live timers.
    pub fn live_count(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }

    /// Timers registered since construction.
    pub fn created_count(&self) -> u32 {
        self.created
    }

    /// Timers released since construction.
    pub fn released_count(&self) -> u32 {
        self.released
    }

    // ── Internal ──────────────────────────────────────────────

    fn insert(
        &mut self,
        source: TimerSource,
        kind: TimerKind,
        first: Duration,
    ) -> Result<TimerHandle, SchedulerError> {
        let idx = self
            .slots
            .iter()
            .position(Option::is_none)
            .ok_or(SchedulerError::Full)?;
        let generation = self.generations[idx];
        self.slots[idx] = Some(TimerEntry {
            source,
            kind,
            deadline: Some(self.clock.now() + first),
            pending: 0,
            generation,
        });
        self.created += 1;
        debug!("Scheduler: {:?} {:?} at slot {}", source, kind, idx);
        Ok(TimerHandle {
            slot: idx as u8,
            generation,
        })
    }

    fn release(&mut self, idx: usize) {
        if self.slots[idx].take().is_some() {
            self.generations[idx] = self.generations[idx].wrapping_add(1);
            self.released += 1;
        }
    }

    fn entry(&self, handle: TimerHandle) -> Option<&TimerEntry> {
        self.slots
            .get(handle.slot as usize)?
            .as_ref()
            .filter(|e| e.generation == handle.generation)
    }

    fn entry_mut(&mut self, handle: TimerHandle) -> Option<&mut TimerEntry> {
        self.slots
            .get_mut(handle.slot as usize)?
            .as_mut()
            .filter(|e| e.generation == handle.generation)
    }

    fn next_deadline(&self) -> Option<Duration> {
        self.slots
            .iter()
            .flatten()
            .filter_map(|e| e.deadline)
            .min()
    }
}

// ═══════════════════════════════════════════════════════════════
//  Tests
// ═══════════════════════════════════════════════════════════════
