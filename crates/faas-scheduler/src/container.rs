//! The container record a [`crate::pool::Pool`] tracks.
//!
//! A `Container` wraps a [`ContainerHandle`] from the runtime adapter with
//! the scheduler's own lifecycle state. The adapter knows nothing about
//! `Idle`/`Busy`/`Reclaiming`; that's pool bookkeeping layered on top.

use std::time::Instant;

use faas_runtime::ContainerHandle;

/// Lifecycle state of a tracked container.
///
/// The full trajectory is a prefix of
/// `Starting -> Idle -> (Busy <-> Idle)* -> Reclaiming -> Destroyed`.
/// `Starting` is represented by the pool's reservation counter rather than
/// a concrete `Container` value — no handle exists yet while a container is
/// starting, so there is nothing to tag with this state until `launch`
/// returns. It is still part of this enum because callers that observe a
/// pool's counters (e.g. the `/stats` endpoint) report it alongside the
/// states below.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContainerState {
    /// Reserved a capacity slot; no handle yet (tracked as a pool counter,
    /// never as a `Container` value — see the module docs above).
    Starting,
    /// Idle and available for reuse.
    Idle,
    /// Currently serving an invocation.
    Busy,
    /// Selected by the janitor for destruction; removed from `idle`.
    Reclaiming,
    /// Destroyed and no longer tracked by any pool.
    Destroyed,
}

/// A container tracked by a pool, combining the runtime handle with
/// scheduler-owned lifecycle state.
#[derive(Debug, Clone)]
pub struct Container {
    /// The runtime-level handle (id, function, endpoint).
    pub handle: ContainerHandle,
    /// Current lifecycle state.
    pub state: ContainerState,
    /// Wall-clock instant of the most recent `Busy -> Idle` transition, or
    /// of launch completion if the container has never been idle yet.
    pub last_used_at: Instant,
}

impl Container {
    /// A freshly cold-started container: it goes straight to `Busy` (the
    /// caller that launched it is about to invoke it), with `last_used_at`
    /// set to launch completion as the spec prescribes for a never-used
    /// container.
    pub fn new_busy(handle: ContainerHandle, now: Instant) -> Self {
        Self {
            handle,
            state: ContainerState::Busy,
            last_used_at: now,
        }
    }

    /// Mark this container idle as of `now`, the instant it was released.
    pub fn mark_idle(&mut self, now: Instant) {
        self.state = ContainerState::Idle;
        self.last_used_at = now;
    }

    /// Mark this container busy again, handed directly to a waiter without
    /// passing through `idle` (`last_used_at` is deliberately left alone —
    /// the container never became idle).
    pub fn mark_busy_via_handoff(&mut self) {
        self.state = ContainerState::Busy;
    }
}
