//! Tick-merging sample buffer
//!
//! Channel readings arrive independently. Each one is parked under its
//! tick until position, orientation and motion are all present, at which
//! point a single [`CompositeRecord`] is appended and the partial state is
//! discarded. Records are kept in completion order.

use super::channel::Channel;
use super::samples::{CompositeRecord, MotionSample, OrientationSample, PositionSample, Tick};
use std::collections::{BTreeMap, HashSet};

/// Default cap on ticks waiting for missing channels
pub const DEFAULT_MAX_PENDING_TICKS: usize = 4096;

#[derive(Debug, Default, Clone)]
struct PartialTick {
    position: Option<PositionSample>,
    orientation: Option<OrientationSample>,
    motion: Option<MotionSample>,
}

impl PartialTick {
    fn complete(&self) -> Option<CompositeRecord> {
        Some(CompositeRecord {
            position: self.position?,
            orientation: self.orientation?,
            motion: self.motion?,
        })
    }

    fn missing(&self) -> Vec<Channel> {
        let mut missing = Vec::new();
        if self.position.is_none() {
            missing.push(Channel::Position);
        }
        if self.orientation.is_none() {
            missing.push(Channel::Orientation);
        }
        if self.motion.is_none() {
            missing.push(Channel::Motion);
        }
        missing
    }
}

/// Append-only store of composite records
#[derive(Debug)]
pub struct SampleBuffer {
    records: Vec<CompositeRecord>,
    pending: BTreeMap<Tick, PartialTick>,
    /// Ticks already emitted; late duplicates for these are ignored
    emitted: HashSet<Tick>,
    max_pending: usize,
}

impl SampleBuffer {
    pub fn new() -> Self {
        Self::with_max_pending(DEFAULT_MAX_PENDING_TICKS)
    }

    /// Create a buffer that holds at most `max_pending` incomplete ticks.
    /// When the limit is hit the oldest incomplete tick is dropped.
    pub fn with_max_pending(max_pending: usize) -> Self {
        Self {
            records: Vec::new(),
            pending: BTreeMap::new(),
            emitted: HashSet::new(),
            max_pending: max_pending.max(1),
        }
    }

    /// Submit a position fix for `tick`. Returns true when this completed the tick.
    pub fn submit_position(&mut self, tick: Tick, sample: PositionSample) -> bool {
        self.submit(tick, Channel::Position, |partial| partial.position = Some(sample))
    }

    /// Submit a gyroscope reading for `tick`. Returns true when this completed the tick.
    pub fn submit_orientation(&mut self, tick: Tick, sample: OrientationSample) -> bool {
        self.submit(tick, Channel::Orientation, |partial| {
            partial.orientation = Some(sample)
        })
    }

    /// Submit an accelerometer reading for `tick`. Returns true when this completed the tick.
    pub fn submit_motion(&mut self, tick: Tick, sample: MotionSample) -> bool {
        self.submit(tick, Channel::Motion, |partial| partial.motion = Some(sample))
    }

    fn submit<F>(&mut self, tick: Tick, channel: Channel, apply: F) -> bool
    where
        F: FnOnce(&mut PartialTick),
    {
        if self.emitted.contains(&tick) {
            tracing::trace!(
                "Ignoring late {} reading for completed tick {}",
                channel,
                tick.seconds()
            );
            return false;
        }

        if !self.pending.contains_key(&tick) && self.pending.len() >= self.max_pending {
            if let Some((oldest, partial)) = self.pending.pop_first() {
                tracing::warn!(
                    "Pending tick limit ({}) reached, dropping tick {} missing {:?}",
                    self.max_pending,
                    oldest.seconds(),
                    partial.missing()
                );
            }
        }

        let partial = self.pending.entry(tick).or_default();
        apply(partial);

        match partial.complete() {
            Some(record) => {
                self.pending.remove(&tick);
                self.emitted.insert(tick);
                self.records.push(record);
                tracing::trace!("Tick {} complete ({} records)", tick.seconds(), self.records.len());
                true
            }
            None => false,
        }
    }

    /// Completed records in arrival order
    pub fn records(&self) -> &[CompositeRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Number of ticks still waiting on at least one channel
    pub fn pending_ticks(&self) -> usize {
        self.pending.len()
    }

    /// Drop every incomplete tick, returning how many were dropped
    pub fn discard_pending(&mut self) -> usize {
        let dropped = self.pending.len();
        for (tick, partial) in std::mem::take(&mut self.pending) {
            tracing::debug!("Dropping incomplete tick {} missing {:?}", tick.seconds(), partial.missing());
        }
        dropped
    }

    /// Take every completed record, leaving the buffer empty
    pub fn drain(&mut self) -> Vec<CompositeRecord> {
        self.pending.clear();
        self.emitted.clear();
        std::mem::take(&mut self.records)
    }
}

impl Default for SampleBuffer {
    fn default() -> Self {
        Self::new()
    }
}
