//! FIFO queue that grows admitted wires one segment at a time.

use std::{collections::VecDeque, time::Duration};

use wirefield_core::{Epoch, Event, TipPosition, Wire, WirePiece, SEGMENT_DURATION};

use crate::occupancy::OccupancyStore;

#[derive(Clone, Debug)]
struct QueuedWire {
    wire: Wire,
    cursor: usize,
}

/// Ordered queue of wires awaiting reveal; only the head ever progresses.
#[derive(Clone, Debug, Default)]
pub(crate) struct RevealQueue {
    entries: VecDeque<QueuedWire>,
    segment_started: Option<Duration>,
}

impl RevealQueue {
    pub(crate) fn push(&mut self, wire: Wire) {
        self.entries.push_back(QueuedWire { wire, cursor: 0 });
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    pub(crate) fn head_cursor(&self) -> Option<usize> {
        self.entries.front().map(|entry| entry.cursor)
    }

    /// Performs a single animation step at monotonic time `now`.
    ///
    /// A head whose cursor reached its length is drained without touching the
    /// store; the next head starts from a fresh timer baseline on the
    /// following call. Otherwise exactly one piece is written: either the
    /// in-progress snapshot of the current segment or its completed state.
    pub(crate) fn advance(
        &mut self,
        now: Duration,
        epoch: Epoch,
        store: &mut OccupancyStore,
        out_events: &mut Vec<Event>,
    ) {
        let Some(head) = self.entries.front_mut() else {
            self.segment_started = None;
            return;
        };

        let Some(node) = head.wire.get(head.cursor).copied() else {
            let _ = self.entries.pop_front();
            self.segment_started = None;
            out_events.push(Event::WireDrained { epoch });
            return;
        };

        let started = *self.segment_started.get_or_insert(now);
        let elapsed = now.saturating_sub(started);
        let first = head.cursor == 0;

        if elapsed >= SEGMENT_DURATION {
            let last = head.cursor + 1 == head.wire.len();
            let tip = match (first, last) {
                (true, true) => TipPosition::BeginEnd,
                (true, false) => TipPosition::Begin,
                (false, true) => TipPosition::End,
                (false, false) => TipPosition::None,
            };
            let piece = WirePiece::new(node.direction, 1.0, tip);
            store.set(node.point, piece);
            head.cursor += 1;
            self.segment_started = Some(now);

            out_events.push(Event::PieceWritten {
                point: node.point,
                piece,
            });
            out_events.push(Event::SegmentCompleted {
                point: node.point,
                cursor: head.cursor,
            });
        } else {
            let fraction = elapsed.as_secs_f32() / SEGMENT_DURATION.as_secs_f32();
            let tip = if first {
                TipPosition::BeginEnd
            } else {
                TipPosition::End
            };
            let piece = WirePiece::new(node.direction, fraction, tip);
            store.set(node.point, piece);
            out_events.push(Event::PieceWritten {
                point: node.point,
                piece,
            });
        }
    }
}
