use crate::status::StatusReporter;
use actuator_protocol::ActuatorEvent;
use core_types::actuator_warn;
use framing::{FramingError, LineFramer};
use parking_lot::ReentrantMutex;
use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::sync::Arc;
use switch_mapper::{MapperStats, SwitchEventMapper};

struct FramerSlot {
    framer: RefCell<LineFramer>,
    // Chunks delivered from inside a sink while a pass is running
    queued: RefCell<VecDeque<(Vec<u8>, u64)>>,
    in_pass: Cell<bool>,
}

/// Clears `in_pass` even if the sink panics.
struct PassGuard<'a>(&'a Cell<bool>);

impl Drop for PassGuard<'_> {
    fn drop(&mut self) {
        self.0.set(false);
    }
}

/// Bytes in, switch events out.
///
/// This is the body of the transport's data callback. The framer lock is
/// held for the whole pass over a chunk, including mapping, so chunks
/// delivered by overlapping notifications are framed and mapped strictly
/// one after the other and their lines keep arrival order.
///
/// The lock is re-entrant. A sink that feeds bytes back in from its own
/// thread does not deadlock: its chunk is queued and framed right after the
/// chunk currently being processed, before `on_data` returns.
pub struct InputPipeline {
    slot: ReentrantMutex<FramerSlot>,
    mapper: SwitchEventMapper,
    status: Arc<StatusReporter>,
}

impl InputPipeline {
    pub fn new(framer: LineFramer, mapper: SwitchEventMapper, status: Arc<StatusReporter>) -> Self {
        Self {
            slot: ReentrantMutex::new(FramerSlot {
                framer: RefCell::new(framer),
                queued: RefCell::new(VecDeque::new()),
                in_pass: Cell::new(false),
            }),
            mapper,
            status,
        }
    }

    /// Frame a chunk and map every completed line.
    pub fn on_data(&self, chunk: &[u8], timestamp_us: u64) {
        let slot = self.slot.lock();
        if slot.in_pass.get() {
            slot.queued.borrow_mut().push_back((chunk.to_vec(), timestamp_us));
            return;
        }

        slot.in_pass.set(true);
        let _pass = PassGuard(&slot.in_pass);

        self.run_chunk(&slot, chunk, timestamp_us);
        loop {
            let next = slot.queued.borrow_mut().pop_front();
            let Some((bytes, ts)) = next else {
                break;
            };
            self.run_chunk(&slot, &bytes, ts);
        }
    }

    fn run_chunk(&self, slot: &FramerSlot, chunk: &[u8], timestamp_us: u64) {
        // Framer borrow ends before any sink runs
        let items: Vec<_> = slot.framer.borrow_mut().feed(chunk, timestamp_us).collect();

        for item in items {
            match item {
                Ok(line) => {
                    self.mapper.process(&line);
                }
                Err(FramingError::LineTooLong { discarded, max }) => {
                    actuator_warn!(discarded, max, "Discarded overlong line from serial input");
                    self.status
                        .report(ActuatorEvent::FramingError { discarded, max });
                }
            }
        }
    }

    /// Throw away any buffered partial line, returning how many bytes it had.
    pub fn discard_pending(&self) -> usize {
        let slot = self.slot.lock();
        slot.queued.borrow_mut().clear();
        let mut framer = slot.framer.borrow_mut();
        let pending = framer.pending_len();
        framer.reset();
        pending
    }

    pub fn pending_bytes(&self) -> usize {
        self.slot.lock().framer.borrow().pending_len()
    }

    pub fn mapper(&self) -> &SwitchEventMapper {
        &self.mapper
    }

    pub fn stats(&self) -> MapperStats {
        self.mapper.stats()
    }
}
