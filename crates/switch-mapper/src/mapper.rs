use crate::registry::SwitchRegistry;
use crate::sink::EventSink;
use crate::vocabulary::SignalClassifier;
use actuator_protocol::SharedActuatorState;
use core_types::{actuator_debug, actuator_trace, Line, SwitchEvent, SwitchEventKind};
use parking_lot::ReentrantMutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Counters kept by the mapper, readable at any time for diagnostics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MapperStats {
    /// Events handed to the sink
    pub emitted: u64,
    /// Lines that matched no signal
    pub ignored: u64,
    /// Signals dropped because the actuator was not running
    pub dropped_inactive: u64,
    /// Signals dropped because no switch with the source was registered
    pub dropped_unregistered: u64,
}

#[derive(Default)]
struct Counters {
    emitted: AtomicU64,
    ignored: AtomicU64,
    dropped_inactive: AtomicU64,
    dropped_unregistered: AtomicU64,
}

impl Counters {
    fn bump(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    fn snapshot(&self) -> MapperStats {
        MapperStats {
            emitted: self.emitted.load(Ordering::Relaxed),
            ignored: self.ignored.load(Ordering::Relaxed),
            dropped_inactive: self.dropped_inactive.load(Ordering::Relaxed),
            dropped_unregistered: self.dropped_unregistered.load(Ordering::Relaxed),
        }
    }
}

/// SwitchEventMapper turns classified lines into host switch events
///
/// Responsibilities:
/// - Classify each line (unrecognized lines are ignored silently)
/// - Gate emission on the shared actuator state (only `Running` emits)
/// - Resolve the switch by source name (unregistered means no event)
/// - Hand exactly one event per qualifying line to the sink
///
/// The state read, the lookup and the sink call form one emission pass
/// guarded by a re-entrant lock. Passes from different threads never
/// interleave their host notifications, while a sink that calls back into
/// the mapper on its own thread (`process`, `trigger`, `stats`) runs its
/// nested pass immediately instead of deadlocking. The mapper only reads
/// the actuator state; it never transitions it.
pub struct SwitchEventMapper {
    source: String,
    classifier: Box<dyn SignalClassifier>,
    registry: Arc<dyn SwitchRegistry>,
    sink: Arc<dyn EventSink>,
    state: SharedActuatorState,

    // Held for the whole emission pass
    emission: ReentrantMutex<()>,
    counters: Counters,
}

impl SwitchEventMapper {
    pub fn new(
        source: impl Into<String>,
        classifier: Box<dyn SignalClassifier>,
        registry: Arc<dyn SwitchRegistry>,
        sink: Arc<dyn EventSink>,
        state: SharedActuatorState,
    ) -> Self {
        Self {
            source: source.into(),
            classifier,
            registry,
            sink,
            state,
            emission: ReentrantMutex::new(()),
            counters: Counters::default(),
        }
    }

    /// Interpret one line and emit at most one event for it.
    ///
    /// Returns the kind of event handed to the sink, or None when the line
    /// was ignored or dropped.
    pub fn process(&self, line: &Line) -> Option<SwitchEventKind> {
        let Some(kind) = self.classifier.classify(line.as_bytes()) else {
            Counters::bump(&self.counters.ignored);
            actuator_trace!("Ignoring line {:?}", line.to_string_lossy());
            return None;
        };
        self.emit(kind, line.timestamp_us)
    }

    pub fn activate(&self, timestamp_us: u64) -> Option<SwitchEventKind> {
        self.emit(SwitchEventKind::Activate, timestamp_us)
    }

    pub fn deactivate(&self, timestamp_us: u64) -> Option<SwitchEventKind> {
        self.emit(SwitchEventKind::Deactivate, timestamp_us)
    }

    pub fn trigger(&self, timestamp_us: u64) -> Option<SwitchEventKind> {
        self.emit(SwitchEventKind::Trigger, timestamp_us)
    }

    /// Source name of the switch this mapper emits for.
    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn classifier(&self) -> &dyn SignalClassifier {
        self.classifier.as_ref()
    }

    /// Never blocks, so it is safe to call from inside a sink.
    pub fn stats(&self) -> MapperStats {
        self.counters.snapshot()
    }

    fn emit(&self, kind: SwitchEventKind, timestamp_us: u64) -> Option<SwitchEventKind> {
        // Not poisoned by a panicking sink: the guard is released on unwind
        let _pass = self.emission.lock();

        let state = self.state.load();
        if !state.is_running() {
            Counters::bump(&self.counters.dropped_inactive);
            actuator_trace!("Dropping {} signal while {:?}", kind.as_str(), state);
            return None;
        }

        let Some(switch) = self.registry.find(&self.source) else {
            Counters::bump(&self.counters.dropped_unregistered);
            actuator_debug!(
                "Dropping {} signal: no switch registered for source {}",
                kind.as_str(),
                self.source
            );
            return None;
        };

        let event = SwitchEvent::new(kind, switch, timestamp_us);
        self.sink.dispatch(&event);
        Counters::bump(&self.counters.emitted);

        actuator_debug!("{} → {}", kind.as_str(), self.source);
        Some(kind)
    }
}

#[cfg(test)]
#[allow(clippy::panic, clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use crate::registry::SwitchTable;
    use crate::vocabulary::SignalVocabulary;
    use actuator_protocol::ActuatorState;
    use core_types::ActuatorSwitch;
    use std::sync::atomic::{AtomicBool, AtomicUsize};
    use std::sync::{mpsc, Mutex, OnceLock, Weak};
    use std::time::Duration;

    #[derive(Default)]
    struct RecordingSink {
        events: Mutex<Vec<SwitchEvent>>,
        in_flight: AtomicUsize,
        max_in_flight: AtomicUsize,
    }

    impl RecordingSink {
        fn record(&self, event: &SwitchEvent) {
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_in_flight.fetch_max(now, Ordering::SeqCst);
            std::thread::yield_now();
            self.events.lock().unwrap().push(event.clone());
            self.in_flight.fetch_sub(1, Ordering::SeqCst);
        }

        fn kinds(&self) -> Vec<SwitchEventKind> {
            self.events.lock().unwrap().iter().map(|e| e.kind).collect()
        }
    }

    impl EventSink for RecordingSink {
        fn on_activate(&self, event: &SwitchEvent) {
            self.record(event);
        }
        fn on_deactivate(&self, event: &SwitchEvent) {
            self.record(event);
        }
        fn on_trigger(&self, event: &SwitchEvent) {
            self.record(event);
        }
    }

    struct Fixture {
        mapper: SwitchEventMapper,
        sink: Arc<RecordingSink>,
        table: Arc<SwitchTable>,
        state: SharedActuatorState,
    }

    fn fixture(initial: ActuatorState) -> Fixture {
        let sink = Arc::new(RecordingSink::default());
        let table = Arc::new(SwitchTable::new());
        table.register(ActuatorSwitch::new("SerSwi", "Serial Input Reader", "CmdMainMenu"));
        let state = SharedActuatorState::new(initial);
        let mapper = SwitchEventMapper::new(
            "SerSwi",
            Box::new(SignalVocabulary::default()),
            table.clone(),
            sink.clone(),
            state.clone(),
        );
        Fixture {
            mapper,
            sink,
            table,
            state,
        }
    }

    fn line(text: &str) -> Line {
        Line::new(text.as_bytes().to_vec(), 7)
    }

    #[test]
    fn test_trigger_line_emits_once() {
        let f = fixture(ActuatorState::Running);
        assert_eq!(f.mapper.process(&line("xyz=false")), Some(SwitchEventKind::Trigger));

        let events = f.sink.events.lock().unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].source(), "SerSwi");
        assert_eq!(events[0].timestamp_us, 7);
    }

    #[test]
    fn test_unrecognized_lines_are_ignored() {
        let f = fixture(ActuatorState::Running);
        assert_eq!(f.mapper.process(&line("abc=true")), None);
        assert_eq!(f.mapper.process(&line("")), None);
        assert!(f.sink.kinds().is_empty());
        assert_eq!(f.mapper.stats().ignored, 2);
    }

    #[test]
    fn test_identical_lines_are_not_deduplicated() {
        let f = fixture(ActuatorState::Running);
        f.mapper.process(&line("a=false"));
        f.mapper.process(&line("a=false"));
        assert_eq!(
            f.sink.kinds(),
            vec![SwitchEventKind::Trigger, SwitchEventKind::Trigger]
        );
    }

    #[test]
    fn test_paused_drops_then_resumed_emits() {
        let f = fixture(ActuatorState::Paused);
        assert_eq!(f.mapper.process(&line("x=false")), None);
        assert!(f.sink.kinds().is_empty());
        assert_eq!(f.mapper.stats().dropped_inactive, 1);

        f.state.transition(ActuatorState::Running).unwrap();
        assert_eq!(f.mapper.process(&line("x=false")), Some(SwitchEventKind::Trigger));
        assert_eq!(f.sink.kinds().len(), 1);
    }

    #[test]
    fn test_stopped_emits_nothing() {
        let f = fixture(ActuatorState::Stopped);
        assert_eq!(f.mapper.trigger(0), None);
        assert_eq!(f.mapper.activate(0), None);
        assert!(f.sink.kinds().is_empty());
    }

    #[test]
    fn test_unregistered_switch_is_silent() {
        let f = fixture(ActuatorState::Running);
        f.table.unregister("SerSwi");
        assert_eq!(f.mapper.process(&line("x=false")), None);
        assert!(f.sink.kinds().is_empty());
        assert_eq!(f.mapper.stats().dropped_unregistered, 1);
    }

    #[test]
    fn test_activate_and_deactivate_paths() {
        let f = fixture(ActuatorState::Running);
        assert_eq!(f.mapper.activate(1), Some(SwitchEventKind::Activate));
        assert_eq!(f.mapper.deactivate(2), Some(SwitchEventKind::Deactivate));
        assert_eq!(
            f.sink.kinds(),
            vec![SwitchEventKind::Activate, SwitchEventKind::Deactivate]
        );
        assert_eq!(f.mapper.stats().emitted, 2);
        assert_eq!(f.mapper.source(), "SerSwi");
        assert_eq!(f.mapper.classifier().id(), "vocabulary");
    }

    /// Sink that calls back into its own mapper from `on_trigger`.
    #[derive(Default)]
    struct CallbackSink {
        mapper: OnceLock<Weak<SwitchEventMapper>>,
        nested_line: Option<&'static str>,
        nested_done: AtomicBool,
        seen_stats: Mutex<Vec<MapperStats>>,
        timestamps: Mutex<Vec<u64>>,
    }

    impl EventSink for CallbackSink {
        fn on_activate(&self, _event: &SwitchEvent) {}
        fn on_deactivate(&self, _event: &SwitchEvent) {}
        fn on_trigger(&self, event: &SwitchEvent) {
            self.timestamps.lock().unwrap().push(event.timestamp_us);
            let Some(mapper) = self.mapper.get().and_then(Weak::upgrade) else {
                return;
            };
            self.seen_stats.lock().unwrap().push(mapper.stats());
            if let Some(text) = self.nested_line {
                if !self.nested_done.swap(true, Ordering::SeqCst) {
                    mapper.process(&Line::new(text.as_bytes().to_vec(), event.timestamp_us + 1));
                }
            }
        }
    }

    fn callback_mapper(nested_line: Option<&'static str>) -> (Arc<SwitchEventMapper>, Arc<CallbackSink>) {
        let sink = Arc::new(CallbackSink {
            nested_line,
            ..CallbackSink::default()
        });
        let table = Arc::new(SwitchTable::new());
        table.register(ActuatorSwitch::new("SerSwi", "Serial Input Reader", "CmdMainMenu"));
        let mapper = Arc::new(SwitchEventMapper::new(
            "SerSwi",
            Box::new(SignalVocabulary::default()),
            table,
            sink.clone(),
            SharedActuatorState::new(ActuatorState::Running),
        ));
        sink.mapper.set(Arc::downgrade(&mapper)).unwrap();
        (mapper, sink)
    }

    /// Run `f` on a worker thread; a deadlock fails the test instead of hanging it.
    fn within_deadline<R: Send + 'static>(f: impl FnOnce() -> R + Send + 'static) -> R {
        let (tx, rx) = mpsc::channel();
        std::thread::spawn(move || {
            let _ = tx.send(f());
        });
        rx.recv_timeout(Duration::from_secs(5))
            .unwrap_or_else(|_| panic!("emission pass did not finish"))
    }

    #[test]
    fn test_sink_may_read_stats_during_emission() {
        let (mapper, sink) = callback_mapper(None);
        let worker = mapper.clone();
        let kind = within_deadline(move || worker.process(&Line::new(b"x=false".to_vec(), 1)));

        assert_eq!(kind, Some(SwitchEventKind::Trigger));
        // Counted after dispatch returns
        assert_eq!(sink.seen_stats.lock().unwrap()[0].emitted, 0);
        assert_eq!(mapper.stats().emitted, 1);
    }

    #[test]
    fn test_sink_may_feed_ignored_line_back() {
        let (mapper, _sink) = callback_mapper(Some("abc=true"));
        let worker = mapper.clone();
        within_deadline(move || worker.process(&Line::new(b"x=false".to_vec(), 1)));

        let stats = mapper.stats();
        assert_eq!(stats.emitted, 1);
        assert_eq!(stats.ignored, 1);
    }

    #[test]
    fn test_sink_may_emit_nested_trigger() {
        let (mapper, sink) = callback_mapper(Some("again=false"));
        let worker = mapper.clone();
        within_deadline(move || worker.process(&Line::new(b"x=false".to_vec(), 1)));

        assert_eq!(*sink.timestamps.lock().unwrap(), vec![1, 2]);
        assert_eq!(mapper.stats().emitted, 2);
    }

    #[test]
    fn test_concurrent_process_serializes_emission() {
        let f = fixture(ActuatorState::Running);
        let trigger = line("t=false");

        std::thread::scope(|scope| {
            for _ in 0..8 {
                scope.spawn(|| {
                    for _ in 0..50 {
                        f.mapper.process(&trigger);
                    }
                });
            }
        });

        assert_eq!(f.sink.kinds().len(), 400);
        assert_eq!(f.sink.max_in_flight.load(Ordering::SeqCst), 1);
        assert_eq!(f.mapper.stats().emitted, 400);
    }
}
