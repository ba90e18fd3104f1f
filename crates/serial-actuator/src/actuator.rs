use crate::config::ActuatorConfig;
use crate::pipeline::InputPipeline;
use crate::status::StatusReporter;
use actuator_protocol::{ActuatorError, ActuatorEvent, ActuatorState, SharedActuatorState};
use core_types::{
    actuator_debug, actuator_error, actuator_info, actuator_warn, ActuatorSwitch, DataHandler,
    ErrorHandler, SwitchHandle, Transport,
};
use framing::LineFramer;
use futures_channel::mpsc;
use std::sync::Arc;
use switch_mapper::{EventSink, MapperStats, SwitchEventMapper, SwitchRegistry, SwitchTable};

/// SerialActuator drives the lifecycle of one serial switch input
///
/// Responsibilities:
/// - Open the transport on `init` and close it on `dispose`
/// - Own the state machine (`Stopped` → `Running` ⇄ `Paused` → `Stopped`)
/// - Route transport bytes into the [`InputPipeline`]
/// - Stop and report to the host when the transport fails
///
/// ## State Machine
///
/// See `actuator-protocol/src/state.rs` for the transition diagram. The
/// mapper reads the same [`SharedActuatorState`], so a completed `pause`
/// is observed by the very next line.
///
/// A disposed actuator stays disposed: `init` and `resume` fail with
/// [`ActuatorError::Disposed`].
pub struct SerialActuator<T: Transport> {
    config: ActuatorConfig,
    transport: T,
    pipeline: Arc<InputPipeline>,
    state: SharedActuatorState,
    status: Arc<StatusReporter>,
    disposed: bool,
}

impl<T: Transport> SerialActuator<T> {
    /// Build an actuator. Nothing is opened until [`init`](Self::init).
    ///
    /// # Arguments
    /// * `registry` - Where the switch is looked up on every emission
    /// * `sink` - The host's switch event entry points
    /// * `status_tx` - Channel for lifecycle and diagnostic events
    pub fn new(
        config: ActuatorConfig,
        transport: T,
        registry: Arc<dyn SwitchRegistry>,
        sink: Arc<dyn EventSink>,
        status_tx: mpsc::Sender<ActuatorEvent>,
    ) -> Result<Self, ActuatorError> {
        config.validate()?;

        let state = SharedActuatorState::new(ActuatorState::Stopped);
        let status = Arc::new(StatusReporter::new(status_tx));
        let mapper = SwitchEventMapper::new(
            config.switch_source.clone(),
            Box::new(config.vocabulary.clone()),
            registry,
            sink,
            state.clone(),
        );
        let framer = LineFramer::with_max_line_len(config.max_line_len);
        let pipeline = Arc::new(InputPipeline::new(framer, mapper, Arc::clone(&status)));

        Ok(Self {
            config,
            transport,
            pipeline,
            state,
            status,
            disposed: false,
        })
    }

    /// Open the transport and start forwarding events.
    ///
    /// On failure the actuator stays `Stopped` and may be initialized again.
    pub fn init(&mut self) -> Result<(), ActuatorError> {
        if self.disposed {
            return Err(ActuatorError::Disposed);
        }
        if self.transport.is_open() {
            return Err(ActuatorError::InvalidTransition(format!(
                "Actuator on {} is already initialized",
                self.transport.name()
            )));
        }

        let pipeline = Arc::clone(&self.pipeline);
        let on_data: DataHandler =
            Arc::new(move |bytes: &[u8], timestamp_us: u64| pipeline.on_data(bytes, timestamp_us));
        let on_error = self.transport_failure_handler();

        self.transport.open(on_data, on_error).map_err(|e| {
            actuator_error!("Failed to open {}: {}", self.transport.name(), e);
            ActuatorError::Transport(format!(
                "Failed to open serial port {}: {}. Check the port name and that no other program holds it.",
                self.transport.name(),
                e
            ))
        })?;

        if let Err(e) = self.transition(ActuatorState::Running) {
            self.close_transport();
            return Err(e);
        }

        actuator_info!(
            "Serial actuator running on {} at {} baud",
            self.transport.name(),
            self.config.serial.baud_rate
        );
        Ok(())
    }

    /// Keep the port open but stop forwarding events.
    pub fn pause(&self) -> Result<(), ActuatorError> {
        if self.disposed {
            return Err(ActuatorError::Disposed);
        }
        self.transition(ActuatorState::Paused)
    }

    /// Forward events again.
    ///
    /// Only a paused (or already running) actuator can resume. A stopped one
    /// was never initialized or lost its transport, and needs `init`.
    pub fn resume(&self) -> Result<(), ActuatorError> {
        if self.disposed {
            return Err(ActuatorError::Disposed);
        }
        let old_state = self.state.transition_if_started(ActuatorState::Running)?;
        self.report_transition(old_state, ActuatorState::Running);
        Ok(())
    }

    /// Stop, close the transport and discard any buffered partial line.
    ///
    /// Idempotent. Called automatically on drop.
    pub fn dispose(&mut self) {
        if self.disposed {
            return;
        }
        self.disposed = true;

        // Stop first so lines still in flight are dropped, then close so no
        // new chunk can arrive, then release the buffer.
        let previous = self.state.stop();
        self.close_transport();

        let discarded = self.pipeline.discard_pending();
        if discarded > 0 {
            actuator_debug!("Discarded {} buffered bytes on dispose", discarded);
        }

        if previous != ActuatorState::Stopped {
            self.status.report(ActuatorEvent::StateChanged {
                state: ActuatorState::Stopped,
            });
        }
        actuator_info!("Serial actuator on {} disposed", self.transport.name());
    }

    /// Feed bytes as if they had arrived from the transport.
    ///
    /// This is what the transport's data callback runs; hosts with their
    /// own I/O loop may call it directly.
    pub fn on_data(&self, bytes: &[u8], timestamp_us: u64) {
        self.pipeline.on_data(bytes, timestamp_us);
    }

    /// Register this actuator's switch with the host registry.
    pub fn register_switches(&self, table: &SwitchTable) -> SwitchHandle {
        table.register(self.default_switch())
    }

    pub fn default_switch(&self) -> ActuatorSwitch {
        self.config.default_switch()
    }

    pub fn state(&self) -> ActuatorState {
        self.state.load()
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    /// Bytes buffered for a line that has not been terminated yet.
    pub fn pending_bytes(&self) -> usize {
        self.pipeline.pending_bytes()
    }

    pub fn stats(&self) -> MapperStats {
        self.pipeline.stats()
    }

    pub fn config(&self) -> &ActuatorConfig {
        &self.config
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    fn transition(&self, new_state: ActuatorState) -> Result<(), ActuatorError> {
        let old_state = self.state.transition(new_state)?;
        self.report_transition(old_state, new_state);
        Ok(())
    }

    fn report_transition(&self, old_state: ActuatorState, new_state: ActuatorState) {
        if old_state != new_state {
            actuator_debug!("SerialActuator: {:?} → {:?}", old_state, new_state);
            self.status
                .report(ActuatorEvent::StateChanged { state: new_state });
        }
    }

    /// Transport failure is fatal to `Running`: stop and tell the host.
    /// No retry happens here; the host decides whether to re-create the actuator.
    fn transport_failure_handler(&self) -> ErrorHandler {
        let state = self.state.clone();
        let status = Arc::clone(&self.status);
        let port = self.transport.name().to_string();

        Arc::new(move |err| {
            let previous = state.stop();
            actuator_error!("Serial transport {} failed: {}", port, err);
            status.report(ActuatorEvent::Error {
                message: format!(
                    "Serial port {} failed: {}. The actuator has stopped; dispose it and initialize a new one to reconnect.",
                    port, err
                ),
            });
            if previous != ActuatorState::Stopped {
                status.report(ActuatorEvent::StateChanged {
                    state: ActuatorState::Stopped,
                });
            }
        })
    }

    fn close_transport(&mut self) {
        if let Err(e) = self.transport.close() {
            actuator_warn!("Failed to close {}: {}", self.transport.name(), e);
        }
    }
}

impl<T: Transport> Drop for SerialActuator<T> {
    fn drop(&mut self) {
        self.dispose();
    }
}
