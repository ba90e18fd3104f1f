use actuator_protocol::{ActuatorError, ActuatorEvent, SerialConfig};
use clap::Parser;
use futures::StreamExt;
use futures_channel::mpsc;
use serial_actuator::{ActuatorConfig, SerialActuator};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use switch_mapper::{ChannelSink, SwitchTable};
use tracing_subscriber::EnvFilter;
use transport_native::SerialTransport;

/// Log filter used when `RUST_LOG` is unset or unparsable
const DEFAULT_LOG_FILTER: &str = "info";

/// Capacity of the switch event channel between the reader thread and the log loop
const EVENT_CHANNEL_CAPACITY: usize = 256;

/// Read newline-delimited signals from a serial port and log the switch
/// events they produce.
#[derive(Parser, Debug)]
#[command(name = "serial-switch", version)]
struct Args {
    /// JSON config file; flags below override its values
    #[arg(long)]
    config: Option<PathBuf>,

    /// Serial device (e.g. /dev/ttyUSB0 or COM3)
    #[arg(long)]
    port: Option<String>,

    /// Baud rate
    #[arg(long)]
    baud: Option<u32>,

    /// Character framing such as 8N1 or 7E2
    #[arg(long)]
    framing: Option<String>,

    /// Longest accepted line in bytes
    #[arg(long)]
    max_line_len: Option<usize>,
}

fn main() -> ExitCode {
    let args = Args::parse();

    let directives = std::env::var(EnvFilter::DEFAULT_ENV).ok();
    tracing_subscriber::fmt()
        .with_env_filter(log_filter(directives.as_deref()))
        .with_target(false)
        .init();

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

/// `RUST_LOG` directives as given, falling back to `info`.
fn log_filter(directives: Option<&str>) -> EnvFilter {
    directives
        .and_then(|d| EnvFilter::try_new(d).ok())
        .unwrap_or_else(|| EnvFilter::new(DEFAULT_LOG_FILTER))
}

fn run(args: Args) -> Result<(), ActuatorError> {
    let config = load_config(&args)?;

    let table = Arc::new(SwitchTable::new());
    let (sink, events) = ChannelSink::channel(EVENT_CHANNEL_CAPACITY);
    let (status_tx, status) = mpsc::channel(config.status_channel_capacity);
    let transport = SerialTransport::new(config.port_name.clone(), config.serial.clone());

    let mut actuator = SerialActuator::new(config, transport, table.clone(), Arc::new(sink), status_tx)?;
    let switch = actuator.register_switches(&table);
    tracing::info!(source = %switch.source, command = %switch.command, "Registered switch");

    actuator.init()?;
    let outcome = futures::executor::block_on(log_events(events, status));
    actuator.dispose();
    outcome
}

/// Log switch and status events until the actuator reports an error.
async fn log_events(
    events: mpsc::Receiver<core_types::SwitchEvent>,
    status: mpsc::Receiver<ActuatorEvent>,
) -> Result<(), ActuatorError> {
    let mut events = events.fuse();
    let mut status = status.fuse();

    loop {
        futures::select! {
            event = events.next() => match event {
                Some(event) => tracing::info!(
                    kind = event.kind.as_str(),
                    source = event.source(),
                    timestamp_us = event.timestamp_us,
                    "Switch event"
                ),
                None => return Ok(()),
            },
            update = status.next() => match update {
                Some(ActuatorEvent::Error { message }) => return Err(ActuatorError::Transport(message)),
                Some(ActuatorEvent::StateChanged { state }) => {
                    tracing::info!(?state, "Actuator state changed");
                }
                Some(ActuatorEvent::FramingError { discarded, max }) => {
                    tracing::warn!(discarded, max, "Discarded overlong line");
                }
                None => return Ok(()),
            },
        }
    }
}

fn load_config(args: &Args) -> Result<ActuatorConfig, ActuatorError> {
    let mut config = match &args.config {
        Some(path) => {
            let text = std::fs::read_to_string(path).map_err(|e| {
                ActuatorError::Config(format!("Failed to read {}: {}", path.display(), e))
            })?;
            serde_json::from_str(&text).map_err(|e| {
                ActuatorError::Config(format!("Invalid config {}: {}", path.display(), e))
            })?
        }
        None => ActuatorConfig::default(),
    };

    if let Some(port) = &args.port {
        config.port_name = port.clone();
    }
    if let Some(framing) = &args.framing {
        let parsed = SerialConfig::from_framing(framing, config.serial.baud_rate).ok_or_else(|| {
            ActuatorError::Config(format!("Unrecognized framing {:?} - expected e.g. 8N1", framing))
        })?;
        config.serial = SerialConfig {
            flow_control: config.serial.flow_control,
            ..parsed
        };
    }
    if let Some(baud) = args.baud {
        config.serial.baud_rate = baud;
    }
    if let Some(max) = args.max_line_len {
        config.max_line_len = Some(max);
    }

    config.validate()?;
    Ok(config)
}
