//! # Native Transport
//!
//! Serial port access for desktop hosts (Linux, macOS, Windows) through the
//! `serialport` crate.
//!
//! Reads happen on a dedicated `serial-reader` thread with a short timeout,
//! so `close` can stop the thread promptly even when the line is silent.
//! Each chunk is handed to the [`DataHandler`] together with a monotonic
//! timestamp in microseconds since the port was opened.

#![deny(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    clippy::indexing_slicing,
    clippy::todo
)]

use actuator_protocol::{FlowControl, ParityMode, SerialConfig};
use core_types::{
    actuator_debug, actuator_info, DataHandler, ErrorHandler, Transport, TransportError,
};
use std::io::{ErrorKind, Read};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

/// Read timeout; bounds how long `close` waits for the reader thread
const READ_TIMEOUT: Duration = Duration::from_millis(100);

/// Size of a single read
const READ_BUFFER_SIZE: usize = 1024;

struct ReaderHandle {
    stop: Arc<AtomicBool>,
    thread: JoinHandle<()>,
}

/// A serial port opened with [`SerialConfig`] settings.
pub struct SerialTransport {
    port_name: String,
    config: SerialConfig,
    reader: Option<ReaderHandle>,
}

impl SerialTransport {
    pub fn new(port_name: impl Into<String>, config: SerialConfig) -> Self {
        Self {
            port_name: port_name.into(),
            config,
            reader: None,
        }
    }

    pub fn config(&self) -> &SerialConfig {
        &self.config
    }

    fn open_port(&self) -> Result<Box<dyn serialport::SerialPort>, TransportError> {
        serialport::new(self.port_name.as_str(), self.config.baud_rate)
            .data_bits(data_bits(self.config.data_bits)?)
            .parity(parity(self.config.parity))
            .stop_bits(stop_bits(self.config.stop_bits)?)
            .flow_control(flow_control(self.config.flow_control))
            .timeout(READ_TIMEOUT)
            .open()
            .map_err(|e| TransportError::ConnectionFailed(format!("{}: {}", self.port_name, e)))
    }
}

impl Transport for SerialTransport {
    fn open(&mut self, on_data: DataHandler, on_error: ErrorHandler) -> Result<(), TransportError> {
        if self.reader.is_some() {
            return Err(TransportError::AlreadyOpen);
        }

        let port = self.open_port()?;
        let stop = Arc::new(AtomicBool::new(false));
        let thread_stop = Arc::clone(&stop);

        let thread = std::thread::Builder::new()
            .name("serial-reader".into())
            .spawn(move || read_loop(port, thread_stop, on_data, on_error))
            .map_err(|e| TransportError::Io(format!("Failed to spawn reader thread: {}", e)))?;

        actuator_info!(
            "Opened {} ({} baud, {} data bits, {:?} parity, {} stop bits)",
            self.port_name,
            self.config.baud_rate,
            self.config.data_bits,
            self.config.parity,
            self.config.stop_bits
        );
        self.reader = Some(ReaderHandle { stop, thread });
        Ok(())
    }

    fn close(&mut self) -> Result<(), TransportError> {
        let Some(reader) = self.reader.take() else {
            return Ok(());
        };

        reader.stop.store(true, Ordering::Release);
        reader
            .thread
            .join()
            .map_err(|_| TransportError::Other(format!("Reader thread for {} panicked", self.port_name)))?;

        actuator_debug!("Closed {}", self.port_name);
        Ok(())
    }

    fn is_open(&self) -> bool {
        self.reader.is_some()
    }

    fn name(&self) -> &str {
        &self.port_name
    }
}

impl Drop for SerialTransport {
    fn drop(&mut self) {
        let _ = self.close();
    }
}

fn read_loop(
    mut port: Box<dyn serialport::SerialPort>,
    stop: Arc<AtomicBool>,
    on_data: DataHandler,
    on_error: ErrorHandler,
) {
    let opened_at = Instant::now();
    let mut buf = [0u8; READ_BUFFER_SIZE];

    while !stop.load(Ordering::Acquire) {
        match port.read(&mut buf) {
            Ok(0) => {
                if !stop.load(Ordering::Acquire) {
                    on_error(TransportError::ConnectionLost("end of stream".into()));
                }
                return;
            }
            Ok(n) => {
                let timestamp_us = u64::try_from(opened_at.elapsed().as_micros()).unwrap_or(u64::MAX);
                if let Some(chunk) = buf.get(..n) {
                    on_data(chunk, timestamp_us);
                }
            }
            Err(e) if matches!(e.kind(), ErrorKind::TimedOut | ErrorKind::Interrupted) => continue,
            Err(e) => {
                if !stop.load(Ordering::Acquire) {
                    on_error(TransportError::ConnectionLost(e.to_string()));
                }
                return;
            }
        }
    }
}

fn data_bits(bits: u8) -> Result<serialport::DataBits, TransportError> {
    match bits {
        5 => Ok(serialport::DataBits::Five),
        6 => Ok(serialport::DataBits::Six),
        7 => Ok(serialport::DataBits::Seven),
        8 => Ok(serialport::DataBits::Eight),
        other => Err(TransportError::Other(format!("Unsupported data bits: {}", other))),
    }
}

fn stop_bits(bits: u8) -> Result<serialport::StopBits, TransportError> {
    match bits {
        1 => Ok(serialport::StopBits::One),
        2 => Ok(serialport::StopBits::Two),
        other => Err(TransportError::Other(format!("Unsupported stop bits: {}", other))),
    }
}

fn parity(mode: ParityMode) -> serialport::Parity {
    match mode {
        ParityMode::None => serialport::Parity::None,
        ParityMode::Even => serialport::Parity::Even,
        ParityMode::Odd => serialport::Parity::Odd,
    }
}

fn flow_control(mode: FlowControl) -> serialport::FlowControl {
    match mode {
        FlowControl::None => serialport::FlowControl::None,
        FlowControl::Hardware => serialport::FlowControl::Hardware,
        FlowControl::Software => serialport::FlowControl::Software,
    }
}
