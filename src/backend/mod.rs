//! Backend module: thread statistics sources and the local probe transport
//!
//! This module owns everything that runs beside the node: the platform
//! thread-metrics capability used by the `threads` command, and a dedicated
//! handler thread that serves probe requests over crossbeam channels.
//!
//! # Architecture
//!
//! - [`BackendCommand`] - Messages sent from a client to the handler thread
//! - [`ProbeClient`] - Client-side handle for submitting batches and waiting for results
//! - [`ProbeBackend`] - Handler loop owning the [`ProbeDispatcher`]
//!
//! # Components
//!
//! - [`ThreadMetrics`] - Trait for per-thread statistics sources
//! - [`ProcfsThreadMetrics`] - Linux `/proc/self/task` implementation
//! - [`StaticThreadMetrics`] - Fixed thread table for tests and benchmarks
//!
//! # Example
//!
//! ```ignore
//! use stack_probe::backend::ProbeBackend;
//!
//! let (backend, client) = ProbeBackend::new(Arc::new(dispatcher));
//! let handle = backend.spawn()?;
//!
//! let result = client.request(&["jmx", "threads=cpu=10"])?;
//! client.shutdown();
//! handle.join().ok();
//! ```

pub mod metrics_trait;
pub mod procfs;
pub mod static_metrics;

pub use metrics_trait::{RawThreadInfo, ThreadMetrics, ThreadState};
pub use procfs::ProcfsThreadMetrics;
pub use static_metrics::StaticThreadMetrics;

use crate::error::{ProbeError, Result};
use crate::probe::ProbeDispatcher;
use crossbeam_channel::{bounded, Receiver, RecvTimeoutError, Sender};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

/// Name of the handler thread, as shown by `threads`
pub const HANDLER_THREAD_NAME: &str = "probe-handler";

/// How often the handler loop checks its running flag while idle
const IDLE_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Result mapping of one probe request
pub type ProbeResult = BTreeMap<String, String>;

/// Message sent from a client to the handler thread
#[derive(Debug)]
pub enum BackendCommand {
    /// Run a batch of commands and send the mapping back
    Probe {
        keys: Vec<String>,
        reply: Sender<ProbeResult>,
    },
    /// Stop the handler loop
    Shutdown,
}

/// Client handle for the probe handler thread
#[derive(Debug, Clone)]
pub struct ProbeClient {
    /// Sender for commands to the handler
    pub command_sender: Sender<BackendCommand>,
}

impl ProbeClient {
    /// Send a command to the handler
    pub fn send_command(&self, cmd: BackendCommand) -> bool {
        self.command_sender.send(cmd).is_ok()
    }

    fn submit<S: AsRef<str>>(&self, keys: &[S]) -> Result<Receiver<ProbeResult>> {
        let (reply, response) = bounded(1);
        let keys = keys.iter().map(|k| k.as_ref().to_string()).collect();
        self.command_sender
            .send(BackendCommand::Probe { keys, reply })
            .map_err(|_| ProbeError::Channel("probe handler has stopped".to_string()))?;
        Ok(response)
    }

    /// Submit a batch and wait for its result mapping
    pub fn request<S: AsRef<str>>(&self, keys: &[S]) -> Result<ProbeResult> {
        self.submit(keys)?
            .recv()
            .map_err(|_| ProbeError::Channel("probe handler dropped the request".to_string()))
    }

    /// Like [`request`](Self::request), giving up after `timeout`
    pub fn request_timeout<S: AsRef<str>>(
        &self,
        keys: &[S],
        timeout: Duration,
    ) -> Result<ProbeResult> {
        self.submit(keys)?
            .recv_timeout(timeout)
            .map_err(|e| match e {
                RecvTimeoutError::Timeout => {
                    ProbeError::Timeout(format!("no probe reply within {:?}", timeout))
                }
                RecvTimeoutError::Disconnected => {
                    ProbeError::Channel("probe handler dropped the request".to_string())
                }
            })
    }

    /// Request shutdown
    pub fn shutdown(&self) {
        let _ = self.command_sender.send(BackendCommand::Shutdown);
    }
}

/// The probe handler that runs in a separate thread
pub struct ProbeBackend {
    dispatcher: Arc<ProbeDispatcher>,
    /// Receiver for commands from clients
    command_receiver: Receiver<BackendCommand>,
    /// Running flag
    running: Arc<AtomicBool>,
}

impl ProbeBackend {
    /// Create a new handler with its command channel
    pub fn new(dispatcher: Arc<ProbeDispatcher>) -> (Self, ProbeClient) {
        let (cmd_tx, cmd_rx) = bounded(256);

        let backend = Self {
            dispatcher,
            command_receiver: cmd_rx,
            running: Arc::new(AtomicBool::new(true)),
        };

        let client = ProbeClient {
            command_sender: cmd_tx,
        };

        (backend, client)
    }

    /// Run the handler loop until shutdown, the stop flag, or every client
    /// is dropped
    pub fn run(self) {
        tracing::info!("Probe handler started");

        while self.running.load(Ordering::SeqCst) {
            match self.command_receiver.recv_timeout(IDLE_POLL_INTERVAL) {
                Ok(BackendCommand::Probe { keys, reply }) => {
                    let result = self.dispatcher.handle(keys.as_slice());
                    if reply.send(result).is_err() {
                        tracing::debug!("Probe client went away before the reply");
                    }
                }
                Ok(BackendCommand::Shutdown) => break,
                Err(RecvTimeoutError::Timeout) => {}
                Err(RecvTimeoutError::Disconnected) => break,
            }
        }

        self.running.store(false, Ordering::SeqCst);
        tracing::info!("Probe handler stopped");
    }

    /// Run the handler on a thread named [`HANDLER_THREAD_NAME`], inside the
    /// caller's current span
    pub fn spawn(self) -> Result<JoinHandle<()>> {
        let span = tracing::Span::current();
        std::thread::Builder::new()
            .name(HANDLER_THREAD_NAME.to_string())
            .spawn(move || {
                let _entered = span.enter();
                self.run()
            })
            .map_err(ProbeError::from)
    }

    /// Get a handle to stop the handler
    pub fn stop_handle(&self) -> Arc<AtomicBool> {
        self.running.clone()
    }
}
