//! Background worker for directory loads.
//!
//! Keeps mesh parsing off the UI thread. Every request carries an epoch; a
//! new request cancels the one in flight and results from older epochs are
//! for the receiver to drop.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{channel, Receiver, RecvTimeoutError, Sender, TryRecvError};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use log::{debug, warn};

use crate::frames::{FrameStore, Progress};
use crate::util::Result;

/// Commands sent from UI to worker.
#[derive(Debug)]
enum LoaderCommand {
    Load {
        dir: PathBuf,
        epoch: u64,
        cancel: Arc<AtomicBool>,
    },
    Stop,
}

/// Messages sent from worker back to UI.
#[derive(Debug)]
pub enum LoaderMessage {
    Progress { epoch: u64, progress: Progress },
    Finished {
        epoch: u64,
        dir: PathBuf,
        result: Result<FrameStore>,
    },
}

impl LoaderMessage {
    pub fn epoch(&self) -> u64 {
        match self {
            Self::Progress { epoch, .. } | Self::Finished { epoch, .. } => *epoch,
        }
    }
}

/// Handle to communicate with the background loader.
pub struct LoaderHandle {
    tx: Sender<LoaderCommand>,
    rx: Receiver<LoaderMessage>,
    epoch: u64,
    cancel: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl LoaderHandle {
    pub fn spawn() -> Self {
        let (cmd_tx, cmd_rx) = channel::<LoaderCommand>();
        let (res_tx, res_rx) = channel::<LoaderMessage>();

        let handle = thread::Builder::new()
            .name("simview-loader".into())
            .spawn(move || loader_loop(cmd_rx, res_tx))
            .map_err(|e| warn!("failed to spawn loader thread: {}", e))
            .ok();

        Self {
            tx: cmd_tx,
            rx: res_rx,
            epoch: 0,
            cancel: Arc::new(AtomicBool::new(false)),
            handle,
        }
    }

    /// Epoch of the latest request.
    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    /// Start loading `dir`, cancelling the previous load. Returns the new epoch.
    pub fn request_load(&mut self, dir: PathBuf) -> u64 {
        self.cancel_current();
        self.epoch += 1;
        self.cancel = Arc::new(AtomicBool::new(false));
        let cmd = LoaderCommand::Load {
            dir,
            epoch: self.epoch,
            cancel: Arc::clone(&self.cancel),
        };
        if self.tx.send(cmd).is_err() {
            warn!("loader thread is gone, request {} dropped", self.epoch);
        }
        self.epoch
    }

    /// Ask the load in flight to stop at the next file.
    pub fn cancel_current(&self) {
        self.cancel.store(true, Ordering::Relaxed);
    }

    /// Check for messages (non-blocking). `Disconnected` means the worker
    /// thread has exited and this handle is unusable.
    pub fn try_recv(&self) -> std::result::Result<LoaderMessage, TryRecvError> {
        self.rx.try_recv()
    }

    /// Wait up to `timeout` for a message.
    pub fn recv_timeout(
        &self,
        timeout: Duration,
    ) -> std::result::Result<LoaderMessage, RecvTimeoutError> {
        self.rx.recv_timeout(timeout)
    }

    /// Stop the worker and wait for it to finish.
    pub fn stop(&mut self) {
        self.cancel_current();
        if self.tx.send(LoaderCommand::Stop).is_err() {
            debug!("loader thread already exited");
        }
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                warn!("loader thread panicked");
            }
        }
    }
}

impl Drop for LoaderHandle {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Main worker loop - runs in background thread.
fn loader_loop(rx: Receiver<LoaderCommand>, tx: Sender<LoaderMessage>) {
    while let Ok(cmd) = rx.recv() {
        let LoaderCommand::Load { dir, epoch, cancel } = cmd else {
            break;
        };
        // Only the latest queued request matters
        let Some((dir, epoch, cancel)) = drain_to_latest(&rx, dir, epoch, cancel) else {
            break;
        };
        debug!("loader: epoch {} loading {}", epoch, dir.display());

        let progress_tx = tx.clone();
        let result = FrameStore::load_cancellable(&dir, &cancel, |progress| {
            let message = LoaderMessage::Progress {
                epoch,
                progress: progress.clone(),
            };
            if progress_tx.send(message).is_err() {
                debug!("loader: progress for epoch {} dropped", epoch);
            }
        });
        if tx.send(LoaderMessage::Finished { epoch, dir, result }).is_err() {
            break; // UI disconnected
        }
    }
}

/// Drain queued requests, keeping the newest. `None` when a stop was queued.
fn drain_to_latest(
    rx: &Receiver<LoaderCommand>,
    mut dir: PathBuf,
    mut epoch: u64,
    mut cancel: Arc<AtomicBool>,
) -> Option<(PathBuf, u64, Arc<AtomicBool>)> {
    while let Ok(cmd) = rx.try_recv() {
        match cmd {
            LoaderCommand::Load {
                dir: d,
                epoch: e,
                cancel: c,
            } => {
                dir = d;
                epoch = e;
                cancel = c;
            }
            LoaderCommand::Stop => return None,
        }
    }
    Some((dir, epoch, cancel))
}
