//! Background texture decoding.
//!
//! Paths are queued to a worker thread; decoded images come back over a channel and are
//! drained once per frame with [`TextureLoader::poll`].

use std::path::PathBuf;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender, unbounded};
use tracing::{debug, warn};

use crate::foundation::core::Image;
use crate::foundation::error::{DriftError, DriftResult};
use crate::io::codec::load_image;

/// Handle identifying one load request.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LoadId(pub u64);

#[derive(Debug)]
struct LoadRequest {
    id: LoadId,
    path: PathBuf,
}

/// Outcome of one request.
#[derive(Debug)]
pub struct LoadedTexture {
    /// Id returned by [`TextureLoader::request`].
    pub id: LoadId,
    /// Requested path.
    pub path: PathBuf,
    /// Decoded image or the reason it could not be produced.
    pub result: DriftResult<Arc<Image>>,
}

/// Decodes images on a dedicated worker thread.
#[derive(Debug)]
pub struct TextureLoader {
    request_tx: Option<Sender<LoadRequest>>,
    result_rx: Receiver<LoadedTexture>,
    worker: Option<JoinHandle<()>>,
    next_id: u64,
    pending: usize,
}

impl TextureLoader {
    /// Spawn the worker.
    pub fn new() -> DriftResult<Self> {
        let (request_tx, request_rx) = unbounded::<LoadRequest>();
        let (result_tx, result_rx) = unbounded::<LoadedTexture>();
        let worker = thread::Builder::new()
            .name("driftfx-loader".to_owned())
            .spawn(move || worker_loop(request_rx, result_tx))
            .map_err(|e| DriftError::setup(format!("spawn texture loader: {e}")))?;
        Ok(Self {
            request_tx: Some(request_tx),
            result_rx,
            worker: Some(worker),
            next_id: 1,
            pending: 0,
        })
    }

    /// Queue `path` for decoding.
    pub fn request(&mut self, path: impl Into<PathBuf>) -> DriftResult<LoadId> {
        let id = LoadId(self.next_id);
        let path = path.into();
        let tx = self
            .request_tx
            .as_ref()
            .ok_or_else(|| DriftError::setup("texture loader is shut down"))?;
        tx.send(LoadRequest {
            id,
            path: path.clone(),
        })
        .map_err(|_| DriftError::setup("texture loader worker has exited"))?;
        self.next_id += 1;
        self.pending += 1;
        debug!(id = id.0, path = %path.display(), "texture load queued");
        Ok(id)
    }

    /// Requests not yet returned by `poll` or `wait`.
    pub fn pending(&self) -> usize {
        self.pending
    }

    /// Drain every finished request without blocking.
    pub fn poll(&mut self) -> Vec<LoadedTexture> {
        let done: Vec<LoadedTexture> = self.result_rx.try_iter().collect();
        self.pending = self.pending.saturating_sub(done.len());
        done
    }

    /// Block up to `timeout` for the next finished request.
    pub fn wait(&mut self, timeout: Duration) -> Option<LoadedTexture> {
        match self.result_rx.recv_timeout(timeout) {
            Ok(done) => {
                self.pending = self.pending.saturating_sub(1);
                Some(done)
            }
            Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => None,
        }
    }

    /// Stop accepting requests and join the worker. Idempotent.
    pub fn shutdown(&mut self) {
        self.request_tx = None;
        if let Some(worker) = self.worker.take()
            && worker.join().is_err()
        {
            warn!("texture loader worker panicked");
        }
    }
}

impl Drop for TextureLoader {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn worker_loop(requests: Receiver<LoadRequest>, results: Sender<LoadedTexture>) {
    for LoadRequest { id, path } in requests.iter() {
        let result = load_image(&path).map(Arc::new);
        if let Err(e) = &result {
            warn!(id = id.0, path = %path.display(), error = %e, "texture load failed");
        }
        if results.send(LoadedTexture { id, path, result }).is_err() {
            break;
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/io/loader.rs"]
mod tests;
