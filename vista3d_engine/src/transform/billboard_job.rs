/// Off-thread billboard update.
///
/// The transform buffer is moved into a worker thread and comes back over a
/// channel once every matrix is recomputed. The main loop cannot touch the
/// buffer in between: it only owns the job.

use crossbeam_channel::{Receiver, TryRecvError};
use std::thread::{self, JoinHandle};
use glam::Vec3;
use crate::error::{Error, Result};
use crate::transform::billboard_transform::BillboardTransform;
use crate::engine_error;

pub struct BillboardJob {
    receiver: Receiver<Vec<BillboardTransform>>,
    worker: Option<JoinHandle<()>>,
}

impl BillboardJob {
    /// Start updating `transforms` for the eye position `eye`
    pub fn spawn(mut transforms: Vec<BillboardTransform>, eye: Vec3) -> Result<Self> {
        let (sender, receiver) = crossbeam_channel::bounded(1);
        let worker = thread::Builder::new()
            .name("vista3d-billboard".to_string())
            .spawn(move || {
                for transform in transforms.iter_mut() {
                    transform.update_from_eye(eye);
                }
                // The job may have been dropped meanwhile
                let _ = sender.send(transforms);
            })
            .map_err(|e| {
                engine_error!("vista3d::BillboardJob", "Failed to spawn billboard worker: {}", e);
                Error::InitializationFailed(format!("billboard worker: {}", e))
            })?;
        Ok(Self { receiver, worker: Some(worker) })
    }

    /// The updated buffer if the worker is done, `None` while it runs
    ///
    /// # Errors
    ///
    /// Returns `Error::BackendError` if the worker died without handing the
    /// buffer back, or if the buffer was already taken.
    pub fn try_complete(&mut self) -> Result<Option<Vec<BillboardTransform>>> {
        match self.receiver.try_recv() {
            Ok(transforms) => {
                self.join();
                Ok(Some(transforms))
            }
            Err(TryRecvError::Empty) => Ok(None),
            Err(TryRecvError::Disconnected) => {
                self.join();
                Err(Error::BackendError("billboard worker terminated without result".to_string()))
            }
        }
    }

    /// Block until the worker hands the buffer back
    pub fn wait(mut self) -> Result<Vec<BillboardTransform>> {
        let result = self
            .receiver
            .recv()
            .map_err(|_| Error::BackendError("billboard worker terminated without result".to_string()));
        self.join();
        result
    }

    fn join(&mut self) {
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                engine_error!("vista3d::BillboardJob", "Billboard worker panicked");
            }
        }
    }
}

#[cfg(test)]
#[path = "billboard_job_tests.rs"]
mod tests;
