//! Background removal off the UI thread.
//!
//! The actual segmentation is an external collaborator behind the
//! [`BackgroundRemover`] trait. [`BackgroundRemovalWorker`] runs one on a
//! dedicated thread; results are drained with [`BackgroundRemovalWorker::poll`]
//! and handed to [`crate::Canvas::apply_background_removal`].

use crate::entity::EntityId;
use image::{DynamicImage, RgbaImage};
use std::io::Cursor;
use std::sync::Arc;
use std::sync::mpsc::{Receiver, RecvTimeoutError, Sender, channel};
use std::thread::{self, JoinHandle};
use std::time::Duration;
use thiserror::Error;

/// Background removal errors.
#[derive(Debug, Error)]
pub enum RemovalError {
    #[error("entity not found: {0}")]
    UnknownEntity(EntityId),
    #[error("entity {0} has no decoded bitmap")]
    NoBitmap(EntityId),
    #[error("background removal failed: {0}")]
    Failed(String),
    #[error("failed to encode result: {0}")]
    Encode(#[from] image::ImageError),
    #[error("failed to start worker: {0}")]
    Spawn(#[from] std::io::Error),
    #[error("worker stopped")]
    WorkerStopped,
}

/// Turns a bitmap into an encoded image with a transparent background.
pub trait BackgroundRemover: Send + 'static {
    fn remove_background(&mut self, image: &DynamicImage) -> Result<Vec<u8>, RemovalError>;
}

/// Result of one removal job.
#[derive(Debug)]
pub struct RemovalOutcome {
    pub id: EntityId,
    pub result: Result<Vec<u8>, RemovalError>,
}

/// Keys out the color found along the image border.
///
/// Pixels within `tolerance` (max channel difference) of the key become
/// transparent; the next `softness` levels fade linearly. Existing alpha is
/// multiplied with the mask.
#[derive(Debug, Clone, Copy)]
pub struct ColorKeyRemover {
    pub tolerance: u8,
    pub softness: u8,
}

impl Default for ColorKeyRemover {
    fn default() -> Self {
        Self {
            tolerance: 24,
            softness: 16,
        }
    }
}

impl ColorKeyRemover {
    fn border_key(image: &RgbaImage) -> [u8; 3] {
        let (w, h) = image.dimensions();
        let mut sum = [0u64; 3];
        let mut count = 0u64;
        for (x, y, pixel) in image.enumerate_pixels() {
            if x == 0 || y == 0 || x + 1 == w || y + 1 == h {
                for (s, &v) in sum.iter_mut().zip(pixel.0.iter()) {
                    *s += v as u64;
                }
                count += 1;
            }
        }
        if count == 0 {
            return [0; 3];
        }
        sum.map(|s| (s / count) as u8)
    }

    fn mask(&self, distance: u8) -> f32 {
        if distance <= self.tolerance {
            0.0
        } else if self.softness == 0 || distance >= self.tolerance.saturating_add(self.softness) {
            1.0
        } else {
            (distance - self.tolerance) as f32 / self.softness as f32
        }
    }
}

impl BackgroundRemover for ColorKeyRemover {
    fn remove_background(&mut self, image: &DynamicImage) -> Result<Vec<u8>, RemovalError> {
        let mut rgba = image.to_rgba8();
        let key = Self::border_key(&rgba);

        for pixel in rgba.pixels_mut() {
            let distance = (0..3).map(|c| pixel[c].abs_diff(key[c])).max().unwrap_or(0);
            let orig_alpha = pixel[3] as f32 / 255.0;
            pixel[3] = (orig_alpha * self.mask(distance) * 255.0).round().clamp(0.0, 255.0) as u8;
        }

        let mut data = Vec::new();
        DynamicImage::ImageRgba8(rgba).write_to(&mut Cursor::new(&mut data), image::ImageFormat::Png)?;
        Ok(data)
    }
}

/// Jobs sent to the worker thread.
enum Job {
    Remove { id: EntityId, image: Arc<DynamicImage> },
    Shutdown,
}

/// Runs a [`BackgroundRemover`] on its own thread.
pub struct BackgroundRemovalWorker {
    /// Channel to send jobs to the worker thread.
    job_tx: Option<Sender<Job>>,
    /// Channel to receive outcomes from the worker thread.
    outcome_rx: Receiver<RemovalOutcome>,
    thread: Option<JoinHandle<()>>,
    pending: usize,
}

impl BackgroundRemovalWorker {
    /// Start a worker thread around `remover`.
    pub fn spawn<R: BackgroundRemover>(mut remover: R) -> Result<Self, RemovalError> {
        let (job_tx, job_rx) = channel::<Job>();
        let (outcome_tx, outcome_rx) = channel::<RemovalOutcome>();

        let handle = thread::Builder::new()
            .name("refboard-bg-removal".to_string())
            .spawn(move || {
                log::info!("Background removal worker started");
                while let Ok(job) = job_rx.recv() {
                    match job {
                        Job::Remove { id, image } => {
                            log::debug!("Removing background of entity {}", id);
                            let result = remover.remove_background(&image);
                            if outcome_tx.send(RemovalOutcome { id, result }).is_err() {
                                break;
                            }
                        }
                        Job::Shutdown => break,
                    }
                }
                log::info!("Background removal worker exiting");
            })?;

        Ok(Self {
            job_tx: Some(job_tx),
            outcome_rx,
            thread: Some(handle),
            pending: 0,
        })
    }

    /// Queue a bitmap for removal.
    pub fn submit(&mut self, id: EntityId, image: Arc<DynamicImage>) -> Result<(), RemovalError> {
        let tx = self.job_tx.as_ref().ok_or(RemovalError::WorkerStopped)?;
        tx.send(Job::Remove { id, image })
            .map_err(|_| RemovalError::WorkerStopped)?;
        self.pending += 1;
        Ok(())
    }

    /// Jobs submitted but not yet drained.
    pub fn pending(&self) -> usize {
        self.pending
    }

    /// Drain finished outcomes (non-blocking).
    pub fn poll(&mut self) -> Vec<RemovalOutcome> {
        let outcomes: Vec<_> = self.outcome_rx.try_iter().collect();
        self.pending = self.pending.saturating_sub(outcomes.len());
        outcomes
    }

    /// Block until the next outcome arrives or `timeout` elapses.
    pub fn wait(&mut self, timeout: Duration) -> Option<RemovalOutcome> {
        match self.outcome_rx.recv_timeout(timeout) {
            Ok(outcome) => {
                self.pending = self.pending.saturating_sub(1);
                Some(outcome)
            }
            Err(RecvTimeoutError::Timeout) => None,
            Err(RecvTimeoutError::Disconnected) => {
                log::warn!("Background removal worker disconnected");
                None
            }
        }
    }

    /// Stop the worker and join its thread. Queued jobs are abandoned.
    pub fn shutdown(&mut self) {
        if let Some(tx) = self.job_tx.take() {
            let _ = tx.send(Job::Shutdown);
        }
        if let Some(handle) = self.thread.take() {
            if handle.join().is_err() {
                log::error!("Background removal worker panicked");
            }
        }
    }
}

impl Drop for BackgroundRemovalWorker {
    fn drop(&mut self) {
        self.shutdown();
    }
}
