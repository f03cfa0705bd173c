// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Buffered handler.
//!
//! Records are queued and written in one batch when either:
//! - the buffer reaches `capacity` (flush on the emitting thread)
//! - the background flush interval elapses (flush on the flush thread)
//!
//! One lock guards the buffer and the whole flush, so at most one flush runs
//! at a time and points reach the client in the order records were queued.
//! A flush always leaves the buffer empty, even when the write fails.

use crate::client::InfluxClient;
use crate::config::HandlerConfig;
use crate::convert::Point;
use crate::error::{Error, Result};
use crate::handler::{Emit, InfluxHandler};
use crate::record::LogRecord;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc;
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

/// Counters kept by a buffered handler.
#[derive(Debug, Default)]
pub struct HandlerStats {
    records_accepted: AtomicU64,
    flushes: AtomicU64,
    points_written: AtomicU64,
    write_errors: AtomicU64,
    background_errors: AtomicU64,
}

/// Point-in-time copy of [`HandlerStats`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatsSnapshot {
    /// Records queued by `emit`.
    pub records_accepted: u64,
    /// Non-empty flushes attempted.
    pub flushes: u64,
    /// Points acknowledged by the client.
    pub points_written: u64,
    /// Failed writes, whatever triggered them.
    pub write_errors: u64,
    /// Failed writes raised on the flush thread.
    pub background_errors: u64,
}

impl HandlerStats {
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            records_accepted: self.records_accepted.load(Ordering::Relaxed),
            flushes: self.flushes.load(Ordering::Relaxed),
            points_written: self.points_written.load(Ordering::Relaxed),
            write_errors: self.write_errors.load(Ordering::Relaxed),
            background_errors: self.background_errors.load(Ordering::Relaxed),
        }
    }
}

/// State shared between the handler and its flush thread.
struct Shared {
    handler: InfluxHandler,
    buffer: Mutex<Vec<LogRecord>>,
    capacity: usize,
    stats: HandlerStats,
}

impl Shared {
    fn flush(&self) -> Result<()> {
        let mut buffer = self.buffer.lock();
        if buffer.is_empty() {
            return Ok(());
        }

        let records = std::mem::take(&mut *buffer);
        let points: Vec<Point> = records
            .iter()
            .flat_map(|record| self.handler.points(record))
            .collect();

        self.stats.flushes.fetch_add(1, Ordering::Relaxed);
        let result = self.handler.write(&points);
        match &result {
            Ok(()) => {
                self.stats
                    .points_written
                    .fetch_add(points.len() as u64, Ordering::Relaxed);
                tracing::debug!(
                    records = records.len(),
                    points = points.len(),
                    "flushed buffered records"
                );
            }
            Err(_) => {
                self.stats.write_errors.fetch_add(1, Ordering::Relaxed);
            }
        }
        result
    }
}

/// Background flush thread plus its stop channel.
///
/// Dropping the sender disconnects the channel, which wakes the thread out of
/// `recv_timeout` and makes it exit.
struct FlushThread {
    stop_tx: Option<mpsc::Sender<()>>,
    thread: Option<JoinHandle<()>>,
}

impl FlushThread {
    fn spawn(shared: Arc<Shared>, interval: Duration) -> Result<Self> {
        let (stop_tx, stop_rx) = mpsc::channel::<()>();

        let thread = std::thread::Builder::new()
            .name("influx-logging-flush".to_string())
            .spawn(move || {
                tracing::debug!(interval = ?interval, "flush thread started");
                loop {
                    match stop_rx.recv_timeout(interval) {
                        Ok(()) | Err(mpsc::RecvTimeoutError::Disconnected) => break,
                        Err(mpsc::RecvTimeoutError::Timeout) => {}
                    }

                    if let Err(e) = shared.flush() {
                        shared
                            .stats
                            .background_errors
                            .fetch_add(1, Ordering::Relaxed);
                        tracing::warn!(error = %e, "background flush failed, records dropped");
                    }
                }
                tracing::debug!("flush thread stopped");
            })
            .map_err(Error::Spawn)?;

        Ok(Self {
            stop_tx: Some(stop_tx),
            thread: Some(thread),
        })
    }

    /// Signal the thread to stop and wait for it to finish.
    fn stop(&mut self) {
        drop(self.stop_tx.take());
        if let Some(handle) = self.thread.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for FlushThread {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Handler that buffers records and writes them in batches.
///
/// Wraps an [`InfluxHandler`] for conversion and delivery. Safe to share
/// between producer threads. Dropping the handler stops the flush thread and
/// flushes whatever is still buffered.
pub struct BufferedInfluxHandler {
    shared: Arc<Shared>,
    flush_interval: Option<Duration>,
    flusher: Mutex<Option<FlushThread>>,
}

impl BufferedInfluxHandler {
    /// Create the handler and, unless the interval is disabled, start the
    /// flush thread.
    pub fn new<C>(config: HandlerConfig, client: C) -> Result<Self>
    where
        C: InfluxClient + 'static,
    {
        let capacity = config.capacity;
        let flush_interval = config.flush_interval();
        let handler = InfluxHandler::new(config, client)?;

        let shared = Arc::new(Shared {
            handler,
            buffer: Mutex::new(Vec::with_capacity(capacity)),
            capacity,
            stats: HandlerStats::default(),
        });

        let flusher = match flush_interval {
            Some(interval) => Some(FlushThread::spawn(shared.clone(), interval)?),
            None => None,
        };

        Ok(Self {
            shared,
            flush_interval,
            flusher: Mutex::new(flusher),
        })
    }

    /// Queue a record, flushing when the buffer is full.
    ///
    /// The error of a capacity-triggered flush is returned here; the record
    /// is already part of that flush.
    pub fn emit(&self, record: LogRecord) -> Result<()> {
        let full = {
            let mut buffer = self.shared.buffer.lock();
            buffer.push(record);
            buffer.len() >= self.shared.capacity
        };
        self.shared
            .stats
            .records_accepted
            .fetch_add(1, Ordering::Relaxed);

        if full {
            self.flush()
        } else {
            Ok(())
        }
    }

    /// Write everything buffered as one batch.
    ///
    /// Blocks while another flush is running. The buffer is empty when this
    /// returns, whether or not the write succeeded.
    pub fn flush(&self) -> Result<()> {
        self.shared.flush()
    }

    /// Stop the flush thread and flush the remaining records.
    ///
    /// Records emitted afterwards are still buffered and flushed at capacity
    /// or on explicit calls. Calling this again only flushes.
    pub fn close(&self) -> Result<()> {
        let flusher = self.flusher.lock().take();
        if let Some(mut flusher) = flusher {
            flusher.stop();
        }
        self.flush()
    }

    /// Number of records waiting for the next flush.
    pub fn buffered_len(&self) -> usize {
        self.shared.buffer.lock().len()
    }

    pub fn capacity(&self) -> usize {
        self.shared.capacity
    }

    pub fn flush_interval(&self) -> Option<Duration> {
        self.flush_interval
    }

    /// Whether the background flush thread is running.
    pub fn is_scheduled(&self) -> bool {
        self.flusher.lock().is_some()
    }

    pub fn stats(&self) -> StatsSnapshot {
        self.shared.stats.snapshot()
    }

    /// The wrapped immediate handler.
    pub fn handler(&self) -> &InfluxHandler {
        &self.shared.handler
    }
}

impl Emit for BufferedInfluxHandler {
    fn emit(&self, record: LogRecord) -> Result<()> {
        BufferedInfluxHandler::emit(self, record)
    }
}

impl Drop for BufferedInfluxHandler {
    fn drop(&mut self) {
        if let Err(e) = self.close() {
            tracing::error!(error = %e, "final flush failed, buffered records dropped");
        }
    }
}
