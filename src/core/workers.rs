//! Fetch pool - background threads running fetch jobs.
//!
//! Jobs are closures pushed onto a channel; worker threads pull and run them
//! in submission order. No priorities, no cancellation: superseded fetches
//! run to completion and their results are dropped at apply time by the
//! generation check in the controller.
//!
//! Dropping the pool disconnects the job channel and joins all workers.

use crossbeam_channel::{Receiver, Sender, unbounded};
use log::trace;
use std::thread;

type Job = Box<dyn FnOnce() + Send + 'static>;

/// Thread pool executing fetch jobs off the controller's thread.
pub struct FetchPool {
    tx: Option<Sender<Job>>,
    handles: Vec<thread::JoinHandle<()>>,
}

impl FetchPool {
    /// Spawn `num_threads` workers (minimum 1).
    ///
    /// Recommended sizing: `num_cpus::get() * 3 / 4`, leaving headroom for
    /// the controller/UI thread (see `SidebarConfig::default`).
    pub fn new(num_threads: usize) -> Self {
        let num_threads = num_threads.max(1);
        let (tx, rx): (Sender<Job>, Receiver<Job>) = unbounded();
        let mut handles = Vec::with_capacity(num_threads);

        for worker_id in 0..num_threads {
            let rx = rx.clone();
            let handle = thread::Builder::new()
                .name(format!("layerdeck-fetch-{}", worker_id))
                .spawn(move || {
                    trace!("fetch worker {} started", worker_id);
                    // Loop ends when the sender side is dropped
                    while let Ok(job) = rx.recv() {
                        job();
                    }
                    trace!("fetch worker {} stopped", worker_id);
                })
                .expect("failed to spawn fetch worker thread");
            handles.push(handle);
        }

        trace!("FetchPool initialized: {} threads", num_threads);
        Self { tx: Some(tx), handles }
    }

    /// Queue a job for execution on a worker thread.
    ///
    /// Jobs are picked up in submission order, which preserves the
    /// card-list issue order within a single pass. Completion order is
    /// whatever the fetch latencies make it.
    pub fn execute<F>(&self, f: F)
    where
        F: FnOnce() + Send + 'static,
    {
        if let Some(ref tx) = self.tx {
            let _ = tx.send(Box::new(f));
        }
    }

    /// Number of worker threads
    pub fn num_threads(&self) -> usize {
        self.handles.len()
    }
}

impl Drop for FetchPool {
    fn drop(&mut self) {
        // Disconnect the channel so workers drain remaining jobs and exit
        self.tx.take();
        for handle in self.handles.drain(..) {
            let _ = handle.join();
        }
    }
}
