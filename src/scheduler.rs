// scheduler.rs — Fixed-rate overlay thread.
//
// One iteration = one `EspOverlay::on_frame`, then a sleep of one frame
// interval (1/60 s by default). The sleep is measured from the end of an
// iteration, so a slow frame pushes the next one back; no catch-up.
//
// The thread has no natural end. It stops only when its handle's `stop()`
// is called (tests, library shutdown) or the process exits.

use crate::camera::MatrixSource;
use crate::canvas::Canvas;
use crate::entities::PositionReader;
use crate::esp::EspOverlay;
use std::io;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::{info, warn};

/// Control handle for a running overlay thread.
pub struct SchedulerHandle {
    stop: Arc<AtomicBool>,
    frames: Arc<AtomicU64>,
    thread: Option<JoinHandle<()>>,
}

impl SchedulerHandle {
    /// Number of loop iterations completed so far.
    pub fn frames(&self) -> u64 {
        self.frames.load(Ordering::Relaxed)
    }

    pub fn is_running(&self) -> bool {
        self.thread.as_ref().is_some_and(|t| !t.is_finished())
    }

    /// Ask the loop to exit and wait for it. Returns within one frame interval.
    pub fn stop(mut self) {
        self.stop.store(true, Ordering::Relaxed);
        if let Some(t) = self.thread.take() {
            if t.join().is_err() {
                warn!("overlay thread panicked during shutdown");
            }
        }
        info!("overlay stopped after {} frames", self.frames());
    }
}

/// Spawn the overlay loop on its own thread.
pub fn start<M, P, C>(overlay: EspOverlay<M, P, C>, interval: Duration) -> io::Result<SchedulerHandle>
where
    M: MatrixSource + Send + 'static,
    P: PositionReader + Send + 'static,
    C: Canvas + Send + 'static,
{
    let stop = Arc::new(AtomicBool::new(false));
    let frames = Arc::new(AtomicU64::new(0));

    let thread = {
        let stop = stop.clone();
        let frames = frames.clone();
        thread::Builder::new()
            .name("overlay".into())
            .spawn(move || run_loop(&overlay, interval, &stop, &frames))?
    };

    info!("overlay thread started ({:?} per frame)", interval);
    Ok(SchedulerHandle { stop, frames, thread: Some(thread) })
}

fn run_loop<M, P, C>(overlay: &EspOverlay<M, P, C>, interval: Duration, stop: &AtomicBool, frames: &AtomicU64)
where
    M: MatrixSource,
    P: PositionReader,
    C: Canvas,
{
    while !stop.load(Ordering::Relaxed) {
        // A bad read must never take the loop down with it.
        if panic::catch_unwind(AssertUnwindSafe(|| overlay.on_frame())).is_err() {
            warn!("overlay frame panicked, continuing");
        }
        frames.fetch_add(1, Ordering::Relaxed);
        thread::sleep(interval);
    }
}
