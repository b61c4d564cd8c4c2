//! Background worker for long-running engine operations.
//!
//! The engine performs no internal queuing: one operation runs on a
//! spawned thread while the main thread polls the shared progress
//! report and redraws a status line.

use std::io::Write as _;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use bootmeta_core::{ProgressReport, Result, TitleSyncEngine};

const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Run one engine operation on a worker thread, showing its progress.
pub fn run_with_progress<F>(engine: &Arc<TitleSyncEngine>, op: F) -> Result<()>
where
    F: FnOnce(Arc<TitleSyncEngine>, Arc<ProgressReport>) -> Result<()> + Send + 'static,
{
    let progress = Arc::new(ProgressReport::new());

    let handle = {
        let engine = engine.clone();
        let progress = progress.clone();
        thread::spawn(move || op(engine, progress))
    };

    let mut drew = false;
    while !handle.is_finished() {
        let (current, total) = progress.position();
        if total > 0 {
            eprint!("\r[{current}/{total}] {:<60}", progress.label());
            let _ = std::io::stderr().flush();
            drew = true;
        }
        thread::sleep(POLL_INTERVAL);
    }
    if drew {
        eprintln!();
    }

    handle.join().expect("worker thread panicked")
}
