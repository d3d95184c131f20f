//! Background thread that keeps a [`CachingReader`] fresh, and the
//! terminal view that redraws on each new snapshot.

use std::collections::HashSet;
use std::io::{self, Write};
use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use anyhow::Context;
use colored::Colorize;
use tracing::{debug, warn};

use crate::cache::{CachingReader, Snapshot};
use crate::commands::connections::sort;
use crate::config::Config;
use crate::output::{json, table::{self, ConnectionKey}};
use crate::platform;

/// A tick taking longer than this multiple of the interval is reported.
const SLOW_SCAN_FACTOR: f64 = 1.5;

/// Ticks `cache` every `interval` until stopped. The first tick runs
/// immediately; ticks never overlap.
pub struct ScanLoop {
    stop: Option<Sender<()>>,
    handle: Option<JoinHandle<()>>,
}

impl ScanLoop {
    pub fn spawn(cache: Arc<CachingReader>, interval: Duration) -> Self {
        let (stop, stopped) = mpsc::channel::<()>();

        let handle = thread::Builder::new()
            .name("procscan-tick".to_string())
            .spawn(move || loop {
                let took = timed_tick(&cache);
                if is_slow(took, interval) {
                    warn!(
                        took_ms = took.as_millis() as u64,
                        interval_ms = interval.as_millis() as u64,
                        "scan took 50% more than the interval"
                    );
                }

                let rest = interval.saturating_sub(took);
                match stopped.recv_timeout(rest) {
                    Err(RecvTimeoutError::Timeout) => continue,
                    Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                }
            });

        let handle = match handle {
            Ok(handle) => Some(handle),
            Err(e) => {
                warn!(error = %e, "could not start scan thread");
                None
            }
        };

        Self {
            stop: Some(stop),
            handle,
        }
    }

    pub fn is_running(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }

    /// Signal the thread and wait for an in-flight tick to finish.
    pub fn stop(&mut self) {
        if let Some(stop) = self.stop.take() {
            let _ = stop.send(());
        }
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                warn!("scan thread panicked");
            }
        }
    }
}

impl Drop for ScanLoop {
    fn drop(&mut self) {
        self.stop();
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    Connections,
    Processes,
}

pub struct WatchOptions {
    pub config: Config,
    pub json: bool,
    pub view: View,
}

/// Redraw every time the scan loop commits a snapshot. Runs until the
/// process is interrupted or the scan thread dies.
pub fn run(options: WatchOptions) -> anyhow::Result<()> {
    let reader = platform::new_reader(&options.config).context("Failed to set up reader")?;
    let cache = Arc::new(CachingReader::new(reader, options.config.include_procs));
    let scan = ScanLoop::spawn(Arc::clone(&cache), options.config.interval);

    let mut previous: HashSet<ConnectionKey> = HashSet::new();
    let mut seen = 0;

    loop {
        let snapshot = wait_for_generation(&cache, &scan, seen)?;
        seen = snapshot.generation;

        if !options.json {
            clear_screen();
        }
        previous = render(&snapshot, &options, &previous)?;
        if !options.json {
            print_watch_status(&options, seen);
        }
        io::stdout().flush()?;
    }
}

fn wait_for_generation(
    cache: &CachingReader,
    scan: &ScanLoop,
    seen: u64,
) -> anyhow::Result<Arc<Snapshot>> {
    loop {
        let snapshot = cache.snapshot();
        if snapshot.generation > seen {
            return Ok(snapshot);
        }
        if !scan.is_running() {
            anyhow::bail!("scan thread stopped");
        }
        thread::sleep(Duration::from_millis(100));
    }
}

fn render(
    snapshot: &Snapshot,
    options: &WatchOptions,
    previous: &HashSet<ConnectionKey>,
) -> anyhow::Result<HashSet<ConnectionKey>> {
    let mut connections = snapshot.connections.clone();
    sort(&mut connections);
    let current: HashSet<ConnectionKey> = connections.iter().map(table::connection_key).collect();

    if options.json {
        // One self-describing record per tick.
        json::print_snapshot(snapshot)?;
        return Ok(current);
    }

    match options.view {
        View::Connections => {
            // Everything is new on the first frame; don't highlight it.
            let new: HashSet<ConnectionKey> = if snapshot.generation <= 1 {
                HashSet::new()
            } else {
                current.difference(previous).copied().collect()
            };
            table::print_connections_watch(&connections, &new);
        }
        View::Processes => {
            let mut processes = snapshot.processes.clone();
            processes.sort_by_key(|p| p.pid);
            table::print_processes(&processes);
        }
    }

    Ok(current)
}

fn clear_screen() {
    print!("\x1B[2J\x1B[1;1H");
}

fn print_watch_status(options: &WatchOptions, generation: u64) {
    let mode = match options.view {
        View::Connections => "connections",
        View::Processes => "processes",
    };
    println!(
        "\n{} {} (scan #{}, every {:.1}s, Ctrl+C to exit)",
        "Watching".dimmed(),
        mode.dimmed(),
        generation,
        options.config.interval.as_secs_f64()
    );
}

fn timed_tick(cache: &CachingReader) -> Duration {
    let begin = Instant::now();
    match cache.tick() {
        Ok(()) => debug!(generation = cache.generation(), "tick complete"),
        Err(e) => warn!(error = %e, "scan failed, keeping previous snapshot"),
    }
    begin.elapsed()
}

fn is_slow(took: Duration, interval: Duration) -> bool {
    !interval.is_zero() && took.as_secs_f64() / interval.as_secs_f64() > SLOW_SCAN_FACTOR
}
