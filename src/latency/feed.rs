//! Periodic snapshot publisher.
//!
//! A background thread owns the generator and publishes a fresh
//! `Arc<LatencySnapshot>` every interval. The consumer keeps only the newest
//! one, so a reader always holds a complete snapshot.

use super::realtime::generate_realtime_snapshot;
use super::{LatencyRanges, LatencySnapshot};
use crate::topology::Topology;
use crossbeam_channel::{bounded, select, unbounded, Receiver, Sender};
use log::{debug, info};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

pub struct SnapshotFeed {
    current: Arc<LatencySnapshot>,
    updates: Receiver<Arc<LatencySnapshot>>,
    stop_tx: Sender<()>,
    handle: Option<JoinHandle<()>>,
}

impl SnapshotFeed {
    /// Start publishing snapshots of `topology` every `interval`.
    ///
    /// The first snapshot is built before returning.
    pub fn spawn(
        topology: &'static Topology,
        ranges: LatencyRanges,
        interval: Duration,
        seed: Option<u64>,
    ) -> Self {
        let mut rng = match seed {
            Some(s) => StdRng::seed_from_u64(s),
            None => StdRng::from_entropy(),
        };
        let current = Arc::new(generate_realtime_snapshot(topology, &ranges, &mut rng));

        let (update_tx, updates) = unbounded::<Arc<LatencySnapshot>>();
        let (stop_tx, stop_rx) = bounded::<()>(1);

        let handle = thread::spawn(move || {
            info!("snapshot feed started, interval {:?}", interval);
            loop {
                select! {
                    recv(stop_rx) -> _ => break,
                    default(interval) => {
                        let snapshot = Arc::new(generate_realtime_snapshot(topology, &ranges, &mut rng));
                        debug!("published snapshot with {} links", snapshot.links.len());
                        if update_tx.send(snapshot).is_err() {
                            break;
                        }
                    }
                }
            }
            info!("snapshot feed stopped");
        });

        Self {
            current,
            updates,
            stop_tx,
            handle: Some(handle),
        }
    }

    /// Newest published snapshot, and whether it changed since the last call.
    pub fn latest(&mut self) -> (Arc<LatencySnapshot>, bool) {
        let mut changed = false;
        while let Ok(snapshot) = self.updates.try_recv() {
            self.current = snapshot;
            changed = true;
        }
        (Arc::clone(&self.current), changed)
    }

    pub fn current(&self) -> Arc<LatencySnapshot> {
        Arc::clone(&self.current)
    }
}

impl Drop for SnapshotFeed {
    fn drop(&mut self) {
        let _ = self.stop_tx.try_send(());
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::topology::default_topology;

    #[test]
    fn first_snapshot_is_available_immediately() {
        let feed = SnapshotFeed::spawn(default_topology(), LatencyRanges::default(), Duration::from_secs(60), Some(1));
        assert_eq!(feed.current().links.len(), 45);
    }

    #[test]
    fn publishes_whole_replacements() {
        let mut feed = SnapshotFeed::spawn(default_topology(), LatencyRanges::default(), Duration::from_millis(10), Some(2));
        let (first, _) = feed.latest();
        let mut replaced = None;
        for _ in 0..200 {
            thread::sleep(Duration::from_millis(5));
            let (snap, changed) = feed.latest();
            if changed {
                replaced = Some(snap);
                break;
            }
        }
        let replaced = replaced.expect("feed never published a new snapshot");
        assert!(!Arc::ptr_eq(&first, &replaced));
        assert_eq!(replaced.links.len(), first.links.len());
        // the old snapshot is untouched
        assert_eq!(first.links.len(), 45);
    }

    #[test]
    fn drop_stops_the_thread() {
        let feed = SnapshotFeed::spawn(default_topology(), LatencyRanges::default(), Duration::from_secs(3600), None);
        drop(feed);
    }
}
