//! Self-terminating status polling loop with a manual-refresh cooldown

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, Weak};

use chrono::Utc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{sleep, Duration, Instant};

use super::{ProbeState, ServiceState, ServiceStatusEntry, StatusProbe, StatusTarget};

/// Delay between automatic passes while any target is unhealthy
pub const POLL_INTERVAL: Duration = Duration::from_secs(60);

/// Minimum spacing between manual refreshes
pub const MANUAL_REFRESH_COOLDOWN: Duration = Duration::from_secs(15);

const COOLDOWN_TICK: Duration = Duration::from_millis(250);

/// Polls the configured targets until every one of them reports `UP`, then
/// stops itself; after that only a manual refresh probes again.
///
/// Targets are probed strictly one at a time within a pass, so each entry
/// flips `idle -> loading -> success|error` on its own and the panel can
/// show partial progress. One slow target therefore delays the rest of its
/// pass; that is the accepted cost of keeping backend load bounded.
pub struct StatusPoller {
    probe: Arc<dyn StatusProbe>,
    targets: Vec<StatusTarget>,
    entries_tx: watch::Sender<Vec<ServiceStatusEntry>>,
    entries_rx: watch::Receiver<Vec<ServiceStatusEntry>>,
    fetching: AtomicBool,
    cooldown_until: Mutex<Option<Instant>>,
    cooldown_tx: watch::Sender<u64>,
    cooldown_rx: watch::Receiver<u64>,
    auto_task: Mutex<Option<JoinHandle<()>>>,
    cooldown_task: Mutex<Option<JoinHandle<()>>>,
}

impl StatusPoller {
    pub fn new(probe: Arc<dyn StatusProbe>, targets: Vec<StatusTarget>) -> Arc<Self> {
        let entries: Vec<ServiceStatusEntry> = targets
            .iter()
            .cloned()
            .map(ServiceStatusEntry::idle)
            .collect();
        let (entries_tx, entries_rx) = watch::channel(entries);
        let (cooldown_tx, cooldown_rx) = watch::channel(0);
        Arc::new(Self {
            probe,
            targets,
            entries_tx,
            entries_rx,
            fetching: AtomicBool::new(false),
            cooldown_until: Mutex::new(None),
            cooldown_tx,
            cooldown_rx,
            auto_task: Mutex::new(None),
            cooldown_task: Mutex::new(None),
        })
    }

    pub fn subscribe(&self) -> watch::Receiver<Vec<ServiceStatusEntry>> {
        self.entries_rx.clone()
    }

    pub fn entries(&self) -> Vec<ServiceStatusEntry> {
        self.entries_rx.borrow().clone()
    }

    pub fn is_refreshing(&self) -> bool {
        self.fetching.load(Ordering::SeqCst)
    }

    /// Milliseconds left on the manual-refresh cooldown, updated every
    /// 250 ms while one is running
    pub fn cooldown_ms_left(&self) -> u64 {
        *self.cooldown_rx.borrow()
    }

    pub fn subscribe_cooldown(&self) -> watch::Receiver<u64> {
        self.cooldown_rx.clone()
    }

    /// Kick off the automatic polling loop
    pub fn start(self: &Arc<Self>) {
        let weak: Weak<Self> = Arc::downgrade(self);
        let handle = tokio::spawn(async move {
            loop {
                let poller = match weak.upgrade() {
                    Some(poller) => poller,
                    None => return,
                };
                let all_up = poller.run_pass().await;
                drop(poller);
                if all_up {
                    return;
                }
                sleep(POLL_INTERVAL).await;
            }
        });
        *self.auto_task.lock().unwrap() = Some(handle);
    }

    /// Force a pass now.
    ///
    /// Ignored while a pass is in flight or the cooldown from the previous
    /// manual refresh has not elapsed; otherwise any pending automatic pass
    /// is cancelled and a fresh cooldown starts, independent of how long
    /// the pass itself takes. Returns whether a pass actually ran.
    pub async fn refresh(self: &Arc<Self>) -> bool {
        if self.fetching.load(Ordering::SeqCst) {
            return false;
        }
        {
            let cooldown_until = self.cooldown_until.lock().unwrap();
            if let Some(until) = *cooldown_until {
                if Instant::now() < until {
                    return false;
                }
            }
        }
        if let Some(handle) = self.auto_task.lock().unwrap().take() {
            handle.abort();
        }
        self.start_cooldown();
        self.run_pass().await;
        true
    }

    fn start_cooldown(self: &Arc<Self>) {
        let until = Instant::now() + MANUAL_REFRESH_COOLDOWN;
        *self.cooldown_until.lock().unwrap() = Some(until);
        self.cooldown_tx
            .send_replace(MANUAL_REFRESH_COOLDOWN.as_millis() as u64);

        if let Some(handle) = self.cooldown_task.lock().unwrap().take() {
            handle.abort();
        }
        let weak: Weak<Self> = Arc::downgrade(self);
        let handle = tokio::spawn(async move {
            loop {
                sleep(COOLDOWN_TICK).await;
                let poller = match weak.upgrade() {
                    Some(poller) => poller,
                    None => return,
                };
                let remaining = until.saturating_duration_since(Instant::now());
                if remaining.is_zero() {
                    poller.cooldown_tx.send_replace(0);
                    *poller.cooldown_until.lock().unwrap() = None;
                    return;
                }
                poller.cooldown_tx.send_replace(remaining.as_millis() as u64);
            }
        });
        *self.cooldown_task.lock().unwrap() = Some(handle);
    }

    /// One full sequential pass over the targets; returns whether every
    /// target reported `UP`
    async fn run_pass(&self) -> bool {
        if self.fetching.swap(true, Ordering::SeqCst) {
            return self.all_up();
        }
        let mut all_up = true;
        for target in &self.targets {
            self.update_entry(&target.id, |entry| {
                entry.state = ProbeState::Loading;
            });
            match self.probe.probe(target).await {
                Ok(response) => {
                    if response.state != ServiceState::Up {
                        all_up = false;
                    }
                    self.update_entry(&target.id, |entry| {
                        entry.state = ProbeState::Success;
                        entry.service_state = Some(response.state);
                        entry.response = Some(response.clone());
                        entry.error = None;
                        entry.last_checked = Some(Utc::now());
                    });
                }
                Err(err) => {
                    // One dead target must not hide the health of the rest.
                    all_up = false;
                    let message = err.to_string();
                    log::warn!("status probe for {} failed: {}", target.id, message);
                    self.update_entry(&target.id, |entry| {
                        entry.state = ProbeState::Error;
                        entry.service_state = Some(ServiceState::Down);
                        entry.response = None;
                        entry.error = Some(message.clone());
                        entry.last_checked = Some(Utc::now());
                    });
                }
            }
        }
        self.fetching.store(false, Ordering::SeqCst);
        all_up
    }

    fn all_up(&self) -> bool {
        self.entries_rx
            .borrow()
            .iter()
            .all(|entry| entry.service_state == Some(ServiceState::Up))
    }

    fn update_entry(&self, target_id: &str, apply: impl Fn(&mut ServiceStatusEntry)) {
        self.entries_tx.send_modify(|entries| {
            if let Some(entry) = entries.iter_mut().find(|entry| entry.target.id == target_id) {
                apply(entry);
            }
        });
    }
}

impl Drop for StatusPoller {
    fn drop(&mut self) {
        for slot in [&self.auto_task, &self.cooldown_task] {
            if let Some(handle) = slot.lock().unwrap().take() {
                handle.abort();
            }
        }
    }
}
