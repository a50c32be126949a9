use super::Session;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Minimum gap between idle sweeps triggered by new sessions.
const SWEEP_INTERVAL: Duration = Duration::from_secs(60);

struct Entry {
    session: Arc<tokio::sync::Mutex<Session>>,
    last_seen: Instant,
}

struct Registry {
    entries: HashMap<String, Entry>,
    last_sweep: Instant,
}

/// Registry of live sessions keyed by the random id carried in the session
/// cookie. The registry lock is held only for lookup/insert; each session has
/// its own async lock that an action keeps for its whole run.
///
/// Sessions untouched for longer than `idle` are dropped. The sweep piggybacks
/// on session creation, so the registry only grows while visitors keep
/// arriving within the idle window.
pub struct SessionStore {
    idle: Duration,
    registry: Mutex<Registry>,
}

/// A session resolved for one request.
#[derive(Clone)]
pub struct SessionHandle {
    pub id: String,
    pub session: Arc<tokio::sync::Mutex<Session>>,
}

impl SessionStore {
    pub fn new(idle: Duration) -> Self {
        Self {
            idle,
            registry: Mutex::new(Registry {
                entries: HashMap::new(),
                last_sweep: Instant::now(),
            }),
        }
    }

    /// Return the session for `id`, or start a new one under a fresh id when
    /// `id` is absent or unknown.
    pub fn get_or_create(&self, id: Option<&str>) -> SessionHandle {
        if let Some(handle) = id.and_then(|id| self.get(id)) {
            return handle;
        }

        let now = Instant::now();
        let mut registry = self.registry.lock();
        if now.duration_since(registry.last_sweep) >= SWEEP_INTERVAL {
            let removed = sweep(&mut registry.entries, now, self.idle);
            registry.last_sweep = now;
            if removed > 0 {
                tracing::debug!("Evicted {} idle sessions", removed);
            }
        }

        let id = uuid::Uuid::new_v4().to_string();
        let session = Arc::new(tokio::sync::Mutex::new(Session::new()));
        registry.entries.insert(
            id.clone(),
            Entry {
                session: Arc::clone(&session),
                last_seen: now,
            },
        );
        tracing::debug!("Started session {}", id);
        SessionHandle { id, session }
    }

    /// Look up an existing session without ever creating one.
    pub fn get(&self, id: &str) -> Option<SessionHandle> {
        let mut registry = self.registry.lock();
        let entry = registry.entries.get_mut(id)?;
        entry.last_seen = Instant::now();
        Some(SessionHandle {
            id: id.to_string(),
            session: Arc::clone(&entry.session),
        })
    }

    /// Drop every session idle for longer than `idle`. Returns how many went.
    pub fn cleanup(&self, idle: Duration) -> usize {
        let now = Instant::now();
        let mut registry = self.registry.lock();
        registry.last_sweep = now;
        sweep(&mut registry.entries, now, idle)
    }

    pub fn len(&self) -> usize {
        self.registry.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.registry.lock().entries.is_empty()
    }
}

fn sweep(entries: &mut HashMap<String, Entry>, now: Instant, idle: Duration) -> usize {
    let before = entries.len();
    entries.retain(|_, entry| now.duration_since(entry.last_seen) <= idle);
    before - entries.len()
}
