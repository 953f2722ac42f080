use std::sync::Arc;

use shared::domain::{FlagKey, FlagValue, FlagValueMap, OrgId};
use tokio::sync::{broadcast, Mutex};
use tracing::{debug, info, warn};

use crate::{ClientError, FlagsApi};

pub const NO_ORGANIZATION_SELECTED: &str = "No organization selected";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    Idle,
    Loading,
    Ready,
    Failed,
}

/// Point-in-time copy of the session state handed to views.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionSnapshot {
    pub selected_org: Option<OrgId>,
    pub values: FlagValueMap,
    pub loading: bool,
    pub error: Option<String>,
    pub phase: SessionPhase,
}

impl SessionSnapshot {
    pub fn value(&self, key: FlagKey) -> Option<&FlagValue> {
        self.values.get(key.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    Loaded {
        org_id: OrgId,
        flag_count: usize,
    },
    LoadFailed {
        org_id: OrgId,
        message: String,
    },
    /// A load finished after the selection had already moved on.
    StaleLoadDiscarded {
        org_id: OrgId,
    },
    FlagUpdated {
        org_id: OrgId,
        key: FlagKey,
        value: FlagValue,
    },
    FlagRolledBack {
        org_id: OrgId,
        key: FlagKey,
        restored: Option<FlagValue>,
        message: String,
    },
    Cleared,
}

#[derive(Debug)]
struct SessionState {
    selected_org: Option<OrgId>,
    values: FlagValueMap,
    loading: bool,
    error: Option<String>,
    phase: SessionPhase,
    /// Bumped on every selection change or refetch. Async completions only
    /// touch state when the generation they started under is still current.
    generation: u64,
}

impl SessionState {
    fn idle() -> Self {
        Self {
            selected_org: None,
            values: FlagValueMap::new(),
            loading: false,
            error: None,
            phase: SessionPhase::Idle,
            generation: 0,
        }
    }
}

/// Flag state of the selected organization, kept in step with the store.
///
/// Writes are applied optimistically and rolled back when the store rejects
/// them. Two overlapping writes to the same key are last-write-wins: a failed
/// earlier write restores the value it saw, even over a later success.
pub struct FlagSession {
    api: Arc<dyn FlagsApi>,
    inner: Mutex<SessionState>,
    events: broadcast::Sender<SessionEvent>,
}

impl FlagSession {
    pub fn new(api: Arc<dyn FlagsApi>) -> Arc<Self> {
        let (events, _) = broadcast::channel(256);
        Arc::new(Self {
            api,
            inner: Mutex::new(SessionState::idle()),
            events,
        })
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    pub async fn snapshot(&self) -> SessionSnapshot {
        let guard = self.inner.lock().await;
        SessionSnapshot {
            selected_org: guard.selected_org.clone(),
            values: guard.values.clone(),
            loading: guard.loading,
            error: guard.error.clone(),
            phase: guard.phase,
        }
    }

    pub async fn selected_org(&self) -> Option<OrgId> {
        self.inner.lock().await.selected_org.clone()
    }

    /// Selecting the same organization again reloads it.
    pub async fn select_org(&self, org_id: Option<OrgId>) {
        match org_id {
            Some(org_id) => self.load(org_id).await,
            None => self.clear().await,
        }
    }

    /// Reloads the current organization. No-op without a selection.
    pub async fn refetch(&self) {
        let selected = self.selected_org().await;
        if let Some(org_id) = selected {
            self.load(org_id).await;
        }
    }

    /// Writes `value` under `key` for the selected organization.
    ///
    /// The local value changes before the request is sent. On failure the
    /// previous value (or its absence) is restored unless the flags were
    /// reloaded in the meantime. The error is recorded on the session while
    /// the same organization stays selected, and is returned to the caller.
    pub async fn toggle_flag(&self, key: FlagKey, value: FlagValue) -> Result<(), ClientError> {
        let (org_id, previous, generation) = {
            let mut guard = self.inner.lock().await;
            let Some(org_id) = guard.selected_org.clone() else {
                guard.error = Some(NO_ORGANIZATION_SELECTED.to_string());
                return Err(ClientError::Validation(NO_ORGANIZATION_SELECTED.to_string()));
            };
            let previous = guard.values.insert(key.as_str().to_string(), value.clone());
            (org_id, previous, guard.generation)
        };

        match self.api.update_flag(&org_id, key, &value).await {
            Ok(()) => {
                info!(org_id = %org_id, flag = %key, value = %value, "feature flag updated");
                let _ = self.events.send(SessionEvent::FlagUpdated { org_id, key, value });
                Ok(())
            }
            Err(err) => {
                warn!(org_id = %org_id, flag = %key, error = %err, "feature flag update failed, rolling back");
                let message = err.to_string();
                {
                    let mut guard = self.inner.lock().await;
                    // A reload since the write began already holds the store's value.
                    if guard.generation == generation {
                        match &previous {
                            Some(old) => {
                                guard.values.insert(key.as_str().to_string(), old.clone());
                            }
                            None => {
                                guard.values.remove(key.as_str());
                            }
                        }
                    } else {
                        debug!(org_id = %org_id, flag = %key, "flags reloaded, skipping rollback");
                    }
                    if guard.selected_org.as_ref() == Some(&org_id) {
                        guard.error = Some(message.clone());
                    }
                }
                let _ = self.events.send(SessionEvent::FlagRolledBack {
                    org_id,
                    key,
                    restored: previous,
                    message,
                });
                Err(err)
            }
        }
    }

    async fn load(&self, org_id: OrgId) {
        let generation = {
            let mut guard = self.inner.lock().await;
            guard.generation += 1;
            if guard.selected_org.as_ref() != Some(&org_id) {
                guard.values.clear();
            }
            guard.selected_org = Some(org_id.clone());
            guard.loading = true;
            guard.error = None;
            guard.phase = SessionPhase::Loading;
            guard.generation
        };

        let result = self.api.fetch_flags(&org_id).await;

        let mut guard = self.inner.lock().await;
        if guard.generation != generation {
            debug!(org_id = %org_id, "discarding superseded flag load");
            let _ = self.events.send(SessionEvent::StaleLoadDiscarded { org_id });
            return;
        }
        guard.loading = false;
        match result {
            Ok(values) => {
                let flag_count = values.len();
                guard.values = values;
                guard.phase = SessionPhase::Ready;
                debug!(org_id = %org_id, flag_count, "feature flags loaded");
                let _ = self.events.send(SessionEvent::Loaded { org_id, flag_count });
            }
            Err(err) => {
                let message = err.to_string();
                warn!(org_id = %org_id, error = %message, "failed to load feature flags");
                guard.values.clear();
                guard.error = Some(message.clone());
                guard.phase = SessionPhase::Failed;
                let _ = self.events.send(SessionEvent::LoadFailed { org_id, message });
            }
        }
    }

    async fn clear(&self) {
        let mut guard = self.inner.lock().await;
        let generation = guard.generation + 1;
        *guard = SessionState::idle();
        guard.generation = generation;
        drop(guard);
        let _ = self.events.send(SessionEvent::Cleared);
    }
}

#[cfg(test)]
#[path = "tests/session_tests.rs"]
mod tests;
