// SPDX-License-Identifier: MIT

//! On-demand log digests.
//!
//! Produces a text-only activity summary for a session by reading the
//! agent CLI's external JSONL session log. Stateless by design: no
//! watchers, no descriptors held between calls — only a short-lived
//! (sessionId → path) cache, verified against the filesystem on every
//! hit. Unreadable or missing logs yield a benign empty digest, never an
//! error to the caller.

mod discover;
mod extract;

pub use discover::LogSource;
pub use extract::{DigestEntry, EntryKind, StuckInfo};

use crate::services::ServiceCtx;
use maestro_core::{Clock, DomainError, SessionId, SessionStatus};
use maestro_storage::SessionFilter;
use parking_lot::Mutex;
use serde::Serialize;
use std::collections::HashMap;
use std::path::PathBuf;
use std::time::{Duration, Instant};

/// How long a discovered log path may be reused before re-scanning.
const PATH_CACHE_TTL: Duration = Duration::from_secs(60);

/// Default cap on returned entries per session.
pub const DEFAULT_LAST: usize = 20;

/// Default per-entry truncation length; `0` disables truncation.
pub const DEFAULT_MAX_LENGTH: usize = 150;

/// Where to look for agent session logs.
#[derive(Debug, Clone)]
pub struct DigestConfig {
    /// Claude project log root (conventionally `~/.claude/projects`).
    pub claude_projects_dir: PathBuf,
    /// Codex session log root (conventionally `~/.codex/sessions`).
    pub codex_sessions_dir: PathBuf,
}

impl Default for DigestConfig {
    fn default() -> Self {
        let home = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
        Self {
            claude_projects_dir: home.join(".claude").join("projects"),
            codex_sessions_dir: home.join(".codex").join("sessions"),
        }
    }
}

/// Lifecycle summary derived from the session record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DigestState {
    Active,
    Idle,
    NeedsInput,
}

/// The digest for one session.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionDigest {
    pub session_id: SessionId,
    pub state: DigestState,
    pub entries: Vec<DigestEntry>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stuck: Option<StuckInfo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<LogSource>,
}

impl SessionDigest {
    fn empty(session_id: SessionId, state: DigestState) -> Self {
        Self { session_id, state, entries: Vec::new(), stuck: None, source: None }
    }
}

struct CachedPath {
    path: PathBuf,
    source: LogSource,
    resolved_at: Instant,
}

pub struct DigestService<C: Clock> {
    ctx: ServiceCtx<C>,
    config: DigestConfig,
    cache: Mutex<HashMap<SessionId, CachedPath>>,
}

impl<C: Clock> DigestService<C> {
    pub fn new(ctx: ServiceCtx<C>, config: DigestConfig) -> Self {
        Self { ctx, config, cache: Mutex::new(HashMap::new()) }
    }

    /// Digest one session's recent activity.
    ///
    /// `last` caps the number of entries; `max_length` truncates each entry
    /// (0 = unlimited). Only a missing session is an error — an absent or
    /// unreadable log file produces an empty digest.
    pub async fn get_digest(
        &self,
        session_id: &SessionId,
        last: Option<usize>,
        max_length: Option<usize>,
    ) -> Result<SessionDigest, DomainError> {
        let session = self
            .ctx
            .storage
            .sessions
            .find_by_id(session_id)
            .ok_or_else(|| DomainError::not_found("session", session_id.as_str()))?;
        let state = state_of(&session);

        let Some((path, source)) = self.locate_log(&session) else {
            return Ok(SessionDigest::empty(*session_id, state));
        };

        let records = match extract::read_tail_records(&path, source) {
            Ok(records) => records,
            Err(err) => {
                tracing::debug!(session = %session_id, path = %path.display(), error = %err, "log tail read failed");
                return Ok(SessionDigest::empty(*session_id, state));
            }
        };

        let now_ms = self.ctx.clock.epoch_ms();
        let stuck = extract::detect_stuck(&records, now_ms);
        let last = last.unwrap_or(DEFAULT_LAST);
        let max_length = max_length.unwrap_or(DEFAULT_MAX_LENGTH);
        let mut entries = extract::to_entries(records, max_length);
        if entries.len() > last {
            entries.drain(..entries.len() - last);
        }

        Ok(SessionDigest { session_id: *session_id, state, entries, stuck, source: Some(source) })
    }

    /// Digest every live worker of a coordinator, in parallel. A failing
    /// worker digest degrades to empty instead of blocking the rest.
    pub async fn get_worker_digests(
        &self,
        coordinator_session_id: &SessionId,
        last: Option<usize>,
        max_length: Option<usize>,
    ) -> Vec<SessionDigest> {
        let workers = self.ctx.storage.sessions.find_all(&SessionFilter {
            parent_session_id: Some(*coordinator_session_id),
            active: Some(true),
            ..Default::default()
        });
        let futures = workers.iter().map(|worker| {
            let id = worker.id;
            let state = state_of(worker);
            async move {
                self.get_digest(&id, last, max_length)
                    .await
                    .unwrap_or_else(|_| SessionDigest::empty(id, state))
            }
        });
        futures_util::future::join_all(futures).await
    }

    /// Digest an explicit list of sessions, skipping unknown ids.
    pub async fn get_digests(
        &self,
        session_ids: &[SessionId],
        last: Option<usize>,
        max_length: Option<usize>,
    ) -> Vec<SessionDigest> {
        let futures = session_ids.iter().map(|id| async move {
            self.get_digest(id, last, max_length).await.ok()
        });
        futures_util::future::join_all(futures).await.into_iter().flatten().collect()
    }

    /// Resolve the session's log file, consulting the cache first.
    fn locate_log(&self, session: &maestro_core::Session) -> Option<(PathBuf, LogSource)> {
        {
            let cache = self.cache.lock();
            if let Some(cached) = cache.get(&session.id) {
                if cached.resolved_at.elapsed() < PATH_CACHE_TTL && cached.path.exists() {
                    return Some((cached.path.clone(), cached.source));
                }
            }
        }

        let working_dir = self
            .ctx
            .storage
            .projects
            .find_by_id(&session.project_id)
            .map(|p| p.working_dir);
        let found = discover::find_log_file(
            &self.config,
            session.id.as_str(),
            working_dir.as_deref(),
        )?;

        self.cache.lock().insert(
            session.id,
            CachedPath { path: found.0.clone(), source: found.1, resolved_at: Instant::now() },
        );
        Some(found)
    }
}

/// Map session status onto the digest state.
fn state_of(session: &maestro_core::Session) -> DigestState {
    if session.needs_input.active {
        return DigestState::NeedsInput;
    }
    match session.status {
        SessionStatus::Working | SessionStatus::Spawning => DigestState::Active,
        _ => DigestState::Idle,
    }
}

#[cfg(test)]
#[path = "digest_tests.rs"]
mod tests;
