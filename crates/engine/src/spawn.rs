// SPDX-License-Identifier: MIT

//! Spawn orchestrator.
//!
//! Assembles everything a new worker/coordinator session needs — the
//! session record, the manifest file on disk, and the environment
//! contract — and emits exactly one consolidated `session:created` event
//! carrying the spawn payload. No spawn-request topic exists.

use crate::services::{CreateSession, ServiceCtx, SessionService, TemplateService};
use async_trait::async_trait;
use maestro_core::{
    validate_manifest, Clock, DomainError, Manifest, ManifestSession, ManifestTask, MaestroEvent,
    ProjectId, Session, SessionId, SessionRole, SessionStatus, SpawnPayload, TaskId,
    MANIFEST_VERSION,
};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Who asked for the spawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpawnSource {
    Manual,
    Orchestrator,
}

/// Input for [`SpawnService::spawn_session`].
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpawnRequest {
    pub project_id: ProjectId,
    pub task_ids: Vec<TaskId>,
    pub spawn_source: SpawnSource,
    pub role: SessionRole,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub team_member_id: Option<maestro_core::TeamMemberId>,
    #[serde(default)]
    pub parent_session_id: Option<SessionId>,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub permission_mode: Option<String>,
    #[serde(default)]
    pub skills: Vec<String>,
}

/// Spawn orchestrator configuration.
#[derive(Debug, Clone)]
pub struct SpawnConfig {
    /// Base URL advertised to agents as `MAESTRO_SERVER_URL`.
    pub server_url: String,
    /// Root for manifest files (conventionally `~/.maestro/sessions`).
    pub sessions_dir: PathBuf,
    /// Command line the host runs to start the agent.
    pub agent_command: String,
}

impl Default for SpawnConfig {
    fn default() -> Self {
        let home = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
        Self {
            server_url: "http://127.0.0.1:8700".into(),
            sessions_dir: home.join(".maestro").join("sessions"),
            agent_command: "claude".into(),
        }
    }
}

/// Writes a manifest to disk and returns the JSON that landed there.
///
/// The orchestrator validates the returned structure rather than trusting
/// the writer, so alternative generators (external tooling) stay honest.
#[async_trait]
pub trait ManifestGenerator: Send + Sync {
    async fn generate(
        &self,
        manifest: &Manifest,
        path: &Path,
    ) -> Result<serde_json::Value, DomainError>;
}

/// Default generator: serialize and write the file in-process.
pub struct FsManifestGenerator;

#[async_trait]
impl ManifestGenerator for FsManifestGenerator {
    async fn generate(
        &self,
        manifest: &Manifest,
        path: &Path,
    ) -> Result<serde_json::Value, DomainError> {
        let value = serde_json::to_value(manifest).map_err(|err| {
            DomainError::ManifestGeneration { detail: err.to_string() }
        })?;
        let parent = path
            .parent()
            .ok_or_else(|| DomainError::ManifestGeneration {
                detail: format!("manifest path has no parent: {}", path.display()),
            })?;
        tokio::fs::create_dir_all(parent).await.map_err(|err| {
            DomainError::ManifestGeneration { detail: err.to_string() }
        })?;
        let bytes = serde_json::to_vec_pretty(&value).map_err(|err| {
            DomainError::ManifestGeneration { detail: err.to_string() }
        })?;
        tokio::fs::write(path, bytes).await.map_err(|err| {
            DomainError::ManifestGeneration { detail: err.to_string() }
        })?;
        Ok(value)
    }
}

pub struct SpawnService<C: Clock> {
    ctx: ServiceCtx<C>,
    sessions: SessionService<C>,
    templates: TemplateService<C>,
    generator: std::sync::Arc<dyn ManifestGenerator>,
    config: SpawnConfig,
}

impl<C: Clock> SpawnService<C> {
    pub fn new(
        ctx: ServiceCtx<C>,
        sessions: SessionService<C>,
        templates: TemplateService<C>,
        generator: std::sync::Arc<dyn ManifestGenerator>,
        config: SpawnConfig,
    ) -> Self {
        Self { ctx, sessions, templates, generator, config }
    }

    /// Spawn a session for a task set.
    ///
    /// One `session:created` event is emitted, carrying the full session
    /// plus the spawn payload marked `_isSpawnCreated`, followed by one
    /// `task:session_added` per task.
    pub async fn spawn_session(&self, request: SpawnRequest) -> Result<Session, DomainError> {
        if request.task_ids.is_empty() {
            return Err(DomainError::validation("spawn requires at least one task"));
        }
        let project = self
            .ctx
            .storage
            .projects
            .find_by_id(&request.project_id)
            .ok_or_else(|| DomainError::not_found("project", request.project_id.as_str()))?;
        let mut tasks = Vec::with_capacity(request.task_ids.len());
        for task_id in &request.task_ids {
            tasks.push(
                self.ctx
                    .storage
                    .tasks
                    .find_by_id(task_id)
                    .ok_or_else(|| DomainError::not_found("task", task_id.as_str()))?,
            );
        }

        // Reserved env keys are present from the start so a partially
        // spawned session is recognizable.
        let reserved_env: HashMap<String, String> = [
            ("MAESTRO_SESSION_ID", ""),
            ("MAESTRO_MANIFEST_PATH", ""),
            ("MAESTRO_SERVER_URL", ""),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();

        let session = self
            .sessions
            .create_session(CreateSession {
                project_id: request.project_id,
                name: request.name.clone(),
                task_ids: request.task_ids.clone(),
                status: Some(SessionStatus::Spawning),
                env: reserved_env,
                team_member_id: request.team_member_id,
                parent_session_id: request.parent_session_id,
                role: Some(request.role),
                suppress_created_event: true,
            })
            .await?;

        let manifest_path = self
            .config
            .sessions_dir
            .join(session.id.as_str())
            .join("manifest.json");
        let manifest = self.build_manifest(&session, &project, &tasks, &request);
        let manifest_json = self.generator.generate(&manifest, &manifest_path).await?;
        validate_manifest(&manifest_json)
            .map_err(|detail| DomainError::ManifestGeneration { detail })?;

        // The exact environment contract: three keys, plus the master flag
        // when inherited from the project.
        let mut env: HashMap<String, String> = HashMap::from([
            ("MAESTRO_SESSION_ID".to_string(), session.id.to_string()),
            (
                "MAESTRO_MANIFEST_PATH".to_string(),
                manifest_path.to_string_lossy().into_owned(),
            ),
            ("MAESTRO_SERVER_URL".to_string(), self.config.server_url.clone()),
        ]);
        if project.is_master {
            env.insert("MAESTRO_IS_MASTER".to_string(), "true".to_string());
        }

        let mut session = session;
        session.env = env.clone();
        session.updated_at_ms = self.ctx.clock.epoch_ms();
        self.ctx.storage.sessions.update(session.clone())?;

        self.ctx.bus.emit(MaestroEvent::SessionCreated {
            session: session.clone(),
            spawn: Some(SpawnPayload {
                command: self.config.agent_command.clone(),
                cwd: project.working_dir.clone(),
                env_vars: env,
                manifest: manifest_json,
                project_id: project.id,
                task_ids: request.task_ids.clone(),
                is_spawn_created: true,
            }),
        });
        for task_id in &request.task_ids {
            self.ctx
                .bus
                .emit(MaestroEvent::TaskSessionAdded { task_id: *task_id, session_id: session.id });
        }
        Ok(session)
    }

    fn build_manifest(
        &self,
        session: &Session,
        project: &maestro_core::Project,
        tasks: &[maestro_core::Task],
        request: &SpawnRequest,
    ) -> Manifest {
        let mut skills = request.skills.clone();
        for task in tasks {
            for skill in &task.skill_ids {
                if !skills.contains(skill) {
                    skills.push(skill.clone());
                }
            }
        }
        let role = request.role.to_string();
        let initial_prompt_fallback = self.templates.get_template(&role).ok().map(|t| t.content);
        Manifest {
            manifest_version: MANIFEST_VERSION,
            role,
            project_id: project.id,
            session: ManifestSession {
                id: session.id,
                model: request.model.clone().unwrap_or_else(|| "default".into()),
                permission_mode: request
                    .permission_mode
                    .clone()
                    .unwrap_or_else(|| "acceptEdits".into()),
                working_dir: project.working_dir.clone(),
            },
            tasks: tasks
                .iter()
                .map(|task| ManifestTask {
                    id: task.id,
                    title: task.title.clone(),
                    initial_prompt: task
                        .initial_prompt
                        .clone()
                        .or_else(|| initial_prompt_fallback.clone()),
                })
                .collect(),
            skills,
        }
    }
}

#[cfg(test)]
#[path = "spawn_tests.rs"]
mod tests;
