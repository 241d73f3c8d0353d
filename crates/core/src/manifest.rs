// SPDX-License-Identifier: MIT

//! Spawn manifest: the JSON file describing what a spawned agent should do.
//!
//! Written by the spawn orchestrator at
//! `~/.maestro/sessions/<sessionId>/manifest.json`; agents may delete it on
//! exit. Required top-level fields: `manifestVersion`, exactly one of
//! `role`/`mode`, `task` or `tasks`, and `session` with `model` and
//! `permissionMode`.

use crate::id::{ProjectId, SessionId, TaskId};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub const MANIFEST_VERSION: u32 = 1;

/// Session block of the manifest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManifestSession {
    pub id: SessionId,
    pub model: String,
    pub permission_mode: String,
    pub working_dir: PathBuf,
}

/// Task block of the manifest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManifestTask {
    pub id: TaskId,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub initial_prompt: Option<String>,
}

/// The full manifest handed to a spawned agent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Manifest {
    pub manifest_version: u32,
    pub role: String,
    pub project_id: ProjectId,
    pub session: ManifestSession,
    pub tasks: Vec<ManifestTask>,
    #[serde(default)]
    pub skills: Vec<String>,
}

/// Validate the structural contract on a generated manifest value.
///
/// The generator is a replaceable collaborator, so the orchestrator checks
/// the structure it got back rather than trusting the writer.
pub fn validate_manifest(value: &serde_json::Value) -> Result<(), String> {
    let obj = value.as_object().ok_or("manifest is not a JSON object")?;
    if !obj.contains_key("manifestVersion") {
        return Err("manifest is missing manifestVersion".into());
    }
    if !obj.contains_key("role") && !obj.contains_key("mode") {
        return Err("manifest is missing role/mode".into());
    }
    if !obj.contains_key("task") && !obj.contains_key("tasks") {
        return Err("manifest is missing task/tasks".into());
    }
    let session = obj
        .get("session")
        .and_then(|s| s.as_object())
        .ok_or("manifest is missing session")?;
    if !session.contains_key("model") {
        return Err("manifest session is missing model".into());
    }
    if !session.contains_key("permissionMode") {
        return Err("manifest session is missing permissionMode".into());
    }
    Ok(())
}
