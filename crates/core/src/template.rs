// SPDX-License-Identifier: MIT

//! Role-keyed prompt templates with code-provided defaults.

use serde::{Deserialize, Serialize};

/// A prompt template for one role. `reset` restores the code default.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Template {
    /// Role key, e.g. "worker" or "orchestrator".
    pub role: String,
    pub content: String,
    pub updated_at_ms: u64,
}

/// Code-provided default template content for a role, if one exists.
pub fn default_template(role: &str) -> Option<&'static str> {
    match role {
        "worker" => Some(WORKER_DEFAULT),
        "orchestrator" => Some(ORCHESTRATOR_DEFAULT),
        _ => None,
    }
}

const WORKER_DEFAULT: &str = "\
You are a worker agent. Read your manifest for the task list, work the tasks \
in order, and report progress through the Maestro API. Mark each task's \
session status as you go; never mark the task itself done.";

const ORCHESTRATOR_DEFAULT: &str = "\
You are a coordinator agent. Spawn worker sessions for the tasks in your \
manifest, watch their digests, and intervene with directives when a worker \
stalls. Collect results and report a summary when all workers finish.";
