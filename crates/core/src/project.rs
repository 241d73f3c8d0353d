// SPDX-License-Identifier: MIT

//! Project aggregate.
//!
//! A project owns tasks, sessions, task lists, teams, team members, and
//! orderings. It cannot be deleted while tasks or sessions still reference
//! it.

use crate::id::ProjectId;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// A project: the root of ownership for all other aggregates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: ProjectId,
    pub name: String,
    /// Directory agents spawned for this project execute in.
    pub working_dir: PathBuf,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// At most one project per store is the master; sessions created under
    /// it inherit `MAESTRO_IS_MASTER=true` in their env.
    #[serde(default)]
    pub is_master: bool,
    pub created_at_ms: u64,
    pub updated_at_ms: u64,
}

crate::builder! {
    pub struct ProjectBuilder => Project {
        into {
            id: ProjectId = "proj_test",
            name: String = "test-project",
            working_dir: PathBuf = "/tmp/project",
        }
        set {
            is_master: bool = false,
            created_at_ms: u64 = 0,
            updated_at_ms: u64 = 0,
        }
        option {
            description: String,
        }
    }
}
