// SPDX-License-Identifier: MIT

//! Display orderings, stored independently of the entities they order.
//!
//! One record per (project, entity type). Deleting a project drops all of
//! its orderings.

use crate::id::{OrderingId, ProjectId};
use serde::{Deserialize, Serialize};

/// Ordered id list for one entity type within one project.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Ordering {
    pub id: OrderingId,
    pub project_id: ProjectId,
    /// Entity type this ordering applies to (e.g. "task", "session").
    pub entity_type: String,
    pub ordered_ids: Vec<String>,
    pub updated_at_ms: u64,
}
