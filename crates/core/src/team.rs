// SPDX-License-Identifier: MIT

//! Team aggregate: a named grouping of members with one leader.
//!
//! Teams may nest via `sub_team_ids`; the relation must stay acyclic and
//! children mirror their parent in `parent_team_id`.

use crate::id::{ProjectId, TeamId, TeamMemberId};
use serde::{Deserialize, Serialize};

/// A named group of team members.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Team {
    pub id: TeamId,
    pub project_id: ProjectId,
    pub name: String,
    pub member_ids: Vec<TeamMemberId>,
    /// Invariant: `leader_id ∈ member_ids`.
    pub leader_id: TeamMemberId,
    #[serde(default)]
    pub sub_team_ids: Vec<TeamId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_team_id: Option<TeamId>,
    pub created_at_ms: u64,
    pub updated_at_ms: u64,
}

impl Team {
    /// Leader must be a member.
    pub fn leader_is_member(&self) -> bool {
        self.member_ids.contains(&self.leader_id)
    }
}

crate::builder! {
    pub struct TeamBuilder => Team {
        into {
            id: TeamId = "team_test",
            project_id: ProjectId = "proj_test",
            name: String = "test-team",
            leader_id: TeamMemberId = "tm_lead",
        }
        set {
            member_ids: Vec<TeamMemberId> = vec![crate::id::TeamMemberId::from_string("tm_lead")],
            sub_team_ids: Vec<TeamId> = Vec::new(),
            created_at_ms: u64 = 0,
            updated_at_ms: u64 = 0,
        }
        option {
            parent_team_id: TeamId,
        }
    }
}
