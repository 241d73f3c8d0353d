// SPDX-License-Identifier: MIT

//! Team member identity records.
//!
//! Default members are code-provided; user edits to them live in an
//! overlay keyed by member id, and `reset` drops the overlay. Custom
//! members are stored independently. Deletion requires `archived` status
//! and is never allowed for defaults.

use crate::id::{ProjectId, TeamMemberId};
use serde::{Deserialize, Serialize};

/// Lifecycle status of a team member.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MemberStatus {
    #[default]
    Active,
    Archived,
}

crate::simple_display! {
    MemberStatus {
        Active => "active",
        Archived => "archived",
    }
}

/// Identity metadata for an agent persona.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamMember {
    pub id: TeamMemberId,
    pub project_id: ProjectId,
    pub name: String,
    pub role: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agent_tool: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<String>,
    #[serde(default)]
    pub skills: Vec<String>,
    #[serde(default)]
    pub capabilities: Vec<String>,
    #[serde(default)]
    pub command_permissions: Vec<String>,
    /// Code-provided members; edited via overlay, never deleted.
    #[serde(default)]
    pub is_default: bool,
    #[serde(default)]
    pub status: MemberStatus,
    pub created_at_ms: u64,
    pub updated_at_ms: u64,
}

/// Partial update applied to a member (or recorded as a default's overlay).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamMemberPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agent_tool: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skills: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub capabilities: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub command_permissions: Option<Vec<String>>,
}

impl TeamMemberPatch {
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }

    /// Apply the patch on top of a member, returning the merged record.
    pub fn apply_to(&self, base: &TeamMember) -> TeamMember {
        let mut merged = base.clone();
        if let Some(name) = &self.name {
            merged.name = name.clone();
        }
        if let Some(role) = &self.role {
            merged.role = role.clone();
        }
        if let Some(avatar) = &self.avatar {
            merged.avatar = Some(avatar.clone());
        }
        if let Some(model) = &self.model {
            merged.model = Some(model.clone());
        }
        if let Some(agent_tool) = &self.agent_tool {
            merged.agent_tool = Some(agent_tool.clone());
        }
        if let Some(mode) = &self.mode {
            merged.mode = Some(mode.clone());
        }
        if let Some(skills) = &self.skills {
            merged.skills = skills.clone();
        }
        if let Some(capabilities) = &self.capabilities {
            merged.capabilities = capabilities.clone();
        }
        if let Some(command_permissions) = &self.command_permissions {
            merged.command_permissions = command_permissions.clone();
        }
        merged
    }
}

crate::builder! {
    pub struct TeamMemberBuilder => TeamMember {
        into {
            id: TeamMemberId = "tm_test",
            project_id: ProjectId = "proj_test",
            name: String = "test-member",
            role: String = "engineer",
        }
        set {
            skills: Vec<String> = Vec::new(),
            capabilities: Vec<String> = Vec::new(),
            command_permissions: Vec<String> = Vec::new(),
            is_default: bool = false,
            status: MemberStatus = MemberStatus::Active,
            created_at_ms: u64 = 0,
            updated_at_ms: u64 = 0,
        }
        option {
            avatar: String,
            model: String,
            agent_tool: String,
            mode: String,
        }
    }
}
