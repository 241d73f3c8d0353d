// SPDX-License-Identifier: MIT

//! Teams: member grouping with one leader and acyclic nesting.

use super::member::TeamMemberService;
use super::ServiceCtx;
use maestro_core::{Clock, DomainError, ProjectId, Team, TeamId, TeamMemberId};

/// Input for [`TeamService::create_team`].
#[derive(Debug, Clone, Default, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTeam {
    pub project_id: ProjectId,
    pub name: String,
    pub member_ids: Vec<TeamMemberId>,
    pub leader_id: TeamMemberId,
}

/// Partial update for [`TeamService::update_team`].
#[derive(Debug, Clone, Default, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamPatch {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub member_ids: Option<Vec<TeamMemberId>>,
    #[serde(default)]
    pub leader_id: Option<TeamMemberId>,
}

pub struct TeamService<C: Clock> {
    ctx: ServiceCtx<C>,
    members: TeamMemberService<C>,
}

impl<C: Clock> Clone for TeamService<C> {
    fn clone(&self) -> Self {
        Self { ctx: self.ctx.clone(), members: self.members.clone() }
    }
}

impl<C: Clock> TeamService<C> {
    pub fn new(ctx: ServiceCtx<C>, members: TeamMemberService<C>) -> Self {
        Self { ctx, members }
    }

    fn check_members(
        &self,
        project_id: &ProjectId,
        member_ids: &[TeamMemberId],
        leader_id: &TeamMemberId,
    ) -> Result<(), DomainError> {
        for member_id in member_ids {
            self.members.get_member(project_id, member_id)?;
        }
        if !member_ids.contains(leader_id) {
            return Err(DomainError::business_rule("team leader must be a member"));
        }
        Ok(())
    }

    pub async fn create_team(&self, input: CreateTeam) -> Result<Team, DomainError> {
        let name = input.name.trim().to_string();
        if name.is_empty() {
            return Err(DomainError::validation("team name must not be empty"));
        }
        if !self.ctx.storage.projects.exists(&input.project_id) {
            return Err(DomainError::not_found("project", input.project_id.as_str()));
        }
        self.check_members(&input.project_id, &input.member_ids, &input.leader_id)?;

        let now = self.ctx.clock.epoch_ms();
        let team = Team {
            id: TeamId::generate(&self.ctx.ids),
            project_id: input.project_id,
            name,
            member_ids: input.member_ids,
            leader_id: input.leader_id,
            sub_team_ids: Vec::new(),
            parent_team_id: None,
            created_at_ms: now,
            updated_at_ms: now,
        };
        self.ctx.storage.teams.create(team.clone())?;
        Ok(team)
    }

    pub fn get_team(&self, id: &TeamId) -> Result<Team, DomainError> {
        self.ctx
            .storage
            .teams
            .find_by_id(id)
            .ok_or_else(|| DomainError::not_found("team", id.as_str()))
    }

    pub fn list_teams(&self, project_id: &ProjectId) -> Vec<Team> {
        self.ctx.storage.teams.find_in_project(project_id)
    }

    pub async fn update_team(&self, id: &TeamId, patch: TeamPatch) -> Result<Team, DomainError> {
        let _guard = self.ctx.locks.acquire(id.as_str()).await;
        let mut team = self.get_team(id)?;
        if let Some(name) = patch.name {
            let name = name.trim().to_string();
            if name.is_empty() {
                return Err(DomainError::validation("team name must not be empty"));
            }
            team.name = name;
        }
        if let Some(member_ids) = patch.member_ids {
            team.member_ids = member_ids;
        }
        if let Some(leader_id) = patch.leader_id {
            team.leader_id = leader_id;
        }
        self.check_members(&team.project_id, &team.member_ids, &team.leader_id)?;
        team.updated_at_ms = self.ctx.clock.epoch_ms();
        self.ctx.storage.teams.update(team.clone())?;
        Ok(team)
    }

    /// Delete a team, detaching it from its parent and releasing its
    /// children.
    pub async fn delete_team(&self, id: &TeamId) -> Result<(), DomainError> {
        let _guard = self.ctx.locks.acquire(id.as_str()).await;
        let team = self.get_team(id)?;
        if let Some(parent_id) = &team.parent_team_id {
            if let Some(mut parent) = self.ctx.storage.teams.find_by_id(parent_id) {
                parent.sub_team_ids.retain(|t| t != id);
                self.ctx.storage.teams.update(parent)?;
            }
        }
        for child_id in &team.sub_team_ids {
            if let Some(mut child) = self.ctx.storage.teams.find_by_id(child_id) {
                if child.parent_team_id.as_ref() == Some(id) {
                    child.parent_team_id = None;
                    self.ctx.storage.teams.update(child)?;
                }
            }
        }
        self.ctx.storage.teams.delete(id)?;
        Ok(())
    }

    /// Nest `child` under `parent`, rejecting anything that would close a
    /// cycle. The child mirrors the relation in `parent_team_id`.
    pub async fn add_sub_team(
        &self,
        parent_id: &TeamId,
        child_id: &TeamId,
    ) -> Result<Team, DomainError> {
        if parent_id == child_id {
            return Err(DomainError::business_rule("a team cannot contain itself"));
        }
        let _guard = self.ctx.locks.acquire(parent_id.as_str()).await;
        let mut parent = self.get_team(parent_id)?;
        let mut child = self.get_team(child_id)?;
        if parent.project_id != child.project_id {
            return Err(DomainError::validation("sub-team belongs to another project"));
        }
        if let Some(existing) = &child.parent_team_id {
            if existing != parent_id {
                return Err(DomainError::business_rule("team already has a parent"));
            }
        }
        // DFS from the proposed child: if the parent is reachable, adding
        // the edge would close a cycle.
        if self.is_descendant(child_id, parent_id)? {
            return Err(DomainError::business_rule("sub-team cycle rejected"));
        }

        if !parent.sub_team_ids.contains(child_id) {
            parent.sub_team_ids.push(*child_id);
        }
        child.parent_team_id = Some(*parent_id);
        let now = self.ctx.clock.epoch_ms();
        parent.updated_at_ms = now;
        child.updated_at_ms = now;
        self.ctx.storage.teams.update(child)?;
        self.ctx.storage.teams.update(parent.clone())?;
        Ok(parent)
    }

    /// Detach `child` from `parent`; the mirror pointer is cleared only if
    /// it still names the remover.
    pub async fn remove_sub_team(
        &self,
        parent_id: &TeamId,
        child_id: &TeamId,
    ) -> Result<Team, DomainError> {
        let _guard = self.ctx.locks.acquire(parent_id.as_str()).await;
        let mut parent = self.get_team(parent_id)?;
        parent.sub_team_ids.retain(|t| t != child_id);
        parent.updated_at_ms = self.ctx.clock.epoch_ms();
        if let Some(mut child) = self.ctx.storage.teams.find_by_id(child_id) {
            if child.parent_team_id.as_ref() == Some(parent_id) {
                child.parent_team_id = None;
                self.ctx.storage.teams.update(child)?;
            }
        }
        self.ctx.storage.teams.update(parent.clone())?;
        Ok(parent)
    }

    /// Whether `needle` is reachable from `root` through sub-team edges.
    fn is_descendant(&self, root: &TeamId, needle: &TeamId) -> Result<bool, DomainError> {
        let mut stack = vec![*root];
        let mut seen = std::collections::HashSet::new();
        while let Some(current) = stack.pop() {
            if !seen.insert(current) {
                continue;
            }
            let Some(team) = self.ctx.storage.teams.find_by_id(&current) else {
                continue;
            };
            for sub in team.sub_team_ids {
                if &sub == needle {
                    return Ok(true);
                }
                stack.push(sub);
            }
        }
        Ok(false)
    }
}

#[cfg(test)]
#[path = "team_tests.rs"]
mod tests;
