// SPDX-License-Identifier: MIT

//! The Maestro services.
//!
//! Every mutation in the system flows through exactly one service method:
//! validate, snapshot what the notification logic will compare, mutate via
//! the repositories, then emit. Repositories never enforce cross-aggregate
//! rules — that happens here.

pub mod mail;
pub mod member;
pub mod ordering;
pub mod project;
pub mod queue;
pub mod session;
pub mod task;
pub mod task_list;
pub mod team;
pub mod template;

pub use mail::{MailService, SendMail, WaitParams};
pub use member::{CreateTeamMember, TeamMemberService};
pub use ordering::OrderingService;
pub use project::{CreateProject, ProjectPatch, ProjectService};
pub use queue::QueueService;
pub use session::{CreateSession, SessionPatch, SessionService};
pub use task::{CreateTask, TaskPatch, TaskService};
pub use task_list::TaskListService;
pub use team::{CreateTeam, TeamPatch, TeamService};
pub use template::TemplateService;

use crate::bus::EventBus;
use crate::locks::EntityLocks;
use maestro_core::{Clock, IdGen, SystemClock};
use maestro_storage::Storage;
use std::sync::Arc;

/// Shared context threaded through every service.
pub struct ServiceCtx<C: Clock> {
    pub storage: Arc<Storage>,
    pub bus: EventBus,
    pub ids: Arc<IdGen>,
    pub clock: C,
    pub locks: EntityLocks,
}

impl<C: Clock> ServiceCtx<C> {
    pub fn new(storage: Arc<Storage>, bus: EventBus, ids: Arc<IdGen>, clock: C) -> Self {
        Self { storage, bus, ids, clock, locks: EntityLocks::new() }
    }
}

impl<C: Clock> Clone for ServiceCtx<C> {
    fn clone(&self) -> Self {
        Self {
            storage: Arc::clone(&self.storage),
            bus: self.bus.clone(),
            ids: Arc::clone(&self.ids),
            clock: self.clock.clone(),
            locks: self.locks.clone(),
        }
    }
}

/// All services wired over one storage + bus pair.
pub struct Services<C: Clock = SystemClock> {
    pub projects: ProjectService<C>,
    pub tasks: TaskService<C>,
    pub sessions: SessionService<C>,
    pub mail: MailService<C>,
    pub queues: QueueService<C>,
    pub members: TeamMemberService<C>,
    pub teams: TeamService<C>,
    pub task_lists: TaskListService<C>,
    pub templates: TemplateService<C>,
    pub orderings: OrderingService<C>,
}

impl<C: Clock> Services<C> {
    pub fn new(ctx: ServiceCtx<C>) -> Self {
        let tasks = TaskService::new(ctx.clone());
        let members = TeamMemberService::new(ctx.clone());
        let sessions = SessionService::new(ctx.clone(), tasks.clone(), members.clone());
        Self {
            projects: ProjectService::new(ctx.clone()),
            queues: QueueService::new(ctx.clone(), tasks.clone()),
            mail: MailService::new(ctx.clone()),
            teams: TeamService::new(ctx.clone(), members.clone()),
            task_lists: TaskListService::new(ctx.clone()),
            templates: TemplateService::new(ctx.clone()),
            orderings: OrderingService::new(ctx),
            tasks,
            sessions,
            members,
        }
    }
}
