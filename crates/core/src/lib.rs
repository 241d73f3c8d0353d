// SPDX-License-Identifier: MIT

//! Maestro core domain model.
//!
//! Identifier generation, the clock abstraction, the aggregate types
//! (projects, tasks, sessions, queues, mail, teams, task lists, orderings,
//! templates), the typed event enum, and the domain error type shared by
//! every service.

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod clock;
pub mod error;
pub mod event;
pub mod id;
pub mod macros;
pub mod mail;
pub mod manifest;
pub mod member;
pub mod ordering;
pub mod project;
pub mod queue;
pub mod session;
pub mod task;
pub mod task_list;
pub mod team;
pub mod template;
pub mod timeline;

pub use clock::{Clock, FakeClock, SystemClock};
pub use error::DomainError;
pub use event::{MaestroEvent, PromptMode, SpawnPayload, Topic, BROADCAST_TOPICS};
pub use id::{DocId, EventId, IdBuf, IdGen, MailId, OrderingId, ProjectId, SessionId, TaskId, TaskListId, TeamId, TeamMemberId, TemplateId};
pub use mail::{Mail, MailPriority, MailScope};
pub use manifest::{validate_manifest, Manifest, ManifestSession, ManifestTask, MANIFEST_VERSION};
pub use member::{MemberStatus, TeamMember, TeamMemberPatch};
pub use ordering::Ordering;
pub use project::Project;
pub use queue::{Queue, QueueItem, QueueItemStatus, QueueStats};
pub use session::{DocEntry, NeedsInput, Session, SessionRole, SessionStatus};
pub use task::{Task, TaskPriority, TaskSessionStatus, TaskStatus, UpdateSource};
pub use task_list::TaskList;
pub use team::Team;
pub use template::Template;
pub use timeline::{TimelineEvent, TimelineEventType};
