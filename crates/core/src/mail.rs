// SPDX-License-Identifier: MIT

//! Mail messages between sessions.
//!
//! Mail is immutable once stored. A reply inherits its ancestor's thread;
//! a root mail's `thread_id` equals its own id. Inboxes sort by priority
//! (critical first), then ascending creation time.

use crate::id::{MailId, ProjectId, SessionId};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering as CmpOrdering;

/// Mail priority. Unset priority sorts identically to `Normal`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MailPriority {
    Critical,
    High,
    Normal,
    Low,
}

impl MailPriority {
    /// Sort rank: lower sorts first.
    pub fn rank(self) -> u8 {
        match self {
            Self::Critical => 0,
            Self::High => 1,
            Self::Normal => 2,
            Self::Low => 3,
        }
    }
}

crate::simple_display! {
    MailPriority {
        Critical => "critical",
        High => "high",
        Normal => "normal",
        Low => "low",
    }
}

/// Broadcast scope for mail sent without an explicit addressee.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MailScope {
    /// Every active session whose `parent_session_id` is the sender.
    MyWorkers,
    /// Every active session sharing the sender's parent, excluding the sender.
    Team,
}

crate::simple_display! {
    MailScope {
        MyWorkers => "my-workers",
        Team => "team",
    }
}

/// One stored mail message. Immutable after creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Mail {
    pub id: MailId,
    pub project_id: ProjectId,
    pub from_session_id: SessionId,
    /// `None` means broadcast within the project.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to_session_id: Option<SessionId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reply_to_mail_id: Option<MailId>,
    pub thread_id: MailId,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub mail_type: Option<String>,
    pub subject: String,
    pub body: String,
    pub created_at_ms: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<MailPriority>,
}

impl Mail {
    /// Effective sort rank; unset priority ranks as `Normal`.
    pub fn priority_rank(&self) -> u8 {
        self.priority.unwrap_or(MailPriority::Normal).rank()
    }

    /// Inbox ordering: priority rank ascending, then `created_at_ms`
    /// ascending as tie-breaker.
    pub fn inbox_cmp(&self, other: &Self) -> CmpOrdering {
        self.priority_rank()
            .cmp(&other.priority_rank())
            .then(self.created_at_ms.cmp(&other.created_at_ms))
    }

    /// Whether this mail is visible in the given session's inbox.
    pub fn addressed_to(&self, session_id: &SessionId) -> bool {
        match &self.to_session_id {
            None => true,
            Some(to) => to == session_id,
        }
    }
}

crate::builder! {
    pub struct MailBuilder => Mail {
        into {
            id: MailId = "mail_test",
            project_id: ProjectId = "proj_test",
            from_session_id: SessionId = "sess_sender",
            thread_id: MailId = "mail_test",
            subject: String = "subject",
            body: String = "body",
        }
        set {
            created_at_ms: u64 = 0,
        }
        option {
            to_session_id: SessionId,
            reply_to_mail_id: MailId,
            mail_type: String,
            priority: MailPriority,
        }
    }
}

#[cfg(test)]
#[path = "mail_tests.rs"]
mod tests;
