// SPDX-License-Identifier: MIT

//! Per-session FIFO work queues.
//!
//! At most one item is processing at a time; settled items never revert.
//! Item transitions propagate into the task's per-session status through
//! the task service so notifications fire from one place.

use super::task::TaskService;
use super::ServiceCtx;
use maestro_core::{
    Clock, DomainError, Queue, QueueItemStatus, QueueStats, SessionId, TaskId, TaskSessionStatus,
};

pub struct QueueService<C: Clock> {
    ctx: ServiceCtx<C>,
    tasks: TaskService<C>,
}

impl<C: Clock> Clone for QueueService<C> {
    fn clone(&self) -> Self {
        Self { ctx: self.ctx.clone(), tasks: self.tasks.clone() }
    }
}

impl<C: Clock> QueueService<C> {
    pub fn new(ctx: ServiceCtx<C>, tasks: TaskService<C>) -> Self {
        Self { ctx, tasks }
    }

    /// Create a session's queue. A session has at most one queue for its
    /// lifetime; re-initialization is rejected.
    pub async fn create_queue(
        &self,
        session_id: &SessionId,
        task_ids: Vec<TaskId>,
    ) -> Result<Queue, DomainError> {
        let _guard = self.ctx.locks.acquire(session_id.as_str()).await;
        if !self.ctx.storage.sessions.exists(session_id) {
            return Err(DomainError::not_found("session", session_id.as_str()));
        }
        if self.ctx.storage.queues.exists(session_id) {
            return Err(DomainError::business_rule("queue already initialized for session"));
        }
        for task_id in &task_ids {
            if !self.ctx.storage.tasks.exists(task_id) {
                return Err(DomainError::not_found("task", task_id.as_str()));
            }
        }
        let queue = Queue::new(*session_id, task_ids, self.ctx.clock.epoch_ms());
        self.ctx.storage.queues.create(queue.clone())?;
        Ok(queue)
    }

    pub fn get_queue(&self, session_id: &SessionId) -> Result<Queue, DomainError> {
        self.ctx
            .storage
            .queues
            .find_by_session(session_id)
            .ok_or_else(|| DomainError::not_found("queue", session_id.as_str()))
    }

    /// Begin the first queued item. Fails while another item is processing.
    pub async fn start_item(&self, session_id: &SessionId) -> Result<Queue, DomainError> {
        let _guard = self.ctx.locks.acquire(session_id.as_str()).await;
        let mut queue = self.get_queue(session_id)?;
        if queue.processing_item().is_some() {
            return Err(DomainError::validation("an item is already processing"));
        }
        let index = queue
            .next_queued_index()
            .ok_or_else(|| DomainError::validation("no queued items to start"))?;
        let now = self.ctx.clock.epoch_ms();
        queue.items[index].status = QueueItemStatus::Processing;
        queue.items[index].started_at_ms = Some(now);
        queue.current_index = index as i64;
        queue.updated_at_ms = now;
        let task_id = queue.items[index].task_id;
        self.ctx.storage.queues.update(queue.clone())?;

        self.tasks
            .set_session_status(&task_id, session_id, TaskSessionStatus::Working, false)
            .await?;
        Ok(queue)
    }

    /// Settle the processing item as completed.
    pub async fn complete_item(&self, session_id: &SessionId) -> Result<Queue, DomainError> {
        self.settle(session_id, QueueItemStatus::Completed, None).await
    }

    /// Settle the processing item as failed, recording the reason.
    pub async fn fail_item(
        &self,
        session_id: &SessionId,
        reason: Option<String>,
    ) -> Result<Queue, DomainError> {
        self.settle(session_id, QueueItemStatus::Failed, reason).await
    }

    async fn settle(
        &self,
        session_id: &SessionId,
        status: QueueItemStatus,
        fail_reason: Option<String>,
    ) -> Result<Queue, DomainError> {
        let _guard = self.ctx.locks.acquire(session_id.as_str()).await;
        let mut queue = self.get_queue(session_id)?;
        let (index, _) = queue
            .processing_item()
            .ok_or_else(|| DomainError::validation("no item is processing"))?;
        let now = self.ctx.clock.epoch_ms();
        queue.items[index].status = status;
        queue.items[index].completed_at_ms = Some(now);
        queue.items[index].fail_reason = fail_reason;
        queue.current_index = -1;
        queue.updated_at_ms = now;
        let task_id = queue.items[index].task_id;
        self.ctx.storage.queues.update(queue.clone())?;

        let propagated = match status {
            QueueItemStatus::Completed => TaskSessionStatus::Completed,
            _ => TaskSessionStatus::Failed,
        };
        self.tasks.set_session_status(&task_id, session_id, propagated, false).await?;
        Ok(queue)
    }

    /// Skip the processing item if there is one, otherwise the next queued
    /// item.
    pub async fn skip_item(&self, session_id: &SessionId) -> Result<Queue, DomainError> {
        let _guard = self.ctx.locks.acquire(session_id.as_str()).await;
        let mut queue = self.get_queue(session_id)?;
        let (index, was_processing) = match queue.processing_item() {
            Some((index, _)) => (index, true),
            None => {
                let index = queue
                    .next_queued_index()
                    .ok_or_else(|| DomainError::validation("nothing to skip"))?;
                (index, false)
            }
        };
        let now = self.ctx.clock.epoch_ms();
        queue.items[index].status = QueueItemStatus::Skipped;
        queue.items[index].completed_at_ms = Some(now);
        if was_processing {
            queue.current_index = -1;
        }
        queue.updated_at_ms = now;
        let task_id = queue.items[index].task_id;
        self.ctx.storage.queues.update(queue.clone())?;

        self.tasks
            .set_session_status(&task_id, session_id, TaskSessionStatus::Skipped, false)
            .await?;
        Ok(queue)
    }

    /// Append a task; a task may appear in the queue only once.
    pub async fn push_item(
        &self,
        session_id: &SessionId,
        task_id: &TaskId,
    ) -> Result<Queue, DomainError> {
        let _guard = self.ctx.locks.acquire(session_id.as_str()).await;
        let mut queue = self.get_queue(session_id)?;
        if !self.ctx.storage.tasks.exists(task_id) {
            return Err(DomainError::not_found("task", task_id.as_str()));
        }
        if queue.contains_task(task_id) {
            return Err(DomainError::business_rule("task already queued"));
        }
        queue.items.push(maestro_core::QueueItem::queued(*task_id));
        queue.updated_at_ms = self.ctx.clock.epoch_ms();
        self.ctx.storage.queues.update(queue.clone())?;
        Ok(queue)
    }

    pub fn get_stats(&self, session_id: &SessionId) -> Result<QueueStats, DomainError> {
        Ok(self.get_queue(session_id)?.stats())
    }
}

#[cfg(test)]
#[path = "queue_tests.rs"]
mod tests;
