// SPDX-License-Identifier: MIT

//! Display orderings, independent of the entities they order.

use super::ServiceCtx;
use maestro_core::{Clock, DomainError, Ordering, OrderingId, ProjectId};

pub struct OrderingService<C: Clock> {
    ctx: ServiceCtx<C>,
}

impl<C: Clock> Clone for OrderingService<C> {
    fn clone(&self) -> Self {
        Self { ctx: self.ctx.clone() }
    }
}

impl<C: Clock> OrderingService<C> {
    pub fn new(ctx: ServiceCtx<C>) -> Self {
        Self { ctx }
    }

    /// The stored ordering, or an empty one when none was saved yet.
    pub fn get_ordering(&self, project_id: &ProjectId, entity_type: &str) -> Ordering {
        self.ctx.storage.orderings.find(project_id, entity_type).unwrap_or(Ordering {
            id: OrderingId::default(),
            project_id: *project_id,
            entity_type: entity_type.to_string(),
            ordered_ids: Vec::new(),
            updated_at_ms: 0,
        })
    }

    pub async fn set_ordering(
        &self,
        project_id: &ProjectId,
        entity_type: &str,
        ordered_ids: Vec<String>,
    ) -> Result<Ordering, DomainError> {
        if !self.ctx.storage.projects.exists(project_id) {
            return Err(DomainError::not_found("project", project_id.as_str()));
        }
        let existing = self.ctx.storage.orderings.find(project_id, entity_type);
        let ordering = Ordering {
            id: existing
                .map(|o| o.id)
                .unwrap_or_else(|| OrderingId::generate(&self.ctx.ids)),
            project_id: *project_id,
            entity_type: entity_type.to_string(),
            ordered_ids,
            updated_at_ms: self.ctx.clock.epoch_ms(),
        };
        self.ctx.storage.orderings.upsert(ordering.clone())?;
        Ok(ordering)
    }
}
