// SPDX-License-Identifier: MIT

//! Role-keyed prompt templates. Stored entries shadow the code defaults;
//! reset deletes the stored entry.

use super::ServiceCtx;
use maestro_core::{template, Clock, DomainError, Template};

pub struct TemplateService<C: Clock> {
    ctx: ServiceCtx<C>,
}

impl<C: Clock> Clone for TemplateService<C> {
    fn clone(&self) -> Self {
        Self { ctx: self.ctx.clone() }
    }
}

impl<C: Clock> TemplateService<C> {
    pub fn new(ctx: ServiceCtx<C>) -> Self {
        Self { ctx }
    }

    /// Stored template for a role, falling back to the code default.
    pub fn get_template(&self, role: &str) -> Result<Template, DomainError> {
        if let Some(stored) = self.ctx.storage.templates.find_by_role(role) {
            return Ok(stored);
        }
        template::default_template(role)
            .map(|content| Template { role: role.to_string(), content: content.to_string(), updated_at_ms: 0 })
            .ok_or_else(|| DomainError::not_found("template", role))
    }

    pub async fn set_template(&self, role: &str, content: String) -> Result<Template, DomainError> {
        if content.trim().is_empty() {
            return Err(DomainError::validation("template content must not be empty"));
        }
        let template = Template {
            role: role.to_string(),
            content,
            updated_at_ms: self.ctx.clock.epoch_ms(),
        };
        self.ctx.storage.templates.upsert(template.clone())?;
        Ok(template)
    }

    /// Restore the code default for a role.
    pub async fn reset_template(&self, role: &str) -> Result<Template, DomainError> {
        if template::default_template(role).is_none() {
            return Err(DomainError::validation("role has no built-in template"));
        }
        self.ctx.storage.templates.delete(role)?;
        self.get_template(role)
    }
}
