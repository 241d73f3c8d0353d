// SPDX-License-Identifier: MIT

//! Typed service-level errors.
//!
//! Every service raises [`DomainError`]; the REST layer maps the kinds to
//! HTTP status codes (400/403/404/409/500) and a machine-readable code in
//! the `{error, code, message}` body.

use thiserror::Error;

/// Service-level error raised by every Maestro service.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DomainError {
    /// Bad input shape or empty required field.
    #[error("{0}")]
    Validation(String),

    /// Entity id does not resolve.
    #[error("{kind} not found: {id}")]
    NotFound { kind: &'static str, id: String },

    /// Input was well-formed but violates a business rule.
    #[error("{0}")]
    BusinessRule(String),

    /// Operation is never permitted on this entity.
    #[error("{0}")]
    Forbidden(String),

    /// Manifest generation failed; carries the captured detail.
    #[error("manifest generation failed: {detail}")]
    ManifestGeneration { detail: String },

    /// Underlying repository failure.
    #[error("storage error: {0}")]
    Storage(String),
}

impl DomainError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn not_found(kind: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound { kind, id: id.into() }
    }

    pub fn business_rule(msg: impl Into<String>) -> Self {
        Self::BusinessRule(msg.into())
    }

    pub fn forbidden(msg: impl Into<String>) -> Self {
        Self::Forbidden(msg.into())
    }

    /// Machine-readable code for the wire error shape.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation_failed",
            Self::NotFound { .. } => "not_found",
            Self::BusinessRule(_) => "business_rule_violation",
            Self::Forbidden(_) => "forbidden",
            Self::ManifestGeneration { .. } => "manifest_generation_failed",
            Self::Storage(_) => "storage_error",
        }
    }
}
