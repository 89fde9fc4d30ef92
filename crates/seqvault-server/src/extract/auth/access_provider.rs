//! Capability checks against a laboratory.

use std::borrow::Cow;

use seqvault_core::{Capability, Laboratory};

use super::TRACING_TARGET_AUTHORIZATION as TRACING_TARGET;
use crate::handler::{ErrorKind, Result};

/// Outcome of an authorization check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthResult {
    /// Whether access was granted.
    pub granted: bool,
    /// The capability that granted access.
    pub capability: Option<Capability>,
    /// Why access was denied.
    pub reason: Option<Cow<'static, str>>,
}

impl AuthResult {
    /// Access granted through `capability`.
    pub const fn granted(capability: Capability) -> Self {
        Self {
            granted: true,
            capability: Some(capability),
            reason: None,
        }
    }

    /// Access denied for `reason`.
    pub fn denied(reason: impl Into<Cow<'static, str>>) -> Self {
        Self {
            granted: false,
            capability: None,
            reason: Some(reason.into()),
        }
    }

    /// Converts a denial into a 403 error.
    pub fn into_result(self) -> Result<Capability> {
        match (self.granted, self.capability) {
            (true, Some(capability)) => Ok(capability),
            _ => {
                let error = match self.reason {
                    Some(reason) => ErrorKind::Forbidden.with_context(reason),
                    None => ErrorKind::Forbidden.into_error(),
                };
                Err(error.with_resource("laboratory"))
            }
        }
    }
}

/// Authorization checks for an authenticated caller.
pub trait AccessProvider {
    /// Identifier of the caller.
    fn subject(&self) -> &str;

    /// Capability grants held by the caller.
    fn groups(&self) -> &[String];

    /// Checks whether the caller holds any of `capabilities` for `laboratory`.
    fn check_laboratory_access(
        &self,
        laboratory: &Laboratory,
        capabilities: &[Capability],
    ) -> AuthResult {
        let granted = capabilities
            .iter()
            .copied()
            .find(|capability| capability.is_granted_by(laboratory, self.groups()));

        match granted {
            Some(capability) => {
                tracing::debug!(
                    target: TRACING_TARGET,
                    subject = %self.subject(),
                    laboratory_id = %laboratory.laboratory_id,
                    organization_id = %laboratory.organization_id,
                    capability = %capability,
                    "Access granted"
                );

                AuthResult::granted(capability)
            }
            None => {
                tracing::warn!(
                    target: TRACING_TARGET,
                    subject = %self.subject(),
                    laboratory_id = %laboratory.laboratory_id,
                    organization_id = %laboratory.organization_id,
                    required = ?capabilities,
                    "Access denied: missing capability"
                );

                AuthResult::denied(format!(
                    "{} holds none of the required capabilities for laboratory {}",
                    self.subject(),
                    laboratory.laboratory_id
                ))
            }
        }
    }

    /// Requires any capability that grants read access to the laboratory's storage.
    fn authorize_storage_read(&self, laboratory: &Laboratory) -> Result<Capability> {
        self.check_laboratory_access(laboratory, &Capability::STORAGE_READERS)
            .into_result()
    }
}
