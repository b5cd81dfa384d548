//! Caller context
//!
//! The acting caller and its resolved tenant, passed explicitly into every
//! operation instead of living in request-scoped state.

use crate::domain::value_objects::{CallerId, TenantId};

/// Resolved identity of the caller for one request
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CallerContext {
    caller: CallerId,
    tenant: TenantId,
}

impl CallerContext {
    pub fn new(caller: CallerId, tenant: TenantId) -> Self {
        Self { caller, tenant }
    }

    pub fn caller(&self) -> &CallerId {
        &self.caller
    }

    pub fn tenant(&self) -> TenantId {
        self.tenant
    }

    /// True when the resource's tenant is the caller's tenant
    pub fn owns(&self, tenant: TenantId) -> bool {
        self.tenant == tenant
    }
}
