//! Application services and ports for the session & access-control engine.

#![forbid(unsafe_code)]

mod access_gate;
mod audit_service;
mod idle_monitor;
mod session_service;

pub use access_gate::{AccessGate, Decision, ModulePermissionRepository, ViewRequest};
pub use audit_service::{AuditLogRepository, AuditService, SecurityEvent};
pub use idle_monitor::{DEFAULT_IDLE_TIMEOUT, IdleMonitor, IdleTimeoutHandler};
pub use session_service::{
    AdminProfileRepository, IdentityProvider, MfaResolution, ProviderSession, SessionEventKind,
    SessionService, SessionState,
};
