//! Domain types for the Aspira admissions back office.

#![forbid(unsafe_code)]

mod admin;
mod mfa;
mod module;
mod security;

pub use admin::{AdminProfile, AdminProfileId, AdminRole, EmailAddress, RegionFilter};
pub use mfa::{AssuranceLevel, FactorStatus, MfaFactor, MfaStatus};
pub use module::{ModuleKey, ModulePermission};
pub use security::SecurityAction;
