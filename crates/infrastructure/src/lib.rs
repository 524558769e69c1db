//! Infrastructure adapters for application ports.

#![forbid(unsafe_code)]

mod http_identity_provider;
mod in_memory_admin_profile_repository;
mod in_memory_module_permission_repository;
mod postgres_admin_profile_repository;
mod postgres_audit_log_repository;
mod postgres_module_permission_repository;

pub use http_identity_provider::HttpIdentityProvider;
pub use in_memory_admin_profile_repository::InMemoryAdminProfileRepository;
pub use in_memory_module_permission_repository::InMemoryModulePermissionRepository;
pub use postgres_admin_profile_repository::PostgresAdminProfileRepository;
pub use postgres_audit_log_repository::PostgresAuditLogRepository;
pub use postgres_module_permission_repository::PostgresModulePermissionRepository;
