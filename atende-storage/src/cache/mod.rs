//! Per-tenant resource-name cache
//!
//! Caches name→identifier mappings so tool dispatch does not hit the
//! directory on every free-text resolution. Entries expire by wall-clock
//! TTL (logically — stale entries stay in memory until overwritten or
//! explicitly invalidated) and are replaced wholesale: a reader either
//! sees a complete map or nothing.
//!
//! # Tenant isolation
//!
//! [`ResourcePartition`] can only be built through kind-specific
//! constructors, so a services or providers partition cannot exist
//! without a schedule ID, and no key can exist without an organization
//! ID. Cross-tenant reads are unrepresentable, not just checked.

pub mod partition;
pub mod resource_cache;

pub use partition::ResourcePartition;
pub use resource_cache::{CacheSettings, CacheStats, NameMap, ResourceCache};
