//! Versioned rule storage.
//!
//! [`RuleStore`] owns the lifecycle of each organization's rule sets:
//! bootstrap from defaults, validated edits committed under optimistic
//! concurrency, revert, and historical lookup. Persistence sits behind the
//! [`RuleRepository`] trait.

mod memory;
mod repository;
mod rule_store;

pub use memory::InMemoryRuleRepository;
pub use repository::RuleRepository;
pub use rule_store::RuleStore;
