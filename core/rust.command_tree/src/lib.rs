//! Hierarchical command-tree nodes with permission-chained authorization.
//!
//! A [`CommandNode`] represents one command or sub command (`/warp set here`).
//! Executing a node requires holding some permission on it and on every
//! ancestor up to its base command; children are looked up case-insensitively
//! by canonical name or alias. The authorization backend is injected through
//! the [`Permissible`] trait.

pub mod canonical;
pub mod node;

pub use canonical::CanonicalCommandNode;
pub use node::{CommandNode, NodeError, Permissible};
