use std::cell::RefCell;
use std::collections::HashSet;
use std::fmt::Display;
use std::rc::{Rc, Weak};

use indexmap::IndexMap;

/// Anything that can answer "does the caller hold permission string P?"
///
/// This is the only external boundary of the crate: the live authorization
/// subsystem of the host is injected through it. A plain closure works too.
pub trait Permissible {
    fn has_permission(&self, permission: &str) -> bool;
}

impl<F> Permissible for F
where
    F: Fn(&str) -> bool,
{
    fn has_permission(&self, permission: &str) -> bool {
        self(permission)
    }
}

/// Construction-time validation failure for a [`CommandNode`]
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "var")]
pub enum NodeError {
    EmptyName {},
}

impl NodeError {
    pub fn code(&self) -> &'static str {
        match self {
            NodeError::EmptyName {} => "empty_name",
        }
    }
}

impl Display for NodeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NodeError::EmptyName {} => write!(f, "command nodes must have a non-empty name"),
        }
    }
}

impl std::error::Error for NodeError {}

struct NodeInner {
    name: String,
    /// Lowercase, declaration order preserved
    aliases: Vec<String>,
    /// Holding any one of these passes the local check
    permissions: RefCell<HashSet<String>>,
    /// None for base commands. The parent owns its children, never the reverse
    parent: Option<Weak<NodeInner>>,
    /// Keyed by the child's own lowercased name at insertion time
    children: RefCell<IndexMap<String, CommandNode>>,
}

/// One node of a command tree, e.g. the `set` in `/warp set here`.
///
/// Handles are cheap to clone and share the underlying node, so a node can
/// live in its parent's children map while callers keep their own handle to
/// it. Only `permissions` and `children` are mutable after construction; the
/// name must stay fixed because it is the key the parent registered the node
/// under.
#[derive(Clone)]
pub struct CommandNode {
    inner: Rc<NodeInner>,
}

impl CommandNode {
    /// Creates a node with exactly one initial permission.
    ///
    /// Aliases are lowercased and kept in declaration order. Each entry of
    /// `children` is registered under its own lowercased name. Supplying a
    /// parent sets only the back-reference on this node; it does not register
    /// the node in the parent's children map.
    pub fn new(
        name: &str,
        aliases: &[&str],
        permission: &str,
        parent: Option<&CommandNode>,
        children: Vec<CommandNode>,
    ) -> Result<CommandNode, NodeError> {
        if name.is_empty() {
            return Err(NodeError::EmptyName {});
        }

        let mut permissions = HashSet::new();
        permissions.insert(permission.to_string());

        let mut child_map = IndexMap::new();
        for child in children {
            let key = child.name().to_lowercase();
            child_map.insert(key, child);
        }

        Ok(CommandNode {
            inner: Rc::new(NodeInner {
                name: name.to_string(),
                aliases: aliases.iter().map(|alias| alias.to_lowercase()).collect(),
                permissions: RefCell::new(permissions),
                parent: parent.map(|p| Rc::downgrade(&p.inner)),
                children: RefCell::new(child_map),
            }),
        })
    }

    pub fn name(&self) -> &str {
        &self.inner.name
    }

    pub fn aliases(&self) -> &[String] {
        &self.inner.aliases
    }

    /// The super command that directly leads this command, if any.
    ///
    /// Also returns `None` when the parent has already been dropped; the
    /// permission chain then terminates at this node.
    pub fn super_command(&self) -> Option<CommandNode> {
        self.inner
            .parent
            .as_ref()
            .and_then(Weak::upgrade)
            .map(|inner| CommandNode { inner })
    }

    /// Whether this node was constructed without a parent
    pub fn is_base(&self) -> bool {
        self.inner.parent.is_none()
    }

    /// Check if `caller` has permission to execute this command and all super
    /// commands.
    ///
    /// The check is an OR over this node's permissions, each ANDed with the
    /// recursive check on the super command, so the caller needs *some*
    /// permission at every level but not the *same* one. The full chain is
    /// re-walked on every call.
    pub fn can_execute<P: Permissible + ?Sized>(&self, caller: &P) -> bool {
        let permissions = self.inner.permissions.borrow();

        for permission in permissions.iter() {
            if caller.has_permission(permission) && self.chain_allows(caller) {
                return true;
            }
        }

        log::debug!("permission chain denied for {}", self.executable_string());
        false
    }

    fn chain_allows<P: Permissible + ?Sized>(&self, caller: &P) -> bool {
        match self.super_command() {
            Some(parent) => parent.can_execute(caller),
            None => true,
        }
    }

    /// Idempotent; adding a permission twice is a no-op
    pub fn add_permission(&self, permission: &str) {
        self.inner
            .permissions
            .borrow_mut()
            .insert(permission.to_string());
    }

    /// Returns whether `permission` was present and has been removed.
    ///
    /// Removing the last permission leaves the node unexecutable by anyone
    /// until a permission is re-added.
    pub fn remove_permission(&self, permission: &str) -> bool {
        self.inner.permissions.borrow_mut().remove(permission)
    }

    /// Sorted snapshot of the current permission set
    pub fn permissions(&self) -> Vec<String> {
        let mut permissions: Vec<String> = self
            .inner
            .permissions
            .borrow()
            .iter()
            .cloned()
            .collect();
        permissions.sort();
        permissions
    }

    /// Looks up a direct child by canonical name or alias, case-insensitively.
    ///
    /// The canonical name is an exact map lookup and always wins; aliases are
    /// a linear-scan fallback on a miss.
    pub fn sub_command(&self, name: &str) -> Option<CommandNode> {
        let lower = name.to_lowercase();
        let children = self.inner.children.borrow();

        if let Some(child) = children.get(&lower) {
            return Some(child.clone());
        }

        for child in children.values() {
            if child.aliases().iter().any(|alias| *alias == lower) {
                log::debug!("resolved sub command {} via alias {}", child.name(), lower);
                return Some(child.clone());
            }
        }

        None
    }

    /// Registered child keys (canonical lowercase names, no aliases) as a
    /// fresh list decoupled from internal state
    pub fn sub_commands(&self) -> Vec<String> {
        self.inner.children.borrow().keys().cloned().collect()
    }

    /// Registers `child` under its own lowercased name, overwriting any
    /// previous entry with that key.
    ///
    /// This is registry mutation only: the child's parent back-reference is
    /// set at construction and is NOT updated here.
    pub fn add_sub_command(&self, child: CommandNode) {
        let key = child.name().to_lowercase();
        self.inner.children.borrow_mut().insert(key, child);
    }

    /// Canonical invocation path without alias annotations, e.g.
    /// `/warp set here`
    pub fn executable_string(&self) -> String {
        match self.super_command() {
            Some(parent) => format!("{} {}", parent.executable_string(), self.inner.name),
            None => format!("/{}", self.inner.name),
        }
    }
}

/// Invocation path with each level's aliases appended to its segment, e.g.
/// `/warp set here|h|hr`
impl Display for CommandNode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut segment = self.inner.name.clone();
        for alias in &self.inner.aliases {
            segment.push('|');
            segment.push_str(alias);
        }

        match self.super_command() {
            Some(parent) => write!(f, "{} {}", parent, segment),
            None => write!(f, "/{}", segment),
        }
    }
}

impl std::fmt::Debug for CommandNode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandNode")
            .field("name", &self.inner.name)
            .field("aliases", &self.inner.aliases)
            .field("is_base", &self.is_base())
            .finish()
    }
}
