use crate::node::CommandNode;

/// Canonical representation of a command node for external use
///
/// Live nodes carry interior mutability and parent back-references and are not
/// serializable; this is the plain-data snapshot of a node and its subtree.
#[derive(serde::Serialize, serde::Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct CanonicalCommandNode {
    /// The canonical (registered) name of the node
    pub name: String,

    /// The aliases of the node, lowercase, in declaration order
    pub aliases: Vec<String>,

    /// The permissions on the node, sorted
    pub permissions: Vec<String>,

    /// The sub commands of the node, in registration order
    pub sub_commands: Vec<CanonicalCommandNode>,
}

impl From<&CommandNode> for CanonicalCommandNode {
    fn from(node: &CommandNode) -> Self {
        CanonicalCommandNode {
            name: node.name().to_string(),
            aliases: node.aliases().to_vec(),
            permissions: node.permissions(),
            sub_commands: node
                .sub_commands()
                .iter()
                .filter_map(|key| node.sub_command(key))
                .map(|child| CanonicalCommandNode::from(&child))
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canonical_snapshot() {
        let warp = CommandNode::new("warp", &[], "essentials.warp", None, vec![]).unwrap();
        let set = CommandNode::new("Set", &["s"], "essentials.warp.set", Some(&warp), vec![])
            .unwrap();
        set.add_permission("essentials.admin");
        warp.add_sub_command(set);

        let canonical = CanonicalCommandNode::from(&warp);

        assert_eq!(
            serde_json::to_value(&canonical).unwrap(),
            serde_json::json!({
                "name": "warp",
                "aliases": [],
                "permissions": ["essentials.warp"],
                "sub_commands": [{
                    "name": "Set",
                    "aliases": ["s"],
                    "permissions": ["essentials.admin", "essentials.warp.set"],
                    "sub_commands": [],
                }],
            })
        );
    }

    #[test]
    fn test_canonical_round_trip() {
        let give =
            CommandNode::new("give", &["g", "gv"], "essentials.item.give", None, vec![]).unwrap();
        let root = CommandNode::new("item", &[], "essentials.item", None, vec![give]).unwrap();

        let canonical = CanonicalCommandNode::from(&root);
        let json = serde_json::to_string(&canonical).unwrap();
        let back: CanonicalCommandNode = serde_json::from_str(&json).unwrap();

        assert_eq!(back, canonical);
    }
}
