//! ui::tree_fmt
//!
//! Thin glyph formatter over the traversal's ancestry-keyed nodes.
//!
//! The traversal emits a flat list of nodes keyed by their ancestry
//! chain; this module re-nests them and renders the usual box-drawing
//! tree. It performs no graph logic of its own.

use std::collections::HashMap;

use crate::core::traverse::TreeNode;

/// Render traversal nodes as an indented glyph tree.
pub fn render(nodes: &[TreeNode]) -> String {
    let Some(root) = nodes.iter().find(|n| n.depth() == 0) else {
        return String::new();
    };

    // Re-nest: parent ancestry key -> children in discovery order.
    let mut children: HashMap<String, Vec<&TreeNode>> = HashMap::new();
    for node in nodes {
        if node.depth() == 0 {
            continue;
        }
        let parent_key = node.ancestry[..node.ancestry.len() - 1].join(":");
        children.entry(parent_key).or_default().push(node);
    }

    let mut out = String::new();
    out.push_str(&root.label());
    out.push('\n');
    render_children(&children, &root.key(), "", &mut out);
    out
}

fn render_children(
    children: &HashMap<String, Vec<&TreeNode>>,
    parent_key: &str,
    indent: &str,
    out: &mut String,
) {
    let Some(nodes) = children.get(parent_key) else {
        return;
    };
    for (i, node) in nodes.iter().enumerate() {
        let last = i + 1 == nodes.len();
        let glyph = if last { "└── " } else { "├── " };
        out.push_str(indent);
        out.push_str(glyph);
        out.push_str(&node.label());
        out.push('\n');

        let child_indent = format!("{indent}{}", if last { "    " } else { "│   " });
        render_children(children, &node.key(), &child_indent, out);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::{PkgName, Revision};

    fn node(ancestry: &[&str], deduped: bool) -> TreeNode {
        let (name, rev) = ancestry.last().unwrap().split_once('@').unwrap();
        TreeNode {
            ancestry: ancestry.iter().map(|s| s.to_string()).collect(),
            name: PkgName::new(name).unwrap(),
            revision: Revision::new(rev).unwrap(),
            deduped,
        }
    }

    #[test]
    fn renders_nested_tree() {
        let nodes = vec![
            node(&["app@HEAD"], false),
            node(&["app@HEAD", "a@1.0"], false),
            node(&["app@HEAD", "b@1.0"], false),
            node(&["app@HEAD", "a@1.0", "c@1.0"], false),
        ];
        let out = render(&nodes);
        assert_eq!(
            out,
            "app@HEAD\n├── a@1.0\n│   └── c@1.0\n└── b@1.0\n"
        );
    }

    #[test]
    fn deduped_annotation_rendered() {
        let nodes = vec![
            node(&["app@HEAD"], false),
            node(&["app@HEAD", "a@1.0"], false),
            node(&["app@HEAD", "a@1.0", "c@1.0"], true),
        ];
        let out = render(&nodes);
        assert!(out.contains("c@1.0 (deduped)"));
    }

    #[test]
    fn empty_input_renders_empty() {
        assert_eq!(render(&[]), "");
    }
}
