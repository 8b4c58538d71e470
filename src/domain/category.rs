//! Category hierarchy rules over an id-keyed arena. The table is flat
//! (`parent_id` links); traversal and the reparent cycle check are explicit
//! walks against an in-memory snapshot of the rows.

use std::collections::{HashMap, HashSet};
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct CategoryNode {
    pub id: Uuid,
    pub name: String,
    pub parent_id: Option<Uuid>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReparentError {
    SelfParent,
    UnknownParent,
    WouldCreateCycle,
}

impl ReparentError {
    pub fn message(&self) -> &'static str {
        match self {
            ReparentError::SelfParent => "Category cannot be its own parent",
            ReparentError::UnknownParent => "Parent category not found",
            ReparentError::WouldCreateCycle => "Cannot set a descendant category as parent",
        }
    }
}

#[derive(Debug, Default)]
pub struct CategoryArena {
    nodes: HashMap<Uuid, CategoryNode>,
}

impl CategoryArena {
    pub fn from_nodes(nodes: impl IntoIterator<Item = CategoryNode>) -> Self {
        Self {
            nodes: nodes.into_iter().map(|n| (n.id, n)).collect(),
        }
    }

    pub fn get(&self, id: Uuid) -> Option<&CategoryNode> {
        self.nodes.get(&id)
    }

    /// Walks the ancestor chain of `node`; true if `ancestor` appears.
    /// A visited set bounds the walk even if the stored links are corrupt.
    pub fn is_descendant_of(&self, node: Uuid, ancestor: Uuid) -> bool {
        let mut seen = HashSet::new();
        let mut current = self.nodes.get(&node).and_then(|n| n.parent_id);

        while let Some(id) = current {
            if id == ancestor {
                return true;
            }
            if !seen.insert(id) {
                return false;
            }
            current = self.nodes.get(&id).and_then(|n| n.parent_id);
        }

        false
    }

    /// Validates moving `node` under `new_parent` without creating a cycle:
    /// the node must not be its own parent and must not appear in the
    /// candidate parent's ancestor chain.
    pub fn check_reparent(&self, node: Uuid, new_parent: Uuid) -> Result<(), ReparentError> {
        if node == new_parent {
            return Err(ReparentError::SelfParent);
        }

        if !self.nodes.contains_key(&new_parent) {
            return Err(ReparentError::UnknownParent);
        }

        if self.is_descendant_of(new_parent, node) {
            return Err(ReparentError::WouldCreateCycle);
        }

        Ok(())
    }

    /// All ids in the subtree rooted at `root`, including the root itself.
    pub fn subtree(&self, root: Uuid) -> Vec<Uuid> {
        let mut children: HashMap<Uuid, Vec<Uuid>> = HashMap::new();
        for node in self.nodes.values() {
            if let Some(parent) = node.parent_id {
                children.entry(parent).or_default().push(node.id);
            }
        }

        let mut result = Vec::new();
        let mut stack = vec![root];
        let mut seen = HashSet::new();

        while let Some(id) = stack.pop() {
            if !seen.insert(id) {
                continue;
            }
            result.push(id);
            if let Some(kids) = children.get(&id) {
                stack.extend(kids.iter().copied());
            }
        }

        result
    }

    /// Root categories, each with its recursively nested children, ordered
    /// by name at every level.
    pub fn tree(&self) -> Vec<CategoryTreeNode> {
        let mut children: HashMap<Option<Uuid>, Vec<&CategoryNode>> = HashMap::new();
        for node in self.nodes.values() {
            // Nodes pointing at a missing parent surface as roots rather
            // than silently disappearing.
            let key = match node.parent_id {
                Some(parent) if self.nodes.contains_key(&parent) => Some(parent),
                _ => None,
            };
            children.entry(key).or_default().push(node);
        }

        fn build(
            parent: Option<Uuid>,
            children: &HashMap<Option<Uuid>, Vec<&CategoryNode>>,
            seen: &mut HashSet<Uuid>,
        ) -> Vec<CategoryTreeNode> {
            let mut level: Vec<&CategoryNode> = children
                .get(&parent)
                .map(|nodes| nodes.iter().filter(|n| !seen.contains(&n.id)).copied().collect())
                .unwrap_or_default();
            level.sort_by(|a, b| a.name.cmp(&b.name));

            level
                .into_iter()
                .map(|node| {
                    seen.insert(node.id);
                    CategoryTreeNode {
                        id: node.id,
                        name: node.name.clone(),
                        children: build(Some(node.id), children, seen),
                    }
                })
                .collect()
        }

        build(None, &children, &mut HashSet::new())
    }
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct CategoryTreeNode {
    pub id: Uuid,
    pub name: String,
    pub children: Vec<CategoryTreeNode>,
}
