use std::collections::HashMap;
use crate::rendering::scene::{NodeId, SceneNode};

/// Node hierarchy with a single root. Nodes are stored flat and linked by id;
/// a loaded model is its own graph until it is grafted into another one.
#[derive(Debug, Clone)]
pub struct SceneGraph {
    nodes: HashMap<NodeId, SceneNode>,
    root: NodeId,
    next_id: u32,
}

impl SceneGraph {
    pub fn new(mut root: SceneNode) -> Self {
        let id = NodeId(0);
        root.parent = None;
        root.children.clear();
        let mut nodes = HashMap::new();
        nodes.insert(id, root);
        SceneGraph {
            nodes,
            root: id,
            next_id: 1,
        }
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains_key(&id)
    }

    pub fn get(&self, id: NodeId) -> Option<&SceneNode> {
        self.nodes.get(&id)
    }

    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut SceneNode> {
        self.nodes.get_mut(&id)
    }

    pub fn root_node(&self) -> &SceneNode {
        &self.nodes[&self.root]
    }

    /// Append `node` under `parent`. Returns `None` when `parent` is not in the graph.
    pub fn add_child(&mut self, parent: NodeId, node: SceneNode) -> Option<NodeId> {
        let len = self.nodes.get(&parent)?.children.len();
        self.insert_child(parent, len, node)
    }

    fn insert_child(&mut self, parent: NodeId, index: usize, mut node: SceneNode) -> Option<NodeId> {
        if !self.nodes.contains_key(&parent) {
            return None;
        }
        let id = self.allocate_id();
        node.parent = Some(parent);
        node.children.clear();
        self.nodes.insert(id, node);
        let siblings = &mut self.nodes.get_mut(&parent)?.children;
        let index = index.min(siblings.len());
        siblings.insert(index, id);
        Some(id)
    }

    fn allocate_id(&mut self) -> NodeId {
        let id = NodeId(self.next_id);
        self.next_id += 1;
        id
    }

    /// Pre-order walk starting at (and including) `start`, children in order.
    pub fn traverse(&self, start: NodeId) -> Vec<NodeId> {
        let mut order = Vec::new();
        let mut stack = vec![start];
        while let Some(id) = stack.pop() {
            let Some(node) = self.nodes.get(&id) else {
                continue;
            };
            order.push(id);
            stack.extend(node.children.iter().rev().copied());
        }
        order
    }

    /// Every node below the root with the given name, in traversal order
    pub fn find_by_name(&self, name: &str) -> Vec<NodeId> {
        self.traverse(self.root)
            .into_iter()
            .skip(1)
            .filter(|id| self.nodes[id].name() == name)
            .collect()
    }

    /// Remove `id` and its whole subtree. The root cannot be detached.
    /// Returns the number of nodes removed.
    pub fn detach(&mut self, id: NodeId) -> usize {
        if id == self.root {
            return 0;
        }
        let Some(parent) = self.nodes.get(&id).and_then(|node| node.parent) else {
            return 0;
        };
        if let Some(parent) = self.nodes.get_mut(&parent) {
            parent.children.retain(|child| *child != id);
        }
        let subtree = self.traverse(id);
        for node in &subtree {
            self.nodes.remove(node);
        }
        subtree.len()
    }

    /// Move every node of `other` into this graph under `parent` at child
    /// position `index`. Returns the new id of `other`'s root.
    pub fn graft(&mut self, parent: NodeId, index: usize, other: SceneGraph) -> Option<NodeId> {
        if !self.contains(parent) {
            return None;
        }
        let order = other.traverse(other.root);
        let SceneGraph { mut nodes, root, .. } = other;

        let mut remap: HashMap<NodeId, NodeId> = HashMap::with_capacity(order.len());
        for old_id in order {
            let Some(node) = nodes.remove(&old_id) else {
                continue;
            };
            let (target_parent, target_index) = match node.parent.and_then(|p| remap.get(&p)) {
                Some(new_parent) => (*new_parent, usize::MAX),
                None => (parent, index),
            };
            let new_id = self.insert_child(target_parent, target_index, node)?;
            remap.insert(old_id, new_id);
        }
        remap.get(&root).copied()
    }
}
