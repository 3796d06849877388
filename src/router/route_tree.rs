/* Copyright (C) 2022 Antmicro
 *
 * Licensed under the Apache License, Version 2.0 (the "License");
 * you may not use this file except in compliance with the License.
 * You may obtain a copy of the License at
 *
 *     https://www.apache.org/licenses/LICENSE-2.0
 *
 * Unless required by applicable law or agreed to in writing, software
 * distributed under the License is distributed on an "AS IS" BASIS,
 * WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
 * See the License for the specific language governing permissions and
 * limitations under the License.
 */

use std::collections::HashSet;
use replace_with::replace_with_or_abort;

use crate::device::{Wire, Connection};

#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct RouteNodeId(pub usize);

#[derive(Clone, PartialEq, Eq, Debug)]
struct RouteNode {
    wire: Wire,
    /// Connection that leads from the parent to this node. `None` for the root.
    connection: Option<Connection>,
    parent: Option<RouteNodeId>,
    children: Vec<RouteNodeId>,
}

/// Physical route of a net as a tree of wires.
///
/// Nodes live in an arena and are only ever appended, so a node's index is
/// always greater than its parent's. Node 0 is the root.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct RouteTree {
    nodes: Vec<RouteNode>,
}

impl RouteTree {
    pub fn new(root: Wire) -> Self {
        Self {
            nodes: vec![RouteNode {
                wire: root,
                connection: None,
                parent: None,
                children: Vec::new(),
            }],
        }
    }

    pub fn root(&self) -> RouteNodeId {
        RouteNodeId(0)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn wire(&self, node: RouteNodeId) -> Wire {
        self.nodes[node.0].wire
    }

    pub fn connection(&self, node: RouteNodeId) -> Option<&Connection> {
        self.nodes[node.0].connection.as_ref()
    }

    pub fn parent(&self, node: RouteNodeId) -> Option<RouteNodeId> {
        self.nodes[node.0].parent
    }

    pub fn children(&self, node: RouteNodeId) -> &[RouteNodeId] {
        &self.nodes[node.0].children
    }

    pub fn nodes(&self) -> impl Iterator<Item = RouteNodeId> {
        (0..self.nodes.len()).map(RouteNodeId)
    }

    /// Grow the tree by one hop. `connection` must start at `node`'s wire.
    pub fn extend(&mut self, node: RouteNodeId, connection: Connection) -> RouteNodeId {
        assert_eq!(
            connection.source,
            self.wire(node),
            "Connection does not start at the extended node's wire"
        );
        self.push_node(node, connection.sink, connection)
    }

    fn push_node(&mut self, parent: RouteNodeId, wire: Wire, connection: Connection)
        -> RouteNodeId
    {
        let id = RouteNodeId(self.nodes.len());
        self.nodes.push(RouteNode {
            wire,
            connection: Some(connection),
            parent: Some(parent),
            children: Vec::new(),
        });
        self.nodes[parent.0].children.push(id);
        id
    }

    /// Drop every node that is neither in `keep` nor an ancestor of a node in
    /// `keep`. The root always survives. Node ids are renumbered, preserving
    /// discovery order.
    pub fn prune(&mut self, keep: &HashSet<RouteNodeId>) {
        let mut kept = vec![false; self.nodes.len()];
        kept[0] = true;
        for id in keep {
            kept[id.0] = true;
        }

        /* Children always come after their parents, so a single reverse pass
         * propagates the flag all the way up. */
        for idx in (1..self.nodes.len()).rev() {
            if kept[idx] {
                if let Some(parent) = self.nodes[idx].parent {
                    kept[parent.0] = true;
                }
            }
        }

        let mut remap = vec![None; self.nodes.len()];
        let mut next = 0;
        for (idx, keep) in kept.iter().enumerate() {
            if *keep {
                remap[idx] = Some(RouteNodeId(next));
                next += 1;
            }
        }

        replace_with_or_abort(&mut self.nodes, |nodes| {
            nodes.into_iter()
                .enumerate()
                .filter(|(idx, _)| kept[*idx])
                .map(|(_, mut node)| {
                    node.parent = node.parent.and_then(|p| remap[p.0]);
                    node.children = node.children.iter()
                        .filter_map(|c| remap[c.0])
                        .collect();
                    node
                })
                .collect()
        });
    }

    /// Children of `node` reached through switched connections. Children
    /// reached through plain wires are skipped over and their own children
    /// are considered in their place.
    pub fn true_children(&self, node: RouteNodeId) -> Vec<RouteNodeId> {
        let mut worklist = self.children(node).to_vec();
        let mut true_children = Vec::new();

        let mut idx = 0;
        while idx < worklist.len() {
            let child = worklist[idx];
            let switched = self.connection(child)
                .map(|c| c.kind.is_switched())
                .unwrap_or(false);
            if switched {
                true_children.push(child);
            } else {
                worklist.extend_from_slice(self.children(child));
            }
            idx += 1;
        }

        true_children
    }

    /// Copy of the tree in which every node's children are its true children.
    pub fn flattened(&self) -> RouteTree {
        let mut flat = RouteTree::new(self.wire(self.root()));
        let mut stack = vec![(self.root(), flat.root())];

        while let Some((src, dst)) = stack.pop() {
            for child in self.true_children(src) {
                let node = &self.nodes[child.0];
                let connection = match node.connection {
                    Some(c) => c,
                    None => continue,
                };
                let new = flat.push_node(dst, node.wire, connection);
                stack.push((child, new));
            }
        }

        flat
    }

    pub fn leaves(&self) -> impl Iterator<Item = RouteNodeId> + '_ {
        self.nodes().filter(move |n| self.children(*n).is_empty())
    }

    pub fn wires(&self) -> impl Iterator<Item = Wire> + '_ {
        self.nodes.iter().map(|n| n.wire)
    }

    pub fn find_wire(&self, wire: Wire) -> Option<RouteNodeId> {
        self.nodes.iter()
            .position(|n| n.wire == wire)
            .map(RouteNodeId)
    }

    pub fn contains_wire(&self, wire: Wire) -> bool {
        self.find_wire(wire).is_some()
    }

    /// Nodes from `node` up to and including the root.
    pub fn path_to_root(&self, node: RouteNodeId) -> Vec<RouteNodeId> {
        let mut path = vec![node];
        let mut current = node;
        while let Some(parent) = self.parent(current) {
            path.push(parent);
            current = parent;
        }
        path
    }

    /// Number of switched connections (PIPs and routethroughs) in the tree.
    pub fn pip_count(&self) -> usize {
        self.nodes.iter()
            .filter_map(|n| n.connection.as_ref())
            .filter(|c| c.kind.is_switched())
            .count()
    }
}
