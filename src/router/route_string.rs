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

//! Textual forms of routes: PIP tokens coming from the routing record file
//! and nested `ROUTE` strings going to the constraint file.
//!
//! A route string lists the wires of a route in order. Whenever a wire has
//! more than one programmable successor, all but the last successor are
//! written as nested `{ ... }` groups and the last one continues the current
//! group:
//!
//! ```text
//! { INT_X0Y0/LOGIC_OUT { INT_X0Y0/NN2 INT_X0Y0/IMUX_A1 } INT_X0Y0/EE2 INT_X0Y0/IMUX_B1 }
//! ```
//!
//! Static nets have one tree per tieoff and are written as
//! `" ( { ... } ) ( { ... } ) "`.

use std::collections::{HashMap, HashSet};
use regex::Regex;

use crate::design::Net;
use crate::device::{Wire, WireGraph};
use crate::error::{ParseError, RouteStringError};
use super::{RouteTree, RouteNodeId};

/// Tile whose wires are written without the tile prefix.
pub const OOC_WIRE_TILE: &str = "OOC_WIRE_X0Y0";

lazy_static! {
    /// `tile/tileType.SOURCE<arrow>SINK`
    static ref PIP_TOKEN: Regex =
        Regex::new(r"^([^/]+)/[^.]+\.(.+?)(<<->>|<->|->>|->)(.+)$").unwrap();
}

/// Enabled PIPs of a single route, as full wire name -> full wire names.
#[derive(Clone, Debug, Default)]
pub struct PipMap {
    pips: HashMap<String, HashSet<String>>,
}

impl PipMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_tokens<'t, I>(tokens: I) -> Result<Self, ParseError> where
        I: IntoIterator<Item = &'t str>
    {
        let mut map = Self::new();
        for token in tokens {
            map.add_token(token)?;
        }
        Ok(map)
    }

    /// Register a `tile/tileType.SRC->SINK` token. Bidirectional PIPs
    /// (`<->`, `<<->>`) are registered in both directions; the search decides
    /// which one is actually used.
    pub fn add_token(&mut self, token: &str) -> Result<(), ParseError> {
        let caps = PIP_TOKEN.captures(token)
            .ok_or_else(|| ParseError::InvalidPip(token.to_string()))?;

        let tile = &caps[1];
        let source = format!("{}/{}", tile, &caps[2]);
        let sink = format!("{}/{}", tile, &caps[4]);

        if matches!(&caps[3], "<->" | "<<->>") {
            self.add_pip(sink.clone(), source.clone());
        }
        self.add_pip(source, sink);
        Ok(())
    }

    pub fn add_pip(&mut self, source: String, sink: String) {
        self.pips.entry(source).or_default().insert(sink);
    }

    pub fn is_enabled(&self, source: &str, sink: &str) -> bool {
        self.pips.get(source)
            .map(|sinks| sinks.contains(sink))
            .unwrap_or(false)
    }

    pub fn sinks<'s>(&'s self, source: &str) -> impl Iterator<Item = &'s str> + 's {
        self.pips.get(source)
            .into_iter()
            .flat_map(|sinks| sinks.iter().map(String::as_str))
    }

    /// Number of enabled (directed) PIPs.
    pub fn len(&self) -> usize {
        self.pips.values().map(HashSet::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.pips.is_empty()
    }
}

/// Name of a wire as it appears in a route string.
pub fn route_string_wire_name(graph: &dyn WireGraph, wire: Wire) -> String {
    let tile = graph.wire_tile(wire);
    if graph.tile_name(tile) == OOC_WIRE_TILE {
        graph.wire_name(wire).to_string()
    } else {
        format!("{}/{}", graph.tile_name(tile), graph.wire_name(wire))
    }
}

/// Route string of a single tree.
pub fn route_string(graph: &dyn WireGraph, tree: &RouteTree) -> String {
    RouteStringTree::from_route_tree(graph, tree).to_route_string()
}

/// `ROUTE` property value of a net. Returns `None` if the net has no
/// intersite route.
pub fn net_route_string(graph: &dyn WireGraph, net: &Net) -> Option<String> {
    match net.intersite_routes() {
        [] => None,
        [tree] => Some(route_string(graph, tree)),
        trees => {
            let mut s = String::from("\" ");
            for tree in trees {
                s.push_str("( ");
                s.push_str(&route_string(graph, tree));
                s.push_str(" ) ");
            }
            s.push('"');
            Some(s)
        },
    }
}

/// Route string in tree form. A node's last child continues the node's
/// group, the other children are branches.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct RouteStringTree {
    pub wire: String,
    pub children: Vec<RouteStringTree>,
}

impl RouteStringTree {
    pub fn new(wire: &str) -> Self {
        Self { wire: wire.to_string(), children: Vec::new() }
    }

    /// Build from a route tree, skipping plain wire hops the same way the
    /// route string does.
    pub fn from_route_tree(graph: &dyn WireGraph, tree: &RouteTree) -> Self {
        Self::from_route_node(graph, tree, tree.root())
    }

    fn from_route_node(graph: &dyn WireGraph, tree: &RouteTree, start: RouteNodeId) -> Self {
        let mut chain: Vec<(String, Vec<RouteStringTree>)> = Vec::new();
        let mut current = start;

        loop {
            let name = route_string_wire_name(graph, tree.wire(current));
            let true_children = tree.true_children(current);
            let (last, branches) = match true_children.split_last() {
                Some(split) => split,
                None => {
                    chain.push((name, Vec::new()));
                    break;
                },
            };
            let branches = branches.iter()
                .map(|b| Self::from_route_node(graph, tree, *b))
                .collect();
            chain.push((name, branches));
            current = *last;
        }

        Self::fold_chain(chain)
    }

    /// Turn a group's wires (each with its branches) into nested nodes.
    fn fold_chain(chain: Vec<(String, Vec<RouteStringTree>)>) -> Self {
        let mut continuation: Option<RouteStringTree> = None;
        for (wire, mut children) in chain.into_iter().rev() {
            if let Some(next) = continuation.take() {
                children.push(next);
            }
            continuation = Some(RouteStringTree { wire, children });
        }
        /* A chain always has at least its first wire */
        continuation.unwrap_or_else(|| RouteStringTree::new(""))
    }

    pub fn to_route_string(&self) -> String {
        let mut s = String::new();
        self.write_group(&mut s);
        s
    }

    fn write_group(&self, out: &mut String) {
        out.push_str("{ ");
        let mut current = self;
        loop {
            out.push_str(&current.wire);
            out.push(' ');
            match current.children.split_last() {
                Some((last, branches)) => {
                    for branch in branches {
                        branch.write_group(out);
                        out.push(' ');
                    }
                    current = last;
                },
                None => break,
            }
        }
        out.push('}');
    }

    /// Parse a single route string.
    pub fn parse(route: &str) -> Result<Self, RouteStringError> {
        Self::parse_all(route)?
            .into_iter()
            .next()
            .ok_or(RouteStringError::UnexpectedEnd)
    }

    /// Parse every top level group of a route string. Static net quoting and
    /// parentheses are skipped.
    pub fn parse_all(route: &str) -> Result<Vec<Self>, RouteStringError> {
        let tokens = tokenize(route);
        let mut pos = 0;
        let mut trees = Vec::new();

        while pos < tokens.len() {
            match tokens[pos] {
                "\"" | "(" | ")" => pos += 1,
                "{" => trees.push(parse_group(&tokens, &mut pos)?),
                other => return Err(RouteStringError::UnexpectedToken(other.to_string())),
            }
        }

        Ok(trees)
    }

    pub fn find(&self, wire: &str) -> Option<&RouteStringTree> {
        if self.wire == wire {
            return Some(self);
        }
        self.children.iter().find_map(|c| c.find(wire))
    }

    pub fn find_mut(&mut self, wire: &str) -> Option<&mut RouteStringTree> {
        if self.wire == wire {
            return Some(self);
        }
        self.children.iter_mut().find_map(|c| c.find_mut(wire))
    }

    /// Append the children of `other` to the node of this tree that has the
    /// same wire as `other`'s root. Returns `false` if there is no such node.
    pub fn merge_children_from(&mut self, other: &RouteStringTree) -> bool {
        match self.find_mut(&other.wire) {
            Some(node) => {
                node.children.extend(other.children.iter().cloned());
                true
            },
            None => false,
        }
    }

    pub fn wires(&self) -> Vec<&str> {
        let mut wires = Vec::new();
        let mut stack = vec![self];
        while let Some(node) = stack.pop() {
            wires.push(node.wire.as_str());
            stack.extend(node.children.iter().rev());
        }
        wires
    }
}

fn tokenize(route: &str) -> Vec<&str> {
    let mut tokens = Vec::new();
    let mut start = None;

    for (idx, c) in route.char_indices() {
        let is_delim = matches!(c, '{' | '}' | '(' | ')' | '"');
        if c.is_whitespace() || is_delim {
            if let Some(s) = start.take() {
                tokens.push(&route[s..idx]);
            }
            if is_delim {
                tokens.push(&route[idx..idx + 1]);
            }
        } else if start.is_none() {
            start = Some(idx);
        }
    }
    if let Some(s) = start {
        tokens.push(&route[s..]);
    }

    tokens
}

/// Parse a `{ ... }` group starting at `tokens[*pos]`.
fn parse_group(tokens: &[&str], pos: &mut usize) -> Result<RouteStringTree, RouteStringError> {
    match tokens.get(*pos) {
        Some(&"{") => *pos += 1,
        Some(other) => return Err(RouteStringError::UnexpectedToken(other.to_string())),
        None => return Err(RouteStringError::UnexpectedEnd),
    }

    let mut chain: Vec<(String, Vec<RouteStringTree>)> = Vec::new();
    loop {
        match tokens.get(*pos) {
            None => return Err(RouteStringError::UnexpectedEnd),
            Some(&"}") => {
                *pos += 1;
                break;
            },
            Some(&"{") => {
                let branch = parse_group(tokens, pos)?;
                match chain.last_mut() {
                    Some((_, branches)) => branches.push(branch),
                    None => return Err(RouteStringError::UnexpectedToken("{".into())),
                }
            },
            Some(token @ (&"(" | &")" | &"\"")) =>
                return Err(RouteStringError::UnexpectedToken(token.to_string())),
            Some(name) => {
                chain.push((name.to_string(), Vec::new()));
                *pos += 1;
            },
        }
    }

    if chain.is_empty() {
        return Err(RouteStringError::EmptyGroup);
    }
    Ok(RouteStringTree::fold_chain(chain))
}
