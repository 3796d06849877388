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

use std::collections::{HashSet, VecDeque};

use crate::device::{SitePinId, Wire, WireGraph};
#[allow(unused)]
use crate::log::*;
use super::{PipMap, RouteTree, RouteNodeId};

/// Result of an intersite search.
#[derive(Clone, Debug)]
pub struct IntersiteRoute {
    pub tree: RouteTree,
    /// Whether any PIP was followed. A route without one never left the wire
    /// it started on and does not describe a real route.
    pub pip_used: bool,
}

/// BFS over the general routing of the device.
///
/// Plain wires are always followed. Switched connections are followed only if
/// the [`PipMap`] enables them. Each input site pin the search reaches is
/// reported through `on_site_pin`. An error returned from the callback stops
/// the search.
pub struct IntersiteRouter<'g, 'p, F> {
    graph: &'g dyn WireGraph,
    pip_map: &'p PipMap,
    tree: RouteTree,
    queue: VecDeque<RouteNodeId>,
    visited: HashSet<Wire>,
    pip_used: bool,
    on_site_pin: F,
}

impl<'g, 'p, F, E> IntersiteRouter<'g, 'p, F> where
    F: FnMut(SitePinId) -> Result<(), E>
{
    pub fn new(graph: &'g dyn WireGraph, pip_map: &'p PipMap, start: Wire, on_site_pin: F)
        -> Self
    {
        let tree = RouteTree::new(start);
        let root = tree.root();
        Self {
            graph,
            pip_map,
            tree,
            queue: VecDeque::from([root]),
            visited: HashSet::from([start]),
            pip_used: false,
            on_site_pin,
        }
    }

    fn is_enabled(&self, source: Wire, sink: Wire) -> bool {
        self.pip_map.is_enabled(
            &self.graph.wire_full_name(source),
            &self.graph.wire_full_name(sink)
        )
    }

    fn routing_step(&mut self) -> Result<Option<RouteNodeId>, E> {
        let node = match self.queue.pop_front() {
            Some(node) => node,
            None => return Ok(None),
        };
        let wire = self.tree.wire(node);

        for conn in self.graph.wire_connections(wire) {
            if self.visited.contains(&conn.sink) {
                continue;
            }
            if conn.kind.is_switched() {
                if !self.is_enabled(conn.source, conn.sink) {
                    continue;
                }
                self.pip_used = true;
            }
            let next = self.tree.extend(node, conn);
            self.visited.insert(conn.sink);
            self.queue.push_back(next);
        }

        if let Some(site_pin) = self.graph.connected_pin(wire) {
            dbg_log!(
                DBG_EXTRA2,
                "    reached site pin {}",
                self.graph.site_pin_full_name(site_pin)
            );
            (self.on_site_pin)(site_pin)?;
        }

        Ok(Some(node))
    }

    pub fn route_all(mut self) -> Result<IntersiteRoute, E> {
        while self.routing_step()?.is_some() {}
        Ok(IntersiteRoute { tree: self.tree, pip_used: self.pip_used })
    }
}

/// Recreate the route that starts at `start` and follows the PIPs of `pip_map`.
pub fn route<F, E>(graph: &dyn WireGraph, pip_map: &PipMap, start: Wire, on_site_pin: F)
    -> Result<IntersiteRoute, E>
where
    F: FnMut(SitePinId) -> Result<(), E>
{
    IntersiteRouter::new(graph, pip_map, start, on_site_pin).route_all()
}

#[cfg(test)]
mod tests;
