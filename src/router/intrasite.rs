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

use crate::design::{Design, NetId};
use crate::device::{BelPinId, Connection, SitePinId, Wire, WireEnum, WireGraph};
#[allow(unused)]
use crate::log::*;
use super::{RouteTree, RouteNodeId, RoutethroughMap};

/// Everything an intrasite search reads but never modifies.
pub struct SearchContext<'a> {
    pub graph: &'a dyn WireGraph,
    pub design: &'a Design,
    /// Used site PIPs of the searched site. `None` when the site reported none.
    pub used_site_pips: Option<&'a HashSet<WireEnum>>,
    pub routethroughs: &'a RoutethroughMap,
}

impl<'a> SearchContext<'a> {
    fn is_used_routethrough(&self, conn: &Connection) -> bool {
        if !conn.is_route_through() {
            return false;
        }
        let source = match self.graph.terminal(conn.source) {
            Some(pin) => pin,
            None => {
                dbg_log!(
                    DBG_WARN,
                    "Routethrough source {} does not connect to a BEL pin",
                    self.graph.wire_full_name(conn.source)
                );
                return false;
            },
        };
        let bel = self.graph.bel_pin_info(source).bel;
        self.routethroughs.get(&bel)
            .map(|rt| self.graph.bel_pin_wire(rt.output) == conn.sink)
            .unwrap_or(false)
    }

    fn is_used_site_pip(&self, source: Wire) -> bool {
        self.used_site_pips
            .map(|pips| pips.contains(&source.wire_enum()))
            .unwrap_or(false)
    }

    /// A connection may be followed inside a site if it is a plain wire, a
    /// used routethrough or leaves a used site PIP wire.
    pub fn is_qualified(&self, conn: &Connection) -> bool {
        !conn.kind.is_switched()
            || self.is_used_routethrough(conn)
            || self.is_used_site_pip(conn.source)
    }
}

#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum IntrasiteSource {
    /// Route entering the site through an input site pin. With `allow_unused`
    /// (static nets) any BEL pin is a valid sink, even one with no cell pin.
    SitePin { pin: SitePinId, allow_unused: bool },
    /// Route driven by a BEL output. A `contained` route must not leave the site.
    BelPin { pin: BelPinId, contained: bool },
}

/// Intrasite route of a net, from its creation through the search up to the
/// point where it is applied to the design.
#[derive(Clone, Debug)]
pub struct IntrasiteRoute {
    source: IntrasiteSource,
    net: NetId,
    tree: RouteTree,
    bel_pin_sinks: Vec<BelPinId>,
    site_pin_sinks: Vec<SitePinId>,
    terminals: HashSet<RouteNodeId>,
}

impl IntrasiteRoute {
    pub fn from_site_pin(
        graph: &dyn WireGraph,
        net: NetId,
        pin: SitePinId,
        allow_unused: bool
    ) -> Self {
        Self::new(
            IntrasiteSource::SitePin { pin, allow_unused },
            net,
            graph.site_pin_internal_wire(pin)
        )
    }

    pub fn from_bel_pin(
        graph: &dyn WireGraph,
        net: NetId,
        pin: BelPinId,
        contained: bool
    ) -> Self {
        Self::new(
            IntrasiteSource::BelPin { pin, contained },
            net,
            graph.bel_pin_wire(pin)
        )
    }

    fn new(source: IntrasiteSource, net: NetId, start: Wire) -> Self {
        Self {
            source,
            net,
            tree: RouteTree::new(start),
            bel_pin_sinks: Vec::new(),
            site_pin_sinks: Vec::new(),
            terminals: HashSet::new(),
        }
    }

    pub fn source(&self) -> IntrasiteSource {
        self.source
    }

    /// Net the route belongs to. May change in [`Self::apply_routing`].
    pub fn net(&self) -> NetId {
        self.net
    }

    pub fn tree(&self) -> &RouteTree {
        &self.tree
    }

    pub fn bel_pin_sinks(&self) -> &[BelPinId] {
        &self.bel_pin_sinks
    }

    pub fn site_pin_sinks(&self) -> &[SitePinId] {
        &self.site_pin_sinks
    }

    pub fn start_wire(&self) -> Wire {
        self.tree.wire(self.tree.root())
    }

    pub fn is_valid_bel_pin_sink(&self, ctx: &SearchContext, wire: Wire) -> bool {
        let terminal = match ctx.graph.terminal(wire) {
            Some(terminal) => terminal,
            None => return false,
        };
        match self.source {
            IntrasiteSource::SitePin { allow_unused, .. } =>
                allow_unused || ctx.design.is_bel_pin_used(terminal),
            IntrasiteSource::BelPin { .. } => ctx.design.is_bel_pin_used(terminal),
        }
    }

    /// Offer a BEL pin reached by the search. Returns whether it was accepted.
    pub fn add_bel_pin_sink(
        &mut self,
        ctx: &SearchContext,
        pin: BelPinId,
        terminal: RouteNodeId
    ) -> bool {
        if let IntrasiteSource::SitePin { allow_unused: false, .. } = self.source {
            let on_this_net = ctx.design.cell_pin_at(pin)
                .map(|cp| ctx.design.pin(cp).net == Some(self.net))
                .unwrap_or(false);
            if !on_this_net {
                return false;
            }
        }

        if !self.bel_pin_sinks.contains(&pin) {
            self.bel_pin_sinks.push(pin);
        }
        self.terminals.insert(terminal);
        true
    }

    /// Offer a site pin reached by the search. Returns whether it was accepted.
    pub fn add_site_pin_sink(&mut self, pin: SitePinId, terminal: RouteNodeId) -> bool {
        match self.source {
            IntrasiteSource::SitePin { .. } => false,
            IntrasiteSource::BelPin { contained: true, .. } => false,
            IntrasiteSource::BelPin { contained: false, .. } => {
                if !self.site_pin_sinks.contains(&pin) {
                    self.site_pin_sinks.push(pin);
                }
                self.terminals.insert(terminal);
                true
            },
        }
    }

    pub fn is_valid(&self) -> bool {
        match self.source {
            IntrasiteSource::BelPin { contained: true, .. } =>
                !self.bel_pin_sinks.is_empty() && self.site_pin_sinks.is_empty(),
            IntrasiteSource::BelPin { contained: false, .. } =>
                !self.bel_pin_sinks.is_empty() || !self.site_pin_sinks.is_empty(),
            IntrasiteSource::SitePin { .. } => !self.bel_pin_sinks.is_empty(),
        }
    }

    pub fn prune_route(&mut self) {
        let terminals = std::mem::take(&mut self.terminals);
        self.tree.prune(&terminals);
    }

    /// Run the search and prune the tree down to the accepted sinks.
    pub fn build(&mut self, ctx: &SearchContext) {
        IntrasiteRouter::new(ctx, self).route_all();
        self.prune_route();
    }

    /// Register the route with the design: attach it to the source and sink
    /// pins it reached, connect unconnected cell pins and create pseudo pins for
    /// static nets.
    pub fn apply_routing(&mut self, graph: &dyn WireGraph, design: &mut Design) {
        let mut registered: Vec<(NetId, usize)> = Vec::new();
        let mut route_on = |design: &mut Design, net: NetId, tree: &RouteTree| {
            if let Some((_, idx)) = registered.iter().find(|(n, _)| *n == net) {
                return *idx;
            }
            let idx = design.net_mut(net).add_intrasite_route(tree.clone());
            registered.push((net, idx));
            idx
        };

        match self.source {
            IntrasiteSource::SitePin { pin, allow_unused } => {
                let net = self.net;
                let idx = route_on(design, net, &self.tree);
                design.net_mut(net).add_site_pin_sink_route(pin, idx);

                for bel_pin in &self.bel_pin_sinks {
                    design.net_mut(net).add_bel_pin_sink_route(*bel_pin, idx);
                    if !allow_unused {
                        continue;
                    }
                    match design.cell_pin_at(*bel_pin) {
                        Some(cell_pin) => {
                            if design.pin(cell_pin).net.is_none() {
                                design.connect(net, cell_pin);
                            }
                        },
                        None => create_pseudo_pin(graph, design, net, *bel_pin),
                    }
                }
            },
            IntrasiteSource::BelPin { .. } => {
                let mut net = self.net;

                /* Static sources have no cell pin on the BEL */
                if !design.net(net).is_static() {
                    let idx = route_on(design, net, &self.tree);
                    let no_site_pin_sources = design.net(net).source_site_pins().is_empty();
                    let net_mut = design.net_mut(net);
                    net_mut.set_source_route(idx);
                    for site_pin in &self.site_pin_sinks {
                        if no_site_pin_sources && graph.site_pin_info(*site_pin).is_output() {
                            net_mut.add_source_site_pin(*site_pin);
                        }
                        net_mut.add_site_pin_sink_route(*site_pin, idx);
                    }
                }

                for bel_pin in &self.bel_pin_sinks {
                    if let Some(cell_pin) = design.cell_pin_at(*bel_pin) {
                        let current = design.pin(cell_pin).net;
                        match current {
                            None => design.connect(net, cell_pin),
                            Some(other) if other != net => {
                                if !design.net(other).is_static() {
                                    dbg_log!(
                                        DBG_WARN,
                                        "{} is routed from {} but belongs to {}",
                                        design.pin_full_name(cell_pin),
                                        design.net(net).name,
                                        design.net(other).name
                                    );
                                }
                                net = other;
                            },
                            Some(_) => (),
                        }
                    }
                    let idx = route_on(design, net, &self.tree);
                    design.net_mut(net).add_bel_pin_sink_route(*bel_pin, idx);
                }

                self.net = net;
            },
        }
    }

    pub fn set_sinks_as_routed(&self, design: &mut Design) {
        for bel_pin in &self.bel_pin_sinks {
            if let Some(cell_pin) = design.cell_pin_at(*bel_pin) {
                design.net_mut(self.net).add_routed_sink(cell_pin);
            }
        }
    }
}

/// Attach a `VCC_pseudo<N>`/`GND_pseudo<N>` pin to the cell placed on the BEL
/// of `bel_pin`, tie it to the static `net` and map it onto `bel_pin`.
fn create_pseudo_pin(
    graph: &dyn WireGraph,
    design: &mut Design,
    net: NetId,
    bel_pin: BelPinId
) {
    let info = graph.bel_pin_info(bel_pin);
    let cell = match design.cell_at_bel(info.bel) {
        Some(cell) => cell,
        None => {
            /* Leads to a routethrough BEL */
            dbg_log!(
                DBG_EXTRA1,
                "No cell on {} to attach a pseudo pin to",
                graph.bel_pin_full_name(bel_pin)
            );
            return;
        },
    };

    let prefix = if design.net(net).is_vcc() { "VCC_pseudo" } else { "GND_pseudo" };
    let name = format!("{}{}", prefix, design.cell(cell).pseudo_pin_count);
    let pseudo = design.attach_pseudo_pin(cell, &name, info.dir);
    design.connect(net, pseudo);
    design.map_to_bel_pin(pseudo, bel_pin);
}

/// BFS over the wires of one site.
struct IntrasiteRouter<'c, 'a, 'r> {
    ctx: &'c SearchContext<'a>,
    route: &'r mut IntrasiteRoute,
    queue: VecDeque<RouteNodeId>,
    visited: HashSet<Wire>,
    start: Wire,
}

impl<'c, 'a, 'r> IntrasiteRouter<'c, 'a, 'r> {
    fn new(ctx: &'c SearchContext<'a>, route: &'r mut IntrasiteRoute) -> Self {
        let start = route.start_wire();
        let root = route.tree.root();
        Self {
            ctx,
            route,
            queue: VecDeque::from([root]),
            visited: HashSet::from([start]),
            start,
        }
    }

    /// Pops a node and either offers it as a sink or expands it.
    fn routing_step(&mut self) -> Option<RouteNodeId> {
        let node = self.queue.pop_front()?;
        let graph = self.ctx.graph;
        let wire = self.route.tree.wire(node);

        if wire != self.start && self.route.is_valid_bel_pin_sink(self.ctx, wire) {
            if let Some(bel_pin) = graph.terminal(wire) {
                let accepted = self.route.add_bel_pin_sink(self.ctx, bel_pin, node);
                dbg_log!(
                    DBG_EXTRA2,
                    "    BEL pin sink {} (accepted: {})",
                    graph.bel_pin_full_name(bel_pin),
                    accepted
                );
            }
            return Some(node);
        }

        if let Some(site_pin) = graph.connected_pin(wire).filter(|_| wire != self.start) {
            let accepted = self.route.add_site_pin_sink(site_pin, node);
            dbg_log!(
                DBG_EXTRA2,
                "    site pin sink {} (accepted: {})",
                graph.site_pin_full_name(site_pin),
                accepted
            );
            return Some(node);
        }

        for conn in graph.wire_connections(wire) {
            if self.visited.contains(&conn.sink) {
                continue;
            }
            if self.ctx.is_qualified(&conn) {
                let next = self.route.tree.extend(node, conn);
                self.visited.insert(conn.sink);
                self.queue.push_back(next);
            }
        }

        Some(node)
    }

    fn route_all(mut self) {
        while self.routing_step().is_some() {}
    }
}

#[cfg(test)]
mod tests;
