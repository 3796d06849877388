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

//! Serializable views of the routing state. Ids are resolved to names using
//! the device and the design, so these only borrow.

use serde::{Serialize, Serializer, ser::SerializeStruct};

use crate::design::{Design, NetId};
use crate::device::{ConnKind, WireGraph};
use super::route_string::net_route_string;
use super::{RouteTree, RouteNodeId};

/// A route tree node with wire names instead of ids.
pub struct RouteTreeWithNames<'g, 't> {
    graph: &'g dyn WireGraph,
    tree: &'t RouteTree,
    node: RouteNodeId,
}

impl<'g, 't> RouteTreeWithNames<'g, 't> {
    pub fn new(graph: &'g dyn WireGraph, tree: &'t RouteTree) -> Self {
        Self { graph, tree, node: tree.root() }
    }

    fn child(&self, node: RouteNodeId) -> Self {
        Self { graph: self.graph, tree: self.tree, node }
    }
}

fn conn_kind_name(kind: ConnKind) -> &'static str {
    match kind {
        ConnKind::Wire => "wire",
        ConnKind::Pip => "pip",
        ConnKind::RouteThrough => "routethrough",
    }
}

impl<'g, 't> Serialize for RouteTreeWithNames<'g, 't> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error> where
        S: Serializer
    {
        let children: Vec<_> = self.tree.children(self.node).iter()
            .map(|c| self.child(*c))
            .collect();
        let kind = self.tree.connection(self.node).map(|c| conn_kind_name(c.kind));

        let mut s = serializer.serialize_struct("RouteNode", 3)?;
        s.serialize_field("wire", &self.graph.wire_full_name(self.tree.wire(self.node)))?;
        s.serialize_field("kind", &kind)?;
        s.serialize_field("children", &children)?;
        s.end()
    }
}

/// Everything imported for a single net.
pub struct NetRoutingWithNames<'g, 'd> {
    graph: &'g dyn WireGraph,
    design: &'d Design,
    net: NetId,
}

impl<'g, 'd> NetRoutingWithNames<'g, 'd> {
    pub fn new(graph: &'g dyn WireGraph, design: &'d Design, net: NetId) -> Self {
        Self { graph, design, net }
    }

    fn trees(&self, trees: &'d [RouteTree]) -> Vec<RouteTreeWithNames<'g, 'd>> {
        trees.iter()
            .map(|t| RouteTreeWithNames::new(self.graph, t))
            .collect()
    }
}

impl<'g, 'd> Serialize for NetRoutingWithNames<'g, 'd> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error> where
        S: Serializer
    {
        let net = self.design.net(self.net);
        let source = net.source().map(|p| self.design.pin_full_name(p));
        let source_site_pins: Vec<_> = net.source_site_pins().iter()
            .map(|p| self.graph.site_pin_full_name(*p))
            .collect();
        let routed_sinks: Vec<_> = net.routed_sinks().iter()
            .map(|p| self.design.pin_full_name(*p))
            .collect();

        let mut s = serializer.serialize_struct("NetRouting", 8)?;
        s.serialize_field("name", &net.name)?;
        s.serialize_field("status", &net.route_status())?;
        s.serialize_field("source", &source)?;
        s.serialize_field("source_site_pins", &source_site_pins)?;
        s.serialize_field("routed_sinks", &routed_sinks)?;
        s.serialize_field("route", &net_route_string(self.graph, net))?;
        s.serialize_field("intersite", &self.trees(net.intersite_routes()))?;
        s.serialize_field("intrasite", &self.trees(net.intrasite_routes()))?;
        s.end()
    }
}
