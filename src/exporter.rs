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

use std::path::PathBuf;
use std::fs::File;
use std::collections::{BTreeMap, HashSet};
use std::io::{BufWriter, Write};

use serde::Serialize;

use crate::design::{Design, ImplementationMode, NetId};
use crate::device::{Family, SiteId, WireGraph};
use crate::error::ExportError;
#[allow(unused)]
use crate::log::*;
use crate::router::route_string::{net_route_string, RouteStringTree};

#[derive(Default)]
struct ExportChecker {
    export: HashSet<String>,
    export_all: bool,
}

impl ExportChecker {
    fn new(arg_list: &Option<Vec<String>>) -> Self {
        let mut checker = Self::default();
        if let Some(args) = arg_list {
            for arg in args {
                if arg == ":all" {
                    checker.export_all = true;
                } else {
                    checker.export.insert(arg.clone());
                }
            }
        }
        checker
    }

    fn should_export(&self, name: &str) -> bool {
        self.export_all || self.export.contains(name)
    }
}

pub trait Exporter<D> {
    fn ignore_or_export<'s, F>(&'s mut self, name: &str, exporter: F)
        -> Result<(), ExportError>
    where
        F: FnOnce() -> D + 's;

    fn flush(&mut self) -> Result<(), ExportError>;
}

/// Collects the selected entries and writes them as a single JSON object.
pub struct CompoundJsonExporter<D> where D: Serialize {
    filename: PathBuf,
    data: BTreeMap<String, D>,
    checker: ExportChecker,
}

impl<D> CompoundJsonExporter<D> where D: Serialize {
    /// `arg_list` names the entries to export, `:all` selects everything.
    pub fn new(arg_list: &Option<Vec<String>>, filename: PathBuf) -> Self {
        Self {
            filename,
            data: BTreeMap::new(),
            checker: ExportChecker::new(arg_list),
        }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn to_json(&self) -> Result<String, ExportError> {
        Ok(serde_json::to_string_pretty(&self.data)?)
    }
}

impl<D> Exporter<D> for CompoundJsonExporter<D> where D: Serialize {
    fn ignore_or_export<'s, F>(&'s mut self, name: &str, exporter: F)
        -> Result<(), ExportError>
    where
        F: FnOnce() -> D + 's
    {
        if self.checker.should_export(name) {
            let data = exporter();
            self.data.insert(name.into(), data);
        }
        Ok(())
    }

    fn flush(&mut self) -> Result<(), ExportError> {
        let data = self.to_json()?;
        let mut file = File::create(&self.filename)?;
        file.write_all(data.as_bytes())?;
        Ok(())
    }
}

/// Nets of a reconfigurable module that cross its boundary. Their routes are
/// merged with the routes of the static design instead of being written as is.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PartPinNets {
    /// Nets driven by a partition pin.
    pub source_nets: Vec<NetId>,
    /// Nets that leave the module through a partition pin.
    pub sink_nets: Vec<NetId>,
}

impl PartPinNets {
    pub fn is_empty(&self) -> bool {
        self.source_nets.is_empty() && self.sink_nets.is_empty()
    }
}

/// Writes the imported routing as Tcl constraints.
pub struct XdcExporter<'g, 'd> {
    graph: &'g dyn WireGraph,
    design: &'d Design,
}

impl<'g, 'd> XdcExporter<'g, 'd> {
    pub fn new(graph: &'g dyn WireGraph, design: &'d Design) -> Self {
        Self { graph, design }
    }

    /// Write `ROUTE` constraints for every routed net, optionally preceded by
    /// the site PIPs of used slices. Boundary nets of reconfigurable modules
    /// are skipped and returned for [`Self::write_part_pin_routing`].
    pub fn write_routing<W: Write>(&self, out: &mut W, intrasite: bool)
        -> Result<PartPinNets, ExportError>
    {
        if intrasite {
            self.write_intrasite_routing(out)?;
        }

        let mut part_pin_nets = PartPinNets::default();
        let mut count = 0;

        for (id, net) in self.design.nets() {
            if self.design.mode == ImplementationMode::ReconfigModule {
                let source_is_part_pin = net.source()
                    .map(|src| self.design.pin(src).is_partition_pin())
                    .unwrap_or(false);
                if source_is_part_pin {
                    part_pin_nets.source_nets.push(id);
                    continue;
                }
                if !net.is_gnd() && !self.design.net_partition_pins(id).is_empty() {
                    part_pin_nets.sink_nets.push(id);
                    continue;
                }
            }

            if let Some(route) = net_route_string(self.graph, net) {
                writeln!(out, "set_property ROUTE {} [get_nets {{{}}}]", route, net.name)?;
                count += 1;
            }
        }

        dbg_log!(DBG_INFO, "Wrote ROUTE constraints for {} nets", count);
        Ok(part_pin_nets)
    }

    /// `MANUAL_ROUTING` and `SITE_PIPS` of every used slice with site PIPs.
    pub fn write_intrasite_routing<W: Write>(&self, out: &mut W) -> Result<(), ExportError> {
        for site in self.design.used_sites() {
            let site_type = self.graph.site_type_name(site);
            if !site_type.starts_with("SLICE") {
                continue;
            }
            let values = match self.design.site_pip_values(site) {
                Some(values) if !values.is_empty() => values,
                _ => continue,
            };
            let site_name = self.graph.site_name(site);

            let mut pips: Vec<String> = values.iter()
                .map(|(pip, input)| format!("{}:{}", pip, input))
                .collect();
            let polarity = self.polarity_selectors(site);
            if !polarity.is_empty() {
                pips.push(polarity);
            }
            let pips = pips.join(" ");

            writeln!(out, "set_property MANUAL_ROUTING {} [get_sites {{{}}}]", site_type, site_name)?;
            writeln!(out, "set_property SITE_PIPS {{{}}} [get_sites {{{}}}]", pips, site_name)?;
        }
        Ok(())
    }

    /// Clock and reset inverter settings. These are never reported as used
    /// site PIPs but must be set for manual routing to be accepted. On 7-series
    /// slices only sites with a flip-flop or latch get one.
    fn polarity_selectors(&self, site: SiteId) -> String {
        match self.graph.family() {
            Family::Series7 => {
                let ff = match self.design.cells_at_site(site).find(|c| c.is_flip_flop_or_latch()) {
                    Some(ff) => ff,
                    None => return String::new(),
                };
                let inverted = ff.properties.get("IS_C_INVERTED")
                    .map(|v| v == "1'b1")
                    .unwrap_or(false);
                if inverted { "CLKINV:CLK_B".into() } else { "CLKINV:CLK".into() }
            },
            Family::Ultrascale => {
                let mut s = String::new();
                if self.graph.site_type_name(site) == "SLICEM" {
                    s.push_str("LCLKINV:CLK ");
                }
                s.push_str("CLK1INV:CLK CLK2INV:CLK RST_ABCDINV:RST RST_EFGHINV:RST");
                s
            },
            Family::Other => String::new(),
        }
    }

    /// Merge the routes of boundary nets with the static design routes they
    /// continue and write them under the static net names.
    pub fn write_part_pin_routing<W: Write>(&self, out: &mut W, nets: &PartPinNets)
        -> Result<(), ExportError>
    {
        for net in &nets.source_nets {
            let source = self.design.net(*net).source()
                .map(|src| self.design.pin(src).cell);
            if let Some(port) = source {
                let port = &self.design.cell(port).name;
                self.write_merged_route(out, *net, port, true)?;
            }
        }

        for net in &nets.sink_nets {
            for part_pin in self.design.net_partition_pins(*net) {
                let port = &self.design.cell(self.design.pin(part_pin).cell).name;
                self.write_merged_route(out, *net, port, false)?;
            }
        }
        Ok(())
    }

    fn write_merged_route<W: Write>(&self, out: &mut W, net: NetId, port: &str, rm_source: bool)
        -> Result<(), ExportError>
    {
        let net = self.design.net(net);
        let part_pin_node = self.design.part_pin_map.get(port)
            .ok_or_else(|| ExportError::MissingPartPin(port.to_string()))?;
        let static_net = self.design.rm_static_net_map.get(&net.name)
            .ok_or_else(|| ExportError::MissingStaticRoute(net.name.clone()))?;
        let static_route = self.design.static_route_strings.get(static_net)
            .ok_or_else(|| ExportError::MissingStaticRoute(static_net.clone()))?;
        let module_route = match net.intersite_route() {
            Some(tree) => RouteStringTree::from_route_tree(self.graph, tree),
            None => {
                dbg_log!(DBG_WARN, "Boundary net {} has no route", net.name);
                return Ok(());
            },
        };

        let merged = merge_partial_route(
            RouteStringTree::parse(static_route)?,
            module_route,
            part_pin_node,
            rm_source
        ).ok_or_else(|| ExportError::MergeFailed {
            net: net.name.clone(),
            node: part_pin_node.clone(),
        })?;

        writeln!(
            out,
            "set_property ROUTE {} [get_nets {{{}}}]",
            merged.to_route_string(),
            static_net
        )?;
        Ok(())
    }

    /// Write the routing constraints to `xdc` and, for reconfigurable
    /// modules, the merged boundary routes to `part_pin_xdc`.
    pub fn export(&self, xdc: PathBuf, part_pin_xdc: Option<PathBuf>, intrasite: bool)
        -> Result<(), ExportError>
    {
        let mut out = BufWriter::new(File::create(&xdc)?);
        let nets = self.write_routing(&mut out, intrasite)?;
        out.flush()?;

        if let Some(path) = part_pin_xdc {
            let mut out = BufWriter::new(File::create(&path)?);
            self.write_part_pin_routing(&mut out, &nets)?;
            out.flush()?;
        } else if !nets.is_empty() {
            dbg_log!(
                DBG_WARN,
                "{} boundary nets skipped, no partition pin output was given",
                nets.source_nets.len() + nets.sink_nets.len()
            );
        }
        Ok(())
    }
}

/// Join a static design route and a module route at the partition pin node.
/// The route that is driven through the partition pin is grafted onto the
/// other one. Returns `None` if the routes don't meet at `part_pin_node`.
pub fn merge_partial_route(
    static_route: RouteStringTree,
    module_route: RouteStringTree,
    part_pin_node: &str,
    rm_source: bool
) -> Option<RouteStringTree> {
    let (mut to_merge, to_add) = if rm_source {
        (static_route, module_route)
    } else {
        (module_route, static_route)
    };

    if to_add.wire != part_pin_node {
        return None;
    }
    if !to_merge.merge_children_from(&to_add) {
        return None;
    }
    Some(to_merge)
}
