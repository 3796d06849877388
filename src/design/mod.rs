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

//! Placed netlist that routing information is imported into.

pub mod loader;

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

use crate::device::{BelId, BelPinId, SiteId, SitePinId, PinDir, Wire, WireEnum};
use crate::router::route_tree::RouteTree;

pub use self::loader::{DesignDesc, open};

#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct CellId(pub u32);

#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct CellPinId(pub u32);

#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct NetId(pub u32);

pub const VCC_NET_NAME: &str = "VCC";
pub const GND_NET_NAME: &str = "GND";

/// INIT value of the LUT1 buffers inserted around partition pins.
pub const BUFFER_INIT: &str = "2'h2";

#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImplementationMode {
    #[default]
    Regular,
    OutOfContext,
    ReconfigModule,
}

impl ImplementationMode {
    pub fn is_ooc(self) -> bool {
        !matches!(self, Self::Regular)
    }
}

#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NetKind {
    #[default]
    Wire,
    Vcc,
    Gnd,
}

#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RouteStatus {
    Unrouted,
    PartiallyRouted,
    FullyRouted,
}

#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum CellPinKind {
    Regular,
    /// Created during import for a BEL pin driven by a static net that has no
    /// logical counterpart.
    Pseudo,
    /// Boundary pin of an out-of-context module. Static partition pins have no
    /// wire.
    Partition { wire: Option<Wire> },
}

#[derive(Clone, Debug)]
pub struct Cell {
    pub name: String,
    pub lib_type: String,
    pub bel: Option<BelId>,
    pub site: Option<SiteId>,
    pub is_port: bool,
    pub properties: BTreeMap<String, String>,
    pub pins: Vec<CellPinId>,
    pub pseudo_pin_count: usize,
    pub partition_pin: Option<CellPinId>,
}

impl Cell {
    pub fn is_flip_flop_or_latch(&self) -> bool {
        self.lib_type.starts_with("FD") || self.lib_type.starts_with("LD")
    }
}

#[derive(Clone, Debug)]
pub struct CellPin {
    pub name: String,
    pub cell: CellId,
    pub dir: PinDir,
    pub kind: CellPinKind,
    pub net: Option<NetId>,
    pub bel_pins: Vec<BelPinId>,
}

impl CellPin {
    pub fn is_partition_pin(&self) -> bool {
        matches!(self.kind, CellPinKind::Partition { .. })
    }

    pub fn is_pseudo(&self) -> bool {
        self.kind == CellPinKind::Pseudo
    }
}

#[derive(Clone, Debug)]
pub struct Net {
    pub name: String,
    pub kind: NetKind,
    pins: Vec<CellPinId>,
    source: Option<CellPinId>,
    source_site_pins: Vec<SitePinId>,
    intersite_routes: Vec<RouteTree>,
    intrasite_routes: Vec<RouteTree>,
    source_route: Option<usize>,
    site_pin_routes: HashMap<SitePinId, usize>,
    bel_pin_routes: HashMap<BelPinId, usize>,
    routed_sinks: BTreeSet<CellPinId>,
    is_intrasite: bool,
    route_status: RouteStatus,
}

impl Net {
    fn new(name: String, kind: NetKind) -> Self {
        Self {
            name,
            kind,
            pins: Vec::new(),
            source: None,
            source_site_pins: Vec::new(),
            intersite_routes: Vec::new(),
            intrasite_routes: Vec::new(),
            source_route: None,
            site_pin_routes: HashMap::new(),
            bel_pin_routes: HashMap::new(),
            routed_sinks: BTreeSet::new(),
            is_intrasite: false,
            route_status: RouteStatus::Unrouted,
        }
    }

    pub fn is_static(&self) -> bool {
        self.kind != NetKind::Wire
    }

    pub fn is_vcc(&self) -> bool {
        self.kind == NetKind::Vcc
    }

    pub fn is_gnd(&self) -> bool {
        self.kind == NetKind::Gnd
    }

    pub fn pins(&self) -> &[CellPinId] {
        &self.pins
    }

    pub fn source(&self) -> Option<CellPinId> {
        self.source
    }

    pub fn sinks(&self) -> impl Iterator<Item = CellPinId> + '_ {
        self.pins.iter().copied().filter(move |p| Some(*p) != self.source)
    }

    pub fn fan_out(&self) -> usize {
        self.sinks().count()
    }

    pub fn source_site_pins(&self) -> &[SitePinId] {
        &self.source_site_pins
    }

    pub fn add_source_site_pin(&mut self, pin: SitePinId) {
        if !self.source_site_pins.contains(&pin) {
            self.source_site_pins.push(pin);
        }
    }

    pub fn remove_source_site_pin(&mut self, pin: SitePinId) {
        self.source_site_pins.retain(|p| *p != pin);
    }

    pub fn intersite_routes(&self) -> &[RouteTree] {
        &self.intersite_routes
    }

    /// The route exported for ordinary nets.
    pub fn intersite_route(&self) -> Option<&RouteTree> {
        self.intersite_routes.first()
    }

    pub fn add_intersite_route(&mut self, tree: RouteTree) {
        self.intersite_routes.push(tree);
    }

    pub fn intrasite_routes(&self) -> &[RouteTree] {
        &self.intrasite_routes
    }

    /// Register an intrasite tree. Returns its index, used by the sink maps.
    /// A tree that is already registered keeps its index.
    pub fn add_intrasite_route(&mut self, tree: RouteTree) -> usize {
        if let Some(idx) = self.intrasite_routes.iter().position(|t| *t == tree) {
            return idx;
        }
        self.intrasite_routes.push(tree);
        self.intrasite_routes.len() - 1
    }

    pub fn source_route(&self) -> Option<&RouteTree> {
        self.source_route.map(|idx| &self.intrasite_routes[idx])
    }

    pub fn set_source_route(&mut self, route: usize) {
        self.source_route = Some(route);
    }

    pub fn add_site_pin_sink_route(&mut self, pin: SitePinId, route: usize) {
        self.site_pin_routes.insert(pin, route);
    }

    pub fn add_bel_pin_sink_route(&mut self, pin: BelPinId, route: usize) {
        self.bel_pin_routes.insert(pin, route);
    }

    pub fn site_pin_route(&self, pin: SitePinId) -> Option<&RouteTree> {
        self.site_pin_routes.get(&pin).map(|idx| &self.intrasite_routes[*idx])
    }

    pub fn bel_pin_route(&self, pin: BelPinId) -> Option<&RouteTree> {
        self.bel_pin_routes.get(&pin).map(|idx| &self.intrasite_routes[*idx])
    }

    pub fn routed_sinks(&self) -> &BTreeSet<CellPinId> {
        &self.routed_sinks
    }

    pub fn add_routed_sink(&mut self, pin: CellPinId) {
        self.routed_sinks.insert(pin);
    }

    pub fn is_intrasite(&self) -> bool {
        self.is_intrasite
    }

    pub fn set_intrasite(&mut self, intrasite: bool) {
        self.is_intrasite = intrasite;
    }

    pub fn route_status(&self) -> RouteStatus {
        self.route_status
    }

    pub fn compute_route_status(&mut self) -> RouteStatus {
        let sinks = self.fan_out();
        let routed = self.sinks()
            .filter(|p| self.routed_sinks.contains(p))
            .count();

        self.route_status = if routed == 0 {
            RouteStatus::Unrouted
        } else if routed >= sinks {
            RouteStatus::FullyRouted
        } else {
            RouteStatus::PartiallyRouted
        };
        self.route_status
    }
}

/// A placed netlist together with the routing state gathered during import.
#[derive(Clone, Debug)]
pub struct Design {
    pub name: String,
    pub mode: ImplementationMode,
    cells: Vec<Cell>,
    cell_by_name: HashMap<String, CellId>,
    pins: Vec<CellPin>,
    nets: BTreeMap<NetId, Net>,
    net_by_name: HashMap<String, NetId>,
    next_net: u32,
    vcc: NetId,
    gnd: NetId,
    bel_to_cell: HashMap<BelId, CellId>,
    bel_pin_to_cell_pin: HashMap<BelPinId, CellPinId>,
    used_site_pips: HashMap<SiteId, HashSet<WireEnum>>,
    site_pip_values: HashMap<SiteId, BTreeMap<String, String>>,
    /// Port name -> `tile/wire` of its partition pin, or `VCC`/`GND`.
    pub part_pin_map: BTreeMap<String, String>,
    pub reserved_nodes: HashMap<Wire, NetId>,
    /// Reconfigurable module net -> net of the static design it continues.
    pub rm_static_net_map: HashMap<String, String>,
    /// Static design net -> route string of its static portion.
    pub static_route_strings: HashMap<String, String>,
}

impl Design {
    pub fn new(name: &str, mode: ImplementationMode) -> Self {
        let mut design = Self {
            name: name.to_string(),
            mode,
            cells: Vec::new(),
            cell_by_name: HashMap::new(),
            pins: Vec::new(),
            nets: BTreeMap::new(),
            net_by_name: HashMap::new(),
            next_net: 0,
            vcc: NetId(0),
            gnd: NetId(0),
            bel_to_cell: HashMap::new(),
            bel_pin_to_cell_pin: HashMap::new(),
            used_site_pips: HashMap::new(),
            site_pip_values: HashMap::new(),
            part_pin_map: BTreeMap::new(),
            reserved_nodes: HashMap::new(),
            rm_static_net_map: HashMap::new(),
            static_route_strings: HashMap::new(),
        };
        design.vcc = design.add_net(VCC_NET_NAME, NetKind::Vcc);
        design.gnd = design.add_net(GND_NET_NAME, NetKind::Gnd);
        design
    }

    /* Cells */

    pub fn add_cell(&mut self, name: &str, lib_type: &str) -> CellId {
        let id = CellId(self.cells.len() as u32);
        self.cells.push(Cell {
            name: name.to_string(),
            lib_type: lib_type.to_string(),
            bel: None,
            site: None,
            is_port: false,
            properties: BTreeMap::new(),
            pins: Vec::new(),
            pseudo_pin_count: 0,
            partition_pin: None,
        });
        self.cell_by_name.insert(name.to_string(), id);
        id
    }

    /// Adds a LUT1 configured as a buffer (`I0` -> `O`).
    pub fn add_lut1_buffer(&mut self, name: &str) -> CellId {
        let cell = self.add_cell(name, "LUT1");
        self.add_cell_pin(cell, "I0", PinDir::Input, CellPinKind::Regular);
        self.add_cell_pin(cell, "O", PinDir::Output, CellPinKind::Regular);
        self.cells[cell.0 as usize].properties.insert("INIT".into(), BUFFER_INIT.into());
        cell
    }

    pub fn add_cell_pin(&mut self, cell: CellId, name: &str, dir: PinDir, kind: CellPinKind)
        -> CellPinId
    {
        let id = CellPinId(self.pins.len() as u32);
        self.pins.push(CellPin {
            name: name.to_string(),
            cell,
            dir,
            kind,
            net: None,
            bel_pins: Vec::new(),
        });
        let cell = &mut self.cells[cell.0 as usize];
        match kind {
            CellPinKind::Partition { .. } => cell.partition_pin = Some(id),
            _ => cell.pins.push(id),
        }
        id
    }

    /// Attach a pseudo pin to a placed cell. The caller picks the name,
    /// usually derived from [`Cell::pseudo_pin_count`].
    pub fn attach_pseudo_pin(&mut self, cell: CellId, name: &str, dir: PinDir) -> CellPinId {
        let pin = self.add_cell_pin(cell, name, dir, CellPinKind::Pseudo);
        self.cells[cell.0 as usize].pseudo_pin_count += 1;
        pin
    }

    pub fn place_cell(&mut self, cell: CellId, site: SiteId, bel: BelId) {
        let c = &mut self.cells[cell.0 as usize];
        c.bel = Some(bel);
        c.site = Some(site);
        self.bel_to_cell.insert(bel, cell);
    }

    pub fn cell(&self, cell: CellId) -> &Cell {
        &self.cells[cell.0 as usize]
    }

    pub fn cell_mut(&mut self, cell: CellId) -> &mut Cell {
        &mut self.cells[cell.0 as usize]
    }

    pub fn cell_by_name(&self, name: &str) -> Option<CellId> {
        self.cell_by_name.get(name).copied()
    }

    pub fn cells(&self) -> impl Iterator<Item = (CellId, &Cell)> {
        self.cells.iter()
            .enumerate()
            .map(|(idx, c)| (CellId(idx as u32), c))
    }

    pub fn cell_at_bel(&self, bel: BelId) -> Option<CellId> {
        self.bel_to_cell.get(&bel).copied()
    }

    pub fn cells_at_site(&self, site: SiteId) -> impl Iterator<Item = &Cell> {
        self.cells.iter().filter(move |c| c.site == Some(site))
    }

    pub fn used_sites(&self) -> BTreeSet<SiteId> {
        self.cells.iter().filter_map(|c| c.site).collect()
    }

    /* Cell pins */

    pub fn pin(&self, pin: CellPinId) -> &CellPin {
        &self.pins[pin.0 as usize]
    }

    pub fn pin_by_name(&self, cell: CellId, name: &str) -> Option<CellPinId> {
        self.cell(cell).pins.iter()
            .copied()
            .find(|p| self.pin(*p).name == name)
    }

    pub fn pin_full_name(&self, pin: CellPinId) -> String {
        let pin = self.pin(pin);
        format!("{}/{}", self.cell(pin.cell).name, pin.name)
    }

    pub fn map_to_bel_pin(&mut self, pin: CellPinId, bel_pin: BelPinId) {
        self.pins[pin.0 as usize].bel_pins.push(bel_pin);
        self.bel_pin_to_cell_pin.insert(bel_pin, pin);
    }

    pub fn cell_pin_at(&self, bel_pin: BelPinId) -> Option<CellPinId> {
        self.bel_pin_to_cell_pin.get(&bel_pin).copied()
    }

    pub fn is_bel_pin_used(&self, bel_pin: BelPinId) -> bool {
        self.bel_pin_to_cell_pin.contains_key(&bel_pin)
    }

    /* Nets */

    pub fn add_net(&mut self, name: &str, kind: NetKind) -> NetId {
        let id = NetId(self.next_net);
        self.next_net += 1;
        self.nets.insert(id, Net::new(name.to_string(), kind));
        self.net_by_name.insert(name.to_string(), id);
        id
    }

    pub fn remove_net(&mut self, net: NetId) {
        if let Some(removed) = self.nets.remove(&net) {
            for pin in removed.pins {
                self.pins[pin.0 as usize].net = None;
            }
            self.net_by_name.remove(&removed.name);
        }
    }

    pub fn net(&self, net: NetId) -> &Net {
        &self.nets[&net]
    }

    pub fn net_mut(&mut self, net: NetId) -> &mut Net {
        self.nets.get_mut(&net).expect("Net was removed from the design")
    }

    pub fn nets(&self) -> impl Iterator<Item = (NetId, &Net)> {
        self.nets.iter().map(|(id, net)| (*id, net))
    }

    pub fn net_by_name(&self, name: &str) -> Option<NetId> {
        self.net_by_name.get(name).copied()
    }

    pub fn vcc_net(&self) -> NetId {
        self.vcc
    }

    pub fn gnd_net(&self) -> NetId {
        self.gnd
    }

    pub fn static_net(&self, vcc: bool) -> NetId {
        if vcc { self.vcc } else { self.gnd }
    }

    /// Connect `pin` to `net`, detaching it from any other net first. An
    /// output pin becomes the source of a signal net that has none.
    pub fn connect(&mut self, net: NetId, pin: CellPinId) {
        match self.pins[pin.0 as usize].net {
            Some(current) if current == net => return,
            Some(current) => self.disconnect(current, pin),
            None => (),
        }

        let dir = self.pins[pin.0 as usize].dir;
        self.pins[pin.0 as usize].net = Some(net);
        let net = self.net_mut(net);
        net.pins.push(pin);
        if dir == PinDir::Output && net.source.is_none() && !net.is_static() {
            net.source = Some(pin);
        }
    }

    pub fn disconnect(&mut self, net: NetId, pin: CellPinId) {
        if self.pins[pin.0 as usize].net == Some(net) {
            self.pins[pin.0 as usize].net = None;
        }
        let net = self.net_mut(net);
        net.pins.retain(|p| *p != pin);
        net.routed_sinks.remove(&pin);
        if net.source == Some(pin) {
            net.source = None;
        }
    }

    /// Make `pin` the source of `net`, regardless of its direction.
    pub fn set_net_source(&mut self, net: NetId, pin: CellPinId) {
        self.connect(net, pin);
        self.net_mut(net).source = Some(pin);
    }

    pub fn net_partition_pins(&self, net: NetId) -> Vec<CellPinId> {
        self.net(net).pins.iter()
            .copied()
            .filter(|p| self.pin(*p).is_partition_pin())
            .collect()
    }

    /// Nets with more than one input pin on a port cell.
    pub fn multi_port_sink_nets(&self) -> HashSet<NetId> {
        self.nets()
            .filter(|(_, net)| {
                net.pins.iter()
                    .filter(|p| {
                        let pin = self.pin(**p);
                        pin.dir == PinDir::Input && self.cell(pin.cell).is_port
                    })
                    .count() > 1
            })
            .map(|(id, _)| id)
            .collect()
    }

    /* Site PIPs */

    pub fn used_site_pips(&self, site: SiteId) -> Option<&HashSet<WireEnum>> {
        self.used_site_pips.get(&site)
    }

    pub fn set_used_site_pips(&mut self, site: SiteId, pips: HashSet<WireEnum>) {
        self.used_site_pips.insert(site, pips);
    }

    pub fn site_pip_values(&self, site: SiteId) -> Option<&BTreeMap<String, String>> {
        self.site_pip_values.get(&site)
    }

    pub fn add_site_pip_values(&mut self, site: SiteId, values: BTreeMap<String, String>) {
        self.site_pip_values.entry(site).or_default().extend(values);
    }
}

#[cfg(test)]
mod tests;
