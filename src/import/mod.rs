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

//! Import of a routing record file.
//!
//! Every non-empty line is one record, its first token selects the handler:
//!
//! | Record                        | Tokens                                   |
//! |-------------------------------|------------------------------------------|
//! | `SITE_PIPS`                   | site, `pip:input`...                     |
//! | `INTERSITE`                   | net, `site/pin`...                       |
//! | `INTRASITE`                   | net                                      |
//! | `ROUTE`                       | net, `tile/tileType.src->sink`...        |
//! | `LUT_RTS`                     | `site/bel/inPin/outPin`...               |
//! | `VCC_SOURCES`/`GND_SOURCES`   | `site/bel/outPin`...                     |
//! | `VCC`/`GND`                   | PIPs, followed by a `START_WIRES` line   |
//! | `PART_PIN`                    | port, `tile/wire`, `IN`/`OUT`            |
//! | `VCC_PART_PINS`/`GND_PART_PINS` | port...                                |
//!
//! The first error aborts the import. It carries the file name and the line
//! number of the offending record.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use flate2::read::GzDecoder;

use crate::common::{is_gzipped, split_path};
use crate::design::{CellId, CellPinId, CellPinKind, Design, ImplementationMode, NetId, NetKind};
use crate::device::{BelId, BelPinId, PinDir, SiteId, SitePinId, TileId, Wire, WireEnum, WireGraph};
use crate::error::{ImportError, ParseError};
#[allow(unused)]
use crate::log::*;
use crate::router::intersite::{self, IntersiteRoute};
use crate::router::intrasite::{IntrasiteRoute, SearchContext};
use crate::router::{BelRoutethrough, PipMap, RoutethroughMap};

/// Type of the tiles that hold the boundary wires of out-of-context designs.
pub const OOC_WIRE_TILE_TYPE: &str = "OOC_WIRE";

/// Location of the record being processed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ParseCursor {
    pub file: String,
    pub line: usize,
}

impl ParseCursor {
    pub fn new(file: &str, line: usize) -> Self {
        Self { file: file.to_string(), line }
    }

    pub fn error(&self, kind: ParseError) -> ImportError {
        ImportError::Parse { file: self.file.clone(), line: self.line, kind }
    }

    fn token_count(&self, expected: usize, actual: usize) -> ImportError {
        self.error(ParseError::TokenCount { expected, actual })
    }
}

/// Reconstructs the routing of a design from routing records.
pub struct RoutingImporter<'g, 'd> {
    graph: &'g dyn WireGraph,
    design: &'d mut Design,
    /// Routes into sites, created by `INTERSITE` before the `ROUTE` record of
    /// the net reaches the pin.
    site_pin_routes: HashMap<SitePinId, IntrasiteRoute>,
    /// Site type name -> names of its VCC/GND source BELs.
    static_source_cache: HashMap<String, Vec<String>>,
    routethroughs: RoutethroughMap,
    vcc_source_bels: BTreeSet<BelId>,
    gnd_source_bels: BTreeSet<BelId>,
    multi_port_sink_nets: HashSet<NetId>,
}

impl<'g, 'd> RoutingImporter<'g, 'd> {
    pub fn new(graph: &'g dyn WireGraph, design: &'d mut Design) -> Self {
        let multi_port_sink_nets = match design.mode {
            ImplementationMode::Regular => HashSet::new(),
            _ => design.multi_port_sink_nets(),
        };

        Self {
            graph,
            design,
            site_pin_routes: HashMap::new(),
            static_source_cache: HashMap::new(),
            routethroughs: RoutethroughMap::new(),
            vcc_source_bels: BTreeSet::new(),
            gnd_source_bels: BTreeSet::new(),
            multi_port_sink_nets,
        }
    }

    pub fn routethroughs(&self) -> &RoutethroughMap {
        &self.routethroughs
    }

    pub fn vcc_source_bels(&self) -> &BTreeSet<BelId> {
        &self.vcc_source_bels
    }

    pub fn gnd_source_bels(&self) -> &BTreeSet<BelId> {
        &self.gnd_source_bels
    }

    /// Import a routing record file. Gzipped files are decompressed on the fly.
    pub fn import_file<P>(&mut self, path: P) -> Result<(), ImportError> where
        P: AsRef<Path>
    {
        let path = path.as_ref();
        let file = File::open(path)?;
        let mut content = String::new();
        if is_gzipped(path) {
            BufReader::new(GzDecoder::new(file)).read_to_string(&mut content)?;
        } else {
            BufReader::new(file).read_to_string(&mut content)?;
        }
        self.import_str(&path.display().to_string(), &content)
    }

    /// Import routing records. `file` only names the source in errors.
    pub fn import_str(&mut self, file: &str, content: &str) -> Result<(), ImportError> {
        let mut lines = content.lines().enumerate();
        let mut record_count = 0;

        while let Some((idx, line)) = lines.next() {
            let cursor = ParseCursor::new(file, idx + 1);
            let toks: Vec<&str> = line.split_whitespace().collect();
            if toks.is_empty() {
                continue;
            }
            record_count += 1;

            match toks[0] {
                "SITE_PIPS" => self.process_site_pips(&cursor, &toks)?,
                "INTERSITE" => self.process_intersite_pins(&cursor, &toks)?,
                "INTRASITE" => self.process_intrasite_route(&cursor, &toks)?,
                "ROUTE" => self.process_intersite_route(&cursor, &toks)?,
                "LUT_RTS" => self.process_lut_routethroughs(&cursor, &toks)?,
                "VCC_SOURCES" => self.process_static_sources(&cursor, &toks, true)?,
                "GND_SOURCES" => self.process_static_sources(&cursor, &toks, false)?,
                "VCC" | "GND" => {
                    let (start_idx, start_line) = lines.next().ok_or_else(|| {
                        cursor.error(ParseError::MissingStartWires(toks[0].to_string()))
                    })?;
                    let start_cursor = ParseCursor::new(file, start_idx + 1);
                    let start_toks: Vec<&str> = start_line.split_whitespace().collect();
                    if start_toks.first() != Some(&"START_WIRES") {
                        return Err(start_cursor.error(
                            ParseError::MissingStartWires(toks[0].to_string())
                        ));
                    }
                    self.process_static_net(&cursor, &toks, &start_cursor, &start_toks)?;
                },
                "PART_PIN" => self.process_part_pin(&cursor, &toks)?,
                "VCC_PART_PINS" => self.process_static_part_pins(&cursor, &toks, true)?,
                "GND_PART_PINS" => self.process_static_part_pins(&cursor, &toks, false)?,
                other => {
                    return Err(cursor.error(ParseError::UnrecognizedToken(other.to_string())));
                },
            }
        }

        for net in [self.design.vcc_net(), self.design.gnd_net()] {
            self.design.net_mut(net).compute_route_status();
        }

        dbg_log!(DBG_INFO, "Imported {} routing records from {}", record_count, file);
        Ok(())
    }

    /* Record handlers */

    fn process_site_pips(&mut self, cursor: &ParseCursor, toks: &[&str])
        -> Result<(), ImportError>
    {
        if toks.len() < 2 {
            return Err(cursor.token_count(2, toks.len()));
        }
        let site = self.try_get_site(cursor, toks[1])?;
        self.read_used_site_pips(cursor, site, &toks[2..])?;
        self.create_static_subsite_route_trees(site);
        Ok(())
    }

    /// Record the used site PIPs of `site`. A `pip:input` token names the
    /// site wire `intrasite:<siteType>/<pip>.<input>`.
    fn read_used_site_pips(&mut self, cursor: &ParseCursor, site: SiteId, toks: &[&str])
        -> Result<(), ImportError>
    {
        let graph = self.graph;
        let prefix = format!("intrasite:{}/", graph.site_type_name(site));
        let mut used: HashSet<WireEnum> = HashSet::new();
        let mut values = BTreeMap::new();

        for tok in toks {
            let (pip, input) = tok.split_once(':')
                .ok_or_else(|| cursor.token_count(2, 1))?;

            let wire_name = format!("{}{}.{}", prefix, pip, input);
            let wire_enum = graph.wire_enum(&wire_name)
                .ok_or_else(|| cursor.error(ParseError::UnknownWire(wire_name.clone())))?;

            let conns = graph.wire_connections(Wire::Site { site, wire: wire_enum });
            match conns.as_slice() {
                [] => (),
                [conn] => {
                    if !conn.is_pip() {
                        dbg_log!(DBG_WARN, "Site PIP wire {} is not a PIP source", wire_name);
                    }
                    used.insert(wire_enum);
                    used.insert(conn.sink.wire_enum());
                },
                _ => return Err(cursor.error(ParseError::SitePipConnections {
                    wire: wire_name,
                    count: conns.len(),
                })),
            }

            values.insert(pip.to_string(), input.to_string());
        }

        dbg_log!(
            DBG_EXTRA1,
            "Site {}: {} used site PIP wires",
            graph.site_name(site),
            used.len()
        );
        self.design.set_used_site_pips(site, used);
        self.design.add_site_pip_values(site, values);
        Ok(())
    }

    /// Names of the VCC/GND source BELs of a site type.
    fn static_source_bels(&mut self, site: SiteId) -> Vec<String> {
        let graph = self.graph;
        let site_type = graph.site_type_name(site);
        if let Some(names) = self.static_source_cache.get(site_type) {
            return names.clone();
        }

        let mut names: Vec<String> = graph.site_bels(site).iter()
            .map(|bel| graph.bel_info(*bel).name.clone())
            .filter(|name| name.contains("VCC") || name.contains("GND"))
            .collect();
        names.sort();
        self.static_source_cache.insert(site_type.to_string(), names.clone());
        names
    }

    /// Route the static nets out of every tieoff BEL of `site` that drives
    /// something.
    fn create_static_subsite_route_trees(&mut self, site: SiteId) {
        let graph = self.graph;
        for bel_name in self.static_source_bels(site) {
            let bel = match graph.bel(site, &bel_name) {
                Some(bel) => bel,
                None => continue,
            };
            let net = self.design.static_net(bel_name.contains("VCC"));
            for pin in graph.bel_sources(bel) {
                self.try_create_static_intrasite_route(net, pin);
            }
        }
    }

    fn process_intersite_pins(&mut self, cursor: &ParseCursor, toks: &[&str])
        -> Result<(), ImportError>
    {
        if toks.len() < 2 {
            return Err(cursor.token_count(2, toks.len()));
        }
        let graph = self.graph;
        let net = self.try_get_net(cursor, toks[1])?;

        for tok in &toks[2..] {
            let parts = split_path(tok, 2).map_err(|n| cursor.token_count(2, n))?;
            let site = self.try_get_site(cursor, parts[0])?;
            let site_pin = self.try_get_site_pin(cursor, site, parts[1])?;

            if graph.site_pin_info(site_pin).is_input() {
                self.create_site_pin_route(cursor, net, site_pin)?;
                continue;
            }

            if !self.design.net(net).source_site_pins().is_empty() {
                self.design.net_mut(net).add_source_site_pin(site_pin);
                continue;
            }
            self.design.net_mut(net).add_source_site_pin(site_pin);

            let source = self.try_get_net_source(cursor, net)?;
            if let Some(bel_pin) = self.try_get_mapped_bel_pin(cursor, source)? {
                self.create_bel_pin_route(cursor, net, bel_pin, false)?;
            }
        }

        self.design.net_mut(net).compute_route_status();
        Ok(())
    }

    fn process_intrasite_route(&mut self, cursor: &ParseCursor, toks: &[&str])
        -> Result<(), ImportError>
    {
        if toks.len() != 2 {
            return Err(cursor.token_count(2, toks.len()));
        }
        let net = self.try_get_net(cursor, toks[1])?;

        let source = match self.design.net(net).source() {
            Some(source) => source,
            None => {
                dbg_log!(DBG_WARN, "Intrasite net {} has no source", toks[1]);
                return Ok(());
            },
        };
        let bel_pin = match self.try_get_mapped_bel_pin(cursor, source)? {
            Some(bel_pin) => bel_pin,
            None => return Ok(()),
        };

        let net = self.create_bel_pin_route(cursor, net, bel_pin, true)?;
        let net = self.design.net_mut(net);
        net.set_intrasite(true);
        net.compute_route_status();
        Ok(())
    }

    fn process_intersite_route(&mut self, cursor: &ParseCursor, toks: &[&str])
        -> Result<(), ImportError>
    {
        if toks.len() < 2 {
            return Err(cursor.token_count(2, toks.len()));
        }
        let graph = self.graph;
        let net = self.try_get_net(cursor, toks[1])?;
        let pip_map = PipMap::from_tokens(toks[2..].iter().copied())
            .map_err(|e| cursor.error(e))?;

        let regular = self.design.mode == ImplementationMode::Regular;

        /* Nets driven from inside a site whose INTERSITE record only listed sinks */
        if regular && self.design.net(net).source_site_pins().is_empty() {
            let source = self.try_get_net_source(cursor, net)?;
            if let Some(bel_pin) = self.try_get_mapped_bel_pin(cursor, source)? {
                self.create_bel_pin_route(cursor, net, bel_pin, false)?;
            }
        }

        if regular && self.design.net(net).source_site_pins().is_empty() {
            return Err(cursor.error(ParseError::NoSourceSitePin(toks[1].to_string())));
        }

        let source_site_pins = self.design.net(net).source_site_pins().to_vec();
        let mut unused_sources = Vec::new();
        for site_pin in source_site_pins {
            let start = graph.site_pin_external_wire(site_pin);
            let route = self.route_intersite(net, start, &pip_map)?;
            if route.pip_used {
                self.design.net_mut(net).add_intersite_route(route.tree);
            } else {
                unused_sources.push(site_pin);
            }
        }
        for site_pin in unused_sources {
            dbg_log!(
                DBG_EXTRA1,
                "Dropping unused source site pin {} of {}",
                graph.site_pin_full_name(site_pin),
                toks[1]
            );
            self.design.net_mut(net).remove_source_site_pin(site_pin);
        }

        if self.design.mode.is_ooc() {
            if let Some(start) = self.partition_start_wire(cursor, net)? {
                let route = self.route_intersite(net, start, &pip_map)?;
                self.design.net_mut(net).add_intersite_route(route.tree);
            }
        }

        let status = self.design.net_mut(net).compute_route_status();
        dbg_log!(DBG_EXTRA1, "Net {}: {:?}", toks[1], status);
        Ok(())
    }

    /// Start wire of a net driven by a port of an out-of-context design.
    fn partition_start_wire(&self, cursor: &ParseCursor, net: NetId)
        -> Result<Option<Wire>, ImportError>
    {
        let source = match self.design.net(net).source() {
            Some(source) => self.design.pin(source),
            None => return Ok(None),
        };
        let cell = self.design.cell(source.cell);
        if !cell.is_port {
            return Ok(None);
        }
        match self.design.part_pin_map.get(&cell.name) {
            Some(wire) if wire != "VCC" && wire != "GND" =>
                self.part_pin_wire(cursor, wire).map(Some),
            _ => Ok(None),
        }
    }

    /// Records accumulate. A BEL listed again replaces its earlier entry, BELs
    /// from earlier records stay in the table.
    fn process_lut_routethroughs(&mut self, cursor: &ParseCursor, toks: &[&str])
        -> Result<(), ImportError>
    {
        for tok in &toks[1..] {
            let parts = split_path(tok, 4).map_err(|n| cursor.token_count(4, n))?;
            let site = self.try_get_site(cursor, parts[0])?;
            let bel = self.try_get_bel(cursor, site, parts[1])?;
            let input = self.try_get_bel_pin(cursor, bel, parts[2])?;
            let output = self.try_get_bel_pin(cursor, bel, parts[3])?;
            self.routethroughs.insert(bel, BelRoutethrough { input, output });
        }
        Ok(())
    }

    fn process_static_sources(&mut self, cursor: &ParseCursor, toks: &[&str], vcc: bool)
        -> Result<(), ImportError>
    {
        let graph = self.graph;
        let net = self.design.static_net(vcc);

        for tok in &toks[1..] {
            let parts = split_path(tok, 3).map_err(|n| cursor.token_count(3, n))?;
            let site = self.try_get_site(cursor, parts[0])?;
            let bel = self.try_get_bel(cursor, site, parts[1])?;
            let pin = self.try_get_bel_pin(cursor, bel, parts[2])?;

            if !self.try_create_static_intrasite_route(net, pin) {
                return Err(cursor.error(ParseError::NoIntrasiteRoute {
                    source_pin: graph.bel_pin_full_name(pin),
                    net: self.design.net(net).name.clone(),
                }));
            }

            if vcc {
                self.vcc_source_bels.insert(bel);
            } else {
                self.gnd_source_bels.insert(bel);
            }
        }
        Ok(())
    }

    fn process_static_net(
        &mut self,
        cursor: &ParseCursor,
        toks: &[&str],
        start_cursor: &ParseCursor,
        start_toks: &[&str]
    ) -> Result<(), ImportError> {
        let net = self.try_get_net(cursor, toks[0])?;
        let pip_map = PipMap::from_tokens(toks[1..].iter().copied())
            .map_err(|e| cursor.error(e))?;

        for tok in &start_toks[1..] {
            let start = self.try_get_tile_wire(start_cursor, tok)?;
            let route = self.route_intersite(net, start, &pip_map)?;
            self.design.net_mut(net).add_intersite_route(route.tree);
        }

        dbg_log!(
            DBG_EXTRA1,
            "Static net {}: {} route trees",
            toks[0],
            self.design.net(net).intersite_routes().len()
        );
        Ok(())
    }

    fn process_part_pin(&mut self, cursor: &ParseCursor, toks: &[&str])
        -> Result<(), ImportError>
    {
        if toks.len() != 4 {
            return Err(cursor.token_count(4, toks.len()));
        }
        let port = self.try_get_cell(cursor, toks[1])?;
        let wire = self.part_pin_wire(cursor, toks[2])?;
        let dir = match toks[3] {
            "IN" => PinDir::Input,
            "OUT" => PinDir::Output,
            other => return Err(cursor.error(ParseError::InvalidDirection(other.to_string()))),
        };

        self.design.part_pin_map.insert(toks[1].to_string(), toks[2].to_string());
        let part_pin = self.add_partition_pin(cursor, port, wire, dir)?;
        if let Some(net) = self.design.pin(part_pin).net {
            self.design.reserved_nodes.insert(wire, net);
        }
        Ok(())
    }

    /// Replace the single pin of a port cell with a partition pin. LUT1
    /// buffers are inserted where a direct connection can't be routed.
    fn add_partition_pin(
        &mut self,
        cursor: &ParseCursor,
        port: CellId,
        wire: Wire,
        dir: PinDir
    ) -> Result<CellPinId, ImportError> {
        let port_pin = self.single_port_pin(cursor, port)?;
        let port_name = self.design.cell(port).name.clone();
        let pin_name = self.design.pin(port_pin).name.clone();
        let part_pin = self.design.add_cell_pin(
            port,
            &pin_name,
            dir,
            CellPinKind::Partition { wire: Some(wire) }
        );
        let current = self.design.pin(port_pin).net;
        if let Some(net) = current {
            self.design.disconnect(net, port_pin);
        }

        match dir {
            PinDir::Output => {
                let net = match current {
                    Some(net) => net,
                    None => self.design.add_net(&port_name, NetKind::Wire),
                };
                self.design.set_net_source(net, part_pin);

                if self.design.net(net).fan_out() == 0 {
                    let buf = self.design.add_lut1_buffer(&format!("IN_BUF_Inserted_{}", port_name));
                    let input = self.lut_pin(buf, "I0");
                    self.design.connect(net, input);
                }
            },
            _ => {
                let net = current.unwrap_or_else(|| self.design.gnd_net());
                let driven_by_boundary = self.design.net(net).source()
                    .map(|src| {
                        let src = self.design.pin(src);
                        src.is_partition_pin() || self.design.cell(src.cell).is_port
                    })
                    .unwrap_or(false);

                if self.design.net(net).is_static()
                    || self.multi_port_sink_nets.contains(&net)
                    || driven_by_boundary
                {
                    let net_name = self.design.net(net).name.clone();
                    let buf = self.design.add_lut1_buffer(
                        &format!("{}_InsertedInst_{}", net_name, port_name)
                    );
                    let input = self.lut_pin(buf, "I0");
                    let output = self.lut_pin(buf, "O");
                    self.design.connect(net, input);

                    let buffered = self.design.add_net(
                        &format!("{}_InsertedNet_{}", net_name, port_name),
                        NetKind::Wire
                    );
                    self.design.connect(buffered, output);
                    self.design.connect(buffered, part_pin);
                } else {
                    self.design.connect(net, part_pin);
                }
            },
        }

        Ok(part_pin)
    }

    fn lut_pin(&self, lut: CellId, name: &str) -> CellPinId {
        self.design.pin_by_name(lut, name)
            .expect("LUT1 buffers always have I0 and O pins")
    }

    fn process_static_part_pins(&mut self, cursor: &ParseCursor, toks: &[&str], vcc: bool)
        -> Result<(), ImportError>
    {
        let static_net = self.design.static_net(vcc);
        let static_name = if vcc { "VCC" } else { "GND" };

        for port_name in &toks[1..] {
            self.design.part_pin_map.insert(port_name.to_string(), static_name.to_string());
            let port = self.try_get_cell(cursor, port_name)?;
            let port_pin = self.single_port_pin(cursor, port)?;

            if let Some(net) = self.design.pin(port_pin).net {
                self.design.disconnect(net, port_pin);
                if net != static_net {
                    for pin in self.design.net(net).pins().to_vec() {
                        self.design.connect(static_net, pin);
                    }
                    self.design.remove_net(net);
                }
            }

            let pin_name = self.design.pin(port_pin).name.clone();
            let part_pin = self.design.add_cell_pin(
                port,
                &pin_name,
                PinDir::Input,
                CellPinKind::Partition { wire: None }
            );
            self.design.connect(static_net, part_pin);
        }
        Ok(())
    }

    /* Route construction */

    fn search_context(&self, site: SiteId) -> SearchContext<'_> {
        SearchContext {
            graph: self.graph,
            design: &*self.design,
            used_site_pips: self.design.used_site_pips(site),
            routethroughs: &self.routethroughs,
        }
    }

    fn build_intrasite_route(&self, route: &mut IntrasiteRoute, site: SiteId) {
        let ctx = self.search_context(site);
        route.build(&ctx);
    }

    /// Speculative route from a static source BEL pin. Returns whether it
    /// found anything to drive.
    fn try_create_static_intrasite_route(&mut self, net: NetId, pin: BelPinId) -> bool {
        let graph = self.graph;
        let mut route = IntrasiteRoute::from_bel_pin(graph, net, pin, false);
        self.build_intrasite_route(&mut route, graph.bel_pin_site(pin));
        if !route.is_valid() {
            return false;
        }
        route.apply_routing(graph, self.design);
        route.set_sinks_as_routed(self.design);
        true
    }

    /// Mandatory route from the BEL pin driving `net`. Returns the net the
    /// route ended up on.
    fn create_bel_pin_route(
        &mut self,
        cursor: &ParseCursor,
        net: NetId,
        pin: BelPinId,
        contained: bool
    ) -> Result<NetId, ImportError> {
        let graph = self.graph;
        let mut route = IntrasiteRoute::from_bel_pin(graph, net, pin, contained);
        self.build_intrasite_route(&mut route, graph.bel_pin_site(pin));
        if !route.is_valid() {
            return Err(cursor.error(ParseError::NoIntrasiteRoute {
                source_pin: graph.bel_pin_full_name(pin),
                net: self.design.net(net).name.clone(),
            }));
        }
        route.apply_routing(graph, self.design);
        route.set_sinks_as_routed(self.design);
        Ok(route.net())
    }

    /// Mandatory route into a site through an input site pin. Its sinks are
    /// marked as routed once the intersite route reaches the pin.
    fn create_site_pin_route(&mut self, cursor: &ParseCursor, net: NetId, pin: SitePinId)
        -> Result<(), ImportError>
    {
        let graph = self.graph;
        let mut route = IntrasiteRoute::from_site_pin(graph, net, pin, false);
        self.build_intrasite_route(&mut route, graph.site_pin_info(pin).site);
        if !route.is_valid() {
            return Err(cursor.error(ParseError::NoIntrasiteRoute {
                source_pin: graph.site_pin_full_name(pin),
                net: self.design.net(net).name.clone(),
            }));
        }
        route.apply_routing(graph, self.design);
        self.site_pin_routes.insert(pin, route);
        Ok(())
    }

    /// Static nets enter sites without an `INTERSITE` record. Whatever they
    /// drive inside the site is discovered here.
    fn create_static_net_implicit_sinks(&mut self, net: NetId, pin: SitePinId) {
        let graph = self.graph;
        let mut route = IntrasiteRoute::from_site_pin(graph, net, pin, true);
        self.build_intrasite_route(&mut route, graph.site_pin_info(pin).site);
        if !route.is_valid() {
            return;
        }
        route.apply_routing(graph, self.design);
        route.set_sinks_as_routed(self.design);
    }

    fn process_site_pin_sink(&mut self, net: NetId, pin: SitePinId) {
        if let Some(route) = self.site_pin_routes.get(&pin) {
            route.set_sinks_as_routed(self.design);
        } else if self.design.net(net).is_static() {
            self.create_static_net_implicit_sinks(net, pin);
        }
    }

    fn route_intersite(&mut self, net: NetId, start: Wire, pip_map: &PipMap)
        -> Result<IntersiteRoute, ImportError>
    {
        let graph = self.graph;
        intersite::route(graph, pip_map, start, |pin| {
            self.process_site_pin_sink(net, pin);
            Ok::<(), ImportError>(())
        })
    }

    /* Lookups */

    fn try_get_net(&self, cursor: &ParseCursor, name: &str) -> Result<NetId, ImportError> {
        match name {
            "VCC" => Ok(self.design.vcc_net()),
            "GND" => Ok(self.design.gnd_net()),
            _ => self.design.net_by_name(name)
                .ok_or_else(|| cursor.error(ParseError::UnknownNet(name.to_string()))),
        }
    }

    fn try_get_cell(&self, cursor: &ParseCursor, name: &str) -> Result<CellId, ImportError> {
        self.design.cell_by_name(name)
            .ok_or_else(|| cursor.error(ParseError::UnknownCell(name.to_string())))
    }

    fn single_port_pin(&self, cursor: &ParseCursor, port: CellId)
        -> Result<CellPinId, ImportError>
    {
        match self.design.cell(port).pins.as_slice() {
            [pin] => Ok(*pin),
            pins => Err(cursor.error(ParseError::PortPinCount {
                port: self.design.cell(port).name.clone(),
                count: pins.len(),
            })),
        }
    }

    fn try_get_net_source(&self, cursor: &ParseCursor, net: NetId)
        -> Result<CellPinId, ImportError>
    {
        let net = self.design.net(net);
        net.source()
            .ok_or_else(|| cursor.error(ParseError::NoSourcePin(net.name.clone())))
    }

    /// BEL pin a cell pin is placed on. Out-of-context designs may have pins
    /// with no (or more than one) BEL pin, those are skipped.
    fn try_get_mapped_bel_pin(&self, cursor: &ParseCursor, pin: CellPinId)
        -> Result<Option<BelPinId>, ImportError>
    {
        match self.design.pin(pin).bel_pins.as_slice() {
            [bel_pin] => Ok(Some(*bel_pin)),
            _ if self.design.mode.is_ooc() => Ok(None),
            bel_pins => Err(cursor.error(ParseError::BelPinMapping {
                pin: self.design.pin_full_name(pin),
                count: bel_pins.len(),
            })),
        }
    }

    fn try_get_site(&self, cursor: &ParseCursor, name: &str) -> Result<SiteId, ImportError> {
        self.graph.site_by_name(name)
            .ok_or_else(|| cursor.error(ParseError::UnknownSite(name.to_string())))
    }

    fn try_get_site_pin(&self, cursor: &ParseCursor, site: SiteId, name: &str)
        -> Result<SitePinId, ImportError>
    {
        self.graph.site_pin(site, name).ok_or_else(|| cursor.error(ParseError::UnknownSitePin {
            site: self.graph.site_name(site).to_string(),
            pin: name.to_string(),
        }))
    }

    fn try_get_bel(&self, cursor: &ParseCursor, site: SiteId, name: &str)
        -> Result<BelId, ImportError>
    {
        self.graph.bel(site, name).ok_or_else(|| cursor.error(ParseError::UnknownBel {
            site: self.graph.site_name(site).to_string(),
            bel: name.to_string(),
        }))
    }

    fn try_get_bel_pin(&self, cursor: &ParseCursor, bel: BelId, name: &str)
        -> Result<BelPinId, ImportError>
    {
        self.graph.bel_pin(bel, name).ok_or_else(|| cursor.error(ParseError::UnknownBelPin {
            bel: self.graph.bel_info(bel).name.clone(),
            pin: name.to_string(),
        }))
    }

    fn try_get_tile(&self, cursor: &ParseCursor, name: &str) -> Result<TileId, ImportError> {
        self.graph.tile_by_name(name)
            .ok_or_else(|| cursor.error(ParseError::UnknownTile(name.to_string())))
    }

    fn try_get_tile_wire(&self, cursor: &ParseCursor, name: &str) -> Result<Wire, ImportError> {
        let parts = split_path(name, 2).map_err(|n| cursor.token_count(2, n))?;
        let tile = self.try_get_tile(cursor, parts[0])?;
        let wire = self.graph.wire_enum(parts[1])
            .ok_or_else(|| cursor.error(ParseError::UnknownWire(name.to_string())))?;
        Ok(Wire::Tile { tile, wire })
    }

    /// Wire of a partition pin. Wires of `OOC_WIRE` tiles keep the tile
    /// prefix in their name.
    fn part_pin_wire(&self, cursor: &ParseCursor, name: &str) -> Result<Wire, ImportError> {
        let parts = split_path(name, 2).map_err(|n| cursor.token_count(2, n))?;
        let tile = self.try_get_tile(cursor, parts[0])?;
        let wire_name = if self.graph.tile_type_name(tile) == OOC_WIRE_TILE_TYPE {
            name
        } else {
            parts[1]
        };
        let wire = self.graph.wire_enum(wire_name)
            .ok_or_else(|| cursor.error(ParseError::UnknownWire(name.to_string())))?;
        Ok(Wire::Tile { tile, wire })
    }
}

/// Import a routing file into `design`.
pub fn import_routing<P>(graph: &dyn WireGraph, design: &mut Design, path: P)
    -> Result<(), ImportError>
where
    P: AsRef<Path>
{
    RoutingImporter::new(graph, design).import_file(path)
}
