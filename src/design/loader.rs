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

use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::Path;

use crate::common::load_description;
use crate::device::{PinDir, WireGraph};
use crate::error::DesignError;
use super::*;

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct DesignDesc {
    pub name: String,
    #[serde(default)]
    pub mode: ImplementationMode,
    #[serde(default)]
    pub cells: Vec<CellDesc>,
    #[serde(default)]
    pub nets: Vec<NetDesc>,
    /// Reconfigurable module net -> static design net.
    #[serde(default)]
    pub rm_static_nets: HashMap<String, String>,
    /// Static design net -> its route string.
    #[serde(default)]
    pub static_routes: HashMap<String, String>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CellDesc {
    pub name: String,
    #[serde(rename = "type")]
    pub lib_type: String,
    /// `site/bel` the cell is placed on.
    #[serde(default)]
    pub bel: Option<String>,
    #[serde(default)]
    pub port: bool,
    #[serde(default)]
    pub properties: BTreeMap<String, String>,
    #[serde(default)]
    pub pins: Vec<CellPinDesc>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CellPinDesc {
    pub name: String,
    pub dir: PinDir,
    /// Names of the pins of the cell's BEL this pin is mapped onto.
    #[serde(default)]
    pub bel_pins: Vec<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct NetDesc {
    pub name: String,
    #[serde(default)]
    pub kind: NetKind,
    /// `cell/pin` references. Cell names may be hierarchical.
    #[serde(default)]
    pub pins: Vec<String>,
}

impl Design {
    pub fn from_desc(desc: DesignDesc, graph: &dyn WireGraph) -> Result<Self, DesignError> {
        let mut design = Design::new(&desc.name, desc.mode);

        for cd in &desc.cells {
            if design.cell_by_name(&cd.name).is_some() {
                return Err(DesignError::Duplicate { kind: "cell", name: cd.name.clone() });
            }
            let cell = design.add_cell(&cd.name, &cd.lib_type);
            {
                let c = design.cell_mut(cell);
                c.is_port = cd.port;
                c.properties = cd.properties.clone();
            }

            let bel = match &cd.bel {
                Some(name) => {
                    let (site_name, bel_name) = name.split_once('/')
                        .ok_or_else(|| DesignError::UnknownBel(name.clone()))?;
                    let site = graph.site_by_name(site_name)
                        .ok_or_else(|| DesignError::UnknownBel(name.clone()))?;
                    let bel = graph.bel(site, bel_name)
                        .ok_or_else(|| DesignError::UnknownBel(name.clone()))?;
                    design.place_cell(cell, site, bel);
                    Some(bel)
                },
                None => None,
            };

            for pd in &cd.pins {
                let pin = design.add_cell_pin(cell, &pd.name, pd.dir, CellPinKind::Regular);
                if pd.bel_pins.is_empty() {
                    continue;
                }
                let bel = bel.ok_or_else(|| DesignError::UnplacedCell { cell: cd.name.clone() })?;
                for bp_name in &pd.bel_pins {
                    let bel_pin = graph.bel_pin(bel, bp_name)
                        .ok_or_else(|| DesignError::UnknownBelPin {
                            bel: cd.bel.clone().unwrap_or_default(),
                            pin: bp_name.clone(),
                        })?;
                    if design.is_bel_pin_used(bel_pin) {
                        return Err(DesignError::BelPinConflict(graph.bel_pin_full_name(bel_pin)));
                    }
                    design.map_to_bel_pin(pin, bel_pin);
                }
            }
        }

        let mut seen_nets = HashSet::new();
        for nd in &desc.nets {
            if !seen_nets.insert(nd.name.as_str()) {
                return Err(DesignError::Duplicate { kind: "net", name: nd.name.clone() });
            }
            let net = match nd.kind {
                NetKind::Vcc => design.vcc_net(),
                NetKind::Gnd => design.gnd_net(),
                NetKind::Wire => {
                    if design.net_by_name(&nd.name).is_some() {
                        return Err(DesignError::Duplicate { kind: "net", name: nd.name.clone() });
                    }
                    design.add_net(&nd.name, NetKind::Wire)
                },
            };
            if nd.kind != NetKind::Wire {
                design.rename_net(net, &nd.name);
            }

            for pin_ref in &nd.pins {
                let pin = pin_ref.rsplit_once('/')
                    .and_then(|(cell, pin)| {
                        design.cell_by_name(cell)
                            .and_then(|cell| design.pin_by_name(cell, pin))
                    })
                    .ok_or_else(|| DesignError::UnknownCellPin(pin_ref.clone()))?;
                design.connect(net, pin);
            }
        }

        design.rm_static_net_map = desc.rm_static_nets;
        design.static_route_strings = desc.static_routes;

        Ok(design)
    }

    /// Renames a net. The built-in `VCC`/`GND` names stay resolvable.
    pub fn rename_net(&mut self, net: NetId, name: &str) {
        let old = std::mem::replace(&mut self.net_mut(net).name, name.to_string());
        if old != VCC_NET_NAME && old != GND_NET_NAME {
            self.net_by_name.remove(&old);
        }
        self.net_by_name.insert(name.to_string(), net);
    }
}

/// Load a design description (JSON or YAML, optionally gzipped) and resolve
/// it against `graph`.
pub fn open<P>(path: P, graph: &dyn WireGraph) -> Result<Design, DesignError> where
    P: AsRef<Path>
{
    let desc: DesignDesc = load_description(path, false)?;
    dbg_log!(
        crate::log::DBG_INFO,
        "Loaded design {} ({} cells, {} nets)",
        desc.name,
        desc.cells.len(),
        desc.nets.len()
    );
    Design::from_desc(desc, graph)
}
