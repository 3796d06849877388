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

use std::collections::{HashMap, HashSet};

use crate::error::DeviceError;
use crate::strings::StringPool;
use super::*;

/* Serialized device description */

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct DeviceDesc {
    pub name: String,
    #[serde(default)]
    pub family: Family,
    #[serde(default)]
    pub tiles: Vec<TileDesc>,
    #[serde(default)]
    pub site_types: Vec<SiteTypeDesc>,
    #[serde(default)]
    pub sites: Vec<SiteDesc>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TileDesc {
    pub name: String,
    #[serde(rename = "type")]
    pub type_name: String,
    #[serde(default)]
    pub wires: Vec<WireDesc>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct WireDesc {
    pub name: String,
    #[serde(default)]
    pub conns: Vec<ConnDesc>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ConnDesc {
    pub to: String,
    /// Sink tile for connections that leave the tile. Site wire connections
    /// never set it.
    #[serde(default)]
    pub tile: Option<String>,
    #[serde(default)]
    pub kind: ConnKind,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SiteTypeDesc {
    pub name: String,
    #[serde(default)]
    pub wires: Vec<WireDesc>,
    #[serde(default)]
    pub bels: Vec<BelDesc>,
    #[serde(default)]
    pub pins: Vec<SitePinDesc>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BelDesc {
    pub name: String,
    #[serde(default)]
    pub pins: Vec<BelPinDesc>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BelPinDesc {
    pub name: String,
    pub dir: PinDir,
    pub wire: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SitePinDesc {
    pub name: String,
    pub dir: PinDir,
    pub internal: String,
    pub external: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SiteDesc {
    pub name: String,
    #[serde(rename = "type")]
    pub type_name: String,
    pub tile: String,
}

/* In-memory device */

#[derive(Copy, Clone, Debug)]
struct TileConn {
    tile: TileId,
    wire: WireEnum,
    kind: ConnKind,
}

#[derive(Debug)]
struct Tile {
    name: String,
    type_name: String,
    conns: HashMap<WireEnum, Vec<TileConn>>,
    /// External wire -> site pin, for every site pin of the sites in this tile.
    site_pins: HashMap<WireEnum, SitePinId>,
}

/// Wiring shared by every site of one type. Pins and BELs are referred to by
/// their index within the type.
#[derive(Debug)]
struct SiteType {
    name: String,
    conns: HashMap<WireEnum, Vec<(WireEnum, ConnKind)>>,
    /// Site wire -> input BEL pin it terminates at.
    terminals: HashMap<WireEnum, u32>,
    /// Internal wire -> output site pin.
    out_pins: HashMap<WireEnum, u32>,
    bel_by_name: HashMap<String, u32>,
    pin_by_name: HashMap<String, u32>,
}

#[derive(Debug)]
struct Site {
    name: String,
    site_type: usize,
    tile: TileId,
    bels: Vec<BelId>,
    bel_pin_base: u32,
    site_pin_base: u32,
}

/// A device loaded from a [`DeviceDesc`].
#[derive(Debug)]
pub struct Device {
    name: String,
    family: Family,
    wires: StringPool,
    tiles: Vec<Tile>,
    tile_by_name: HashMap<String, TileId>,
    site_types: Vec<SiteType>,
    sites: Vec<Site>,
    site_by_name: HashMap<String, SiteId>,
    bels: Vec<BelInfo>,
    bel_pins: Vec<BelPinInfo>,
    site_pins: Vec<SitePinInfo>,
}

fn check_duplicate<T>(
    map: &mut HashMap<String, T>,
    kind: &'static str,
    name: &str,
    value: T
) -> Result<(), DeviceError> {
    if map.insert(name.to_string(), value).is_some() {
        return Err(DeviceError::Duplicate { kind, name: name.to_string() });
    }
    Ok(())
}

impl Device {
    pub fn from_desc(desc: DeviceDesc) -> Result<Self, DeviceError> {
        let mut wires = StringPool::new();

        let mut tile_by_name = HashMap::new();
        for (idx, tile) in desc.tiles.iter().enumerate() {
            check_duplicate(&mut tile_by_name, "tile", &tile.name, TileId(idx as u32))?;
        }

        let mut tiles = Vec::with_capacity(desc.tiles.len());
        for tile in &desc.tiles {
            let mut conns: HashMap<WireEnum, Vec<TileConn>> = HashMap::new();
            for wire in &tile.wires {
                let source = wires.intern(wire.name.as_str());
                let entry = conns.entry(source).or_default();
                for conn in &wire.conns {
                    let sink_tile = match &conn.tile {
                        Some(name) => *tile_by_name.get(name)
                            .ok_or_else(|| DeviceError::UnknownTile(name.clone()))?,
                        None => tile_by_name[&tile.name],
                    };
                    entry.push(TileConn {
                        tile: sink_tile,
                        wire: wires.intern(conn.to.as_str()),
                        kind: conn.kind,
                    });
                }
            }
            tiles.push(Tile {
                name: tile.name.clone(),
                type_name: tile.type_name.clone(),
                conns,
                site_pins: HashMap::new(),
            });
        }

        let mut site_type_by_name = HashMap::new();
        let mut site_types = Vec::with_capacity(desc.site_types.len());
        for (idx, st) in desc.site_types.iter().enumerate() {
            check_duplicate(&mut site_type_by_name, "site type", &st.name, idx)?;
            site_types.push(Self::build_site_type(&mut wires, st)?);
        }

        let mut site_by_name = HashMap::new();
        let mut sites = Vec::with_capacity(desc.sites.len());
        let mut bels = Vec::new();
        let mut bel_pins = Vec::new();
        let mut site_pins = Vec::new();

        for (idx, sd) in desc.sites.iter().enumerate() {
            let site_id = SiteId(idx as u32);
            check_duplicate(&mut site_by_name, "site", &sd.name, site_id)?;

            let tile = *tile_by_name.get(&sd.tile)
                .ok_or_else(|| DeviceError::UnknownTile(sd.tile.clone()))?;
            let type_idx = *site_type_by_name.get(&sd.type_name)
                .ok_or_else(|| DeviceError::UnknownSiteType(sd.type_name.clone()))?;
            let st_desc = &desc.site_types[type_idx];

            let bel_pin_base = bel_pins.len() as u32;
            let site_pin_base = site_pins.len() as u32;
            let mut site_bels = Vec::with_capacity(st_desc.bels.len());

            for bel in &st_desc.bels {
                let bel_id = BelId(bels.len() as u32);
                let mut pins = Vec::with_capacity(bel.pins.len());
                for pin in &bel.pins {
                    pins.push(BelPinId(bel_pins.len() as u32));
                    bel_pins.push(BelPinInfo {
                        name: pin.name.clone(),
                        bel: bel_id,
                        dir: pin.dir,
                        wire: wires.intern(pin.wire.as_str()),
                    });
                }
                bels.push(BelInfo { name: bel.name.clone(), site: site_id, pins });
                site_bels.push(bel_id);
            }

            for pin in &st_desc.pins {
                let pin_id = SitePinId(site_pins.len() as u32);
                let external_wire = wires.intern(pin.external.as_str());
                site_pins.push(SitePinInfo {
                    name: pin.name.clone(),
                    site: site_id,
                    dir: pin.dir,
                    internal_wire: wires.intern(pin.internal.as_str()),
                    external_wire,
                });
                tiles[tile.0 as usize].site_pins.insert(external_wire, pin_id);
            }

            sites.push(Site {
                name: sd.name.clone(),
                site_type: type_idx,
                tile,
                bels: site_bels,
                bel_pin_base,
                site_pin_base,
            });
        }

        Ok(Self {
            name: desc.name,
            family: desc.family,
            wires,
            tiles,
            tile_by_name,
            site_types,
            sites,
            site_by_name,
            bels,
            bel_pins,
            site_pins,
        })
    }

    fn build_site_type(wires: &mut StringPool, desc: &SiteTypeDesc)
        -> Result<SiteType, DeviceError>
    {
        let mut declared = HashSet::new();
        for wire in &desc.wires {
            declared.insert(wire.name.as_str());
        }

        let mut terminals = HashMap::new();
        let mut bel_by_name = HashMap::new();
        let mut bel_pin_count = 0;
        for (bel_idx, bel) in desc.bels.iter().enumerate() {
            if bel_by_name.insert(bel.name.clone(), bel_idx as u32).is_some() {
                return Err(DeviceError::Duplicate {
                    kind: "BEL",
                    name: format!("{}/{}", desc.name, bel.name),
                });
            }
            for pin in &bel.pins {
                declared.insert(pin.wire.as_str());
                /* Only input pins terminate a wire. Output pins drive it. */
                if pin.dir.is_input() {
                    terminals.insert(wires.intern(pin.wire.as_str()), bel_pin_count);
                }
                bel_pin_count += 1;
            }
        }

        let mut out_pins = HashMap::new();
        let mut pin_by_name = HashMap::new();
        for (pin_idx, pin) in desc.pins.iter().enumerate() {
            if pin_by_name.insert(pin.name.clone(), pin_idx as u32).is_some() {
                return Err(DeviceError::Duplicate {
                    kind: "site pin",
                    name: format!("{}/{}", desc.name, pin.name),
                });
            }
            declared.insert(pin.internal.as_str());
            if pin.dir.is_output() {
                out_pins.insert(wires.intern(pin.internal.as_str()), pin_idx as u32);
            }
        }

        let mut conns: HashMap<WireEnum, Vec<(WireEnum, ConnKind)>> = HashMap::new();
        for wire in &desc.wires {
            let source = wires.intern(wire.name.as_str());
            let entry = conns.entry(source).or_default();
            for conn in &wire.conns {
                if !declared.contains(conn.to.as_str()) {
                    return Err(DeviceError::UnknownSiteWire {
                        site: desc.name.clone(),
                        wire: conn.to.clone(),
                    });
                }
                entry.push((wires.intern(conn.to.as_str()), conn.kind));
            }
        }

        Ok(SiteType {
            name: desc.name.clone(),
            conns,
            terminals,
            out_pins,
            bel_by_name,
            pin_by_name,
        })
    }

    fn site(&self, site: SiteId) -> &Site {
        &self.sites[site.0 as usize]
    }

    fn site_type(&self, site: SiteId) -> &SiteType {
        &self.site_types[self.site(site).site_type]
    }

    pub fn tile_count(&self) -> usize {
        self.tiles.len()
    }

    pub fn site_count(&self) -> usize {
        self.sites.len()
    }

    pub fn wire_enum_count(&self) -> usize {
        self.wires.len()
    }
}

impl WireGraph for Device {
    fn name(&self) -> &str {
        &self.name
    }

    fn family(&self) -> Family {
        self.family
    }

    fn tile_by_name(&self, name: &str) -> Option<TileId> {
        self.tile_by_name.get(name).copied()
    }

    fn tile_name(&self, tile: TileId) -> &str {
        &self.tiles[tile.0 as usize].name
    }

    fn tile_type_name(&self, tile: TileId) -> &str {
        &self.tiles[tile.0 as usize].type_name
    }

    fn site_by_name(&self, name: &str) -> Option<SiteId> {
        self.site_by_name.get(name).copied()
    }

    fn site_name(&self, site: SiteId) -> &str {
        &self.site(site).name
    }

    fn site_type_name(&self, site: SiteId) -> &str {
        &self.site_type(site).name
    }

    fn site_tile(&self, site: SiteId) -> TileId {
        self.site(site).tile
    }

    fn site_bels(&self, site: SiteId) -> &[BelId] {
        &self.site(site).bels
    }

    fn site_pin(&self, site: SiteId, name: &str) -> Option<SitePinId> {
        let base = self.site(site).site_pin_base;
        self.site_type(site).pin_by_name.get(name)
            .map(|idx| SitePinId(base + *idx))
    }

    fn site_pin_info(&self, pin: SitePinId) -> &SitePinInfo {
        &self.site_pins[pin.0 as usize]
    }

    fn bel(&self, site: SiteId, name: &str) -> Option<BelId> {
        self.site_type(site).bel_by_name.get(name)
            .map(|idx| self.site(site).bels[*idx as usize])
    }

    fn bel_info(&self, bel: BelId) -> &BelInfo {
        &self.bels[bel.0 as usize]
    }

    fn bel_pin_info(&self, pin: BelPinId) -> &BelPinInfo {
        &self.bel_pins[pin.0 as usize]
    }

    fn wire_enum(&self, name: &str) -> Option<WireEnum> {
        self.wires.lookup(name)
    }

    fn wire_enum_name(&self, wire: WireEnum) -> &str {
        &self.wires[wire]
    }

    fn wire_connections(&self, wire: Wire) -> Vec<Connection> {
        match wire {
            Wire::Tile { tile, wire: source } => {
                self.tiles[tile.0 as usize].conns.get(&source)
                    .map(|conns| conns.iter()
                        .map(|c| Connection {
                            source: wire,
                            sink: Wire::Tile { tile: c.tile, wire: c.wire },
                            kind: c.kind,
                        })
                        .collect())
                    .unwrap_or_default()
            },
            Wire::Site { site, wire: source } => {
                self.site_type(site).conns.get(&source)
                    .map(|conns| conns.iter()
                        .map(|(sink, kind)| Connection {
                            source: wire,
                            sink: Wire::Site { site, wire: *sink },
                            kind: *kind,
                        })
                        .collect())
                    .unwrap_or_default()
            },
        }
    }

    fn terminal(&self, wire: Wire) -> Option<BelPinId> {
        match wire {
            Wire::Tile { .. } => None,
            Wire::Site { site, wire } => {
                self.site_type(site).terminals.get(&wire)
                    .map(|idx| BelPinId(self.site(site).bel_pin_base + *idx))
            },
        }
    }

    fn connected_pin(&self, wire: Wire) -> Option<SitePinId> {
        match wire {
            Wire::Tile { tile, wire } => {
                let pin = *self.tiles[tile.0 as usize].site_pins.get(&wire)?;
                if self.site_pin_info(pin).is_input() {
                    Some(pin)
                } else {
                    None
                }
            },
            Wire::Site { site, wire } => {
                self.site_type(site).out_pins.get(&wire)
                    .map(|idx| SitePinId(self.site(site).site_pin_base + *idx))
            },
        }
    }
}
