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

//! Read-only view of a device: tiles, sites, BELs and the wire graph that
//! connects them.
//!
//! Everything the routers need goes through the [`WireGraph`] trait, so the
//! search code never depends on how a device was loaded. [`Device`] is the
//! in-memory implementation built from a serde description.

pub mod loader;
pub mod model;

pub use self::loader::{open, OpenOpts};
pub use self::model::*;

use crate::strings::StringId;

/// Enumeration of a wire name. Tile wires and site wires share one enumerator.
pub type WireEnum = StringId;

#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct TileId(pub u32);

#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct SiteId(pub u32);

#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct BelId(pub u32);

#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct BelPinId(pub u32);

#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct SitePinId(pub u32);

#[derive(Copy, Clone, Hash, PartialEq, Eq, Debug, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PinDir {
    Inout,
    Input,
    Output,
}

impl PinDir {
    pub fn is_input(self) -> bool {
        matches!(self, Self::Input | Self::Inout)
    }

    pub fn is_output(self) -> bool {
        matches!(self, Self::Output | Self::Inout)
    }
}

/// Device family. Only affects how polarity selectors are exported.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Family {
    Series7,
    Ultrascale,
    #[default]
    Other,
}

/// A wire, either in the general routing of a tile or inside a site.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub enum Wire {
    Tile { tile: TileId, wire: WireEnum },
    Site { site: SiteId, wire: WireEnum },
}

impl Wire {
    pub fn wire_enum(&self) -> WireEnum {
        match self {
            Self::Tile { wire, .. } | Self::Site { wire, .. } => *wire,
        }
    }

    pub fn is_site_wire(&self) -> bool {
        matches!(self, Self::Site { .. })
    }
}

#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnKind {
    /// Hard-wired connection, always conducts.
    #[default]
    Wire,
    /// Programmable interconnect point.
    Pip,
    /// Path through a BEL configured to pass a signal from an input to an output.
    RouteThrough,
}

impl ConnKind {
    /// PIPs and routethroughs are configurable. Plain wires are not.
    pub fn is_switched(self) -> bool {
        !matches!(self, Self::Wire)
    }
}

#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub struct Connection {
    pub source: Wire,
    pub sink: Wire,
    pub kind: ConnKind,
}

impl Connection {
    pub fn is_pip(&self) -> bool {
        self.kind == ConnKind::Pip
    }

    pub fn is_route_through(&self) -> bool {
        self.kind == ConnKind::RouteThrough
    }
}

#[derive(Clone, Debug)]
pub struct BelInfo {
    pub name: String,
    pub site: SiteId,
    pub pins: Vec<BelPinId>,
}

#[derive(Clone, Debug)]
pub struct BelPinInfo {
    pub name: String,
    pub bel: BelId,
    pub dir: PinDir,
    /// Site wire (in the BEL's site) attached to the pin.
    pub wire: WireEnum,
}

#[derive(Clone, Debug)]
pub struct SitePinInfo {
    pub name: String,
    pub site: SiteId,
    pub dir: PinDir,
    /// Site wire on the inner side of the pin.
    pub internal_wire: WireEnum,
    /// Tile wire (in the site's tile) on the outer side of the pin.
    pub external_wire: WireEnum,
}

impl SitePinInfo {
    pub fn is_input(&self) -> bool {
        self.dir.is_input()
    }

    pub fn is_output(&self) -> bool {
        self.dir.is_output()
    }
}

/// Queries the routers make against a loaded device.
pub trait WireGraph {
    fn name(&self) -> &str;
    fn family(&self) -> Family;

    fn tile_by_name(&self, name: &str) -> Option<TileId>;
    fn tile_name(&self, tile: TileId) -> &str;
    fn tile_type_name(&self, tile: TileId) -> &str;

    fn site_by_name(&self, name: &str) -> Option<SiteId>;
    fn site_name(&self, site: SiteId) -> &str;
    fn site_type_name(&self, site: SiteId) -> &str;
    fn site_tile(&self, site: SiteId) -> TileId;
    fn site_bels(&self, site: SiteId) -> &[BelId];
    fn site_pin(&self, site: SiteId, name: &str) -> Option<SitePinId>;
    fn site_pin_info(&self, pin: SitePinId) -> &SitePinInfo;

    fn bel(&self, site: SiteId, name: &str) -> Option<BelId>;
    fn bel_info(&self, bel: BelId) -> &BelInfo;
    fn bel_pin_info(&self, pin: BelPinId) -> &BelPinInfo;

    fn wire_enum(&self, name: &str) -> Option<WireEnum>;
    fn wire_enum_name(&self, wire: WireEnum) -> &str;

    /// Outgoing connections of `wire`.
    fn wire_connections(&self, wire: Wire) -> Vec<Connection>;
    /// BEL pin that a site wire terminates at, if any.
    fn terminal(&self, wire: Wire) -> Option<BelPinId>;
    /// Site pin the signal crosses when it leaves `wire` in the forward direction.
    /// Tile wires report input site pins, site wires report output site pins.
    fn connected_pin(&self, wire: Wire) -> Option<SitePinId>;

    fn bel_pin(&self, bel: BelId, name: &str) -> Option<BelPinId> {
        self.bel_info(bel).pins.iter()
            .copied()
            .find(|pin| self.bel_pin_info(*pin).name == name)
    }

    fn wire_name(&self, wire: Wire) -> &str {
        self.wire_enum_name(wire.wire_enum())
    }

    fn wire_tile(&self, wire: Wire) -> TileId {
        match wire {
            Wire::Tile { tile, .. } => tile,
            Wire::Site { site, .. } => self.site_tile(site),
        }
    }

    /// `tile/wire` for tile wires and `site/wire` for site wires.
    fn wire_full_name(&self, wire: Wire) -> String {
        match wire {
            Wire::Tile { tile, wire } =>
                format!("{}/{}", self.tile_name(tile), self.wire_enum_name(wire)),
            Wire::Site { site, wire } =>
                format!("{}/{}", self.site_name(site), self.wire_enum_name(wire)),
        }
    }

    fn site_pin_internal_wire(&self, pin: SitePinId) -> Wire {
        let info = self.site_pin_info(pin);
        Wire::Site { site: info.site, wire: info.internal_wire }
    }

    fn site_pin_external_wire(&self, pin: SitePinId) -> Wire {
        let info = self.site_pin_info(pin);
        Wire::Tile { tile: self.site_tile(info.site), wire: info.external_wire }
    }

    fn bel_pin_wire(&self, pin: BelPinId) -> Wire {
        let info = self.bel_pin_info(pin);
        Wire::Site { site: self.bel_info(info.bel).site, wire: info.wire }
    }

    fn bel_pin_site(&self, pin: BelPinId) -> SiteId {
        self.bel_info(self.bel_pin_info(pin).bel).site
    }

    /// Output pins of a BEL.
    fn bel_sources(&self, bel: BelId) -> Vec<BelPinId> {
        self.bel_info(bel).pins.iter()
            .copied()
            .filter(|pin| self.bel_pin_info(*pin).dir.is_output())
            .collect()
    }

    fn site_pin_full_name(&self, pin: SitePinId) -> String {
        let info = self.site_pin_info(pin);
        format!("{}/{}", self.site_name(info.site), info.name)
    }

    fn bel_pin_full_name(&self, pin: BelPinId) -> String {
        let info = self.bel_pin_info(pin);
        let bel = self.bel_info(info.bel);
        format!("{}/{}/{}", self.site_name(bel.site), bel.name, info.name)
    }
}

#[cfg(test)]
mod tests;
