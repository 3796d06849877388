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

//! Error types for loading, importing and exporting routing information

use thiserror::Error;

/// Errors raised while reading a serialized device or design description.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("Can't open file {path}: {source}")]
    CantOpenFile {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors raised while building a [`crate::device::Device`] from its description.
#[derive(Debug, Error)]
pub enum DeviceError {
    #[error(transparent)]
    Load(#[from] LoadError),

    #[error("Duplicate {kind} \"{name}\"")]
    Duplicate { kind: &'static str, name: String },

    #[error("Tile \"{0}\" does not exist in the device")]
    UnknownTile(String),

    #[error("Site type \"{0}\" is never declared")]
    UnknownSiteType(String),

    #[error("Site wire \"{wire}\" referenced by {site} is never declared")]
    UnknownSiteWire { site: String, wire: String },
}

/// Errors raised while building a [`crate::design::Design`] from its description.
#[derive(Debug, Error)]
pub enum DesignError {
    #[error(transparent)]
    Load(#[from] LoadError),

    #[error("Duplicate {kind} \"{name}\"")]
    Duplicate { kind: &'static str, name: String },

    #[error("BEL \"{0}\" does not exist in the device")]
    UnknownBel(String),

    #[error("BEL pin \"{bel}/{pin}\" does not exist in the device")]
    UnknownBelPin { bel: String, pin: String },

    #[error("Cell pin \"{0}\" does not exist in the design")]
    UnknownCellPin(String),

    #[error("Cell \"{cell}\" maps pins to a BEL but is not placed")]
    UnplacedCell { cell: String },

    #[error("BEL pin {0} is mapped by more than one cell pin")]
    BelPinConflict(String),
}

/// Cause of a failure on a single record of a routing file.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("Unrecognized Token: {0}")]
    UnrecognizedToken(String),

    #[error("Incorrect number of tokens. Expected: {expected} Actual: {actual}")]
    TokenCount { expected: usize, actual: usize },

    #[error("Net \"{0}\" does not exist in the current design")]
    UnknownNet(String),

    #[error("Cell \"{0}\" does not exist in the current design")]
    UnknownCell(String),

    #[error("Site \"{0}\" does not exist in the current device")]
    UnknownSite(String),

    #[error("SitePin \"{site}/{pin}\" does not exist in the current device")]
    UnknownSitePin { site: String, pin: String },

    #[error("BEL \"{site}/{bel}\" does not exist in the current device")]
    UnknownBel { site: String, bel: String },

    #[error("BelPin \"{bel}/{pin}\" does not exist in the current device")]
    UnknownBelPin { bel: String, pin: String },

    #[error("Tile \"{0}\" does not exist in the current device")]
    UnknownTile(String),

    #[error("Wire \"{0}\" does not exist in the current device")]
    UnknownWire(String),

    #[error("Net \"{0}\" does not have a source pin")]
    NoSourcePin(String),

    #[error("Net \"{0}\" should have at least one source site pin")]
    NoSourceSitePin(String),

    #[error("Cell pin source \"{pin}\" should map to exactly one BelPin, but maps to {count}")]
    BelPinMapping { pin: String, count: usize },

    #[error("Invalid Pip String configuration: {0}")]
    InvalidPip(String),

    #[error("Expected a START_WIRES line after the {0} net")]
    MissingStartWires(String),

    #[error("Invalid partition pin direction: {0}")]
    InvalidDirection(String),

    #[error("Site pip wire {wire} should have one or no connections, found {count}")]
    SitePipConnections { wire: String, count: usize },

    #[error("Port cell \"{port}\" should have exactly one pin, but has {count}")]
    PortPinCount { port: String, count: usize },

    #[error("Valid intrasite route not found from {source_pin} (net {net})")]
    NoIntrasiteRoute { source_pin: String, net: String },
}

/// A fatal error while importing a routing file. Parse errors carry the location
/// of the offending record.
#[derive(Debug, Error)]
pub enum ImportError {
    #[error("{kind}\nOn line {line} of {file}")]
    Parse {
        file: String,
        line: usize,
        kind: ParseError,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Route string error: {0}")]
    RouteString(#[from] RouteStringError),

    #[error("No partition pin route recorded for port \"{0}\"")]
    MissingPartPin(String),

    #[error("No static design route recorded for net \"{0}\"")]
    MissingStaticRoute(String),

    #[error("Partition pin node {node} not found while merging the route of net \"{net}\"")]
    MergeFailed { net: String, node: String },
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RouteStringError {
    #[error("Unexpected end of route string")]
    UnexpectedEnd,

    #[error("Unexpected token \"{0}\" in route string")]
    UnexpectedToken(String),

    #[error("Empty route group")]
    EmptyGroup,
}
