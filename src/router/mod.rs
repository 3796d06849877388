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

//! Route reconstruction.
//!
//! Both routers are plain BFS searches over the device wire graph that record
//! the path they took in a [`RouteTree`]. They differ in which connections
//! they are allowed to follow:
//!
//! * [`intrasite`] stays inside one site. Plain wires are always followed,
//!   site PIPs only when they were reported as used, and BEL routethroughs only
//!   when they were reported by `LUT_RTS`.
//! * [`intersite`] walks the general routing. PIPs are followed only when
//!   they appear in the [`PipMap`] built from a `ROUTE` (or `VCC`/`GND`) record.

use std::collections::HashMap;

use crate::device::{BelId, BelPinId};

pub mod route_tree;
pub mod intrasite;
pub mod intersite;
pub mod route_string;
pub mod serialize;

pub use self::route_tree::{RouteTree, RouteNodeId};
pub use self::route_string::{PipMap, RouteStringTree};

/// A BEL configured to pass the signal from `input` straight to `output`.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub struct BelRoutethrough {
    pub input: BelPinId,
    pub output: BelPinId,
}

pub type RoutethroughMap = HashMap<BelId, BelRoutethrough>;
