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

//! Small device and designs shared by the unit tests.
//!
//! ```text
//!  SLICE_X0Y0 (CLB_X0Y0)                 INT_X0Y0                   SLICE_X1Y0 (CLB_X1Y0)
//!  A6LUT.O6 -> AOUTMUX -> A -> CLB_A -> LOGIC_OUT =pip=> NN2 =pip=> IMUX_A1 -> CLB_A1 -> A1 -> A6LUT.A1
//!                                                 =pip=> EE2 =pip=> IMUX_B1 -> CLB_B1 (X0Y0) -> B6LUT.A1
//!                                      INT_VCC =pip=> IMUX_C1 -> CLB_C1 (X0Y0) -> C6LUT.A1
//! ```

use std::collections::HashSet;

use crate::design::{Design, ImplementationMode};
use crate::device::{Device, DeviceDesc, Wire, WireGraph};
use crate::router::{RouteNodeId, RouteTree};

pub const DEVICE_YAML: &str = r#"
name: testdev
family: series7
tiles:
  - name: INT_X0Y0
    type: INT_L
    wires:
      - name: LOGIC_OUT
        conns:
          - { to: NN2, kind: pip }
          - { to: EE2, kind: pip }
      - name: NN2
        conns:
          - { to: IMUX_A1, kind: pip }
      - name: EE2
        conns:
          - { to: IMUX_B1, kind: pip }
      - name: IMUX_A1
        conns:
          - { to: CLB_A1, tile: CLB_X1Y0 }
      - name: IMUX_B1
        conns:
          - { to: CLB_B1, tile: CLB_X0Y0 }
      - name: INT_VCC
        conns:
          - { to: IMUX_C1, kind: pip }
      - name: IMUX_C1
        conns:
          - { to: CLB_C1, tile: CLB_X0Y0 }
  - name: CLB_X0Y0
    type: CLBLL_L
    wires:
      - name: CLB_A
        conns:
          - { to: LOGIC_OUT, tile: INT_X0Y0 }
  - name: CLB_X1Y0
    type: CLBLL_L
  - name: OOC_WIRE_X0Y0
    type: OOC_WIRE
    wires:
      - name: OOC_WIRE_X0Y0/PORT_IN
        conns:
          - { to: NN2, tile: INT_X0Y0 }
      - name: OOC_WIRE_X0Y0/PORT_OUT
      - name: OOC_WIRE_X0Y0/PORT_DANGLE
site_types:
  - name: SLICEL
    pins:
      - { name: A1, dir: input, internal: A1, external: CLB_A1 }
      - { name: B1, dir: input, internal: B1, external: CLB_B1 }
      - { name: C1, dir: input, internal: C1, external: CLB_C1 }
      - { name: A, dir: output, internal: A, external: CLB_A }
    bels:
      - name: A6LUT
        pins:
          - { name: A1, dir: input, wire: A6LUT_A1 }
          - { name: O6, dir: output, wire: A6LUT_O6 }
      - name: B6LUT
        pins:
          - { name: A1, dir: input, wire: B6LUT_A1 }
      - name: C6LUT
        pins:
          - { name: A1, dir: input, wire: C6LUT_A1 }
      - name: AFF
        pins:
          - { name: D, dir: input, wire: AFF_D }
          - { name: CE, dir: input, wire: AFF_CE }
          - { name: Q, dir: output, wire: AFF_Q }
      - name: CEUSEDVCC
        pins:
          - { name: O, dir: output, wire: CEUSEDVCC_O }
    wires:
      - name: A1
        conns: [ { to: A6LUT_A1 } ]
      - name: B1
        conns: [ { to: B6LUT_A1 } ]
      - name: C1
        conns: [ { to: C6LUT_A1 } ]
      - name: A6LUT_A1
        conns: [ { to: A6LUT_O6, kind: routethrough } ]
      - name: A6LUT_O6
        conns:
          - { to: "intrasite:SLICEL/AOUTMUX.O6" }
          - { to: "intrasite:SLICEL/DFFMUX.O6" }
      - name: "intrasite:SLICEL/AOUTMUX.O6"
        conns: [ { to: A, kind: pip } ]
      - name: "intrasite:SLICEL/DFFMUX.O6"
        conns: [ { to: AFF_D, kind: pip } ]
      - name: CEUSEDVCC_O
        conns: [ { to: "intrasite:SLICEL/CEUSEDMUX.1" } ]
      - name: "intrasite:SLICEL/CEUSEDMUX.1"
        conns: [ { to: AFF_CE, kind: pip } ]
      - name: "intrasite:SLICEL/CLKINV.CLK"
sites:
  - { name: SLICE_X0Y0, type: SLICEL, tile: CLB_X0Y0 }
  - { name: SLICE_X1Y0, type: SLICEL, tile: CLB_X1Y0 }
"#;

/// `lut_a` drives `lut_b`, `lut_c` and `ff` through `n_a`. `lut_d` sits on
/// the C6LUT with no pins mapped.
pub const DESIGN_YAML: &str = r#"
name: top
cells:
  - name: lut_a
    type: LUT6
    bel: SLICE_X0Y0/A6LUT
    pins:
      - { name: I0, dir: input, bel_pins: [A1] }
      - { name: O, dir: output, bel_pins: [O6] }
  - name: lut_b
    type: LUT6
    bel: SLICE_X1Y0/A6LUT
    pins:
      - { name: I0, dir: input, bel_pins: [A1] }
      - { name: O, dir: output, bel_pins: [O6] }
  - name: lut_c
    type: LUT6
    bel: SLICE_X0Y0/B6LUT
    pins:
      - { name: I0, dir: input, bel_pins: [A1] }
  - name: lut_d
    type: LUT1
    bel: SLICE_X0Y0/C6LUT
  - name: ff
    type: FDRE
    bel: SLICE_X0Y0/AFF
    properties: { IS_C_INVERTED: "1'b1" }
    pins:
      - { name: D, dir: input, bel_pins: [D] }
      - { name: CE, dir: input, bel_pins: [CE] }
      - { name: Q, dir: output, bel_pins: [Q] }
nets:
  - name: n_a
    pins: [lut_a/O, lut_b/I0, lut_c/I0, ff/D]
  - name: GLOBAL_LOGIC1
    kind: vcc
    pins: [ff/CE]
"#;

/// Routing of [`DESIGN_YAML`].
pub const ROUTING: &str = "\
SITE_PIPS SLICE_X0Y0 AOUTMUX:O6 DFFMUX:O6 CEUSEDMUX:1
INTERSITE n_a SLICE_X0Y0/A SLICE_X1Y0/A1 SLICE_X0Y0/B1
ROUTE n_a INT_X0Y0/INT_L.LOGIC_OUT->>NN2 INT_X0Y0/INT_L.NN2->>IMUX_A1 INT_X0Y0/INT_L.LOGIC_OUT->>EE2 INT_X0Y0/INT_L.EE2->>IMUX_B1
VCC_SOURCES SLICE_X0Y0/CEUSEDVCC/O
VCC INT_X0Y0/INT_L.INT_VCC->>IMUX_C1
START_WIRES INT_X0Y0/INT_VCC
";

pub const N_A_ROUTE: &str =
    "{ CLB_X0Y0/CLB_A { INT_X0Y0/NN2 INT_X0Y0/IMUX_A1 } INT_X0Y0/EE2 INT_X0Y0/IMUX_B1 }";

/// Module with boundary ports. `din` drives `lut_b`, `lut_b` drives `dout`
/// and `tie` drives the clock enable of `ff`.
pub const PORT_DESIGN_YAML: &str = r#"
name: module
cells:
  - name: din
    type: IBUF
    port: true
    pins:
      - { name: O, dir: output }
  - name: dout
    type: OBUF
    port: true
    pins:
      - { name: I, dir: input }
  - name: tie
    type: IBUF
    port: true
    pins:
      - { name: O, dir: output }
  - name: dangling
    type: IBUF
    port: true
    pins:
      - { name: O, dir: output }
  - name: lut_b
    type: LUT6
    bel: SLICE_X1Y0/A6LUT
    pins:
      - { name: I0, dir: input, bel_pins: [A1] }
      - { name: O, dir: output, bel_pins: [O6] }
  - name: ff
    type: FDRE
    bel: SLICE_X0Y0/AFF
    pins:
      - { name: CE, dir: input, bel_pins: [CE] }
nets:
  - name: n_in
    pins: [din/O, lut_b/I0]
  - name: n_out
    pins: [lut_b/O, dout/I]
  - name: n_tie
    pins: [tie/O, ff/CE]
  - name: n_dangle
    pins: [dangling/O]
rm_static_nets:
  n_in: static_din
static_routes:
  static_din: "{ INT_X0Y0/EE2 OOC_WIRE_X0Y0/PORT_IN }"
"#;

pub fn device() -> Device {
    let desc: DeviceDesc = serde_yaml::from_str(DEVICE_YAML).unwrap();
    Device::from_desc(desc).unwrap()
}

pub fn design_from_yaml(device: &Device, yaml: &str) -> Design {
    Design::from_desc(serde_yaml::from_str(yaml).unwrap(), device).unwrap()
}

pub fn design(device: &Device) -> Design {
    design_from_yaml(device, DESIGN_YAML)
}

pub fn port_design(device: &Device, mode: ImplementationMode) -> Design {
    let mut design = design_from_yaml(device, PORT_DESIGN_YAML);
    design.mode = mode;
    design
}

pub fn tile_wire(device: &Device, tile: &str, wire: &str) -> Wire {
    Wire::Tile {
        tile: device.tile_by_name(tile).unwrap(),
        wire: device.wire_enum(wire).unwrap(),
    }
}

pub fn site_wire(device: &Device, site: &str, wire: &str) -> Wire {
    Wire::Site {
        site: device.site_by_name(site).unwrap(),
        wire: device.wire_enum(wire).unwrap(),
    }
}

/// Walks every root-to-leaf path of `tree` and panics if a wire repeats on one.
pub fn assert_acyclic(tree: &RouteTree) {
    fn walk(tree: &RouteTree, node: RouteNodeId, on_path: &mut HashSet<Wire>) {
        let wire = tree.wire(node);
        assert!(on_path.insert(wire), "{:?} repeats on a path from the root", wire);
        for child in tree.children(node) {
            walk(tree, *child, on_path);
        }
        on_path.remove(&wire);
    }

    walk(tree, tree.root(), &mut HashSet::new());
}
