use super::*;
use crate::error::DeviceError;
use crate::testing::{self, site_wire, tile_wire};

#[test]
fn test_device_lookup() {
    let device = testing::device();

    assert_eq!(device.name(), "testdev");
    assert_eq!(device.family(), Family::Series7);
    assert_eq!(device.tile_count(), 4);
    assert_eq!(device.site_count(), 2);

    let site = device.site_by_name("SLICE_X1Y0").unwrap();
    assert_eq!(device.site_name(site), "SLICE_X1Y0");
    assert_eq!(device.site_type_name(site), "SLICEL");
    assert_eq!(device.tile_name(device.site_tile(site)), "CLB_X1Y0");
    assert_eq!(device.site_bels(site).len(), 5);

    let bel = device.bel(site, "A6LUT").unwrap();
    assert_eq!(device.bel_info(bel).site, site);
    let o6 = device.bel_pin(bel, "O6").unwrap();
    assert_eq!(device.bel_pin_full_name(o6), "SLICE_X1Y0/A6LUT/O6");
    assert_eq!(device.bel_sources(bel), vec![o6]);

    assert!(device.site_by_name("SLICE_X9Y9").is_none());
    assert!(device.bel(site, "ZFF").is_none());
}

#[test]
fn test_site_pin_wires() {
    let device = testing::device();
    let site = device.site_by_name("SLICE_X0Y0").unwrap();
    let pin = device.site_pin(site, "B1").unwrap();

    assert!(device.site_pin_info(pin).is_input());
    assert_eq!(device.site_pin_full_name(pin), "SLICE_X0Y0/B1");
    assert_eq!(device.site_pin_internal_wire(pin), site_wire(&device, "SLICE_X0Y0", "B1"));
    assert_eq!(
        device.site_pin_external_wire(pin),
        tile_wire(&device, "CLB_X0Y0", "CLB_B1")
    );
}

#[test]
fn test_connected_pins() {
    let device = testing::device();
    let x0 = device.site_by_name("SLICE_X0Y0").unwrap();

    /* Input pins are reported from the tile side */
    let b1 = device.site_pin(x0, "B1").unwrap();
    assert_eq!(device.connected_pin(tile_wire(&device, "CLB_X0Y0", "CLB_B1")), Some(b1));

    /* Output pins from the site side only */
    let a = device.site_pin(x0, "A").unwrap();
    assert_eq!(device.connected_pin(tile_wire(&device, "CLB_X0Y0", "CLB_A")), None);
    assert_eq!(device.connected_pin(site_wire(&device, "SLICE_X0Y0", "A")), Some(a));
    assert_eq!(device.connected_pin(site_wire(&device, "SLICE_X0Y0", "B1")), None);
}

#[test]
fn test_terminals() {
    let device = testing::device();
    let x0 = device.site_by_name("SLICE_X0Y0").unwrap();
    let aff = device.bel(x0, "AFF").unwrap();
    let d = device.bel_pin(aff, "D").unwrap();

    assert_eq!(device.terminal(site_wire(&device, "SLICE_X0Y0", "AFF_D")), Some(d));
    /* Output pins drive their wire, they don't terminate it */
    assert_eq!(device.terminal(site_wire(&device, "SLICE_X0Y0", "AFF_Q")), None);
    assert_eq!(device.terminal(tile_wire(&device, "INT_X0Y0", "NN2")), None);
}

#[test]
fn test_wire_connections() {
    let device = testing::device();

    let logic_out = tile_wire(&device, "INT_X0Y0", "LOGIC_OUT");
    let conns = device.wire_connections(logic_out);
    assert_eq!(conns.len(), 2);
    assert!(conns.iter().all(|c| c.source == logic_out && c.is_pip()));
    assert_eq!(conns[0].sink, tile_wire(&device, "INT_X0Y0", "NN2"));

    /* Connections may leave the tile */
    let imux = tile_wire(&device, "INT_X0Y0", "IMUX_A1");
    let conns = device.wire_connections(imux);
    assert_eq!(conns.len(), 1);
    assert_eq!(conns[0].sink, tile_wire(&device, "CLB_X1Y0", "CLB_A1"));
    assert_eq!(conns[0].kind, ConnKind::Wire);

    /* Site wires are instantiated per site */
    let lut_in = site_wire(&device, "SLICE_X1Y0", "A6LUT_A1");
    let conns = device.wire_connections(lut_in);
    assert_eq!(conns.len(), 1);
    assert!(conns[0].is_route_through());
    assert_eq!(conns[0].sink, site_wire(&device, "SLICE_X1Y0", "A6LUT_O6"));

    assert!(device.wire_connections(tile_wire(&device, "CLB_X1Y0", "CLB_A1")).is_empty());
}

#[test]
fn test_wire_names() {
    let device = testing::device();

    assert_eq!(
        device.wire_full_name(tile_wire(&device, "INT_X0Y0", "EE2")),
        "INT_X0Y0/EE2"
    );
    let pip_wire = site_wire(&device, "SLICE_X0Y0", "intrasite:SLICEL/AOUTMUX.O6");
    assert_eq!(device.wire_full_name(pip_wire), "SLICE_X0Y0/intrasite:SLICEL/AOUTMUX.O6");
    assert_eq!(device.tile_name(device.wire_tile(pip_wire)), "CLB_X0Y0");
    assert!(pip_wire.is_site_wire());
}

#[test]
fn test_invalid_descriptions() {
    let mut desc: DeviceDesc = serde_yaml::from_str(testing::DEVICE_YAML).unwrap();
    desc.sites[1].name = "SLICE_X0Y0".into();
    assert!(matches!(
        Device::from_desc(desc),
        Err(DeviceError::Duplicate { kind: "site", .. })
    ));

    let mut desc: DeviceDesc = serde_yaml::from_str(testing::DEVICE_YAML).unwrap();
    desc.sites[0].tile = "CLB_X7Y7".into();
    assert!(matches!(Device::from_desc(desc), Err(DeviceError::UnknownTile(t)) if t == "CLB_X7Y7"));

    let mut desc: DeviceDesc = serde_yaml::from_str(testing::DEVICE_YAML).unwrap();
    desc.sites[0].type_name = "SLICEM".into();
    assert!(matches!(Device::from_desc(desc), Err(DeviceError::UnknownSiteType(_))));

    let mut desc: DeviceDesc = serde_yaml::from_str(testing::DEVICE_YAML).unwrap();
    desc.site_types[0].wires[0].conns[0].to = "NOWHERE".into();
    assert!(matches!(Device::from_desc(desc), Err(DeviceError::UnknownSiteWire { .. })));
}
