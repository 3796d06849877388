use super::*;
use crate::device::WireGraph;
use crate::error::DesignError;
use crate::testing;

#[test]
fn test_design_loading() {
    let device = testing::device();
    let design = testing::design(&device);

    assert_eq!(design.name, "top");
    assert_eq!(design.mode, ImplementationMode::Regular);

    let n_a = design.net_by_name("n_a").unwrap();
    let net = design.net(n_a);
    assert_eq!(net.pins().len(), 4);
    assert_eq!(net.fan_out(), 3);
    let source = net.source().unwrap();
    assert_eq!(design.pin_full_name(source), "lut_a/O");

    /* Static nets keep their design name but stay reachable as VCC/GND */
    let vcc = design.vcc_net();
    assert_eq!(design.net_by_name("GLOBAL_LOGIC1"), Some(vcc));
    assert_eq!(design.net_by_name(VCC_NET_NAME), Some(vcc));
    assert!(design.net(vcc).is_vcc());
    assert!(design.net(vcc).source().is_none());
    assert_eq!(design.net(vcc).fan_out(), 1);
}

#[test]
fn test_bel_pin_mapping() {
    let device = testing::device();
    let design = testing::design(&device);

    let x0 = device.site_by_name("SLICE_X0Y0").unwrap();
    let aff = device.bel(x0, "AFF").unwrap();
    let d = device.bel_pin(aff, "D").unwrap();
    let c6lut = device.bel(x0, "C6LUT").unwrap();
    let c6_a1 = device.bel_pin(c6lut, "A1").unwrap();

    let ff = design.cell_by_name("ff").unwrap();
    assert_eq!(design.cell_at_bel(aff), Some(ff));
    assert!(design.cell(ff).is_flip_flop_or_latch());

    let ff_d = design.cell_pin_at(d).unwrap();
    assert_eq!(design.pin_full_name(ff_d), "ff/D");
    assert_eq!(design.pin(ff_d).bel_pins, vec![d]);
    assert!(design.is_bel_pin_used(d));
    assert!(!design.is_bel_pin_used(c6_a1));

    assert_eq!(design.cells_at_site(x0).count(), 4);
    assert_eq!(design.used_sites().len(), 2);
}

#[test]
fn test_connect_moves_pins() {
    let device = testing::device();
    let mut design = testing::design(&device);

    let n_a = design.net_by_name("n_a").unwrap();
    let other = design.add_net("other", NetKind::Wire);
    let lut_c = design.cell_by_name("lut_c").unwrap();
    let pin = design.pin_by_name(lut_c, "I0").unwrap();

    design.net_mut(n_a).add_routed_sink(pin);
    design.connect(other, pin);

    assert_eq!(design.pin(pin).net, Some(other));
    assert!(!design.net(n_a).pins().contains(&pin));
    assert!(!design.net(n_a).routed_sinks().contains(&pin));
    /* Inputs never become sources */
    assert!(design.net(other).source().is_none());

    design.remove_net(other);
    assert!(design.pin(pin).net.is_none());
    assert!(design.net_by_name("other").is_none());
}

#[test]
fn test_static_nets_have_no_source() {
    let device = testing::device();
    let mut design = testing::design(&device);

    let lut_a = design.cell_by_name("lut_a").unwrap();
    let out = design.pin_by_name(lut_a, "O").unwrap();
    let gnd = design.gnd_net();
    design.connect(gnd, out);

    assert!(design.net(gnd).source().is_none());
    let n_a = design.net_by_name("n_a").unwrap();
    assert!(design.net(n_a).source().is_none());
}

#[test]
fn test_lut1_buffer() {
    let mut design = Design::new("buf", ImplementationMode::OutOfContext);
    let buf = design.add_lut1_buffer("IN_BUF_Inserted_x");
    let cell = design.cell(buf);

    assert_eq!(cell.lib_type, "LUT1");
    assert_eq!(cell.properties.get("INIT").map(String::as_str), Some(BUFFER_INIT));
    assert!(design.pin_by_name(buf, "I0").is_some());
    assert_eq!(design.pin(design.pin_by_name(buf, "O").unwrap()).dir, PinDir::Output);
}

#[test]
fn test_route_status() {
    let device = testing::device();
    let mut design = testing::design(&device);

    let n_a = design.net_by_name("n_a").unwrap();
    let sinks: Vec<_> = design.net(n_a).sinks().collect();
    assert_eq!(design.net_mut(n_a).compute_route_status(), RouteStatus::Unrouted);

    design.net_mut(n_a).add_routed_sink(sinks[0]);
    assert_eq!(design.net_mut(n_a).compute_route_status(), RouteStatus::PartiallyRouted);

    for sink in sinks {
        design.net_mut(n_a).add_routed_sink(sink);
    }
    assert_eq!(design.net_mut(n_a).compute_route_status(), RouteStatus::FullyRouted);
    assert_eq!(design.net(n_a).route_status(), RouteStatus::FullyRouted);
}

#[test]
fn test_multi_port_sink_nets() {
    let device = testing::device();
    let mut design = testing::port_design(&device, ImplementationMode::OutOfContext);
    assert!(design.multi_port_sink_nets().is_empty());

    let port = design.add_cell("dout2", "OBUF");
    design.cell_mut(port).is_port = true;
    let pin = design.add_cell_pin(port, "I", PinDir::Input, CellPinKind::Regular);
    let n_out = design.net_by_name("n_out").unwrap();
    design.connect(n_out, pin);

    assert_eq!(design.multi_port_sink_nets(), HashSet::from([n_out]));
}

#[test]
fn test_invalid_designs() {
    let device = testing::device();

    let mut desc: DesignDesc = serde_yaml::from_str(testing::DESIGN_YAML).unwrap();
    desc.nets[0].pins.push("lut_z/I0".into());
    assert!(matches!(
        Design::from_desc(desc, &device),
        Err(DesignError::UnknownCellPin(p)) if p == "lut_z/I0"
    ));

    let mut desc: DesignDesc = serde_yaml::from_str(testing::DESIGN_YAML).unwrap();
    desc.cells[1].bel = Some("SLICE_X0Y0/A6LUT".into());
    assert!(matches!(
        Design::from_desc(desc, &device),
        Err(DesignError::BelPinConflict(_))
    ));

    let mut desc: DesignDesc = serde_yaml::from_str(testing::DESIGN_YAML).unwrap();
    desc.cells[0].bel = None;
    assert!(matches!(
        Design::from_desc(desc, &device),
        Err(DesignError::UnplacedCell { .. })
    ));

    let mut desc: DesignDesc = serde_yaml::from_str(testing::DESIGN_YAML).unwrap();
    desc.cells[0].bel = Some("SLICE_X0Y0/ZLUT".into());
    assert!(matches!(Design::from_desc(desc, &device), Err(DesignError::UnknownBel(_))));
}
