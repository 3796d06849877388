use super::*;
use crate::device::{Device, DeviceDesc};
use crate::router::BelRoutethrough;
use crate::testing;

const RT_DESIGN_YAML: &str = r#"
name: rt
cells:
  - name: ff
    type: FDRE
    bel: SLICE_X0Y0/AFF
    pins:
      - { name: D, dir: input, bel_pins: [D] }
nets:
  - name: n
    pins: [ff/D]
"#;

fn device_from_yaml(yaml: &str) -> Device {
    let desc: DeviceDesc = serde_yaml::from_str(yaml).unwrap();
    Device::from_desc(desc).unwrap()
}

fn site_pips(device: &Device, names: &[&str]) -> HashSet<WireEnum> {
    names.iter()
        .map(|name| device.wire_enum(&format!("intrasite:SLICEL/{}", name)).unwrap())
        .collect()
}

fn a6lut_routethrough(device: &Device) -> RoutethroughMap {
    let site = device.site_by_name("SLICE_X0Y0").unwrap();
    let lut = device.bel(site, "A6LUT").unwrap();
    RoutethroughMap::from([(lut, BelRoutethrough {
        input: device.bel_pin(lut, "A1").unwrap(),
        output: device.bel_pin(lut, "O6").unwrap(),
    })])
}

#[test]
fn test_unused_site_pips_are_not_followed() {
    let device = testing::device();
    let mut design = testing::design(&device);
    let site = device.site_by_name("SLICE_X0Y0").unwrap();
    design.set_used_site_pips(site, site_pips(&device, &["AOUTMUX.O6"]));

    let n_a = design.net_by_name("n_a").unwrap();
    let lut = device.bel(site, "A6LUT").unwrap();
    let o6 = device.bel_pin(lut, "O6").unwrap();
    let routethroughs = RoutethroughMap::new();
    let ctx = SearchContext {
        graph: &device,
        design: &design,
        used_site_pips: design.used_site_pips(site),
        routethroughs: &routethroughs,
    };

    let mut route = IntrasiteRoute::from_bel_pin(&device, n_a, o6, false);
    route.build(&ctx);

    assert!(route.is_valid());
    assert_eq!(route.site_pin_sinks(), &[device.site_pin(site, "A").unwrap()]);
    assert!(route.bel_pin_sinks().is_empty());
    /* The DFFMUX branch is pruned */
    assert_eq!(route.tree().len(), 3);
    assert!(route.tree().leaves().all(|n| route.tree().wire(n) == testing::site_wire(&device, "SLICE_X0Y0", "A")));

    let mut contained = IntrasiteRoute::from_bel_pin(&device, n_a, o6, true);
    contained.build(&ctx);
    assert!(!contained.is_valid());
    assert!(contained.site_pin_sinks().is_empty());
}

#[test]
fn test_bel_pin_route_application() {
    let device = testing::device();
    let mut design = testing::design(&device);
    let site = device.site_by_name("SLICE_X0Y0").unwrap();
    design.set_used_site_pips(site, site_pips(&device, &["AOUTMUX.O6", "DFFMUX.O6"]));

    let n_a = design.net_by_name("n_a").unwrap();
    let lut = device.bel(site, "A6LUT").unwrap();
    let o6 = device.bel_pin(lut, "O6").unwrap();
    let aff = device.bel(site, "AFF").unwrap();
    let d = device.bel_pin(aff, "D").unwrap();
    let a = device.site_pin(site, "A").unwrap();

    let routethroughs = RoutethroughMap::new();
    let mut route = IntrasiteRoute::from_bel_pin(&device, n_a, o6, false);
    {
        let ctx = SearchContext {
            graph: &device,
            design: &design,
            used_site_pips: design.used_site_pips(site),
            routethroughs: &routethroughs,
        };
        route.build(&ctx);
    }
    assert_eq!(route.bel_pin_sinks(), &[d]);
    assert_eq!(route.site_pin_sinks(), &[a]);
    testing::assert_acyclic(route.tree());

    route.apply_routing(&device, &mut design);
    route.set_sinks_as_routed(&mut design);

    let net = design.net(n_a);
    assert_eq!(route.net(), n_a);
    assert_eq!(net.source_site_pins(), &[a]);
    assert_eq!(net.intrasite_routes().len(), 1);
    assert!(net.source_route().is_some());
    assert!(net.site_pin_route(a).is_some());
    assert!(net.bel_pin_route(d).is_some());

    let ff = design.cell_by_name("ff").unwrap();
    let ff_d = design.pin_by_name(ff, "D").unwrap();
    assert!(net.routed_sinks().contains(&ff_d));
}

#[test]
fn test_routethrough() {
    let device = testing::device();
    let mut design = testing::design_from_yaml(&device, RT_DESIGN_YAML);
    let site = device.site_by_name("SLICE_X0Y0").unwrap();
    design.set_used_site_pips(site, site_pips(&device, &["DFFMUX.O6"]));

    let n = design.net_by_name("n").unwrap();
    let a1 = device.site_pin(site, "A1").unwrap();
    let aff = device.bel(site, "AFF").unwrap();
    let d = device.bel_pin(aff, "D").unwrap();

    let routethroughs = a6lut_routethrough(&device);
    let ctx = SearchContext {
        graph: &device,
        design: &design,
        used_site_pips: design.used_site_pips(site),
        routethroughs: &routethroughs,
    };
    let mut route = IntrasiteRoute::from_site_pin(&device, n, a1, false);
    route.build(&ctx);

    assert!(route.is_valid());
    assert_eq!(route.bel_pin_sinks(), &[d]);
    assert_eq!(route.tree().pip_count(), 2);
    testing::assert_acyclic(route.tree());

    let no_routethroughs = RoutethroughMap::new();
    let ctx = SearchContext { routethroughs: &no_routethroughs, ..ctx };
    let mut route = IntrasiteRoute::from_site_pin(&device, n, a1, false);
    route.build(&ctx);

    assert!(!route.is_valid());
    assert_eq!(route.tree().len(), 1);
}

#[test]
fn test_site_pin_route_rejects_foreign_sinks() {
    let device = testing::device();
    let mut design = testing::design(&device);
    let other = design.add_net("other", crate::design::NetKind::Wire);
    let site = device.site_by_name("SLICE_X0Y0").unwrap();
    let b1 = device.site_pin(site, "B1").unwrap();

    let routethroughs = RoutethroughMap::new();
    let ctx = SearchContext {
        graph: &device,
        design: &design,
        used_site_pips: None,
        routethroughs: &routethroughs,
    };

    /* B6LUT.A1 belongs to n_a */
    let mut route = IntrasiteRoute::from_site_pin(&device, other, b1, false);
    route.build(&ctx);
    assert!(!route.is_valid());

    let n_a = design.net_by_name("n_a").unwrap();
    let mut route = IntrasiteRoute::from_site_pin(&device, n_a, b1, false);
    route.build(&ctx);
    assert!(route.is_valid());
    assert_eq!(route.tree().len(), 2);
}

#[test]
fn test_static_pseudo_pins() {
    let device = testing::device();
    let mut design = testing::design(&device);
    let site = device.site_by_name("SLICE_X0Y0").unwrap();
    let c1 = device.site_pin(site, "C1").unwrap();
    let c6lut = device.bel(site, "C6LUT").unwrap();
    let c6_a1 = device.bel_pin(c6lut, "A1").unwrap();
    let vcc = design.vcc_net();

    let routethroughs = RoutethroughMap::new();
    let mut route = IntrasiteRoute::from_site_pin(&device, vcc, c1, true);
    {
        let ctx = SearchContext {
            graph: &device,
            design: &design,
            used_site_pips: None,
            routethroughs: &routethroughs,
        };
        route.build(&ctx);
    }
    assert!(route.is_valid());
    assert_eq!(route.bel_pin_sinks(), &[c6_a1]);
    testing::assert_acyclic(route.tree());

    route.apply_routing(&device, &mut design);
    route.set_sinks_as_routed(&mut design);

    let lut_d = design.cell_by_name("lut_d").unwrap();
    let pseudo = design.pin_by_name(lut_d, "VCC_pseudo0").unwrap();
    assert!(design.pin(pseudo).is_pseudo());
    assert_eq!(design.pin(pseudo).net, Some(vcc));
    assert_eq!(design.cell_pin_at(c6_a1), Some(pseudo));
    assert_eq!(design.cell(lut_d).pseudo_pin_count, 1);
    assert!(design.net(vcc).routed_sinks().contains(&pseudo));
    assert!(design.net(vcc).site_pin_route(c1).is_some());
}

#[test]
fn test_inout_site_pin_source() {
    let device = device_from_yaml(
        &testing::DEVICE_YAML.replace("{ name: B1, dir: input,", "{ name: B1, dir: inout,")
    );
    let design = testing::design(&device);
    let site = device.site_by_name("SLICE_X0Y0").unwrap();
    let b1 = device.site_pin(site, "B1").unwrap();
    let b6lut = device.bel(site, "B6LUT").unwrap();
    assert!(device.site_pin_info(b1).is_output());

    let routethroughs = RoutethroughMap::new();
    let ctx = SearchContext {
        graph: &device,
        design: &design,
        used_site_pips: None,
        routethroughs: &routethroughs,
    };

    /* The source pin itself is not a sink */
    let n_a = design.net_by_name("n_a").unwrap();
    let mut route = IntrasiteRoute::from_site_pin(&device, n_a, b1, false);
    route.build(&ctx);
    assert!(route.is_valid());
    assert_eq!(route.tree().len(), 2);
    assert_eq!(route.bel_pin_sinks(), &[device.bel_pin(b6lut, "A1").unwrap()]);
    assert!(route.site_pin_sinks().is_empty());
}

#[test]
fn test_pseudo_pin_numbering() {
    let device = device_from_yaml(
        &testing::DEVICE_YAML
            .replace(
                "wire: C6LUT_A1 }",
                "wire: C6LUT_A1 }\n          - { name: A2, dir: input, wire: C6LUT_A2 }"
            )
            .replace("[ { to: C6LUT_A1 } ]", "[ { to: C6LUT_A1 }, { to: C6LUT_A2 } ]")
    );
    let mut design = testing::design(&device);
    let site = device.site_by_name("SLICE_X0Y0").unwrap();
    let c1 = device.site_pin(site, "C1").unwrap();
    let c6lut = device.bel(site, "C6LUT").unwrap();
    let c6_a1 = device.bel_pin(c6lut, "A1").unwrap();
    let c6_a2 = device.bel_pin(c6lut, "A2").unwrap();
    let vcc = design.vcc_net();

    let routethroughs = RoutethroughMap::new();
    let mut route = IntrasiteRoute::from_site_pin(&device, vcc, c1, true);
    {
        let ctx = SearchContext {
            graph: &device,
            design: &design,
            used_site_pips: None,
            routethroughs: &routethroughs,
        };
        route.build(&ctx);
    }
    assert_eq!(route.bel_pin_sinks(), &[c6_a1, c6_a2]);
    testing::assert_acyclic(route.tree());

    route.apply_routing(&device, &mut design);
    let lut_d = design.cell_by_name("lut_d").unwrap();
    let pseudo0 = design.pin_by_name(lut_d, "VCC_pseudo0").unwrap();
    let pseudo1 = design.pin_by_name(lut_d, "VCC_pseudo1").unwrap();
    assert_eq!(design.cell_pin_at(c6_a1), Some(pseudo0));
    assert_eq!(design.cell_pin_at(c6_a2), Some(pseudo1));
    assert_eq!(design.cell(lut_d).pseudo_pin_count, 2);

    let vcc_pins = design.net(vcc).pins().len();
    route.apply_routing(&device, &mut design);
    assert_eq!(design.cell(lut_d).pseudo_pin_count, 2);
    assert_eq!(design.net(vcc).pins().len(), vcc_pins);
    assert_eq!(design.net(vcc).intrasite_routes().len(), 1);
}
