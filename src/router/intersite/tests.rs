use super::*;
use crate::router::route_string::route_string;
use crate::testing::{self, tile_wire};

const N_A_PIPS: [&str; 4] = [
    "INT_X0Y0/INT_L.LOGIC_OUT->>NN2",
    "INT_X0Y0/INT_L.NN2->>IMUX_A1",
    "INT_X0Y0/INT_L.LOGIC_OUT->>EE2",
    "INT_X0Y0/INT_L.EE2->>IMUX_B1",
];

#[test]
fn test_route_reaches_site_pins() {
    let device = testing::device();
    let pip_map = PipMap::from_tokens(N_A_PIPS).unwrap();
    let start = tile_wire(&device, "CLB_X0Y0", "CLB_A");

    let mut reached = Vec::new();
    let result: Result<_, ()> = route(&device, &pip_map, start, |pin| {
        reached.push(device.site_pin_full_name(pin));
        Ok(())
    });
    let route = result.unwrap();

    assert!(route.pip_used);
    assert_eq!(route.tree.len(), 8);
    testing::assert_acyclic(&route.tree);
    assert_eq!(reached, vec!["SLICE_X1Y0/A1", "SLICE_X0Y0/B1"]);
    assert_eq!(route_string(&device, &route.tree), testing::N_A_ROUTE);
}

#[test]
fn test_disabled_pips_are_not_followed() {
    let device = testing::device();
    let pip_map = PipMap::from_tokens(["INT_X0Y0/INT_L.LOGIC_OUT->>NN2"]).unwrap();
    let start = tile_wire(&device, "CLB_X0Y0", "CLB_A");

    let mut reached = 0;
    let result: Result<_, ()> = route(&device, &pip_map, start, |_| {
        reached += 1;
        Ok(())
    });
    let route = result.unwrap();

    assert_eq!(reached, 0);
    assert_eq!(
        route.tree.wires().collect::<Vec<_>>(),
        vec![
            start,
            tile_wire(&device, "INT_X0Y0", "LOGIC_OUT"),
            tile_wire(&device, "INT_X0Y0", "NN2"),
        ]
    );
}

#[test]
fn test_route_without_pips() {
    let device = testing::device();
    let start = tile_wire(&device, "INT_X0Y0", "LOGIC_OUT");

    let result: Result<_, ()> = route(&device, &PipMap::new(), start, |_| Ok(()));
    let route = result.unwrap();

    assert!(!route.pip_used);
    assert_eq!(route.tree.len(), 1);
}

#[test]
fn test_callback_error_stops_search() {
    let device = testing::device();
    let pip_map = PipMap::from_tokens(N_A_PIPS).unwrap();
    let start = tile_wire(&device, "CLB_X0Y0", "CLB_A");

    let mut calls = 0;
    let result = route(&device, &pip_map, start, |pin| {
        calls += 1;
        Err(device.site_pin_full_name(pin))
    });

    assert_eq!(result.unwrap_err(), "SLICE_X1Y0/A1");
    assert_eq!(calls, 1);
}
