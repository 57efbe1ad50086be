//! Parse → serialize → parse fidelity of the aircraft description.

mod common;

use common::p51d_xml;
use sixdof::config::model::FdmConfig;
use sixdof::config::table::TableData;
use sixdof::{parse_config, write_config};

fn assert_close(a: f64, b: f64, context: &str) {
    let scale = a.abs().max(b.abs()).max(1e-30);
    assert!(
        (a - b).abs() / scale < 1e-9,
        "{context}: {a} vs {b}"
    );
}

fn assert_opt_close(a: Option<f64>, b: Option<f64>, context: &str) {
    match (a, b) {
        (Some(a), Some(b)) => assert_close(a, b, context),
        (None, None) => {}
        other => panic!("{context}: presence mismatch {other:?}"),
    }
}

/// Every numeric leaf that survives a parse → serialize → parse cycle must
/// match the original to 1e-9 relative.
fn assert_configs_match(first: &FdmConfig, second: &FdmConfig) {
    assert_eq!(first.name, second.name);
    assert_eq!(first.version, second.version);

    let (m1, m2) = (
        first.metrics.as_ref().unwrap(),
        second.metrics.as_ref().unwrap(),
    );
    assert_opt_close(m1.wing_area, m2.wing_area, "wing_area");
    assert_opt_close(m1.wing_span, m2.wing_span, "wing_span");
    assert_opt_close(m1.chord, m2.chord, "chord");
    assert_opt_close(m1.htail_area, m2.htail_area, "htail_area");
    assert_eq!(m1.locations.len(), m2.locations.len());
    for (l1, l2) in m1.locations.iter().zip(&m2.locations) {
        assert_close(l1.x, l2.x, "location.x");
        assert_close(l1.y, l2.y, "location.y");
        assert_close(l1.z, l2.z, "location.z");
    }

    let (mb1, mb2) = (
        first.mass_balance.as_ref().unwrap(),
        second.mass_balance.as_ref().unwrap(),
    );
    assert_opt_close(mb1.ixx, mb2.ixx, "ixx");
    assert_opt_close(mb1.iyy, mb2.iyy, "iyy");
    assert_opt_close(mb1.izz, mb2.izz, "izz");
    assert_opt_close(mb1.empty_mass, mb2.empty_mass, "empty_mass");
    assert_eq!(mb1.point_masses.len(), mb2.point_masses.len());

    let (gr1, gr2) = (
        first.ground_reactions.as_ref().unwrap(),
        second.ground_reactions.as_ref().unwrap(),
    );
    assert_eq!(gr1.contacts.len(), gr2.contacts.len());
    for (c1, c2) in gr1.contacts.iter().zip(&gr2.contacts) {
        assert_close(c1.static_friction, c2.static_friction, "static_friction");
        assert_opt_close(c1.spring_coeff, c2.spring_coeff, "spring_coeff");
        assert_opt_close(c1.damping_coeff, c2.damping_coeff, "damping_coeff");
    }

    let (p1, p2) = (
        first.propulsion.as_ref().unwrap(),
        second.propulsion.as_ref().unwrap(),
    );
    assert_eq!(p1.engines.len(), p2.engines.len());
    for (e1, e2) in p1.engines.iter().zip(&p2.engines) {
        let (o1, o2) = (e1.orient.as_ref().unwrap(), e2.orient.as_ref().unwrap());
        assert_close(o1.roll, o2.roll, "engine orient roll");
        assert_close(o1.pitch, o2.pitch, "engine orient pitch");
    }
    assert_eq!(p1.tanks.len(), p2.tanks.len());
    for (t1, t2) in p1.tanks.iter().zip(&p2.tanks) {
        assert_eq!(t1.number, t2.number);
        assert_eq!(t1.priority, t2.priority);
        assert_opt_close(t1.capacity, t2.capacity, "tank capacity");
        assert_opt_close(t1.contents, t2.contents, "tank contents");
    }

    let (fc1, fc2) = (
        first.flight_control.as_ref().unwrap(),
        second.flight_control.as_ref().unwrap(),
    );
    assert_eq!(fc1.rate_groups.len(), fc2.rate_groups.len());
    for (g1, g2) in fc1.rate_groups.iter().zip(&fc2.rate_groups) {
        assert_eq!(g1.name, g2.name);
        assert_close(g1.rate_hz, g2.rate_hz, "rate_hz");
    }
    assert_eq!(fc1.channels.len(), fc2.channels.len());
    for (ch1, ch2) in fc1.channels.iter().zip(&fc2.channels) {
        assert_eq!(ch1.components.len(), ch2.components.len());
        for (comp1, comp2) in ch1.components.iter().zip(&ch2.components) {
            assert_eq!(comp1.name, comp2.name);
            assert_eq!(comp1.component_type, comp2.component_type);
            assert_opt_close(comp1.gain, comp2.gain, "component gain");
            assert_opt_close(comp1.rate_limit, comp2.rate_limit, "rate_limit");
            assert_opt_close(comp1.lag, comp2.lag, "lag");
            assert_opt_close(comp1.width, comp2.width, "width");
        }
    }

    let (a1, a2) = (
        first.aerodynamics.as_ref().unwrap(),
        second.aerodynamics.as_ref().unwrap(),
    );
    assert_eq!(a1.axes.len(), a2.axes.len());
    for (x1, x2) in a1.axes.iter().zip(&a2.axes) {
        assert_eq!(x1.name, x2.name);
        assert_eq!(x1.functions.len(), x2.functions.len());
        for (f1, f2) in x1.functions.iter().zip(&x2.functions) {
            match (&f1.operation, &f2.operation) {
                (Some(op1), Some(op2)) => {
                    assert_eq!(op1.kind, op2.kind);
                    assert_eq!(op1.properties, op2.properties);
                    assert_eq!(op1.values.len(), op2.values.len());
                    for (v1, v2) in op1.values.iter().zip(&op2.values) {
                        assert_close(*v1, *v2, "operation value");
                    }
                    match (&op1.table, &op2.table) {
                        (Some(t1), Some(t2)) => match (&t1.data, &t2.data) {
                            (TableData::OneD(d1), TableData::OneD(d2)) => {
                                assert_eq!(d1.indices.len(), d2.indices.len());
                                for (i1, i2) in d1.indices.iter().zip(&d2.indices) {
                                    assert_close(*i1, *i2, "table index");
                                }
                                for (v1, v2) in d1.values.iter().zip(&d2.values) {
                                    assert_close(*v1, *v2, "table value");
                                }
                            }
                            _ => panic!("table dimension changed"),
                        },
                        (None, None) => {}
                        other => panic!("table presence mismatch: {other:?}"),
                    }
                    assert_eq!(op1.nested.len(), op2.nested.len());
                }
                (None, None) => {}
                other => panic!("operation presence mismatch: {other:?}"),
            }
        }
    }
}

#[test]
fn parse_serialize_parse_preserves_numeric_leaves() {
    let original = parse_config(&p51d_xml()).unwrap();
    let serialized = write_config(&original);
    let reparsed = parse_config(&serialized).unwrap();
    assert_configs_match(&original, &reparsed);
}

#[test]
fn second_generation_serialization_is_stable() {
    let first = parse_config(&p51d_xml()).unwrap();
    let first_xml = write_config(&first);
    let second = parse_config(&first_xml).unwrap();
    let second_xml = write_config(&second);
    assert_eq!(first_xml, second_xml);
}

#[test]
fn fixture_values_normalized_to_si() {
    let config = parse_config(&p51d_xml()).unwrap();

    let metrics = config.metrics.unwrap();
    // 235 ft² and 37.1 ft arrive in m² and m.
    assert!((metrics.wing_area.unwrap() - 21.832).abs() < 0.01);
    assert!((metrics.wing_span.unwrap() - 11.308).abs() < 0.01);

    let mb = config.mass_balance.unwrap();
    assert!((mb.empty_mass.unwrap() - 3231.8).abs() < 0.5);

    let orient = config.propulsion.unwrap().engines[0]
        .orient
        .clone()
        .unwrap();
    assert!((orient.pitch - 2.5_f64.to_radians()).abs() < 1e-9);
}
