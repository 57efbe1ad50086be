//! Parser for the JSBSim-dialect aircraft description.
//!
//! Builds the `FdmConfig` tree from a single XML stream. Unit attributes on
//! measurement elements are normalized to SI here; unknown elements are
//! skipped for forward compatibility.

use roxmltree::{Document, Node};
use thiserror::Error;
use tracing::warn;

use crate::config::function::{FunctionDef, OpKind, Operation};
use crate::config::model::*;
use crate::config::table::{self, LookupTable, Table2D, TableData};
use crate::utils::constants::*;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("malformed XML: {0}")]
    Xml(#[from] roxmltree::Error),

    #[error("unknown unit '{unit}' on element '{element}'")]
    UnknownUnit { unit: String, element: String },

    #[error("required element '{0}' missing")]
    MissingElement(String),

    #[error("unparsable number '{text}' in element '{element}'")]
    InvalidNumber { text: String, element: String },
}

/// Parse an aircraft description from XML text.
pub fn parse_config(xml: &str) -> Result<FdmConfig, ConfigError> {
    let doc = Document::parse(xml)?;
    let root = doc.root_element();
    if root.tag_name().name() != "fdm_config" {
        return Err(ConfigError::MissingElement("fdm_config".into()));
    }

    let mut config = FdmConfig {
        name: attr(&root, "name"),
        version: attr(&root, "version"),
        release: attr(&root, "release"),
        ..FdmConfig::default()
    };

    for child in root.children().filter(Node::is_element) {
        match child.tag_name().name() {
            "fileheader" => config.header = Some(parse_header(&child)?),
            "metrics" => config.metrics = Some(parse_metrics(&child)?),
            "mass_balance" => config.mass_balance = Some(parse_mass_balance(&child)?),
            "ground_reactions" => config.ground_reactions = Some(parse_ground_reactions(&child)?),
            "propulsion" => config.propulsion = Some(parse_propulsion(&child)?),
            "flight_control" => config.flight_control = Some(parse_flight_control(&child)?),
            "autopilot" => config.autopilot = Some(parse_flight_control(&child)?),
            "aerodynamics" => config.aerodynamics = Some(parse_aerodynamics(&child)?),
            "input" => config.input = Some(parse_input(&child)?),
            "output" => config.output = Some(parse_output(&child)?),
            other => warn!(element = other, "skipping unknown fdm_config child"),
        }
    }

    for (field, present) in [
        ("fileheader", config.header.is_some()),
        ("metrics", config.metrics.is_some()),
        ("mass_balance", config.mass_balance.is_some()),
        ("ground_reactions", config.ground_reactions.is_some()),
        ("propulsion", config.propulsion.is_some()),
        ("flight_control", config.flight_control.is_some()),
        ("aerodynamics", config.aerodynamics.is_some()),
    ] {
        if !present {
            return Err(ConfigError::MissingElement(field.into()));
        }
    }

    Ok(config)
}

fn attr(node: &Node, name: &str) -> String {
    node.attribute(name).unwrap_or_default().to_string()
}

fn child<'a, 'input>(node: &Node<'a, 'input>, name: &str) -> Option<Node<'a, 'input>> {
    node.children()
        .find(|c| c.is_element() && c.tag_name().name() == name)
}

fn text(node: &Node) -> String {
    node.text().unwrap_or_default().trim().to_string()
}

fn parse_f64(node: &Node) -> Result<f64, ConfigError> {
    let raw = text(node);
    raw.parse().map_err(|_| ConfigError::InvalidNumber {
        text: raw,
        element: node.tag_name().name().to_string(),
    })
}

fn child_f64(node: &Node, name: &str) -> Result<Option<f64>, ConfigError> {
    child(node, name).map(|c| parse_f64(&c)).transpose()
}

/// Normalize a measured value to SI by its unit spelling. Missing units
/// leave the value unchanged; unknown units fail.
fn to_si(value: f64, unit: &str, element: &str) -> Result<f64, ConfigError> {
    if unit.is_empty() {
        return Ok(value);
    }
    let factor = match unit.to_uppercase().as_str() {
        "FT" => FT_TO_M,
        "M" => 1.0,
        "IN" => IN_TO_M,
        "FT2" => FT2_TO_M2,
        "M2" => 1.0,
        "LBS" => LB_TO_KG,
        "KG" => 1.0,
        "SLUG*FT2" | "SLUG-FT2" => SLUGFT2_TO_KGM2,
        "KG*M2" | "KG-M2" => 1.0,
        "DEG" => std::f64::consts::PI / 180.0,
        "RAD" => 1.0,
        "KTS" => KT_TO_MS,
        "HP" => HP_TO_W,
        _ => {
            return Err(ConfigError::UnknownUnit {
                unit: unit.to_string(),
                element: element.to_string(),
            })
        }
    };
    Ok(value * factor)
}

/// A measurement element: numeric text plus an optional `unit` attribute.
fn parse_measurement(node: &Node) -> Result<f64, ConfigError> {
    let value = parse_f64(node)?;
    to_si(value, &attr(node, "unit"), node.tag_name().name())
}

fn measurement(node: &Node, name: &str) -> Result<Option<f64>, ConfigError> {
    child(node, name).map(|c| parse_measurement(&c)).transpose()
}

fn parse_header(node: &Node) -> Result<Header, ConfigError> {
    let mut header = Header {
        author: child(node, "author").map(|c| text(&c)).unwrap_or_default(),
        file_creation_date: child(node, "filecreationdate")
            .map(|c| text(&c))
            .unwrap_or_default(),
        description: child(node, "description").map(|c| text(&c)).unwrap_or_default(),
        version: child(node, "version").map(|c| text(&c)).unwrap_or_default(),
        references: Vec::new(),
    };
    for reference in node
        .children()
        .filter(|c| c.is_element() && c.tag_name().name() == "reference")
    {
        header.references.push(Reference {
            ref_id: attr(&reference, "refID"),
            author: attr(&reference, "author"),
            title: attr(&reference, "title"),
            date: attr(&reference, "date"),
        });
    }
    Ok(header)
}

fn parse_location(node: &Node) -> Result<Location, ConfigError> {
    let unit = attr(node, "unit");
    let element = node.tag_name().name();
    let x = child_f64(node, "x")?.unwrap_or(0.0);
    let y = child_f64(node, "y")?.unwrap_or(0.0);
    let z = child_f64(node, "z")?.unwrap_or(0.0);
    Ok(Location {
        name: attr(node, "name"),
        unit: if unit.is_empty() { String::new() } else { "M".into() },
        x: to_si(x, &unit, element)?,
        y: to_si(y, &unit, element)?,
        z: to_si(z, &unit, element)?,
    })
}

fn parse_metrics(node: &Node) -> Result<Metrics, ConfigError> {
    let mut metrics = Metrics {
        wing_area: measurement(node, "wingarea")?,
        wing_span: measurement(node, "wingspan")?,
        chord: measurement(node, "chord")?,
        htail_area: measurement(node, "htailarea")?,
        htail_arm: measurement(node, "htailarm")?,
        vtail_area: measurement(node, "vtailarea")?,
        vtail_arm: measurement(node, "vtailarm")?,
        locations: Vec::new(),
    };
    for location in node
        .children()
        .filter(|c| c.is_element() && c.tag_name().name() == "location")
    {
        metrics.locations.push(parse_location(&location)?);
    }
    Ok(metrics)
}

fn parse_mass_balance(node: &Node) -> Result<MassBalance, ConfigError> {
    let mut mb = MassBalance {
        ixx: measurement(node, "ixx")?,
        iyy: measurement(node, "iyy")?,
        izz: measurement(node, "izz")?,
        ixy: measurement(node, "ixy")?,
        ixz: measurement(node, "ixz")?,
        iyz: measurement(node, "iyz")?,
        empty_mass: measurement(node, "emptywt")?,
        cg_location: child(node, "location")
            .map(|c| parse_location(&c))
            .transpose()?,
        point_masses: Vec::new(),
    };
    for pm in node
        .children()
        .filter(|c| c.is_element() && c.tag_name().name() == "pointmass")
    {
        mb.point_masses.push(PointMass {
            name: attr(&pm, "name"),
            mass: measurement(&pm, "weight")?,
            location: child(&pm, "location")
                .map(|c| parse_location(&c))
                .transpose()?,
        });
    }
    Ok(mb)
}

fn parse_ground_reactions(node: &Node) -> Result<GroundReactions, ConfigError> {
    let mut gr = GroundReactions::default();
    for contact in node
        .children()
        .filter(|c| c.is_element() && c.tag_name().name() == "contact")
    {
        gr.contacts.push(Contact {
            contact_type: attr(&contact, "type"),
            name: attr(&contact, "name"),
            location: child(&contact, "location")
                .map(|c| parse_location(&c))
                .transpose()?,
            static_friction: child_f64(&contact, "static_friction")?.unwrap_or(0.0),
            dynamic_friction: child_f64(&contact, "dynamic_friction")?.unwrap_or(0.0),
            rolling_friction: child_f64(&contact, "rolling_friction")?.unwrap_or(0.0),
            spring_coeff: measurement(&contact, "spring_coeff")?,
            damping_coeff: measurement(&contact, "damping_coeff")?,
            max_steer: measurement(&contact, "max_steer")?,
            brake_group: child(&contact, "brake_group")
                .map(|c| text(&c))
                .unwrap_or_default(),
            retractable: child_f64(&contact, "retractable")?.unwrap_or(0.0) != 0.0,
        });
    }
    Ok(gr)
}

fn parse_orient(node: &Node) -> Result<Orient, ConfigError> {
    let unit = attr(node, "unit");
    let element = node.tag_name().name();
    Ok(Orient {
        roll: to_si(child_f64(node, "roll")?.unwrap_or(0.0), &unit, element)?,
        pitch: to_si(child_f64(node, "pitch")?.unwrap_or(0.0), &unit, element)?,
        yaw: to_si(child_f64(node, "yaw")?.unwrap_or(0.0), &unit, element)?,
    })
}

fn parse_propulsion(node: &Node) -> Result<PropulsionDef, ConfigError> {
    let mut prop = PropulsionDef::default();
    for engine in node
        .children()
        .filter(|c| c.is_element() && c.tag_name().name() == "engine")
    {
        let mut def = EngineDef {
            file: attr(&engine, "file"),
            name: attr(&engine, "name"),
            location: child(&engine, "location")
                .map(|c| parse_location(&c))
                .transpose()?,
            orient: child(&engine, "orient")
                .map(|c| parse_orient(&c))
                .transpose()?,
            feed: Vec::new(),
            thruster: None,
        };
        for feed in engine
            .children()
            .filter(|c| c.is_element() && c.tag_name().name() == "feed")
        {
            def.feed.push(parse_f64(&feed)? as i32);
        }
        if let Some(thruster) = child(&engine, "thruster") {
            def.thruster = Some(ThrusterDef {
                file: attr(&thruster, "file"),
                name: attr(&thruster, "name"),
                location: child(&thruster, "location")
                    .map(|c| parse_location(&c))
                    .transpose()?,
                orient: child(&thruster, "orient")
                    .map(|c| parse_orient(&c))
                    .transpose()?,
            });
        }
        prop.engines.push(def);
    }
    for tank in node
        .children()
        .filter(|c| c.is_element() && c.tag_name().name() == "tank")
    {
        prop.tanks.push(TankDef {
            tank_type: attr(&tank, "type"),
            number: tank
                .attribute("number")
                .and_then(|n| n.parse().ok())
                .unwrap_or(0),
            location: child(&tank, "location")
                .map(|c| parse_location(&c))
                .transpose()?,
            capacity: measurement(&tank, "capacity")?,
            contents: measurement(&tank, "contents")?,
            temperature: child_f64(&tank, "temperature")?.unwrap_or(0.0),
            priority: tank
                .attribute("priority")
                .and_then(|n| n.parse().ok())
                .unwrap_or_else(|| child(&tank, "priority").and_then(|c| text(&c).parse().ok()).unwrap_or(1)),
        });
    }
    Ok(prop)
}

fn parse_flight_control(node: &Node) -> Result<FlightControlDef, ConfigError> {
    let mut fc = FlightControlDef {
        name: attr(node, "name"),
        ..FlightControlDef::default()
    };
    for c in node.children().filter(Node::is_element) {
        match c.tag_name().name() {
            "property" => fc.properties.push(text(&c)),
            "rate_group" => fc.rate_groups.push(RateGroupDef {
                name: attr(&c, "name"),
                rate_hz: c
                    .attribute("rate_Hz")
                    .and_then(|r| r.parse().ok())
                    .unwrap_or(0.0),
            }),
            "channel" => fc.channels.push(parse_channel(&c)?),
            _ => {}
        }
    }
    Ok(fc)
}

fn parse_channel(node: &Node) -> Result<ChannelDef, ConfigError> {
    let mut channel = ChannelDef {
        name: attr(node, "name"),
        ..ChannelDef::default()
    };
    for c in node.children().filter(Node::is_element) {
        match c.tag_name().name() {
            "component" => channel.components.push(parse_component(&c)?),
            "sensor" => channel.sensors.push(parse_sensor(&c)?),
            _ => {}
        }
    }
    Ok(channel)
}

fn parse_component(node: &Node) -> Result<ComponentDef, ConfigError> {
    let mut def = ComponentDef {
        name: attr(node, "name"),
        component_type: attr(node, "type"),
        rate_group: attr(node, "rate_group"),
        output: child(node, "output").map(|c| text(&c)).unwrap_or_default(),
        gain: child_f64(node, "gain")?,
        function: child(node, "function")
            .map(|c| parse_function(&c))
            .transpose()?,
        width: child_f64(node, "width")?,
        rate_limit: child_f64(node, "rate_limit")?,
        lag: child_f64(node, "lag")?,
        bias: child_f64(node, "bias")?,
        default_value: child(node, "default")
            .and_then(|c| c.attribute("value").and_then(|v| v.parse().ok())),
        ..ComponentDef::default()
    };
    for input in node
        .children()
        .filter(|c| c.is_element() && c.tag_name().name() == "input")
    {
        def.inputs.push(text(&input));
    }
    if let Some(clip) = child(node, "clipto") {
        def.clip_min = child_f64(&clip, "min")?;
        def.clip_max = child_f64(&clip, "max")?;
    }
    for (i, tag) in ["c1", "c2", "c3", "c4", "c5", "c6"].into_iter().enumerate() {
        def.coefficients[i] = child_f64(node, tag)?;
    }
    for test in node
        .children()
        .filter(|c| c.is_element() && c.tag_name().name() == "test")
    {
        def.tests.push(TestDef {
            logic: attr(&test, "logic"),
            value: attr(&test, "value"),
            condition: text(&test),
        });
    }
    if let Some(traverse) = child(node, "traverse") {
        for setting in traverse
            .children()
            .filter(|c| c.is_element() && c.tag_name().name() == "setting")
        {
            def.settings.push(SettingDef {
                position: child_f64(&setting, "position")?.unwrap_or(0.0),
                time: child_f64(&setting, "time")?.unwrap_or(0.0),
            });
        }
    }
    if let Some(table) = child(node, "table") {
        def.table = Some(parse_table(&table)?);
    }
    Ok(def)
}

fn parse_sensor(node: &Node) -> Result<SensorDef, ConfigError> {
    let mut sensor = SensorDef {
        name: attr(node, "name"),
        rate_group: attr(node, "rate_group"),
        input: child(node, "input").map(|c| text(&c)).unwrap_or_default(),
        lag: child_f64(node, "lag")?.unwrap_or(0.0),
        drift_rate: child_f64(node, "drift_rate")?.unwrap_or(0.0),
        bias: child_f64(node, "bias")?.unwrap_or(0.0),
        ..SensorDef::default()
    };
    if let Some(noise) = child(node, "noise") {
        sensor.noise_variation = attr(&noise, "variation");
        sensor.noise_value = parse_f64(&noise)?;
    }
    if let Some(quant) = child(node, "quantization") {
        sensor.quantization_bits = child_f64(&quant, "bits")?.map(|b| b as i32);
        sensor.quantization_min = child_f64(&quant, "min")?.unwrap_or(0.0);
        sensor.quantization_max = child_f64(&quant, "max")?.unwrap_or(0.0);
    }
    Ok(sensor)
}

fn parse_aerodynamics(node: &Node) -> Result<Aerodynamics, ConfigError> {
    let mut aero = Aerodynamics::default();
    if let Some(limits) = child(node, "alphalimits") {
        let unit = attr(&limits, "unit");
        aero.alpha_limits = Some(AlphaLimits {
            min: to_si(child_f64(&limits, "min")?.unwrap_or(0.0), &unit, "alphalimits")?,
            max: to_si(child_f64(&limits, "max")?.unwrap_or(0.0), &unit, "alphalimits")?,
        });
    }
    for c in node.children().filter(Node::is_element) {
        match c.tag_name().name() {
            "axis" => {
                let mut axis = AxisDef {
                    name: attr(&c, "name"),
                    functions: Vec::new(),
                };
                for function in c
                    .children()
                    .filter(|f| f.is_element() && f.tag_name().name() == "function")
                {
                    axis.functions.push(parse_function(&function)?);
                }
                aero.axes.push(axis);
            }
            "function" => aero.functions.push(parse_function(&c)?),
            _ => {}
        }
    }
    Ok(aero)
}

fn parse_input(node: &Node) -> Result<InputDef, ConfigError> {
    Ok(InputDef {
        port: node.attribute("port").and_then(|p| p.parse().ok()).unwrap_or(0),
        protocol: attr(node, "protocol"),
    })
}

fn parse_output(node: &Node) -> Result<OutputDef, ConfigError> {
    Ok(OutputDef {
        name: attr(node, "name"),
        output_type: attr(node, "type"),
        port: node.attribute("port").and_then(|p| p.parse().ok()).unwrap_or(0),
        protocol: attr(node, "protocol"),
        rate: node.attribute("rate").and_then(|r| r.parse().ok()).unwrap_or(0),
    })
}

/// Parse a `function` element: name attribute, optional description, then
/// exactly one operation child or a bare table.
pub fn parse_function(node: &Node) -> Result<FunctionDef, ConfigError> {
    let mut def = FunctionDef {
        name: attr(node, "name"),
        description: child(node, "description")
            .map(|c| text(&c))
            .unwrap_or_default(),
        operation: None,
        table: None,
    };
    for c in node.children().filter(Node::is_element) {
        let tag = c.tag_name().name();
        if let Some(kind) = OpKind::from_tag(tag) {
            def.operation = Some(parse_operation(&c, kind)?);
        } else if tag == "table" {
            def.table = Some(parse_table(&c)?);
        }
    }
    Ok(def)
}

fn parse_operation(node: &Node, kind: OpKind) -> Result<Operation, ConfigError> {
    let mut op = Operation::new(kind);
    for c in node.children().filter(Node::is_element) {
        let tag = c.tag_name().name();
        match tag {
            "property" => op.properties.push(text(&c)),
            "value" => op.values.push(parse_f64(&c)?),
            "table" => op.table = Some(parse_table(&c)?),
            _ => {
                if let Some(nested_kind) = OpKind::from_tag(tag) {
                    op.nested.push(parse_operation(&c, nested_kind)?);
                }
            }
        }
    }
    Ok(op)
}

/// Parse a `table` element: independent variables determine the dimension,
/// `tableData` children hold the payload. Breakpoint attributes accept both
/// `breakpoint` and `breakPoint`.
pub fn parse_table(node: &Node) -> Result<LookupTable, ConfigError> {
    let mut independent_vars = Vec::new();
    let mut lookup_types = Vec::new();
    for iv in node
        .children()
        .filter(|c| c.is_element() && c.tag_name().name() == "independentVar")
    {
        independent_vars.push(text(&iv));
        lookup_types.push(attr(&iv, "lookup"));
    }

    let table_data: Vec<Node> = node
        .children()
        .filter(|c| c.is_element() && c.tag_name().name() == "tableData")
        .collect();

    let data = match independent_vars.len() {
        0 | 1 => {
            let raw = table_data.first().map(|n| text(n)).unwrap_or_default();
            TableData::OneD(table::parse_1d(&raw))
        }
        2 => {
            let raw = table_data.first().map(|n| text(n)).unwrap_or_default();
            TableData::TwoD(table::parse_2d(&raw))
        }
        _ => {
            let mut slices = Vec::new();
            for td in &table_data {
                let bp = td
                    .attribute("breakpoint")
                    .or_else(|| td.attribute("breakPoint"))
                    .and_then(|b| b.parse().ok())
                    .unwrap_or(0.0);
                let mut slice: Table2D = table::parse_2d(&text(td));
                slice.breakpoint = bp;
                slices.push(slice);
            }
            TableData::ThreeD(slices)
        }
    };

    Ok(LookupTable {
        name: attr(node, "name"),
        independent_vars,
        lookup_types,
        data,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    const MINIMAL: &str = r#"
<fdm_config name="test" version="2.0" release="ALPHA">
  <fileheader>
    <author>Test Author</author>
    <description>Test aircraft</description>
  </fileheader>
  <metrics>
    <wingarea unit="FT2">235.0</wingarea>
    <wingspan unit="FT">37.0</wingspan>
    <chord unit="FT">6.6</chord>
    <location name="AERORP" unit="IN"><x>112.2</x><y>0</y><z>4.9</z></location>
  </metrics>
  <mass_balance>
    <ixx unit="SLUG*FT2">8031.0</ixx>
    <iyy unit="SLUG*FT2">9496.0</iyy>
    <izz unit="SLUG*FT2">16118.0</izz>
    <emptywt unit="LBS">7125.0</emptywt>
  </mass_balance>
  <ground_reactions>
    <contact type="BOGEY" name="LEFT_MLG">
      <location unit="IN"><x>100</x><y>-77</y><z>-70</z></location>
      <static_friction>0.8</static_friction>
      <spring_coeff unit="LBS">10000</spring_coeff>
    </contact>
  </ground_reactions>
  <propulsion>
    <engine file="engine" name="test-engine">
      <orient unit="DEG"><roll>-4.0</roll><pitch>2.5</pitch><yaw>0.0</yaw></orient>
      <feed>0</feed>
    </engine>
    <tank type="FUEL" number="0">
      <capacity unit="LBS">553.84</capacity>
      <contents unit="LBS">396.0</contents>
    </tank>
  </propulsion>
  <flight_control name="FCS">
    <rate_group name="high" rate_Hz="120"/>
    <channel name="Pitch">
      <component name="elevator-actuator" type="ACTUATOR" rate_group="high">
        <input>fcs/elevator-cmd-norm</input>
        <output>fcs/elevator-pos-rad</output>
        <rate_limit>2.5</rate_limit>
        <lag>0.06</lag>
        <width>0.02</width>
      </component>
    </channel>
  </flight_control>
  <aerodynamics>
    <axis name="LIFT">
      <function name="aero/force/lift">
        <product>
          <property>aero/qbar-psf</property>
          <value>235.0</value>
          <table>
            <independentVar lookup="row">aero/alpha-deg</independentVar>
            <tableData>
              -10.0  -0.57
                0.0   0.32
               10.0   1.21
            </tableData>
          </table>
        </product>
      </function>
    </axis>
  </aerodynamics>
</fdm_config>
"#;

    #[test]
    fn test_parse_minimal_config() {
        let config = parse_config(MINIMAL).unwrap();
        assert_eq!(config.name, "test");
        assert_eq!(config.version, "2.0");

        let metrics = config.metrics.unwrap();
        assert_relative_eq!(metrics.wing_area.unwrap(), 235.0 * FT2_TO_M2, epsilon = 1e-9);
        assert_relative_eq!(metrics.wing_span.unwrap(), 37.0 * FT_TO_M, epsilon = 1e-9);

        let mb = config.mass_balance.unwrap();
        assert_relative_eq!(mb.empty_mass.unwrap(), 7125.0 * LB_TO_KG, epsilon = 1e-9);
        assert_relative_eq!(mb.ixx.unwrap(), 8031.0 * SLUGFT2_TO_KGM2, epsilon = 1e-6);
    }

    #[test]
    fn test_orient_converted_to_radians() {
        let config = parse_config(MINIMAL).unwrap();
        let orient = config.propulsion.unwrap().engines[0].orient.clone().unwrap();
        assert_relative_eq!(orient.roll, -4.0_f64.to_radians(), epsilon = 1e-9);
        assert_relative_eq!(orient.pitch, 2.5_f64.to_radians(), epsilon = 1e-9);
    }

    #[test]
    fn test_component_parameters() {
        let config = parse_config(MINIMAL).unwrap();
        let fc = config.flight_control.unwrap();
        assert_eq!(fc.rate_groups[0].name, "high");
        assert_eq!(fc.rate_groups[0].rate_hz, 120.0);
        let comp = &fc.channels[0].components[0];
        assert_eq!(comp.component_type, "ACTUATOR");
        assert_eq!(comp.rate_limit, Some(2.5));
        assert_eq!(comp.lag, Some(0.06));
        assert_eq!(comp.width, Some(0.02));
    }

    #[test]
    fn test_aero_function_with_table() {
        let config = parse_config(MINIMAL).unwrap();
        let aero = config.aerodynamics.unwrap();
        let lift = &aero.axis("LIFT").unwrap().functions[0];
        let op = lift.operation.as_ref().unwrap();
        assert_eq!(op.kind, OpKind::Product);
        assert_eq!(op.properties, vec!["aero/qbar-psf".to_string()]);
        assert_eq!(op.values, vec![235.0]);
        assert_eq!(op.table.as_ref().unwrap().dimension(), 1);
    }

    #[test]
    fn test_missing_required_element() {
        let xml = r#"<fdm_config name="x"><fileheader/></fdm_config>"#;
        match parse_config(xml) {
            Err(ConfigError::MissingElement(name)) => assert_eq!(name, "metrics"),
            other => panic!("expected MissingElement, got {other:?}"),
        }
    }

    #[test]
    fn test_unknown_unit_rejected() {
        let xml = MINIMAL.replace("unit=\"FT2\"", "unit=\"ACRES\"");
        assert!(matches!(
            parse_config(&xml),
            Err(ConfigError::UnknownUnit { .. })
        ));
    }

    #[test]
    fn test_malformed_xml() {
        assert!(matches!(
            parse_config("<fdm_config><unclosed>"),
            Err(ConfigError::Xml(_))
        ));
    }

    #[test]
    fn test_breakpoint_spelling_variants() {
        let xml = r#"
<table name="t3d">
  <independentVar lookup="row">a</independentVar>
  <independentVar lookup="column">b</independentVar>
  <independentVar lookup="table">c</independentVar>
  <tableData breakpoint="0.0">
        0.0  1.0
   0.0  1.0  1.0
  </tableData>
  <tableData breakPoint="2.0">
        0.0  1.0
   0.0  3.0  3.0
  </tableData>
</table>"#;
        let doc = Document::parse(xml).unwrap();
        let table = parse_table(&doc.root_element()).unwrap();
        match table.data {
            TableData::ThreeD(ref slices) => {
                assert_eq!(slices.len(), 2);
                assert_eq!(slices[0].breakpoint, 0.0);
                assert_eq!(slices[1].breakpoint, 2.0);
            }
            _ => panic!("expected 3D table"),
        }
        assert_relative_eq!(table.interpolate(&[0.0, 0.0, 1.0]).unwrap(), 2.0);
    }

    #[test]
    fn test_unknown_elements_ignored() {
        let xml = MINIMAL.replace(
            "<aerodynamics>",
            "<made_up_extension><child/></made_up_extension><aerodynamics>",
        );
        assert!(parse_config(&xml).is_ok());
    }
}
