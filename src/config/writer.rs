//! Serialization of a parsed configuration back to XML.
//!
//! Values were normalized to SI at parse time, so the writer emits SI unit
//! spellings; a parse → serialize → parse cycle preserves every numeric
//! leaf.

use std::fmt::Write;

use crate::config::function::{FunctionDef, Operation};
use crate::config::model::*;
use crate::config::table::{LookupTable, Table2D, TableData};

/// Render the configuration tree as an XML document string.
pub fn write_config(config: &FdmConfig) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "<fdm_config name=\"{}\" version=\"{}\" release=\"{}\">",
        config.name, config.version, config.release
    );

    if let Some(header) = &config.header {
        write_header(&mut out, header);
    }
    if let Some(metrics) = &config.metrics {
        write_metrics(&mut out, metrics);
    }
    if let Some(mb) = &config.mass_balance {
        write_mass_balance(&mut out, mb);
    }
    if let Some(gr) = &config.ground_reactions {
        write_ground_reactions(&mut out, gr);
    }
    if let Some(prop) = &config.propulsion {
        write_propulsion(&mut out, prop);
    }
    if let Some(fc) = &config.flight_control {
        write_flight_control(&mut out, fc, "flight_control");
    }
    if let Some(ap) = &config.autopilot {
        write_flight_control(&mut out, ap, "autopilot");
    }
    if let Some(aero) = &config.aerodynamics {
        write_aerodynamics(&mut out, aero);
    }
    if let Some(input) = &config.input {
        let _ = writeln!(
            out,
            "  <input port=\"{}\" protocol=\"{}\"/>",
            input.port, input.protocol
        );
    }
    if let Some(output) = &config.output {
        let _ = writeln!(
            out,
            "  <output name=\"{}\" type=\"{}\" port=\"{}\" protocol=\"{}\" rate=\"{}\"/>",
            output.name, output.output_type, output.port, output.protocol, output.rate
        );
    }

    out.push_str("</fdm_config>\n");
    out
}

fn leaf(out: &mut String, indent: &str, tag: &str, unit: &str, value: f64) {
    if unit.is_empty() {
        let _ = writeln!(out, "{indent}<{tag}>{value:e}</{tag}>");
    } else {
        let _ = writeln!(out, "{indent}<{tag} unit=\"{unit}\">{value:e}</{tag}>");
    }
}

fn opt_leaf(out: &mut String, indent: &str, tag: &str, unit: &str, value: Option<f64>) {
    if let Some(v) = value {
        leaf(out, indent, tag, unit, v);
    }
}

fn write_header(out: &mut String, header: &Header) {
    out.push_str("  <fileheader>\n");
    let _ = writeln!(out, "    <author>{}</author>", header.author);
    let _ = writeln!(
        out,
        "    <filecreationdate>{}</filecreationdate>",
        header.file_creation_date
    );
    let _ = writeln!(out, "    <description>{}</description>", header.description);
    let _ = writeln!(out, "    <version>{}</version>", header.version);
    for r in &header.references {
        let _ = writeln!(
            out,
            "    <reference refID=\"{}\" author=\"{}\" title=\"{}\" date=\"{}\"/>",
            r.ref_id, r.author, r.title, r.date
        );
    }
    out.push_str("  </fileheader>\n");
}

fn write_location(out: &mut String, indent: &str, location: &Location) {
    let name_attr = if location.name.is_empty() {
        String::new()
    } else {
        format!(" name=\"{}\"", location.name)
    };
    let unit_attr = if location.unit.is_empty() {
        String::new()
    } else {
        format!(" unit=\"{}\"", location.unit)
    };
    let _ = writeln!(
        out,
        "{indent}<location{name_attr}{unit_attr}><x>{:e}</x><y>{:e}</y><z>{:e}</z></location>",
        location.x, location.y, location.z
    );
}

fn write_metrics(out: &mut String, metrics: &Metrics) {
    out.push_str("  <metrics>\n");
    opt_leaf(out, "    ", "wingarea", "M2", metrics.wing_area);
    opt_leaf(out, "    ", "wingspan", "M", metrics.wing_span);
    opt_leaf(out, "    ", "chord", "M", metrics.chord);
    opt_leaf(out, "    ", "htailarea", "M2", metrics.htail_area);
    opt_leaf(out, "    ", "htailarm", "M", metrics.htail_arm);
    opt_leaf(out, "    ", "vtailarea", "M2", metrics.vtail_area);
    opt_leaf(out, "    ", "vtailarm", "M", metrics.vtail_arm);
    for location in &metrics.locations {
        write_location(out, "    ", location);
    }
    out.push_str("  </metrics>\n");
}

fn write_mass_balance(out: &mut String, mb: &MassBalance) {
    out.push_str("  <mass_balance>\n");
    opt_leaf(out, "    ", "ixx", "KG*M2", mb.ixx);
    opt_leaf(out, "    ", "iyy", "KG*M2", mb.iyy);
    opt_leaf(out, "    ", "izz", "KG*M2", mb.izz);
    opt_leaf(out, "    ", "ixy", "KG*M2", mb.ixy);
    opt_leaf(out, "    ", "ixz", "KG*M2", mb.ixz);
    opt_leaf(out, "    ", "iyz", "KG*M2", mb.iyz);
    opt_leaf(out, "    ", "emptywt", "KG", mb.empty_mass);
    if let Some(cg) = &mb.cg_location {
        write_location(out, "    ", cg);
    }
    for pm in &mb.point_masses {
        let _ = writeln!(out, "    <pointmass name=\"{}\">", pm.name);
        opt_leaf(out, "      ", "weight", "KG", pm.mass);
        if let Some(location) = &pm.location {
            write_location(out, "      ", location);
        }
        out.push_str("    </pointmass>\n");
    }
    out.push_str("  </mass_balance>\n");
}

fn write_ground_reactions(out: &mut String, gr: &GroundReactions) {
    out.push_str("  <ground_reactions>\n");
    for c in &gr.contacts {
        let _ = writeln!(
            out,
            "    <contact type=\"{}\" name=\"{}\">",
            c.contact_type, c.name
        );
        if let Some(location) = &c.location {
            write_location(out, "      ", location);
        }
        leaf(out, "      ", "static_friction", "", c.static_friction);
        leaf(out, "      ", "dynamic_friction", "", c.dynamic_friction);
        leaf(out, "      ", "rolling_friction", "", c.rolling_friction);
        opt_leaf(out, "      ", "spring_coeff", "KG", c.spring_coeff);
        opt_leaf(out, "      ", "damping_coeff", "KG", c.damping_coeff);
        opt_leaf(out, "      ", "max_steer", "RAD", c.max_steer);
        if !c.brake_group.is_empty() {
            let _ = writeln!(out, "      <brake_group>{}</brake_group>", c.brake_group);
        }
        leaf(out, "      ", "retractable", "", if c.retractable { 1.0 } else { 0.0 });
        out.push_str("    </contact>\n");
    }
    out.push_str("  </ground_reactions>\n");
}

fn write_propulsion(out: &mut String, prop: &PropulsionDef) {
    out.push_str("  <propulsion>\n");
    for e in &prop.engines {
        let _ = writeln!(out, "    <engine file=\"{}\" name=\"{}\">", e.file, e.name);
        if let Some(location) = &e.location {
            write_location(out, "      ", location);
        }
        if let Some(orient) = &e.orient {
            out.push_str("      <orient unit=\"RAD\">");
            let _ = write!(
                out,
                "<roll>{:e}</roll><pitch>{:e}</pitch><yaw>{:e}</yaw>",
                orient.roll, orient.pitch, orient.yaw
            );
            out.push_str("</orient>\n");
        }
        for feed in &e.feed {
            let _ = writeln!(out, "      <feed>{feed}</feed>");
        }
        if let Some(thruster) = &e.thruster {
            let _ = writeln!(
                out,
                "      <thruster file=\"{}\" name=\"{}\"/>",
                thruster.file, thruster.name
            );
        }
        out.push_str("    </engine>\n");
    }
    for t in &prop.tanks {
        let _ = writeln!(
            out,
            "    <tank type=\"{}\" number=\"{}\" priority=\"{}\">",
            t.tank_type, t.number, t.priority
        );
        if let Some(location) = &t.location {
            write_location(out, "      ", location);
        }
        opt_leaf(out, "      ", "capacity", "KG", t.capacity);
        opt_leaf(out, "      ", "contents", "KG", t.contents);
        leaf(out, "      ", "temperature", "", t.temperature);
        out.push_str("    </tank>\n");
    }
    out.push_str("  </propulsion>\n");
}

fn write_flight_control(out: &mut String, fc: &FlightControlDef, tag: &str) {
    let _ = writeln!(out, "  <{tag} name=\"{}\">", fc.name);
    for p in &fc.properties {
        let _ = writeln!(out, "    <property>{p}</property>");
    }
    for rg in &fc.rate_groups {
        let _ = writeln!(
            out,
            "    <rate_group name=\"{}\" rate_Hz=\"{}\"/>",
            rg.name, rg.rate_hz
        );
    }
    for channel in &fc.channels {
        let _ = writeln!(out, "    <channel name=\"{}\">", channel.name);
        for c in &channel.components {
            write_component(out, c);
        }
        for s in &channel.sensors {
            write_sensor(out, s);
        }
        out.push_str("    </channel>\n");
    }
    let _ = writeln!(out, "  </{tag}>");
}

fn write_component(out: &mut String, c: &ComponentDef) {
    let rate_group = if c.rate_group.is_empty() {
        String::new()
    } else {
        format!(" rate_group=\"{}\"", c.rate_group)
    };
    let _ = writeln!(
        out,
        "      <component name=\"{}\" type=\"{}\"{rate_group}>",
        c.name, c.component_type
    );
    for input in &c.inputs {
        let _ = writeln!(out, "        <input>{input}</input>");
    }
    if !c.output.is_empty() {
        let _ = writeln!(out, "        <output>{}</output>", c.output);
    }
    opt_leaf(out, "        ", "gain", "", c.gain);
    opt_leaf(out, "        ", "rate_limit", "", c.rate_limit);
    opt_leaf(out, "        ", "lag", "", c.lag);
    opt_leaf(out, "        ", "width", "", c.width);
    opt_leaf(out, "        ", "bias", "", c.bias);
    if c.clip_min.is_some() || c.clip_max.is_some() {
        out.push_str("        <clipto>\n");
        opt_leaf(out, "          ", "min", "", c.clip_min);
        opt_leaf(out, "          ", "max", "", c.clip_max);
        out.push_str("        </clipto>\n");
    }
    for (i, coeff) in c.coefficients.iter().enumerate() {
        if let Some(v) = coeff {
            leaf(out, "        ", &format!("c{}", i + 1), "", *v);
        }
    }
    if !c.settings.is_empty() {
        out.push_str("        <traverse>\n");
        for s in &c.settings {
            let _ = writeln!(
                out,
                "          <setting><position>{:e}</position><time>{:e}</time></setting>",
                s.position, s.time
            );
        }
        out.push_str("        </traverse>\n");
    }
    if let Some(table) = &c.table {
        write_table(out, "        ", table);
    }
    if let Some(f) = &c.function {
        write_function(out, "        ", f);
    }
    out.push_str("      </component>\n");
}

fn write_sensor(out: &mut String, s: &SensorDef) {
    let rate_group = if s.rate_group.is_empty() {
        String::new()
    } else {
        format!(" rate_group=\"{}\"", s.rate_group)
    };
    let _ = writeln!(out, "      <sensor name=\"{}\"{rate_group}>", s.name);
    if !s.input.is_empty() {
        let _ = writeln!(out, "        <input>{}</input>", s.input);
    }
    leaf(out, "        ", "lag", "", s.lag);
    if !s.noise_variation.is_empty() {
        let _ = writeln!(
            out,
            "        <noise variation=\"{}\">{:e}</noise>",
            s.noise_variation, s.noise_value
        );
    }
    if let Some(bits) = s.quantization_bits {
        out.push_str("        <quantization>\n");
        let _ = writeln!(out, "          <bits>{bits}</bits>");
        leaf(out, "          ", "min", "", s.quantization_min);
        leaf(out, "          ", "max", "", s.quantization_max);
        out.push_str("        </quantization>\n");
    }
    leaf(out, "        ", "drift_rate", "", s.drift_rate);
    leaf(out, "        ", "bias", "", s.bias);
    out.push_str("      </sensor>\n");
}

fn write_aerodynamics(out: &mut String, aero: &Aerodynamics) {
    out.push_str("  <aerodynamics>\n");
    if let Some(limits) = &aero.alpha_limits {
        let _ = writeln!(
            out,
            "    <alphalimits unit=\"RAD\"><min>{:e}</min><max>{:e}</max></alphalimits>",
            limits.min, limits.max
        );
    }
    for axis in &aero.axes {
        let _ = writeln!(out, "    <axis name=\"{}\">", axis.name);
        for f in &axis.functions {
            write_function(out, "      ", f);
        }
        out.push_str("    </axis>\n");
    }
    for f in &aero.functions {
        write_function(out, "    ", f);
    }
    out.push_str("  </aerodynamics>\n");
}

fn write_function(out: &mut String, indent: &str, f: &FunctionDef) {
    let _ = writeln!(out, "{indent}<function name=\"{}\">", f.name);
    if !f.description.is_empty() {
        let _ = writeln!(out, "{indent}  <description>{}</description>", f.description);
    }
    if let Some(op) = &f.operation {
        write_operation(out, &format!("{indent}  "), op);
    }
    if let Some(table) = &f.table {
        write_table(out, &format!("{indent}  "), table);
    }
    let _ = writeln!(out, "{indent}</function>");
}

fn write_operation(out: &mut String, indent: &str, op: &Operation) {
    let tag = op.kind.tag();
    let _ = writeln!(out, "{indent}<{tag}>");
    for p in &op.properties {
        let _ = writeln!(out, "{indent}  <property>{p}</property>");
    }
    for v in &op.values {
        let _ = writeln!(out, "{indent}  <value>{v:e}</value>");
    }
    if let Some(table) = &op.table {
        write_table(out, &format!("{indent}  "), table);
    }
    for nested in &op.nested {
        write_operation(out, &format!("{indent}  "), nested);
    }
    let _ = writeln!(out, "{indent}</{tag}>");
}

fn write_table(out: &mut String, indent: &str, table: &LookupTable) {
    let name_attr = if table.name.is_empty() {
        String::new()
    } else {
        format!(" name=\"{}\"", table.name)
    };
    let _ = writeln!(out, "{indent}<table{name_attr}>");
    for (var, lookup) in table.independent_vars.iter().zip(&table.lookup_types) {
        let lookup_attr = if lookup.is_empty() {
            String::new()
        } else {
            format!(" lookup=\"{lookup}\"")
        };
        let _ = writeln!(out, "{indent}  <independentVar{lookup_attr}>{var}</independentVar>");
    }
    match &table.data {
        TableData::OneD(t) => {
            let _ = writeln!(out, "{indent}  <tableData>");
            for (i, v) in t.indices.iter().zip(&t.values) {
                let _ = writeln!(out, "{indent}    {i:e}  {v:e}");
            }
            let _ = writeln!(out, "{indent}  </tableData>");
        }
        TableData::TwoD(t) => {
            let _ = writeln!(out, "{indent}  <tableData>");
            write_2d_body(out, indent, t);
            let _ = writeln!(out, "{indent}  </tableData>");
        }
        TableData::ThreeD(slices) => {
            for slice in slices {
                let _ = writeln!(out, "{indent}  <tableData breakpoint=\"{:e}\">", slice.breakpoint);
                write_2d_body(out, indent, slice);
                let _ = writeln!(out, "{indent}  </tableData>");
            }
        }
    }
    let _ = writeln!(out, "{indent}</table>");
}

fn write_2d_body(out: &mut String, indent: &str, t: &Table2D) {
    let mut header = format!("{indent}          ");
    for c in &t.col_indices {
        let _ = write!(header, "{c:e}  ");
    }
    let _ = writeln!(out, "{}", header.trim_end());
    for (row_index, row) in t.row_indices.iter().zip(&t.data) {
        let mut line = format!("{indent}    {row_index:e}  ");
        for v in row {
            let _ = write!(line, "{v:e}  ");
        }
        let _ = writeln!(out, "{}", line.trim_end());
    }
}
