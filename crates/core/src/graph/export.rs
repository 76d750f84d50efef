//! Configuration dumps of a frozen system.
//!
//! `to_json` nests every object under its parent by name, with its type, parameters, and the
//! paths of the peers bound to each port. `to_dot` renders the port graph for Graphviz.

use std::fmt::Write as _;

use serde_json::{Map, Value, json};

use super::{FrozenSystem, ObjectId, ObjectKind, PortRef, SystemGraph};

/// Renders the system as a nested JSON document rooted at `root`.
pub fn to_json(system: &FrozenSystem) -> Result<Value, serde_json::Error> {
    object_json(system.graph(), system.root())
}

fn path_or_null(graph: &SystemGraph, id: Option<ObjectId>) -> Value {
    id.map_or(Value::Null, |id| Value::String(graph.path(id)))
}

fn params(graph: &SystemGraph, kind: &ObjectKind) -> Result<Map<String, Value>, serde_json::Error> {
    let value = match kind {
        ObjectKind::Root { full_system } => json!({ "full_system": full_system }),
        ObjectKind::System(p) => json!({
            "mem_mode": p.mem_mode,
            "mem_ranges": p.mem_ranges.iter().map(ToString::to_string).collect::<Vec<_>>(),
            "cache_line_size": p.cache_line_size,
            "clk_domain": path_or_null(graph, p.clk_domain),
        }),
        ObjectKind::VoltageDomain { voltage } => json!({ "voltage": voltage.to_string() }),
        ObjectKind::SrcClockDomain {
            clock,
            voltage_domain,
        } => json!({
            "clock": clock.to_string(),
            "period_ticks": clock.period_ticks(),
            "voltage_domain": graph.path(*voltage_domain),
        }),
        ObjectKind::Cpu(p) => json!({
            "cpu_id": p.cpu_id,
            "isa": p.isa,
            "clk_domain": path_or_null(graph, p.clk_domain),
            "numThreads": p.num_threads,
            "workload": serde_json::to_value(&p.workload)?,
            "branchPred": p.branch_pred,
            "indirectBranchPred": p.indirect_branch_pred,
            "checker": p.checker,
            "simpoint_interval": p.simpoint_interval,
            "wait_for_remote_gdb": p.wait_gdb,
        }),
        ObjectKind::Interrupts => json!({}),
        ObjectKind::Cache(p) => json!({
            "preset": p.preset,
            "size": p.size.to_string(),
            "assoc": p.assoc,
            "tag_latency": p.tag_latency,
            "data_latency": p.data_latency,
            "response_latency": p.response_latency,
            "mshrs": p.mshrs,
            "tgts_per_mshr": p.tgts_per_mshr,
            "replacement_policy": p.replacement.name(),
        }),
        ObjectKind::XBar(p) => json!({
            "width": p.width,
            "frontend_latency": p.frontend_latency,
            "forward_latency": p.forward_latency,
            "response_latency": p.response_latency,
        }),
        ObjectKind::MemCtrl => json!({}),
        ObjectKind::MemInterface { part, range } => json!({
            "range": range.to_string(),
            "timing": serde_json::to_value(part.timing)?,
        }),
        ObjectKind::Workload(w) => json!({
            "binary": w.binary.display().to_string(),
            "isa": w.isa,
        }),
    };
    Ok(match value {
        Value::Object(map) => map,
        _ => Map::new(),
    })
}

fn object_json(graph: &SystemGraph, id: ObjectId) -> Result<Value, serde_json::Error> {
    let Ok(obj) = graph.object(id) else {
        return Ok(Value::Null);
    };

    let mut map = Map::new();
    let _ = map.insert("name".into(), Value::String(obj.name.clone()));
    let _ = map.insert("path".into(), Value::String(graph.path(id)));
    let _ = map.insert("type".into(), Value::String(obj.kind.type_name().into()));
    map.extend(params(graph, &obj.kind)?);

    for spec in obj.kind.ports() {
        let port = PortRef {
            object: id,
            port: spec.name,
        };
        let peers: Vec<Value> = graph
            .peers(port)
            .map(|p| Value::String(graph.port_path(p)))
            .collect();
        let value = if spec.vector {
            Value::Array(peers)
        } else {
            peers.into_iter().next().unwrap_or(Value::Null)
        };
        let _ = map.insert(spec.name.into(), value);
    }

    for child in graph.children(id) {
        if let Ok(c) = graph.object(child) {
            let _ = map.insert(c.name.clone(), object_json(graph, child)?);
        }
    }
    Ok(Value::Object(map))
}

/// Renders the port graph in Graphviz DOT format, one edge per connection.
pub fn to_dot(system: &FrozenSystem) -> String {
    let graph = system.graph();
    let mut out = String::from("digraph system {\n    rankdir=TB;\n    node [shape=box];\n");

    for (id, obj) in graph.objects() {
        if obj.kind.ports().is_empty() {
            continue;
        }
        let path = graph.path(id);
        let _ = writeln!(
            out,
            "    \"{path}\" [label=\"{path}\\n{}\"];",
            obj.kind.type_name()
        );
    }
    for edge in graph.edges() {
        let _ = writeln!(
            out,
            "    \"{}\" -> \"{}\" [label=\"{} -> {}\"];",
            graph.path(edge.requestor.object),
            graph.path(edge.responder.object),
            edge.requestor.port,
            edge.responder.port
        );
    }
    out.push_str("}\n");
    out
}
