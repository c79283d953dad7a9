//! Turns a `--generate-csv` capture log into something a plotting tool can draw.
use clap::ValueEnum;
use serde::Serialize;
use std::collections::HashMap;
use std::fmt::Write as _;
use std::io::Read;

/// Column names accepted as an optional first line of the CSV.
const HEADER: [&str; 3] = ["source", "destination", "protocol"];

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum PlotFormat {
    /// Graphviz directed graph of host connections
    Dot,
    /// Sankey node/link JSON
    Sankey,
}

/// One line of CSV output: `source,destination,PROTO:port`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Connection {
    pub source: String,
    pub destination: String,
    pub protocol: String,
}

#[derive(Debug, Serialize)]
pub struct SankeyLink {
    pub source: usize,
    pub target: usize,
    pub value: u32,
    pub label: String,
}

#[derive(Debug, Serialize)]
pub struct Sankey {
    pub nodes: Vec<String>,
    pub links: Vec<SankeyLink>,
}

/// Reads connections, with or without a `source,destination,protocol` header line.
///
/// With a header the columns may come in any order. Rows with too few fields are skipped.
pub fn read_connections<R: Read>(input: R) -> Result<Vec<Connection>, csv::Error> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(input);

    let mut columns = [0, 1, 2];
    let mut connections = Vec::new();

    for (line, record) in reader.records().enumerate() {
        let record = record?;

        if line == 0 && is_header(&record) {
            for (slot, name) in columns.iter_mut().zip(HEADER) {
                *slot = record.iter().position(|field| field == name).unwrap_or(*slot);
            }
            continue;
        }

        let field = |i: usize| record.get(columns[i]).map(str::to_string);
        match (field(0), field(1), field(2)) {
            (Some(source), Some(destination), Some(protocol)) => connections.push(Connection {
                source,
                destination,
                protocol,
            }),
            _ => log::warn!("Skipping short CSV row {}: {:?}", line + 1, record),
        }
    }

    Ok(connections)
}

fn is_header(record: &csv::StringRecord) -> bool {
    HEADER.iter().all(|name| record.iter().any(|field| field == *name))
}

/// Graphviz source, one edge per connection labelled with `PROTO:port`.
pub fn to_dot(connections: &[Connection]) -> String {
    let mut dot = String::from("digraph connections {\n");
    for conn in connections {
        let _ = writeln!(
            dot,
            "    \"{}\" -> \"{}\" [label=\"{}\"];",
            escape(&conn.source),
            escape(&conn.destination),
            escape(&conn.protocol)
        );
    }
    dot.push_str("}\n");
    dot
}

fn escape(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}

/// Nodes are hosts in order of first appearance; every connection is a link of weight 1.
pub fn to_sankey(connections: &[Connection]) -> Sankey {
    let mut nodes: Vec<String> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut node = |host: &str| -> usize {
        *index.entry(host.to_string()).or_insert_with(|| {
            nodes.push(host.to_string());
            nodes.len() - 1
        })
    };

    let links = connections
        .iter()
        .map(|conn| SankeyLink {
            source: node(&conn.source),
            target: node(&conn.destination),
            value: 1,
            label: conn.protocol.clone(),
        })
        .collect();

    Sankey { nodes, links }
}

/// Renders `connections` in the requested format.
pub fn render(connections: &[Connection], format: PlotFormat) -> serde_json::Result<String> {
    match format {
        PlotFormat::Dot => Ok(to_dot(connections)),
        PlotFormat::Sankey => serde_json::to_string_pretty(&to_sankey(connections)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const NO_HEADER: &str = "10.0.0.1,93.184.216.34,TCP:443\n10.0.0.1,8.8.8.8,UDP:53\n";
    const WITH_HEADER: &str = "source,destination,protocol\n10.0.0.1,93.184.216.34,TCP:443\n10.0.0.1,8.8.8.8,UDP:53\n";

    fn conn(source: &str, destination: &str, protocol: &str) -> Connection {
        Connection {
            source: source.to_string(),
            destination: destination.to_string(),
            protocol: protocol.to_string(),
        }
    }

    #[test]
    fn reads_without_header() {
        let rows = read_connections(NO_HEADER.as_bytes()).unwrap();
        assert_eq!(
            rows,
            vec![conn("10.0.0.1", "93.184.216.34", "TCP:443"), conn("10.0.0.1", "8.8.8.8", "UDP:53")]
        );
    }

    #[test]
    fn reads_with_header() {
        let rows = read_connections(WITH_HEADER.as_bytes()).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0], conn("10.0.0.1", "93.184.216.34", "TCP:443"));
    }

    #[test]
    fn header_columns_in_any_order() {
        let input = "protocol,source,destination\nUDP:53,10.0.0.1,8.8.8.8\n";
        let rows = read_connections(input.as_bytes()).unwrap();
        assert_eq!(rows, vec![conn("10.0.0.1", "8.8.8.8", "UDP:53")]);
    }

    #[test]
    fn short_rows_are_skipped() {
        let input = "10.0.0.1,8.8.8.8\n10.0.0.1,8.8.8.8,UDP:53\n";
        let rows = read_connections(input.as_bytes()).unwrap();
        assert_eq!(rows, vec![conn("10.0.0.1", "8.8.8.8", "UDP:53")]);
    }

    #[test]
    fn dot_edges() {
        let rows = read_connections(WITH_HEADER.as_bytes()).unwrap();
        assert_eq!(
            to_dot(&rows),
            "digraph connections {\n    \"10.0.0.1\" -> \"93.184.216.34\" [label=\"TCP:443\"];\n    \"10.0.0.1\" -> \"8.8.8.8\" [label=\"UDP:53\"];\n}\n"
        );
    }

    #[test]
    fn sankey_nodes_and_links() {
        let rows = read_connections(NO_HEADER.as_bytes()).unwrap();
        let json = render(&rows, PlotFormat::Sankey).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(value["nodes"], serde_json::json!(["10.0.0.1", "93.184.216.34", "8.8.8.8"]));
        assert_eq!(value["links"][0]["source"], 0);
        assert_eq!(value["links"][0]["target"], 1);
        assert_eq!(value["links"][1]["target"], 2);
        assert_eq!(value["links"][1]["value"], 1);
        assert_eq!(value["links"][1]["label"], "UDP:53");
    }

    #[test]
    fn same_rows_with_or_without_header() {
        let with = read_connections(WITH_HEADER.as_bytes()).unwrap();
        let without = read_connections(NO_HEADER.as_bytes()).unwrap();
        assert_eq!(to_dot(&with), to_dot(&without));
    }
}
