//! Readers for the plain-text node files exported from the solver
//!
//! All files are header-less and comma separated. Node-set and location
//! files carry one `node_id, x, y, z` row per node; id-list files carry one
//! node id per row; connectivity files carry one element per row.

use std::fs;
use std::path::Path;

use crate::error::{LinResult, LinearizationError};

use super::{ElementConnectivity, Node, NodeId, NodeLocations, NodeSet};

/// Read a boundary node set file
pub fn read_node_set(path: impl AsRef<Path>) -> LinResult<NodeSet> {
    let path = path.as_ref();
    let text = fs::read_to_string(path)?;
    Ok(NodeSet::new(parse_node_rows(&text, path)?))
}

/// Read the coordinate table of all nodes
pub fn read_node_locations(path: impl AsRef<Path>) -> LinResult<NodeLocations> {
    let path = path.as_ref();
    let text = fs::read_to_string(path)?;
    Ok(parse_node_rows(&text, path)?.into_iter().collect())
}

/// Read a list of node ids, using the first column of each row
pub fn read_node_ids(path: impl AsRef<Path>) -> LinResult<Vec<NodeId>> {
    let path = path.as_ref();
    let text = fs::read_to_string(path)?;
    let mut ids = Vec::new();
    for (line_no, fields) in rows(&text) {
        match parse_id(fields[0]) {
            Some(id) => ids.push(id),
            None if line_no == 1 => continue,
            None => return Err(parse_error(path, line_no, format!("invalid node id '{}'", fields[0]))),
        }
    }
    Ok(ids)
}

/// Read element connectivity, one element per row
pub fn read_connectivity(path: impl AsRef<Path>) -> LinResult<ElementConnectivity> {
    let path = path.as_ref();
    let text = fs::read_to_string(path)?;
    let mut elements = Vec::new();
    for (line_no, fields) in rows(&text) {
        let element = fields
            .iter()
            .map(|f| parse_id(f))
            .collect::<Option<Vec<_>>>()
            .ok_or_else(|| parse_error(path, line_no, "non-integer node id in element".into()))?;
        elements.push(element);
    }
    Ok(ElementConnectivity::new(elements))
}

/// Parse `node_id, x, y, z` rows. A non-numeric first row is taken as a header.
pub fn parse_node_rows(text: &str, path: &Path) -> LinResult<Vec<Node>> {
    let mut nodes = Vec::new();
    for (line_no, fields) in rows(text) {
        if fields.len() < 4 {
            return Err(parse_error(
                path,
                line_no,
                format!("expected 4 columns (node_id, x, y, z), found {}", fields.len()),
            ));
        }
        let id = match parse_id(fields[0]) {
            Some(id) => id,
            None if line_no == 1 => continue,
            None => {
                return Err(parse_error(path, line_no, format!("invalid node id '{}'", fields[0])))
            }
        };
        let mut xyz = [0.0; 3];
        for (slot, field) in xyz.iter_mut().zip(&fields[1..4]) {
            *slot = field
                .parse::<f64>()
                .map_err(|e| parse_error(path, line_no, format!("invalid coordinate '{field}': {e}")))?;
        }
        nodes.push(Node::new(id, xyz[0], xyz[1], xyz[2]));
    }
    Ok(nodes)
}

/// Non-empty rows with their 1-based line numbers, split on commas
fn rows(text: &str) -> impl Iterator<Item = (usize, Vec<&str>)> {
    text.lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(i, line)| (i + 1, line.split(',').map(str::trim).collect()))
}

/// Node ids may be written as floats (`104.0`) by dataframe exports
fn parse_id(field: &str) -> Option<NodeId> {
    if let Ok(id) = field.parse::<NodeId>() {
        return Some(id);
    }
    let value = field.parse::<f64>().ok()?;
    if value.fract() == 0.0 && value >= 0.0 && value <= NodeId::MAX as f64 {
        Some(value as NodeId)
    } else {
        None
    }
}

fn parse_error(path: &Path, line: usize, message: String) -> LinearizationError {
    LinearizationError::Parse {
        path: path.to_path_buf(),
        line,
        message,
    }
}
