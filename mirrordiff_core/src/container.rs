use mirrordiff_common::{MirrorDiffError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

/// Magic prefix identifying a dataset container file
pub const MAGIC: [u8; 4] = *b"DSC1";

/// One node of a hierarchical dataset container: groups hold named children,
/// leaves hold numeric datasets.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum DataNode {
    Group(BTreeMap<String, DataNode>),
    Dataset(Vec<f64>),
}

impl DataNode {
    pub fn group(entries: Vec<(&str, DataNode)>) -> Self {
        DataNode::Group(
            entries
                .into_iter()
                .map(|(k, v)| (k.to_string(), v))
                .collect(),
        )
    }

    pub fn dataset(values: Vec<f64>) -> Self {
        DataNode::Dataset(values)
    }
}

/// Approximate-equality tolerances for dataset values
#[derive(Debug, Clone, Copy)]
pub struct Tolerance {
    pub rtol: f64,
    pub atol: f64,
}

/// Decode a container file, validating the magic prefix
pub fn read_container(path: &Path) -> Result<DataNode> {
    let bytes = fs::read(path)?;
    if bytes.len() < MAGIC.len() || bytes[..MAGIC.len()] != MAGIC {
        return Err(MirrorDiffError::Container(format!(
            "{}: not a dataset container",
            path.display()
        )));
    }
    bincode::deserialize(&bytes[MAGIC.len()..])
        .map_err(|e| MirrorDiffError::Container(format!("{}: {}", path.display(), e)))
}

/// Encode a container file with the magic prefix
pub fn write_container(path: &Path, root: &DataNode) -> Result<()> {
    let body =
        bincode::serialize(root).map_err(|e| MirrorDiffError::Serialization(e.to_string()))?;
    let mut bytes = MAGIC.to_vec();
    bytes.extend_from_slice(&body);
    fs::write(path, bytes)?;
    Ok(())
}

/// Recursively compare two containers.
///
/// Returns the first structural difference found, or `None` when the trees
/// are equal within tolerance. NaN compares equal to NaN.
pub fn compare_containers(left: &DataNode, right: &DataNode, tol: Tolerance) -> Option<String> {
    compare_nodes(left, right, "", tol)
}

fn compare_nodes(left: &DataNode, right: &DataNode, path: &str, tol: Tolerance) -> Option<String> {
    match (left, right) {
        (DataNode::Group(lg), DataNode::Group(rg)) => {
            for (key, lnode) in lg {
                let child = format!("{}/{}", path, key);
                match rg.get(key) {
                    None => return Some(format!("missing on remote side: {}", child)),
                    Some(rnode) => {
                        if let Some(msg) = compare_nodes(lnode, rnode, &child, tol) {
                            return Some(msg);
                        }
                    }
                }
            }
            for key in rg.keys() {
                if !lg.contains_key(key) {
                    return Some(format!("only on remote side: {}/{}", path, key));
                }
            }
            None
        }
        (DataNode::Dataset(ld), DataNode::Dataset(rd)) => {
            if ld.len() != rd.len() {
                return Some(format!(
                    "dataset length differs: {} ({} vs {})",
                    display_path(path),
                    ld.len(),
                    rd.len()
                ));
            }
            for (a, b) in ld.iter().zip(rd.iter()) {
                if !close(*a, *b, tol) {
                    return Some(format!("dataset differs: {}", display_path(path)));
                }
            }
            None
        }
        _ => Some(format!("node kind differs: {}", display_path(path))),
    }
}

fn display_path(path: &str) -> &str {
    if path.is_empty() {
        "/"
    } else {
        path
    }
}

/// `|a - b| <= atol + rtol * |b|`, with NaN equal to NaN
fn close(a: f64, b: f64, tol: Tolerance) -> bool {
    if a == b {
        return true;
    }
    if a.is_nan() && b.is_nan() {
        return true;
    }
    (a - b).abs() <= tol.atol + tol.rtol * b.abs()
}
