use crate::indexer::FileIndex;
use mirrordiff_common::PathPair;
use tracing::debug;

/// Partition the union of relative paths into local-only, remote-only and
/// both-present pairs, sorted by relative path.
///
/// Sorting fixes the submission order for reproducibility; completion order
/// is unconstrained.
pub fn classify_pairs(local: &FileIndex, remote: &FileIndex) -> Vec<PathPair> {
    let mut all_paths: Vec<&String> = local
        .entries()
        .keys()
        .chain(remote.entries().keys())
        .collect();
    all_paths.sort();
    all_paths.dedup();

    let pairs: Vec<PathPair> = all_paths
        .into_iter()
        .map(|rel| match (local.get(rel), remote.get(rel)) {
            (Some(l), Some(r)) => PathPair::Both {
                rel: rel.clone(),
                local: l.clone(),
                remote: r.clone(),
            },
            (Some(_), None) => PathPair::LocalOnly { rel: rel.clone() },
            (None, Some(_)) => PathPair::RemoteOnly { rel: rel.clone() },
            (None, None) => unreachable!("path came from one of the indexes"),
        })
        .collect();

    debug!("Classified {} path pairs", pairs.len());
    pairs
}
