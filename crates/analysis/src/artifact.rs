use crate::error::{AnalysisError, Result};
use crate::geocode::LocationVerification;
use crate::result::{AnalysisResult, NodeView};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Serialize)]
struct GraphEdge<'a> {
    source: &'a str,
    target: &'a str,
    weight: f64,
    contexts: &'a [String],
}

#[derive(Serialize)]
struct GraphArtifact<'a> {
    nodes: Vec<NodeView>,
    edges: Vec<GraphEdge<'a>>,
    location_checks: &'a [LocationVerification],
}

/// Write the node/edge view of `result`, with any location checks, to
/// `entity_graph_<uuid>.json` inside `output_dir`, creating the directory if
/// needed.
pub fn write_graph_artifact(result: &AnalysisResult, output_dir: &Path) -> Result<PathBuf> {
    let artifact_error = |path: &Path, source: std::io::Error| AnalysisError::Artifact {
        path: path.to_path_buf(),
        source,
    };

    std::fs::create_dir_all(output_dir).map_err(|e| artifact_error(output_dir, e))?;

    let path = output_dir.join(format!("entity_graph_{}.json", uuid::Uuid::new_v4()));
    let artifact = GraphArtifact {
        nodes: result.nodes(),
        edges: result
            .relationships
            .iter()
            .map(|r| GraphEdge {
                source: &r.entity_a,
                target: &r.entity_b,
                weight: r.strength,
                contexts: &r.contexts,
            })
            .collect(),
        location_checks: &result.location_checks,
    };

    let json = serde_json::to_string_pretty(&artifact)
        .map_err(|e| artifact_error(&path, std::io::Error::other(e)))?;
    std::fs::write(&path, json).map_err(|e| artifact_error(&path, e))?;

    info!(path = ?path, nodes = artifact.nodes.len(), edges = artifact.edges.len(), "graph artifact written");
    Ok(path)
}
