//! Turns an [`Artifact`] into a deployable [`Manifest`].
//!
//! Packaging is pure: the endpoint id is derived from the source hash, so an
//! unchanged flow always packages to the same id.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::warn;
use uuid::Uuid;

use nodes::HttpMethod;

use crate::codegen::Artifact;
use crate::models::Graph;

/// Length of the random suffix appended when two sources share an id.
const DISAMBIGUATOR_LEN: usize = 8;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PackagerConfig {
    pub id_prefix: String,
    /// Number of source-hash hex characters kept in the endpoint id.
    pub hash_len: usize,
}

impl Default for PackagerConfig {
    fn default() -> Self {
        Self {
            id_prefix: "ep_".into(),
            hash_len: 16,
        }
    }
}

/// Deployment metadata handed to a publisher.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Manifest {
    pub endpoint_id: String,
    pub method: HttpMethod,
    pub path: String,
    pub source: String,
    pub source_hash: String,
    pub created_from_graph_hash: String,
}

/// Manifests that already exist, consulted to keep endpoint ids unique.
pub trait ManifestIndex {
    fn manifest(&self, endpoint_id: &str) -> Option<&Manifest>;

    /// A manifest carrying exactly this source.
    fn manifest_for_source(&self, source_hash: &str) -> Option<&Manifest>;
}

impl ManifestIndex for HashMap<String, Manifest> {
    fn manifest(&self, endpoint_id: &str) -> Option<&Manifest> {
        self.get(endpoint_id)
    }

    fn manifest_for_source(&self, source_hash: &str) -> Option<&Manifest> {
        self.values().find(|m| m.source_hash == source_hash)
    }
}

#[derive(Debug, Clone, Default)]
pub struct Packager {
    config: PackagerConfig,
}

impl Packager {
    pub fn new(config: PackagerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PackagerConfig {
        &self.config
    }

    /// Build the manifest for `artifact`, generated from `graph`.
    ///
    /// A source that is already indexed keeps its existing endpoint id.  If
    /// the hash-derived id is taken by a different source, a random suffix
    /// is appended.
    pub fn package(&self, artifact: &Artifact, graph: &Graph, index: &dyn ManifestIndex) -> Manifest {
        let source_hash = artifact.source_hash();

        let endpoint_id = match index.manifest_for_source(&source_hash) {
            Some(existing) => existing.endpoint_id.clone(),
            None => self.fresh_id(&source_hash, index),
        };

        Manifest {
            endpoint_id,
            method: artifact.method,
            path: artifact.path.clone(),
            source: artifact.source.clone(),
            source_hash,
            created_from_graph_hash: graph.content_hash(),
        }
    }

    fn fresh_id(&self, source_hash: &str, index: &dyn ManifestIndex) -> String {
        let len = self.config.hash_len.min(source_hash.len());
        let base = format!("{}{}", self.config.id_prefix, &source_hash[..len]);

        let mut id = base.clone();
        while index.manifest(&id).is_some() {
            let suffix = Uuid::new_v4().simple().to_string();
            id = format!("{base}_{}", &suffix[..DISAMBIGUATOR_LEN]);
            warn!(base = %base, endpoint_id = %id, "endpoint id collision, disambiguating");
        }
        id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compile;
    use crate::codegen::GeneratorConfig;
    use crate::models::{Edge, Node};
    use nodes::{NodeConfig, ResponseFormat};

    fn graph(path: &str) -> Graph {
        Graph::new(
            vec![
                Node::new("t", "", NodeConfig::trigger(HttpMethod::Post, path)),
                Node::new("r", "", NodeConfig::response(ResponseFormat::Json)),
            ],
            vec![Edge::new("t", "r")],
        )
    }

    fn artifact(g: &Graph) -> Artifact {
        compile(g, &GeneratorConfig::default()).unwrap()
    }

    #[test]
    fn id_is_derived_from_the_source_hash() {
        let g = graph("/users");
        let a = artifact(&g);
        let index: HashMap<String, Manifest> = HashMap::new();

        let m = Packager::default().package(&a, &g, &index);
        assert_eq!(m.endpoint_id, format!("ep_{}", &a.source_hash()[..16]));
        assert_eq!(m.source_hash, a.source_hash());
        assert_eq!(m.created_from_graph_hash, g.content_hash());
        assert_eq!(m.path, "/users");

        let again = Packager::default().package(&a, &g, &index);
        assert_eq!(again, m);
    }

    #[test]
    fn collision_with_another_source_gets_a_suffix() {
        let g = graph("/users");
        let a = artifact(&g);
        let packager = Packager::default();
        let base = format!("ep_{}", &a.source_hash()[..16]);

        let other = Manifest {
            endpoint_id: base.clone(),
            source_hash: "0".repeat(64),
            ..packager.package(&a, &g, &HashMap::<String, Manifest>::new())
        };
        let index = HashMap::from([(base.clone(), other)]);

        let m = packager.package(&a, &g, &index);
        assert!(m.endpoint_id.starts_with(&format!("{base}_")));
        assert_eq!(m.endpoint_id.len(), base.len() + 1 + DISAMBIGUATOR_LEN);

        // Once indexed, the disambiguated id is stable.
        let mut index = index;
        index.insert(m.endpoint_id.clone(), m.clone());
        assert_eq!(packager.package(&a, &g, &index).endpoint_id, m.endpoint_id);
    }

    #[test]
    fn config_controls_id_shape() {
        let g = graph("/users");
        let a = artifact(&g);
        let packager = Packager::new(PackagerConfig { id_prefix: "fn-".into(), hash_len: 100 });
        let m = packager.package(&a, &g, &HashMap::<String, Manifest>::new());
        assert_eq!(m.endpoint_id, format!("fn-{}", a.source_hash()));
    }

    #[test]
    fn manifest_serialises_camel_case() {
        let g = graph("/users");
        let m = Packager::default().package(&artifact(&g), &g, &HashMap::<String, Manifest>::new());
        let json = serde_json::to_value(&m).unwrap();
        assert!(json.get("endpointId").is_some());
        assert!(json.get("createdFromGraphHash").is_some());
        assert_eq!(json["method"], "POST");
    }
}
