//! Hand-off of packaged endpoints to an external publisher.

use std::collections::HashMap;

use async_trait::async_trait;
use serde::Serialize;
use tokio::sync::Mutex;
use tracing::{error, info, instrument};

use crate::codegen::Artifact;
use crate::models::Graph;
use crate::package::{Manifest, ManifestIndex, Packager};
use crate::{DeploymentError, PublishError};

/// The file-system or hosting layer that makes a manifest live.
#[async_trait]
pub trait Publisher: Send + Sync {
    /// Publish `manifest` and return the URL it is served at.
    async fn publish(&self, manifest: &Manifest) -> Result<String, PublishError>;
}

/// Result of a successful deploy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Deployment {
    pub manifest: Manifest,
    pub url: String,
    /// The endpoint was already live; the publisher was not called.
    pub reused: bool,
}

#[derive(Debug, Clone)]
struct PublishedEndpoint {
    manifest: Manifest,
    url: String,
}

impl ManifestIndex for HashMap<String, PublishedEndpoint> {
    fn manifest(&self, endpoint_id: &str) -> Option<&Manifest> {
        self.get(endpoint_id).map(|p| &p.manifest)
    }

    fn manifest_for_source(&self, source_hash: &str) -> Option<&Manifest> {
        self.values()
            .map(|p| &p.manifest)
            .find(|m| m.source_hash == source_hash)
    }
}

/// Packages artifacts and publishes each endpoint at most once.
pub struct Deployer<P> {
    publisher: P,
    packager: Packager,
    published: Mutex<HashMap<String, PublishedEndpoint>>,
}

impl<P: Publisher> Deployer<P> {
    pub fn new(publisher: P, packager: Packager) -> Self {
        Self {
            publisher,
            packager,
            published: Mutex::new(HashMap::new()),
        }
    }

    pub fn publisher(&self) -> &P {
        &self.publisher
    }

    /// Manifests published so far, ordered by endpoint id.
    pub async fn endpoints(&self) -> Vec<Manifest> {
        let published = self.published.lock().await;
        let mut manifests: Vec<Manifest> = published.values().map(|p| p.manifest.clone()).collect();
        manifests.sort_by(|a, b| a.endpoint_id.cmp(&b.endpoint_id));
        manifests
    }

    /// Package `artifact` and publish it unless it is already live.
    ///
    /// Deploys are serialised, so concurrent requests for the same source
    /// publish once.  A publisher failure records nothing; retrying is safe.
    #[instrument(skip_all, fields(method = %artifact.method, path = %artifact.path))]
    pub async fn deploy(&self, artifact: &Artifact, graph: &Graph) -> Result<Deployment, DeploymentError> {
        let mut published = self.published.lock().await;
        let manifest = self.packager.package(artifact, graph, &*published);

        if let Some(existing) = published.get(&manifest.endpoint_id) {
            info!(endpoint_id = %manifest.endpoint_id, url = %existing.url, "endpoint already live");
            return Ok(Deployment {
                manifest: existing.manifest.clone(),
                url: existing.url.clone(),
                reused: true,
            });
        }

        let url = match self.publisher.publish(&manifest).await {
            Ok(url) => url,
            Err(source) => {
                error!(endpoint_id = %manifest.endpoint_id, error = %source, "publish failed");
                return Err(DeploymentError::Publish {
                    endpoint_id: manifest.endpoint_id,
                    source,
                });
            }
        };

        info!(endpoint_id = %manifest.endpoint_id, %url, "endpoint published");
        published.insert(
            manifest.endpoint_id.clone(),
            PublishedEndpoint {
                manifest: manifest.clone(),
                url: url.clone(),
            },
        );

        Ok(Deployment {
            manifest,
            url,
            reused: false,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codegen::GeneratorConfig;
    use crate::compile;
    use crate::mock::MockPublisher;
    use crate::models::{Edge, Node};
    use nodes::{HttpMethod, NodeConfig, ResponseFormat};

    fn graph(path: &str) -> Graph {
        Graph::new(
            vec![
                Node::new("t", "", NodeConfig::trigger(HttpMethod::Get, path)),
                Node::new("r", "", NodeConfig::response(ResponseFormat::Json)),
            ],
            vec![Edge::new("t", "r")],
        )
    }

    #[tokio::test]
    async fn unchanged_source_is_published_once() {
        let deployer = Deployer::new(MockPublisher::new("https://api.test"), Packager::default());
        let g = graph("/ping");
        let artifact = compile(&g, &GeneratorConfig::default()).unwrap();

        let first = deployer.deploy(&artifact, &g).await.unwrap();
        let second = deployer.deploy(&artifact, &g).await.unwrap();

        assert!(!first.reused);
        assert!(second.reused);
        assert_eq!(first.manifest.endpoint_id, second.manifest.endpoint_id);
        assert_eq!(first.url, second.url);
        assert_eq!(first.url, format!("https://api.test/{}", first.manifest.endpoint_id));
        assert_eq!(deployer.publisher().call_count(), 1);
    }

    #[tokio::test]
    async fn changed_source_gets_a_new_endpoint() {
        let deployer = Deployer::new(MockPublisher::new("https://api.test"), Packager::default());
        let (g1, g2) = (graph("/a"), graph("/b"));
        let a1 = compile(&g1, &GeneratorConfig::default()).unwrap();
        let a2 = compile(&g2, &GeneratorConfig::default()).unwrap();

        let d1 = deployer.deploy(&a1, &g1).await.unwrap();
        let d2 = deployer.deploy(&a2, &g2).await.unwrap();

        assert_ne!(d1.manifest.endpoint_id, d2.manifest.endpoint_id);
        assert_eq!(deployer.endpoints().await.len(), 2);
        assert_eq!(deployer.publisher().call_count(), 2);
    }

    #[tokio::test]
    async fn failed_publish_leaves_no_record() {
        let publisher = MockPublisher::new("https://api.test");
        publisher.set_failing(true);
        let deployer = Deployer::new(publisher, Packager::default());
        let g = graph("/ping");
        let artifact = compile(&g, &GeneratorConfig::default()).unwrap();

        let err = deployer.deploy(&artifact, &g).await.unwrap_err();
        assert!(matches!(err, DeploymentError::Publish { .. }));
        assert!(deployer.endpoints().await.is_empty());

        deployer.publisher().set_failing(false);
        let retry = deployer.deploy(&artifact, &g).await.unwrap();
        assert!(!retry.reused);
        assert_eq!(deployer.publisher().call_count(), 2);
    }
}
