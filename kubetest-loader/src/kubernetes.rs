use std::collections::BTreeMap;

use async_trait::async_trait;
use serde_json::Value;
use tracing::warn;

use kubetest_api::v1::{
    TestDefinitionSpec,
    TestResourceSpec,
    TestSpecEntry,
};
use kubetest_core::constants::KUBETEST_API_VERSION;
use kubetest_core::objectref::RefSyntax;
use kubetest_core::prelude::*;
use kubetest_provisioner::Provisioner;

use crate::convert::{
    decode_manifests,
    expand_test_spec,
};
use crate::errors::LoaderError;
use crate::loader::Loader;

/// Cluster realization of [`Loader`]: `location` is a namespace, test definitions come from
/// `go-kubetest.io/v1:TestDefinition` custom resources, and each referenced manifest name
/// dereferences to a `go-kubetest.io/v1:TestResource` whose `spec.data` is a multi-document YAML
/// blob (spec §4.2).
///
/// The original's Kubernetes loader (`examples/original_source/pkg/loader/kubernetes.go`) was an
/// unimplemented stub; this completes it, matching `FilesystemLoader`'s per-test failure
/// isolation.
pub struct ClusterLoader<P> {
    provisioner: P,
}

impl<P: Provisioner> ClusterLoader<P> {
    pub fn new(provisioner: P) -> ClusterLoader<P> {
        ClusterLoader { provisioner }
    }
}

#[async_trait]
impl<P: Provisioner> Loader for ClusterLoader<P> {
    async fn load_tests(
        &mut self,
        location: &str,
        selectors: &BTreeMap<String, Value>,
    ) -> anyhow::Result<Vec<TestDefinition>> {
        let definition_ref = ObjectRef::namespaced(KUBETEST_API_VERSION, "TestDefinition", location, "");
        let manifests = self.provisioner.list_with_selectors(&definition_ref, selectors).await?;

        let mut tests = Vec::new();
        for manifest in manifests {
            let spec = match manifest.data.get("spec") {
                Some(raw) => raw,
                None => {
                    warn!("TestDefinition {} has no spec, skipping", manifest.name_any());
                    continue;
                },
            };
            let parsed: TestDefinitionSpec = match serde_json::from_value(spec.clone()) {
                Ok(p) => p,
                Err(e) => {
                    warn!("malformed TestDefinition {}: {e}", manifest.name_any());
                    continue;
                },
            };

            for raw in &parsed.tests {
                match self.expand_one(location, raw).await {
                    Ok(def) => tests.push(def),
                    Err(e) => warn!("dropping test {} from {}: {e}", raw.name, manifest.name_any()),
                }
            }
        }

        Ok(tests)
    }

    async fn load_manifests(&mut self, reference: &str) -> anyhow::Result<Vec<DynamicObject>> {
        self.load_manifests_in(DEFAULT_NAMESPACE, reference).await
    }
}

impl<P: Provisioner> ClusterLoader<P> {
    async fn expand_one(&mut self, namespace: &str, raw: &TestSpecEntry) -> anyhow::Result<TestDefinition> {
        let mut objects = Vec::with_capacity(raw.resources.len());
        for name in &raw.resources {
            objects.extend(self.load_manifests_in(namespace, name).await?);
        }

        expand_test_spec(raw, objects, RefSyntax::Colon)
    }

    async fn load_manifests_in(&mut self, namespace: &str, reference: &str) -> anyhow::Result<Vec<DynamicObject>> {
        let resource_ref =
            ObjectRef::namespaced(KUBETEST_API_VERSION, "TestResource", namespace, reference);
        let mut selectors = BTreeMap::new();
        selectors.insert("metadata.name".to_string(), Value::String(reference.to_string()));
        let matches = self.provisioner.list_with_selectors(&resource_ref, &selectors).await?;
        let manifest = matches
            .into_iter()
            .next()
            .ok_or_else(|| LoaderError::manifest_unresolved(&format!("{namespace}/{reference}")))?;

        let spec = manifest
            .data
            .get("spec")
            .ok_or_else(|| LoaderError::manifest_unresolved(&format!("{reference}: no spec")))?;
        let parsed: TestResourceSpec = serde_json::from_value(spec.clone())
            .map_err(|e| LoaderError::decode_failed(&e.to_string()))?;

        decode_manifests(&parsed.data)
    }
}

#[cfg(test)]
mod tests {
    use kube::api::ObjectMeta;
    use kube::api::TypeMeta;
    use kubetest_provisioner::MockProvisioner;
    use serde_json::json;

    use super::*;

    fn named(kind: &str, name: &str, data: Value) -> DynamicObject {
        DynamicObject {
            types: Some(TypeMeta { api_version: KUBETEST_API_VERSION.into(), kind: kind.into() }),
            metadata: ObjectMeta { name: Some(name.into()), namespace: Some("default".into()), ..Default::default() },
            data,
        }
    }

    #[tokio::test]
    async fn test_load_tests_drops_malformed_definition_and_keeps_others() {
        let mut mock = MockProvisioner::new();
        mock.expect_list_with_selectors()
            .withf(|r, _| r.kind == "TestDefinition")
            .returning(|_, _| {
                Ok(vec![
                    named("TestDefinition", "broken", json!({"spec": {"tests": "not-a-list"}})),
                    named(
                        "TestDefinition",
                        "good",
                        json!({"spec": {"tests": [{"name": "smoke", "resources": []}]}}),
                    ),
                ])
            });

        let mut loader = ClusterLoader::new(mock);
        let tests = loader.load_tests("default", &BTreeMap::new()).await.unwrap();
        assert_eq!(tests.len(), 1);
        assert_eq!(tests[0].name, "smoke");
    }

    #[tokio::test]
    async fn test_load_manifests_in_dereferences_test_resource() {
        let mut mock = MockProvisioner::new();
        mock.expect_list_with_selectors()
            .withf(|r, selectors| {
                r.kind == "TestResource" && selectors.get("metadata.name") == Some(&Value::String("pod-a".into()))
            })
            .returning(|_, _| {
                Ok(vec![named(
                    "TestResource",
                    "pod-a",
                    json!({"spec": {"data": "apiVersion: v1\nkind: Pod\nmetadata:\n  name: a\n"}}),
                )])
            });

        let mut loader = ClusterLoader::new(mock);
        let objs = loader.load_manifests_in("default", "pod-a").await.unwrap();
        assert_eq!(objs.len(), 1);
        assert_eq!(objs[0].metadata.name.as_deref(), Some("a"));
    }

    /// Regression test: the list call must scope by name, not rely on picking the first result
    /// out of every `TestResource` in the namespace.
    #[tokio::test]
    async fn test_load_manifests_in_filters_by_name() {
        let mut mock = MockProvisioner::new();
        mock.expect_list_with_selectors().withf(|r, _| r.kind == "TestResource").returning(|_, selectors| {
            let wanted = selectors.get("metadata.name").and_then(Value::as_str).unwrap_or_default();
            let all = [
                ("pod-manifest", "apiVersion: v1\nkind: Pod\nmetadata:\n  name: a\n"),
                ("configmap-manifest", "apiVersion: v1\nkind: ConfigMap\nmetadata:\n  name: b\n"),
            ];
            Ok(all
                .into_iter()
                .filter(|(name, _)| *name == wanted)
                .map(|(name, data)| named("TestResource", name, json!({"spec": {"data": data}})))
                .collect())
        });

        let mut loader = ClusterLoader::new(mock);
        let objs = loader.load_manifests_in("default", "configmap-manifest").await.unwrap();
        assert_eq!(objs.len(), 1);
        assert_eq!(objs[0].types.as_ref().map(|t| t.kind.as_str()), Some("ConfigMap"));
    }
}
