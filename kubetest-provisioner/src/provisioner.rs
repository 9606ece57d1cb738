use std::collections::BTreeMap;

use async_trait::async_trait;
#[cfg(feature = "mock")]
use mockall::automock;
use serde_json::Value;

use kubetest_core::prelude::*;

/// Capability-typed adapter over the cluster (spec §4.1): resolve a (group, version, kind) to a
/// REST resource, apply/delete an opaque object, list by field+label selectors with namespace
/// scoping. The one place that crosses the static<->dynamic boundary; every other component
/// treats resources as `(apiVersion, kind, namespace, name)` plus an opaque payload.
#[cfg_attr(feature = "mock", automock)]
#[async_trait]
pub trait Provisioner: Send {
    async fn create_or_update(&mut self, obj: &DynamicObject) -> anyhow::Result<()>;
    async fn delete(&mut self, obj: &DynamicObject) -> anyhow::Result<()>;
    async fn list_with_selectors(
        &mut self,
        r: &ObjectRef,
        selectors: &BTreeMap<String, Value>,
    ) -> anyhow::Result<Vec<DynamicObject>>;
}
