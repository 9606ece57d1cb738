use std::collections::BTreeMap;

use async_trait::async_trait;
#[cfg(feature = "mock")]
use mockall::automock;
use serde_json::Value;

use kubetest_core::prelude::*;

/// Capability-typed source of test definitions (spec §4.2): given a location (namespace or
/// filesystem directory) plus optional selectors, returns a finite sequence of fully-expanded
/// test definitions with manifests already inlined as opaque objects.
#[cfg_attr(feature = "mock", automock)]
#[async_trait]
pub trait Loader: Send {
    async fn load_tests(
        &mut self,
        location: &str,
        selectors: &BTreeMap<String, Value>,
    ) -> anyhow::Result<Vec<TestDefinition>>;

    async fn load_manifests(&mut self, reference: &str) -> anyhow::Result<Vec<DynamicObject>>;
}
