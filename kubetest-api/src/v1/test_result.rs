use kube::CustomResource;
use schemars::JsonSchema;
use serde::{
    Deserialize,
    Serialize,
};
use std::collections::BTreeMap;

/// Emitted result object (spec §6): `go-kubetest.io/v1.TestResult`, one per test per cycle when
/// the engine is configured to persist results.
#[derive(Clone, CustomResource, Debug, Default, Deserialize, JsonSchema, Serialize)]
#[kube(
    group = "go-kubetest.io",
    version = "v1",
    kind = "TestResult",
    namespaced,
    printcolumn = r#"{"name":"passed", "type":"boolean", "description":"overall test result", "jsonPath":".spec.result"}"#
)]
#[serde(rename_all = "camelCase")]
pub struct TestResultSpec {
    pub result: bool,
    #[serde(default)]
    pub assertions: BTreeMap<String, bool>,
}
