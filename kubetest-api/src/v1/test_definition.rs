use kube::CustomResource;
use schemars::JsonSchema;
use serde::{
    Deserialize,
    Serialize,
};
use std::collections::BTreeMap;

/// One assertion entry in a test's `assert:` list.  Mirrors the YAML/CR shape from spec §6;
/// `kind` distinguishes the two variants, with only the fields relevant to that variant expected
/// to be populated (the loader is tolerant of the others being absent).
#[derive(Clone, Debug, Default, Deserialize, JsonSchema, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AssertionSpec {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,

    // expectedResources fields
    pub resource: Option<String>,
    #[serde(default)]
    pub selectors: BTreeMap<String, serde_json::Value>,
    pub count: Option<i64>,
    pub timeout: Option<String>,

    // expectedErrors fields
    #[serde(default)]
    pub errors: Vec<String>,
}

#[derive(Clone, Debug, Default, Deserialize, JsonSchema, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WaitSpecEntry {
    pub resource: String,
    pub timeout: String,
}

#[derive(Clone, Debug, Default, Deserialize, JsonSchema, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WaitForSpec {
    #[serde(default)]
    pub wait_for: Vec<WaitSpecEntry>,
}

/// One test's worth of configuration, shared by both the filesystem YAML shape and the cluster
/// `TestDefinition.spec` entries (spec §6).
#[derive(Clone, Debug, Default, Deserialize, JsonSchema, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TestSpecEntry {
    pub name: String,
    #[serde(default)]
    pub resources: Vec<String>,
    #[serde(default)]
    pub setup: WaitForSpec,
    #[serde(default)]
    pub teardown: WaitForSpec,
    #[serde(default)]
    pub assert: Vec<AssertionSpec>,
}

/// Cluster-mode source of test definitions: `go-kubetest.io/v1.TestDefinition`, whose `spec` is
/// the same shape a filesystem YAML file's top-level list holds (spec §4.2, §6).
#[derive(Clone, CustomResource, Debug, Default, Deserialize, JsonSchema, Serialize)]
#[kube(group = "go-kubetest.io", version = "v1", kind = "TestDefinition", namespaced)]
#[serde(rename_all = "camelCase")]
pub struct TestDefinitionSpec {
    pub tests: Vec<TestSpecEntry>,
}
