use kube::CustomResource;
use schemars::JsonSchema;
use serde::{
    Deserialize,
    Serialize,
};

/// A referenced manifest bundle, dereferenced by name from a test's `resources` list in
/// cluster-loader mode: `go-kubetest.io/v1.TestResource`, `spec.data` is a multi-document YAML
/// blob identical in shape to a filesystem manifest file (spec §4.2).
#[derive(Clone, CustomResource, Debug, Default, Deserialize, JsonSchema, Serialize)]
#[kube(group = "go-kubetest.io", version = "v1", kind = "TestResource", namespaced)]
#[serde(rename_all = "camelCase")]
pub struct TestResourceSpec {
    pub data: String,
}
