use std::collections::BTreeMap;
use std::time::Duration;

use kube::api::ApiResource;
use rstest::fixture;
use serde_json::json;

use kubetest_core::prelude::*;

use crate::constants::*;

fn pod_resource() -> ApiResource {
    ApiResource { group: String::new(), version: "v1".into(), api_version: "v1".into(), kind: "Pod".into(), plural: "pods".into() }
}

fn configmap_resource() -> ApiResource {
    ApiResource {
        group: String::new(),
        version: "v1".into(),
        api_version: "v1".into(),
        kind: "ConfigMap".into(),
        plural: "configmaps".into(),
    }
}

#[fixture]
pub fn test_pod(#[default(TEST_POD_NAME)] name: &str) -> DynamicObject {
    DynamicObject::new(name, &pod_resource())
        .within(TEST_NAMESPACE)
        .data(json!({"spec": {"containers": [{"name": "main", "image": "busybox"}]}}))
}

#[fixture]
pub fn test_configmap(#[default(TEST_CONFIGMAP_NAME)] name: &str) -> DynamicObject {
    DynamicObject::new(name, &configmap_resource()).within(TEST_NAMESPACE).data(json!({"data": {"k": "v"}}))
}

#[fixture]
pub fn test_wait_spec() -> WaitSpec {
    WaitSpec {
        resource: ObjectRef::namespaced("v1", "Pod", TEST_NAMESPACE, TEST_POD_NAME),
        timeout: Duration::from_secs(30),
    }
}

#[fixture]
pub fn test_expected_resources_assertion() -> Assertion {
    Assertion::ExpectedResources {
        name: "pod-exists".into(),
        resource: ObjectRef::namespaced("v1", "Pod", TEST_NAMESPACE, TEST_POD_NAME),
        selectors: BTreeMap::new(),
        count: 1,
        timeout: Duration::from_secs(30),
    }
}

#[fixture]
pub fn test_expected_errors_assertion() -> Assertion {
    Assertion::ExpectedErrors { name: "setup-forbidden".into(), expected: vec![".*Forbidden.*".to_string()] }
}

/// A single-object test with one creation wait and one assertion, useful as a starting point
/// for engine-level tests (spec §3).
#[fixture]
pub fn test_definition(
    test_pod: DynamicObject,
    test_wait_spec: WaitSpec,
    test_expected_resources_assertion: Assertion,
) -> TestDefinition {
    TestDefinition {
        name: TEST_NAME.into(),
        objects: vec![test_pod],
        setup_wait_for: vec![test_wait_spec.clone()],
        teardown_wait_for: vec![test_wait_spec],
        assertions: vec![test_expected_resources_assertion],
    }
}
