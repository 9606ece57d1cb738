pub const TEST_NAMESPACE: &str = "test-namespace";
pub const TEST_LOCATION: &str = "test-namespace";
pub const TEST_POD_NAME: &str = "the-pod";
pub const TEST_CONFIGMAP_NAME: &str = "the-configmap";
pub const TEST_NAME: &str = "smoke-test";
