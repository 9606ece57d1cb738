// Field manager identity used for server-side apply; part of the wire contract, not
// renameable.
pub const FIELD_MANAGER: &str = "go-kubetest";

// Default namespace substituted when a namespace-scoped object omits one.
pub const DEFAULT_NAMESPACE: &str = "default";

// Waiter polling cadence and default timeout.
pub const WAIT_POLL_INTERVAL_SECONDS: u64 = 2;
pub const DEFAULT_WAIT_TIMEOUT_SECONDS: u64 = 60;

// Prefix that marks a selector key as a label selector rather than a field selector.
pub const LABEL_SELECTOR_KEY_PREFIX: &str = "metadata.labels.";

// YAML multi-document delimiter used by both loader variants.
pub const YAML_DOCUMENT_DELIMITER: &str = "---";

// Custom resource group used for cluster-mode test definitions and results.
pub const KUBETEST_API_GROUP: &str = "go-kubetest.io";
pub const KUBETEST_API_VERSION: &str = "go-kubetest.io/v1";

// Env vars consumed by the CLI/engine.
pub const METRICS_ADDRESS_ENV_VAR: &str = "METRICS_ADDRESS";
pub const METRICS_PORT_ENV_VAR: &str = "METRICS_PORT";
