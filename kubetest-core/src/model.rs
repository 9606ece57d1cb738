use std::collections::BTreeMap;
use std::time::Duration;

use serde_json::Value;

use crate::objectref::ObjectRef;

/// `{ resource, timeout }`: zero or more appear in a test's `setup.waitFor`/`teardown.waitFor`
/// (spec §3).
#[derive(Clone, Debug)]
pub struct WaitSpec {
    pub resource: ObjectRef,
    pub timeout: Duration,
}

/// A tagged assertion variant (spec §3). Each carries a human `name` used as a metric label.
#[derive(Clone, Debug)]
pub enum Assertion {
    ExpectedResources {
        name: String,
        resource: ObjectRef,
        selectors: BTreeMap<String, Value>,
        count: i64,
        timeout: Duration,
    },
    ExpectedErrors {
        name: String,
        expected: Vec<String>,
    },
}

impl Assertion {
    pub fn name(&self) -> &str {
        match self {
            Assertion::ExpectedResources { name, .. } => name,
            Assertion::ExpectedErrors { name, .. } => name,
        }
    }
}

/// A fully-expanded test definition: manifests already inlined as opaque objects, every ref
/// string already parsed, every timeout already a `Duration` (spec §3).
#[derive(Clone, Debug)]
pub struct TestDefinition {
    pub name: String,
    pub objects: Vec<kube::api::DynamicObject>,
    pub setup_wait_for: Vec<WaitSpec>,
    pub teardown_wait_for: Vec<WaitSpec>,
    pub assertions: Vec<Assertion>,
}

/// Per-cycle outcome for a single test: overall pass/fail plus a per-assertion breakdown (spec
/// §3's wire shape for the MetricsHub/result-CR contract).
#[derive(Clone, Debug)]
pub struct TestOutcome {
    pub name: String,
    pub passed: bool,
    pub assertions: BTreeMap<String, bool>,
}

/// Aggregate outcome for one reconciliation cycle.
#[derive(Clone, Debug, Default)]
pub struct CycleResult {
    pub tests: Vec<TestOutcome>,
}

impl CycleResult {
    pub fn total(&self) -> usize {
        self.tests.len()
    }

    pub fn passed(&self) -> usize {
        self.tests.iter().filter(|t| t.passed).count()
    }

    pub fn failed(&self) -> usize {
        self.total() - self.passed()
    }
}
