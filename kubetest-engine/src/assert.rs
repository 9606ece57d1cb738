use std::collections::BTreeMap;

use regex::Regex;
use tokio_util::sync::CancellationToken;
use tracing::warn;

use kubetest_core::prelude::*;
use kubetest_provisioner::Provisioner;

use crate::sleeper::Sleeper;
use crate::waiter::{
    count_is,
    wait_for_selectors,
};

/// Richer per-assertion record kept internally for logging context; the wire contract exposed to
/// the MetricsHub/result-CR is the plain `name -> bool` map (spec §3, preserved verbatim).
#[derive(Clone, Debug)]
pub struct AssertionOutcome {
    pub name: String,
    pub passed: bool,
    pub message: Option<String>,
}

#[derive(Clone, Debug, Default)]
pub struct AssertResult {
    pub overall: bool,
    pub per_assertion: BTreeMap<String, bool>,
}

/// Evaluates every assertion for a test against its setup errors and current cluster state,
/// returning the conjunction and a per-assertion breakdown (spec §4.4).
pub async fn run<P: Provisioner, S: Sleeper>(
    test: &TestDefinition,
    setup_errors: &[String],
    provisioner: &mut P,
    sleeper: &S,
    cancel: &CancellationToken,
) -> AssertResult {
    let mut outcomes = Vec::with_capacity(test.assertions.len());

    for assertion in &test.assertions {
        let name = assertion.name();
        let outcome = match assertion {
            Assertion::ExpectedErrors { expected, .. } => expected_errors(name, expected, setup_errors),
            Assertion::ExpectedResources { resource, selectors, count, timeout, .. } => {
                expected_resources(name, resource, selectors, *count, *timeout, provisioner, sleeper, cancel).await
            },
        };
        if !outcome.passed {
            if let Some(msg) = &outcome.message {
                warn!("assertion {} failed: {msg}", outcome.name);
            }
        }
        outcomes.push(outcome);
    }

    let overall = outcomes.iter().all(|o| o.passed);
    let per_assertion = outcomes.into_iter().map(|o| (o.name, o.passed)).collect();
    AssertResult { overall, per_assertion }
}

fn expected_errors(name: &str, expected: &[String], actual: &[String]) -> AssertionOutcome {
    if expected.len() != actual.len() {
        return AssertionOutcome {
            name: name.to_string(),
            passed: false,
            message: Some(format!("length mismatch: expected {} errors, got {}", expected.len(), actual.len())),
        };
    }

    let passed = expected.iter().zip(actual.iter()).all(|(pattern, msg)| {
        Regex::new(pattern).map(|re| re.is_match(msg)).unwrap_or(false)
    });

    AssertionOutcome {
        name: name.to_string(),
        passed,
        message: if passed { None } else { Some("regex mismatch".to_string()) },
    }
}

/// Identical to `Waiter.WaitFor` with predicate `|items| = count`, using the assertion's own
/// selectors and timeout (spec §4.4) -- a resource can be "eventually exactly N".
#[allow(clippy::too_many_arguments)]
async fn expected_resources<P: Provisioner, S: Sleeper>(
    name: &str,
    resource: &ObjectRef,
    selectors: &BTreeMap<String, serde_json::Value>,
    count: i64,
    timeout: std::time::Duration,
    provisioner: &mut P,
    sleeper: &S,
    cancel: &CancellationToken,
) -> AssertionOutcome {
    let passed =
        wait_for_selectors(provisioner, sleeper, resource, selectors, count_is(count), timeout, cancel).await;

    AssertionOutcome {
        name: name.to_string(),
        passed,
        message: if passed { None } else { Some(format!("did not converge to count={count} within {}s", timeout.as_secs())) },
    }
}
