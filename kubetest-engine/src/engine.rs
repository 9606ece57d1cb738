use std::collections::BTreeMap;
use std::time::Duration;

use kube::api::{
    ObjectMeta,
    TypeMeta,
};
use serde_json::{
    json,
    Value,
};
use tokio_util::sync::CancellationToken;
use tracing::{
    instrument,
    warn,
};

use kubetest_core::prelude::*;
use kubetest_loader::Loader;
use kubetest_provisioner::Provisioner;

use crate::errors::EngineError;
use crate::sleeper::{
    RealSleeper,
    Sleeper,
};
use crate::waiter::{
    created,
    deleted,
    wait_all,
};
use crate::{
    assert,
    MetricsHub,
};

/// The reconciliation loop (spec §4.5): for each test, runs
/// Setup -> WaitForCreation -> Assert -> publish -> Teardown -> WaitForDeletion, aggregating
/// outcomes into a per-cycle snapshot and, in cluster mode, persisting per-test `TestResult`
/// objects via the same Provisioner used for setup/teardown.
pub struct Engine<L, P> {
    loader: L,
    provisioner: P,
    metrics: MetricsHub,
    result_namespace: Option<String>,
}

impl<L: Loader, P: Provisioner> Engine<L, P> {
    pub fn new(loader: L, provisioner: P, metrics: MetricsHub, result_namespace: Option<String>) -> Engine<L, P> {
        Engine { loader, provisioner, metrics, result_namespace }
    }

    /// `Run(ctx, location, selectors, interval, once)`.
    pub async fn run(
        &mut self,
        location: &str,
        selectors: &BTreeMap<String, Value>,
        interval: Duration,
        once: bool,
        cancel: CancellationToken,
    ) -> anyhow::Result<()> {
        loop {
            if cancel.is_cancelled() {
                return Ok(());
            }

            let tests = self.loader.load_tests(location, selectors).await?;
            if tests.is_empty() {
                if once {
                    return Err(EngineError::no_tests_once(location));
                }
                warn!("no tests loaded from {location}, idling");
            }

            let mut cycle = CycleResult::default();
            for test in &tests {
                if cancel.is_cancelled() {
                    break;
                }
                let outcome = self.run_test(test, &RealSleeper, &cancel).await;
                if let Some(namespace) = &self.result_namespace {
                    if let Err(e) = self.persist_result(namespace, &outcome).await {
                        warn!("failed to persist result for {}: {e}", outcome.name);
                    }
                }
                cycle.tests.push(outcome);
            }

            self.metrics.publish_snapshot(&cycle);

            if once {
                return Ok(());
            }

            tokio::select! {
                _ = tokio::time::sleep(interval) => {},
                _ = cancel.cancelled() => return Ok(()),
            }
        }
    }

    #[instrument(skip(self, sleeper, cancel), fields(test = %test.name))]
    async fn run_test<S: Sleeper>(&mut self, test: &TestDefinition, sleeper: &S, cancel: &CancellationToken) -> TestOutcome {
        let mut setup_errors = Vec::new();
        for obj in &test.objects {
            if let Err(e) = self.provisioner.create_or_update(obj).await {
                setup_errors.push(e.to_string());
            }
        }

        let creation_ok = wait_all(&mut self.provisioner, sleeper, &test.setup_wait_for, created, cancel).await;
        if !creation_ok {
            warn!("creation wait failed for test {}", test.name);
            self.teardown(test).await;
            let teardown_ok = wait_all(&mut self.provisioner, sleeper, &test.teardown_wait_for, deleted, cancel).await;
            if !teardown_ok {
                warn!("teardown wait failed for test {} after creation-wait failure", test.name);
            }
            return TestOutcome { name: test.name.clone(), passed: false, assertions: BTreeMap::new() };
        }

        let result = assert::run(test, &setup_errors, &mut self.provisioner, sleeper, cancel).await;

        self.teardown(test).await;
        let teardown_ok = wait_all(&mut self.provisioner, sleeper, &test.teardown_wait_for, deleted, cancel).await;
        if !teardown_ok {
            warn!("teardown wait failed for test {}", test.name);
        }

        TestOutcome { name: test.name.clone(), passed: result.overall, assertions: result.per_assertion }
    }

    /// Deletes `test.objects` in reverse insertion order (spec §3 invariant). Per-object failures
    /// are logged but do not abort teardown of the rest; teardown errors are discarded, not
    /// folded into the test result.
    async fn teardown(&mut self, test: &TestDefinition) {
        for obj in test.objects.iter().rev() {
            if let Err(e) = self.provisioner.delete(obj).await {
                warn!("teardown delete failed for {}: {e}", obj.name_any());
            }
        }
    }

    /// `Engine.PersistResult`: writes one `TestResult` object per test (spec §4.5, §6).
    async fn persist_result(&mut self, namespace: &str, outcome: &TestOutcome) -> EmptyResult {
        let obj = DynamicObject {
            types: Some(TypeMeta { api_version: KUBETEST_API_VERSION.to_string(), kind: "TestResult".to_string() }),
            metadata: ObjectMeta {
                name: Some(outcome.name.clone()),
                namespace: Some(namespace.to_string()),
                ..Default::default()
            },
            data: json!({
                "spec": {
                    "result": outcome.passed,
                    "assertions": outcome.assertions,
                },
            }),
        };
        self.provisioner
            .create_or_update(&obj)
            .await
            .map_err(|e| EngineError::persist_failed(&format!("{}: {e}", outcome.name)))
    }
}
