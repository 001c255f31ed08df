// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Orchestrator
//!
//! Runs every registered rule over one shared, read-only model and collects
//! the results into a [`Project`].
//!
//! Rules are scattered over a fixed-size rayon pool and gathered with an
//! indexed collect, so results land at their registration index whatever
//! order they finish in. Each rule runs on its own thread under
//! `catch_unwind` with a deadline in its [`RuleConfig`]. Rules poll the
//! deadline once per element and bail out with
//! [`RuleError::DeadlineExceeded`] once it passes; the orchestrator gives a
//! timed-out thread a short grace period to do so before detaching it.
//! Any failure of a rule turns its check into an `error` result and the run
//! carries on.

use crate::config::{default_workers, EngineConfig, RuleConfig, DEFAULT_RULE_TIMEOUT_SECS};
use crate::error::{EngineError, RuleError, RuleFailure};
use crate::registry::{Provider, Registry, Rule, RuleOutput};
use crate::report::{CheckResult, ElementResult, Project, ProjectInfo};
use ifcore_model::IfcModel;
use once_cell::sync::Lazy;
use rayon::prelude::*;
use std::any::Any;
use std::collections::HashSet;
use std::panic::{self, AssertUnwindSafe};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::{Arc, Condvar, Mutex, PoisonError};
use std::thread;
use std::time::{Duration, Instant};
use uuid::Uuid;

/// Upper bound on waiting for a timed-out rule to notice its deadline
const CANCEL_GRACE: Duration = Duration::from_secs(1);

/// Run settings
#[derive(Clone, Debug, PartialEq)]
pub struct OrchestratorOptions {
    /// Size of the worker pool
    pub workers: usize,
    /// Wall-clock budget of a single rule
    pub rule_timeout: Duration,
    /// Handed to every rule
    pub rule_config: RuleConfig,
}

impl Default for OrchestratorOptions {
    fn default() -> Self {
        Self {
            workers: default_workers(),
            rule_timeout: Duration::from_secs(DEFAULT_RULE_TIMEOUT_SECS),
            rule_config: RuleConfig::default(),
        }
    }
}

impl OrchestratorOptions {
    pub fn from_config(config: &EngineConfig) -> Self {
        Self {
            workers: config.workers,
            rule_timeout: config.rule_timeout(),
            rule_config: config.rule_config(),
        }
    }
}

/// Drives a registry over models
pub struct Orchestrator {
    registry: Registry,
    options: OrchestratorOptions,
    pool: rayon::ThreadPool,
}

impl Orchestrator {
    pub fn new(registry: Registry, options: OrchestratorOptions) -> Result<Self, EngineError> {
        let workers = options.workers.max(1);
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(workers)
            .thread_name(|i| format!("ifcore-worker-{i}"))
            .build()?;

        Ok(Self {
            registry,
            options: OrchestratorOptions { workers, ..options },
            pool,
        })
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn options(&self) -> &OrchestratorOptions {
        &self.options
    }

    /// Evaluate every registered rule against `model`
    ///
    /// Concurrent runs on the same model instance are serialized.
    pub fn run(&self, model: Arc<dyn IfcModel>, info: ProjectInfo) -> Project {
        let _guard = RunGuard::acquire(&model);
        let started = Instant::now();
        let project_id = Uuid::new_v4();
        let job_id = Uuid::new_v4();

        let jobs: Vec<(&Provider, &Rule)> = self.registry.rules().collect();
        log::info!(
            "running {} rules from {} providers on {} workers",
            jobs.len(),
            self.registry.providers().len(),
            self.options.workers
        );

        let check_results: Vec<CheckResult> = self.pool.install(|| {
            jobs.par_iter()
                .map(|(provider, rule)| self.check(provider, rule, &model, project_id, job_id))
                .collect()
        });

        let metadata = model.metadata();
        let project = Project {
            id: project_id,
            name: info
                .name
                .or_else(|| metadata.file_name.clone())
                .unwrap_or_else(|| "untitled".to_string()),
            file_url: info.file_url,
            user_id: info.user_id,
            ifc_schema: Some(metadata.schema_version.clone()).filter(|s| !s.is_empty()),
            region: info
                .region
                .or_else(|| Some(self.options.rule_config.region().to_string())),
            building_type: info.building_type,
            created_at: chrono::Utc::now().timestamp(),
            check_results,
        };

        log::info!(
            "{} checks in {:.2?}: {} pass, {} fail, {} degraded",
            project.total_checks(),
            started.elapsed(),
            project.passed_checks(),
            project.failed_checks(),
            project.degraded_checks()
        );
        project
    }

    fn check(
        &self,
        provider: &Provider,
        rule: &Rule,
        model: &Arc<dyn IfcModel>,
        project_id: Uuid,
        job_id: Uuid,
    ) -> CheckResult {
        let started = Instant::now();
        log::debug!("[{}] {} started", provider.id(), rule.name());

        let check = CheckResult::new(project_id, job_id, rule.name(), provider.id());
        let check = match self.execute(rule, model).and_then(conforming) {
            Ok(elements) => check.with_elements(elements),
            Err(failure) => {
                log::warn!("[{}] {} degraded: {}", provider.id(), rule.name(), failure);
                check.degraded(failure)
            }
        }
        .with_duration(started.elapsed());

        log::debug!(
            "[{}] {} finished: {} in {} ms",
            provider.id(),
            rule.name(),
            check.status(),
            check.duration_ms
        );
        check
    }

    fn execute(&self, rule: &Rule, model: &Arc<dyn IfcModel>) -> Result<RuleOutput, RuleFailure> {
        let timeout = self.options.rule_timeout;
        let (tx, rx) = mpsc::channel();
        let task = rule.clone();
        let task_model = Arc::clone(model);
        let config = self
            .options
            .rule_config
            .clone()
            .with_deadline(Instant::now() + timeout);

        thread::Builder::new()
            .name(format!("rule:{}", rule.name()))
            .spawn(move || {
                let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
                    task.invoke(task_model.as_ref(), &config)
                }));
                // Nobody is listening any more after a timeout
                let _ = tx.send(outcome);
            })
            .map_err(|e| RuleFailure::Spawn(e.to_string()))?;

        match rx.recv_timeout(timeout) {
            Ok(Ok(Err(RuleError::DeadlineExceeded))) => Err(RuleFailure::TimedOut(timeout)),
            Ok(Ok(result)) => result.map_err(RuleFailure::from),
            Ok(Err(payload)) => Err(RuleFailure::Panicked(panic_message(payload.as_ref()))),
            Err(RecvTimeoutError::Timeout) => {
                match rx.recv_timeout(timeout.min(CANCEL_GRACE)) {
                    Ok(_) => log::debug!("rule `{}` stopped after its deadline", rule.name()),
                    Err(_) => log::warn!(
                        "rule `{}` ignored its deadline; leaving its thread detached",
                        rule.name()
                    ),
                }
                Err(RuleFailure::TimedOut(timeout))
            }
            Err(RecvTimeoutError::Disconnected) => Err(RuleFailure::Panicked(
                "rule thread exited without a result".to_string(),
            )),
        }
    }
}

/// Typed rows of a rule, or the first row that breaks the contract
///
/// Raw records are converted in order; the index in the failure is the
/// record's position in the rule's output.
fn conforming(output: RuleOutput) -> Result<Vec<ElementResult>, RuleFailure> {
    let elements = match output {
        RuleOutput::Elements(elements) => elements,
        RuleOutput::Records(records) => records
            .into_iter()
            .enumerate()
            .map(|(index, record)| {
                ElementResult::try_from(record)
                    .map_err(|violation| RuleFailure::Contract { index, violation })
            })
            .collect::<Result<_, _>>()?,
    };
    for (index, element) in elements.iter().enumerate() {
        element
            .validate()
            .map_err(|violation| RuleFailure::Contract { index, violation })?;
    }
    Ok(elements)
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "non-string panic payload".to_string())
}

/// Models with a run in progress, keyed by allocation address
struct InFlight {
    models: Mutex<HashSet<usize>>,
    released: Condvar,
}

static IN_FLIGHT: Lazy<InFlight> = Lazy::new(|| InFlight {
    models: Mutex::new(HashSet::new()),
    released: Condvar::new(),
});

/// Held for the duration of one run
struct RunGuard {
    key: usize,
}

impl RunGuard {
    fn acquire(model: &Arc<dyn IfcModel>) -> Self {
        let key = Arc::as_ptr(model) as *const () as usize;
        let mut models = IN_FLIGHT
            .models
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        while models.contains(&key) {
            log::debug!("waiting for the in-flight run on this model");
            models = IN_FLIGHT
                .released
                .wait(models)
                .unwrap_or_else(PoisonError::into_inner);
        }
        models.insert(key);
        Self { key }
    }
}

impl Drop for RunGuard {
    fn drop(&mut self) {
        let mut models = IN_FLIGHT
            .models
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        models.remove(&self.key);
        IN_FLIGHT.released.notify_all();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::{CheckStatus, ElementStatus, RawElementRecord};
    use ifcore_model::InMemoryModel;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn row(status: ElementStatus) -> ElementResult {
        ElementResult::new("IfcWall", "W1", status).with_comment("checked")
    }

    fn fixed(name: &str, status: ElementStatus) -> Rule {
        Rule::new(name, move |_, _| Ok(vec![row(status)]))
    }

    fn orchestrator(registry: Registry, workers: usize, timeout: Duration) -> Orchestrator {
        Orchestrator::new(
            registry,
            OrchestratorOptions {
                workers,
                rule_timeout: timeout,
                rule_config: RuleConfig::default(),
            },
        )
        .unwrap()
    }

    fn model() -> Arc<dyn IfcModel> {
        Arc::new(InMemoryModel::new())
    }

    #[test]
    fn test_results_follow_registration_order() {
        // Earlier rules sleep longer, so they finish last
        let rules: Vec<Rule> = (0..6u64)
            .map(|i| {
                Rule::new(format!("rule {i}"), move |_, _| {
                    thread::sleep(Duration::from_millis(60 - i * 10));
                    Ok(vec![row(ElementStatus::Pass)])
                })
            })
            .collect();
        let registry = Registry::builder()
            .provider("a", rules[..3].to_vec())
            .provider("b", rules[3..].to_vec())
            .build()
            .unwrap();

        let project = orchestrator(registry, 4, Duration::from_secs(5)).run(model(), ProjectInfo::default());
        let names: Vec<_> = project.check_results.iter().map(|c| c.check_name.as_str()).collect();
        assert_eq!(names, ["rule 0", "rule 1", "rule 2", "rule 3", "rule 4", "rule 5"]);
        assert_eq!(project.check_results[3].provider, "b");
    }

    #[test]
    fn test_defective_rule_is_isolated() {
        let rules: Vec<Rule> = (0..10)
            .map(|i| {
                if i == 3 {
                    Rule::new("rule 4", |_, _| panic!("index out of range"))
                } else {
                    fixed(&format!("rule {}", i + 1), ElementStatus::Pass)
                }
            })
            .collect();
        let registry = Registry::builder().provider("p", rules).build().unwrap();

        let project = orchestrator(registry, 3, Duration::from_secs(5)).run(model(), ProjectInfo::default());
        assert_eq!(project.total_checks(), 10);
        assert_eq!(project.degraded_checks(), 1);
        assert_eq!(project.passed_checks(), 9);

        let broken = &project.check_results[3];
        assert_eq!(broken.status(), CheckStatus::Error);
        assert_eq!(broken.summary(), "Error: rule panicked: index out of range");
        assert!(project.check_results[..3].iter().all(|c| !c.is_degraded()));
    }

    #[test]
    fn test_slow_rule_times_out() {
        let registry = Registry::builder()
            .provider(
                "p",
                vec![
                    Rule::new("slow", |_, _| {
                        thread::sleep(Duration::from_secs(2));
                        Ok(Vec::new())
                    }),
                    fixed("fast", ElementStatus::Pass),
                ],
            )
            .build()
            .unwrap();

        let project =
            orchestrator(registry, 2, Duration::from_millis(100)).run(model(), ProjectInfo::default());
        assert_eq!(project.check_results[0].status(), CheckStatus::Error);
        assert!(project.check_results[0].summary().contains("time budget"));
        assert_eq!(project.check_results[1].status(), CheckStatus::Pass);
    }

    #[test]
    fn test_timed_out_rule_stops_at_its_deadline() {
        let visited = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&visited);
        let registry = Registry::builder()
            .provider(
                "p",
                vec![Rule::new("long loop", move |_, config| {
                    for _ in 0..30 {
                        config.check_deadline()?;
                        counter.fetch_add(1, Ordering::SeqCst);
                        thread::sleep(Duration::from_millis(20));
                    }
                    Ok(vec![row(ElementStatus::Pass)])
                })],
            )
            .build()
            .unwrap();

        let project =
            orchestrator(registry, 1, Duration::from_millis(50)).run(model(), ProjectInfo::default());
        assert_eq!(project.check_results[0].status(), CheckStatus::Error);
        assert_eq!(
            project.check_results[0].summary(),
            "Error: rule exceeded its 0.05s time budget"
        );

        thread::sleep(Duration::from_millis(100));
        let stopped_at = visited.load(Ordering::SeqCst);
        thread::sleep(Duration::from_millis(200));
        assert_eq!(visited.load(Ordering::SeqCst), stopped_at);
        assert!(stopped_at < 30);
    }

    #[test]
    fn test_raw_records_are_validated() {
        let record = |json: &str| -> RawElementRecord { serde_json::from_str(json).unwrap() };
        let registry = Registry::builder()
            .provider(
                "external",
                vec![
                    Rule::from_records("valid", move |_, _| {
                        Ok(vec![record(
                            r#"{"element_type":"IfcDoor","element_name":"D1","status":"pass"}"#,
                        )])
                    }),
                    Rule::from_records("undecided", move |_, _| {
                        Ok(vec![
                            record(r#"{"element_type":"IfcDoor","element_name":"D1","status":"pass"}"#),
                            record(r#"{"element_type":"IfcDoor","element_name":"D2","status":"maybe"}"#),
                        ])
                    }),
                    Rule::from_records("unexplained", move |_, _| {
                        Ok(vec![record(
                            r#"{"element_type":"IfcDoor","element_name":"D1","status":"blocked"}"#,
                        )])
                    }),
                ],
            )
            .build()
            .unwrap();

        let project = orchestrator(registry, 2, Duration::from_secs(5)).run(model(), ProjectInfo::default());
        let valid = &project.check_results[0];
        assert_eq!(valid.status(), CheckStatus::Pass);
        assert_eq!(valid.elements()[0].check_result_id, Some(valid.id));

        assert_eq!(
            project.check_results[1].summary(),
            "Error: record 1: status `maybe` is not one of pass, fail, warning, blocked, log"
        );
        assert_eq!(
            project.check_results[2].summary(),
            "Error: record 0: `blocked` result without a rationale"
        );
        assert_eq!(project.degraded_checks(), 2);
    }

    #[test]
    fn test_rule_errors_and_contract_violations() {
        let registry = Registry::builder()
            .provider(
                "p",
                vec![
                    Rule::new("bad threshold", |_, config| {
                        config.threshold("no_such_threshold")?;
                        Ok(Vec::new())
                    }),
                    Rule::new("silent failure", |_, _| {
                        Ok(vec![ElementResult::new("IfcDoor", "D1", ElementStatus::Fail)])
                    }),
                    Rule::new("explicit error", |_, _| Err(RuleError::failed("model too old"))),
                ],
            )
            .build()
            .unwrap();

        let project = orchestrator(registry, 1, Duration::from_secs(5)).run(model(), ProjectInfo::default());
        let summaries: Vec<_> = project.check_results.iter().map(|c| c.summary()).collect();
        assert_eq!(
            summaries,
            [
                "Error: unknown threshold `no_such_threshold`",
                "Error: record 0: `fail` result without a rationale",
                "Error: model too old",
            ]
        );
    }

    #[test]
    fn test_empty_and_log_only_checks() {
        let registry = Registry::builder()
            .provider(
                "p",
                vec![
                    Rule::new("nothing", |_, _| Ok(Vec::new())),
                    fixed("inventory", ElementStatus::Log),
                ],
            )
            .build()
            .unwrap();

        let project = orchestrator(registry, 2, Duration::from_secs(5)).run(model(), ProjectInfo::default());
        assert_eq!(project.check_results[0].status(), CheckStatus::Unknown);
        assert_eq!(project.check_results[0].summary(), "No elements found for this check.");
        assert_eq!(project.check_results[1].status(), CheckStatus::Unknown);
        assert!(project.check_results[1].has_elements());
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let registry = Registry::standard();
        let model: Arc<dyn IfcModel> = Arc::new(
            InMemoryModel::new().with_element(ifcore_model::Element::new(
                1,
                ifcore_model::IfcType::IfcDoor,
            )),
        );

        let sequential = orchestrator(registry.clone(), 1, Duration::from_secs(5))
            .run(Arc::clone(&model), ProjectInfo::default());
        let parallel =
            orchestrator(registry, 8, Duration::from_secs(5)).run(model, ProjectInfo::default());

        let shape = |p: &Project| -> Vec<(String, CheckStatus, String)> {
            p.check_results
                .iter()
                .map(|c| (c.check_name.clone(), c.status(), c.summary().to_string()))
                .collect()
        };
        assert_eq!(shape(&sequential), shape(&parallel));
    }

    #[test]
    fn test_runs_on_same_model_are_serialized() {
        let active = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));
        let (a, p) = (Arc::clone(&active), Arc::clone(&peak));
        let registry = Registry::builder()
            .provider(
                "p",
                vec![Rule::new("tracker", move |_, _| {
                    let now = a.fetch_add(1, Ordering::SeqCst) + 1;
                    p.fetch_max(now, Ordering::SeqCst);
                    thread::sleep(Duration::from_millis(50));
                    a.fetch_sub(1, Ordering::SeqCst);
                    Ok(vec![row(ElementStatus::Pass)])
                })],
            )
            .build()
            .unwrap();

        let orchestrator = Arc::new(orchestrator(registry, 2, Duration::from_secs(5)));
        let shared = model();
        let handles: Vec<_> = (0..3)
            .map(|_| {
                let orchestrator = Arc::clone(&orchestrator);
                let model = Arc::clone(&shared);
                thread::spawn(move || orchestrator.run(model, ProjectInfo::default()))
            })
            .collect();
        for handle in handles {
            assert_eq!(handle.join().unwrap().passed_checks(), 1);
        }
        assert_eq!(peak.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_project_metadata() {
        let registry = Registry::builder().build().unwrap();
        let model: Arc<dyn IfcModel> = Arc::new(InMemoryModel::new().with_schema("IFC2X3"));
        let project = orchestrator(registry, 1, Duration::from_secs(1)).run(
            model,
            ProjectInfo {
                name: Some("Duplex".into()),
                ..ProjectInfo::default()
            },
        );

        assert_eq!(project.name, "Duplex");
        assert_eq!(project.ifc_schema.as_deref(), Some("IFC2X3"));
        assert_eq!(project.region.as_deref(), Some("ES"));
        assert!(project.check_results.is_empty());
    }
}
