//! Scenario Runner - Scripted Manager Lifecycles
//!
//! A scenario is a TOML document declaring one or more managers and a list of
//! steps. Steps run in order against a simulated clock; each step may state
//! the outcome it expects (`"ok"` or an error kind such as `"NotReady"`).
//!
//! ```toml
//! [metadata]
//! name = "delayed payment"
//!
//! [[managers]]
//! label = "vault"
//! name = "My failSafe"
//! admin = "alice"
//! min_delay_secs = 40
//! roles = ["proposer", "executor"]
//! principals = ["bob", "carol"]
//!
//! [[steps]]
//! action = "propose"
//! manager = "vault"
//! caller = "bob"
//! operation = "pay"
//! calls = [{ target = "treasury", payload = "pay(7)" }]
//! delay_secs = 40
//!
//! [[steps]]
//! action = "execute"
//! manager = "vault"
//! caller = "carol"
//! operation = "pay"
//! expect = "NotReady"
//! ```

use crate::commands::ids::{parse_address, parse_payload, role_id};
use anyhow::{anyhow, bail, Context, Result};
use rolmanager_core::{
    Address, Clock, ClockConfig, ManagerConfig, ManagerError, RuntimeConfig, Salt,
    SimulatedClock, SystemClock, Timestamp,
};
use rolmanager_engine::{Call, Operation, RecordingExecutor, SharedManager};
use rolmanager_factory::{Factory, NotificationLog, Registry};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

const OK: &str = "ok";

/// Scenario file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioFile {
    /// Scenario metadata
    pub metadata: ScenarioMetadata,
    /// Simulated clock start; the runtime clock setting applies when absent
    pub start_secs: Option<u64>,
    /// Managers created before the first step
    #[serde(default)]
    pub managers: Vec<ManagerSpec>,
    /// Steps in execution order
    #[serde(default)]
    pub steps: Vec<Step>,
}

/// Scenario metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioMetadata {
    /// Scenario name
    pub name: String,
    /// Description
    pub description: Option<String>,
}

/// Manager declaration. Principals are labels or `0x` addresses, roles are
/// well-known names or arbitrary role names.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManagerSpec {
    /// Name steps use to refer to this manager
    pub label: String,
    /// Display name
    pub name: String,
    /// ADMIN principal
    pub admin: String,
    /// Minimum delay; the runtime default applies when absent
    pub min_delay_secs: Option<u64>,
    /// Bootstrap roles
    #[serde(default)]
    pub roles: Vec<String>,
    /// Bootstrap principals
    #[serde(default)]
    pub principals: Vec<String>,
}

/// One call of a proposed operation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CallSpec {
    /// Target label or address
    pub target: String,
    /// Payload text or `0x` hex
    #[serde(default)]
    pub payload: String,
}

/// Scripted step
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Step {
    /// Propose an operation and remember it under `operation`
    Propose {
        /// Manager label
        manager: String,
        /// Calling principal
        caller: String,
        /// Name for later steps
        operation: String,
        /// Calls; more than one makes a batch
        calls: Vec<CallSpec>,
        /// Force batch identity for a single call
        #[serde(default)]
        batch: bool,
        /// Name of a previously proposed operation to depend on
        after: Option<String>,
        /// Salt
        #[serde(default)]
        salt: u64,
        /// Requested delay
        delay_secs: u64,
        /// Expected outcome
        expect: Option<String>,
    },
    /// Execute a named operation
    Execute {
        /// Manager label
        manager: String,
        /// Calling principal
        caller: String,
        /// Operation name
        operation: String,
        /// Expected outcome
        expect: Option<String>,
    },
    /// Cancel a named operation
    Cancel {
        /// Manager label
        manager: String,
        /// Calling principal
        caller: String,
        /// Operation name
        operation: String,
        /// Expected outcome
        expect: Option<String>,
    },
    /// Grant a role
    Grant {
        /// Manager label
        manager: String,
        /// Calling principal
        caller: String,
        /// Role name
        role: String,
        /// Grantee
        principal: String,
        /// Expected outcome
        expect: Option<String>,
    },
    /// Revoke a role
    Revoke {
        /// Manager label
        manager: String,
        /// Calling principal
        caller: String,
        /// Role name
        role: String,
        /// Principal losing the role
        principal: String,
        /// Expected outcome
        expect: Option<String>,
    },
    /// Drop one of the caller's own roles
    Renounce {
        /// Manager label
        manager: String,
        /// Calling principal
        caller: String,
        /// Role name
        role: String,
    },
    /// Move the simulated clock forward
    Advance {
        /// Seconds to advance
        secs: u64,
    },
    /// Make calls to `target` fail until restored
    FailTarget {
        /// Target label or address
        target: String,
    },
    /// Let calls to `target` succeed again
    RestoreTarget {
        /// Target label or address
        target: String,
    },
}

impl Step {
    fn action(&self) -> &'static str {
        match self {
            Step::Propose { .. } => "propose",
            Step::Execute { .. } => "execute",
            Step::Cancel { .. } => "cancel",
            Step::Grant { .. } => "grant",
            Step::Revoke { .. } => "revoke",
            Step::Renounce { .. } => "renounce",
            Step::Advance { .. } => "advance",
            Step::FailTarget { .. } => "fail_target",
            Step::RestoreTarget { .. } => "restore_target",
        }
    }

    fn expect(&self) -> &str {
        match self {
            Step::Propose { expect, .. }
            | Step::Execute { expect, .. }
            | Step::Cancel { expect, .. }
            | Step::Grant { expect, .. }
            | Step::Revoke { expect, .. } => expect.as_deref().unwrap_or(OK),
            _ => OK,
        }
    }
}

/// Outcome of one step
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepOutcome {
    /// Zero-based step index
    pub index: usize,
    /// Step action name
    pub action: &'static str,
    /// `"ok"`, or the error kind
    pub outcome: String,
    /// Human-readable detail
    pub detail: String,
    /// Whether `outcome` equals the step's expectation
    pub matched: bool,
}

/// Result of running a scenario
#[derive(Debug, Clone)]
pub struct ScenarioReport {
    /// Scenario name
    pub name: String,
    /// One outcome per step
    pub outcomes: Vec<StepOutcome>,
    /// Simulated time after the last step
    pub finished_at: Timestamp,
}

impl ScenarioReport {
    /// Steps whose outcome differed from the expectation
    pub fn mismatches(&self) -> Vec<&StepOutcome> {
        self.outcomes.iter().filter(|o| !o.matched).collect()
    }
}

impl ScenarioFile {
    /// Load a scenario from a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read scenario {}", path.display()))?;
        toml::from_str(&text).with_context(|| format!("failed to parse scenario {}", path.display()))
    }
}

struct Runner {
    clock: SimulatedClock,
    recorder: RecordingExecutor,
    factory: Factory,
    managers: HashMap<String, SharedManager>,
    operations: HashMap<String, Operation>,
}

impl Runner {
    fn manager(&self, label: &str) -> Result<&SharedManager> {
        self.managers
            .get(label)
            .ok_or_else(|| anyhow!("unknown manager {label}"))
    }

    fn operation(&self, name: &str) -> Result<&Operation> {
        self.operations
            .get(name)
            .ok_or_else(|| anyhow!("unknown operation {name}"))
    }

    fn create(&mut self, spec: &ManagerSpec, default_delay: Duration) -> Result<()> {
        let roles = spec.roles.iter().map(|r| role_id(r)).collect();
        let principals = spec
            .principals
            .iter()
            .map(|p| parse_address(p))
            .collect::<Result<Vec<_>>>()?;
        let min_delay = spec
            .min_delay_secs
            .map_or(default_delay, Duration::from_secs);
        let config = ManagerConfig::new(
            min_delay,
            spec.name.clone(),
            parse_address(&spec.admin)?,
            roles,
            principals,
        )?;

        let receipt = self
            .factory
            .create_instance_with_executor(config, self.recorder.clone())
            .with_context(|| format!("failed to create manager {}", spec.label))?;
        let handle = self.factory.instance(&receipt.instance)?;
        println!("created {} ({}) at {}", spec.label, spec.name, receipt.instance);
        self.managers.insert(spec.label.clone(), handle);
        Ok(())
    }

    /// Run one step. The outer error is a malformed script; the inner one is
    /// the manager's verdict on the call.
    fn step(&mut self, step: &Step) -> Result<std::result::Result<String, ManagerError>> {
        let verdict = match step {
            Step::Propose {
                manager,
                caller,
                operation,
                calls,
                batch,
                after,
                salt,
                delay_secs,
                ..
            } => {
                let predecessor = after
                    .as_deref()
                    .map(|name| self.operation(name).map(Operation::id))
                    .transpose()?;
                let calls = calls
                    .iter()
                    .map(|c| Ok(Call::new(parse_address(&c.target)?, parse_payload(&c.payload)?)))
                    .collect::<Result<Vec<_>>>()?;
                let op = match (*batch, calls.as_slice()) {
                    (false, [call]) => Operation::single(call.clone(), predecessor, Salt::from_u64(*salt)),
                    _ => Operation::batch(calls, predecessor, Salt::from_u64(*salt)),
                };
                let result = self.manager(manager)?.propose(
                    &parse_address(caller)?,
                    &op,
                    Duration::from_secs(*delay_secs),
                );
                self.operations.insert(operation.clone(), op);
                result.map(|s| format!("{} ready at {}", s.id, s.ready_at))
            }
            Step::Execute {
                manager,
                caller,
                operation,
                ..
            } => {
                let op = self.operation(operation)?.clone();
                self.manager(manager)?
                    .execute(&parse_address(caller)?, &op)
                    .map(|r| format!("{} executed at {}", r.id, r.executed_at))
            }
            Step::Cancel {
                manager,
                caller,
                operation,
                ..
            } => {
                let id = self.operation(operation)?.id();
                self.manager(manager)?
                    .cancel(&parse_address(caller)?, &id)
                    .map(|_| format!("{id} cancelled"))
            }
            Step::Grant {
                manager,
                caller,
                role,
                principal,
                ..
            } => self
                .manager(manager)?
                .grant_role(&parse_address(caller)?, role_id(role), parse_address(principal)?)
                .map(|change| format!("{role} {change:?}")),
            Step::Revoke {
                manager,
                caller,
                role,
                principal,
                ..
            } => self
                .manager(manager)?
                .revoke_role(&parse_address(caller)?, role_id(role), parse_address(principal)?)
                .map(|change| format!("{role} {change:?}")),
            Step::Renounce {
                manager,
                caller,
                role,
            } => {
                let caller = parse_address(caller)?;
                let change = self
                    .manager(manager)?
                    .with(|m| m.renounce_role(&caller, role_id(role)));
                Ok(format!("{role} {change:?}"))
            }
            Step::Advance { secs } => {
                self.clock.advance(Duration::from_secs(*secs));
                Ok(format!("clock at {}", self.clock.now()))
            }
            Step::FailTarget { target } => {
                self.recorder.fail_target(parse_address(target)?);
                Ok(format!("{target} failing"))
            }
            Step::RestoreTarget { target } => {
                self.recorder.clear_failure(&parse_address(target)?);
                Ok(format!("{target} restored"))
            }
        };
        Ok(verdict)
    }
}

/// Run a scenario against a fresh factory and simulated clock
pub fn run_scenario(scenario: &ScenarioFile, runtime: &RuntimeConfig) -> Result<ScenarioReport> {
    let start = match (scenario.start_secs, &runtime.clock) {
        (Some(secs), _) => secs,
        (None, ClockConfig::Simulated { start_secs }) => *start_secs,
        (None, ClockConfig::System) => SystemClock.now().as_secs(),
    };
    let clock = SimulatedClock::new(Timestamp(start));
    let factory = Factory::new(
        Address::from_label("rolmanager/cli/factory"),
        Arc::new(Registry::new(Address::from_label("rolmanager/cli/registry"))),
        Arc::new(clock.clone()),
    )
    .with_sink(Arc::new(NotificationLog::new()));

    let mut runner = Runner {
        clock,
        recorder: RecordingExecutor::new(),
        factory,
        managers: HashMap::new(),
        operations: HashMap::new(),
    };

    info!(scenario = %scenario.metadata.name, start, "running scenario");
    for spec in &scenario.managers {
        runner.create(spec, runtime.default_min_delay())?;
    }

    let mut outcomes = Vec::with_capacity(scenario.steps.len());
    for (index, step) in scenario.steps.iter().enumerate() {
        let (outcome, detail) = match runner
            .step(step)
            .with_context(|| format!("step {index} ({})", step.action()))?
        {
            Ok(detail) => (OK.to_string(), detail),
            Err(err) => (err.kind().to_string(), err.to_string()),
        };
        let matched = outcome == step.expect();
        debug!(index, action = step.action(), %outcome, matched, "step finished");
        outcomes.push(StepOutcome {
            index,
            action: step.action(),
            outcome,
            detail,
            matched,
        });
    }

    Ok(ScenarioReport {
        name: scenario.metadata.name.clone(),
        outcomes,
        finished_at: runner.clock.now(),
    })
}

/// Load, run and print a scenario. Fails if any step missed its expectation.
pub fn handle_run(path: &Path, runtime: &RuntimeConfig) -> Result<()> {
    let scenario = ScenarioFile::load(path)?;
    let report = run_scenario(&scenario, runtime)?;

    println!("Scenario: {}", report.name);
    for outcome in &report.outcomes {
        let mark = if outcome.matched { "✓" } else { "✗" };
        println!(
            "  {mark} [{}] {:<14} {:<20} {}",
            outcome.index, outcome.action, outcome.outcome, outcome.detail
        );
    }
    println!("Finished at {}", report.finished_at);

    let mismatches = report.mismatches();
    if !mismatches.is_empty() {
        bail!("{} step(s) did not match their expected outcome", mismatches.len());
    }
    Ok(())
}
