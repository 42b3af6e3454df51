//! Concurrency-bounded dispatch of a fixed number of conversion requests.
//!
//! Two strategies share one contract: exactly `total_requests` outcomes are
//! collected and never more than `concurrency` requests are in flight.
//!
//! - [`DispatchMode::Pool`] keeps `concurrency` workers busy; a worker that
//!   finishes immediately claims the next pending request.
//! - [`DispatchMode::Wave`] launches `concurrency` requests at a time and waits
//!   for the whole group before launching the next one.

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tokio::time::{Duration, Instant};
use tracing::{debug, error, info};

use crate::config::ConfigError;
use crate::converter::RemoteConverter;
use crate::errors::SetupError;
use crate::outcome::{RequestOutcome, ResultSet};
use crate::runner::RequestRunner;

/// How requests are scheduled within the concurrency ceiling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DispatchMode {
    /// Fixed worker pool pulling from a shared counter.
    #[default]
    Pool,

    /// Fixed-size groups, each awaited before the next starts.
    Wave,
}

impl DispatchMode {
    pub fn label(&self) -> &'static str {
        match self {
            DispatchMode::Pool => "pool",
            DispatchMode::Wave => "wave",
        }
    }
}

impl fmt::Display for DispatchMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

impl FromStr for DispatchMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "pool" => Ok(DispatchMode::Pool),
            "wave" => Ok(DispatchMode::Wave),
            other => Err(format!(
                "Unknown dispatch mode '{}'. Use 'pool' or 'wave'.",
                other
            )),
        }
    }
}

/// Where the request payload comes from.
#[derive(Debug, Clone)]
pub enum PayloadSource {
    /// Read once from disk before the run starts.
    File(PathBuf),

    /// Already in memory.
    Inline(Bytes),
}

impl PayloadSource {
    /// Load the payload. This is the only fatal step of a run.
    ///
    /// An empty payload is still a payload; how the service answers it is part
    /// of what gets measured.
    pub async fn load(&self) -> Result<Bytes, SetupError> {
        match self {
            PayloadSource::File(path) => {
                let data = tokio::fs::read(path)
                    .await
                    .map_err(|source| SetupError::PayloadRead {
                        path: path.clone(),
                        source,
                    })?;
                Ok(Bytes::from(data))
            }
            PayloadSource::Inline(bytes) => Ok(bytes.clone()),
        }
    }
}

/// Input configuration of one run.
#[derive(Debug, Clone)]
pub struct RunConfig {
    total_requests: usize,
    concurrency: usize,
    payload: PayloadSource,
    target_format: String,
    mode: DispatchMode,
    request_timeout: Option<Duration>,
}

impl RunConfig {
    /// Both counts must be positive.
    pub fn new(
        total_requests: usize,
        concurrency: usize,
        payload: PayloadSource,
    ) -> Result<Self, ConfigError> {
        if total_requests == 0 {
            return Err(ConfigError::invalid(
                "TOTAL_REQUESTS",
                "must be greater than 0",
            ));
        }
        if concurrency == 0 {
            return Err(ConfigError::invalid(
                "CONCURRENCY_LEVEL",
                "must be greater than 0",
            ));
        }

        Ok(Self {
            total_requests,
            concurrency,
            payload,
            target_format: "pdf".to_string(),
            mode: DispatchMode::default(),
            request_timeout: None,
        })
    }

    pub fn with_target_format(mut self, target_format: impl Into<String>) -> Self {
        self.target_format = target_format.into();
        self
    }

    pub fn with_mode(mut self, mode: DispatchMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_request_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn total_requests(&self) -> usize {
        self.total_requests
    }

    /// Configured concurrency, before clamping.
    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    /// Concurrency clamped to the total request count.
    pub fn effective_concurrency(&self) -> usize {
        self.concurrency.min(self.total_requests)
    }

    pub fn payload(&self) -> &PayloadSource {
        &self.payload
    }

    pub fn target_format(&self) -> &str {
        &self.target_format
    }

    pub fn mode(&self) -> DispatchMode {
        self.mode
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout
    }
}

/// Drives a whole run against one converter.
pub struct BatchDispatcher {
    config: RunConfig,
    converter: Arc<dyn RemoteConverter>,
}

impl BatchDispatcher {
    pub fn new(config: RunConfig, converter: Arc<dyn RemoteConverter>) -> Self {
        Self { config, converter }
    }

    /// Load the payload, then issue every request.
    ///
    /// Fails only if the payload cannot be obtained, in which case no request
    /// is sent and no result set exists.
    pub async fn run(&self) -> Result<ResultSet, SetupError> {
        let payload = self.config.payload.load().await.map_err(|e| {
            error!(error = %e, "Payload could not be loaded, aborting run");
            e
        })?;
        Ok(self.run_with_payload(payload).await)
    }

    /// Issue every request with an already-loaded payload.
    pub async fn run_with_payload(&self, payload: Bytes) -> ResultSet {
        let total = self.config.total_requests;
        let concurrency = self.config.effective_concurrency();

        info!(
            mode = %self.config.mode,
            total_requests = total,
            concurrency = concurrency,
            payload_bytes = payload.len(),
            target_format = %self.config.target_format,
            converter = self.converter.name(),
            "Starting load test"
        );

        let runner = RequestRunner::new(
            Arc::clone(&self.converter),
            payload,
            self.config.target_format.as_str(),
        )
        .with_timeout(self.config.request_timeout);

        let start = Instant::now();
        let mut outcomes = match self.config.mode {
            DispatchMode::Pool => run_pool(&runner, total, concurrency).await,
            DispatchMode::Wave => run_waves(&runner, total, concurrency).await,
        };
        let elapsed = start.elapsed();

        // Only reachable if a worker task itself died; keep one outcome per request.
        if outcomes.len() < total {
            let missing = total - outcomes.len();
            error!(missing = missing, "Requests lost to failed worker tasks");
            outcomes.extend(
                (0..missing)
                    .map(|_| RequestOutcome::exception(Duration::ZERO, "worker task failed")),
            );
        }

        info!(
            outcomes = outcomes.len(),
            elapsed_secs = elapsed.as_secs_f64(),
            "Load test completed"
        );

        ResultSet::new(outcomes, elapsed)
    }
}

/// Claim the next request slot, or `None` once all are taken.
fn claim_slot(counter: &AtomicUsize, total: usize) -> Option<usize> {
    let slot = counter.fetch_add(1, Ordering::SeqCst);
    if slot < total {
        Some(slot)
    } else {
        None
    }
}

async fn run_pool(runner: &RequestRunner, total: usize, concurrency: usize) -> Vec<RequestOutcome> {
    let (tx, mut rx) = mpsc::channel::<RequestOutcome>(concurrency * 2);
    let counter = Arc::new(AtomicUsize::new(0));
    let mut workers = JoinSet::new();

    for worker_id in 0..concurrency {
        let tx = tx.clone();
        let runner = runner.clone();
        let counter = Arc::clone(&counter);

        workers.spawn(async move {
            let mut completed = 0usize;
            while let Some(request_id) = claim_slot(&counter, total) {
                let outcome = runner.run(request_id).await;
                completed += 1;
                if tx.send(outcome).await.is_err() {
                    debug!(worker_id = worker_id, "Outcome channel closed, worker stopping");
                    break;
                }
            }
            debug!(
                worker_id = worker_id,
                completed = completed,
                "Worker finished"
            );
        });
    }
    // The collector ends once every worker has dropped its sender.
    drop(tx);

    let mut outcomes = Vec::with_capacity(total);
    while let Some(outcome) = rx.recv().await {
        outcomes.push(outcome);
    }

    while let Some(joined) = workers.join_next().await {
        if let Err(e) = joined {
            error!(error = %e, "Worker task failed");
        }
    }

    outcomes
}

async fn run_waves(
    runner: &RequestRunner,
    total: usize,
    concurrency: usize,
) -> Vec<RequestOutcome> {
    let mut outcomes = Vec::with_capacity(total);
    let mut next = 0usize;
    let mut wave = 0usize;

    while next < total {
        let end = (next + concurrency).min(total);
        let mut requests = JoinSet::new();

        for request_id in next..end {
            let runner = runner.clone();
            requests.spawn(async move { runner.run(request_id).await });
        }

        while let Some(joined) = requests.join_next().await {
            match joined {
                Ok(outcome) => outcomes.push(outcome),
                Err(e) => error!(wave = wave, error = %e, "Request task failed"),
            }
        }

        debug!(
            wave = wave,
            size = end - next,
            completed = outcomes.len(),
            "Wave completed"
        );
        next = end;
        wave += 1;
    }

    outcomes
}
