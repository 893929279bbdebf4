// Remote solving through a job-queue service.
//
// The model is sent as LP text inside a job document, the job is polled until
// it is done, and the final transcript is scanned for `C<index> <value>` lines.

use std::thread;
use std::time::Duration;

use regex::Regex;
use tracing::{debug, info, warn};

use super::session::SolutionProvider;
use crate::application::{lp_format::write_lp, mappers::decode_problem};
use crate::domain::{ids::ModelId, models::Model, solver_service::EngineError};

const SOLUTION_LINE: &str = r"(?m)^C(\d+)\s+(-?\d+.?\d*)\r?$";

/// Errors raised while solving remotely
#[derive(Debug, thiserror::Error)]
pub enum CloudError {
    #[error("Could not make connection to the job service: {0}")]
    Unreachable(String),

    #[error("Job submission failed: {0}")]
    Submit(String),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Model could not be transcoded: {0}")]
    Model(#[from] EngineError),

    #[error("Unexpected result transcript: {0}")]
    Transcript(String),
}

impl CloudError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::Unreachable(_) => "CLOUD_UNREACHABLE",
            Self::Submit(_) => "CLOUD_SUBMIT",
            Self::Transport(_) => "CLOUD_TRANSPORT",
            Self::Model(_) => "CLOUD_MODEL",
            Self::Transcript(_) => "CLOUD_TRANSCRIPT",
        }
    }
}

/// Request/response client of the remote job service.
pub trait JobService {
    /// Liveness reply of the service.
    fn ping(&mut self) -> Result<String, CloudError>;

    /// Submit a job document; returns the job number and its password.
    /// A job number of zero means the service refused the job and the password
    /// holds the reason.
    fn submit_job(&mut self, document: &str) -> Result<(i64, String), CloudError>;

    fn job_status(&mut self, job: i64, password: &str) -> Result<String, CloudError>;

    fn final_results(&mut self, job: i64, password: &str) -> Result<String, CloudError>;
}

/// Configuration for remote solving
#[derive(Debug, Clone, PartialEq)]
pub struct CloudConfig {
    pub category: String,
    pub solver: String,
    pub email: String,
    pub poll_interval: Duration,
    /// Reply `ping` must return.
    pub alive_reply: String,
    /// Text the transcript must contain for the solution to be accepted.
    pub success_marker: String,
}

impl Default for CloudConfig {
    fn default() -> Self {
        Self {
            category: "milp".to_string(),
            solver: "CPLEX".to_string(),
            email: String::new(),
            poll_interval: Duration::from_secs(1),
            alive_reply: "NeosServer is alive\n".to_string(),
            success_marker: "MIP - Integer optimal solution".to_string(),
        }
    }
}

impl CloudConfig {
    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = email.into();
        self
    }

    pub fn with_solver(mut self, solver: impl Into<String>) -> Self {
        self.solver = solver.into();
        self
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    fn job_document(&self, lp: &str) -> String {
        format!(
            "<document>
<category>{}</category>
<solver>{}</solver>
<inputMethod>LP</inputMethod>
<email>{}</email>
<LP><![CDATA[{}]]></LP>
<options></options>
<post>display solution variables -</post>
<comments></comments>
</document>",
            self.category, self.solver, self.email, lp
        )
    }
}

/// Solves models on a remote job service.
pub struct CloudSolver<S> {
    service: S,
    config: CloudConfig,
}

impl<S: JobService> CloudSolver<S> {
    pub fn new(service: S) -> Self {
        Self::with_config(service, CloudConfig::default())
    }

    pub fn with_config(service: S, config: CloudConfig) -> Self {
        Self { service, config }
    }

    pub fn config(&self) -> &CloudConfig {
        &self.config
    }

    pub fn service(&self) -> &S {
        &self.service
    }

    /// Prepare remote solving of `model`. Clears any solution the model holds.
    pub fn solutions(&mut self, model: &mut Model) -> CloudSolutions<'_, S> {
        model.clear_solution();
        CloudSolutions {
            solver: self,
            model_id: model.id(),
            done: false,
        }
    }
}

/// A remote job yields at most one solution.
pub struct CloudSolutions<'s, S> {
    solver: &'s mut CloudSolver<S>,
    model_id: ModelId,
    done: bool,
}

impl<S: JobService> CloudSolutions<'_, S> {
    fn run_job(&mut self, model: &Model) -> Result<String, CloudError> {
        let config = &self.solver.config;
        let service = &mut self.solver.service;

        let problem = decode_problem(&model.serialize())?;
        let document = config.job_document(&write_lp(&problem));

        let reply = service.ping()?;
        if reply != config.alive_reply {
            return Err(CloudError::Unreachable(reply));
        }

        let (job, password) = service.submit_job(&document)?;
        if job == 0 {
            return Err(CloudError::Submit(password));
        }
        info!(component = "cloud", operation = "submit", job, "Job submitted");

        loop {
            let status = service.job_status(job, &password)?;
            debug!(component = "cloud", operation = "poll", job, %status, "Job status");
            if status == "Done" {
                break;
            }
            thread::sleep(config.poll_interval);
        }

        service.final_results(job, &password)
    }
}

impl<S: JobService> SolutionProvider for CloudSolutions<'_, S> {
    type Error = CloudError;

    fn get(&mut self, model: &mut Model) -> Result<bool, CloudError> {
        if model.id() != self.model_id {
            return Err(CloudError::Transcript(format!(
                "solutions belong to {} but were asked to fill {}",
                self.model_id,
                model.id()
            )));
        }
        if self.done {
            return Ok(false);
        }
        self.done = true;

        let transcript = self.run_job(model)?;
        if !transcript.contains(&self.solver.config.success_marker) {
            warn!(
                component = "cloud",
                operation = "results",
                status = "no_solution",
                "Transcript does not report an optimal solution"
            );
            return Ok(false);
        }

        let values = parse_transcript(&transcript, model.num_variables())?;
        model.set_solution(values);
        Ok(true)
    }
}

/// Dense solution from `C<index> <value>` lines; unmentioned variables are zero.
pub fn parse_transcript(transcript: &str, num_variables: usize) -> Result<Vec<f64>, CloudError> {
    let pattern = Regex::new(SOLUTION_LINE).map_err(|e| CloudError::Transcript(e.to_string()))?;
    let mut values = vec![0.0; num_variables];
    for caps in pattern.captures_iter(transcript) {
        let column: usize = caps[1]
            .parse()
            .map_err(|_| CloudError::Transcript(format!("bad column `{}`", &caps[1])))?;
        let value: f64 = caps[2]
            .parse()
            .map_err(|_| CloudError::Transcript(format!("bad value `{}`", &caps[2])))?;
        let slot = values.get_mut(column).ok_or_else(|| {
            CloudError::Transcript(format!(
                "column C{column} but the model has {num_variables} variables"
            ))
        })?;
        *slot = value;
    }
    Ok(values)
}
