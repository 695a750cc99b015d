//! Job harness: sequences one batch job.
//!
//! EXECUTION ORDER (fixed):
//!   1. optional lock (read XOR write)
//!   2. fetch inputs from the data source
//!   3. run the job
//!   4. commit the job's outputs through the data source
//!
//! Any error aborts the sequence and is returned unchanged. Nothing is
//! retried here. Locks taken in step 1 are released on the way out.
//!
//! A job and its data source must agree on the `Inputs`/`Outputs` types,
//! so a stage can never be handed data of the wrong shape.

use crate::{
    config::HarnessConfig,
    error::{ReconError, ReconResult},
    types::Timestamp,
};
use chrono::Utc;

/// Where a job's inputs come from and where its outputs go.
pub trait DataSource {
    type Inputs;
    type Outputs;

    /// Shared lock: other readers allowed, no writers until released.
    fn lock_read(&mut self, job_id: &str) -> ReconResult<()>;

    /// Exclusive lock.
    fn lock_write(&mut self, job_id: &str) -> ReconResult<()>;

    /// Release whatever `job_id` locked.
    fn unlock(&mut self, _job_id: &str) -> ReconResult<()> {
        Ok(())
    }

    fn inputs(&mut self) -> ReconResult<Self::Inputs>;

    /// Apply all outputs atomically.
    fn commit(&mut self, outputs: Self::Outputs) -> ReconResult<()>;
}

pub trait Job {
    type Inputs;
    type Outputs;

    /// Stable id, used for logging and as lock holder.
    fn id(&self) -> &str;

    /// Process inputs into outputs to be committed. `now` is the
    /// harness start time.
    fn run(&self, inputs: Self::Inputs, now: Timestamp) -> ReconResult<Self::Outputs>;
}

/// Run `job` against `ds` with the current time as start time.
pub fn start<J, D>(job: &J, ds: &mut D, conf: HarnessConfig) -> ReconResult<()>
where
    J: Job,
    D: DataSource<Inputs = J::Inputs, Outputs = J::Outputs>,
{
    start_at(job, ds, conf, Utc::now())
}

pub fn start_at<J, D>(job: &J, ds: &mut D, conf: HarnessConfig, now: Timestamp) -> ReconResult<()>
where
    J: Job,
    D: DataSource<Inputs = J::Inputs, Outputs = J::Outputs>,
{
    let id = job.id();
    log::info!("starting job {id}");

    if conf.lock_read && conf.lock_write {
        return Err(ReconError::ConflictingLockConfig { job: id.to_string() });
    }

    if conf.lock_read {
        ds.lock_read(id)
            .inspect_err(|e| log::error!("failed to lock read for job {id}: {e}"))?;
    } else if conf.lock_write {
        ds.lock_write(id)
            .inspect_err(|e| log::error!("failed to lock write for job {id}: {e}"))?;
    }

    let result = run_stages(job, ds, now);

    if conf.lock_read || conf.lock_write {
        if let Err(e) = ds.unlock(id) {
            log::warn!("failed to release locks for job {id}: {e}");
        }
    }

    result
}

fn run_stages<J, D>(job: &J, ds: &mut D, now: Timestamp) -> ReconResult<()>
where
    J: Job,
    D: DataSource<Inputs = J::Inputs, Outputs = J::Outputs>,
{
    let id = job.id();

    let inputs = ds
        .inputs()
        .inspect_err(|e| log::error!("failed to get inputs for job {id}: {e}"))?;

    let outputs = job
        .run(inputs, now)
        .inspect_err(|e| log::error!("failed to run job {id}: {e}"))?;

    ds.commit(outputs)
        .inspect_err(|e| log::error!("failed to commit results from job {id}: {e}"))?;

    log::info!("job {id} committed");
    Ok(())
}
