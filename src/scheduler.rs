use crate::{jobs::all_jobs, state::AppState};
use tokio_cron_scheduler::{Job, JobScheduler, JobSchedulerError};

pub async fn initialize_scheduler(state: AppState) -> Result<JobScheduler, JobSchedulerError> {
    let scheduler = JobScheduler::new().await?;

    for app_job in all_jobs(state.get_config()) {
        if !app_job.enabled() {
            tracing::info!("job {} disabled", app_job.name());
            continue;
        }

        let job_state = state.clone();
        let cron = app_job.cron_expression().to_string();
        let name = app_job.name().to_string();

        let job = Job::new_async(cron.as_str(), move |_uuid, _l| {
            let job_state = job_state.clone();
            let app_job = app_job.clone();
            Box::pin(async move {
                app_job.run(job_state).await;
            })
        })?;

        scheduler.add(job).await?;
        tracing::info!("job {} scheduled at `{}`", name, cron);
    }

    scheduler.start().await?;

    Ok(scheduler)
}
