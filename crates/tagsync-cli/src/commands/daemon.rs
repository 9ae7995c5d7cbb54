use super::config::load_config;
use super::AppContext;
use crate::logging;
use crate::output::Output;
use color_eyre::Result;
use std::sync::Arc;
use tagsync_config::PathManager;
use tagsync_core::{ConfigSource, RealtimeTagger, TaskManager, TAG_SYNC_TASK_KEY};
use tagsync_web::AppState;
use tokio_cron_scheduler::{Job, JobScheduler};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

/// Build one cron job per default trigger of every registered task.
async fn build_scheduler(manager: &Arc<TaskManager>) -> Result<JobScheduler> {
    let scheduler = JobScheduler::new().await?;

    for task in manager.tasks() {
        for trigger in task.default_triggers() {
            let cron = trigger.cron_expression();
            let key = task.key().to_string();
            let jobs = manager.clone();
            let job = Job::new_async(cron.as_str(), move |_uuid, _lock| {
                let jobs = jobs.clone();
                let key = key.clone();
                Box::pin(async move {
                    info!(operation = "scheduled_sync_start", key = %key, "Starting scheduled run");
                    if let Err(e) = jobs.trigger(&key) {
                        warn!(operation = "scheduled_sync_skipped", key = %key, error = %e, "Scheduled run skipped");
                    }
                })
            })
            .map_err(|e| color_eyre::eyre::eyre!("Failed to create job for cron '{}': {}", cron, e))?;
            scheduler.add(job).await?;

            info!(
                operation = "scheduler_job_added",
                key = task.key(),
                cron = %cron,
                "Scheduled '{}'",
                task.display_name()
            );
        }
    }

    Ok(scheduler)
}

pub async fn run_daemon(no_startup_sync: bool, verbose: u8, quiet: bool, output: &Output) -> Result<()> {
    let paths = PathManager::default();
    paths
        .ensure_directories()
        .map_err(|e| color_eyre::eyre::eyre!("Failed to create data directories: {}", e))?;
    let log_file = paths.daemon_log_file();
    logging::init_logging_with_file(verbose, quiet, Some(&log_file)).map_err(|e| color_eyre::eyre::eyre!("{}", e))?;

    let config = load_config(&paths, output)?;
    let config_file = paths.config_file();
    let ctx = AppContext::open(&paths, ConfigSource::File(config_file.clone()), config.scheduler.daily_hour).await?;

    let shutdown = CancellationToken::new();
    let mut manager = TaskManager::new(shutdown.child_token());
    manager.register(ctx.task.clone());
    let manager = Arc::new(manager);

    let realtime = {
        let tagger = RealtimeTagger::new(ctx.catalog.clone(), ctx.cache.clone());
        let events = ctx.catalog.subscribe();
        let cancel = shutdown.clone();
        tokio::spawn(async move { tagger.run(events, cancel).await })
    };

    let mut scheduler = build_scheduler(&manager).await?;
    scheduler.start().await?;

    let web = if config.server.enabled {
        let state = AppState {
            fetcher: ctx.fetcher.clone(),
            config: ConfigSource::File(config_file),
            tasks: manager.clone(),
            run_state: ctx.run_state.clone(),
        };
        let bind = config.server.bind.clone();
        let cancel = shutdown.clone();
        Some(tokio::spawn(async move {
            if let Err(e) = tagsync_web::serve(&bind, state, cancel).await {
                error!(operation = "web_error", error = %e, "HTTP query surface stopped");
            }
        }))
    } else {
        None
    };

    info!(
        operation = "daemon_started",
        log_file = %log_file.display(),
        daily_hour = config.scheduler.daily_hour,
        "Daemon started"
    );
    output.success(format!(
        "tagsync daemon running (daily sync at {:02}:00). Press Ctrl-C to stop.",
        config.scheduler.daily_hour
    ));

    if config.scheduler.run_on_startup && !no_startup_sync {
        info!(operation = "scheduler_startup", "Running initial sync on startup");
        if let Err(e) = manager.trigger(TAG_SYNC_TASK_KEY) {
            warn!("Startup sync not started: {}", e);
        }
    }

    tokio::signal::ctrl_c().await?;
    info!(operation = "daemon_stopping", "Shutdown requested");

    shutdown.cancel();
    manager.shutdown();
    if let Err(e) = scheduler.shutdown().await {
        warn!("Scheduler did not shut down cleanly: {}", e);
    }
    if let Err(e) = realtime.await {
        warn!("Real-time tagger task ended abnormally: {}", e);
    }
    if let Some(web) = web {
        if let Err(e) = web.await {
            warn!("HTTP task ended abnormally: {}", e);
        }
    }

    output.info("Daemon stopped.");
    Ok(())
}
