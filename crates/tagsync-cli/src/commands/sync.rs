use super::config::load_config;
use super::sync_ui::SyncUI;
use super::AppContext;
use crate::output::{new_table, Output};
use color_eyre::Result;
use tagsync_config::PathManager;
use tagsync_core::{ConfigSource, SyncReport};
use tokio_util::sync::CancellationToken;

pub async fn run_sync(dry_run: bool, output: &Output) -> Result<()> {
    tracing::debug!("Sync command started");

    let paths = PathManager::default();
    let mut config = load_config(&paths, output)?;
    if dry_run {
        config.sync.dry_run = true;
    }
    let daily_hour = config.scheduler.daily_hour;
    let ctx = AppContext::open(&paths, ConfigSource::Static(Box::new(config)), daily_hour).await?;

    let cancel = CancellationToken::new();
    let ctrl_c = {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::warn!("Interrupt received, cancelling sync");
                cancel.cancel();
            }
        })
    };

    let ui = SyncUI::new();
    let result = ctx.task.run_sync(&cancel, &ui).await;
    ctrl_c.abort();

    let report = match result {
        Ok(report) => {
            ui.finish("Done");
            report
        }
        Err(e) => {
            ui.abandon();
            return Err(color_eyre::eyre::eyre!("Sync operation failed: {}", e));
        }
    };

    if output.is_human() {
        output.table(&report_table(&report));
        let status = ctx.run_state.status();
        if report.dry_run {
            output.success(format!("Dry run finished, no changes applied: {}", status));
        } else {
            output.success(format!(
                "Sync completed: {} tags added, {} removed across {} items",
                report.tags_added, report.tags_removed, report.items_updated
            ));
        }
    } else {
        output.json(&serde_json::json!({
            "success": true,
            "status": ctx.run_state.status().to_string(),
            "report": report,
        }));
    }

    Ok(())
}

fn report_table(report: &SyncReport) -> comfy_table::Table {
    let mut table = new_table(vec!["", "Count"]);
    for (label, value) in [
        ("Rules processed", report.rules_processed),
        ("Rules skipped (schedule)", report.rules_skipped),
        ("Rules failed", report.rules_failed),
        ("Tags added", report.tags_added),
        ("Tags removed", report.tags_removed),
        ("Items updated", report.items_updated),
        ("Collections created", report.groups_created),
        ("Collection members added", report.group_members_added),
        ("Collections deleted", report.groups_deleted),
    ] {
        table.add_row(vec![label.to_string(), value.to_string()]);
    }
    table
}
