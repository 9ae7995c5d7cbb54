use crate::output::Output;
use color_eyre::Result;
use std::fs;
use std::path::Path;
use tagsync_config::PathManager;

pub fn run_clear(all: bool, cache: bool, history: bool, output: &Output) -> Result<()> {
    let paths = PathManager::default();

    if !(all || cache || history) {
        output.warn("No clear option specified. Use --cache, --history, or --all");
        output.info("\nExample: tagsync clear --cache");
        return Ok(());
    }

    if all || cache {
        remove_file(&paths.tag_cache_file(), "tag cache", output)?;
    }
    if all || history {
        remove_file(&paths.tag_history_file(), "tag history", output)?;
        remove_file(&paths.group_history_file(), "collection history", output)?;
    }
    Ok(())
}

fn remove_file(path: &Path, label: &str, output: &Output) -> Result<()> {
    if !path.exists() {
        output.info(format!("No {} found to clear", label));
        return Ok(());
    }
    fs::remove_file(path)
        .map_err(|e| color_eyre::eyre::eyre!("Failed to remove {} at {}: {}", label, path.display(), e))?;
    output.success(format!("Cleared {}: {}", label, path.display()));
    Ok(())
}
