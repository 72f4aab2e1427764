use staff_directory::{
    BackgroundTasks, Config, DirectoryState, TaskKind, print_banner, run_log_cleanup,
    setup_environment,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Configuration (.env first, then the process environment)
    dotenv::dotenv().ok();
    let config = Config::from_env();

    // Work dir and logging
    setup_environment(&config)?;
    print_banner();
    tracing::info!(environment = %config.environment, "Staff directory starting...");

    // Database, snapshot worker, registry
    let mut tasks = BackgroundTasks::new();
    if let Some(dir) = &config.log_dir {
        tasks.spawn(
            "log_cleanup",
            TaskKind::Periodic,
            run_log_cleanup(dir.into(), tasks.shutdown_token()),
        );
    }

    let state = match DirectoryState::initialize(config, &mut tasks).await {
        Ok(state) => state,
        Err(e) => {
            tracing::error!("Startup failed: {e:#}");
            tasks.shutdown().await;
            return Err(e);
        }
    };

    tracing::info!(
        employees = state.directory.registry().count(),
        database = %state.config.database_path.display(),
        snapshot = %state.config.snapshot_path.display(),
        "Staff directory running, press Ctrl+C to stop"
    );

    // Ctrl+C: the snapshot worker flushes pending requests before exiting
    tokio::signal::ctrl_c().await?;
    tracing::info!("Shutdown signal received");
    tasks.shutdown().await;
    state.db.pool.close().await;

    Ok(())
}
