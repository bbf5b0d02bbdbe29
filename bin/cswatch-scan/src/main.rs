use std::{sync::Arc, time::Duration};

use cswatch_common::{env::parse_env_or, logging};
use cswatch_explorer::{ActivityScanner, DeadlineBound, ExplorerClient, ScanError, ScannerConfig};
use cswatch_lockwatch::{DeadlockCanary, KeyedLocks};
use cswatch_tasks::TaskManager;
use tokio::runtime::Handle;
use tracing::*;

use crate::{args::Args, helpers::*};

mod args;
mod errors;
mod helpers;

const SHUTDOWN_TIMEOUT_ENVVAR: &str = "CSWATCH_SHUTDOWN_TIMEOUT_MS";
const DEFAULT_SHUTDOWN_TIMEOUT_MS: u64 = 5_000;

fn main() -> anyhow::Result<()> {
    let args: Args = argh::from_env();
    if let Err(e) = main_inner(args) {
        eprintln!("FATAL ERROR: {e}");
        return Err(e);
    }

    Ok(())
}

fn main_inner(args: Args) -> anyhow::Result<()> {
    // Start runtime for async IO tasks.
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .thread_name("cswatch-rt")
        .build()?;

    // Init the logging before we do anything else.
    init_logging(runtime.handle());

    let config = get_config(&args)?;
    info!(network = ?config.network, explorer = %config.explorer_url(), "loaded config");

    let task_manager = TaskManager::new(runtime.handle().clone());
    let executor = task_manager.executor();
    let shutdown = task_manager.shutdown_signal();

    let locks = Arc::new(KeyedLocks::new());
    let canary = DeadlockCanary::new(
        locks.clone(),
        executor.clone(),
        canary_config(&config.canary),
    );
    for key in config.canary.keys.iter().chain(args.watch.iter()) {
        canary.watch(key);
    }

    let client = ExplorerClient::new(
        config.explorer_url(),
        Duration::from_millis(config.explorer.request_timeout_ms),
    )?;
    let client = DeadlineBound::new(client, Duration::from_millis(config.provider.deadline_ms));
    let scanner = ActivityScanner::new(
        client,
        config.network,
        ScannerConfig::from(&config.explorer),
    );

    let address = args.address;
    let from_block = args.from_block;
    executor.spawn_critical_async_with_shutdown("activity-scan", move |guard| async move {
        let _held = locks.lock(&scan_lock_key(&address)).await;

        match scanner.scan_until(&address, from_block, &guard).await {
            Ok(heights) => {
                info!(%address, found = heights.len(), "activity scan finished");
                println!("{}", serde_json::to_string(&heights)?);
            }
            Err(ScanError::Cancelled) => return Ok(()),
            Err(e) => return Err(e.into()),
        }

        // Nothing else to do once the result is out.
        shutdown.send();
        Ok(())
    });

    task_manager.start_signal_listeners();
    let shutdown_timeout = parse_env_or(SHUTDOWN_TIMEOUT_ENVVAR, DEFAULT_SHUTDOWN_TIMEOUT_MS);
    task_manager.monitor(Some(Duration::from_millis(shutdown_timeout)))?;

    info!("exiting");
    logging::finalize();
    Ok(())
}

fn init_logging(rt: &Handle) {
    let lconfig = logging::LoggerConfig::from_env("cswatch-scan");

    // The batch exporter spawns onto the ambient runtime.
    let _g = rt.enter();
    logging::init(lconfig);
}
