use std::{process, sync::Arc};

use clap::Parser;
use log::{debug, error, info, warn};
use tokio::sync::Mutex;

use memora::{App, Cli, Config, NoteStore, PersistenceWorker, Result, StateFile, SystemClock};

pub fn initialize_logger(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .format_timestamp_secs()
        .format_module_path(true)
        .init();

    info!("Logger initialized");
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    initialize_logger(cli.verbose);

    if let Err(e) = run(cli).await {
        error!("{}", e);
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let mut config = Config::load(cli.config.as_deref())?;
    if let Some(data_dir) = cli.data_dir {
        config.data_dir = data_dir;
    }

    info!("Application starting up");
    let file = StateFile::in_dir(&config.data_dir);
    let state = file.load()?.unwrap_or_default();

    let (mut worker, handle) = PersistenceWorker::spawn(file, config.persist_debounce());
    let mut store =
        NoteStore::from_state(state, Arc::new(SystemClock)).with_sink(Box::new(handle));
    if cli.command.is_read_only() {
        debug!("Skipping startup housekeeping for a read-only command");
    } else {
        store.on_startup(config.seed_position());
    }
    let store = Arc::new(Mutex::new(store));

    let app = App::new(Arc::clone(&store), config, cli.verbose);
    let outcome = app.run(cli.command).await;

    // Everything queued so far must reach disk before we report
    let flushed = worker.shutdown().await;
    if let Err(e) = store.lock().await.check_persistence() {
        warn!("{}", e);
    }

    info!("Application shutting down");
    outcome.and(flushed)
}
