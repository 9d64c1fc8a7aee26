use scorehawk::{
    app,
    bootstrap::{needs_setup, run_initial_setup, setup_summary},
    config::load_settings,
    logging,
};
use std::{
    env,
    process::ExitCode,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
};

fn main() -> ExitCode {
    let _log_guard = logging::init();

    let root_dir = match env::current_dir() {
        Ok(dir) => dir,
        Err(e) => {
            tracing::error!("Could not determine working directory: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let settings = match load_settings(&root_dir) {
        Ok(settings) => settings,
        Err(e) => {
            tracing::error!("{}", e);
            return ExitCode::FAILURE;
        }
    };

    if needs_setup(&settings) {
        tracing::info!("First run detected, running initial setup");
        match run_initial_setup(&settings) {
            Ok(()) => println!("\n{}\n", setup_summary(&settings)),
            Err(e) => {
                tracing::error!("Setup failed: {}", e);
                eprintln!("\nSetup failed: {e}");
                eprintln!("Make sure you're running this from your BizHawk directory.");
                return ExitCode::FAILURE;
            }
        }
    } else {
        tracing::info!("Setup already completed, starting high score tracker");
    }

    let shutdown = Arc::new(AtomicBool::new(false));
    let handler_flag = Arc::clone(&shutdown);
    if let Err(e) = ctrlc::set_handler(move || handler_flag.store(true, Ordering::SeqCst)) {
        tracing::warn!("Could not install Ctrl-C handler: {}", e);
    }

    match app::run(settings, shutdown) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("Unexpected error: {}", e);
            ExitCode::FAILURE
        }
    }
}
