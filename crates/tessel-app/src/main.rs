//! The `tessel` binary: streams and meshes terrain around a scripted viewer
//! and reports what a renderer would draw.

use std::process::ExitCode;
use std::time::Duration;

use clap::Parser;
use tessel_app::{AppError, FIXED_DT, GameLoop, PlatformDirs, Session};
use tessel_config::{CliArgs, Config};

fn main() -> ExitCode {
    let args = CliArgs::parse();
    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("tessel: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: &CliArgs) -> Result<(), AppError> {
    let dirs = match &args.config {
        Some(root) => PlatformDirs::resolve_with_root(root),
        None => PlatformDirs::resolve()?,
    };
    dirs.create_dirs()?;

    let mut config = Config::load_or_create(&dirs.config_dir)?;
    let mut on_disk = config.clone();
    config.apply_cli_overrides(args);

    tessel_log::init_logging(Some(&dirs.log_dir), cfg!(debug_assertions), Some(&config));
    tracing::info!(
        config_dir = %dirs.config_dir.display(),
        log_dir = %dirs.log_dir.display(),
        ticks = config.viewer.ticks,
        "tessel starting"
    );

    let mut session = Session::new(&config);
    let mut game_loop = GameLoop::new();
    let report_every = (1.0 / FIXED_DT).round() as u64;
    let mut next_report = report_every;

    while game_loop.update_count() < config.viewer.ticks {
        game_loop.tick(|dt, _| session.update(dt));
        session.render();

        if game_loop.update_count() >= next_report {
            next_report += report_every;
            session.log_summary(game_loop.total_sim_time());
            match on_disk.reload(&dirs.config_dir) {
                Ok(Some(changed)) => {
                    tracing::info!("config.ron changed on disk; restart to apply");
                    on_disk = changed;
                }
                Ok(None) => {}
                Err(e) => tracing::warn!("could not re-read config: {e}"),
            }
        }

        std::thread::sleep(Duration::from_millis(2));
    }

    session.render();
    session.log_summary(game_loop.total_sim_time());
    session.shutdown();
    tracing::info!(
        frames = game_loop.frame_count(),
        updates = game_loop.update_count(),
        "tessel finished"
    );
    Ok(())
}
