//! Logging setup for the command-line build.

use colored::Colorize;
use env_logger::{Builder, Env};
use log::Level;
use std::io::Write;

/// Initializes the global logger. The filter comes from `RUST_LOG` and
/// defaults to `info`; `quiet` raises it to warnings and errors only.
pub fn init_logging(quiet: bool) {
    let default_filter = match quiet {
        true => "warn",
        false => "info",
    };
    let logging_env = Env::default().filter_or("RUST_LOG", default_filter);
    Builder::from_env(logging_env)
        .format(|buf, record| {
            let level = match record.level() {
                Level::Error => "error".red().bold(),
                Level::Warn => "warn".yellow().bold(),
                Level::Info => "info".green(),
                Level::Debug => "debug".blue(),
                Level::Trace => "trace".dimmed(),
            };
            writeln!(
                buf,
                "{} {} {}",
                chrono::Local::now().format("%H:%M:%S").to_string().dimmed(),
                level,
                record.args()
            )
        })
        .init();
}
