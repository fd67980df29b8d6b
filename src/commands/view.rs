//! `view` subcommand: opens the terminal viewer.

use drillview::config::schema::Config;
use drillview::config::xdg::expand_tilde;
use drillview::daemon::logging;
use drillview::tui::app::App;
use std::process::ExitCode;

pub(crate) fn run_view_command(config: &Config, server: Option<String>, no_connect: bool) -> ExitCode {
    let viewer = &config.viewer;
    if let Err(e) = viewer.validate() {
        eprintln!("Config error: {e}");
        return ExitCode::FAILURE;
    }
    let tick_rate = match viewer.tick_rate() {
        Ok(rate) => rate,
        Err(e) => {
            eprintln!("Config error: {e}");
            return ExitCode::FAILURE;
        }
    };

    let log_file = (!viewer.log_file.is_empty()).then(|| expand_tilde(&viewer.log_file));
    if let Err(e) = logging::init_viewer(viewer.log_level, log_file.as_deref()) {
        eprintln!("Error: cannot open log file: {}", e);
        return ExitCode::FAILURE;
    }

    let server = server.unwrap_or_else(|| viewer.server.clone());
    let rt = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("Error: failed to create tokio runtime: {}", e);
            return ExitCode::FAILURE;
        }
    };
    let result = rt.block_on(async {
        let mut app = App::new(server, viewer.pipe_settings())
            .with_auto_connect(viewer.auto_connect && !no_connect)
            .with_tick_rate(tick_rate);
        app.run().await
    });
    if let Err(e) = result {
        eprintln!("TUI error: {}", e);
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}
