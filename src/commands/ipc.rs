//! One-shot server commands.
//!
//! - `update` - Push a partial drill state
//! - `get` - Print the current drill state as JSON
//! - `status` - Show server health

use drillview::client::{send_command, ClientError};
use drillview::geo::Position;
use drillview::{format_uptime, DrillState, HealthStatus, IpcCommand, IpcCommandKind, IpcResponse};
use std::path::Path;
use std::process::ExitCode;

/// Parses `lon,lat` or `lon,lat,height`.
pub(crate) fn parse_position(s: &str) -> Result<Position, String> {
    let parts: Vec<&str> = s.split(',').map(str::trim).collect();
    if !(2..=3).contains(&parts.len()) {
        return Err(format!("expected lon,lat[,height], got '{}'", s));
    }
    let mut values = [0.0_f64; 3];
    for (slot, part) in values.iter_mut().zip(&parts) {
        *slot = part
            .parse()
            .map_err(|_| format!("'{}' is not a number", part))?;
    }
    let p = Position::new(values[0], values[1], values[2]);
    if !p.is_valid() {
        return Err(format!("position out of range: '{}'", s));
    }
    Ok(p)
}

/// Parses a JSON array of `[lon, lat]` / `[lon, lat, height]` arrays.
pub(crate) fn parse_path(json: &str) -> Result<Vec<Position>, String> {
    serde_json::from_str(json).map_err(|e| format!("invalid path: {}", e))
}

fn load_path_file(path: &Path) -> Result<Vec<Position>, String> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| format!("cannot read {}: {}", path.display(), e))?;
    parse_path(&content)
}

fn request(server: &str, cmd: &IpcCommand) -> Result<IpcResponse, ClientError> {
    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    rt.block_on(send_command(server, cmd))
}

fn report(server: &str, e: &ClientError) -> ExitCode {
    match e {
        ClientError::ConnectionFailed { .. } => {
            eprintln!("Error: server not running (cannot connect to {})", server);
        }
        other => eprintln!("Error: {}", other),
    }
    ExitCode::FAILURE
}

/// Sends UPDATE and prints the merged state.
pub(crate) fn run_update_command(
    server: &str,
    bit: Option<Position>,
    md: Option<f64>,
    path: Option<String>,
    path_file: Option<&Path>,
) -> ExitCode {
    let path = match (path, path_file) {
        (Some(json), _) => Some(parse_path(&json)),
        (None, Some(file)) => Some(load_path_file(file)),
        (None, None) => None,
    }
    .transpose();
    let path = match path {
        Ok(p) => p,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    if bit.is_none() && md.is_none() && path.is_none() {
        eprintln!("Error: nothing to update, pass --bit, --md or --path");
        return ExitCode::FAILURE;
    }

    let cmd = IpcCommand::update(DrillState { bit, path, md });
    match request(server, &cmd) {
        Ok(resp) => {
            print_data(resp.data);
            ExitCode::SUCCESS
        }
        Err(e) => report(server, &e),
    }
}

/// Sends GET and prints the state as JSON.
pub(crate) fn run_get_command(server: &str) -> ExitCode {
    match request(server, &IpcCommand::new(IpcCommandKind::Get)) {
        Ok(resp) => {
            print_data(resp.data);
            ExitCode::SUCCESS
        }
        Err(e) => report(server, &e),
    }
}

fn print_data(data: Option<serde_json::Value>) {
    if let Some(data) = data {
        match serde_json::to_string_pretty(&data) {
            Ok(s) => println!("{}", s),
            Err(e) => eprintln!("Error: failed to format response: {}", e),
        }
    }
}

/// Sends STATUS and displays health info.
///
/// Returns `ExitCode::FAILURE` when the server is unreachable.
pub(crate) fn run_status_command(server: &str) -> ExitCode {
    let resp = match request(server, &IpcCommand::new(IpcCommandKind::Status)) {
        Ok(resp) => resp,
        Err(ClientError::ConnectionFailed { .. }) => {
            println!("drillview server");
            println!("  Status:      not running");
            return ExitCode::FAILURE;
        }
        Err(e) => return report(server, &e),
    };

    let Some(data) = resp.data else {
        eprintln!("Unexpected response: no data in STATUS response");
        return ExitCode::FAILURE;
    };
    match serde_json::from_value::<HealthStatus>(data) {
        Ok(health) => {
            let memory_str = match health.memory_mb {
                Some(mb) => format!("{:.1} MB", mb),
                None => "N/A".to_string(),
            };
            println!("drillview server");
            println!("  Status:      running");
            println!("  Uptime:      {}", format_uptime(health.uptime_seconds));
            println!("  Path:        {} points", health.path_points);
            println!("  MD:          {:.1} m", health.md);
            println!(
                "  Connections: {} open, {} subscribed",
                health.connections, health.subscribers
            );
            println!("  Memory:      {}", memory_str);
            println!("  Listen:      {}", health.listen_addr);
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Failed to parse health data: {}", e);
            ExitCode::FAILURE
        }
    }
}
