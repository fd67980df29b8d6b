//! Health status reported by the trajectory server's STATUS command.

/// Health status response from the server STATUS command.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct HealthStatus {
    /// Server uptime in seconds.
    pub uptime_seconds: u64,
    /// Count of open client connections.
    pub connections: usize,
    /// Count of live SUB streams.
    pub subscribers: usize,
    /// Number of points in the stored trajectory.
    pub path_points: usize,
    /// Current measured depth in metres.
    pub md: f64,
    /// Process memory usage in MB (None if unavailable).
    pub memory_mb: Option<f64>,
    /// Address the server listens on.
    pub listen_addr: String,
}

/// Formats a duration in seconds to a human-readable string.
///
/// Returns "Xh Ym" for durations >= 1 hour, "Xm" otherwise.
pub fn format_uptime(seconds: u64) -> String {
    let hours = seconds / 3600;
    let minutes = (seconds % 3600) / 60;
    if hours > 0 {
        format!("{}h {}m", hours, minutes)
    } else {
        format!("{}m", minutes)
    }
}

/// Queries the current process memory usage via sysinfo.
///
/// Returns the RSS in megabytes, or None if the process cannot be found.
pub fn get_memory_usage_mb() -> Option<f64> {
    use sysinfo::{Pid, System};

    let pid = Pid::from_u32(std::process::id());
    let mut sys = System::new();
    sys.refresh_processes(sysinfo::ProcessesToUpdate::Some(&[pid]), true);
    sys.process(pid)
        .map(|proc_info| proc_info.memory() as f64 / 1024.0 / 1024.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_uptime() {
        assert_eq!(format_uptime(59), "0m");
        assert_eq!(format_uptime(125), "2m");
        assert_eq!(format_uptime(3600 + 15 * 60), "1h 15m");
    }

    #[test]
    fn test_memory_usage_is_positive() {
        if let Some(mb) = get_memory_usage_mb() {
            assert!(mb > 0.0);
        }
    }

    #[test]
    fn test_health_status_round_trips() {
        let status = HealthStatus {
            uptime_seconds: 42,
            connections: 2,
            subscribers: 1,
            path_points: 10,
            md: 123.5,
            memory_mb: None,
            listen_addr: "127.0.0.1:8000".to_string(),
        };
        let json = serde_json::to_value(&status).unwrap();
        assert_eq!(json["listen_addr"], "127.0.0.1:8000");
        let back: HealthStatus = serde_json::from_value(json).unwrap();
        assert_eq!(back, status);
    }
}
