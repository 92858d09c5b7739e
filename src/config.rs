use std::time::Duration;

use clap::Parser;

/// Command-line configuration.
#[derive(Parser, Debug, Clone)]
#[command(name = "handover-visualization")]
#[command(version, about = "Live handover manager topology and parameter panel")]
pub struct Config {
    /// Base URL of the controller REST API
    #[arg(short, long, default_value = "http://127.0.0.1:8888")]
    pub server: String,

    /// Tenant whose handover manager is shown
    #[arg(short, long)]
    pub tenant_id: String,

    /// Delay between the end of one poll and the start of the next
    #[arg(long, default_value_t = 1000)]
    pub poll_interval_ms: u64,

    /// Initial window width
    #[arg(long, default_value_t = 1130.0)]
    pub width: f32,

    /// Initial window height
    #[arg(long, default_value_t = 750.0)]
    pub height: f32,

    /// Log filter used when RUST_LOG is not set
    #[arg(long, default_value = "info")]
    pub log_level: String,
}

impl Config {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::try_parse_from(["handover-visualization", "--tenant-id", "t1"]).unwrap();
        assert_eq!(config.server, "http://127.0.0.1:8888");
        assert_eq!(config.tenant_id, "t1");
        assert_eq!(config.poll_interval(), Duration::from_millis(1000));
        assert_eq!((config.width, config.height), (1130.0, 750.0));
        assert_eq!(config.log_level, "info");
    }

    #[test]
    fn test_tenant_is_required() {
        assert!(Config::try_parse_from(["handover-visualization"]).is_err());
    }

    #[test]
    fn test_overrides() {
        let config = Config::try_parse_from([
            "handover-visualization",
            "-s",
            "http://controller:8888",
            "-t",
            "t2",
            "--poll-interval-ms",
            "250",
        ])
        .unwrap();
        assert_eq!(config.server, "http://controller:8888");
        assert_eq!(config.poll_interval(), Duration::from_millis(250));
    }
}
