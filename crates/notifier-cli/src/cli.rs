use clap::{Parser, ValueEnum};

/// Log level when `RUST_LOG` is not set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
    Off,
}

impl LogLevel {
    pub fn as_filter(&self) -> log::LevelFilter {
        match self {
            LogLevel::Trace => log::LevelFilter::Trace,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Off => log::LevelFilter::Off,
        }
    }
}

#[derive(Debug, Parser)]
#[command(
    name = "nomad-notifier",
    about = "Forward Nomad event stream events to InfluxDB and/or Splunk HEC",
    version,
    after_help = "Environment:\n  NOMAD_ADDR, NOMAD_TOKEN, NOMAD_NAMESPACE\n  INFLUXDB_URL, INFLUXDB_TOKEN, INFLUXDB_ORG, INFLUXDB_BUCKET\n  SPLUNK_HEC_ENDPOINT, SPLUNK_HEC_TOKEN"
)]
pub struct Cli {
    /// Send deployment data to InfluxDB
    #[arg(long)]
    pub influxdb: bool,

    /// Send events to Splunk HEC
    #[arg(long)]
    pub splunk: bool,

    /// Comma-separated list of topics to subscribe to
    #[arg(long, default_value = "Deployment,Node,Job")]
    pub topics: String,

    /// Only forward events for this job (empty = all jobs)
    #[arg(long = "job-name", alias = "job_name", default_value = "")]
    pub job_name: String,

    /// Event stream index to start from
    #[arg(long, default_value_t = 0)]
    pub start_index: u64,

    /// Exit on the first sink failure instead of logging and continuing
    #[arg(long)]
    pub fail_fast: bool,

    /// Exit after this many consecutive event stream errors
    #[arg(long)]
    pub max_stream_errors: Option<u32>,

    /// Skip TLS certificate verification for Splunk HEC (trial/internal use only)
    #[arg(long)]
    pub splunk_insecure: bool,

    #[arg(long, value_enum, default_value_t = LogLevel::Info)]
    pub log_level: LogLevel,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let cli = Cli::try_parse_from(["nomad-notifier"]).unwrap();
        assert!(!cli.influxdb);
        assert!(!cli.splunk);
        assert_eq!(cli.topics, "Deployment,Node,Job");
        assert_eq!(cli.job_name, "");
        assert_eq!(cli.start_index, 0);
        assert!(!cli.splunk_insecure);
        assert_eq!(cli.log_level, LogLevel::Info);
    }

    #[test]
    fn parses_all_flags() {
        let cli = Cli::try_parse_from([
            "nomad-notifier",
            "--influxdb",
            "--splunk",
            "--topics",
            "deployment, node",
            "--job_name",
            "web",
            "--start-index",
            "120",
            "--fail-fast",
            "--max-stream-errors",
            "5",
            "--splunk-insecure",
            "--log-level",
            "debug",
        ])
        .unwrap();
        assert!(cli.influxdb && cli.splunk && cli.fail_fast && cli.splunk_insecure);
        assert_eq!(cli.topics, "deployment, node");
        assert_eq!(cli.job_name, "web");
        assert_eq!(cli.start_index, 120);
        assert_eq!(cli.max_stream_errors, Some(5));
        assert_eq!(cli.log_level.as_filter(), log::LevelFilter::Debug);
    }
}
