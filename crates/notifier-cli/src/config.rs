//! Settings assembled from flags and the process environment.

use eyre::{Result, bail};
use notifier_core::app::{ErrorPolicy, SinkFailurePolicy};
use notifier_core::domain::{JobFilter, Subscription, TopicFilter};
use notifier_core::impls::nomad_stream::DEFAULT_ADDRESS;
use notifier_core::impls::{InfluxConfig, NomadConfig, SplunkConfig};

use crate::cli::Cli;

#[derive(Debug, Clone)]
pub struct Settings {
    pub nomad: NomadConfig,
    pub influx: Option<InfluxConfig>,
    pub splunk: Option<SplunkConfig>,
    pub subscription: Subscription,
    pub policy: ErrorPolicy,
}

impl Settings {
    pub fn from_env(cli: &Cli) -> Result<Self> {
        Self::load(cli, |key| std::env::var(key).ok())
    }

    /// `lookup` resolves environment variables (injectable for tests).
    pub fn load(cli: &Cli, lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        if !cli.influxdb && !cli.splunk {
            bail!("Please specify at least one output using the --influxdb or --splunk flags");
        }

        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let require = |key: &str| match get(key) {
            Some(v) => Ok(v),
            None => Err(eyre::eyre!("{key} must be set")),
        };

        let influx = if cli.influxdb {
            Some(InfluxConfig {
                url: require("INFLUXDB_URL")?,
                token: require("INFLUXDB_TOKEN")?,
                org: require("INFLUXDB_ORG")?,
                bucket: require("INFLUXDB_BUCKET")?,
            })
        } else {
            None
        };

        let splunk = if cli.splunk {
            let mut config = SplunkConfig::new(require("SPLUNK_HEC_ENDPOINT")?, require("SPLUNK_HEC_TOKEN")?);
            config.insecure_skip_verify = cli.splunk_insecure;
            Some(config)
        } else {
            None
        };

        let nomad = NomadConfig {
            address: get("NOMAD_ADDR").unwrap_or_else(|| DEFAULT_ADDRESS.to_string()),
            token: get("NOMAD_TOKEN"),
            namespace: get("NOMAD_NAMESPACE"),
            ..NomadConfig::default()
        };

        let topics = TopicFilter::parse(&cli.topics);
        if topics.is_empty() {
            bail!("--topics must name at least one topic");
        }
        let subscription =
            Subscription::new(topics, JobFilter::new(cli.job_name.as_str())).with_start_index(cli.start_index);

        let policy = ErrorPolicy {
            on_sink_error: if cli.fail_fast {
                SinkFailurePolicy::FailFast
            } else {
                SinkFailurePolicy::Continue
            },
            max_consecutive_stream_errors: cli.max_stream_errors,
        };

        Ok(Self {
            nomad,
            influx,
            splunk,
            subscription,
            policy,
        })
    }
}
