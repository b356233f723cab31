//! Impls - ports の実装
//!
//! # 含まれる実装
//! - **NomadEventStream**: Nomad の event stream（本番用 EventSource）
//! - **InMemoryEventSource**: 開発・テスト用の EventSource
//! - **InfluxWriter**: InfluxDB v2 write API への PointWriter
//! - **TimeSeriesSink**: Deployment → ポイントの Sink
//! - **SplunkSink**: Splunk HEC への Sink

pub mod influx_writer;
pub mod inmem_source;
pub mod nomad_stream;
pub mod splunk_sink;
pub mod timeseries_sink;

#[cfg(test)]
pub(crate) mod test_http;

// 主要な型を再エクスポート
pub use self::influx_writer::{InfluxConfig, InfluxWriter};
pub use self::inmem_source::InMemoryEventSource;
pub use self::nomad_stream::{NomadConfig, NomadEventStream};
pub use self::splunk_sink::{SplunkConfig, SplunkSink};
pub use self::timeseries_sink::TimeSeriesSink;
