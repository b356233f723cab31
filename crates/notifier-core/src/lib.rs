//! notifier-core
//!
//! Nomad のイベントストリームを購読し、選択したイベントを
//! observability 系の Sink（InfluxDB, Splunk HEC）へ転送するためのコア。
//!
//! # モジュール構成
//! - **domain**: トピック正規化、フィルタ、イベント、分類、time-series ポイント
//! - **ports**: 抽象化レイヤー（EventSource, Sink, PointWriter, Clock）
//! - **impls**: 実装（NomadEventStream, InfluxWriter, TimeSeriesSink, SplunkSink, InMemoryEventSource）
//! - **app**: dispatch ループと構築（Dispatcher, DispatcherBuilder, ErrorPolicy）

pub mod app;
pub mod domain;
pub mod impls;
pub mod ports;
