//! Ports - 抽象化レイヤー
//!
//! Hexagonal Architecture の「ポート」を定義します。
//! 外部システム（Nomad, InfluxDB, Splunk HEC）への接続はすべてここの trait
//! 越しに行い、dispatcher は具象型を知りません。

pub mod clock;
pub mod event_source;
pub mod point_writer;
pub mod sink;

pub use self::clock::{Clock, FixedClock, SystemClock};
pub use self::event_source::{EventSource, SourceError, StreamItem};
pub use self::point_writer::PointWriter;
pub use self::sink::{Sink, SinkError, WriteError};
