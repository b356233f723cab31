//! Domain model (topics, filters, events, typed resources, points).
//!
//! 外部システムに依存しない純粋なデータと判定ロジックのみを置きます。
//! - topic: 購読トピックの正規化
//! - filter: job 名フィルタと購読条件
//! - event: ストリームのワイヤーフォーマット（Envelope / Event）
//! - resources: Deployment / Node / Job の型付きビュー
//! - classify: 優先順位付きの試行デコードによる分類
//! - point: time-series ポイントと line protocol

pub mod classify;
pub mod event;
pub mod filter;
pub mod point;
pub mod resources;
pub mod topic;

pub use self::classify::{ClassifiedEvent, TypedEvent, classify};
pub use self::event::{Envelope, Event, EventKind, KindCounts};
pub use self::filter::{JobFilter, Subscription};
pub use self::point::{FieldValue, Point};
pub use self::resources::{Deployment, DeploymentState, Job, Node};
pub use self::topic::{TopicFilter, normalize_topic};
