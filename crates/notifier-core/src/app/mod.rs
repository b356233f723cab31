//! App - アプリケーション層
//!
//! ports を組み合わせて dispatch ループを実装します。
//!
//! # 主要コンポーネント
//! - **DispatcherBuilder**: 構築とワイヤリング（起動時検証）
//! - **Dispatcher**: 受信 → 分類 → フィルタ → Sink への振り分け
//! - **ErrorPolicy**: Sink 失敗・ストリームエラー時の振る舞い
//! - **DispatchStats**: 停止時に出す集計値

pub mod builder;
pub mod dispatcher;
pub mod policy;
pub mod status;

#[cfg(test)]
pub(crate) mod testing;

// 主要な型を再エクスポート
pub use self::builder::{BuildError, DispatcherBuilder};
pub use self::dispatcher::{DispatchError, DispatchReport, Dispatcher, LoopState, StopReason};
pub use self::policy::{ErrorPolicy, SinkFailurePolicy};
pub use self::status::DispatchStats;
