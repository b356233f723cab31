//! PointWriter port - time-series DB への書き込み
//!
//! `write_point` はバッファに積むだけ（fire-and-forget）、
//! `flush` でまとめて送出します。

use async_trait::async_trait;

use super::sink::WriteError;
use crate::domain::Point;

#[async_trait]
pub trait PointWriter: Send {
    fn write_point(&mut self, point: Point);

    async fn flush(&mut self) -> Result<(), WriteError>;
}
