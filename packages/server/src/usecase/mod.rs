//! UseCase 層
//!
//! ビジネスロジックを実装するレイヤー。
//! UI 層から呼び出され、Domain 層と Infrastructure 層を操作します。

pub mod admit_connection;
pub mod error;
pub mod relay_frame;
pub mod send_message;

pub use admit_connection::AdmitConnectionUseCase;
pub use error::{AdmissionError, RelayError, SendMessageError};
pub use relay_frame::RelayFrameUseCase;
pub use send_message::{FanOutReport, SendMessageUseCase};
