//! チャンネル・メッセージストアの実装
//!
//! `MessageRepository` trait（ドメイン層）の実装です。現在はインメモリ実装のみで、
//! JSON シードファイルからチャンネルとメンバーを読み込みます。

pub mod inmemory;

pub use inmemory::{ChannelSeed, InMemoryMessageRepository, SeedError};
