//! In-memory stand-ins for the relational store.

mod message;

pub use message::{ChannelSeed, InMemoryMessageRepository, SeedError};
