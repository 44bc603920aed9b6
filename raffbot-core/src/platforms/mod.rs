// File: src/platforms/mod.rs

pub mod telegram;

pub use telegram::{TelegramClient, UnconfiguredPlatform};
