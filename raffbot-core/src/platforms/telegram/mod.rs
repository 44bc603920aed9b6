// File: src/platforms/telegram/mod.rs

pub mod client;
pub mod types;

pub use client::{TelegramClient, UnconfiguredPlatform, DEFAULT_API_BASE};
