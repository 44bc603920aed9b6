// src/lib.rs

pub mod api;
pub mod http;
pub mod platforms;
pub mod services;
pub mod store;
pub mod tasks;
pub mod test_utils;

pub use raffbot_common::error::Error;
pub use self::http::{DefaultHttpClient, HttpClient};
pub use store::RaffleStore;
