pub mod raffle;

pub use raffle::{ParticipantKey, Raffle, DEFAULT_WINNER_COUNT};
