pub mod raffle_closer;

pub use raffle_closer::{close_ended_raffles, spawn_raffle_closer};
