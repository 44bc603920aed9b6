pub mod join_service;
pub mod raffle_service;

pub use join_service::{JoinError, JoinService};
pub use raffle_service::{NewRaffle, RaffleService};
