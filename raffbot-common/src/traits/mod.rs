pub mod platform_traits;

pub use platform_traits::{RaffleNotifier, SubscriptionVerifier};
