use alloy::primitives::U256;

const USER_REJECTION_PHRASES: [&str; 3] = ["user rejected", "user denied", "action_rejected"];

/// Wallets report a declined signature only through the error text.
pub fn is_user_rejection(message: &str) -> bool {
    let message = message.to_lowercase();
    USER_REJECTION_PHRASES
        .iter()
        .any(|phrase| message.contains(phrase))
}

pub fn u256_to_u64(value: U256) -> u64 {
    value.saturating_to::<u64>()
}
