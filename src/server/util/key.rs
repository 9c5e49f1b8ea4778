use std::collections::HashSet;

use rand::{distr::Alphanumeric, Rng};

use crate::server::config::limits::LICENSE_KEY_LENGTH;

/// Generates a random alphanumeric license key.
pub fn generate_key() -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(LICENSE_KEY_LENGTH)
        .map(char::from)
        .collect()
}

/// Generates `amount` license keys with no duplicates inside the batch.
///
/// Uniqueness against keys already stored is enforced by the `(guild_id, key)` unique index.
pub fn generate_keys(amount: usize) -> Vec<String> {
    let mut seen = HashSet::with_capacity(amount);
    let mut keys = Vec::with_capacity(amount);

    while keys.len() < amount {
        let key = generate_key();
        if seen.insert(key.clone()) {
            keys.push(key);
        }
    }

    keys
}
