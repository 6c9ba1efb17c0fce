//! Balanced category assignment.

use tracing::{info, warn};

use crate::domain::{CategoryTally, PieType};
use crate::remote::MembershipStore;

/// Category for the next registrant given the current tally.
///
/// Sweet wins ties so the result is deterministic from an empty sheet.
pub fn balance(tally: CategoryTally) -> PieType {
    if tally.sweet_count <= tally.savory_count {
        PieType::Sweet
    } else {
        PieType::Savory
    }
}

/// Fetch a fresh tally and balance against it, falling back to sweet when
/// the store cannot be read.
///
/// Two clients reading the same tally will both get the same answer; the
/// store is the only source of truth and nothing here serializes them.
pub fn assign_category(store: &dyn MembershipStore) -> PieType {
    match store.fetch_tally() {
        Ok(tally) => {
            let pie = balance(tally);
            info!(sweet = tally.sweet_count, savory = tally.savory_count, %pie, "assigned category");
            pie
        }
        Err(err) => {
            warn!(error = %err, "failed to read pie counts, defaulting to sweet");
            PieType::Sweet
        }
    }
}
