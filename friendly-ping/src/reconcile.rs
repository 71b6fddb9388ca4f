//! Keeps directory keys in step with canonical addresses reported by the
//! push backend.

use tracing::{info, warn};

use crate::{directory::Directory, notification::Target, transport::DeliveryReport};

/// `(old, new)` address pairs implied by `report` for a send to `target`.
///
/// Results are matched to recipients by position. Topic sends never yield
/// pairs, and neither do results whose canonical address is empty or
/// unchanged.
pub fn canonical_rewrites(target: &Target, report: &DeliveryReport) -> Vec<(String, String)> {
    if report.canonical_ids == 0 {
        return Vec::new();
    }

    let recipients: &[String] = match target {
        Target::Address(address) => std::slice::from_ref(address),
        Target::Multicast(addresses) => addresses,
        Target::Topic(_) => return Vec::new(),
    };

    recipients
        .iter()
        .zip(&report.results)
        .filter_map(|(old, result)| {
            let new = result.registration_id.as_deref()?;
            (!new.is_empty() && new != old.as_str()).then(|| (old.clone(), new.to_string()))
        })
        .collect()
}

/// Applies every rewrite in `report` to `directory`.
///
/// Best effort: a rewrite that cannot be applied is logged and skipped.
pub async fn reconcile(directory: &Directory, target: &Target, report: &DeliveryReport) {
    for (old, new) in canonical_rewrites(target, report) {
        match directory.rekey(&old, &new).await {
            Ok(()) => info!(%old, %new, "client delivery address replaced by canonical id"),
            Err(err) => warn!(%old, %new, error = %err, "failed to apply canonical id"),
        }
    }
}
