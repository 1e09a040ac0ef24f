//! Plain-text report for `votewatch preview`.

use std::fmt::Write;

use votewatch_core::{ProposalId, RecordPolicy};
use votewatch_runner::Preview;

fn join(ids: &[ProposalId]) -> String {
    if ids.is_empty() {
        return "-".into();
    }
    ids.iter().map(ProposalId::as_str).collect::<Vec<_>>().join(", ")
}

pub fn preview_report(preview: &Preview, policy: RecordPolicy) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Open proposals ({}): {}", preview.remote.len(), join(&preview.remote));
    let _ = writeln!(out, "New ({}): {}", preview.to_notify.len(), join(&preview.to_notify));
    if policy == RecordPolicy::Lifecycle {
        let _ = writeln!(out, "Would notify ({}): {}", preview.pending.len(), join(&preview.pending));
    }
    let _ = writeln!(out, "Expired ({}): {}", preview.dropped.len(), join(&preview.dropped));
    let _ = writeln!(out, "Next state: {} record(s)", preview.next_state.len());
    out
}
