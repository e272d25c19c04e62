//! Dashboard figures over a set of requests.
//!
//! Approved aggregates include `completed` requests: a completed request is
//! an approved one that has also been fulfilled.
use super::request::Request;
use super::status::Status;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestSummary {
    pub total: usize,
    pub by_status: BTreeMap<Status, usize>,
    pub approved: usize,
    pub approved_cost_total: u64,
    /// Mean over approved requests that carry an estimated cost.
    pub approved_cost_average: Option<u64>,
}

impl RequestSummary {
    pub fn from_requests(requests: &[Request]) -> Self {
        let mut summary = Self {
            total: requests.len(),
            ..Self::default()
        };
        let mut costed = 0u64;

        for request in requests {
            *summary.by_status.entry(request.status).or_default() += 1;

            if !request.status.counts_as_approved() {
                continue;
            }
            summary.approved += 1;
            if let Some(cost) = request.logistics.estimated_cost {
                summary.approved_cost_total = summary.approved_cost_total.saturating_add(cost);
                costed += 1;
            }
        }

        summary.approved_cost_average = summary.approved_cost_total.checked_div(costed);
        summary
    }

    pub fn count(&self, status: Status) -> usize {
        self.by_status.get(&status).copied().unwrap_or(0)
    }
}
