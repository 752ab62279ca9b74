//! Resolution statistics.

use std::fmt;
use std::ops::AddAssign;

use serde::{Deserialize, Serialize};

/// Running counters for a resolution batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolutionStats {
    /// Every usage entry seen, including excluded ones
    pub total_api_calls: u64,

    /// Calls with at least one matched function
    pub matched_api_calls_count: u64,

    /// Calls with exactly one matched function
    pub matched_apis_with_exactly_one_function: u64,

    /// Calls on the nonexistent-API list
    pub api_in_black_list: u64,

    /// Calls on the hard-to-resolve list, or default-export calls
    pub api_in_hard_list: u64,

    /// Calls on the result of another call
    pub api_of_api_count: u64,
}

impl ResolutionStats {
    pub fn new() -> Self {
        ResolutionStats::default()
    }

    /// Fold another batch's counters into this one.
    pub fn merge(&mut self, other: &ResolutionStats) -> &mut Self {
        self.total_api_calls += other.total_api_calls;
        self.matched_api_calls_count += other.matched_api_calls_count;
        self.matched_apis_with_exactly_one_function +=
            other.matched_apis_with_exactly_one_function;
        self.api_in_black_list += other.api_in_black_list;
        self.api_in_hard_list += other.api_in_hard_list;
        self.api_of_api_count += other.api_of_api_count;
        self
    }

    /// Record the outcome of resolving one call.
    pub fn record_resolved(&mut self, unique_matches: usize) {
        if unique_matches > 0 {
            self.matched_api_calls_count += 1;
        }
        if unique_matches == 1 {
            self.matched_apis_with_exactly_one_function += 1;
        }
    }

    /// Calls skipped by any exclusion rule.
    pub fn excluded(&self) -> u64 {
        self.api_in_black_list + self.api_in_hard_list + self.api_of_api_count
    }
}

impl AddAssign for ResolutionStats {
    fn add_assign(&mut self, other: ResolutionStats) {
        self.merge(&other);
    }
}

impl fmt::Display for ResolutionStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "total api calls:               {}", self.total_api_calls)?;
        writeln!(f, "calls with matches:            {}", self.matched_api_calls_count)?;
        writeln!(
            f,
            "calls with exactly one match:  {}",
            self.matched_apis_with_exactly_one_function
        )?;
        writeln!(f, "nonexistent-api exclusions:    {}", self.api_in_black_list)?;
        writeln!(f, "hard-to-resolve exclusions:    {}", self.api_in_hard_list)?;
        write!(f, "api-of-api exclusions:         {}", self.api_of_api_count)
    }
}
