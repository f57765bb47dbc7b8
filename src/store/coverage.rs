//! Data-coverage statistics over a set of canonical records.

use std::collections::HashSet;
use std::fmt;

use serde::Serialize;

use crate::record::CanonicalRecord;

/// How complete the collected data is.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CoverageStats {
    pub total: usize,
    pub unique_cities: usize,
    pub with_phone: usize,
    pub with_email: usize,
    pub with_website: usize,
    pub with_rating: usize,
    pub active: usize,
}

impl CoverageStats {
    /// Count coverage over `records`.
    ///
    /// Cities are compared by their folded key, so `"Den Haag"` and
    /// `"den haag"` count once.
    #[must_use]
    pub fn from_records(records: &[CanonicalRecord]) -> Self {
        let mut cities = HashSet::new();
        let mut stats = Self {
            total: records.len(),
            ..Self::default()
        };

        for canonical in records {
            let record = &canonical.record;
            cities.insert(record.city_key());
            stats.with_phone += usize::from(record.phone.is_some());
            stats.with_email += usize::from(record.email.is_some());
            stats.with_website += usize::from(record.website.is_some());
            stats.with_rating += usize::from(record.rating.is_some());
            stats.active += usize::from(canonical.is_active);
        }

        stats.unique_cities = cities.len();
        stats
    }

    /// Share of `count` in `total`, as a percentage.
    #[must_use]
    pub fn percent(&self, count: usize) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            count as f64 * 100.0 / self.total as f64
        }
    }
}

impl fmt::Display for CoverageStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Total schools:  {}", self.total)?;
        writeln!(f, "Unique cities:  {}", self.unique_cities)?;
        for (label, count) in [
            ("With phone:", self.with_phone),
            ("With email:", self.with_email),
            ("With website:", self.with_website),
            ("With rating:", self.with_rating),
        ] {
            writeln!(f, "{label:<15} {count} ({:.1}%)", self.percent(count))?;
        }
        write!(f, "Active:         {}", self.active)
    }
}
