use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard};

use log::{debug, warn};

use crate::models::job::JobRecord;

/// Jobs saved through the API while the server runs. Bounded: once full the
/// oldest job is dropped to make room.
pub struct SavedJobs {
    capacity: usize,
    jobs: Mutex<VecDeque<JobRecord>>,
}

impl SavedJobs {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            jobs: Mutex::new(VecDeque::with_capacity(capacity.min(64))),
        }
    }

    fn lock(&self) -> MutexGuard<'_, VecDeque<JobRecord>> {
        self.jobs.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Stores `job` and returns how many jobs are now held.
    pub fn push(&self, job: JobRecord) -> usize {
        let mut jobs = self.lock();
        if jobs.len() == self.capacity
            && let Some(evicted) = jobs.pop_front()
        {
            warn!(
                "saved jobs full ({}), dropping oldest: {}",
                self.capacity, evicted.title
            );
        }
        debug!("saving job: {}", job.title);
        jobs.push_back(job);
        jobs.len()
    }

    /// Oldest first.
    pub fn list(&self) -> Vec<JobRecord> {
        self.lock().iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn job(title: &str) -> JobRecord {
        JobRecord {
            title: title.to_string(),
            ..JobRecord::default()
        }
    }

    #[test]
    fn keeps_duplicates_in_order() {
        let saved = SavedJobs::new(10);
        assert!(saved.is_empty());
        assert_eq!(saved.push(job("Cook")), 1);
        assert_eq!(saved.push(job("Cook")), 2);
        assert_eq!(saved.push(job("Nurse")), 3);

        let titles: Vec<_> = saved.list().into_iter().map(|j| j.title).collect();
        assert_eq!(titles, vec!["Cook", "Cook", "Nurse"]);
    }

    #[test]
    fn evicts_oldest_at_capacity() {
        let saved = SavedJobs::new(2);
        saved.push(job("first"));
        saved.push(job("second"));
        assert_eq!(saved.push(job("third")), 2);

        let titles: Vec<_> = saved.list().into_iter().map(|j| j.title).collect();
        assert_eq!(titles, vec!["second", "third"]);
    }

    #[test]
    fn zero_capacity_still_holds_one() {
        let saved = SavedJobs::new(0);
        saved.push(job("a"));
        saved.push(job("b"));
        assert_eq!(saved.len(), 1);
    }
}
