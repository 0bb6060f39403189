/**
 * Unique timestamp allocation per calendar date
 *
 * The first file of a date gets midnight. Every later file of the same date
 * gets the previous timestamp plus one second, or plus one millisecond once
 * a whole day of seconds has been used up. State lives only for one run.
 */

use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};
use log::{debug, warn};
use std::collections::HashMap;

use crate::error::AllocationError;

#[derive(Debug, Default)]
pub struct TimestampAllocator {
    last_used: HashMap<NaiveDate, NaiveDateTime>,
}

impl TimestampAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Assign the next timestamp for `date` and remember it as the bucket baseline.
    pub fn allocate(&mut self, date: NaiveDate) -> Result<NaiveDateTime, AllocationError> {
        let assigned = match self.last_used.get(&date) {
            None => date.and_time(NaiveTime::MIN),
            Some(&last) => next_in_day(date, last)?,
        };

        debug!("Allocated {} for bucket {}", assigned, date);
        self.last_used.insert(date, assigned);
        Ok(assigned)
    }

    /// Last timestamp handed out for `date` in this run.
    pub fn last_allocated(&self, date: NaiveDate) -> Option<NaiveDateTime> {
        self.last_used.get(&date).copied()
    }

    pub fn bucket_count(&self) -> usize {
        self.last_used.len()
    }
}

fn next_in_day(date: NaiveDate, last: NaiveDateTime) -> Result<NaiveDateTime, AllocationError> {
    let by_second = last + Duration::seconds(1);
    if by_second.date() == date {
        return Ok(by_second);
    }

    let by_milli = last + Duration::milliseconds(1);
    if by_milli.date() == date {
        warn!("Date {} ran out of whole seconds, using millisecond steps", date);
        return Ok(by_milli);
    }

    Err(AllocationError::BucketExhausted(date))
}
