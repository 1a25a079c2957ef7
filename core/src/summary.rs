//! Summary recomputation

use crate::model::{ResultEntry, Status, Summary};

/// Tally entries by status
///
/// Statuses outside the five known ones are not counted.
pub fn summarize<'a, I>(entries: I) -> Summary
where
    I: IntoIterator<Item = &'a ResultEntry>,
{
    let mut summary = Summary::default();

    for entry in entries {
        match entry.result {
            Status::Pass => summary.pass += 1,
            Status::Fail => summary.fail += 1,
            Status::Warn => summary.warn += 1,
            Status::Error => summary.error += 1,
            Status::Skip => summary.skip += 1,
            Status::Other(_) => {}
        }
    }

    summary
}
