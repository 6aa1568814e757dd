use std::collections::HashSet;

use chrono::NaiveDate;

use crate::model::holiday::HolidayEntry;
use crate::model::member::Location;

/// Holiday dates that apply to one location, own-location and `Both` entries
/// alike.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HolidayCalendar {
    dates: HashSet<NaiveDate>,
}

impl HolidayCalendar {
    /// Entries scoped to another location are skipped.
    pub fn for_location<'a>(
        location: Location,
        entries: impl IntoIterator<Item = &'a HolidayEntry>,
    ) -> Self {
        let dates = entries
            .into_iter()
            .filter(|entry| entry.location.applies_to(location))
            .map(|entry| entry.date)
            .collect();
        Self { dates }
    }

    pub fn is_holiday(&self, date: NaiveDate) -> bool {
        self.dates.contains(&date)
    }
}
