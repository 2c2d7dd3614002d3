use crate::error::{PipelineError, Result};
use crate::structs::Season;
use chrono::{Datelike, Local, NaiveDate};

/// Source of the current calendar date.
pub trait Clock {
    fn today(&self) -> NaiveDate;
}

/// Reads the local system date.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn today(&self) -> NaiveDate {
        Local::now().date_naive()
    }
}

/// Always reports the same date.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub NaiveDate);

impl Clock for FixedClock {
    fn today(&self) -> NaiveDate {
        self.0
    }
}

/// Maps a calendar month (1-12) to its season.
///
/// # Arguments
///
/// * `month` - Calendar month, January = 1
///
/// # Returns
///
/// Returns winter for 12, 1, 2; spring for 3-5; summer for 6-8; autumn for 9-11.
///
/// # Errors
///
/// Returns `PipelineError::InvalidMonth` for any month outside 1-12.
pub fn season_for_month(month: u32) -> Result<Season> {
    match month {
        12 | 1 | 2 => Ok(Season::Winter),
        3..=5 => Ok(Season::Spring),
        6..=8 => Ok(Season::Summer),
        9..=11 => Ok(Season::Autumn),
        _ => Err(PipelineError::InvalidMonth(month)),
    }
}

/// Season of the clock's current date.
pub fn current_season(clock: &dyn Clock) -> Result<Season> {
    season_for_month(clock.today().month())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_month_maps_to_its_season() {
        let expected = [
            (1, Season::Winter),
            (2, Season::Winter),
            (3, Season::Spring),
            (4, Season::Spring),
            (5, Season::Spring),
            (6, Season::Summer),
            (7, Season::Summer),
            (8, Season::Summer),
            (9, Season::Autumn),
            (10, Season::Autumn),
            (11, Season::Autumn),
            (12, Season::Winter),
        ];
        for (month, season) in expected {
            assert_eq!(season_for_month(month).unwrap(), season, "month {}", month);
        }
    }

    #[test]
    fn out_of_range_month_is_an_error() {
        assert!(matches!(season_for_month(0), Err(PipelineError::InvalidMonth(0))));
        assert!(matches!(season_for_month(13), Err(PipelineError::InvalidMonth(13))));
    }

    #[test]
    fn current_season_follows_the_clock() {
        let clock = FixedClock(NaiveDate::from_ymd_opt(2024, 7, 15).unwrap());
        assert_eq!(current_season(&clock).unwrap(), Season::Summer);

        let clock = FixedClock(NaiveDate::from_ymd_opt(2023, 12, 31).unwrap());
        assert_eq!(current_season(&clock).unwrap(), Season::Winter);
    }
}
