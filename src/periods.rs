use jiff::civil::Date;
use jiff::ToSpan;

/// Contiguous calendar-month windows `(first_day, last_day)` starting at
/// `start` and stopping before `cutoff_year`.  The first window begins at
/// `start` itself, so a mid-month start produces a short first window.
/// Used to seed one-time backfills.
pub fn calendar_months(start: Date, cutoff_year: i16) -> Vec<(Date, Date)> {
    let mut windows: Vec<(Date, Date)> = Vec::new();
    let mut current = start;
    while current.year() < cutoff_year {
        windows.push((current, current.last_of_month()));
        current = current.last_of_month().saturating_add(1.day());
    }
    windows
}

/// The two report windows for one steady-state pipeline pass.
/// Orders are replaced on a rolling trailing-30-day window, earnings on the
/// current month-to-date.
#[derive(Debug, PartialEq, Clone, Copy)]
pub struct PipelineWindows {
    pub orders_from: Date,
    pub earnings_from: Date,
    pub to: Date,
}

impl PipelineWindows {
    pub fn for_today(today: Date) -> PipelineWindows {
        PipelineWindows {
            orders_from: today.saturating_sub(30.days()),
            earnings_from: today.first_of_month(),
            to: today,
        }
    }
}

#[cfg(test)]
mod tests {
    use jiff::civil::date;

    use super::*;

    #[test]
    fn calendar_months_2019() {
        let windows = calendar_months(date(2019, 1, 1), 2020);
        assert_eq!(windows.len(), 12);
        assert_eq!(windows[0], (date(2019, 1, 1), date(2019, 1, 31)));
        assert_eq!(windows[1], (date(2019, 2, 1), date(2019, 2, 28)));
        assert_eq!(windows[11], (date(2019, 12, 1), date(2019, 12, 31)));
    }

    #[test]
    fn calendar_months_mid_month_start() {
        let windows = calendar_months(date(2019, 11, 15), 2020);
        assert_eq!(windows.len(), 2);
        assert_eq!(windows[0], (date(2019, 11, 15), date(2019, 11, 30)));
        assert_eq!(windows[1], (date(2019, 12, 1), date(2019, 12, 31)));
    }

    #[test]
    fn calendar_months_empty_past_cutoff() {
        assert!(calendar_months(date(2020, 1, 1), 2020).is_empty());
    }

    #[test]
    fn windows_for_today() {
        let windows = PipelineWindows::for_today(date(2019, 11, 15));
        assert_eq!(windows.orders_from, date(2019, 10, 16));
        assert_eq!(windows.earnings_from, date(2019, 11, 1));
        assert_eq!(windows.to, date(2019, 11, 15));
    }
}
