//! [`Stay`] definitions.

use common::Date;

#[cfg(doc)]
use crate::domain::Reservation;

/// Half-open `[check_in, check_out)` interval of nights of a [`Reservation`].
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct Stay {
    /// [`Date`] of the first night.
    check_in: Date,

    /// [`Date`] of the departure, not spent as a night.
    check_out: Date,
}

impl Stay {
    /// Creates a new [`Stay`] if `check_in` strictly precedes `check_out`.
    #[must_use]
    pub fn new(check_in: Date, check_out: Date) -> Option<Self> {
        (check_in < check_out).then_some(Self {
            check_in,
            check_out,
        })
    }

    /// Returns the check-in [`Date`] of this [`Stay`].
    #[must_use]
    pub const fn check_in(&self) -> Date {
        self.check_in
    }

    /// Returns the check-out [`Date`] of this [`Stay`].
    #[must_use]
    pub const fn check_out(&self) -> Date {
        self.check_out
    }

    /// Returns the number of nights in this [`Stay`].
    #[must_use]
    pub fn nights(&self) -> u32 {
        // Never negative, because `check_in < check_out`.
        u32::try_from(self.check_in.days_until(self.check_out))
            .unwrap_or(u32::MAX)
    }

    /// Indicates whether this [`Stay`] shares at least one night with the
    /// `other` one.
    ///
    /// Checking out on the day another [`Stay`] checks in is not an overlap.
    #[must_use]
    pub fn overlaps(&self, other: &Self) -> bool {
        self.check_in < other.check_out && other.check_in < self.check_out
    }
}

#[cfg(test)]
mod spec {
    use common::Date;

    use super::Stay;

    fn stay(from: &str, to: &str) -> Stay {
        Stay::new(from.parse::<Date>().unwrap(), to.parse().unwrap()).unwrap()
    }

    #[test]
    fn requires_check_out_after_check_in() {
        let day = "2025-03-01".parse::<Date>().unwrap();

        assert!(Stay::new(day, day).is_none());
        assert!(Stay::new(day.checked_add_days(1).unwrap(), day).is_none());
        assert!(Stay::new(day, day.checked_add_days(1).unwrap()).is_some());
    }

    #[test]
    fn counts_nights() {
        assert_eq!(stay("2025-03-01", "2025-03-04").nights(), 3);
        assert_eq!(stay("2025-02-28", "2025-03-01").nights(), 1);
    }

    #[test]
    fn detects_overlaps() {
        let booked = stay("2025-03-01", "2025-03-04");

        assert!(booked.overlaps(&stay("2025-03-02", "2025-03-03")));
        assert!(booked.overlaps(&stay("2025-02-27", "2025-03-02")));
        assert!(booked.overlaps(&stay("2025-03-03", "2025-03-10")));
        assert!(booked.overlaps(&stay("2025-02-01", "2025-04-01")));
        assert!(booked.overlaps(&booked));
    }

    #[test]
    fn touching_stays_do_not_overlap() {
        let booked = stay("2025-03-01", "2025-03-04");

        assert!(!booked.overlaps(&stay("2025-03-04", "2025-03-06")));
        assert!(!booked.overlaps(&stay("2025-02-25", "2025-03-01")));
        assert!(!stay("2025-03-04", "2025-03-06").overlaps(&booked));
    }
}
