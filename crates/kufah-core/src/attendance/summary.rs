use crate::models::{AttendanceRecord, AttendanceStatus};

/// Per-status counts over a set of attendance records.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AttendanceSummary {
    pub in_person: u32,
    pub online: u32,
    pub recording: u32,
    pub absent: u32,
}

impl AttendanceSummary {
    pub fn from_statuses<I>(statuses: I) -> Self
    where
        I: IntoIterator<Item = AttendanceStatus>,
    {
        statuses.into_iter().fold(Self::default(), |mut acc, status| {
            acc.add(status);
            acc
        })
    }

    pub fn from_records<'a, I>(records: I) -> Self
    where
        I: IntoIterator<Item = &'a AttendanceRecord>,
    {
        Self::from_statuses(records.into_iter().map(|r| r.status))
    }

    pub fn add(&mut self, status: AttendanceStatus) {
        match status {
            AttendanceStatus::InPerson => self.in_person += 1,
            AttendanceStatus::Online => self.online += 1,
            AttendanceStatus::Recording => self.recording += 1,
            AttendanceStatus::Absent => self.absent += 1,
        }
    }

    pub fn count(&self, status: AttendanceStatus) -> u32 {
        match status {
            AttendanceStatus::InPerson => self.in_person,
            AttendanceStatus::Online => self.online,
            AttendanceStatus::Recording => self.recording,
            AttendanceStatus::Absent => self.absent,
        }
    }

    pub fn attended(&self) -> u32 {
        self.in_person + self.online + self.recording
    }

    pub fn total(&self) -> u32 {
        self.attended() + self.absent
    }

    /// Attended share of all sessions, 0-100, rounded half-up. Zero sessions is 0%.
    pub fn percentage(&self) -> u32 {
        let total = u64::from(self.total());
        if total == 0 {
            return 0;
        }
        let attended = u64::from(self.attended());
        ((200 * attended + total) / (2 * total)) as u32
    }
}

impl std::ops::Add for AttendanceSummary {
    type Output = AttendanceSummary;

    fn add(self, other: AttendanceSummary) -> AttendanceSummary {
        AttendanceSummary {
            in_person: self.in_person + other.in_person,
            online: self.online + other.online,
            recording: self.recording + other.recording,
            absent: self.absent + other.absent,
        }
    }
}

/// Mean of several percentages, rounded half-up. An empty set is 0.
pub fn average_percentage<I>(percentages: I) -> u32
where
    I: IntoIterator<Item = u32>,
{
    let (sum, count) = percentages
        .into_iter()
        .fold((0u64, 0u64), |(sum, count), p| (sum + u64::from(p), count + 1));
    if count == 0 {
        0
    } else {
        ((2 * sum + count) / (2 * count)) as u32
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use AttendanceStatus::*;

    fn summary(a: u32, b: u32, c: u32, d: u32) -> AttendanceSummary {
        AttendanceSummary {
            in_person: a,
            online: b,
            recording: c,
            absent: d,
        }
    }

    #[test]
    fn test_empty_is_zero_percent() {
        let empty = AttendanceSummary::from_statuses(Vec::new());
        assert_eq!(empty.total(), 0);
        assert_eq!(empty.percentage(), 0);
    }

    #[test]
    fn test_counts_each_status() {
        let s = AttendanceSummary::from_statuses([InPerson, Online, Absent, Recording, InPerson]);
        assert_eq!(s, summary(2, 1, 1, 1));
        assert_eq!(s.count(InPerson), 2);
        assert_eq!(s.attended(), 4);
        assert_eq!(s.percentage(), 80);
    }

    #[test]
    fn test_order_independent() {
        let forward = AttendanceSummary::from_statuses([Absent, Online, Recording]);
        let backward = AttendanceSummary::from_statuses([Recording, Online, Absent]);
        assert_eq!(forward, backward);
    }

    #[test]
    fn test_percentage_rounds_half_up() {
        // 1/3 = 33.33 -> 33, 2/3 = 66.67 -> 67, 1/8 = 12.5 -> 13
        assert_eq!(summary(1, 0, 0, 2).percentage(), 33);
        assert_eq!(summary(1, 1, 0, 1).percentage(), 67);
        assert_eq!(summary(0, 0, 1, 7).percentage(), 13);
        assert_eq!(summary(0, 0, 0, 4).percentage(), 0);
        assert_eq!(summary(3, 0, 0, 0).percentage(), 100);
    }

    #[test]
    fn test_percentage_matches_float_rounding() {
        for a in 0..6u32 {
            for b in 0..4u32 {
                for c in 0..4u32 {
                    for d in 0..6u32 {
                        let s = summary(a, b, c, d);
                        let total = a + b + c + d;
                        let expected = if total == 0 {
                            0
                        } else {
                            (100.0 * f64::from(a + b + c) / f64::from(total) + 0.5).floor() as u32
                        };
                        assert_eq!(s.percentage(), expected, "counts {a} {b} {c} {d}");
                    }
                }
            }
        }
    }

    #[test]
    fn test_add_and_average() {
        assert_eq!(summary(1, 0, 0, 1) + summary(0, 2, 1, 0), summary(1, 2, 1, 1));
        assert_eq!(average_percentage([50, 67]), 59);
        assert_eq!(average_percentage([]), 0);
    }
}
