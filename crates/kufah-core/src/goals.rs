//! Daily ibadah goal tracking.
//!
//! A `GoalBoard` holds one row per student: the student's thresholds
//! (editable locally until saved) and the counts logged for the day.

use crate::models::{DailyProgress, GoalThresholds, Student};

/// One of the three tracked devotional counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GoalCounter {
    Salawat,
    Adhkar,
    Istighfar,
}

impl GoalCounter {
    pub const ALL: [GoalCounter; 3] = [GoalCounter::Salawat, GoalCounter::Adhkar, GoalCounter::Istighfar];

    pub fn label(&self) -> &'static str {
        match self {
            GoalCounter::Salawat => "Salawat",
            GoalCounter::Adhkar => "Adhkar",
            GoalCounter::Istighfar => "Istighfar",
        }
    }

    pub fn next(&self) -> GoalCounter {
        match self {
            GoalCounter::Salawat => GoalCounter::Adhkar,
            GoalCounter::Adhkar => GoalCounter::Istighfar,
            GoalCounter::Istighfar => GoalCounter::Salawat,
        }
    }

    pub fn prev(&self) -> GoalCounter {
        match self {
            GoalCounter::Salawat => GoalCounter::Istighfar,
            GoalCounter::Adhkar => GoalCounter::Salawat,
            GoalCounter::Istighfar => GoalCounter::Adhkar,
        }
    }
}

/// Shortfall against a goal, never negative.
pub fn remaining(goal: u32, done: u32) -> u32 {
    goal.saturating_sub(done)
}

/// Parse typed goal input: non-numbers become 0, fractions are floored,
/// negatives clamp to 0.
pub fn clamp_goal_input(input: &str) -> u32 {
    match input.trim().parse::<f64>() {
        Ok(value) if value.is_finite() && value > 0.0 => value.floor().min(f64::from(u32::MAX)) as u32,
        _ => 0,
    }
}

impl GoalThresholds {
    pub fn get(&self, counter: GoalCounter) -> u32 {
        match counter {
            GoalCounter::Salawat => self.salawat,
            GoalCounter::Adhkar => self.adhkar,
            GoalCounter::Istighfar => self.istighfar,
        }
    }

    pub fn set(&mut self, counter: GoalCounter, value: u32) {
        match counter {
            GoalCounter::Salawat => self.salawat = value,
            GoalCounter::Adhkar => self.adhkar = value,
            GoalCounter::Istighfar => self.istighfar = value,
        }
    }
}

impl DailyProgress {
    pub fn done(&self, counter: GoalCounter) -> u32 {
        match counter {
            GoalCounter::Salawat => self.salawat_done,
            GoalCounter::Adhkar => self.adhkar_done,
            GoalCounter::Istighfar => self.istighfar_done,
        }
    }
}

/// A student's goals and today's progress on the board.
#[derive(Debug, Clone, PartialEq)]
pub struct GoalRow {
    pub student: Student,
    pub goals: GoalThresholds,
    pub progress: DailyProgress,
}

impl GoalRow {
    pub fn new(student: Student, progress: DailyProgress) -> Self {
        Self {
            goals: student.goals(),
            student,
            progress,
        }
    }

    pub fn remaining(&self, counter: GoalCounter) -> u32 {
        remaining(self.goals.get(counter), self.progress.done(counter))
    }

    pub fn is_fully_done(&self) -> bool {
        GoalCounter::ALL.iter().all(|c| self.remaining(*c) == 0)
    }

    /// Local goal edits not yet saved.
    pub fn is_dirty(&self) -> bool {
        self.goals != self.student.goals()
    }

    pub fn set_goal(&mut self, counter: GoalCounter, value: u32) {
        self.goals.set(counter, value);
    }

    pub fn adjust_goal(&mut self, counter: GoalCounter, delta: i64) {
        let current = i64::from(self.goals.get(counter));
        let next = (current + delta).clamp(0, i64::from(u32::MAX));
        self.goals.set(counter, next as u32);
    }

    /// Record that the current goals were persisted.
    pub fn mark_saved(&mut self) {
        self.student.set_goals(self.goals);
    }

    /// Record that `saved` was persisted. Edits made after the save was
    /// sent stay dirty.
    pub fn apply_saved(&mut self, saved: GoalThresholds) {
        if self.goals == saved {
            self.mark_saved();
        } else {
            self.student.set_goals(saved);
        }
    }

    pub fn revert(&mut self) {
        self.goals = self.student.goals();
    }
}

/// All students' goal rows plus the active search filter.
#[derive(Debug, Clone, Default)]
pub struct GoalBoard {
    rows: Vec<GoalRow>,
    query: String,
}

impl GoalBoard {
    pub fn new(mut rows: Vec<GoalRow>) -> Self {
        rows.sort_by_key(|r| r.student.display_name().to_lowercase());
        Self {
            rows,
            query: String::new(),
        }
    }

    pub fn rows(&self) -> &[GoalRow] {
        &self.rows
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn set_query(&mut self, query: &str) {
        self.query = query.to_string();
    }

    /// Rows matching the query by full name or email.
    pub fn filtered(&self) -> Vec<&GoalRow> {
        self.rows.iter().filter(|r| r.student.matches_query(&self.query)).collect()
    }

    pub fn row_mut(&mut self, student_id: i64) -> Option<&mut GoalRow> {
        self.rows.iter_mut().find(|r| r.student.id == student_id)
    }

    pub fn row(&self, student_id: i64) -> Option<&GoalRow> {
        self.rows.iter().find(|r| r.student.id == student_id)
    }

    pub fn dirty_count(&self) -> usize {
        self.rows.iter().filter(|r| r.is_dirty()).count()
    }

    pub fn fully_done_count(&self) -> usize {
        self.rows.iter().filter(|r| r.is_fully_done()).count()
    }

    /// Copy unsaved goal edits from `previous` onto matching students.
    pub fn keep_unsaved_edits(&mut self, previous: &GoalBoard) {
        for old in previous.rows.iter().filter(|r| r.is_dirty()) {
            if let Some(row) = self.row_mut(old.student.id) {
                row.goals = old.goals;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn student(id: i64, first: &str, last: &str, email: &str, goals: (u32, u32, u32)) -> Student {
        Student {
            id,
            first_name: first.to_string(),
            last_name: last.to_string(),
            email: Some(email.to_string()),
            phone: None,
            salawat_goal_daily: goals.0,
            adhkar_goal_daily: goals.1,
            istighfar_goal_daily: goals.2,
        }
    }

    fn progress(s: u32, a: u32, i: u32) -> DailyProgress {
        DailyProgress {
            salawat_done: s,
            adhkar_done: a,
            istighfar_done: i,
            ..Default::default()
        }
    }

    #[test]
    fn test_remaining_never_negative() {
        assert_eq!(remaining(5, 7), 0);
        assert_eq!(remaining(5, 2), 3);
        assert_eq!(remaining(0, 0), 0);
        for goal in 0..20 {
            for done in 0..20 {
                let r = remaining(goal, done);
                if done <= goal {
                    assert_eq!(r, goal - done);
                } else {
                    assert_eq!(r, 0);
                }
            }
        }
    }

    #[test]
    fn test_clamp_goal_input() {
        assert_eq!(clamp_goal_input("12"), 12);
        assert_eq!(clamp_goal_input(" 7.9 "), 7);
        assert_eq!(clamp_goal_input("-4"), 0);
        assert_eq!(clamp_goal_input("abc"), 0);
        assert_eq!(clamp_goal_input(""), 0);
        assert_eq!(clamp_goal_input("NaN"), 0);
        assert_eq!(clamp_goal_input("inf"), 0);
    }

    #[test]
    fn test_fully_done() {
        let done = GoalRow::new(student(1, "A", "B", "a@x.org", (5, 3, 0)), progress(7, 3, 1));
        assert!(done.is_fully_done());
        assert_eq!(done.remaining(GoalCounter::Salawat), 0);

        let short = GoalRow::new(student(2, "C", "D", "c@x.org", (5, 3, 10)), progress(5, 3, 4));
        assert!(!short.is_fully_done());
        assert_eq!(short.remaining(GoalCounter::Istighfar), 6);
    }

    #[test]
    fn test_goal_edits_track_dirty_state() {
        let mut row = GoalRow::new(student(1, "A", "B", "a@x.org", (5, 3, 0)), DailyProgress::default());
        assert!(!row.is_dirty());

        row.adjust_goal(GoalCounter::Adhkar, -5);
        assert_eq!(row.goals.adhkar, 0);
        assert!(row.is_dirty());

        row.revert();
        assert!(!row.is_dirty());

        row.set_goal(GoalCounter::Istighfar, 100);
        row.mark_saved();
        assert!(!row.is_dirty());
        assert_eq!(row.student.istighfar_goal_daily, 100);
    }

    #[test]
    fn test_board_filter_and_counts() {
        let mut board = GoalBoard::new(vec![
            GoalRow::new(student(1, "Zainab", "Rahman", "z@school.org", (1, 0, 0)), progress(1, 0, 0)),
            GoalRow::new(student(2, "Bilal", "Ahmed", "bilal@home.net", (1, 1, 1)), progress(0, 0, 0)),
        ]);
        assert_eq!(board.rows()[0].student.id, 2);
        assert_eq!(board.fully_done_count(), 1);

        board.set_query("RAHMAN");
        let filtered = board.filtered();
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].student.id, 1);

        board.set_query("home.net");
        assert_eq!(board.filtered()[0].student.id, 2);

        if let Some(row) = board.row_mut(2) {
            row.adjust_goal(GoalCounter::Salawat, 4);
        }
        assert_eq!(board.dirty_count(), 1);
        assert_eq!(board.row(2).map(|r| r.goals.salawat), Some(5));
    }

    #[test]
    fn test_refreshed_board_keeps_unsaved_edits() {
        let mut old = GoalBoard::new(vec![
            GoalRow::new(student(1, "A", "B", "a@x.org", (0, 0, 0)), progress(0, 0, 0)),
            GoalRow::new(student(2, "C", "D", "c@x.org", (2, 2, 2)), progress(0, 0, 0)),
        ]);
        if let Some(row) = old.row_mut(1) {
            row.adjust_goal(GoalCounter::Salawat, 5);
        }

        let mut fresh = GoalBoard::new(vec![
            GoalRow::new(student(1, "A", "B", "a@x.org", (0, 0, 0)), progress(3, 0, 0)),
            GoalRow::new(student(2, "C", "D", "c@x.org", (4, 4, 4)), progress(0, 0, 0)),
        ]);
        fresh.keep_unsaved_edits(&old);

        assert_eq!(fresh.dirty_count(), 1);
        assert_eq!(fresh.row(1).map(|r| r.goals.salawat), Some(5));
        assert_eq!(fresh.row(1).map(|r| r.progress.salawat_done), Some(3));
        assert_eq!(fresh.row(2).map(|r| r.goals.salawat), Some(4));
    }

    #[test]
    fn test_apply_saved_keeps_later_edits() {
        let mut row = GoalRow::new(student(1, "A", "B", "a@x.org", (1, 1, 1)), DailyProgress::default());
        row.set_goal(GoalCounter::Adhkar, 5);
        let sent = row.goals;
        row.set_goal(GoalCounter::Adhkar, 9);

        row.apply_saved(sent);
        assert!(row.is_dirty());
        assert_eq!(row.goals.adhkar, 9);
        assert_eq!(row.student.adhkar_goal_daily, 5);

        let sent = row.goals;
        row.apply_saved(sent);
        assert!(!row.is_dirty());
    }

    #[test]
    fn test_counter_cycle() {
        assert_eq!(GoalCounter::Istighfar.next(), GoalCounter::Salawat);
        assert_eq!(GoalCounter::Salawat.prev(), GoalCounter::Istighfar);
    }
}
