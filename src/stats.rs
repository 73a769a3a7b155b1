//! Stats module - analytics over the workout history

use crate::history::HistoryEntry;

/// Training analytics
pub struct Analytics {
    entries: Vec<HistoryEntry>,
}

impl Analytics {
    pub fn new(entries: Vec<HistoryEntry>) -> Self {
        Self { entries }
    }

    pub fn workout_count(&self) -> usize {
        self.entries.len()
    }

    /// XP earned across all performed workouts.
    pub fn total_xp(&self) -> u64 {
        self.entries.iter().map(|e| e.xp).sum()
    }

    pub fn total_time_secs(&self) -> u64 {
        self.entries.iter().map(|e| u64::from(e.elapsed_secs)).sum()
    }

    pub fn average_time_secs(&self) -> u32 {
        if self.entries.is_empty() {
            return 0;
        }
        (self.total_time_secs() / self.entries.len() as u64) as u32
    }

    /// Get training frequency (sessions per week)
    pub fn weekly_frequency(&self) -> f64 {
        if self.entries.len() < 2 {
            return 0.0;
        }

        let dates: Vec<_> = self.entries.iter().map(|e| e.date.date_naive()).collect();
        let first = match dates.iter().min() {
            Some(d) => *d,
            None => return 0.0,
        };
        let last = match dates.iter().max() {
            Some(d) => *d,
            None => return 0.0,
        };

        let days = (last - first).num_days() as f64;
        if days == 0.0 {
            return self.entries.len() as f64;
        }

        (self.entries.len() as f64 / days) * 7.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn entry_days_ago(days_ago: i64, elapsed_secs: u32, xp: u64) -> HistoryEntry {
        HistoryEntry {
            workout_id: days_ago,
            workout_name: "treino".to_string(),
            date: Utc::now() - chrono::Duration::days(days_ago),
            elapsed_secs,
            xp,
        }
    }

    #[test]
    fn test_empty_history() {
        let analytics = Analytics::new(vec![]);
        assert_eq!(analytics.workout_count(), 0);
        assert_eq!(analytics.total_xp(), 0);
        assert_eq!(analytics.average_time_secs(), 0);
        assert_eq!(analytics.weekly_frequency(), 0.0);
    }

    #[test]
    fn test_totals() {
        let analytics = Analytics::new(vec![
            entry_days_ago(0, 1000, 150),
            entry_days_ago(1, 2000, 250),
        ]);
        assert_eq!(analytics.workout_count(), 2);
        assert_eq!(analytics.total_xp(), 400);
        assert_eq!(analytics.total_time_secs(), 3000);
        assert_eq!(analytics.average_time_secs(), 1500);
    }

    #[test]
    fn test_weekly_frequency_single_workout() {
        let analytics = Analytics::new(vec![entry_days_ago(0, 1000, 150)]);
        assert_eq!(analytics.weekly_frequency(), 0.0);
    }

    #[test]
    fn test_weekly_frequency_same_day() {
        let analytics = Analytics::new(vec![
            entry_days_ago(0, 1000, 150),
            entry_days_ago(0, 900, 120),
        ]);
        // both on the same day: returns the count
        assert_eq!(analytics.weekly_frequency(), 2.0);
    }

    #[test]
    fn test_weekly_frequency_over_a_week() {
        let analytics = Analytics::new(vec![
            entry_days_ago(0, 1000, 150),
            entry_days_ago(7, 900, 120),
        ]);
        // 2 workouts over 7 days
        let freq = analytics.weekly_frequency();
        assert!((freq - 2.0).abs() < 0.1, "Expected ~2, got {}", freq);
    }
}
