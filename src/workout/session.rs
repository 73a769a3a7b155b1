//! Workout execution - the set/rest/elapsed state machine
//!
//! Drives one workout being performed: which exercise and set is up,
//! the rest countdown between sets, the total elapsed clock, and the
//! XP reward computed when the workout is closed out. The caller owns
//! the wall clock and calls `tick` once per second.

use super::{Exercise, Workout};

/// Rest between sets, in seconds.
pub const REST_SECS: u32 = 60;

/// A workout shorter than this does not count.
pub const MIN_ELAPSED_SECS: u32 = 15 * 60;

/// Base XP for any completed workout.
const BASE_XP: u64 = 100;

/// XP per exercise in the plan.
const XP_PER_EXERCISE: u64 = 20;

/// XP per full minute finished under the planned duration.
const XP_PER_MINUTE_SAVED: u64 = 5;

/// Planned minutes assumed when the workout has no duration.
const DEFAULT_DURATION_MIN: u32 = 30;

/// What completing a set advanced to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetOutcome {
    /// Same exercise, next set; rest started.
    NextSet,
    /// First set of the next exercise; rest started.
    NextExercise,
    /// That was the last set of the last exercise. State is left
    /// untouched so the session can keep running if the finish is
    /// rejected for being too short.
    WorkoutDone,
}

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error(
        "Tempo mínimo não atingido! Faltam {missing_minutes} minuto(s) para completar o treino."
    )]
    MinimumTimeNotReached { missing_minutes: u32 },
}

/// Live state of a workout being performed.
#[derive(Debug, Clone)]
pub struct WorkoutSession {
    workout: Workout,
    exercise_idx: usize,
    current_set: u32,
    rest_remaining: u32,
    elapsed_secs: u32,
    paused: bool,
}

impl WorkoutSession {
    pub fn new(workout: Workout) -> Self {
        Self {
            workout,
            exercise_idx: 0,
            current_set: 1,
            rest_remaining: 0,
            elapsed_secs: 0,
            paused: false,
        }
    }

    pub fn workout(&self) -> &Workout {
        &self.workout
    }

    pub fn current_exercise(&self) -> Option<&Exercise> {
        self.workout.exercises.get(self.exercise_idx)
    }

    /// 1-based position of the current exercise and the plan length.
    pub fn progress(&self) -> (usize, usize) {
        (self.exercise_idx + 1, self.workout.exercises.len())
    }

    pub fn current_set(&self) -> u32 {
        self.current_set
    }

    pub fn rest_remaining(&self) -> u32 {
        self.rest_remaining
    }

    pub fn elapsed_secs(&self) -> u32 {
        self.elapsed_secs
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn pause(&mut self) {
        self.paused = true;
    }

    pub fn resume(&mut self) {
        self.paused = false;
    }

    /// Advance the clocks by one second. No-op while paused.
    pub fn tick(&mut self) {
        if self.paused {
            return;
        }
        self.elapsed_secs += 1;
        if self.rest_remaining > 0 {
            self.rest_remaining -= 1;
        }
    }

    /// Record the current set as done and move on.
    pub fn complete_set(&mut self) -> SetOutcome {
        let Some(exercise) = self.current_exercise() else {
            return SetOutcome::WorkoutDone;
        };

        if self.current_set < exercise.sets {
            self.current_set += 1;
            self.rest_remaining = REST_SECS;
            SetOutcome::NextSet
        } else if self.exercise_idx + 1 < self.workout.exercises.len() {
            self.exercise_idx += 1;
            self.current_set = 1;
            self.rest_remaining = REST_SECS;
            SetOutcome::NextExercise
        } else {
            SetOutcome::WorkoutDone
        }
    }

    /// XP for closing out the workout now. Rejected while under the
    /// 15-minute floor, reporting how many minutes are missing.
    pub fn finish(&self) -> Result<u64, SessionError> {
        if self.elapsed_secs < MIN_ELAPSED_SECS {
            let missing = MIN_ELAPSED_SECS - self.elapsed_secs;
            return Err(SessionError::MinimumTimeNotReached {
                missing_minutes: missing.div_ceil(60),
            });
        }

        let planned_secs =
            i64::from(self.workout.duration_min.unwrap_or(DEFAULT_DURATION_MIN)) * 60;
        // minutes finished ahead of plan; overtime earns nothing
        let saved_minutes = (planned_secs - i64::from(self.elapsed_secs)).div_euclid(60).max(0);

        Ok(BASE_XP
            + saved_minutes as u64 * XP_PER_MINUTE_SAVED
            + self.workout.exercises.len() as u64 * XP_PER_EXERCISE)
    }
}
