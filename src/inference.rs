use crate::error::Result;
use crate::item::{DAY_MS, Rating, ReviewItem, ScheduleFields, State};
use crate::model::{FSRS, initial_stability, retrievability};

/// What each of the four ratings would do to an item right now.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NextStates {
    pub forgot: ScheduleFields,
    pub hard: ScheduleFields,
    pub good: ScheduleFields,
    pub easy: ScheduleFields,
}

impl NextStates {
    pub fn get(&self, rating: Rating) -> &ScheduleFields {
        match rating {
            Rating::Forgot => &self.forgot,
            Rating::Hard => &self.hard,
            Rating::Good => &self.good,
            Rating::Easy => &self.easy,
        }
    }
}

impl FSRS {
    /// Grades `item` at `now` (milliseconds since the epoch) and returns the
    /// updated copy. The input is never modified; grading the same item with
    /// the same rating and clock twice gives identical results.
    pub fn grade(&self, item: &ReviewItem, rating: Rating, now: i64) -> Result<ReviewItem> {
        let fields = self.next_schedule(item, rating, now)?;
        let mut next = item.clone();
        next.apply(fields);
        Ok(next)
    }

    pub fn next_states(&self, item: &ReviewItem, now: i64) -> Result<NextStates> {
        item.check_invariants()?;
        Ok(NextStates {
            forgot: self.transition(item, Rating::Forgot, now),
            hard: self.transition(item, Rating::Hard, now),
            good: self.transition(item, Rating::Good, now),
            easy: self.transition(item, Rating::Easy, now),
        })
    }

    fn next_schedule(&self, item: &ReviewItem, rating: Rating, now: i64) -> Result<ScheduleFields> {
        item.check_invariants()?;
        Ok(self.transition(item, rating, now))
    }

    fn transition(&self, item: &ReviewItem, rating: Rating, now: i64) -> ScheduleFields {
        let reps = item.reps.saturating_add(1);
        let mut lapses = item.lapses;
        let mut stability = item.stability;

        let state = match (item.state, rating) {
            (State::New, Rating::Forgot) => {
                stability = 0.0;
                State::Learning
            }
            (State::Learning | State::Relearning, Rating::Forgot) => item.state,
            (State::New | State::Learning | State::Relearning, _) => {
                stability = initial_stability(rating);
                State::Review
            }
            (State::Review, Rating::Forgot) => {
                stability = self.stability_after_forgetting(item.stability);
                lapses = lapses.saturating_add(1);
                State::Relearning
            }
            (State::Review, _) => {
                stability = self.next_stability(item.stability, item.difficulty, rating, reps);
                State::Review
            }
        };

        let scheduled_days = match state {
            State::Review => self.next_interval(stability),
            _ => 0,
        };

        ScheduleFields {
            state,
            difficulty: self.next_difficulty(item.difficulty, rating),
            stability,
            retrievability: retrievability(stability),
            reps,
            lapses,
            scheduled_days,
            next_review: now.saturating_add(i64::from(scheduled_days) * DAY_MS),
            last_review: now,
        }
    }
}
