use serde::{Deserialize, Serialize};

use crate::error::{InvalidParametersSnafu, Result};
use crate::item::Rating;
use crate::parameter_clipper::clip_parameters;

pub const PARAMETER_COUNT: usize = 17;

/// Weights may be supplied as an empty slice to use the defaults.
pub type Parameters = [f64];

pub static DEFAULT_PARAMETERS: [f64; PARAMETER_COUNT] = [
    0.4, 0.6, 2.4, 5.8, 4.93, 0.94, 0.86, 0.01, 1.49, 0.14, 0.94, 2.18, 0.05, 0.34, 1.26, 0.29,
    2.61,
];

pub const DEFAULT_REQUEST_RETENTION: f64 = 0.9;
pub const DEFAULT_MAXIMUM_INTERVAL: u32 = 36500;

pub const D_MIN: f64 = 1.0;
pub const D_MAX: f64 = 5.0;
pub const S_MIN: f64 = 0.0;
pub const S_MAX: f64 = 36500.0;

/// Recall probability after `stability` days on the curve that stability is
/// measured against.
pub fn retrievability(stability: f64) -> f64 {
    (0.9f64.ln() * stability).exp()
}

/// Stability assigned when an item first leaves New, Learning or Relearning.
pub(crate) fn initial_stability(rating: Rating) -> f64 {
    match rating {
        Rating::Forgot => 0.0,
        Rating::Hard => 1.0,
        Rating::Good => 2.0,
        Rating::Easy => 4.0,
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    pub parameters: Vec<f64>,
    pub request_retention: f64,
    pub maximum_interval: u32,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            parameters: DEFAULT_PARAMETERS.to_vec(),
            request_retention: DEFAULT_REQUEST_RETENTION,
            maximum_interval: DEFAULT_MAXIMUM_INTERVAL,
        }
    }
}

/// This is the main structure provided by this crate. It holds a validated
/// weight vector and turns (item, rating) into the item's next schedule.
#[derive(Debug, Clone, PartialEq)]
pub struct FSRS {
    w: [f64; PARAMETER_COUNT],
    request_retention: f64,
    maximum_interval: u32,
}

impl Default for FSRS {
    fn default() -> Self {
        Self {
            w: DEFAULT_PARAMETERS,
            request_retention: DEFAULT_REQUEST_RETENTION,
            maximum_interval: DEFAULT_MAXIMUM_INTERVAL,
        }
    }
}

impl FSRS {
    pub fn new(config: &SchedulerConfig) -> Result<Self> {
        let parameters = check_and_fill_parameters(&config.parameters)?;
        if !(config.request_retention > 0.0 && config.request_retention < 1.0) {
            return InvalidParametersSnafu {
                reason: format!(
                    "request retention {} is not in (0, 1)",
                    config.request_retention
                ),
            }
            .fail();
        }
        if config.maximum_interval == 0 {
            return InvalidParametersSnafu {
                reason: "maximum interval must be at least one day",
            }
            .fail();
        }
        Ok(Self {
            w: clip_parameters(&parameters),
            request_retention: config.request_retention,
            maximum_interval: config.maximum_interval,
        })
    }

    pub fn parameters(&self) -> &[f64; PARAMETER_COUNT] {
        &self.w
    }

    pub fn request_retention(&self) -> f64 {
        self.request_retention
    }

    pub fn maximum_interval(&self) -> u32 {
        self.maximum_interval
    }

    pub(crate) fn next_difficulty(&self, difficulty: f64, rating: Rating) -> f64 {
        let w = &self.w;
        let next = match rating {
            Rating::Forgot => difficulty + w[15],
            Rating::Hard => difficulty + w[15] / 2.0,
            Rating::Good => difficulty,
            Rating::Easy => difficulty - w[16],
        };
        next.clamp(D_MIN, D_MAX)
    }

    /// Stability after a review-state grade. `difficulty` is the value before
    /// this grade and `reps` already counts it.
    pub(crate) fn next_stability(
        &self,
        stability: f64,
        difficulty: f64,
        rating: Rating,
        reps: u32,
    ) -> f64 {
        let w = &self.w;
        let offset = match rating {
            Rating::Forgot => return self.stability_after_forgetting(stability),
            Rating::Hard => 3,
            Rating::Good => 7,
            Rating::Easy => 11,
        };
        let r = retrievability(stability);
        let difficulty_factor = (w[2] * (difficulty - 3.0)).exp();
        let later_rep = if reps <= 1 { 1.0 } else { w[offset + 3] };
        let new_s = stability
            * (1.0
                + w[offset].exp()
                    * r.powf(w[offset + 1])
                    * difficulty_factor.powf(w[offset + 2])
                    * later_rep);
        new_s.clamp(S_MIN, S_MAX)
    }

    pub(crate) fn stability_after_forgetting(&self, stability: f64) -> f64 {
        (self.w[0] * stability.powf(self.w[1])).clamp(S_MIN, S_MAX)
    }

    pub fn next_interval(&self, stability: f64) -> u32 {
        let interval = (stability * self.request_retention.ln() / 0.9f64.ln()).ceil();
        interval.clamp(1.0, self.maximum_interval as f64) as u32
    }
}

pub(crate) fn check_and_fill_parameters(
    parameters: &Parameters,
) -> Result<[f64; PARAMETER_COUNT]> {
    let parameters: [f64; PARAMETER_COUNT] = match parameters.len() {
        0 => DEFAULT_PARAMETERS,
        PARAMETER_COUNT => parameters.try_into().map_err(|_| {
            InvalidParametersSnafu {
                reason: "weight vector has the wrong length",
            }
            .build()
        })?,
        n => {
            return InvalidParametersSnafu {
                reason: format!("expected {PARAMETER_COUNT} weights, got {n}"),
            }
            .fail();
        }
    };
    if let Some(i) = parameters.iter().position(|w| !w.is_finite()) {
        return InvalidParametersSnafu {
            reason: format!("weight {i} is not finite"),
        }
        .fail();
    }
    Ok(parameters)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SchedulerError;

    #[test]
    fn difficulty_steps() {
        let fsrs = FSRS::default();
        assert!((fsrs.next_difficulty(3.0, Rating::Forgot) - 3.29).abs() < 1e-12);
        assert!((fsrs.next_difficulty(3.0, Rating::Hard) - 3.145).abs() < 1e-12);
        assert_eq!(fsrs.next_difficulty(3.0, Rating::Good), 3.0);
        assert_eq!(fsrs.next_difficulty(3.0, Rating::Easy), 1.0);
        assert_eq!(fsrs.next_difficulty(4.9, Rating::Forgot), 5.0);
        assert_eq!(fsrs.next_difficulty(1.2, Rating::Easy), 1.0);
    }

    #[test]
    fn forgetting_shrinks_stability() {
        let fsrs = FSRS::default();
        let s = fsrs.next_stability(10.0, 3.0, Rating::Forgot, 5);
        assert!((s - 0.4 * 10f64.powf(0.6)).abs() < 1e-12);
        assert!(s < 10.0);
        assert_eq!(fsrs.stability_after_forgetting(0.0), 0.0);
    }

    #[test]
    fn recall_grows_stability() {
        let fsrs = FSRS::default();
        let w = DEFAULT_PARAMETERS;
        let s = 2.0;
        let r = retrievability(s);
        let expected = s * (1.0 + w[7].exp() * r.powf(w[8]) * 1.0 * w[10]);
        let got = fsrs.next_stability(s, 3.0, Rating::Good, 2);
        assert!((got - expected).abs() < 1e-12);
        assert!(got > s);
    }

    #[test]
    fn first_rep_uses_flat_multiplier() {
        let fsrs = FSRS::default();
        let first = fsrs.next_stability(4.0, 3.0, Rating::Hard, 1);
        let later = fsrs.next_stability(4.0, 3.0, Rating::Hard, 2);
        let w = DEFAULT_PARAMETERS;
        assert!(((first - 4.0) * w[6] - (later - 4.0)).abs() < 1e-9);
    }

    #[test]
    fn harder_items_grow_faster_with_positive_decay() {
        let fsrs = FSRS::default();
        let easy_item = fsrs.next_stability(4.0, 1.0, Rating::Easy, 3);
        let hard_item = fsrs.next_stability(4.0, 5.0, Rating::Easy, 3);
        assert!(hard_item > easy_item);
    }

    #[test]
    fn stability_is_capped() {
        let fsrs = FSRS::default();
        assert_eq!(fsrs.next_stability(S_MAX, 5.0, Rating::Easy, 9), S_MAX);
    }

    #[test]
    fn test_next_interval() {
        let fsrs = FSRS::default();
        let intervals = [0.0, 0.3, 1.0, 2.0, 4.0, 10.5, 1e9]
            .iter()
            .map(|s| fsrs.next_interval(*s))
            .collect::<Vec<_>>();
        assert_eq!(intervals, [1, 1, 1, 2, 4, 11, 36500]);
    }

    #[test]
    fn interval_follows_request_retention() {
        let fsrs = FSRS::new(&SchedulerConfig {
            request_retention: 0.8,
            ..Default::default()
        })
        .unwrap();
        let expected = (10.0 * 0.8f64.ln() / 0.9f64.ln()).ceil() as u32;
        assert_eq!(fsrs.next_interval(10.0), expected);
        assert!(expected > 10);
    }

    #[test]
    fn parameters_are_validated() {
        assert_eq!(
            FSRS::new(&SchedulerConfig {
                parameters: vec![],
                ..Default::default()
            })
            .unwrap(),
            FSRS::default()
        );
        for config in [
            SchedulerConfig {
                parameters: vec![1.0; 5],
                ..Default::default()
            },
            SchedulerConfig {
                parameters: {
                    let mut w = DEFAULT_PARAMETERS.to_vec();
                    w[3] = f64::NAN;
                    w
                },
                ..Default::default()
            },
            SchedulerConfig {
                request_retention: 1.0,
                ..Default::default()
            },
            SchedulerConfig {
                maximum_interval: 0,
                ..Default::default()
            },
        ] {
            assert!(matches!(
                FSRS::new(&config),
                Err(SchedulerError::InvalidParameters { .. })
            ));
        }
    }
}
