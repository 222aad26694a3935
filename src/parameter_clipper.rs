use crate::model::PARAMETER_COUNT;

/// Weights outside these ranges can drive stability negative or make the
/// growth factor explode for items that have only just been learned.
const CLAMPS: [(f64, f64); PARAMETER_COUNT] = [
    // forgetting: w0 * S ^ w1, never above S once S >= 1
    (0.01, 1.0),
    (0.0, 1.0),
    // difficulty decay exponent
    (0.0, 3.0),
    // hard: growth, retrievability exponent, difficulty exponent, later-rep factor
    (-10.0, 10.0),
    (0.0, 5.0),
    (-5.0, 5.0),
    (0.0, 5.0),
    // good
    (-10.0, 10.0),
    (0.0, 5.0),
    (-5.0, 5.0),
    (0.0, 5.0),
    // easy
    (-10.0, 10.0),
    (0.0, 5.0),
    (-5.0, 5.0),
    (0.0, 5.0),
    // difficulty steps
    (0.0, 4.0),
    (0.0, 4.0),
];

pub(crate) fn clip_parameters(parameters: &[f64; PARAMETER_COUNT]) -> [f64; PARAMETER_COUNT] {
    let mut clipped = *parameters;
    clipped
        .iter_mut()
        .zip(CLAMPS)
        .for_each(|(w, (low, high))| *w = w.clamp(low, high));
    clipped
}
