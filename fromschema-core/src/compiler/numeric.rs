use proptest::prelude::*;
use serde_json::Value as JsonValue;

use crate::canonical::json::json_number;
use crate::JsonObject;

use super::ValueStrategy;

/// Multiples are enumerated as `k * step` with `|k|` at most 2^53.
const MAX_EXACT_FLOAT_INT: f64 = 9_007_199_254_740_992.0;

/// 2^63, the first float past `i64::MAX`.
const I64_END: f64 = 9_223_372_036_854_775_808.0;

pub(crate) fn is_integral(value: f64) -> bool {
    value.is_finite() && value.fract() == 0.0
}

/// The smallest float strictly greater than `value`.
pub(crate) fn next_up(value: f64) -> f64 {
    if value.is_nan() || value == f64::INFINITY {
        return value;
    }
    if value == 0.0 {
        return f64::from_bits(1);
    }
    let bits = value.to_bits();
    if value > 0.0 {
        f64::from_bits(bits + 1)
    } else {
        f64::from_bits(bits - 1)
    }
}

pub(crate) fn next_down(value: f64) -> f64 {
    -next_up(-value)
}

/// Whether `value` counts as a multiple of `step` under the validator's
/// float arithmetic.
pub(crate) fn is_multiple_of(value: f64, step: f64) -> bool {
    if !value.is_finite() {
        return false;
    }
    if step.fract() == 0.0 {
        return value.fract() == 0.0 && value % step == 0.0;
    }
    let remainder = (value / step) % 1.0;
    !remainder.is_nan() && remainder < f64::EPSILON
}

/// `k * step`, or `k / (1 / step)` when only that product is an exact
/// multiple. Decimal steps such as `0.1` need the second form.
fn multiple(k: i64, step: f64) -> Option<f64> {
    let k = k as f64;
    let reciprocal = 1.0 / step;
    [k * step, k / reciprocal]
        .into_iter()
        .find(|value| is_multiple_of(*value, step))
}

/// True when some multiple of `step` lies in `[lo, hi]`.
pub(crate) fn has_multiple_in(lo: f64, hi: f64, step: f64) -> bool {
    if step <= 0.0 || !step.is_finite() {
        return false;
    }
    (lo / step).ceil() <= (hi / step).floor()
}

/// Numeric keywords of one schema, with exclusive bounds kept distinct.
#[derive(Clone, Debug, Default, PartialEq)]
pub(crate) struct NumericBounds {
    pub(crate) minimum: Option<f64>,
    pub(crate) maximum: Option<f64>,
    pub(crate) exclusive_minimum: Option<f64>,
    pub(crate) exclusive_maximum: Option<f64>,
    pub(crate) multiple_of: Option<f64>,
}

impl NumericBounds {
    pub(crate) fn from_schema(schema: &JsonObject) -> Self {
        let number = |key: &str| schema.get(key).and_then(JsonValue::as_f64);
        Self {
            minimum: number("minimum"),
            maximum: number("maximum"),
            exclusive_minimum: number("exclusiveMinimum"),
            exclusive_maximum: number("exclusiveMaximum"),
            multiple_of: number("multipleOf").filter(|step| *step > 0.0),
        }
    }

    /// Smallest admissible float.
    pub(crate) fn lower(&self) -> Option<f64> {
        let exclusive = self.exclusive_minimum.map(next_up);
        match (self.minimum, exclusive) {
            (Some(inclusive), Some(exclusive)) => Some(inclusive.max(exclusive)),
            (bound, None) | (None, bound) => bound,
        }
    }

    /// Largest admissible float.
    pub(crate) fn upper(&self) -> Option<f64> {
        let exclusive = self.exclusive_maximum.map(next_down);
        match (self.maximum, exclusive) {
            (Some(inclusive), Some(exclusive)) => Some(inclusive.min(exclusive)),
            (bound, None) | (None, bound) => bound,
        }
    }

    /// Admissible integer bounds as floats, ignoring `multipleOf`.
    pub(crate) fn integer_float_range(&self) -> (Option<f64>, Option<f64>) {
        let above = |x: f64| {
            let next = x.floor() + 1.0;
            if next > x {
                next
            } else {
                next_up(x)
            }
        };
        let below = |x: f64| {
            let next = x.ceil() - 1.0;
            if next < x {
                next
            } else {
                next_down(x)
            }
        };
        let lo = match (self.minimum.map(f64::ceil), self.exclusive_minimum.map(above)) {
            (Some(a), Some(b)) => Some(a.max(b)),
            (bound, None) | (None, bound) => bound,
        };
        let hi = match (self.maximum.map(f64::floor), self.exclusive_maximum.map(below)) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (bound, None) | (None, bound) => bound,
        };
        (lo, hi)
    }

    /// Admissible `i64` range, ignoring `multipleOf`.
    ///
    /// A bound past the end of `i64` that excludes no `i64` is reported as
    /// absent. `None` means every admissible integer lies outside `i64`.
    pub(crate) fn integer_range(&self) -> Option<(Option<i64>, Option<i64>)> {
        let (lo, hi) = self.integer_float_range();
        if lo.is_some_and(|lo| lo >= I64_END) || hi.is_some_and(|hi| hi < -I64_END) {
            return None;
        }
        Some((
            lo.filter(|lo| *lo >= -I64_END).map(|lo| lo as i64),
            hi.filter(|hi| *hi < I64_END).map(|hi| hi as i64),
        ))
    }

    pub(crate) fn integer_step(&self) -> Option<i64> {
        self.multiple_of
            .filter(|step| is_integral(*step) && *step <= i64::MAX as f64)
            .map(|step| step as i64)
    }
}

pub(crate) fn integer_strategy(bounds: &NumericBounds) -> Option<ValueStrategy> {
    let Some((lo, hi)) = bounds.integer_range() else {
        return wide_integer_strategy(bounds);
    };
    match (bounds.integer_step(), bounds.multiple_of) {
        (Some(step), _) => {
            let k_lo = lo.map_or(i64::MIN / step, |lo| div_ceil(lo, step));
            let k_hi = hi.map_or(i64::MAX / step, |hi| div_floor(hi, step));
            if k_lo > k_hi {
                return None;
            }
            Some(
                (k_lo..=k_hi)
                    .prop_map(move |k| JsonValue::from(k.saturating_mul(step)))
                    .boxed(),
            )
        }
        (None, Some(step)) => {
            let lo = lo.map(|lo| lo as f64);
            let hi = hi.map(|hi| hi as f64);
            let (k_lo, k_hi) = multiplier_range(lo, hi, step)?;
            Some(
                (k_lo..=k_hi)
                    .prop_filter_map("multiple is not an integer", move |k| {
                        let value = multiple(k, step)?;
                        let in_bounds = lo.map_or(true, |lo| value >= lo) && hi.map_or(true, |hi| value <= hi);
                        (is_integral(value) && in_bounds).then(|| json_number(value))
                    })
                    .boxed(),
            )
        }
        (None, None) => {
            let lo = lo.unwrap_or(i64::MIN);
            let hi = hi.unwrap_or(i64::MAX);
            if lo > hi {
                return None;
            }
            Some(small_biased_integers(lo, hi))
        }
    }
}

/// Integers whose bounds leave the `i64` range, drawn as floats. Every
/// float past 2^53 is integral, so only the bounds need checking.
fn wide_integer_strategy(bounds: &NumericBounds) -> Option<ValueStrategy> {
    let (lo, hi) = bounds.integer_float_range();
    let lo = lo.unwrap_or(f64::MIN);
    let hi = hi.unwrap_or(f64::MAX);
    if lo > hi {
        return None;
    }
    let step = bounds.multiple_of;
    if let Some(step) = step {
        if !has_multiple_in(lo, hi, step) {
            return None;
        }
    }
    Some(
        float_range(lo, hi)
            .prop_filter_map("not an integer multiple", move |value| {
                let fits = is_integral(value) && step.map_or(true, |step| is_multiple_of(value, step));
                fits.then(|| JsonValue::from(value))
            })
            .boxed(),
    )
}

/// Values near zero are drawn more often than the far ends of the range.
fn small_biased_integers(lo: i64, hi: i64) -> ValueStrategy {
    let near_lo = lo.max(-1000);
    let near_hi = hi.min(1000);
    let full = (lo..=hi).prop_map(JsonValue::from);
    if near_lo <= near_hi {
        prop_oneof![
            3 => (near_lo..=near_hi).prop_map(JsonValue::from),
            1 => full,
        ]
        .boxed()
    } else {
        full.boxed()
    }
}

pub(crate) fn number_strategy(bounds: &NumericBounds) -> Option<ValueStrategy> {
    let lo = bounds.lower();
    let hi = bounds.upper();
    if let (Some(lo), Some(hi)) = (lo, hi) {
        if lo > hi {
            return None;
        }
    }
    if let Some(step) = bounds.multiple_of {
        let (k_lo, k_hi) = multiplier_range(lo, hi, step)?;
        return Some(
            (k_lo..=k_hi)
                .prop_filter_map("multiple out of bounds", move |k| {
                    let value = multiple(k, step)?;
                    let in_bounds = lo.map_or(true, |lo| value >= lo) && hi.map_or(true, |hi| value <= hi);
                    in_bounds.then(|| json_number(value))
                })
                .boxed(),
        );
    }
    let floats = match (lo, hi) {
        (Some(lo), Some(hi)) => float_range(lo, hi),
        (Some(lo), None) => float_range(lo, f64::MAX),
        (None, Some(hi)) => float_range(f64::MIN, hi),
        (None, None) => prop_oneof![
            3 => -1000.0..1000.0f64,
            1 => proptest::num::f64::NORMAL | proptest::num::f64::ZERO | proptest::num::f64::SUBNORMAL,
        ]
        .boxed(),
    };
    Some(floats.prop_map(JsonValue::from).boxed())
}

fn float_range(lo: f64, hi: f64) -> BoxedStrategy<f64> {
    if lo == hi {
        return Just(lo).boxed();
    }
    if (hi - lo).is_finite() {
        return prop_oneof![
            1 => Just(lo),
            1 => Just(hi),
            8 => lo..=hi,
        ]
        .boxed();
    }
    prop_oneof![
        1 => Just(lo),
        1 => Just(hi),
        4 => lo..=0.0,
        4 => 0.0..=hi,
    ]
    .boxed()
}

/// Range of `k` such that `k * step` lies within the bounds.
fn multiplier_range(lo: Option<f64>, hi: Option<f64>, step: f64) -> Option<(i64, i64)> {
    let k_lo = lo.map_or(-MAX_EXACT_FLOAT_INT, |lo| (lo / step).ceil());
    let k_hi = hi.map_or(MAX_EXACT_FLOAT_INT, |hi| (hi / step).floor());
    let k_lo = k_lo.max(-MAX_EXACT_FLOAT_INT);
    let k_hi = k_hi.min(MAX_EXACT_FLOAT_INT);
    if k_lo.is_nan() || k_hi.is_nan() || k_lo > k_hi {
        return None;
    }
    Some((k_lo as i64, k_hi as i64))
}

fn div_floor(value: i64, step: i64) -> i64 {
    value.div_euclid(step)
}

fn div_ceil(value: i64, step: i64) -> i64 {
    let floor = value.div_euclid(step);
    if floor * step == value {
        floor
    } else {
        floor + 1
    }
}

#[cfg(test)]
#[path = "../../tests/internal/numeric_unit_tests.rs"]
mod tests;
