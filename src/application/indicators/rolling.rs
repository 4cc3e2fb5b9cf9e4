//! Column helpers with pandas-style missing-value semantics.
//!
//! A column is a `Vec<Option<f64>>`; `None` marks a row where the value is not
//! defined yet (incomplete window) or could not be computed.

use crate::domain::errors::PredictionError;
use statrs::statistics::{Data, Distribution};
use ta::indicators::SimpleMovingAverage;
use ta::{Next, Reset};

fn sma(window: usize) -> Result<SimpleMovingAverage, PredictionError> {
    SimpleMovingAverage::new(window).map_err(|e| PredictionError::InvalidConfig {
        reason: format!("moving average window {}: {:?}", window, e),
    })
}

/// Mean over the trailing `window` values. A row is defined only when the
/// whole window is defined; a gap restarts the window.
pub fn rolling_mean(
    values: &[Option<f64>],
    window: usize,
) -> Result<Vec<Option<f64>>, PredictionError> {
    let mut avg = sma(window)?;
    let mut run = 0_usize;
    let mut out = Vec::with_capacity(values.len());

    for value in values {
        match value {
            Some(x) => {
                let mean = avg.next(*x);
                run += 1;
                out.push((run >= window).then_some(mean));
            }
            None => {
                avg.reset();
                run = 0;
                out.push(None);
            }
        }
    }
    Ok(out)
}

/// Sample standard deviation (n - 1 denominator) over the trailing `window` values.
pub fn rolling_std(values: &[Option<f64>], window: usize) -> Vec<Option<f64>> {
    (0..values.len())
        .map(|i| {
            if window == 0 || i + 1 < window {
                return None;
            }
            let slice = values[i + 1 - window..=i]
                .iter()
                .copied()
                .collect::<Option<Vec<f64>>>()?;
            Data::new(slice).std_dev()
        })
        .collect()
}

/// Difference to the previous row; row 0 is undefined.
pub fn diff(values: &[f64]) -> Vec<Option<f64>> {
    std::iter::once(None)
        .chain(values.windows(2).map(|w| Some(w[1] - w[0])))
        .collect()
}

/// Percent change against the value `periods` rows back.
pub fn pct_change(values: &[f64], periods: usize) -> Vec<Option<f64>> {
    (0..values.len())
        .map(|i| {
            let prev = values[i.checked_sub(periods)?];
            Some((values[i] - prev) / prev * 100.0)
        })
        .collect()
}

/// Treat non-finite results as missing.
pub fn sanitize(column: &mut [Option<f64>]) {
    for value in column.iter_mut() {
        if value.is_some_and(|v| !v.is_finite()) {
            *value = None;
        }
    }
}

/// Forward fill, then backward fill the leading gap.
pub fn fill_forward_backward(column: &mut [Option<f64>]) {
    let mut last = None;
    for value in column.iter_mut() {
        match value {
            Some(v) => last = Some(*v),
            None => *value = last,
        }
    }

    let mut next = None;
    for value in column.iter_mut().rev() {
        match value {
            Some(v) => next = Some(*v),
            None => *value = next,
        }
    }
}
