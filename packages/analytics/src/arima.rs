//! Automatic non-seasonal ARIMA(p, d, 0) selection.
//!
//! The differencing order `d` is chosen by repeated KPSS level-stationarity
//! tests. The autoregressive order `p` is chosen by minimum AIC over
//! least-squares fits (with an intercept) on a common sample, so the
//! criteria are comparable across candidates. There is no moving-average
//! or seasonal component.

use crime_dash_analytics_models::ArimaOrder;

/// Largest autoregressive order considered.
pub const MAX_AR_ORDER: usize = 3;

/// Largest differencing order considered.
pub const MAX_DIFFERENCING: usize = 2;

/// Fewest observations [`auto_arima`] accepts.
pub const MIN_OBSERVATIONS: usize = MAX_DIFFERENCING + 3;

/// KPSS level-stationarity critical value at the 5% level.
const KPSS_CRITICAL_5PCT: f64 = 0.463;

/// Floor applied to the residual variance so a perfect fit has a finite AIC.
const MIN_RESIDUAL_VARIANCE: f64 = 1e-12;

/// Relative pivot size below which the normal equations count as singular.
const PIVOT_TOLERANCE: f64 = 1e-10;

/// Errors from fitting or extrapolating a model.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ForecastError {
    /// Not enough data to fit any candidate.
    #[error("need at least {required} observations, got {observations}")]
    TooFewObservations {
        /// Observations supplied.
        observations: usize,
        /// Observations required.
        required: usize,
    },

    /// The least-squares system for a candidate had no unique solution.
    #[error("singular normal equations for AR({order})")]
    Singular {
        /// Autoregressive order of the failed candidate.
        order: usize,
    },

    /// Every candidate failed to fit.
    #[error("no candidate model could be fitted")]
    NoCandidate,

    /// Extrapolation diverged.
    #[error("model produced a non-finite prediction")]
    NonFinite,
}

/// A fitted ARIMA(p, d, 0) model.
#[derive(Debug, Clone, PartialEq)]
pub struct ArimaModel {
    /// Selected order.
    pub order: ArimaOrder,
    /// Constant term of the differenced series.
    pub intercept: f64,
    /// Autoregressive coefficients, lag 1 first.
    pub ar: Vec<f64>,
    /// Akaike information criterion.
    pub aic: f64,
}

impl ArimaModel {
    /// Extrapolates `steps` values past the end of `history`, which must be
    /// the series the model was fitted on.
    ///
    /// # Errors
    ///
    /// Returns [`ForecastError::TooFewObservations`] if `history` is too
    /// short to difference, or [`ForecastError::NonFinite`] if a prediction
    /// overflows.
    pub fn predict(&self, history: &[f64], steps: usize) -> Result<Vec<f64>, ForecastError> {
        let d = self.order.d;
        let required = d + self.ar.len().max(1);
        if history.len() < required {
            return Err(ForecastError::TooFewObservations {
                observations: history.len(),
                required,
            });
        }

        // levels[k] is the series differenced k times
        let mut levels = vec![history.to_vec()];
        for _ in 0..d {
            let next = levels.last().map(|l| difference(l)).unwrap_or_default();
            levels.push(next);
        }
        let mut working = levels.pop().unwrap_or_default();
        let mut lasts: Vec<f64> = levels.iter().filter_map(|l| l.last().copied()).collect();

        let mut predictions = Vec::with_capacity(steps);
        for _ in 0..steps {
            let next = self.intercept
                + working
                    .iter()
                    .rev()
                    .zip(&self.ar)
                    .map(|(w, phi)| phi * w)
                    .sum::<f64>();
            working.push(next);

            let mut value = next;
            for last in lasts.iter_mut().rev() {
                value += *last;
                *last = value;
            }

            if !value.is_finite() {
                return Err(ForecastError::NonFinite);
            }
            predictions.push(value);
        }

        Ok(predictions)
    }
}

/// Selects and fits an ARIMA(p, d, 0) model for `values`.
///
/// # Errors
///
/// Returns [`ForecastError::TooFewObservations`] for fewer than
/// [`MIN_OBSERVATIONS`] values, or [`ForecastError::NoCandidate`] if every
/// autoregressive order fails to fit.
#[allow(clippy::cast_precision_loss)]
pub fn auto_arima(values: &[f64]) -> Result<ArimaModel, ForecastError> {
    if values.len() < MIN_OBSERVATIONS {
        return Err(ForecastError::TooFewObservations {
            observations: values.len(),
            required: MIN_OBSERVATIONS,
        });
    }

    let d = select_differencing(values);
    let mut working = values.to_vec();
    for _ in 0..d {
        working = difference(&working);
    }

    let max_p = MAX_AR_ORDER.min(working.len().saturating_sub(2) / 3);
    let sample = (working.len() - max_p) as f64;

    let mut best: Option<ArimaModel> = None;
    for p in 0..=max_p {
        let fit = match fit_ar(&working, p, max_p) {
            Ok(fit) => fit,
            Err(e) => {
                log::trace!("Skipping AR({p}) candidate: {e}");
                continue;
            }
        };

        let sigma2 = (fit.rss / sample).max(MIN_RESIDUAL_VARIANCE);
        let parameters = (p + 2) as f64;
        let aic = sample.mul_add(sigma2.ln(), 2.0 * parameters);

        if best.as_ref().is_none_or(|b| aic < b.aic) {
            best = Some(ArimaModel {
                order: ArimaOrder { p, d, q: 0 },
                intercept: fit.intercept,
                ar: fit.ar,
                aic,
            });
        }
    }

    best.ok_or(ForecastError::NoCandidate)
}

/// First differences of a series.
#[must_use]
pub fn difference(values: &[f64]) -> Vec<f64> {
    values.windows(2).map(|w| w[1] - w[0]).collect()
}

/// Chooses how many times to difference `values` before it passes the
/// KPSS level-stationarity test, up to [`MAX_DIFFERENCING`].
#[must_use]
pub fn select_differencing(values: &[f64]) -> usize {
    let mut d = 0;
    let mut series = values.to_vec();
    while d < MAX_DIFFERENCING && series.len() > 3 && !is_level_stationary(&series) {
        series = difference(&series);
        d += 1;
    }
    d
}

/// Whether the KPSS test fails to reject level stationarity at 5%.
#[must_use]
pub fn is_level_stationary(values: &[f64]) -> bool {
    kpss_statistic(values) < KPSS_CRITICAL_5PCT
}

/// KPSS level-stationarity statistic with a Bartlett-weighted long-run
/// variance using `trunc(3 * sqrt(n) / 13)` lags.
///
/// Constant series return `0.0`.
#[must_use]
#[allow(
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss
)]
pub fn kpss_statistic(values: &[f64]) -> f64 {
    let n = values.len();
    if n < 2 {
        return 0.0;
    }
    let nf = n as f64;
    let mean = values.iter().sum::<f64>() / nf;
    let residuals: Vec<f64> = values.iter().map(|v| v - mean).collect();

    let mut partial = 0.0;
    let mut eta = 0.0;
    for e in &residuals {
        partial += e;
        eta += partial * partial;
    }
    eta /= nf * nf;

    let lags = ((3.0 * nf.sqrt()) / 13.0).trunc() as usize;
    let mut long_run = residuals.iter().map(|e| e * e).sum::<f64>() / nf;
    for lag in 1..=lags.min(n - 1) {
        let weight = 1.0 - lag as f64 / (lags as f64 + 1.0);
        let autocov = residuals[lag..]
            .iter()
            .zip(&residuals)
            .map(|(a, b)| a * b)
            .sum::<f64>()
            / nf;
        long_run += 2.0 * weight * autocov;
    }

    if long_run <= f64::EPSILON {
        0.0
    } else {
        eta / long_run
    }
}

struct ArFit {
    intercept: f64,
    ar: Vec<f64>,
    rss: f64,
}

/// Least-squares AR(p) fit with intercept over rows `start..n`.
fn fit_ar(series: &[f64], p: usize, start: usize) -> Result<ArFit, ForecastError> {
    let k = p + 1;
    let rows = series.len().saturating_sub(start);
    if start < p || rows <= k {
        return Err(ForecastError::TooFewObservations {
            observations: rows,
            required: k + 1,
        });
    }

    let regressors = |t: usize| -> Vec<f64> {
        std::iter::once(1.0)
            .chain((1..=p).map(|lag| series[t - lag]))
            .collect()
    };

    let mut xtx = vec![vec![0.0; k]; k];
    let mut xty = vec![0.0; k];
    for t in start..series.len() {
        let x = regressors(t);
        for i in 0..k {
            xty[i] += x[i] * series[t];
            for j in 0..k {
                xtx[i][j] += x[i] * x[j];
            }
        }
    }

    let beta = solve(xtx, xty).ok_or(ForecastError::Singular { order: p })?;

    let rss = (start..series.len())
        .map(|t| {
            let fitted: f64 = regressors(t).iter().zip(&beta).map(|(x, b)| x * b).sum();
            let resid = series[t] - fitted;
            resid * resid
        })
        .sum();

    Ok(ArFit {
        intercept: beta[0],
        ar: beta[1..].to_vec(),
        rss,
    })
}

/// Solves `a * x = b` by Gaussian elimination with partial pivoting.
/// Returns `None` when `a` is (numerically) singular.
#[allow(clippy::needless_range_loop)]
fn solve(mut a: Vec<Vec<f64>>, mut b: Vec<f64>) -> Option<Vec<f64>> {
    let n = b.len();
    let scale = a
        .iter()
        .flatten()
        .fold(0.0_f64, |acc, v| acc.max(v.abs()))
        .max(1.0);

    for col in 0..n {
        let pivot_row = (col..n).max_by(|&i, &j| a[i][col].abs().total_cmp(&a[j][col].abs()))?;
        if a[pivot_row][col].abs() <= PIVOT_TOLERANCE * scale {
            return None;
        }
        a.swap(col, pivot_row);
        b.swap(col, pivot_row);

        for row in (col + 1)..n {
            let factor = a[row][col] / a[col][col];
            for k in col..n {
                a[row][k] -= factor * a[col][k];
            }
            b[row] -= factor * b[col];
        }
    }

    let mut x = vec![0.0; n];
    for row in (0..n).rev() {
        let tail: f64 = ((row + 1)..n).map(|k| a[row][k] * x[k]).sum();
        x[row] = (b[row] - tail) / a[row][row];
    }

    x.iter().all(|v| v.is_finite()).then_some(x)
}
