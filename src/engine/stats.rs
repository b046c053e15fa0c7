//! Numeric primitives shared by the engine stages
//!
//! Pearson correlation with Student-t p-values, sample moments, ordinary
//! least squares via the normal equations, and the F-test tail probability.
//! Distributions come from statrs; the linear algebra is small enough
//! (at most 2 * max_lag + 1 parameters) that plain Gaussian elimination
//! with partial pivoting is sufficient.

use statrs::distribution::{ContinuousCDF, FisherSnedecor, StudentsT};

use super::AttributionError;

/// Pivot magnitude below which the equilibrated normal matrix is treated as singular.
const SINGULAR_EPS: f64 = 1e-10;

pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Unbiased sample variance (n - 1 denominator). Zero for fewer than 2 values.
pub fn sample_variance(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let m = mean(values);
    values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / (values.len() - 1) as f64
}

/// Pearson correlation coefficient
///
/// Formula: r = Σ[(xi - x̄)(yi - ȳ)] / sqrt(Σ(xi - x̄)² × Σ(yi - ȳ)²)
///
/// Returns 0.0 when either side is constant or the slices are shorter than 3.
pub fn pearson(x: &[f64], y: &[f64]) -> f64 {
    let n = x.len().min(y.len());
    if n < 3 {
        return 0.0;
    }
    let mean_x = mean(&x[..n]);
    let mean_y = mean(&y[..n]);

    let mut num = 0.0_f64;
    let mut den_x = 0.0_f64;
    let mut den_y = 0.0_f64;
    for (a, b) in x[..n].iter().zip(&y[..n]) {
        let dx = a - mean_x;
        let dy = b - mean_y;
        num += dx * dy;
        den_x += dx * dx;
        den_y += dy * dy;
    }

    let denom = (den_x * den_y).sqrt();
    if denom < 1e-12 {
        0.0
    } else {
        (num / denom).clamp(-1.0, 1.0)
    }
}

/// Two-tailed p-value for a Pearson r over `n` pairs.
///
/// Formula: t = r × sqrt(n-2) / sqrt(1-r²), with n-2 degrees of freedom.
pub fn p_value_for_r(r: f64, n: usize) -> f64 {
    if n < 3 || !r.is_finite() {
        return 1.0;
    }

    // Perfect or near-perfect correlation is highly significant
    if r.abs() >= 0.9999 {
        return 0.0;
    }

    let df = (n - 2) as f64;
    let t_stat = r * df.sqrt() / (1.0 - r * r).sqrt();

    match StudentsT::new(0.0, 1.0, df) {
        Ok(t_dist) => (2.0 * (1.0 - t_dist.cdf(t_stat.abs()))).clamp(0.0, 1.0),
        Err(_) => 1.0,
    }
}

/// Upper-tail probability of an F statistic.
pub fn f_test_p_value(f_stat: f64, df_num: usize, df_den: usize) -> f64 {
    if df_num == 0 || df_den == 0 || f_stat.is_nan() || f_stat <= 0.0 {
        return 1.0;
    }
    if f_stat.is_infinite() {
        return 0.0;
    }
    match FisherSnedecor::new(df_num as f64, df_den as f64) {
        Ok(dist) => (1.0 - dist.cdf(f_stat)).clamp(0.0, 1.0),
        Err(_) => 1.0,
    }
}

/// Fitted least-squares model.
#[derive(Debug, Clone)]
pub struct OlsFit {
    pub coefficients: Vec<f64>,
    /// Residual sum of squares
    pub rss: f64,
}

/// Ordinary least squares of `y` on the design matrix `rows`.
///
/// Each row must carry its own intercept column. Solves (XᵀX)β = Xᵀy by
/// Gaussian elimination and reports `RankDeficient` when a pivot vanishes.
pub fn ols(rows: &[Vec<f64>], y: &[f64]) -> Result<OlsFit, AttributionError> {
    let parameters = rows.first().map_or(0, Vec::len);
    if rows.len() != y.len() || rows.len() < parameters || parameters == 0 {
        return Err(AttributionError::RankDeficient {
            observations: rows.len(),
            parameters,
        });
    }

    // Normal equations, augmented with Xᵀy as the last column
    let mut a = vec![vec![0.0_f64; parameters + 1]; parameters];
    for (row, &target) in rows.iter().zip(y) {
        for i in 0..parameters {
            for j in 0..parameters {
                a[i][j] += row[i] * row[j];
            }
            a[i][parameters] += row[i] * target;
        }
    }

    // Equilibrate to a unit diagonal so the pivot test does not depend on
    // the numeric scale of any single column
    let mut scale = Vec::with_capacity(parameters);
    for i in 0..parameters {
        let d = a[i][i];
        if !(d > 0.0 && d.is_finite()) {
            return Err(AttributionError::RankDeficient {
                observations: rows.len(),
                parameters,
            });
        }
        scale.push(d.sqrt());
    }
    for i in 0..parameters {
        for j in 0..parameters {
            a[i][j] /= scale[i] * scale[j];
        }
        a[i][parameters] /= scale[i];
    }

    for col in 0..parameters {
        let pivot_row = (col..parameters)
            .max_by(|&r1, &r2| a[r1][col].abs().total_cmp(&a[r2][col].abs()))
            .unwrap_or(col);
        if a[pivot_row][col].abs() < SINGULAR_EPS {
            return Err(AttributionError::RankDeficient {
                observations: rows.len(),
                parameters,
            });
        }
        a.swap(col, pivot_row);

        for r in (col + 1)..parameters {
            let factor = a[r][col] / a[col][col];
            if factor == 0.0 {
                continue;
            }
            for c in col..=parameters {
                a[r][c] -= factor * a[col][c];
            }
        }
    }

    let mut coefficients = vec![0.0_f64; parameters];
    for i in (0..parameters).rev() {
        let tail: f64 = ((i + 1)..parameters).map(|j| a[i][j] * coefficients[j]).sum();
        coefficients[i] = (a[i][parameters] - tail) / a[i][i];
    }
    for (b, s) in coefficients.iter_mut().zip(&scale) {
        *b /= s;
    }

    let rss = rows
        .iter()
        .zip(y)
        .map(|(row, &target)| {
            let fitted: f64 = row.iter().zip(&coefficients).map(|(x, b)| x * b).sum();
            (target - fitted).powi(2)
        })
        .sum();

    Ok(OlsFit { coefficients, rss })
}

/// Indices of `values` in ascending order, ties kept in original order.
pub fn rank_order(values: &[f64]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..values.len()).collect();
    order.sort_by(|&a, &b| values[a].total_cmp(&values[b]).then(a.cmp(&b)));
    order
}
