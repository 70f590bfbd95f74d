//! Ridge regression on standardized features.
//!
//! Formula: β = (XᵀX + λI)⁻¹ Xᵀ(y − ȳ), with X standardized using the
//! training rows' mean and population standard deviation. The intercept is
//! the training target mean. The normal equations are solved by Cholesky
//! factorization; a system that is not positive definite is reported as an
//! error instead of being regularized further.

/// Fitted parameters in standardized space.
#[derive(Debug, Clone, PartialEq)]
pub struct RidgeFit {
    pub intercept: f64,
    pub coefficients: Vec<f64>,
    pub means: Vec<f64>,
    /// Standardisation divisors; constant training columns use 1.0
    pub scales: Vec<f64>,
}

impl RidgeFit {
    pub fn predict(&self, row: &[f64]) -> f64 {
        self.intercept
            + row
                .iter()
                .zip(&self.coefficients)
                .zip(self.means.iter().zip(&self.scales))
                .map(|((x, b), (m, s))| b * (x - m) / s)
                .sum::<f64>()
    }
}

/// Why a fit could not be produced.
#[derive(Debug, Clone, PartialEq)]
pub enum FitFailure {
    NoRows,
    NotPositiveDefinite { pivot: usize },
    NonFinite,
}

impl std::fmt::Display for FitFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NoRows => write!(f, "no training rows"),
            Self::NotPositiveDefinite { pivot } => write!(
                f,
                "normal equations are singular or not positive definite (pivot {pivot})"
            ),
            Self::NonFinite => write!(f, "fit produced non-finite coefficients"),
        }
    }
}

/// Fit ridge regression on the given rows of `data`.
pub fn fit_ridge(
    data: &[Vec<f64>],
    target: &[f64],
    rows: &[usize],
    lambda: f64,
) -> Result<RidgeFit, FitFailure> {
    let n = rows.len();
    if n == 0 {
        return Err(FitFailure::NoRows);
    }
    let p = data.first().map_or(0, Vec::len);
    let nf = n as f64;

    let mut means = vec![0.0; p];
    for &r in rows {
        for (m, x) in means.iter_mut().zip(&data[r]) {
            *m += x / nf;
        }
    }
    let mut scales = vec![0.0; p];
    for &r in rows {
        for j in 0..p {
            scales[j] += (data[r][j] - means[j]).powi(2) / nf;
        }
    }
    for s in &mut scales {
        *s = if *s > 1e-24 { s.sqrt() } else { 1.0 };
    }

    let y_mean = rows.iter().map(|&r| target[r]).sum::<f64>() / nf;

    // Gram matrix and right-hand side in standardized space
    let mut gram = vec![vec![0.0; p]; p];
    let mut rhs = vec![0.0; p];
    let mut z = vec![0.0; p];
    for &r in rows {
        for j in 0..p {
            z[j] = (data[r][j] - means[j]) / scales[j];
        }
        let y = target[r] - y_mean;
        for j in 0..p {
            rhs[j] += z[j] * y;
            for k in 0..=j {
                gram[j][k] += z[j] * z[k];
            }
        }
    }
    for j in 0..p {
        gram[j][j] += lambda;
        for k in 0..j {
            gram[k][j] = gram[j][k];
        }
    }

    let coefficients = solve_cholesky(gram, &rhs)?;
    if !y_mean.is_finite() || coefficients.iter().any(|b| !b.is_finite()) {
        return Err(FitFailure::NonFinite);
    }

    Ok(RidgeFit {
        intercept: y_mean,
        coefficients,
        means,
        scales,
    })
}

/// Solve `A x = b` for symmetric positive definite `A`.
fn solve_cholesky(a: Vec<Vec<f64>>, b: &[f64]) -> Result<Vec<f64>, FitFailure> {
    let p = b.len();
    let mut l = vec![vec![0.0; p]; p];

    for i in 0..p {
        for j in 0..=i {
            let sum: f64 = (0..j).map(|k| l[i][k] * l[j][k]).sum();
            if i == j {
                let d = a[i][i] - sum;
                // relative tolerance against the diagonal scale
                if !d.is_finite() || d <= 1e-10 * a[i][i].abs().max(1.0) {
                    return Err(FitFailure::NotPositiveDefinite { pivot: i });
                }
                l[i][i] = d.sqrt();
            } else {
                l[i][j] = (a[i][j] - sum) / l[j][j];
            }
        }
    }

    // Forward substitution: L y = b
    let mut y = vec![0.0; p];
    for i in 0..p {
        let sum: f64 = (0..i).map(|k| l[i][k] * y[k]).sum();
        y[i] = (b[i] - sum) / l[i][i];
    }

    // Back substitution: Lᵀ x = y
    let mut x = vec![0.0; p];
    for i in (0..p).rev() {
        let sum: f64 = (i + 1..p).map(|k| l[k][i] * x[k]).sum();
        x[i] = (y[i] - sum) / l[i][i];
    }

    Ok(x)
}
