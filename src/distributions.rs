//! Distribution functions the inference engine depends on.
//!
//! Everything numeric that needs a CDF or quantile goes through the
//! [`Distributions`] trait, so the backend can be swapped. [`StatrsDistributions`]
//! is the default; [`BuiltinDistributions`] has no dependency beyond `std` and
//! agrees with it to roughly 1e-6.

use statrs::distribution::{ChiSquared, ContinuousCDF, Normal, StudentsT};

use crate::error::{Result, StatsError};

/// Beyond this many degrees of freedom the t distribution is treated as normal.
const NORMAL_DF_CUTOFF: f64 = 1e7;

pub trait Distributions: Send + Sync {
    /// z such that P(Z < z) = p.
    fn normal_quantile(&self, p: f64) -> Result<f64>;

    /// P(Z > x).
    fn normal_survival(&self, x: f64) -> Result<f64>;

    /// P(T > x) for Student's t with `df` degrees of freedom.
    fn student_t_survival(&self, x: f64, df: f64) -> Result<f64>;

    /// t such that P(T < t) = p.
    fn student_t_quantile(&self, p: f64, df: f64) -> Result<f64>;
}

fn check_probability(p: f64) -> Result<()> {
    if !(p > 0.0 && p < 1.0) {
        return Err(StatsError::InvalidParameter(format!(
            "quantile probability must be in (0, 1), got {}",
            p
        )));
    }
    Ok(())
}

fn check_df(df: f64) -> Result<()> {
    if df.is_nan() || df <= 0.0 {
        return Err(StatsError::InvalidParameter(format!(
            "degrees of freedom must be > 0, got {}",
            df
        )));
    }
    Ok(())
}

// ── statrs backend ──────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Default)]
pub struct StatrsDistributions;

impl StatrsDistributions {
    fn standard_normal() -> Result<Normal> {
        Normal::new(0.0, 1.0).map_err(|e| StatsError::InvalidParameter(e.to_string()))
    }

    fn students_t(df: f64) -> Result<StudentsT> {
        StudentsT::new(0.0, 1.0, df).map_err(|e| StatsError::InvalidParameter(e.to_string()))
    }
}

impl Distributions for StatrsDistributions {
    fn normal_quantile(&self, p: f64) -> Result<f64> {
        check_probability(p)?;
        Ok(Self::standard_normal()?.inverse_cdf(p))
    }

    fn normal_survival(&self, x: f64) -> Result<f64> {
        Ok(Self::standard_normal()?.sf(x))
    }

    fn student_t_survival(&self, x: f64, df: f64) -> Result<f64> {
        check_df(df)?;
        if df > NORMAL_DF_CUTOFF {
            return self.normal_survival(x);
        }
        Ok(Self::students_t(df)?.sf(x))
    }

    fn student_t_quantile(&self, p: f64, df: f64) -> Result<f64> {
        check_probability(p)?;
        check_df(df)?;
        if df > NORMAL_DF_CUTOFF {
            return self.normal_quantile(p);
        }
        Ok(Self::students_t(df)?.inverse_cdf(p))
    }
}

/// P(X > x) for a chi-squared variable with `df` degrees of freedom.
pub fn chi_squared_survival(x: f64, df: f64) -> Result<f64> {
    check_df(df)?;
    if x <= 0.0 {
        return Ok(1.0);
    }
    let dist = ChiSquared::new(df).map_err(|e| StatsError::InvalidParameter(e.to_string()))?;
    Ok(dist.sf(x))
}

// ── Self-contained backend ──────────────────────────────────────────

/// Pure-`std` implementation: Lanczos log-gamma, continued-fraction
/// incomplete beta, Numerical Recipes `erfc`, Acklam inverse normal.
#[derive(Debug, Clone, Copy, Default)]
pub struct BuiltinDistributions;

impl Distributions for BuiltinDistributions {
    fn normal_quantile(&self, p: f64) -> Result<f64> {
        check_probability(p)?;
        Ok(inverse_normal_cdf(p))
    }

    fn normal_survival(&self, x: f64) -> Result<f64> {
        Ok(0.5 * erfc(x / std::f64::consts::SQRT_2))
    }

    fn student_t_survival(&self, x: f64, df: f64) -> Result<f64> {
        check_df(df)?;
        if df > NORMAL_DF_CUTOFF {
            return self.normal_survival(x);
        }
        Ok(t_survival(x, df))
    }

    fn student_t_quantile(&self, p: f64, df: f64) -> Result<f64> {
        check_probability(p)?;
        check_df(df)?;
        if df > NORMAL_DF_CUTOFF {
            return self.normal_quantile(p);
        }
        if p == 0.5 {
            return Ok(0.0);
        }
        // Solve sf(t) = 1 - p for the upper half, mirror for the lower.
        let upper = p.max(1.0 - p);
        let target = 1.0 - upper;
        let mut lo = 0.0;
        let mut hi = 1.0;
        while t_survival(hi, df) > target {
            hi *= 2.0;
            if hi > 1e12 {
                break;
            }
        }
        for _ in 0..200 {
            let mid = 0.5 * (lo + hi);
            if t_survival(mid, df) > target {
                lo = mid;
            } else {
                hi = mid;
            }
            if hi - lo <= 1e-13 * hi.max(1.0) {
                break;
            }
        }
        let t = 0.5 * (lo + hi);
        Ok(if p < 0.5 { -t } else { t })
    }
}

fn t_survival(x: f64, df: f64) -> f64 {
    // Two-sided tail mass is I_{df/(df+x²)}(df/2, 1/2); split it per side.
    let tail = 0.5 * regularized_incomplete_beta(df / 2.0, 0.5, df / (df + x * x));
    if x >= 0.0 {
        tail
    } else {
        1.0 - tail
    }
}

/// Acklam's rational approximation refined with one Halley step against
/// `erfc`.
#[allow(clippy::excessive_precision)]
fn inverse_normal_cdf(p: f64) -> f64 {
    const A: [f64; 6] = [
        -3.969683028665376e+01,
        2.209460984245205e+02,
        -2.759285104469687e+02,
        1.383577518672690e+02,
        -3.066479806614716e+01,
        2.506628277459239e+00,
    ];
    const B: [f64; 5] = [
        -5.447609879822406e+01,
        1.615858368580409e+02,
        -1.556989798598866e+02,
        6.680131188771972e+01,
        -1.328068155288572e+01,
    ];
    const C: [f64; 6] = [
        -7.784894002430293e-03,
        -3.223964580411365e-01,
        -2.400758277161838e+00,
        -2.549732539343734e+00,
        4.374664141464968e+00,
        2.938163982698783e+00,
    ];
    const D: [f64; 4] = [
        7.784695709041462e-03,
        3.224671290700398e-01,
        2.445134137142996e+00,
        3.754408661907416e+00,
    ];
    const P_LOW: f64 = 0.02425;

    let x = if p < P_LOW {
        let q = (-2.0 * p.ln()).sqrt();
        (((((C[0] * q + C[1]) * q + C[2]) * q + C[3]) * q + C[4]) * q + C[5])
            / ((((D[0] * q + D[1]) * q + D[2]) * q + D[3]) * q + 1.0)
    } else if p <= 1.0 - P_LOW {
        let q = p - 0.5;
        let r = q * q;
        (((((A[0] * r + A[1]) * r + A[2]) * r + A[3]) * r + A[4]) * r + A[5]) * q
            / (((((B[0] * r + B[1]) * r + B[2]) * r + B[3]) * r + B[4]) * r + 1.0)
    } else {
        let q = (-2.0 * (1.0 - p).ln()).sqrt();
        -(((((C[0] * q + C[1]) * q + C[2]) * q + C[3]) * q + C[4]) * q + C[5])
            / ((((D[0] * q + D[1]) * q + D[2]) * q + D[3]) * q + 1.0)
    };

    let e = 0.5 * erfc(-x / std::f64::consts::SQRT_2) - p;
    let u = e * (2.0 * std::f64::consts::PI).sqrt() * (x * x / 2.0).exp();
    x - u / (1.0 + x * u / 2.0)
}

/// Complementary error function (Numerical Recipes `erfcc`, Chebyshev fit,
/// fractional error below 1.2e-7).
#[allow(clippy::excessive_precision)]
fn erfc(x: f64) -> f64 {
    let z = x.abs();
    let t = 1.0 / (1.0 + 0.5 * z);
    let poly = -z * z - 1.26551223
        + t * (1.00002368
            + t * (0.37409196
                + t * (0.09678418
                    + t * (-0.18628806
                        + t * (0.27886807
                            + t * (-1.13520398
                                + t * (1.48851587 + t * (-0.82215223 + t * 0.17087277))))))));
    let ans = t * poly.exp();
    if x >= 0.0 {
        ans
    } else {
        2.0 - ans
    }
}

/// Lanczos approximation of ln(Gamma(x)) for x > 0.
#[allow(clippy::excessive_precision)]
fn ln_gamma(x: f64) -> f64 {
    const COEFFICIENTS: [f64; 9] = [
        0.99999999999980993,
        676.5203681218851,
        -1259.1392167224028,
        771.32342877765313,
        -176.61502916214059,
        12.507343278686905,
        -0.13857109526572012,
        9.9843695780195716e-6,
        1.5056327351493116e-7,
    ];

    if x < 0.5 {
        let pi = std::f64::consts::PI;
        return (pi / (pi * x).sin()).ln() - ln_gamma(1.0 - x);
    }

    let x = x - 1.0;
    let t = x + 7.5;
    let acc = COEFFICIENTS
        .iter()
        .enumerate()
        .skip(1)
        .fold(COEFFICIENTS[0], |acc, (i, &c)| acc + c / (x + i as f64));

    0.5 * (2.0 * std::f64::consts::PI).ln() + (t.ln() * (x + 0.5)) - t + acc.ln()
}

/// Regularized incomplete beta I_x(a, b).
fn regularized_incomplete_beta(a: f64, b: f64, x: f64) -> f64 {
    if x <= 0.0 {
        return 0.0;
    }
    if x >= 1.0 {
        return 1.0;
    }

    let ln_front = ln_gamma(a + b) - ln_gamma(a) - ln_gamma(b) + a * x.ln() + b * (1.0 - x).ln();
    let front = ln_front.exp();

    if x < (a + 1.0) / (a + b + 2.0) {
        (front * beta_continued_fraction(a, b, x) / a).clamp(0.0, 1.0)
    } else {
        (1.0 - front * beta_continued_fraction(b, a, 1.0 - x) / b).clamp(0.0, 1.0)
    }
}

/// Lentz evaluation of the incomplete-beta continued fraction.
fn beta_continued_fraction(a: f64, b: f64, x: f64) -> f64 {
    const MAX_ITERS: usize = 500;
    const EPS: f64 = 1e-15;
    const FPMIN: f64 = 1e-300;

    let floor = |v: f64| if v.abs() < FPMIN { FPMIN } else { v };

    let qab = a + b;
    let qap = a + 1.0;
    let qam = a - 1.0;

    let mut c = 1.0;
    let mut d = 1.0 / floor(1.0 - qab * x / qap);
    let mut h = d;

    for m in 1..=MAX_ITERS {
        let m_f = m as f64;
        let m2 = 2.0 * m_f;

        let aa = m_f * (b - m_f) * x / ((qam + m2) * (a + m2));
        d = 1.0 / floor(1.0 + aa * d);
        c = floor(1.0 + aa / c);
        h *= d * c;

        let aa = -(a + m_f) * (qab + m_f) * x / ((a + m2) * (qap + m2));
        d = 1.0 / floor(1.0 + aa * d);
        c = floor(1.0 + aa / c);
        let delta = d * c;
        h *= delta;

        if (delta - 1.0).abs() < EPS {
            break;
        }
    }

    h
}
