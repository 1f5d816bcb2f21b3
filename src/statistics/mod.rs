//! Stateless density and special-function helpers.

use std::f64::consts::PI;

pub mod wishart;

/// Lanczos coefficients (g = 7, n = 9)
const LANCZOS_G: f64 = 7.0;
const LANCZOS: [f64; 9] = [
    0.999_999_999_999_809_93,
    676.520_368_121_885_1,
    -1_259.139_216_722_402_8,
    771.323_428_777_653_13,
    -176.615_029_162_140_59,
    12.507_343_278_686_905,
    -0.138_571_095_265_720_12,
    9.984_369_578_019_571_6e-6,
    1.505_632_735_149_311_6e-7,
];

/// ln Γ(x) for x > 0, by the Lanczos approximation. Returns `INFINITY` for x <= 0.
pub fn ln_gamma(x: f64) -> f64 {
    if x <= 0.0 {
        return f64::INFINITY;
    }

    if x < 0.5 {
        // reflection: Γ(x) Γ(1 - x) = π / sin(πx)
        return (PI / (PI * x).sin()).ln() - ln_gamma(1.0 - x);
    }

    let x = x - 1.0;
    let mut sum = LANCZOS[0];
    for (i, &c) in LANCZOS.iter().enumerate().skip(1) {
        sum += c / (x + i as f64);
    }

    let t = x + LANCZOS_G + 0.5;
    0.5 * (2.0 * PI).ln() + (x + 0.5) * t.ln() - t + sum.ln()
}

/// The log of the multivariate gamma function Γ_d(a)
pub fn ln_multivariate_gamma(a: f64, dim: usize) -> f64 {
    let d = dim as f64;
    let mut result = 0.25 * d * (d - 1.0) * PI.ln();
    for j in 1..=dim {
        result += ln_gamma(a + (1.0 - j as f64) / 2.0);
    }
    result
}

/// ln N(x | mean, sd^2). `NEG_INFINITY` for a non-positive standard deviation.
pub fn normal_ln_pdf(x: f64, mean: f64, sd: f64) -> f64 {
    if !(sd > 0.0) {
        return f64::NEG_INFINITY;
    }

    let z = (x - mean) / sd;
    -0.5 * (2.0 * PI).ln() - sd.ln() - 0.5 * z * z
}
