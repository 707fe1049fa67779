use special::Gamma;

/// Natural log of the gamma function.
#[inline]
#[must_use]
pub fn ln_gamma(x: f64) -> f64 {
    Gamma::ln_gamma(x).0
}

/// `ln Γ((ν + 1)/2) − ln Γ(ν/2)`, the Student-t normalization ratio.
#[inline]
#[must_use]
pub fn ln_gamma_nu(nu: f64) -> f64 {
    ln_gamma(0.5 * (nu + 1.0)) - ln_gamma(0.5 * nu)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ln_gamma_known_values() {
        // Γ(1) = Γ(2) = 1, Γ(5) = 24
        assert::close(ln_gamma(1.0), 0.0, 1e-12);
        assert::close(ln_gamma(2.0), 0.0, 1e-12);
        assert::close(ln_gamma(5.0), 24.0_f64.ln(), 1e-10);
        // Γ(1/2) = √π
        assert::close(ln_gamma(0.5), 0.5 * std::f64::consts::PI.ln(), 1e-10);
    }

    #[test]
    fn ln_gamma_nu_is_ratio() {
        for nu in [0.5, 1.0, 3.0, 17.5] {
            assert::close(
                ln_gamma_nu(nu),
                ln_gamma(0.5 * (nu + 1.0)) - ln_gamma(0.5 * nu),
                1e-12,
            );
        }
    }
}
