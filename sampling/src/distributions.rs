use rand_distr::{Distribution as _, Normal};

use crate::source::Source;

/// Standard deviation of the error distribution.
pub const DEFAULT_SIGMA: f64 = 3.2;

/// Number of standard deviations at which error samples are clipped.
pub const SIX_SIGMA: f64 = 6.0;

/// Distributions the engine samples polynomial coefficients from.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Distribution {
    /// Uniform in {-1, 0, 1}.
    Ternary,
    /// Rounded normal with standard deviation `sigma`, clipped to `[-bound, bound]`.
    Gaussian { sigma: f64, bound: f64 },
}

impl Distribution {
    /// The error distribution used for fresh encryptions.
    pub fn error() -> Self {
        Distribution::Gaussian {
            sigma: DEFAULT_SIGMA,
            bound: DEFAULT_SIGMA * SIX_SIGMA,
        }
    }

    /// Samples `n` signed coefficients.
    pub fn sample(&self, source: &mut Source, n: usize) -> Vec<i64> {
        match *self {
            Distribution::Ternary => (0..n).map(|_| source.next_u64n(3, 3) as i64 - 1).collect(),
            Distribution::Gaussian { sigma, bound } => {
                assert!(sigma > 0.0, "invalid sigma: {sigma}");
                let normal: Normal<f64> = match Normal::new(0.0, sigma) {
                    Ok(normal) => normal,
                    Err(err) => panic!("invalid normal distribution: {err}"),
                };
                (0..n)
                    .map(|_| loop {
                        let x: f64 = normal.sample(source);
                        if x.abs() <= bound {
                            break x.round() as i64;
                        }
                    })
                    .collect()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::Distribution;
    use crate::source::Source;

    #[test]
    fn ternary_values() {
        let mut source: Source = Source::new([3u8; 32]);
        let s: Vec<i64> = Distribution::Ternary.sample(&mut source, 1024);
        assert!(s.iter().all(|x| (-1..=1).contains(x)));
        assert!(s.iter().any(|x| *x == -1) && s.iter().any(|x| *x == 1));
    }

    #[test]
    fn gaussian_is_bounded() {
        let mut source: Source = Source::new([5u8; 32]);
        let dist: Distribution = Distribution::error();
        let e: Vec<i64> = dist.sample(&mut source, 4096);
        assert!(e.iter().all(|x| x.abs() <= 20));
    }
}
