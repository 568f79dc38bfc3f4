//! Convolution kernels.

/// A square, odd-sided convolution kernel.
#[derive(Clone, Debug, PartialEq)]
pub enum Kernel {
    /// Gaussian with this standard deviation.
    Gaussian { sigma: f32 },
    /// Explicit `side` x `side` weights, row-major.
    Dense { side: usize, weights: Vec<f32> },
}

impl Kernel {
    /// Gaussian kernel roughly `size` pixels across (forced odd), with three
    /// standard deviations on each side of the centre.
    pub fn gaussian(size: usize) -> Kernel {
        let side = size.max(1) | 1;
        let radius = (side / 2) as f32;
        Kernel::Gaussian {
            sigma: (radius / 3.0).max(0.5),
        }
    }

    /// Absolute-value sinc of the distance from the centre, `|sin(d/s)/(d/s)|`
    /// where `s = 1/scale`. The rings give the ocean its wave texture; a larger
    /// scale draws them closer together.
    pub fn positive_sinc(size: usize, scale: f64) -> Kernel {
        let side = size.max(1) | 1;
        let radius = (side / 2) as f64;

        let mut weights = Vec::with_capacity(side * side);
        for y in 0..side {
            for x in 0..side {
                let dx = x as f64 - radius;
                let dy = y as f64 - radius;
                let d = (dx * dx + dy * dy).sqrt() * scale;
                let w = if d == 0.0 { 1.0 } else { (d.sin() / d).abs() };
                weights.push(w as f32);
            }
        }
        let sum: f32 = weights.iter().sum();
        for w in weights.iter_mut() {
            *w /= sum;
        }

        Kernel::Dense { side, weights }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gaussian_sigma_follows_size() {
        assert_eq!(Kernel::gaussian(10), Kernel::Gaussian { sigma: 5.0 / 3.0 });
        assert_eq!(Kernel::gaussian(0), Kernel::Gaussian { sigma: 0.5 });
    }

    #[test]
    fn test_sinc_has_rings() {
        let Kernel::Dense { side, weights } = Kernel::positive_sinc(21, 1.0) else {
            panic!("sinc kernels are dense");
        };
        assert_eq!(side, 21);
        let sum: f32 = weights.iter().sum();
        assert!((sum - 1.0).abs() < 1e-4);

        let r = side / 2;
        let weight = |x: usize, y: usize| weights[y * side + x];
        // |sinc| vanishes near d = pi and rises again further out.
        assert!(weight(r + 5, r) > weight(r + 3, r));
        assert!(weights.iter().all(|&w| w <= weight(r, r)));
    }
}
