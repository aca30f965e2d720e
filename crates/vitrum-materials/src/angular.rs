//! Angular dependence of uncoated glass.
//!
//! A pane is modelled as a homogeneous absorbing slab with two identical
//! Fresnel interfaces. From the measured normal-incidence transmittance
//! $T_0$ and reflectance $R_0$ the single-interface reflectance $\rho_0$,
//! refractive index $n$ and internal transmittance $\tau_i$ are recovered;
//! properties at oblique incidence follow from Fresnel's equations for each
//! polarisation, with the path length through the slab scaling as
//! $1/\cos\theta_t$.
//!
//! For a single interface reflectance $r$ and internal transmittance
//! $\tau$:
//!
//! $$T = \frac{(1-r)^2\tau}{1-r^2\tau^2}, \qquad R = r + \frac{r(1-r)^2\tau^2}{1-r^2\tau^2}$$

/// Optical constants of an uncoated slab.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UncoatedGlass {
    /// Real refractive index.
    pub index: f64,
    /// Internal transmittance at normal incidence.
    pub internal_transmittance: f64,
}

impl UncoatedGlass {
    /// Recover the slab constants from normal-incidence measurements.
    pub fn from_normal(t0: f64, r0: f64) -> Self {
        let beta = t0 * t0 - r0 * r0 + 2.0 * r0 + 1.0;
        let disc = (beta * beta - 4.0 * (2.0 - r0) * r0).max(0.0);
        let rho0 = (beta - disc.sqrt()) / (2.0 * (2.0 - r0));
        if rho0 <= 1e-12 {
            return Self {
                index: 1.0,
                internal_transmittance: t0,
            };
        }
        let sr = rho0.sqrt();
        let internal_transmittance = if t0 <= 0.0 {
            0.0
        } else {
            ((r0 - rho0) / (rho0 * t0)).min(1.0)
        };
        Self {
            index: (1.0 + sr) / (1.0 - sr),
            internal_transmittance,
        }
    }

    /// Transmittance and reflectance at incidence angle `theta_deg`,
    /// averaged over both polarisations.
    pub fn at_angle(&self, theta_deg: f64) -> (f64, f64) {
        let n = self.index;
        let cos_i = theta_deg.to_radians().cos().max(0.0);
        let sin_t = theta_deg.to_radians().sin() / n;
        let cos_t = (1.0 - sin_t * sin_t).max(0.0).sqrt();

        let rs = ((cos_i - n * cos_t) / (cos_i + n * cos_t)).powi(2);
        let rp = ((n * cos_i - cos_t) / (n * cos_i + cos_t)).powi(2);
        let tau = if cos_t > 0.0 && self.internal_transmittance > 0.0 {
            self.internal_transmittance.powf(1.0 / cos_t)
        } else {
            0.0
        };

        let (mut t, mut r) = (0.0, 0.0);
        for interface in [rs, rp] {
            let (ti, ri) = slab(interface, tau);
            t += 0.5 * ti;
            r += 0.5 * ri;
        }
        (t, r)
    }
}

fn slab(r: f64, tau: f64) -> (f64, f64) {
    if !(r < 1.0) {
        return (0.0, 1.0);
    }
    let denom = 1.0 - r * r * tau * tau;
    let t = (1.0 - r).powi(2) * tau / denom;
    let rr = r + r * (1.0 - r).powi(2) * tau * tau / denom;
    (t, rr)
}

/// Angular transmittance and reflectances of a pane with measured normal
/// properties `(t0, rf0, rb0)` at `theta_deg`, as `(T, R_front, R_back)`.
pub fn uncoated_properties(t0: f64, rf0: f64, rb0: f64, theta_deg: f64) -> (f64, f64, f64) {
    if theta_deg == 0.0 {
        return (t0, rf0, rb0);
    }
    let (t, rf) = UncoatedGlass::from_normal(t0, rf0).at_angle(theta_deg);
    let (_, rb) = UncoatedGlass::from_normal(t0, rb0).at_angle(theta_deg);
    (t, rf, rb)
}
