//! Equivalent layer stack: the adding method.
//!
//! Layers are folded front to back. With the running stack described by flux
//! transfer matrices $T_f, R_f, T_b, R_b$ and a new layer $L$, the infinite
//! series of bounces between the stack's back face and the layer's front face
//! is resolved in closed form:
//!
//! $$M = (I - R_b^{s} R_f^{L})^{-1}, \qquad M' = (I - R_f^{L} R_b^{s})^{-1}$$
//!
//! $$T_f' = T_f^{L} M T_f^{s}, \qquad R_f' = R_f^{s} + T_b^{s} R_f^{L} M T_f^{s}$$
//!
//! $$T_b' = T_b^{s} M' T_b^{L}, \qquad R_b' = R_b^{L} + T_f^{L} R_b^{s} M' T_b^{L}$$
//!
//! Absorptances are row vectors over incoming directions. Light entering from
//! the front reaches the back face of earlier layers only after reflecting
//! off the new layer, and light entering from the back reaches them only
//! through the new layer:
//!
//! $$A_{f,i}' = A_{f,i} + A_{b,i} R_f^{L} M T_f^{s}, \qquad A_{b,i}' = A_{b,i} M' T_b^{L}$$
//!
//! $$A_{f,L}' = A_{f,L} M T_f^{s}, \qquad A_{b,L}' = A_{b,L} + A_{f,L} R_b^{s} M' T_b^{L}$$
//!
//! All matrices here are flux transfer matrices $E = \Lambda B$ indexed
//! `[outgoing][incoming]`.

use std::sync::Arc;

use ndarray::{Array1, Array2};

use crate::basis::DirectionalBasis;
use crate::error::OpticsError;
use crate::layer::BandProperties;
use crate::linalg::{column_sums, invert};
use crate::types::{Property, Side};

/// Hemispherical reflectance at or above this value makes the interreflection
/// operator singular.
const REFLECTANCE_LIMIT: f64 = 1.0 - 1e-12;

/// Running combination of an ordered list of layers for one wavelength band.
#[derive(Debug, Clone)]
pub struct EquivalentLayerStack {
    basis: Arc<DirectionalBasis>,
    tf: Array2<f64>,
    rf: Array2<f64>,
    tb: Array2<f64>,
    rb: Array2<f64>,
    abs_front: Vec<Array1<f64>>,
    abs_back: Vec<Array1<f64>>,
}

impl EquivalentLayerStack {
    /// An empty stack: identity transmittance, zero reflectance.
    pub fn new(basis: Arc<DirectionalBasis>) -> Self {
        let n = basis.size();
        Self {
            basis,
            tf: Array2::eye(n),
            rf: Array2::zeros((n, n)),
            tb: Array2::eye(n),
            rb: Array2::zeros((n, n)),
            abs_front: Vec::new(),
            abs_back: Vec::new(),
        }
    }

    /// Build a stack from layers ordered front to back.
    pub fn from_layers<'a, I>(basis: Arc<DirectionalBasis>, layers: I) -> Result<Self, OpticsError>
    where
        I: IntoIterator<Item = &'a BandProperties>,
    {
        let mut stack = Self::new(basis);
        for layer in layers {
            stack.append(layer)?;
        }
        Ok(stack)
    }

    pub fn basis(&self) -> &Arc<DirectionalBasis> {
        &self.basis
    }

    pub fn layer_count(&self) -> usize {
        self.abs_front.len()
    }

    /// Append a layer at the back of the stack.
    ///
    /// On error the stack is left unchanged.
    ///
    /// # Errors
    ///
    /// - [`OpticsError::InvalidLayer`] if the layer's matrices or absorptance
    ///   vectors do not match the basis size.
    /// - [`OpticsError::SingularSystem`] if a reflectance reaches unity or the
    ///   interreflection operator cannot be inverted.
    pub fn append(&mut self, layer: &BandProperties) -> Result<(), OpticsError> {
        self.check_dimensions(layer)?;
        let lambda = self.basis.lambda();
        let to_flux = |b: &Array2<f64>| -> Array2<f64> {
            let mut e = b.clone();
            for (mut row, &l) in e.rows_mut().into_iter().zip(lambda.iter()) {
                row *= l;
            }
            e
        };
        let tf_l = to_flux(&layer.tau_front);
        let rf_l = to_flux(&layer.rho_front);
        let tb_l = to_flux(&layer.tau_back);
        let rb_l = to_flux(&layer.rho_back);

        if self.layer_count() == 0 {
            self.tf = tf_l;
            self.rf = rf_l;
            self.tb = tb_l;
            self.rb = rb_l;
            self.abs_front.push(layer.abs_front.clone());
            self.abs_back.push(layer.abs_back.clone());
            return Ok(());
        }

        check_reflectance("layer front", &rf_l)?;
        check_reflectance("stack back", &self.rb)?;

        let n = self.basis.size();
        let eye = Array2::<f64>::eye(n);
        let m = invert(&(&eye - &self.rb.dot(&rf_l)))?;
        let m_rev = invert(&(&eye - &rf_l.dot(&self.rb)))?;

        // Flux arriving at the new layer's front face, per incident direction
        let reach_front = m.dot(&self.tf);
        // Flux arriving at the stack's back face, per incident direction
        let reach_back = m_rev.dot(&tb_l);

        let tf = tf_l.dot(&reach_front);
        let rf = &self.rf + &self.tb.dot(&rf_l).dot(&reach_front);
        let tb = self.tb.dot(&reach_back);
        let rb = &rb_l + &tf_l.dot(&self.rb).dot(&reach_back);

        let bounce_front = rf_l.dot(&reach_front);
        let mut abs_front: Vec<Array1<f64>> = self
            .abs_front
            .iter()
            .zip(&self.abs_back)
            .map(|(af, ab)| af + &ab.dot(&bounce_front))
            .collect();
        let mut abs_back: Vec<Array1<f64>> = self
            .abs_back
            .iter()
            .map(|ab| ab.dot(&reach_back))
            .collect();

        abs_front.push(layer.abs_front.dot(&reach_front));
        abs_back.push(&layer.abs_back + &layer.abs_front.dot(&self.rb.dot(&reach_back)));

        let all_finite = [&tf, &rf, &tb, &rb].iter().all(|m| m.iter().all(|v| v.is_finite()));
        if !all_finite {
            return Err(OpticsError::SingularSystem(
                "combined stack contains non-finite values".into(),
            ));
        }

        self.tf = tf;
        self.rf = rf;
        self.tb = tb;
        self.rb = rb;
        self.abs_front = abs_front;
        self.abs_back = abs_back;
        Ok(())
    }

    /// Flux transfer matrix `[outgoing][incoming]` of the whole stack.
    pub fn flux_matrix(&self, side: Side, property: Property) -> &Array2<f64> {
        match (side, property) {
            (Side::Front, Property::Tau) => &self.tf,
            (Side::Front, Property::Rho) => &self.rf,
            (Side::Back, Property::Tau) => &self.tb,
            (Side::Back, Property::Rho) => &self.rb,
        }
    }

    /// BSDF matrix of the whole stack (flux matrix with every row divided by
    /// its outgoing patch weight).
    pub fn bsdf_matrix(&self, side: Side, property: Property) -> Array2<f64> {
        let mut b = self.flux_matrix(side, property).clone();
        for (mut row, &l) in b.rows_mut().into_iter().zip(self.basis.lambda().iter()) {
            row /= l;
        }
        b
    }

    /// In-context absorptance of layer `index` (0-based, front to back).
    pub fn absorptance(&self, side: Side, index: usize) -> Option<&Array1<f64>> {
        match side {
            Side::Front => self.abs_front.get(index),
            Side::Back => self.abs_back.get(index),
        }
    }

    /// In-context absorptances of every layer, front to back.
    pub fn absorptances(&self, side: Side) -> &[Array1<f64>] {
        match side {
            Side::Front => &self.abs_front,
            Side::Back => &self.abs_back,
        }
    }

    fn check_dimensions(&self, layer: &BandProperties) -> Result<(), OpticsError> {
        let n = self.basis.size();
        let square = [
            &layer.tau_front,
            &layer.rho_front,
            &layer.tau_back,
            &layer.rho_back,
        ]
        .iter()
        .all(|m| m.dim() == (n, n));
        if !square || layer.abs_front.len() != n || layer.abs_back.len() != n {
            return Err(OpticsError::InvalidLayer(format!(
                "layer dimensions do not match a basis of {n} patches"
            )));
        }
        Ok(())
    }
}

fn check_reflectance(label: &str, flux: &Array2<f64>) -> Result<(), OpticsError> {
    let sums = column_sums(flux);
    if let Some((j, r)) = sums
        .iter()
        .enumerate()
        .find(|(_, r)| **r >= REFLECTANCE_LIMIT || !r.is_finite())
    {
        return Err(OpticsError::SingularSystem(format!(
            "{label} hemispherical reflectance {r} in direction {j} is not below 1"
        )));
    }
    Ok(())
}
