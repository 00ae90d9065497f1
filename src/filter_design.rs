//! Diseño Butterworth de la sección IIR de segundo orden usada para acondicionar.
//!
//! Sin `lp_cut` se diseña un pasa-altas de orden 2; con `lp_cut` un pasa-banda
//! de orden 1 (que también resulta en una sola sección de segundo orden).
//! Ambos usan transformada bilineal con pre-warping de las frecuencias de corte.

use std::f64::consts::{PI, SQRT_2};

use serde::Serialize;
use tracing::debug;

use crate::config::PreprocessingConfig;
use crate::error::{PipelineError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterKind {
    Highpass,
    Bandpass,
}

/// Coeficientes de la ecuación en diferencias
/// `y[n] = b0·x[n] + b1·x[n-1] + b2·x[n-2] − a1·y[n-1] − a2·y[n-2]`
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct IirCoefficients {
    pub kind: FilterKind,
    pub b: [f64; 3],
    pub a: [f64; 3],
}

impl IirCoefficients {
    pub fn is_finite(&self) -> bool {
        self.b.iter().chain(self.a.iter()).all(|c| c.is_finite())
    }

    /// Respuesta en magnitud a la frecuencia `freq` (Hz) dada la frecuencia de muestreo
    pub fn gain_at(&self, freq: f64, f_sample: f64) -> f64 {
        let w = 2.0 * PI * freq / f_sample;
        let eval = |c: &[f64; 3]| {
            let re = c[0] + c[1] * w.cos() + c[2] * (2.0 * w).cos();
            let im = -(c[1] * w.sin() + c[2] * (2.0 * w).sin());
            (re * re + im * im).sqrt()
        };
        eval(&self.b) / eval(&self.a)
    }
}

/// Parámetros del diseño
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FilterSpec {
    pub f_sample: f64,
    pub hp_cut: f64,
    pub lp_cut: Option<f64>,
}

impl From<&PreprocessingConfig> for FilterSpec {
    fn from(pre: &PreprocessingConfig) -> Self {
        Self {
            f_sample: pre.f_sample,
            hp_cut: pre.hp_cut,
            lp_cut: pre.lp_cut,
        }
    }
}

impl FilterSpec {
    pub fn kind(&self) -> FilterKind {
        if self.lp_cut.is_some() {
            FilterKind::Bandpass
        } else {
            FilterKind::Highpass
        }
    }

    pub fn design(&self) -> Result<IirCoefficients> {
        let nyquist = self.f_sample / 2.0;
        if !(self.f_sample > 0.0 && self.hp_cut > 0.0 && self.hp_cut < nyquist) {
            return Err(PipelineError::Config(format!(
                "hp_cut {} Hz is outside (0, {}) Hz",
                self.hp_cut, nyquist
            )));
        }

        let coeffs = match self.lp_cut {
            None => highpass_order2(self.hp_cut, self.f_sample),
            Some(lp_cut) => {
                if !(lp_cut > self.hp_cut && lp_cut < nyquist) {
                    return Err(PipelineError::Config(format!(
                        "lp_cut {} Hz is outside ({}, {}) Hz",
                        lp_cut, self.hp_cut, nyquist
                    )));
                }
                bandpass_order1(self.hp_cut, lp_cut, self.f_sample)
            }
        };

        if !coeffs.is_finite() {
            return Err(PipelineError::Config(format!(
                "filter design produced non-finite coefficients: {:?}",
                coeffs
            )));
        }
        debug!(
            kind = ?coeffs.kind,
            gain_at_hp_cut = coeffs.gain_at(self.hp_cut, self.f_sample),
            "filtro Butterworth"
        );
        Ok(coeffs)
    }
}

fn prewarp(freq: f64, f_sample: f64) -> f64 {
    (PI * freq / f_sample).tan()
}

fn highpass_order2(cutoff: f64, f_sample: f64) -> IirCoefficients {
    let k = prewarp(cutoff, f_sample);
    let k_sq = k * k;
    let norm = 1.0 + SQRT_2 * k + k_sq;

    IirCoefficients {
        kind: FilterKind::Highpass,
        b: [1.0 / norm, -2.0 / norm, 1.0 / norm],
        a: [
            1.0,
            2.0 * (k_sq - 1.0) / norm,
            (1.0 - SQRT_2 * k + k_sq) / norm,
        ],
    }
}

fn bandpass_order1(low: f64, high: f64, f_sample: f64) -> IirCoefficients {
    let t_low = prewarp(low, f_sample);
    let t_high = prewarp(high, f_sample);
    let bw = t_high - t_low;
    // Frecuencia central (al cuadrado) en el dominio pre-distorsionado
    let center_sq = t_low * t_high;
    let norm = 1.0 + bw + center_sq;

    IirCoefficients {
        kind: FilterKind::Bandpass,
        b: [bw / norm, 0.0, -bw / norm],
        a: [
            1.0,
            2.0 * (center_sq - 1.0) / norm,
            (1.0 - bw + center_sq) / norm,
        ],
    }
}
