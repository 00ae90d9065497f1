use tracing::debug;

use crate::error::{PipelineError, Result};
use crate::filter_design::{FilterKind, IirCoefficients};
use crate::types::{ConditionedMatrix, RecordingMatrix, Sample, NUM_AXES};

/// Estado de la sección de segundo orden para un canal
#[derive(Debug, Clone, Copy, Default)]
struct BiquadState {
    x1: f64,
    x2: f64,
    y1: f64,
    y2: f64,
}

impl BiquadState {
    fn step(&mut self, b: &[f64; 3], a: &[f64; 3], x: f64) -> f64 {
        let y = b[0] * x + b[1] * self.x1 + b[2] * self.x2 - a[1] * self.y1 - a[2] * self.y2;
        self.x2 = self.x1;
        self.x1 = x;
        self.y2 = self.y1;
        self.y1 = y;
        y
    }
}

/// Filtro IIR causal aplicado canal a canal.
/// Cada llamada a `condition` arranca con condiciones iniciales nulas.
#[derive(Debug, Clone)]
pub struct SignalConditioner {
    kind: FilterKind,
    b: [f64; 3],
    a: [f64; 3],
}

impl SignalConditioner {
    /// Valida y normaliza los coeficientes (a0 = 1)
    pub fn new(coeffs: &IirCoefficients) -> Result<Self> {
        if !coeffs.is_finite() {
            return Err(PipelineError::Config(format!(
                "non-finite filter coefficients: b={:?} a={:?}",
                coeffs.b, coeffs.a
            )));
        }
        let a0 = coeffs.a[0];
        if a0 == 0.0 {
            return Err(PipelineError::Config(
                "filter coefficient a[0] must not be zero".to_string(),
            ));
        }

        let b = coeffs.b.map(|c| c / a0);
        let a = coeffs.a.map(|c| c / a0);
        debug!(kind = ?coeffs.kind, ?b, ?a, "acondicionador configurado");

        Ok(Self {
            kind: coeffs.kind,
            b,
            a,
        })
    }

    pub fn kind(&self) -> FilterKind {
        self.kind
    }

    /// Filtra la grabación y devuelve una matriz nueva del mismo tamaño
    pub fn condition(&self, recording: &RecordingMatrix) -> ConditionedMatrix {
        let mut states = [BiquadState::default(); NUM_AXES];

        let samples = recording
            .samples()
            .iter()
            .map(|sample| {
                let mut out = [0.0f32; NUM_AXES];
                for (axis, state) in states.iter_mut().enumerate() {
                    out[axis] = state.step(&self.b, &self.a, sample.axis(axis) as f64) as f32;
                }
                Sample::from_axes(out)
            })
            .collect();

        ConditionedMatrix::new(samples)
    }
}
