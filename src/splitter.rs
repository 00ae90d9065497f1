use rand::seq::SliceRandom;
use rand::Rng;
use tracing::info;

use crate::config::TrainingConfig;
use crate::dataset::Dataset;
use crate::error::{PipelineError, Result};
use crate::labels::LabelMap;

/// Fracciones de la partición
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SplitFractions {
    /// Entrenamiento frente a test
    pub train_fraction: f64,
    /// Validación dentro de la partición de entrenamiento
    pub validation_fraction: f64,
}

impl From<&TrainingConfig> for SplitFractions {
    fn from(training: &TrainingConfig) -> Self {
        Self {
            train_fraction: training.train_test_split,
            validation_fraction: training.train_validation_split,
        }
    }
}

impl SplitFractions {
    /// Fracción objetivo del total para (train, validation, test)
    pub fn targets(&self) -> (f64, f64, f64) {
        let train = self.train_fraction * (1.0 - self.validation_fraction);
        let validation = self.train_fraction * self.validation_fraction;
        (train, validation, 1.0 - self.train_fraction)
    }

    /// Reparto de `n` ventanas de una clase: (train, validation, test)
    pub fn allot(&self, n: usize) -> (usize, usize, usize) {
        let n_train = ((n as f64 * self.train_fraction).round() as usize).min(n);
        let n_fit = ((n_train as f64 * (1.0 - self.validation_fraction)).round() as usize).min(n_train);
        (n_fit, n_train - n_fit, n - n_train)
    }

    fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("train_test_split", self.train_fraction),
            ("train_validation_split", self.validation_fraction),
        ] {
            if !(value > 0.0 && value < 1.0) {
                return Err(PipelineError::Config(format!(
                    "{} must be in (0, 1), got {}",
                    name, value
                )));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default)]
pub struct SplitDataset {
    pub train: Dataset,
    pub validation: Dataset,
    pub test: Dataset,
}

/// Partición estratificada: la misma proporción se aplica dentro de cada clase.
///
/// Primero train/test con `train_fraction`, luego train/validation sobre la
/// parte de entrenamiento con `1 - validation_fraction`. Falla si alguna clase
/// con ventanas quedaría vacía en alguno de los tres subconjuntos.
pub fn stratified_split<R: Rng + ?Sized>(
    dataset: &Dataset,
    labels: &LabelMap,
    fractions: SplitFractions,
    rng: &mut R,
) -> Result<SplitDataset> {
    fractions.validate()?;

    let mut train = Vec::new();
    let mut validation = Vec::new();
    let mut test = Vec::new();

    for (id, mut pool) in dataset.indices_by_class(labels.len()).into_iter().enumerate() {
        if pool.is_empty() {
            continue;
        }

        let (n_fit, n_val, n_test) = fractions.allot(pool.len());
        if n_fit == 0 || n_val == 0 || n_test == 0 {
            return Err(PipelineError::Config(format!(
                "class {} with {} windows would split into train={} validation={} test={}",
                labels.letter(id).unwrap_or("?"),
                pool.len(),
                n_fit,
                n_val,
                n_test
            )));
        }

        pool.shuffle(rng);
        let (train_part, test_part) = pool.split_at(n_fit + n_val);
        let (fit_part, val_part) = train_part.split_at(n_fit);
        train.extend_from_slice(fit_part);
        validation.extend_from_slice(val_part);
        test.extend_from_slice(test_part);
    }

    train.shuffle(rng);
    validation.shuffle(rng);
    test.shuffle(rng);

    info!(
        train = train.len(),
        validation = validation.len(),
        test = test.len(),
        "partición estratificada"
    );

    Ok(SplitDataset {
        train: dataset.select(&train),
        validation: dataset.select(&validation),
        test: dataset.select(&test),
    })
}
