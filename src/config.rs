//! Configuración de usuario (YAML) con valores por defecto y validación.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{PipelineError, Result};

/// ODR soportados por el sensor (Hz)
pub const SUPPORTED_ODR: [f64; 10] = [
    12.5, 26.0, 52.0, 104.0, 208.0, 416.0, 833.0, 1667.0, 3333.0, 6667.0,
];

/// ODR máximo en modo de bajo consumo
const LOW_POWER_MAX_ODR: f64 = 208.0;

/// Sensibilidad (g/LSB) para cada fondo de escala soportado
const SUPPORTED_FULL_SCALE: [(u32, f32); 4] = [
    (2, 0.000061),
    (4, 0.000122),
    (8, 0.000244),
    (16, 0.000488),
];

/// Devuelve la sensibilidad del fondo de escala indicado, si está soportado
pub fn sensitivity_g(full_scale_g: u32) -> Option<f32> {
    SUPPORTED_FULL_SCALE
        .iter()
        .find(|(fs, _)| *fs == full_scale_g)
        .map(|(_, sens)| *sens)
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Config {
    pub general: GeneralConfig,
    pub dataset: DatasetConfig,
    pub preprocessing: PreprocessingConfig,
    #[serde(default)]
    pub training: TrainingConfig,
    #[serde(default)]
    pub application: ApplicationConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GeneralConfig {
    /// Nombre del caso de uso (se usa en los artefactos generados)
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DatasetConfig {
    pub name: String,
    /// Raíz con un subdirectorio `<id>_<letra>` por clase
    pub path: PathBuf,
}

/// Vista a inspeccionar durante la segmentación
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SegmentationView {
    Raw,
    Filtered,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum PowerMode {
    #[default]
    HighPerformance,
    LowPower,
}

impl PowerMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            PowerMode::HighPerformance => "high_performance",
            PowerMode::LowPower => "low_power",
        }
    }

    fn supports_odr(&self, odr: f64) -> bool {
        match self {
            PowerMode::HighPerformance => true,
            PowerMode::LowPower => odr <= LOW_POWER_MAX_ODR,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PreprocessingConfig {
    /// ODR del sensor (Hz)
    pub f_sample: f64,
    pub full_scale_g: u32,
    #[serde(default)]
    pub power_mode: PowerMode,
    pub win_len_samples: usize,
    /// Corte pasa-altas (Hz)
    #[serde(default = "default_hp_cut")]
    pub hp_cut: f64,
    /// Corte pasa-bajas (Hz). Si existe, el filtro pasa a ser pasa-banda
    #[serde(default)]
    pub lp_cut: Option<f64>,
    #[serde(default = "default_win_ths_g")]
    pub win_ths_g: f32,
    #[serde(default = "default_trig_len")]
    pub trig_len_samples: usize,
    #[serde(default)]
    pub reset_len_samples: usize,
    #[serde(default)]
    pub discard_len_samples: usize,
    #[serde(default)]
    pub show_segmentation: Option<SegmentationView>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TrainingConfig {
    #[serde(default = "default_epochs")]
    pub epochs: u32,
    #[serde(default = "default_batch_size")]
    pub batch_size: u32,
    /// Fracción de entrenamiento frente a test
    #[serde(default = "default_train_test_split")]
    pub train_test_split: f64,
    /// Fracción de validación dentro de la partición de entrenamiento
    #[serde(default = "default_train_validation_split")]
    pub train_validation_split: f64,
    #[serde(default = "default_true")]
    pub show_stats: bool,
    /// Semilla del generador compartido por balanceo y partición
    #[serde(default = "default_seed")]
    pub seed: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ApplicationConfig {
    #[serde(default = "default_prediction_threshold")]
    pub prediction_threshold: f32,
}

fn default_hp_cut() -> f64 {
    1.0
}

fn default_win_ths_g() -> f32 {
    0.25
}

fn default_trig_len() -> usize {
    1
}

fn default_epochs() -> u32 {
    150
}

fn default_batch_size() -> u32 {
    32
}

fn default_train_test_split() -> f64 {
    0.8
}

fn default_train_validation_split() -> f64 {
    0.1
}

fn default_true() -> bool {
    true
}

fn default_seed() -> u64 {
    42
}

fn default_prediction_threshold() -> f32 {
    0.6
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            epochs: default_epochs(),
            batch_size: default_batch_size(),
            train_test_split: default_train_test_split(),
            train_validation_split: default_train_validation_split(),
            show_stats: true,
            seed: default_seed(),
        }
    }
}

impl Default for ApplicationConfig {
    fn default() -> Self {
        Self {
            prediction_threshold: default_prediction_threshold(),
        }
    }
}

impl Default for PreprocessingConfig {
    fn default() -> Self {
        Self {
            f_sample: 104.0,
            full_scale_g: 8,
            power_mode: PowerMode::default(),
            win_len_samples: 40,
            hp_cut: default_hp_cut(),
            lp_cut: None,
            win_ths_g: default_win_ths_g(),
            trig_len_samples: default_trig_len(),
            reset_len_samples: 0,
            discard_len_samples: 0,
            show_segmentation: None,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            general: GeneralConfig {
                name: "wand".to_string(),
            },
            dataset: DatasetConfig {
                name: "dataset".to_string(),
                path: PathBuf::from("dataset"),
            },
            preprocessing: PreprocessingConfig::default(),
            training: TrainingConfig::default(),
            application: ApplicationConfig::default(),
        }
    }
}

impl Config {
    /// Carga y valida la configuración desde un YAML
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref())?;
        Self::from_yaml(&content)
    }

    pub fn from_yaml(content: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Valida rangos y combinaciones. A partir de aquí el pipeline confía en los valores.
    pub fn validate(&self) -> Result<()> {
        let pre = &self.preprocessing;
        let train = &self.training;

        if self.general.name.trim().is_empty() {
            return Err(config_err("general.name must not be empty"));
        }
        if self.dataset.path.as_os_str().is_empty() {
            return Err(config_err("dataset.path must not be empty"));
        }
        if !SUPPORTED_ODR.contains(&pre.f_sample) {
            return Err(config_err(format!(
                "invalid sensor ODR {} (supported: {:?})",
                pre.f_sample, SUPPORTED_ODR
            )));
        }
        if sensitivity_g(pre.full_scale_g).is_none() {
            return Err(config_err(format!(
                "invalid sensor full scale {} g",
                pre.full_scale_g
            )));
        }
        if !pre.power_mode.supports_odr(pre.f_sample) {
            return Err(config_err(format!(
                "power_mode {} does not support ODR {}",
                pre.power_mode.as_str(),
                pre.f_sample
            )));
        }
        if pre.win_len_samples == 0 {
            return Err(config_err("win_len_samples must be a strictly positive integer"));
        }
        if pre.trig_len_samples == 0 {
            return Err(config_err("trig_len_samples must be a strictly positive integer"));
        }
        if !pre.win_ths_g.is_finite() {
            return Err(config_err("win_ths_g must be a finite number"));
        }

        let nyquist = pre.f_sample / 2.0;
        if !(pre.hp_cut > 0.0 && pre.hp_cut < nyquist) {
            return Err(config_err(format!(
                "hp_cut must be between 0 and f_sample / 2 ({}), got {}",
                nyquist, pre.hp_cut
            )));
        }
        if let Some(lp_cut) = pre.lp_cut {
            if !(lp_cut > pre.hp_cut && lp_cut < nyquist) {
                return Err(config_err(format!(
                    "lp_cut must be between hp_cut ({}) and f_sample / 2 ({}), got {}",
                    pre.hp_cut, nyquist, lp_cut
                )));
            }
        }

        if train.epochs == 0 {
            return Err(config_err("epochs must be a positive integer"));
        }
        if train.batch_size == 0 {
            return Err(config_err("batch_size must be a positive integer"));
        }
        if !(train.train_test_split > 0.0 && train.train_test_split < 1.0) {
            return Err(config_err(format!(
                "train_test_split must be in (0, 1), got {}",
                train.train_test_split
            )));
        }
        if !(train.train_validation_split > 0.0 && train.train_validation_split < 1.0) {
            return Err(config_err(format!(
                "train_validation_split must be in (0, 1), got {}",
                train.train_validation_split
            )));
        }
        if !(0.0..=1.0).contains(&self.application.prediction_threshold) {
            return Err(config_err(format!(
                "prediction_threshold must be in [0, 1], got {}",
                self.application.prediction_threshold
            )));
        }

        Ok(())
    }

    pub fn sensitivity_g(&self) -> f32 {
        sensitivity_g(self.preprocessing.full_scale_g).unwrap_or(0.0)
    }
}

fn config_err(msg: impl Into<String>) -> PipelineError {
    PipelineError::Config(msg.into())
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL_YAML: &str = r#"
general:
  name: wand
dataset:
  name: letters
  path: ./dataset
preprocessing:
  f_sample: 104
  full_scale_g: 8
  win_len_samples: 40
"#;

    #[test]
    fn minimal_yaml_takes_defaults() {
        let config = Config::from_yaml(MINIMAL_YAML).unwrap();
        let pre = &config.preprocessing;
        assert_eq!(pre.f_sample, 104.0);
        assert_eq!(pre.hp_cut, 1.0);
        assert_eq!(pre.lp_cut, None);
        assert_eq!(pre.win_ths_g, 0.25);
        assert_eq!(pre.trig_len_samples, 1);
        assert_eq!(pre.reset_len_samples, 0);
        assert_eq!(pre.discard_len_samples, 0);
        assert_eq!(pre.power_mode, PowerMode::HighPerformance);
        assert_eq!(pre.show_segmentation, None);
        assert_eq!(config.training.train_test_split, 0.8);
        assert_eq!(config.training.train_validation_split, 0.1);
        assert_eq!(config.training.seed, 42);
        assert_eq!(config.application.prediction_threshold, 0.6);
    }

    #[test]
    fn full_yaml_parses_enums() {
        let yaml = format!(
            "{}  lp_cut: 10.0\n  power_mode: low_power\n  show_segmentation: filtered\n",
            MINIMAL_YAML
        );
        let config = Config::from_yaml(&yaml).unwrap();
        assert_eq!(config.preprocessing.lp_cut, Some(10.0));
        assert_eq!(config.preprocessing.power_mode, PowerMode::LowPower);
        assert_eq!(
            config.preprocessing.show_segmentation,
            Some(SegmentationView::Filtered)
        );
    }

    #[test]
    fn default_config_is_valid() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn rejects_unsupported_odr() {
        let mut config = Config::default();
        config.preprocessing.f_sample = 100.0;
        assert!(matches!(config.validate(), Err(PipelineError::Config(_))));
    }

    #[test]
    fn rejects_low_power_at_high_odr() {
        let mut config = Config::default();
        config.preprocessing.f_sample = 416.0;
        config.preprocessing.power_mode = PowerMode::LowPower;
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_cutoff_at_nyquist() {
        let mut config = Config::default();
        config.preprocessing.hp_cut = 52.0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.preprocessing.lp_cut = Some(0.5);
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_zero_lengths_and_bad_splits() {
        let mut config = Config::default();
        config.preprocessing.win_len_samples = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.preprocessing.trig_len_samples = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.training.train_test_split = 1.0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.training.train_validation_split = 0.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn sensitivity_table() {
        assert_eq!(sensitivity_g(2), Some(0.000061));
        assert_eq!(sensitivity_g(16), Some(0.000488));
        assert_eq!(sensitivity_g(3), None);
    }
}
