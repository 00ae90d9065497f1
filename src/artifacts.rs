//! Artefactos de despliegue y resumen del dataset.
//!
//! Todo se genera a partir del LabelMap final, la configuración validada y los
//! coeficientes del filtro diseñado.

use std::fmt::{Display, Write as _};
use std::fs::{self, File};
use std::path::{Path, PathBuf};

use ndarray::{Array2, Array3, Axis};
use ndarray_npy::NpzWriter;
use serde::Serialize;
use tracing::info;

use crate::config::Config;
use crate::error::{PipelineError, Result};
use crate::filter_design::IirCoefficients;
use crate::labels::LabelMap;
use crate::splitter::SplitDataset;
use crate::types::NUM_AXES;

pub const HEADER_FILE: &str = "ispu_wand_params.h";
pub const META_FILE: &str = "meta.txt";
pub const CONF_FILE: &str = "conf.txt";
pub const SUMMARY_FILE: &str = "dataset_summary.json";
/// Subconjunto de test para validar el modelo en el dispositivo
pub const VALIDATION_NPZ_FILE: &str = "validation_data.npz";

const HEADER_GUARD: &str = "ISPU_WAND_PARAMS_H";

const HEADER_PREAMBLE: &str = "\
/**
  ******************************************************************************
  * @file    ispu_wand_params.h
  * @brief   Parámetros del algoritmo wand generados por varita.
  *          No editar a mano: se regenera con `varita prepare`.
  ******************************************************************************
  */
";

/// ODR: entero si no tiene decimales (`104`), flotante si los tiene (`12.5f`)
fn c_odr(odr: f64) -> String {
    if odr.fract() == 0.0 {
        format!("{}", odr)
    } else {
        format!("{}f", odr)
    }
}

/// Constante flotante en C: `104.0f`, `0.25f`
fn c_float<T: Into<f64> + Display + Copy>(value: T) -> String {
    if value.into().fract() == 0.0 {
        format!("{:.1}f", value)
    } else {
        format!("{}f", value)
    }
}

fn c_array(values: &[f64; 3]) -> String {
    let items: Vec<String> = values.iter().map(|v| format!("{:.6}f", v)).collect();
    format!("{{ {} }}", items.join(", "))
}

/// Cabecera C con constantes del algoritmo, filtro y etiquetas
pub fn render_header(config: &Config, labels: &LabelMap, coeffs: &IirCoefficients) -> String {
    let pre = &config.preprocessing;
    let mut out = String::from(HEADER_PREAMBLE);

    let _ = writeln!(out, "\n#ifndef {}", HEADER_GUARD);
    let _ = writeln!(out, "#define {}\n", HEADER_GUARD);

    // Claves en orden alfabético; las que sólo usa el pipeline offline no se exportan
    let defines = [
        ("ACC_SENS_G", c_float(config.sensitivity_g())),
        ("F_SAMPLE", c_odr(pre.f_sample)),
        ("FULL_SCALE_G", pre.full_scale_g.to_string()),
        ("RESET_LEN_SAMPLES", pre.reset_len_samples.to_string()),
        ("TRIG_LEN_SAMPLES", pre.trig_len_samples.to_string()),
        ("WIN_LEN_SAMPLES", pre.win_len_samples.to_string()),
        ("WIN_THS_G", c_float(pre.win_ths_g)),
        ("PRED_THS", c_float(config.application.prediction_threshold)),
        ("NUM_AXES", NUM_AXES.to_string()),
        ("NUM_LABELS", labels.len().to_string()),
        ("IIR2_B", c_array(&coeffs.b)),
        ("IIR2_A", c_array(&coeffs.a)),
    ];
    for (name, value) in defines {
        let _ = writeln!(out, "#define {} {}", name, value);
    }

    out.push_str("\nenum {\n");
    for (_, letter) in labels.iter() {
        let _ = writeln!(out, "\tLABEL_{},", letter);
    }
    out.push_str("\tLABEL_NULL,\n};\n");

    let chars: Vec<String> = labels
        .iter()
        .map(|(_, letter)| format!("'{}'", letter))
        .chain(std::iter::once("' '".to_string()))
        .collect();
    let _ = writeln!(out, "const char LABELS[] = {{ {} }};", chars.join(", "));

    let _ = writeln!(out, "\n#endif //{}", HEADER_GUARD);
    out
}

/// Descripción de las salidas del algoritmo en el sensor
pub fn render_meta(config: &Config, labels: &LabelMap) -> String {
    let mut out = format!("description \"ISPU wand ({})\"\n\n", config.general.name);
    for axis in ["x", "y", "z"] {
        let _ = writeln!(out, "output \"acc_{} [mg]\" float", axis);
    }
    out.push_str("output \"go\" uint8_t\n");
    for (_, letter) in labels.iter() {
        let _ = writeln!(out, "output \"{}\" float", letter);
    }
    out.push_str("output \"pred_char\" char\n");
    out
}

/// Configuración del sensor
pub fn render_conf(config: &Config) -> String {
    let pre = &config.preprocessing;
    // `{}` imprime 104 para 104.0 y 12.5 para 12.5
    let odr = pre.f_sample;
    format!(
        "acc_odr {odr}\n\
         acc_fs {}\n\
         acc_mode {}\n\
         \n\
         ispu_irq_rate {odr}\n\
         ispu_int1 enable\n\
         ispu_sleep_int2 enable\n\
         ispu_latch disable\n\
         \n\
         algo 0 enable\n\
         algo_int1 0 enable\n",
        pre.full_scale_g,
        pre.power_mode.as_str(),
    )
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ClassSummary {
    pub id: usize,
    pub letter: String,
    /// Ventanas tras el ensamblado
    pub assembled: usize,
    /// Ventanas tras el balanceo
    pub balanced: usize,
    pub train: usize,
    pub validation: usize,
    pub test: usize,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct TrainingSummary {
    pub epochs: u32,
    pub batch_size: u32,
    pub show_stats: bool,
    pub seed: u64,
}

/// Resumen del dataset para el entrenador
#[derive(Debug, Clone, Serialize)]
pub struct DatasetSummary {
    pub name: String,
    pub dataset: String,
    pub win_len: usize,
    pub num_axes: usize,
    pub recordings: usize,
    pub empty_recordings: usize,
    pub min_count: usize,
    pub classes: Vec<ClassSummary>,
    pub filter: IirCoefficients,
    pub training: TrainingSummary,
}

impl DatasetSummary {
    pub fn new(
        config: &Config,
        labels: &LabelMap,
        assembled_counts: &[usize],
        min_count: usize,
        split: &SplitDataset,
        filter: IirCoefficients,
    ) -> Self {
        let k = labels.len();
        let train = split.train.class_counts(k);
        let validation = split.validation.class_counts(k);
        let test = split.test.class_counts(k);

        let classes = labels
            .iter()
            .map(|(id, letter)| ClassSummary {
                id,
                letter: letter.to_string(),
                assembled: assembled_counts.get(id).copied().unwrap_or(0),
                balanced: train[id] + validation[id] + test[id],
                train: train[id],
                validation: validation[id],
                test: test[id],
            })
            .collect();

        Self {
            name: config.general.name.clone(),
            dataset: config.dataset.name.clone(),
            win_len: config.preprocessing.win_len_samples,
            num_axes: NUM_AXES,
            recordings: 0,
            empty_recordings: 0,
            min_count,
            classes,
            filter,
            training: TrainingSummary {
                epochs: config.training.epochs,
                batch_size: config.training.batch_size,
                show_stats: config.training.show_stats,
                seed: config.training.seed,
            },
        }
    }

    pub fn with_recordings(mut self, recordings: usize, empty_recordings: usize) -> Self {
        self.recordings = recordings;
        self.empty_recordings = empty_recordings;
        self
    }
}

/// Rutas de los artefactos escritos
#[derive(Debug, Clone)]
pub struct ArtifactPaths {
    pub header: PathBuf,
    pub meta: PathBuf,
    pub conf: PathBuf,
    pub summary: PathBuf,
}

/// Escribe cabecera, meta, conf y resumen en `out_dir` (se crea si no existe)
pub fn write_artifacts(
    out_dir: &Path,
    config: &Config,
    labels: &LabelMap,
    summary: &DatasetSummary,
) -> Result<ArtifactPaths> {
    fs::create_dir_all(out_dir)?;

    let paths = ArtifactPaths {
        header: out_dir.join(HEADER_FILE),
        meta: out_dir.join(META_FILE),
        conf: out_dir.join(CONF_FILE),
        summary: out_dir.join(SUMMARY_FILE),
    };

    fs::write(&paths.header, render_header(config, labels, &summary.filter))?;
    fs::write(&paths.meta, render_meta(config, labels))?;
    fs::write(&paths.conf, render_conf(config))?;
    fs::write(&paths.summary, serde_json::to_string_pretty(summary)?)?;

    info!(out_dir = ?out_dir, "artefactos generados");
    Ok(paths)
}

/// Vuelca un subconjunto como CSV: `label,t0_x,t0_y,t0_z,...` (una fila por ventana)
pub fn write_tensors_csv(path: &Path, x: &Array3<f32>, y: &Array2<f32>, labels: &LabelMap) -> Result<()> {
    let (n, win_len, axes) = x.dim();
    if y.nrows() != n || y.ncols() != labels.len() {
        return Err(PipelineError::Data(format!(
            "label tensor {:?} does not match {} windows and {} classes",
            y.dim(),
            n,
            labels.len()
        )));
    }

    let mut writer = csv::Writer::from_path(path)?;

    let mut header = vec!["label".to_string()];
    for t in 0..win_len {
        for axis in ["x", "y", "z"].iter().take(axes) {
            header.push(format!("t{}_{}", t, axis));
        }
    }
    writer.write_record(&header)?;

    for (window, onehot) in x.axis_iter(Axis(0)).zip(y.axis_iter(Axis(0))) {
        let class = onehot.iter().position(|&v| v == 1.0).ok_or_else(|| {
            PipelineError::Data("label row is not one-hot".to_string())
        })?;
        let mut record = Vec::with_capacity(1 + win_len * axes);
        record.push(labels.letter(class).unwrap_or("?").to_string());
        record.extend(window.iter().map(|v| v.to_string()));
        writer.write_record(&record)?;
    }
    writer.flush()?;
    Ok(())
}

/// Guarda entradas y salidas esperadas como `m_inputs` / `m_outputs` en un `.npz`
pub fn write_validation_npz(path: &Path, x: &Array3<f32>, y: &Array2<f32>) -> Result<()> {
    if x.dim().0 != y.nrows() {
        return Err(PipelineError::Data(format!(
            "{} windows but {} label rows",
            x.dim().0,
            y.nrows()
        )));
    }
    let mut npz = NpzWriter::new(File::create(path)?);
    npz.add_array("m_inputs", x)?;
    npz.add_array("m_outputs", y)?;
    npz.finish()?;
    Ok(())
}
