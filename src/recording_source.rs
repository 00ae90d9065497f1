//! Descubrimiento y carga de grabaciones.
//!
//! El resto del pipeline sólo ve `RecordingEntry`; la convención de nombres de
//! directorio (`<id>_<letra>`) vive únicamente en `DirectorySource`.

use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::csv_loader::load_recording;
use crate::error::{PipelineError, Result};
use crate::types::RecordingMatrix;

/// Una grabación y la clase a la que pertenece
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordingEntry {
    /// Identificador numérico declarado por la fuente (prefijo del directorio)
    pub label_id: u32,
    /// Nombre visible de la clase, en mayúsculas
    pub label_letter: String,
    pub path: PathBuf,
}

/// Colaborador que enumera grabaciones y las carga (valores en mg)
pub trait RecordingSource {
    fn entries(&self) -> Result<Vec<RecordingEntry>>;

    fn load(&self, entry: &RecordingEntry) -> Result<RecordingMatrix>;
}

/// Fuente basada en directorios: `<raíz>/<id>_<letra>/**/*.csv`
#[derive(Debug, Clone)]
pub struct DirectorySource {
    root: PathBuf,
}

impl DirectorySource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

/// Interpreta el nombre de un directorio de clase `<id>_<letra>`
pub fn parse_class_dir(name: &str) -> Option<(u32, String)> {
    let (id, letter) = name.split_once('_')?;
    let id = id.trim().parse().ok()?;
    let letter = letter.trim();
    if letter.is_empty() {
        return None;
    }
    Some((id, letter.to_uppercase()))
}

fn is_csv(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.eq_ignore_ascii_case("csv"))
        .unwrap_or(false)
}

impl RecordingSource for DirectorySource {
    fn entries(&self) -> Result<Vec<RecordingEntry>> {
        if !self.root.is_dir() {
            return Err(PipelineError::Data(format!(
                "dataset path {:?} is not a directory",
                self.root
            )));
        }

        let mut entries = Vec::new();
        for dir_entry in WalkDir::new(&self.root).sort_by_file_name() {
            let dir_entry = dir_entry?;
            let path = dir_entry.path();
            if !dir_entry.file_type().is_file() || !is_csv(path) {
                continue;
            }

            let class_dir = path
                .parent()
                .and_then(|p| p.file_name())
                .and_then(|n| n.to_str())
                .unwrap_or_default();
            let (label_id, label_letter) = parse_class_dir(class_dir).ok_or_else(|| {
                PipelineError::Data(format!(
                    "class directory {:?} of {:?} does not follow the <id>_<letter> convention",
                    class_dir, path
                ))
            })?;

            entries.push(RecordingEntry {
                label_id,
                label_letter,
                path: path.to_path_buf(),
            });
        }

        Ok(entries)
    }

    fn load(&self, entry: &RecordingEntry) -> Result<RecordingMatrix> {
        load_recording(&entry.path)
    }
}
