use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

use crate::error::{PipelineError, Result};
use crate::recording_source::RecordingEntry;
use crate::types::ClassId;

/// Biyección id de clase <-> letra.
///
/// Los ids son densos (0..K-1) y se asignan ordenando las clases descubiertas
/// por (prefijo numérico del directorio, letra). Si los prefijos ya son 0..K-1
/// el id coincide con el prefijo.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LabelMap {
    letters: Vec<String>,
}

impl LabelMap {
    pub fn from_entries(entries: &[RecordingEntry]) -> Result<Self> {
        let classes: BTreeSet<(u32, &str)> = entries
            .iter()
            .map(|e| (e.label_id, e.label_letter.as_str()))
            .collect();

        let mut by_letter: BTreeMap<&str, u32> = BTreeMap::new();
        let mut by_prefix: BTreeMap<u32, &str> = BTreeMap::new();
        for &(prefix, letter) in &classes {
            if let Some(other) = by_letter.insert(letter, prefix) {
                return Err(PipelineError::Data(format!(
                    "label {} appears with ids {} and {}",
                    letter, other, prefix
                )));
            }
            if let Some(other) = by_prefix.insert(prefix, letter) {
                return Err(PipelineError::Data(format!(
                    "id {} is used by labels {} and {}",
                    prefix, other, letter
                )));
            }
        }

        Ok(Self {
            letters: classes.into_iter().map(|(_, l)| l.to_string()).collect(),
        })
    }

    /// Construye el mapa directamente a partir de las letras en orden de id
    pub fn from_letters<I, S>(letters: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            letters: letters.into_iter().map(Into::into).collect(),
        }
    }

    pub fn id_of(&self, letter: &str) -> Option<ClassId> {
        self.letters.iter().position(|l| l == letter)
    }

    pub fn letter(&self, id: ClassId) -> Option<&str> {
        self.letters.get(id).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.letters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.letters.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (ClassId, &str)> {
        self.letters.iter().map(String::as_str).enumerate()
    }
}
