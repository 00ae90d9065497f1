use rand::seq::index;
use rand::Rng;
use tracing::info;

use crate::dataset::Dataset;
use crate::error::{PipelineError, Result};
use crate::labels::LabelMap;
use crate::types::ClassId;

/// Dataset balanceado: todas las clases con `min_count` ventanas
#[derive(Debug, Clone)]
pub struct BalancedDataset {
    pub dataset: Dataset,
    pub min_count: usize,
    /// Clase minoritaria (se conserva completa)
    pub minority: ClassId,
}

/// Submuestrea las clases mayoritarias hasta igualar a la minoritaria.
///
/// La minoritaria (el id más bajo en caso de empate) conserva todas sus
/// ventanas. Para el resto se extraen `min_count` ventanas sin reemplazo con el
/// generador recibido, recorriendo las clases en orden de id.
pub fn balance_classes<R: Rng + ?Sized>(
    dataset: &Dataset,
    labels: &LabelMap,
    rng: &mut R,
) -> Result<BalancedDataset> {
    let pools = dataset.indices_by_class(labels.len());

    let (minority, min_count) = pools
        .iter()
        .map(Vec::len)
        .enumerate()
        .fold(None, |best: Option<(ClassId, usize)>, (id, count)| match best {
            Some((_, best_count)) if best_count <= count => best,
            _ => Some((id, count)),
        })
        .ok_or_else(|| PipelineError::Data("cannot balance a dataset without classes".to_string()))?;

    if min_count == 0 {
        return Err(PipelineError::Data(format!(
            "class {} has no windows, balancing cannot proceed",
            labels.letter(minority).unwrap_or("?")
        )));
    }

    let mut keep: Vec<usize> = pools[minority].clone();
    for (id, pool) in pools.iter().enumerate() {
        if id == minority {
            continue;
        }
        keep.extend(index::sample(rng, pool.len(), min_count).into_iter().map(|i| pool[i]));
    }

    info!(
        min_count,
        minority = labels.letter(minority).unwrap_or("?"),
        total = keep.len(),
        "dataset balanceado"
    );

    Ok(BalancedDataset {
        dataset: dataset.select(&keep),
        min_count,
        minority,
    })
}
