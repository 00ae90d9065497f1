//! Ensamblado del dataset: una pasada por grabación (mg -> g, filtrado, segmentación).

use ndarray::{Array2, Array3};
use tracing::{debug, info, warn};

use crate::config::{PreprocessingConfig, SegmentationView};
use crate::error::{PipelineError, Result};
use crate::filter_design::FilterSpec;
use crate::gesture_segmenter::{GestureSegmenter, SegmenterParams};
use crate::labels::LabelMap;
use crate::recording_source::RecordingSource;
use crate::signal_conditioner::SignalConditioner;
use crate::types::{ClassId, RecordingMatrix, Window, NUM_AXES};

/// Ventana etiquetada con el id denso de su clase
#[derive(Debug, Clone, PartialEq)]
pub struct LabeledWindow {
    pub window: Window,
    pub label: ClassId,
}

/// Colección ordenada de ventanas etiquetadas
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dataset {
    items: Vec<LabeledWindow>,
}

impl Dataset {
    pub fn new(items: Vec<LabeledWindow>) -> Self {
        Self { items }
    }

    pub fn items(&self) -> &[LabeledWindow] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn push(&mut self, window: Window, label: ClassId) {
        self.items.push(LabeledWindow { window, label });
    }

    /// Número de ventanas por clase (índice = id)
    pub fn class_counts(&self, num_classes: usize) -> Vec<usize> {
        let mut counts = vec![0; num_classes];
        for item in &self.items {
            if let Some(count) = counts.get_mut(item.label) {
                *count += 1;
            }
        }
        counts
    }

    /// Índices de las ventanas de cada clase, en orden de aparición
    pub fn indices_by_class(&self, num_classes: usize) -> Vec<Vec<usize>> {
        let mut pools = vec![Vec::new(); num_classes];
        for (idx, item) in self.items.iter().enumerate() {
            if let Some(pool) = pools.get_mut(item.label) {
                pool.push(idx);
            }
        }
        pools
    }

    /// Nuevo dataset con las ventanas indicadas (copiadas, en ese orden)
    pub fn select(&self, indices: &[usize]) -> Dataset {
        Dataset::new(indices.iter().map(|&i| self.items[i].clone()).collect())
    }

    /// Tensores para el entrenador: ventanas [n, win_len, 3] y etiquetas one-hot [n, K]
    pub fn to_tensors(&self, win_len: usize, num_classes: usize) -> Result<(Array3<f32>, Array2<f32>)> {
        if let Some(bad) = self.items.iter().find(|it| it.window.len() != win_len) {
            return Err(PipelineError::Data(format!(
                "window at {} has {} samples, expected {}",
                bad.window.start,
                bad.window.len(),
                win_len
            )));
        }
        if let Some(bad) = self.items.iter().find(|it| it.label >= num_classes) {
            return Err(PipelineError::Data(format!(
                "label {} out of range for {} classes",
                bad.label, num_classes
            )));
        }

        let x = Array3::from_shape_fn((self.items.len(), win_len, NUM_AXES), |(i, t, axis)| {
            self.items[i].window.samples[t].axis(axis)
        });
        let y = Array2::from_shape_fn((self.items.len(), num_classes), |(i, class)| {
            if self.items[i].label == class {
                1.0
            } else {
                0.0
            }
        });
        Ok((x, y))
    }
}

/// Resultado del ensamblado
#[derive(Debug, Clone)]
pub struct AssembledDataset {
    pub dataset: Dataset,
    pub labels: LabelMap,
    /// Grabaciones procesadas
    pub recordings: usize,
    /// Grabaciones que no aportaron ninguna ventana
    pub empty_recordings: usize,
}

/// Recorre todas las grabaciones de una fuente y acumula las ventanas etiquetadas
#[derive(Debug, Clone)]
pub struct DatasetAssembler {
    conditioner: SignalConditioner,
    segmenter: GestureSegmenter,
    inspection: Option<(SegmentationView, f64)>,
}

impl DatasetAssembler {
    pub fn new(conditioner: SignalConditioner, segmenter: GestureSegmenter) -> Self {
        Self {
            conditioner,
            segmenter,
            inspection: None,
        }
    }

    /// Diseña el filtro y prepara el segmentador a partir de la configuración
    pub fn from_config(pre: &PreprocessingConfig) -> Result<Self> {
        let coeffs = FilterSpec::from(pre).design()?;
        let conditioner = SignalConditioner::new(&coeffs)?;
        let segmenter = GestureSegmenter::new(SegmenterParams::from(pre));
        info!(filter = ?conditioner.kind(), hp_cut = pre.hp_cut, lp_cut = ?pre.lp_cut, "filtro diseñado");
        let mut assembler = Self::new(conditioner, segmenter);
        if let Some(view) = pre.show_segmentation {
            assembler = assembler.with_inspection(view, pre.f_sample);
        }
        Ok(assembler)
    }

    /// Registra los tramos segmentados de cada archivo en la vista indicada
    pub fn with_inspection(mut self, view: SegmentationView, f_sample: f64) -> Self {
        self.inspection = Some((view, f_sample));
        self
    }

    pub fn segmenter(&self) -> &GestureSegmenter {
        &self.segmenter
    }

    /// Segmenta una grabación ya en g sobre la vista pedida (cruda o filtrada)
    pub fn segment_view(&self, recording_g: &RecordingMatrix, view: SegmentationView) -> Vec<Window> {
        match view {
            SegmentationView::Raw => self.segmenter.segment(recording_g),
            SegmentationView::Filtered => {
                let conditioned = self.conditioner.condition(recording_g);
                self.segmenter.segment(&conditioned)
            }
        }
    }

    pub fn assemble<S: RecordingSource + ?Sized>(&self, source: &S) -> Result<AssembledDataset> {
        let entries = source.entries()?;
        if entries.is_empty() {
            return Err(PipelineError::Data("no recordings found".to_string()));
        }
        let labels = LabelMap::from_entries(&entries)?;
        info!(recordings = entries.len(), classes = labels.len(), "segmentando grabaciones");

        let mut dataset = Dataset::default();
        let mut empty_recordings = 0;

        for entry in &entries {
            let label = labels.id_of(&entry.label_letter).ok_or_else(|| {
                PipelineError::Data(format!("label {} missing from label map", entry.label_letter))
            })?;

            let recording = source.load(entry)?.mg_to_g();
            let conditioned = self.conditioner.condition(&recording);
            let windows = self.segmenter.segment(&conditioned);

            if windows.is_empty() {
                empty_recordings += 1;
                warn!(path = ?entry.path, samples = recording.len(), "la grabación no produjo ventanas");
            } else {
                debug!(path = ?entry.path, label = %entry.label_letter, windows = windows.len(), "grabación segmentada");
            }

            if let Some((view, f_sample)) = self.inspection {
                let inspected = match view {
                    SegmentationView::Filtered => windows.clone(),
                    SegmentationView::Raw => self.segmenter.segment(&recording),
                };
                let spans: Vec<String> = inspected
                    .iter()
                    .map(|w| format!("{:.2}-{:.2}s", w.start as f64 / f_sample, w.end() as f64 / f_sample))
                    .collect();
                info!(path = ?entry.path, ?view, spans = %spans.join(", "), "segmentación");
            }

            for window in windows {
                dataset.push(window, label);
            }
        }

        Ok(AssembledDataset {
            dataset,
            labels,
            recordings: entries.len(),
            empty_recordings,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter_design::{FilterKind, IirCoefficients};
    use crate::recording_source::RecordingEntry;
    use crate::types::Sample;
    use std::collections::HashMap;
    use std::path::PathBuf;

    /// Fuente en memoria: ruta -> muestras en mg
    struct MemorySource {
        entries: Vec<RecordingEntry>,
        data: HashMap<PathBuf, Vec<Sample>>,
    }

    impl MemorySource {
        fn new() -> Self {
            Self {
                entries: Vec::new(),
                data: HashMap::new(),
            }
        }

        fn add(&mut self, id: u32, letter: &str, name: &str, xs_mg: &[f32]) {
            let path = PathBuf::from(format!("{id}_{letter}/{name}"));
            self.entries.push(RecordingEntry {
                label_id: id,
                label_letter: letter.to_string(),
                path: path.clone(),
            });
            self.data
                .insert(path, xs_mg.iter().map(|&x| Sample::new(x, 0.0, 1000.0)).collect());
        }
    }

    impl RecordingSource for MemorySource {
        fn entries(&self) -> Result<Vec<RecordingEntry>> {
            Ok(self.entries.clone())
        }

        fn load(&self, entry: &RecordingEntry) -> Result<RecordingMatrix> {
            self.data
                .get(&entry.path)
                .cloned()
                .map(RecordingMatrix::new)
                .ok_or_else(|| PipelineError::DataFormat {
                    path: entry.path.clone(),
                    reason: "missing header row".to_string(),
                })
        }
    }

    fn passthrough_assembler(win_len: usize) -> DatasetAssembler {
        let coeffs = IirCoefficients {
            kind: FilterKind::Highpass,
            b: [1.0, 0.0, 0.0],
            a: [1.0, 0.0, 0.0],
        };
        DatasetAssembler::new(
            SignalConditioner::new(&coeffs).unwrap(),
            GestureSegmenter::new(SegmenterParams {
                win_ths: 0.5,
                win_len,
                trig_len: 1,
                reset_len: 0,
                discard_len: 0,
            }),
        )
    }

    fn spikes(len: usize, at: &[usize]) -> Vec<f32> {
        let mut xs = vec![0.0; len];
        for &i in at {
            xs[i] = 1000.0;
        }
        xs
    }

    #[test]
    fn windows_are_labeled_with_dense_ids() {
        let mut source = MemorySource::new();
        source.add(0, "A", "a0.csv", &spikes(20, &[2, 10]));
        source.add(1, "B", "b0.csv", &spikes(20, &[4]));
        source.add(0, "A", "a1.csv", &spikes(20, &[1]));

        let out = passthrough_assembler(3).assemble(&source).unwrap();
        assert_eq!(out.labels.len(), 2);
        assert_eq!(out.recordings, 3);
        assert_eq!(out.dataset.class_counts(2), vec![3, 1]);

        let starts: Vec<(usize, ClassId)> = out
            .dataset
            .items()
            .iter()
            .map(|it| (it.window.start, it.label))
            .collect();
        assert_eq!(starts, vec![(3, 0), (11, 0), (5, 1), (2, 0)]);
    }

    #[test]
    fn values_are_converted_to_g() {
        let mut source = MemorySource::new();
        source.add(0, "A", "a.csv", &spikes(10, &[2]));
        let out = passthrough_assembler(3).assemble(&source).unwrap();
        let first = &out.dataset.items()[0].window.samples[0];
        assert_eq!(first.z, 1.0);
    }

    #[test]
    fn silent_recording_contributes_nothing() {
        let mut source = MemorySource::new();
        source.add(0, "A", "a.csv", &spikes(20, &[5]));
        source.add(1, "B", "quieto.csv", &vec![100.0; 20]);

        let out = passthrough_assembler(3).assemble(&source).unwrap();
        assert_eq!(out.empty_recordings, 1);
        assert_eq!(out.dataset.class_counts(2), vec![1, 0]);
    }

    #[test]
    fn load_failure_aborts_the_run() {
        let mut source = MemorySource::new();
        source.add(0, "A", "a.csv", &spikes(20, &[5]));
        source.entries.push(RecordingEntry {
            label_id: 0,
            label_letter: "A".to_string(),
            path: PathBuf::from("0_A/roto.csv"),
        });
        let err = passthrough_assembler(3).assemble(&source).unwrap_err();
        assert!(matches!(err, PipelineError::DataFormat { .. }));
    }

    #[test]
    fn empty_source_is_an_error() {
        let source = MemorySource::new();
        assert!(passthrough_assembler(3).assemble(&source).is_err());
    }

    #[test]
    fn raw_and_filtered_views_can_differ() {
        // Pasa-altas: un escalón sostenido sólo dispara al principio en la vista filtrada
        let pre = PreprocessingConfig {
            win_len_samples: 4,
            win_ths_g: 0.5,
            reset_len_samples: 0,
            ..PreprocessingConfig::default()
        };
        let assembler = DatasetAssembler::from_config(&pre).unwrap();
        let mut samples = vec![Sample::default(); 5];
        samples.extend(vec![Sample::new(1.0, 0.0, 0.0); 60]);
        let recording = RecordingMatrix::new(samples);

        let raw = assembler.segment_view(&recording, SegmentationView::Raw);
        let filtered = assembler.segment_view(&recording, SegmentationView::Filtered);
        assert!(raw.len() > filtered.len());
        assert_eq!(filtered[0].start, 6);
    }

    #[test]
    fn tensors_have_expected_shape() {
        let mut dataset = Dataset::default();
        let window = Window {
            start: 0,
            samples: vec![Sample::new(1.0, 2.0, 3.0); 4],
        };
        dataset.push(window.clone(), 1);
        dataset.push(window, 0);

        let (x, y) = dataset.to_tensors(4, 3).unwrap();
        assert_eq!(x.shape(), &[2, 4, 3]);
        assert_eq!(y.shape(), &[2, 3]);
        assert_eq!(x[[0, 3, 2]], 3.0);
        assert_eq!(y.row(0).to_vec(), vec![0.0, 1.0, 0.0]);
        assert_eq!(y.row(1).to_vec(), vec![1.0, 0.0, 0.0]);

        assert!(dataset.to_tensors(5, 3).is_err());
        assert!(dataset.to_tensors(4, 1).is_err());
    }
}
