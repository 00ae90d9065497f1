use std::fs;
use std::path::Path;

use csv::ReaderBuilder;
use tracing::debug;

use crate::error::{PipelineError, Result};
use crate::types::{RecordingMatrix, Sample, CSV_HEADER, NUM_AXES};

/// Posición de la fila de encabezado dentro del archivo
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeaderLocation {
    /// Índice de la fila contando sólo líneas no vacías (preámbulo incluido)
    pub line: usize,
    /// Desplazamiento en bytes donde empieza el encabezado
    pub offset: usize,
}

/// Busca la fila `acc_x[mg],acc_y[mg],acc_z[mg]`. Todo lo anterior es preámbulo.
pub fn locate_header(content: &str) -> Option<HeaderLocation> {
    let mut line_idx = 0;
    let mut offset = 0;

    for raw_line in content.split_inclusive('\n') {
        let line = raw_line.trim_end_matches(&['\n', '\r'][..]);
        if line == CSV_HEADER {
            return Some(HeaderLocation {
                line: line_idx,
                offset,
            });
        }
        if !line.is_empty() {
            line_idx += 1;
        }
        offset += raw_line.len();
    }

    None
}

/// Carga una grabación desde disco. Los valores quedan en mg.
pub fn load_recording(path: impl AsRef<Path>) -> Result<RecordingMatrix> {
    let path = path.as_ref();
    let content = fs::read_to_string(path)?;
    parse_recording(&content, path)
}

/// Interpreta el contenido de un CSV de captura; `path` sólo se usa en los errores.
pub fn parse_recording(content: &str, path: &Path) -> Result<RecordingMatrix> {
    let header = locate_header(content).ok_or_else(|| PipelineError::DataFormat {
        path: path.to_path_buf(),
        reason: format!("missing header row '{}'", CSV_HEADER),
    })?;
    debug!(path = ?path, line = header.line, "encabezado encontrado");

    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(content[header.offset..].as_bytes());

    let mut samples = Vec::new();
    for (row_idx, result) in reader.records().enumerate() {
        let record = result?;
        // Fila relativa al encabezado (1 = primera fila de datos)
        let row = row_idx + 1;
        if record.len() < NUM_AXES {
            return Err(PipelineError::DataFormat {
                path: path.to_path_buf(),
                reason: format!("row {} has {} columns, expected {}", row, record.len(), NUM_AXES),
            });
        }

        let mut axes = [0.0f32; NUM_AXES];
        for (axis, value) in axes.iter_mut().enumerate() {
            let cell = record[axis].trim();
            *value = cell.parse().map_err(|_| PipelineError::DataFormat {
                path: path.to_path_buf(),
                reason: format!("invalid value '{}' in row {}", cell, row),
            })?;
        }
        samples.push(Sample::from_axes(axes));
    }

    Ok(RecordingMatrix::new(samples))
}

#[cfg(test)]
mod tests {
    use super::*;

    const PREAMBLE: &str = "STEVAL-MKI230KA\n\nODR,104\nFS,8\n\n";

    #[test]
    fn header_after_preamble_skips_blank_lines() {
        let content = format!("{}{}\n1,2,3\n", PREAMBLE, CSV_HEADER);
        let loc = locate_header(&content).unwrap();
        assert_eq!(loc.line, 3);
        assert!(content[loc.offset..].starts_with(CSV_HEADER));
    }

    #[test]
    fn header_with_crlf_is_found() {
        let content = format!("meta\r\n{}\r\n10,20,30\r\n", CSV_HEADER);
        let rec = parse_recording(&content, Path::new("crlf.csv")).unwrap();
        assert_eq!(rec.samples(), &[Sample::new(10.0, 20.0, 30.0)]);
    }

    #[test]
    fn parses_rows_in_mg() {
        let content = format!("{}{}\n1000,-20.5,3\n4,5,6\n", PREAMBLE, CSV_HEADER);
        let rec = parse_recording(&content, Path::new("a.csv")).unwrap();
        assert_eq!(rec.len(), 2);
        assert_eq!(rec.samples()[0], Sample::new(1000.0, -20.5, 3.0));
        assert_eq!(rec.samples()[1], Sample::new(4.0, 5.0, 6.0));
    }

    #[test]
    fn missing_header_names_the_file() {
        let err = parse_recording("ax,ay,az\n1,2,3\n", Path::new("sin_header.csv")).unwrap_err();
        match err {
            PipelineError::DataFormat { path, .. } => {
                assert_eq!(path, Path::new("sin_header.csv"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn bad_cell_is_reported_with_row() {
        let content = format!("{}\n1,2,3\n4,x,6\n", CSV_HEADER);
        let err = parse_recording(&content, Path::new("b.csv")).unwrap_err();
        assert!(err.to_string().contains("row 2"));
    }

    #[test]
    fn header_only_gives_empty_recording() {
        let content = format!("{}\n", CSV_HEADER);
        let rec = parse_recording(&content, Path::new("vacio.csv")).unwrap();
        assert!(rec.is_empty());
    }
}
