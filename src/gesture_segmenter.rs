use crate::config::PreprocessingConfig;
use crate::types::{Sample, Window};

/// Parámetros del segmentador
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SegmenterParams {
    /// Umbral de disparo sobre el eje x (g)
    pub win_ths: f32,
    /// Longitud de cada ventana emitida
    pub win_len: usize,
    /// Muestras consecutivas sobre el umbral necesarias para disparar
    pub trig_len: usize,
    /// Muestras de enfriamiento tras cada ventana (sin disparos)
    pub reset_len: usize,
    /// Muestras iniciales que se ignoran
    pub discard_len: usize,
}

impl Default for SegmenterParams {
    fn default() -> Self {
        Self {
            win_ths: 0.25,
            win_len: 40,
            trig_len: 1,
            reset_len: 0,
            discard_len: 0,
        }
    }
}

impl From<&PreprocessingConfig> for SegmenterParams {
    fn from(pre: &PreprocessingConfig) -> Self {
        Self {
            win_ths: pre.win_ths_g,
            win_len: pre.win_len_samples,
            trig_len: pre.trig_len_samples,
            reset_len: pre.reset_len_samples,
            discard_len: pre.discard_len_samples,
        }
    }
}

/// Segmentador por eventos: recorre la grabación una sola vez y corta una
/// ventana de `win_len` muestras justo después de cada disparo.
///
/// Un disparo son `trig_len` muestras seguidas con x > `win_ths`. Tras emitir
/// una ventana se saltan la propia ventana y `reset_len` muestras, así que las
/// ventanas nunca se solapan.
#[derive(Debug, Clone)]
pub struct GestureSegmenter {
    params: SegmenterParams,
}

impl GestureSegmenter {
    pub fn new(params: SegmenterParams) -> Self {
        Self { params }
    }

    pub fn params(&self) -> &SegmenterParams {
        &self.params
    }

    /// Segmenta una matriz (cruda o filtrada). Puede no devolver ninguna ventana.
    pub fn segment<M>(&self, matrix: &M) -> Vec<Window>
    where
        M: AsRef<[Sample]> + ?Sized,
    {
        let samples = matrix.as_ref();
        let n = samples.len();
        let p = &self.params;
        let mut windows = Vec::new();
        let mut i = p.discard_len;

        while i + p.win_len < n {
            let trig_end = (i + p.trig_len).min(n);
            let triggered = samples[i..trig_end].iter().all(|s| s.x > p.win_ths);

            if !triggered {
                i += 1;
                continue;
            }

            // Consumir el disparo
            i += p.trig_len;
            if i + p.win_len <= n {
                windows.push(Window {
                    start: i,
                    samples: samples[i..i + p.win_len].to_vec(),
                });
            }
            // Saltar ventana + enfriamiento aunque la ventana estuviera incompleta
            i += p.win_len + p.reset_len;
        }

        windows
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stream_x(xs: &[f32]) -> Vec<Sample> {
        xs.iter().map(|&x| Sample::new(x, 0.1, -0.1)).collect()
    }

    fn params(win_ths: f32, win_len: usize, trig_len: usize, reset_len: usize) -> SegmenterParams {
        SegmenterParams {
            win_ths,
            win_len,
            trig_len,
            reset_len,
            discard_len: 0,
        }
    }

    #[test]
    fn single_spike_starts_window_after_trigger() {
        let mut xs = vec![0.0; 12];
        xs[5] = 1.0;
        let samples = stream_x(&xs);
        let windows = GestureSegmenter::new(params(0.5, 3, 1, 0)).segment(&samples[..]);

        assert_eq!(windows.len(), 1);
        assert_eq!(windows[0].start, 6);
        assert_eq!(windows[0].samples, samples[6..9].to_vec());
    }

    #[test]
    fn never_triggering_gives_no_windows() {
        let samples = stream_x(&[0.2; 50]);
        let windows = GestureSegmenter::new(params(0.5, 5, 1, 0)).segment(&samples[..]);
        assert!(windows.is_empty());
    }

    #[test]
    fn threshold_is_strict() {
        let samples = stream_x(&[0.5; 20]);
        let windows = GestureSegmenter::new(params(0.5, 4, 1, 0)).segment(&samples[..]);
        assert!(windows.is_empty());
    }

    #[test]
    fn only_x_axis_triggers() {
        let samples: Vec<Sample> = (0..20).map(|_| Sample::new(0.0, 5.0, 5.0)).collect();
        let windows = GestureSegmenter::new(params(0.5, 4, 1, 0)).segment(&samples[..]);
        assert!(windows.is_empty());
    }

    #[test]
    fn trigger_needs_consecutive_samples() {
        // Picos aislados no disparan con trig_len = 2
        let mut xs = vec![0.0; 30];
        xs[3] = 1.0;
        xs[7] = 1.0;
        xs[12] = 1.0;
        xs[13] = 1.0;
        let samples = stream_x(&xs);
        let windows = GestureSegmenter::new(params(0.5, 4, 2, 0)).segment(&samples[..]);
        assert_eq!(windows.len(), 1);
        assert_eq!(windows[0].start, 14);
    }

    #[test]
    fn cooldown_suppresses_retrigger() {
        let samples = stream_x(&[1.0; 40]);
        let windows = GestureSegmenter::new(params(0.5, 5, 1, 3)).segment(&samples[..]);
        let starts: Vec<usize> = windows.iter().map(|w| w.start).collect();
        // 0 dispara -> ventana en 1, siguiente escaneo en 1 + 5 + 3 = 9, etc.
        assert_eq!(starts, vec![1, 10, 19, 28]);
    }

    #[test]
    fn discard_skips_leading_samples() {
        let mut xs = vec![0.0; 20];
        xs[1] = 1.0;
        xs[10] = 1.0;
        let samples = stream_x(&xs);
        let p = SegmenterParams {
            discard_len: 5,
            ..params(0.5, 3, 1, 0)
        };
        let windows = GestureSegmenter::new(p).segment(&samples[..]);
        assert_eq!(windows.len(), 1);
        assert_eq!(windows[0].start, 11);
    }

    #[test]
    fn partial_window_at_end_is_dropped() {
        // Disparo largo cerca del final: tras consumirlo no quedan win_len muestras
        let mut xs = vec![0.0; 10];
        xs[2] = 1.0;
        xs[3] = 1.0;
        xs[4] = 1.0;
        let samples = stream_x(&xs);
        let windows = GestureSegmenter::new(params(0.5, 6, 3, 0)).segment(&samples[..]);
        assert!(windows.is_empty());
    }

    #[test]
    fn window_may_end_exactly_at_stream_end() {
        let mut xs = vec![0.0; 8];
        xs[4] = 1.0;
        let samples = stream_x(&xs);
        let windows = GestureSegmenter::new(params(0.5, 3, 1, 0)).segment(&samples[..]);
        assert_eq!(windows.len(), 1);
        assert_eq!(windows[0].end(), 8);
    }

    #[test]
    fn empty_and_short_streams() {
        let segmenter = GestureSegmenter::new(params(0.5, 3, 1, 0));
        let empty: Vec<Sample> = Vec::new();
        assert!(segmenter.segment(&empty).is_empty());
        assert!(segmenter.segment(&stream_x(&[1.0, 1.0, 1.0])[..]).is_empty());
    }
}
