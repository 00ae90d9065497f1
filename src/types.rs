/// Muestra de acelerómetro de 3 ejes: [x, y, z]
/// En g una vez convertida (en mg tal como viene del CSV).
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Sample {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Sample {
    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    /// Acceso por índice de eje (0 = x, 1 = y, 2 = z)
    pub fn axis(&self, idx: usize) -> f32 {
        match idx {
            0 => self.x,
            1 => self.y,
            _ => self.z,
        }
    }

    pub fn from_axes(axes: [f32; NUM_AXES]) -> Self {
        Self::new(axes[0], axes[1], axes[2])
    }

    pub fn to_array(&self) -> [f32; NUM_AXES] {
        [self.x, self.y, self.z]
    }

    fn mg_to_g(&self) -> Self {
        Self::new(self.x / MG_PER_G, self.y / MG_PER_G, self.z / MG_PER_G)
    }
}

/// Grabación completa de una sesión de captura, tal como se cargó del disco.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecordingMatrix {
    samples: Vec<Sample>,
}

impl RecordingMatrix {
    pub fn new(samples: Vec<Sample>) -> Self {
        Self { samples }
    }

    pub fn samples(&self) -> &[Sample] {
        &self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Convierte de mg a g. Devuelve una matriz nueva, la original no se toca.
    pub fn mg_to_g(&self) -> Self {
        Self::new(self.samples.iter().map(Sample::mg_to_g).collect())
    }
}

/// Matriz filtrada. Tipo distinto a `RecordingMatrix` para no mezclar vistas.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConditionedMatrix {
    samples: Vec<Sample>,
}

impl ConditionedMatrix {
    pub(crate) fn new(samples: Vec<Sample>) -> Self {
        Self { samples }
    }

    pub fn samples(&self) -> &[Sample] {
        &self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

impl AsRef<[Sample]> for RecordingMatrix {
    fn as_ref(&self) -> &[Sample] {
        &self.samples
    }
}

impl AsRef<[Sample]> for ConditionedMatrix {
    fn as_ref(&self) -> &[Sample] {
        &self.samples
    }
}

/// Ventana de gesto: `win_len` muestras contiguas a partir de `start`
#[derive(Debug, Clone, PartialEq)]
pub struct Window {
    pub start: usize,
    pub samples: Vec<Sample>,
}

impl Window {
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Última posición (exclusiva) que ocupa la ventana en la grabación
    pub fn end(&self) -> usize {
        self.start + self.samples.len()
    }
}

/// Identificador denso de clase: 0..K-1
pub type ClassId = usize;

/// Constantes del sistema
pub const NUM_AXES: usize = 3;
pub const MG_PER_G: f32 = 1000.0;
pub const CSV_HEADER: &str = "acc_x[mg],acc_y[mg],acc_z[mg]";
