use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

use varita::config::SegmentationView;

/// Preparación de datasets de gestos (varita)
#[derive(Parser, Debug)]
#[command(name = "varita")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Salida de depuración
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Ensambla, balancea y particiona el dataset y genera los artefactos
    Prepare {
        /// Configuración YAML
        config: PathBuf,

        /// Directorio de salida
        #[arg(short, long, default_value = "output")]
        out_dir: PathBuf,
    },

    /// Segmenta una sola grabación y muestra los tramos detectados
    Segment {
        /// Grabación CSV
        csv: PathBuf,

        /// Configuración YAML
        #[arg(short, long)]
        config: PathBuf,

        /// Vista sobre la que se segmenta
        #[arg(long, value_enum, default_value_t = ViewArg::Filtered)]
        view: ViewArg,
    },
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewArg {
    Raw,
    Filtered,
}

impl From<ViewArg> for SegmentationView {
    fn from(view: ViewArg) -> Self {
        match view {
            ViewArg::Raw => SegmentationView::Raw,
            ViewArg::Filtered => SegmentationView::Filtered,
        }
    }
}
