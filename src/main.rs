/*
varita - preparación de datasets de gestos para la varita mágica

Toma las grabaciones de acelerómetro organizadas como <raíz>/<id>_<letra>/<archivo>.csv,
las filtra, segmenta cada gesto por disparo, balancea las clases, las parte en
train/validation/test y genera los artefactos para el sensor.

Uso:
    varita prepare wand.yaml -o output
    varita segment dataset/0_A/captura.csv --config wand.yaml --view raw

Con RUST_LOG=debug (o -v) se ven los detalles por grabación.
*/

mod cli;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::info;
use tracing_subscriber::EnvFilter;

use varita::artifacts::{self, DatasetSummary};
use varita::balancer::balance_classes;
use varita::config::{Config, SegmentationView};
use varita::csv_loader::load_recording;
use varita::dataset::DatasetAssembler;
use varita::filter_design::FilterSpec;
use varita::recording_source::DirectorySource;
use varita::splitter::{stratified_split, SplitFractions};

use cli::{Cli, Commands};

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)))
        .init();

    match cli.command {
        Commands::Prepare { config, out_dir } => prepare(&config, &out_dir),
        Commands::Segment { csv, config, view } => segment(&csv, &config, view.into()),
    }
}

fn load_config(path: &Path) -> Result<Config> {
    Config::load(path).with_context(|| format!("No se pudo cargar la configuración {:?}", path))
}

/// Las rutas relativas del dataset se resuelven desde el directorio del YAML
fn dataset_root(config: &Config, config_path: &Path) -> PathBuf {
    if config.dataset.path.is_absolute() {
        return config.dataset.path.clone();
    }
    config_path
        .parent()
        .unwrap_or_else(|| Path::new("."))
        .join(&config.dataset.path)
}

fn prepare(config_path: &Path, out_dir: &Path) -> Result<()> {
    let config = load_config(config_path)?;
    let pre = &config.preprocessing;

    let coeffs = FilterSpec::from(pre)
        .design()
        .context("Diseño del filtro inválido")?;
    let assembler = DatasetAssembler::from_config(pre)?;

    let root = dataset_root(&config, config_path);
    println!("📂 Dataset {:?} en {:?}", config.dataset.name, root);

    let source = DirectorySource::new(&root);
    info!(root = ?source.root(), "buscando grabaciones");
    let assembled = assembler
        .assemble(&source)
        .with_context(|| format!("Fallo al ensamblar el dataset en {:?}", root))?;
    let labels = &assembled.labels;
    let assembled_counts = assembled.dataset.class_counts(labels.len());

    println!(
        "🧩 {} grabaciones, {} ventanas ({} grabaciones sin ventanas)",
        assembled.recordings,
        assembled.dataset.len(),
        assembled.empty_recordings
    );
    println!("   {:>3}  {:<6} {:>8}", "id", "clase", "ventanas");
    for (id, letter) in labels.iter() {
        println!("   {:>3}  {:<6} {:>8}", id, letter, assembled_counts[id]);
    }

    // Un único generador para balanceo y partición, en ese orden
    let mut rng = StdRng::seed_from_u64(config.training.seed);

    let balanced = balance_classes(&assembled.dataset, labels, &mut rng).context("Balanceo imposible")?;
    println!(
        "⚖️  Balanceado a {} ventanas por clase (minoritaria: {})",
        balanced.min_count,
        labels.letter(balanced.minority).unwrap_or("?")
    );

    let split = stratified_split(
        &balanced.dataset,
        labels,
        SplitFractions::from(&config.training),
        &mut rng,
    )
    .context("Partición imposible")?;
    println!(
        "✂️  train={} validation={} test={}",
        split.train.len(),
        split.validation.len(),
        split.test.len()
    );

    std::fs::create_dir_all(out_dir).with_context(|| format!("No se pudo crear {:?}", out_dir))?;
    for (name, subset) in [
        ("train", &split.train),
        ("validation", &split.validation),
        ("test", &split.test),
    ] {
        let (x, y) = subset.to_tensors(pre.win_len_samples, labels.len())?;
        info!(subset = name, x = ?x.shape(), y = ?y.shape(), "tensores listos");
        artifacts::write_tensors_csv(&out_dir.join(format!("{}.csv", name)), &x, &y, labels)
            .with_context(|| format!("No se pudo escribir el subconjunto {}", name))?;
        if name == "test" {
            artifacts::write_validation_npz(&out_dir.join(artifacts::VALIDATION_NPZ_FILE), &x, &y)
                .context("No se pudo escribir el npz de validación")?;
        }
    }

    let summary = DatasetSummary::new(
        &config,
        labels,
        &assembled_counts,
        balanced.min_count,
        &split,
        coeffs,
    )
    .with_recordings(assembled.recordings, assembled.empty_recordings);
    let paths = artifacts::write_artifacts(out_dir, &config, labels, &summary)
        .with_context(|| format!("No se pudieron escribir los artefactos en {:?}", out_dir))?;

    println!("✅ Artefactos en {:?}", out_dir);
    for path in [&paths.header, &paths.meta, &paths.conf, &paths.summary] {
        println!("   {}", path.display());
    }
    Ok(())
}

fn segment(csv_path: &Path, config_path: &Path, view: SegmentationView) -> Result<()> {
    let config = load_config(config_path)?;
    let pre = &config.preprocessing;
    let assembler = DatasetAssembler::from_config(pre)?;

    let recording = load_recording(csv_path)
        .with_context(|| format!("No se pudo cargar {:?}", csv_path))?
        .mg_to_g();
    let windows = assembler.segment_view(&recording, view);
    let params = assembler.segmenter().params();

    println!(
        "🎞️  {:?}: {} muestras, {} ventanas de {} (vista {:?}, umbral {} g)",
        csv_path,
        recording.len(),
        windows.len(),
        params.win_len,
        view,
        params.win_ths
    );
    for (n, window) in windows.iter().enumerate() {
        println!(
            "   #{:<3} muestras {:>6}..{:<6} {:>8.2}s - {:.2}s",
            n,
            window.start,
            window.end(),
            window.start as f64 / pre.f_sample,
            window.end() as f64 / pre.f_sample
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn relative_dataset_path_is_resolved_from_config_dir() {
        let mut config = Config::default();
        config.dataset.path = PathBuf::from("datos");
        assert_eq!(
            dataset_root(&config, Path::new("/proyecto/wand.yaml")),
            PathBuf::from("/proyecto/datos")
        );
        assert_eq!(dataset_root(&config, Path::new("wand.yaml")), PathBuf::from("datos"));

        config.dataset.path = PathBuf::from("/abs/datos");
        assert_eq!(
            dataset_root(&config, Path::new("/proyecto/wand.yaml")),
            PathBuf::from("/abs/datos")
        );
    }
}
