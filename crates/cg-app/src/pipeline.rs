use std::path::Path;

use anyhow::{Context, Result};
use cg_core::config::{TileConfig, load_config};
use cg_core::error::TileError;
use cg_core::geometry::{COLUMNS, GridGeometry};
use cg_core::palette::Palette;
use cg_core::traits::FrameSource;
use cg_export::assembler::{Animation, assemble};
use cg_export::muxer::write_gif;
use cg_source::theme::{install_builtin_themes, load_theme};
use cg_tiles::scheduler::RenderScheduler;

use crate::cli::Cli;

/// Raw frames decoded ahead per render worker.
const FRAMES_PER_WORKER: usize = 4;

/// Point d'entrée : installe les thèmes ou lance un rendu selon la CLI.
///
/// # Errors
/// Returns the first failure of any stage, with context.
pub fn execute(cli: &Cli) -> Result<()> {
    let config = resolve_config(cli)?;

    if cli.install_themes {
        install_builtin_themes(&config.themes_dir).with_context(|| {
            format!("cannot install themes into {}", config.themes_dir.display())
        })?;
        println!("themes installed in {}", config.themes_dir.display());
        return Ok(());
    }

    let input = cli.input.as_deref().context("no input file given")?;
    run(input, &config)
}

/// Defaults, then the config file, then CLI flags; validated last.
///
/// # Errors
/// Returns an error if the config file exists but cannot be parsed, or if
/// the merged values are unusable.
pub fn resolve_config(cli: &Cli) -> Result<TileConfig> {
    let mut config = if cli.config.exists() {
        load_config(&cli.config)?
    } else {
        log::warn!(
            "Config introuvable : {}. Utilisation des défauts.",
            cli.config.display()
        );
        TileConfig::default()
    };

    if let Some(ref theme) = cli.theme {
        config.theme.clone_from(theme);
    }
    if let Some(ref output) = cli.output {
        config.output.clone_from(output);
    }
    if let Some(ref dir) = cli.themes_dir {
        config.themes_dir.clone_from(dir);
    }
    if let Some(workers) = cli.workers {
        config.workers = workers;
    }

    config.validate()?;
    Ok(config)
}

/// Render `input` into `config.output`.
///
/// Nothing is written unless every stage succeeds.
///
/// # Errors
/// Returns an error if the input cannot be opened or decoded, the theme is
/// missing or malformed, any frame fails to render, or the GIF cannot be written.
pub fn run(input: &Path, config: &TileConfig) -> Result<()> {
    log::info!("=== Étape 1/4 : source {} ===", input.display());
    let mut source = cg_source::open_source(input)?;

    log::info!("=== Étape 2/4 : thème '{}' ===", config.theme);
    let palette = load_theme(&config.themes_dir, &config.theme)?;
    log::info!("Thème '{}' : niveaux {:?}", palette.name(), palette.levels());

    let animation = render_animation(source.as_mut(), &palette, config.resolved_workers())
        .with_context(|| format!("cannot render {}", input.display()))?;

    log::info!("=== Étape 4/4 : encodage {} ===", config.output.display());
    write_gif(&config.output, &animation)?;
    Ok(())
}

/// Geometry, decoding, parallel render and assembly for an opened source.
///
/// Decoding is interleaved with rendering: at most `workers × 4` raw frames
/// are held at once.
///
/// # Errors
/// - [`TileError::DegenerateGeometry`] for an unusable aspect ratio.
/// - Decode errors from the source, [`TileError::EmptyAnimation`] for zero frames.
/// - [`TileError::FrameRenderFailure`] if any frame fails.
pub fn render_animation(
    source: &mut dyn FrameSource,
    palette: &Palette,
    workers: usize,
) -> Result<Animation, TileError> {
    let (width, height) = source.native_size();
    let geometry = GridGeometry::compute(width, height, COLUMNS)?;
    log::info!(
        "Grille {}x{} → canvas {}x{}",
        geometry.columns,
        geometry.rows,
        geometry.canvas_width,
        geometry.canvas_height
    );

    log::info!("=== Étape 3/4 : décodage et rendu ===");
    let scheduler = RenderScheduler::new(workers)?;
    let chunk_len = scheduler.workers() * FRAMES_PER_WORKER;
    let (composed, durations) = scheduler.render_source(source, chunk_len, palette, &geometry)?;

    assemble(composed, durations)
}

#[cfg(test)]
mod tests {
    use super::*;
    use cg_core::frame::{RawFrame, TimedFrame};
    use cg_core::palette::STEPS;
    use cg_export::muxer::part_path;
    use clap::Parser;
    use image::AnimationDecoder;
    use image::codecs::gif::{GifDecoder, GifEncoder};
    use image::{Delay, Frame, Rgba, RgbaImage};
    use std::fs::File;
    use std::io::BufReader;
    use std::path::PathBuf;

    /// Source en mémoire : frames unies en niveaux de gris.
    struct Synthetic {
        frames: Vec<TimedFrame>,
    }

    impl Synthetic {
        fn new(values: &[(u8, u32)]) -> Self {
            Self {
                frames: values
                    .iter()
                    .rev()
                    .map(|&(v, ms)| TimedFrame {
                        frame: RawFrame::solid_rgb(106, 60, (v, v, v)),
                        duration_ms: ms,
                    })
                    .collect(),
            }
        }
    }

    impl FrameSource for Synthetic {
        fn native_size(&self) -> (u32, u32) {
            (106, 60)
        }

        fn next_frame(&mut self) -> Result<Option<TimedFrame>, TileError> {
            Ok(self.frames.pop())
        }
    }

    fn light_palette(dir: &Path) -> Palette {
        install_builtin_themes(dir).unwrap();
        load_theme(dir, "light").unwrap()
    }

    fn write_input_gif(path: &Path) {
        let mut encoder = GifEncoder::new(File::create(path).unwrap());
        for (v, ms) in [(0u8, 100u32), (255, 250)] {
            let buf = RgbaImage::from_pixel(64, 36, Rgba([v, v, v, 255]));
            encoder
                .encode_frame(Frame::from_parts(buf, 0, 0, Delay::from_numer_denom_ms(ms, 1)))
                .unwrap();
        }
    }

    fn config_in(dir: &Path) -> TileConfig {
        TileConfig {
            themes_dir: dir.join("themes"),
            output: dir.join("out.gif"),
            workers: 2,
            ..TileConfig::default()
        }
    }

    #[test]
    fn dark_then_bright_frames_map_to_extreme_tiles() {
        let dir = tempfile::tempdir().unwrap();
        let palette = light_palette(dir.path());
        let mut source = Synthetic::new(&[(0, 100), (255, 250)]);

        let anim = render_animation(&mut source, &palette, 2).unwrap();
        assert_eq!(anim.frames().len(), 2);
        assert_eq!((anim.width(), anim.height()), (53 * 19 - 8, 30 * 19 - 8));

        let darkest = palette.tiles()[0].rgb();
        let lightest = palette.tiles()[STEPS - 1].rgb();
        let geometry = GridGeometry::compute(106, 60, COLUMNS).unwrap();
        for row in 0..geometry.rows {
            for col in 0..geometry.columns {
                let (x, y) = geometry.tile_origin(row, col);
                let first = anim.frames()[0].buffer.pixel(x + 5, y + 5);
                let second = anim.frames()[1].buffer.pixel(x + 5, y + 5);
                assert_eq!([first.0, first.1, first.2], darkest[..3]);
                assert_eq!([second.0, second.1, second.2], lightest[..3]);
            }
        }

        let durations: Vec<u32> = anim.frames().iter().map(|f| f.duration_ms).collect();
        assert_eq!(durations, vec![100, 250]);
    }

    #[test]
    fn long_source_spans_several_chunks_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let palette = light_palette(dir.path());
        // 1 worker → paquets de 4 : 10 frames = 3 paquets.
        let values: Vec<(u8, u32)> = (0..10u32)
            .map(|i| (if i % 3 == 0 { 255 } else { 0 }, 40 + i))
            .collect();
        let mut source = Synthetic::new(&values);

        let anim = render_animation(&mut source, &palette, 1).unwrap();
        let lightest = palette.tiles()[STEPS - 1].rgb();
        for (frame, &(v, ms)) in anim.frames().iter().zip(&values) {
            let px = frame.buffer.pixel(0, 0);
            assert_eq!([px.0, px.1, px.2] == lightest[..3], v == 255);
            assert_eq!(frame.duration_ms, ms);
        }
        assert_eq!(anim.frames().len(), 10);
    }

    #[test]
    fn empty_source_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let palette = light_palette(dir.path());
        let mut source = Synthetic::new(&[]);
        assert!(matches!(
            render_animation(&mut source, &palette, 1),
            Err(TileError::EmptyAnimation)
        ));
    }

    #[test]
    fn gif_in_gif_out() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_in(dir.path());
        install_builtin_themes(&config.themes_dir).unwrap();
        let input = dir.path().join("in.gif");
        write_input_gif(&input);

        run(&input, &config).unwrap();

        assert!(!part_path(&config.output).exists());
        let decoder = GifDecoder::new(BufReader::new(File::open(&config.output).unwrap())).unwrap();
        let frames = decoder.into_frames().collect_frames().unwrap();
        assert_eq!(frames.len(), 2);
        let delays: Vec<u32> = frames
            .iter()
            .map(|f| {
                let (n, d) = f.delay().numer_denom_ms();
                n / d
            })
            .collect();
        assert_eq!(delays, vec![100, 250]);
    }

    #[test]
    fn missing_theme_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = config_in(dir.path());
        install_builtin_themes(&config.themes_dir).unwrap();
        config.theme = "sepia".into();
        let input = dir.path().join("in.gif");
        write_input_gif(&input);

        let err = run(&input, &config).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<TileError>(),
            Some(TileError::ThemeNotFound { .. })
        ));
        assert!(!config.output.exists());
    }

    #[test]
    fn missing_input_fails_before_theme_lookup() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_in(dir.path());
        let err = run(&dir.path().join("nope.mp4"), &config).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<TileError>(),
            Some(TileError::InputNotFound { .. })
        ));
    }

    #[test]
    fn cli_flags_override_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = dir.path().join("contribgif.toml");
        std::fs::write(&cfg, "[render]\ntheme = \"dark\"\nworkers = 4\n").unwrap();
        let cfg_arg = cfg.to_string_lossy().into_owned();

        let cli = Cli::parse_from(["contribgif", "in.gif", "-c", &cfg_arg, "-j", "2"]);
        let config = resolve_config(&cli).unwrap();
        assert_eq!(config.theme, "dark");
        assert_eq!(config.workers, 2);
        assert_eq!(config.output, PathBuf::from("contribution.gif"));
    }

    #[test]
    fn missing_config_file_means_defaults() {
        let cli = Cli::parse_from(["contribgif", "in.gif", "-c", "/no/such/contribgif.toml"]);
        assert_eq!(resolve_config(&cli).unwrap(), TileConfig::default());
    }

    #[test]
    fn install_themes_populates_the_directory() {
        let dir = tempfile::tempdir().unwrap();
        let themes = dir.path().join("themes");
        let themes_arg = themes.to_string_lossy().into_owned();
        let cli = Cli::parse_from([
            "contribgif",
            "--install-themes",
            "--themes-dir",
            &themes_arg,
            "-c",
            "/no/such/contribgif.toml",
        ]);
        execute(&cli).unwrap();
        assert!(load_theme(&themes, "dark").is_ok());
    }
}
