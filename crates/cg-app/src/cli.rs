use std::path::PathBuf;

use clap::Parser;

/// contribgif — re-render a video or animated GIF as a contribution-graph animation.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Source : vidéo (mp4, mkv, avi, mov, webm) ou GIF animé.
    #[arg(required_unless_present = "install_themes")]
    pub input: Option<PathBuf>,

    /// Thème de tuiles (sous-dossier de --themes-dir). Défaut : light.
    #[arg(short, long)]
    pub theme: Option<String>,

    /// Fichier GIF de sortie. Défaut : contribution.gif.
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Dossier contenant les thèmes. Défaut : themes.
    #[arg(long)]
    pub themes_dir: Option<PathBuf>,

    /// Workers de rendu. 0 = tous les cœurs disponibles.
    #[arg(short = 'j', long)]
    pub workers: Option<usize>,

    /// Fichier de configuration TOML. Défaut : config/default.toml.
    #[arg(short, long, default_value = "config/default.toml")]
    pub config: PathBuf,

    /// Niveau de log : error, warn, info, debug, trace.
    #[arg(long, default_value = "warn")]
    pub log_level: String,

    /// Écrire les thèmes intégrés (light, dark) dans --themes-dir puis quitter.
    #[arg(long, default_value_t = false)]
    pub install_themes: bool,
}
