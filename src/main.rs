use clap::{Parser, Subcommand};
use gallery_scan::imaging::RustBackend;
use gallery_scan::toolchain::FfmpegToolchain;
use gallery_scan::{config, manifest, output, scan};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "gallery-scan")]
#[command(about = "Build-time media pipeline for a photo gallery")]
#[command(long_about = "\
Build-time media pipeline for a photo gallery

Directories under public/photos/ become albums. Every photo and video gets a
thumbnail, videos are transcoded to mp4, HEIC stills are converted to JPEG,
and one JSON manifest describing everything is written for the front-end.

Project structure:

  project/
  ├── gallery.toml                 # Config (optional)
  ├── public/
  │   ├── photos/                  # Sources
  │   │   ├── 2023-japan/          # Album → category
  │   │   │   ├── IMG_0001.HEIC    # Served as generated/2023-japan/IMG_0001.HEIC.jpg
  │   │   │   ├── IMG_0002.jpg
  │   │   │   └── IMG_0003.MOV     # Served as generated/2023-japan/IMG_0003.MOV.mp4
  │   │   └── family/
  │   ├── thumbs/                  # Generated thumbnails
  │   └── generated/               # Generated transcodes and conversions
  └── src/assets/photos.json       # Manifest

Derived files that already exist are reused, so re-running is cheap.
Video and HEIC support needs ffmpeg and ffprobe on PATH (see [tools]).

Run 'gallery-scan gen-config' to generate a documented gallery.toml.")]
#[command(version)]
struct Cli {
    /// Project root
    #[arg(long, default_value = ".", global = true)]
    root: PathBuf,

    /// Config file [default: <root>/gallery.toml]
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Generate derived files and write the manifest
    Scan,
    /// List albums and files a scan would process, without writing anything
    Check,
    /// Summarize an existing manifest
    Report,
    /// Print a stock gallery.toml with all options documented
    GenConfig,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let cli = Cli::parse();

    match cli.command {
        Command::Scan => {
            let config = load_config(&cli.root, cli.config.as_deref())?;
            let layout = config::ProjectLayout::new(&cli.root, &config.paths);
            init_thread_pool(&config.processing);

            let toolchain = FfmpegToolchain::new(&config.tools);
            let backend = RustBackend::new();

            println!("==> Scanning {}", layout.photos_dir().display());
            let (tx, rx) = std::sync::mpsc::channel();
            let printer = std::thread::spawn(move || {
                for event in rx {
                    for line in output::format_process_event(&event) {
                        println!("{}", line);
                    }
                }
            });
            let mut outcome = scan::scan(&layout, &config, &toolchain, &backend, Some(tx))?;
            printer
                .join()
                .map_err(|_| "progress printer thread panicked")?;

            manifest::sort_assets(&mut outcome.assets);
            manifest::write_manifest(&layout.manifest, &outcome.assets)?;
            output::print_scan_summary(&outcome, &layout.manifest);
        }
        Command::Check => {
            let config = load_config(&cli.root, cli.config.as_deref())?;
            let layout = config::ProjectLayout::new(&cli.root, &config.paths);
            println!("==> Checking {}", layout.photos_dir().display());
            let report = scan::check(&layout)?;
            output::print_check_output(&report, &layout.photos_dir());
        }
        Command::Report => {
            let config = load_config(&cli.root, cli.config.as_deref())?;
            let layout = config::ProjectLayout::new(&cli.root, &config.paths);
            let assets = manifest::read_manifest(&layout.manifest)?;
            output::print_report(&manifest::summarize(&assets), &layout.manifest);
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

/// Load the project config.
///
/// The default `<root>/gallery.toml` is optional; a file named explicitly
/// with `--config` must exist.
fn load_config(
    root: &Path,
    explicit: Option<&Path>,
) -> Result<config::GalleryConfig, Box<dyn std::error::Error>> {
    let file = match explicit {
        Some(path) if !path.exists() => {
            return Err(format!("config file {} not found", path.display()).into());
        }
        Some(path) => path.to_path_buf(),
        None => root.join(config::CONFIG_FILENAME),
    };
    log::debug!("loading config from {}", file.display());
    Ok(config::load_config(&file)?)
}

/// Initialize the rayon thread pool based on processing config.
///
/// Never more threads than CPU cores; config can only lower the count.
fn init_thread_pool(processing: &config::ProcessingConfig) {
    let threads = config::effective_threads(processing);
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build_global()
        .ok();
}
