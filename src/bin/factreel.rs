use std::path::{Path, PathBuf};

use anyhow::Context as _;
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "factreel", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Render a fact video to MP4 (requires `ffmpeg`/`ffprobe` on PATH).
    Render(RenderArgs),
    /// Composite the frame shown at one instant and write it as a PNG.
    Frame(FrameArgs),
    /// Inspect or fill the stock-footage cache.
    #[command(subcommand)]
    Cache(CacheCommand),
}

#[derive(Args, Debug)]
struct JobArgs {
    /// Fact text: narrated transcript, caption source and output file name.
    #[arg(long)]
    fact: String,

    /// Stock-footage clip.
    #[arg(long)]
    video: PathBuf,

    /// Narration audio.
    #[arg(long)]
    narration: PathBuf,

    /// Background music track.
    #[arg(long, conflicts_with = "music_dir")]
    music: Option<PathBuf>,

    /// Folder of `.mp3` tracks; one is picked from the fact text.
    #[arg(long)]
    music_dir: Option<PathBuf>,

    /// JSON config file. Missing fields keep their defaults.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Caption font file (TTF/OTF).
    #[arg(long)]
    font: Option<PathBuf>,

    /// Alignment program; receives canonical PCM on stdin and prints JSON results per line.
    #[arg(long)]
    aligner: Option<String>,

    /// Argument for the alignment program; `{sample_rate}` and `{transcript}` are substituted.
    #[arg(long = "aligner-arg", allow_hyphen_values = true)]
    aligner_args: Vec<String>,
}

#[derive(Args, Debug)]
struct RenderArgs {
    #[command(flatten)]
    job: JobArgs,

    /// Output directory; the file name is derived from the fact text.
    #[arg(long)]
    out_dir: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct FrameArgs {
    #[command(flatten)]
    job: JobArgs,

    /// Time in seconds.
    #[arg(long)]
    at: f64,

    /// Output PNG path.
    #[arg(long)]
    out: PathBuf,
}

#[derive(Subcommand, Debug)]
enum CacheCommand {
    /// Print the cache path for a key and whether it is present.
    Resolve {
        key: String,
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// Copy a downloaded file into the cache under a key.
    Store {
        key: String,
        file: PathBuf,
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.cmd {
        Command::Render(args) => cmd_render(args),
        Command::Frame(args) => cmd_frame(args),
        Command::Cache(cmd) => cmd_cache(cmd),
    }
}

fn load_config(path: Option<&Path>) -> anyhow::Result<factreel::ReelConfig> {
    let cfg = match path {
        Some(p) => factreel::ReelConfig::from_path(p)?,
        None => factreel::ReelConfig::default(),
    };
    Ok(cfg.with_env_overrides())
}

fn prepare_job(
    args: &JobArgs,
    out_dir: Option<&Path>,
) -> anyhow::Result<(factreel::FactReel<factreel::CommandAligner>, factreel::RenderJob)> {
    let mut cfg = load_config(args.config.as_deref())?;
    if let Some(dir) = out_dir {
        cfg.output.dir = dir.to_path_buf();
    }
    if let Some(font) = &args.font {
        cfg.captions.font_path = font.clone();
    }
    if let Some(program) = &args.aligner {
        cfg.align.command = Some(program.clone());
        cfg.align.args = args.aligner_args.clone();
    }

    let backend = factreel::CommandAligner::from_config(&cfg.align).ok_or_else(|| {
        factreel::ReelError::validation(
            "no alignment program configured (use --aligner or FACTREEL_ALIGNER)",
        )
    })?;

    let music = match (&args.music, &args.music_dir) {
        (Some(path), _) => path.clone(),
        (None, Some(dir)) => factreel::pick_music(dir, &args.fact)?,
        (None, None) => anyhow::bail!("one of --music or --music-dir is required"),
    };
    tracing::debug!(music = %music.display(), "music track selected");

    let job = factreel::RenderJob {
        fact: args.fact.clone(),
        video: args.video.clone(),
        narration: args.narration.clone(),
        music,
    };
    let reel = factreel::FactReel::new(cfg, backend)?;
    Ok((reel, job))
}

fn cmd_render(args: RenderArgs) -> anyhow::Result<()> {
    let (mut reel, job) = prepare_job(&args.job, args.out_dir.as_deref())?;

    let outcome = reel
        .render(&job)
        .with_context(|| format!("render '{}'", job.fact))?;
    for skipped in &outcome.skipped {
        tracing::warn!(word = %skipped.word.text, reason = %skipped.reason, "caption skipped");
    }
    eprintln!(
        "wrote {:.2}s with {} captions",
        outcome.duration_sec, outcome.captions
    );
    println!("{}", outcome.output_path.display());
    Ok(())
}

fn cmd_frame(args: FrameArgs) -> anyhow::Result<()> {
    let (mut reel, job) = prepare_job(&args.job, None)?;
    let frame = reel.render_frame(&job, args.at)?;
    frame.write_png(&args.out)?;
    eprintln!("wrote {}", args.out.display());
    Ok(())
}

fn cmd_cache(cmd: CacheCommand) -> anyhow::Result<()> {
    match cmd {
        CacheCommand::Resolve { key, config } => {
            let cfg = load_config(config.as_deref())?;
            let cache = factreel::AssetCache::from_config(&cfg.cache);
            let lookup = cache.resolve(&key)?;
            println!(
                "{}\t{}",
                lookup.path.display(),
                if lookup.hit { "hit" } else { "miss" }
            );
        }
        CacheCommand::Store { key, file, config } => {
            let cfg = load_config(config.as_deref())?;
            let cache = factreel::AssetCache::from_config(&cfg.cache);
            let path = cache
                .store(&key, &file)
                .with_context(|| format!("store '{}' as '{key}'", file.display()))?;
            println!("{}", path.display());
        }
    }
    Ok(())
}
