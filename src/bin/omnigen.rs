//! CLI for OmniGen - one idea, three social posts with imagery.

use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum};
use omnigen::{
    AppState, AspectRatio, AspectRatioOverride, CredentialStore, GeminiImageModel,
    GeminiImageProvider, GeminiTextModel, GeminiTextProvider, GeneratedImage, GenerationOutcome,
    GenerationSettings, ImageProvider, ImageResolution, Orchestrator, Platform, PlatformPost,
    TextProvider, Tone, MISSING_KEY_MESSAGE,
};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "omnigen")]
#[command(about = "Turn one idea into LinkedIn, X and Instagram posts with matching images (Gemini)")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Gemini API key (falls back to API_KEY when GOOGLE_API_KEY is unset)
    #[arg(long, global = true, env = "GOOGLE_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Output as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Increase log verbosity (-v info, -vv debug); RUST_LOG overrides
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a social pack from an idea
    Generate(GenerateArgs),

    /// Check that a key is selected and both models are reachable
    Check(ModelArgs),
}

#[derive(Args)]
struct GenerateArgs {
    /// The content idea
    idea: String,

    /// Tone of the copy
    #[arg(short, long, value_enum, default_value = "professional")]
    tone: ToneArg,

    /// Image resolution tier
    #[arg(short, long, value_enum, default_value = "1k")]
    resolution: ResolutionArg,

    /// Aspect ratio forced on every image
    #[arg(long, value_enum, default_value = "auto")]
    aspect_ratio: AspectRatioArg,

    /// Directory to write post text and images into
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// After generating, read `r <n>` (regenerate image n) or `q` from stdin
    #[arg(short, long)]
    interactive: bool,

    #[command(flatten)]
    models: ModelArgs,
}

#[derive(Args)]
struct ModelArgs {
    /// Text model
    #[arg(long, value_enum, default_value = "pro")]
    text_model: ModelArg,

    /// Image model
    #[arg(long, value_enum, default_value = "pro")]
    image_model: ModelArg,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ToneArg {
    Professional,
    Witty,
    Urgent,
    Casual,
    Inspirational,
}

impl From<ToneArg> for Tone {
    fn from(arg: ToneArg) -> Self {
        match arg {
            ToneArg::Professional => Tone::Professional,
            ToneArg::Witty => Tone::Witty,
            ToneArg::Urgent => Tone::Urgent,
            ToneArg::Casual => Tone::Casual,
            ToneArg::Inspirational => Tone::Inspirational,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ResolutionArg {
    #[value(name = "1k", alias = "1K")]
    OneK,
    #[value(name = "2k", alias = "2K")]
    TwoK,
    #[value(name = "4k", alias = "4K")]
    FourK,
}

impl From<ResolutionArg> for ImageResolution {
    fn from(arg: ResolutionArg) -> Self {
        match arg {
            ResolutionArg::OneK => ImageResolution::OneK,
            ResolutionArg::TwoK => ImageResolution::TwoK,
            ResolutionArg::FourK => ImageResolution::FourK,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum AspectRatioArg {
    #[value(name = "auto")]
    Auto,
    #[value(name = "1:1")]
    Square,
    #[value(name = "3:4")]
    Portrait3x4,
    #[value(name = "4:3")]
    Landscape4x3,
    #[value(name = "9:16")]
    Portrait9x16,
    #[value(name = "16:9")]
    Landscape16x9,
}

impl From<AspectRatioArg> for AspectRatioOverride {
    fn from(arg: AspectRatioArg) -> Self {
        match arg {
            AspectRatioArg::Auto => AspectRatioOverride::Auto,
            AspectRatioArg::Square => AspectRatioOverride::Fixed(AspectRatio::Square),
            AspectRatioArg::Portrait3x4 => AspectRatioOverride::Fixed(AspectRatio::Portrait3x4),
            AspectRatioArg::Landscape4x3 => AspectRatioOverride::Fixed(AspectRatio::Landscape4x3),
            AspectRatioArg::Portrait9x16 => AspectRatioOverride::Fixed(AspectRatio::Portrait9x16),
            AspectRatioArg::Landscape16x9 => {
                AspectRatioOverride::Fixed(AspectRatio::Landscape16x9)
            }
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ModelArg {
    Flash,
    Pro,
}

impl From<ModelArg> for GeminiTextModel {
    fn from(arg: ModelArg) -> Self {
        match arg {
            ModelArg::Flash => GeminiTextModel::Flash,
            ModelArg::Pro => GeminiTextModel::Pro,
        }
    }
}

impl From<ModelArg> for GeminiImageModel {
    fn from(arg: ModelArg) -> Self {
        match arg {
            ModelArg::Flash => GeminiImageModel::Flash,
            ModelArg::Pro => GeminiImageModel::Pro,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    // An empty GOOGLE_API_KEY still reaches us as Some("").
    let credentials = match cli.api_key.as_deref().filter(|key| !key.trim().is_empty()) {
        Some(key) => CredentialStore::with_key(key)?,
        None => CredentialStore::from_env(),
    };

    match cli.command {
        Commands::Generate(args) => {
            generate(args, credentials, cli.json).await?;
        }
        Commands::Check(models) => {
            check(models, credentials, cli.json).await?;
        }
    }

    Ok(())
}

fn init_tracing(verbose: u8) {
    let fallback = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

fn build_providers(
    models: &ModelArgs,
    credentials: &CredentialStore,
) -> anyhow::Result<(GeminiTextProvider, GeminiImageProvider)> {
    let text = GeminiTextProvider::builder()
        .credentials(credentials.clone())
        .model(models.text_model.into())
        .build()?;
    let images = GeminiImageProvider::builder()
        .credentials(credentials.clone())
        .model(models.image_model.into())
        .build()?;
    Ok((text, images))
}

async fn generate(
    args: GenerateArgs,
    credentials: CredentialStore,
    json_output: bool,
) -> anyhow::Result<()> {
    if !credentials.has_selected_key() {
        anyhow::bail!(MISSING_KEY_MESSAGE);
    }
    if let Some(ref dir) = args.output {
        std::fs::create_dir_all(dir)?;
    }

    let (text, images) = build_providers(&args.models, &credentials)?;
    let settings = GenerationSettings::default()
        .with_tone(args.tone.into())
        .with_resolution(args.resolution.into())
        .with_aspect_ratio(args.aspect_ratio.into());
    let orchestrator = Orchestrator::new(text, images).with_settings(settings);

    let mut progress = Progress::default();
    let mut rx = orchestrator.subscribe();
    let generation = orchestrator.generate(&args.idea);
    tokio::pin!(generation);
    let outcome = loop {
        tokio::select! {
            outcome = &mut generation => break outcome,
            Ok(()) = rx.changed(), if !json_output => progress.report(&rx.borrow_and_update()),
        }
    };
    if !json_output {
        progress.report(&orchestrator.snapshot());
    }

    let posts = match outcome {
        Ok(GenerationOutcome::Completed(posts)) => posts,
        Ok(GenerationOutcome::Skipped(reason)) => {
            anyhow::bail!("nothing to generate ({reason:?})");
        }
        Err(e) => {
            tracing::debug!("generation failed: {e:?}");
            anyhow::bail!(e.user_message());
        }
    };

    let mut files = Vec::with_capacity(posts.len());
    for post in &posts {
        files.push(match args.output {
            Some(ref dir) => write_post(dir, post)?,
            None => None,
        });
    }

    if json_output {
        println!("{}", serde_json::to_string_pretty(&orchestrator.snapshot())?);
    } else {
        for (index, post) in posts.iter().enumerate() {
            print_post(index, post, files[index].as_deref());
        }
    }

    if args.interactive {
        interactive_loop(&orchestrator, args.output.as_deref()).await?;
    }

    Ok(())
}

/// Prints one line per post once its image settles.
#[derive(Default)]
struct Progress {
    reported: HashSet<Platform>,
}

impl Progress {
    fn report(&mut self, state: &AppState) {
        for post in state.posts.iter().filter(|p| !p.image_loading) {
            if self.reported.insert(post.platform) {
                let status = if post.image_data.is_some() { "✓" } else { "✗" };
                eprintln!("  {} {} image", status, post.platform);
            }
        }
    }
}

async fn interactive_loop(
    orchestrator: &Orchestrator,
    output: Option<&Path>,
) -> anyhow::Result<()> {
    println!("\nCommands: r <n> regenerates image n (1-3), q quits");
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    while let Some(line) = lines.next_line().await? {
        let mut words = line.split_whitespace();
        match (words.next(), words.next()) {
            (Some("q"), _) | (Some("quit"), _) => break,
            (Some("r"), Some(n)) => {
                let Some(index) = n.parse::<usize>().ok().and_then(|n| n.checked_sub(1)) else {
                    println!("expected a post number, got '{n}'");
                    continue;
                };
                match orchestrator.regenerate_image(index).await {
                    Ok(Some(post)) => {
                        let file = match output {
                            Some(dir) => write_post(dir, &post)?,
                            None => None,
                        };
                        print_post(index, &post, file.as_deref());
                    }
                    Ok(None) => println!("result superseded by a newer request"),
                    Err(e) => println!("image regeneration failed: {e}"),
                }
            }
            (None, _) => {}
            _ => println!("unknown command: {line}"),
        }
    }

    Ok(())
}

/// Writes `<platform>.txt` and, if present, the image. Returns the image path.
fn write_post(dir: &Path, post: &PlatformPost) -> anyhow::Result<Option<PathBuf>> {
    let slug = post.platform.key();
    std::fs::write(dir.join(format!("{slug}.txt")), &post.text_body)?;

    let Some(ref data_url) = post.image_data else {
        return Ok(None);
    };
    let image = GeneratedImage::from_data_url(data_url)?;
    let path = dir.join(format!("{slug}.{}", image.format.extension()));
    image.save(&path)?;
    Ok(Some(path))
}

fn print_post(index: usize, post: &PlatformPost, image_file: Option<&Path>) {
    println!(
        "\n[{}] {} ({}, {} chars)",
        index + 1,
        post.platform,
        post.aspect_ratio,
        post.character_count()
    );
    if post.exceeds_character_limit() {
        println!(
            "    warning: longer than the {} character limit",
            post.platform.character_limit()
        );
    }
    println!("{}", post.text_body);
    match (image_file, post.image_failed()) {
        (Some(path), _) => println!("Image: {}", path.display()),
        (None, true) => println!("Image: generation failed (try `r {}`)", index + 1),
        (None, false) => println!("Image: ready (use --output to save)"),
    }
}

async fn check(
    models: ModelArgs,
    credentials: CredentialStore,
    json_output: bool,
) -> anyhow::Result<()> {
    let key_selected = credentials.has_selected_key();
    let (text, images) = build_providers(&models, &credentials)?;

    let (text_result, image_result) = if key_selected {
        tokio::join!(text.health_check(), images.health_check())
    } else {
        (
            Err(omnigen::OmniGenError::MissingApiKey),
            Err(omnigen::OmniGenError::MissingApiKey),
        )
    };

    if json_output {
        let result = serde_json::json!({
            "keySelected": key_selected,
            "text": { "model": text.model().as_str(), "ok": text_result.is_ok(),
                      "error": text_result.as_ref().err().map(|e| e.to_string()) },
            "image": { "model": images.model().as_str(), "ok": image_result.is_ok(),
                       "error": image_result.as_ref().err().map(|e| e.to_string()) },
        });
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        if !key_selected {
            println!("{}", MISSING_KEY_MESSAGE);
        }
        for (name, model, result) in [
            (text.name(), text.model().as_str(), &text_result),
            (images.name(), images.model().as_str(), &image_result),
        ] {
            match result {
                Ok(()) => println!("  ✓ {} ({})", name, model),
                Err(e) => println!("  ✗ {} ({}): {}", name, model, e),
            }
        }
    }

    if text_result.is_err() || image_result.is_err() {
        std::process::exit(1);
    }
    Ok(())
}
