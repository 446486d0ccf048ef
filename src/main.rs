use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use rahat_studio::app::{App, MediaOutcome};
use rahat_studio::capture::{
    final_transcript, pick_file, Camera, FileCamera, FrameSettings, LineMicrophone, Microphone,
};
use rahat_studio::models::{ChatSession, Config, GenerationResult, ImageAttachment, Prompt};
use std::path::{Path, PathBuf};
use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Parser)]
#[command(name = "rahat-studio")]
#[command(about = "Rahat Coding Wala AI studio: chat, images, video, maps and naming")]
struct CliArgs {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Ask the assistant a question, optionally about an image.
    Chat {
        message: Option<String>,
        /// Attach an image file.
        #[arg(long, conflicts_with = "camera")]
        image: Option<PathBuf>,
        /// Capture a frame from a camera source.
        #[arg(long)]
        camera: Option<PathBuf>,
        /// Read the question from the microphone (stdin transcript).
        #[arg(long)]
        listen: bool,
    },
    /// Generate an image from a prompt.
    Image {
        prompt: String,
        #[arg(long, value_name = "FILE")]
        out: Option<PathBuf>,
    },
    /// Get hairstyle advice for a captured face.
    HairAnalyze {
        #[arg(long)]
        camera: PathBuf,
    },
    /// Try a new hairstyle on a captured face.
    HairStyle {
        style: String,
        #[arg(long)]
        camera: PathBuf,
        #[arg(long, value_name = "FILE")]
        out: Option<PathBuf>,
    },
    /// Generate a short 3D video. Ctrl-C stops waiting.
    Video { prompt: String },
    /// Find places on the map.
    Places { query: String },
    /// Brainstorm business names and slogans.
    Names { topic: String },
}

fn cancel_on_ctrl_c() -> CancellationToken {
    let cancel = CancellationToken::new();
    let token = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Interrupt received, cancelling");
            token.cancel();
        }
    });
    cancel
}

async fn capture_once(source: &Path, settings: FrameSettings) -> Result<ImageAttachment> {
    let camera = FileCamera::open(source, settings)?;
    let frame = camera.capture_frame().await;
    camera.stop();
    Ok(frame?)
}

fn save_image(data_uri: &str, out: &Path) -> Result<()> {
    let bytes = ImageAttachment::from_data_uri(data_uri).decode()?;
    std::fs::write(out, bytes).with_context(|| format!("writing {}", out.display()))?;
    info!("Saved image to {}", out.display());
    Ok(())
}

fn report(outcome: MediaOutcome, out: Option<&Path>) -> Result<()> {
    match outcome {
        MediaOutcome::Ready(GenerationResult::Image { data_uri }) => match out {
            Some(out) => save_image(&data_uri, out),
            None => {
                println!("{}", data_uri);
                Ok(())
            }
        },
        MediaOutcome::Ready(GenerationResult::Video(handle)) => {
            println!("{}", handle.path.display());
            Ok(())
        }
        MediaOutcome::Ready(other) => bail!("Unexpected result: {:?}", other),
        MediaOutcome::NoResult { message } => {
            println!("{}", message);
            Ok(())
        }
        MediaOutcome::Failed {
            message,
            needs_credential,
        } => {
            if needs_credential {
                error!("Select a billing-enabled key via GEMINI_API_KEY and retry");
            }
            bail!(message)
        }
    }
}

async fn run(app: &App, command: Command) -> Result<()> {
    match command {
        Command::Chat {
            message,
            image,
            camera,
            listen,
        } => {
            let mut text = message.unwrap_or_default();
            if listen {
                eprintln!("Listening... type your question and press Enter");
                let microphone =
                    LineMicrophone::new(tokio::io::BufReader::new(tokio::io::stdin()));
                let heard = final_transcript(microphone.listen(cancel_on_ctrl_c())).await?;
                text = [text.trim(), heard.trim()]
                    .iter()
                    .filter(|part| !part.is_empty())
                    .copied()
                    .collect::<Vec<_>>()
                    .join(" ");
            }

            let attachment = match (image, camera) {
                (Some(path), _) => Some(pick_file(&path).await?),
                (None, Some(source)) => Some(capture_once(&source, FrameSettings::CHAT).await?),
                (None, None) => None,
            };

            let mut prompt = Prompt::text(text);
            if let Some(attachment) = attachment {
                prompt = prompt.with_image(attachment);
            }

            let mut session = ChatSession::new();
            let reply = app.send_chat(&mut session, prompt).await?;
            println!("{}", reply.text);
        }
        Command::Image { prompt, out } => {
            report(app.generate_image(&prompt).await?, out.as_deref())?;
        }
        Command::HairAnalyze { camera } => {
            let frame = capture_once(&camera, FrameSettings::HAIR_STYLER).await?;
            println!("{}", app.analyze_hairstyle(&frame).await);
        }
        Command::HairStyle { style, camera, out } => {
            let frame = capture_once(&camera, FrameSettings::HAIR_STYLER).await?;
            report(app.try_hairstyle(&frame, &style).await?, out.as_deref())?;
        }
        Command::Video { prompt } => {
            let cancel = cancel_on_ctrl_c();
            report(app.generate_video(&prompt, &cancel).await?, None)?;
        }
        Command::Places { query } => {
            let result = app.search_places(&query).await?;
            println!("{}", result.text);
            for location in result.locations {
                println!("- {} <{}>", location.title, location.uri);
            }
        }
        Command::Names { topic } => {
            for idea in app.generate_names(&topic).await? {
                println!("{}: {}", idea.name, idea.slogan);
            }
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "rahat_studio=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args = CliArgs::parse();

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to initialize application: {}", e);
            std::process::exit(1);
        }
    };

    let app = App::new(&config);
    match run(&app, args.command).await {
        Ok(()) => Ok(()),
        Err(e) => {
            error!("Request failed: {:#}", e);
            std::process::exit(1);
        }
    }
}
