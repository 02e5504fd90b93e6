use aushadh_ai::config::cli::{AnalyzeArgs, Command, Coordinates};
use aushadh_ai::core::locator::{locate_nearest, LocateOutcome};
use aushadh_ai::core::photo::{prepare_image, ImageOptions};
use aushadh_ai::core::proxy_client::ProxyClient;
use aushadh_ai::core::report::{render_report, render_store, timestamped_name};
use aushadh_ai::core::sanitize::sanitize_analysis;
use aushadh_ai::domain::model::AnalysisResult;
use aushadh_ai::domain::ports::{ConfigProvider, Storage};
use aushadh_ai::utils::error::{AushadhError, ErrorSeverity};
use aushadh_ai::utils::{logger, validation::Validate};
use aushadh_ai::{
    AppStatus, CliConfig, GeminiClient, Language, LocalStorage, ModelSettings, Narrator,
    PrescriptionAnalyzer, Result,
};
use clap::Parser;
use std::path::Path;
use std::time::Duration;

#[tokio::main]
async fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
    let config = CliConfig::parse();

    logger::init_cli_logger(config.verbose);
    tracing::info!("Starting aushadh-ai CLI");

    let settings = match config.model.resolve() {
        Ok(settings) => settings,
        Err(e) => exit_with(&e),
    };
    tracing::debug!("Model settings: {:?}", settings);

    let outcome = match config.command {
        Command::Analyze(args) => run_analyze(&settings, args).await,
        Command::Locate { lat, lng } => {
            run_locate(&settings, Coordinates { lat, lng }).await;
            Ok(())
        }
        Command::Speak { result, lang, out } => run_speak(&settings, &result, lang, &out).await,
    };

    if let Err(e) = outcome {
        exit_with(&e);
    }

    Ok(())
}

fn exit_with(e: &AushadhError) -> ! {
    tracing::error!(
        "❌ {} (Category: {:?}, Severity: {:?})",
        e,
        e.category(),
        e.severity()
    );
    tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());

    eprintln!("❌ {}", e.user_friendly_message());
    eprintln!("💡 {}", e.recovery_suggestion());

    let exit_code = match e.severity() {
        ErrorSeverity::Low | ErrorSeverity::High => 1,
        ErrorSeverity::Medium => 2, // 可重試
        ErrorSeverity::Critical => 3,
    };
    std::process::exit(exit_code)
}

fn transition(status: &mut AppStatus, next: AppStatus) {
    tracing::info!("Status: {} -> {}", status, next);
    *status = next;
}

async fn run_analyze(settings: &ModelSettings, args: AnalyzeArgs) -> Result<()> {
    args.validate()?;

    let mut status = AppStatus::Idle;
    transition(&mut status, AppStatus::Uploading);

    let bytes = match load_image(&args, settings).await {
        Ok(bytes) => bytes,
        Err(e) => {
            transition(&mut status, AppStatus::Error);
            if args.url.is_some() {
                eprintln!("❌ Failed to load sample image.");
            }
            return Err(e);
        }
    };

    transition(&mut status, AppStatus::Processing);
    let result = match analyze_bytes(&bytes, &args, settings).await {
        Ok(result) => result,
        Err(e) => {
            transition(&mut status, AppStatus::Error);
            return Err(e);
        }
    };
    transition(&mut status, AppStatus::Success);

    if args.json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        print!("{}", render_report(&result, args.lang));
    }

    if let Some(path) = &args.save {
        let path = if path.is_dir() {
            path.join(timestamped_name(&chrono::Local::now()))
        } else {
            path.clone()
        };
        let storage = LocalStorage::default();
        storage
            .write_file(&path.to_string_lossy(), &serde_json::to_vec_pretty(&result)?)
            .await?;
        println!("📁 Analysis saved to {}", path.display());
    }

    if let Some(coords) = args.locate {
        run_locate(settings, coords).await;
    }

    if args.speak {
        if let Some(out) = &args.audio_out {
            narrate_to_file(settings, &result, args.lang, out).await?;
        }
    }

    Ok(())
}

async fn load_image(args: &AnalyzeArgs, settings: &ModelSettings) -> Result<Vec<u8>> {
    if let Some(url) = &args.url {
        tracing::info!("Fetching sample image from {}", url);
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs()))
            .build()?;
        let response = client.get(url).send().await?.error_for_status()?;
        return Ok(response.bytes().await?.to_vec());
    }

    match &args.image {
        Some(path) => {
            LocalStorage::default()
                .read_file(&path.to_string_lossy())
                .await
        }
        None => Err(AushadhError::ValidationError {
            message: "Provide an image path or --url".to_string(),
        }),
    }
}

async fn analyze_bytes(
    bytes: &[u8],
    args: &AnalyzeArgs,
    settings: &ModelSettings,
) -> Result<AnalysisResult> {
    let prepared = prepare_image(bytes, &ImageOptions::from_config(settings, args.rotate))?;
    tracing::info!(
        "Prepared {}x{} JPEG ({} base64 chars)",
        prepared.width,
        prepared.height,
        prepared.base64.len()
    );

    match &args.proxy_url {
        Some(proxy_url) => {
            let client = ProxyClient::new(proxy_url, Duration::from_secs(settings.timeout_secs()))?;
            client.analyze(&prepared).await
        }
        None => {
            let analyzer = PrescriptionAnalyzer::new(GeminiClient::from_config(settings)?, settings);
            analyzer.analyze(&prepared.base64, prepared.mime_type).await
        }
    }
}

/// Lookup problems are reported to the user but never fail the command.
async fn run_locate(settings: &ModelSettings, coords: Coordinates) {
    match &locate_nearest(settings, coords.lat, coords.lng).await {
        LocateOutcome::Found(store) => print!("\n{}", render_store(store)),
        other => {
            if let Some(message) = other.message() {
                eprintln!("⚠ {}", message);
            }
        }
    }
}

async fn run_speak(settings: &ModelSettings, saved: &Path, lang: Language, out: &Path) -> Result<()> {
    let bytes = LocalStorage::default()
        .read_file(&saved.to_string_lossy())
        .await?;
    let value: serde_json::Value = serde_json::from_slice(&bytes)?;
    let result = sanitize_analysis(&value);
    narrate_to_file(settings, &result, lang, out).await
}

async fn narrate_to_file(
    settings: &ModelSettings,
    result: &AnalysisResult,
    lang: Language,
    out: &Path,
) -> Result<()> {
    let narrator = Narrator::new(GeminiClient::from_config(settings)?, settings);
    println!("🔊 Narrating summary in {} (Ctrl-C to stop)", lang.label());

    match narrator
        .narrate_until(&result.bhashini_summary, lang, tokio::signal::ctrl_c())
        .await?
    {
        Some(audio) => {
            LocalStorage::default()
                .write_file(&out.to_string_lossy(), &audio.to_wav())
                .await?;
            println!(
                "🔊 Saved {:.1}s of audio to {}",
                audio.duration().as_secs_f64(),
                out.display()
            );
        }
        None => println!("⏹ Narration stopped"),
    }
    Ok(())
}
