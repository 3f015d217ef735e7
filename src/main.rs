use clap::{Parser, Subcommand};
use rimagen::logger::{self, LoggerConfig};
use rimagen::{
    ApiClient, AspectRatio, AvailabilityMonitor, Config, FileSink, GenerationOrchestrator,
    GenerationRequest, PersonPolicy, RequestLifecycle,
};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser, Debug)]
#[command(name = "rimagen", about = "Generate images from text prompts")]
struct Args {
    /// Base URL of the image service (overrides IMAGEN_API_URL)
    #[arg(long, global = true)]
    api_url: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Check whether the service is reachable and configured
    Health,
    /// List the models the service offers
    Models,
    /// Generate one image from a prompt
    Generate {
        prompt: String,
        #[arg(long)]
        negative: Option<String>,
        #[arg(long, default_value = "1:1")]
        aspect_ratio: AspectRatio,
        #[arg(long, default_value = "dont_allow")]
        person: PersonPolicy,
        /// Directory for the downloaded image (overrides IMAGEN_DOWNLOAD_DIR)
        #[arg(long)]
        out_dir: Option<PathBuf>,
        /// Do not save the image
        #[arg(long)]
        no_save: bool,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let env_loaded = dotenv::dotenv().is_ok();

    let args = Args::parse();
    let mut config = Config::from_env();
    if let Some(url) = args.api_url {
        config.service = config.service.with_base_url(url);
    }

    let mut logger_config = LoggerConfig::default().with_level(config.log_level);
    if let Some(path) = &config.log_file {
        logger_config = logger_config.with_file_output(path);
    }
    logger::init_with_config(logger_config)?;
    if !env_loaded {
        log::debug!("No .env file found, using system environment variables");
    }
    logger::log_config_info(&config);

    let service = Arc::new(ApiClient::new(&config.service)?);

    match args.command {
        Command::Health => {
            let monitor = AvailabilityMonitor::initialize(service).await;
            println!("Service is {}", monitor.readiness());
            if !monitor.is_ready() {
                std::process::exit(1);
            }
        }
        Command::Models => {
            let catalog = service.models().await?;
            for model in catalog.models {
                println!("{} - {}", model.name, model.description);
                if !model.supported_aspect_ratios.is_empty() {
                    println!("  aspect ratios: {}", model.supported_aspect_ratios.join(", "));
                }
                if let Some(max) = model.max_prompt_length {
                    println!("  max prompt length: {}", max);
                }
            }
        }
        Command::Generate {
            prompt,
            negative,
            aspect_ratio,
            person,
            out_dir,
            no_save,
        } => {
            let monitor = AvailabilityMonitor::initialize(service.clone()).await;

            let download_dir = out_dir.unwrap_or(config.download.output_dir.clone());
            let orchestrator = GenerationOrchestrator::with_file_prefix(
                service,
                Arc::new(FileSink::new(download_dir)),
                config.download.file_prefix.clone(),
            );

            if !orchestrator.submit_enabled(monitor.is_ready()) {
                eprintln!("Image service is {}; not submitting.", monitor.readiness());
                std::process::exit(1);
            }

            let mut request = GenerationRequest::new(prompt)?
                .with_aspect_ratio(aspect_ratio)
                .with_person_policy(person);
            if let Some(negative) = negative {
                request = request.with_negative_prompt(negative)?;
            }

            orchestrator.submit(request).await?;
            let snapshot = orchestrator.snapshot().await;

            match snapshot.lifecycle {
                RequestLifecycle::Succeeded => {
                    if let Some(image) = snapshot.image() {
                        match image.elapsed_seconds {
                            Some(secs) => println!(
                                "Generated {} bytes in {:.1}s",
                                image.size(),
                                secs
                            ),
                            None => println!("Generated {} bytes", image.size()),
                        }
                    }
                    if !no_save {
                        if let Some(saved) = orchestrator.download_current_result().await? {
                            match saved.location {
                                Some(path) => println!("Saved to {}", path.display()),
                                None => println!("Saved as {}", saved.filename),
                            }
                        }
                    }
                }
                _ => {
                    eprintln!(
                        "Error: {}",
                        snapshot.error_message().unwrap_or("Failed to generate image")
                    );
                    std::process::exit(1);
                }
            }
        }
    }

    Ok(())
}
