//! devicefarm CLI - Submit builds to AWS Device Farm.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use tracing::{Level, info};
use tracing_subscriber::FmtSubscriber;

use devicefarm::client::cli::AwsCliClient;
use devicefarm::config::{self, Config};
use devicefarm::server::DeviceFarmServer;
use devicefarm::upload::{DeviceFarmUploader, HttpTransfer};

#[derive(Parser)]
#[command(name = "devicefarm")]
#[command(about = "Submit app and test artifacts to AWS Device Farm", long_about = None)]
#[command(version)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, default_value = "devicefarm.toml")]
    config: PathBuf,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Upload artifacts and schedule a test run
    Submit {
        /// Build variant label, e.g. "debug"
        #[arg(long, default_value = "debug")]
        variant: String,

        /// Application under test (.apk or .ipa)
        #[arg(long)]
        app: PathBuf,

        /// Test package produced by the build (instrumentation tests only)
        #[arg(long)]
        test_package: Option<PathBuf>,

        /// Override the configured project name
        #[arg(long)]
        project: Option<String>,

        /// Override the configured device pool name
        #[arg(long)]
        device_pool: Option<String>,
    },

    /// Validate configuration file
    Validate,

    /// Initialize a new configuration file
    Init {
        /// Project name to write into the config
        #[arg(long, default_value = "MyProject")]
        project: String,

        /// Test type (instrumentation, appium-java-junit, fuzz, explorer)
        #[arg(short, long, default_value = "instrumentation")]
        test_type: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    match cli.command {
        Commands::Submit {
            variant,
            app,
            test_package,
            project,
            device_pool,
        } => {
            submit(
                &cli.config,
                &variant,
                &app,
                test_package,
                project,
                device_pool,
            )
            .await
        }
        Commands::Validate => validate_config(&cli.config),
        Commands::Init { project, test_type } => init_config(&cli.config, &project, &test_type),
    }
}

async fn submit(
    config_path: &Path,
    variant: &str,
    app: &Path,
    test_package: Option<PathBuf>,
    project_override: Option<String>,
    pool_override: Option<String>,
) -> Result<()> {
    let mut config = config::load_config(config_path)
        .with_context(|| format!("Failed to load config from {}", config_path.display()))?;

    if let Some(project) = project_override {
        config.devicefarm.project_name = project;
    }
    if let Some(pool) = pool_override {
        config.devicefarm.device_pool = pool;
    }
    config.validate()?;

    info!("Loaded configuration from {}", config_path.display());

    // Other test types take their package from the config or need none.
    let test_package = match test_package {
        Some(path) => path,
        None if config.test.uses_build_package() => {
            bail!("--test-package is required for {} tests", config.test.name())
        }
        None => PathBuf::new(),
    };

    let client = AwsCliClient::new(&config.aws);
    let transfer = HttpTransfer::new(Duration::from_secs(config.upload.timeout_secs))?;
    let uploader = DeviceFarmUploader::new(&client, transfer, &config.upload);
    let server = DeviceFarmServer::new(&config, &client, &uploader);

    let result = server
        .submit(variant, &test_package, app)
        .await
        .with_context(|| format!("Device Farm submission for {} failed", variant))?;

    println!("{}", result.arn());
    if let Some(url) = result.run.console_url(&config.aws.region) {
        println!("{}", url);
    }

    Ok(())
}

fn validate_config(config_path: &Path) -> Result<()> {
    match config::load_config(config_path) {
        Ok(config) => {
            print_settings(&config);
            Ok(())
        }
        Err(e) => {
            eprintln!("Configuration error: {:#}", e);
            std::process::exit(1);
        }
    }
}

fn print_settings(config: &Config) {
    println!("Configuration is valid!");
    println!();
    println!("Settings:");
    println!("  Project: {}", config.devicefarm.project_name);
    println!("  Device pool: {}", config.devicefarm.device_pool);
    println!(
        "  Billing: {}",
        if config.devicefarm.use_unmetered_devices {
            "unmetered"
        } else {
            "metered"
        }
    );
    println!("  Test type: {}", config.test.name());
    println!("  Region: {}", config.aws.region);
    if let Some(profile) = &config.aws.profile {
        println!("  Profile: {}", profile);
    }
}

fn init_config(path: &Path, project: &str, test_type: &str) -> Result<()> {
    let test_config = match test_type {
        "instrumentation" => {
            r#"[test]
type = "instrumentation"
# filter = "com.example.SmokeTest""#
        }
        "appium-java-junit" => {
            r#"[test]
type = "appium-java-junit"
package = "build/appium-tests.zip""#
        }
        "fuzz" => {
            r#"[test]
type = "fuzz"
event_count = 6000
event_throttle = 50"#
        }
        "explorer" => {
            r#"[test]
type = "explorer"
# username = "demo"
# password = "demo""#
        }
        _ => {
            eprintln!(
                "Unknown test type: {}. Use: instrumentation, appium-java-junit, fuzz, explorer",
                test_type
            );
            std::process::exit(1);
        }
    };

    // Quoted and escaped as a TOML basic string.
    let project_name = toml::Value::String(project.to_string());

    let content = format!(
        r#"# devicefarm configuration file

[devicefarm]
project_name = {}
device_pool = "Top Devices"
use_unmetered_devices = false

[aws]
region = "us-west-2"
# profile = "default"

{}

[device_state.radios]
wifi = true
bluetooth = true
gps = true
nfc = true
"#,
        project_name, test_config
    );

    if path.exists() {
        eprintln!(
            "{} already exists. Remove it first or edit manually.",
            path.display()
        );
        std::process::exit(1);
    }

    std::fs::write(path, content)?;
    println!("Created {}", path.display());
    println!();
    println!("Edit the configuration as needed, then run:");
    println!("  devicefarm submit --app <app.apk> --test-package <tests.apk>");

    Ok(())
}
