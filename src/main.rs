use alertr::cli::Cli;
use alertr::config::{ConfigError, Settings};
use alertr::core::alert::{AlertError, SlackSink};
use alertr::core::network::{get_debug_logger, DialerResolver, ProbeExecutor};
use std::process::ExitCode;

#[derive(Debug, thiserror::Error)]
enum StartupError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Alert(#[from] AlertError),
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse_args();
    let logger = get_debug_logger();

    let settings = match Settings::from_cli(&cli) {
        Ok(settings) => settings,
        Err(e) => {
            logger.error("Config", "config_invalid", &e.to_string());
            return ExitCode::FAILURE;
        }
    };

    if cli.check {
        print_check(&settings);
        return ExitCode::SUCCESS;
    }

    let executor = match build_executor(&settings) {
        Ok(executor) => executor.with_logger(logger),
        Err(e) => {
            logger.error("Config", "startup_failed", &e.to_string());
            return ExitCode::FAILURE;
        }
    };

    // Probe and alert failures are reported through the sink, not the exit code
    executor.run_cycle(&settings.targets).await;
    ExitCode::SUCCESS
}

fn build_executor(settings: &Settings) -> Result<ProbeExecutor, StartupError> {
    let resolver = DialerResolver::new(settings.proxy.clone(), settings.test_timeout)
        .map_err(ConfigError::from)?;
    let sink = SlackSink::new(settings.webhook_url.clone(), settings.channel.clone())?
        .with_identity(settings.username.clone(), settings.icon_emoji.clone());

    Ok(ProbeExecutor::new(Box::new(resolver), Box::new(sink)).with_mention(settings.mention.clone()))
}

fn print_check(settings: &Settings) {
    println!("✓ Configuration valid");
    println!("  timeout: {:?}", settings.test_timeout);
    match &settings.proxy {
        Some(proxy) => println!("  proxy:   socks5h://{}", proxy),
        None => println!("  proxy:   none"),
    }
    for (i, target) in settings.targets.iter().enumerate() {
        println!("  [{}] {}", i + 1, target);
    }
}
