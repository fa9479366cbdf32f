use birthday_wisher::config::{contact_store, toml_config::LogFormat};
use birthday_wisher::domain::ports::Clock;
use birthday_wisher::utils::{logger, validation::Validate};
use birthday_wisher::{
    BirthdayNotifier, CliConfig, ConfiguredChannel, FixedClock, JsonContactStore, LocalStorage,
    Persistence, RunSummary, SystemClock, TomlConfig, WisherEngine,
};
use clap::Parser;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = CliConfig::parse();

    // 先讀配置，才知道日誌格式
    let config = TomlConfig::from_file_or_default(&args.config);
    match config.as_ref().map(|c| c.logging.format) {
        Ok(LogFormat::Json) => logger::init_json_logger(args.verbose),
        _ => logger::init_cli_logger(args.verbose),
    }

    let mut config = match config {
        Ok(config) => config,
        Err(e) => {
            eprintln!("❌ Failed to load config file '{}': {}", args.config, e);
            eprintln!("💡 {}", e.recovery_suggestion());
            std::process::exit(1);
        }
    };
    tracing::debug!("CLI args: {:?}", args);
    if !std::path::Path::new(&args.config).exists() {
        tracing::warn!("Config file '{}' not found, using defaults (console channel)", args.config);
    }

    if let Some(contacts) = &args.contacts {
        config.store.path = contacts.clone();
    }

    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        eprintln!("❌ {}", e);
        eprintln!("💡 {}", e.recovery_suggestion());
        std::process::exit(1);
    }

    let channel = match ConfiguredChannel::from_config(&config.channel) {
        Ok(channel) => channel,
        Err(e) => {
            eprintln!("❌ Could not set up the {:?} channel: {}", config.channel.kind, e);
            std::process::exit(1);
        }
    };
    tracing::info!("Using {} channel, contacts from '{}'", channel.kind(), config.store.path);

    let store = contact_store(&config.store.path);
    let notifier = BirthdayNotifier::new(channel).with_post_send_delay(config.post_send_delay());

    match args.date {
        Some(date) => run(WisherEngine::new(store, notifier, FixedClock::new(date)), args.dry_run).await,
        None => run(WisherEngine::new(store, notifier, SystemClock), args.dry_run).await,
    }
}

async fn run<C: Clock>(
    engine: WisherEngine<JsonContactStore<LocalStorage>, ConfiguredChannel, C>,
    dry_run: bool,
) -> anyhow::Result<()> {
    if dry_run {
        let (today, plan) = engine.preview().await?;
        println!("🔍 Dry run for {}: {} greeting(s) due", today, plan.len());
        for planned in plan {
            println!("  #{} {} ({})", planned.index, planned.name, planned.phone);
        }
        return Ok(());
    }

    let summary = engine.run().await?;
    print_summary(&summary);
    Ok(())
}

fn print_summary(summary: &RunSummary) {
    println!("--- Birthday wisher: {} ---", summary.date);
    if let Some(err) = &summary.load_error {
        println!("⚠️  Contacts could not be loaded: {}", err);
    }
    println!("Contacts loaded: {}", summary.contacts_loaded);
    if summary.birthdays_found {
        println!("🎂 Birthdays found today: yes");
    } else {
        println!("No birthdays found today.");
    }
    println!(
        "Notified: {}, already notified: {}, failed: {}, skipped: {}",
        summary.notified, summary.already_notified, summary.failed, summary.skipped
    );
    match &summary.persistence {
        Persistence::NotNeeded => println!("State persisted: no (nothing changed)"),
        Persistence::Saved => println!("State persisted: yes"),
        Persistence::Failed(err) => println!("❌ State persisted: no ({})", err),
    }
}
