use clap::{Parser, Subcommand};
use notify_server::config::{AppConfig, DEFAULT_CORS_ORIGIN, DEFAULT_DB_PATH, DEFAULT_PORT};
use notify_server::push::VapidKeys;
use std::path::PathBuf;

#[allow(clippy::large_enum_variant)]
pub(crate) enum RunOutcome {
    Serve(AppConfig),
    Exit(i32),
}

pub(crate) fn run() -> RunOutcome {
    let cli = Cli::parse();
    if let Some(Command::GenerateVapid) = cli.command {
        let code = run_generate_vapid();
        return RunOutcome::Exit(code);
    }

    match resolve_config(cli) {
        Ok(config) => RunOutcome::Serve(config),
        Err(err) => {
            eprintln!("error: {err}");
            RunOutcome::Exit(2)
        }
    }
}

#[derive(Parser, Debug)]
#[command(
    name = "notify-server",
    version,
    about = "Web Push notification server"
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
    #[arg(long, env = "VAPID_PUBLIC_KEY")]
    vapid_public_key: Option<String>,
    #[arg(long, env = "VAPID_PRIVATE_KEY")]
    vapid_private_key: Option<String>,
    /// Contact URI sent to push services, `mailto:` or `https:`.
    #[arg(long, env = "VAPID_CONTACT")]
    vapid_contact: Option<String>,
    /// Bearer token for the admin routes.
    #[arg(long, env = "ADMIN_KEY")]
    admin_key: Option<String>,
    #[arg(long, env = "DB_PATH", default_value = DEFAULT_DB_PATH)]
    db_path: PathBuf,
    #[arg(long, env = "PORT", default_value_t = DEFAULT_PORT)]
    port: u16,
    #[arg(long, env = "CORS_ORIGIN", default_value = DEFAULT_CORS_ORIGIN)]
    cors_origin: String,
    /// Title of a notification sent to each new subscriber.
    #[arg(long, env = "WELCOME_MESSAGE")]
    welcome_message: Option<String>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print a fresh VAPID key pair and exit.
    GenerateVapid,
}

fn run_generate_vapid() -> i32 {
    let keys = VapidKeys::generate();
    println!("VAPID_PUBLIC_KEY={}", keys.public_key());
    println!("VAPID_PRIVATE_KEY={}", keys.private_key());
    0
}

fn resolve_config(cli: Cli) -> Result<AppConfig, String> {
    let public_key = required(cli.vapid_public_key, "--vapid-public-key")?;
    let private_key = required(cli.vapid_private_key, "--vapid-private-key")?;
    let keys = VapidKeys::parse(&public_key, &private_key).map_err(|err| err.to_string())?;

    let contact = required(cli.vapid_contact, "--vapid-contact")?;
    if !(contact.starts_with("mailto:") || contact.starts_with("https:")) {
        return Err(format!(
            "invalid VAPID contact '{contact}'; expected a mailto: or https: URI"
        ));
    }

    let admin_key = required(cli.admin_key, "--admin-key")?;

    let cors_origin = cli.cors_origin.trim().to_string();
    if cors_origin.is_empty() {
        return Err("cors origin cannot be empty".to_string());
    }

    let welcome_message = cli
        .welcome_message
        .map(|message| message.trim().to_string())
        .filter(|message| !message.is_empty());

    Ok(AppConfig {
        db_path: cli.db_path,
        port: cli.port,
        cors_origin,
        vapid: keys.into_config(contact),
        admin_key,
        welcome_message,
    })
}

fn required(value: Option<String>, flag: &str) -> Result<String, String> {
    let value = value
        .map(|value| value.trim().to_string())
        .unwrap_or_default();
    if value.is_empty() {
        return Err(format!("{flag} is required"));
    }
    Ok(value)
}
