mod app_config;
mod auth;
mod client;
mod common;
mod error;
mod utils;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use crate::{
    app_config::{AppConfig, Environment, LoadOptions},
    auth::{build_login_url, build_logout_url, token_from_callback, Session},
    client::{DrinkBody, DrinksClient, Ingredient},
    common::{app_config, install_config},
    error::CoffeeShopError,
};

/// Command line client for the coffee shop drinks API
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Configuration file (defaults to Config.toml when present)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Deployment environment; overrides COFFEE_SHOP_ENV
    #[arg(short, long, value_parser = parse_environment)]
    environment: Option<Environment>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the loaded configuration
    ShowConfig,
    /// Print the URL that starts a login
    LoginUrl,
    /// Print the URL that ends the session
    LogoutUrl,
    /// List the public menu
    Drinks,
    /// List the menu with full recipes
    DrinksDetail {
        #[arg(long, env = "COFFEE_SHOP_TOKEN")]
        token: String,
    },
    /// Add a drink; the recipe is a JSON array of ingredients
    Create {
        #[arg(long, env = "COFFEE_SHOP_TOKEN")]
        token: String,
        #[arg(long)]
        title: String,
        #[arg(long)]
        recipe: String,
    },
    /// Change the title and/or recipe of a drink
    Update {
        id: i64,
        #[arg(long, env = "COFFEE_SHOP_TOKEN")]
        token: String,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        recipe: Option<String>,
    },
    Delete {
        id: i64,
        #[arg(long, env = "COFFEE_SHOP_TOKEN")]
        token: String,
    },
    /// Show who the token belongs to and what it allows
    Whoami {
        #[arg(long, env = "COFFEE_SHOP_TOKEN")]
        token: String,
    },
}

fn parse_environment(value: &str) -> Result<Environment, String> {
    value.parse().map_err(|err: CoffeeShopError| err.to_string())
}

/// Accept either a bare access token or the whole callback URL it came back on.
fn session(raw: &str, config: &AppConfig) -> Result<Session, CoffeeShopError> {
    let token = if raw.contains('#') {
        token_from_callback(raw)?
    } else {
        raw.trim().to_string()
    };

    Session::from_token(&token, &config.auth0)
}

fn parse_recipe(recipe: &str) -> Result<Vec<Ingredient>, CoffeeShopError> {
    Ok(serde_json::from_str(recipe)?)
}

fn run(command: Command, config: &AppConfig) -> Result<(), CoffeeShopError> {
    match command {
        Command::ShowConfig => println!("{}", serde_json::to_string_pretty(config)?),
        Command::LoginUrl => println!("{}", build_login_url(&config.auth0)?),
        Command::LogoutUrl => println!("{}", build_logout_url(&config.auth0)?),
        Command::Drinks => {
            for drink in DrinksClient::new(config)?.drinks()? {
                println!("{drink}");
            }
        }
        Command::DrinksDetail { token } => {
            let session = session(&token, config)?;
            for drink in DrinksClient::new(config)?.drinks_detail(&session)? {
                println!("{drink}");
            }
        }
        Command::Create {
            token,
            title,
            recipe,
        } => {
            let session = session(&token, config)?;
            let recipe = parse_recipe(&recipe)?;
            let drink = DrinksClient::new(config)?.create_drink(&session, &title, &recipe)?;
            println!("{drink}");
        }
        Command::Update {
            id,
            token,
            title,
            recipe,
        } => {
            let session = session(&token, config)?;
            let recipe = recipe.as_deref().map(parse_recipe).transpose()?;
            let body = DrinkBody {
                title: title.as_deref(),
                recipe: recipe.as_deref(),
            };
            let drink = DrinksClient::new(config)?.update_drink(&session, id, &body)?;
            println!("{drink}");
        }
        Command::Delete { id, token } => {
            let session = session(&token, config)?;
            let deleted = DrinksClient::new(config)?.delete_drink(&session, id)?;
            println!("Deleted drink #{deleted}");
        }
        Command::Whoami { token } => {
            let session = session(&token, config)?;
            println!("subject: {}", session.subject().unwrap_or("<unknown>"));
            println!("expires: {}", session.expires_at());
            println!("permissions: {}", session.permissions().join(", "));
        }
    }

    Ok(())
}

fn main() -> Result<(), CoffeeShopError> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let options = LoadOptions {
        config_path: args.config,
        environment: args.environment,
    };

    // Nothing may run on a partial configuration.
    if let Err(err) = AppConfig::build(&options).and_then(install_config) {
        error!("Refusing to start: {err}");
        return Err(err);
    }

    let config = app_config()?;
    info!(
        "Started in {} mode against {}",
        config.environment, config.api_server_url
    );

    run(args.command, config)
}
