//! Seed the two default accounts: `generated-admin` and `generated-user`.
//!
//! Passwords come from `GENERATED_ADMIN_PASSWORD` and
//! `GENERATED_USER_PASSWORD`.

use anyhow::{Context, Result};
use validator::Validate;

use loanbook_server::auth::{AuthError, AuthService};
use loanbook_server::config::Config;
use loanbook_server::db;
use loanbook_server::models::NewUser;

struct Seed {
    username: &'static str,
    first_name: &'static str,
    last_name: &'static str,
    email: &'static str,
    password_var: &'static str,
}

const SEEDS: [Seed; 2] = [
    Seed {
        username: "generated-admin",
        first_name: "Admin",
        last_name: "Admin",
        email: "generated-admin@admin.com",
        password_var: "GENERATED_ADMIN_PASSWORD",
    },
    Seed {
        username: "generated-user",
        first_name: "User",
        last_name: "User",
        email: "generated-user@user.com",
        password_var: "GENERATED_USER_PASSWORD",
    },
];

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env().context("Failed to load configuration")?;

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.log_level)),
        )
        .init();

    let pool = db::connect_and_migrate(&config).await?;

    let auth_service = AuthService::new(
        pool,
        config.jwt_secret.clone(),
        config.jwt_access_token_ttl_seconds,
        config.jwt_refresh_token_ttl_days,
    );

    for seed in &SEEDS {
        let password = std::env::var(seed.password_var)
            .with_context(|| format!("{} must be set", seed.password_var))?;

        let new_user = NewUser {
            username: seed.username.to_string(),
            email: seed.email.to_string(),
            first_name: seed.first_name.to_string(),
            last_name: seed.last_name.to_string(),
            password,
        };
        new_user
            .validate()
            .with_context(|| format!("Invalid account data for {}", seed.username))?;

        match auth_service.create_user(new_user, bcrypt::DEFAULT_COST).await {
            Ok(user) => println!("Created {} ({})", user.username, user.id),
            Err(AuthError::UserAlreadyExists) => println!("{} already exists, skipped", seed.username),
            Err(e) => return Err(e).with_context(|| format!("Failed to create {}", seed.username)),
        }
    }

    Ok(())
}
