use anyhow::Context;
use chrono::Duration;
use clap::Args;
use serde_json::json;

use crate::auth::{generate_jwt, Claims};
use crate::cli::utils::output_success;
use crate::cli::OutputFormat;

#[derive(Args, Debug)]
pub struct TokenArgs {
    #[arg(long, help = "Subject (user id) the credential is issued to")]
    pub sub: String,

    #[arg(long, help = "Email claim")]
    pub email: Option<String>,

    #[arg(long, default_value = "authenticated", help = "Role claim")]
    pub role: String,

    #[arg(long, default_value_t = 60, help = "Lifetime in minutes")]
    pub ttl_minutes: i64,

    #[arg(long, help = "Signing secret (defaults to SUPABASE_JWT_SECRET)")]
    pub secret: Option<String>,
}

pub fn handle(args: TokenArgs, output_format: OutputFormat) -> anyhow::Result<()> {
    let secret = match args.secret {
        Some(secret) => secret,
        None => std::env::var("SUPABASE_JWT_SECRET")
            .context("SUPABASE_JWT_SECRET is not set and --secret was not given")?,
    };

    let mut claims = Claims::new(&args.sub, Duration::minutes(args.ttl_minutes)).with_role(&args.role);
    if let Some(email) = &args.email {
        claims = claims.with_email(email);
    }

    let token = generate_jwt(&claims, &secret)?;

    match output_format {
        OutputFormat::Json => output_success(
            output_format,
            "Token issued",
            Some(json!({ "token": token, "sub": claims.sub, "exp": claims.exp })),
        ),
        // Bare token so it can be captured by a shell
        OutputFormat::Text => {
            println!("{}", token);
            Ok(())
        }
    }
}
