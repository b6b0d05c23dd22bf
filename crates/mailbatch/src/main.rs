//! mailbatch - bulk operations on `NotLetters` mailboxes.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

mod cli;
mod output;

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Instant;

use anyhow::{Context, Result, bail};
use clap::Parser;
use mailbatch_api::{ApiClient, DEFAULT_BASE_URL, EmailType, Endpoints, LetterFilter};
use mailbatch_core::{
    BatchExecutor, BulkOperation, ExecutorConfig, JobReport, LetterJob, PasswordChangeJob, Runner,
    Settings, credentials, export, resolve_token,
};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use cli::{BuyArgs, ChangePasswordArgs, Cli, Command, LettersArgs, TokenCommand};
use output::ConsoleObserver;

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "mailbatch=info,mailbatch_core=info,mailbatch_api=info".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

/// Resolved global options.
struct AppContext {
    settings: Settings,
    settings_path: PathBuf,
    token: Option<String>,
    base_url: String,
    concurrency: usize,
}

impl AppContext {
    async fn load(cli: &Cli) -> Result<Self> {
        let settings_path = cli.config.clone().unwrap_or_else(Settings::default_path);
        let settings = Settings::load(&settings_path)
            .await
            .with_context(|| format!("reading settings from {}", settings_path.display()))?;

        let concurrency = match cli.concurrency {
            Some(c) => c,
            None => settings.concurrency()?,
        };
        let base_url = cli
            .base_url
            .clone()
            .or_else(|| settings.base_url.clone())
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());

        Ok(Self {
            settings,
            settings_path,
            token: cli.token.clone(),
            base_url,
            concurrency,
        })
    }

    fn client(&self) -> Result<ApiClient> {
        let (token, source) = resolve_token(self.token.as_deref(), &self.settings)?;
        debug!(?source, "Resolved API token");
        let endpoints = Endpoints::from_base(&self.base_url)
            .with_context(|| format!("invalid base URL {}", self.base_url))?;
        Ok(ApiClient::new(endpoints, token))
    }

    fn runner(&self) -> Result<Runner> {
        let config = ExecutorConfig::new().concurrency(self.concurrency);
        Ok(Runner::new(self.client()?, BatchExecutor::new(config)))
    }
}

async fn run(cli: Cli) -> Result<()> {
    let ctx = AppContext::load(&cli).await?;
    let verbose = cli.verbose;

    match cli.command {
        Command::Balance => balance(&ctx).await,
        Command::Check => check(&ctx).await,
        Command::ChangePassword(args) => {
            run_bulk(&ctx, password_change_operation(args), verbose).await
        }
        Command::Letters(args) => run_bulk(&ctx, letters_operation(args), verbose).await,
        Command::Buy(args) => buy(&ctx, &args).await,
        Command::Token(command) => token(ctx, command).await,
    }
}

/// Cancellation token cancelled on Ctrl-C.
fn interrupt_token() -> CancellationToken {
    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, finishing in-flight requests");
            trigger.cancel();
        }
    });
    cancel
}

async fn balance(ctx: &AppContext) -> Result<()> {
    let profile = ctx.client()?.me().await.context("fetching balance")?;
    println!("Account: {}", profile.username());
    println!("Balance: {:.2} RUB", profile.balance);
    println!("{}", output::rate_limit_line(profile.rate_limit));
    Ok(())
}

async fn check(ctx: &AppContext) -> Result<()> {
    let client = ctx.client()?;
    println!("API: {}", client.endpoints.base);

    let started = Instant::now();
    let status = client.reachable().await.context("API is unreachable")?;
    println!("Reachable: HTTP {status} in {} ms", started.elapsed().as_millis());

    let started = Instant::now();
    let profile = client.me().await.context("token check failed")?;
    println!(
        "Token valid: {} ({} ms)",
        profile.username(),
        started.elapsed().as_millis()
    );
    println!("Balance: {:.2} RUB", profile.balance);
    println!("{}", output::rate_limit_line(profile.rate_limit));
    Ok(())
}

/// Builds the password rotation job from its arguments.
fn password_change_operation(args: ChangePasswordArgs) -> BulkOperation {
    BulkOperation::PasswordChange(
        PasswordChangeJob::new(args.accounts, args.new_password).outputs(args.results, args.roster),
    )
}

/// Builds the letter fetch job from its arguments.
fn letters_operation(args: LettersArgs) -> BulkOperation {
    let mut filter = LetterFilter::new();
    if let Some(search) = args.search {
        filter = filter.with_search(search);
    }
    if args.starred {
        filter = filter.starred_only();
    }

    let save_dir = (!args.no_save).then_some(args.out);
    BulkOperation::FetchLetters(LetterJob::new(args.accounts, filter).save_dir(save_dir))
}

async fn run_bulk(ctx: &AppContext, operation: BulkOperation, verbose: bool) -> Result<()> {
    let runner = ctx.runner()?;

    let report = runner
        .run(operation, &mut ConsoleObserver::new(verbose), &interrupt_token())
        .await?;
    match &report {
        JobReport::PasswordChange(summary) => output::print_password_summary(summary),
        JobReport::FetchLetters(summary) => output::print_letter_summary(summary),
    }

    if report.interrupted() {
        bail!("run interrupted");
    }
    Ok(())
}

async fn buy(ctx: &AppContext, args: &BuyArgs) -> Result<()> {
    let client = ctx.client()?;
    let email_type = EmailType::from(args.kind);

    let before = client.me().await.context("fetching balance")?;
    println!("Balance: {:.2} RUB", before.balance);
    println!("Buying {} {} mailboxes", args.count, email_type.display_name());

    let emails = client
        .buy_emails(args.count, email_type)
        .await
        .context("purchase failed")?;
    if emails.is_empty() {
        println!("No mailboxes returned");
        return Ok(());
    }

    let path = export::write_purchases(&args.out, &emails, &chrono::Local::now()).await?;
    for email in &emails {
        println!("  {email}");
    }
    println!("Purchased {} mailboxes, saved to {}", emails.len(), path.display());

    match client.me().await {
        Ok(after) => println!("Balance: {:.2} RUB", after.balance),
        Err(e) => warn!("Could not refresh balance: {e}"),
    }
    Ok(())
}

async fn token(mut ctx: AppContext, command: TokenCommand) -> Result<()> {
    match command {
        TokenCommand::Set { token, keyring } => {
            if token.trim().is_empty() {
                bail!("token must not be empty");
            }
            if keyring {
                credentials::store_api_token(&token)?;
                println!("Token stored in system keyring");
            } else {
                ctx.settings.api_key = Some(token.trim().to_string());
                ctx.settings.save(&ctx.settings_path).await?;
                println!("Token stored in {}", ctx.settings_path.display());
            }
        }
        TokenCommand::Clear => {
            if let Err(e) = credentials::delete_api_token() {
                warn!("Could not clear keyring entry: {e}");
            }
            if ctx.settings.api_key.take().is_some() {
                ctx.settings.save(&ctx.settings_path).await?;
            }
            println!("Token cleared");
        }
    }
    Ok(())
}
