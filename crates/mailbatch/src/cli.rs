//! Command line arguments.

use std::path::PathBuf;

use clap::builder::RangedU64ValueParser;
use clap::{Args, Parser, Subcommand, ValueEnum};
use mailbatch_api::EmailType;
use mailbatch_core::export;

/// Bulk operations on `NotLetters` mailboxes.
#[derive(Debug, Parser)]
#[command(name = "mailbatch", version, about)]
pub struct Cli {
    /// API token (overrides keyring and config file).
    #[arg(long, global = true, env = "MAILBATCH_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// Provider base URL.
    #[arg(long, global = true, env = "MAILBATCH_BASE_URL")]
    pub base_url: Option<String>,

    /// Accounts processed per one-second chunk (1-10).
    #[arg(
        long,
        global = true,
        value_parser = RangedU64ValueParser::<usize>::new().range(1..=10)
    )]
    pub concurrency: Option<usize>,

    /// Settings file.
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Also print chunk boundaries and pacing waits.
    #[arg(long, short, global = true)]
    pub verbose: bool,

    /// Command to run.
    #[command(subcommand)]
    pub command: Command,
}

/// Subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Show account name and balance.
    Balance,
    /// Verify the token and measure API latency.
    Check,
    /// Change the password of every account in a file.
    ChangePassword(ChangePasswordArgs),
    /// Fetch the letters of every account in a file.
    Letters(LettersArgs),
    /// Buy new mailboxes.
    Buy(BuyArgs),
    /// Manage the stored API token.
    #[command(subcommand)]
    Token(TokenCommand),
}

/// Arguments of `change-password`.
#[derive(Debug, Args)]
pub struct ChangePasswordArgs {
    /// Account file with one `email:password` per line.
    #[arg(long, short)]
    pub accounts: PathBuf,

    /// New password for every account.
    #[arg(long, env = "MAILBATCH_NEW_PASSWORD", hide_env_values = true)]
    pub new_password: String,

    /// Successful `email:new_password` lines.
    #[arg(long, default_value = export::RESULTS_FILE)]
    pub results: PathBuf,

    /// Every account with its current password.
    #[arg(long, default_value = export::ROSTER_FILE)]
    pub roster: PathBuf,
}

/// Arguments of `letters`.
#[derive(Debug, Args)]
pub struct LettersArgs {
    /// Account file with one `email:password` per line.
    #[arg(long, short)]
    pub accounts: PathBuf,

    /// Only letters matching this text.
    #[arg(long)]
    pub search: Option<String>,

    /// Only starred letters.
    #[arg(long)]
    pub starred: bool,

    /// Directory letters are saved into.
    #[arg(long, default_value = export::LETTERS_DIR)]
    pub out: PathBuf,

    /// Print the summary without saving letters.
    #[arg(long, conflicts_with = "out")]
    pub no_save: bool,
}

/// Arguments of `buy`.
#[derive(Debug, Args)]
pub struct BuyArgs {
    /// Number of mailboxes.
    #[arg(long, short, value_parser = clap::value_parser!(u32).range(1..))]
    pub count: u32,

    /// Mailbox type.
    #[arg(long = "type", value_enum, default_value_t = MailboxKind::Limited)]
    pub kind: MailboxKind,

    /// Directory the purchase file is written to.
    #[arg(long, default_value = ".")]
    pub out: PathBuf,
}

/// Mailbox type as typed on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum MailboxKind {
    /// Limited mailboxes.
    Limited,
    /// Unlimited mailboxes.
    Unlimited,
    /// RU zone mailboxes.
    Ru,
    /// Personal mailboxes.
    Personal,
}

impl From<MailboxKind> for EmailType {
    fn from(kind: MailboxKind) -> Self {
        match kind {
            MailboxKind::Limited => Self::Limited,
            MailboxKind::Unlimited => Self::Unlimited,
            MailboxKind::Ru => Self::RuZone,
            MailboxKind::Personal => Self::Personal,
        }
    }
}

/// Token subcommands.
#[derive(Debug, Subcommand)]
pub enum TokenCommand {
    /// Store a token.
    Set {
        /// The API token.
        token: String,
        /// Store in the system keyring instead of the config file.
        #[arg(long)]
        keyring: bool,
    },
    /// Remove the token from the keyring and the config file.
    Clear,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_change_password() {
        let cli = Cli::try_parse_from([
            "mailbatch",
            "--concurrency",
            "3",
            "change-password",
            "-a",
            "accounts.txt",
            "--new-password",
            "s3cret",
        ])
        .unwrap();

        assert_eq!(cli.concurrency, Some(3));
        assert!(!cli.verbose);
        let Command::ChangePassword(args) = cli.command else {
            panic!("expected change-password");
        };
        assert_eq!(args.accounts, PathBuf::from("accounts.txt"));
        assert_eq!(args.results, PathBuf::from("updated.txt"));
        assert_eq!(args.roster, PathBuf::from("updated_mail.txt"));
    }

    #[test]
    fn test_concurrency_range() {
        let result = Cli::try_parse_from(["mailbatch", "--concurrency", "11", "balance"]);
        assert!(result.is_err());
        let result = Cli::try_parse_from(["mailbatch", "--concurrency", "0", "balance"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_parse_buy() {
        let cli = Cli::try_parse_from(["mailbatch", "buy", "--count", "5", "--type", "ru"]).unwrap();
        let Command::Buy(args) = cli.command else {
            panic!("expected buy");
        };
        assert_eq!(args.count, 5);
        assert_eq!(EmailType::from(args.kind), EmailType::RuZone);

        assert!(Cli::try_parse_from(["mailbatch", "buy", "--count", "0"]).is_err());
    }

    #[test]
    fn test_parse_letters_no_save() {
        let cli =
            Cli::try_parse_from(["mailbatch", "letters", "-a", "a.txt", "--starred", "--no-save"])
                .unwrap();
        let Command::Letters(args) = cli.command else {
            panic!("expected letters");
        };
        assert!(args.starred);
        assert!(args.no_save);
    }

    #[test]
    fn test_verbose_is_global() {
        let cli = Cli::try_parse_from(["mailbatch", "letters", "-a", "a.txt", "--verbose"]).unwrap();
        assert!(cli.verbose);
        let cli = Cli::try_parse_from(["mailbatch", "-v", "balance"]).unwrap();
        assert!(cli.verbose);
    }
}
