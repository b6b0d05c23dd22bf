//! Run artifacts written to disk.
//!
//! - results file: successful `email:new_secret` pairs
//! - roster file: every input record with its current secret, in file order
//! - letters directory: one subdirectory per mailbox, one file per letter
//! - mail manifest: mailboxes that returned letters
//! - purchase file: purchased `email:password` combinations

use std::collections::{HashMap, HashSet};
use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use chrono::{DateTime, TimeZone};
use mailbatch_api::Letter;
use tracing::debug;

use crate::account::AccountRecord;
use crate::error::Result;
use crate::report::RunReport;

/// Default name of the results file.
pub const RESULTS_FILE: &str = "updated.txt";

/// Default name of the roster file.
pub const ROSTER_FILE: &str = "updated_mail.txt";

/// Default letters directory.
pub const LETTERS_DIR: &str = "emails_with_letters";

/// Name of the manifest inside the letters directory.
pub const MAIL_MANIFEST_FILE: &str = "accounts_with_mail.txt";

/// Lines of the results file: successful records with the new secret, in
/// arrival order.
#[must_use]
pub fn result_lines<T>(report: &RunReport<T>, new_secret: &str) -> Vec<String> {
    report
        .successes()
        .map(|o| format!("{}:{new_secret}", o.email))
        .collect()
}

/// Lines of the roster file.
///
/// One line per input record, in input order: the new secret when the
/// record's operation succeeded, its original secret otherwise.
#[must_use]
pub fn roster_lines<T>(
    records: &[AccountRecord],
    report: &RunReport<T>,
    new_secret: &str,
) -> Vec<String> {
    let succeeded: HashSet<&str> = report.successes().map(|o| o.email.as_str()).collect();
    records
        .iter()
        .map(|record| {
            if succeeded.contains(record.email.as_str()) {
                record.line_with(new_secret)
            } else {
                record.line_with(&record.secret)
            }
        })
        .collect()
}

/// Lines of the mail manifest: `email:secret (N letters)`.
#[must_use]
pub fn manifest_lines(records: &[AccountRecord], report: &RunReport<Vec<Letter>>) -> Vec<String> {
    let secrets: HashMap<&str, &str> = records
        .iter()
        .map(|r| (r.email.as_str(), r.secret.as_str()))
        .collect();

    report
        .with_mail()
        .map(|(email, letters)| {
            let secret = secrets.get(email).copied().unwrap_or_default();
            format!("{email}:{secret} ({} letters)", letters.len())
        })
        .collect()
}

/// Writes the results file. Returns the number of lines written.
///
/// # Errors
///
/// Returns an error if the file cannot be written.
pub async fn write_results<T>(
    path: impl AsRef<Path>,
    report: &RunReport<T>,
    new_secret: &str,
) -> Result<usize> {
    let lines = result_lines(report, new_secret);
    write_lines(path.as_ref(), &lines).await?;
    Ok(lines.len())
}

/// Writes the roster file. Returns the number of lines written.
///
/// # Errors
///
/// Returns an error if the file cannot be written.
pub async fn write_roster<T>(
    path: impl AsRef<Path>,
    records: &[AccountRecord],
    report: &RunReport<T>,
    new_secret: &str,
) -> Result<usize> {
    let lines = roster_lines(records, report, new_secret);
    write_lines(path.as_ref(), &lines).await?;
    Ok(lines.len())
}

/// Writes the mail manifest into `dir`. Returns the manifest path.
///
/// # Errors
///
/// Returns an error if the directory or file cannot be written.
pub async fn write_mail_manifest(
    dir: impl AsRef<Path>,
    records: &[AccountRecord],
    report: &RunReport<Vec<Letter>>,
) -> Result<PathBuf> {
    let dir = dir.as_ref();
    tokio::fs::create_dir_all(dir).await?;
    let path = dir.join(MAIL_MANIFEST_FILE);
    write_lines(&path, &manifest_lines(records, report)).await?;
    Ok(path)
}

/// Directory name for a mailbox: `@` becomes `_at_`, every other character
/// outside `[A-Za-z0-9_-]` becomes `_`. The result is always a single plain
/// path component.
#[must_use]
pub fn mailbox_dir_name(email: &str) -> String {
    let mut name = String::with_capacity(email.len() + 3);
    for c in email.chars() {
        match c {
            '@' => name.push_str("_at_"),
            c if c.is_ascii_alphanumeric() || c == '-' || c == '_' => name.push(c),
            _ => name.push('_'),
        }
    }
    name
}

/// File name for the `index`-th (0-based) letter of a mailbox.
#[must_use]
pub fn letter_file_name(index: usize, letter: &Letter) -> String {
    let short_id: String = letter
        .id()
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '-' || *c == '_')
        .take(8)
        .collect();
    format!("letter_{}_{short_id}.txt", index + 1)
}

/// Renders a letter as plain text (no HTML).
#[must_use]
pub fn render_letter(letter: &Letter) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "From: {} <{}>", letter.sender_name(), letter.sender());
    let _ = writeln!(
        out,
        "Date: {}",
        letter.received_at().format("%Y-%m-%d %H:%M:%S")
    );
    let _ = writeln!(out, "Subject: {}", letter.subject());
    let _ = writeln!(out, "Starred: {}", if letter.star { "Yes" } else { "No" });
    let _ = write!(out, "\n{}\n\n", "=".repeat(80));
    out.push_str(letter.text());
    out
}

/// Saves every letter of one mailbox under `dir`. Returns the mailbox directory.
///
/// # Errors
///
/// Returns an error if a directory or file cannot be written.
pub async fn save_letters(
    dir: impl AsRef<Path>,
    email: &str,
    letters: &[Letter],
) -> Result<PathBuf> {
    let mailbox_dir = dir.as_ref().join(mailbox_dir_name(email));
    tokio::fs::create_dir_all(&mailbox_dir).await?;

    for (index, letter) in letters.iter().enumerate() {
        let path = mailbox_dir.join(letter_file_name(index, letter));
        tokio::fs::write(&path, render_letter(letter)).await?;
    }

    debug!(%email, letters = letters.len(), dir = %mailbox_dir.display(), "Saved letters");
    Ok(mailbox_dir)
}

/// File name for a purchase made at `at`.
#[must_use]
pub fn purchase_file_name<Tz: TimeZone>(at: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    format!("purchased_emails_{}.txt", at.format("%Y%m%d_%H%M%S"))
}

/// Writes purchased combinations into `dir`. Returns the file path.
///
/// # Errors
///
/// Returns an error if the file cannot be written.
pub async fn write_purchases<Tz: TimeZone>(
    dir: impl AsRef<Path>,
    emails: &[String],
    at: &DateTime<Tz>,
) -> Result<PathBuf>
where
    Tz::Offset: std::fmt::Display,
{
    let dir = dir.as_ref();
    tokio::fs::create_dir_all(dir).await?;
    let path = dir.join(purchase_file_name(at));
    write_lines(&path, emails).await?;
    Ok(path)
}

async fn write_lines(path: &Path, lines: &[String]) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await?;
    }

    let mut contents = String::with_capacity(lines.iter().map(|l| l.len() + 1).sum());
    for line in lines {
        contents.push_str(line);
        contents.push('\n');
    }
    tokio::fs::write(path, contents).await?;
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::outcome::{FailureKind, Outcome};
    use crate::report::Aggregator;
    use chrono::Utc;
    use mailbatch_api::LetterBody;

    fn password_report() -> (Vec<AccountRecord>, RunReport<()>) {
        let records = vec![
            AccountRecord::new("a@example.com", "old-a"),
            AccountRecord::new("b@example.com", "old-b"),
            AccountRecord::new("c@example.com", "old-c"),
        ];
        let mut aggregator = Aggregator::new();
        // Arrival order differs from file order.
        aggregator.record(Outcome::success("c@example.com", "ok", None));
        aggregator.record(Outcome::failure("b@example.com", FailureKind::Unauthorized, "no"));
        aggregator.record(Outcome::success("a@example.com", "ok", None));
        (records, aggregator.finalize())
    }

    fn letter(id: &str) -> Letter {
        Letter {
            id: Some(id.to_string()),
            sender: Some("noreply@shop.example".to_string()),
            sender_name: Some("Shop".to_string()),
            subject: Some("Your order".to_string()),
            date: 1_700_000_000,
            star: true,
            letter: Some(LetterBody {
                text: Some("Thanks for your order.".to_string()),
                html: Some("<p>Thanks</p>".to_string()),
            }),
        }
    }

    #[test]
    fn test_result_lines_only_successes() {
        let (_, report) = password_report();
        assert_eq!(
            result_lines(&report, "new"),
            vec!["c@example.com:new", "a@example.com:new"]
        );
    }

    #[test]
    fn test_roster_keeps_file_order_and_old_secrets() {
        let (records, report) = password_report();
        assert_eq!(
            roster_lines(&records, &report, "new"),
            vec!["a@example.com:new", "b@example.com:old-b", "c@example.com:new"]
        );
    }

    #[test]
    fn test_roster_for_interrupted_run_keeps_pending_secrets() {
        let records = vec![
            AccountRecord::new("a@example.com", "old-a"),
            AccountRecord::new("b@example.com", "old-b"),
        ];
        let mut aggregator = Aggregator::new();
        aggregator.record(Outcome::<()>::success("a@example.com", "ok", None));
        let report = aggregator.finalize();

        assert_eq!(
            roster_lines(&records, &report, "new"),
            vec!["a@example.com:new", "b@example.com:old-b"]
        );
    }

    #[test]
    fn test_mailbox_dir_name() {
        assert_eq!(mailbox_dir_name("john.doe@mail.example.com"), "john_doe_at_mail_example_com");
    }

    #[test]
    fn test_mailbox_dir_name_is_single_component() {
        for email in ["/tmp/victim@x", "..\\..\\evil@x", "../up@x", "a/b@c.d"] {
            let name = mailbox_dir_name(email);
            assert!(!name.contains(['/', '\\']), "{name}");
            assert_ne!(name, "..");
            assert_eq!(Path::new(&name).components().count(), 1);
        }
        assert_eq!(mailbox_dir_name("/tmp/victim@x"), "_tmp_victim_at_x");
    }

    #[test]
    fn test_letter_file_name() {
        assert_eq!(letter_file_name(0, &letter("abcdef1234567")), "letter_1_abcdef12.txt");
        assert_eq!(letter_file_name(4, &Letter::default()), "letter_5_unknown.txt");
        assert_eq!(letter_file_name(1, &letter("../../x")), "letter_2_x.txt");
    }

    #[test]
    fn test_render_letter() {
        let rendered = render_letter(&letter("abc"));
        let expected = format!(
            "From: Shop <noreply@shop.example>\nDate: 2023-11-14 22:13:20\nSubject: Your order\nStarred: Yes\n\n{}\n\nThanks for your order.",
            "=".repeat(80)
        );
        assert_eq!(rendered, expected);
    }

    #[test]
    fn test_manifest_lines() {
        let records = vec![
            AccountRecord::new("a@example.com", "pw-a"),
            AccountRecord::new("b@example.com", "pw-b"),
        ];
        let mut aggregator = Aggregator::new();
        aggregator.record(Outcome::success("b@example.com", "2", Some(vec![letter("1"), letter("2")])));
        aggregator.record(Outcome::success("a@example.com", "0", Some(Vec::new())));
        let report = aggregator.finalize();

        assert_eq!(
            manifest_lines(&records, &report),
            vec!["b@example.com:pw-b (2 letters)"]
        );
    }

    #[test]
    fn test_purchase_file_name() {
        let at = Utc.with_ymd_and_hms(2024, 3, 9, 14, 5, 7).unwrap();
        assert_eq!(purchase_file_name(&at), "purchased_emails_20240309_140507.txt");
    }

    #[tokio::test]
    async fn test_write_files() {
        let dir = tempfile::tempdir().unwrap();
        let (records, report) = password_report();

        let results = dir.path().join("out").join(RESULTS_FILE);
        let roster = dir.path().join(ROSTER_FILE);
        assert_eq!(write_results(&results, &report, "new").await.unwrap(), 2);
        assert_eq!(write_roster(&roster, &records, &report, "new").await.unwrap(), 3);

        let written = tokio::fs::read_to_string(&roster).await.unwrap();
        assert_eq!(written, "a@example.com:new\nb@example.com:old-b\nc@example.com:new\n");
        assert!(results.exists());
    }

    #[tokio::test]
    async fn test_save_letters() {
        let dir = tempfile::tempdir().unwrap();
        let letters = vec![letter("first-letter"), letter("second")];

        let mailbox = save_letters(dir.path(), "a@example.com", &letters).await.unwrap();
        assert_eq!(mailbox, dir.path().join("a_at_example_com"));

        let first = tokio::fs::read_to_string(mailbox.join("letter_1_first-le.txt"))
            .await
            .unwrap();
        assert!(first.starts_with("From: Shop <noreply@shop.example>\n"));
        assert!(mailbox.join("letter_2_second.txt").exists());
    }

    #[tokio::test]
    async fn test_save_letters_stays_inside_save_dir() {
        let save = tempfile::tempdir().unwrap();
        let elsewhere = tempfile::tempdir().unwrap();
        let email = format!("{}/victim@x", elsewhere.path().display());

        let mailbox = save_letters(save.path(), &email, &[letter("abc")]).await.unwrap();
        assert!(mailbox.starts_with(save.path()));
        assert_eq!(mailbox.parent(), Some(save.path()));
        assert!(std::fs::read_dir(elsewhere.path()).unwrap().next().is_none());
    }

    #[tokio::test]
    async fn test_write_purchases() {
        let dir = tempfile::tempdir().unwrap();
        let at = Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap();
        let emails = vec!["x@example.com:p1".to_string(), "y@example.com:p2".to_string()];

        let path = write_purchases(dir.path(), &emails, &at).await.unwrap();
        assert_eq!(path.file_name().unwrap(), "purchased_emails_20240102_030405.txt");
        let contents = tokio::fs::read_to_string(path).await.unwrap();
        assert_eq!(contents, "x@example.com:p1\ny@example.com:p2\n");
    }
}
