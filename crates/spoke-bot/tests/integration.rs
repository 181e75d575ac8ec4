use assert_cmd::Command;
use predicates::prelude::*;

fn spoke() -> Command {
    Command::cargo_bin("spoke").unwrap()
}

// ---------------------------------------------------------------------------
// Startup surface
// ---------------------------------------------------------------------------

#[test]
fn missing_token_is_fatal_with_instructions() {
    spoke()
        .env_remove("TELEGRAM_BOT_TOKEN")
        .assert()
        .failure()
        .stderr(predicate::str::contains("TELEGRAM_BOT_TOKEN"))
        .stderr(predicate::str::contains("export TELEGRAM_BOT_TOKEN"));
}

#[test]
fn empty_token_is_treated_as_missing() {
    spoke()
        .env("TELEGRAM_BOT_TOKEN", "")
        .assert()
        .failure()
        .stderr(predicate::str::contains("TELEGRAM_BOT_TOKEN"));
}

#[test]
fn help_documents_the_flags() {
    spoke()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("--data-file"))
        .stdout(predicate::str::contains("--poll-timeout"));
}
