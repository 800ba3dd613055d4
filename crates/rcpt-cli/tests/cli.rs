use std::fs;
use std::path::{Path, PathBuf};

use assert_cmd::Command;
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, Stream};
use predicates::prelude::*;
use tempfile::TempDir;

fn rcpt(dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("rcpt").unwrap();
    cmd.env("XDG_CONFIG_HOME", dir.path());
    cmd
}

fn rcpt_with_config(dir: &TempDir) -> Command {
    let mut cmd = rcpt(dir);
    cmd.arg("-c").arg(dir.path().join("config.json"));
    cmd
}

/// Write a one-page PDF whose only content is a Helvetica text layer.
fn text_pdf(dir: &Path, lines: &[&str]) -> PathBuf {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
        "Encoding" => "WinAnsiEncoding",
    });

    let mut operations = Vec::new();
    for (i, line) in lines.iter().enumerate() {
        let y = 700 - 20 * i as i64;
        operations.extend([
            Operation::new("BT", vec![]),
            Operation::new("Tf", vec!["F1".into(), 12.into()]),
            Operation::new("Td", vec![72.into(), y.into()]),
            Operation::new("Tj", vec![Object::string_literal(*line)]),
            Operation::new("ET", vec![]),
        ]);
    }
    let content = Content { operations }.encode().unwrap();
    let content_id = doc.add_object(Stream::new(dictionary! {}, content));

    let page_id = doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => pages_id,
        "Contents" => content_id,
    });
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => vec![Object::Reference(page_id)],
            "Count" => 1,
            "MediaBox" => vec![
                Object::Integer(0),
                Object::Integer(0),
                Object::Integer(612),
                Object::Integer(792),
            ],
            "Resources" => dictionary! {
                "Font" => dictionary! { "F1" => font_id },
            },
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let path = dir.join("receipt.pdf");
    doc.save(&path).unwrap();
    path
}

#[test]
fn list_on_empty_database() {
    let dir = TempDir::new().unwrap();

    rcpt(&dir)
        .args(["list", "--db"])
        .arg(dir.path().join("receipts.db"))
        .assert()
        .success()
        .stdout(predicate::str::contains("No receipts saved yet."));
}

#[test]
fn list_json_on_empty_database() {
    let dir = TempDir::new().unwrap();

    rcpt(&dir)
        .args(["list", "--format", "json", "--db"])
        .arg(dir.path().join("receipts.db"))
        .assert()
        .success()
        .stdout(predicate::str::contains("[]"));
}

#[test]
fn report_json_on_empty_database() {
    let dir = TempDir::new().unwrap();

    rcpt(&dir)
        .args(["report", "--format", "json", "--db"])
        .arg(dir.path().join("receipts.db"))
        .assert()
        .success()
        .stdout(predicate::str::contains("\"receipts\": 0"));
}

#[test]
fn scan_rejects_unsupported_file() {
    let dir = TempDir::new().unwrap();
    let notes = dir.path().join("notes.txt");
    fs::write(&notes, "Total: 12.00").unwrap();

    rcpt(&dir)
        .arg("scan")
        .arg(&notes)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unsupported file format: txt"));
}

#[test]
fn scan_reports_missing_input() {
    let dir = TempDir::new().unwrap();

    rcpt(&dir)
        .arg("scan")
        .arg(dir.path().join("missing.png"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("Input file not found"));
}

#[test]
fn scan_unreadable_image_fails_without_saving() {
    let dir = TempDir::new().unwrap();
    let image = dir.path().join("receipt.png");
    fs::write(&image, b"not really a png").unwrap();
    let db = dir.path().join("receipts.db");

    rcpt(&dir)
        .arg("scan")
        .arg(&image)
        .args(["--save", "--model-dir"])
        .arg(dir.path().join("models"))
        .arg("--db")
        .arg(&db)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Extraction failed"));

    assert!(!db.exists());
}

#[test]
fn config_init_then_get_and_set() {
    let dir = TempDir::new().unwrap();

    rcpt_with_config(&dir)
        .args(["config", "init"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Created configuration file"));

    rcpt_with_config(&dir)
        .args(["config", "set", "extraction.currency", "EUR"])
        .assert()
        .success();

    rcpt_with_config(&dir)
        .args(["config", "get", "extraction.currency"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"EUR\""));

    rcpt_with_config(&dir)
        .args(["config", "set", "extraction.amount_policy", "sometimes"])
        .assert()
        .failure();
}

#[test]
fn config_path_reports_missing_file() {
    let dir = TempDir::new().unwrap();

    rcpt_with_config(&dir)
        .args(["config", "path"])
        .assert()
        .success()
        .stdout(predicate::str::contains("not created"));
}

#[test]
fn scan_text_pdf_saves_and_lists() {
    let dir = TempDir::new().unwrap();
    let pdf = text_pdf(
        dir.path(),
        &["Store: Fresh Basket", "15/03/2024", "Milk 4.50", "Total: 9.99"],
    );
    let db = dir.path().join("receipts.db");

    rcpt(&dir)
        .arg("scan")
        .arg(&pdf)
        .args(["--save", "--model-dir"])
        .arg(dir.path().join("models"))
        .arg("--db")
        .arg(&db)
        .assert()
        .success()
        .stdout(predicate::str::contains("Saved receipt #1"));

    rcpt(&dir)
        .args(["list", "--format", "json", "--db"])
        .arg(&db)
        .assert()
        .success()
        .stdout(predicate::str::contains("Fresh Basket"))
        .stdout(predicate::str::contains("\"amount\": \"9.99\""))
        .stdout(predicate::str::contains("\"transaction_date\": \"2024-03-15\""));
}

#[test]
fn scan_save_without_total_reports_missing_amount() {
    let dir = TempDir::new().unwrap();
    let pdf = text_pdf(dir.path(), &["Store: Fresh Basket", "15/03/2024", "Milk 4.50"]);
    let db = dir.path().join("receipts.db");

    rcpt(&dir)
        .arg("scan")
        .arg(&pdf)
        .args(["--save", "--model-dir"])
        .arg(dir.path().join("models"))
        .arg("--db")
        .arg(&db)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Receipt not saved"))
        .stderr(predicate::str::contains("missing or invalid amount"));

    assert!(!db.exists());
}
