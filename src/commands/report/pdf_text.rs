use std::fs;
use std::io::{self, Read};
use std::path::Path;
use std::process::Command;

use anyhow::{Context, Result, bail};
use tracing::info;

use crate::cli::InputArgs;
use crate::util::{is_stdin_marker, sha256_file, spool_reader};

/// Plain text of the picking document plus what the run manifest records about it.
#[derive(Debug, Clone)]
pub struct SourceDocument {
    pub label: String,
    pub sha256: Option<String>,
    pub text: String,
}

pub fn read_source(args: &InputArgs) -> Result<SourceDocument> {
    if is_stdin_marker(&args.input) {
        return read_stdin_source(args.from_text);
    }

    let path = args.input.as_path();
    let sha256 = sha256_file(path)?;
    let text = if args.from_text {
        fs::read_to_string(path)
            .with_context(|| format!("failed to read text input {}", path.display()))?
    } else {
        extract_document_text(path)?
    };

    Ok(SourceDocument {
        label: path.display().to_string(),
        sha256: Some(sha256),
        text,
    })
}

fn read_stdin_source(from_text: bool) -> Result<SourceDocument> {
    if from_text {
        let mut text = String::new();
        io::stdin()
            .lock()
            .read_to_string(&mut text)
            .context("failed to read text input from stdin")?;
        return Ok(SourceDocument {
            label: "-".to_string(),
            sha256: None,
            text,
        });
    }

    // pdftotext needs a file; the spooled copy is removed when `upload` drops.
    let upload = spool_reader(io::stdin().lock(), "upload.pdf")?;
    let sha256 = sha256_file(upload.path())?;
    let text = extract_document_text(upload.path())?;

    Ok(SourceDocument {
        label: "-".to_string(),
        sha256: Some(sha256),
        text,
    })
}

/// Text of every page in reading order, pages joined by a newline.
pub fn extract_document_text(pdf_path: &Path) -> Result<String> {
    let pages = extract_pages_with_pdftotext(pdf_path)?;
    info!(path = %pdf_path.display(), pages = pages.len(), "extracted document text");
    Ok(pages.join("\n"))
}

fn extract_pages_with_pdftotext(pdf_path: &Path) -> Result<Vec<String>> {
    let output = Command::new("pdftotext")
        .arg("-enc")
        .arg("UTF-8")
        .arg(pdf_path)
        .arg("-")
        .output()
        .with_context(|| format!("failed to execute pdftotext for {}", pdf_path.display()))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        bail!(
            "pdftotext could not decode {}: {}",
            pdf_path.display(),
            stderr.trim()
        );
    }

    Ok(split_pages(&String::from_utf8_lossy(&output.stdout)))
}

/// Splits pdftotext output on form feeds, dropping NULs and trailing blank pages.
pub fn split_pages(raw: &str) -> Vec<String> {
    let mut pages = raw
        .split('\u{000C}')
        .map(|chunk| chunk.replace('\u{0000}', ""))
        .collect::<Vec<String>>();

    while pages.last().is_some_and(|page| page.trim().is_empty()) {
        pages.pop();
    }

    pages
}
