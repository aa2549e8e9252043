//! crates/tube_quiz_core/src/package.rs
//!
//! The Package Assembler: clones the template's donor question once per draft and
//! rewrites the archive with only the content descriptor replaced.

use crate::domain::QuestionDraft;
use crate::error::PackageError;
use crate::template::{ContentDocument, DonorQuestion, GeneratedQuestion, CONTENT_DESCRIPTOR_PATH};
use serde_json::{Map, Value};
use std::collections::HashSet;
use std::fs::File;
use std::io::{BufReader, BufWriter, Cursor, Read, Seek, Write};
use std::path::Path;
use tempfile::NamedTempFile;
use tracing::{debug, info, warn};
use uuid::Uuid;
use zip::read::ZipFile;
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

/// Upper bound on the uncompressed size of `content/content.json`. Archive
/// headers declare sizes freely, so neither the declared nor the decoded size is
/// trusted past this.
pub const MAX_DESCRIPTOR_BYTES: u64 = 32 * 1024 * 1024;

fn invalid(msg: impl Into<String>) -> PackageError {
    PackageError::InvalidTemplate(msg.into())
}

fn packaging(msg: impl Into<String>) -> PackageError {
    PackageError::PackagingFailed(msg.into())
}

/// The title given to the question at 1-based position `ordinal`.
pub fn question_label(ordinal: usize) -> String {
    format!("Question {ordinal}")
}

//=========================================================================================
// Question Cloning
//=========================================================================================

/// Deep-copies `template` and overwrites the question text, the answers, the
/// titles and the `subContentId`. Everything else is carried through unchanged.
///
/// Every answer is a clone of the template's first answer entry; one is produced
/// per supplied answer text, whatever their number.
pub fn clone_question_from_template(
    template: &DonorQuestion,
    draft: &QuestionDraft,
    ordinal: usize,
) -> GeneratedQuestion {
    clone_with_id(template, draft, ordinal, Uuid::new_v4().to_string())
}

fn clone_with_id(
    template: &DonorQuestion,
    draft: &QuestionDraft,
    ordinal: usize,
    sub_content_id: String,
) -> GeneratedQuestion {
    let mut tree = template.as_map().clone();

    let answers = draft
        .answer_texts
        .iter()
        .enumerate()
        .map(|(idx, text)| {
            let mut answer = template.answer_donor().clone();
            answer.insert("text".to_string(), Value::String(text.clone()));
            answer.insert("correct".to_string(), Value::Bool(idx == draft.correct_index));
            Value::Object(answer)
        })
        .collect();

    if let Some(Value::Object(params)) = tree.get_mut("params") {
        params.insert(
            "question".to_string(),
            Value::String(draft.question_text.clone()),
        );
        params.insert("answers".to_string(), Value::Array(answers));
    }

    let label = question_label(ordinal);
    let metadata = tree
        .entry("metadata")
        .or_insert_with(|| Value::Object(Map::new()));
    if let Value::Object(metadata) = metadata {
        metadata.insert("title".to_string(), Value::String(label.clone()));
        metadata.insert("extraTitle".to_string(), Value::String(label));
    }

    tree.insert("subContentId".to_string(), Value::String(sub_content_id));
    GeneratedQuestion::from_tree(tree)
}

/// A random identifier not yet present in `taken`; it is added before returning.
fn fresh_sub_content_id(taken: &mut HashSet<String>) -> String {
    loop {
        let id = Uuid::new_v4().to_string();
        if taken.insert(id.clone()) {
            return id;
        }
    }
}

/// Clones the donor once per draft, in draft order, with identifiers that are
/// pairwise distinct and distinct from every identifier already in `document`.
///
/// Every draft must mark exactly one of its answers as correct; the first one
/// that does not fails the whole build.
pub fn build_questions(
    document: &ContentDocument,
    drafts: &[QuestionDraft],
) -> Result<Vec<GeneratedQuestion>, PackageError> {
    for (i, draft) in drafts.iter().enumerate() {
        draft
            .validate()
            .map_err(|reason| PackageError::InvalidDraft(format!("question {}: {reason}", i + 1)))?;
    }
    let donor = document.donor_question()?;
    let mut taken = document.sub_content_ids();
    Ok(drafts
        .iter()
        .enumerate()
        .map(|(i, draft)| clone_with_id(&donor, draft, i + 1, fresh_sub_content_id(&mut taken)))
        .collect())
}

//=========================================================================================
// Archive Rewrite
//=========================================================================================

/// In-memory variant of [`assemble_package_into`].
pub fn assemble_package(
    template: &[u8],
    drafts: &[QuestionDraft],
) -> Result<Vec<u8>, PackageError> {
    let output = assemble_package_into(Cursor::new(template), Cursor::new(Vec::new()), drafts)?;
    Ok(output.into_inner())
}

/// Streams every entry of the template archive into `writer`, substituting the
/// content descriptor with one holding a question per draft.
///
/// The template is fully validated before the first byte is written. Other
/// entries are copied raw, so their compressed bytes and header fields are kept.
pub fn assemble_package_into<R, W>(
    reader: R,
    writer: W,
    drafts: &[QuestionDraft],
) -> Result<W, PackageError>
where
    R: Read + Seek,
    W: Write + Seek,
{
    let mut archive = ZipArchive::new(reader)
        .map_err(|e| invalid(format!("cannot open template archive: {e}")))?;

    let mut document = ContentDocument::from_slice(&read_descriptor(&mut archive)?)?;
    if drafts.is_empty() {
        warn!("Assembling a package without any questions.");
    }
    let questions = build_questions(&document, drafts)?;
    info!(
        "Replacing {} template question(s) with {} generated question(s).",
        document.questions().len(),
        questions.len()
    );
    document.replace_questions(questions.into_iter().map(GeneratedQuestion::into_value).collect());
    let descriptor = document.to_vec()?;

    let mut zip_out = ZipWriter::new(writer);
    for index in 0..archive.len() {
        let entry = archive
            .by_index_raw(index)
            .map_err(|e| packaging(format!("cannot read template entry #{index}: {e}")))?;
        if entry.name() == CONTENT_DESCRIPTOR_PATH {
            let options = descriptor_options(&entry);
            zip_out
                .start_file(CONTENT_DESCRIPTOR_PATH, options)
                .map_err(|e| packaging(format!("cannot start {CONTENT_DESCRIPTOR_PATH}: {e}")))?;
            zip_out
                .write_all(&descriptor)
                .map_err(|e| packaging(format!("cannot write {CONTENT_DESCRIPTOR_PATH}: {e}")))?;
        } else {
            let name = entry.name().to_string();
            debug!("Copying entry {}", name);
            zip_out
                .raw_copy_file(entry)
                .map_err(|e| packaging(format!("cannot copy entry {name}: {e}")))?;
        }
    }

    zip_out
        .finish()
        .map_err(|e| packaging(format!("cannot finish output archive: {e}")))
}

fn read_descriptor<R: Read + Seek>(archive: &mut ZipArchive<R>) -> Result<Vec<u8>, PackageError> {
    let mut entry = archive.by_name(CONTENT_DESCRIPTOR_PATH).map_err(|e| match e {
        zip::result::ZipError::FileNotFound => {
            invalid(format!("template archive has no {CONTENT_DESCRIPTOR_PATH}"))
        }
        other => invalid(format!("cannot open {CONTENT_DESCRIPTOR_PATH}: {other}")),
    })?;
    if entry.size() > MAX_DESCRIPTOR_BYTES {
        return Err(invalid(format!(
            "{CONTENT_DESCRIPTOR_PATH} declares {} bytes (limit {MAX_DESCRIPTOR_BYTES})",
            entry.size()
        )));
    }

    let mut bytes = Vec::new();
    (&mut entry)
        .take(MAX_DESCRIPTOR_BYTES + 1)
        .read_to_end(&mut bytes)
        .map_err(|e| invalid(format!("cannot read {CONTENT_DESCRIPTOR_PATH}: {e}")))?;
    if bytes.len() as u64 > MAX_DESCRIPTOR_BYTES {
        return Err(invalid(format!(
            "{CONTENT_DESCRIPTOR_PATH} inflates past {MAX_DESCRIPTOR_BYTES} bytes"
        )));
    }
    Ok(bytes)
}

/// Header fields for the rewritten descriptor, taken from the original entry.
/// Methods this build cannot encode fall back to deflate.
fn descriptor_options(entry: &ZipFile<'_>) -> FileOptions {
    let method = match entry.compression() {
        CompressionMethod::Stored => CompressionMethod::Stored,
        _ => CompressionMethod::Deflated,
    };
    let options = FileOptions::default()
        .compression_method(method)
        .last_modified_time(entry.last_modified());
    match entry.unix_mode() {
        Some(mode) => options.unix_permissions(mode),
        None => options,
    }
}

//=========================================================================================
// Output Files
//=========================================================================================

/// Reads the template from disk and writes the package to `output_path`.
///
/// The archive is built in a temporary file next to `output_path` and only
/// renamed into place once complete; on any failure nothing is left there.
pub fn assemble_package_file(
    template_path: &Path,
    output_path: &Path,
    drafts: &[QuestionDraft],
) -> Result<(), PackageError> {
    let template = File::open(template_path).map_err(|e| {
        invalid(format!(
            "cannot open template {}: {e}",
            template_path.display()
        ))
    })?;

    let mut staged = stage_beside(output_path)?;
    let writer = assemble_package_into(
        BufReader::new(template),
        BufWriter::new(staged.as_file_mut()),
        drafts,
    )?;
    writer
        .into_inner()
        .map_err(|e| packaging(format!("cannot flush package: {}", e.error())))?;

    finalize(staged, output_path)
}

/// Writes already-assembled package bytes to `output_path` atomically.
pub fn write_package_atomically(output_path: &Path, bytes: &[u8]) -> Result<(), PackageError> {
    let mut staged = stage_beside(output_path)?;
    staged
        .write_all(bytes)
        .map_err(|e| packaging(format!("cannot write package: {e}")))?;
    finalize(staged, output_path)
}

fn stage_beside(output_path: &Path) -> Result<NamedTempFile, PackageError> {
    let dir = output_path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    tempfile::Builder::new()
        .prefix(".quiz-")
        .suffix(".part")
        .tempfile_in(dir)
        .map_err(|e| {
            packaging(format!(
                "cannot create temporary file in {}: {e}",
                dir.display()
            ))
        })
}

fn finalize(staged: NamedTempFile, output_path: &Path) -> Result<(), PackageError> {
    staged
        .as_file()
        .sync_all()
        .map_err(|e| packaging(format!("cannot sync package: {e}")))?;
    staged.persist(output_path).map_err(|e| {
        packaging(format!(
            "cannot move package into place at {}: {}",
            output_path.display(),
            e.error
        ))
    })?;
    info!("Package written to {}", output_path.display());
    Ok(())
}
