use std::fs;
use std::path::Path;

use eyre::{Result, WrapErr, eyre};
use log::debug;

use crate::models::job::JobRecord;

pub const RESUME_FILE: &str = "resume.tex";
pub const SUMMARY_FILE: &str = "job.md";

/// Replaces `job_dir` with a fresh copy of the template tree.
pub fn prepare_job_directory(template_dir: &Path, job_dir: &Path) -> Result<()> {
    if !template_dir.join(RESUME_FILE).is_file() {
        return Err(eyre!(
            "template directory {} has no {}",
            template_dir.display(),
            RESUME_FILE
        ));
    }

    if job_dir.exists() {
        fs::remove_dir_all(job_dir)
            .wrap_err_with(|| format!("failed to clear {}", job_dir.display()))?;
    }
    copy_tree(template_dir, job_dir)
        .wrap_err_with(|| format!("failed to copy templates into {}", job_dir.display()))?;

    debug!("prepared {}", job_dir.display());
    Ok(())
}

fn copy_tree(from: &Path, to: &Path) -> Result<()> {
    fs::create_dir_all(to)?;
    for entry in fs::read_dir(from)? {
        let entry = entry?;
        let target = to.join(entry.file_name());
        if entry.file_type()?.is_dir() {
            copy_tree(&entry.path(), &target)?;
        } else {
            fs::copy(entry.path(), &target)?;
        }
    }
    Ok(())
}

/// Writes a Markdown summary of the posting next to the resume.
pub fn write_job_summary(job: &JobRecord, job_dir: &Path) -> Result<()> {
    fs::write(job_dir.join(SUMMARY_FILE), render_summary(job))
        .wrap_err_with(|| format!("failed to write job summary in {}", job_dir.display()))
}

fn render_summary(job: &JobRecord) -> String {
    let mut lines = vec![format!("# {}\n", job.title().unwrap_or("Job"))];
    lines.extend(
        job.iter()
            .filter(|(field, _)| *field != "title")
            .map(|(field, value)| format!("**{}:** {}\n", capitalize(field), value.unwrap_or("N/A"))),
    );
    lines.join("\n")
}

fn capitalize(field: &str) -> String {
    let mut chars = field.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
