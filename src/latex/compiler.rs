use std::path::{Path, PathBuf};
use std::process::Stdio;

use eyre::{Result, eyre};
use log::{debug, info, warn};
use tokio::process::Command;

use crate::latex::workspace::RESUME_FILE;
use crate::utils::toolchain::Toolchain;

pub const PDF_FILE: &str = "resume.pdf";
const JOB_NAME: &str = "resume";

/// Compiles `resume.tex` inside `job_dir` to `resume.pdf`.
///
/// Runs pdflatex, bibtex and pdflatex twice more so references resolve. Exit
/// codes of the passes are only logged; the run fails when no PDF appears.
pub async fn compile_pdf(toolchain: &Toolchain, job_dir: &Path) -> Result<PathBuf> {
    let pdflatex = toolchain
        .pdflatex
        .as_deref()
        .ok_or_else(|| eyre!("pdflatex not found, cannot typeset {}", job_dir.display()))?;

    let pdf = job_dir.join(PDF_FILE);
    if pdf.exists() {
        tokio::fs::remove_file(&pdf).await?;
    }

    info!("compiling LaTeX to PDF in {}", job_dir.display());
    run_pass(pdflatex, &["-interaction=nonstopmode", RESUME_FILE], job_dir).await;
    match toolchain.bibtex.as_deref() {
        Some(bibtex) => run_pass(bibtex, &[JOB_NAME], job_dir).await,
        None => debug!("bibtex not found, skipping bibliography pass"),
    }
    run_pass(pdflatex, &["-interaction=nonstopmode", RESUME_FILE], job_dir).await;
    run_pass(pdflatex, &["-interaction=nonstopmode", RESUME_FILE], job_dir).await;

    if !pdf.is_file() {
        return Err(eyre!(
            "LaTeX compilation produced no {} in {}",
            PDF_FILE,
            job_dir.display()
        ));
    }

    info!("generated resume at {}", pdf.display());
    Ok(pdf)
}

async fn run_pass(program: &Path, args: &[&str], cwd: &Path) {
    let status = Command::new(program)
        .args(args)
        .current_dir(cwd)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .await;

    match status {
        Ok(status) if status.success() => debug!("{} finished", program.display()),
        Ok(status) => warn!("{} exited with {}", program.display(), status),
        Err(e) => warn!("failed to run {}: {}", program.display(), e),
    }
}
