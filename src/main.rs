use std::path::Path;

use clap::Parser;
use colored::Colorize;
use eyre::{Result, WrapErr};
use log::{error, info};

use auto_resume::chat::agent::ResumeAgent;
use auto_resume::latex::compiler::compile_pdf;
use auto_resume::latex::workspace::{RESUME_FILE, prepare_job_directory, write_job_summary};
use auto_resume::models::job::JobRecord;
use auto_resume::scraper::job::JobScraper;
use auto_resume::utils::cli::Args;
use auto_resume::utils::config::config;
use auto_resume::utils::log::Logger;
use auto_resume::utils::toolchain::Toolchain;

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    Logger::init(args.verbosity);

    info!(
        "starting auto-resume {}",
        format!("v{}", env!("CARGO_PKG_VERSION")).magenta()
    );

    let config = config(&args.config)?;
    let toolchain = Toolchain::resolve(&config.toolchain);

    let jobs = JobScraper::from_config(&config, &toolchain)?
        .scrape_all()
        .await;
    if jobs.is_empty() {
        info!("no matching jobs found, nothing to build");
        return Ok(());
    }

    let agent = ResumeAgent::from_config(&config.llm)?;
    let template = tokio::fs::read_to_string(args.templates.join(RESUME_FILE))
        .await
        .wrap_err_with(|| format!("failed to read template in {}", args.templates.display()))?;
    tokio::fs::create_dir_all(&args.output).await?;

    let mut built = 0;
    for (idx, job) in jobs.iter().enumerate() {
        let job_dir = args.output.join(format!("job_{}", idx + 1));
        match build_resume(&agent, &toolchain, job, &template, &args.templates, &job_dir).await {
            Ok(()) => built += 1,
            Err(e) => error!(
                "failed to build resume for {:?}: {:#}",
                job.title().unwrap_or("untitled job"),
                e
            ),
        }
    }

    let summary = format!("built {} of {} resumes", built, jobs.len());
    if built == jobs.len() {
        info!("{}", summary.green());
    } else {
        info!("{}", summary.yellow());
    }
    info!("results are in {}", args.output.display());

    Ok(())
}

async fn build_resume(
    agent: &ResumeAgent,
    toolchain: &Toolchain,
    job: &JobRecord,
    template: &str,
    templates: &Path,
    job_dir: &Path,
) -> Result<()> {
    prepare_job_directory(templates, job_dir)?;
    write_job_summary(job, job_dir)?;

    let tailored = agent.tailor_resume(job, template).await?;
    tokio::fs::write(job_dir.join(RESUME_FILE), tailored).await?;

    compile_pdf(toolchain, job_dir).await?;
    Ok(())
}
