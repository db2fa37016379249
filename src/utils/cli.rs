use std::path::PathBuf;

use clap::Parser;
use log::LevelFilter;

use crate::utils::config::{default_config_path, install_root};

#[derive(Parser, Debug)]
#[command(name = "auto-resume")]
#[command(about = "Scrape job boards and build a tailored resume PDF for every matching posting", long_about = None)]
pub struct Args {
    /// Path to the configuration file
    #[arg(short, long, value_name = "FILE", default_value_os_t = default_config_path())]
    pub config: PathBuf,

    /// Directory holding the LaTeX resume template (must contain resume.tex)
    #[arg(short, long, value_name = "DIR", default_value_os_t = install_root().join("latex"))]
    pub templates: PathBuf,

    /// Directory that receives one job_<n> folder per matching posting
    #[arg(short, long, value_name = "DIR", default_value_os_t = install_root().join("outputs"))]
    pub output: PathBuf,

    /// Sets the logger's verbosity level
    #[arg(short, long, value_name = "VERBOSITY", default_value_t = LevelFilter::Info)]
    pub verbosity: LevelFilter,
}

#[derive(Parser, Debug)]
#[command(name = "scrape-jobs")]
#[command(about = "Scrape job listings and print them as JSON", long_about = None)]
pub struct ScrapeArgs {
    /// Path to the configuration file
    #[arg(long, value_name = "FILE", default_value_os_t = default_config_path())]
    pub config: PathBuf,
}
