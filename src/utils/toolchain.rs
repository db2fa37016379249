use std::path::{Path, PathBuf};

use log::{debug, warn};

use crate::utils::config::ToolchainConfig;

const CHROME_CANDIDATES: [&str; 4] = [
    "google-chrome",
    "google-chrome-stable",
    "chromium",
    "chromium-browser",
];

/// External binaries and capabilities, resolved once at process start.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Toolchain {
    pub chrome: Option<PathBuf>,
    pub pdflatex: Option<PathBuf>,
    pub bibtex: Option<PathBuf>,
}

impl Toolchain {
    pub fn resolve(config: &ToolchainConfig) -> Self {
        let toolchain = Self {
            chrome: config
                .chrome
                .clone()
                .or_else(|| CHROME_CANDIDATES.iter().find_map(|name| find_in_path(name))),
            pdflatex: config.pdflatex.clone().or_else(|| find_in_path("pdflatex")),
            bibtex: config.bibtex.clone().or_else(|| find_in_path("bibtex")),
        };

        debug!("resolved toolchain: {:?}", toolchain);
        if !toolchain.browser_available() {
            warn!("headless browser unavailable, infinite-scroll sites will yield no jobs");
        }

        toolchain
    }

    /// True when this build carries the browser driver and a Chrome binary was found.
    pub fn browser_available(&self) -> bool {
        cfg!(feature = "browser") && self.chrome.is_some()
    }
}

fn find_in_path(name: &str) -> Option<PathBuf> {
    let path = std::env::var_os("PATH")?;
    std::env::split_paths(&path)
        .map(|dir| dir.join(name))
        .find(|candidate| is_executable(candidate))
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;

    path.metadata()
        .map(|meta| meta.is_file() && meta.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    path.is_file() || path.with_extension("exe").is_file()
}
