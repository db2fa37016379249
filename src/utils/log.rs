use log::LevelFilter;

pub struct Logger;

impl Logger {
    /// Installs the colored stderr logger. `RUST_LOG` takes precedence over `level`.
    pub fn init(level: LevelFilter) {
        let mut builder = colog::default_builder();
        builder
            .filter_level(level)
            .target(env_logger::Target::Stderr)
            .parse_default_env();

        // a second init (tests, embedding) keeps the first logger
        let _ = builder.try_init();
    }
}
