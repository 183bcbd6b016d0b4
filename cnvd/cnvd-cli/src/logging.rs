use env_logger::Builder;
use indicatif::MultiProgress;
use indicatif_log_bridge::LogWrapper;
use log::LevelFilter;
use std::io::Write;

/// the modules logging at the application level
const APP_MODULES: &[&str] = &["cnvd", "cnvd_walker"];

#[derive(Clone, Debug, clap::Args)]
pub struct Logging {
    /// Be quiet. Conflicts with 'verbose'.
    #[arg(short, long, conflicts_with = "verbose", global = true)]
    quiet: bool,

    /// Be more verbose. May be repeated multiple times to increase verbosity.
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Disable the progress bar
    #[arg(long, global = true, conflicts_with = "progress")]
    no_progress: bool,

    /// Force the progress bar, even for commands which default to none
    #[arg(long, global = true)]
    progress: bool,

    /// Provide a RUST_LOG filter, conflicts with --verbose and --quiet
    #[arg(long, global = true, conflicts_with_all(["verbose", "quiet"]), env("RUST_LOG"))]
    log: Option<String>,
}

impl Logging {
    fn builder(&self) -> Builder {
        let mut builder = Builder::new();

        if let Some(log) = &self.log {
            builder.parse_filters(log);
            return builder;
        }

        // no timestamps, the output is for humans
        builder.format(|buf, record| writeln!(buf, "{}", record.args()));

        let (global, app) = match (self.quiet, self.verbose) {
            (true, _) => (LevelFilter::Off, None),
            (_, 0) => (LevelFilter::Warn, None),
            (_, 1) => (LevelFilter::Warn, Some(LevelFilter::Info)),
            (_, 2) => (LevelFilter::Warn, Some(LevelFilter::Debug)),
            (_, 3) => (LevelFilter::Debug, None),
            (_, _) => (LevelFilter::Trace, None),
        };

        builder.filter_level(global);
        if let Some(app) = app {
            for module in APP_MODULES {
                builder.filter_module(module, app);
            }
        }

        builder
    }

    /// Whether to show a progress bar, given the running command's default.
    fn progress_enabled(&self, default_progress: bool) -> bool {
        if self.quiet || self.no_progress {
            return false;
        }
        self.progress || default_progress
    }

    pub fn init(self, default_progress: bool) -> Option<MultiProgress> {
        let mut builder = self.builder();

        if !self.progress_enabled(default_progress) {
            builder.init();
            return None;
        }

        let logger = builder.build();
        let max_level = logger.filter();
        let multi = MultiProgress::new();
        // NOTE: LogWrapper::try_init is buggy and messes up the log levels
        let _ = log::set_boxed_logger(Box::new(LogWrapper::new(multi.clone(), logger)));
        log::set_max_level(max_level);

        Some(multi)
    }
}
