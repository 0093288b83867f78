use indicatif::{MultiProgress, ProgressBar, ProgressDrawTarget, ProgressStyle};
use tracing_subscriber::EnvFilter;

/// Progress bars for the files being parsed, one per condition.
pub struct Reporter {
    multibar: MultiProgress,
    bar_style: ProgressStyle,
}

impl Reporter {
    pub fn new(quiet: bool) -> eyre::Result<Self> {
        let bar_style =
            ProgressStyle::with_template("{prefix:12}: [{bar:40.cyan/blue}] {pos:>5}/{len:5} {msg}")?;
        let multibar = if quiet {
            MultiProgress::with_draw_target(ProgressDrawTarget::hidden())
        } else {
            MultiProgress::new()
        };
        Ok(Self {
            multibar,
            bar_style,
        })
    }

    pub fn hidden() -> Self {
        Self {
            multibar: MultiProgress::with_draw_target(ProgressDrawTarget::hidden()),
            bar_style: ProgressStyle::default_bar(),
        }
    }

    pub fn condition(&self, label: &str, files: usize) -> ProgressBar {
        self.multibar.add(
            ProgressBar::new(files as u64)
                .with_prefix(label.to_string())
                .with_style(self.bar_style.clone()),
        )
    }
}

/// Installs the stderr log subscriber. `RUST_LOG` takes precedence over the
/// verbosity given on the command line.
pub fn init_logging(verbosity: u8) {
    let level = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
