mod app;
mod camera;
mod cue;
mod graph;
mod persist;
mod scan;
mod session;
mod sim;
mod util;

use std::path::PathBuf;

use clap::Parser;
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use crate::cue::LogNotifier;
use crate::persist::FileStore;
use crate::scan::InputSource;
use crate::session::{Session, SessionConfig};
use crate::sim::PhysicsParams;

#[derive(Debug, Parser)]
#[command(author, version, about)]
struct Args {
    /// Scan source: a serial device node, a capture file, or `-` for stdin.
    /// Configure the line speed beforehand (`stty -F /dev/ttyACM0 9600`).
    #[arg(long)]
    input: Option<String>,

    /// Directory holding the saved graph.
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Start with camera auto-centering off.
    #[arg(long)]
    no_auto_center: bool,

    #[arg(long, default_value_t = 300.0)]
    link_distance: f32,

    #[arg(long, default_value_t = 0.0, allow_hyphen_values = true)]
    repulsion: f32,

    #[arg(long, default_value_t = 0.9)]
    speed_factor: f32,

    /// Ignore the saved graph and start empty.
    #[arg(long)]
    fresh: bool,
}

impl Args {
    fn session_config(&self) -> SessionConfig {
        SessionConfig {
            auto_center: !self.no_auto_center,
            params: PhysicsParams {
                link_distance: self.link_distance,
                repulsion: self.repulsion,
                speed_factor: self.speed_factor.clamp(0.01, 0.99),
            },
        }
    }

    fn data_dir(&self) -> PathBuf {
        self.data_dir.clone().unwrap_or_else(|| {
            dirs::data_local_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("memonet")
        })
    }
}

fn main() -> eframe::Result<()> {
    let args = Args::parse();

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "memonet=info,warn".into()))
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();

    let store = FileStore::new(args.data_dir());
    info!(dir = %store.dir().display(), "using graph store");

    let mut session = Session::new(
        Box::new(store),
        Box::new(LogNotifier::default()),
        args.session_config(),
    );
    if !args.fresh {
        session.restore();
    }

    let input = args.input.as_deref().map(InputSource::from_arg);
    let options = eframe::NativeOptions {
        viewport: eframe::egui::ViewportBuilder::default().with_inner_size([1440.0, 920.0]),
        ..Default::default()
    };

    eframe::run_native(
        "memonet",
        options,
        Box::new(move |cc| Ok(Box::new(app::MemonetApp::new(cc, session, input)))),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_stock_tuning() {
        let args = Args::try_parse_from(["memonet"]).expect("parses");
        let config = args.session_config();

        assert!(config.auto_center);
        assert_eq!(config.params.link_distance, 300.0);
        assert_eq!(config.params.repulsion, 0.0);
        assert_eq!(config.params.speed_factor, 0.9);
        assert!(args.input.is_none());
        assert!(args.data_dir().ends_with("memonet"));
    }

    #[test]
    fn flags_override_tuning() {
        let args = Args::try_parse_from([
            "memonet",
            "--input",
            "-",
            "--data-dir",
            "/tmp/memonet-test",
            "--no-auto-center",
            "--repulsion",
            "-120",
            "--speed-factor",
            "1.5",
            "--fresh",
        ])
        .expect("parses");
        let config = args.session_config();

        assert!(!config.auto_center);
        assert!(args.fresh);
        assert_eq!(config.params.repulsion, -120.0);
        assert_eq!(config.params.speed_factor, 0.99);
        assert_eq!(args.data_dir(), PathBuf::from("/tmp/memonet-test"));
        assert_eq!(
            args.input.as_deref().map(InputSource::from_arg),
            Some(InputSource::Stdin)
        );
    }
}
