//! `mxremote` binary.
//!
//! Starts a remote viewer session on a dedicated render loop thread, queries
//! the live viewer for its status, optionally keeps it up for a while, then
//! shuts it down and reports how the loop ended.

mod config;

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use mxremote_runloop::TickLoop;
use mxremote_session::{RunLoop, Session};
use mxremote_viewer::RemoteViewer;
use tracing::info;

/// Command line arguments.
#[derive(Parser, Debug)]
#[command(name = "mxremote")]
#[command(about = "Host a material viewer on a dedicated render loop thread")]
struct Args {
	/// Session configuration file (TOML)
	#[arg(short, long, value_name = "PATH")]
	config: Option<PathBuf>,

	#[command(flatten)]
	overrides: config::Overrides,

	/// Keep the session running this long before stopping it
	#[arg(long, value_name = "MS", default_value_t = 0)]
	duration_ms: u64,

	/// Verbose logging
	#[arg(short, long)]
	verbose: bool,
}

fn main() -> ExitCode {
	let args = Args::parse();
	setup_tracing(args.verbose);

	match run(args) {
		Ok(code) => code,
		Err(err) => {
			eprintln!("mxremote: {err:#}");
			ExitCode::FAILURE
		}
	}
}

fn run(args: Args) -> anyhow::Result<ExitCode> {
	let config = config::load(args.config.as_deref())?;
	let config = args.overrides.apply(config)?;
	info!(refresh = ?config.refresh_period, headless = config.viewer.headless, "starting session");

	let tick: Arc<dyn RunLoop> = Arc::new(TickLoop::new());
	let session = Session::<RemoteViewer>::new(config, tick);
	session.start()?;

	let status = session.enqueue(RemoteViewer::status)?.wait()?;
	println!("material: {}", status.material);
	println!("mesh:     {}", status.mesh);
	println!("screen:   {}x{}", status.screen.0, status.screen.1);
	println!("mode:     {}", if status.headless { "headless" } else { "windowed" });

	if args.duration_ms > 0 {
		info!(duration_ms = args.duration_ms, "holding session open");
		std::thread::sleep(Duration::from_millis(args.duration_ms));
	}

	session.stop();
	if let Some(err) = session.take_runtime_error() {
		eprintln!("mxremote: render loop failed: {err:#}");
		return Ok(ExitCode::FAILURE);
	}

	info!("session finished");
	Ok(ExitCode::SUCCESS)
}

fn setup_tracing(verbose: bool) {
	use tracing_subscriber::EnvFilter;

	let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
		if verbose {
			EnvFilter::new("mxremote=debug,mxremote_session=debug,mxremote_runloop=debug,mxremote_viewer=debug,info")
		} else {
			EnvFilter::new("mxremote=info,warn")
		}
	});

	tracing_subscriber::fmt()
		.with_env_filter(filter)
		.with_writer(std::io::stderr)
		.with_target(true)
		.init();
}
