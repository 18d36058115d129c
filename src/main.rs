use staticfiles::config::{self, AppState};
use staticfiles::logger;
use staticfiles::server::{self, signal};
use std::sync::atomic::AtomicUsize;
use std::sync::Arc;

const DEFAULT_CONFIG: &str = "config";

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let print_config = args.iter().any(|a| a == "--print-config");
    let config_path = args
        .iter()
        .find(|a| !a.starts_with("--"))
        .map_or(DEFAULT_CONFIG, String::as_str);

    let cfg = config::Config::load_from(config_path)?;
    if print_config {
        print!("{}", cfg.to_toml_string()?);
        return Ok(());
    }

    logger::init(&cfg)?;

    let mut runtime_builder = tokio::runtime::Builder::new_multi_thread();
    runtime_builder.enable_all();
    if let Some(workers) = cfg.server.workers {
        runtime_builder.worker_threads(workers);
    }
    let runtime = runtime_builder.build()?;

    runtime.block_on(async_main(cfg))
}

async fn async_main(cfg: config::Config) -> Result<(), Box<dyn std::error::Error>> {
    let addr = cfg.get_socket_addr()?;

    // Misconfigured mounts stop startup here
    let state = Arc::new(AppState::new(&cfg)?);
    if state.mounts.is_empty() {
        logger::log_warning("No mounts configured, every request will be answered with 404");
    }

    let listener = server::create_reusable_listener(addr)?;
    logger::log_server_start(&addr, &cfg);
    for mount in &state.mounts {
        let roots: Vec<String> = mount.files.roots().iter().map(ToString::to_string).collect();
        logger::log_mount(&mount.prefix, &roots, mount.files.html());
    }

    let signals = Arc::new(signal::SignalHandler::new());
    signal::start_signal_handler(Arc::clone(&signals))?;

    let local = tokio::task::LocalSet::new();
    local
        .run_until(server::start_server_loop(
            listener,
            state,
            Arc::new(AtomicUsize::new(0)),
            Arc::clone(&signals.shutdown),
        ))
        .await
}
