// src/main.rs

use sitevisor::{cli, logging, run};

#[tokio::main]
async fn main() {
    let code = match run_main().await {
        Ok(()) => 0,
        Err(err) => {
            eprintln!("sitevisor error: {err:?}");
            1
        }
    };
    // Exit explicitly: the console's stdin read may still be parked on a
    // blocking thread that would hold up runtime shutdown.
    std::process::exit(code);
}

async fn run_main() -> anyhow::Result<()> {
    let args = cli::parse();
    logging::init_logging(args.log_level)?;
    run(args).await
}
