use std::sync::Arc;

use tokio::io::BufReader;
use tokio_util::sync::CancellationToken;

use text_bus::message::EXIT_COMMAND;
use text_bus::pipeline::Pipeline;

mod config;

fn init_logging() {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .filter_module("text_bus", log::LevelFilter::Info)
        .init();
}

#[tokio::main]
async fn main() -> ! {
    init_logging();
    let config = config::config();

    let cancel = CancellationToken::new();
    let pipeline = Arc::new(Pipeline::new(config.pipeline(), cancel.clone()));

    println!("Enter messages, one per line; '{}' quits.", EXIT_COMMAND);

    let mut run = tokio::spawn({
        let pipeline = Arc::clone(&pipeline);
        async move {
            let stdin = BufReader::new(tokio::io::stdin());
            pipeline.run(stdin).await
        }
    });

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                log::info!("interrupt received, requesting shutdown");
                cancel.cancel();
            },
            result = &mut run => {
                match result {
                    Ok(Ok(report)) => log::info!("pipeline stopped: {:?}", report),
                    Ok(Err(e)) => log::error!("pipeline error: {:#}", e),
                    Err(e) => log::error!("pipeline task failed: {}", e),
                }
                break;
            },
        }
    }

    // The blocking stdin reader keeps the runtime alive; leave directly.
    std::process::exit(0)
}
