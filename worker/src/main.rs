use std::{env, io};

use log::info;
use tokio::{net::TcpListener, signal};

use worker::{
    bootstrap::{self, Bootstrap},
    service,
};

const DEFAULT_HOST: &str = "127.0.0.1";

#[tokio::main]
async fn main() -> io::Result<()> {
    env_logger::init();

    let addr = format!(
        "{}:{}",
        env::var("HOST").unwrap_or_else(|_| DEFAULT_HOST.to_string()),
        env::var("PORT").map_err(io::Error::other)?,
    );

    let listener = TcpListener::bind(&addr).await?;
    info!("listening at {addr}");

    let Some(Bootstrap {
        spec,
        mut rx,
        mut tx,
        topology,
    }) = bootstrap::bootstrap(&listener).await?
    else {
        return Ok(());
    };

    tokio::select! {
        ret = service::serve(&spec, &mut rx, &mut tx, topology) => {
            let report = ret?;
            info!(
                rank = report.rank,
                flips = report.flips;
                "wrapping up, flipped {:.2}% of {} proposals",
                report.flip_percentage(),
                report.iterations,
            );
        }
        _ = signal::ctrl_c() => {
            info!("received SIGINT");
        }
    }

    Ok(())
}
