use clap::Parser;
use color_eyre::Result;
use sdk_bridge::{
    cli,
    client::QueryClient,
    config::Config,
    device::{mock::MockDevice, serial_port::SerialLinkBuilder},
    logging,
    poller::{Poller, Timing},
    server, snapshot,
    status::DeviceStatus,
};
use tracing::{debug, error, info, warn};

#[cfg(unix)]
async fn hangup() {
    use tokio::signal::unix::{signal, SignalKind};

    match signal(SignalKind::hangup()) {
        Ok(mut hangup) => {
            hangup.recv().await;
        }
        Err(e) => {
            warn!(%e, "Cannot listen for hangups");
            std::future::pending::<()>().await;
        }
    }
}

#[cfg(not(unix))]
async fn hangup() {
    std::future::pending::<()>().await;
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;

    let cli = cli::Cli::parse();

    match &cli.command {
        Some(cli::Commands::Examples(example)) => {
            cli::handle_example(example.clone())?;
            return Ok(());
        }
        Some(cli::Commands::Query {
            address,
            port,
            request,
        }) => {
            let mut client = QueryClient::connect((address.as_str(), *port)).await?;
            println!("{}", client.query(request).await?);
            return Ok(());
        }
        None => {}
    }

    logging::init(
        cli.log_level,
        cli.log_dir.clone().map(|dir| (cli.log_level, dir)),
    );

    let mut config = if let Some(config_path) = &cli.config {
        debug!(?config_path, "Config from path");
        Config::new_from_path(config_path)?
    } else {
        debug!("Default config");
        Config::default()
    };
    cli.apply(&mut config);
    config.validate()?;

    let (writer, reader) = snapshot::channel();
    let timing = Timing::from(&config.timing);

    let poller = if config.device.mock {
        let mock = MockDevice::new("mock", DeviceStatus::example());
        Poller::new(mock, writer, timing).spawn()
    } else {
        let link = SerialLinkBuilder::new(&config.device.path)
            .set_baud(config.device.baud)
            .build()?;
        Poller::new(link, writer, timing).spawn()
    };

    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            info!("Ctrl-C, quitting")
        }
        _ = hangup() => {
            info!("Told to hang up, quitting")
        }
        polled = poller => {
            error!("Poller stopped");
            return match polled? {
                Ok(never) => match never {},
                Err(e) => Err(e.into()),
            };
        }
        served = server::run_on_port(reader, config.server.host, config.server.port) => {
            error!("Server returned");
            served?;
            return Err(color_eyre::eyre::eyre!("Server stopped unexpectedly"));
        }
    }

    Ok(())
}
