use analytic_probe::cli::Cli;
use analytic_probe::config::Config;
use analytic_probe::core::probe::{ServerEndpoint, StatusProbe};

#[cfg(feature = "network-monitoring")]
#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    main_impl().await
}

#[cfg(not(feature = "network-monitoring"))]
fn main() -> Result<(), Box<dyn std::error::Error>> {
    futures::executor::block_on(main_impl())
}

async fn main_impl() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse_args();

    // Handle configuration commands
    if cli.init {
        let path = Config::init()?;
        println!("Config file: {}", path.display());
        return Ok(());
    }

    let config = Config::load()?;

    if cli.print {
        config.print()?;
        return Ok(());
    }

    if cli.check {
        config.check()?;
        println!("✓ Configuration valid");
        return Ok(());
    }

    let endpoint = match (&cli.server, &cli.ip, cli.port) {
        (Some(name), _, _) => config.find_server(name)?,
        (None, Some(ip), Some(port)) => ServerEndpoint::new(ip.clone(), port),
        _ => {
            eprintln!("Specify a target with --server NAME or --ip IP --port PORT");
            std::process::exit(2);
        }
    };
    let operation = cli
        .operation
        .clone()
        .unwrap_or_else(|| config.default_operation.clone());

    let probe = StatusProbe::new(config.probe.clone(), &config.diagnostics);
    let result = probe.check_status(&endpoint, &operation).await;

    if cli.json {
        println!("{}", serde_json::to_string(&result)?);
    } else {
        println!("{}", result);
    }

    Ok(())
}
