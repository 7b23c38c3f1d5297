use clap::Parser;

#[derive(Parser, Debug)]
#[command(name = "analytic-probe")]
#[command(version = concat!("Ver:", env!("CARGO_PKG_VERSION")))]
#[command(about = "Ask an analytic server whether it is running and for its pid")]
pub struct Cli {
    /// Probe a server record from the config file by name
    #[arg(short = 's', long = "server", conflicts_with_all = ["ip", "port"])]
    pub server: Option<String>,

    /// Server IP or host name
    #[arg(long = "ip", requires = "port")]
    pub ip: Option<String>,

    /// Server port
    #[arg(short = 'p', long = "port", requires = "ip")]
    pub port: Option<u16>,

    /// Operation name to send (defaults to the configured one)
    #[arg(short = 'o', long = "operation")]
    pub operation: Option<String>,

    /// Print the result as JSON
    #[arg(long = "json")]
    pub json: bool,

    /// Write the default config file
    #[arg(long = "init")]
    pub init: bool,

    /// Print the effective configuration
    #[arg(long = "print")]
    pub print: bool,

    /// Validate the config file
    #[arg(long = "check")]
    pub check: bool,
}

impl Cli {
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
