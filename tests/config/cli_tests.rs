use analytic_probe::cli::Cli;
use clap::Parser;

#[test]
fn test_direct_target() {
    let cli = Cli::try_parse_from(["analytic-probe", "--ip", "10.1.2.3", "--port", "4000"]).unwrap();
    assert_eq!(cli.ip.as_deref(), Some("10.1.2.3"));
    assert_eq!(cli.port, Some(4000));
    assert!(cli.server.is_none());
    assert!(!cli.json);
}

#[test]
fn test_named_target_with_operation() {
    let cli = Cli::try_parse_from([
        "analytic-probe",
        "-s",
        "primary",
        "-o",
        "CustomStatus",
        "--json",
    ])
    .unwrap();
    assert_eq!(cli.server.as_deref(), Some("primary"));
    assert_eq!(cli.operation.as_deref(), Some("CustomStatus"));
    assert!(cli.json);
}

#[test]
fn test_ip_requires_port() {
    assert!(Cli::try_parse_from(["analytic-probe", "--ip", "10.1.2.3"]).is_err());
    assert!(Cli::try_parse_from(["analytic-probe", "--port", "4000"]).is_err());
}

#[test]
fn test_server_conflicts_with_direct_target() {
    let result = Cli::try_parse_from([
        "analytic-probe",
        "--server",
        "primary",
        "--ip",
        "10.1.2.3",
        "--port",
        "4000",
    ]);
    assert!(result.is_err());
}

#[test]
fn test_port_must_fit_u16() {
    assert!(Cli::try_parse_from(["analytic-probe", "--ip", "h", "--port", "70000"]).is_err());
}

#[test]
fn test_config_commands() {
    let cli = Cli::try_parse_from(["analytic-probe", "--check"]).unwrap();
    assert!(cli.check);
    assert!(!cli.init);
    assert!(!cli.print);
}
