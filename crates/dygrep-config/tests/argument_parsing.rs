//! Command-line parsing for the server and client argument models.

use clap::Parser;
use dygrep_config::{ClientArgs, DEFAULT_PORT, LogFormat, ServerArgs};
use rstest::rstest;

#[test]
fn server_defaults_apply_without_flags() {
    let args = ServerArgs::try_parse_from(["dygrepd"]).expect("parse defaults");
    assert_eq!(args.connection.port, DEFAULT_PORT);
    assert_eq!(args.logging.log_format, LogFormat::Compact);
    assert!(!args.strict_commands);
    assert!(!args.only_matching);
}

#[rstest]
#[case(&["dygrep", "-p", "5100"])]
#[case(&["dygrep", "--port", "5100"])]
#[case(&["dygrep", "--port=5100"])]
fn client_port_flag_forms_are_accepted(#[case] argv: &[&str]) {
    let args = ClientArgs::try_parse_from(argv).expect("parse port");
    assert_eq!(args.connection.port, 5100);
    assert_eq!(args.connection.endpoint().to_string(), "tcp://127.0.0.1:5100");
}

#[rstest]
#[case("abc")]
#[case("49.5")]
#[case("70000")]
#[case("-1")]
fn non_integer_ports_are_usage_errors(#[case] port: &str) {
    let result = ServerArgs::try_parse_from(["dygrepd", "-p", port]);
    assert!(result.is_err(), "port {port} should be rejected");
}

#[test]
fn server_flags_toggle_behaviour() {
    let args = ServerArgs::try_parse_from([
        "dygrepd",
        "--strict-commands",
        "--only-matching",
        "--log-format",
        "json",
        "--log-filter",
        "trace",
    ])
    .expect("parse flags");
    assert!(args.strict_commands);
    assert!(args.only_matching);
    assert_eq!(args.logging.log_format, LogFormat::Json);
    assert_eq!(args.log_filter(), "trace");
}
