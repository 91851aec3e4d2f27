//! Test suites for the dygrep server.

mod support;
