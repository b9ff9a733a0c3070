//! Library surface behind the `numaflow` CLI's subcommands, split out so
//! integration tests can invoke command logic directly instead of through a
//! subprocess.

pub mod commands;
