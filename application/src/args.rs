//! Command line [`Args`].

use clap::Parser;

/// Hotel booking server.
#[derive(Debug, Parser)]
#[command(version, about, long_about = None)]
pub struct Args {
    /// Configuration file to load, missing one means defaults.
    #[arg(short, long, env = "HOTEL_CONFIG", default_value = "config.toml")]
    pub config: String,
}

impl Args {
    /// Reads [`Args`] from the process command line.
    ///
    /// # Errors
    ///
    /// If the command line is malformed.
    pub fn parse() -> Result<Self, clap::Error> {
        Self::try_parse()
    }
}

#[cfg(test)]
mod spec {
    use clap::Parser as _;

    use super::Args;

    #[test]
    fn reads_config_path() {
        let args = Args::try_parse_from(["hotel", "-c", "prod.toml"]).unwrap();
        assert_eq!(args.config, "prod.toml");

        let args = Args::try_parse_from(["hotel", "--config=a.toml"]).unwrap();
        assert_eq!(args.config, "a.toml");
    }

    #[test]
    fn rejects_unknown_flags() {
        assert!(Args::try_parse_from(["hotel", "--port", "80"]).is_err());
    }
}
