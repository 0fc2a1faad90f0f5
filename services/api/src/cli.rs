use crate::demo::{run_audit, run_dashboard, run_demo, AuditArgs, DashboardArgs, DemoArgs};
use crate::server;
use clap::{Args, Parser, Subcommand};
use omnicore::error::AppError;

#[derive(Parser, Debug)]
#[command(
    name = "Omnicore",
    about = "Audit business reviews and order removals from the command line",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP service (default command)
    Serve(ServeArgs),
    /// Search a business and print its review audit
    Audit(AuditArgs),
    /// Customer portal views
    Portal {
        #[command(subcommand)]
        command: PortalCommand,
    },
    /// Walk through search, audit, selection and checkout against fixture data
    Demo(DemoArgs),
}

#[derive(Subcommand, Debug)]
enum PortalCommand {
    /// List the signed-in customer's audits with their cleanup progress
    Dashboard(DashboardArgs),
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Audit(args) => run_audit(args).await,
        Command::Portal {
            command: PortalCommand::Dashboard(args),
        } => run_dashboard(args).await,
        Command::Demo(args) => run_demo(args).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serve_is_the_default_command() {
        let cli = Cli::try_parse_from(["omnicore-api"]).expect("parses");
        assert!(cli.command.is_none());
    }

    #[test]
    fn audit_accepts_repeated_selections() {
        let cli = Cli::try_parse_from([
            "omnicore-api",
            "audit",
            "--name",
            "Cafe Sonne",
            "--select",
            "r-2",
            "--select",
            "r-3",
        ])
        .expect("parses");

        match cli.command {
            Some(Command::Audit(args)) => {
                assert_eq!(args.name, "Cafe Sonne");
                assert_eq!(args.select, vec!["r-2".to_string(), "r-3".to_string()]);
                assert!(args.csv.is_none());
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn dashboard_requires_credentials() {
        assert!(Cli::try_parse_from(["omnicore-api", "portal", "dashboard"]).is_err());
        assert!(Cli::try_parse_from([
            "omnicore-api",
            "portal",
            "dashboard",
            "--user-id",
            "u-1",
            "--access-token",
            "token",
        ])
        .is_ok());
    }
}
