mod commands;
mod readiness;
mod terminal;

use commands::{CommandLine, Commands, classify, discover, interfaces};
use terminal::{logging, print};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let commands = CommandLine::parse_args();

    logging::init(commands.verbose);
    print::banner();

    match commands.command {
        Commands::Discover(args) => {
            print::header("getting ready for discovery");
            discover::discover(args.into_config()).await
        }
        Commands::Classify { addresses } => {
            classify::classify(&addresses);
            Ok(())
        }
        Commands::Interfaces => {
            interfaces::interfaces();
            Ok(())
        }
    }
}
