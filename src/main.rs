// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

use clap::Parser;

use pose_rig::cli::args::{Cli, Commands};
use pose_rig::cli::run::run_pipeline;

fn main() {
    let cli = Cli::parse();

    match cli.command {
        Commands::Run(args) => run_pipeline(&args),
    }
}
