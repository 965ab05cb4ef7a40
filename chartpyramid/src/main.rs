use chartpyramid::{Cli, Commands, run_build};
use clap::Parser;
use colored::Colorize;

fn main() {
	let cli = Cli::parse();

	env_logger::Builder::new().filter_level(cli.verbose.log_level_filter()).format_timestamp(None).init();

	let Commands::Build(args) = &cli.command;
	match run_build(args) {
		Ok(summary) => {
			println!("{summary}");
			if summary.is_success() {
				std::process::exit(0);
			} else {
				eprintln!("{}", "Error: one or more tilesets failed".red());
				std::process::exit(1);
			}
		}
		Err(err) => {
			eprintln!("{} {err:#}", "Error:".red());
			std::process::exit(1);
		}
	}
}
