use clap::Parser;
use folio_cli::cli::SplitterArgs;
use folio_cli::{logging, split_cmd};

fn main() {
    let args = SplitterArgs::parse();
    logging::init(args.verbose);

    if let Err(code) = split_cmd::run(&args) {
        std::process::exit(code);
    }
}
