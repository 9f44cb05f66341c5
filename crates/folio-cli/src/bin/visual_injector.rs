use clap::Parser;
use folio_cli::cli::InjectorArgs;
use folio_cli::{inject_cmd, logging};

fn main() {
    let args = InjectorArgs::parse();
    logging::init(args.verbose);

    if let Err(code) = inject_cmd::run(&args) {
        std::process::exit(code);
    }
}
