use clap::Parser as _;

use bookshelf::log::logger;
use bookshelf::prelude::crit;
use bookshelf_node::{launcher, opt};

fn main() {
    let opt = opt::Opt::parse();

    // Set up logger
    let logger = logger(opt.debug);

    let runtime = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            eprintln!("Failed to start the tokio runtime: {}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = runtime.block_on(launcher::run(logger.clone(), opt)) {
        crit!(logger, "Bookshelf node failed"; "error" => format!("{:#}", e));
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}
