use clap::Parser;
use std::path::PathBuf;

#[derive(Clone, Debug, Parser)]
#[clap(
    name = "bookshelf-node",
    about = "A GraphQL service for a shelf of books",
    version
)]
pub struct Opt {
    #[clap(
        long,
        default_value = "8000",
        value_name = "PORT",
        env = "BOOKSHELF_HTTP_PORT",
        help = "Port for the GraphQL HTTP server"
    )]
    pub http_port: u16,
    #[clap(
        long,
        value_name = "FILE",
        env = "BOOKSHELF_DATA_FILE",
        help = "Keep books in this JSON file instead of in memory"
    )]
    pub data_file: Option<PathBuf>,
    #[clap(
        long,
        value_name = "FILE",
        help = "JSON file with a list of {\"title\", \"author\"} objects to start with; \
                ignored if the data file already holds books"
    )]
    pub seed: Option<PathBuf>,
    #[clap(long, help = "Enable debug logging")]
    pub debug: bool,
    #[clap(long, help = "Print the GraphQL schema and exit")]
    pub print_schema: bool,
}
