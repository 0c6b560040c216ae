use std::io;
use std::path::Path;
use std::process;
use tracing::{error, Level};

mod column_filter;
mod error;

fn main() {
    tracing_subscriber::fmt()
        .with_max_level(Level::INFO)
        .with_writer(io::stderr)
        .init();

    let input = Path::new(column_filter::INPUT_PATH);
    let output = Path::new(column_filter::OUTPUT_PATH);
    if let Err(e) = column_filter::run(input, output) {
        error!("{}", e);
        process::exit(1);
    }
}
