use clap::Parser;

use docmodel_cli::Args;

fn main() {
    let args = Args::parse();

    match docmodel_cli::run(args) {
        Ok(output) => println!("{}", output),
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }
}
