use clap::Parser;

#[tokio::main]
async fn main() {
    let cli = request_debug::cli::Cli::parse();
    if let Err(e) = request_debug::cmd::dispatch(cli).await {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
