use clap::Parser;
use env_logger::Env;
use erosion::api::cli::{Cli, Command, execute};

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    if let Command::Serve { port } = cli.command {
        if let Err(e) = erosion::api::run_http_server(port).await {
            log::error!("server error: {e}");
            std::process::exit(1);
        }
        return;
    }

    match execute(&cli.command) {
        Ok(report) => println!("{}", report.trim_end()),
        Err(e) => {
            eprintln!("error: {e:#}");
            std::process::exit(1);
        }
    }
}
