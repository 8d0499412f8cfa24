use clap::Parser;
use trending::api::Error;
use trending_app::Args;

#[tokio::main]
async fn main() -> Result<(), Error> {
    dotenv::dotenv().ok();
    env_logger::init();

    let args = Args::parse();
    trending_app::run(args).await
}
