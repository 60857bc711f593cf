use clap::Parser;
use cogview::config::ViewerArgs;
use cogview::{logging, shell, PreviewResult};

#[tokio::main(flavor = "current_thread")]
async fn main() -> PreviewResult<()> {
    let args = ViewerArgs::parse();
    logging::init(&args.log_level);

    let config = args.into_config()?;
    shell::run(config).await
}
