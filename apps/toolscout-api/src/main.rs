use clap::Parser;

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
	color_eyre::install()?;

	let args = toolscout_api::Args::parse();

	toolscout_api::run(args).await
}
