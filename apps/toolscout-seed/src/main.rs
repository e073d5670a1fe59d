use clap::Parser;

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
	color_eyre::install()?;

	let args = toolscout_seed::Args::parse();

	toolscout_seed::run(args).await
}
