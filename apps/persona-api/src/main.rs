use clap::Parser;

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
	color_eyre::install()?;
	let args = persona_api::Args::parse();
	persona_api::run(args).await
}
