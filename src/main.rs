#[derive(clap::Parser)]
#[clap(author, version, long_about = None)]
#[clap(about = "Produces a valid ~/.aws/config file for your given SSO grants.")]
struct Cli {
    #[clap(flatten)]
    generate: ssogen::cmd::generate::GenerateArgs,
}

fn main() -> Result<std::process::ExitCode, anyhow::Error> {
    use clap::Parser;

    // existing environment variables take precedence over .env
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    enable_tracing();
    ssogen::cmd::generate::run(&cli.generate)?;
    Ok(std::process::ExitCode::SUCCESS)
}

fn enable_tracing() {
    let filter = std::env::var("SSOGEN_LOG")
        .or_else(|_| std::env::var("RUST_LOG"))
        .unwrap_or_else(|_| "ssogen=warn".to_owned());

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(tracing_subscriber::EnvFilter::new(filter))
        .init();
}
