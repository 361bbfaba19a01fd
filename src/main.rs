use clap::Parser;
use tldrs::cli::args::Cli;
use tldrs::logging;
use tldrs::Settings;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let settings = cli
        .workspace
        .as_deref()
        .and_then(|workspace| Settings::load(workspace).ok())
        .unwrap_or_default();
    logging::init_with_config(&settings.logging);

    if let Err(err) = tldrs::cli::run(cli).await {
        eprintln!("error: {err}");
        for suggestion in downcast_suggestions(&err) {
            eprintln!("  hint: {suggestion}");
        }
        std::process::exit(1);
    }
    Ok(())
}

fn downcast_suggestions(err: &anyhow::Error) -> Vec<&'static str> {
    err.downcast_ref::<tldrs::CoreError>().map(|e| e.recovery_suggestions()).unwrap_or_default()
}
