use clap::Parser;
use miette::Result;
use idesk::cli::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    // Install miette's fancy error handler for readable diagnostics
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .unicode(true)
                .context_lines(2)
                .tab_width(4)
                .build(),
        )
    }))?;

    let cli = Cli::parse();
    idesk::telemetry::init(cli.global.verbose);

    idesk::cli::dispatch(cli).await
}
