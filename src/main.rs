use clap::Parser;
use implant_plan::cli::{Cli, Commands, GlobalOpts};
use miette::Result;
use tracing_subscriber::EnvFilter;

/// Environment variable holding the log filter, e.g. `IMPLANT_PLAN_LOG=debug`
const LOG_ENV: &str = "IMPLANT_PLAN_LOG";

fn init_logging(global: &GlobalOpts) {
    let filter = if global.verbose {
        EnvFilter::new("debug")
    } else if global.quiet {
        EnvFilter::new("error")
    } else {
        EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() -> Result<()> {
    // Reset SIGPIPE to default behavior so piping to `head` exits quietly
    #[cfg(unix)]
    {
        unsafe {
            libc::signal(libc::SIGPIPE, libc::SIG_DFL);
        }
    }
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
    let global = cli.global;
    init_logging(&global);

    match cli.command {
        Commands::Catalog(cmd) => implant_plan::cli::commands::catalog::run(cmd, &global),
        Commands::Plan(args) => implant_plan::cli::commands::plan::run(args, &global),
        Commands::Session(args) => implant_plan::cli::commands::session::run(args, &global),
        Commands::Completions(args) => implant_plan::cli::commands::completions::run(args),
    }
}
