use clap::Parser;
use miette::Result;
use tracing_subscriber::EnvFilter;
use vmanager::cli::{Cli, Commands};

fn main() -> Result<()> {
    // Reset SIGPIPE to default behavior (terminate silently) for proper Unix piping.
    // Without this, piping to `head`, `grep -q`, etc. causes a panic on broken pipe.
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

    // Logs go to stderr so stdout stays pipeable; RUST_LOG wins over -v
    let default_level = if global.verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("vmanager={}", default_level)));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    match cli.command {
        Commands::Init(args) => vmanager::cli::commands::init::run(args, &global),
        Commands::Vm(cmd) => vmanager::cli::commands::vm::run(cmd, &global),
        Commands::Group(cmd) => vmanager::cli::commands::group::run(cmd, &global),
        Commands::File(cmd) => vmanager::cli::commands::file::run(cmd, &global),
        Commands::Show(args) => vmanager::cli::commands::show::run(args, &global),
        Commands::Save => vmanager::cli::commands::snapshot::run_save(&global),
        Commands::Restore(args) => vmanager::cli::commands::snapshot::run_restore(args, &global),
        Commands::Snapshots => vmanager::cli::commands::snapshot::run_list(&global),
        Commands::Check => vmanager::cli::commands::check::run(&global),
        Commands::Export(args) => vmanager::cli::commands::export::run(args, &global),
        Commands::Completions(args) => vmanager::cli::commands::completions::run(args),
    }
}
