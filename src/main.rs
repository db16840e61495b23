use anyhow::Context;
use clap::{Parser, Subcommand};
use clap_verbosity_flag::{InfoLevel, Verbosity};
use fmi_gen::{
    annotate, patch,
    options::{AnnotateOptions, PatchOptions},
};

#[derive(Parser, Debug)]
#[command(name = "fmi-gen", version)]
#[command(about = "Prepare a simulation for export as a ModelC FMU")]
struct Cli {
    #[command(flatten)]
    verbosity: Verbosity<InfoLevel>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Annotate SignalGroups with FMI variables, optionally building a direct index
    Annotate(AnnotateOptions),
    /// Patch the signals of a SignalGroup
    Patch(PatchOptions),
}

fn main() -> anyhow::Result<()> {
    let Cli { verbosity, command } = Cli::parse();

    let level = verbosity.log_level_filter().to_string().to_lowercase();
    let _logger = flexi_logger::Logger::try_with_env_or_str(level)?
        .set_palette("b1;3;2;4;6".to_string())
        .start()?;

    match command {
        Commands::Annotate(options) => {
            let summary = annotate::run(&options)
                .with_context(|| format!("Annotation failed: {}", options.sim.display()))?;
            if let Some(path) = &summary.direct_index {
                log::info!("Direct index: {}", path.display());
            }
            log::info!(
                "Annotated {} SignalGroups, skipped {}",
                summary.annotated.len(),
                summary.skipped.len()
            );
        }
        Commands::Patch(options) => {
            patch::patch_signal_group(&options.input, &options.patch, options.remove_unknown)
                .with_context(|| format!("Patch failed: {}", options.input.display()))?;
        }
    }

    Ok(())
}
