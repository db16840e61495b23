use std::path::PathBuf;

use clap::Args;

/// Annotate the SignalGroups and the Stack of a simulation for a ModelC FMU
#[derive(Debug, Clone, PartialEq, Eq, Args)]
pub struct AnnotateOptions {
    /// Path to the simulation (Simer layout)
    #[arg(long, default_value = "/sim")]
    pub sim: PathBuf,

    /// SignalGroups to annotate, default is all (comma separated)
    #[arg(long = "signalgroups", value_delimiter = ',')]
    pub signal_groups: Vec<String>,

    /// Rules in CSV format, takes precedence over `--ruleset`
    #[arg(long)]
    pub rule: Option<PathBuf>,

    /// Use a predefined set of rules ('signal-direction')
    #[arg(long)]
    pub ruleset: Option<String>,

    /// Build a direct index of the signal offsets, used as value references
    #[arg(long, default_value_t = false)]
    pub index: bool,
}

impl Default for AnnotateOptions {
    fn default() -> Self {
        Self {
            sim: PathBuf::from("/sim"),
            signal_groups: Vec::new(),
            rule: None,
            ruleset: None,
            index: false,
        }
    }
}

/// Rename or remove signals of a SignalGroup
#[derive(Debug, Clone, PartialEq, Eq, Args)]
pub struct PatchOptions {
    /// SignalGroup file (YAML), patched in place
    #[arg(long)]
    pub input: PathBuf,

    /// Signal patch file (CSV with columns `source,target`)
    #[arg(long)]
    pub patch: PathBuf,

    /// Remove signals not listed in the patch file
    #[arg(long, default_value_t = false)]
    pub remove_unknown: bool,
}
