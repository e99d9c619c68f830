use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Security-scan orchestrator running static-analysis tools in containers
#[derive(Parser, Debug)]
#[command(
    name = "scanfleet",
    about = "Security-scan orchestrator running static-analysis tools in containers",
    version,
    author,
    long_about = "scanfleet detects the languages of a git repository, runs every matching \
                  security scanner in its own container, normalizes the findings and reports \
                  one passed/failed/warning verdict."
)]
pub struct CliArgs {
    #[command(subcommand)]
    pub command: Commands,

    #[arg(long, global = true, value_name = "LEVEL", help = "Set logging level")]
    pub log_level: Option<String>,

    #[arg(short = 'v', long, global = true, help = "Enable debug logging")]
    pub verbose: bool,

    #[arg(
        short = 'q',
        long,
        global = true,
        conflicts_with = "verbose",
        help = "Quiet mode - suppress non-error output"
    )]
    pub quiet: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    #[command(
        about = "Scan a repository",
        long_about = "Runs a full analysis of a repository branch against the configured \
                      container engine and prints the finalized analysis.\n\n\
                      Exit codes: 0 passed, 1 failed, 2 warning, 3 error.\n\n\
                      Examples:\n  \
                      scanfleet scan https://github.com/org/app.git\n  \
                      scanfleet scan git@github.com:org/app.git --branch develop --format json"
    )]
    Scan(ScanArgs),

    #[command(
        about = "Interpret saved scanner output",
        long_about = "Runs one output analyzer over a file holding a scanner's raw output.\n\n\
                      Examples:\n  \
                      scanfleet parse gosec gosec-output.json\n  \
                      scanfleet parse spotbugs report.xml --format yaml"
    )]
    Parse(ParseArgs),

    #[command(about = "List registered scanners")]
    Scanners(ScannersArgs),

    #[command(about = "Check container engine availability")]
    Health(HealthArgs),

    #[command(about = "Show effective configuration")]
    Config(ConfigArgs),
}

#[derive(Parser, Debug, Clone)]
pub struct ScanArgs {
    #[arg(value_name = "URL", help = "Git repository URL")]
    pub url: String,

    #[arg(short = 'b', long, default_value = "main", help = "Branch to scan")]
    pub branch: String,

    #[arg(
        short = 's',
        long,
        value_name = "FILE",
        help = "Scanner definitions file (overrides SCANFLEET_SCANNERS_FILE)"
    )]
    pub scanners: Option<PathBuf>,

    #[arg(
        short = 'f',
        long,
        value_enum,
        default_value = "human",
        help = "Output format"
    )]
    pub format: OutputFormatArg,

    #[arg(
        short = 'o',
        long,
        value_name = "FILE",
        help = "Write output to file instead of stdout"
    )]
    pub output: Option<PathBuf>,
}

#[derive(Parser, Debug, Clone)]
pub struct ParseArgs {
    #[arg(value_name = "SCANNER", help = "Scanner name, e.g. gosec")]
    pub scanner: String,

    #[arg(value_name = "FILE", help = "File holding the raw scanner output")]
    pub file: PathBuf,

    #[arg(
        short = 'f',
        long,
        value_enum,
        default_value = "human",
        help = "Output format"
    )]
    pub format: OutputFormatArg,
}

#[derive(Parser, Debug, Clone)]
pub struct ScannersArgs {
    #[arg(short = 's', long, value_name = "FILE", help = "Scanner definitions file")]
    pub scanners: Option<PathBuf>,

    #[arg(
        short = 'f',
        long,
        value_enum,
        default_value = "human",
        help = "Output format"
    )]
    pub format: OutputFormatArg,
}

#[derive(Parser, Debug, Clone)]
pub struct HealthArgs {
    #[arg(
        short = 'f',
        long,
        value_enum,
        default_value = "human",
        help = "Output format"
    )]
    pub format: OutputFormatArg,
}

#[derive(Parser, Debug, Clone)]
pub struct ConfigArgs {
    #[arg(
        short = 'f',
        long,
        value_enum,
        default_value = "human",
        help = "Output format"
    )]
    pub format: OutputFormatArg,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormatArg {
    Json,
    Yaml,
    Human,
}

impl From<OutputFormatArg> for super::output::OutputFormat {
    fn from(arg: OutputFormatArg) -> Self {
        match arg {
            OutputFormatArg::Json => super::output::OutputFormat::Json,
            OutputFormatArg::Yaml => super::output::OutputFormat::Yaml,
            OutputFormatArg::Human => super::output::OutputFormat::Human,
        }
    }
}
