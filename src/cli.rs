use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "repodoc")]
#[command(about = "Flatten a repository into a markdown document and query an AI assistant", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Assemble the repository document")]
    Gen(GenArgs),

    #[command(about = "Assemble the document and send a query to the assistant")]
    Ask(AskArgs),
}

#[derive(Parser)]
pub struct GenArgs {
    #[arg(help = "Repository path (default: current directory)")]
    pub path: Option<String>,

    #[arg(short, long, help = "Output file (default: .repodoc/<repo-name>.md)")]
    pub output: Option<String>,

    #[arg(short, long, help = "Maximum traversal depth (default: unbounded)")]
    pub depth: Option<usize>,

    #[arg(long, help = "List paths only, without file contents")]
    pub paths_only: bool,

    #[arg(long, help = "Enable debug logging")]
    pub debug: bool,
}

#[derive(Parser)]
pub struct AskArgs {
    #[arg(help = "Question to send alongside the document")]
    pub query: String,

    #[arg(short, long, help = "Repository path (default: current directory)")]
    pub path: Option<String>,

    #[arg(short, long, help = "Output file (default: .repodoc/<repo-name>.md)")]
    pub output: Option<String>,

    #[arg(short, long, help = "Maximum traversal depth (default: unbounded)")]
    pub depth: Option<usize>,

    #[arg(long, help = "Request timeout in milliseconds (default: 120000)")]
    pub timeout: Option<u64>,

    #[arg(long, help = "Enable debug logging")]
    pub debug: bool,
}
