//! CLI argument parsing with clap

use camino::Utf8PathBuf;
use clap::builder::styling::{AnsiColor, Styles};
use clap::{Args, Parser, Subcommand};

use bli_core::StackOptions;

fn help_styles() -> Styles {
    Styles::styled()
        .header(AnsiColor::Green.on_default().bold())
        .usage(AnsiColor::Yellow.on_default().bold())
        .literal(AnsiColor::Cyan.on_default())
        .placeholder(AnsiColor::Cyan.on_default())
        .error(AnsiColor::Red.on_default().bold())
}

/// Bare Layer Infrastructure CLI - A wrapper for Pulumi to manage GCP infrastructure
#[derive(Parser, Debug)]
#[command(name = "bli")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true, styles = help_styles())]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// `-v` of whichever command was given
    pub fn verbose(&self) -> bool {
        match &self.command {
            Commands::Init(args) => args.verbose,
            Commands::Preview(args) | Commands::Deploy(args) => args.verbose,
            Commands::Destroy(args) => args.stack.verbose,
            Commands::Graph(args) => args.stack.verbose,
            Commands::Clear(args) => args.verbose,
            Commands::Depend(args) => args.verbose,
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Initialize a new stack
    #[command(after_help = "Example: bli init -s dev-stack -w ./my_infrastructure")]
    Init(InitArgs),

    /// Preview infrastructure changes
    #[command(after_help = "Example: bli preview -s my-stack -i my-gcp-project")]
    Preview(StackArgs),

    /// Deploy infrastructure
    #[command(after_help = "Example: bli deploy -s my-stack -i my-gcp-project")]
    Deploy(StackArgs),

    /// Destroy infrastructure
    #[command(after_help = "Example: bli destroy -s my-stack -i my-gcp-project")]
    Destroy(DestroyArgs),

    /// Clear Pulumi lock files
    #[command(after_help = "Example: bli clear -s my-stack -w ./my_infrastructure")]
    Clear(ClearArgs),

    /// Generate dependency graph for infrastructure
    #[command(after_help = "Example: bli graph -s my-stack -i my-gcp-project -t -d")]
    Graph(GraphArgs),

    /// Check and install dependencies
    #[command(after_help = "Example: bli depend --check-only")]
    Depend(DependArgs),
}

/// Options shared by every command that operates on a stack
#[derive(Args, Debug, Clone)]
pub struct StackArgs {
    /// Stack name (defaults to bli.yaml, then 'bli-stack' when a Pulumi.yaml exists)
    #[arg(short = 's', long)]
    pub stack_name: Option<String>,

    /// Working directory
    #[arg(short = 'w', long, default_value = ".")]
    pub work_dir: Utf8PathBuf,

    /// GCP project ID (falls back to bli.yaml)
    #[arg(short = 'i', long, env = "BLI_PROJECT_ID")]
    pub project_id: Option<String>,

    /// Proxy address [default: proxy.telus.com]
    #[arg(short = 'r', long)]
    pub proxy_address: Option<String>,

    /// Proxy port [default: 8080]
    #[arg(short = 'o', long, visible_short_alias = 'p')]
    pub proxy_port: Option<u16>,

    /// Use local authentication instead of application default credentials
    #[arg(short = 'l', long)]
    pub use_local_auth: bool,

    /// Skip proxy setup
    #[arg(short = 'n', long)]
    pub no_proxy: bool,

    /// Use staging environment (bi-stg, the default)
    #[arg(long)]
    pub stg: bool,

    /// Use service environment (bi-srv)
    #[arg(long)]
    pub srv: bool,

    /// Show verbose output including template details
    #[arg(short = 'v', long)]
    pub verbose: bool,
}

impl StackArgs {
    pub fn options(&self) -> StackOptions {
        StackOptions {
            stack_name: self.stack_name.clone(),
            project_id: self.project_id.clone(),
            proxy_address: self.proxy_address.clone(),
            proxy_port: self.proxy_port,
            use_local_auth: self.use_local_auth,
            no_proxy: self.no_proxy,
            stg: self.stg,
            srv: self.srv,
        }
    }
}

#[derive(Args, Debug)]
pub struct InitArgs {
    /// Name of the stack to create
    #[arg(short = 's', long)]
    pub stack_name: Option<String>,

    /// Working directory for the stack
    #[arg(short = 'w', long, default_value = ".")]
    pub work_dir: Utf8PathBuf,

    /// GCP project ID to record in bli.yaml
    #[arg(short = 'i', long, env = "BLI_PROJECT_ID")]
    pub project_id: Option<String>,

    /// Show verbose output
    #[arg(short = 'v', long)]
    pub verbose: bool,
}

#[derive(Args, Debug)]
pub struct DestroyArgs {
    #[command(flatten)]
    pub stack: StackArgs,

    /// Skip confirmation prompts
    #[arg(short = 'y', long)]
    pub yes: bool,
}

#[derive(Args, Debug)]
pub struct ClearArgs {
    /// Stack name for which to clear locks (all locks when omitted)
    #[arg(short = 's', long)]
    pub stack_name: Option<String>,

    /// Working directory
    #[arg(short = 'w', long, default_value = ".")]
    pub work_dir: Utf8PathBuf,

    /// Show verbose output
    #[arg(short = 'v', long)]
    pub verbose: bool,
}

#[derive(Args, Debug)]
pub struct GraphArgs {
    #[command(flatten)]
    pub stack: StackArgs,

    /// Graph output format
    #[arg(short = 'f', long, default_value = "dot", value_parser = ["dot", "json", "yaml"])]
    pub format: String,

    /// Save the DOT graph to this file (relative to the working directory)
    #[arg(long)]
    pub output: Option<Utf8PathBuf>,

    /// Display graph as a console-friendly tree view
    #[arg(short = 't', long)]
    pub tree: bool,

    /// Show resource IDs in the tree view
    #[arg(short = 'd', long)]
    pub details: bool,

    /// Format the graph output in a readable text format
    #[arg(long)]
    pub pretty: bool,
}

#[derive(Args, Debug)]
pub struct DependArgs {
    /// Only check dependencies without installing
    #[arg(long)]
    pub check_only: bool,

    /// Print the dependency report as JSON
    #[arg(long)]
    pub json: bool,

    /// Show verbose output
    #[arg(short = 'v', long)]
    pub verbose: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(args).unwrap()
    }

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_stack_flags() {
        let cli = parse(&[
            "bli", "deploy", "-s", "dev", "-i", "acme", "-r", "proxy.local", "-o", "3128", "-l",
            "-n", "--srv", "-v", "-w", "infra",
        ]);
        let Commands::Deploy(args) = cli.command else {
            panic!("expected deploy");
        };
        let options = args.options();
        assert_eq!(options.stack_name.as_deref(), Some("dev"));
        assert_eq!(options.project_id.as_deref(), Some("acme"));
        assert_eq!(options.proxy_address.as_deref(), Some("proxy.local"));
        assert_eq!(options.proxy_port, Some(3128));
        assert!(options.use_local_auth && options.no_proxy && options.srv && !options.stg);
        assert!(args.verbose);
        assert_eq!(args.work_dir, "infra");
    }

    #[test]
    fn test_proxy_port_alias() {
        let cli = parse(&["bli", "graph", "-p", "9090", "-t"]);
        let Commands::Graph(args) = cli.command else {
            panic!("expected graph");
        };
        assert_eq!(args.stack.proxy_port, Some(9090));
        assert!(args.tree);
        assert_eq!(args.format, "dot");
    }

    #[test]
    fn test_graph_format_choices() {
        assert!(Cli::try_parse_from(["bli", "graph", "-f", "png"]).is_err());
        let cli = parse(&["bli", "graph", "-f", "yaml", "--output", "g.dot"]);
        let Commands::Graph(args) = cli.command else {
            panic!("expected graph");
        };
        assert_eq!(args.format, "yaml");
        assert_eq!(args.output.as_deref(), Some(camino::Utf8Path::new("g.dot")));
    }

    #[test]
    fn test_destroy_yes_and_verbose() {
        let cli = parse(&["bli", "destroy", "-y", "-v"]);
        assert!(cli.verbose());
        let Commands::Destroy(args) = cli.command else {
            panic!("expected destroy");
        };
        assert!(args.yes);
        assert_eq!(args.stack.work_dir, ".");
    }

    #[test]
    fn test_invalid_port_rejected() {
        assert!(Cli::try_parse_from(["bli", "preview", "-o", "http"]).is_err());
    }

    #[test]
    fn test_depend_flags() {
        let cli = parse(&["bli", "depend", "--check-only", "--json"]);
        let Commands::Depend(args) = cli.command else {
            panic!("expected depend");
        };
        assert!(args.check_only && args.json);
        assert!(!parse(&["bli", "clear"]).verbose());
    }
}
