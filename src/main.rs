use anyhow::Result;
use boleto::bling::{ReceivableId, ReceivableTemplate};
use boleto::commands::{self, ConfigOverrides};
use clap::Parser;
use std::path::PathBuf;

/// boleto - Bling receivable and payment slip tool
///
/// Creates an accounts-receivable entry on Bling and downloads the
/// generated boleto PDF.
///
/// The bearer token is read from the BLING_TOKEN environment variable
/// unless --token is given.
///
/// Examples:
///   boleto                     # Create a receivable with the defaults and fetch its PDF
///   boleto issue --amount 99.90
///   boleto lookup              # List contacts, payment methods and categories
///   boleto download 123        # Fetch the PDF of receivable 123
#[derive(Parser, Debug)]
#[command(author, version = env!("BOLETO_VERSION"), about)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Bearer token (defaults to BLING_TOKEN)
    #[arg(long, value_name = "TOKEN", global = true)]
    pub token: Option<String>,

    /// Bling API URL (defaults to https://bling.com.br/Api/v3)
    #[arg(long = "api-url", env = "BLING_API_URL", value_name = "URL", global = true)]
    pub api_url: Option<String>,

    /// Directory the PDF is written to (defaults to the current directory)
    #[arg(
        long = "output-dir",
        short = 'o',
        env = "BOLETO_OUTPUT_DIR",
        value_name = "PATH",
        global = true
    )]
    pub output_dir: Option<PathBuf>,

    /// Timeout for each HTTP request, in seconds [default: 30]
    #[arg(
        long,
        value_name = "SECONDS",
        global = true,
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    pub timeout: Option<u64>,

    /// Wait before each download attempt, in seconds [default: 5]
    #[arg(long = "retry-delay", value_name = "SECONDS", global = true)]
    pub retry_delay: Option<u64>,
}

impl Cli {
    fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            token: self.token.clone(),
            api_url: self.api_url.clone(),
            output_dir: self.output_dir.clone(),
            timeout_secs: self.timeout,
            retry_delay_secs: self.retry_delay,
        }
    }
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// Create a receivable and download its boleto (default)
    Issue(IssueArgs),

    /// List contacts, payment methods and revenue categories
    Lookup,

    /// Download the boleto of an existing receivable
    Download(DownloadArgs),
}

#[derive(clap::Args, Debug, Default)]
pub struct IssueArgs {
    /// Amount owed
    #[arg(long, value_name = "VALUE", value_parser = parse_amount)]
    pub amount: Option<f64>,

    /// Free-text memo stored with the receivable
    #[arg(long, value_name = "TEXT")]
    pub memo: Option<String>,

    /// Contact the receivable is billed to
    #[arg(long = "contact-id", value_name = "ID")]
    pub contact_id: Option<u64>,

    /// Revenue category
    #[arg(long = "category-id", value_name = "ID")]
    pub category_id: Option<u64>,

    /// Payment method (must be a boleto method to get a PDF)
    #[arg(long = "payment-method-id", value_name = "ID")]
    pub payment_method_id: Option<u64>,

    /// Prefix of the generated document number
    #[arg(long = "document-prefix", value_name = "PREFIX")]
    pub document_prefix: Option<String>,
}

impl IssueArgs {
    fn template(self) -> ReceivableTemplate {
        let defaults = ReceivableTemplate::default();
        ReceivableTemplate {
            amount: self.amount.unwrap_or(defaults.amount),
            memo: self.memo.unwrap_or(defaults.memo),
            document_prefix: self.document_prefix.unwrap_or(defaults.document_prefix),
            contact_id: self.contact_id.unwrap_or(defaults.contact_id),
            category_id: self.category_id.unwrap_or(defaults.category_id),
            payment_method_id: self.payment_method_id.unwrap_or(defaults.payment_method_id),
        }
    }
}

fn parse_amount(s: &str) -> Result<f64, String> {
    let amount: f64 = s
        .trim()
        .parse()
        .map_err(|_| format!("'{}' is not a number", s))?;
    if !amount.is_finite() || amount <= 0.0 {
        return Err(format!("amount must be a positive number, got '{}'", s));
    }
    Ok(amount)
}

#[derive(clap::Args, Debug)]
pub struct DownloadArgs {
    /// Receivable id
    #[arg(value_name = "ID")]
    pub id: ReceivableId,
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let cli = Cli::parse();
    let runtime = boleto::runtime::RealRuntime;
    let overrides = cli.overrides();

    match cli.command.unwrap_or_else(|| Commands::Issue(IssueArgs::default())) {
        Commands::Issue(args) => {
            commands::issue(runtime, overrides, args.template()).await?;
        }
        Commands::Lookup => {
            commands::lookup(runtime, overrides).await?;
        }
        Commands::Download(args) => {
            commands::download(runtime, overrides, args.id).await?;
        }
    }
    Ok(())
}
