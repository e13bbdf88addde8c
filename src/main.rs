//! spotrelay CLI entry point.

use spotrelay::cli::{self, Cli};
use spotrelay::core::Result;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command-line arguments
    let cli = Cli::parse_args();

    // Execute one relay cycle
    cli::execute(cli).await
}
