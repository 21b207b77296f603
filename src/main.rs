#[tokio::main]
async fn main() -> anyhow::Result<()> {
    if let Err(e) = grading_history::run().await {
        eprintln!("grading-history fatal: {e:#}");
        std::process::exit(1);
    }
    Ok(())
}
