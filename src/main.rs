fn main() -> anyhow::Result<()> {
    journal::cli::run()
}
