fn main() -> anyhow::Result<()> {
    routeshift::logging::init_logging()?;
    routeshift::cli::run_cli()
}
