fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = ledger_import::args::parse();
    ledger_import::cli::main(args)
}
