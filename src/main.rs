fn main() {
    use import_grapher::cli::parse;
    let cli = parse();
    import_grapher::utils::logging::init(cli.verbose, cli.quiet);
    let code = import_grapher::app::run_cli(cli);
    if code != 0 {
        std::process::exit(code);
    }
}
