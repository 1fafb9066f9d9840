fn main() -> std::process::ExitCode {
    sdkgen_config_cli::run()
}
