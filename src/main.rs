use clap::CommandFactory;

use check_prometheus_metric::cli::Cli;
use check_prometheus_metric::error::CheckError;
use check_prometheus_metric::query::PrometheusClient;
use check_prometheus_metric::{check, icinga, logging, CheckOutcome, Runner};

fn main() {
    logging::init();

    Runner::new()
        .on_error(CheckError::to_outcome)
        .safe_run(do_check)
        .print_and_exit()
}

fn do_check() -> Result<CheckOutcome, CheckError> {
    icinga::print_icinga_command_if_env_and_exit("prometheus_metric", &Cli::command())?;

    check::run_from_args(std::env::args_os(), PrometheusClient::new)
}
