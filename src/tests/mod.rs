mod cli_tests;
mod scenario_tests;
