// Copyright (c) The bats-retry Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use bats_retry::BatsRetryApp;
use clap::Parser;

fn main() {
    let app = BatsRetryApp::parse();
    let output = app.init_output();

    match app.exec(output) {
        Ok(code) => std::process::exit(code),
        Err(error) => {
            error.display_to_stderr(&output.stderr_styles());
            std::process::exit(error.process_exit_code());
        }
    }
}
