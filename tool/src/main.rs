/*
 * Copyright (c) 2021 gematik GmbH
 *
 * Licensed under the Apache License, Version 2.0 (the "License");
 * you may not use this file except in compliance with the License.
 * You may obtain a copy of the License at
 *
 *    http://www.apache.org/licenses/LICENSE-2.0
 *
 * Unless required by applicable law or agreed to in writing, software
 * distributed under the License is distributed on an "AS IS" BASIS,
 * WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
 * See the License for the specific language governing permissions and
 * limitations under the License.
 *
 */

mod logging;
mod misc;
mod prepare;
mod translate;
mod verify;

use structopt::StructOpt;

use logging::init_logger;
use prepare::{execute as prepare, Opts as PrepareOpts};
use translate::{execute as translate, Opts as TranslateOpts};
use verify::{execute as verify, Opts as VerifyOpts};

fn main() {
    init_logger().expect("Unable to initialize logger");

    let command = Command::from_args();

    match command {
        Command::Prepare(opts) => prepare(opts),
        Command::Translate(opts) => translate(opts),
        Command::Verify(opts) => verify(opts),
    }
}

#[derive(StructOpt)]
enum Command {
    Prepare(PrepareOpts),
    Translate(TranslateOpts),
    Verify(VerifyOpts),
}
