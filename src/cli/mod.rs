pub(crate) mod colors;

use self::colors::*;
use anyhow::Context;
use app_upgrade::{
    config::Config,
    event::error::ALL_ERRORS,
    script::{Outcome, Script},
    Availability, Orchestrator, OverridePolicy, StepView, UpgradeError,
};
use clap::ArgMatches;
use std::{
    fs::File,
    io::{self, BufReader},
};
use yansi::Paint;

pub fn replay(mut config: Config, matches: &ArgMatches) -> anyhow::Result<()> {
    if !atty::is(atty::Stream::Stdout) {
        Paint::disable();
    }

    config.never_auto_launch |= matches.is_present("never-auto-launch");

    let policy = OverridePolicy::from_config(&config);
    policy.set_blocked(matches.is_present("blocked"));
    policy.set_manual_install_required(matches.is_present("manual-install"));

    let stdin = io::stdin();
    let script = match matches.value_of("FILE").filter(|path| *path != "-") {
        Some(path) => {
            let file = File::open(path).with_context(|| fomat!("failed to open " (path)))?;
            Script::from_reader(BufReader::new(file))
        }
        None => Script::from_reader(stdin.lock()),
    }
    .context("failed to parse scenario script")?;

    if script.is_empty() {
        warn!("scenario script contains no events or actions");
    }

    // Commands are only counted: nothing answers them except the script itself.
    let (commands_tx, commands_rx) = flume::unbounded();
    let orchestrator = Orchestrator::new(commands_tx, policy);

    print_view("Initial", &orchestrator.view());

    script.play(&orchestrator, |line, outcome| match outcome {
        Outcome::Changed(view) => {
            pintln!(
                (color_tertiary(line)) ": " (color_primary("Step")) " " (color_secondary(&view))
            );
            if let Some(ref progress) = view.progress {
                if let Some(ref server) = progress.server {
                    pintln!("    downloading from " (server));
                }

                if let Some(time_left) = progress.time_left {
                    pintln!("    about " (time_left.as_secs()) " seconds left");
                }
            }
        }
        Outcome::Unchanged => {
            pintln!((color_tertiary(line)) ": " (Paint::new("no visible change").dimmed()));
        }
        Outcome::Dispatched(action, command) => {
            pintln!(
                (color_tertiary(line)) ": " (color_primary("Sent")) " "
                (color_secondary(command)) " for " (action)
            );
        }
        Outcome::Refused(action) => {
            pintln!(
                (color_tertiary(line)) ": " (color_info("Refused")) " " (action) " is unavailable"
            );
        }
        Outcome::Override(name, value) => {
            pintln!((color_tertiary(line)) ": " (color_info("Override")) " " (name) " = " (value));
        }
    })?;

    print_view("Final", &orchestrator.view());
    print_availability(&orchestrator.availability());
    pintln!((color_primary("Commands sent")) ": " (commands_rx.try_iter().count()));

    Ok(())
}

pub fn explain(matches: &ArgMatches) -> anyhow::Result<()> {
    match matches.value_of("ERROR") {
        Some(name) => describe(name.parse::<UpgradeError>()?),
        None => ALL_ERRORS.iter().cloned().for_each(describe),
    }

    Ok(())
}

fn describe(error: UpgradeError) {
    let affordance = error.affordance();

    pintln!(
        (color_error(error)) " (" (error.code()) ")\n"
        "    " (color_primary("message")) ": " (error.message()) "\n"
        "    " (color_primary("origin")) ": " [error.origin()] "\n"
        "    " (color_primary("offers")) ": " (color_secondary(affordance.label()))
        if affordance.offers_manual_download() { " (with a manual download link)" } "\n"
        "    " (color_primary("retry sends")) ": " (error.retry_target())
    );
}

fn print_view(label: &str, view: &StepView) {
    pintln!((color_primary(label)) " step: " (color_secondary(view)));

    if let Some(error) = view.error {
        pintln!("    " (color_error(error)) ": " (color_error_desc(error.message())));
    }
}

fn print_availability(availability: &Availability) {
    let actions = [
        ("start upgrade", availability.start_upgrade),
        ("abort upgrade", availability.abort_upgrade),
        ("start installer", availability.start_installer),
        ("retry", availability.retry.is_some()),
    ];

    pintln!(
        (color_primary("Available")) ":"
        for (name, _) in actions.iter().filter(|(_, enabled)| *enabled) { " " (name) }
        if let Some(command) = availability.retry { " (retry sends " (command) ")" }
    );
}
