use std::fs;
use std::path::Path;
use std::sync::mpsc::{self, RecvTimeoutError};
use std::time::Duration;

use clap::ArgMatches;
use demoreel_lib::analysis::estimate_rms;
use demoreel_lib::decode::decode_source;
use demoreel_lib::gain::plan_gain;
use demoreel_lib::{plan, spawn_render, ReelError, RenderContext, RenderSettings};
use log::info;
use serde::Serialize;

use crate::cli::options::{display_name, read_track, render_request};
use crate::progress::ProgressLine;

const POLL_INTERVAL: Duration = Duration::from_millis(50);

pub fn run(args: &ArgMatches) -> Result<i32, ReelError> {
    match args.subcommand() {
        Some(("render", sub)) => run_render(sub),
        Some(("plan", sub)) => run_plan(sub),
        Some(("info", sub)) => run_info(sub),
        Some(("create", sub)) => run_create(sub),
        _ => Ok(0),
    }
}

fn run_render(args: &ArgMatches) -> Result<i32, ReelError> {
    let request = render_request(args)?;
    let quiet = args.get_flag("quiet");

    let (sender, receiver) = mpsc::channel();
    let context = RenderContext::new().with_progress(move |percent| {
        let _ = sender.send(percent);
    });
    let job = spawn_render(request, context);

    let mut progress = ProgressLine::new(!quiet);
    loop {
        match receiver.recv_timeout(POLL_INTERVAL) {
            Ok(percent) => progress.update(percent),
            Err(RecvTimeoutError::Timeout) if job.is_finished() => break,
            Err(RecvTimeoutError::Timeout) => {}
            Err(RecvTimeoutError::Disconnected) => break,
        }
    }
    for percent in receiver.try_iter() {
        progress.update(percent);
    }
    progress.finish();

    let output = job.join()?;

    if let Some(out) = args.get_one::<String>("out") {
        write_file(out, &output.wav)?;
        info!(
            "wrote {} ({:.2}s, {} tracks)",
            out,
            output.timeline.total_duration,
            output.tracks.len()
        );
    }
    if let Some(path) = args.get_one::<String>("delivery") {
        write_file(path, &output.delivery.bytes)?;
        info!(
            "wrote delivery copy {} ({})",
            path,
            output.delivery.format.mime_type()
        );
    }

    Ok(0)
}

fn run_plan(args: &ArgMatches) -> Result<i32, ReelError> {
    let request = render_request(args)?;
    let reel_plan = plan(&request, &RenderContext::new())?;
    println!("{}", to_json(&reel_plan)?);
    Ok(0)
}

fn run_info(args: &ArgMatches) -> Result<i32, ReelError> {
    let Some(path) = args.get_one::<String>("INPUT") else {
        return Err(ReelError::Input("no input given".to_string()));
    };
    let track = read_track(0, path)?;
    let decoded = decode_source(&track.bytes, &track.display_name, &RenderContext::new())?;
    let rms = estimate_rms(&decoded.buffer);

    println!("file: {}", display_name(path));
    println!("sample rate: {} Hz", decoded.source_sample_rate);
    println!("channels: {}", decoded.source_channels);
    println!("duration: {:.3} s", decoded.buffer.duration());
    println!("rms estimate: {:.4}", rms);
    println!("normalization gain: {:.3}", plan_gain(rms, true));
    Ok(0)
}

fn run_create(args: &ArgMatches) -> Result<i32, ReelError> {
    match args.subcommand() {
        Some(("settings-json", _)) => {
            println!("{}", to_json(&RenderSettings::default())?);
            Ok(0)
        }
        _ => Ok(0),
    }
}

fn to_json<T: Serialize>(value: &T) -> Result<String, ReelError> {
    serde_json::to_string_pretty(value)
        .map_err(|err| ReelError::Render(format!("cannot serialize output: {}", err)))
}

fn write_file(path: &str, bytes: &[u8]) -> Result<(), ReelError> {
    if let Some(parent) = Path::new(path).parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            return Err(ReelError::Input(format!(
                "output directory {} does not exist",
                parent.display()
            )));
        }
    }
    fs::write(path, bytes).map_err(|err| ReelError::Render(format!("cannot write {}: {}", path, err)))
}
