//! Turn parsed arguments into engine requests.

use std::fs;
use std::path::Path;

use clap::ArgMatches;
use demoreel_lib::{ReelError, RenderRequest, RenderSettings, TrackSource};
use log::debug;

/// Build a render request from the `render`/`plan` arguments.
pub fn render_request(args: &ArgMatches) -> Result<RenderRequest, ReelError> {
    let settings = load_settings(args)?;

    let tracks = args
        .get_many::<String>("INPUT")
        .into_iter()
        .flatten()
        .enumerate()
        .map(|(index, path)| read_track(index, path))
        .collect::<Result<Vec<_>, _>>()?;

    let tag_source = args
        .get_one::<String>("tag")
        .map(|path| read_file(path))
        .transpose()?;

    Ok(RenderRequest {
        tracks,
        tag_source,
        settings,
    })
}

/// Settings from `--settings` (or defaults) with flag overrides applied.
pub fn load_settings(args: &ArgMatches) -> Result<RenderSettings, ReelError> {
    let mut settings = match args.get_one::<String>("settings") {
        Some(path) => {
            let json = fs::read_to_string(path)
                .map_err(|err| ReelError::Input(format!("cannot read {}: {}", path, err)))?;
            RenderSettings::from_json(&json)?
        }
        None => RenderSettings::default(),
    };

    if args.get_flag("normalize") {
        settings.normalize = true;
    }
    if let Some(&segment) = args.get_one::<f64>("segment") {
        settings.segment_duration = segment;
    }
    if let Some(&fade) = args.get_one::<f64>("fade") {
        settings.fade_duration = fade;
    }
    if let Some(&gap) = args.get_one::<f64>("gap") {
        settings.silence_gap = gap;
    }
    if let Some(&interval) = args.get_one::<f64>("tag-interval") {
        settings.tag_interval = interval;
    }

    debug!("render settings: {:?}", settings);
    Ok(settings)
}

/// Read one input file as a track. The display name is the file name.
pub fn read_track(index: usize, path: &str) -> Result<TrackSource, ReelError> {
    let bytes = read_file(path)?;
    Ok(TrackSource::new(
        format!("track-{}", index + 1),
        display_name(path),
        bytes,
    ))
}

pub fn display_name(path: &str) -> String {
    Path::new(path)
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.to_string())
}

fn read_file(path: &str) -> Result<Vec<u8>, ReelError> {
    fs::read(path).map_err(|err| ReelError::Input(format!("cannot read {}: {}", path, err)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::args::build_cli;

    fn plan_matches(argv: &[&str]) -> ArgMatches {
        let matches = build_cli().try_get_matches_from(argv).expect("matches");
        let (_, plan) = matches.subcommand().expect("subcommand");
        plan.clone()
    }

    #[test]
    fn flags_override_defaults() {
        let args = plan_matches(&["reel", "plan", "a.wav", "-n", "--fade", "1.5", "--tag-interval", "0"]);
        let settings = load_settings(&args).expect("settings");
        assert!(settings.normalize);
        assert_eq!(settings.fade_duration, 1.5);
        assert_eq!(settings.tag_interval, 0.0);
        assert_eq!(settings.segment_duration, 25.0);
    }

    #[test]
    fn missing_settings_file_is_an_input_error() {
        let args = plan_matches(&["reel", "plan", "a.wav", "--settings", "/nonexistent/settings.json"]);
        assert!(matches!(load_settings(&args), Err(ReelError::Input(_))));
    }

    #[test]
    fn display_name_is_the_file_name() {
        assert_eq!(display_name("/music/reel/intro.flac"), "intro.flac");
        assert_eq!(display_name("take.wav"), "take.wav");
    }
}
