use std::io::Write;

use monosynth::synth::config::ConfigError;
use monosynth::synth::SynthConfig;

#[test]
fn loads_settings_from_a_json_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(
        file,
        r#"{{ "sample_rate": 44100, "buffer_frames": 256, "reference_pitch": 442.0 }}"#
    )
    .unwrap();

    let config = SynthConfig::from_file(file.path()).unwrap();
    assert_eq!(config.sample_rate, 44_100);
    assert_eq!(config.buffer_frames, 256);
    assert_eq!(config.reference_pitch, 442.0);
    assert_eq!(config.channels, 2);
    assert_eq!(config.attack_gain, 0.8);
}

#[test]
fn missing_file_is_an_io_error() {
    let dir = tempfile::tempdir().unwrap();
    assert!(matches!(
        SynthConfig::from_file(dir.path().join("absent.json")),
        Err(ConfigError::Io(_))
    ));
}

#[test]
fn malformed_file_is_a_parse_error() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(file, "sample_rate = 48000").unwrap();
    assert!(matches!(
        SynthConfig::from_file(file.path()),
        Err(ConfigError::Parse(_))
    ));
}
