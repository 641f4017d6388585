//! Round-trip tests for Frigate config generation from per-camera fragments.

use std::fs;

use frigate_notifier::config_merge::{generate, merge_documents, render_config, OUTPUT_FILE};

const GENERAL_YML: &str = r#"mqtt:
  host: mosquitto
  port: 1883

ffmpeg_defaults: &ffmpeg
  hwaccel_args: preset-vaapi

detectors:
  coral:
    type: edgetpu
    device: usb
"#;

const FRONT_DOOR_YML: &str = r#"front_door:
  ffmpeg:
    <<: *ffmpeg
    inputs:
      - path: rtsp://10.0.0.10:554/stream1
        roles: [detect]

  detect:
    fps: 5
"#;

const DRIVEWAY_YML: &str = r#"driveway:
  enabled: true
  objects:
    track: [person, car]
"#;

#[test]
fn merged_document_keeps_base_and_all_cameras() {
    let base: serde_yaml::Value = serde_yaml::from_str(GENERAL_YML).unwrap();
    let fragments = [FRONT_DOOR_YML, DRIVEWAY_YML];

    let config = render_config(&merge_documents(GENERAL_YML, &fragments)).unwrap();
    let root = config.as_mapping().expect("mapping at root");

    for key in ["mqtt", "ffmpeg_defaults", "detectors"] {
        assert_eq!(root.get(key), base.get(key), "top-level key {} changed", key);
    }

    let cameras = config["cameras"].as_mapping().expect("cameras mapping");
    assert_eq!(cameras.len(), fragments.len());
    let driveway: serde_yaml::Value = serde_yaml::from_str(DRIVEWAY_YML).unwrap();
    assert_eq!(config["cameras"]["driveway"], driveway["driveway"]);
    assert_eq!(
        config["cameras"]["front_door"]["detect"]["fps"].as_u64(),
        Some(5)
    );
    assert_eq!(
        config["cameras"]["front_door"]["ffmpeg"]["hwaccel_args"].as_str(),
        Some("preset-vaapi")
    );
}

#[test]
fn generate_writes_sorted_cameras() {
    let dir = tempfile::tempdir().unwrap();
    let cameras_dir = dir.path().join("cameras");
    fs::create_dir(&cameras_dir).unwrap();
    fs::write(dir.path().join("general.yml"), GENERAL_YML).unwrap();
    fs::write(cameras_dir.join("b_front_door.yml"), FRONT_DOOR_YML).unwrap();
    fs::write(cameras_dir.join("a_driveway.yml"), DRIVEWAY_YML).unwrap();
    fs::write(cameras_dir.join("notes.txt"), "not a camera").unwrap();

    let output = dir.path().join(OUTPUT_FILE);
    let merged = generate(dir.path(), &output).unwrap();
    assert_eq!(merged, 2);

    let written: serde_yaml::Value =
        serde_yaml::from_str(&fs::read_to_string(&output).unwrap()).unwrap();
    let names: Vec<&str> = written["cameras"]
        .as_mapping()
        .unwrap()
        .keys()
        .filter_map(|k| k.as_str())
        .collect();
    assert_eq!(names, vec!["driveway", "front_door"]);
    assert_eq!(written["mqtt"]["host"].as_str(), Some("mosquitto"));
}

#[test]
fn generate_without_cameras_dir_keeps_base() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("general.yml"), GENERAL_YML).unwrap();

    let output = dir.path().join("out.yml");
    assert_eq!(generate(dir.path(), &output).unwrap(), 0);
    let written: serde_yaml::Value =
        serde_yaml::from_str(&fs::read_to_string(&output).unwrap()).unwrap();
    assert!(written["cameras"].is_null());
    assert_eq!(written["detectors"]["coral"]["type"].as_str(), Some("edgetpu"));
}
